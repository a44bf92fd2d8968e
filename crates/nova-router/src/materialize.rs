//! Conversion between live [`Symbol`]s and their process-independent
//! [`SerializableSymbol`] descriptors.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use nova_core::ProjectId;
use nova_index::{Symbol, SymbolTreeCache, SymbolTreeIndex};
use nova_project::ProjectGraph;
use nova_remote_proto::SerializableSymbol;
use nova_scheduler::{CancellationToken, Cancelled};

use crate::SearchError;

pub fn to_descriptor(symbol: &Symbol) -> SerializableSymbol {
    SerializableSymbol {
        key: symbol.key(),
        project: symbol.project(),
    }
}

/// Maps `descriptor` back onto the local snapshot.
///
/// Returns `Ok(None)` when the project is gone or no longer declares the
/// symbol.
pub async fn resolve(
    descriptor: &SerializableSymbol,
    graph: &dyn ProjectGraph,
    cache: &SymbolTreeCache,
    token: &CancellationToken,
) -> Result<Option<Symbol>, SearchError> {
    Cancelled::check(token)?;
    let Some(project) = graph.project(descriptor.project) else {
        log_dropped(descriptor, "project not in snapshot");
        return Ok(None);
    };
    let index = cache.get_or_build(&project, token).await?;
    let resolved = resolve_in(&index, descriptor);
    if resolved.is_none() {
        log_dropped(descriptor, "key not found");
    }
    Ok(resolved)
}

/// Resolves a batch of descriptors, keeping their order.
///
/// Repeated descriptors collapse to their first occurrence and unresolvable
/// ones are dropped. Each project's index is fetched at most once.
pub async fn resolve_all(
    descriptors: Vec<SerializableSymbol>,
    graph: &dyn ProjectGraph,
    cache: &SymbolTreeCache,
    token: &CancellationToken,
) -> Result<Vec<Symbol>, SearchError> {
    let descriptors = dedup_within_projects(descriptors);
    let mut indexes: HashMap<ProjectId, Option<Arc<SymbolTreeIndex>>> = HashMap::new();
    let mut resolved = Vec::with_capacity(descriptors.len());

    for descriptor in &descriptors {
        Cancelled::check(token)?;
        if !indexes.contains_key(&descriptor.project) {
            let index = match graph.project(descriptor.project) {
                Some(project) => Some(cache.get_or_build(&project, token).await?),
                None => None,
            };
            indexes.insert(descriptor.project, index);
        }

        let symbol = match indexes.get(&descriptor.project) {
            Some(Some(index)) => {
                let symbol = resolve_in(index, descriptor);
                if symbol.is_none() {
                    log_dropped(descriptor, "key not found");
                }
                symbol
            }
            _ => {
                log_dropped(descriptor, "project not in snapshot");
                None
            }
        };
        resolved.extend(symbol);
    }
    Ok(resolved)
}

/// Drops repeated entries, keeping the first occurrence of each.
///
/// Both descriptors and live symbols carry their project as part of their
/// identity, so the same declaration reported by two projects survives.
pub fn dedup_within_projects<T>(items: Vec<T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn resolve_in(index: &Arc<SymbolTreeIndex>, descriptor: &SerializableSymbol) -> Option<Symbol> {
    let handle = index.resolve_key(&descriptor.key)?;
    index.symbol(descriptor.project, handle)
}

fn log_dropped(descriptor: &SerializableSymbol, reason: &'static str) {
    tracing::debug!(
        target = "nova.router",
        project = %descriptor.project,
        key = %descriptor.key,
        reason,
        "dropping unresolvable symbol descriptor"
    );
}
