use std::sync::Arc;

use nova_core::{KeySegment, ProjectId, SearchScope, SymbolKind};
use nova_index::{SearchQuery, SymbolTreeCache};
use nova_project::{Declaration, Document};
use nova_remote_proto::SerializableSymbol;
use nova_router::{
    dedup_within_projects, resolve, resolve_all, to_descriptor, SearchEngine, SearchOptions,
    SearchTarget,
};
use nova_scheduler::CancellationToken;
use nova_test_utils::{solution, SolutionKind};

#[tokio::test]
async fn descriptors_resolve_to_the_same_symbol() {
    let solution = solution(SolutionKind::SingleClassWithAll);
    let cache = Arc::new(SymbolTreeCache::default());
    let engine = SearchEngine::new(cache.clone());
    let token = CancellationToken::new();

    let options = SearchOptions::default().with_scope(SearchScope::SourceAndMetadata);
    let symbols = engine
        .search(
            &solution,
            SearchTarget::Solution,
            &SearchQuery::predicate(|_| true),
            &options,
            &token,
        )
        .await
        .unwrap();
    assert!(symbols.len() > 5);

    // A second cache yields an index with the same fingerprint.
    let other_cache = SymbolTreeCache::default();
    for symbol in &symbols {
        let descriptor = to_descriptor(symbol);
        assert_eq!(descriptor.project, symbol.project());
        assert_eq!(descriptor.key, symbol.key());

        let resolved = resolve(&descriptor, &solution, &other_cache, &token)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("{symbol} did not resolve"));
        assert_eq!(&resolved, symbol);
        assert_eq!(resolved.kind(), symbol.kind());
        assert_eq!(resolved.locations(), symbol.locations());
    }
    assert_eq!(other_cache.build_count(), 1);
}

#[tokio::test]
async fn removed_symbols_do_not_resolve() {
    let before = solution(SolutionKind::SingleClassWithSingleMethod);
    let cache = SymbolTreeCache::default();
    let token = CancellationToken::new();
    let engine = SearchEngine::new(Arc::new(SymbolTreeCache::default()));

    let method = engine
        .search(
            &before,
            SearchTarget::Solution,
            &SearchQuery::exact("Test"),
            &SearchOptions::default(),
            &token,
        )
        .await
        .unwrap();
    let descriptor = to_descriptor(&method[0]);

    // The document now only declares the namespace and class.
    let mut document = Document::new(nova_core::DocumentId::new(1), "TestDocument.cs");
    document.declarations = vec![
        Declaration::namespace("TestCases").with_child(Declaration::class("TestCase"))
    ];
    let after = before.with_document(ProjectId::new(1), document).unwrap();

    assert!(resolve(&descriptor, &after, &cache, &token)
        .await
        .unwrap()
        .is_none());

    let missing_project = SerializableSymbol {
        key: descriptor.key.clone(),
        project: ProjectId::new(7),
    };
    assert!(resolve(&missing_project, &before, &cache, &token)
        .await
        .unwrap()
        .is_none());
    assert!(resolve(&descriptor, &before, &cache, &token)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn overloads_resolve_by_parameters() {
    let solution = nova_test_utils::solution_with(vec![Declaration::namespace("N")
        .with_child(
            Declaration::class("C")
                .with_child(Declaration::method("M", ["int"]))
                .with_child(Declaration::method("M", ["string"])),
        )]);
    let cache = SymbolTreeCache::default();
    let token = CancellationToken::new();

    let key = |param: &str| {
        nova_core::SymbolKey::new(vec![
            KeySegment::new(SymbolKind::Namespace, "N"),
            KeySegment::new(SymbolKind::Class, "C"),
            KeySegment::new(SymbolKind::Method, "M").with_parameters([param]),
        ])
    };
    for param in ["int", "string"] {
        let descriptor = SerializableSymbol {
            key: key(param),
            project: ProjectId::new(1),
        };
        let symbol = resolve(&descriptor, &solution, &cache, &token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(symbol.parameters(), [param.to_owned()]);
    }
    let descriptor = SerializableSymbol {
        key: key("double"),
        project: ProjectId::new(1),
    };
    assert!(resolve(&descriptor, &solution, &cache, &token)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn resolve_all_keeps_order_and_cross_project_duplicates() {
    let solution = solution(SolutionKind::TwoProjectsEachWithASingleClassWithSingleField);
    let cache = SymbolTreeCache::default();
    let token = CancellationToken::new();

    let field = |project: u32| SerializableSymbol {
        key: nova_core::SymbolKey::new(vec![
            KeySegment::new(SymbolKind::Namespace, "TestCases"),
            KeySegment::new(SymbolKind::Class, "TestCase"),
            KeySegment::new(SymbolKind::Field, "TestField"),
        ]),
        project: ProjectId::new(project),
    };

    let resolved = resolve_all(
        vec![field(2), field(1), field(2), field(3), field(1)],
        &solution,
        &cache,
        &token,
    )
    .await
    .unwrap();
    let projects: Vec<u32> = resolved.iter().map(|s| s.project().to_raw()).collect();
    assert_eq!(projects, [2, 1]);
    assert!(resolved.iter().all(|s| s.to_string() == "TestCases.TestCase.TestField"));
    assert_eq!(cache.build_count(), 2);
}

#[tokio::test]
async fn cancelled_resolution_fails() {
    let solution = solution(SolutionKind::SingleClass);
    let cache = SymbolTreeCache::default();
    let token = CancellationToken::new();
    token.cancel();

    let descriptor = SerializableSymbol {
        key: nova_core::SymbolKey::new(vec![KeySegment::new(SymbolKind::Namespace, "TestCases")]),
        project: ProjectId::new(1),
    };
    assert!(matches!(
        resolve(&descriptor, &solution, &cache, &token).await,
        Err(nova_router::SearchError::Cancelled)
    ));
    assert!(matches!(
        resolve_all(vec![descriptor], &solution, &cache, &token).await,
        Err(nova_router::SearchError::Cancelled)
    ));
}

#[test]
fn dedup_is_scoped_to_projects() {
    let key = nova_core::SymbolKey::new(vec![KeySegment::new(SymbolKind::Class, "A")]);
    let at = |project: u32| SerializableSymbol {
        key: key.clone(),
        project: ProjectId::new(project),
    };
    assert_eq!(
        dedup_within_projects(vec![at(1), at(2), at(1), at(2), at(3)]),
        [at(1), at(2), at(3)]
    );
}
