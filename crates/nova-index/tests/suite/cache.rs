use std::sync::Arc;

use nova_core::ProjectId;
use nova_index::{persisted_index_path, IndexError, SymbolTreeCache};
use nova_project::{Declaration, Document, Project};
use nova_scheduler::CancellationToken;
use nova_test_utils::{solution, SolutionKind};

fn first_project(kind: SolutionKind) -> Project {
    solution(kind).get(ProjectId::new(1)).unwrap().clone()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_requests_build_once() {
    let cache = Arc::new(SymbolTreeCache::new(8));
    let project = first_project(SolutionKind::LargeSolution);

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let cache = Arc::clone(&cache);
        let project = project.clone();
        tasks.push(tokio::spawn(async move {
            cache
                .get_or_build(&project, &CancellationToken::new())
                .await
                .unwrap()
        }));
    }

    let mut indexes = Vec::new();
    for task in tasks {
        indexes.push(task.await.unwrap());
    }
    assert_eq!(cache.build_count(), 1);
    assert!(indexes.iter().all(|index| Arc::ptr_eq(index, &indexes[0])));
}

#[tokio::test]
async fn identical_projects_share_an_index_per_project_id() {
    let solution = solution(SolutionKind::TwoProjectsEachWithASingleClassWithSingleMethod);
    let cache = SymbolTreeCache::new(8);
    let token = CancellationToken::new();

    for project in solution.projects() {
        cache.get_or_build(project, &token).await.unwrap();
    }
    // Same fingerprint, different project: separate entries.
    assert_eq!(cache.build_count(), 2);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn changed_project_gets_a_new_index() {
    let before = solution(SolutionKind::SingleClass);
    let after = before
        .with_document(
            ProjectId::new(1),
            Document::new(nova_core::DocumentId::new(2), "Added.cs")
                .with_declaration(Declaration::class("Added")),
        )
        .unwrap();
    let cache = SymbolTreeCache::new(8);
    let token = CancellationToken::new();

    let old = cache
        .get_or_build(before.get(ProjectId::new(1)).unwrap(), &token)
        .await
        .unwrap();
    let new = cache
        .get_or_build(after.get(ProjectId::new(1)).unwrap(), &token)
        .await
        .unwrap();
    assert_ne!(old.fingerprint(), new.fingerprint());
    assert_eq!(new.symbol_count(), old.symbol_count() + 1);
    assert_eq!(cache.build_count(), 2);
}

#[tokio::test]
async fn cancellation_before_start_builds_nothing() {
    let cache = SymbolTreeCache::new(8);
    let project = first_project(SolutionKind::SingleClass);
    let token = CancellationToken::new();
    token.cancel();

    let err = cache.get_or_build(&project, &token).await.unwrap_err();
    assert!(matches!(err, IndexError::Cancelled));
    assert_eq!(cache.build_count(), 0);

    // A later caller is unaffected.
    cache
        .get_or_build(&project, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(cache.build_count(), 1);
}

#[tokio::test]
async fn persisted_indexes_are_reused_across_caches() {
    let dir = tempfile::tempdir().unwrap();
    let project = first_project(SolutionKind::SingleClassWithAll);
    let token = CancellationToken::new();

    let first = SymbolTreeCache::new(8).with_persist_dir(dir.path());
    let built = first.get_or_build(&project, &token).await.unwrap();
    assert_eq!(first.build_count(), 1);
    assert!(
        persisted_index_path(dir.path(), project.id(), project.content_fingerprint()).exists()
    );

    let second = SymbolTreeCache::new(8).with_persist_dir(dir.path());
    let loaded = second.get_or_build(&project, &token).await.unwrap();
    assert_eq!(second.build_count(), 0);
    assert_eq!(second.load_count(), 1);
    assert_eq!(*loaded, *built);
}

#[tokio::test]
async fn corrupt_persisted_index_is_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let project = first_project(SolutionKind::NestedClass);
    let path = persisted_index_path(dir.path(), project.id(), project.content_fingerprint());
    std::fs::write(&path, b"NSYT garbage").unwrap();

    let cache = SymbolTreeCache::new(8).with_persist_dir(dir.path());
    let index = cache
        .get_or_build(&project, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(cache.build_count(), 1);
    assert_eq!(cache.load_count(), 0);

    // The rebuilt index replaced the corrupt file.
    let reloaded = nova_index::load_persisted_index(&path, project.content_fingerprint())
        .unwrap()
        .unwrap();
    assert_eq!(reloaded, *index);
}
