use nova_core::{DocumentId, ProjectId};
use nova_project::{
    load_solution, Declaration, Document, ProjectError, ProjectGraph, ProjectInfo, Solution,
    SolutionFile,
};

fn project(id: u32, class: &str) -> ProjectInfo {
    ProjectInfo::new(ProjectId::new(id), format!("P{id}"), format!("P{id}.dll"), "C#")
        .unwrap()
        .with_documents([Document::new(DocumentId::new(1), "a.cs")
            .with_declaration(Declaration::namespace("N").with_child(Declaration::class(class)))])
        .unwrap()
}

#[test]
fn preserves_project_order() {
    let solution = Solution::new([project(3, "A"), project(1, "B"), project(2, "C")]).unwrap();
    assert_eq!(
        solution.project_ids(),
        [ProjectId::new(3), ProjectId::new(1), ProjectId::new(2)]
    );
    assert_eq!(solution.project(ProjectId::new(1)).unwrap().name(), "P1");
    assert!(solution.project(ProjectId::new(9)).is_none());
}

#[test]
fn rejects_duplicate_projects_and_dangling_references() {
    assert!(matches!(
        Solution::new([project(1, "A"), project(1, "B")]),
        Err(ProjectError::DuplicateProject { .. })
    ));

    let dangling = project(1, "A")
        .with_project_references([ProjectId::new(5)])
        .unwrap();
    assert!(matches!(
        Solution::new([dangling]),
        Err(ProjectError::UnknownProjectReference { .. })
    ));
}

#[test]
fn checksum_changes_only_with_declarations() {
    let solution = Solution::new([project(1, "A"), project(2, "B")]).unwrap();
    let before = solution.checksum();

    let renamed_doc = solution
        .with_document(ProjectId::new(1), {
            let mut doc = solution.get(ProjectId::new(1)).unwrap().documents()[0].clone();
            doc.name = "renamed.cs".into();
            doc
        })
        .unwrap();
    assert_eq!(renamed_doc.checksum(), before);

    let edited = solution
        .with_document(
            ProjectId::new(1),
            Document::new(DocumentId::new(1), "a.cs").with_declaration(Declaration::class("Other")),
        )
        .unwrap();
    assert_ne!(edited.checksum(), before);

    // The untouched project keeps its snapshot.
    assert!(edited
        .get(ProjectId::new(2))
        .unwrap()
        .ptr_eq(solution.get(ProjectId::new(2)).unwrap()));
}

#[test]
fn without_project_drops_it() {
    let solution = Solution::new([project(1, "A"), project(2, "B")]).unwrap();
    let smaller = solution.without_project(ProjectId::new(1)).unwrap();
    assert_eq!(smaller.project_ids(), [ProjectId::new(2)]);
    assert!(matches!(
        smaller.without_project(ProjectId::new(1)),
        Err(ProjectError::UnknownProject(_))
    ));
}

#[test]
fn loads_json_solution_files() {
    let solution = Solution::new([project(1, "A")]).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solution.json");
    std::fs::write(&path, serde_json::to_string_pretty(&SolutionFile::from(&solution)).unwrap())
        .unwrap();

    let loaded = load_solution(&path).unwrap();
    assert_eq!(loaded.checksum(), solution.checksum());

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(load_solution(&path), Err(ProjectError::Json { .. })));
    assert!(matches!(
        load_solution(dir.path().join("missing.json")),
        Err(ProjectError::Io { .. })
    ));
}
