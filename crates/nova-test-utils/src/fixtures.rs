use nova_core::{Accessibility, DocumentId, ProjectId, SymbolKind};
use nova_project::{Declaration, Document, MetadataReference, ProjectInfo, Solution};

/// Number of projects in [`SolutionKind::LargeSolution`].
pub const LARGE_SOLUTION_PROJECTS: u32 = 8;

/// Canonical solution shapes.
///
/// Unless noted otherwise every project holds one document declaring
/// `namespace TestCases { class TestCase { .. } }`, and references `mscorlib`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolutionKind {
    SingleClass,
    SingleClassWithSingleMethod,
    SingleClassWithSingleProperty,
    SingleClassWithSingleField,
    TwoProjectsEachWithASingleClassWithSingleMethod,
    TwoProjectsEachWithASingleClassWithSingleProperty,
    TwoProjectsEachWithASingleClassWithSingleField,
    /// `TestCases.TestCase.InnerTestCase`.
    NestedClass,
    /// `TestCase1.TestCase` and `TestCase2.TestCase` in one document.
    TwoNamespacesWithIdenticalClasses,
    /// A method, a property, a field and a nested class in one `TestCase`.
    SingleClassWithAll,
    /// [`LARGE_SOLUTION_PROJECTS`] projects of generated namespaces and classes.
    LargeSolution,
}

impl SolutionKind {
    pub const ALL: [SolutionKind; 11] = [
        SolutionKind::SingleClass,
        SolutionKind::SingleClassWithSingleMethod,
        SolutionKind::SingleClassWithSingleProperty,
        SolutionKind::SingleClassWithSingleField,
        SolutionKind::TwoProjectsEachWithASingleClassWithSingleMethod,
        SolutionKind::TwoProjectsEachWithASingleClassWithSingleProperty,
        SolutionKind::TwoProjectsEachWithASingleClassWithSingleField,
        SolutionKind::NestedClass,
        SolutionKind::TwoNamespacesWithIdenticalClasses,
        SolutionKind::SingleClassWithAll,
        SolutionKind::LargeSolution,
    ];

    pub fn project_count(self) -> u32 {
        match self {
            SolutionKind::TwoProjectsEachWithASingleClassWithSingleMethod
            | SolutionKind::TwoProjectsEachWithASingleClassWithSingleProperty
            | SolutionKind::TwoProjectsEachWithASingleClassWithSingleField => 2,
            SolutionKind::LargeSolution => LARGE_SOLUTION_PROJECTS,
            _ => 1,
        }
    }
}

/// Builds the solution for `kind`.
pub fn solution(kind: SolutionKind) -> Solution {
    if kind == SolutionKind::LargeSolution {
        return large_solution(LARGE_SOLUTION_PROJECTS, 16);
    }
    let declarations = declarations(kind);
    let infos = (1..=kind.project_count()).map(|n| project_with(n, declarations.clone()));
    Solution::new(infos).expect("fixture solution is valid")
}

/// A single-project solution whose only document holds `declarations`.
pub fn solution_with(declarations: Vec<Declaration>) -> Solution {
    Solution::new([project_with(1, declarations)]).expect("fixture solution is valid")
}

/// Project `n` (named `TestProject{n}`) with one document holding
/// `declarations` and a reference to [`mscorlib`].
pub fn project_with(n: u32, declarations: Vec<Declaration>) -> ProjectInfo {
    let mut document = Document::new(DocumentId::new(1), "TestDocument.cs");
    document.declarations = declarations;
    ProjectInfo::new(
        ProjectId::new(n),
        format!("TestProject{n}"),
        format!("TestProject{n}"),
        "C#",
    )
    .and_then(|info| info.with_documents([document]))
    .and_then(|info| info.with_metadata_references([mscorlib()]))
    .expect("fixture project is valid")
}

/// `projects` projects, each declaring `Generated{p}.Module{m}.TestCase{m}`
/// classes for `m` in `0..classes`, plus one shared `TestCases.TestCase`.
pub fn large_solution(projects: u32, classes: u32) -> Solution {
    let infos = (1..=projects).map(|p| {
        let mut root = Declaration::namespace(format!("Generated{p}"));
        for m in 0..classes {
            root = root.with_child(
                Declaration::namespace(format!("Module{m}")).with_child(
                    Declaration::class(format!("TestCase{m}"))
                        .with_child(Declaration::method("Run", Vec::<String>::new()))
                        .with_child(Declaration::property(format!("Value{m}"))),
                ),
            );
        }
        project_with(p, vec![root, test_case(Vec::new())])
    });
    Solution::new(infos).expect("fixture solution is valid")
}

/// A small stand-in for the core library: `System.Object`, `System.String`
/// with a public `Length`, and an internal type that searches never see.
pub fn mscorlib() -> MetadataReference {
    MetadataReference::new("mscorlib").with_declaration(
        Declaration::namespace("System")
            .with_child(Declaration::class("Object"))
            .with_child(
                Declaration::class("String")
                    .with_child(Declaration::property("Length"))
                    .with_child(
                        Declaration::field("m_firstChar")
                            .with_accessibility(Accessibility::Private),
                    ),
            )
            .with_child(
                Declaration::new(SymbolKind::Interface, "IComparable").with_arity(1),
            )
            .with_child(
                Declaration::class("TestCaseHelpers").with_accessibility(Accessibility::Internal),
            ),
    )
}

fn test_case(members: Vec<Declaration>) -> Declaration {
    Declaration::namespace("TestCases")
        .with_range(0, 200)
        .with_child(
            Declaration::class("TestCase")
                .with_range(24, 190)
                .with_children(members),
        )
}

fn method() -> Declaration {
    Declaration::method("Test", ["string[]"]).with_range(60, 100)
}

fn property() -> Declaration {
    Declaration::property("TestProperty").with_range(104, 140)
}

fn field() -> Declaration {
    Declaration::field("TestField").with_range(144, 170)
}

fn declarations(kind: SolutionKind) -> Vec<Declaration> {
    match kind {
        SolutionKind::SingleClass => vec![test_case(Vec::new())],
        SolutionKind::SingleClassWithSingleMethod
        | SolutionKind::TwoProjectsEachWithASingleClassWithSingleMethod => {
            vec![test_case(vec![method()])]
        }
        SolutionKind::SingleClassWithSingleProperty
        | SolutionKind::TwoProjectsEachWithASingleClassWithSingleProperty => {
            vec![test_case(vec![property()])]
        }
        SolutionKind::SingleClassWithSingleField
        | SolutionKind::TwoProjectsEachWithASingleClassWithSingleField => {
            vec![test_case(vec![field()])]
        }
        SolutionKind::NestedClass => vec![test_case(vec![
            Declaration::class("InnerTestCase").with_range(60, 100)
        ])],
        SolutionKind::TwoNamespacesWithIdenticalClasses => vec![
            Declaration::namespace("TestCase1")
                .with_range(0, 60)
                .with_child(Declaration::class("TestCase").with_range(24, 50)),
            Declaration::namespace("TestCase2")
                .with_range(62, 122)
                .with_child(Declaration::class("TestCase").with_range(86, 112)),
        ],
        SolutionKind::SingleClassWithAll => vec![test_case(vec![
            method(),
            property(),
            field(),
            Declaration::class("InnerTestCase").with_range(172, 186),
        ])],
        SolutionKind::LargeSolution => Vec::new(),
    }
}
