use std::sync::Arc;

use nova_core::{
    DocumentId, ProjectId, SearchScope, SymbolFilter, SymbolKind, TextRange, TextSize,
};
use nova_index::{FindOptions, SearchQuery, SymbolOrigin, SymbolTreeIndex};
use nova_project::{Declaration, Document, ProjectInfo, Solution};
use nova_test_utils::{solution, solution_with, SolutionKind};

fn index_for(solution: &Solution) -> Arc<SymbolTreeIndex> {
    let project = solution.get(ProjectId::new(1)).unwrap();
    Arc::new(SymbolTreeIndex::build(project))
}

fn find(index: &SymbolTreeIndex, query: SearchQuery, options: FindOptions) -> Vec<String> {
    index
        .find(&query, &options)
        .into_iter()
        .map(|h| index.key(h).unwrap().to_string())
        .collect()
}

fn names(kind: SolutionKind, query: SearchQuery) -> Vec<String> {
    find(&index_for(&solution(kind)), query, FindOptions::default())
}

#[test]
fn exact_lookup_is_case_sensitive() {
    use SolutionKind::*;
    let cases: &[(&str, bool, SolutionKind, &[&str])] = &[
        ("testcase", true, SingleClass, &["TestCases.TestCase"]),
        ("testcase", false, SingleClass, &[]),
        ("testcases", true, SingleClass, &["TestCases"]),
        ("testcases", false, SingleClass, &[]),
        ("TestCase", true, SingleClass, &["TestCases.TestCase"]),
        ("TestCase", false, SingleClass, &["TestCases.TestCase"]),
        ("TestCases", false, SingleClass, &["TestCases"]),
        ("test", true, SingleClassWithSingleMethod, &["TestCases.TestCase.Test(string[])"]),
        ("test", false, SingleClassWithSingleMethod, &[]),
        ("Test", false, SingleClassWithSingleMethod, &["TestCases.TestCase.Test(string[])"]),
        ("testproperty", true, SingleClassWithSingleProperty, &["TestCases.TestCase.TestProperty"]),
        ("testproperty", false, SingleClassWithSingleProperty, &[]),
        ("TestField", false, SingleClassWithSingleField, &["TestCases.TestCase.TestField"]),
        ("testfield", false, SingleClassWithSingleField, &[]),
        ("innertestcase", true, NestedClass, &["TestCases.TestCase.InnerTestCase"]),
        ("innertestcase", false, NestedClass, &[]),
        ("InnerTestCase", false, NestedClass, &["TestCases.TestCase.InnerTestCase"]),
        ("testcase", true, TwoNamespacesWithIdenticalClasses, &["TestCase1.TestCase", "TestCase2.TestCase"]),
        ("testcase", false, TwoNamespacesWithIdenticalClasses, &[]),
        ("TestCase", false, TwoNamespacesWithIdenticalClasses, &["TestCase1.TestCase", "TestCase2.TestCase"]),
        ("TestCase1.TestCase", true, TwoNamespacesWithIdenticalClasses, &[]),
    ];

    for &(name, ignore_case, kind, expected) in cases {
        let actual = names(kind, SearchQuery::by_name(name, ignore_case));
        assert_eq!(actual, expected, "{name:?} ignore_case={ignore_case} {kind:?}");
    }
}

#[test]
fn ignore_case_is_a_superset_of_exact() {
    for kind in SolutionKind::ALL {
        let index = index_for(&solution(kind));
        for name in ["TestCase", "testcase", "Test", "TESTCASES", "InnerTestCase"] {
            let exact = find(&index, SearchQuery::exact(name), FindOptions::default());
            let folded = find(&index, SearchQuery::exact_ignore_case(name), FindOptions::default());
            for hit in &exact {
                assert!(folded.contains(hit), "{kind:?}: {hit} missing for {name:?}");
            }
        }
    }
}

#[test]
fn case_variants_are_distinct_nodes() {
    let solution = solution_with(vec![
        Declaration::class("Foo"),
        Declaration::class("foo"),
        Declaration::class("FOO"),
    ]);
    let index = index_for(&solution);
    assert_eq!(find(&index, SearchQuery::exact("foo"), FindOptions::default()), ["foo"]);
    assert_eq!(
        find(&index, SearchQuery::exact_ignore_case("foo"), FindOptions::default()),
        ["Foo", "foo", "FOO"]
    );
}

#[test]
fn blank_names_find_nothing() {
    for kind in [SolutionKind::SingleClass, SolutionKind::SingleClassWithAll] {
        let index = index_for(&solution(kind));
        for filter in [SymbolFilter::ALL, SymbolFilter::TYPE, SymbolFilter::MEMBER] {
            let options = FindOptions::default().with_filter(filter);
            for name in ["", " ", "\t\n"] {
                assert!(find(&index, SearchQuery::exact(name), options).is_empty());
                assert!(find(&index, SearchQuery::exact_ignore_case(name), options).is_empty());
                assert!(find(&index, SearchQuery::fuzzy(name), options).is_empty());
            }
        }
    }
    assert!(names(SolutionKind::SingleClass, SearchQuery::exact_ignore_case("\u{2619}")).is_empty());
}

#[test]
fn none_filter_finds_nothing() {
    let index = index_for(&solution(SolutionKind::SingleClassWithAll));
    let options = FindOptions::default().with_filter(SymbolFilter::NONE);
    assert!(find(&index, SearchQuery::predicate(|_| true), options).is_empty());
    assert!(find(&index, SearchQuery::fuzzy("test"), options).is_empty());
}

#[test]
fn fuzzy_pattern_matches_prefixes_and_humps() {
    use SolutionKind::*;
    let cases: &[(SolutionKind, &str, &[&str])] = &[
        (SingleClass, "tc", &["TestCases", "TestCases.TestCase"]),
        (SingleClassWithSingleMethod, "tc", &["TestCases", "TestCases.TestCase"]),
        (SingleClassWithSingleProperty, "tp", &["TestCases.TestCase.TestProperty"]),
        (SingleClassWithSingleField, "tf", &["TestCases.TestCase.TestField"]),
        (SingleClass, "test", &["TestCases", "TestCases.TestCase"]),
        (
            NestedClass,
            "test",
            &["TestCases", "TestCases.TestCase", "TestCases.TestCase.InnerTestCase"],
        ),
        (
            TwoNamespacesWithIdenticalClasses,
            "test",
            &["TestCase1", "TestCase1.TestCase", "TestCase2", "TestCase2.TestCase"],
        ),
    ];

    for &(kind, pattern, expected) in cases {
        let mut actual = names(kind, SearchQuery::fuzzy(pattern));
        let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        actual.sort();
        expected.sort();
        assert_eq!(actual, expected, "{pattern:?} {kind:?}");
    }
}

#[test]
fn fuzzy_results_are_ranked() {
    let actual = names(SolutionKind::SingleClassWithSingleMethod, SearchQuery::fuzzy("test"));
    assert_eq!(
        actual,
        [
            "TestCases.TestCase.Test(string[])",
            "TestCases.TestCase",
            "TestCases",
        ]
    );
}

#[test]
fn pattern_characters_are_literal() {
    for pattern in [
        "test*",
        "test?",
        "test[c]ase",
        "test\\case",
        "Te$tCa$e",
        "Test_Case",
        "Test123",
        "テストケース",
    ] {
        assert!(
            names(SolutionKind::SingleClass, SearchQuery::fuzzy(pattern)).is_empty(),
            "{pattern:?}"
        );
    }
}

#[test]
fn edit_distance_only_applies_when_nothing_else_matched() {
    let index = index_for(&solution(SolutionKind::SingleClass));
    let hits = find(&index, SearchQuery::fuzzy("TestCsae"), FindOptions::default());
    assert_eq!(hits.first().map(String::as_str), Some("TestCases.TestCase"));

    let strict = FindOptions {
        edit_distance_fallback: false,
        ..FindOptions::default()
    };
    assert!(find(&index, SearchQuery::fuzzy("TestCsae"), strict).is_empty());
}

#[test]
fn filters_select_categories() {
    let index = index_for(&solution(SolutionKind::SingleClassWithAll));
    let by_filter = |filter| {
        let mut hits = find(
            &index,
            SearchQuery::fuzzy("test"),
            FindOptions::default().with_filter(filter),
        );
        hits.sort();
        hits
    };

    assert_eq!(by_filter(SymbolFilter::NAMESPACE), ["TestCases"]);
    assert_eq!(
        by_filter(SymbolFilter::TYPE),
        ["TestCases.TestCase", "TestCases.TestCase.InnerTestCase"]
    );
    assert_eq!(
        by_filter(SymbolFilter::MEMBER),
        [
            "TestCases.TestCase.Test(string[])",
            "TestCases.TestCase.TestField",
            "TestCases.TestCase.TestProperty",
        ]
    );
    assert_eq!(by_filter(SymbolFilter::ALL).len(), 6);
}

#[test]
fn predicate_scans_every_symbol_in_handle_order() {
    let index = index_for(&solution(SolutionKind::SingleClassWithSingleMethod));
    assert_eq!(
        find(&index, SearchQuery::predicate(|name| name.contains("Test")), FindOptions::default()),
        ["TestCases", "TestCases.TestCase", "TestCases.TestCase.Test(string[])"]
    );
    assert!(find(&index, SearchQuery::predicate(|_| false), FindOptions::default()).is_empty());
}

#[test]
fn metadata_is_only_searched_when_requested() {
    let index = index_for(&solution(SolutionKind::SingleClass));
    let with_metadata = FindOptions::default().with_scope(SearchScope::SourceAndMetadata);

    assert!(find(&index, SearchQuery::exact("String"), FindOptions::default()).is_empty());
    assert_eq!(
        find(&index, SearchQuery::exact("String"), with_metadata),
        ["System.String"]
    );
    // Non-public library surface is never indexed.
    assert!(find(&index, SearchQuery::exact("m_firstChar"), with_metadata).is_empty());
    assert!(find(&index, SearchQuery::exact("TestCaseHelpers"), with_metadata).is_empty());

    let handle = index.find(&SearchQuery::exact("Length"), &with_metadata)[0];
    let info = index.info(handle).unwrap();
    assert_eq!(info.origin, SymbolOrigin::Metadata);
    assert!(info.locations.is_empty());
}

#[test]
fn partial_declarations_merge() {
    let info = ProjectInfo::new(ProjectId::new(1), "P", "P", "C#")
        .unwrap()
        .with_documents([
            Document::new(DocumentId::new(1), "File1.cs").with_declaration(
                Declaration::class("PartialType")
                    .with_range(0, 40)
                    .with_child(Declaration::method("Method1", Vec::<String>::new())),
            ),
            Document::new(DocumentId::new(2), "File2.cs").with_declaration(
                Declaration::class("PartialType")
                    .with_range(10, 50)
                    .with_child(Declaration::method("Method2", Vec::<String>::new())),
            ),
        ])
        .unwrap();
    let solution = Solution::new([info]).unwrap();
    let index = index_for(&solution);

    let hits = index.find(&SearchQuery::fuzzy("partial"), &FindOptions::default());
    assert_eq!(hits.len(), 1);
    let locations = &index.info(hits[0]).unwrap().locations;
    assert_eq!(locations.len(), 2);
    assert_eq!(locations[1].document, DocumentId::new(2));
    assert_eq!(
        locations[1].range,
        TextRange::new(TextSize::from(10), TextSize::from(50))
    );

    let methods = find(
        &index,
        SearchQuery::fuzzy("method"),
        FindOptions::default().with_filter(SymbolFilter::MEMBER),
    );
    assert_eq!(methods, ["PartialType.Method1()", "PartialType.Method2()"]);
}

#[test]
fn overloads_stay_separate_symbols() {
    let solution = solution_with(vec![Declaration::class("C")
        .with_child(Declaration::method("M", ["int"]))
        .with_child(Declaration::method("M", ["string"]))
        .with_child(Declaration::class("G").with_arity(1))
        .with_child(Declaration::class("G"))]);
    let index = index_for(&solution);
    assert_eq!(
        find(&index, SearchQuery::exact("M"), FindOptions::default()),
        ["C.M(int)", "C.M(string)"]
    );
    assert_eq!(
        find(&index, SearchQuery::exact("G"), FindOptions::default()),
        ["C.G`1", "C.G"]
    );
}

#[test]
fn malformed_declarations_still_index_members() {
    let solution = solution_with(vec![
        Declaration::namespace("  ").with_child(
            Declaration::class(" Recovered ").with_child(Declaration::field("Value")),
        ),
        Declaration::class(""),
    ]);
    let index = index_for(&solution);
    assert_eq!(
        find(&index, SearchQuery::exact("Recovered"), FindOptions::default()),
        ["Recovered"]
    );
    assert_eq!(
        find(&index, SearchQuery::exact("Value"), FindOptions::default()),
        ["Recovered.Value"]
    );
    assert!(index.root().name().is_empty());
    assert!(index.root().symbols().is_empty());
}

#[test]
fn build_is_deterministic() {
    for kind in SolutionKind::ALL {
        let solution = solution(kind);
        let project = solution.get(ProjectId::new(1)).unwrap();
        assert_eq!(SymbolTreeIndex::build(project), SymbolTreeIndex::build(project), "{kind:?}");
    }
}

#[test]
fn handles_follow_declaration_pre_order() {
    let index = index_for(&solution(SolutionKind::SingleClassWithAll));
    for handle in index.handles() {
        let info = index.info(handle).unwrap();
        if let Some(parent) = info.parent {
            assert!(parent < handle);
            let parent_node = index.info(parent).unwrap().node;
            assert_eq!(index.node(info.node).unwrap().parent(), Some(parent_node));
        }
        assert!(!index.node(info.node).unwrap().symbols().is_empty());
    }
}

#[test]
fn keys_resolve_back_to_their_symbols() {
    for kind in SolutionKind::ALL {
        let index = index_for(&solution(kind));
        for handle in index.handles() {
            let key = index.key(handle).unwrap();
            assert_eq!(index.resolve_key(&key), Some(handle), "{kind:?}: {key}");
        }
    }
}

#[test]
fn live_symbols_expose_their_declaration() {
    let index = index_for(&solution(SolutionKind::SingleClassWithSingleMethod));
    let handle = index.find(&SearchQuery::exact("Test"), &FindOptions::default())[0];
    let symbol = index.symbol(ProjectId::new(1), handle).unwrap();

    assert_eq!(symbol.name(), "Test");
    assert_eq!(symbol.kind(), SymbolKind::Method);
    assert_eq!(symbol.parameters(), ["string[]"]);
    assert_eq!(symbol.display(), "TestCases.TestCase.Test(string[])");
    assert_eq!(symbol.locations().len(), 1);
    let container = symbol.container().unwrap();
    assert_eq!(container.display(), "TestCases.TestCase");
    assert_eq!(container.container().unwrap().kind(), SymbolKind::Namespace);
}

#[test]
fn source_type_shadowing_a_library_type_keeps_its_own_key() {
    let index = index_for(&solution_with(vec![
        Declaration::namespace("System").with_child(Declaration::class("String"))
    ]));
    let with_metadata = FindOptions::default().with_scope(SearchScope::SourceAndMetadata);

    let handles = index.find(&SearchQuery::exact("String"), &with_metadata);
    assert_eq!(handles.len(), 2);
    let keys: Vec<_> = handles.iter().map(|&h| index.key(h).unwrap()).collect();
    assert_eq!(keys[0].to_string(), keys[1].to_string());
    assert_ne!(keys[0], keys[1]);

    for (&handle, key) in handles.iter().zip(&keys) {
        assert_eq!(key.origin(), index.info(handle).unwrap().origin);
        assert_eq!(index.resolve_key(key), Some(handle), "{key:?}");
    }
}
