use conceptweb_core::{ConceptKey, Lattice, Page, PageCorpus};

fn corpus(titles: &[(&str, &str)]) -> PageCorpus {
    let pages = titles
        .iter()
        .map(|(id, title)| Page::from_title_line(format!("/notes/{id}.md"), title))
        .collect();
    PageCorpus::from_pages("/notes", pages)
}

fn child_labels(lattice: &Lattice<'_>, tags: &[&str]) -> Vec<String> {
    let node = lattice.node_for_tags(tags).unwrap();
    lattice
        .labeled_children(node)
        .unwrap()
        .into_iter()
        .map(|(label, _)| label.to_string())
        .collect()
}

#[test]
fn shared_tag_collects_pages_without_linking_unrelated_concepts() {
    let corpus = corpus(&[("p1", "# *Favorite* Food"), ("p2", "# *Favorite* Drink")]);
    let lattice = Lattice::build(&corpus);

    assert_eq!(lattice.len(), 1);
    assert_eq!(lattice.edge_count(), 0);
    let favorite = lattice.node_for_tags(&["Favorite"]).unwrap();
    let titles: Vec<&str> = lattice
        .pages_of(favorite)
        .into_iter()
        .map(|page| page.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Favorite Drink", "Favorite Food"]);
}

#[test]
fn three_tags_produce_the_full_subset_lattice() {
    let corpus = corpus(&[("p1", "# *A* *B* *C* Item")]);
    let lattice = Lattice::build(&corpus);

    assert_eq!(lattice.len(), 7);
    for tags in [
        vec!["A", "B", "C"],
        vec!["A", "B"],
        vec!["A", "C"],
        vec!["B", "C"],
        vec!["A"],
        vec!["B"],
        vec!["C"],
    ] {
        assert!(lattice.node_for_tags(&tags).is_some(), "missing {tags:?}");
    }

    assert_eq!(child_labels(&lattice, &["A", "B", "C"]), vec!["A", "B", "C"]);
    assert_eq!(child_labels(&lattice, &["A", "B"]), vec!["A", "B"]);
    assert!(child_labels(&lattice, &["A"]).is_empty());

    let top = lattice.node_for_tags(&["A", "B", "C"]).unwrap();
    let to_ab = lattice
        .labeled_children(top)
        .unwrap()
        .into_iter()
        .find(|(label, _)| *label == "C")
        .map(|(_, child)| child.key().clone())
        .unwrap();
    assert_eq!(Some(to_ab), ConceptKey::from_tags(&["A", "B"]));

    let stats = lattice.stats();
    assert_eq!(stats.edges, 9);
    assert_eq!(stats.leaf_nodes, 3);
    assert_eq!(stats.attached_pages, 1);
}

#[test]
fn edges_into_single_tag_concepts_number_six_for_three_tags() {
    let corpus = corpus(&[("p1", "# *A* *B* *C* Item")]);
    let lattice = Lattice::build(&corpus);

    let into_leaves: usize = lattice
        .leaves()
        .map(|leaf| leaf.parents().count())
        .sum();
    assert_eq!(into_leaves, 6);
}

#[test]
fn refinements_point_back_to_larger_sets() {
    let corpus = corpus(&[("p1", "# *A* *B* *C* Item")]);
    let lattice = Lattice::build(&corpus);

    let a = lattice.node_for_tags(&["a"]).unwrap();
    let labels: Vec<&str> = lattice
        .labeled_parents(a)
        .unwrap()
        .into_iter()
        .map(|(label, _)| label)
        .collect();
    assert_eq!(labels, vec!["B", "C"]);
}

#[test]
fn identity_ignores_order_and_case() {
    let corpus = corpus(&[
        ("p1", "# *Food* *Favorite* pizza"),
        ("p2", "# *favorite* *food* pasta"),
    ]);
    let lattice = Lattice::build(&corpus);

    let first = ConceptKey::from_tags(&["Food", "Favorite"]).unwrap();
    let second = ConceptKey::from_tags(&["favorite", "food"]).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.identity(), second.identity());

    let node = lattice.node(&first).unwrap();
    assert_eq!(node.page_count(), 2);
    assert_eq!(lattice.len(), 3);
}

#[test]
fn untagged_pages_produce_no_nodes() {
    let corpus = corpus(&[("p1", "# Plain title"), ("p2", "# *two words* only")]);
    let lattice = Lattice::build(&corpus);

    assert!(lattice.is_empty());
    assert_eq!(lattice.stats().untagged_pages, 2);
}

#[test]
fn graph_shape_does_not_depend_on_page_order() {
    let forward = corpus(&[
        ("p1", "# *A* *B* *C* x"),
        ("p2", "# *B* *D* y"),
        ("p3", "# *C* z"),
    ]);
    let backward = corpus(&[
        ("p3", "# *C* z"),
        ("p2", "# *D* *B* y"),
        ("p1", "# *C* *A* *B* x"),
    ]);
    let left = Lattice::build(&forward);
    let right = Lattice::build(&backward);

    let shape = |lattice: &Lattice<'_>| -> Vec<(String, Vec<String>)> {
        lattice
            .nodes()
            .map(|node| {
                (
                    node.key().folded().to_string(),
                    node.children().map(|key| key.folded().to_string()).collect(),
                )
            })
            .collect()
    };
    assert_eq!(shape(&left), shape(&right));
    assert_eq!(left.stats(), right.stats());
}
