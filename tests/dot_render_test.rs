use dotview::Error;
use dotview::config::{ConfigOverrides, RankDir};
use dotview::dot_parser::parse_dot;
use dotview::graph_layout::LayoutResult;
use pretty_assertions::assert_eq;

fn layout_of(dot: &str) -> LayoutResult {
    dotview::run_pipeline(dot, &ConfigOverrides::default())
        .unwrap()
        .layout
}

fn rank(result: &LayoutResult, id: &str) -> usize {
    result.node(id).unwrap().rank
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn dot_transitive_chain() {
    let model = parse_dot("digraph{a->b;b->c;a->c;}").unwrap();
    assert_eq!(model.nodes, vec!["a", "b", "c"]);
    assert_eq!(model.edge_count(), 3);

    let result = layout_of("digraph{a->b;b->c;a->c;}");
    assert_eq!(result.nodes.len(), 3);
    assert_eq!(
        (rank(&result, "a"), rank(&result, "b"), rank(&result, "c")),
        (0, 1, 2)
    );
    for node in &result.nodes {
        assert!(result.width() > node.rect.width);
        assert!(result.height() > node.rect.height);
    }
}

#[test]
fn dot_undirected_pair() {
    let model = parse_dot("graph{x--y;}").unwrap();
    assert!(!model.directed);
    assert_eq!(model.node_count(), 2);
    assert_eq!(model.edge_count(), 1);

    let result = layout_of("graph{x--y;}");
    assert!(result.edges.iter().all(|e| !e.reversed));
}

#[test]
fn dot_missing_target_is_a_parse_error() {
    let err = dotview::render_dot("digraph{a->;}").unwrap_err();
    let Error::Parse(parse) = err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert_eq!((parse.line, parse.column), (1, 12));
    assert!(parse.to_string().contains("line 1, column 12"));
}

// =============================================================================
// Direction
// =============================================================================

#[test]
fn dot_rankdir_td_same_as_tb() {
    let td = dotview::render_dot("digraph { rankdir=TD; a -> b }").unwrap();
    let tb = dotview::render_dot("digraph { rankdir=TB; a -> b }").unwrap();
    assert_eq!(td, tb);
}

#[test]
fn dot_rankdir_lr_runs_left_to_right() {
    let result = layout_of("digraph { rankdir=LR; a -> b -> c }");
    let xs: Vec<f64> = ["a", "b", "c"]
        .iter()
        .map(|id| result.node(id).unwrap().rect.x)
        .collect();
    assert!(xs[0] < xs[1] && xs[1] < xs[2]);
    assert!(result.width() > result.height());
}

#[test]
fn dot_rankdir_rl_runs_right_to_left() {
    let result = layout_of("digraph { rankdir=RL; a -> b }");
    let a = result.node("a").unwrap().rect;
    let b = result.node("b").unwrap().rect;
    assert!(a.x > b.right());
}

#[test]
fn dot_command_line_beats_graph_attribute() {
    let overrides = ConfigOverrides {
        rank_dir: Some(RankDir::TopBottom),
        rank_sep: Some(100.0),
        ..ConfigOverrides::default()
    };
    let diagram = dotview::run_pipeline("digraph { rankdir=LR; a -> b }", &overrides).unwrap();
    let a = diagram.layout.node("a").unwrap().rect;
    let b = diagram.layout.node("b").unwrap().rect;
    assert_eq!(b.y - a.bottom(), 100.0);
}

#[test]
fn dot_negative_separation_override_keeps_nodes_apart() {
    let overrides = ConfigOverrides {
        node_sep: Some(-30.0),
        ..ConfigOverrides::default()
    };
    let diagram = dotview::run_pipeline("digraph { a; b }", &overrides).unwrap();
    let a = diagram.layout.node("a").unwrap().rect;
    let b = diagram.layout.node("b").unwrap().rect;
    let gap = (b.x - a.right()).max(a.x - b.right());
    assert!(gap >= 50.0 - 1e-9, "gap {gap}");
}

// =============================================================================
// Nodes
// =============================================================================

#[test]
fn dot_node_label_defaults_to_id() {
    let result = layout_of("digraph { MyNode -> Other }");
    assert_eq!(result.node("MyNode").unwrap().label_lines, vec!["MyNode"]);
}

#[test]
fn dot_node_label_attribute() {
    let result = layout_of(r#"digraph { a [label="Hello World"] }"#);
    assert_eq!(result.node("a").unwrap().label_lines, vec!["Hello World"]);
}

#[test]
fn dot_node_label_expands_node_name() {
    let result = layout_of(r#"digraph { node [label="<\N>"]; a }"#);
    assert_eq!(result.node("a").unwrap().label_lines, vec!["<a>"]);
}

#[test]
fn dot_wide_characters_widen_nodes() {
    let result = layout_of(r#"digraph { a [label="ab"]; b [label="日本"] }"#);
    let narrow = result.node("a").unwrap().rect.width;
    let wide = result.node("b").unwrap().rect.width;
    assert_eq!(wide - narrow, 2.0 * 8.0);
}

#[test]
fn dot_isolated_nodes_share_rank_zero() {
    let result = layout_of("digraph { a; b; c }");
    assert!(result.nodes.iter().all(|n| n.rank == 0));
    let mut orders: Vec<usize> = result.nodes.iter().map(|n| n.order).collect();
    orders.sort();
    assert_eq!(orders, vec![0, 1, 2]);
}

// =============================================================================
// Edges
// =============================================================================

#[test]
fn dot_cycle_keeps_declared_direction() {
    let result = layout_of("digraph { a -> b -> c -> a }");
    let back = result
        .edges
        .iter()
        .find(|e| e.source == "c" && e.target == "a")
        .unwrap();
    assert!(back.reversed);
    let c = result.node("c").unwrap().rect;
    let a = result.node("a").unwrap().rect;
    let start = back.points[0];
    let end = *back.points.last().unwrap();
    assert!(start.distance(c.center()) < end.distance(c.center()));
    assert!(end.distance(a.center()) < start.distance(a.center()));
}

#[test]
fn dot_parallel_edges_are_kept() {
    let result = layout_of("digraph { a -> b; a -> b; a -> b }");
    assert_eq!(result.edges.len(), 3);
    let mids: Vec<f64> = result.edges.iter().map(|e| e.points[1].x).collect();
    assert!(mids[0] < mids[1] && mids[1] < mids[2]);
}

#[test]
fn dot_strict_graph_merges_edges() {
    let result = layout_of("strict digraph { a -> b; a -> b [color=red] }");
    assert_eq!(result.edges.len(), 1);
    assert_eq!(result.edges[0].attributes.get("color").map(String::as_str), Some("red"));
}

#[test]
fn dot_subgraph_members_are_flattened() {
    let result = layout_of("digraph { subgraph cluster_x { a -> b } b -> c }");
    assert_eq!(result.nodes.len(), 3);
    assert_eq!(rank(&result, "c"), 2);
}

#[test]
fn dot_edge_label_grows_bounding_box() {
    let plain = layout_of("digraph { a -> b }");
    let labelled = layout_of(r#"digraph { a -> b [label="a rather long label"] }"#);
    assert!(labelled.width() > plain.width());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn dot_unbalanced_braces() {
    assert!(matches!(
        dotview::render_dot("digraph { a -> b"),
        Err(Error::Parse(_))
    ));
    assert!(matches!(
        dotview::render_dot("digraph { a } }"),
        Err(Error::Parse(_))
    ));
}

#[test]
fn dot_unterminated_string() {
    let Err(Error::Parse(err)) = dotview::render_dot("digraph { a [label=\"oops] }") else {
        panic!("expected a parse error");
    };
    assert!(err.message.contains("unterminated"), "{}", err.message);
}

#[test]
fn dot_error_snippet_is_truncated() {
    let long = format!("digraph {{ a -> ; {} }}", "b ".repeat(40));
    let Err(Error::Parse(err)) = dotview::render_dot(&long) else {
        panic!("expected a parse error");
    };
    assert!(err.snippet.ends_with("..."));
    assert_eq!(err.snippet.chars().count(), 43);
}

#[test]
fn dot_deeply_nested_subgraphs_are_a_parse_error() {
    let dot = format!("digraph {{ {} a {} }}", "{".repeat(20_000), "}".repeat(20_000));
    let Err(Error::Parse(err)) = dotview::render_dot(&dot) else {
        panic!("expected a parse error");
    };
    assert_eq!(err.message, "subgraphs nested too deeply");
}

#[test]
fn dot_huge_minlen_renders() {
    let result = layout_of("digraph { a -> b [minlen=18446744073709551615]; b -> c }");
    assert!(rank(&result, "b") < rank(&result, "c"));
    assert!(result.height() < 20_000.0);
}
