use std::collections::HashSet;

use winnow::ModalResult;
use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, cut_err, fail, opt, repeat};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::{one_of, take_till, take_until, take_while};

use crate::error::ParseError;
use crate::graph_model::{Attributes, Edge, GraphModel};

/// Parse DOT text into a graph model.
///
/// Subgraphs are flattened into the top-level model; `node [..]` and
/// `edge [..]` defaults apply to declarations that follow them in the same
/// block or in nested blocks.
pub fn parse_dot(text: &str) -> Result<GraphModel, ParseError> {
    let mut input = text;
    let document = document(&mut input).map_err(|err| {
        let offset = text.len() - input.len();
        ParseError::at(text, offset, describe(err, input.is_empty()))
    })?;
    if !input.is_empty() {
        let offset = text.len() - input.len();
        return Err(ParseError::at(text, offset, "unexpected input after graph"));
    }

    let model = lower(document);
    tracing::debug!(
        nodes = model.node_count(),
        edges = model.edge_count(),
        directed = model.directed,
        "parsed DOT graph"
    );
    Ok(model)
}

fn describe(err: ErrMode<ContextError>, at_end: bool) -> String {
    let inner = match err {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => ContextError::new(),
    };
    let mut label = None;
    let mut expected = Vec::new();
    for ctx in inner.context() {
        match ctx {
            StrContext::Label(l) => {
                label.get_or_insert(*l);
            }
            StrContext::Expected(v) => expected.push(v.to_string()),
            _ => {}
        }
    }
    match (label, expected.first()) {
        (Some(l), _) => l.to_string(),
        (None, Some(e)) => format!("expected {e}"),
        (None, None) if at_end => "unexpected end of input".to_string(),
        (None, None) => "unexpected input".to_string(),
    }
}

/// Deepest subgraph nesting accepted; parsing and lowering recurse per level.
const MAX_NESTING: usize = 128;

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

// ── Syntax tree ─────────────────────────────────────────────────────

#[derive(Debug)]
struct Document {
    strict: bool,
    directed: bool,
    name: Option<String>,
    stmts: Vec<Stmt>,
}

#[derive(Debug)]
enum Stmt {
    Node(String, Vec<(String, String)>),
    Edge(Vec<Endpoint>, Vec<(String, String)>),
    Attr(AttrTarget, Vec<(String, String)>),
    Subgraph(Subgraph),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AttrTarget {
    Graph,
    Node,
    Edge,
}

#[derive(Debug)]
struct Subgraph {
    stmts: Vec<Stmt>,
}

#[derive(Debug)]
enum Endpoint {
    Node(String),
    Subgraph(Subgraph),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Keyword {
    Strict,
    Graph,
    Digraph,
    Subgraph,
    Node,
    Edge,
}

fn keyword(word: &str) -> Option<Keyword> {
    match word.to_ascii_lowercase().as_str() {
        "strict" => Some(Keyword::Strict),
        "graph" => Some(Keyword::Graph),
        "digraph" => Some(Keyword::Digraph),
        "subgraph" => Some(Keyword::Subgraph),
        "node" => Some(Keyword::Node),
        "edge" => Some(Keyword::Edge),
        _ => None,
    }
}

// ── Lexical layer ───────────────────────────────────────────────────

fn ws(input: &mut &str) -> ModalResult<()> {
    repeat(
        0..,
        alt((
            take_while(1.., char::is_whitespace).void(),
            line_comment,
            block_comment,
        )),
    )
    .parse_next(input)
}

fn line_comment(input: &mut &str) -> ModalResult<()> {
    (alt(("//", "#")), take_till(0.., '\n'))
        .void()
        .parse_next(input)
}

fn block_comment(input: &mut &str) -> ModalResult<()> {
    let open = input.checkpoint();
    "/*".parse_next(input)?;
    if opt((take_until(0.., "*/"), "*/")).parse_next(input)?.is_none() {
        input.reset(&open);
        return cut_err(fail)
            .context(StrContext::Label("unterminated comment"))
            .parse_next(input);
    }
    Ok(())
}

fn identifier<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_' || !c.is_ascii()),
        take_while(0.., |c: char| {
            c.is_alphanumeric() || c == '_' || (!c.is_ascii() && !c.is_whitespace())
        }),
    )
        .take()
        .parse_next(input)
}

fn numeral<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        opt('-'),
        alt((('.', digit1).void(), (digit1, opt(('.', digit0))).void())),
    )
        .take()
        .parse_next(input)
}

fn plain_id(input: &mut &str) -> ModalResult<String> {
    let checkpoint = input.checkpoint();
    let word = identifier.parse_next(input)?;
    if keyword(word).is_some() {
        input.reset(&checkpoint);
        return fail(input);
    }
    Ok(word.to_string())
}

/// One double-quoted string, possibly joined to more with `+`.
fn quoted_string(input: &mut &str) -> ModalResult<String> {
    let mut value = quoted_part.parse_next(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws.parse_next(input)?;
        if opt('+').parse_next(input)?.is_none() {
            input.reset(&checkpoint);
            break;
        }
        ws.parse_next(input)?;
        let next = cut_err(quoted_part)
            .context(expected("quoted string after `+`"))
            .parse_next(input)?;
        value.push_str(&next);
    }
    Ok(value)
}

fn quoted_part(input: &mut &str) -> ModalResult<String> {
    let open = input.checkpoint();
    '"'.parse_next(input)?;
    let mut value = String::new();
    loop {
        match input.next_token() {
            Some('"') => return Ok(value),
            Some('\\') => match input.next_token() {
                Some('"') => value.push('"'),
                // line continuation
                Some('\n') => {}
                Some('\r') => {
                    opt('\n').parse_next(input)?;
                }
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => break,
            },
            Some(c) => value.push(c),
            None => break,
        }
    }
    input.reset(&open);
    cut_err(fail)
        .context(StrContext::Label("unterminated string"))
        .parse_next(input)
}

/// `<...>` with balanced angle brackets, kept verbatim without the outer pair.
fn html_string(input: &mut &str) -> ModalResult<String> {
    let open = input.checkpoint();
    '<'.parse_next(input)?;
    let mut depth = 1usize;
    let mut value = String::new();
    while let Some(c) = input.next_token() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(value);
                }
            }
            _ => {}
        }
        value.push(c);
    }
    input.reset(&open);
    cut_err(fail)
        .context(StrContext::Label("unterminated HTML string"))
        .parse_next(input)
}

fn id(input: &mut &str) -> ModalResult<String> {
    alt((
        quoted_string,
        html_string,
        numeral.map(str::to_string),
        plain_id,
    ))
    .parse_next(input)
}

// ── Grammar ─────────────────────────────────────────────────────────

fn document(input: &mut &str) -> ModalResult<Document> {
    ws.parse_next(input)?;
    let header = input.checkpoint();
    let mut word = cut_err(identifier)
        .context(expected("`graph` or `digraph`"))
        .parse_next(input)?;
    let strict = keyword(word) == Some(Keyword::Strict);
    if strict {
        ws.parse_next(input)?;
        word = cut_err(identifier)
            .context(expected("`graph` or `digraph`"))
            .parse_next(input)?;
    }
    let directed = match keyword(word) {
        Some(Keyword::Digraph) => true,
        Some(Keyword::Graph) => false,
        _ => {
            input.reset(&header);
            return cut_err(fail)
                .context(expected("`graph` or `digraph`"))
                .parse_next(input);
        }
    };

    ws.parse_next(input)?;
    let name = opt(id).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('{').context(expected("`{`")).parse_next(input)?;
    let stmts = stmt_list(input, 0)?;
    ws.parse_next(input)?;
    cut_err('}').context(expected("`}`")).parse_next(input)?;
    ws.parse_next(input)?;

    Ok(Document {
        strict,
        directed,
        name,
        stmts,
    })
}

fn stmt_list(input: &mut &str, depth: usize) -> ModalResult<Vec<Stmt>> {
    let mut stmts = Vec::new();
    loop {
        ws.parse_next(input)?;
        if input.is_empty() || input.starts_with('}') {
            break;
        }
        if opt(';').parse_next(input)?.is_some() {
            continue;
        }
        stmts.push(stmt(input, depth)?);
    }
    Ok(stmts)
}

fn stmt(input: &mut &str, depth: usize) -> ModalResult<Stmt> {
    let checkpoint = input.checkpoint();
    if let Some(word) = opt(identifier).parse_next(input)? {
        let target = match keyword(word) {
            Some(Keyword::Graph) => Some(AttrTarget::Graph),
            Some(Keyword::Node) => Some(AttrTarget::Node),
            Some(Keyword::Edge) => Some(AttrTarget::Edge),
            Some(Keyword::Subgraph) | None => None,
            Some(Keyword::Strict | Keyword::Digraph) => {
                input.reset(&checkpoint);
                return cut_err(fail)
                    .context(StrContext::Label("unexpected keyword"))
                    .parse_next(input);
            }
        };
        if let Some(target) = target {
            let attrs = attr_lists.parse_next(input)?;
            return Ok(Stmt::Attr(target, attrs));
        }
        input.reset(&checkpoint);
    }

    let first = cut_err(|i: &mut &str| endpoint(i, depth))
        .context(expected("statement"))
        .parse_next(input)?;
    ws.parse_next(input)?;

    if let Endpoint::Node(key) = &first
        && opt('=').parse_next(input)?.is_some()
    {
        ws.parse_next(input)?;
        let value = cut_err(id)
            .context(expected("attribute value"))
            .parse_next(input)?;
        return Ok(Stmt::Attr(AttrTarget::Graph, vec![(key.clone(), value)]));
    }

    let mut chain = vec![first];
    loop {
        ws.parse_next(input)?;
        if opt(edge_op).parse_next(input)?.is_none() {
            break;
        }
        ws.parse_next(input)?;
        let next = cut_err(|i: &mut &str| endpoint(i, depth))
            .context(StrContext::Label("edge is missing its target"))
            .parse_next(input)?;
        chain.push(next);
    }
    let attrs = attr_lists.parse_next(input)?;

    if chain.len() > 1 {
        return Ok(Stmt::Edge(chain, attrs));
    }
    Ok(match chain.pop() {
        Some(Endpoint::Node(id)) => Stmt::Node(id, attrs),
        Some(Endpoint::Subgraph(sg)) => Stmt::Subgraph(sg),
        None => Stmt::Attr(AttrTarget::Graph, attrs),
    })
}

fn edge_op<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    alt(("->", "--")).parse_next(input)
}

fn endpoint(input: &mut &str, depth: usize) -> ModalResult<Endpoint> {
    let checkpoint = input.checkpoint();
    match subgraph(input, depth) {
        Ok(sg) => return Ok(Endpoint::Subgraph(sg)),
        Err(ErrMode::Backtrack(_)) => input.reset(&checkpoint),
        Err(err) => return Err(err),
    }
    node_id.map(Endpoint::Node).parse_next(input)
}

/// Node ID with an optional `:port[:compass]` suffix, which is dropped.
fn node_id(input: &mut &str) -> ModalResult<String> {
    let name = id.parse_next(input)?;
    for _ in 0..2 {
        let checkpoint = input.checkpoint();
        ws.parse_next(input)?;
        if opt(':').parse_next(input)?.is_none() {
            input.reset(&checkpoint);
            break;
        }
        ws.parse_next(input)?;
        cut_err(id).context(expected("port name")).parse_next(input)?;
    }
    Ok(name)
}

fn subgraph(input: &mut &str, depth: usize) -> ModalResult<Subgraph> {
    let checkpoint = input.checkpoint();
    let has_header = match opt(identifier).parse_next(input)? {
        Some(word) if keyword(word) == Some(Keyword::Subgraph) => true,
        _ => {
            input.reset(&checkpoint);
            false
        }
    };
    if has_header {
        ws.parse_next(input)?;
        opt(id).parse_next(input)?;
        ws.parse_next(input)?;
        cut_err('{').context(expected("`{`")).parse_next(input)?;
    } else {
        '{'.parse_next(input)?;
    }
    if depth >= MAX_NESTING {
        return cut_err(fail)
            .context(StrContext::Label("subgraphs nested too deeply"))
            .parse_next(input);
    }
    let stmts = stmt_list(input, depth + 1)?;
    ws.parse_next(input)?;
    cut_err('}').context(expected("`}`")).parse_next(input)?;
    Ok(Subgraph { stmts })
}

fn attr_lists(input: &mut &str) -> ModalResult<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    loop {
        let checkpoint = input.checkpoint();
        ws.parse_next(input)?;
        if opt('[').parse_next(input)?.is_none() {
            input.reset(&checkpoint);
            break;
        }
        loop {
            ws.parse_next(input)?;
            if opt(']').parse_next(input)?.is_some() {
                break;
            }
            let key = cut_err(id)
                .context(expected("attribute name or `]`"))
                .parse_next(input)?;
            ws.parse_next(input)?;
            cut_err('=').context(expected("`=`")).parse_next(input)?;
            ws.parse_next(input)?;
            let value = cut_err(id)
                .context(expected("attribute value"))
                .parse_next(input)?;
            attrs.push((key, value));
            ws.parse_next(input)?;
            opt(one_of([',', ';'])).parse_next(input)?;
        }
    }
    Ok(attrs)
}

// ── Lowering into the graph model ───────────────────────────────────

#[derive(Debug, Clone, Default)]
struct Scope {
    node_defaults: Attributes,
    edge_defaults: Attributes,
}

struct Builder {
    model: GraphModel,
    known: HashSet<String>,
}

impl Builder {
    fn touch_node(&mut self, id: &str, scope: &Scope) {
        if self.known.insert(id.to_string()) {
            self.model.nodes.push(id.to_string());
            if !scope.node_defaults.is_empty() {
                self.model
                    .node_attributes
                    .insert(id.to_string(), scope.node_defaults.clone());
            }
        }
    }

    fn set_node_attrs(&mut self, id: &str, attrs: Vec<(String, String)>) {
        if attrs.is_empty() {
            return;
        }
        self.model
            .node_attributes
            .entry(id.to_string())
            .or_default()
            .extend(attrs);
    }

    fn push_edge(&mut self, edge: Edge) {
        if self.model.strict {
            let directed = self.model.directed;
            let existing = self.model.edges.iter_mut().find(|e| {
                (e.source == edge.source && e.target == edge.target)
                    || (!directed && e.source == edge.target && e.target == edge.source)
            });
            if let Some(existing) = existing {
                existing.attributes.extend(edge.attributes);
                return;
            }
        }
        self.model.edges.push(edge);
    }

    /// Apply a block of statements; returns the node ids it mentions.
    fn collect(&mut self, stmts: Vec<Stmt>, scope: &mut Scope, top_level: bool) -> Vec<String> {
        let mut members: Vec<String> = Vec::new();
        for stmt in stmts {
            match stmt {
                Stmt::Node(id, attrs) => {
                    self.touch_node(&id, scope);
                    self.set_node_attrs(&id, attrs);
                    add_member(&mut members, id);
                }
                Stmt::Edge(chain, attrs) => {
                    let groups: Vec<Vec<String>> = chain
                        .into_iter()
                        .map(|endpoint| self.resolve(endpoint, scope))
                        .collect();
                    let mut edge_attrs = scope.edge_defaults.clone();
                    edge_attrs.extend(attrs);
                    for pair in groups.windows(2) {
                        for source in &pair[0] {
                            for target in &pair[1] {
                                self.push_edge(Edge {
                                    source: source.clone(),
                                    target: target.clone(),
                                    attributes: edge_attrs.clone(),
                                });
                            }
                        }
                    }
                    for id in groups.into_iter().flatten() {
                        add_member(&mut members, id);
                    }
                }
                Stmt::Attr(AttrTarget::Graph, attrs) => {
                    // subgraph-level graph attributes stay local to the subgraph
                    if top_level {
                        self.model.graph_attributes.extend(attrs);
                    }
                }
                Stmt::Attr(AttrTarget::Node, attrs) => scope.node_defaults.extend(attrs),
                Stmt::Attr(AttrTarget::Edge, attrs) => scope.edge_defaults.extend(attrs),
                Stmt::Subgraph(sg) => {
                    let mut inner = scope.clone();
                    for id in self.collect(sg.stmts, &mut inner, false) {
                        add_member(&mut members, id);
                    }
                }
            }
        }
        members
    }

    fn resolve(&mut self, endpoint: Endpoint, scope: &Scope) -> Vec<String> {
        match endpoint {
            Endpoint::Node(id) => {
                self.touch_node(&id, scope);
                vec![id]
            }
            Endpoint::Subgraph(sg) => {
                let mut inner = scope.clone();
                self.collect(sg.stmts, &mut inner, false)
            }
        }
    }
}

fn add_member(members: &mut Vec<String>, id: String) {
    if !members.contains(&id) {
        members.push(id);
    }
}

fn lower(document: Document) -> GraphModel {
    let mut builder = Builder {
        model: GraphModel {
            directed: document.directed,
            strict: document.strict,
            name: document.name,
            ..GraphModel::default()
        },
        known: HashSet::new(),
    };
    let mut scope = Scope::default();
    builder.collect(document.stmts, &mut scope, true);
    builder.model
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edges(model: &GraphModel) -> Vec<(&str, &str)> {
        model
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect()
    }

    #[test]
    fn parse_identifier_stops_at_operator() {
        let mut input = "abc->d";
        assert_eq!(identifier(&mut input).unwrap(), "abc");
        assert_eq!(input, "->d");
    }

    #[test]
    fn parse_numerals() {
        for (text, expected) in [("42", "42"), ("-3.5", "-3.5"), (".5", ".5"), ("7.", "7.")] {
            let mut input = text;
            assert_eq!(numeral(&mut input).unwrap(), expected);
        }
    }

    #[test]
    fn parse_quoted_escapes() {
        let mut input = r#""say \"hi\"\nnext""#;
        assert_eq!(quoted_string(&mut input).unwrap(), "say \"hi\"\\nnext");
    }

    #[test]
    fn parse_quoted_concatenation() {
        let mut input = r#""ab" + "cd" rest"#;
        assert_eq!(quoted_string(&mut input).unwrap(), "abcd");
        assert_eq!(input, " rest");
    }

    #[test]
    fn parse_html_string_nested() {
        let mut input = "<<b>bold</b>>";
        assert_eq!(html_string(&mut input).unwrap(), "<b>bold</b>");
    }

    #[test]
    fn keywords_are_not_ids() {
        let mut input = "node";
        assert!(id(&mut input).is_err());
        let mut input = "nodes";
        assert_eq!(id(&mut input).unwrap(), "nodes");
    }

    #[test]
    fn parse_simple_digraph() {
        let model = parse_dot("digraph{a->b;b->c;a->c;}").unwrap();
        assert!(model.directed);
        assert_eq!(model.nodes, vec!["a", "b", "c"]);
        assert_eq!(edges(&model), vec![("a", "b"), ("b", "c"), ("a", "c")]);
    }

    #[test]
    fn parse_undirected_graph() {
        let model = parse_dot("graph{x--y;}").unwrap();
        assert!(!model.directed);
        assert_eq!(model.nodes, vec!["x", "y"]);
        assert_eq!(model.edge_count(), 1);
    }

    #[test]
    fn parse_header_variants() {
        let model = parse_dot("strict DiGraph \"my graph\" { a }").unwrap();
        assert!(model.strict);
        assert!(model.directed);
        assert_eq!(model.name.as_deref(), Some("my graph"));
    }

    #[test]
    fn parse_edge_chain() {
        let model = parse_dot("digraph { a -> b -> c [color=red] }").unwrap();
        assert_eq!(edges(&model), vec![("a", "b"), ("b", "c")]);
        assert!(model.edges.iter().all(|e| e.attr("color") == Some("red")));
    }

    #[test]
    fn parse_newline_separated_statements() {
        let model = parse_dot("digraph {\n  a -> b\n  c\n}\n").unwrap();
        assert_eq!(model.nodes, vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_node_attributes() {
        let model = parse_dot("digraph { a [label=\"Start\", shape=box]; a [color=blue] }").unwrap();
        assert_eq!(model.node_attr("a", "label"), Some("Start"));
        assert_eq!(model.node_attr("a", "shape"), Some("box"));
        assert_eq!(model.node_attr("a", "color"), Some("blue"));
    }

    #[test]
    fn parse_multiple_attribute_lists() {
        let model = parse_dot("digraph { a [x=1; y=2][z=3] }").unwrap();
        assert_eq!(model.node_attributes["a"].len(), 3);
    }

    #[test]
    fn parse_graph_attributes() {
        let model = parse_dot("digraph { rankdir=LR; graph [ranksep=80] a }").unwrap();
        assert_eq!(model.graph_attr("rankdir"), Some("LR"));
        assert_eq!(model.graph_attr("ranksep"), Some("80"));
        assert_eq!(model.nodes, vec!["a"]);
    }

    #[test]
    fn parse_comments() {
        let input = "// leading\n# preprocessor\ndigraph {\n /* block\n comment */ a -> b // trailing\n}";
        let model = parse_dot(input).unwrap();
        assert_eq!(edges(&model), vec![("a", "b")]);
    }

    #[test]
    fn parse_ports_are_dropped() {
        let model = parse_dot("digraph { a:out:s -> b:in }").unwrap();
        assert_eq!(edges(&model), vec![("a", "b")]);
    }

    #[test]
    fn parse_subgraph_is_flattened() {
        let input = "digraph { subgraph cluster_0 { label=\"grp\"; a -> b } c -> a }";
        let model = parse_dot(input).unwrap();
        assert_eq!(model.nodes, vec!["a", "b", "c"]);
        assert_eq!(edges(&model), vec![("a", "b"), ("c", "a")]);
        assert_eq!(model.graph_attr("label"), None);
    }

    #[test]
    fn parse_subgraph_as_endpoint() {
        let model = parse_dot("digraph { a -> {b c} }").unwrap();
        assert_eq!(edges(&model), vec![("a", "b"), ("a", "c")]);
    }

    #[test]
    fn parse_default_attributes_are_scoped() {
        let input = "digraph { node [shape=circle]; a; { node [shape=diamond]; b } c; edge [color=red]; a -> c }";
        let model = parse_dot(input).unwrap();
        assert_eq!(model.node_attr("a", "shape"), Some("circle"));
        assert_eq!(model.node_attr("b", "shape"), Some("diamond"));
        assert_eq!(model.node_attr("c", "shape"), Some("circle"));
        assert_eq!(model.edges[0].attr("color"), Some("red"));
    }

    #[test]
    fn parse_parallel_edges_preserved() {
        let model = parse_dot("digraph { a -> b; a -> b }").unwrap();
        assert_eq!(model.edge_count(), 2);
    }

    #[test]
    fn parse_strict_merges_parallel_edges() {
        let model = parse_dot("strict graph { a -- b; b -- a [color=red] }").unwrap();
        assert_eq!(model.edge_count(), 1);
        assert_eq!(model.edges[0].attr("color"), Some("red"));
    }

    #[test]
    fn parse_missing_edge_target_fails() {
        let err = parse_dot("digraph{a->;}").unwrap_err();
        assert_eq!(err.offset, 11);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 12);
        assert!(err.message.contains("target"), "got: {}", err.message);
    }

    #[test]
    fn parse_unterminated_string_points_at_quote() {
        let err = parse_dot("digraph { a [label=\"oops] }").unwrap_err();
        assert_eq!(err.offset, 19);
        assert_eq!(err.message, "unterminated string");
    }

    #[test]
    fn parse_unbalanced_braces_fail() {
        assert!(parse_dot("digraph { a -> b").is_err());
        let err = parse_dot("digraph { a } }").unwrap_err();
        assert_eq!(err.offset, 14);
    }

    #[test]
    fn parse_nesting_within_limit() {
        let depth = MAX_NESTING;
        let dot = format!("digraph {{ {} a {} }}", "{".repeat(depth), "}".repeat(depth));
        let model = parse_dot(&dot).unwrap();
        assert_eq!(model.nodes, vec!["a"]);
    }

    #[test]
    fn parse_deep_nesting_is_rejected() {
        let dot = format!("digraph {{ {} a {} }}", "{".repeat(20_000), "}".repeat(20_000));
        let err = parse_dot(&dot).unwrap_err();
        assert_eq!(err.message, "subgraphs nested too deeply");
        assert_eq!(err.offset, "digraph { ".len() + MAX_NESTING + 1);
    }

    #[test]
    fn parse_missing_header_fails() {
        let err = parse_dot("flowchart { a }").unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.message.contains("digraph"));
    }

    #[test]
    fn parse_empty_input_fails() {
        assert!(parse_dot("").is_err());
        assert!(parse_dot("   \n").is_err());
    }

    #[test]
    fn parse_attribute_without_value_fails() {
        assert!(parse_dot("digraph { a [label] }").is_err());
    }

    #[test]
    fn parse_empty_graph() {
        let model = parse_dot("digraph {}").unwrap();
        assert!(model.is_empty());
        assert_eq!(model.edge_count(), 0);
    }

    #[test]
    fn to_dot_round_trips() {
        let input = "digraph g { rankdir=LR; a [label=\"A \\\"q\\\"\"]; a -> b [weight=2]; c }";
        let model = parse_dot(input).unwrap();
        let reparsed = parse_dot(&model.to_dot()).unwrap();
        assert_eq!(reparsed, model);
    }
}
