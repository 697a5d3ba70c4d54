use pretty_assertions::assert_eq;

#[test]
fn snapshot_single_edge() {
    let svg = dotview::render_dot("digraph { a -> b }").unwrap().to_svg();
    let expected = r##"<svg xmlns="http://www.w3.org/2000/svg" id="graph-container" width="68" height="166" viewBox="0 0 68 166">
  <defs>
    <marker id="arrowhead-normal-0" viewBox="0 0 10 10" refX="9" refY="5" markerUnits="strokeWidth" markerWidth="8" markerHeight="6" orient="auto"><path d="M 0 0 L 10 5 L 0 10 z" fill="#333" stroke="none"/></marker>
  </defs>
  <g class="output">
    <g class="edgePaths">
      <path d="M34,58 L34,108" fill="none" stroke="#333" stroke-width="1.5" marker-end="url(#arrowhead-normal-0)"/>
    </g>
    <g class="edgeLabels"/>
    <g class="nodes">
      <g class="node" id="node-a">
        <rect x="20" y="20" width="28" height="38" fill="#fff" stroke="#333" stroke-width="1.5"/>
        <text text-anchor="middle" dominant-baseline="central" font-family="Helvetica, Arial, sans-serif" font-size="14" fill="#000"><tspan x="34" y="39">a</tspan></text>
      </g>
      <g class="node" id="node-b">
        <rect x="20" y="108" width="28" height="38" fill="#fff" stroke="#333" stroke-width="1.5"/>
        <text text-anchor="middle" dominant-baseline="central" font-family="Helvetica, Arial, sans-serif" font-size="14" fill="#000"><tspan x="34" y="127">b</tspan></text>
      </g>
    </g>
  </g>
</svg>
"##;
    assert_eq!(svg, expected);
}

#[test]
fn snapshot_empty_graph() {
    let svg = dotview::render_dot("digraph {}").unwrap().to_svg();
    let expected = r#"<svg xmlns="http://www.w3.org/2000/svg" id="graph-container" width="0" height="0" viewBox="0 0 0 0">
  <defs>
  </defs>
  <g class="output">
    <g class="edgePaths"/>
    <g class="edgeLabels"/>
    <g class="nodes"/>
  </g>
</svg>
"#;
    assert_eq!(svg, expected);
}

#[test]
fn snapshot_multiline_label() {
    let svg = dotview::render_dot(r#"digraph { n [label="top\nbottom"] }"#)
        .unwrap()
        .to_svg();
    // six columns wide, two lines tall, centred on (54, 48)
    assert!(svg.contains(r#"<rect x="20" y="20" width="68" height="56""#), "{svg}");
    assert!(svg.contains(
        r#"<tspan x="54" y="39">top</tspan><tspan x="54" y="57">bottom</tspan>"#
    ));
}
