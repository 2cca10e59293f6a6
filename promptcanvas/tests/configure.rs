use promptcanvas::geometry::limits;
use promptcanvas::kinds::PROMPT;
use promptcanvas::{Error, Graph, PortType, Vec2};
use serde_json::json;

fn seeded() -> Graph {
    let mut g = Graph::new();
    let p = g.add_node(PROMPT, Vec2::new(1.0, 2.0)).unwrap();
    g.set_text(p, "keep me").unwrap();
    g
}

fn assert_rejected(v: serde_json::Value) {
    let mut g = seeded();
    let before = g.to_json();
    let ver = g.version();
    let err = g.configure(&v).unwrap_err();
    assert!(matches!(err, Error::MalformedGraph(_)), "unexpected error {err:?}");
    assert_eq!(g.version(), ver);
    assert_eq!(g.to_json(), before);
}

#[test]
fn workflow_replaces_everything() {
    let mut g = seeded();
    g.configure(&json!({
        "nodes": [
            {"id": 4, "type": "prompt", "pos": [0, 0], "text": "a lighthouse"},
            {"id": 9, "type": "generator", "pos": [400, 0], "properties": {"model": "sdxl"}}
        ],
        "links": [[3, 4, 0, 9, 0, "text"]]
    }))
    .unwrap();
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.text(4), Some("a lighthouse"));
    assert_eq!(g.node(9).unwrap().str_property("model"), Some("sdxl"));
    assert_eq!(g.link_count(), 1);
    assert_eq!(g.links()[0].ty, PortType::Text);

    // fresh ids continue past the loaded ones
    let next = g.add_node(PROMPT, Vec2::ZERO).unwrap();
    assert_eq!(next, 10);
}

#[test]
fn minimal_workflow_leaves_one_prompt() {
    let mut g = seeded();
    g.configure(&json!({"nodes":[{"id":1,"type":"prompt","pos":[0,0]}],"links":[]}))
        .unwrap();
    assert_eq!(g.node_count(), 1);
    assert_eq!(g.nodes()[0].kind, PROMPT);
    assert_eq!(g.text(1), Some(""));
}

#[test]
fn object_form_links_are_accepted() {
    let mut g = Graph::new();
    g.configure(&json!({
        "nodes": [
            {"id": 1, "type": "image_source", "pos": [0, 0], "properties": {"url": "https://x/a.png", "source_mode": "url"}},
            {"id": 2, "type": "generator", "pos": [300, 0]}
        ],
        "links": [{"id": 1, "origin_id": 1, "origin_slot": 0, "target_id": 2, "target_slot": 1, "type": "image"}]
    }))
    .unwrap();
    assert_eq!(g.link_count(), 1);
    assert_eq!(g.node(1).unwrap().outputs[0].value, Some(json!("https://x/a.png")));
}

#[test]
fn rejects_unknown_kind() {
    assert_rejected(json!({"nodes":[{"id":1,"type":"mystery","pos":[0,0]}],"links":[]}));
}

#[test]
fn rejects_duplicate_ids() {
    assert_rejected(json!({"nodes":[
        {"id":1,"type":"prompt","pos":[0,0]},
        {"id":1,"type":"prompt","pos":[10,0]}
    ],"links":[]}));
}

#[test]
fn rejects_missing_node_id() {
    assert_rejected(json!({"nodes":[{"type":"prompt","pos":[0,0]}],"links":[]}));
}

#[test]
fn rejects_out_of_range_numbers() {
    assert_rejected(json!({"nodes":[{"id":1,"type":"prompt","pos":[1.0e9,0]}],"links":[]}));
    assert_rejected(json!({"nodes":[{"id":1,"type":"prompt","pos":[0,0],"size":[-5,10]}],"links":[]}));
}

#[test]
fn rejects_dangling_and_mistyped_links() {
    let nodes = json!([
        {"id":1,"type":"prompt","pos":[0,0]},
        {"id":2,"type":"generator","pos":[300,0]}
    ]);
    assert_rejected(json!({"nodes": nodes, "links": [[1, 1, 0, 7, 0, "text"]]}));
    assert_rejected(json!({"nodes": nodes, "links": [[1, 1, 0, 2, 1, "text"]]}));
    assert_rejected(json!({"nodes": nodes, "links": [[1, 1, 0, 2, 5, "text"]]}));
    assert_rejected(json!({"nodes": nodes, "links": [[1, 1, 0]]}));
    assert_rejected(json!({"nodes": nodes, "links": [[1, 1, 0, 2, 0, "text"], [2, 1, 0, 2, 0, "text"]]}));
}

#[test]
fn rejects_wrong_shape() {
    assert_rejected(json!({"nodes": []}));
    assert_rejected(json!([1, 2, 3]));
}

#[test]
fn caps_exceeded_nodes() {
    let nodes: Vec<_> = (0..=limits::MAX_NODES)
        .map(|i| json!({"id": i + 1, "type": "prompt", "pos": [0, 0]}))
        .collect();
    assert_rejected(json!({"nodes": nodes, "links": []}));
}

#[test]
fn caps_exceeded_properties() {
    let props: serde_json::Map<_, _> = (0..=limits::MAX_PROPERTY_KEYS)
        .map(|i| (format!("k{i}"), json!(i)))
        .collect();
    assert_rejected(json!({"nodes":[{"id":1,"type":"prompt","pos":[0,0],"properties": props}],"links":[]}));
}

#[test]
fn rejects_ids_that_leave_no_room() {
    let max = u64::from(u32::MAX);
    assert_rejected(json!({"nodes":[{"id": max, "type":"prompt","pos":[0,0]}],"links":[]}));
    assert_rejected(json!({"nodes":[], "links":[], "last_node_id": max}));
    assert_rejected(json!({"nodes":[], "links":[], "last_link_id": max + 1}));
    let nodes = json!([
        {"id":1,"type":"prompt","pos":[0,0]},
        {"id":2,"type":"generator","pos":[300,0]}
    ]);
    assert_rejected(json!({"nodes": nodes, "links": [[max, 1, 0, 2, 0, "text"]]}));
    assert_rejected(json!({"nodes": nodes, "links": [[1, 1, 1u64 << 40, 2, 0, "text"]]}));
}

#[test]
fn exhausted_id_space_is_an_error() {
    let mut g = Graph::new();
    g.configure(&json!({"nodes":[], "links":[], "last_node_id": u32::MAX - 1})).unwrap();
    let last = g.add_node(PROMPT, Vec2::ZERO).unwrap();
    assert_eq!(last, u32::MAX);
    let ver = g.version();
    let err = g.add_node(PROMPT, Vec2::ZERO).unwrap_err();
    assert!(matches!(err, Error::MalformedGraph(_)));
    assert_eq!(g.node_count(), 1);
    assert_eq!(g.version(), ver);
}
