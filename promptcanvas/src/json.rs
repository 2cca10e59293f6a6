use crate::error::Error;
use crate::geometry::limits;
use crate::kinds::KindRegistry;
use crate::model::{GraphLink, GraphNode, LinkId, NodeId, PortRef, PortType, Vec2};
use crate::Graph;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

pub const FORMAT_VERSION: u32 = 1;

pub fn node_to_value(registry: &KindRegistry, n: &GraphNode) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), json!(n.id));
    obj.insert("type".into(), json!(n.kind));
    obj.insert("pos".into(), json!(n.pos.to_array()));
    obj.insert("size".into(), json!(n.size.to_array()));
    obj.insert("properties".into(), Value::Object(n.properties.clone()));
    if !n.inputs.is_empty() {
        obj.insert("inputs".into(), json!(n.inputs));
    }
    if !n.outputs.is_empty() {
        obj.insert("outputs".into(), json!(n.outputs));
    }
    if let Some(kind) = registry.get(&n.kind) {
        kind.serialize(n, &mut obj);
    }
    Value::Object(obj)
}

fn link_to_value(l: &GraphLink) -> Value {
    json!([l.id, l.from.node, l.from.slot, l.to.node, l.to.slot, l.ty])
}

pub fn to_json_impl(g: &Graph) -> Value {
    let nodes: Vec<Value> = g.nodes.iter().map(|n| node_to_value(&g.registry, n)).collect();
    let links: Vec<Value> = g.links.iter().map(link_to_value).collect();
    json!({
        "version": FORMAT_VERSION,
        "last_node_id": g.last_node_id,
        "last_link_id": g.last_link_id,
        "nodes": nodes,
        "links": links,
    })
}

#[derive(Deserialize)]
struct NodeDe {
    id: Option<NodeId>,
    #[serde(rename = "type")]
    kind: String,
    pos: [f32; 2],
    size: Option<[f32; 2]>,
    properties: Option<Map<String, Value>>,
}

/// True when `v` has the shape of a single serialized node.
pub fn looks_like_node(v: &Value) -> bool {
    v.get("type").is_some_and(Value::is_string) && v.get("pos").is_some_and(Value::is_array)
}

/// True when `v` has the shape of a full workflow.
pub fn looks_like_workflow(v: &Value) -> bool {
    v.get("nodes").is_some_and(Value::is_array) && v.get("links").is_some_and(Value::is_array)
}

/// Build a node from its serialized object. The id is taken from the object
/// when present; callers that insert a copy reassign it.
pub fn node_from_value(registry: &KindRegistry, v: &Value) -> Result<(Option<NodeId>, GraphNode), Error> {
    let Value::Object(src) = v else {
        return Err(Error::MalformedGraph("node must be an object".into()));
    };
    let de: NodeDe = serde_json::from_value(v.clone())
        .map_err(|e| Error::MalformedGraph(format!("node: {e}")))?;
    let kind = registry
        .get(&de.kind)
        .ok_or_else(|| Error::UnknownKind(de.kind.clone()))?;
    let pos = Vec2::from(de.pos);
    if !limits::in_coord_bounds(pos.x) || !limits::in_coord_bounds(pos.y) {
        return Err(Error::MalformedGraph(format!("node position {:?} out of bounds", de.pos)));
    }
    let mut node = registry
        .instantiate(kind.tag(), pos)
        .ok_or_else(|| Error::UnknownKind(de.kind.clone()))?;
    if let Some([w, h]) = de.size {
        if !limits::in_size_bounds(w) || !limits::in_size_bounds(h) {
            return Err(Error::MalformedGraph(format!("node size [{w}, {h}] out of bounds")));
        }
        let min = kind.min_size();
        node.size = Vec2::new(w.max(min.x), h.max(min.y));
    }
    if let Some(props) = de.properties {
        if props.len() > limits::MAX_PROPERTY_KEYS {
            return Err(Error::MalformedGraph("too many properties".into()));
        }
        node.properties.extend(props);
    }
    kind.deserialize(&mut node, src);
    Ok((de.id, node))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LinkDe {
    Tuple(Vec<Value>),
    Object {
        id: LinkId,
        origin_id: NodeId,
        origin_slot: usize,
        target_id: NodeId,
        target_slot: usize,
    },
}

impl LinkDe {
    fn parts(self) -> Option<(LinkId, PortRef, PortRef)> {
        match self {
            LinkDe::Object { id, origin_id, origin_slot, target_id, target_slot } => {
                Some((id, PortRef::new(origin_id, origin_slot), PortRef::new(target_id, target_slot)))
            }
            LinkDe::Tuple(items) => {
                if items.len() < 5 {
                    return None;
                }
                let num = |i: usize| items[i].as_u64();
                let slot = |i: usize| usize::try_from(num(i)?).ok();
                let id = u32::try_from(num(0)?).ok()?;
                let from = PortRef::new(u32::try_from(num(1)?).ok()?, slot(2)?);
                let to = PortRef::new(u32::try_from(num(3)?).ok()?, slot(4)?);
                Some((id, from, to))
            }
        }
    }
}

/// A validated replacement for a graph's contents.
pub struct Workflow {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub last_node_id: NodeId,
    pub last_link_id: LinkId,
}

/// Parse and validate a `{nodes, links}` document without touching any graph.
pub fn parse_workflow(registry: &KindRegistry, v: &Value) -> Result<Workflow, Error> {
    if !looks_like_workflow(v) {
        return Err(Error::MalformedGraph("expected {nodes: [...], links: [...]}".into()));
    }
    let raw_nodes = v["nodes"].as_array().map(Vec::as_slice).unwrap_or_default();
    let raw_links = v["links"].as_array().map(Vec::as_slice).unwrap_or_default();
    if raw_nodes.len() > limits::MAX_NODES {
        return Err(Error::MalformedGraph(format!("nodes>{}", limits::MAX_NODES)));
    }
    if raw_links.len() > limits::MAX_LINKS {
        return Err(Error::MalformedGraph(format!("links>{}", limits::MAX_LINKS)));
    }

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    let mut ids = HashSet::new();
    for (i, raw) in raw_nodes.iter().enumerate() {
        let (id, mut node) = node_from_value(registry, raw).map_err(|e| match e {
            Error::UnknownKind(k) => Error::MalformedGraph(format!("node #{i}: unknown kind '{k}'")),
            other => other,
        })?;
        let id = id.ok_or_else(|| Error::MalformedGraph(format!("node #{i} has no id")))?;
        if id == NodeId::MAX {
            return Err(Error::MalformedGraph(format!("node #{i}: id {id} out of range")));
        }
        if !ids.insert(id) {
            return Err(Error::MalformedGraph(format!("duplicate node id {id}")));
        }
        node.id = id;
        nodes.push(node);
    }

    let mut links: Vec<GraphLink> = Vec::with_capacity(raw_links.len());
    let mut link_ids = HashSet::new();
    let mut used_inputs = HashSet::new();
    for (i, raw) in raw_links.iter().enumerate() {
        let (id, from, to) = serde_json::from_value::<LinkDe>(raw.clone())
            .ok()
            .and_then(LinkDe::parts)
            .ok_or_else(|| Error::MalformedGraph(format!("link #{i} is not a valid link")))?;
        if id == LinkId::MAX {
            return Err(Error::MalformedGraph(format!("link #{i}: id {id} out of range")));
        }
        if !link_ids.insert(id) {
            return Err(Error::MalformedGraph(format!("duplicate link id {id}")));
        }
        let ty = check_link(&nodes, from, to)
            .map_err(|reason| Error::MalformedGraph(format!("link {id}: {reason}")))?;
        if !used_inputs.insert(to) {
            return Err(Error::MalformedGraph(format!("link {id}: input already linked")));
        }
        links.push(GraphLink { id, from, to, ty });
    }

    let declared_node = declared_id(v, "last_node_id")?;
    let declared_link = declared_id(v, "last_link_id")?;
    let last_node_id = ids.iter().copied().max().unwrap_or(0).max(declared_node);
    let last_link_id = link_ids.iter().copied().max().unwrap_or(0).max(declared_link);
    Ok(Workflow { nodes, links, last_node_id, last_link_id })
}

/// A declared id counter. Fresh ids are taken by incrementing it, so the
/// counter must leave room for at least one more.
fn declared_id(v: &Value, key: &str) -> Result<u32, Error> {
    let Some(raw) = v.get(key).and_then(Value::as_u64) else {
        return Ok(0);
    };
    u32::try_from(raw)
        .ok()
        .filter(|id| *id < u32::MAX)
        .ok_or_else(|| Error::MalformedGraph(format!("{key} {raw} out of range")))
}

/// Structural link checks shared by `add_link` and workflow validation.
/// Returns the origin port type on success.
pub(crate) fn check_link(nodes: &[GraphNode], from: PortRef, to: PortRef) -> Result<PortType, String> {
    if from.node == to.node {
        return Err("endpoints are the same node".into());
    }
    let a = nodes
        .iter()
        .find(|n| n.id == from.node)
        .ok_or_else(|| format!("origin node {} missing", from.node))?;
    let b = nodes
        .iter()
        .find(|n| n.id == to.node)
        .ok_or_else(|| format!("target node {} missing", to.node))?;
    let out = a
        .outputs
        .get(from.slot)
        .ok_or_else(|| format!("node {} has no output slot {}", a.id, from.slot))?;
    let inp = b
        .inputs
        .get(to.slot)
        .ok_or_else(|| format!("node {} has no input slot {}", b.id, to.slot))?;
    if !out.ty.accepts(inp.ty) {
        return Err(format!("cannot connect {:?} output to {:?} input", out.ty, inp.ty));
    }
    Ok(out.ty)
}
