use crate::error::Error;
use crate::model::NodeId;
use crate::Graph;
use serde_json::Value;
use std::collections::BTreeSet;

/// Transient set of selected node ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<NodeId>,
}

impl Selection {
    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }
    pub fn insert(&mut self, id: NodeId) -> bool {
        self.ids.insert(id)
    }
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.ids.remove(&id)
    }
    pub fn clear(&mut self) {
        self.ids.clear();
    }
    pub fn set_only(&mut self, id: NodeId) {
        self.ids.clear();
        self.ids.insert(id);
    }
    pub fn len(&self) -> usize {
        self.ids.len()
    }
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
    pub fn ids(&self) -> Vec<NodeId> {
        self.ids.iter().copied().collect()
    }
    /// Drop ids that no longer resolve in `graph`.
    pub fn retain_live(&mut self, graph: &Graph) {
        self.ids.retain(|id| graph.node(*id).is_some());
    }
}

/// Destination for copied text (the system clipboard in a browser host).
pub trait ClipboardSink {
    fn write_text(&mut self, text: String) -> Result<(), Error>;
}

impl ClipboardSink for String {
    fn write_text(&mut self, text: String) -> Result<(), Error> {
        *self = text;
        Ok(())
    }
}

/// Portable text for serialized nodes: a single node object when there is
/// one, an array of node objects otherwise. `None` when there is nothing.
pub fn selection_text(mut nodes: Vec<Value>) -> Result<Option<String>, Error> {
    let value = match nodes.len() {
        0 => return Ok(None),
        1 => nodes.swap_remove(0),
        _ => Value::Array(nodes),
    };
    Ok(Some(serde_json::to_string_pretty(&value)?))
}
