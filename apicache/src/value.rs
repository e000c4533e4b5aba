//! Reference-preserving payload values.
//!
//! Cached responses may legitimately contain shared sub-structures, or
//! even cycles among plain data. A tree-shaped value type cannot express
//! that, so [`Payload`] models a JSON-shaped value as an arena of nodes
//! addressed by [`NodeId`]: aliasing is expressed by referencing the same
//! node from several parents, and the codec preserves that topology on
//! the wire.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::CodecError;

/// Index of a node within a [`Payload`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A single JSON-shaped node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number.
    Number(serde_json::Number),
    /// JSON string.
    String(String),
    /// Array of child nodes.
    Array(Vec<NodeId>),
    /// Object with insertion-ordered members.
    Object(Vec<(String, NodeId)>),
}

/// A JSON-shaped value graph.
///
/// # Example
///
/// Two object members aliasing one array:
///
/// ```
/// use apicache::{Node, Payload};
///
/// let mut payload = Payload::new();
/// let one = payload.alloc(Node::Number(1.into()));
/// let shared = payload.alloc(Node::Array(vec![one]));
/// let root = payload.alloc(Node::Object(vec![
///     ("first".to_owned(), shared),
///     ("second".to_owned(), shared),
/// ]));
/// payload.set_root(root);
/// ```
#[derive(Debug, Clone)]
pub struct Payload {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Payload {
    /// Creates a payload whose root is `null`.
    pub fn new() -> Self {
        Payload {
            nodes: vec![Node::Null],
            root: NodeId(0),
        }
    }

    /// Creates an arena of `count` placeholder nodes, root at index 0.
    /// The codec fills the slots in a second pass so cycles can be wired.
    pub(crate) fn with_placeholders(count: usize) -> Self {
        Payload {
            nodes: vec![Node::Null; count],
            root: NodeId(0),
        }
    }

    /// Allocates a node and returns its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Replaces an existing node in place.
    ///
    /// This is how cycles are closed: allocate a placeholder, reference it
    /// from its children, then replace it with the real container. Ids not
    /// belonging to this payload are ignored.
    pub fn replace(&mut self, id: NodeId, node: Node) {
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = node;
        }
    }

    /// Marks `id` as the root node.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node for `id`, if it belongs to this payload.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Imports a tree-shaped [`serde_json::Value`].
    ///
    /// The result contains no shared nodes; use [`Payload::alloc`]
    /// directly to build aliased or cyclic structures.
    pub fn from_json(value: &Value) -> Self {
        let mut payload = Payload {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = payload.import(value);
        payload.root = root;
        payload
    }

    fn import(&mut self, value: &Value) -> NodeId {
        let node = match value {
            Value::Null => Node::Null,
            Value::Bool(value) => Node::Bool(*value),
            Value::Number(value) => Node::Number(value.clone()),
            Value::String(value) => Node::String(value.clone()),
            Value::Array(items) => {
                let items = items.iter().map(|item| self.import(item)).collect();
                Node::Array(items)
            }
            Value::Object(members) => {
                let members = members
                    .iter()
                    .map(|(name, member)| (name.clone(), self.import(member)))
                    .collect();
                Node::Object(members)
            }
        };
        self.alloc(node)
    }

    /// Exports to a tree-shaped [`serde_json::Value`].
    ///
    /// Shared nodes are duplicated in the output. Cyclic payloads cannot
    /// be represented as a tree and yield [`CodecError::CyclicPayload`].
    pub fn to_json(&self) -> Result<Value, CodecError> {
        let mut in_progress = vec![false; self.nodes.len()];
        self.export(self.root, &mut in_progress)
    }

    fn export(&self, id: NodeId, in_progress: &mut [bool]) -> Result<Value, CodecError> {
        let node = self.get(id).ok_or(CodecError::DanglingNode(id.0))?;
        match node {
            Node::Null => Ok(Value::Null),
            Node::Bool(value) => Ok(Value::Bool(*value)),
            Node::Number(value) => Ok(Value::Number(value.clone())),
            Node::String(value) => Ok(Value::String(value.clone())),
            Node::Array(items) => {
                if in_progress[id.0] {
                    return Err(CodecError::CyclicPayload);
                }
                in_progress[id.0] = true;
                let mut output = Vec::with_capacity(items.len());
                for item in items {
                    output.push(self.export(*item, in_progress)?);
                }
                in_progress[id.0] = false;
                Ok(Value::Array(output))
            }
            Node::Object(members) => {
                if in_progress[id.0] {
                    return Err(CodecError::CyclicPayload);
                }
                in_progress[id.0] = true;
                let mut output = Map::new();
                for (name, member) in members {
                    output.insert(name.clone(), self.export(*member, in_progress)?);
                }
                in_progress[id.0] = false;
                Ok(Value::Object(output))
            }
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::new()
    }
}

impl From<&Value> for Payload {
    fn from(value: &Value) -> Self {
        Payload::from_json(value)
    }
}

/// Sharing-aware structural equality.
///
/// Two payloads are equal when their graphs are isomorphic from the
/// roots: same shape, same leaf values, and the same aliasing topology
/// among containers. Two members referencing one array are not equal to
/// two members referencing two equal arrays. Leaf nodes compare by value
/// only - their identity is unobservable, and the codec dedupes strings
/// by value on the wire.
impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        let mut forward: HashMap<usize, usize> = HashMap::new();
        let mut backward: HashMap<usize, usize> = HashMap::new();
        let mut pending = vec![(self.root, other.root)];

        while let Some((a, b)) = pending.pop() {
            let (Some(left), Some(right)) = (self.get(a), other.get(b)) else {
                return false;
            };
            if matches!(left, Node::Array(_) | Node::Object(_))
                && matches!(right, Node::Array(_) | Node::Object(_))
            {
                // Containers must pair up one-to-one across both graphs.
                match (forward.get(&a.0), backward.get(&b.0)) {
                    (Some(&to), Some(&from)) if to == b.0 && from == a.0 => continue,
                    (None, None) => {
                        forward.insert(a.0, b.0);
                        backward.insert(b.0, a.0);
                    }
                    _ => return false,
                }
            }
            match (left, right) {
                (Node::Null, Node::Null) => {}
                (Node::Bool(l), Node::Bool(r)) if l == r => {}
                (Node::Number(l), Node::Number(r)) if l == r => {}
                (Node::String(l), Node::String(r)) if l == r => {}
                (Node::Array(l), Node::Array(r)) if l.len() == r.len() => {
                    pending.extend(l.iter().copied().zip(r.iter().copied()));
                }
                (Node::Object(l), Node::Object(r)) if l.len() == r.len() => {
                    for ((l_name, l_member), (r_name, r_member)) in l.iter().zip(r) {
                        if l_name != r_name {
                            return false;
                        }
                        pending.push((*l_member, *r_member));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}
