//! Payload codec: reference-preserving text form, brotli, base64.
//!
//! The encode pipeline is [`stringify`] -> brotli-compress -> base64, so
//! the result is safely storable as a plain string value; [`decode`] is
//! the exact inverse. A cache miss never reaches this module - the facade
//! short-circuits on an absent entry - so every failure here means the
//! stored bytes are corrupted or were written by an incompatible version,
//! and is surfaced as a hard [`CodecError`].
//!
//! ## Wire form
//!
//! [`stringify`] emits a JSON array of entries; entry `0` is the root.
//! Every string and every container is hoisted into the table, and a
//! string slot inside a container is always a decimal index into the
//! table. Numbers, booleans and null stay inline. Strings dedupe by
//! value, containers by node identity, which is what lets shared
//! sub-structures and cycles survive the round trip:
//!
//! ```text
//! {"a": "b"}            => [{"a":"1"},"b"]
//! self-containing array => [["0"]]
//! ```

use std::collections::HashMap;
use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::value::{Node, NodeId, Payload};

// Quality 5 keeps brotli cheap enough for the write path while still
// shrinking JSON-shaped text severalfold.
const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_QUALITY: u32 = 5;
const BROTLI_LG_WINDOW: u32 = 22;

/// Encodes a payload for storage: stringify, compress, base64.
pub fn encode(payload: &Payload) -> Result<String, CodecError> {
    let text = stringify(payload)?;
    let compressed = compress(text.as_bytes())?;
    Ok(BASE64.encode(compressed))
}

/// Decodes a stored entry back into a [`Payload`].
pub fn decode(raw: &str) -> Result<Payload, CodecError> {
    let compressed = BASE64.decode(raw)?;
    let bytes = decompress(&compressed)?;
    let text = String::from_utf8(bytes)?;
    parse(&text)
}

/// Serializes a payload into its reference-preserving textual form.
pub fn stringify(payload: &Payload) -> Result<String, CodecError> {
    let mut table = Table::new(payload);
    table.hoist_root(payload.root())?;

    // The table grows while entries are emitted; plain cursor loop.
    let mut entries = Vec::new();
    let mut cursor = 0;
    while cursor < table.order.len() {
        let id = table.order[cursor];
        let entry = table.entry_for(id)?;
        entries.push(entry);
        cursor += 1;
    }
    serde_json::to_string(&Value::Array(entries)).map_err(CodecError::from)
}

/// Parses the reference-preserving textual form back into a [`Payload`].
///
/// Resolution is a flat pass over the entry table rather than recursive
/// descent, so cyclic graphs reconstruct without unbounded recursion.
pub fn parse(text: &str) -> Result<Payload, CodecError> {
    let entries: Vec<Value> = serde_json::from_str(text)?;
    if entries.is_empty() {
        return Err(CodecError::EmptyTable);
    }

    // Table entries occupy arena slots 0..len; inline primitives found
    // inside containers are appended after them.
    let table_len = entries.len();
    let mut payload = Payload::with_placeholders(table_len);
    for (index, entry) in entries.iter().enumerate() {
        let node = match entry {
            Value::Null => Node::Null,
            Value::Bool(value) => Node::Bool(*value),
            Value::Number(value) => Node::Number(value.clone()),
            Value::String(value) => Node::String(value.clone()),
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|slot| resolve_slot(&mut payload, table_len, slot))
                    .collect::<Result<Vec<_>, _>>()?;
                Node::Array(items)
            }
            Value::Object(members) => {
                let members = members
                    .iter()
                    .map(|(name, slot)| {
                        resolve_slot(&mut payload, table_len, slot)
                            .map(|id| (name.clone(), id))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Node::Object(members)
            }
        };
        payload.replace(NodeId(index), node);
    }
    Ok(payload)
}

/// Resolves one container slot: a string is always a table reference,
/// other primitives are inline values, and a nested container is never
/// produced by [`stringify`].
fn resolve_slot(
    payload: &mut Payload,
    table_len: usize,
    slot: &Value,
) -> Result<NodeId, CodecError> {
    match slot {
        Value::String(index) => {
            let index: usize = index
                .parse()
                .map_err(|_| CodecError::InvalidReference(index.clone()))?;
            if index >= table_len {
                return Err(CodecError::ReferenceOutOfRange(index));
            }
            Ok(NodeId(index))
        }
        Value::Null => Ok(payload.alloc(Node::Null)),
        Value::Bool(value) => Ok(payload.alloc(Node::Bool(*value))),
        Value::Number(value) => Ok(payload.alloc(Node::Number(value.clone()))),
        Value::Array(_) | Value::Object(_) => Err(CodecError::NestedEntry),
    }
}

fn compress(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut output = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(
            &mut output,
            BROTLI_BUFFER_SIZE,
            BROTLI_QUALITY,
            BROTLI_LG_WINDOW,
        );
        writer.write_all(input).map_err(CodecError::Compress)?;
        writer.flush().map_err(CodecError::Compress)?;
    }
    Ok(output)
}

fn decompress(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut output = Vec::new();
    let mut reader = brotli::Decompressor::new(input, BROTLI_BUFFER_SIZE);
    reader
        .read_to_end(&mut output)
        .map_err(CodecError::Decompress)?;
    Ok(output)
}

/// Entry table under construction during [`stringify`].
struct Table<'a> {
    payload: &'a Payload,
    /// Container (and root) node -> table index.
    by_node: HashMap<usize, usize>,
    /// String value -> table index; strings dedupe by value.
    by_string: HashMap<String, usize>,
    /// Node ids in table order.
    order: Vec<NodeId>,
}

impl<'a> Table<'a> {
    fn new(payload: &'a Payload) -> Self {
        Table {
            payload,
            by_node: HashMap::new(),
            by_string: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Assigns entry 0 to the root. The root is always hoisted, even when
    /// it is a bare primitive.
    fn hoist_root(&mut self, root: NodeId) -> Result<(), CodecError> {
        let node = self.payload.get(root).ok_or(CodecError::DanglingNode(root.0))?;
        match node {
            Node::String(value) => {
                let value = value.clone();
                self.string_index(root, &value);
            }
            _ => {
                self.node_index(root);
            }
        }
        Ok(())
    }

    fn node_index(&mut self, id: NodeId) -> usize {
        if let Some(&index) = self.by_node.get(&id.0) {
            return index;
        }
        let index = self.order.len();
        self.by_node.insert(id.0, index);
        self.order.push(id);
        index
    }

    fn string_index(&mut self, id: NodeId, value: &str) -> usize {
        if let Some(&index) = self.by_string.get(value) {
            return index;
        }
        let index = self.order.len();
        self.by_string.insert(value.to_owned(), index);
        self.order.push(id);
        index
    }

    /// The value written into a container for a child node: an index
    /// string for strings and containers, the inline value otherwise.
    fn slot_for(&mut self, id: NodeId) -> Result<Value, CodecError> {
        let node = self.payload.get(id).ok_or(CodecError::DanglingNode(id.0))?;
        Ok(match node {
            Node::Null => Value::Null,
            Node::Bool(value) => Value::Bool(*value),
            Node::Number(value) => Value::Number(value.clone()),
            Node::String(value) => {
                let value = value.clone();
                Value::String(self.string_index(id, &value).to_string())
            }
            Node::Array(_) | Node::Object(_) => {
                Value::String(self.node_index(id).to_string())
            }
        })
    }

    /// The table entry emitted for a hoisted node.
    fn entry_for(&mut self, id: NodeId) -> Result<Value, CodecError> {
        let node = self.payload.get(id).ok_or(CodecError::DanglingNode(id.0))?;
        Ok(match node {
            Node::Null => Value::Null,
            Node::Bool(value) => Value::Bool(*value),
            Node::Number(value) => Value::Number(value.clone()),
            Node::String(value) => Value::String(value.clone()),
            Node::Array(items) => {
                let items = items.clone();
                let mut slots = Vec::with_capacity(items.len());
                for item in items {
                    slots.push(self.slot_for(item)?);
                }
                Value::Array(slots)
            }
            Node::Object(members) => {
                let members = members.clone();
                let mut slots = Map::new();
                for (name, member) in members {
                    slots.insert(name, self.slot_for(member)?);
                }
                Value::Object(slots)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shared_payload() -> Payload {
        let mut payload = Payload::new();
        let one = payload.alloc(Node::Number(1.into()));
        let two = payload.alloc(Node::Number(2.into()));
        let shared = payload.alloc(Node::Array(vec![one, two]));
        let root = payload.alloc(Node::Object(vec![
            ("x".to_owned(), shared),
            ("y".to_owned(), shared),
        ]));
        payload.set_root(root);
        payload
    }

    fn cyclic_payload() -> Payload {
        let mut payload = Payload::new();
        let arr = payload.alloc(Node::Array(vec![]));
        payload.replace(arr, Node::Array(vec![arr]));
        payload.set_root(arr);
        payload
    }

    #[test]
    fn test_stringify_hoists_strings() {
        let payload = Payload::from_json(&json!({"a": "b"}));
        assert_eq!(stringify(&payload).unwrap(), r#"[{"a":"1"},"b"]"#);
    }

    #[test]
    fn test_stringify_shared_container_uses_one_entry() {
        assert_eq!(
            stringify(&shared_payload()).unwrap(),
            r#"[{"x":"1","y":"1"},[1,2]]"#
        );
    }

    #[test]
    fn test_stringify_cycle() {
        assert_eq!(stringify(&cyclic_payload()).unwrap(), r#"[["0"]]"#);
    }

    #[test]
    fn test_stringify_scalar_roots() {
        assert_eq!(stringify(&Payload::from_json(&json!(1))).unwrap(), "[1]");
        assert_eq!(
            stringify(&Payload::from_json(&json!("hello"))).unwrap(),
            r#"["hello"]"#
        );
        assert_eq!(stringify(&Payload::new()).unwrap(), "[null]");
    }

    #[test]
    fn test_stringify_dedupes_equal_strings() {
        let payload = Payload::from_json(&json!(["x", "x"]));
        assert_eq!(stringify(&payload).unwrap(), r#"[["1","1"],"x"]"#);
    }

    #[test]
    fn test_parse_inverts_stringify() {
        for payload in [
            Payload::from_json(&json!({"id": 7, "flags": [true, null], "name": "n"})),
            shared_payload(),
            cyclic_payload(),
            Payload::from_json(&json!("just a string")),
        ] {
            let text = stringify(&payload).unwrap();
            assert_eq!(parse(&text).unwrap(), payload);
        }
    }

    #[test]
    fn test_parse_preserves_shared_identity() {
        let text = stringify(&shared_payload()).unwrap();
        let decoded = parse(&text).unwrap();
        let Some(Node::Object(members)) = decoded.get(decoded.root()) else {
            panic!("root should be an object");
        };
        assert_eq!(members[0].1, members[1].1);
    }

    #[test]
    fn test_parse_rejects_malformed_tables() {
        assert!(matches!(parse("[]"), Err(CodecError::EmptyTable)));
        assert!(matches!(parse("{}"), Err(CodecError::Json(_))));
        assert!(matches!(
            parse(r#"[["7"]]"#),
            Err(CodecError::ReferenceOutOfRange(7))
        ));
        assert!(matches!(
            parse(r#"[["zero"]]"#),
            Err(CodecError::InvalidReference(_))
        ));
        assert!(matches!(
            parse(r#"[[[1]]]"#),
            Err(CodecError::NestedEntry)
        ));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let payload = shared_payload();
        let encoded = encode(&payload).unwrap();
        assert_eq!(decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert!(matches!(
            decode("not base64!!!"),
            Err(CodecError::Base64(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_compression() {
        let encoded = encode(&shared_payload()).unwrap();
        let bytes = BASE64.decode(&encoded).unwrap();
        let truncated = BASE64.encode(&bytes[..bytes.len() / 2]);
        assert!(decode(&truncated).is_err());
    }
}
