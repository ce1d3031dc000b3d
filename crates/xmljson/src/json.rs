//! JSON boundary codec
//!
//! The only place that knows about the sigil keys. Encodes an arena into the
//! array form and decodes either form back into an arena:
//!
//! ```text
//! Element    → { "<name>": [children...] }
//! Attribute  → { "@<name>": "value" }
//! Text       → { "#TEXT": "..." }
//! Comment    → { "#COMMENT": "..." }
//! ProcInstr  → { "#PROC_INSTR": "<?...?>" }
//! ```

use crate::arena::DocumentArena;
use crate::compact;
use crate::error::{ConversionError, Result};
use crate::types::*;
use crate::utils::leaf_text;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Deepest element nesting the JSON form carries, in either direction
pub const MAX_DEPTH: usize = 256;

/// JSON nesting of a document at [`MAX_DEPTH`]: the top-level array, an entry
/// object and a children array per element, one leaf entry object
pub const MAX_JSON_DEPTH: usize = 2 * MAX_DEPTH + 2;

/// Encode the arena as the array of top-level entries
pub fn encode(arena: &DocumentArena) -> Result<Value> {
    let entries = arena
        .top_level()
        .iter()
        .map(|&id| encode_node(arena, id))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(entries))
}

/// Encode one node as a single-key entry (iterative post-order)
pub fn encode_node(arena: &DocumentArena, node_id: NodeId) -> Result<Value> {
    enum Visit {
        Enter(NodeId, usize),
        Exit(NodeId),
    }

    let mut stack = vec![Visit::Enter(node_id, 1)];
    let mut done: Vec<Value> = Vec::new();

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(id, depth) => {
                let node = arena.get(id)?;
                if node.is_element() {
                    if depth > MAX_DEPTH {
                        return Err(ConversionError::structural(
                            format!(
                                "Elements nested deeper than {} levels (<{}>)",
                                MAX_DEPTH,
                                node.tag_name().unwrap_or_default()
                            ),
                            None,
                        ));
                    }
                    stack.push(Visit::Exit(id));
                    for &child_id in node.children_ids.iter().rev() {
                        stack.push(Visit::Enter(child_id, depth + 1));
                    }
                } else {
                    done.push(leaf_entry(&node.kind));
                }
            }
            Visit::Exit(id) => {
                let node = arena.get(id)?;
                let children = done.split_off(done.len() - node.children_ids.len());
                done.push(single(node.kind.key(), Value::Array(children)));
            }
        }
    }

    done.pop()
        .ok_or(ConversionError::NodeNotFound(node_id))
}

/// Decode array or compacted form (or a bare root object) into an arena
pub fn decode(value: &Value) -> Result<DocumentArena> {
    let depth = value_depth(value);
    if depth > MAX_JSON_DEPTH {
        return Err(too_deep(depth));
    }

    let entries = match compact::expand(value.clone()) {
        Value::Array(entries) => entries,
        other => {
            return Err(ConversionError::InvalidShape(format!(
                "expected an array or an object at the top level, got {}",
                kind_name(&other)
            )))
        }
    };

    let mut arena = DocumentArena::new();
    let mut pending: Vec<(Option<NodeId>, usize, Vec<Value>)> = vec![(None, 0, entries)];

    while let Some((parent, depth, entries)) = pending.pop() {
        for entry in entries {
            let map = match entry {
                Value::Object(map) => map,
                other => {
                    tracing::warn!("Skipping invalid entry: {}", other);
                    continue;
                }
            };

            for (key, value) in map {
                let (kind, children) = decode_entry(key, value);
                if children.is_some() && depth >= MAX_DEPTH {
                    return Err(ConversionError::InvalidShape(format!(
                        "elements nested deeper than {} levels",
                        MAX_DEPTH
                    )));
                }
                let node_id = arena.add_node(kind);
                match parent {
                    Some(parent_id) => arena.append_child(parent_id, node_id)?,
                    None => arena.push_top_level(node_id)?,
                }
                if let Some(children) = children {
                    pending.push((Some(node_id), depth + 1, children));
                }
            }
        }
    }

    Ok(arena)
}

/// Parse JSON text without serde_json's fixed recursion limit
///
/// Nesting is checked against [`MAX_JSON_DEPTH`] before parsing; within that
/// bound the parser runs on a growable stack.
pub fn from_str(text: &str) -> Result<Value> {
    let depth = text_depth(text);
    if depth > MAX_JSON_DEPTH {
        return Err(too_deep(depth));
    }

    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

/// Bracket nesting of JSON text, ignoring brackets inside strings
fn text_depth(text: &str) -> usize {
    let (mut depth, mut max) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);

    for &byte in text.as_bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    max
}

/// Array/object nesting of a value (iterative)
fn value_depth(value: &Value) -> usize {
    let mut max = 0;
    let mut stack = vec![(value, 1usize)];

    while let Some((value, depth)) = stack.pop() {
        match value {
            Value::Array(items) => {
                max = max.max(depth);
                stack.extend(items.iter().map(|v| (v, depth + 1)));
            }
            Value::Object(map) => {
                max = max.max(depth);
                stack.extend(map.values().map(|v| (v, depth + 1)));
            }
            _ => {}
        }
    }

    max
}

fn too_deep(depth: usize) -> ConversionError {
    ConversionError::InvalidShape(format!(
        "JSON nested {} levels deep, the limit is {}",
        depth, MAX_JSON_DEPTH
    ))
}

/// Node kind for one entry, plus the children to decode for elements
fn decode_entry(key: String, value: Value) -> (NodeKind, Option<Vec<Value>>) {
    if key == PROC_INSTR_KEY {
        return (NodeKind::ProcInstr(leaf_text(&value)), None);
    }
    if key == COMMENT_KEY {
        return (NodeKind::Comment(leaf_text(&value)), None);
    }
    if key == TEXT_KEY {
        return (NodeKind::Text(leaf_text(&value)), None);
    }
    if let Some(name) = key.strip_prefix(ATTRIBUTE_PREFIX) {
        let attribute = NodeKind::Attribute {
            name: name.to_string(),
            value: leaf_text(&value),
        };
        return (attribute, None);
    }

    let children = match value {
        Value::Array(children) => children,
        Value::Null => Vec::new(),
        // A scalar element value is read as its text content
        scalar => vec![single(
            TEXT_KEY.to_string(),
            Value::String(leaf_text(&scalar)),
        )],
    };
    (NodeKind::Element { name: key }, Some(children))
}

fn leaf_entry(kind: &NodeKind) -> Value {
    let value = match kind {
        NodeKind::Attribute { value, .. } => value.clone(),
        NodeKind::Text(content) | NodeKind::Comment(content) | NodeKind::ProcInstr(content) => {
            content.clone()
        }
        NodeKind::Element { .. } => String::new(),
    };
    single(kind.key(), Value::String(value))
}

fn single(key: String, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key, value);
    Value::Object(map)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
