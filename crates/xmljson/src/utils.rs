//! Small helpers shared by the codec, the compactor and the serializer

use ahash::AHashMap;
use serde_json::Value;

/// True when no key occurs twice
pub fn keys_unique<'k>(keys: impl IntoIterator<Item = &'k str>) -> bool {
    let mut counts: AHashMap<&str, usize> = AHashMap::new();
    for key in keys {
        let count = counts.entry(key).or_insert(0);
        *count += 1;
        if *count > 1 {
            return false;
        }
    }
    true
}

/// Key of a single-key entry object, `None` for anything else
pub fn single_key(entry: &Value) -> Option<&str> {
    match entry {
        Value::Object(map) if map.len() == 1 => map.keys().next().map(String::as_str),
        _ => None,
    }
}

/// Leaf value as text. Strings verbatim, `null` empty, others as JSON text.
pub fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Indentation prefix for a nesting depth
pub fn indent(depth: usize, width: usize) -> String {
    " ".repeat(depth * width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_unique() {
        assert!(keys_unique(["a", "b", "@a"]));
        assert!(!keys_unique(["b", "a", "b"]));
        assert!(keys_unique(std::iter::empty::<&str>()));
    }

    #[test]
    fn test_single_key() {
        assert_eq!(single_key(&json!({ "a": [] })), Some("a"));
        assert_eq!(single_key(&json!({ "a": [], "b": [] })), None);
        assert_eq!(single_key(&json!("a")), None);
    }

    #[test]
    fn test_leaf_text() {
        assert_eq!(leaf_text(&json!("x")), "x");
        assert_eq!(leaf_text(&json!(123)), "123");
        assert_eq!(leaf_text(&json!(true)), "true");
        assert_eq!(leaf_text(&Value::Null), "");
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent(0, 4), "");
        assert_eq!(indent(2, 4).len(), 8);
    }
}
