//! Decoding of list-endpoint query strings into an untyped parameter tree.
//!
//! Filters are sent with bracket notation (`score[operator]=between&score[value][min]=20`)
//! or as a JSON object literal per field (`email={"operator":"contains","value":"acme"}`).
//! Both decode into the same nested `serde_json::Value`, with every leaf left as a string.

use serde_json::{Map, Value};

/// Bracket segments below the parameter name; deeper segments collapse into one literal key
const MAX_DEPTH: usize = 5;
/// Pairs past this count are ignored
const MAX_PARAMS: usize = 1000;
/// Indexed keys above this stay object keys instead of becoming array slots
const MAX_ARRAY_INDEX: usize = 20;

/// Decode a raw (still percent-encoded) query string into a JSON object tree
pub fn decode_query(query: &str) -> Value {
    let mut root = Value::Object(Map::new());

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()).take(MAX_PARAMS) {
        let segments = split_key(&key);
        let leaf = if segments.len() == 1 {
            parse_json_literal(&value).unwrap_or_else(|| Value::String(value.to_string()))
        } else {
            Value::String(value.to_string())
        };
        insert(&mut root, &segments, leaf);
    }

    normalize_arrays(root)
}

/// `a[b][]` -> ["a", "b", ""]. Keys with unbalanced brackets are taken literally.
/// Past `MAX_DEPTH` the remainder is one segment: `a[1][2][3][4][5][6][7]` -> [.., "5", "[6][7]"].
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if open == 0 {
        return vec![key.to_string()];
    }

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        if segments.len() > MAX_DEPTH {
            segments.push(rest.to_string());
            break;
        }
        if !rest.starts_with('[') {
            return vec![key.to_string()];
        }
        match rest.find(']') {
            Some(close) => {
                segments.push(rest[1..close].to_string());
                rest = &rest[close + 1..];
            }
            None => return vec![key.to_string()],
        }
    }
    segments
}

fn parse_json_literal(raw: &str) -> Option<Value> {
    if !raw.trim_start().starts_with('{') {
        return None;
    }
    serde_json::from_str::<Value>(raw).ok().filter(Value::is_object)
}

fn insert(node: &mut Value, segments: &[String], leaf: Value) {
    let Some((head, tail)) = segments.split_first() else {
        if node.is_null() {
            *node = leaf;
        } else if let Value::Array(items) = node {
            // Repeated keys collect into an array
            items.push(leaf);
        } else {
            let previous = node.take();
            *node = Value::Array(vec![previous, leaf]);
        }
        return;
    };

    if head.is_empty() {
        if !node.is_array() {
            *node = Value::Array(vec![]);
        }
        if let Value::Array(items) = node {
            if tail.is_empty() {
                items.push(leaf);
            } else {
                let mut child = Value::Null;
                insert(&mut child, tail, leaf);
                items.push(child);
            }
        }
        return;
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        insert(child, tail, leaf);
    }
}

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<usize>().ok().filter(|i| *i <= MAX_ARRAY_INDEX)
}

/// Objects keyed `0..n` (from `status[value][0]=new`) become arrays
fn normalize_arrays(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let is_index_map = !map.is_empty() && map.keys().all(|k| array_index(k).is_some());
            if is_index_map {
                let mut indexed: Vec<(usize, Value)> = map
                    .into_iter()
                    .filter_map(|(k, v)| array_index(&k).map(|i| (i, normalize_arrays(v))))
                    .collect();
                indexed.sort_by_key(|(i, _)| *i);
                Value::Array(indexed.into_iter().map(|(_, v)| v).collect())
            } else {
                Value::Object(map.into_iter().map(|(k, v)| (k, normalize_arrays(v))).collect())
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_arrays).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_bracket_notation() {
        let v = decode_query("score[operator]=between&score[value][min]=20&score[value][max]=50&page=2");
        assert_eq!(
            v,
            json!({
                "score": { "operator": "between", "value": { "min": "20", "max": "50" } },
                "page": "2"
            })
        );
    }

    #[test]
    fn decodes_arrays_from_empty_and_indexed_brackets() {
        let v = decode_query("status[operator]=in&status[value][]=new&status[value][]=won");
        assert_eq!(v["status"]["value"], json!(["new", "won"]));

        let v = decode_query("source[operator]=in&source[value][1]=events&source[value][0]=website");
        assert_eq!(v["source"]["value"], json!(["website", "events"]));
    }

    #[test]
    fn decodes_json_literal_values() {
        let v = decode_query("email=%7B%22operator%22%3A%22contains%22%2C%22value%22%3A%22acme%22%7D");
        assert_eq!(v["email"], json!({ "operator": "contains", "value": "acme" }));
    }

    #[test]
    fn percent_decoding_and_plus_signs() {
        let v = decode_query("company[operator]=contains&company[value]=Tech+Corp%25");
        assert_eq!(v["company"]["value"], json!("Tech Corp%"));
    }

    #[test]
    fn unbalanced_brackets_are_literal_keys() {
        let v = decode_query("weird[key=1&[x]=2");
        assert_eq!(v["weird[key"], json!("1"));
        assert_eq!(v["[x]"], json!("2"));
    }

    #[test]
    fn repeated_plain_keys_collect() {
        let v = decode_query("is_qualified=true&is_qualified=false");
        assert_eq!(v["is_qualified"], json!(["true", "false"]));
    }

    fn depth(value: &Value) -> usize {
        match value {
            Value::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
            Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    #[test]
    fn deep_nesting_collapses_past_depth_limit() {
        let v = decode_query("a[b][c][d][e][f][g][h]=1");
        assert_eq!(v["a"]["b"]["c"]["d"]["e"]["f"]["[g][h]"], json!("1"));

        let hostile = format!("email{}=x", "[a]".repeat(20_000));
        let v = decode_query(&hostile);
        assert!(depth(&v) <= MAX_DEPTH + 2, "depth {}", depth(&v));
        let tail = "[a]".repeat(20_000 - MAX_DEPTH);
        assert_eq!(v["email"]["a"]["a"]["a"]["a"]["a"][tail.as_str()], json!("x"));
    }

    #[test]
    fn large_array_indices_stay_object_keys() {
        let v = decode_query("status[value][20]=new");
        assert_eq!(v["status"]["value"], json!(["new"]));

        let v = decode_query("status[value][21]=new&status[value][0]=won");
        assert_eq!(v["status"]["value"], json!({ "21": "new", "0": "won" }));
    }

    #[test]
    fn parameter_count_is_capped() {
        let query: Vec<String> = (0..MAX_PARAMS + 500).map(|i| format!("k{}=v", i)).collect();
        let v = decode_query(&query.join("&"));
        assert_eq!(v.as_object().map(Map::len), Some(MAX_PARAMS));
    }

    #[test]
    fn empty_query_is_empty_object() {
        assert_eq!(decode_query(""), json!({}));
    }
}
