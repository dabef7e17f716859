//! JSON snapshot assembly (spec.md §4.8, §6 `run_results_{ts}.json`): the
//! full `SharedState` with article content/summary bodies elided beyond 500
//! characters.

use serde_json::Value;

/// Max characters kept for any `content`/`summary` field before eliding
/// (spec.md §4.8).
const MAX_BODY_CHARS: usize = 500;

/// Walks `value` recursively, truncating the string value of any object key
/// named `content` or `summary` beyond [`MAX_BODY_CHARS`]. Operates on a
/// generic `Value` (rather than a typed `SharedState`) so this crate stays
/// free of a dependency on `digestgraph-core`.
pub fn elide_article_bodies(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let elided = if (key == "content" || key == "summary") && v.is_string() {
                    Value::String(truncate(v.as_str().unwrap_or_default()))
                } else {
                    elide_article_bodies(v)
                };
                out.insert(key.clone(), elided);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(elide_article_bodies).collect()),
        other => other.clone(),
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_BODY_CHARS {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(MAX_BODY_CHARS).collect();
        s.push('\u{2026}');
        s
    }
}

/// Pretty-prints `value` with stable key order — this workspace's
/// `serde_json` is not built with the `preserve_order` feature, so object
/// keys serialize in sorted order deterministically — so repeated runs over
/// identical state are byte-equal (testable property 7/9).
pub fn to_pretty_string(value: &Value) -> crate::error::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn elides_long_content_fields() {
        let long = "x".repeat(600);
        let value = json!({"articles": [{"content": long, "title": "t"}]});
        let elided = elide_article_bodies(&value);
        let content = elided["articles"][0]["content"].as_str().unwrap();
        assert!(content.chars().count() <= MAX_BODY_CHARS + 1);
        assert!(content.ends_with('\u{2026}'));
    }

    #[test]
    fn leaves_short_content_untouched() {
        let value = json!({"content": "short"});
        assert_eq!(elide_article_bodies(&value)["content"], json!("short"));
    }

    #[test]
    fn leaves_non_content_fields_untouched() {
        let long = "y".repeat(600);
        let value = json!({"title": long.clone()});
        assert_eq!(elide_article_bodies(&value)["title"], json!(long));
    }
}
