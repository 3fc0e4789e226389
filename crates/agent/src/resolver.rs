//! Placeholder resolution for tool-call arguments.
//!
//! Before dispatch, string-valued arguments may reference prior results
//! or session memory:
//!
//! - `${tool_result.N}` — output of the N-th dispatched call (0-indexed)
//! - `${tool_result.last}` — output of the most recent call
//! - `${memory.KEY}` — current value of KEY in the session memory
//! - `${natural.QUERY}` — fuzzy lookup by tool name or recency wording
//!
//! Unresolvable placeholders are left untouched so the tool (and the
//! model, via the error output) can see what was asked for. Non-string
//! values pass through unchanged.

use loopsmith_core::tool::ToolRecord;
use loopsmith_memory::MemoryStore;
use regex_lite::Regex;
use std::sync::LazyLock;

/// Recency wordings recognized by `${natural.QUERY}`.
const RECENCY_MARKERS: &[&str] = &["last", "latest", "most recent", "previous"];

static INDEXED_RESULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{tool_result\.(\d+)\}").expect("valid pattern"));
static MEMORY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{memory\.([^}]+)\}").expect("valid pattern"));
static NATURAL_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{natural\.([^}]+)\}").expect("valid pattern"));

/// Resolve placeholders in a parsed argument object.
///
/// Only top-level string values are rewritten; one value may contain any
/// mix of placeholder forms alongside literal text.
pub async fn resolve_placeholders(
    mut args: serde_json::Value,
    results: &[ToolRecord],
    memory: &MemoryStore,
) -> serde_json::Value {
    let Some(map) = args.as_object_mut() else {
        return args;
    };

    for value in map.values_mut() {
        if let Some(text) = value.as_str() {
            let resolved = resolve_value(text, results, memory).await;
            *value = serde_json::Value::String(resolved);
        }
    }
    args
}

async fn resolve_value(text: &str, results: &[ToolRecord], memory: &MemoryStore) -> String {
    let mut value = text.to_string();

    // ${tool_result.N}
    let occurrences: Vec<(String, usize)> = INDEXED_RESULT
        .captures_iter(&value)
        .filter_map(|c| {
            let index: usize = c[1].parse().ok()?;
            Some((c[0].to_string(), index))
        })
        .collect();
    for (placeholder, index) in occurrences {
        if let Some(record) = results.get(index) {
            value = value.replace(&placeholder, &record.output);
        }
    }

    // ${tool_result.last}
    if value.contains("${tool_result.last}") {
        if let Some(record) = results.last() {
            value = value.replace("${tool_result.last}", &record.output);
        }
    }

    // ${memory.KEY}
    let keys: Vec<(String, String)> = MEMORY_KEY
        .captures_iter(&value)
        .map(|c| (c[0].to_string(), c[1].to_string()))
        .collect();
    for (placeholder, key) in keys {
        if let Some(stored) = memory.get(&key).await {
            value = value.replace(&placeholder, &stored);
        }
    }

    // ${natural.QUERY}
    let queries: Vec<(String, String)> = NATURAL_QUERY
        .captures_iter(&value)
        .map(|c| (c[0].to_string(), c[1].to_string()))
        .collect();
    for (placeholder, query) in queries {
        if let Some(resolved) = find_by_description(&query, results) {
            value = value.replace(&placeholder, &resolved);
        }
    }

    value
}

/// Resolve a natural-language reference against the result history.
///
/// Scans newest-first for an entry whose tool name appears in the query,
/// or matches any entry when the query uses recency wording. Multi-line
/// colon-separated outputs (grep-style) are condensed to their path
/// prefixes, at most 5 and skipping error lines.
fn find_by_description(query: &str, results: &[ToolRecord]) -> Option<String> {
    if results.is_empty() {
        return None;
    }
    let query_lower = query.to_lowercase();
    let recency = RECENCY_MARKERS.iter().any(|m| query_lower.contains(m));

    for record in results.iter().rev() {
        let tool_name = record.name.to_lowercase();
        if !query_lower.contains(&tool_name) && !recency {
            continue;
        }

        let output = &record.output;
        if output.contains('\n') {
            let prefixes: Vec<&str> = output
                .trim()
                .lines()
                .filter_map(|line| line.split_once(':').map(|(prefix, _)| prefix))
                .filter(|prefix| !prefix.is_empty() && !prefix.starts_with("Error"))
                .take(5)
                .collect();
            if !prefixes.is_empty() {
                return Some(prefixes.join("\n"));
            }
        }
        return Some(output.clone());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(name: &str, output: &str) -> ToolRecord {
        ToolRecord {
            tool_call_id: "c".into(),
            name: name.into(),
            output: output.into(),
            success: true,
            duration: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn indexed_reference_substitutes_output() {
        let results = vec![record("grep", "first"), record("bash", "second")];
        let args = serde_json::json!({"path": "${tool_result.1}/file"});
        let out = resolve_placeholders(args, &results, &MemoryStore::new()).await;
        assert_eq!(out["path"], "second/file");
    }

    #[tokio::test]
    async fn out_of_range_index_left_untouched() {
        let results = vec![record("grep", "only")];
        let args = serde_json::json!({"path": "${tool_result.7}"});
        let out = resolve_placeholders(args, &results, &MemoryStore::new()).await;
        assert_eq!(out["path"], "${tool_result.7}");
    }

    #[tokio::test]
    async fn last_equals_highest_index() {
        let results = vec![record("a", "x"), record("b", "y"), record("c", "z")];
        let args = serde_json::json!({"v1": "${tool_result.last}", "v2": "${tool_result.2}"});
        let out = resolve_placeholders(args, &results, &MemoryStore::new()).await;
        assert_eq!(out["v1"], out["v2"]);
        assert_eq!(out["v1"], "z");
    }

    #[tokio::test]
    async fn last_with_empty_history_is_noop() {
        let args = serde_json::json!({"v": "${tool_result.last}"});
        let out = resolve_placeholders(args, &[], &MemoryStore::new()).await;
        assert_eq!(out["v"], "${tool_result.last}");
    }

    #[tokio::test]
    async fn memory_key_substitutes_and_mixes_with_text() {
        let memory = MemoryStore::new();
        memory.set("target", "src/main.rs").await;
        let args = serde_json::json!({"path": "${memory.target}.bak"});
        let out = resolve_placeholders(args, &[], &memory).await;
        assert_eq!(out["path"], "src/main.rs.bak");
    }

    #[tokio::test]
    async fn absent_memory_key_left_untouched() {
        let args = serde_json::json!({"path": "${memory.missing}"});
        let out = resolve_placeholders(args, &[], &MemoryStore::new()).await;
        assert_eq!(out["path"], "${memory.missing}");
    }

    #[tokio::test]
    async fn natural_matches_tool_name() {
        let results = vec![record("grep", "match found")];
        let args = serde_json::json!({"q": "${natural.the grep results}"});
        let out = resolve_placeholders(args, &results, &MemoryStore::new()).await;
        assert_eq!(out["q"], "match found");
    }

    #[tokio::test]
    async fn natural_recency_marker_matches_newest() {
        let results = vec![record("grep", "old"), record("bash", "new")];
        let args = serde_json::json!({"q": "${natural.the most recent output}"});
        let out = resolve_placeholders(args, &results, &MemoryStore::new()).await;
        assert_eq!(out["q"], "new");
    }

    #[tokio::test]
    async fn natural_condenses_grep_style_output_to_paths() {
        let output = "src/a.rs:10:foo\nsrc/b.rs:22:foo\nError: skipped\nsrc/c.rs:1:foo";
        let results = vec![record("grep", output)];
        let args = serde_json::json!({"files": "${natural.grep matches}"});
        let out = resolve_placeholders(args, &results, &MemoryStore::new()).await;
        assert_eq!(out["files"], "src/a.rs\nsrc/b.rs\nsrc/c.rs");
    }

    #[tokio::test]
    async fn natural_no_match_left_untouched() {
        let results = vec![record("bash", "output")];
        let args = serde_json::json!({"q": "${natural.weather report}"});
        let out = resolve_placeholders(args, &results, &MemoryStore::new()).await;
        assert_eq!(out["q"], "${natural.weather report}");
    }

    #[tokio::test]
    async fn non_string_values_pass_through() {
        let args = serde_json::json!({"count": 42, "flag": true, "s": "${tool_result.last}"});
        let results = vec![record("a", "text")];
        let out = resolve_placeholders(args, &results, &MemoryStore::new()).await;
        assert_eq!(out["count"], 42);
        assert_eq!(out["flag"], true);
        assert_eq!(out["s"], "text");
    }
}
