//! Tool result truncation.
//!
//! Oversized tool outputs are cut down to a head slice, a marker stating
//! the original length, and a tail slice before they are stored or shown
//! to the model. The function is pure and deterministic: identical input
//! and parameters always produce byte-identical output, which keeps
//! downstream model behavior reproducible.

/// Hard cap on a single tool result, in characters.
pub const HARD_LIMIT: usize = 10 * 1024;

/// Fraction of the budget given to the head of the output.
pub const HEAD_RATIO: f64 = 0.5;

/// Fraction of the budget given to the tail of the output.
pub const TAIL_RATIO: f64 = 0.5;

/// Truncate a tool result with the default limits.
pub fn truncate_tool_result(text: &str) -> String {
    truncate_tool_result_within(text, None)
}

/// Truncate a tool result, additionally honoring an estimated context
/// budget when one is known. The effective limit is the smaller of the
/// hard cap and the budget; the budget can only tighten the cap.
pub fn truncate_tool_result_within(text: &str, context_budget: Option<usize>) -> String {
    let limit = context_budget.map_or(HARD_LIMIT, |budget| budget.min(HARD_LIMIT));
    truncate(text, limit, HEAD_RATIO, TAIL_RATIO)
}

/// Truncate `text` to at most `hard_limit` bytes as head + marker + tail.
///
/// Returns the input unchanged when it already fits. When head, tail, and
/// marker together exceed the limit, both slices shrink proportionally to
/// make room for the marker. Slice edges are snapped to char boundaries,
/// so output may be slightly under the limit, never over it.
pub fn truncate(text: &str, hard_limit: usize, head_ratio: f64, tail_ratio: f64) -> String {
    if text.len() <= hard_limit {
        return text.to_string();
    }

    let marker = format!("\n[... truncated ({} chars) ...]\n", text.len());
    let marker_len = marker.len();

    let mut head_len = (hard_limit as f64 * head_ratio) as usize;
    let mut tail_len = (hard_limit as f64 * tail_ratio) as usize;

    if head_len + tail_len + marker_len > hard_limit {
        let available = hard_limit.saturating_sub(marker_len);
        head_len = (available as f64 * head_ratio) as usize;
        tail_len = available - head_len;
    }

    let head_end = floor_char_boundary(text, head_len);
    let tail_start = ceil_char_boundary(text, text.len() - tail_len);

    let mut out = String::with_capacity(head_end + marker_len + (text.len() - tail_start));
    out.push_str(&text[..head_end]);
    out.push_str(&marker);
    out.push_str(&text[tail_start..]);
    out
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}
