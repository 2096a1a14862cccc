//! Reasoning extraction from assistant content.
//!
//! Some vendors return reasoning in an explicit field; others inline it in
//! the visible content between thinking tags. The scanner below handles the
//! latter: it looks for the first well-formed tagged region and splits it
//! out. Malformed or unterminated tags leave the content untouched and
//! produce no reasoning.

/// Tag pairs recognized by the scanner, matched case-insensitively.
const TAG_PAIRS: &[(&str, &str)] = &[
    ("<thinking>", "</thinking>"),
    ("<thought>", "</thought>"),
];

/// Split the first well-formed tagged reasoning region out of `content`.
///
/// Returns `(reasoning, remaining_content)`, or `None` when no well-formed
/// region exists. Of the recognized tag pairs, the one whose opening tag
/// appears earliest wins.
pub fn split_tagged_reasoning(content: &str) -> Option<(String, String)> {
    // ASCII lowercasing preserves byte offsets into the original
    let lower = content.to_ascii_lowercase();

    let mut region: Option<(usize, usize, usize, usize)> = None;
    for (open, close) in TAG_PAIRS {
        let Some(open_start) = lower.find(open) else {
            continue;
        };
        let inner_start = open_start + open.len();
        let Some(close_offset) = lower[inner_start..].find(close) else {
            continue;
        };
        let inner_end = inner_start + close_offset;
        let close_end = inner_end + close.len();

        if region.is_none_or(|(best, ..)| open_start < best) {
            region = Some((open_start, inner_start, inner_end, close_end));
        }
    }

    let (open_start, inner_start, inner_end, close_end) = region?;
    let reasoning = content[inner_start..inner_end].to_string();
    let mut remaining = String::with_capacity(content.len() - (close_end - open_start));
    remaining.push_str(&content[..open_start]);
    remaining.push_str(&content[close_end..]);
    Some((reasoning, remaining))
}
