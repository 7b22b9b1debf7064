//! Snippet cleanup shared by every adapter: HTML stripping and truncation.

use scraper::Html;

/// Strip HTML tags and decode entities, returning trimmed plain text.
///
/// `<script>` and `<style>` bodies are dropped entirely; all other markup
/// is removed and its text kept. Plain text passes through unchanged apart
/// from entity decoding and trimming.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let cleaned = strip_tag(&strip_tag(html, "script"), "style");
    let fragment = Html::parse_fragment(&cleaned);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_owned()
}

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_owned(),
        None => text.to_owned(),
    }
}

/// Strip HTML, then truncate to `max_chars` characters.
pub fn clean_snippet(html: &str, max_chars: usize) -> String {
    truncate_chars(&strip_html(html), max_chars)
}

/// Remove all instances of a specific HTML tag and its content.
fn strip_tag(html: &str, tag: &str) -> String {
    let lower = html.to_lowercase();
    // Lowercasing can change byte lengths for some non-ASCII text; offsets
    // would no longer line up, so leave such input to the parser.
    if lower.len() != html.len() {
        return html.to_owned();
    }

    let mut result = String::with_capacity(html.len());
    let open_tag = format!("<{tag}");
    let close_tag = format!("</{tag}>");

    let mut pos = 0;
    loop {
        let start = match lower[pos..].find(&open_tag) {
            Some(offset) => pos + offset,
            None => {
                result.push_str(&html[pos..]);
                break;
            }
        };

        // Not the target tag (e.g. <styles> for <style>).
        let after_tag = start + open_tag.len();
        if after_tag < lower.len() {
            let next_byte = lower.as_bytes()[after_tag];
            if !matches!(next_byte, b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t') {
                result.push_str(&html[pos..after_tag]);
                pos = after_tag;
                continue;
            }
        }

        result.push_str(&html[pos..start]);

        let end = match lower[start..].find(&close_tag) {
            Some(offset) => start + offset + close_tag.len(),
            None => match lower[start..].find('>') {
                Some(offset) => start + offset + 1,
                None => html.len(),
            },
        };

        pos = end;
    }

    result
}
