use std::borrow::Cow;

/// Maximum snippet length in characters, before the ellipsis marker.
const MAX_SNIPPET_CHARS: usize = 160;

/// Marker appended when a snippet is truncated (one char, so a truncated
/// snippet is exactly `MAX_SNIPPET_CHARS + 1` chars long).
const ELLIPSIS: char = '…';

/// Cleans a raw description/summary field into a bounded plain-text snippet.
///
/// Feeds put anything in these fields: escaped HTML, CDATA-wrapped HTML,
/// inline `<script>`/`<style>` blocks, or already-clean text. The cleaning
/// steps run in a fixed order:
///
/// 1. Unwrap `<![CDATA[...]]>` wrappers, keeping the inner text
/// 2. Remove `script` and `style` elements including their content
/// 3. Replace every remaining tag with a single space
/// 4. Collapse whitespace runs to one space and trim the ends
///
/// The result is truncated to 160 characters with a `…` marker appended
/// when truncation occurred. Already-clean text below the boundary passes
/// through unchanged, so the function is idempotent on its own output.
pub fn clean_snippet(raw: &str) -> String {
    let text = unwrap_cdata(raw);
    let text = strip_element(&text, "script");
    let text = strip_element(&text, "style");
    let text = strip_tags(&text);
    let collapsed = collapse_whitespace(&text);
    truncate_snippet(collapsed)
}

/// Unwraps complete `<![CDATA[...]]>` sections, keeping their inner text.
///
/// An unterminated CDATA opener is left in place; the tag stripper deals
/// with whatever remains. Returns `Cow::Borrowed` when the input contains
/// no CDATA marker (the common case).
fn unwrap_cdata(s: &str) -> Cow<'_, str> {
    const OPEN: &str = "<![CDATA[";
    const CLOSE: &str = "]]>";

    if !s.contains(OPEN) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find(OPEN) {
        let inner_start = start + OPEN.len();
        match rest[inner_start..].find(CLOSE) {
            Some(end) => {
                out.push_str(&rest[..start]);
                out.push_str(&rest[inner_start..inner_start + end]);
                rest = &rest[inner_start + end + CLOSE.len()..];
            }
            // No terminator: leave the tail untouched
            None => break,
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Removes `<name ...>...</name>` elements including their content,
/// case-insensitively.
///
/// Matching is lazy: each `<name` opener is paired with the nearest
/// `</name>` closer. An opener with no closer is left in place.
fn strip_element<'a>(s: &'a str, name: &str) -> Cow<'a, str> {
    let open = format!("<{name}");
    let close = format!("</{name}>");

    // ASCII lowercasing preserves byte offsets, so positions found in the
    // lowered copy index directly into the original.
    let lower = s.to_ascii_lowercase();
    if !lower.contains(&open) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut pos = 0;
    while let Some(found) = lower[pos..].find(&open) {
        let start = pos + found;
        match lower[start..].find(&close) {
            Some(end) => {
                out.push_str(&s[pos..start]);
                pos = start + end + close.len();
            }
            None => break,
        }
    }
    out.push_str(&s[pos..]);
    Cow::Owned(out)
}

/// Replaces every remaining `<...>` tag with a single space.
///
/// A `<` with no closing `>` is not a tag and stays literal, as does the
/// degenerate `<>`.
fn strip_tags(s: &str) -> Cow<'_, str> {
    if !s.contains('<') {
        return Cow::Borrowed(s);
    }

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(gap) = s[i + 1..].find('>') {
                if gap > 0 {
                    out.push_str(&s[last..i]);
                    out.push(' ');
                    i += 1 + gap + 1;
                    last = i;
                    continue;
                }
            }
        }
        i += 1;
    }
    out.push_str(&s[last..]);
    Cow::Owned(out)
}

/// Collapses whitespace runs to single spaces and trims both ends.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Truncates to `MAX_SNIPPET_CHARS` characters, appending `…` if cut.
fn truncate_snippet(mut s: String) -> String {
    let mut count = 0;
    for (idx, _) in s.char_indices() {
        if count == MAX_SNIPPET_CHARS {
            s.truncate(idx);
            s.push(ELLIPSIS);
            return s;
        }
        count += 1;
    }
    s
}
