//! Marking note excerpts inside rendered HTML

use std::sync::LazyLock;

use regex::Regex;

static CHAR_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{0,31});")
        .expect("character reference regex")
});

/// Wrap every occurrence of each excerpt in a highlight span.
///
/// Only text between tags is searched, so attribute values and tag names are
/// never rewritten. Matching runs on the decoded text: a character reference
/// is never split, and a non-breaking space matches a plain one. An excerpt
/// split across markup is not highlighted.
#[must_use]
pub fn highlight_excerpts<'a>(html: &str, excerpts: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = html.to_string();
    for excerpt in excerpts {
        let needle = excerpt.trim();
        if needle.is_empty() {
            continue;
        }
        let needle: String = needle.replace('\t', "    ").chars().map(fold_space).collect();
        out = wrap_in_text(&out, &needle, "note");
    }
    out
}

fn wrap_in_text(html: &str, needle: &str, kind: &str) -> String {
    let open = format!(r#"<span class="highlight" data-type="{kind}">"#);
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => {
                let end = rest.find('>').map_or(rest.len(), |i| i + 1);
                out.push_str(&rest[..end]);
                rest = &rest[end..];
            }
            Some(tag_start) => {
                push_wrapped(&mut out, &rest[..tag_start], needle, &open);
                rest = &rest[tag_start..];
            }
            None => {
                push_wrapped(&mut out, rest, needle, &open);
                rest = "";
            }
        }
    }
    out
}

fn push_wrapped(out: &mut String, text: &str, needle: &str, open: &str) {
    let (plain, bounds) = decode_run(text);
    let raw_at = |pos: usize| {
        bounds
            .binary_search_by_key(&pos, |&(plain_pos, _)| plain_pos)
            .ok()
            .map(|i| bounds[i].1)
    };

    let mut copied = 0;
    let mut from = 0;
    while let Some(found) = plain[from..].find(needle) {
        let start = from + found;
        let end = start + needle.len();
        match (raw_at(start), raw_at(end)) {
            (Some(raw_start), Some(raw_end)) => {
                out.push_str(&text[copied..raw_start]);
                out.push_str(open);
                out.push_str(&text[raw_start..raw_end]);
                out.push_str("</span>");
                copied = raw_end;
                from = end;
            }
            // match starts or ends inside a character reference
            _ => from = start + plain[start..].chars().next().map_or(1, char::len_utf8),
        }
    }
    out.push_str(&text[copied..]);
}

/// Decoded text of one run between tags, plus `(plain, raw)` byte offsets of
/// every place where a source character or a whole reference begins.
fn decode_run(text: &str) -> (String, Vec<(usize, usize)>) {
    let mut plain = String::with_capacity(text.len());
    let mut bounds = Vec::with_capacity(text.len() + 1);
    let mut raw = 0;
    while raw < text.len() {
        bounds.push((plain.len(), raw));
        let rest = &text[raw..];
        let len = rest
            .starts_with('&')
            .then(|| CHAR_REFERENCE.find(rest).map(|m| m.end()))
            .flatten()
            .unwrap_or_else(|| rest.chars().next().map_or(1, char::len_utf8));
        let piece = &rest[..len];
        plain.extend(html_escape::decode_html_entities(piece).chars().map(fold_space));
        raw += len;
    }
    bounds.push((plain.len(), text.len()));
    (plain, bounds)
}

fn fold_space(c: char) -> char {
    if c == '\u{a0}' { ' ' } else { c }
}
