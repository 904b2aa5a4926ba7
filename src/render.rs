//! Turning decoded document text into displayable HTML

use pulldown_cmark::{Options, Parser, html};

use crate::document::DocumentKind;

#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    pub line_numbers: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub kind: DocumentKind,
}

/// Render a text document. PDFs go through the page scheduler instead and
/// are rendered here as plain text if they ever reach this function.
#[must_use]
pub fn render_text(content: &str, kind: DocumentKind, options: RenderOptions) -> RenderedDocument {
    let html = match kind {
        DocumentKind::Markdown => markdown_to_html(content),
        DocumentKind::Html => content.to_string(),
        DocumentKind::Text | DocumentKind::Pdf => {
            if options.line_numbers {
                numbered_text_to_html(content)
            } else {
                plain_text_to_html(content)
            }
        }
    };
    RenderedDocument { html, kind }
}

fn markdown_to_html(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(content, options);
    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn plain_text_to_html(content: &str) -> String {
    let body = lines(content)
        .map(escape_line)
        .collect::<Vec<_>>()
        .join("<br>");
    format!(r#"<div class="text-content">{body}</div>"#)
}

fn numbered_text_to_html(content: &str) -> String {
    let mut out = String::from(r#"<div class="text-content">"#);
    for (idx, line) in lines(content).enumerate() {
        out.push_str(&format!(
            r#"<div class="line"><span class="line-number">{}</span><span class="line-text">{}</span></div>"#,
            idx + 1,
            escape_line(line)
        ));
    }
    out.push_str("</div>");
    out
}

fn lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Escape markup and keep runs of spaces and tabs visible
fn escape_line(line: &str) -> String {
    html_escape::encode_text(line)
        .replace("  ", "&nbsp;&nbsp;")
        .replace('\t', "&nbsp;&nbsp;&nbsp;&nbsp;")
}
