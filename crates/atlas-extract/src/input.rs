//! Source text loading for `extract --file`.
//!
//! The format is chosen by extension. Markup is reduced to plain text before
//! it reaches the prompt; the text is otherwise passed through unchanged.

use std::path::Path;

use scraper::{Html, Node};

use crate::error::{ExtractError, Result};

/// Characters dropped from Markdown sources: emphasis, headings, code
/// ticks and quote markers.
const MARKDOWN_MARKUP: [char; 4] = ['*', '#', '`', '>'];

/// Read a source document and return its plain text.
pub fn read_source_file(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let text = match extension.as_str() {
        "txt" | "text" => std::fs::read_to_string(path)?,
        "md" | "markdown" => strip_markdown(&std::fs::read_to_string(path)?),
        "html" | "htm" => html_to_text(&std::fs::read_to_string(path)?),
        "" => return Err(ExtractError::UnsupportedInput(path.display().to_string())),
        other => return Err(ExtractError::UnsupportedInput(format!(".{other}"))),
    };

    tracing::debug!(path = %path.display(), chars = text.chars().count(), "Loaded source file");
    Ok(text)
}

pub fn strip_markdown(source: &str) -> String {
    source.chars().filter(|c| !MARKDOWN_MARKUP.contains(c)).collect()
}

/// Visible text of an HTML document, one line per text run. Script and
/// style contents are skipped.
pub fn html_to_text(source: &str) -> String {
    let document = Html::parse_document(source);
    let mut lines = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"))
        });
        let run = text.trim();
        if !hidden && !run.is_empty() {
            lines.push(run.to_string());
        }
    }
    lines.join("\n")
}
