//! Echo compilation.
//!
//! `{{ expr }}` becomes `{{ escape_html(value=expr) }}` and `{!! expr !!}`
//! becomes a bare `{{ expr }}`. The escaped form passes the whole expression as
//! one argument; a trailing filter would bind only to its last operand. Both forms are found in a single left-to-right scan, so
//! the output of one rewrite is never matched again.

use super::scanner::{find_terminator, unbalanced};
use crate::constants::ESCAPE_HTML;
use crate::core::ViewError;

/// Rewrite literal `{%` and `{#` in authored text into string echoes so the
/// host never parses them as tags or comments.
///
/// Runs on every loaded source before any directive pass.
#[must_use]
pub fn protect_host_syntax(text: &str) -> String {
    if !text.contains("{%") && !text.contains("{#") {
        return text.to_string();
    }
    text.replace("{%", r#"{{ "{%" }}"#).replace("{#", r##"{{ "{#" }}"##)
}

/// Compile escaped and raw echoes.
///
/// # Errors
///
/// Returns [`ViewError::UnbalancedDelimiter`] when an echo is never closed.
pub fn compile_echoes(content: &str) -> Result<String, ViewError> {
    let mut out = String::with_capacity(content.len() + content.len() / 8);
    let mut cursor = 0;

    while let Some(offset) = content[cursor..].find('{') {
        let at = cursor + offset;
        let rest = &content[at..];

        if rest.starts_with("{!!") {
            let close = find_terminator(content, at + 3, "!!}").ok_or_else(|| unbalanced(content, at, "{!!"))?;
            out.push_str(&content[cursor..at]);
            out.push_str(&raw_echo(&content[at + 3..close]));
            cursor = close + 3;
        } else if rest.starts_with("{{") {
            let close = find_terminator(content, at + 2, "}}").ok_or_else(|| unbalanced(content, at, "{{"))?;
            out.push_str(&content[cursor..at]);
            out.push_str(&escaped_echo(&content[at + 2..close]));
            cursor = close + 2;
        } else {
            out.push_str(&content[cursor..=at]);
            cursor = at + 1;
        }
    }

    out.push_str(&content[cursor..]);
    Ok(out)
}

fn escaped_echo(expression: &str) -> String {
    format!("{{{{ {ESCAPE_HTML}(value={}) }}}}", expression.trim())
}

fn raw_echo(expression: &str) -> String {
    format!("{{{{ {} }}}}", expression.trim())
}
