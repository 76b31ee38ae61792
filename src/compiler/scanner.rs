//! Balanced-delimiter scanning for directive arguments and echoes.
//!
//! Every function here is a pure function of `(text, position)`: callers pass
//! an explicit start offset and receive an explicit end offset, so repeated or
//! interleaved scans over the same document can never observe each other.
//!
//! Scanning works on bytes. All delimiters are ASCII and UTF-8 continuation
//! bytes never collide with ASCII, so byte offsets returned here are always
//! valid `str` slice boundaries.
//!
//! Quoted string literals (`'...'` and `"..."`, with backslash escapes) are
//! skipped as a unit: a `)` inside `@if(name == ")")` does not close the
//! directive.

use regex::Regex;

use crate::core::ViewError;

/// A pair of single-byte delimiters scanned with depth counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub open: u8,
    pub close: u8,
}

/// `(` … `)`, used for every directive argument list.
pub const PARENS: Delimiters = Delimiters {
    open: b'(',
    close: b')',
};

/// A located `@name(...)` directive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveCall<'a> {
    /// Offset of the `@`
    pub start: usize,
    /// Offset one past the closing `)`
    pub end: usize,
    /// Raw argument text between the parentheses
    pub arguments: &'a str,
}

/// Find the delimiter closing a span opened just before `start`.
///
/// `start` is the offset immediately after the opening delimiter. Nested pairs
/// of the same kind increase the depth; the returned offset is that of the
/// close delimiter that brings the depth back to zero. Returns `None` when the
/// input ends first.
#[must_use]
pub fn find_matching(text: &str, start: usize, delimiters: Delimiters) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\'' || b == b'"' {
            i = skip_quoted(bytes, i)?;
            continue;
        }
        if b == delimiters.open {
            depth += 1;
        } else if b == delimiters.close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }

    None
}

/// Find the first occurrence of `terminator` at or after `start` that is not
/// inside a quoted string literal or a `{ … }` pair.
///
/// Brace depth is tracked so an object literal in `{{ {"a": {"b": 1}} }}` does
/// not end the echo early.
#[must_use]
pub fn find_terminator(text: &str, start: usize, terminator: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let needle = terminator.as_bytes();
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        if depth == 0 && bytes[i..].starts_with(needle) {
            return Some(i);
        }
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_quoted(bytes, i)?;
                continue;
            }
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }

    None
}

/// Returns the offset one past the closing quote of the literal starting at `at`.
fn skip_quoted(bytes: &[u8], at: usize) -> Option<usize> {
    let quote = bytes[at];
    let mut i = at + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// 1-based line number of `offset` in `text`.
#[must_use]
pub fn line_at(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Build the error reported when a span opened at `offset` is never closed.
pub(crate) fn unbalanced(text: &str, offset: usize, directive: &str) -> ViewError {
    ViewError::UnbalancedDelimiter {
        directive: directive.to_string(),
        line: line_at(text, offset),
    }
}

/// Locate every call of a parenthesised directive, left to right.
///
/// `opener` must match the directive keyword up to and including its `(`
/// (e.g. `@if\s*\(`). Each match is closed with [`find_matching`]; scanning
/// resumes after the closing parenthesis, so openers that appear inside an
/// argument span are not reported as separate calls.
///
/// # Errors
///
/// Returns [`ViewError::UnbalancedDelimiter`] for the first call whose
/// argument list is never closed.
pub fn directive_calls<'a>(
    text: &'a str,
    opener: &Regex,
    directive: &str,
) -> Result<Vec<DirectiveCall<'a>>, ViewError> {
    let mut calls = Vec::new();
    let mut cursor = 0;

    while let Some(m) = opener.find_at(text, cursor) {
        let close = find_matching(text, m.end(), PARENS)
            .ok_or_else(|| unbalanced(text, m.start(), directive))?;
        calls.push(DirectiveCall {
            start: m.start(),
            end: close + 1,
            arguments: &text[m.end()..close],
        });
        cursor = close + 1;
    }

    Ok(calls)
}

/// Rewrite every call of a parenthesised directive.
///
/// `replace` receives each located call and returns the text spliced in its
/// place; everything outside the calls is copied through unchanged.
///
/// # Errors
///
/// Propagates unbalanced argument lists and any error returned by `replace`.
pub fn replace_directive_calls<F>(
    text: &str,
    opener: &Regex,
    directive: &str,
    mut replace: F,
) -> Result<String, ViewError>
where
    F: FnMut(&DirectiveCall<'_>) -> Result<String, ViewError>,
{
    let calls = directive_calls(text, opener, directive)?;
    if calls.is_empty() {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for call in &calls {
        out.push_str(&text[last..call.start]);
        out.push_str(&replace(call)?);
        last = call.end;
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// Split an argument list on top-level commas.
///
/// Commas inside quotes, parentheses or brackets do not split. Each argument is
/// trimmed; an empty list yields no arguments.
#[must_use]
pub fn split_arguments(arguments: &str) -> Vec<&str> {
    let bytes = arguments.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_quoted(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(arguments[last..i].trim());
                last = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    let tail = arguments[last..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts
}

/// The contents of a single- or double-quoted string literal, unescaped.
///
/// Returns `None` when `argument` is not exactly one literal.
#[must_use]
pub fn string_literal(argument: &str) -> Option<String> {
    let argument = argument.trim();
    let bytes = argument.as_bytes();
    let quote = *bytes.first()?;
    if quote != b'\'' && quote != b'"' {
        return None;
    }
    if skip_quoted(bytes, 0)? != bytes.len() {
        return None;
    }

    let inner = &argument[1..argument.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
