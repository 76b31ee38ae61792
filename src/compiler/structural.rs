//! Control-flow directives.
//!
//! Rewrites `@foreach`/`@for`/`@while` and `@if`/`@elseif`/`@else`/`@endif`
//! into host control-flow tags. Arguments are relocated verbatim: the template's
//! expression syntax is the host's expression syntax, and nothing here
//! interprets it.

use regex::Regex;
use std::sync::LazyLock;

use super::scanner::{line_at, replace_directive_calls};
use crate::constants::MAX_WHILE_ITERATIONS;
use crate::core::ViewError;

static FOREACH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@foreach\s*\(").expect("valid foreach pattern"));
static FOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@for\s*\(").expect("valid for pattern"));
static WHILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@while\s*\(").expect("valid while pattern"));
static END_LOOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@end(?:foreach|for|while)\b").expect("valid endloop pattern"));

static IF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@if\s*\(").expect("valid if pattern"));
static ELSEIF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@elseif\s*\(").expect("valid elseif pattern"));
static ELSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@else\b").expect("valid else pattern"));
static ENDIF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@endif\b").expect("valid endif pattern"));

/// Compile loop directives.
///
/// - `@foreach(x in xs)` and `@for(x in xs)` become `{% for x in xs %}`
/// - `@while(cond)` becomes a bounded `for` that breaks once `cond` is false
/// - `@endforeach`, `@endfor` and `@endwhile` become `{% endfor %}`
///
/// Templates cannot assign variables, so a `@while` condition evaluates the
/// same on every iteration: false renders the body zero times, true renders
/// it exactly [`MAX_WHILE_ITERATIONS`] times. Each `@while` logs a warning.
///
/// # Errors
///
/// Returns [`ViewError::UnbalancedDelimiter`] if a loop argument list is never
/// closed.
pub fn compile_loops(content: &str) -> Result<String, ViewError> {
    let content = replace_directive_calls(content, &FOREACH, "@foreach", |call| {
        Ok(format!("{{% for {} %}}", call.arguments.trim()))
    })?;
    let content = replace_directive_calls(&content, &FOR, "@for", |call| {
        Ok(format!("{{% for {} %}}", call.arguments.trim()))
    })?;
    let content = replace_directive_calls(&content, &WHILE, "@while", |call| {
        tracing::warn!(
            "@while on line {} cannot change its condition between iterations; a true condition renders the body {} times",
            line_at(&content, call.start),
            MAX_WHILE_ITERATIONS
        );
        Ok(format!(
            "{{% for __while in range(end={MAX_WHILE_ITERATIONS}) %}}{{% if {} %}}{{% else %}}{{% break %}}{{% endif %}}",
            call.arguments.trim()
        ))
    })?;

    Ok(END_LOOP.replace_all(&content, "{% endfor %}").into_owned())
}

/// Compile conditional directives into `{% if %}`/`{% elif %}`/`{% else %}`/`{% endif %}`.
///
/// # Errors
///
/// Returns [`ViewError::UnbalancedDelimiter`] if a condition is never closed.
pub fn compile_conditionals(content: &str) -> Result<String, ViewError> {
    let content = replace_directive_calls(content, &IF, "@if", |call| {
        Ok(format!("{{% if {} %}}", call.arguments.trim()))
    })?;
    let content = replace_directive_calls(&content, &ELSEIF, "@elseif", |call| {
        Ok(format!("{{% elif {} %}}", call.arguments.trim()))
    })?;

    let content = ELSE.replace_all(&content, "{% else %}");
    Ok(ENDIF.replace_all(&content, "{% endif %}").into_owned())
}

/// Run the structural passes in their fixed order: loops, then conditionals.
///
/// # Errors
///
/// Propagates [`ViewError::UnbalancedDelimiter`] from either pass.
pub fn compile(content: &str) -> Result<String, ViewError> {
    let content = compile_loops(content)?;
    compile_conditionals(&content)
}
