//! Layout inheritance and includes.
//!
//! Resolution of a view runs as a small state machine, repeated once per
//! `@extends` hop:
//!
//! 1. **Detect** `@extends('layout')`. Without one the document is standalone:
//!    section markers are stripped, `@yield`s fall back to their defaults, done.
//! 2. **Extract inline sections** `@section('name', value)`.
//! 3. **Extract block sections** `@section('name') … @endsection`, pairing
//!    markers by depth.
//! 4. **Load** the parent layout (fatal if missing).
//! 5. **Substitute** every `@yield('name'[, default])` in the parent with the
//!    collected section, else its default, else nothing.
//! 6. The substituted parent becomes the working document; back to 1.
//!
//! A chain longer than [`MAX_LAYOUT_DEPTH`] templates, the view included, fails
//! with [`ViewError::LayoutCycleDetected`] before the extra layout is loaded.
//!
//! Sections are collected inline-first, then block, so when both forms define
//! the same name the block form wins regardless of position. Within one form
//! the later definition wins.
//!
//! Sections travel up the whole chain: a section defined by a view stays
//! available to every ancestor's `@yield`, and overrides a section of the same
//! name defined by an intermediate layout.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::CompileSession;
use super::scanner::{
    DirectiveCall, directive_calls, line_at, replace_directive_calls, split_arguments,
    string_literal,
};
use crate::constants::MAX_LAYOUT_DEPTH;
use crate::core::ViewError;

static EXTENDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@extends\s*\(").expect("valid extends pattern"));
static SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@section\s*\(").expect("valid section pattern"));
static ENDSECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@endsection\b").expect("valid endsection pattern"));
static YIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@yield\s*\(").expect("valid yield pattern"));
static INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@include\s*\(").expect("valid include pattern"));

/// Which syntax defined a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionOrigin {
    /// `@section('name', value)`
    Inline,
    /// `@section('name') … @endsection`
    Block,
}

/// A named fragment supplied by a child view for its layout's `@yield`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub content: String,
    pub origin: SectionOrigin,
}

/// Sections collected from one document, keyed by name.
pub type Sections = BTreeMap<String, Section>;

/// Resolve `identity` through its whole `@extends` chain.
pub(crate) fn resolve(session: &mut CompileSession<'_>, identity: &str) -> Result<String, ViewError> {
    let mut document = session.load_prepared(identity, 0)?;
    let mut chain = vec![identity.to_string()];
    let mut inherited = Sections::new();

    while let Some(layout) = find_extends(&document)? {
        if chain.len() >= MAX_LAYOUT_DEPTH {
            chain.push(layout);
            return Err(ViewError::LayoutCycleDetected {
                chain: chain.join(" -> "),
                depth: chain.len(),
            });
        }

        let mut sections = extract_sections(&document)?;
        sections.extend(std::mem::take(&mut inherited));
        tracing::debug!(
            "View '{}' extends '{}' with {} section(s)",
            chain.last().map_or("", String::as_str),
            layout,
            sections.len()
        );

        let parent = session.load_prepared(&layout, 0)?;
        document = substitute_yields(&parent, &sections)?;
        inherited = sections;
        chain.push(layout);
    }

    finish_standalone(&document)
}

/// The layout named by the first `@extends` in `content`, if any.
///
/// # Errors
///
/// Fails if the argument list is unbalanced or not a quoted name.
pub fn find_extends(content: &str) -> Result<Option<String>, ViewError> {
    let calls = directive_calls(content, &EXTENDS, "@extends")?;
    calls.first().map(|call| quoted_name(content, call, "@extends")).transpose()
}

/// Collect every section defined in `content`.
///
/// # Errors
///
/// Fails on unbalanced `@section(` argument lists, unquoted section names or an
/// empty inline value.
pub fn extract_sections(content: &str) -> Result<Sections, ViewError> {
    let mut inline = Vec::new();
    let remaining = replace_directive_calls(content, &SECTION, "@section", |call| {
        let args = split_arguments(call.arguments);
        if args.len() < 2 {
            return Ok(content[call.start..call.end].to_string());
        }
        let name = quoted_name(content, call, "@section")?;
        inline.push(Section {
            name,
            content: value_argument(content, call, "@section", args[1])?,
            origin: SectionOrigin::Inline,
        });
        Ok(String::new())
    })?;

    let mut sections = Sections::new();
    for section in inline.into_iter().chain(block_sections(&remaining)?) {
        sections.insert(section.name.clone(), section);
    }
    Ok(sections)
}

enum Marker {
    Open {
        start: usize,
        body_start: usize,
        name: String,
    },
    Close {
        start: usize,
    },
}

impl Marker {
    const fn start(&self) -> usize {
        match self {
            Self::Open {
                start,
                ..
            }
            | Self::Close {
                start,
            } => *start,
        }
    }
}

/// Pair `@section('name')` with `@endsection` by depth and return the sections
/// in order of their opening marker.
fn block_sections(content: &str) -> Result<Vec<Section>, ViewError> {
    let mut markers = Vec::new();
    for call in directive_calls(content, &SECTION, "@section")? {
        markers.push(Marker::Open {
            start: call.start,
            body_start: call.end,
            name: quoted_name(content, &call, "@section")?,
        });
    }
    for m in ENDSECTION.find_iter(content) {
        markers.push(Marker::Close {
            start: m.start(),
        });
    }
    markers.sort_by_key(Marker::start);

    let mut open: Vec<(usize, usize, String)> = Vec::new();
    let mut found = Vec::new();
    for marker in markers {
        match marker {
            Marker::Open {
                start,
                body_start,
                name,
            } => open.push((start, body_start, name)),
            Marker::Close {
                start,
            } => match open.pop() {
                Some((open_start, body_start, name)) => {
                    let body = strip_section_markers(&content[body_start..start])?;
                    found.push((
                        open_start,
                        Section {
                            name,
                            content: body.trim().to_string(),
                            origin: SectionOrigin::Block,
                        },
                    ));
                }
                None => {
                    tracing::debug!("Ignoring @endsection on line {} with no open section", line_at(content, start));
                }
            },
        }
    }

    for (start, _, name) in open {
        tracing::warn!("Section '{}' opened on line {} is never closed; ignoring it", name, line_at(content, start));
    }

    found.sort_by_key(|(start, _)| *start);
    Ok(found.into_iter().map(|(_, section)| section).collect())
}

/// Replace every `@yield` in `layout` with its section, default or nothing.
///
/// Substituted content is inserted verbatim and never rescanned.
///
/// # Errors
///
/// Fails on unbalanced `@yield(` argument lists, unquoted names or an empty
/// default.
pub fn substitute_yields(layout: &str, sections: &Sections) -> Result<String, ViewError> {
    replace_directive_calls(layout, &YIELD, "@yield", |call| {
        let name = quoted_name(layout, call, "@yield")?;
        let args = split_arguments(call.arguments);
        let default = args.get(1).map(|default| value_argument(layout, call, "@yield", default)).transpose()?;
        Ok(sections.get(&name).map_or_else(|| default.unwrap_or_default(), |section| section.content.clone()))
    })
}

/// Remove `@section(...)` and `@endsection` markers, keeping block bodies.
///
/// Inline sections disappear entirely, value included.
///
/// # Errors
///
/// Fails on unbalanced `@section(` argument lists.
pub fn strip_section_markers(content: &str) -> Result<String, ViewError> {
    let stripped = replace_directive_calls(content, &SECTION, "@section", |_| Ok(String::new()))?;
    Ok(ENDSECTION.replace_all(&stripped, "").into_owned())
}

/// Splice included templates in place of every `@include('name')`.
///
/// `include` returns the prepared text of a template, or `None` when it does
/// not exist; missing targets become a visible HTML comment instead of an
/// error.
///
/// # Errors
///
/// Propagates unbalanced or unquoted include arguments and any error from
/// `include` itself.
pub fn expand_includes<F>(content: &str, mut include: F) -> Result<String, ViewError>
where
    F: FnMut(&str) -> Result<Option<String>, ViewError>,
{
    replace_directive_calls(content, &INCLUDE, "@include", |call| {
        let name = quoted_name(content, call, "@include")?;
        Ok(include(&name)?.unwrap_or_else(|| missing_include_marker(&name)))
    })
}

/// Placeholder left where an `@include` target was missing.
#[must_use]
pub fn missing_include_marker(name: &str) -> String {
    format!("<!-- Include not found: {name} -->")
}

fn finish_standalone(document: &str) -> Result<String, ViewError> {
    let stripped = strip_section_markers(document)?;
    substitute_yields(&stripped, &Sections::new())
}

fn quoted_name(text: &str, call: &DirectiveCall<'_>, directive: &str) -> Result<String, ViewError> {
    split_arguments(call.arguments)
        .first()
        .and_then(|arg| string_literal(arg))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ViewError::InvalidDirective {
            directive: directive.to_string(),
            line: line_at(text, call.start),
            reason: format!("expected a quoted name, found '{}'", call.arguments.trim()),
        })
}

/// A section value or yield default: literals are used as-is, anything else is
/// an expression echoed with escaping. An empty argument is rejected.
fn value_argument(
    text: &str,
    call: &DirectiveCall<'_>,
    directive: &str,
    argument: &str,
) -> Result<String, ViewError> {
    let argument = argument.trim();
    if argument.is_empty() {
        return Err(ViewError::InvalidDirective {
            directive: directive.to_string(),
            line: line_at(text, call.start),
            reason: format!("empty value after the name in '{}'", call.arguments.trim()),
        });
    }
    Ok(string_literal(argument).unwrap_or_else(|| format!("{{{{ {argument} }}}}")))
}
