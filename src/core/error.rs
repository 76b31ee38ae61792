//! Error handling for the view engine
//!
//! This module provides the error taxonomy for compiling and rendering views and
//! the user-friendly reporting used by the `vlx` CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** so callers can react to specific failure modes
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ViewError`] - Enumerated error types for every failure in the pipeline
//! - [`ErrorContext`] - Wrapper that adds user-friendly details and suggestions
//!
//! # Fatal vs. lenient failures
//!
//! Every [`ViewError`] aborts the render call that produced it. The only lenient
//! case in the pipeline, a missing `@include` target, never surfaces as an error:
//! the compiler splices a visible placeholder comment instead. Cache write
//! failures are likewise swallowed (logged with `tracing::warn!`) because caching
//! is an optimization, never a correctness dependency.
//!
//! # Examples
//!
//! ```rust,no_run
//! use vlx_view::core::{ViewError, user_friendly_error};
//!
//! let err = anyhow::Error::from(ViewError::TemplateNotFound {
//!     identity: "auth.login".to_string(),
//!     path: "resources/views/auth/login.vlx.html".to_string(),
//! });
//!
//! // Typed causes stay reachable through anyhow
//! assert!(matches!(err.downcast_ref::<ViewError>(), Some(ViewError::TemplateNotFound { .. })));
//!
//! user_friendly_error(err).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for view compilation and rendering
///
/// # Error Categories
///
/// ## Template resolution
/// - [`TemplateNotFound`] - view, layout or required template missing
/// - [`InvalidViewName`] - identity is not a well-formed dotted name
///
/// ## Compilation
/// - [`UnbalancedDelimiter`] - a directive argument or echo was never closed
/// - [`InvalidDirective`] - a layout/section/yield/include name is not a literal
/// - [`LayoutCycleDetected`] - `@extends` chain exceeded the depth guard
/// - [`IncludeDepthExceeded`] - `@include` nesting exceeded the depth guard
///
/// ## Rendering
/// - [`VariableNotFound`] - the compiled view referenced an unbound variable
/// - [`RenderFailed`] - the host engine rejected or failed the compiled view
///
/// [`TemplateNotFound`]: ViewError::TemplateNotFound
/// [`InvalidViewName`]: ViewError::InvalidViewName
/// [`UnbalancedDelimiter`]: ViewError::UnbalancedDelimiter
/// [`InvalidDirective`]: ViewError::InvalidDirective
/// [`LayoutCycleDetected`]: ViewError::LayoutCycleDetected
/// [`IncludeDepthExceeded`]: ViewError::IncludeDepthExceeded
/// [`VariableNotFound`]: ViewError::VariableNotFound
/// [`RenderFailed`]: ViewError::RenderFailed
#[derive(Error, Debug)]
pub enum ViewError {
    /// A view, extended layout or required template does not exist
    ///
    /// # Fields
    /// - `identity`: The dotted view name that was requested
    /// - `path`: Where the loader looked for it
    #[error("View [{identity}] not found at [{path}]")]
    TemplateNotFound {
        /// Dotted view name that was requested
        identity: String,
        /// Location the loader resolved the name to
        path: String,
    },

    /// A directive argument or echo delimiter has no matching close
    ///
    /// This indicates malformed template authoring, e.g. `@if(user.active` or an
    /// unterminated `{{`.
    #[error("Unbalanced delimiter in {directive} starting on line {line}")]
    UnbalancedDelimiter {
        /// The directive or echo form being scanned (e.g. "@if", "{{")
        directive: String,
        /// 1-based line of the opening delimiter
        line: usize,
    },

    /// A directive's arguments have the wrong shape
    ///
    /// Layout, section, yield and include names must be quoted string literals.
    #[error("Invalid {directive} on line {line}: {reason}")]
    InvalidDirective {
        /// The directive keyword (e.g. "@section")
        directive: String,
        /// 1-based line of the directive
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The `@extends` chain exceeded [`crate::constants::MAX_LAYOUT_DEPTH`]
    #[error("Layout cycle detected after {depth} levels: {chain}")]
    LayoutCycleDetected {
        /// Arrow-joined chain of layouts resolved so far
        chain: String,
        /// Length of the chain, counting the layout that was refused
        depth: usize,
    },

    /// `@include` nesting exceeded [`crate::constants::MAX_INCLUDE_DEPTH`]
    #[error("Include depth of {depth} exceeded while including '{identity}'")]
    IncludeDepthExceeded {
        /// Include target being expanded when the guard tripped
        identity: String,
        /// Nesting depth reached
        depth: usize,
    },

    /// The view name is not a valid dotted identity
    #[error("Invalid view name '{name}': {reason}")]
    InvalidViewName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// A compiled view referenced a variable missing from the render scope
    #[error("Variable '{variable}' not found while rendering view [{identity}]")]
    VariableNotFound {
        /// View being rendered
        identity: String,
        /// The unbound variable
        variable: String,
        /// Similar names available in the scope
        suggestions: Vec<String>,
    },

    /// The host engine failed to parse or execute the compiled view
    #[error("Failed to render view [{identity}]: {reason}")]
    RenderFailed {
        /// View being rendered
        identity: String,
        /// Host engine message
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for ViewError {
    fn clone(&self) -> Self {
        match self {
            Self::TemplateNotFound {
                identity,
                path,
            } => Self::TemplateNotFound {
                identity: identity.clone(),
                path: path.clone(),
            },
            Self::UnbalancedDelimiter {
                directive,
                line,
            } => Self::UnbalancedDelimiter {
                directive: directive.clone(),
                line: *line,
            },
            Self::InvalidDirective {
                directive,
                line,
                reason,
            } => Self::InvalidDirective {
                directive: directive.clone(),
                line: *line,
                reason: reason.clone(),
            },
            Self::LayoutCycleDetected {
                chain,
                depth,
            } => Self::LayoutCycleDetected {
                chain: chain.clone(),
                depth: *depth,
            },
            Self::IncludeDepthExceeded {
                identity,
                depth,
            } => Self::IncludeDepthExceeded {
                identity: identity.clone(),
                depth: *depth,
            },
            Self::InvalidViewName {
                name,
                reason,
            } => Self::InvalidViewName {
                name: name.clone(),
                reason: reason.clone(),
            },
            Self::VariableNotFound {
                identity,
                variable,
                suggestions,
            } => Self::VariableNotFound {
                identity: identity.clone(),
                variable: variable.clone(),
                suggestions: suggestions.clone(),
            },
            Self::RenderFailed {
                identity,
                reason,
            } => Self::RenderFailed {
                identity: identity.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // io::Error is not Clone
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context in yellow (optional)
/// 3. **Suggestion**: Actionable steps in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use vlx_view::core::{ErrorContext, ViewError};
///
/// let context = ErrorContext::new(ViewError::ConfigError {
///     message: "view_path is empty".to_string(),
/// })
/// .with_suggestion("Set view_path in vlx.toml")
/// .with_details("The view root is required to resolve dotted view names");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ViewError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ViewError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`ViewError`] anywhere in the chain (so `.with_context` wrappers
/// added by the engine do not hide it) and [`std::io::Error`]; anything else is
/// reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(view_error) = error.downcast_ref::<ViewError>() {
        let mut ctx = create_error_context(view_error.clone());
        let outer = error.to_string();
        if outer != view_error.to_string() && ctx.details.is_none() {
            ctx.details = Some(outer);
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ViewError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check ownership and permissions of the view and cache directories");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ViewError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ViewError::Other {
        message,
    })
}

fn create_error_context(error: ViewError) -> ErrorContext {
    match &error {
        ViewError::TemplateNotFound {
            identity,
            ..
        } => {
            let suggestion = format!(
                "Create the view file for '{identity}' or fix the name passed to render/@extends/@include"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Dotted view names map to directories: 'auth.login' resolves to 'auth/login' plus the view extension")
        }
        ViewError::UnbalancedDelimiter {
            directive,
            ..
        } => {
            let suggestion = format!("Close the argument or echo opened by {directive}");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Directive arguments must have balanced parentheses and echoes must end with '}}' or '!!}'")
        }
        ViewError::InvalidDirective {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Quote the name argument, e.g. @section('title') or @include('partials.nav')",
        ),
        ViewError::LayoutCycleDetected {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check that no layout extends itself directly or through its parents")
            .with_details("Each @extends hop counts toward the layout depth limit"),
        ViewError::IncludeDepthExceeded {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove the @include that makes a view include itself"),
        ViewError::InvalidViewName {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Use dot-separated names such as 'layouts.app'; path separators and '..' are not allowed",
        ),
        ViewError::VariableNotFound {
            suggestions,
            ..
        } => {
            let ctx = ErrorContext::new(error.clone());
            if suggestions.is_empty() {
                ctx.with_suggestion("Pass the variable in the render data or guard it with `is defined`")
            } else {
                let list = suggestions.join(", ");
                ctx.with_suggestion(format!("Did you mean one of: {list}?"))
            }
        }
        ViewError::RenderFailed {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Run 'vlx compile <view>' to inspect the compiled output around the reported location",
        ),
        ViewError::ConfigError {
            ..
        } => ErrorContext::new(error).with_suggestion("Check the syntax and values in vlx.toml"),
        _ => ErrorContext::new(error),
    }
}
