//! Core types for the view engine
//!
//! This module holds the error taxonomy shared by every stage of the pipeline.
//!
//! ## `error` - Error Handling
//!
//! - [`ViewError`] - Enumerated failure modes of compiling and rendering
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to user-friendly format
//!
//! Library entry points return [`anyhow::Result`]; typed causes remain
//! reachable with `err.downcast_ref::<ViewError>()` even after context has been
//! attached.

pub mod error;

pub use error::{ErrorContext, ViewError, user_friendly_error};
