//! CLI command implementations for utrext.
//!
//! - [`annotate`] - Annotate 3' UTR extensions from peaks onto a gene annotation

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::struct_excessive_bools,
    clippy::uninlined_format_args
)]

pub mod annotate;
pub mod command;
pub mod common;
