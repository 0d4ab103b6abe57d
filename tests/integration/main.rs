//! Integration tests for utrext.
//!
//! These tests validate end-to-end workflows that span multiple modules,
//! ensuring that module interactions work correctly.

mod helpers;
mod test_annotate_command;
mod test_annotate_pipeline;
