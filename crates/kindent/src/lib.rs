//! Syntax-aware newline indentation for Kotlin.
//!
//! When a line break is inserted, [`indentation::compute_indent`] decides
//! the whitespace the new line should start with and
//! [`indentation::apply_indent`] puts it in place. The `kindent` binary
//! serves the same engine over LSP `textDocument/onTypeFormatting`.

pub mod backend;
pub mod error;
pub mod handlers;
pub mod indentation;
pub mod state;
pub mod syntax;
pub mod utf16;

pub use error::IndentError;
pub use indentation::{
    apply_indent, compute_indent, compute_indent_in, indent_on_newline, IndentMode,
    ResolvedIndent, Settings, SourceKind,
};
