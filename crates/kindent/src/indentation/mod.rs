//! Kotlin Smart Indentation Module
//!
//! This module computes the indentation of a freshly inserted line through
//! the LSP `textDocument/onTypeFormatting` handler. It detects the syntactic
//! context around the line break (call chains, argument lists, blocks,
//! unfinished expressions, declaration headers) and resolves it into a
//! whitespace prefix under the active settings.
//!
//! # Architecture
//!
//! - `context`: Extracts the facts around the line break from the token tree
//! - `rules`: Ordered rule table mapping those facts to a `ContextKind`
//! - `calculator`: Resolves block/continuation steps into a column
//! - `config`: Settings and the client configuration they come from
//! - `formatter`: Applies the indent to text or as an LSP TextEdit

use tower_lsp::lsp_types::DocumentOnTypeFormattingOptions;

use crate::error::IndentError;

mod calculator;
mod config;
mod context;
mod formatter;
pub mod rules;

pub use calculator::{
    calculate_indentation, get_line_indent, line_start, IndentAction, IndentMode, IndentUnit,
    ResolvedIndent,
};
pub use config::{IndentationConfig, Regime, Settings};
pub use context::{
    extract, ContextSnapshot, EnclosingNode, GroupFacts, LambdaArrowFacts, LeadingRole,
    SourceKind, SplitContext, StatementFacts, TrailingRole,
};
pub use formatter::{apply_indent, format_indentation};
pub use rules::{classify, classify_strict, ContextKind};

/// Returns the LSP capability options for on-type formatting.
///
/// Only `\n` is registered: the engine runs when the user presses Enter.
pub fn on_type_formatting_capability() -> DocumentOnTypeFormattingOptions {
    DocumentOnTypeFormattingOptions {
        first_trigger_character: "\n".to_string(),
        more_trigger_character: None,
    }
}

/// Computes the indent for the line that starts after `newline_offset` in a
/// regular source file.
///
/// Returns `Ok(None)` when the break falls inside a comment or literal.
pub fn compute_indent(
    text: &str,
    newline_offset: usize,
    settings: &Settings,
) -> Result<Option<ResolvedIndent>, IndentError> {
    compute_indent_in(SourceKind::File, text, newline_offset, settings)
}

/// Like [`compute_indent`], for either a source file or a script.
pub fn compute_indent_in(
    source_kind: SourceKind,
    text: &str,
    newline_offset: usize,
    settings: &Settings,
) -> Result<Option<ResolvedIndent>, IndentError> {
    let snapshot = match extract(text, newline_offset, source_kind, settings.tab_size)? {
        SplitContext::InsideLiteral => return Ok(None),
        SplitContext::Code(snapshot) => snapshot,
    };
    let kind = classify(&snapshot);
    let resolved = calculate_indentation(kind.action(), settings);
    log::debug!(
        "compute_indent: offset {} -> {:?} at column {}",
        newline_offset,
        kind,
        resolved.column
    );
    Ok(Some(resolved))
}

/// Computes and applies the indent for the line after `newline_offset`.
///
/// A break inside a comment or literal leaves the text unchanged.
pub fn indent_on_newline(
    source_kind: SourceKind,
    text: &str,
    newline_offset: usize,
    settings: &Settings,
) -> Result<String, IndentError> {
    match compute_indent_in(source_kind, text, newline_offset, settings)? {
        Some(resolved) => apply_indent(text, newline_offset, &resolved),
        None => Ok(text.to_string()),
    }
}
