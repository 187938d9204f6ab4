//! Applying a resolved indent to text.
//!
//! Two forms of the same replacement: [`apply_indent`] rewrites a string
//! directly, [`format_indentation`] produces the LSP `TextEdit` a client
//! applies. Both replace exactly the run of spaces and tabs that begins the
//! new line, so applying the same indent twice is a no-op.

use tower_lsp::lsp_types::{Position, Range, TextEdit};

use super::calculator::ResolvedIndent;
use super::config::Settings;
use super::context::validate_split_offset;
use crate::error::IndentError;

/// Replaces the leading whitespace of the line after `newline_offset`.
pub fn apply_indent(
    text: &str,
    newline_offset: usize,
    indent: &ResolvedIndent,
) -> Result<String, IndentError> {
    validate_split_offset(text, newline_offset)?;

    let line_start = newline_offset + 1;
    let existing = leading_whitespace_len(&text[line_start..]);

    let mut result = String::with_capacity(text.len() + indent.text.len());
    result.push_str(&text[..line_start]);
    result.push_str(&indent.text);
    result.push_str(&text[line_start + existing..]);
    Ok(result)
}

/// Generates a TextEdit that replaces the indentation of `line` with the
/// resolved indent.
///
/// The range spans from column 0 to the end of the existing spaces and
/// tabs, so the response replaces whatever indentation the client already
/// inserted instead of adding to it.
pub fn format_indentation(line: u32, indent: &ResolvedIndent, source: &str) -> TextEdit {
    let existing_ws_len = source
        .lines()
        .nth(line as usize)
        .map(leading_whitespace_len)
        .unwrap_or(0);

    TextEdit {
        range: Range {
            start: Position { line, character: 0 },
            end: Position {
                line,
                character: existing_ws_len as u32,
            },
        },
        new_text: indent.text.clone(),
    }
}

/// Number of bytes of spaces and tabs at the start of `line`.
fn leading_whitespace_len(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ' || b == b'\t').count()
}

/// Generates the whitespace that reaches `target_column`.
///
/// With tabs enabled the column is filled with tabs first and padded with
/// spaces, which keeps aligned columns exact.
pub(crate) fn generate_whitespace(target_column: u32, settings: &Settings) -> String {
    if !settings.use_tabs {
        return " ".repeat(target_column as usize);
    }
    let tab_size = settings.tab_size.max(1);
    let tabs = target_column / tab_size;
    let spaces = target_column % tab_size;
    let mut result = "\t".repeat(tabs as usize);
    result.push_str(&" ".repeat(spaces as usize));
    result
}
