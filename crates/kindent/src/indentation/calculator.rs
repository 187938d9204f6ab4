//! Indentation resolution.
//!
//! Rules describe an indent as an anchor column plus signed block and
//! continuation steps. This module turns that description into a concrete
//! column and whitespace string using the active [`Settings`].

use super::config::Settings;
use super::formatter::generate_whitespace;

/// The two kinds of indentation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentUnit {
    Block,
    Continuation,
}

/// A settings-independent indent description produced by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentAction {
    /// `anchor + block * indent_size + continuation * continuation_width`.
    Relative {
        anchor: u32,
        block: i32,
        continuation: i32,
    },
    /// An absolute column.
    Align { column: u32 },
    /// Call arguments: `column` when multiline parameter alignment is
    /// enabled, otherwise `continuation` steps from `anchor`.
    AlignArguments {
        column: u32,
        anchor: u32,
        continuation: i32,
    },
}

impl IndentAction {
    pub fn steps(anchor: u32, unit: IndentUnit, count: i32) -> Self {
        match unit {
            IndentUnit::Block => IndentAction::Relative {
                anchor,
                block: count,
                continuation: 0,
            },
            IndentUnit::Continuation => IndentAction::Relative {
                anchor,
                block: 0,
                continuation: count,
            },
        }
    }

    pub fn block(anchor: u32, count: i32) -> Self {
        Self::steps(anchor, IndentUnit::Block, count)
    }

    pub fn continuation(anchor: u32, count: i32) -> Self {
        Self::steps(anchor, IndentUnit::Continuation, count)
    }

    pub fn absolute(column: u32) -> Self {
        Self::block(column, 0)
    }
}

/// Whether a resolved line is a block line, a continuation line or an
/// aligned line. Decided by the matched rule, never by the magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentMode {
    Block,
    Continuation,
    Align,
}

/// The final indent for a new line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIndent {
    /// Leading whitespace to place at the start of the new line.
    pub text: String,
    /// Visual column the whitespace reaches.
    pub column: u32,
    pub mode: IndentMode,
}

/// Width of one step of `unit` under `settings`.
pub fn unit_width(unit: IndentUnit, settings: &Settings) -> u32 {
    match unit {
        IndentUnit::Block => settings.indent_size,
        IndentUnit::Continuation => settings.continuation_width(),
    }
}

/// Resolves an action into a column and whitespace string.
pub fn calculate_indentation(action: IndentAction, settings: &Settings) -> ResolvedIndent {
    let (column, mode) = match action {
        IndentAction::Relative {
            anchor,
            block,
            continuation,
        } => {
            let mode = if continuation != 0 {
                IndentMode::Continuation
            } else {
                IndentMode::Block
            };
            (offset_column(anchor, block, continuation, settings), mode)
        }
        IndentAction::Align { column } => (column, IndentMode::Align),
        IndentAction::AlignArguments {
            column,
            anchor,
            continuation,
        } => {
            if settings.align_multiline_parameters {
                (column, IndentMode::Align)
            } else {
                (
                    offset_column(anchor, 0, continuation, settings),
                    IndentMode::Continuation,
                )
            }
        }
    };

    ResolvedIndent {
        text: generate_whitespace(column, settings),
        column,
        mode,
    }
}

fn offset_column(anchor: u32, block: i32, continuation: i32, settings: &Settings) -> u32 {
    let delta = i64::from(block) * i64::from(unit_width(IndentUnit::Block, settings))
        + i64::from(continuation) * i64::from(unit_width(IndentUnit::Continuation, settings));
    let column = (i64::from(anchor) + delta).clamp(0, i64::from(u32::MAX));
    u32::try_from(column).unwrap_or(u32::MAX)
}

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(source: &str, offset: usize) -> usize {
    let offset = offset.min(source.len());
    source.as_bytes()[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1)
}

/// Visual column of `offset` on its line, expanding tabs to the next tab
/// stop.
pub fn visual_column(source: &str, offset: usize, tab_size: u32) -> u32 {
    let offset = offset.min(source.len());
    let start = line_start(source, offset);
    source
        .get(start..offset)
        .map_or(0, |prefix| advance_columns(0, prefix.chars(), tab_size))
}

/// Visual width of the leading whitespace of the line containing `offset`.
pub fn get_line_indent(source: &str, offset: usize, tab_size: u32) -> u32 {
    let start = line_start(source, offset);
    let whitespace = source[start..]
        .chars()
        .take_while(|&c| c == ' ' || c == '\t');
    advance_columns(0, whitespace, tab_size)
}

const BYTE_ORDER_MARK: char = '\u{FEFF}';

fn advance_columns(start: u32, chars: impl Iterator<Item = char>, tab_size: u32) -> u32 {
    let tab_size = tab_size.max(1);
    chars.fold(start, |column, c| match c {
        '\t' => (column / tab_size + 1) * tab_size,
        BYTE_ORDER_MARK => column,
        _ => column.saturating_add(1),
    })
}
