use thiserror::Error;

/// Errors surfaced by the indentation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndentError {
    /// The text contains a character that cannot start any Kotlin token.
    #[error("text cannot be tokenized at byte {offset}")]
    MalformedContext { offset: usize },

    /// The requested offset does not point at a line break in the text.
    #[error("offset {offset} is not a line break in a text of {len} bytes")]
    InvalidOffset { offset: usize, len: usize },

    /// Two rules of the same precedence tier matched one context.
    #[error("rules `{first}` and `{second}` both match the same context")]
    AmbiguousRule {
        first: &'static str,
        second: &'static str,
    },
}
