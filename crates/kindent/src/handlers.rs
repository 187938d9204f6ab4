//
// handlers.rs
//

use tower_lsp::lsp_types::{FormattingOptions, Position, TextEdit, Url};

use crate::indentation::{compute_indent_in, format_indentation};
use crate::state::WorldState;

// ============================================================================
// On Type Formatting
// ============================================================================

/// Handles `textDocument/onTypeFormatting` for the `\n` trigger.
///
/// # Arguments
///
/// * `state` - World state holding the open document
/// * `uri` - The document the newline was typed in
/// * `position` - Cursor position after the newline, at the start of the new line
/// * `options` - The client's tab size and spaces preference
///
/// # Returns
///
/// A single edit replacing the new line's leading whitespace, or `None` when
/// the document is unknown, the line break sits inside a literal, or the
/// text cannot be tokenized.
pub fn on_type_formatting(
    state: &WorldState,
    uri: &Url,
    position: Position,
    options: &FormattingOptions,
) -> Option<Vec<TextEdit>> {
    let doc = state.get_document(uri)?;
    if position.line == 0 {
        return None;
    }
    let line = position.line as usize;
    if line >= doc.contents.len_lines() {
        return None;
    }

    let newline_offset = doc.contents.line_to_byte(line).checked_sub(1)?;
    let text = doc.text();
    let settings = state.config.resolve(options.tab_size, options.insert_spaces);

    match compute_indent_in(doc.source_kind, &text, newline_offset, &settings) {
        Ok(Some(resolved)) => Some(vec![format_indentation(position.line, &resolved, &text)]),
        Ok(None) => None,
        Err(err) => {
            log::warn!("onTypeFormatting failed for {}: {}", uri, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indentation::Regime;

    fn options() -> FormattingOptions {
        FormattingOptions {
            tab_size: 4,
            insert_spaces: true,
            ..Default::default()
        }
    }

    fn state_with(uri: &Url, text: &str) -> WorldState {
        let mut state = WorldState::new();
        state.open_document(uri.clone(), text, Some(1));
        state
    }

    fn kt_uri() -> Url {
        Url::parse("file:///src/Main.kt").unwrap()
    }

    #[test]
    fn test_block_indent_after_brace() {
        let uri = kt_uri();
        let state = state_with(&uri, "fun main() {\n}");
        let edits = on_type_formatting(&state, &uri, Position::new(1, 0), &options()).unwrap();
        assert_eq!(edits.len(), 1);
        // The closing brace moves down; the new line holds it at column 0.
        assert_eq!(edits[0].new_text, "");
    }

    #[test]
    fn test_replaces_client_indentation() {
        let uri = kt_uri();
        let state = state_with(&uri, "val x =\n  ");
        let edits = on_type_formatting(&state, &uri, Position::new(1, 2), &options()).unwrap();
        assert_eq!(edits[0].range.end, Position::new(1, 2));
        assert_eq!(edits[0].new_text, " ".repeat(8));
    }

    #[test]
    fn test_configuration_changes_magnitude() {
        let uri = kt_uri();
        let mut state = state_with(&uri, "val x =\n");
        state.config.continuation_regime = Regime::Inverted;
        let edits = on_type_formatting(&state, &uri, Position::new(1, 0), &options()).unwrap();
        assert_eq!(edits[0].new_text, " ".repeat(4));
    }

    #[test]
    fn test_tabs_from_formatting_options() {
        let uri = kt_uri();
        let state = state_with(&uri, "fun a() {\n    if (b) {\n\n    }\n}");
        let opts = FormattingOptions {
            tab_size: 4,
            insert_spaces: false,
            ..Default::default()
        };
        let edits = on_type_formatting(&state, &uri, Position::new(2, 0), &opts).unwrap();
        assert_eq!(edits[0].new_text, "\t\t");
    }

    #[test]
    fn test_script_top_level() {
        let uri = Url::parse("file:///build.gradle.kts").unwrap();
        let state = state_with(&uri, "    plugins()\n");
        let edits = on_type_formatting(&state, &uri, Position::new(1, 0), &options()).unwrap();
        assert_eq!(edits[0].new_text, "");
    }

    #[test]
    fn test_no_edit_inside_comment_or_for_unknown_document() {
        let uri = kt_uri();
        let state = state_with(&uri, "/* a\n */");
        assert!(on_type_formatting(&state, &uri, Position::new(1, 0), &options()).is_none());

        let other = Url::parse("file:///src/Other.kt").unwrap();
        assert!(on_type_formatting(&state, &other, Position::new(1, 0), &options()).is_none());
        assert!(on_type_formatting(&state, &uri, Position::new(0, 0), &options()).is_none());
    }

    #[test]
    fn test_malformed_text_yields_no_edit() {
        let uri = kt_uri();
        let state = state_with(&uri, "val x = #\n");
        assert!(on_type_formatting(&state, &uri, Position::new(1, 0), &options()).is_none());
    }
}
