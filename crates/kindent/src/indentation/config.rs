//! Indentation settings and the user-facing configuration they resolve from.
//!
//! Rules never read these values; only the resolver in `calculator` turns
//! block and continuation steps into concrete widths.

use serde::Deserialize;

/// How continuation indent relates to block indent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Regime {
    /// Continuation lines use the continuation indent size, which is
    /// normally deeper than a block step.
    #[default]
    Direct,
    /// Continuation lines use the block indent size instead.
    Inverted,
}

/// Immutable settings consulted when resolving an indent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub indent_size: u32,
    pub continuation_indent_size: u32,
    pub regime: Regime,
    /// Align call arguments on continuation lines with the first argument.
    pub align_multiline_parameters: bool,
    pub use_tabs: bool,
    pub tab_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::direct()
    }
}

impl Settings {
    /// Block indent 4, continuation indent 8.
    pub fn direct() -> Self {
        Self {
            indent_size: 4,
            continuation_indent_size: 8,
            regime: Regime::Direct,
            align_multiline_parameters: false,
            use_tabs: false,
            tab_size: 4,
        }
    }

    /// Block indent 4, continuation lines also indented by 4.
    pub fn inverted() -> Self {
        Self {
            regime: Regime::Inverted,
            ..Self::direct()
        }
    }

    pub fn with_alignment(mut self, align: bool) -> Self {
        self.align_multiline_parameters = align;
        self
    }

    pub fn with_tabs(mut self, tab_size: u32) -> Self {
        self.use_tabs = true;
        self.tab_size = tab_size;
        self
    }

    /// Width of one continuation step under the active regime.
    pub fn continuation_width(&self) -> u32 {
        match self.regime {
            Regime::Direct => self.continuation_indent_size,
            Regime::Inverted => self.indent_size,
        }
    }
}

/// Configuration read from the `kindent` section of the client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndentationConfig {
    pub indent_size: u32,
    pub continuation_indent_size: u32,
    pub continuation_regime: Regime,
    pub align_multiline_parameters: bool,
}

impl Default for IndentationConfig {
    fn default() -> Self {
        let settings = Settings::direct();
        Self {
            indent_size: settings.indent_size,
            continuation_indent_size: settings.continuation_indent_size,
            continuation_regime: settings.regime,
            align_multiline_parameters: settings.align_multiline_parameters,
        }
    }
}

impl IndentationConfig {
    /// Reads the `kindent` section from initialization options or a
    /// `workspace/didChangeConfiguration` payload.
    ///
    /// Returns `None` when the section is absent. A malformed section is
    /// logged and replaced by defaults.
    pub fn from_settings(settings: &serde_json::Value) -> Option<Self> {
        let section = settings.get("kindent")?;
        match serde_json::from_value(section.clone()) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("Ignoring malformed kindent settings: {}", err);
                Some(Self::default())
            }
        }
    }

    /// Combines this configuration with the editor's formatting options.
    ///
    /// The tab size is clamped to 1..=8.
    pub fn resolve(&self, tab_size: u32, insert_spaces: bool) -> Settings {
        Settings {
            indent_size: self.indent_size,
            continuation_indent_size: self.continuation_indent_size,
            regime: self.continuation_regime,
            align_multiline_parameters: self.align_multiline_parameters,
            use_tabs: !insert_spaces,
            tab_size: tab_size.clamp(1, 8),
        }
    }
}
