//! Compiler configuration.
//!
//! Mirrors the original compiler's own `CompilerConfig`: a small struct of
//! knobs threaded through the pipeline rather than globals, plus a color
//! mode resolved against whether stdout is actually a terminal.

use std::io::IsTerminal;

/// When to colorize diagnostics written to stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Colorize only when the output stream is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolves this mode against whether `stream` is actually a terminal.
    pub fn resolve(self, is_terminal: bool) -> bool {
        match self {
            ColorMode::Auto => is_terminal,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }

    /// Convenience for resolving against the process's real stdout.
    pub fn resolve_stdout(self) -> bool {
        self.resolve(std::io::stdout().is_terminal())
    }
}

/// Configuration shared across the whole compilation pipeline.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub color: ColorMode,
    /// The largest integer literal the lexer accepts, inclusive. MPPL's
    /// 16-bit target means this is one past `i16::MAX` rather than
    /// `i16::MAX` itself: `32768` is still a valid bit pattern for a
    /// register, it just has no positive signed reading.
    pub max_number_literal: i32,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            color: ColorMode::Auto,
            max_number_literal: 32768,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_follows_is_terminal() {
        assert!(ColorMode::Auto.resolve(true));
        assert!(!ColorMode::Auto.resolve(false));
    }

    #[test]
    fn always_and_never_ignore_is_terminal() {
        assert!(ColorMode::Always.resolve(false));
        assert!(!ColorMode::Never.resolve(true));
    }

    #[test]
    fn default_config_matches_the_lexer_threshold() {
        let config = CompilerConfig::default();
        assert_eq!(config.max_number_literal, 32768);
        assert_eq!(config.color, ColorMode::Auto);
    }
}
