use colored::Color;

/// What a line of CLI output is telling the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Done,
    Failed,
    /// A write was refused because its organization or environment is gone.
    ScopeMissing,
    Caution,
    Hint,
    Trace,
    Busy,
}

impl Tone {
    pub fn glyph(self) -> &'static str {
        match self {
            Tone::Done => "✓",
            Tone::Failed => "✗",
            Tone::ScopeMissing => "∅",
            Tone::Caution => "⚠",
            Tone::Hint => "ℹ",
            Tone::Trace => "→",
            Tone::Busy => "⟳",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Tone::Done => Color::Green,
            Tone::Failed => Color::Red,
            Tone::ScopeMissing => Color::BrightMagenta,
            Tone::Caution => Color::Yellow,
            Tone::Hint => Color::Blue,
            Tone::Trace => Color::BrightBlack,
            Tone::Busy => Color::Cyan,
        }
    }

    /// Failures go to stderr and survive `--quiet`.
    pub fn is_failure(self) -> bool {
        matches!(self, Tone::Failed | Tone::ScopeMissing)
    }
}

/// Colours of the help screen and its examples appendix.
pub mod help {
    use colored::Color;

    pub const HEADING: Color = Color::Cyan;
    pub const USAGE: Color = Color::BrightBlue;
    pub const COMMAND: Color = Color::Magenta;
    pub const PLACEHOLDER: Color = Color::BrightBlack;
    pub const ENV_VAR: Color = Color::BrightCyan;
    pub const DESCRIPTION: Color = Color::White;
    pub const VALID: Color = Color::Green;
    pub const INVALID: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_scope_reads_as_a_failure_of_its_own() {
        assert!(Tone::ScopeMissing.is_failure());
        assert_ne!(Tone::ScopeMissing.color(), Tone::Failed.color());
        assert_ne!(Tone::ScopeMissing.glyph(), Tone::Failed.glyph());
        assert!(!Tone::Caution.is_failure());
    }
}
