//! Text diagnostic renderer

use crate::util::diagnostic::Diagnostic;
use crate::util::span::SourceFile;

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Print the offending source line
    pub show_source: bool,
    /// Print the help line
    pub show_help: bool,
    /// Indicator character under the span
    pub indicator: char,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            show_source: true,
            show_help: true,
            indicator: '^',
        }
    }
}

/// Plain-text renderer, rustc-like layout:
///
/// ```text
/// error[E0003]: type mismatch: expected i32, found string
///  --> main.wv:3:12
///   |
/// 3 |     return "x";
///   |            ^^^
///   = help: ...
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextEmitter {
    config: EmitterConfig,
}

impl TextEmitter {
    /// Create a renderer with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with a custom configuration
    pub fn with_config(config: EmitterConfig) -> Self {
        Self { config }
    }

    /// Render one diagnostic
    pub fn render(
        &self,
        diagnostic: &Diagnostic,
        source: Option<&SourceFile>,
    ) -> String {
        let mut out = format!(
            "{}[{}]: {}\n",
            diagnostic.severity,
            diagnostic.kind.code(),
            diagnostic.message
        );

        let span = diagnostic.span;
        if !span.is_dummy() {
            let name = source.map(|s| s.name.as_str()).unwrap_or("<source>");
            out.push_str(&format!(
                " --> {}:{}:{}\n",
                name, span.start.line, span.start.column
            ));

            if self.config.show_source {
                if let Some(line) = source.and_then(|s| s.line(span.start.line)) {
                    let gutter = span.start.line.to_string();
                    let pad = " ".repeat(gutter.len());
                    let width = if span.end.line == span.start.line {
                        span.end.column.saturating_sub(span.start.column).max(1)
                    } else {
                        line.chars().count().saturating_sub(span.start.column - 1).max(1)
                    };
                    out.push_str(&format!("{} |\n", pad));
                    out.push_str(&format!("{} | {}\n", gutter, line));
                    out.push_str(&format!(
                        "{} | {}{}\n",
                        pad,
                        " ".repeat(span.start.column.saturating_sub(1)),
                        self.config.indicator.to_string().repeat(width)
                    ));
                }
            }
        }

        if self.config.show_help {
            if let Some(help) = &diagnostic.help {
                out.push_str(&format!("  = help: {}\n", help));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::diagnostic::DiagnosticKind;
    use crate::util::span::{Position, Span};

    #[test]
    fn test_render_points_at_span() {
        let source = SourceFile::new("main.wv", "let x = 1;\nreturn \"x\";\n");
        let span = Span::new(Position::with_offset(2, 8, 18), Position::with_offset(2, 11, 21));
        let diagnostic = Diagnostic::error(DiagnosticKind::Type, "type mismatch", span)
            .with_help("expected i32");
        let text = TextEmitter::new().render(&diagnostic, Some(&source));

        assert!(text.starts_with("error[E0003]: type mismatch"));
        assert!(text.contains(" --> main.wv:2:8"));
        assert!(text.contains("2 | return \"x\";"));
        assert!(text.contains("  |        ^^^"));
        assert!(text.contains("= help: expected i32"));
    }

    #[test]
    fn test_render_without_span() {
        let diagnostic = Diagnostic::error(DiagnosticKind::Internal, "boom", Span::dummy());
        let text = TextEmitter::new().render(&diagnostic, None);
        assert_eq!(text, "error[E9999]: boom\n");
    }
}
