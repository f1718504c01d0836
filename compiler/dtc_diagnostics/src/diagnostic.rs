//! Defines types for dtc diagnostics.
//!
//! This module defines the [`Diagnostic`] struct, which encapsulates a
//! diagnostic message along with its severity and span, and the two ways of
//! rendering one: a compact source window ([`Diagnostic::print`]) and a full
//! `ariadne` report ([`Diagnostic::print_with_filename`]).

use std::{error::Error, path::Path};

use ansi_term::{Color as AnsiColor, Style};
use ariadne::{Color, Label, Report, ReportKind};
use derive_more::Display;
use dtc_utils::span::Spanned;

use crate::{fmt::display_source_window, DiagnosticKind};

/// The severity of a [`Diagnostic`].
#[derive(Clone, PartialEq, Eq, Debug, Display)]
pub enum Severity {
    /// Error. Checking will not continue.
    #[display("error")]
    Error,
}

impl Severity {
    /// Convert severity to ariadne's [`ReportKind`]
    const fn to_report_kind(&self) -> ReportKind<'static> {
        match *self {
            Self::Error => ReportKind::Error,
        }
    }

    /// Get the ariadne color for this severity
    const fn color(&self) -> Color {
        match *self {
            Self::Error => Color::Red,
        }
    }

    /// Get the terminal style used by the compact source window
    pub(crate) fn style(&self) -> Style {
        match *self {
            Self::Error => AnsiColor::Red.bold(),
        }
    }
}

/// A diagnostic message produced by dtc
#[derive(Debug, PartialEq, Eq, Display)]
#[display("{_0}: {_1}")]
pub struct Diagnostic(pub Severity, pub Spanned<DiagnosticKind>);

impl Diagnostic {
    /// Obtain the [`DiagnosticKind`] of this diagnostic
    #[must_use]
    pub const fn kind(&self) -> &DiagnosticKind {
        self.1.value()
    }

    /// Render this [`Diagnostic`] followed by a compact source window
    ///
    /// If no source is passed, or the diagnostic is not attached to a source
    /// unit, only the message line is produced.
    #[must_use]
    pub fn print(&self, source: Option<&str>) -> String {
        let header = format!(
            "{}: {}",
            self.0.style().paint(self.0.to_string()),
            AnsiColor::White.bold().paint(self.1.to_string())
        );

        match source {
            Some(source) if self.is_printable_in(source) => format!(
                "{header}\n{}",
                display_source_window(&self.0, self.1.span(), source)
            ),
            _ => header,
        }
    }

    /// Convert this [`Diagnostic`] to a printable string using ariadne with a
    /// custom filename
    ///
    /// Diagnostics that are not attached to a source unit fall back to their
    /// plain [`Display`](std::fmt::Display) form.
    #[must_use]
    pub fn print_with_filename(&self, source: &str, path: &Path) -> String {
        if !self.is_printable_in(source) {
            return self.to_string();
        }

        let span = self.1.span();
        let message = self.1.to_string();

        // ariadne spans are (filename, byte range) pairs
        let filename = path.to_string_lossy();
        let report = Report::build(self.0.to_report_kind(), (filename.as_ref(), span.range()))
            .with_config(ariadne::Config::default().with_index_type(ariadne::IndexType::Byte))
            .with_message(message.clone())
            .with_label(
                Label::new((filename.as_ref(), span.range()))
                    .with_message(message)
                    .with_color(self.0.color()),
            )
            .finish();

        let mut buffer = Vec::new();
        if report
            .write((filename.as_ref(), ariadne::Source::from(source)), &mut buffer)
            .is_err()
        {
            return self.to_string();
        }

        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Determine if this diagnostic's span can be shown against `source`
    fn is_printable_in(&self, source: &str) -> bool {
        let span = self.1.span();
        !span.source().is_detached() && span.end() <= source.len()
    }
}

impl Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use dtc_utils::spanned;

    use super::*;

    #[test]
    fn severity_display_works_correctly() {
        assert_eq!(Severity::Error.to_string(), "error");
    }

    #[test]
    fn severity_to_report_kind_returns_error() {
        assert_eq!(Severity::Error.to_report_kind(), ReportKind::Error);
    }

    #[test]
    fn severity_color_returns_red() {
        assert_eq!(Severity::Error.color(), Color::Red);
    }

    #[test]
    fn diagnostic_display_includes_severity_and_kind() {
        let diagnostic = Diagnostic(
            Severity::Error,
            spanned!(0, DiagnosticKind::UnterminatedStringLiteral, 4),
        );
        assert_eq!(diagnostic.to_string(), "error: unterminated string literal");
        assert_eq!(diagnostic.kind(), &DiagnosticKind::UnterminatedStringLiteral);
    }

    #[test]
    fn print_includes_source_window() {
        let source = "x = 'abc\n";
        let diagnostic = Diagnostic(
            Severity::Error,
            spanned!(4, DiagnosticKind::UnterminatedStringLiteral, 8),
        );
        let output = diagnostic.print(Some(source));

        assert!(output.contains("unterminated string literal"));
        assert!(output.contains("x = 'abc"));
        assert!(output.contains("^^^^"));
    }

    #[test]
    fn print_without_source_is_single_line() {
        let diagnostic = DiagnosticKind::FunctionNotFound("f".to_string()).detached_error();

        assert!(!diagnostic.print(Some("f()")).contains('\n'));
        assert!(!diagnostic.print(None).contains('\n'));
    }

    #[test]
    fn diagnostic_print_with_filename_formats_correctly() {
        let source = "fun1('a')\n";
        let diagnostic = Diagnostic(
            Severity::Error,
            spanned!(
                0,
                DiagnosticKind::VariableNotInferred("a".to_string()),
                4
            ),
        );
        let output = diagnostic.print_with_filename(source, Path::new("main.py"));

        assert!(output.contains("main.py"));
        assert!(output.contains("Error"));
        assert!(output.contains("could not be inferred"));
    }

    #[test]
    fn detached_print_with_filename_falls_back_to_display() {
        let diagnostic = DiagnosticKind::FunctionNotFound("f".to_string()).detached_error();

        assert_eq!(
            diagnostic.print_with_filename("", Path::new("main.py")),
            "error: function `f` not found in the program"
        );
    }
}
