use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::TemplateError;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Loading failed.
    Error,
    /// Suspicious but loadable.
    Warning,
}

/// A diagnostic message with source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// The document the span points into, when known.
    pub file: Option<PathBuf>,
    /// Byte range in the document.
    pub span: std::ops::Range<usize>,
    /// Headline message.
    pub message: String,
    /// Label attached to the span, if any.
    pub label: Option<String>,
}

impl Diagnostic {
    /// An error at `span`.
    pub fn error(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            file: None,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// A warning at `span`.
    pub fn warning(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            file: None,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// Attach a span label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Record the document this diagnostic belongs to.
    pub fn in_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    /// Whether this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Whether the span points at real source text.
    pub fn has_location(&self) -> bool {
        !self.span.is_empty()
    }
}

impl From<&TemplateError> for Diagnostic {
    fn from(err: &TemplateError) -> Self {
        let diag = Self::error(err.span().unwrap_or(0..0), err.to_string());
        match err {
            TemplateError::DuplicateTemplate { .. } => diag.with_label("defined again here"),
            TemplateError::MissingName { .. } => diag.with_label("add a name attribute"),
            TemplateError::MalformedCustomization { reason, .. } => diag.with_label(reason.as_str()),
            _ => diag,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.file {
            Some(file) => write!(f, "{prefix}: {}: {}", file.display(), self.message),
            None => write!(f, "{prefix}: {}", self.message),
        }
    }
}

/// Render diagnostics using ariadne for pretty terminal output. Diagnostics
/// without a location are rendered as a plain line.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        if !diag.has_location() {
            output.extend_from_slice(format!("{diag}\n").as_bytes());
            continue;
        }
        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let color = match diag.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let span = (filename, diag.span.clone());
        let mut report = Report::build(kind, span).with_message(&diag.message);

        let label_text = diag.label.as_deref().unwrap_or(&diag.message);
        report = report.with_label(
            Label::new((filename, diag.span.clone()))
                .with_message(label_text)
                .with_color(color),
        );

        report
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}
