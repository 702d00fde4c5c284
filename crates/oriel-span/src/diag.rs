use derive_more::Display;
use owo_colors::{OwoColorize, Style};
use std::{
    fmt,
    io::{self, Write},
};

use crate::{Loc, Located, SourceManager};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl From<Severity> for ariadne::ReportKind<'_> {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Warning => ariadne::ReportKind::Warning,
            Severity::Error => ariadne::ReportKind::Error,
        }
    }
}

/// Errors that can be shown to the user as they are. The default turns the
/// `Display` output into an error at `loc`.
pub trait IntoDiagnostic: fmt::Display + Sized {
    fn into_diagnostic(self, loc: Loc) -> Diagnostic {
        Diagnostic::error(loc, self.to_string())
    }
}

/// One message about one place in a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub message: String,
    /// Kind of problem, e.g. `unresolved-reference`.
    pub code: Option<&'static str>,
    pub help: Option<String>,
    pub severity: Severity,
    pub loc: Loc,
    /// Related places, such as an earlier definition.
    pub trace: Vec<Located<String>>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, loc: Loc, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            help: None,
            severity,
            loc,
            trace: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(loc: Loc, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, loc, message)
    }

    pub fn warn(loc: Loc, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, loc, message)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_trace(mut self, trace: impl IntoIterator<Item = Located<String>>) -> Self {
        self.trace = trace.into_iter().collect();
        self
    }

    pub fn with_notes(mut self, notes: impl IntoIterator<Item = String>) -> Self {
        self.notes = notes.into_iter().collect();
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Builds the ariadne report for this diagnostic, colored if `color`.
    pub fn to_report(&self, color: bool) -> ariadne::Report<'static, Loc> {
        let mut builder = ariadne::Report::build(self.severity.into(), self.loc)
            .with_config(ariadne::Config::default().with_color(color))
            .with_message(&self.message)
            .with_label(ariadne::Label::new(self.loc))
            .with_labels(
                self.trace
                    .iter()
                    .map(|(label, loc)| ariadne::Label::new(*loc).with_message(label)),
            );

        if let Some(code) = self.code {
            builder = builder.with_code(code);
        }
        if let Some(help) = &self.help {
            builder = builder.with_help(help);
        }
        for note in &self.notes {
            builder = builder.with_note(note);
        }

        builder.finish()
    }

    /// Writes the diagnostic without colors, for logs and files.
    pub fn write(&self, sources: &SourceManager, w: impl Write) -> io::Result<()> {
        self.to_report(false).write(sources, w)
    }

    pub fn eprint(&self, sources: &SourceManager) -> io::Result<()> {
        self.to_report(true).eprint(sources)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.loc)
    }
}

/// Diagnostics collected for one source, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn with_code(&self, code: &str) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.code == Some(code))
    }

    pub fn warnings(&self) -> usize {
        self.diagnostics.len() - self.errors().count()
    }

    pub fn write(&self, sources: &SourceManager, mut w: impl Write) -> io::Result<()> {
        for diagnostic in &self.diagnostics {
            diagnostic.write(sources, &mut w)?;
        }
        Ok(())
    }

    /// Prints every diagnostic followed by a colored tally.
    pub fn eprint(&self, sources: &SourceManager) -> io::Result<()> {
        for diagnostic in &self.diagnostics {
            diagnostic.eprint(sources)?;
        }
        if self.is_empty() {
            return Ok(());
        }

        let style = if self.has_errors() {
            Style::new().red().bold()
        } else {
            Style::new().yellow().bold()
        };
        let tally = format!(
            "{} errors, {} warnings",
            self.errors().count(),
            self.warnings()
        );
        writeln!(io::stderr().lock(), "{}", tally.style(style))
    }
}
