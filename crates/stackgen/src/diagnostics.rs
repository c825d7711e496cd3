//! Diagnostic sink
//!
//! Components that can fail partially or want to warn the user take a `&mut Diagnostics` instead
//! of printing. Every entry is mirrored as a [tracing] event so a subscriber still sees it in
//! order, and the collected entries remain available to the caller (and to tests).

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(derive_new::new, Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Declaration this entry is about, if any
    pub subject: Option<String>,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{}: [{subject}] {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

#[derive(derive_new::new, Debug, Default)]
pub struct Diagnostics {
    #[new(default)]
    entries: Vec<Diagnostic>,
    /// Declaration currently being processed, attached to new entries
    #[new(default)]
    subject: Option<String>,
}

impl Diagnostics {
    pub fn info(&mut self, message: impl Into<String>) {
        self.log(Severity::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.log(Severity::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.log(Severity::Error, message.into());
    }

    fn log(&mut self, severity: Severity, message: String) {
        let subject = self.subject.as_deref();
        match severity {
            Severity::Info => tracing::info!(subject, "{message}"),
            Severity::Warning => tracing::warn!(subject, "{message}"),
            Severity::Error => tracing::error!(subject, "{message}"),
        }

        self.entries
            .push(Diagnostic::new(severity, self.subject.clone(), message));
    }

    /// Attach `subject` to all entries logged until [Diagnostics::clear_subject]
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = Some(subject.into());
    }

    pub fn clear_subject(&mut self) {
        self.subject = None;
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Error)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(move |entry| entry.severity == severity)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
