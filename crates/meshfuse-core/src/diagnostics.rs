//! Diagnostics channel
//!
//! Severity-tagged notices raised while clustering and combining. Notices
//! are collected for the caller and forwarded to the `log` facade as they
//! are raised. Nothing here aborts a run.

use std::fmt;

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
}

/// What a notice is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// Subdivision hit the recursion cap with the cluster still over budget
    DepthExhausted,
    /// A cluster or LOD level had no mergeable geometry
    EmptyCombineSet,
    /// An object with a foreign material was kept out of a cluster
    MaterialMismatch,
    /// A mesh with broken indices or attribute counts was left unmerged
    InvalidMesh,
    /// General progress information
    Summary,
}

/// A single diagnostic notice
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub kind: NoticeKind,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

/// Collector for notices raised during one run
#[derive(Debug, Default)]
pub struct Diagnostics {
    notices: Vec<Notice>,
}

impl Diagnostics {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational notice
    pub fn info(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.push(Severity::Info, kind, message.into());
    }

    /// Record a warning
    pub fn warn(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.push(Severity::Warning, kind, message.into());
    }

    fn push(&mut self, severity: Severity, kind: NoticeKind, message: String) {
        match severity {
            Severity::Info => log::info!("{}", message),
            Severity::Warning => log::warn!("{}", message),
        }
        self.notices.push(Notice {
            severity,
            kind,
            message,
        });
    }

    /// All notices in the order they were raised
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Notices of one kind
    pub fn of_kind(&self, kind: NoticeKind) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(move |n| n.kind == kind)
    }

    /// Number of warnings raised
    pub fn warning_count(&self) -> usize {
        self.notices
            .iter()
            .filter(|n| n.severity == Severity::Warning)
            .count()
    }

    /// Check if no notices were raised
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Drop all notices
    pub fn clear(&mut self) {
        self.notices.clear();
    }
}
