//! Diagnostics collected while wiring a circuit graph.
//!
//! Wiring never silently drops input: a point that cannot be connected (its
//! track is inactive where it lies, or it sits behind the scan position) is
//! recorded here as a warning, and structural violations found by
//! [`crate::graph::validate_graph`] are recorded as errors.
//!
//! # Example
//!
//! ```
//! use tps_core::diagnostics::Diagnostics;
//! use tps_core::Millimeters;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity("scan", "point on inactive track", "node 7");
//! diag.add_error_at("geometry", "cell has negative length", Millimeters(400));
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! assert!(diag.has_errors());
//! ```

use serde::Serialize;

use crate::units::Millimeters;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The graph was built but something was left out or looks suspicious
    Warning,
    /// The graph violates a structural invariant
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// "scan", "wiring" or "geometry"
    pub category: String,
    pub message: String,
    /// Axis coordinate the issue refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<Millimeters>,
    /// Optional entity reference (e.g. "node 17", "branch 0 track 2")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            at: None,
            entity: None,
        }
    }

    /// Attach the coordinate the issue refers to
    pub fn with_coordinate(mut self, at: Millimeters) -> Self {
        self.at = Some(at);
        self
    }

    /// Attach an entity reference
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(at) = self.at {
            write!(f, " at {}", at)?;
        }

        Ok(())
    }
}

/// Issues collected while wiring and checking one circuit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.add(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.add(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    /// Error at an axis coordinate, e.g. a cell boundary out of place
    pub fn add_error_at(&mut self, category: &str, message: &str, at: Millimeters) {
        self.add(DiagnosticIssue::new(Severity::Error, category, message).with_coordinate(at));
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// One-line tally, e.g. "2 warnings, 1 error"
    pub fn summary(&self) -> String {
        let tally = |n: usize, what: &str| {
            format!("{n} {what}{}", if n == 1 { "" } else { "s" })
        };
        let parts: Vec<String> = [
            (self.warning_count(), "warning"),
            (self.error_count(), "error"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, what)| tally(n, what))
        .collect();
        if parts.is_empty() {
            "No issues".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.summary())?;
        self.issues
            .iter()
            .try_for_each(|issue| writeln!(f, "  {issue}"))
    }
}
