use std::fmt;

/// Severity attached to every operator notification.
///
/// Discovery maps its fallback tiers onto these: remote success is
/// `Success`, cache fallback is `Warning`, hardcoded fallback is `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

impl Severity {
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Success => "✅",
            Severity::Warning => "⚠️",
            Severity::Critical => "❌",
        }
    }

    /// Render a message the way it is delivered to the operator.
    pub fn render(&self, message: &str) -> String {
        format!("{} {}", self.emoji(), message)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{}", label)
    }
}
