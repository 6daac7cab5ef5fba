#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Low ⚠️",
            Severity::Medium => "Medium ⚠️⚠️",
            Severity::High => "High ⚠️⚠️⚠️",
            Severity::Critical => "Critical ⚠️⚠️⚠️⚠️",
        }
    }
}

/// Decorated display label for a severity; unknown values pass through untouched.
pub fn map_severity(severity: &str) -> String {
    match Severity::parse(severity) {
        Some(known) => known.label().to_string(),
        None => severity.to_string(),
    }
}
