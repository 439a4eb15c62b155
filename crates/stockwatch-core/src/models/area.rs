use serde::{Deserialize, Serialize};
use std::fmt;

/// Named axis-aligned rectangle in map pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDefinition {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl AreaDefinition {
    pub fn new(name: impl Into<String>, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { name: name.into(), x, y, w, h }
    }
}

/// Outcome of classifying a pixel position against the configured areas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum AreaMatch {
    /// First area whose closed rectangle contains the point
    Named(String),

    /// Areas exist but none contains the point
    Unclassified,

    /// No usable area definitions are configured
    NoAreasConfigured,
}

impl AreaMatch {
    /// Label shown on the dashboard
    pub fn label(&self) -> &str {
        match self {
            AreaMatch::Named(name) => name,
            AreaMatch::Unclassified => "Aisle / unknown",
            AreaMatch::NoAreasConfigured => "Areas not configured",
        }
    }
}

impl fmt::Display for AreaMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
