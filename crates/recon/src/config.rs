use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::patterns::find_pattern;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub directory: Option<DirectoryInput>,
    #[serde(default)]
    pub identifiers: Option<IdentifierInput>,
    #[serde(default)]
    pub email: EmailMatchConfig,
}

fn default_name() -> String {
    "attendance".into()
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            directory: None,
            identifiers: None,
            email: EmailMatchConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Directory CSV: one row per person available for assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryInput {
    pub file: String,
    #[serde(default)]
    pub columns: DirectoryColumns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryColumns {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

impl Default for DirectoryColumns {
    fn default() -> Self {
        Self {
            id: "id".into(),
            firstname: "firstname".into(),
            lastname: "lastname".into(),
            email: "email".into(),
        }
    }
}

/// Attendance CSV: one row per unassigned record.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifierInput {
    pub file: String,
    #[serde(default)]
    pub columns: IdentifierColumns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentifierColumns {
    pub record_id: String,
    pub text: String,
    /// Optional column flagging records whose suggestion was already applied.
    pub applied: Option<String>,
}

impl Default for IdentifierColumns {
    fn default() -> Self {
        Self {
            record_id: "id".into(),
            text: "name".into(),
            applied: None,
        }
    }
}

// ---------------------------------------------------------------------------
// E-mail matching
// ---------------------------------------------------------------------------

/// Thresholds for the e-mail local-part matcher.
///
/// `similarity_threshold` applies to the weighted score. `min_score_gap`
/// separates the two best candidates of one tier; `pattern_tolerance`
/// separates candidates sharing an ambiguous pattern. A lone candidate on an
/// ambiguous pattern needs `min_single_confidence`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailMatchConfig {
    pub similarity_threshold: f64,
    pub min_score_gap: f64,
    pub pattern_tolerance: f64,
    pub min_single_confidence: f64,
    pub non_ambiguous_boost: f64,
    /// Per-pattern weight overrides, keyed by pattern name.
    pub weights: BTreeMap<String, f64>,
}

impl Default for EmailMatchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            min_score_gap: 0.15,
            pattern_tolerance: 0.1,
            min_single_confidence: 0.9,
            non_ambiguous_boost: 1.1,
            weights: BTreeMap::new(),
        }
    }
}

impl EmailMatchConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: MatchConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let email = &self.email;

        for (key, value) in [
            ("similarity_threshold", email.similarity_threshold),
            ("min_score_gap", email.min_score_gap),
            ("pattern_tolerance", email.pattern_tolerance),
            ("min_single_confidence", email.min_single_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReconError::ConfigValidation(format!(
                    "email.{key} must be within [0, 1], got {value}"
                )));
            }
        }

        if !(email.non_ambiguous_boost >= 1.0) {
            return Err(ReconError::ConfigValidation(format!(
                "email.non_ambiguous_boost must be >= 1, got {}",
                email.non_ambiguous_boost
            )));
        }

        for (pattern, weight) in &email.weights {
            if find_pattern(pattern).is_none() {
                return Err(ReconError::ConfigValidation(format!(
                    "email.weights: unknown pattern '{pattern}'"
                )));
            }
            if !(0.0..=1.0).contains(weight) {
                return Err(ReconError::ConfigValidation(format!(
                    "email.weights: weight for '{pattern}' must be within [0, 1], got {weight}"
                )));
            }
        }

        if let Some(ref dir) = self.directory {
            if dir.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation("directory.file is empty".into()));
            }
        }
        if let Some(ref ids) = self.identifiers {
            if ids.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation("identifiers.file is empty".into()));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
