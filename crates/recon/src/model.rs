use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub type PersonId = u64;
pub type RecordId = u64;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A candidate person from the directory. Read-only for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryPerson {
    pub id: PersonId,
    pub firstname: String,
    pub lastname: String,
    #[serde(default)]
    pub email: String,
}

impl DirectoryPerson {
    pub fn new(
        id: PersonId,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            firstname: firstname.into(),
            lastname: lastname.into(),
            email: email.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname.trim(), self.lastname.trim())
    }
}

/// One attendance record as reported by the meeting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIdentifier {
    pub record_id: RecordId,
    pub text: String,
}

impl RawIdentifier {
    pub fn new(record_id: RecordId, text: impl Into<String>) -> Self {
        Self {
            record_id,
            text: text.into(),
        }
    }
}

/// Pre-loaded batch: the unassigned records, the available directory, and
/// the records a human has already resolved.
#[derive(Debug, Clone, Default)]
pub struct SuggestionInput {
    pub directory: Vec<DirectoryPerson>,
    pub identifiers: Vec<RawIdentifier>,
    pub applied: BTreeSet<RecordId>,
}

// ---------------------------------------------------------------------------
// Name decomposition
// ---------------------------------------------------------------------------

/// Which hypothesis produced a [`NameCandidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// "Lastname, Firstname" split on the comma.
    CommaSplit,
    /// First token as firstname, last token as lastname.
    FirstLast,
    /// Last token as firstname, first token as lastname.
    Reversed,
    /// First two tokens as a compound firstname.
    CompoundFirstname,
    /// Directory fields as stored.
    Original,
    /// Directory fields swapped.
    Inverted,
    /// Trailing firstname word that repeats the lastname removed.
    TrailingDuplicateStripped,
    /// Only the first word of a multi-word firstname.
    FirstWordOnly,
    /// Identical multi-word fields split after the first word.
    IdenticalFieldsSplit,
    /// Repeated words removed from the lastname.
    DeduplicatedLastname,
    /// Only the first word of a multi-word lastname.
    LastnameFirstComponent,
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CommaSplit => "comma_split",
            Self::FirstLast => "first_last",
            Self::Reversed => "reversed",
            Self::CompoundFirstname => "compound_firstname",
            Self::Original => "original",
            Self::Inverted => "inverted",
            Self::TrailingDuplicateStripped => "trailing_duplicate_stripped",
            Self::FirstWordOnly => "first_word_only",
            Self::IdenticalFieldsSplit => "identical_fields_split",
            Self::DeduplicatedLastname => "deduplicated_lastname",
            Self::LastnameFirstComponent => "lastname_first_component",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCandidate {
    pub firstname: String,
    pub lastname: String,
    pub source: SourceTag,
}

impl NameCandidate {
    pub fn new(firstname: impl Into<String>, lastname: impl Into<String>, source: SourceTag) -> Self {
        Self {
            firstname: firstname.into(),
            lastname: lastname.into(),
            source,
        }
    }

    /// Case-insensitive `firstname|lastname` identity used for dedup.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}",
            self.firstname.trim().to_lowercase(),
            self.lastname.trim().to_lowercase()
        )
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Phases of the name matcher. Phases 3 and 6 are reserved and never run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    LastnameFirstname,
    FirstnameLastname,
    LastnameInitial,
    FirstnameInitial,
}

impl MatchPhase {
    pub fn number(&self) -> u8 {
        match self {
            Self::LastnameFirstname => 1,
            Self::FirstnameLastname => 2,
            Self::LastnameInitial => 4,
            Self::FirstnameInitial => 5,
        }
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastnameFirstname => write!(f, "lastname_firstname"),
            Self::FirstnameLastname => write!(f, "firstname_lastname"),
            Self::LastnameInitial => write!(f, "lastname_initial"),
            Self::FirstnameInitial => write!(f, "firstname_initial"),
        }
    }
}

/// Scored e-mail candidate for one (person, tier) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub person_id: PersonId,
    /// Weighted score (similarity x pattern weight).
    pub score: f64,
    pub tier: u8,
    pub pattern_name: &'static str,
    /// The winning pattern needs an ambiguity check (initials, single name).
    pub is_ambiguous: bool,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    Name,
    Email,
}

impl SuggestionType {
    pub fn priority(&self) -> u8 {
        match self {
            Self::Name => 1,
            Self::Email => 2,
        }
    }

    pub fn confidence(&self) -> ConfidenceLevel {
        match self {
            Self::Name => ConfidenceLevel::High,
            Self::Email => ConfidenceLevel::Medium,
        }
    }
}

impl std::fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

/// How the suggested person was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum MatchDetail {
    Name {
        phase: MatchPhase,
    },
    Email {
        pattern: &'static str,
        tier: u8,
        score: f64,
        confidence: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub record_id: RecordId,
    pub person_id: PersonId,
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub priority: u8,
    pub confidence: ConfidenceLevel,
    pub detail: MatchDetail,
}

impl Suggestion {
    pub fn from_name(record_id: RecordId, person_id: PersonId, phase: MatchPhase) -> Self {
        let kind = SuggestionType::Name;
        Self {
            record_id,
            person_id,
            kind,
            priority: kind.priority(),
            confidence: kind.confidence(),
            detail: MatchDetail::Name { phase },
        }
    }

    pub fn from_email(record_id: RecordId, candidate: &MatchCandidate) -> Self {
        let kind = SuggestionType::Email;
        Self {
            record_id,
            person_id: candidate.person_id,
            kind,
            priority: kind.priority(),
            confidence: kind.confidence(),
            detail: MatchDetail::Email {
                pattern: candidate.pattern_name,
                tier: candidate.tier,
                score: candidate.score,
                confidence: candidate.confidence,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestionStatistics {
    pub total: usize,
    pub name_based: usize,
    pub email_based: usize,
    pub high_confidence: usize,
    pub medium_confidence: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionReport {
    pub meta: ReportMeta,
    pub statistics: SuggestionStatistics,
    /// Name-based suggestions first, then e-mail-based, in input order.
    pub suggestions: Vec<Suggestion>,
    pub unmatched: Vec<RecordId>,
    pub skipped_applied: Vec<RecordId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub directory_size: usize,
    pub identifiers: usize,
}
