//! Suggestion coordinator: routes each unassigned record to the name or the
//! e-mail matcher and merges the outcomes into one map.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, info};

use crate::config::MatchConfig;
use crate::email::EmailMatcher;
use crate::model::{
    ConfidenceLevel, DirectoryPerson, PersonId, RawIdentifier, RecordId, Suggestion,
    SuggestionStatistics, SuggestionType,
};
use crate::normalize::looks_like_email;
use crate::phased::PhasedMatcher;

// ---------------------------------------------------------------------------
// Assignment tracking
// ---------------------------------------------------------------------------

/// Answers whether a human already applied a suggestion to a record.
/// The engine only reads this state.
pub trait AssignmentTracker {
    fn was_suggestion_applied(&self, record_id: RecordId) -> bool;
}

impl AssignmentTracker for HashSet<RecordId> {
    fn was_suggestion_applied(&self, record_id: RecordId) -> bool {
        self.contains(&record_id)
    }
}

impl AssignmentTracker for BTreeSet<RecordId> {
    fn was_suggestion_applied(&self, record_id: RecordId) -> bool {
        self.contains(&record_id)
    }
}

/// Tracker for batches where nothing has been applied yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneApplied;

impl AssignmentTracker for NoneApplied {
    fn was_suggestion_applied(&self, _record_id: RecordId) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Output map
// ---------------------------------------------------------------------------

/// At most one suggestion per record. A name suggestion is never replaced
/// by an e-mail one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionMap {
    entries: BTreeMap<RecordId, Suggestion>,
}

impl SuggestionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the record already holds a suggestion that
    /// takes precedence.
    pub fn insert(&mut self, suggestion: Suggestion) -> bool {
        match self.entries.get(&suggestion.record_id) {
            Some(existing)
                if existing.kind == SuggestionType::Name
                    || suggestion.kind == SuggestionType::Email =>
            {
                false
            }
            _ => {
                self.entries.insert(suggestion.record_id, suggestion);
                true
            }
        }
    }

    pub fn get(&self, record_id: RecordId) -> Option<&Suggestion> {
        self.entries.get(&record_id)
    }

    pub fn contains(&self, record_id: RecordId) -> bool {
        self.entries.contains_key(&record_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Suggestions in record-id order.
    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.entries.values()
    }

    pub fn into_inner(self) -> BTreeMap<RecordId, Suggestion> {
        self.entries
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One batch of suggestions. The e-mail cache and the e-mail uniqueness
/// bookkeeping live as long as the session; build a new one per batch.
#[derive(Debug)]
pub struct SuggestionSession {
    phased: PhasedMatcher,
    email: EmailMatcher,
    emailed: HashSet<PersonId>,
}

impl SuggestionSession {
    /// `directory` must already exclude people assigned in this meeting.
    pub fn new(directory: &[DirectoryPerson], config: &MatchConfig) -> Self {
        Self {
            phased: PhasedMatcher::new(directory),
            email: EmailMatcher::new(directory, &config.email),
            emailed: HashSet::new(),
        }
    }

    pub fn suggest<T>(&mut self, identifiers: &[RawIdentifier], tracker: &T) -> SuggestionMap
    where
        T: AssignmentTracker + ?Sized,
    {
        let mut map = SuggestionMap::new();
        let mut skipped = 0usize;

        for record in identifiers {
            if tracker.was_suggestion_applied(record.record_id) {
                debug!("record {}: suggestion already applied, skipped", record.record_id);
                skipped += 1;
                continue;
            }

            let text = record.text.trim();
            let suggestion = if looks_like_email(text) {
                self.suggest_email(record.record_id, text)
            } else {
                self.phased
                    .find_best_match(text)
                    .map(|m| Suggestion::from_name(record.record_id, m.person_id, m.phase))
            };

            if let Some(suggestion) = suggestion {
                if !map.insert(suggestion) {
                    debug!("record {}: kept earlier suggestion", record.record_id);
                }
            }
        }

        info!(
            "suggested {} of {} records ({} already applied)",
            map.len(),
            identifiers.len(),
            skipped
        );
        map
    }

    fn suggest_email(&mut self, record_id: RecordId, text: &str) -> Option<Suggestion> {
        let candidate = self.email.find_match(text)?;
        // the matcher caches per address, so a repeated address would
        // otherwise hand its person to a second record
        if !self.emailed.insert(candidate.person_id) {
            debug!(
                "record {record_id}: person {} already suggested via e-mail",
                candidate.person_id
            );
            return None;
        }
        Some(Suggestion::from_email(record_id, &candidate))
    }
}

// ---------------------------------------------------------------------------
// Summary + ordering
// ---------------------------------------------------------------------------

pub fn statistics(suggestions: &SuggestionMap) -> SuggestionStatistics {
    let mut stats = SuggestionStatistics {
        total: suggestions.len(),
        ..SuggestionStatistics::default()
    };
    for s in suggestions.iter() {
        match s.kind {
            SuggestionType::Name => stats.name_based += 1,
            SuggestionType::Email => stats.email_based += 1,
        }
        match s.confidence {
            ConfidenceLevel::High => stats.high_confidence += 1,
            ConfidenceLevel::Medium => stats.medium_confidence += 1,
        }
    }
    stats
}

/// Name-matched records first, then e-mail-matched, then unmatched.
/// Relative order within each group is preserved.
pub fn sort_by_type<'a>(
    records: &'a [RawIdentifier],
    suggestions: &SuggestionMap,
) -> Vec<&'a RawIdentifier> {
    let mut ordered: Vec<&RawIdentifier> = records.iter().collect();
    ordered.sort_by_key(|r| match suggestions.get(r.record_id).map(|s| s.kind) {
        Some(SuggestionType::Name) => 0u8,
        Some(SuggestionType::Email) => 1,
        None => 2,
    });
    ordered
}
