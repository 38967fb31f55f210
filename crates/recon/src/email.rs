//! E-mail local-part matcher.
//!
//! Every directory person is expanded into the strings the pattern table
//! implies; the local part of an identifier is scored against all of them
//! and the best (person, tier) pairs go through threshold, disambiguation
//! and run-scoped uniqueness checks. Ambiguity yields `None`, never a guess.
//!
//! Only the top candidate has to clear the similarity threshold; close
//! rivals count whatever their score. Raising the threshold therefore never
//! turns a rejection into a match, except when it removes a lower-tier
//! candidate that would have ranked first.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;

use crate::config::EmailMatchConfig;
use crate::decompose::decompose_person;
use crate::model::{DirectoryPerson, MatchCandidate, PersonId, SourceTag};
use crate::normalize::alnum_only;
use crate::patterns::{self, best_similarity, local_part_variants, EmailPattern, NameParts};

const TIERS: usize = 3;

#[derive(Debug)]
struct GeneratedPattern {
    /// Index into the matcher's pattern table.
    pattern: usize,
    text: String,
}

#[derive(Debug)]
struct PersonPatterns {
    id: PersonId,
    generated: Vec<GeneratedPattern>,
}

/// One matcher per batch: the result cache and the person -> identifier
/// assignments live exactly as long as the instance.
#[derive(Debug)]
pub struct EmailMatcher {
    config: EmailMatchConfig,
    table: Vec<EmailPattern>,
    people: Vec<PersonPatterns>,
    cache: HashMap<String, Option<MatchCandidate>>,
    assigned: HashMap<PersonId, String>,
}

impl EmailMatcher {
    /// Precompute pattern strings for every reading of every person.
    ///
    /// The `inverted` reading is skipped: the tier-1 and tier-2 halves of the
    /// table already cover both name orders.
    pub fn new(directory: &[DirectoryPerson], config: &EmailMatchConfig) -> Self {
        let table = patterns::weighted_table(&config.weights);

        let people = directory
            .iter()
            .map(|person| {
                let mut generated: Vec<GeneratedPattern> = Vec::new();
                for reading in decompose_person(person)
                    .into_iter()
                    .filter(|c| c.source != SourceTag::Inverted)
                {
                    let firstname = alnum_only(&reading.firstname);
                    let lastname = alnum_only(&reading.lastname);
                    if firstname.is_empty() || lastname.is_empty() {
                        continue;
                    }
                    let parts = NameParts {
                        firstname: &firstname,
                        lastname: &lastname,
                    };
                    for (idx, pattern) in table.iter().enumerate() {
                        let text = (pattern.generate)(&parts);
                        if !generated.iter().any(|g| g.pattern == idx && g.text == text) {
                            generated.push(GeneratedPattern { pattern: idx, text });
                        }
                    }
                }
                PersonPatterns {
                    id: person.id,
                    generated,
                }
            })
            .collect();

        Self {
            config: config.clone(),
            table,
            people,
            cache: HashMap::new(),
            assigned: HashMap::new(),
        }
    }

    /// Resolve an e-mail identifier to at most one person.
    ///
    /// Results (including `None`) are cached per identifier for the life of
    /// the matcher, so repeated lookups are consistent.
    pub fn find_match(&mut self, identifier: &str) -> Option<MatchCandidate> {
        let key = identifier.trim().to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            debug!("email cache hit: {key}");
            return cached.clone();
        }

        let result = self.resolve(&key);
        if let Some(ref candidate) = result {
            self.assigned
                .entry(candidate.person_id)
                .or_insert_with(|| key.clone());
        }
        self.cache.insert(key, result.clone());
        result
    }

    fn resolve(&self, key: &str) -> Option<MatchCandidate> {
        let mut parts = key.split('@');
        let (Some(local), Some(_domain), None) = (parts.next(), parts.next(), parts.next()) else {
            debug!("email rejected, not exactly one '@': {key}");
            return None;
        };
        if local.is_empty() {
            return None;
        }

        let pool = self.score_candidates(local);
        let top = disambiguate(&pool, &self.config)?;

        if let Some(owner) = self.assigned.get(&top.person_id) {
            if owner != key {
                debug!(
                    "email {key}: person {} already assigned to {owner}",
                    top.person_id
                );
                return None;
            }
        }

        debug!(
            "email {key} -> person {} via {} (tier {}, score {:.3})",
            top.person_id, top.pattern_name, top.tier, top.score
        );
        Some(top)
    }

    /// Best candidate per (person, tier) for a lowercased local part, before
    /// any threshold. Pure: does not touch the cache.
    pub fn score_candidates(&self, local: &str) -> Vec<MatchCandidate> {
        let variants = local_part_variants(local);
        let mut out = Vec::new();

        for person in &self.people {
            let mut best: [Option<MatchCandidate>; TIERS] = [None, None, None];

            for generated in &person.generated {
                let pattern = &self.table[generated.pattern];
                let similarity = best_similarity(&generated.text, &variants);
                let score = similarity * pattern.weight;
                let slot = &mut best[usize::from(pattern.tier - 1)];
                if slot.as_ref().map_or(true, |b| score > b.score) {
                    *slot = Some(MatchCandidate {
                        person_id: person.id,
                        score,
                        tier: pattern.tier,
                        pattern_name: pattern.name,
                        is_ambiguous: pattern.ambiguous,
                        confidence: patterns::confidence(
                            similarity,
                            pattern,
                            self.config.non_ambiguous_boost,
                        ),
                    });
                }
            }

            out.extend(best.into_iter().flatten());
        }

        out
    }

    pub fn is_assigned(&self, person_id: PersonId) -> bool {
        self.assigned.contains_key(&person_id)
    }

    pub fn cached_lookups(&self) -> usize {
        self.cache.len()
    }
}

/// Pick the top candidate, or `None` when the evidence is too close to call.
///
/// `pool` is the unthresholded output of [`EmailMatcher::score_candidates`].
/// The threshold only decides which candidates may rank first (tier
/// ascending, then score descending); rivals for the gap and pattern
/// tolerance checks are taken from the whole pool.
pub fn disambiguate(pool: &[MatchCandidate], config: &EmailMatchConfig) -> Option<MatchCandidate> {
    let mut ranked: Vec<&MatchCandidate> = pool
        .iter()
        .filter(|c| c.score >= config.similarity_threshold)
        .collect();
    ranked.sort_by(|a, b| {
        a.tier
            .cmp(&b.tier)
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
    });
    let top = *ranked.first()?;
    let rivals = || {
        pool.iter()
            .filter(move |c| !(c.person_id == top.person_id && c.tier == top.tier))
    };

    if let Some(second) = rivals()
        .filter(|c| c.tier == top.tier)
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
    {
        if top.score - second.score < config.min_score_gap {
            debug!(
                "persons {} and {} too close in tier {} ({:.3} vs {:.3})",
                top.person_id, second.person_id, top.tier, top.score, second.score
            );
            return None;
        }
    }

    if top.is_ambiguous
        && rivals().any(|c| {
            c.pattern_name == top.pattern_name
                && (top.score - c.score).abs() < config.pattern_tolerance
        })
    {
        debug!(
            "pattern {} shared by several persons near {:.3}",
            top.pattern_name, top.score
        );
        return None;
    }

    if ranked.len() == 1 && top.is_ambiguous && top.confidence < config.min_single_confidence {
        debug!(
            "lone candidate {} on {} below confidence ({:.3})",
            top.person_id, top.pattern_name, top.confidence
        );
        return None;
    }

    Some(top.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: PersonId, first: &str, last: &str) -> DirectoryPerson {
        DirectoryPerson::new(id, first, last, "")
    }

    fn matcher(dir: &[DirectoryPerson]) -> EmailMatcher {
        EmailMatcher::new(dir, &EmailMatchConfig::default())
    }

    fn candidate(person_id: PersonId, tier: u8, score: f64, pattern_name: &'static str, is_ambiguous: bool) -> MatchCandidate {
        MatchCandidate {
            person_id,
            score,
            tier,
            pattern_name,
            is_ambiguous,
            confidence: score,
        }
    }

    #[test]
    fn firstname_dot_lastname_exact() {
        let dir = vec![p(1, "Mario", "Rossi")];
        let m = matcher(&dir).find_match("mario.rossi@x.com").unwrap();
        assert_eq!(m.person_id, 1);
        assert_eq!(m.pattern_name, "nome.cognome");
        assert_eq!(m.tier, 2);
        assert_eq!(m.score, 1.0);
        assert!(!m.is_ambiguous);
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn lastname_first_is_tier_one() {
        let dir = vec![p(1, "Mario", "Rossi")];
        let m = matcher(&dir).find_match("Rossi_Mario@X.com").unwrap();
        assert_eq!(m.tier, 1);
        assert_eq!(m.pattern_name, "cognome.nome");
    }

    #[test]
    fn initial_lastname_accepted_when_alone() {
        let dir = vec![p(1, "Mario", "Rossi"), p(2, "Giulia", "Bianchi")];
        let m = matcher(&dir).find_match("m.rossi@x.com").unwrap();
        assert_eq!(m.person_id, 1);
        assert_eq!(m.pattern_name, "n.cognome");
        assert_eq!(m.tier, 3);
        assert!(m.is_ambiguous);
    }

    #[test]
    fn shared_initial_and_lastname_rejected() {
        let dir = vec![p(1, "Mario", "Rossi"), p(2, "Marco", "Rossi")];
        let mut m = matcher(&dir);
        assert_eq!(m.find_match("m.rossi@x.com"), None);
        // mario/marco differ by one letter: 1.0 vs 0.9 in tier 2 is too close
        assert_eq!(m.find_match("marco.rossi@x.com"), None);
    }

    #[test]
    fn distinct_full_names_resolve_despite_shared_lastname() {
        let dir = vec![p(1, "Mario", "Rossi"), p(2, "Giulia", "Rossi")];
        let m = matcher(&dir).find_match("giulia.rossi@x.com").unwrap();
        assert_eq!(m.person_id, 2);
    }

    #[test]
    fn accents_in_directory_are_folded() {
        let dir = vec![p(1, "Nicolò", "Dell'Acqua")];
        let m = matcher(&dir).find_match("nicolo.dellacqua@x.it").unwrap();
        assert_eq!(m.person_id, 1);
        assert_eq!(m.score, 1.0);
    }

    #[test]
    fn malformed_shapes_are_no_match() {
        let dir = vec![p(1, "Mario", "Rossi")];
        let mut m = matcher(&dir);
        assert_eq!(m.find_match("mario.rossi"), None);
        assert_eq!(m.find_match("mario@rossi@x.com"), None);
        assert_eq!(m.find_match("@x.com"), None);
    }

    #[test]
    fn unrelated_local_part_no_match() {
        let dir = vec![p(1, "Mario", "Rossi")];
        assert_eq!(matcher(&dir).find_match("info@x.com"), None);
    }

    #[test]
    fn typo_within_threshold_still_matches() {
        let dir = vec![p(1, "Mario", "Rossi")];
        // one substitution over ten characters: 0.9 similarity
        let m = matcher(&dir).find_match("mario.rossa@x.com").unwrap();
        assert_eq!(m.person_id, 1);
        assert!((m.score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn person_claimed_by_one_identifier_is_not_reused() {
        let dir = vec![p(1, "Mario", "Rossi")];
        let mut m = matcher(&dir);
        assert_eq!(m.find_match("mario.rossi@x.com").unwrap().person_id, 1);
        assert!(m.is_assigned(1));
        assert_eq!(m.find_match("mario.rossi@other.org"), None);
    }

    #[test]
    fn repeated_identifier_is_cached_and_consistent() {
        let dir = vec![p(1, "Mario", "Rossi")];
        let mut m = matcher(&dir);
        let first = m.find_match("mario.rossi@x.com");
        let second = m.find_match("  MARIO.ROSSI@x.com ");
        assert_eq!(first, second);
        assert_eq!(m.cached_lookups(), 1);

        assert_eq!(m.find_match("nobody@x.com"), None);
        assert_eq!(m.find_match("nobody@x.com"), None);
        assert_eq!(m.cached_lookups(), 2);
    }

    #[test]
    fn score_candidates_keeps_one_entry_per_tier() {
        let dir = vec![p(1, "Mario", "Rossi")];
        let m = matcher(&dir);
        let scored = m.score_candidates("mariorossi");
        assert_eq!(scored.len(), 3);
        assert_eq!(scored.iter().map(|c| c.tier).collect::<Vec<_>>(), vec![1, 2, 3]);
        let tier2 = &scored[1];
        assert_eq!(tier2.pattern_name, "nome.cognome");
        assert_eq!(tier2.score, 1.0);
    }

    #[test]
    fn raising_threshold_drops_weak_matches() {
        let dir = vec![p(1, "Mario", "Rossi")];
        let strict = EmailMatchConfig::default().with_threshold(0.95);
        let mut m = EmailMatcher::new(&dir, &strict);
        assert_eq!(m.find_match("mario.rossa@x.com"), None);
        assert!(m.find_match("mario.rossi@x.com").is_some());
    }

    #[test]
    fn stricter_threshold_keeps_close_rival() {
        let dir = vec![p(1, "Mario", "Rossi"), p(2, "Marco", "Rossi")];
        for threshold in [0.85, 0.9, 0.95, 1.0] {
            let config = EmailMatchConfig::default().with_threshold(threshold);
            let mut m = EmailMatcher::new(&dir, &config);
            // marcorossi scores 0.9 against mariorossi, whatever the threshold
            assert_eq!(m.find_match("mario.rossi@x.com"), None, "threshold {threshold}");
        }
    }

    #[test]
    fn disambiguate_empty_and_single() {
        let cfg = EmailMatchConfig::default();
        assert_eq!(disambiguate(&[], &cfg), None);

        let full = candidate(1, 2, 0.9, "nome.cognome", false);
        assert_eq!(disambiguate(&[full.clone()], &cfg), Some(full));

        let weak = candidate(1, 3, 0.86, "n.cognome", true);
        assert_eq!(disambiguate(&[weak], &cfg), None);
    }

    #[test]
    fn disambiguate_close_scores_same_tier() {
        let cfg = EmailMatchConfig::default();
        let a = candidate(1, 2, 1.0, "nome.cognome", false);
        let b = candidate(2, 2, 0.9, "nome.cognome", false);
        assert_eq!(disambiguate(&[a.clone(), b], &cfg), None);

        let c = candidate(2, 2, 0.8, "nome.cognome", false);
        assert_eq!(disambiguate(&[a.clone(), c], &cfg), Some(a));
    }

    #[test]
    fn disambiguate_different_tiers_prefers_lower_tier() {
        let cfg = EmailMatchConfig::default();
        let a = candidate(1, 1, 0.9, "cognome.nome", false);
        let b = candidate(2, 2, 1.0, "nome.cognome", false);
        assert_eq!(disambiguate(&[a.clone(), b], &cfg).unwrap().person_id, 1);
    }

    #[test]
    fn disambiguate_shared_ambiguous_pattern() {
        let cfg = EmailMatchConfig::default();
        let a = candidate(1, 1, 0.9, "cognome.n", true);
        let b = candidate(2, 2, 0.95, "nome.cognome", false);
        let c = candidate(3, 3, 0.85, "n.cognome", true);
        // different pattern names: accepted
        assert_eq!(disambiguate(&[a.clone(), b.clone(), c], &cfg).unwrap().person_id, 1);

        let top = candidate(1, 3, 0.9, "n.cognome", true);
        let rival = candidate(4, 3, 0.6, "n.cognome", true);
        // same pattern but far apart: accepted
        assert_eq!(disambiguate(&[top.clone(), rival], &cfg).unwrap().person_id, 1);
    }

    #[test]
    fn disambiguate_pattern_tolerance_beyond_gap() {
        let cfg = EmailMatchConfig {
            min_score_gap: 0.05,
            ..EmailMatchConfig::default()
        };
        let top = candidate(1, 3, 0.9, "n.cognome", true);
        let rival = candidate(2, 3, 0.82, "n.cognome", true);
        assert_eq!(disambiguate(&[top.clone(), rival], &cfg), None);

        // the same spread on a full-name pattern is accepted
        let top = candidate(1, 2, 0.9, "nome.cognome", false);
        let rival = candidate(2, 2, 0.82, "nome.cognome", false);
        assert_eq!(disambiguate(&[top, rival], &cfg).unwrap().person_id, 1);
    }

    #[test]
    fn disambiguate_counts_rivals_below_threshold() {
        let cfg = EmailMatchConfig::default().with_threshold(0.95);
        let top = candidate(1, 2, 1.0, "nome.cognome", false);
        let rival = candidate(2, 2, 0.9, "nome.cognome", false);
        assert_eq!(disambiguate(&[top.clone(), rival], &cfg), None);

        // another tier is not a rival for the gap
        let other_tier = candidate(2, 1, 0.9, "cognome.nome", false);
        assert_eq!(disambiguate(&[other_tier, top.clone()], &cfg), Some(top));
    }

    #[test]
    fn lower_tier_below_threshold_yields_to_next_tier() {
        let pool = [
            candidate(1, 1, 0.88, "cognome.nome", false),
            candidate(2, 1, 0.8, "cognome.nome", false),
            candidate(3, 2, 0.97, "nome.cognome", false),
        ];
        // tier 1 ranks first and is too close to its rival
        let loose = EmailMatchConfig::default().with_threshold(0.85);
        assert_eq!(disambiguate(&pool, &loose), None);

        // tier 1 drops out, tier 2 has no rival
        let strict = EmailMatchConfig::default().with_threshold(0.9);
        assert_eq!(disambiguate(&pool, &strict).unwrap().person_id, 3);
    }
}
