//! Phased display-name matcher.
//!
//! Phases run strictly in order and the first hit wins:
//!
//! 1. lastname, then firstname, both as whole words;
//! 2. firstname, then lastname, both as whole words;
//! 3. reserved (no logic);
//! 4. lastname as a whole word plus the firstname initial (`m` or `m.`);
//! 5. firstname as a whole word plus the lastname initial;
//! 6. reserved (no logic).
//!
//! Phases 4 and 5 refuse a person when another directory person shares the
//! same (name, initial) pair. Phases 1 and 2 carry no ambiguity check.
//!
//! The reported phase records word order in the text: `"Mario Rossi"` is
//! phase 2, `"Rossi Mario"` phase 1. Identifiers are matched on their
//! cleaned text, not on [`decompose_display_name`] readings; `"Rossi, Mario"`
//! hits phase 1 because the comma is dropped and the lastname comes first.
//!
//! [`decompose_display_name`]: crate::decompose::decompose_display_name

use std::collections::{HashMap, HashSet};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::decompose::decompose_person;
use crate::model::{DirectoryPerson, MatchPhase, PersonId, SourceTag};
use crate::normalize::{clean_identifier, create_name_variations, is_stop_word, normalize};

static INITIAL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z0-9])\.?$").expect("initial token pattern is a valid regex"));

/// Persons already claimed during one [`PhasedMatcher::find_best_match`] call.
/// Never shared between calls.
#[derive(Debug, Default)]
pub struct MatchedSet {
    ids: HashSet<PersonId>,
}

impl MatchedSet {
    pub fn contains(&self, id: PersonId) -> bool {
        self.ids.contains(&id)
    }

    pub fn insert(&mut self, id: PersonId) {
        self.ids.insert(id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasedMatch {
    pub person_id: PersonId,
    pub phase: MatchPhase,
}

/// Whole-word lookups for one name field.
#[derive(Debug)]
struct NamePattern {
    /// Normalized field, the key of the initial index.
    key: String,
    initial: Option<char>,
    regexes: Vec<Regex>,
}

impl NamePattern {
    fn new(field: &str) -> Self {
        let key = normalize(field);
        let mut forms: Vec<String> = create_name_variations(field)
            .iter()
            .map(|v| normalize(v))
            .filter(|v| !v.is_empty() && !is_stop_word(v))
            .collect();
        forms.sort_unstable();
        forms.dedup();

        let regexes = forms
            .iter()
            .filter_map(|form| Regex::new(&format!(r"\b{}\b", regex::escape(form))).ok())
            .collect();
        let initial = key.chars().find(|c| c.is_ascii_alphanumeric());

        Self {
            key,
            initial,
            regexes,
        }
    }

    /// Byte spans of every whole-word occurrence in `text`.
    fn occurrences(&self, text: &str) -> Vec<(usize, usize)> {
        self.regexes
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| (m.start(), m.end())))
            .collect()
    }
}

#[derive(Debug)]
struct Reading {
    firstname: NamePattern,
    lastname: NamePattern,
}

#[derive(Debug)]
struct PreparedPerson {
    id: PersonId,
    readings: Vec<Reading>,
}

#[derive(Debug, Clone, Copy)]
enum WordOrder {
    LastnameFirst,
    FirstnameFirst,
}

#[derive(Debug, Clone, Copy)]
enum Abbreviated {
    Firstname,
    Lastname,
}

/// name key -> initial -> persons having a reading with that pair
type InitialIndex = HashMap<String, HashMap<char, HashSet<PersonId>>>;

#[derive(Debug)]
pub struct PhasedMatcher {
    people: Vec<PreparedPerson>,
    /// (lastname, firstname initial)
    lastname_initials: InitialIndex,
    /// (firstname, lastname initial)
    firstname_initials: InitialIndex,
}

impl PhasedMatcher {
    /// Prepare whole-word patterns for every reading of every person.
    ///
    /// The `inverted` reading is skipped: phases 1/2 and 4/5 already try
    /// both field orders.
    pub fn new(directory: &[DirectoryPerson]) -> Self {
        let mut people = Vec::with_capacity(directory.len());
        let mut lastname_initials = InitialIndex::new();
        let mut firstname_initials = InitialIndex::new();

        for person in directory {
            let readings: Vec<Reading> = decompose_person(person)
                .into_iter()
                .filter(|c| c.source != SourceTag::Inverted)
                .map(|c| Reading {
                    firstname: NamePattern::new(&c.firstname),
                    lastname: NamePattern::new(&c.lastname),
                })
                .collect();

            for r in &readings {
                if let Some(i) = r.firstname.initial {
                    lastname_initials
                        .entry(r.lastname.key.clone())
                        .or_default()
                        .entry(i)
                        .or_default()
                        .insert(person.id);
                }
                if let Some(i) = r.lastname.initial {
                    firstname_initials
                        .entry(r.firstname.key.clone())
                        .or_default()
                        .entry(i)
                        .or_default()
                        .insert(person.id);
                }
            }

            people.push(PreparedPerson {
                id: person.id,
                readings,
            });
        }

        Self {
            people,
            lastname_initials,
            firstname_initials,
        }
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Best directory match for a display name, or `None` when no phase
    /// produces an unambiguous hit. Anything containing `@` is refused,
    /// malformed addresses included.
    pub fn find_best_match(&self, identifier: &str) -> Option<PhasedMatch> {
        if identifier.contains('@') {
            return None;
        }
        let text = clean_identifier(identifier);
        if text.is_empty() {
            return None;
        }

        let mut matched = MatchedSet::default();
        let initials = initial_tokens(&text);

        let hit = self
            .match_full_name(&text, &matched, WordOrder::LastnameFirst)
            .map(|id| (id, MatchPhase::LastnameFirstname))
            .or_else(|| {
                self.match_full_name(&text, &matched, WordOrder::FirstnameFirst)
                    .map(|id| (id, MatchPhase::FirstnameLastname))
            })
            // phase 3 reserved
            .or_else(|| {
                self.match_with_initial(&text, &initials, &matched, Abbreviated::Firstname)
                    .map(|id| (id, MatchPhase::LastnameInitial))
            })
            .or_else(|| {
                self.match_with_initial(&text, &initials, &matched, Abbreviated::Lastname)
                    .map(|id| (id, MatchPhase::FirstnameInitial))
            });
        // phase 6 reserved

        let (person_id, phase) = hit?;
        matched.insert(person_id);
        debug!("phased match: {identifier:?} -> person {person_id} (phase {})", phase.number());
        Some(PhasedMatch { person_id, phase })
    }

    fn match_full_name(&self, text: &str, matched: &MatchedSet, order: WordOrder) -> Option<PersonId> {
        for person in &self.people {
            if matched.contains(person.id) {
                continue;
            }
            for reading in &person.readings {
                let lasts = reading.lastname.occurrences(text);
                if lasts.is_empty() {
                    continue;
                }
                let firsts = reading.firstname.occurrences(text);
                if firsts.is_empty() {
                    continue;
                }
                let (leading, trailing) = match order {
                    WordOrder::LastnameFirst => (&lasts, &firsts),
                    WordOrder::FirstnameFirst => (&firsts, &lasts),
                };
                let in_order = leading
                    .iter()
                    .any(|lead| trailing.iter().any(|trail| lead.1 <= trail.0));
                if in_order {
                    return Some(person.id);
                }
            }
        }
        None
    }

    fn match_with_initial(
        &self,
        text: &str,
        initials: &HashSet<char>,
        matched: &MatchedSet,
        abbreviated: Abbreviated,
    ) -> Option<PersonId> {
        if initials.is_empty() {
            return None;
        }
        let index = match abbreviated {
            Abbreviated::Firstname => &self.lastname_initials,
            Abbreviated::Lastname => &self.firstname_initials,
        };

        for person in &self.people {
            if matched.contains(person.id) {
                continue;
            }
            for reading in &person.readings {
                let (full, short) = match abbreviated {
                    Abbreviated::Firstname => (&reading.lastname, &reading.firstname),
                    Abbreviated::Lastname => (&reading.firstname, &reading.lastname),
                };
                let Some(initial) = short.initial else {
                    continue;
                };
                if !initials.contains(&initial) || full.occurrences(text).is_empty() {
                    continue;
                }
                let sharing = index
                    .get(full.key.as_str())
                    .and_then(|by_initial| by_initial.get(&initial))
                    .map_or(0, HashSet::len);
                if sharing > 1 {
                    debug!(
                        "initial match refused: {} persons share ({}, {initial})",
                        sharing, full.key
                    );
                    continue;
                }
                return Some(person.id);
            }
        }
        None
    }
}

/// Single-letter tokens (`m` or `m.`) of a cleaned identifier.
fn initial_tokens(text: &str) -> HashSet<char> {
    text.split(' ')
        .filter_map(|token| INITIAL_TOKEN.captures(token))
        .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().chars().next()))
        .collect()
}
