//! Name decomposition: every plausible (firstname, lastname) reading of a
//! display name or of a directory entry.
//!
//! Directory data is entered by hand and carries recurring defects: surname
//! typed into the firstname column, the surname repeated at the end of the
//! firstname, both columns holding the full name, duplicated surname words.
//! [`decompose_person`] emits one candidate per defect it recognizes so the
//! matchers can try each reading.

use std::collections::HashSet;

use crate::model::{DirectoryPerson, NameCandidate, SourceTag};
use crate::normalize::names_match;

/// Minimum length, in characters, of either field of a candidate.
const MIN_FIELD_CHARS: usize = 2;

/// Readings of a free-text display name, most specific first.
///
/// `"Rossi, Mario"` yields the comma reading `(Mario, Rossi)` before the
/// positional ones. Fewer than two words yields nothing.
pub fn decompose_display_name(raw: &str) -> Vec<NameCandidate> {
    let spaced: String = raw
        .chars()
        .map(|c| if matches!(c, ',' | ';' | '|') { ' ' } else { c })
        .collect();
    let parts: Vec<&str> = spaced.split_whitespace().collect();
    if parts.len() < 2 {
        return Vec::new();
    }

    let mut candidates = Vec::new();

    if raw.contains(',') {
        let segments: Vec<&str> = raw.split(',').map(str::trim).collect();
        if segments.len() >= 2 {
            candidates.push(NameCandidate::new(segments[1], segments[0], SourceTag::CommaSplit));
        }
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    candidates.push(NameCandidate::new(first, last, SourceTag::FirstLast));
    candidates.push(NameCandidate::new(last, first, SourceTag::Reversed));

    if parts.len() > 2 {
        candidates.push(NameCandidate::new(
            format!("{} {}", parts[0], parts[1]),
            last,
            SourceTag::CompoundFirstname,
        ));
    }

    finalize(candidates)
}

/// Readings of a directory entry, starting with the stored fields.
pub fn decompose_person(person: &DirectoryPerson) -> Vec<NameCandidate> {
    let first = collapse_whitespace(&person.firstname);
    let last = collapse_whitespace(&person.lastname);
    let first_words: Vec<&str> = first.split_whitespace().collect();
    let last_words: Vec<&str> = last.split_whitespace().collect();

    let mut candidates = vec![
        NameCandidate::new(first.as_str(), last.as_str(), SourceTag::Original),
        NameCandidate::new(last.as_str(), first.as_str(), SourceTag::Inverted),
    ];

    if first_words.len() > 1 {
        let tail = first_words[first_words.len() - 1];
        if names_match(tail, &last) {
            candidates.push(NameCandidate::new(
                first_words[..first_words.len() - 1].join(" "),
                last.as_str(),
                SourceTag::TrailingDuplicateStripped,
            ));
        }
        candidates.push(NameCandidate::new(first_words[0], last.as_str(), SourceTag::FirstWordOnly));
    }

    if first_words.len() > 1 && names_match(&first, &last) {
        candidates.push(NameCandidate::new(
            first_words[0],
            first_words[1..].join(" "),
            SourceTag::IdenticalFieldsSplit,
        ));
    }

    if last_words.len() > 1 {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = last_words
            .iter()
            .copied()
            .filter(|w| seen.insert(w.to_lowercase()))
            .collect();
        if unique.len() < last_words.len() {
            candidates.push(NameCandidate::new(
                first.as_str(),
                unique.join(" "),
                SourceTag::DeduplicatedLastname,
            ));
            candidates.push(NameCandidate::new(
                first.as_str(),
                last_words[0],
                SourceTag::LastnameFirstComponent,
            ));
        }
    }

    finalize(candidates)
}

/// Drop candidates with a missing or too-short field, then collapse
/// case-insensitive duplicates keeping the first occurrence.
fn finalize(candidates: Vec<NameCandidate>) -> Vec<NameCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|c| NameCandidate::new(c.firstname.trim(), c.lastname.trim(), c.source))
        .filter(|c| {
            c.firstname.chars().count() >= MIN_FIELD_CHARS
                && c.lastname.chars().count() >= MIN_FIELD_CHARS
        })
        .filter(|c| seen.insert(c.dedup_key()))
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
