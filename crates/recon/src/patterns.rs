//! Declarative e-mail local-part pattern table and the pure scoring
//! functions used against it.
//!
//! Pattern names use the Italian convention of the directories this engine
//! was built for: `cognome` = lastname, `nome` = firstname, a single letter
//! is that field's initial. Separators are never embedded in the generated
//! string; `cognome.nome` and `cognomenome` produce the same text and differ
//! only in weight, because separators are stripped from the local part
//! before comparison.

use std::collections::BTreeMap;

/// Cleaned (`[a-z0-9]` only) name fields a pattern is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameParts<'a> {
    pub firstname: &'a str,
    pub lastname: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct EmailPattern {
    pub name: &'static str,
    /// 1 = lastname-first, 2 = firstname-first, 3 = initials / low signal.
    pub tier: u8,
    /// How distinctive a hit on this pattern is, in `[0.6, 1.0]`.
    pub weight: f64,
    /// A hit must pass the ambiguity checks (initials, single field).
    pub ambiguous: bool,
    pub generate: fn(&NameParts<'_>) -> String,
}

pub const PATTERN_COUNT: usize = 17;

pub static PATTERNS: [EmailPattern; PATTERN_COUNT] = [
    // Tier 1: lastname first
    pattern("cognome.nome", 1, 1.0, false, lastname_firstname),
    pattern("cognomenome", 1, 0.95, false, lastname_firstname),
    pattern("cognome_nome", 1, 0.95, false, lastname_firstname),
    pattern("cognome.n", 1, 0.9, true, lastname_first_initial),
    pattern("cognome-n", 1, 0.85, true, lastname_first_initial),
    pattern("cognome", 1, 0.7, true, lastname_only),
    // Tier 2: firstname first
    pattern("nome.cognome", 2, 1.0, false, firstname_lastname),
    pattern("nomecognome", 2, 0.95, false, firstname_lastname),
    pattern("nome_cognome", 2, 0.95, false, firstname_lastname),
    pattern("nome.c", 2, 0.9, true, firstname_last_initial),
    pattern("nome-c", 2, 0.85, true, firstname_last_initial),
    pattern("nome", 2, 0.6, true, firstname_only),
    // Tier 3: initials and other low-signal constructions
    pattern("n.cognome", 3, 0.9, true, first_initial_lastname),
    pattern("n_cognome", 3, 0.85, true, first_initial_lastname),
    pattern("c.nome", 3, 0.8, true, last_initial_firstname),
    pattern("nc", 3, 0.6, true, initials_first_last),
    pattern("cn", 3, 0.6, true, initials_last_first),
];

const fn pattern(
    name: &'static str,
    tier: u8,
    weight: f64,
    ambiguous: bool,
    generate: fn(&NameParts<'_>) -> String,
) -> EmailPattern {
    EmailPattern {
        name,
        tier,
        weight,
        ambiguous,
        generate,
    }
}

fn initial(s: &str) -> &str {
    s.char_indices()
        .nth(1)
        .map(|(i, _)| &s[..i])
        .unwrap_or(s)
}

fn lastname_firstname(p: &NameParts<'_>) -> String {
    format!("{}{}", p.lastname, p.firstname)
}

fn lastname_first_initial(p: &NameParts<'_>) -> String {
    format!("{}{}", p.lastname, initial(p.firstname))
}

fn lastname_only(p: &NameParts<'_>) -> String {
    p.lastname.to_string()
}

fn firstname_lastname(p: &NameParts<'_>) -> String {
    format!("{}{}", p.firstname, p.lastname)
}

fn firstname_last_initial(p: &NameParts<'_>) -> String {
    format!("{}{}", p.firstname, initial(p.lastname))
}

fn firstname_only(p: &NameParts<'_>) -> String {
    p.firstname.to_string()
}

fn first_initial_lastname(p: &NameParts<'_>) -> String {
    format!("{}{}", initial(p.firstname), p.lastname)
}

fn last_initial_firstname(p: &NameParts<'_>) -> String {
    format!("{}{}", initial(p.lastname), p.firstname)
}

fn initials_first_last(p: &NameParts<'_>) -> String {
    format!("{}{}", initial(p.firstname), initial(p.lastname))
}

fn initials_last_first(p: &NameParts<'_>) -> String {
    format!("{}{}", initial(p.lastname), initial(p.firstname))
}

pub fn find_pattern(name: &str) -> Option<&'static EmailPattern> {
    PATTERNS.iter().find(|p| p.name == name)
}

/// The pattern table with configured weight overrides applied.
/// Unknown names are ignored here; config validation rejects them.
pub fn weighted_table(overrides: &BTreeMap<String, f64>) -> Vec<EmailPattern> {
    PATTERNS
        .iter()
        .map(|p| {
            let mut p = *p;
            if let Some(&w) = overrides.get(p.name) {
                p.weight = w;
            }
            p
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Normalized Levenshtein similarity: `1 - distance / max(len_a, len_b)`,
/// `1.0` when both strings are empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// The local part as written plus its separator-normalized forms:
/// dots removed, underscores removed, all of `._-` removed.
pub fn local_part_variants(local: &str) -> Vec<String> {
    let mut variants = vec![
        local.to_string(),
        local.replace('.', ""),
        local.replace('_', ""),
        local.replace(['.', '_', '-'], ""),
    ];
    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| seen.insert(v.clone()));
    variants
}

/// Best similarity of a generated pattern string over all local-part variants.
pub fn best_similarity(generated: &str, variants: &[String]) -> f64 {
    variants
        .iter()
        .map(|v| similarity(generated, v))
        .fold(0.0, f64::max)
}

/// Confidence derived from a raw similarity: boosted for full-name
/// patterns, scaled by weight, clamped to `[0, 1]`.
pub fn confidence(similarity: f64, pattern: &EmailPattern, non_ambiguous_boost: f64) -> f64 {
    let base = if pattern.ambiguous {
        similarity
    } else {
        similarity * non_ambiguous_boost
    };
    (base * pattern.weight).clamp(0.0, 1.0)
}
