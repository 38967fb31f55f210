//! Text normalization shared by every matcher.
//!
//! Order matters: apostrophes are unified and accents stripped *before* any
//! punctuation is removed, so `é` survives as `e` and word boundaries around
//! `'` and `-` are still visible to the later steps.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Glyphs that meeting platforms and directories use in place of `'`.
const APOSTROPHE_VARIANTS: &[char] = &[
    '\u{2019}', // right single quotation mark
    '\u{2018}', // left single quotation mark
    '\u{00B4}', // acute accent
    '`',
    '\u{02BC}', // modifier letter apostrophe
    '\u{2032}', // prime
];

/// Italian articles and prepositions never accepted as a name token.
pub const STOP_WORDS: &[&str] = &[
    "di", "da", "de", "del", "della", "delle", "dei", "degli", "lo", "la", "le", "il", "a", "in",
    "con", "su", "per", "tra", "fra",
];

/// Elided surname prefixes, longest first.
const NAME_PREFIXES: &[&str] = &["dell'", "dal'", "del'", "d'", "l'"];

/// Ordered noise removals applied by [`clean_identifier`] to normalized text.
static NOISE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Leading titles, possibly stacked: "prof. ing. mario rossi"
        r"^(?:(?:dott(?:\.?ssa)?|dottor(?:essa)?|dr(?:\.?ssa)?|prof(?:\.?ssa)?|professor(?:essa)?|ing|avv|arch|geom|rag|sig(?:\.?ra)?)\.?\s+)+",
        // Organizational suffix: "mario rossi - comune di milano"
        r"\s+[-\u{2013}\u{2014}]\s*(?:comune|provincia|regione|asl|ausl|universita|ufficio|ente|azienda)\b.*$",
        // Guest markers: "mario rossi (ospite)"
        r"\s*\((?:guest|ospite|esterno|esterna|external|invitato|invitata)\)\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("noise pattern is a valid regex"))
    .collect()
});

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex"));

static NON_IDENTIFIER_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9 .'\-]+").expect("identifier charset is a valid regex"));

/// Lowercase, accent-free, apostrophe-unified, whitespace-collapsed form.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let unified: String = text
        .chars()
        .map(|c| if APOSTROPHE_VARIANTS.contains(&c) { '\'' } else { c })
        .collect();

    let mut folded = String::with_capacity(unified.len());
    for c in unified.to_lowercase().nfd().filter(|c| !is_combining_mark(*c)) {
        match fold_undecomposable(c) {
            Some(s) => folded.push_str(s),
            None => folded.push(c),
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Latin letters without a canonical decomposition.
fn fold_undecomposable(c: char) -> Option<&'static str> {
    match c {
        'ß' => Some("ss"),
        'ø' => Some("o"),
        'æ' => Some("ae"),
        'œ' => Some("oe"),
        'ł' => Some("l"),
        'đ' => Some("d"),
        'ı' => Some("i"),
        _ => None,
    }
}

/// Normalize a raw identifier and strip organizational noise (titles,
/// "- Comune di ..." suffixes, guest markers), leaving only
/// `[a-z0-9 .'-]`.
pub fn clean_identifier(raw: &str) -> String {
    let mut text = normalize(raw);
    for pattern in NOISE_PATTERNS.iter() {
        text = pattern.replace_all(&text, " ").into_owned();
    }
    let text = NON_IDENTIFIER_CHARS.replace_all(&text, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text restricted to `[a-z0-9]`.
pub fn alnum_only(text: &str) -> String {
    normalize(text)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

pub fn names_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// The name as given, its normalized form, and apostrophe removal/insertion
/// variants for elided Italian prefixes (`d'angelo` / `dangelo` / `d angelo`).
pub fn create_name_variations(name: &str) -> BTreeSet<String> {
    let mut variations = BTreeSet::new();
    variations.insert(name.to_string());
    let norm = normalize(name);

    for prefix in NAME_PREFIXES {
        let bare = &prefix[..prefix.len() - 1];

        if let Some(rest) = norm.strip_prefix(prefix) {
            if rest.chars().count() >= 2 {
                variations.insert(format!("{bare}{rest}"));
                variations.insert(format!("{bare} {rest}"));
            }
            break;
        }

        if let Some(rest) = norm.strip_prefix(bare) {
            let rest = rest.trim_start();
            if rest.chars().count() >= 2 && !rest.starts_with('\'') {
                variations.insert(format!("{prefix}{rest}"));
                break;
            }
        }
    }

    variations.insert(norm);
    variations
}

/// Shape check used to route identifiers to the e-mail matcher.
pub fn looks_like_email(text: &str) -> bool {
    EMAIL_SHAPE.is_match(text.trim())
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_accents_and_whitespace() {
        assert_eq!(normalize("  NICOLÒ   Dell’Àcqua "), "nicolo dell'acqua");
        assert_eq!(normalize("François Müller"), "francois muller");
        assert_eq!(normalize("Ñandú Çelik"), "nandu celik");
        assert_eq!(normalize("Straße"), "strasse");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["Rossi, Mario", "D`Angelo  Lucía", "ÉMILE Zola-Ü", "", "   "] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input {s:?}");
        }
    }

    #[test]
    fn apostrophe_glyphs_unify() {
        assert_eq!(normalize("D’Angelo"), "d'angelo");
        assert_eq!(normalize("D`Angelo"), "d'angelo");
        assert_eq!(normalize("D´Angelo"), "d'angelo");
    }

    #[test]
    fn clean_identifier_strips_org_suffix() {
        assert_eq!(clean_identifier("Mario Bianchi - Comune di Milano"), "mario bianchi");
        assert_eq!(clean_identifier("Mario Bianchi – Provincia di Varese"), "mario bianchi");
    }

    #[test]
    fn clean_identifier_strips_titles_and_guest_marker() {
        assert_eq!(clean_identifier("Dott.ssa Anna Verdi"), "anna verdi");
        assert_eq!(clean_identifier("Prof. Ing. Luca Neri"), "luca neri");
        assert_eq!(clean_identifier("Luca Neri (Guest)"), "luca neri");
        assert_eq!(clean_identifier("Luca Neri (ospite)"), "luca neri");
    }

    #[test]
    fn clean_identifier_leaves_plain_names_alone() {
        assert_eq!(clean_identifier("Rossi, Mario"), "rossi mario");
        assert_eq!(clean_identifier("Rossi M."), "rossi m.");
        assert_eq!(clean_identifier("Anna D'Amico-Ferri"), "anna d'amico-ferri");
        // "ing" only counts as a title when followed by a name
        assert_eq!(clean_identifier("Ingrid Bergman"), "ingrid bergman");
    }

    #[test]
    fn alnum_only_strips_after_accents() {
        assert_eq!(alnum_only("José-María O'Neil"), "josemariaoneil");
        assert_eq!(alnum_only("mario.rossi_2"), "mariorossi2");
    }

    #[test]
    fn names_match_ignores_accents_and_case() {
        assert!(names_match("NICOLÒ", "nicolo"));
        assert!(names_match("  Luca ", "luca"));
        assert!(!names_match("Luca", "Luka"));
    }

    #[test]
    fn variations_remove_apostrophe() {
        let v = create_name_variations("D'Angelo");
        assert!(v.contains("D'Angelo"));
        assert!(v.contains("d'angelo"));
        assert!(v.contains("dangelo"));
        assert!(v.contains("d angelo"));
    }

    #[test]
    fn variations_insert_apostrophe() {
        let v = create_name_variations("Dellacqua");
        assert!(v.contains("dellacqua"));
        assert!(v.contains("dell'acqua"));
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn variations_plain_name() {
        let v = create_name_variations("Rossi");
        assert_eq!(v.into_iter().collect::<Vec<_>>(), vec!["Rossi", "rossi"]);
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("mario.rossi@example.com"));
        assert!(looks_like_email(" M.Rossi@x.it "));
        assert!(!looks_like_email("Mario Rossi"));
        assert!(!looks_like_email("mario@localhost"));
        assert!(!looks_like_email("a@b@c.com"));
    }

    #[test]
    fn stop_words() {
        assert!(is_stop_word("della"));
        assert!(is_stop_word("per"));
        assert!(!is_stop_word("rossi"));
    }
}
