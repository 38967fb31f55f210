// Property-based tests for normalization and the suggestion invariants.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;
use rollcall_recon::config::{EmailMatchConfig, MatchConfig};
use rollcall_recon::email::EmailMatcher;
use rollcall_recon::model::{DirectoryPerson, RawIdentifier, SuggestionType};
use rollcall_recon::normalize::normalize;
use rollcall_recon::patterns::{NameParts, PATTERNS};
use rollcall_recon::suggest::{NoneApplied, SuggestionSession};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Overlapping names so that ambiguity and reuse paths are exercised.
const NAMES: [(&str, &str); 5] = [
    ("mario", "rossi"),
    ("marco", "rossi"),
    ("giulia", "bianchi"),
    ("giulia", "bianchini"),
    ("luca", "verdi"),
];

fn crowded_directory() -> Vec<DirectoryPerson> {
    NAMES
        .iter()
        .enumerate()
        .map(|(i, (first, last))| DirectoryPerson::new(i as u64 + 1, *first, *last, ""))
        .collect()
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Latin text with accents, apostrophe variants, and odd spacing.
fn arb_text() -> impl Strategy<Value = String> {
    r"[a-zA-Z0-9àèéìòùÀÈÉÒçÇßøæœłđ' ’‘`\-\.,\t]{0,40}"
}

/// An e-mail address generated from one person and one pattern, with an
/// optional single-letter substitution.
fn arb_address() -> impl Strategy<Value = String> {
    (
        0..NAMES.len(),
        0..PATTERNS.len(),
        proptest::option::of((0usize..16, proptest::char::range('a', 'z'))),
        prop_oneof![Just(""), Just("."), Just("_")],
    )
        .prop_map(|(person, pattern, typo, sep)| {
            let (first, last) = NAMES[person];
            let parts = NameParts {
                firstname: first,
                lastname: last,
            };
            let mut local: Vec<char> = (PATTERNS[pattern].generate)(&parts).chars().collect();
            if let Some((pos, c)) = typo {
                let pos = pos % local.len();
                local[pos] = c;
            }
            if local.len() > 2 && !sep.is_empty() {
                local.insert(1, sep.chars().next().unwrap_or('.'));
            }
            format!("{}@example.org", local.into_iter().collect::<String>())
        })
}

fn arb_identifier() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Mario Rossi".to_string()),
        Just("Rossi, Marco".to_string()),
        Just("Rossi M.".to_string()),
        Just("Giulia B.".to_string()),
        Just("Luca Verdi - Comune di Roma".to_string()),
        Just("m.rossi@x.com".to_string()),
        Just("mario.rossi@x.com".to_string()),
        Just("rossi.mario@y.org".to_string()),
        Just("giulia.bianchi@x.com".to_string()),
        Just("luca.verdi@x.com".to_string()),
        Just("lverdi@x.com".to_string()),
        r"[a-z]{2,8}\.[a-z]{2,8}@x\.com",
        r"[A-Z][a-z]{2,7} [A-Z][a-z]{2,7}",
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Distinct addresses accepted by one fresh matcher.
fn accepted(addresses: &[String], threshold: f64) -> usize {
    let config = EmailMatchConfig::default().with_threshold(threshold);
    let mut matcher = EmailMatcher::new(&crowded_directory(), &config);
    let mut seen = HashSet::new();
    addresses
        .iter()
        .filter(|a| seen.insert(a.as_str()))
        .filter(|a| matcher.find_match(a).is_some())
        .count()
}

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn normalize_is_idempotent(text in arb_text()) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once.clone());
        prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
        prop_assert!(!once.contains("  "));
    }

    #[test]
    fn raising_threshold_never_adds_matches(
        addresses in proptest::collection::vec(arb_address(), 1..8),
        a in 0.85f64..=1.0,
        b in 0.85f64..=1.0,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(accepted(&addresses, high) <= accepted(&addresses, low));
    }

    #[test]
    fn at_most_one_suggestion_and_unique_email_persons(
        texts in proptest::collection::vec(arb_identifier(), 0..12),
        ids in proptest::collection::vec(1u64..8, 12),
    ) {
        let batch: Vec<RawIdentifier> = texts
            .iter()
            .zip(&ids)
            .map(|(t, id)| RawIdentifier::new(*id, t.as_str()))
            .collect();

        let mut session = SuggestionSession::new(&crowded_directory(), &MatchConfig::default());
        let map = session.suggest(&batch, &NoneApplied);

        let input_ids: HashSet<u64> = batch.iter().map(|r| r.record_id).collect();
        prop_assert!(map.len() <= input_ids.len());

        let mut email_persons = HashSet::new();
        for s in map.iter() {
            prop_assert!(input_ids.contains(&s.record_id));
            if s.kind == SuggestionType::Email {
                prop_assert!(
                    email_persons.insert(s.person_id),
                    "person {} suggested twice via e-mail", s.person_id
                );
            }
        }
    }
}
