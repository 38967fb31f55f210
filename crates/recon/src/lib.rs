//! `rollcall-recon`: reconciles meeting attendance identifiers with a
//! person directory.
//!
//! Pure engine crate: receives pre-loaded records, returns at most one
//! suggestion per record. Display names go through the phased name matcher,
//! e-mail addresses through the local-part pattern matcher; ambiguity always
//! yields no suggestion. No CLI or filesystem dependencies.

pub mod config;
pub mod decompose;
pub mod email;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod patterns;
pub mod phased;
pub mod suggest;

pub use config::MatchConfig;
pub use engine::{load_directory_csv, load_identifiers_csv, run, LoadedIdentifiers};
pub use error::ReconError;
pub use model::{DirectoryPerson, RawIdentifier, Suggestion, SuggestionInput, SuggestionReport};
pub use suggest::{AssignmentTracker, NoneApplied, SuggestionMap, SuggestionSession};
