//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (including batches with no suggestions)      |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments; emitted by clap)         |
//! | 3    | I/O error (cannot read config or CSV, cannot write)  |
//! | 4    | Invalid config (TOML parse or validation failure)    |
//! | 5    | Input parse error (missing column, bad or duplicate id) |
//!
//! Unmatched records are never an error: declining to suggest under
//! ambiguity is a normal outcome.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Cannot read an input file or write the output file.
pub const EXIT_IO: u8 = 3;

/// Config file does not parse, fails validation, or lacks a section the
/// command needs.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Directory or attendance CSV is malformed.
pub const EXIT_INPUT_PARSE: u8 = 5;
