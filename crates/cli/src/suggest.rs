//! `rollcall suggest` / `rollcall validate`: config-driven suggestion runs.

use std::path::{Path, PathBuf};

use rollcall_recon::model::{MatchDetail, SuggestionReport};
use rollcall_recon::{load_directory_csv, load_identifiers_csv, MatchConfig, ReconError};

use crate::exit_codes::{EXIT_ERROR, EXIT_INPUT_PARSE, EXIT_INVALID_CONFIG, EXIT_IO};
use crate::CliError;

fn suggest_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn read_config(config_path: &Path) -> Result<MatchConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| suggest_err(EXIT_IO, format!("cannot read config: {e}")))?;
    MatchConfig::from_toml(&config_str).map_err(|e| suggest_err(EXIT_INVALID_CONFIG, e.to_string()))
}

fn read_input(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| suggest_err(EXIT_IO, format!("cannot read {}: {e}", path.display())))
}

fn load_err(err: ReconError) -> CliError {
    let code = match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        _ => EXIT_INPUT_PARSE,
    };
    suggest_err(code, err.to_string())
}

fn missing_section(section: &str) -> CliError {
    CliError {
        code: EXIT_INVALID_CONFIG,
        message: format!("config has no [{section}] section"),
        hint: Some(format!("add [{section}] with at least `file = \"...\"`")),
    }
}

pub fn cmd_suggest(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let dir_cfg = config.directory.as_ref().ok_or_else(|| missing_section("directory"))?;
    let ids_cfg = config.identifiers.as_ref().ok_or_else(|| missing_section("identifiers"))?;

    // Input files resolve relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let people = load_directory_csv(&read_input(&base_dir.join(&dir_cfg.file))?, dir_cfg)
        .map_err(load_err)?;
    let loaded = load_identifiers_csv(&read_input(&base_dir.join(&ids_cfg.file))?, ids_cfg)
        .map_err(load_err)?;
    tracing::info!(
        "loaded {} people and {} records ({} already applied)",
        people.len(),
        loaded.identifiers.len(),
        loaded.applied.len()
    );

    let report = rollcall_recon::run(&config, &loaded.into_input(people));

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| suggest_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| suggest_err(EXIT_IO, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else if output_file.is_none() {
        print_table(&report);
    }

    // Human summary to stderr
    let s = &report.statistics;
    eprintln!(
        "{}: {} suggestions for {} records ({} name, {} e-mail), {} unmatched, {} already applied",
        report.meta.config_name,
        s.total,
        report.meta.identifiers,
        s.name_based,
        s.email_based,
        report.unmatched.len(),
        report.skipped_applied.len(),
    );

    Ok(())
}

fn print_table(report: &SuggestionReport) {
    println!("record\tperson\ttype\tconfidence\tvia");
    for s in &report.suggestions {
        let via = match &s.detail {
            MatchDetail::Name { phase } => format!("phase {} ({phase})", phase.number()),
            MatchDetail::Email { pattern, tier, score, .. } => {
                format!("{pattern} tier {tier} score {score:.2}")
            }
        };
        println!("{}\t{}\t{}\t{}\t{}", s.record_id, s.person_id, s.kind, s.confidence, via);
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let describe = |file: Option<&str>| file.map_or_else(|| "-".to_string(), str::to_string);
    eprintln!(
        "valid: '{}' (directory: {}, identifiers: {}, threshold {}, {} weight override(s))",
        config.name,
        describe(config.directory.as_ref().map(|d| d.file.as_str())),
        describe(config.identifiers.as_ref().map(|i| i.file.as_str())),
        config.email.similarity_threshold,
        config.email.weights.len(),
    );
    Ok(())
}
