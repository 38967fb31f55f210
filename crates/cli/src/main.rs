// rollcall CLI - attendance identifier reconciliation
// Engine: crates/recon (rollcall-recon)

mod exit_codes;
mod logging;
mod suggest;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use rollcall_recon::decompose::{decompose_display_name, decompose_person};
use rollcall_recon::model::DirectoryPerson;
use rollcall_recon::normalize::{clean_identifier, looks_like_email, normalize};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Suggest directory people for unassigned meeting attendance records")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log engine decisions to stderr (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match attendance records against a person directory
    #[command(after_help = "\
Examples:
  rollcall suggest standup.toml
  rollcall suggest standup.toml --json
  rollcall suggest standup.toml --output suggestions.json
  rollcall suggest standup.toml -vv")]
    Suggest {
        /// Path to the TOML config file (CSV paths resolve relative to it)
        config: PathBuf,

        /// Output the JSON report to stdout instead of the table
        #[arg(long)]
        json: bool,

        /// Write the JSON report to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  rollcall validate standup.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },

    /// Print the normalized form of a text
    #[command(after_help = "\
Examples:
  rollcall normalize \"Nicolò Dell’Acqua\"
  rollcall normalize --clean \"Dott. Mario Rossi - Comune di Milano\"")]
    Normalize {
        text: String,

        /// Also strip titles, organization suffixes and guest markers
        #[arg(long)]
        clean: bool,
    },

    /// Print the (firstname, lastname) readings of a name as JSON
    #[command(after_help = "\
Examples:
  rollcall decompose \"Rossi, Mario\"
  rollcall decompose \"Alberto Deimann Deimann\" --lastname Deimann")]
    Decompose {
        /// Display name, or the firstname field when --lastname is given
        name: String,

        /// Treat NAME as a directory firstname with this lastname
        #[arg(long)]
        lastname: Option<String>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("ROLLCALL_COMMIT"), ")",
        "\nengine:  rollcall-recon ", env!("CARGO_PKG_VERSION"),
        "\nbuild:   ", env!("ROLLCALL_PROFILE"),
        "\ntarget:  ", env!("ROLLCALL_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Suggest { config, json, output } => suggest::cmd_suggest(config, json, output),
        Commands::Validate { config } => suggest::cmd_validate(config),
        Commands::Normalize { text, clean } => cmd_normalize(&text, clean),
        Commands::Decompose { name, lastname } => cmd_decompose(&name, lastname.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn cmd_normalize(text: &str, clean: bool) -> Result<(), CliError> {
    if clean {
        println!("{}", clean_identifier(text));
    } else {
        println!("{}", normalize(text));
    }
    if looks_like_email(text) {
        eprintln!("note: input looks like an e-mail address; `suggest` routes it to the e-mail matcher");
    }
    Ok(())
}

fn cmd_decompose(name: &str, lastname: Option<&str>) -> Result<(), CliError> {
    if name.trim().is_empty() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "name is empty".into(),
            hint: None,
        });
    }
    let candidates = match lastname {
        Some(last) => decompose_person(&DirectoryPerson::new(0, name, last, "")),
        None => decompose_display_name(name),
    };
    let json = serde_json::to_string_pretty(&candidates).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;
    println!("{json}");
    Ok(())
}
