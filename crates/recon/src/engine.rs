use std::collections::{BTreeSet, HashSet};

use log::info;

use crate::config::{DirectoryInput, IdentifierInput, MatchConfig};
use crate::error::ReconError;
use crate::model::{
    DirectoryPerson, RawIdentifier, RecordId, ReportMeta, SuggestionInput, SuggestionReport,
};
use crate::suggest::{sort_by_type, statistics, SuggestionSession};

/// Run one suggestion batch. Matching never fails; ambiguous or unknown
/// records end up in `unmatched`.
pub fn run(config: &MatchConfig, input: &SuggestionInput) -> SuggestionReport {
    let mut session = SuggestionSession::new(&input.directory, config);
    let suggestions = session.suggest(&input.identifiers, &input.applied);
    let stats = statistics(&suggestions);

    let mut ordered = Vec::with_capacity(suggestions.len());
    let mut emitted = HashSet::new();
    let mut unmatched = Vec::new();
    let mut skipped_applied = Vec::new();
    for record in sort_by_type(&input.identifiers, &suggestions) {
        if let Some(s) = suggestions.get(record.record_id) {
            // duplicate record ids share one suggestion
            if emitted.insert(s.record_id) {
                ordered.push(s.clone());
            }
        } else if input.applied.contains(&record.record_id) {
            skipped_applied.push(record.record_id);
        } else {
            unmatched.push(record.record_id);
        }
    }

    info!(
        "{}: {} suggestions ({} name, {} e-mail), {} unmatched, {} skipped",
        config.name,
        stats.total,
        stats.name_based,
        stats.email_based,
        unmatched.len(),
        skipped_applied.len()
    );

    SuggestionReport {
        meta: ReportMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            directory_size: input.directory.len(),
            identifiers: input.identifiers.len(),
        },
        statistics: stats,
        suggestions: ordered,
        unmatched,
        skipped_applied,
    }
}

// ---------------------------------------------------------------------------
// CSV loaders
// ---------------------------------------------------------------------------

/// Identifier rows plus the records already flagged as applied.
#[derive(Debug, Clone, Default)]
pub struct LoadedIdentifiers {
    pub identifiers: Vec<RawIdentifier>,
    pub applied: BTreeSet<RecordId>,
}

impl LoadedIdentifiers {
    pub fn into_input(self, directory: Vec<DirectoryPerson>) -> SuggestionInput {
        SuggestionInput {
            directory,
            identifiers: self.identifiers,
            applied: self.applied,
        }
    }
}

struct CsvTable<'a> {
    headers: Vec<String>,
    reader: csv::Reader<&'a [u8]>,
}

impl<'a> CsvTable<'a> {
    fn open(csv_data: &'a str) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(csv_data.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| ReconError::Io(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        Ok(Self { headers, reader })
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn require(&self, input: &str, column: &str) -> Result<usize, ReconError> {
        self.position(column).ok_or_else(|| ReconError::MissingColumn {
            input: input.into(),
            column: column.into(),
        })
    }
}

fn parse_id(input: &str, record: &csv::StringRecord, idx: usize) -> Result<u64, ReconError> {
    let value = record.get(idx).unwrap_or("").trim();
    value.parse().map_err(|_| ReconError::InvalidId {
        input: input.into(),
        line: record.position().map_or(0, |p| p.line()),
        value: value.into(),
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

/// Load the person directory. The e-mail column is optional.
pub fn load_directory_csv(
    csv_data: &str,
    config: &DirectoryInput,
) -> Result<Vec<DirectoryPerson>, ReconError> {
    let input = config.file.as_str();
    let mut table = CsvTable::open(csv_data)?;
    let col = &config.columns;

    let id_idx = table.require(input, &col.id)?;
    let first_idx = table.require(input, &col.firstname)?;
    let last_idx = table.require(input, &col.lastname)?;
    let email_idx = table.position(&col.email);

    let mut seen = HashSet::new();
    let mut people = Vec::new();

    for record in table.reader.records() {
        let record = record?;
        let id = parse_id(input, &record, id_idx)?;
        if !seen.insert(id) {
            return Err(ReconError::DuplicateId {
                input: input.into(),
                id,
            });
        }
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
        people.push(DirectoryPerson {
            id,
            firstname: field(first_idx),
            lastname: field(last_idx),
            email: email_idx.map(field).unwrap_or_default(),
        });
    }

    Ok(people)
}

/// Load the attendance records. Rows whose `applied` column is truthy
/// (`1`, `true`, `yes`, `y`) go into the applied set.
pub fn load_identifiers_csv(
    csv_data: &str,
    config: &IdentifierInput,
) -> Result<LoadedIdentifiers, ReconError> {
    let input = config.file.as_str();
    let mut table = CsvTable::open(csv_data)?;
    let col = &config.columns;

    let id_idx = table.require(input, &col.record_id)?;
    let text_idx = table.require(input, &col.text)?;
    let applied_idx = match col.applied {
        Some(ref name) => Some(table.require(input, name)?),
        None => None,
    };

    let mut seen = HashSet::new();
    let mut loaded = LoadedIdentifiers::default();

    for record in table.reader.records() {
        let record = record?;
        let record_id = parse_id(input, &record, id_idx)?;
        if !seen.insert(record_id) {
            return Err(ReconError::DuplicateId {
                input: input.into(),
                id: record_id,
            });
        }
        if applied_idx.map_or(false, |i| is_truthy(record.get(i).unwrap_or(""))) {
            loaded.applied.insert(record_id);
        }
        loaded.identifiers.push(RawIdentifier::new(
            record_id,
            record.get(text_idx).unwrap_or(""),
        ));
    }

    Ok(loaded)
}
