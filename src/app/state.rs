use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;
use serde::Deserialize;

use crate::{
    error::UserError,
    store::entities::{total_time, StudyRecord},
};

/// Identifier handed out to every record held locally. It's stable for the lifetime of the
/// [AppState] and is what the UI uses to point at a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('#');
        s.parse::<u64>()
            .map(EntryId)
            .map_err(|e| anyhow!("Can't parse {s} into an entry id: {e}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    pub record: StudyRecord,
}

/// What happens to the total when records are deleted. Keeping it matches how the application
/// always behaved, subtracting keeps the total equal to the sum of the listed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalOnDelete {
    #[default]
    Keep,
    Subtract,
}

/// Raw contents of the two form inputs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormState {
    pub study: String,
    pub study_time: String,
}

/// Mutation produced by an operation once it's finished.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    /// Records were fetched. Replaces everything held locally.
    Loaded(Vec<StudyRecord>),
    /// Record was accepted by the store.
    Registered(StudyRecord),
    /// Store removed every record matching this one.
    Deleted(StudyRecord),
    Failed(UserError),
    ClearError,
}

/// Everything the view needs to render. Only [AppState::apply] mutates records, total and error.
#[derive(Debug, Default, Clone)]
pub struct AppState {
    pub form: FormState,
    entries: Vec<Entry>,
    total: f64,
    error: Option<UserError>,
    next_id: u64,
    total_on_delete: TotalOnDelete,
}

impl AppState {
    pub fn new(total_on_delete: TotalOnDelete) -> Self {
        Self {
            total_on_delete,
            ..Default::default()
        }
    }

    /// Held records, newest registrations first.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|v| v.id == id)
    }

    pub fn records(&self) -> impl Iterator<Item = &StudyRecord> {
        self.entries.iter().map(|v| &v.record)
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn error(&self) -> Option<&UserError> {
        self.error.as_ref()
    }

    pub fn total_on_delete(&self) -> TotalOnDelete {
        self.total_on_delete
    }

    pub fn apply(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::Loaded(records) => {
                self.total = total_time(&records);
                let entries = records.into_iter().map(|v| self.allocate(v)).collect();
                self.entries = entries;
                self.error = None;
            }
            StateDelta::Registered(record) => {
                self.total += record.time;
                let entry = self.allocate(record);
                self.entries.insert(0, entry);
                self.form = FormState::default();
                self.error = None;
            }
            StateDelta::Deleted(target) => {
                let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
                    .into_iter()
                    .partition(|v| v.record.matches(&target.title, target.time));
                self.entries = kept;
                if self.total_on_delete == TotalOnDelete::Subtract {
                    self.total -= total_time(removed.iter().map(|v| &v.record));
                }
                self.error = None;
            }
            StateDelta::Failed(error) => self.error = Some(error),
            StateDelta::ClearError => self.error = None,
        }
    }

    fn allocate(&mut self, record: StudyRecord) -> Entry {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        Entry { id, record }
    }
}
