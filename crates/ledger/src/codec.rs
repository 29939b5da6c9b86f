//! The ledger document and its byte representation.
//!
//! A ledger is one JSON object mapping patient identifiers to arrays of
//! entry objects. Each array is kept sorted by `date` using plain string
//! comparison, which matches chronological order for `YYYY-MM-DD` dates.
//!
//! Entries already in the document are carried through an append untouched:
//! fields this crate does not know about survive, and `enteredAt` keeps its
//! stored text. Only the entry being appended is built from a [`ClaimEntry`].
//!
//! Missing or empty content decodes to an empty ledger. Anything that is not
//! a JSON object of entry arrays is reported as [`CodecError`] and never
//! repaired.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::claim::ClaimEntry;

/// Reasons a document cannot be decoded or encoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The content is not valid JSON (or not UTF-8).
    #[error("document is not valid JSON: {0}")]
    InvalidJson(String),

    /// The content is JSON, but not an object.
    #[error("document root must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// A patient value is not an array of entry objects with a `date`.
    #[error("entries for patient '{patient}' are malformed: {message}")]
    MalformedEntries {
        /// Ledger key holding the bad value.
        patient: String,
        /// What was wrong with it.
        message: String,
    },

    /// The ledger could not be serialized.
    #[error("failed to encode ledger: {0}")]
    Encode(String),
}

/// One entry object as it appears in the document.
///
/// Every field is kept verbatim, key order included.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StoredEntry {
    fields: Map<String, Value>,
}

impl StoredEntry {
    /// Builds the stored form of a freshly normalized entry.
    pub fn from_claim(entry: &ClaimEntry) -> Result<Self, CodecError> {
        match serde_json::to_value(entry) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(CodecError::Encode(format!(
                "claim entry serialized to {}",
                json_kind(&other)
            ))),
            Err(e) => Err(CodecError::Encode(e.to_string())),
        }
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(fields) = value else {
            return Err(format!("expected an entry object, found {}", json_kind(&value)));
        };
        match fields.get("date") {
            Some(Value::String(_)) => Ok(Self { fields }),
            Some(other) => Err(format!("`date` must be a string, found {}", json_kind(other))),
            None => Err("entry has no `date`".to_string()),
        }
    }

    /// The service date the entry is ordered by.
    pub fn date(&self) -> &str {
        self.fields
            .get("date")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns a field by its stored name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a string field by its stored name.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }
}

/// Per-patient claim entries, each list sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    patients: BTreeMap<String, Vec<StoredEntry>>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entries filed under `patient`, oldest first.
    pub fn entries(&self, patient: &str) -> &[StoredEntry] {
        self.patients
            .get(patient)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the number of patients in the ledger.
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    /// Returns true if the ledger has no patients.
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Appends an entry and restores date order for that patient.
    ///
    /// The sort is stable, so the new entry lands after any existing entries
    /// with the same date.
    pub fn append(&mut self, patient: &str, entry: StoredEntry) {
        let entries = self.patients.entry(patient.to_string()).or_default();
        entries.push(entry);
        entries.sort_by(|a, b| a.date().cmp(b.date()));
    }

    /// Returns true if an identical entry is already filed under `patient`.
    pub fn contains(&self, patient: &str, entry: &StoredEntry) -> bool {
        self.entries(patient)
            .iter()
            .filter(|existing| existing.date() == entry.date())
            .any(|existing| existing == entry)
    }
}

/// Decodes document bytes into a [`Ledger`].
///
/// `None`, empty, and whitespace-only content all decode to an empty ledger.
pub fn decode(bytes: Option<&[u8]>) -> Result<Ledger, CodecError> {
    let Some(bytes) = bytes else {
        return Ok(Ledger::new());
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Ledger::new());
    }

    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| CodecError::InvalidJson(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(CodecError::NotAnObject(json_kind(&value)));
    };

    let mut patients = BTreeMap::new();
    for (patient, entries) in object {
        let malformed = |message: String| CodecError::MalformedEntries {
            patient: patient.clone(),
            message,
        };
        let Value::Array(items) = entries else {
            return Err(malformed(format!("expected an array, found {}", json_kind(&entries))));
        };
        let entries = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                StoredEntry::from_value(item).map_err(|m| malformed(format!("entry {i}: {m}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        patients.insert(patient, entries);
    }

    Ok(Ledger { patients })
}

/// Encodes a [`Ledger`] as pretty-printed JSON.
pub fn encode(ledger: &Ledger) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec_pretty(ledger).map_err(|e| CodecError::Encode(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
