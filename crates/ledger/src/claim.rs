//! Claim submissions and the entries they normalize into.
//!
//! A [`RawClaim`] is the typed form of an inbound submission. Each field is
//! either absent or a JSON scalar ([`ClaimValue`]); any other JSON shape is
//! rejected when the submission is constructed. [`RawClaim::normalize`] then
//! applies the canonicalization rules and stamps the entry with the time of
//! normalization:
//!
//! | Field | Rule |
//! |-------|------|
//! | `patient` | trimmed, required |
//! | `date` | trimmed, required |
//! | `code` | trimmed, required, left-padded with `0` to three characters |
//! | `tooth` | non-empty list kept in order as strings, otherwise `null` |
//! | `fund` | string if truthy, otherwise `null` |
//! | `notes` | string if truthy, otherwise `""` |

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::ValidationError;

/// Width that claim codes are zero-padded to.
pub const CODE_WIDTH: usize = 3;

/// A scalar JSON value accepted in a claim field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    /// A JSON string.
    Text(String),
    /// A JSON number.
    Number(Number),
    /// A JSON boolean.
    Flag(bool),
}

impl ClaimValue {
    /// Returns false for the empty string, zero, and `false`.
    pub fn is_truthy(&self) -> bool {
        match self {
            ClaimValue::Text(s) => !s.is_empty(),
            ClaimValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            ClaimValue::Flag(b) => *b,
        }
    }

    /// Converts the value to its string form.
    ///
    /// Floats with no fractional part render without one, so `1.0` becomes
    /// `"1"`.
    pub fn into_text(self) -> String {
        match self {
            ClaimValue::Text(s) => s,
            ClaimValue::Number(n) => number_text(&n),
            ClaimValue::Flag(b) => b.to_string(),
        }
    }

    fn from_field(field: &'static str, value: Value) -> Result<Option<Self>, ValidationError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(ClaimValue::Text(s))),
            Value::Number(n) => Ok(Some(ClaimValue::Number(n))),
            Value::Bool(b) => Ok(Some(ClaimValue::Flag(b))),
            Value::Array(_) | Value::Object(_) => Err(ValidationError::InvalidShape {
                field,
                message: "expected a string, number, or boolean".to_string(),
            }),
        }
    }
}

fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        // f64's Display never emits a trailing `.0`
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::Text(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::Text(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Number(value.into())
    }
}

/// A claim submission as received, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct RawClaim {
    /// Patient identifier.
    pub patient: Option<ClaimValue>,
    /// Service date, expected as `YYYY-MM-DD`.
    pub date: Option<ClaimValue>,
    /// Item code.
    pub code: Option<ClaimValue>,
    /// Tooth identifiers, in submission order.
    pub tooth: Option<Vec<ClaimValue>>,
    /// Health fund the claim was lodged with.
    pub fund: Option<ClaimValue>,
    /// Free-text notes.
    pub notes: Option<ClaimValue>,
}

impl TryFrom<Value> for RawClaim {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = value else {
            return Err(ValidationError::InvalidShape {
                field: "claim",
                message: "expected an object".to_string(),
            });
        };

        Ok(Self {
            patient: take_scalar(&mut fields, "patient")?,
            date: take_scalar(&mut fields, "date")?,
            code: take_scalar(&mut fields, "code")?,
            tooth: take_tooth(&mut fields)?,
            fund: take_scalar(&mut fields, "fund")?,
            notes: take_scalar(&mut fields, "notes")?,
        })
    }
}

fn take_scalar(
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<ClaimValue>, ValidationError> {
    match fields.remove(field) {
        Some(value) => ClaimValue::from_field(field, value),
        None => Ok(None),
    }
}

// Scalars are accepted and dropped; only a list carries tooth identifiers.
fn take_tooth(fields: &mut Map<String, Value>) -> Result<Option<Vec<ClaimValue>>, ValidationError> {
    match fields.remove("tooth") {
        Some(Value::Array(items)) => {
            let mut teeth = Vec::with_capacity(items.len());
            for item in items {
                match ClaimValue::from_field("tooth", item)? {
                    Some(value) => teeth.push(value),
                    None => {
                        return Err(ValidationError::InvalidShape {
                            field: "tooth",
                            message: "tooth identifiers must not be null".to_string(),
                        });
                    }
                }
            }
            Ok(Some(teeth))
        }
        Some(Value::Object(_)) => Err(ValidationError::InvalidShape {
            field: "tooth",
            message: "expected a list of tooth identifiers".to_string(),
        }),
        Some(_) | None => Ok(None),
    }
}

impl RawClaim {
    /// Normalizes the claim, stamping it with the current time.
    pub fn normalize(self) -> Result<NormalizedClaim, ValidationError> {
        self.normalize_at(Utc::now())
    }

    /// Normalizes the claim, stamping it with `now`.
    ///
    /// The timestamp is truncated to millisecond precision so that the entry
    /// survives an encode/decode cycle unchanged.
    pub fn normalize_at(self, now: DateTime<Utc>) -> Result<NormalizedClaim, ValidationError> {
        let patient = required_text(self.patient, "patient")?;
        let date = required_text(self.date, "date")?;
        let code = pad_code(&required_text(self.code, "code")?);

        let tooth = self
            .tooth
            .filter(|teeth| !teeth.is_empty())
            .map(|teeth| teeth.into_iter().map(ClaimValue::into_text).collect());

        let fund = self
            .fund
            .filter(ClaimValue::is_truthy)
            .map(ClaimValue::into_text);

        let notes = self
            .notes
            .filter(ClaimValue::is_truthy)
            .map(ClaimValue::into_text)
            .unwrap_or_default();

        Ok(NormalizedClaim {
            patient,
            entry: ClaimEntry {
                date,
                code,
                tooth,
                fund,
                notes,
                entered_at: now.trunc_subsecs(3),
            },
        })
    }
}

fn required_text(
    value: Option<ClaimValue>,
    field: &'static str,
) -> Result<String, ValidationError> {
    let text = value
        .filter(ClaimValue::is_truthy)
        .map(ClaimValue::into_text)
        .unwrap_or_default();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Left-pads a code with `0` to [`CODE_WIDTH`] characters.
///
/// Codes already at or beyond the width are returned unchanged.
pub fn pad_code(code: &str) -> String {
    format!("{:0>width$}", code, width = CODE_WIDTH)
}

/// A claim that passed validation, ready to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedClaim {
    /// Ledger key the entry is filed under.
    pub patient: String,
    /// The entry to append.
    pub entry: ClaimEntry,
}

impl NormalizedClaim {
    /// Commit message recorded alongside the write.
    pub fn commit_message(&self) -> String {
        format!(
            "Add claim: {} #{} {}",
            self.patient, self.entry.code, self.entry.date
        )
    }
}

/// A claim line in the shape it is first written to a patient's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEntry {
    /// Service date.
    pub date: String,
    /// Zero-padded item code.
    pub code: String,
    /// Tooth identifiers, or `None` when the claim is not tooth-specific.
    #[serde(default)]
    pub tooth: Option<Vec<String>>,
    /// Health fund, if any.
    #[serde(default)]
    pub fund: Option<String>,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
    /// When the entry was normalized. Never changes after creation.
    #[serde(with = "millis_timestamp")]
    pub entered_at: DateTime<Utc>,
}

mod millis_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| D::Error::custom(format!("invalid enteredAt '{raw}': {e}")))
    }
}
