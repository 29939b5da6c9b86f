//! Test fixtures for ledger tests.

use clinicflow_ledger::claim::{ClaimValue, RawClaim};
use clinicflow_ledger::codec::{self, Ledger};
use clinicflow_ledger::store::MemoryContentsStore;
use clinicflow_ledger::types::DocumentLocation;

/// The ledger document used by most tests.
pub fn location() -> DocumentLocation {
    DocumentLocation::parse("clinic/records", "data/claims.json").expect("valid location")
}

/// A minimal valid claim.
pub fn claim(patient: &str, date: &str, code: &str) -> RawClaim {
    RawClaim {
        patient: Some(ClaimValue::from(patient)),
        date: Some(ClaimValue::from(date)),
        code: Some(ClaimValue::from(code)),
        ..Default::default()
    }
}

/// Decodes whatever the memory store holds at `location`.
pub fn stored_ledger(store: &MemoryContentsStore, location: &DocumentLocation) -> Ledger {
    codec::decode(store.contents(location).as_deref()).expect("stored ledger decodes")
}

/// Dates filed under `patient`, in stored order.
pub fn dates(ledger: &Ledger, patient: &str) -> Vec<String> {
    ledger
        .entries(patient)
        .iter()
        .map(|e| e.date().to_string())
        .collect()
}
