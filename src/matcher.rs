//! ZIP code normalization and lookup
//!
//! Sheets often store ZIP codes as numbers, so `02134` arrives as `2134`.
//! Both sides of a comparison are brought to a canonical key: trimmed, then
//! left-padded with zeros to five characters. Longer keys are kept verbatim.

use crate::models::ServiceAreaRecord;

pub const ZIP_LENGTH: usize = 5;

/// Canonical key for a ZIP code.
///
/// Only leading/trailing whitespace is removed; `"021 34"` stays as is.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len >= ZIP_LENGTH {
        return trimmed.to_string();
    }
    let mut key = "0".repeat(ZIP_LENGTH - len);
    key.push_str(trimmed);
    key
}

/// First record, in dataset order, whose ZIP normalizes to the query's key.
///
/// Records without a ZIP never match, not even the empty query.
pub fn find<'a>(dataset: &'a [ServiceAreaRecord], query: &str) -> Option<&'a ServiceAreaRecord> {
    let key = normalize(query);
    dataset
        .iter()
        .find(|record| record.zip().is_some_and(|zip| normalize(zip) == key))
}
