//! Boundary normalization of analytics payloads.
//!
//! The backend has shipped several shapes of the same record: `subject` or
//! `topic` for the label, `count` or `_count` (sometimes `{ "_all": n }`)
//! for the tally, and string or numeric ids. Everything is folded into
//! [`SubjectCountRecord`] here so the aggregator only ever sees one shape.

use crate::models::{AssessmentKind, GranularRecords, SubjectCountRecord};
use serde_json::Value;
use tracing::debug;

const LABEL_KEYS: &[&str] = &["subject", "topic"];
const COUNT_KEYS: &[&str] = &["count", "_count"];

/// Keys of each granularity, most specific spelling first.
const SCHOOL_KEYS: &[&str] = &["bySchoolSubject", "bySchool"];
const CLASS_KEYS: &[&str] = &["byClassSubject", "byClass"];
const SECTION_KEYS: &[&str] = &["bySectionSubject", "bySection"];

/// Normalize a single raw record. Returns `None` for non-object values.
pub fn normalize_record(value: &Value) -> Option<SubjectCountRecord> {
    let object = value.as_object()?;

    let subject = LABEL_KEYS
        .iter()
        .find_map(|k| object.get(*k).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    let count = COUNT_KEYS
        .iter()
        .find_map(|k| object.get(*k))
        .map(count_value)
        .unwrap_or(0);

    Some(SubjectCountRecord {
        subject,
        count,
        standard_id: string_field(object.get("standardId")),
        standard_name: string_field(object.get("standardName")),
        section_id: string_field(object.get("sectionId")),
        section_name: string_field(object.get("sectionName")),
    })
}

/// Normalize an optional JSON array of records. Anything else yields nothing.
pub fn normalize_records(value: Option<&Value>) -> Vec<SubjectCountRecord> {
    match value.and_then(Value::as_array) {
        Some(items) => items.iter().filter_map(normalize_record).collect(),
        None => Vec::new(),
    }
}

/// Extract every granularity of one assessment kind from an `assigned`
/// payload.
///
/// Projects are only reported per class and per section; their school-wide
/// view is the class rows taken together.
pub fn granular_records(assigned: &Value, kind: AssessmentKind) -> GranularRecords {
    let section = match assigned.get(kind.payload_key()) {
        Some(section) => section,
        None => {
            debug!("No {} section in analytics payload", kind.payload_key());
            return GranularRecords::default();
        }
    };

    let by_class = normalize_records(first_present(section, CLASS_KEYS));
    let by_section = normalize_records(first_present(section, SECTION_KEYS));
    let by_school = match first_present(section, SCHOOL_KEYS) {
        Some(value) => normalize_records(Some(value)),
        None => by_class.clone(),
    };

    GranularRecords {
        by_school,
        by_class,
        by_section,
    }
}

fn first_present<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| object.get(*k))
}

fn count_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if n.as_u64().is_some() {
                i64::MAX
            } else {
                // JSON numbers are always finite
                n.as_f64().map(|f| f as i64).unwrap_or(0)
            }
        }
        Value::Object(inner) => inner.get("_all").map(count_value).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or_else(|_| {
            debug!("Non-numeric count {:?}, treating as 0", s);
            0
        }),
        other => {
            debug!("Unexpected count value {}, treating as 0", other);
            0
        }
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
