//! Forward migration of stored history documents.
//!
//! Migrations operate on the raw JSON value before it is bound to [`History`], so older
//! layouts never have to deserialize into the current struct. Each step upgrades exactly
//! one version and must accept every document the previous version could have written.
//!
//! [`History`]: crate::model::History

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::model::{elapsed_secs, HISTORY_VERSION};

pub type MigrationStep = fn(Value) -> Value;

/// Registered upgrades, keyed by the version they upgrade from.
pub const MIGRATIONS: &[(u32, MigrationStep)] = &[(0, upgrade_v0_to_v1)];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MigrationError {
    #[error("History document is not an object")]
    NotAnObject,

    #[error("History version field is not a non-negative integer")]
    InvalidVersion,

    #[error("History version {0} is newer than this build supports")]
    FromFuture(u32),

    #[error("No migration registered from version {0}")]
    MissingStep(u32),
}

/// Version recorded in a stored document. Documents written before versioning have none
/// and count as version 0.
pub fn stored_version(doc: &Value) -> Result<u32, MigrationError> {
    let obj = doc.as_object().ok_or(MigrationError::NotAnObject)?;
    match obj.get("version") {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(MigrationError::InvalidVersion),
    }
}

/// Run the migration chain until `doc` is at [`HISTORY_VERSION`].
///
/// A document already at the current version is returned untouched.
pub fn migrate(mut doc: Value) -> Result<Value, MigrationError> {
    let mut version = stored_version(&doc)?;
    if version > HISTORY_VERSION {
        return Err(MigrationError::FromFuture(version));
    }
    while version < HISTORY_VERSION {
        let (_, step) = MIGRATIONS
            .iter()
            .find(|(from, _)| *from == version)
            .ok_or(MigrationError::MissingStep(version))?;
        doc = step(doc);
        version += 1;
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("version".to_string(), json!(version));
        }
    }
    Ok(doc)
}

/// v0 → v1: the unversioned layout had the same fields but wrote them lazily.
///
/// Missing `lastUpdated` becomes 0 and missing `attempts` becomes empty. Per attempt,
/// missing `finished`/`perfect` default to false, `perfect` is dropped on unfinished
/// attempts, missing `score` becomes 0 and a missing `duration` is recomputed from
/// `started`/`ended` (0.0 when the attempt never ended).
fn upgrade_v0_to_v1(mut doc: Value) -> Value {
    let Some(obj) = doc.as_object_mut() else {
        return doc;
    };
    obj.entry("lastUpdated").or_insert(json!(0));
    let attempts = obj
        .entry("attempts")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !attempts.is_array() {
        *attempts = Value::Array(Vec::new());
    }
    if let Some(list) = attempts.as_array_mut() {
        for attempt in list.iter_mut().filter_map(Value::as_object_mut) {
            upgrade_attempt_v0(attempt);
        }
    }
    doc
}

fn upgrade_attempt_v0(attempt: &mut Map<String, Value>) {
    attempt.entry("ended").or_insert(Value::Null);
    attempt.entry("score").or_insert(json!(0));
    let finished = attempt
        .get("finished")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let perfect = attempt
        .get("perfect")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    attempt.insert("finished".to_string(), json!(finished));
    attempt.insert("perfect".to_string(), json!(finished && perfect));

    if !attempt.get("duration").is_some_and(Value::is_number) {
        let started = attempt.get("started").and_then(Value::as_u64);
        let ended = attempt.get("ended").and_then(Value::as_u64);
        let duration = match (started, ended) {
            (Some(s), Some(e)) => elapsed_secs(s, e),
            _ => 0.0,
        };
        attempt.insert("duration".to_string(), json!(duration));
    }
}
