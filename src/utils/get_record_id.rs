use surrealdb::RecordId;

use crate::errors::{Error, Result};

/// Parses `table:key` (optionally with the `⟨key⟩` escaping SurrealDB
/// applies on display) or a bare key into a record of `table`.
pub fn get_record_id_from_string(table: &str, val: &str) -> Result<RecordId> {
    let val = val.trim();
    let key = match val.split_once(':') {
        Some((prefix, key)) if prefix == table => key,
        Some(_) => return Err(Error::InvalidRecordId(val.to_string())),
        None => val,
    };
    let key = key.trim_start_matches('⟨').trim_end_matches('⟩');
    if key.is_empty() {
        return Err(Error::InvalidRecordId(val.to_string()));
    }
    Ok(RecordId::from_table_key(table, key))
}

/// Display form without SurrealDB's `⟨⟩` escaping, as accepted by
/// [`get_record_id_from_string`].
pub fn record_id_to_string(id: &RecordId) -> String {
    id.to_string().replace(['⟨', '⟩'], "")
}

/// Key part of `id`, unescaped.
pub fn record_key(id: &RecordId) -> String {
    let display = record_id_to_string(id);
    match display.split_once(':') {
        Some((_, key)) => key.to_string(),
        None => display,
    }
}
