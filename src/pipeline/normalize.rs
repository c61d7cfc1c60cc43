//! Row normalization: tag each record with the window it was requested for.

use serde_json::Value;

use crate::domain::{DateWindow, Record};

pub const DATE_FROM_FIELD: &str = "date_from";
pub const DATE_TO_FIELD: &str = "date_to";

/// Set `date_from` / `date_to` on every record to the strings sent to the API.
///
/// New keys land at the end of each record; a key the API already sent keeps
/// its position and gets overwritten.
pub fn attach_window(records: &mut [Record], window: &DateWindow) {
    let from = window.from_wire();
    let to = window.to_wire();
    for record in records.iter_mut() {
        record.insert(DATE_FROM_FIELD.to_string(), Value::String(from.clone()));
        record.insert(DATE_TO_FIELD.to_string(), Value::String(to.clone()));
    }
}
