use serde_json::Value;

use crate::listing::LoadError;
use crate::types::Record;

/// Records extracted from one page payload.
#[derive(Debug, Clone)]
pub struct Normalized<R> {
    pub records: Vec<R>,
    pub success: bool,
}

impl<R> Normalized<R> {
    fn rejected() -> Self {
        Self {
            records: Vec::new(),
            success: false,
        }
    }

    pub fn into_result(self) -> Result<Vec<R>, LoadError> {
        if self.success {
            Ok(self.records)
        } else {
            Err(LoadError::MalformedResponse(
                "unrecognized page payload".to_string(),
            ))
        }
    }
}

/// Locate the record array inside a payload.
///
/// Shapes are tried in order: the payload itself, its `data` field, then
/// the wrapper field named by the record type.
fn record_array(payload: Value, wrapper: &str) -> Option<Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("data") {
                return Some(items);
            }
            match map.remove(wrapper) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Turn a raw page payload into an ordered list of records.
///
/// A page with any undecodable element is rejected as a whole so the
/// short-page end-of-data check never sees a truncated count.
pub fn normalize<R: Record>(payload: Value) -> Normalized<R> {
    let Some(items) = record_array(payload, R::WRAPPER) else {
        return Normalized::rejected();
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<R>(item) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(index, error = %err, "dropping page with undecodable record");
                return Normalized::rejected();
            }
        }
    }

    Normalized {
        records,
        success: true,
    }
}
