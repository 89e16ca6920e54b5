//! # Groupers
//!
//! A grouper maps a record to its [`GroupKey`]. It must be pure: the same
//! record always yields the same key, so retried batches regroup exactly as
//! they did the first time.

use crate::record::{GroupKey, Record};

/// Derives the group key of a record
pub trait Grouper: Send + Sync {
    /// Group key for `record`
    fn key_for(&self, record: &Record) -> GroupKey;
}

impl<F> Grouper for F
where
    F: Fn(&Record) -> GroupKey + Send + Sync,
{
    fn key_for(&self, record: &Record) -> GroupKey {
        self(record)
    }
}

/// Puts every record in the same group
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGrouper;

impl Grouper for NoGrouper {
    fn key_for(&self, _record: &Record) -> GroupKey {
        GroupKey::default()
    }
}

/// Groups records by the values of a list of fields.
///
/// A missing or null field yields a missing key component, which never
/// matches a record carrying a real value.
#[derive(Debug, Clone)]
pub struct FieldGrouper {
    fields: Vec<String>,
}

impl FieldGrouper {
    /// Group by `fields`, in order
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl Grouper for FieldGrouper {
    fn key_for(&self, record: &Record) -> GroupKey {
        GroupKey::from_components(self.fields.iter().map(|field| match record.get(field) {
            None | Some(serde_json::Value::Null) => None,
            Some(_) => Some(record.field_text(field)),
        }))
    }
}

/// Build the grouper for a list of fields; no fields means no grouping
pub fn grouper_for_fields(fields: &[String]) -> Box<dyn Grouper> {
    if fields.is_empty() {
        Box::new(NoGrouper)
    } else {
        Box::new(FieldGrouper::new(fields.iter().cloned()))
    }
}
