use std::collections::HashSet;

use super::Dimension;

/// Incoming slice of a record. Every event shape is translated into one of
/// these before it reaches the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecord {
    pub resize_from: Option<Dimension>,
    pub resize_to: Option<Dimension>,
    pub copy_paste_fields: HashSet<String>,
    pub form_completion_time_secs: u64,
}

impl PartialRecord {
    pub fn resize(from: Dimension, to: Dimension) -> Self {
        Self {
            resize_from: Some(from),
            resize_to: Some(to),
            ..Self::default()
        }
    }

    pub fn copy_paste<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            copy_paste_fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn form_completion(secs: u64) -> Self {
        Self {
            form_completion_time_secs: secs,
            ..Self::default()
        }
    }

    /// Both resize ends, only when all four dimensions are present.
    pub fn complete_resize(&self) -> Option<(&Dimension, &Dimension)> {
        match (&self.resize_from, &self.resize_to) {
            (Some(from), Some(to)) if from.is_complete() && to.is_complete() => Some((from, to)),
            _ => None,
        }
    }
}
