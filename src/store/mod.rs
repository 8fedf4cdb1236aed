//! In-memory record store keyed by `(website URL, session id)`.
//!
//! All operations take the single store lock for their whole duration and do
//! no I/O while holding it. Merges against the same key are therefore
//! serialized and no reader ever observes a half-applied merge.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};

use crate::{
    error::{Error, Result},
    models::{PartialRecord, Record, Resize, SessionKey},
};

#[derive(Default)]
pub struct KeyedStore {
    records: Mutex<HashMap<SessionKey, Record>>,
}

impl KeyedStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionKey, Record>> {
        // Every mutation completes before the guard drops, so a poisoned map is still consistent.
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Snapshot of the record at the key, if any.
    pub fn get(&self, website_url: &str, session_id: &str) -> Option<Record> {
        self.lock()
            .get(&SessionKey::new(website_url, session_id))
            .cloned()
    }

    pub fn contains(&self, website_url: &str, session_id: &str) -> bool {
        self.lock()
            .contains_key(&SessionKey::new(website_url, session_id))
    }

    /// Inserts a bare record, replacing whatever was stored at the key.
    pub fn create(&self, website_url: &str, session_id: &str) -> Record {
        let record = Record::new(website_url, session_id, Utc::now());
        self.lock().insert(record.key(), record.clone());
        record
    }

    /// Like [`KeyedStore::create`] but refuses to replace an existing record.
    pub fn create_new(&self, website_url: &str, session_id: &str) -> Result<Record> {
        let mut records = self.lock();
        let key = SessionKey::new(website_url, session_id);
        if records.contains_key(&key) {
            return Err(Error::already_exists(website_url, session_id));
        }

        let record = Record::new(website_url, session_id, Utc::now());
        records.insert(key, record.clone());
        Ok(record)
    }

    /// Folds `partial` into the stored record without overwriting data it already holds:
    ///
    /// - the resize pair is taken only if the record has none and `partial` has both ends complete
    /// - form completion time is taken only if the record still has zero and the new value is positive
    /// - copy/paste field ids are unioned in
    ///
    /// Returns the record as it is stored after the merge. A missing `partial`
    /// is rejected before the key is looked up.
    pub fn merge(
        &self,
        website_url: &str,
        session_id: &str,
        partial: Option<&PartialRecord>,
    ) -> Result<Record> {
        let partial = partial
            .ok_or_else(|| Error::InvalidArgument("missing partial record".to_string()))?;

        let mut records = self.lock();
        let record = records
            .get_mut(&SessionKey::new(website_url, session_id))
            .ok_or_else(|| Error::not_found(website_url, session_id))?;

        if record.resize.is_none() {
            if let Some((from, to)) = partial.complete_resize() {
                record.resize = Some(Resize {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        if record.form_completion_time_secs == 0 && partial.form_completion_time_secs > 0 {
            record.form_completion_time_secs = partial.form_completion_time_secs;
        }

        for field in &partial.copy_paste_fields {
            if !record.copy_paste_fields.contains(field) {
                record.copy_paste_fields.insert(field.clone());
            }
        }

        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    pub fn remove(&self, website_url: &str, session_id: &str) -> Option<Record> {
        self.lock()
            .remove(&SessionKey::new(website_url, session_id))
    }

    /// Drops every record not touched since `cutoff` and hands them back.
    pub fn evict_idle(&self, cutoff: DateTime<Utc>) -> Vec<Record> {
        let mut records = self.lock();
        let stale: Vec<SessionKey> = records
            .iter()
            .filter(|(_, record)| record.updated_at < cutoff)
            .map(|(key, _)| key.clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|key| records.remove(&key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
