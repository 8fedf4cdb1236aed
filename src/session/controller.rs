use std::{sync::Arc, time::Duration};

use chrono::Utc;

use crate::{
    error::{Error, Result},
    models::{PartialRecord, Record},
    store::KeyedStore,
};

use super::SessionIdAllocator;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Ties the allocator and the store together for the session lifecycle.
///
/// Both handles are injected, so every collaborator that holds a clone works
/// against the same two instances.
#[derive(Clone)]
pub struct SessionController {
    store: Arc<KeyedStore>,
    allocator: Arc<SessionIdAllocator>,
}

impl SessionController {
    pub fn new(store: Arc<KeyedStore>, allocator: Arc<SessionIdAllocator>) -> Self {
        Self { store, allocator }
    }

    pub fn store(&self) -> &KeyedStore {
        &self.store
    }

    pub fn allocator(&self) -> &SessionIdAllocator {
        &self.allocator
    }

    /// Reserves a session id and creates the bare record for it.
    pub fn start_session(&self, website_url: &str) -> Result<Record> {
        let session_id = self.allocator.allocate()?;

        match self.store.create_new(website_url, &session_id) {
            Ok(record) => {
                log_debug!("session {} started for {}", session_id, website_url);
                Ok(record)
            }
            Err(err) => {
                // The id stays reserved: the record already stored under it still owns it.
                log_warn!("refusing to replace live record: {}", err);
                Err(err)
            }
        }
    }

    pub fn contains(&self, website_url: &str, session_id: &str) -> bool {
        self.store.contains(website_url, session_id)
    }

    pub fn get(&self, website_url: &str, session_id: &str) -> Option<Record> {
        self.store.get(website_url, session_id)
    }

    pub fn apply(
        &self,
        website_url: &str,
        session_id: &str,
        partial: &PartialRecord,
    ) -> Result<Record> {
        self.store.merge(website_url, session_id, Some(partial))
    }

    /// Removes the record and frees its id, returning the final record.
    pub fn end_session(&self, website_url: &str, session_id: &str) -> Result<Record> {
        let record = self
            .store
            .remove(website_url, session_id)
            .ok_or_else(|| Error::not_found(website_url, session_id))?;
        self.allocator.release(session_id);
        log_debug!("session {} ended for {}", session_id, website_url);
        Ok(record)
    }

    /// Ends every session that has seen no merge for `ttl`.
    pub fn evict_idle(&self, ttl: Duration) -> Vec<Record> {
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return Vec::new();
        };

        let evicted = self.store.evict_idle(cutoff);
        for record in &evicted {
            self.allocator.release(&record.session_id);
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dimension;

    const URL: &str = "https://www.website1.com";

    fn controller() -> SessionController {
        SessionController::new(
            Arc::new(KeyedStore::new()),
            Arc::new(SessionIdAllocator::default()),
        )
    }

    #[test]
    fn start_session_reserves_id_and_creates_record() {
        let controller = controller();
        let record = controller.start_session(URL).unwrap();

        assert!(controller.allocator().is_in_use(&record.session_id));
        assert!(controller.contains(URL, &record.session_id));
        assert_eq!(controller.get(URL, &record.session_id).unwrap(), record);
    }

    #[test]
    fn start_session_surfaces_key_conflicts() {
        let controller = SessionController::new(
            Arc::new(KeyedStore::new()),
            Arc::new(SessionIdAllocator::default().with_id_space(0)),
        );
        // A record left behind under the only id while the id itself was freed.
        controller.store().create(URL, "0");

        let err = controller.start_session(URL).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert!(controller.allocator().is_in_use("0"));
    }

    #[test]
    fn start_session_propagates_allocation_timeout() {
        let controller = SessionController::new(
            Arc::new(KeyedStore::new()),
            Arc::new(SessionIdAllocator::new(Duration::from_millis(50)).with_id_space(0)),
        );
        controller.start_session(URL).unwrap();

        let err = controller.start_session("https://other.com").unwrap_err();
        assert!(matches!(err, Error::AllocationTimeout(_)));
        assert_eq!(controller.store().len(), 1);
    }

    #[test]
    fn apply_merges_into_live_session() {
        let controller = controller();
        let record = controller.start_session(URL).unwrap();

        let partial =
            PartialRecord::resize(Dimension::new("100", "200"), Dimension::new("101", "201"));
        let merged = controller.apply(URL, &record.session_id, &partial).unwrap();
        assert!(merged.resize.is_some());

        let err = controller.apply(URL, "missing", &partial).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn end_session_removes_record_and_releases_id() {
        let controller = controller();
        let record = controller.start_session(URL).unwrap();
        controller
            .apply(URL, &record.session_id, &PartialRecord::form_completion(12))
            .unwrap();

        let ended = controller.end_session(URL, &record.session_id).unwrap();
        assert_eq!(ended.form_completion_time_secs, 12);
        assert!(!controller.contains(URL, &record.session_id));
        assert!(!controller.allocator().is_in_use(&record.session_id));

        let err = controller.end_session(URL, &record.session_id).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn evict_idle_releases_ids() {
        let controller = controller();
        let record = controller.start_session(URL).unwrap();

        assert!(controller.evict_idle(Duration::from_secs(3600)).is_empty());

        std::thread::sleep(Duration::from_millis(5));
        let evicted = controller.evict_idle(Duration::ZERO);
        assert_eq!(evicted.len(), 1);
        assert!(!controller.allocator().is_in_use(&record.session_id));
        assert!(controller.store().is_empty());
    }

    #[test]
    fn merged_sessions_survive_idle_eviction() {
        let controller = controller();
        let idle = controller.start_session(URL).unwrap();
        let active = controller.start_session(URL).unwrap();

        std::thread::sleep(Duration::from_millis(60));
        controller
            .apply(URL, &active.session_id, &PartialRecord::copy_paste(["email"]))
            .unwrap();

        let evicted = controller.evict_idle(Duration::from_millis(30));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].session_id, idle.session_id);
        assert!(!controller.allocator().is_in_use(&idle.session_id));

        assert!(controller.contains(URL, &active.session_id));
        assert!(controller.allocator().is_in_use(&active.session_id));
    }

    #[test]
    fn evict_idle_tolerates_huge_ttl() {
        let controller = controller();
        controller.start_session(URL).unwrap();
        assert!(controller.evict_idle(Duration::MAX).is_empty());
        assert_eq!(controller.store().len(), 1);
    }
}
