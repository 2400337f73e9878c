use std::collections::HashMap;

use tracing::{debug, warn};

use crate::leave::backend::{BackendError, LeaveBackend};
use crate::model::entitlement::EntitlementRecord;

/// Snapshot of one employee's entitlements, keyed by category id.
///
/// The snapshot is replaced only by [`EntitlementResolver::refresh`]. A failed
/// refresh keeps the previous snapshot and records the error so callers can
/// offer a retry.
#[derive(Debug, Clone)]
pub struct EntitlementResolver {
    employee_id: u64,
    records: HashMap<u64, EntitlementRecord>,
    loaded: bool,
    last_error: Option<BackendError>,
}

impl EntitlementResolver {
    pub fn new(employee_id: u64) -> Self {
        Self {
            employee_id,
            records: HashMap::new(),
            loaded: false,
            last_error: None,
        }
    }

    /// Builds a resolver over records fetched elsewhere.
    pub fn with_snapshot(employee_id: u64, records: Vec<EntitlementRecord>) -> Self {
        let mut resolver = Self::new(employee_id);
        resolver.replace(records);
        resolver
    }

    pub fn employee_id(&self) -> u64 {
        self.employee_id
    }

    /// `allocated - used` for the category, or `0.0` when no record is cached.
    pub fn balance(&self, category_id: u64) -> f64 {
        self.records
            .get(&category_id)
            .map(EntitlementRecord::balance)
            .unwrap_or(0.0)
    }

    /// Cached records ordered by category id.
    pub fn records(&self) -> Vec<&EntitlementRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by_key(|r| r.category_id);
        records
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_error(&self) -> Option<&BackendError> {
        self.last_error.as_ref()
    }

    /// True when the most recent refresh failed and balances may be outdated.
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    pub async fn refresh(&mut self, backend: &dyn LeaveBackend) -> Result<(), BackendError> {
        let fetched = backend.fetch_entitlements(self.employee_id).await;
        self.apply_fetch(fetched)
    }

    /// Applies the result of a fetch made elsewhere, so callers holding the
    /// resolver behind a lock need not keep it across the network call.
    pub fn apply_fetch(
        &mut self,
        fetched: Result<Vec<EntitlementRecord>, BackendError>,
    ) -> Result<(), BackendError> {
        match fetched {
            Ok(records) => {
                debug!(
                    employee_id = self.employee_id,
                    count = records.len(),
                    "Entitlement snapshot refreshed"
                );
                self.replace(records);
                Ok(())
            }
            Err(e) => {
                warn!(
                    employee_id = self.employee_id,
                    error = %e,
                    "Entitlement refresh failed, keeping last snapshot"
                );
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn replace(&mut self, records: Vec<EntitlementRecord>) {
        self.records = records.into_iter().map(|r| (r.category_id, r)).collect();
        self.loaded = true;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::memory::MemoryBackend;

    fn record(category_id: u64, allocated: f64, used: f64) -> EntitlementRecord {
        EntitlementRecord {
            category_id,
            allocated,
            used,
        }
    }

    #[test]
    fn unknown_category_has_zero_balance() {
        let resolver = EntitlementResolver::new(1000);
        assert_eq!(resolver.balance(1), 0.0);
        assert!(!resolver.is_loaded());

        let resolver = EntitlementResolver::with_snapshot(1000, vec![record(1, 12.0, 1.0)]);
        assert_eq!(resolver.balance(2), 0.0);
    }

    #[actix_web::test]
    async fn refresh_replaces_snapshot() {
        let backend = MemoryBackend::new().with_entitlements(vec![record(1, 12.0, 1.5)]);
        let mut resolver = EntitlementResolver::new(1000);

        resolver.refresh(&backend).await.unwrap();
        assert_eq!(resolver.balance(1), 10.5);
        assert!(resolver.is_loaded());

        backend.set_entitlements(vec![record(2, 5.0, 0.0)]);
        resolver.refresh(&backend).await.unwrap();
        assert_eq!(resolver.balance(1), 0.0);
        assert_eq!(resolver.balance(2), 5.0);
    }

    #[actix_web::test]
    async fn failed_refresh_keeps_last_snapshot() {
        let backend = MemoryBackend::new().with_entitlements(vec![record(1, 12.0, 1.0)]);
        let mut resolver = EntitlementResolver::new(1000);
        resolver.refresh(&backend).await.unwrap();

        backend.fail_fetches(true);
        assert!(resolver.refresh(&backend).await.is_err());
        assert_eq!(resolver.balance(1), 11.0);
        assert!(resolver.is_stale());

        backend.fail_fetches(false);
        resolver.refresh(&backend).await.unwrap();
        assert!(!resolver.is_stale());
    }
}
