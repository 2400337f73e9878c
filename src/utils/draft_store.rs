use std::sync::{Arc, Mutex};
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::leave::draft::ActiveDropdown;
use crate::leave::gate::SubmissionGate;

/// Server-side state of one leave form.
#[derive(Debug)]
pub struct DraftSession {
    pub gate: SubmissionGate,
    pub dropdown: ActiveDropdown,
}

pub type SharedSession = Arc<Mutex<DraftSession>>;

#[derive(Clone)]
struct Entry {
    employee_id: u64,
    session: SharedSession,
}

/// Open drafts keyed by id. Drafts idle longer than the configured TTL are
/// dropped, which is the same as the user abandoning the form.
#[derive(Clone)]
pub struct DraftStore {
    cache: Cache<Uuid, Entry>,
}

impl DraftStore {
    pub fn new(capacity: u64, idle_ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(idle_ttl)
                .build(),
        }
    }

    pub async fn open(&self, gate: SubmissionGate) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let employee_id = gate.employee_id();
        let session = Arc::new(Mutex::new(DraftSession {
            gate,
            dropdown: ActiveDropdown::None,
        }));

        self.cache
            .insert(
                id,
                Entry {
                    employee_id,
                    session: session.clone(),
                },
            )
            .await;
        (id, session)
    }

    /// Drafts are only visible to the employee that opened them.
    pub async fn get(&self, employee_id: u64, id: &Uuid) -> Option<SharedSession> {
        self.cache
            .get(id)
            .await
            .filter(|entry| entry.employee_id == employee_id)
            .map(|entry| entry.session)
    }

    pub async fn discard(&self, id: &Uuid) {
        self.cache.invalidate(id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::entitlement::EntitlementResolver;

    fn gate(employee_id: u64) -> SubmissionGate {
        SubmissionGate::new(employee_id, Vec::new(), EntitlementResolver::new(employee_id))
    }

    #[actix_web::test]
    async fn drafts_are_scoped_to_owner() {
        let store = DraftStore::new(10, Duration::from_secs(60));
        let (id, _) = store.open(gate(1000)).await;

        assert!(store.get(1000, &id).await.is_some());
        assert!(store.get(2000, &id).await.is_none());

        store.discard(&id).await;
        assert!(store.get(1000, &id).await.is_none());
    }
}
