use crate::domain::payment::{Authorization, Outcome};
use crate::error::{PaymentError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Indexes {
    by_id: HashMap<Uuid, Outcome>,
    by_reference_id: HashMap<Uuid, Outcome>,
}

impl Indexes {
    /// Two UUIDv7 keys unused in their respective index.
    fn fresh(&self, outcome: Outcome) -> Authorization {
        let mut id = Uuid::now_v7();
        while self.by_id.contains_key(&id) {
            id = Uuid::now_v7();
        }
        let mut reference_id = Uuid::now_v7();
        while self.by_reference_id.contains_key(&reference_id) {
            reference_id = Uuid::now_v7();
        }
        Authorization {
            id,
            reference_id,
            outcome,
        }
    }

    fn insert(&mut self, authorization: &Authorization) {
        self.by_id.insert(authorization.id, authorization.outcome);
        self.by_reference_id
            .insert(authorization.reference_id, authorization.outcome);
    }
}

/// Process-wide record of authorization outcomes.
///
/// Both indexes live behind one `RwLock`, so writes update them under a
/// single write guard and readers never see one key without the other.
/// Entries are write-once. `Clone` shares the underlying indexes.
#[derive(Default, Clone)]
pub struct AuthorizationStore {
    indexes: Arc<RwLock<Indexes>>,
}

impl AuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `outcome` under two fresh UUIDv7 keys and returns them.
    pub async fn record(&self, outcome: Outcome) -> Authorization {
        let mut indexes = self.indexes.write().await;
        let authorization = indexes.fresh(outcome);
        indexes.insert(&authorization);
        authorization
    }

    /// Picks keys for `outcome` without storing anything. See [`Self::commit`].
    pub async fn issue(&self, outcome: Outcome) -> Authorization {
        self.indexes.read().await.fresh(outcome)
    }

    /// Stores an issued authorization. Fails if either key is already taken.
    pub async fn commit(&self, authorization: &Authorization) -> Result<()> {
        let mut indexes = self.indexes.write().await;
        if indexes.by_id.contains_key(&authorization.id)
            || indexes
                .by_reference_id
                .contains_key(&authorization.reference_id)
        {
            return Err(PaymentError::StorageError(format!(
                "authorization {} already recorded",
                authorization.id
            )));
        }
        indexes.insert(authorization);
        Ok(())
    }

    pub async fn by_id(&self, id: Uuid) -> Option<Outcome> {
        self.indexes.read().await.by_id.get(&id).copied()
    }

    pub async fn by_reference_id(&self, reference_id: Uuid) -> Option<Outcome> {
        self.indexes
            .read()
            .await
            .by_reference_id
            .get(&reference_id)
            .copied()
    }

    /// Number of entries in each index, `(by_id, by_reference_id)`.
    pub async fn len(&self) -> (usize, usize) {
        let indexes = self.indexes.read().await;
        (indexes.by_id.len(), indexes.by_reference_id.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.indexes.read().await.by_id.is_empty()
    }
}
