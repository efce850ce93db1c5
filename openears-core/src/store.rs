use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{Storage, StorageError, TransactionData, UserData, UserRole};

/// Key of the users collection
pub const USERS_KEY: &str = "openears_db_users";
/// Key of the transactions collection
pub const TRANSACTIONS_KEY: &str = "openears_db_transactions";
/// Key of the persisted session pointer
pub const SESSION_KEY: &str = "openears_session";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A stored collection exists but cannot be deserialized
    #[error("stored collection {key} is malformed: {source}")]
    Malformed {
        key: &'static str,
        source: serde_json::Error,
    },
}

/// The two collections every openears deployment starts out with, stored as
/// whole JSON arrays behind the [Storage] port.
///
/// Reads and writes are whole-collection with no locking. The store assumes a
/// single logical writer at a time; a failure mid-write may leave a
/// collection partially written.
pub struct Collections<S> {
    storage: Arc<S>,
}

impl<S> Collections<S>
where
    S: Storage,
{
    pub fn new(storage: &Arc<S>) -> Self {
        Self {
            storage: storage.clone(),
        }
    }

    /// Seeds the collections if they don't exist yet.
    ///
    /// Safe to call on every read, seeding only happens when a collection is
    /// missing entirely.
    pub async fn ensure_initialized(&self) -> StoreResult<()> {
        if self.storage.get(USERS_KEY).await?.is_none() {
            self.write_collection(USERS_KEY, &[seed_admin()]).await?;
        }

        if self.storage.get(TRANSACTIONS_KEY).await?.is_none() {
            self.write_collection::<TransactionData>(TRANSACTIONS_KEY, &[])
                .await?;
        }

        Ok(())
    }

    /// Returns every stored user, initializing the collections first
    pub async fn users(&self) -> StoreResult<Vec<UserData>> {
        self.ensure_initialized().await?;
        self.read_collection(USERS_KEY).await
    }

    /// Overwrites the users collection
    pub async fn save_users(&self, users: &[UserData]) -> StoreResult<()> {
        self.write_collection(USERS_KEY, users).await
    }

    /// Returns every stored transaction, initializing the collections first
    pub async fn all_transactions(&self) -> StoreResult<Vec<TransactionData>> {
        self.ensure_initialized().await?;
        self.read_collection(TRANSACTIONS_KEY).await
    }

    /// Returns the transactions belonging to a user, most recent first.
    ///
    /// The sort is stable, so entries sharing a date keep insertion order.
    pub async fn transactions_for(&self, user_id: &str) -> StoreResult<Vec<TransactionData>> {
        let mut transactions: Vec<_> = self
            .all_transactions()
            .await?
            .into_iter()
            .filter(|t| t.user_id == user_id)
            .collect();

        transactions.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(transactions)
    }

    /// Appends a transaction to the ledger
    pub async fn append_transaction(&self, transaction: &TransactionData) -> StoreResult<()> {
        let mut transactions = self.all_transactions().await?;
        transactions.push(transaction.clone());

        self.write_collection(TRANSACTIONS_KEY, &transactions).await
    }

    async fn read_collection<T>(&self, key: &'static str) -> StoreResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let raw = self.storage.get(key).await?.unwrap_or_default();

        if raw.is_empty() {
            return Ok(vec![]);
        }

        serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed { key, source })
    }

    async fn write_collection<T>(&self, key: &'static str, items: &[T]) -> StoreResult<()>
    where
        T: Serialize,
    {
        let raw = serde_json::to_vec(items).expect("collection serializes");
        self.storage.set(key, raw).await?;

        Ok(())
    }
}

/// The administrator account every fresh store starts out with
fn seed_admin() -> UserData {
    UserData {
        id: "u_admin".to_string(),
        username: "Admin".to_string(),
        email: "admin@example.com".to_string(),
        location: "Florida".to_string(),
        role: UserRole::Admin,
        balance: 100.0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::implementors::MemoryStorage;
    use crate::{PaymentMethod, TransactionKind};

    fn collections() -> Collections<MemoryStorage> {
        Collections::new(&Arc::new(MemoryStorage::default()))
    }

    fn transaction(id: &str, user_id: &str, day: u32) -> TransactionData {
        TransactionData {
            id: id.to_string(),
            user_id: user_id.to_string(),
            date: Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap(),
            amount: 2.99,
            kind: TransactionKind::Chat,
            description: "15 min Chat Session".to_string(),
            method: PaymentMethod::Card,
        }
    }

    #[tokio::test]
    async fn seeds_admin_exactly_once() {
        let collections = collections();

        let first = collections.users().await.expect("reads users");
        let second = collections.users().await.expect("reads users again");

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);

        let admin = &first[0];
        assert_eq!(admin.id, "u_admin");
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.balance, 100.0);
    }

    #[tokio::test]
    async fn seeding_does_not_clobber_existing_users() {
        let collections = collections();

        let mut users = collections.users().await.expect("reads users");
        users.push(UserData {
            id: "u_other".to_string(),
            username: "Fern".to_string(),
            email: "fern@example.com".to_string(),
            location: "Oslo".to_string(),
            role: UserRole::User,
            balance: 0.0,
        });

        collections.save_users(&users).await.expect("saves users");
        collections
            .ensure_initialized()
            .await
            .expect("initializes again");

        let stored = collections.users().await.expect("reads users");
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn transactions_filter_by_owner_and_sort_descending() {
        let collections = collections();

        collections
            .append_transaction(&transaction("tx_1", "u_admin", 3))
            .await
            .expect("appends");
        collections
            .append_transaction(&transaction("tx_2", "u_other", 7))
            .await
            .expect("appends");
        collections
            .append_transaction(&transaction("tx_3", "u_admin", 9))
            .await
            .expect("appends");

        let owned = collections
            .transactions_for("u_admin")
            .await
            .expect("filters");

        let ids: Vec<_> = owned.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["tx_3", "tx_1"]);
    }

    #[tokio::test]
    async fn same_date_transactions_keep_insertion_order() {
        let collections = collections();

        collections
            .append_transaction(&transaction("tx_a", "u_admin", 5))
            .await
            .expect("appends");
        collections
            .append_transaction(&transaction("tx_b", "u_admin", 5))
            .await
            .expect("appends");

        let owned = collections
            .transactions_for("u_admin")
            .await
            .expect("filters");

        let ids: Vec<_> = owned.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["tx_a", "tx_b"]);
    }

    #[tokio::test]
    async fn malformed_collection_surfaces_as_error() {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .set(USERS_KEY, b"not json".to_vec())
            .await
            .expect("sets");

        let collections = Collections::new(&storage);
        let result = collections.users().await;

        assert!(matches!(
            result,
            Err(StoreError::Malformed { key: USERS_KEY, .. })
        ));
    }
}
