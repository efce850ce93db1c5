use std::sync::Arc;

use thiserror::Error;

use crate::{
    prefixed_id, Collections, NewTransaction, NewUser, Storage, StoreError, StoreResult, Timing,
    TransactionData, UpdatedUser, UserData,
};

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Another user already owns this email, compared case-insensitively
    #[error("Email already registered")]
    DuplicateEmail { email: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Business rules above the raw collections: email uniqueness and the
/// denormalized running balance per user.
pub struct Registry<S, T> {
    collections: Collections<S>,
    timing: Arc<T>,
}

impl<S, T> Registry<S, T>
where
    S: Storage,
    T: Timing,
{
    pub fn new(storage: &Arc<S>, timing: &Arc<T>) -> Self {
        Self {
            collections: Collections::new(storage),
            timing: timing.clone(),
        }
    }

    /// Returns every stored user
    pub async fn users(&self) -> StoreResult<Vec<UserData>> {
        self.collections.users().await
    }

    /// Returns the user with the given id, if any
    pub async fn user_by_id(&self, id: &str) -> StoreResult<Option<UserData>> {
        let users = self.collections.users().await?;

        Ok(users.into_iter().find(|u| u.id == id))
    }

    /// Returns the user matching the email, compared case-insensitively
    pub async fn user_by_email(&self, email: &str) -> StoreResult<Option<UserData>> {
        let users = self.collections.users().await?;

        Ok(users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    /// Creates a new user, failing if the email is already taken.
    ///
    /// The store is left untouched when the email conflicts.
    pub async fn create_user(&self, new_user: NewUser) -> Result<UserData, RegistryError> {
        let mut users = self.collections.users().await?;

        let taken = users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email));

        if taken {
            return Err(RegistryError::DuplicateEmail {
                email: new_user.email,
            });
        }

        let user = UserData {
            id: prefixed_id("u"),
            username: new_user.username,
            email: new_user.email,
            location: new_user.location,
            role: new_user.role,
            balance: new_user.balance,
        };

        users.push(user.clone());
        self.collections.save_users(&users).await?;

        Ok(user)
    }

    /// Merges the given fields into the matching stored user.
    ///
    /// Silently does nothing when the id is unknown.
    pub async fn update_user(&self, updated_user: UpdatedUser) -> StoreResult<()> {
        let mut users = self.collections.users().await?;

        let Some(user) = users.iter_mut().find(|u| u.id == updated_user.id) else {
            return Ok(());
        };

        if let Some(username) = updated_user.username {
            user.username = username;
        }

        if let Some(email) = updated_user.email {
            user.email = email;
        }

        if let Some(location) = updated_user.location {
            user.location = location;
        }

        self.collections.save_users(&users).await
    }

    /// Appends a ledger entry and bumps the owning user's balance.
    ///
    /// When the user id is unknown the entry is still appended and only the
    /// balance update is skipped. Flows only call this for the currently
    /// authenticated user, so the orphaned case is unreachable from the
    /// public surface.
    pub async fn record_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> StoreResult<TransactionData> {
        let transaction = TransactionData {
            id: prefixed_id("tx"),
            user_id: new_transaction.user_id,
            date: self.timing.now(),
            amount: new_transaction.amount,
            kind: new_transaction.kind,
            description: new_transaction.description,
            method: new_transaction.method,
        };

        self.collections.append_transaction(&transaction).await?;

        let mut users = self.collections.users().await?;

        if let Some(user) = users.iter_mut().find(|u| u.id == transaction.user_id) {
            user.balance += transaction.amount;
            self.collections.save_users(&users).await?;
        }

        Ok(transaction)
    }

    /// Returns a user's transactions, most recent first
    pub async fn transactions_for(&self, user_id: &str) -> StoreResult<Vec<TransactionData>> {
        self.collections.transactions_for(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::implementors::{ManualTiming, MemoryStorage};
    use crate::{PaymentMethod, TransactionKind, UserRole};

    fn registry() -> Registry<MemoryStorage, ManualTiming> {
        Registry::new(
            &Arc::new(MemoryStorage::default()),
            &Arc::new(ManualTiming::default()),
        )
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "Quiet River".to_string(),
            email: email.to_string(),
            location: "Unknown".to_string(),
            role: UserRole::User,
            balance: 0.0,
        }
    }

    fn new_transaction(user_id: &str, amount: f64) -> NewTransaction {
        NewTransaction {
            user_id: user_id.to_string(),
            amount,
            kind: TransactionKind::Donation,
            description: "Charitable Contribution".to_string(),
            method: PaymentMethod::PayPal,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let registry = registry();

        registry
            .create_user(new_user("river@example.com"))
            .await
            .expect("creates user");

        let before = registry.users().await.expect("reads users");
        let result = registry.create_user(new_user("River@Example.COM")).await;

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateEmail { .. })
        ));

        // A failed attempt must leave the store unchanged
        let after = registry.users().await.expect("reads users");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn lookup_by_email_ignores_case() {
        let registry = registry();

        let created = registry
            .create_user(new_user("river@example.com"))
            .await
            .expect("creates user");

        let found = registry
            .user_by_email("RIVER@example.com")
            .await
            .expect("looks up user");

        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn balance_tracks_the_sum_of_recorded_amounts() {
        let registry = registry();

        let user = registry
            .create_user(new_user("river@example.com"))
            .await
            .expect("creates user");

        registry
            .record_transaction(new_transaction(&user.id, 2.99))
            .await
            .expect("records");
        registry
            .record_transaction(new_transaction(&user.id, 10.0))
            .await
            .expect("records");

        let stored = registry
            .user_by_id(&user.id)
            .await
            .expect("looks up user")
            .expect("user exists");

        let transactions = registry
            .transactions_for(&user.id)
            .await
            .expect("lists transactions");

        let sum: f64 = transactions.iter().map(|t| t.amount).sum();

        assert_eq!(transactions.len(), 2);
        assert_eq!(stored.balance, sum);
        assert_eq!(stored.balance, 12.99);
    }

    #[tokio::test]
    async fn orphaned_transaction_is_appended_without_a_balance_update() {
        let registry = registry();

        registry
            .record_transaction(new_transaction("u_missing", 5.0))
            .await
            .expect("records");

        let orphaned = registry
            .transactions_for("u_missing")
            .await
            .expect("lists transactions");

        assert_eq!(orphaned.len(), 1);

        // No user gained a balance from it
        let users = registry.users().await.expect("reads users");
        assert!(users.iter().all(|u| u.balance == 100.0));
    }

    #[tokio::test]
    async fn updating_an_unknown_user_is_a_silent_no_op() {
        let registry = registry();

        let before = registry.users().await.expect("reads users");

        registry
            .update_user(UpdatedUser {
                id: "u_missing".to_string(),
                username: Some("Ghost".to_string()),
                ..Default::default()
            })
            .await
            .expect("updates");

        let after = registry.users().await.expect("reads users");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn update_merges_only_the_given_fields() {
        let registry = registry();

        let user = registry
            .create_user(new_user("river@example.com"))
            .await
            .expect("creates user");

        registry
            .update_user(UpdatedUser {
                id: user.id.clone(),
                location: Some("Lisbon".to_string()),
                ..Default::default()
            })
            .await
            .expect("updates");

        let stored = registry
            .user_by_id(&user.id)
            .await
            .expect("looks up user")
            .expect("user exists");

        assert_eq!(stored.location, "Lisbon");
        assert_eq!(stored.username, user.username);
        assert_eq!(stored.email, user.email);
    }
}
