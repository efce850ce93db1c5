use log::{info, warn};
use parking_lot::Mutex;
use thiserror::Error;

use openears_core::{
    NewTransaction, NewUser, PaymentMethod, RegistryError, Storage, StoreResult, Timing,
    TransactionData, TransactionKind, UpdatedUser, UserData, UserRole, SESSION_KEY,
};

use crate::{SupportContext, SupportEvent, TemplateKind};

#[derive(Debug, Error)]
pub enum AuthError {
    /// No account matches the email. Passwords are accepted but never
    /// verified, there is no credential store.
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Store(#[from] openears_core::StoreError),
}

impl From<RegistryError> for AuthError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::DuplicateEmail { .. } => Self::DuplicateEmail,
            RegistryError::Store(e) => Self::Store(e),
        }
    }
}

/// Who is logged in right now, one slot per process lifetime
#[derive(Debug, Clone)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated {
        user: UserData,
        /// The user's ledger mirror, most recent first
        transactions: Vec<TransactionData>,
    },
    Failed {
        message: String,
    },
}

/// The fields a profile edit may change
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
}

/// What a new signup submits
#[derive(Debug)]
pub struct NewSignup {
    pub username: String,
    pub email: String,
    pub location: String,
    /// Stored nowhere and checked against nothing
    pub password: String,
}

/// The session context: the in-memory mirror of the authenticated user and
/// their transactions, kept consistent with the store by the operations
/// below. The store stays the source of truth.
pub struct Session<S, T> {
    context: SupportContext<S, T>,
    state: Mutex<SessionState>,
}

impl<S, T> Session<S, T>
where
    S: Storage,
    T: Timing,
{
    pub fn new(context: &SupportContext<S, T>) -> Self {
        Self {
            context: context.clone(),
            state: Mutex::new(SessionState::Anonymous),
        }
    }

    /// Rehydrates the session from the persisted pointer, if one exists.
    ///
    /// When the pointed-at user still exists the session refreshes from the
    /// store, which has the authoritative balance. A stale pointer falls
    /// back to the snapshot itself, with no transaction history.
    pub async fn restore(&self) -> StoreResult<()> {
        let raw = self.context.storage.get(SESSION_KEY).await?;

        let Some(raw) = raw else {
            return Ok(());
        };

        let Ok(snapshot) = serde_json::from_slice::<UserData>(&raw) else {
            warn!("Persisted session pointer is malformed, discarding it");
            let _ = self.context.storage.remove(SESSION_KEY).await;
            return Ok(());
        };

        match self.context.registry.user_by_email(&snapshot.email).await? {
            Some(user) => {
                let transactions = self.context.registry.transactions_for(&user.id).await?;

                info!("Restored session of {}", user.username);
                self.set_authenticated(user, transactions);
            }
            None => {
                info!("Restored stale session of {}", snapshot.username);
                self.set_authenticated(snapshot, vec![]);
            }
        }

        Ok(())
    }

    /// Logs a user in by email.
    ///
    /// The password goes unchecked by design: this models the prototype's
    /// auth, which has nothing to check against.
    pub async fn login(&self, email: &str, _password: &str) -> Result<UserData, AuthError> {
        self.set_state(SessionState::Authenticating);
        self.wait_for_auth().await;

        match self.try_login(email).await {
            Ok(user) => Ok(user),
            Err(e) => {
                self.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Creates an account and logs it in
    pub async fn signup(&self, new_signup: NewSignup) -> Result<UserData, AuthError> {
        self.set_state(SessionState::Authenticating);
        self.wait_for_auth().await;

        match self.try_signup(new_signup).await {
            Ok(user) => Ok(user),
            Err(e) => {
                self.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Ends the session. Always succeeds.
    pub async fn logout(&self) {
        *self.state.lock() = SessionState::Anonymous;

        if let Err(e) = self.context.storage.remove(SESSION_KEY).await {
            warn!("Could not remove the persisted session pointer: {e}");
        }

        self.context.emit(SupportEvent::SessionChanged { user: None });
    }

    /// Merges the given fields into the logged-in user, both in memory and
    /// in the store. Does nothing when anonymous.
    pub async fn update_profile(&self, update: ProfileUpdate) -> StoreResult<Option<UserData>> {
        let merged = {
            let mut state = self.state.lock();

            match &mut *state {
                SessionState::Authenticated { user, .. } => {
                    if let Some(username) = &update.username {
                        user.username = username.clone();
                    }
                    if let Some(email) = &update.email {
                        user.email = email.clone();
                    }
                    if let Some(location) = &update.location {
                        user.location = location.clone();
                    }

                    Some(user.clone())
                }
                _ => None,
            }
        };

        let Some(user) = merged else {
            return Ok(None);
        };

        self.persist_pointer(&user).await?;

        self.context
            .registry
            .update_user(UpdatedUser {
                id: user.id.clone(),
                username: update.username,
                email: update.email,
                location: update.location,
            })
            .await?;

        Ok(Some(user))
    }

    /// Records a ledger entry for the logged-in user and keeps the
    /// in-memory mirror consistent without a full reload.
    ///
    /// Anonymous sessions record nothing and get `None` back.
    pub async fn add_transaction(
        &self,
        amount: f64,
        kind: TransactionKind,
        description: String,
        method: PaymentMethod,
    ) -> StoreResult<Option<TransactionData>> {
        let user = match &*self.state.lock() {
            SessionState::Authenticated { user, .. } => user.clone(),
            _ => return Ok(None),
        };

        let transaction = self
            .context
            .registry
            .record_transaction(NewTransaction {
                user_id: user.id.clone(),
                amount,
                kind,
                description,
                method,
            })
            .await?;

        let mirrored = {
            let mut state = self.state.lock();

            match &mut *state {
                SessionState::Authenticated { user, transactions } => {
                    user.balance += amount;
                    transactions.insert(0, transaction.clone());
                    Some(user.clone())
                }
                _ => None,
            }
        };

        if let Some(user) = mirrored {
            self.persist_pointer(&user).await?;
        }

        self.context.emit(SupportEvent::TransactionRecorded {
            user_id: user.id,
            transaction: transaction.clone(),
        });

        Ok(Some(transaction))
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn current_user(&self) -> Option<UserData> {
        match &*self.state.lock() {
            SessionState::Authenticated { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// The mirrored transaction list, most recent first
    pub fn transactions(&self) -> Vec<TransactionData> {
        match &*self.state.lock() {
            SessionState::Authenticated { transactions, .. } => transactions.clone(),
            _ => vec![],
        }
    }

    /// The last failure message, if the session is in a failed state
    pub fn error_message(&self) -> Option<String> {
        match &*self.state.lock() {
            SessionState::Failed { message } => Some(message.clone()),
            _ => None,
        }
    }

    async fn try_login(&self, email: &str) -> Result<UserData, AuthError> {
        let user = self
            .context
            .registry
            .user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let transactions = self.context.registry.transactions_for(&user.id).await?;

        self.persist_pointer(&user).await?;
        self.set_authenticated(user.clone(), transactions);

        info!("{} logged in", user.username);

        Ok(user)
    }

    async fn try_signup(&self, new_signup: NewSignup) -> Result<UserData, AuthError> {
        let location = if new_signup.location.trim().is_empty() {
            "Unknown".to_string()
        } else {
            new_signup.location
        };

        let user = self
            .context
            .registry
            .create_user(NewUser {
                username: new_signup.username,
                email: new_signup.email,
                location,
                role: UserRole::User,
                balance: 0.0,
            })
            .await?;

        self.persist_pointer(&user).await?;
        self.set_authenticated(user.clone(), vec![]);

        info!("{} signed up", user.username);

        self.context
            .mailer
            .send(
                &user.email,
                TemplateKind::Welcome,
                Some(&format!("Username: {}", user.username)),
            )
            .await;

        Ok(user)
    }

    async fn persist_pointer(&self, user: &UserData) -> StoreResult<()> {
        let raw = serde_json::to_vec(user).expect("user serializes");
        self.context.storage.set(SESSION_KEY, raw).await?;

        Ok(())
    }

    async fn wait_for_auth(&self) {
        let latency = self.context.config.auth_latency;
        self.context.timing.wait(latency).await;
    }

    fn set_authenticated(&self, user: UserData, transactions: Vec<TransactionData>) {
        self.context.emit(SupportEvent::SessionChanged {
            user: Some(user.clone()),
        });

        *self.state.lock() = SessionState::Authenticated { user, transactions };
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
    }

    fn fail(&self, message: String) {
        *self.state.lock() = SessionState::Failed { message };
    }
}
