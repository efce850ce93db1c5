use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The type used for record identifiers in the store.
pub type RecordId = String;

/// An openears account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: RecordId,
    pub username: String,
    /// Unique across the store, compared case-insensitively
    pub email: String,
    pub location: String,
    pub role: UserRole,
    /// The cumulative total of every transaction recorded for this user
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Guest,
    User,
    Volunteer,
    Admin,
}

/// An immutable ledger entry tied to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub id: RecordId,
    /// The user this entry belongs to
    pub user_id: RecordId,
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub kind: TransactionKind,
    pub description: String,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Chat,
    Call,
    Donation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Card,
    PayPal,
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub location: String,
    pub role: UserRole,
    pub balance: f64,
}

#[derive(Debug, Default)]
pub struct UpdatedUser {
    pub id: RecordId,
    pub username: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug)]
pub struct NewTransaction {
    pub user_id: RecordId,
    pub amount: f64,
    pub kind: TransactionKind,
    pub description: String,
    pub method: PaymentMethod,
}

impl PaymentMethod {
    /// The label the payment surfaces show for this method
    pub fn label(&self) -> &'static str {
        match self {
            Self::Card => "Credit Card",
            Self::PayPal => "PayPal",
        }
    }
}
