use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use openears_core::StoreError;
use openears_support::{AuthError, BookingError, CardError, DonationError};

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Not signed in")]
    NotAuthenticated,
    /// A flow refused the request: wizard guards, bad amounts, card fields
    #[error("{0}")]
    Rejected(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::DuplicateEmail => Self::DuplicateEmail,
            AuthError::Store(e) => Self::Unknown(e.to_string()),
        }
    }
}

impl From<BookingError> for ServerError {
    fn from(value: BookingError) -> Self {
        match value {
            BookingError::NotFound(id) => Self::NotFound {
                resource: "booking",
                identifier: id,
            },
            BookingError::Card(e) => e.into(),
            BookingError::Store(e) => Self::Unknown(e.to_string()),
            e => Self::Rejected(e.to_string()),
        }
    }
}

impl From<DonationError> for ServerError {
    fn from(value: DonationError) -> Self {
        match value {
            DonationError::Card(e) => e.into(),
            DonationError::Store(e) => Self::Unknown(e.to_string()),
            e => Self::Rejected(e.to_string()),
        }
    }
}

impl From<CardError> for ServerError {
    fn from(value: CardError) -> Self {
        let fields: Vec<_> = value
            .fields()
            .into_iter()
            .map(|(name, error)| format!("{name}: {error}"))
            .collect();

        Self::Rejected(fields.join(", "))
    }
}

impl From<StoreError> for ServerError {
    fn from(value: StoreError) -> Self {
        Self::Unknown(value.to_string())
    }
}
