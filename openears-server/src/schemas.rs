use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;

use openears_support::{BookingMode, CardDetails};

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 64))]
    pub password: String,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(length(min = 2, max = 128))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 128))]
    #[serde(default)]
    pub location: String,
    #[validate(length(max = 64))]
    pub password: String,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileSchema {
    #[validate(length(min = 2, max = 128))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 128))]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingModeSchema {
    Chat,
    Call,
}

impl From<BookingModeSchema> for BookingMode {
    fn from(value: BookingModeSchema) -> Self {
        match value {
            BookingModeSchema::Chat => Self::Chat,
            BookingModeSchema::Call => Self::Call,
        }
    }
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewBookingSchema {
    pub mode: BookingModeSchema,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectSlotSchema {
    #[validate(length(max = 32))]
    pub slot_id: String,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PreferVolunteerSchema {
    #[validate(length(max = 32))]
    pub volunteer_id: String,
}

/// Raw card fields. The real checks happen in the payment flow, these
/// bounds only keep the payloads sane.
#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CardDetailsSchema {
    #[validate(length(max = 32))]
    pub card_number: String,
    #[validate(length(max = 8))]
    pub expiry: String,
    #[validate(length(max = 8))]
    pub cvc: String,
}

impl From<CardDetailsSchema> for CardDetails {
    fn from(value: CardDetailsSchema) -> Self {
        Self {
            number: value.card_number,
            expiry: value.expiry,
            cvc: value.cvc,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodSchema {
    Card,
    Paypal,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DonationSchema {
    pub amount: f64,
    pub method: PaymentMethodSchema,
    /// Required for card donations, ignored otherwise
    pub card: Option<CardDetailsSchema>,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatMessageSchema {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}
