use axum::{extract::State, http::StatusCode, routing::post};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{DonationSchema, PaymentMethodSchema, ValidatedJson},
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/donations",
    tag = "donations",
    request_body = DonationSchema,
    responses(
        (status = 204, description = "The donation went through"),
        (status = 400, description = "Bad amount or rejected card")
    )
)]
async fn donate(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<DonationSchema>,
) -> ServerResult<StatusCode> {
    let donations = &context.support.donations;

    match body.method {
        PaymentMethodSchema::Card => {
            let card = body
                .card
                .ok_or_else(|| ServerError::Rejected("Card details are required".to_string()))?;

            donations.donate_with_card(body.amount, &card.into()).await?;
        }
        PaymentMethodSchema::Paypal => {
            donations.donate_with_external(body.amount).await?;
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new().route("/", post(donate))
}
