use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json,
};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{
        CardDetailsSchema, ChatMessageSchema, NewBookingSchema, PreferVolunteerSchema,
        SelectSlotSchema, ValidatedJson,
    },
    serialized::{Booking, ChatMessage, ToSerialized},
    Router,
};

use openears_support::BookingStep;

#[utoipa::path(
    post,
    path = "/v1/bookings",
    tag = "bookings",
    request_body = NewBookingSchema,
    responses(
        (status = 200, body = Booking)
    )
)]
async fn create_booking(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewBookingSchema>,
) -> Json<Booking> {
    let booking = context.support.bookings.create(body.mode.into());

    Json(booking.to_serialized())
}

#[utoipa::path(
    get,
    path = "/v1/bookings",
    tag = "bookings",
    responses(
        (status = 200, body = Vec<Booking>)
    )
)]
async fn list_bookings(State(context): State<ServerContext>) -> Json<Vec<Booking>> {
    let bookings: Vec<_> = context
        .support
        .bookings
        .list_all()
        .into_iter()
        .map(|b| b.to_serialized())
        .collect();

    Json(bookings)
}

#[utoipa::path(
    get,
    path = "/v1/bookings/{id}",
    tag = "bookings",
    responses(
        (status = 200, body = Booking),
        (status = 404, description = "No such booking")
    )
)]
async fn booking(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Booking>> {
    let booking = context.support.bookings.booking_by_id(&id)?;

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/slot",
    tag = "bookings",
    request_body = SelectSlotSchema,
    responses(
        (status = 200, body = Booking)
    )
)]
async fn select_slot(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<SelectSlotSchema>,
) -> ServerResult<Json<Booking>> {
    let booking = context.support.bookings.booking_by_id(&id)?;
    booking.select_slot(&body.slot_id)?;

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/volunteer",
    tag = "bookings",
    request_body = PreferVolunteerSchema,
    responses(
        (status = 200, body = Booking)
    )
)]
async fn prefer_volunteer(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<PreferVolunteerSchema>,
) -> ServerResult<Json<Booking>> {
    let booking = context.support.bookings.booking_by_id(&id)?;
    booking.prefer_volunteer(&body.volunteer_id)?;

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/proceed",
    tag = "bookings",
    responses(
        (status = 200, body = Booking),
        (status = 400, description = "A scheduled call needs a slot first")
    )
)]
async fn proceed(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Booking>> {
    let booking = context.support.bookings.booking_by_id(&id)?;
    booking.proceed_to_payment()?;

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/pay/card",
    tag = "bookings",
    request_body = CardDetailsSchema,
    responses(
        (status = 200, body = Booking),
        (status = 400, description = "The card was rejected")
    )
)]
async fn pay_with_card(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<CardDetailsSchema>,
) -> ServerResult<Json<Booking>> {
    let booking = context.support.bookings.booking_by_id(&id)?;
    booking.pay_with_card(&body.into()).await?;

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/pay/external",
    tag = "bookings",
    responses(
        (status = 200, body = Booking)
    )
)]
async fn pay_with_external(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Booking>> {
    let booking = context.support.bookings.booking_by_id(&id)?;
    booking.confirm_external_payment().await?;

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/chat",
    tag = "bookings",
    responses(
        (status = 200, body = Booking),
        (status = 400, description = "The booking has no live chat to enter")
    )
)]
async fn enter_chat(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Booking>> {
    let booking = context.support.bookings.start_chat(&id)?;

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/bookings/{id}/chat",
    tag = "bookings",
    responses(
        (status = 200, body = Vec<ChatMessage>)
    )
)]
async fn chat_messages(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Vec<ChatMessage>>> {
    let booking = context.support.bookings.booking_by_id(&id)?;

    Ok(Json(booking.chat.messages().to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/chat/messages",
    tag = "bookings",
    request_body = ChatMessageSchema,
    responses(
        (status = 200, body = ChatMessage),
        (status = 400, description = "Blank message, or the chat is not open")
    )
)]
async fn send_chat_message(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<ChatMessageSchema>,
) -> ServerResult<Json<ChatMessage>> {
    let booking = context.support.bookings.booking_by_id(&id)?;

    if booking.step() != BookingStep::LiveChat {
        return Err(ServerError::Rejected(
            "This step is not available right now".to_string(),
        ));
    }

    let message = booking
        .chat
        .send(&body.text)
        .ok_or_else(|| ServerError::Rejected("Message is empty".to_string()))?;

    Ok(Json(message.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/:id", get(booking))
        .route("/:id/slot", post(select_slot))
        .route("/:id/volunteer", post(prefer_volunteer))
        .route("/:id/proceed", post(proceed))
        .route("/:id/pay/card", post(pay_with_card))
        .route("/:id/pay/external", post(pay_with_external))
        .route("/:id/chat", post(enter_chat).get(chat_messages))
        .route("/:id/chat/messages", post(send_chat_message))
}
