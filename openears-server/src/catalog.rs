use axum::{extract::State, routing::get, Json};

use crate::{
    context::ServerContext,
    serialized::{TimeSlot, ToSerialized, Volunteer},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/catalog/volunteers",
    tag = "catalog",
    responses(
        (status = 200, body = Vec<Volunteer>)
    )
)]
async fn volunteers(State(context): State<ServerContext>) -> Json<Vec<Volunteer>> {
    Json(context.support.config.volunteers.to_serialized())
}

#[utoipa::path(
    get,
    path = "/v1/catalog/slots",
    tag = "catalog",
    responses(
        (status = 200, body = Vec<TimeSlot>)
    )
)]
async fn slots(State(context): State<ServerContext>) -> Json<Vec<TimeSlot>> {
    Json(context.support.config.slots.to_serialized())
}

pub fn router() -> Router {
    Router::new()
        .route("/volunteers", get(volunteers))
        .route("/slots", get(slots))
}
