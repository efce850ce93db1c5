use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;
use utoipauto::utoipauto;

#[utoipauto(paths = "./openears-server/src")]
#[derive(OpenApi)]
#[openapi(info(
    description = "openears-server exposes endpoints to interact with this openears instance"
))]
pub struct ApiDoc;

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
