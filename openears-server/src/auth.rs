use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json,
};

use openears_support::{NewSignup, ProfileUpdate};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, RegisterSchema, UpdateProfileSchema, ValidatedJson},
    serialized::{SessionView, ToSerialized, Transaction, User},
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = User),
        (status = 400, description = "No account matches the email")
    )
)]
async fn login(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<Json<User>> {
    let user = context
        .support
        .session
        .login(&body.email, &body.password)
        .await?;

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    tag = "auth",
    request_body = RegisterSchema,
    responses(
        (status = 200, body = User),
        (status = 409, description = "The email is already registered")
    )
)]
async fn register(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<Json<User>> {
    let user = context
        .support
        .session
        .signup(NewSignup {
            username: body.username,
            email: body.email,
            location: body.location,
            password: body.password,
        })
        .await?;

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "The session is gone, whether one existed or not")
    )
)]
async fn logout(State(context): State<ServerContext>) -> StatusCode {
    context.support.session.logout().await;

    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/v1/auth/user",
    tag = "auth",
    responses(
        (status = 200, body = SessionView)
    )
)]
async fn user(State(context): State<ServerContext>) -> Json<SessionView> {
    Json(context.support.session.state().to_serialized())
}

#[utoipa::path(
    patch,
    path = "/v1/auth/user",
    tag = "auth",
    request_body = UpdateProfileSchema,
    responses(
        (status = 200, body = User),
        (status = 401, description = "No one is signed in")
    )
)]
async fn update_profile(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<UpdateProfileSchema>,
) -> ServerResult<Json<User>> {
    let user = context
        .support
        .session
        .update_profile(ProfileUpdate {
            username: body.username,
            email: body.email,
            location: body.location,
        })
        .await?
        .ok_or(ServerError::NotAuthenticated)?;

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/auth/transactions",
    tag = "auth",
    responses(
        (status = 200, body = Vec<Transaction>),
        (status = 401, description = "No one is signed in")
    )
)]
async fn transactions(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Transaction>>> {
    if !context.support.session.is_authenticated() {
        return Err(ServerError::NotAuthenticated);
    }

    let transactions = context.support.session.transactions();

    Ok(Json(transactions.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/user", get(user).patch(update_profile))
        .route("/transactions", get(transactions))
}
