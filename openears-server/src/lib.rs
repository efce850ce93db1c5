mod auth;
mod bookings;
mod catalog;
mod context;
mod docs;
mod donations;
mod errors;
mod schemas;
mod serialized;
mod sse;

pub mod logging;

use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
    thread,
};

use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use context::{ServerContext, ServerSupport};
pub use errors::{ServerError, ServerResult};
pub use sse::ServerSentEvents;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9070;

pub type Router = axum::Router<ServerContext>;

/// Starts the openears server over the given support system
pub async fn run_server(support: Arc<ServerSupport>) {
    let port = env::var("OPENEARS_SERVER_PORT")
        .map(|x| x.parse::<u16>().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let context = ServerContext {
        support,
        sse: ServerSentEvents::new(),
    };

    spawn_event_forwarder(&context);

    let version_one_router = Router::new()
        .nest("/auth", auth::router())
        .nest("/catalog", catalog::router())
        .nest("/bookings", bookings::router())
        .nest("/donations", donations::router())
        .nest("/events", sse::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    axum::serve(listener, root_router.into_make_service())
        .await
        .expect("serves requests");
}

/// Pushes support events out to every subscribed client
fn spawn_event_forwarder(context: &ServerContext) {
    let support = context.support.clone();
    let sse = context.sse.clone();

    thread::spawn(move || loop {
        let event = support.wait_for_event();
        sse.broadcast(event.into());
    });
}
