use std::sync::Arc;

use openears_impls::{JsonFileStorage, SystemTiming};
use openears_support::{Booking, Support};

use crate::sse::ServerSentEvents;

/// The support system as the server runs it: file-backed storage and the
/// real clock
pub type ServerSupport = Support<JsonFileStorage, SystemTiming>;
pub type ServerBooking = Booking<JsonFileStorage, SystemTiming>;

#[derive(Clone)]
pub struct ServerContext {
    pub support: Arc<ServerSupport>,
    pub sse: Arc<ServerSentEvents>,
}
