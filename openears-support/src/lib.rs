mod booking;
mod catalog;
mod chat;
mod config;
mod donation;
mod events;
mod mailer;
mod payment;
mod session;

use std::sync::Arc;

use crossbeam::channel::unbounded;
use dashmap::DashMap;
use openears_core::{Registry, Storage, Timing};

pub use booking::*;
pub use catalog::*;
pub use chat::*;
pub use config::*;
pub use donation::*;
pub use events::*;
pub use mailer::*;
pub use payment::*;
pub use session::*;

/// The openears support system, facilitating sessions, bookings, donations,
/// and the simulated side effects around them.
pub struct Support<S, T> {
    pub config: SupportConfig,
    pub registry: Arc<Registry<S, T>>,
    pub session: Arc<Session<S, T>>,
    pub bookings: BookingManager<S, T>,
    pub donations: Donations<S, T>,
    pub mailer: Arc<Mailer<T>>,

    event_receiver: EventReceiver,
}

/// A type passed to various components of the support system, to access
/// state, emit events, and reach the shared services.
pub struct SupportContext<S, T> {
    pub config: SupportConfig,
    pub storage: Arc<S>,
    pub timing: Arc<T>,
    pub registry: Arc<Registry<S, T>>,
    pub mailer: Arc<Mailer<T>>,

    pub bookings: Arc<DashMap<BookingId, Arc<Booking<S, T>>>>,

    event_sender: EventSender,
}

impl<S, T> Support<S, T>
where
    S: Storage,
    T: Timing,
{
    pub fn new(config: SupportConfig, storage: S, timing: T) -> Self {
        Self::new_shared(config, Arc::new(storage), Arc::new(timing))
    }

    /// Creates a support system over already-shared backing services.
    ///
    /// Useful when several instances must see the same storage, the way
    /// multiple tabs share one browser's local storage.
    pub fn new_shared(config: SupportConfig, storage: Arc<S>, timing: Arc<T>) -> Self {
        let (event_sender, event_receiver) = unbounded();

        let registry = Arc::new(Registry::new(&storage, &timing));
        let mailer = Arc::new(Mailer::new(&config, &timing, event_sender.clone()));

        let context = SupportContext {
            config: config.clone(),
            storage,
            timing,
            registry: registry.clone(),
            mailer: mailer.clone(),
            bookings: Default::default(),
            event_sender,
        };

        let session = Arc::new(Session::new(&context));
        let bookings = BookingManager::new(&context, &session);
        let donations = Donations::new(&context, &session);

        Self {
            config,
            registry,
            session,
            bookings,
            donations,
            mailer,
            event_receiver,
        }
    }

    /// Receive events from the support system.
    pub fn wait_for_event(&self) -> SupportEvent {
        self.event_receiver
            .recv()
            .expect("event is received without error")
    }

    /// Returns the next pending event without blocking, if there is one
    pub fn poll_event(&self) -> Option<SupportEvent> {
        self.event_receiver.try_recv().ok()
    }
}

impl<S, T> SupportContext<S, T>
where
    S: Storage,
    T: Timing,
{
    pub fn emit(&self, event: SupportEvent) {
        self.event_sender.send(event).expect("event is sent");
    }
}

impl<S, T> Clone for SupportContext<S, T>
where
    S: Storage,
    T: Timing,
{
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            storage: self.storage.clone(),
            timing: self.timing.clone(),
            registry: self.registry.clone(),
            mailer: self.mailer.clone(),
            bookings: self.bookings.clone(),
            event_sender: self.event_sender.clone(),
        }
    }
}
