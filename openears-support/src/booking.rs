use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use thiserror::Error;

use openears_core::{
    prefixed_id, PaymentMethod, Storage, StoreError, StoreResult, Timing, TransactionKind,
};

use crate::{
    validate_card, CardDetails, CardError, LiveChat, Session, SupportContext, TemplateKind,
    TimeSlot, Volunteer,
};

pub type BookingId = String;

/// Fallback recipient for confirmations of anonymous completions
const ANONYMOUS_RECIPIENT: &str = "user@example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingMode {
    /// Connect with the next available listener right away
    Chat,
    /// Schedule a call for a chosen time slot
    Call,
}

/// Where a booking stands. The steps are strictly linear and a booking is
/// not resumable across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    Selection,
    Payment,
    Success,
    LiveChat,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Booking {0} does not exist")]
    NotFound(BookingId),
    #[error("This step is not available right now")]
    WrongStep,
    #[error("A time slot must be selected first")]
    SlotRequired,
    #[error("Unknown time slot")]
    UnknownSlot,
    #[error("That time slot is taken")]
    SlotUnavailable,
    #[error("Unknown volunteer")]
    UnknownVolunteer,
    #[error("Live chat is only part of chat bookings")]
    ChatUnavailable,
    #[error("A payment is already being processed")]
    PaymentInFlight,
    #[error(transparent)]
    Card(#[from] CardError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A single pass through the booking flow: pick, pay, get confirmed, and
/// for chat bookings, talk.
pub struct Booking<S, T> {
    context: SupportContext<S, T>,
    session: Arc<Session<S, T>>,

    id: BookingId,
    mode: BookingMode,

    step: Mutex<BookingStep>,
    slot: Mutex<Option<TimeSlot>>,
    volunteer: Mutex<Option<Volunteer>>,
    /// Set while a simulated payment is resolving, to reject repeat submits
    processing: AtomicBool,

    pub chat: LiveChat<S, T>,
}

impl<S, T> Booking<S, T>
where
    S: Storage,
    T: Timing,
{
    pub fn new(context: &SupportContext<S, T>, session: &Arc<Session<S, T>>, mode: BookingMode) -> Self {
        let id = prefixed_id("b");

        Self {
            context: context.clone(),
            session: session.clone(),
            chat: LiveChat::new(context, &id),
            id,
            mode,
            step: Mutex::new(BookingStep::Selection),
            slot: Default::default(),
            volunteer: Default::default(),
            processing: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> BookingId {
        self.id.clone()
    }

    pub fn mode(&self) -> BookingMode {
        self.mode
    }

    pub fn step(&self) -> BookingStep {
        *self.step.lock()
    }

    pub fn selected_slot(&self) -> Option<TimeSlot> {
        self.slot.lock().clone()
    }

    pub fn preferred_volunteer(&self) -> Option<Volunteer> {
        self.volunteer.lock().clone()
    }

    /// Picks a time slot from the catalog. Only meaningful during selection.
    pub fn select_slot(&self, slot_id: &str) -> Result<TimeSlot, BookingError> {
        self.ensure_step(BookingStep::Selection)?;

        let slot = self
            .context
            .config
            .slots
            .iter()
            .find(|s| s.id == slot_id)
            .cloned()
            .ok_or(BookingError::UnknownSlot)?;

        if !slot.available {
            return Err(BookingError::SlotUnavailable);
        }

        *self.slot.lock() = Some(slot.clone());

        Ok(slot)
    }

    /// Notes a preferred listener. Optional, and any status is allowed.
    pub fn prefer_volunteer(&self, volunteer_id: &str) -> Result<Volunteer, BookingError> {
        self.ensure_step(BookingStep::Selection)?;

        let volunteer = self
            .context
            .config
            .volunteers
            .iter()
            .find(|v| v.id == volunteer_id)
            .cloned()
            .ok_or(BookingError::UnknownVolunteer)?;

        *self.volunteer.lock() = Some(volunteer.clone());

        Ok(volunteer)
    }

    /// Advances from selection to payment.
    ///
    /// Scheduled calls can't advance without a slot; chat bookings always can.
    pub fn proceed_to_payment(&self) -> Result<(), BookingError> {
        self.ensure_step(BookingStep::Selection)?;

        if self.mode == BookingMode::Call && self.slot.lock().is_none() {
            return Err(BookingError::SlotRequired);
        }

        *self.step.lock() = BookingStep::Payment;

        Ok(())
    }

    /// Submits card details for the session price.
    ///
    /// Invalid details are rejected before the simulated processor is ever
    /// engaged.
    pub async fn pay_with_card(&self, details: &CardDetails) -> Result<(), BookingError> {
        self.ensure_step(BookingStep::Payment)?;
        validate_card(details, self.context.timing.now())?;

        self.begin_processing()?;
        let result = self.process(PaymentMethod::Card).await;
        self.end_processing();

        result.map_err(Into::into)
    }

    /// Completes the booking through the delegated external payment flow
    pub async fn confirm_external_payment(&self) -> Result<(), BookingError> {
        self.ensure_step(BookingStep::Payment)?;

        self.begin_processing()?;
        let result = self.process(PaymentMethod::PayPal).await;
        self.end_processing();

        result.map_err(Into::into)
    }

    /// Moves a confirmed chat booking into its live chat
    pub fn enter_chat(&self) -> Result<(), BookingError> {
        if self.mode != BookingMode::Chat {
            return Err(BookingError::ChatUnavailable);
        }

        self.ensure_step(BookingStep::Success)?;
        *self.step.lock() = BookingStep::LiveChat;

        Ok(())
    }

    async fn process(&self, method: PaymentMethod) -> StoreResult<()> {
        let latency = self.context.config.payment_latency;
        self.context.timing.wait(latency).await;

        self.complete(method).await
    }

    /// Confirms the payment: flips to success, records the ledger entry for
    /// a logged-in user, and fires the confirmation email.
    ///
    /// Anonymous completions still succeed, they just leave no ledger entry.
    async fn complete(&self, method: PaymentMethod) -> StoreResult<()> {
        *self.step.lock() = BookingStep::Success;

        let minutes = self.context.config.session_duration_minutes;

        let (kind, description) = match self.mode {
            BookingMode::Chat => (TransactionKind::Chat, format!("{minutes} min Chat Session")),
            BookingMode::Call => (TransactionKind::Call, format!("{minutes} min Scheduled Call")),
        };

        let price = self.context.config.price_per_session;

        self.session
            .add_transaction(price, kind, description, method)
            .await?;

        info!("Booking {} confirmed via {}", self.id, method.label());

        let recipient = self
            .session
            .current_user()
            .map(|u| u.email)
            .unwrap_or_else(|| ANONYMOUS_RECIPIENT.to_string());

        let mode_label = match self.mode {
            BookingMode::Chat => "Chat Session",
            BookingMode::Call => "Phone Call",
        };

        self.context
            .mailer
            .send(
                &recipient,
                TemplateKind::Confirmation,
                Some(&format!("Mode: {} (Via {})", mode_label, method.label())),
            )
            .await;

        Ok(())
    }

    fn ensure_step(&self, expected: BookingStep) -> Result<(), BookingError> {
        if *self.step.lock() == expected {
            Ok(())
        } else {
            Err(BookingError::WrongStep)
        }
    }

    fn begin_processing(&self) -> Result<(), BookingError> {
        self.processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| BookingError::PaymentInFlight)?;

        Ok(())
    }

    fn end_processing(&self) {
        self.processing.store(false, Ordering::SeqCst);
    }
}

/// Creates bookings and keeps track of the ones in flight
pub struct BookingManager<S, T> {
    context: SupportContext<S, T>,
    session: Arc<Session<S, T>>,
}

impl<S, T> BookingManager<S, T>
where
    S: Storage,
    T: Timing,
{
    pub fn new(context: &SupportContext<S, T>, session: &Arc<Session<S, T>>) -> Self {
        Self {
            context: context.clone(),
            session: session.clone(),
        }
    }

    /// Starts a new booking in the given mode
    pub fn create(&self, mode: BookingMode) -> Arc<Booking<S, T>> {
        let booking = Arc::new(Booking::new(&self.context, &self.session, mode));

        self.context
            .bookings
            .insert(booking.id(), booking.clone());

        info!("Booking {} started", booking.id());

        booking
    }

    pub fn booking_by_id(&self, id: &str) -> Result<Arc<Booking<S, T>>, BookingError> {
        self.context
            .bookings
            .get(id)
            .map(|b| b.value().clone())
            .ok_or_else(|| BookingError::NotFound(id.to_string()))
    }

    /// Enters the live chat of a confirmed chat booking and plays the
    /// scripted opening in the background.
    pub fn start_chat(&self, id: &str) -> Result<Arc<Booking<S, T>>, BookingError> {
        let booking = self.booking_by_id(id)?;
        booking.enter_chat()?;

        let scripted = booking.clone();
        tokio::spawn(async move { scripted.chat.run_script().await });

        Ok(booking)
    }

    /// Every booking currently in memory
    pub fn list_all(&self) -> Vec<Arc<Booking<S, T>>> {
        self.context.bookings.iter().map(|b| b.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use openears_core::implementors::{ManualTiming, MemoryStorage};
    use openears_core::TransactionData;

    use crate::{ChatSender, NewSignup, Support, SupportConfig};

    use super::*;

    fn support() -> Support<MemoryStorage, ManualTiming> {
        Support::new(
            SupportConfig::default(),
            MemoryStorage::default(),
            ManualTiming::default(),
        )
    }

    async fn authenticated(support: &Support<MemoryStorage, ManualTiming>) {
        support
            .session
            .signup(NewSignup {
                username: "Quiet River".to_string(),
                email: "river@example.com".to_string(),
                location: "Lisbon".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .expect("signs up");
    }

    fn valid_card() -> CardDetails {
        CardDetails {
            number: "4242424242424242".to_string(),
            // Twelve months past the fixed test clock
            expiry: "03/27".to_string(),
            cvc: "123".to_string(),
        }
    }

    #[tokio::test]
    async fn an_authenticated_chat_booking_records_one_transaction() {
        let support = support();
        authenticated(&support).await;

        let booking = support.bookings.create(BookingMode::Chat);
        booking.proceed_to_payment().expect("advances");
        booking.pay_with_card(&valid_card()).await.expect("pays");

        assert_eq!(booking.step(), BookingStep::Success);

        let transactions = support.session.transactions();
        assert_eq!(transactions.len(), 1);

        let TransactionData {
            amount,
            kind,
            method,
            description,
            ..
        } = &transactions[0];

        assert_eq!(*amount, 2.99);
        assert_eq!(*kind, TransactionKind::Chat);
        assert_eq!(*method, PaymentMethod::Card);
        assert_eq!(description, "15 min Chat Session");

        let user = support.session.current_user().expect("authenticated");
        assert_eq!(user.balance, 2.99);
    }

    #[tokio::test]
    async fn an_anonymous_booking_still_succeeds_without_a_ledger_entry() {
        let support = support();

        let booking = support.bookings.create(BookingMode::Chat);
        booking.proceed_to_payment().expect("advances");
        booking.pay_with_card(&valid_card()).await.expect("pays");

        assert_eq!(booking.step(), BookingStep::Success);

        // Nothing must have been appended anywhere in the store
        let users = support.registry.users().await.expect("reads users");
        for user in users {
            let owned = support
                .registry
                .transactions_for(&user.id)
                .await
                .expect("lists");
            assert!(owned.is_empty());
        }
    }

    #[tokio::test]
    async fn a_scheduled_call_requires_a_slot() {
        let support = support();

        let booking = support.bookings.create(BookingMode::Call);

        let result = booking.proceed_to_payment();
        assert!(matches!(result, Err(BookingError::SlotRequired)));

        booking.select_slot("t1").expect("selects");
        booking.proceed_to_payment().expect("advances");

        assert_eq!(booking.step(), BookingStep::Payment);
    }

    #[tokio::test]
    async fn an_unavailable_slot_cannot_be_selected() {
        let support = support();

        let booking = support.bookings.create(BookingMode::Call);

        let result = booking.select_slot("t2");
        assert!(matches!(result, Err(BookingError::SlotUnavailable)));

        let result = booking.select_slot("t9");
        assert!(matches!(result, Err(BookingError::UnknownSlot)));
    }

    #[tokio::test]
    async fn an_invalid_card_never_reaches_the_processor() {
        let support = support();
        authenticated(&support).await;

        let booking = support.bookings.create(BookingMode::Chat);
        booking.proceed_to_payment().expect("advances");

        let result = booking
            .pay_with_card(&CardDetails {
                expiry: "01/20".to_string(),
                ..valid_card()
            })
            .await;

        assert!(matches!(result, Err(BookingError::Card(_))));
        assert_eq!(booking.step(), BookingStep::Payment);
        assert_eq!(support.session.transactions().len(), 0);
    }

    #[tokio::test]
    async fn paying_outside_the_payment_step_is_rejected() {
        let support = support();

        let booking = support.bookings.create(BookingMode::Chat);

        let result = booking.pay_with_card(&valid_card()).await;
        assert!(matches!(result, Err(BookingError::WrongStep)));
    }

    #[tokio::test]
    async fn an_external_confirmation_records_paypal() {
        let support = support();
        authenticated(&support).await;

        let booking = support.bookings.create(BookingMode::Call);
        booking.select_slot("t3").expect("selects");
        booking.proceed_to_payment().expect("advances");
        booking.confirm_external_payment().await.expect("confirms");

        let transactions = support.session.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind, TransactionKind::Call);
        assert_eq!(transactions[0].method, PaymentMethod::PayPal);
        assert_eq!(transactions[0].description, "15 min Scheduled Call");
    }

    #[tokio::test]
    async fn completion_sends_a_confirmation_email() {
        let support = support();
        authenticated(&support).await;

        // Drop the signup welcome email so only booking events remain
        while support.poll_event().is_some() {}

        let booking = support.bookings.create(BookingMode::Chat);
        booking.proceed_to_payment().expect("advances");
        booking.pay_with_card(&valid_card()).await.expect("pays");

        let email = std::iter::from_fn(|| support.poll_event()).find_map(|e| match e {
            crate::SupportEvent::EmailSent { to, subject, body } => Some((to, subject, body)),
            _ => None,
        });

        let (to, subject, body) = email.expect("an email was sent");
        assert_eq!(to, "river@example.com");
        assert_eq!(subject, "Booking Confirmed");
        assert!(body.contains("Mode: Chat Session (Via Credit Card)"));
    }

    #[tokio::test]
    async fn chat_mode_reaches_the_scripted_live_chat() {
        let support = support();

        let booking = support.bookings.create(BookingMode::Chat);
        booking.proceed_to_payment().expect("advances");
        booking.confirm_external_payment().await.expect("confirms");

        booking.enter_chat().expect("enters chat");
        assert_eq!(booking.step(), BookingStep::LiveChat);

        booking.chat.run_script().await;

        let messages = booking.chat.messages();
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "Secure connection established.",
                "Captain Listener joined the chat.",
                "Hi there! I am here to listen. How are you feeling today?",
            ]
        );
        assert_eq!(messages[0].sender, ChatSender::System);
        assert_eq!(messages[2].sender, ChatSender::Volunteer);
    }

    #[tokio::test]
    async fn user_messages_append_immediately_and_blanks_are_dropped() {
        let support = support();

        let booking = support.bookings.create(BookingMode::Chat);
        booking.proceed_to_payment().expect("advances");
        booking.confirm_external_payment().await.expect("confirms");
        booking.enter_chat().expect("enters chat");

        assert_eq!(booking.chat.send("   "), None);

        let sent = booking.chat.send("Hello?").expect("appends");
        assert_eq!(sent.sender, ChatSender::Me);
        assert_eq!(booking.chat.messages(), vec![sent]);
    }

    #[tokio::test]
    async fn call_bookings_have_no_live_chat() {
        let support = support();

        let booking = support.bookings.create(BookingMode::Call);
        booking.select_slot("t1").expect("selects");
        booking.proceed_to_payment().expect("advances");
        booking.confirm_external_payment().await.expect("confirms");

        let result = booking.enter_chat();
        assert!(matches!(result, Err(BookingError::ChatUnavailable)));
    }

    #[tokio::test]
    async fn the_manager_finds_bookings_by_id() {
        let support = support();

        let booking = support.bookings.create(BookingMode::Chat);
        let found = support
            .bookings
            .booking_by_id(&booking.id())
            .expect("finds");

        assert_eq!(found.id(), booking.id());

        let missing = support.bookings.booking_by_id("b_missing");
        assert!(matches!(missing, Err(BookingError::NotFound(_))));
    }
}
