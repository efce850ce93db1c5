//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use openears_core::{PaymentMethod, TransactionData, TransactionKind, UserData, UserRole};
use openears_support::{
    BookingMode, BookingStep, ChatMessage as SupportChatMessage, ChatSender, SessionState,
    TimeSlot as SupportTimeSlot, Volunteer as SupportVolunteer, VolunteerStatus,
};

use crate::context::ServerBooking;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: String,
    username: String,
    email: String,
    location: String,
    role: &'static str,
    balance: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: String,
    user_id: String,
    /// Display-formatted, like `Mar 14, 2026`
    date: String,
    amount: f64,
    kind: &'static str,
    description: String,
    method: &'static str,
}

/// What the session looks like from outside
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    authenticated: bool,
    user: Option<User>,
    error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    id: String,
    alias: String,
    status: &'static str,
    bio: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    id: String,
    time: String,
    date: String,
    available: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    sender: &'static str,
    text: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    id: String,
    mode: &'static str,
    step: &'static str,
    slot: Option<TimeSlot>,
    volunteer: Option<Volunteer>,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        let role = match self.role {
            UserRole::Guest => "GUEST",
            UserRole::User => "USER",
            UserRole::Volunteer => "VOLUNTEER",
            UserRole::Admin => "ADMIN",
        };

        User {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            location: self.location.clone(),
            role,
            balance: self.balance,
        }
    }
}

impl ToSerialized<Transaction> for TransactionData {
    fn to_serialized(&self) -> Transaction {
        let kind = match self.kind {
            TransactionKind::Chat => "Chat",
            TransactionKind::Call => "Call",
            TransactionKind::Donation => "Donation",
        };

        let method = match self.method {
            PaymentMethod::Card => "Card",
            PaymentMethod::PayPal => "PayPal",
        };

        Transaction {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            date: self.date.format("%b %-d, %Y").to_string(),
            amount: self.amount,
            kind,
            description: self.description.clone(),
            method,
        }
    }
}

impl ToSerialized<SessionView> for SessionState {
    fn to_serialized(&self) -> SessionView {
        match self {
            SessionState::Authenticated { user, .. } => SessionView {
                authenticated: true,
                user: Some(user.to_serialized()),
                error: None,
            },
            SessionState::Failed { message } => SessionView {
                authenticated: false,
                user: None,
                error: Some(message.clone()),
            },
            _ => SessionView {
                authenticated: false,
                user: None,
                error: None,
            },
        }
    }
}

impl ToSerialized<Volunteer> for SupportVolunteer {
    fn to_serialized(&self) -> Volunteer {
        let status = match self.status {
            VolunteerStatus::Available => "available",
            VolunteerStatus::Busy => "busy",
            VolunteerStatus::Offline => "offline",
        };

        Volunteer {
            id: self.id.clone(),
            alias: self.alias.clone(),
            status,
            bio: self.bio.clone(),
        }
    }
}

impl ToSerialized<TimeSlot> for SupportTimeSlot {
    fn to_serialized(&self) -> TimeSlot {
        TimeSlot {
            id: self.id.clone(),
            time: self.time.clone(),
            date: self.date.clone(),
            available: self.available,
        }
    }
}

impl ToSerialized<ChatMessage> for SupportChatMessage {
    fn to_serialized(&self) -> ChatMessage {
        let sender = match self.sender {
            ChatSender::System => "System",
            ChatSender::Volunteer => "Volunteer",
            ChatSender::Me => "Me",
        };

        ChatMessage {
            sender,
            text: self.text.clone(),
        }
    }
}

impl ToSerialized<Booking> for Arc<ServerBooking> {
    fn to_serialized(&self) -> Booking {
        let mode = match self.mode() {
            BookingMode::Chat => "chat",
            BookingMode::Call => "call",
        };

        let step = match self.step() {
            BookingStep::Selection => "selection",
            BookingStep::Payment => "payment",
            BookingStep::Success => "success",
            BookingStep::LiveChat => "liveChat",
        };

        Booking {
            id: self.id(),
            mode,
            step,
            slot: self.selected_slot().map(|s| s.to_serialized()),
            volunteer: self.preferred_volunteer().map(|v| v.to_serialized()),
        }
    }
}
