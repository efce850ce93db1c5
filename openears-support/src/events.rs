use crossbeam::channel::{Receiver, Sender};
use openears_core::{RecordId, TransactionData, UserData};

use crate::chat::ChatMessage;

pub type EventSender = Sender<SupportEvent>;
pub type EventReceiver = Receiver<SupportEvent>;

/// Events emitted by the support system
#[derive(Debug, Clone)]
pub enum SupportEvent {
    /// A simulated email finished "delivering"
    EmailSent {
        to: String,
        subject: String,
        body: String,
    },
    /// A ledger entry was recorded for a user
    TransactionRecorded {
        user_id: RecordId,
        transaction: TransactionData,
    },
    /// A message was appended to a live chat
    ChatMessage {
        booking_id: String,
        message: ChatMessage,
    },
    /// The authenticated user changed
    SessionChanged { user: Option<UserData> },
}
