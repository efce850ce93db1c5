use std::sync::Arc;
use std::time::Duration;

use log::info;
use openears_core::Timing;

use crate::{EventSender, SupportConfig, SupportEvent};

/// Which canned template an email is built from.
///
/// Anything a caller can't name falls back to [TemplateKind::Other].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Welcome,
    Confirmation,
    Reminder,
    Other,
}

/// Simulates an outbound email service.
///
/// No delivery happens anywhere. Sends resolve after a fixed delay and
/// broadcast an [SupportEvent::EmailSent] so the rest of the system can
/// observe them.
pub struct Mailer<T> {
    timing: Arc<T>,
    latency: Duration,
    event_sender: EventSender,
}

impl<T> Mailer<T>
where
    T: Timing,
{
    pub fn new(config: &SupportConfig, timing: &Arc<T>, event_sender: EventSender) -> Self {
        Self {
            timing: timing.clone(),
            latency: config.email_latency,
            event_sender,
        }
    }

    /// Builds and "sends" an email, resolving once the simulated delivery
    /// delay has passed.
    pub async fn send(&self, to: &str, kind: TemplateKind, details: Option<&str>) {
        info!("Sending {kind:?} email to {to}...");

        let username = to.split('@').next().unwrap_or(to);
        let (subject, body) = template(kind, username);

        let body = match details {
            Some(details) => format!("{body} \n\nDetails: {details}"),
            None => body,
        };

        self.timing.wait(self.latency).await;

        self.event_sender
            .send(SupportEvent::EmailSent {
                to: to.to_string(),
                subject,
                body,
            })
            .expect("event is sent");

        info!("Email to {to} sent");
    }
}

/// The subject and body for a template kind, personalized with the
/// recipient's name
pub fn template(kind: TemplateKind, username: &str) -> (String, String) {
    match kind {
        TemplateKind::Welcome => (
            "Welcome to Our Ears Are Open".to_string(),
            format!(
                "Hi {username}, welcome to our warm community. \
                 We are here to listen. Your account has been created."
            ),
        ),
        TemplateKind::Confirmation => (
            "Booking Confirmed".to_string(),
            format!("Hi {username}, your 15-minute session has been booked. Payment received."),
        ),
        TemplateKind::Reminder => (
            "Upcoming Conversation".to_string(),
            format!("Hi {username}, your chat with a volunteer starts in 15 minutes."),
        ),
        TemplateKind::Other => (
            "Notification".to_string(),
            "You have a new notification.".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use crossbeam::channel::unbounded;
    use openears_core::implementors::ManualTiming;

    use super::*;

    #[tokio::test]
    async fn sending_broadcasts_the_rendered_email() {
        let (sender, receiver) = unbounded();
        let mailer = Mailer::new(
            &SupportConfig::default(),
            &Arc::new(ManualTiming::default()),
            sender,
        );

        mailer
            .send("river@example.com", TemplateKind::Confirmation, None)
            .await;

        let event = receiver.recv().expect("event arrives");
        let SupportEvent::EmailSent { to, subject, body } = event else {
            panic!("unexpected event: {event:?}");
        };

        assert_eq!(to, "river@example.com");
        assert_eq!(subject, "Booking Confirmed");
        assert!(body.starts_with("Hi river,"));
    }

    #[tokio::test]
    async fn details_are_appended_to_the_body() {
        let (sender, receiver) = unbounded();
        let mailer = Mailer::new(
            &SupportConfig::default(),
            &Arc::new(ManualTiming::default()),
            sender,
        );

        mailer
            .send(
                "river@example.com",
                TemplateKind::Welcome,
                Some("Username: Quiet River"),
            )
            .await;

        let SupportEvent::EmailSent { subject, body, .. } =
            receiver.recv().expect("event arrives")
        else {
            panic!("unexpected event");
        };

        assert_eq!(subject, "Welcome to Our Ears Are Open");
        assert!(body.ends_with("Details: Username: Quiet River"));
    }

    #[test]
    fn unnameable_kinds_fall_back_to_a_generic_notification() {
        let (subject, body) = template(TemplateKind::Other, "river");

        assert_eq!(subject, "Notification");
        assert_eq!(body, "You have a new notification.");
    }

    #[test]
    fn the_reminder_template_mentions_the_session_lead_time() {
        let (subject, body) = template(TemplateKind::Reminder, "river");

        assert_eq!(subject, "Upcoming Conversation");
        assert!(body.contains("15 minutes"));
    }
}
