use std::time::Duration;

use crate::catalog::{default_slots, default_volunteers, TimeSlot, Volunteer};

/// The configuration of the support system
#[derive(Debug, Clone)]
pub struct SupportConfig {
    /// What a 15-minute session costs, in dollars
    pub price_per_session: f64,
    /// How long a booked session lasts
    pub session_duration_minutes: u32,
    /// How long a login or signup takes to resolve
    pub auth_latency: Duration,
    /// How long the payment processor takes to confirm
    pub payment_latency: Duration,
    /// How long an email takes to "deliver"
    pub email_latency: Duration,
    /// Delay before the secure connection notice appears in a chat
    pub chat_connect_delay: Duration,
    /// Delay between the connection notice and the volunteer joining
    pub chat_join_delay: Duration,
    /// Delay between the volunteer joining and their greeting
    pub chat_greeting_delay: Duration,
    /// The listeners shown as booking preferences
    pub volunteers: Vec<Volunteer>,
    /// The candidate slots offered for scheduled calls
    pub slots: Vec<TimeSlot>,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            price_per_session: 2.99,
            session_duration_minutes: 15,
            // Models the round-trip of a real auth backend
            auth_latency: Duration::from_millis(1000),
            // Card processors take noticeably longer than auth
            payment_latency: Duration::from_millis(2000),
            email_latency: Duration::from_millis(1500),
            chat_connect_delay: Duration::from_millis(500),
            chat_join_delay: Duration::from_millis(1000),
            chat_greeting_delay: Duration::from_millis(1000),
            volunteers: default_volunteers(),
            slots: default_slots(),
        }
    }
}
