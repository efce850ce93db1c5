use std::sync::Arc;

use log::info;
use thiserror::Error;

use openears_core::{PaymentMethod, Storage, StoreError, StoreResult, Timing, TransactionKind};

use crate::{validate_card, CardDetails, CardError, Session, SupportContext, TemplateKind};

/// Fallback recipient for receipts of anonymous donations
const ANONYMOUS_DONOR: &str = "donor@example.com";

#[derive(Debug, Error)]
pub enum DonationError {
    #[error("Please enter a valid donation amount.")]
    InvalidAmount,
    #[error(transparent)]
    Card(#[from] CardError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The donation flow: a caller-chosen amount through the same payment
/// surface as bookings, minus selection and chat.
pub struct Donations<S, T> {
    context: SupportContext<S, T>,
    session: Arc<Session<S, T>>,
}

impl<S, T> Donations<S, T>
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

    /// Donates by card.
    ///
    /// The amount is checked before any payment method is engaged, and the
    /// card before the simulated processor runs.
    pub async fn donate_with_card(
        &self,
        amount: f64,
        details: &CardDetails,
    ) -> Result<(), DonationError> {
        Self::check_amount(amount)?;
        validate_card(details, self.context.timing.now())?;

        self.process(amount, PaymentMethod::Card).await?;

        Ok(())
    }

    /// Completes a donation through the delegated external payment flow
    pub async fn donate_with_external(&self, amount: f64) -> Result<(), DonationError> {
        Self::check_amount(amount)?;

        self.process(amount, PaymentMethod::PayPal).await?;

        Ok(())
    }

    fn check_amount(amount: f64) -> Result<(), DonationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(DonationError::InvalidAmount);
        }

        Ok(())
    }

    async fn process(&self, amount: f64, method: PaymentMethod) -> StoreResult<()> {
        let latency = self.context.config.payment_latency;
        self.context.timing.wait(latency).await;

        self.session
            .add_transaction(
                amount,
                TransactionKind::Donation,
                "Charitable Contribution".to_string(),
                method,
            )
            .await?;

        info!("Donation of ${amount} received via {}", method.label());

        let recipient = self
            .session
            .current_user()
            .map(|u| u.email)
            .unwrap_or_else(|| ANONYMOUS_DONOR.to_string());

        self.context
            .mailer
            .send(
                &recipient,
                TemplateKind::Welcome,
                Some(&format!(
                    "Thank you for your generous donation of ${amount} via {}!",
                    method.label()
                )),
            )
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use openears_core::implementors::{ManualTiming, MemoryStorage};

    use crate::{NewSignup, Support, SupportConfig};

    use super::*;

    fn support() -> Support<MemoryStorage, ManualTiming> {
        Support::new(
            SupportConfig::default(),
            MemoryStorage::default(),
            ManualTiming::default(),
        )
    }

    fn valid_card() -> CardDetails {
        CardDetails {
            number: "4242424242424242".to_string(),
            expiry: "03/27".to_string(),
            cvc: "123".to_string(),
        }
    }

    #[tokio::test]
    async fn zero_and_negative_amounts_are_rejected_before_payment() {
        let support = support();

        let result = support.donations.donate_with_card(0.0, &valid_card()).await;
        assert!(matches!(result, Err(DonationError::InvalidAmount)));

        let result = support.donations.donate_with_external(-5.0).await;
        assert!(matches!(result, Err(DonationError::InvalidAmount)));

        let result = support.donations.donate_with_external(f64::NAN).await;
        assert!(matches!(result, Err(DonationError::InvalidAmount)));
    }

    #[tokio::test]
    async fn the_amount_is_checked_before_the_card() {
        let support = support();

        // Both are invalid; the amount must win
        let result = support
            .donations
            .donate_with_card(0.0, &CardDetails::default())
            .await;

        assert!(matches!(result, Err(DonationError::InvalidAmount)));
    }

    #[tokio::test]
    async fn an_authenticated_donation_lands_in_the_ledger() {
        let support = support();

        let user = support
            .session
            .signup(NewSignup {
                username: "Quiet River".to_string(),
                email: "river@example.com".to_string(),
                location: "Lisbon".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .expect("signs up");

        support
            .donations
            .donate_with_external(25.0)
            .await
            .expect("donates");

        let transactions = support
            .registry
            .transactions_for(&user.id)
            .await
            .expect("lists");

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind, TransactionKind::Donation);
        assert_eq!(transactions[0].amount, 25.0);
        assert_eq!(transactions[0].description, "Charitable Contribution");

        let balance = support.session.current_user().expect("authenticated").balance;
        assert_eq!(balance, 25.0);
    }

    #[tokio::test]
    async fn an_anonymous_donation_leaves_no_trace_in_the_store() {
        let support = support();

        support
            .donations
            .donate_with_card(10.0, &valid_card())
            .await
            .expect("donates");

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
    async fn the_receipt_thanks_the_donor_with_the_amount() {
        let support = support();

        support
            .donations
            .donate_with_external(25.0)
            .await
            .expect("donates");

        let email = std::iter::from_fn(|| support.poll_event()).find_map(|e| match e {
            crate::SupportEvent::EmailSent { to, body, .. } => Some((to, body)),
            _ => None,
        });

        let (to, body) = email.expect("an email was sent");
        assert_eq!(to, "donor@example.com");
        assert!(body.contains("donation of $25 via PayPal!"));
    }
}
