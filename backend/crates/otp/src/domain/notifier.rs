//! Outbound notification seam
//!
//! The use cases only know that a message goes to a phone. Delivery is best
//! effort: the caller bounds it with a timeout and logs failures.

use thiserror::Error;

use crate::domain::value_objects::PhoneNumber;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn send(&self, to: &PhoneNumber, message: &str) -> Result<(), NotifyError>;
}
