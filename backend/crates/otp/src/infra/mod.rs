//! Infrastructure Layer
//!
//! Stores and outbound delivery.

pub mod memory;
pub mod notifier;
pub mod postgres;
