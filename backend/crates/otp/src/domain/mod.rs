//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (OtpRecord, Profile, Session)
//! - Domain value objects (PhoneNumber, OtpCode, SessionToken)
//! - Repository traits (interfaces)
//! - Notifier trait (outbound SMS)

pub mod entities;
pub mod notifier;
pub mod repository;
pub mod value_objects;
