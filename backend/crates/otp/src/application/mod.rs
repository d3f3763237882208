//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod authenticate;
pub mod config;
pub mod request_code;
pub mod verify_code;
