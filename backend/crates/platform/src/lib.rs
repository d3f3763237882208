//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (CSPRNG codes and tokens, SHA-256, constant-time eq)
//! - Request header helpers (`Authorization: Bearer` extraction)
//! - SMS gateway client

pub mod client;
pub mod crypto;
pub mod sms;
