//! Core data model types: decoded headers, outbound messages, quarantine metadata, addresses.

pub mod address;
pub mod header;
pub mod message;
pub mod metadata;
