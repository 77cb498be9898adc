//! Outbound message composition: building, serializing, and defanging.

pub mod builder;
pub mod defang;
