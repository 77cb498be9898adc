//! `clamaction`: quarantine and notification actions for clamsmtpd.
//!
//! When the scanner flags a message, the [`action`] pipeline moves it into a
//! quarantine folder, records who it was for, and mails a report to the
//! administrator and a notice to every original recipient. The [`release`]
//! pipeline later re-delivers a quarantined message by its identifier.

pub mod action;
pub mod compose;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod parser;
pub mod quarantine;
pub mod release;
pub mod smtp;
