//! Logging bootstrap with PII redaction
//!
//! - [`init`] installs the global `tracing` subscriber: pretty output for
//!   development, JSON for production.
//! - [`PiiRedactor`] masks or hashes emails, phone numbers, SSNs and IP
//!   addresses before they reach a log line. Hashed values keep the same
//!   token for the same input, so entries can still be correlated.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{redact, redact_email};
//!
//! let line = redact("login failed for doctor1@hospital.com");
//! assert!(!line.contains("doctor1"));
//! assert!(line.ends_with(&redact_email("doctor1@hospital.com")));
//! ```

pub mod config;
pub mod redactor;
pub mod subscriber;

pub use config::*;
pub use redactor::*;
pub use subscriber::*;
