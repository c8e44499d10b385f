//! Error types for the telemetry pipeline.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context for debugging and recovery guidance.
//!
//! ## Error Categories
//!
//! - **Framing Errors**: impossible reassembly-buffer states or oversized backlogs
//! - **Transport Errors**: discovery, connect, or notification failures from the link
//! - **Sink Errors**: persistent-log write or finalization failures
//! - **Consumer Errors**: a registered record consumer failed during delivery
//! - **Config Errors**: invalid or unreadable pipeline configuration
//!
//! ## Recovery and Retry
//!
//! Errors classify themselves as retryable or terminal:
//!
//! ```rust
//! use lumitel::TelemetryError;
//!
//! let error = TelemetryError::transport("device out of range");
//! if error.is_retryable() {
//!     println!("Can retry this operation");
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry pipeline operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Framing error: {details}")]
    Framing { details: String },

    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Log sink error: {path}")]
    Sink {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Consumer '{name}' failed: {details}")]
    Consumer { name: String, details: String },

    #[error("Invalid configuration: {details}")]
    Config { details: String },

    #[error("A session is already active")]
    SessionActive,

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// The pipeline itself never retries (that policy belongs to the caller
    /// issuing connect requests), but callers can use this classification.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Transport { .. } => true,
            TelemetryError::Timeout { .. } => true,
            TelemetryError::Sink { .. } => true,
            TelemetryError::Framing { .. } => false,
            TelemetryError::Consumer { .. } => false,
            TelemetryError::Config { .. } => false,
            TelemetryError::SessionActive => false,
        }
    }

    /// Helper constructor for framing errors.
    pub fn framing(details: impl Into<String>) -> Self {
        TelemetryError::Framing { details: details.into() }
    }

    /// Helper constructor for transport errors.
    pub fn transport(reason: impl Into<String>) -> Self {
        TelemetryError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with a source.
    pub fn transport_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for sink errors with path context.
    pub fn sink(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        TelemetryError::Sink { path: path.into(), source: source.into() }
    }

    /// Helper constructor for consumer delivery failures.
    pub fn consumer(name: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Consumer { name: name.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        TelemetryError::Config { details: details.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Sink { path: PathBuf::from("<unknown>"), source: Box::new(err) }
    }
}

impl From<serde_yaml_ng::Error> for TelemetryError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TelemetryError::Config { details: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_contain_their_context(
                reason in ".*",
                name in "\\w+",
                details in ".*",
            ) {
                let transport = TelemetryError::transport(reason.clone());
                prop_assert!(transport.to_string().contains(&reason));

                let consumer = TelemetryError::consumer(name.clone(), details.clone());
                let msg = consumer.to_string();
                prop_assert!(msg.contains(&name));
                prop_assert!(msg.contains(&details));

                let framing = TelemetryError::framing(details.clone());
                prop_assert!(framing.to_string().contains(&details));
            }

            #[test]
            fn io_conversion_preserves_source_message(reason in ".*") {
                let io_err = std::io::Error::other(reason.clone());
                let converted: TelemetryError = io_err.into();
                match converted {
                    TelemetryError::Sink { source, .. } => {
                        prop_assert_eq!(source.to_string(), reason);
                    }
                    _ => prop_assert!(false, "Expected Sink error from io::Error conversion"),
                }
            }
        }
    }

    #[test]
    fn error_constructors_validation() {
        let framing = TelemetryError::framing("buffer overrun");
        assert!(matches!(framing, TelemetryError::Framing { .. }));

        let transport = TelemetryError::transport("device vanished");
        assert!(matches!(transport, TelemetryError::Transport { .. }));

        let sink = TelemetryError::sink("/tmp/log.csv", std::io::Error::other("disk full"));
        assert!(matches!(sink, TelemetryError::Sink { .. }));
    }

    #[test]
    fn error_traits_validation() {
        // Compile-time check: TelemetryError must be Send + Sync + 'static
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TelemetryError>();

        let error = TelemetryError::transport("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retryable_classification() {
        assert!(TelemetryError::transport("scan failed").is_retryable());
        assert!(TelemetryError::Timeout { duration: Duration::from_secs(1) }.is_retryable());
        assert!(!TelemetryError::framing("impossible state").is_retryable());
        assert!(!TelemetryError::SessionActive.is_retryable());
        assert!(!TelemetryError::config("bad yaml").is_retryable());
    }

    #[test]
    fn source_chaining_is_preserved() {
        let io_err = std::io::Error::other("flush failed");
        let sink = TelemetryError::sink("/data/session.csv", io_err);

        let source = std::error::Error::source(&sink).expect("sink errors carry a source");
        assert_eq!(source.to_string(), "flush failed");
    }
}
