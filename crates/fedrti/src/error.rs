// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors surfaced to the simulation application.

use crate::exception::Exception;
use crate::protocol::{DecodeError, Rejection};
use crate::transport::TransportError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RtiError>;

#[derive(Debug, Error)]
pub enum RtiError {
    /// The broker (or a local precondition) refused the request.
    #[error("{exception}: {reason}")]
    Rejected { exception: Exception, reason: String },

    /// Codec or dispatch contract violation. The federate stops.
    #[error("RTIinternalError: {0}")]
    Internal(String),

    /// The broker connection is gone; execution is finished.
    #[error("connection to broker closed")]
    ConnectionClosed,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("configuration error: {0}")]
    Config(&'static str),
}

impl RtiError {
    pub fn rejected(exception: Exception, reason: impl Into<String>) -> Self {
        RtiError::Rejected {
            exception,
            reason: reason.into(),
        }
    }

    /// Named exception carried by this error, if any.
    pub fn exception(&self) -> Option<Exception> {
        match self {
            RtiError::Rejected { exception, .. } => Some(*exception),
            RtiError::Internal(_) => Some(Exception::RtiInternalError),
            _ => None,
        }
    }

    /// True when the federate can no longer talk to the broker.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RtiError::Internal(_) | RtiError::ConnectionClosed | RtiError::Transport(_)
        )
    }
}

impl From<Rejection> for RtiError {
    fn from(rejection: Rejection) -> Self {
        RtiError::Rejected {
            exception: rejection.exception,
            reason: rejection.reason,
        }
    }
}

impl From<DecodeError> for RtiError {
    fn from(err: DecodeError) -> Self {
        RtiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageKind;

    #[test]
    fn test_rejection_keeps_exception() {
        let err = RtiError::from(Rejection::new(
            MessageKind::PublishObjectClass,
            Exception::SaveInProgress,
            "save open",
        ));
        assert_eq!(err.exception(), Some(Exception::SaveInProgress));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_decode_error_is_internal() {
        let err = RtiError::from(DecodeError::UnknownKind(0));
        assert_eq!(err.exception(), Some(Exception::RtiInternalError));
        assert!(err.is_fatal());
    }
}
