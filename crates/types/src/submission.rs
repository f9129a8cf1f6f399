use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::OrderId;

/// Acknowledgement returned by the order API for an accepted order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub order_id: OrderId,
    /// Identifier assigned by the downstream venue
    pub venue_order_id: String,
    pub accepted_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    pub fn new(order_id: OrderId, venue_order_id: impl Into<String>) -> Self {
        Self {
            order_id,
            venue_order_id: venue_order_id.into(),
            accepted_at: Utc::now(),
        }
    }
}

/// Failure reported by the order API for a single order
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SubmissionError {
    #[error("rejected: {reason}")]
    Rejected { reason: String },

    #[error("transport error: {reason}")]
    Transport { reason: String },

    #[error("timed out")]
    Timeout,

    /// The submitter panicked instead of returning
    #[error("submitter panicked: {reason}")]
    Panicked { reason: String },
}

impl SubmissionError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        SubmissionError::Rejected {
            reason: reason.into(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        SubmissionError::Transport {
            reason: reason.into(),
        }
    }

    pub fn panicked(reason: impl Into<String>) -> Self {
        SubmissionError::Panicked {
            reason: reason.into(),
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::Rejected { .. } => "rejected",
            SubmissionError::Transport { .. } => "transport",
            SubmissionError::Timeout => "timeout",
            SubmissionError::Panicked { .. } => "panicked",
        }
    }
}
