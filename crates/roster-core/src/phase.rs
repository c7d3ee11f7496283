//! Request lifecycle phases for protected employee operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a protected request currently is in its lifecycle.
///
/// ```text
/// Unauthenticated -> Authenticated -> [AttachmentProcessed] -> Mutated -> Responded
///        \                 \                    \                  \
///         +-----------------+--------------------+------------------+--> Failed
/// ```
///
/// `Responded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No credential has been verified yet.
    #[default]
    Unauthenticated,
    /// An identity is attached to the request.
    Authenticated,
    /// The single attachment was written to the storage root.
    AttachmentProcessed,
    /// The store operation completed.
    Mutated,
    /// The success response was shaped.
    Responded,
    /// The request failed at some stage.
    Failed,
}

impl Phase {
    /// Returns `true` for `Responded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Responded | Self::Failed)
    }

    /// Returns whether moving from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (_, Self::Failed)
                | (Self::Unauthenticated, Self::Authenticated)
                | (Self::Authenticated, Self::AttachmentProcessed | Self::Mutated)
                | (Self::AttachmentProcessed, Self::Mutated)
                | (Self::Mutated, Self::Responded)
        )
    }

    /// Moves to `next`, or reports the illegal transition.
    pub fn transition(&mut self, next: Self) -> Result<(), TransitionError> {
        if self.can_transition_to(next) {
            *self = next;
            Ok(())
        } else {
            Err(TransitionError {
                from: *self,
                to: next,
            })
        }
    }

    /// Returns a short lowercase name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::AttachmentProcessed => "attachment_processed",
            Self::Mutated => "mutated",
            Self::Responded => "responded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An attempted move the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal phase transition from {from} to {to}")]
pub struct TransitionError {
    /// Phase before the attempt.
    pub from: Phase,
    /// Requested phase.
    pub to: Phase,
}
