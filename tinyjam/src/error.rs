use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Reasons for which the Safrole transition rejects a block.
///
/// The discriminants are the wire values of the binary encoding.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize, thiserror::Error,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Slot does not advance past the last applied slot.
    #[error("slot does not advance past the last applied slot")]
    BadSlot = 0,
    /// Tickets submitted after the contest window closed.
    #[error("tickets submitted after the contest window closed")]
    UnexpectedTicket = 1,
    /// Ticket ids of the extrinsic are not in ascending order.
    #[error("ticket ids are not in ascending order")]
    BadTicketOrder = 2,
    /// Ring-VRF proof of a ticket did not verify.
    #[error("ticket proof does not verify against the pending ring")]
    BadTicketProof = 3,
    /// Attempt index out of range, or not increasing for an id collision.
    #[error("invalid ticket attempt")]
    BadTicketAttempt = 4,
    /// Unused wire value, kept so later codes keep their discriminants.
    #[error("reserved")]
    Reserved = 5,
    /// Same ticket already in the accumulator or the extrinsic.
    #[error("duplicate ticket")]
    DuplicateTicket = 6,
}

/// Failure of a transition attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// The block is invalid.
    #[error("block rejected: {0}")]
    Rejected(#[from] ErrorCode),
    /// The pre-state does not fit the configured parameters.
    #[error("malformed pre-state: {0}")]
    InvalidState(#[from] StateError),
    /// The ring-VRF provider could not commit to the new pending ring.
    #[error("ring commitment failed")]
    RingCommitment(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TransitionError {
    /// Protocol error code, if this is a block rejection.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            TransitionError::Rejected(code) => Some(*code),
            _ => None,
        }
    }
}

/// Structural invariant violated by a state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("validator set {set} has {actual} entries, expected {expected}")]
    ValidatorSetSize {
        set: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("ticket accumulator holds {len} entries, capacity is {capacity}")]
    AccumulatorOverflow { len: usize, capacity: usize },
    #[error("ticket accumulator is not ordered by id")]
    AccumulatorOrder,
    #[error("sealer sequence has {actual} entries, expected {expected}")]
    SealerSequenceLength { expected: usize, actual: usize },
}

/// Invalid protocol parameters.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("contest duration {contest_duration} must be below the epoch length {epoch_length}")]
    ContestTooLong {
        contest_duration: u32,
        epoch_length: u32,
    },
    #[error("invalid parameters json")]
    Json(#[from] serde_json::Error),
}
