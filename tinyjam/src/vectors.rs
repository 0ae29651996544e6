//! Conformance vectors.
//!
//! A vector records one transition: the input, the pre-state, and the
//! expected output and post-state. Vectors come as JSON, or as the binary
//! encoding of the same four fields in order.

use std::io::Read;

use parity_scale_codec::{Decode, DecodeAll, Encode};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::ring_vrf::RingVrfVerifier;
use crate::safrole::Safrole;
use crate::types::{SafroleInput, SafroleOutput, SafroleState};

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct SafroleVector {
    pub input: SafroleInput,
    pub pre_state: SafroleState,
    pub output: SafroleOutput,
    pub post_state: SafroleState,
}

/// Loading or running a vector failed.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("invalid vector json")]
    Json(#[from] serde_json::Error),
    #[error("invalid vector encoding")]
    Codec(#[from] parity_scale_codec::Error),
    #[error("output mismatch: expected {expected:?}, got {actual:?}")]
    Output {
        expected: Box<SafroleOutput>,
        actual: Box<SafroleOutput>,
    },
    #[error("post-state mismatch at slot {slot}")]
    PostState {
        slot: u32,
        expected: Box<SafroleState>,
        actual: Box<SafroleState>,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl SafroleVector {
    pub fn from_json(json: &str) -> Result<Self, VectorError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, VectorError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, VectorError> {
        Ok(Self::decode_all(&mut bytes)?)
    }

    /// Apply the vector's input to its pre-state and compare against the
    /// expectation. A rejected block is expected to leave the pre-state.
    pub fn run<V: RingVrfVerifier>(&self, safrole: &Safrole<V>) -> Result<(), VectorError> {
        let (output, post_state) = match safrole.apply(&self.pre_state, &self.input) {
            Ok((marks, post)) => (SafroleOutput::Ok(marks), post),
            Err(TransitionError::Rejected(code)) => {
                (SafroleOutput::Err(code), self.pre_state.clone())
            }
            Err(err) => return Err(err.into()),
        };

        if output != self.output {
            return Err(VectorError::Output {
                expected: Box::new(self.output.clone()),
                actual: Box::new(output),
            });
        }
        if post_state != self.post_state {
            return Err(VectorError::PostState {
                slot: self.input.slot,
                expected: Box::new(self.post_state.clone()),
                actual: Box::new(post_state),
            });
        }

        Ok(())
    }
}
