//! # Safrole
//!
//! Block production consensus of JAM. Every block advances the Safrole state
//! once, with its slot, the entropy revealed by its seal, and the tickets it
//! carries. From that state follows the sequence of keys permitted to seal
//! each slot of the current epoch.
//!
//! ## Epochs
//!
//! Slots are grouped into epochs of `epoch_length` slots. In the first
//! `contest_duration` slots of an epoch, validators submit anonymous tickets,
//! ring-VRF proofs against the pending validator ring. The accumulator keeps
//! the tickets with the lowest ids. If it is full when the contest closes,
//! the next epoch is sealed by those tickets, reordered outside-in. Otherwise
//! the next epoch falls back to validator keys drawn from entropy.
//!
//! ## Atomicity
//!
//! [`Safrole::apply`] never touches its pre-state. It works on a copy and
//! hands the copy back only if the whole block was valid. A single bad ticket
//! rejects the block.

pub mod accumulator;
pub mod entropy;
pub mod epoch;
pub mod ticket;

use crate::error::{ErrorCode, ParamsError, StateError, TransitionError};
use crate::params::Params;
use crate::ring_vrf::RingVrfVerifier;
use crate::types::{
    Entropy, OutputMarks, SafroleInput, SafroleState, TicketsOrKeys, ValidatorSet,
};
use crate::StateTransition;

use self::accumulator::TicketAccumulator;
use self::ticket::TicketValidator;

/// The Safrole state transition, configured with protocol parameters and a
/// ring-VRF provider.
#[derive(Clone, Debug)]
pub struct Safrole<V> {
    params: Params,
    verifier: V,
}

impl<V: RingVrfVerifier> Safrole<V> {
    pub fn new(params: Params, verifier: V) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self { params, verifier })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Initial state of a chain started at slot 0 with the given validators
    /// in every set, and the given entropy in every snapshot.
    pub fn genesis(
        &self,
        validators: ValidatorSet,
        entropy: Entropy,
    ) -> Result<SafroleState, TransitionError> {
        if validators.len() != self.params.validator_count {
            return Err(StateError::ValidatorSetSize {
                set: "genesis",
                expected: self.params.validator_count,
                actual: validators.len(),
            }
            .into());
        }

        let gamma_z = self
            .verifier
            .ring_commitment(&validators.bandersnatch_keys())
            .map_err(|err| TransitionError::RingCommitment(Box::new(err)))?;
        let gamma_s = TicketsOrKeys::Keys(epoch::fallback_keys(
            &entropy,
            &validators,
            self.params.epoch_length,
        ));

        Ok(SafroleState {
            tau: 0,
            eta: [entropy; 4],
            lambda: validators.clone(),
            kappa: validators.clone(),
            gamma_k: validators.clone(),
            iota: validators,
            gamma_a: TicketAccumulator::new(),
            gamma_s,
            gamma_z,
            post_offenders: Vec::new(),
        })
    }

    /// Apply one block. On success, returns the header marks and the
    /// post-state. On failure `pre` is the state to keep.
    pub fn apply(
        &self,
        pre: &SafroleState,
        input: &SafroleInput,
    ) -> Result<(OutputMarks, SafroleState), TransitionError> {
        pre.check(&self.params)?;

        let result = self.transition(pre, input);
        match &result {
            Ok((marks, post)) => tracing::trace!(
                slot = input.slot,
                tickets = post.gamma_a.len(),
                epoch_mark = marks.epoch_mark.is_some(),
                tickets_mark = marks.tickets_mark.is_some(),
                "safrole transition applied"
            ),
            Err(TransitionError::Rejected(code)) => tracing::debug!(
                slot = input.slot,
                tau = pre.tau,
                code = ?code,
                "safrole transition rejected: {}",
                code
            ),
            Err(err) => tracing::warn!(slot = input.slot, "safrole transition failed: {}", err),
        }

        result
    }

    fn transition(
        &self,
        pre: &SafroleState,
        input: &SafroleInput,
    ) -> Result<(OutputMarks, SafroleState), TransitionError> {
        if input.slot <= pre.tau {
            return Err(ErrorCode::BadSlot.into());
        }

        let mut post = pre.clone();
        post.tau = input.slot;

        if !self.params.is_contest_open(post.tau) && !input.extrinsic.is_empty() {
            return Err(ErrorCode::UnexpectedTicket.into());
        }

        post.eta[0] = entropy::fold(&pre.eta[0], &input.entropy);

        let epoch_mark = epoch::transition(&self.params, &self.verifier, pre, &mut post)?;

        let validator = TicketValidator::new(
            &self.verifier,
            post.gamma_k.bandersnatch_keys(),
            post.eta[2],
            self.params.tickets_per_validator,
        );
        let candidates = validator.validate_all(&input.extrinsic)?;

        if !candidates.is_empty() {
            // At a boundary the working accumulator is already cleared, so
            // only the extrinsic itself is checked and nothing is admitted.
            let merged = post
                .gamma_a
                .merge(&candidates, self.params.epoch_length as usize)?;
            if epoch_mark.is_none() {
                post.gamma_a = merged;
            }
        }

        let tickets_mark = epoch::tickets_mark(&self.params, &post, epoch_mark.is_some());

        Ok((
            OutputMarks {
                epoch_mark,
                tickets_mark,
            },
            post,
        ))
    }
}

impl<V: RingVrfVerifier> StateTransition for Safrole<V> {
    type State = SafroleState;
    type Input = SafroleInput;
    type Output = OutputMarks;
    type Error = TransitionError;

    fn apply(
        &self,
        pre: &SafroleState,
        input: &SafroleInput,
    ) -> Result<(OutputMarks, SafroleState), TransitionError> {
        Safrole::apply(self, pre, input)
    }
}
