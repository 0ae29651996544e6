//! # Tinyjam
//!
//! A tiny implementation of the Polkadot JAM protocol.
//!
//! ## Consensus logic
//!
//! Block production in `tinyjam` is Safrole: each epoch, validators compete
//! with anonymous ring-VRF tickets for the right to seal the slots of the
//! next epoch, with a fallback to entropy-drawn keys when the contest does
//! not fill up. See [`safrole`].
//!
//! State transitions are plain functions from a pre-state and a block input
//! to an output and a post-state, behind the [`StateTransition`] trait. The
//! parts are swappable: any transition can be driven by [`State`], which
//! holds the current state of a chain and replaces it only when a block is
//! accepted.
//!
//! Cryptography is not implemented here. Ring-VRF proofs and commitments come
//! from a [`ring_vrf::RingVrfVerifier`] provider.

pub mod error;
pub mod params;
pub mod ring_vrf;
pub mod safrole;
pub mod types;
pub mod vectors;

pub use crate::error::{ErrorCode, ParamsError, StateError, TransitionError};
pub use crate::params::Params;
pub use crate::ring_vrf::RingVrfVerifier;
pub use crate::safrole::Safrole;

/// A deterministic state transition function.
pub trait StateTransition {
    /// State the transition advances.
    type State;
    /// Per-block input.
    type Input;
    /// Output of an accepted block.
    type Output;
    /// Rejection or failure.
    type Error;

    /// Compute the post-state of `pre` under `input`. `pre` is never
    /// modified.
    fn apply(
        &self,
        pre: &Self::State,
        input: &Self::Input,
    ) -> Result<(Self::Output, Self::State), Self::Error>;
}

/// Current state of a chain under a given transition.
pub struct State<Consensus: StateTransition> {
    /// State of the consensus, such as Safrole.
    pub consensus: Consensus::State,
}

impl<Consensus: StateTransition> State<Consensus> {
    pub fn new(consensus: Consensus::State) -> Self {
        Self { consensus }
    }

    /// Import a block. The held state is replaced only if the transition
    /// accepts the block.
    pub fn import(
        &mut self,
        transition: &Consensus,
        input: &Consensus::Input,
    ) -> Result<Consensus::Output, Consensus::Error> {
        let (output, post) = transition.apply(&self.consensus, input)?;
        self.consensus = post;
        Ok(output)
    }
}
