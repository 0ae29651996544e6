//! Shared fixtures: a mock ring-VRF provider and tiny-chain builders.

#![allow(dead_code)]

use tinyjam::ring_vrf::{ticket_seal_input, RingVrfVerifier};
use tinyjam::safrole::accumulator::TicketAccumulator;
use tinyjam::safrole::entropy::blake2b_256;
use tinyjam::types::{
    BandersnatchPublic, Entropy, OpaqueHash, RingCommitment, RingVrfSignature, SafroleInput,
    SafroleState, TicketEnvelope, TicketMark, ValidatorInfo, ValidatorSet,
};
use tinyjam::{Params, Safrole};

/// Mock proofs are laid out as `id ++ H(input) ++ signer key ++ zeros`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockRingVrf;

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("proof is not over the given input")]
    Input,
    #[error("signer is not a ring member")]
    NotInRing,
    #[error("empty ring")]
    EmptyRing,
}

impl RingVrfVerifier for MockRingVrf {
    type Error = MockError;

    fn ring_vrf_verify(
        &self,
        ring: &[BandersnatchPublic],
        input: &[u8],
        _aux: &[u8],
        signature: &RingVrfSignature,
    ) -> Result<OpaqueHash, MockError> {
        let proof = &signature.0;
        if proof[32..64] != blake2b_256(&[input]).0[..] {
            return Err(MockError::Input);
        }
        if !ring.iter().any(|key| key.0[..] == proof[64..96]) {
            return Err(MockError::NotInRing);
        }

        let mut id = [0u8; 32];
        id.copy_from_slice(&proof[..32]);
        Ok(id.into())
    }

    fn ring_commitment(&self, ring: &[BandersnatchPublic]) -> Result<RingCommitment, MockError> {
        if ring.is_empty() {
            return Err(MockError::EmptyRing);
        }

        let keys: Vec<&[u8]> = ring.iter().map(|key| key.as_bytes()).collect();
        let digest = blake2b_256(&keys);
        let mut commitment = [0u8; 144];
        for (i, byte) in commitment.iter_mut().enumerate() {
            *byte = digest.0[i % 32];
        }
        Ok(commitment.into())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn safrole() -> Safrole<MockRingVrf> {
    init_tracing();
    Safrole::new(Params::tiny(), MockRingVrf).expect("tiny parameters are valid")
}

pub fn validator(i: u8) -> ValidatorInfo {
    ValidatorInfo {
        bandersnatch: [i; 32].into(),
        ed25519: [i.wrapping_add(100); 32].into(),
        bls: [i; 144].into(),
        metadata: [i; 128].into(),
    }
}

/// Validators `first..first + 6`.
pub fn validators(first: u8) -> ValidatorSet {
    ValidatorSet((first..first + 6).map(validator).collect())
}

pub fn genesis(safrole: &Safrole<MockRingVrf>) -> SafroleState {
    safrole
        .genesis(validators(1), Entropy::from([0x5a; 32]))
        .expect("genesis")
}

pub fn ticket_id(n: u8) -> OpaqueHash {
    OpaqueHash::from([n; 32])
}

pub fn mark(n: u8, attempt: u8) -> TicketMark {
    TicketMark {
        id: ticket_id(n),
        attempt,
    }
}

/// An envelope that the mock provider verifies to ticket id `n`, if `eta2`
/// is the entropy snapshot the transition checks against and `signer` is in
/// the ring.
pub fn envelope(n: u8, attempt: u8, signer: &ValidatorInfo, eta2: &Entropy) -> TicketEnvelope {
    let input = ticket_seal_input(eta2, attempt);
    let mut signature = [0u8; 784];
    signature[..32].copy_from_slice(ticket_id(n).as_bytes());
    signature[32..64].copy_from_slice(blake2b_256(&[&input[..]]).as_bytes());
    signature[64..96].copy_from_slice(signer.bandersnatch.as_bytes());

    TicketEnvelope {
        attempt,
        signature: signature.into(),
    }
}

pub fn input(slot: u32, extrinsic: Vec<TicketEnvelope>) -> SafroleInput {
    SafroleInput {
        slot,
        entropy: Entropy::from([slot as u8; 32]),
        extrinsic,
    }
}

pub fn accumulator(marks: &[TicketMark]) -> TicketAccumulator {
    TicketAccumulator::new()
        .merge(marks, 12)
        .expect("fixture tickets are ordered")
}

/// Twelve tickets with ids `10, 20, .., 120`.
pub fn full_accumulator() -> TicketAccumulator {
    let marks: Vec<TicketMark> = (1..=12).map(|i| mark(i * 10, 0)).collect();
    accumulator(&marks)
}
