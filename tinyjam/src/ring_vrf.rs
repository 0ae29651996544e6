//! Boundary to the ring-VRF cryptography.
//!
//! Safrole never touches curve arithmetic itself. Ticket proofs are checked,
//! and ring commitments computed, by a provider implementing
//! [`RingVrfVerifier`]. A provider usually wraps a native library loaded with
//! its structured reference string; tests use a deterministic mock.

use crate::types::{BandersnatchPublic, Entropy, OpaqueHash, RingCommitment, RingVrfSignature};

/// Domain separation context of ticket proofs.
pub const TICKET_SEAL_CONTEXT: &[u8] = b"jam_ticket_seal";

/// Ring-VRF verification and ring commitment.
pub trait RingVrfVerifier {
    /// Error type of the provider.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Verify an anonymous ring signature over `input` and `aux`, made by one
    /// of the members of `ring`. Returns the VRF output on success.
    fn ring_vrf_verify(
        &self,
        ring: &[BandersnatchPublic],
        input: &[u8],
        aux: &[u8],
        signature: &RingVrfSignature,
    ) -> Result<OpaqueHash, Self::Error>;

    /// Commit to a ring of keys.
    fn ring_commitment(&self, ring: &[BandersnatchPublic]) -> Result<RingCommitment, Self::Error>;
}

impl<V: RingVrfVerifier + ?Sized> RingVrfVerifier for &V {
    type Error = V::Error;

    fn ring_vrf_verify(
        &self,
        ring: &[BandersnatchPublic],
        input: &[u8],
        aux: &[u8],
        signature: &RingVrfSignature,
    ) -> Result<OpaqueHash, Self::Error> {
        (**self).ring_vrf_verify(ring, input, aux, signature)
    }

    fn ring_commitment(&self, ring: &[BandersnatchPublic]) -> Result<RingCommitment, Self::Error> {
        (**self).ring_commitment(ring)
    }
}

/// VRF input of a ticket: `"jam_ticket_seal" ++ entropy ++ attempt`.
pub fn ticket_seal_input(entropy: &Entropy, attempt: u8) -> Vec<u8> {
    let mut input = Vec::with_capacity(TICKET_SEAL_CONTEXT.len() + Entropy::LEN + 1);
    input.extend_from_slice(TICKET_SEAL_CONTEXT);
    input.extend_from_slice(entropy.as_bytes());
    input.push(attempt);
    input
}
