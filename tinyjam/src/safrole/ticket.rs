//! Ticket envelope verification.

use crate::error::ErrorCode;
use crate::ring_vrf::{ticket_seal_input, RingVrfVerifier};
use crate::types::{BandersnatchPublic, Entropy, TicketEnvelope, TicketMark};

/// Verifies the ticket envelopes of one block against a fixed ring and
/// entropy snapshot.
pub struct TicketValidator<'a, V> {
    verifier: &'a V,
    ring: Vec<BandersnatchPublic>,
    entropy: Entropy,
    tickets_per_validator: u8,
}

impl<'a, V: RingVrfVerifier> TicketValidator<'a, V> {
    pub fn new(
        verifier: &'a V,
        ring: Vec<BandersnatchPublic>,
        entropy: Entropy,
        tickets_per_validator: u8,
    ) -> Self {
        Self {
            verifier,
            ring,
            entropy,
            tickets_per_validator,
        }
    }

    /// Verify one envelope and return the ticket it proves.
    pub fn validate(&self, envelope: &TicketEnvelope) -> Result<TicketMark, ErrorCode> {
        if envelope.attempt >= self.tickets_per_validator {
            return Err(ErrorCode::BadTicketAttempt);
        }

        let input = ticket_seal_input(&self.entropy, envelope.attempt);
        let id = self
            .verifier
            .ring_vrf_verify(&self.ring, &input, &[], &envelope.signature)
            .map_err(|err| {
                tracing::debug!(attempt = envelope.attempt, error = %err, "ticket proof rejected");
                ErrorCode::BadTicketProof
            })?;

        Ok(TicketMark {
            id,
            attempt: envelope.attempt,
        })
    }

    /// Verify every envelope in extrinsic order, stopping at the first
    /// failure.
    pub fn validate_all(&self, extrinsic: &[TicketEnvelope]) -> Result<Vec<TicketMark>, ErrorCode> {
        extrinsic.iter().map(|envelope| self.validate(envelope)).collect()
    }
}
