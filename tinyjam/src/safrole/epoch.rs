//! Epoch boundaries: validator and entropy rotation, and the sealer
//! sequence of the new epoch.

use itertools::Itertools;

use super::entropy::{self, blake2b_256};
use crate::error::TransitionError;
use crate::params::Params;
use crate::ring_vrf::RingVrfVerifier;
use crate::types::{
    BandersnatchPublic, Entropy, EpochMark, EpochMarkValidator, SafroleState, TicketMark,
    TicketsOrKeys, ValidatorSet,
};

/// Reorder a sorted sequence by alternately taking from both ends:
/// `[s0, s1, .., s(n-1)]` becomes `[s0, s(n-1), s1, s(n-2), ..]`.
pub fn outside_in<T: Clone>(sorted: &[T]) -> Vec<T> {
    let (front, back) = sorted.split_at((sorted.len() + 1) / 2);
    front.iter().interleave(back.iter().rev()).cloned().collect()
}

/// Sealer keys of an epoch whose ticket contest did not produce a sequence.
///
/// Slot `i` is sealed by `validators[LE32(H(entropy ++ LE32(i))[..4]) mod V]`.
/// `validators` must not be empty.
pub fn fallback_keys(
    entropy: &Entropy,
    validators: &ValidatorSet,
    epoch_length: u32,
) -> Vec<BandersnatchPublic> {
    let keys = validators.bandersnatch_keys();

    (0..epoch_length)
        .map(|i| {
            let hash = blake2b_256(&[entropy.as_bytes(), &i.to_le_bytes()[..]]);
            let pick = u32::from_le_bytes([hash.0[0], hash.0[1], hash.0[2], hash.0[3]]);
            keys[pick as usize % keys.len()]
        })
        .collect()
}

/// Rotate `post` if `post.tau` lies in a later epoch than `pre.tau`.
///
/// `post` is the working copy of `pre` with the new slot set and this block's
/// entropy already folded. Any number of skipped epochs is collapsed into a
/// single rotation. Returns the epoch mark if a boundary was crossed.
pub fn transition<V: RingVrfVerifier>(
    params: &Params,
    verifier: &V,
    pre: &SafroleState,
    post: &mut SafroleState,
) -> Result<Option<EpochMark>, TransitionError> {
    let old_epoch = params.epoch_of(pre.tau);
    let new_epoch = params.epoch_of(post.tau);
    if new_epoch == old_epoch {
        return Ok(None);
    }

    entropy::rotate(&mut post.eta, pre.eta[0]);

    let pending = post.iota.without_offenders(&post.post_offenders);
    let active = std::mem::replace(&mut post.gamma_k, pending);
    post.lambda = std::mem::replace(&mut post.kappa, active);

    post.gamma_a.clear();

    let skipped = new_epoch - old_epoch - 1;
    let contest_closed = !params.is_contest_open(pre.tau);
    let saturated = pre.gamma_a.len() == params.epoch_length as usize;
    post.gamma_s = if skipped == 0 && saturated && contest_closed {
        TicketsOrKeys::Tickets(outside_in(pre.gamma_a.as_slice()))
    } else {
        tracing::warn!(
            skipped,
            tickets = pre.gamma_a.len(),
            contest_closed,
            "no ticket sequence for epoch {}, using fallback keys",
            new_epoch
        );
        TicketsOrKeys::Keys(fallback_keys(&post.eta[2], &post.kappa, params.epoch_length))
    };

    post.gamma_z = verifier
        .ring_commitment(&post.gamma_k.bandersnatch_keys())
        .map_err(|err| TransitionError::RingCommitment(Box::new(err)))?;

    tracing::info!(
        old_epoch,
        new_epoch,
        ticketed = post.gamma_s.is_tickets(),
        "epoch transition"
    );

    Ok(Some(EpochMark {
        entropy: pre.eta[0],
        tickets_entropy: pre.eta[1],
        validators: post
            .gamma_k
            .iter()
            .map(|v| EpochMarkValidator {
                bandersnatch: v.bandersnatch,
                ed25519: v.ed25519,
            })
            .collect(),
    }))
}

/// Tickets mark to publish once the contest of the current epoch is over.
///
/// Nothing is published in a block that crossed an epoch boundary, nor while
/// the slot phase is at or below the contest duration.
pub fn tickets_mark(
    params: &Params,
    post: &SafroleState,
    crossed_boundary: bool,
) -> Option<Vec<TicketMark>> {
    if crossed_boundary || params.phase_of(post.tau) <= params.contest_duration {
        return None;
    }

    match &post.gamma_s {
        TicketsOrKeys::Tickets(tickets) => Some(tickets.clone()),
        TicketsOrKeys::Keys(_) if post.gamma_a.is_empty() => None,
        TicketsOrKeys::Keys(_) => Some(outside_in(post.gamma_a.as_slice())),
    }
}
