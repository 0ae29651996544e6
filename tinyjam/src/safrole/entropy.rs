//! Entropy accumulator.

use blake2::{digest::consts::U32, Blake2b, Digest};

use crate::types::{Entropy, OpaqueHash};

type Blake2b256 = Blake2b<U32>;

/// Blake2b-256 over the concatenation of `parts`.
pub fn blake2b_256(parts: &[&[u8]]) -> OpaqueHash {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    OpaqueHash::from(out)
}

/// Fold the entropy revealed by a block into the live accumulator.
pub fn fold(eta0: &Entropy, block_entropy: &Entropy) -> Entropy {
    blake2b_256(&[eta0.as_bytes(), block_entropy.as_bytes()])
}

/// Shift the epoch snapshots by one. `pre_fold` is the live accumulator as it
/// was before this block folded into it.
pub fn rotate(eta: &mut [Entropy; 4], pre_fold: Entropy) {
    eta[3] = eta[2];
    eta[2] = eta[1];
    eta[1] = pre_fold;
}
