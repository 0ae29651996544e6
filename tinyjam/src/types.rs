//! Data model of the Safrole state transition.
//!
//! Every type here has two representations: a JSON one (through `serde`, with
//! byte strings as `0x`-prefixed hex) used by conformance vectors, and a
//! binary one (through `parity-scale-codec`) used for persistence. Field
//! order of the structs is the encoding order.

use core::fmt;
use parity_scale_codec::{Decode, Encode, EncodeLike, Error as CodecError, Input, Output};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ErrorCode, StateError};
use crate::params::Params;
use crate::safrole::accumulator::TicketAccumulator;

/// Fixed-width byte string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteArray<const N: usize>(pub [u8; N]);

impl<const N: usize> ByteArray<N> {
    /// Width in bytes.
    pub const LEN: usize = N;

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl<const N: usize> Default for ByteArray<N> {
    fn default() -> Self {
        Self([0u8; N])
    }
}

impl<const N: usize> From<[u8; N]> for ByteArray<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> AsRef<[u8]> for ByteArray<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> fmt::Debug for ByteArray<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl<const N: usize> fmt::Display for ByteArray<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl<const N: usize> Encode for ByteArray<N> {
    fn size_hint(&self) -> usize {
        N
    }

    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        dest.write(&self.0)
    }
}

impl<const N: usize> EncodeLike for ByteArray<N> {}

impl<const N: usize> Decode for ByteArray<N> {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let mut bytes = [0u8; N];
        input.read(&mut bytes)?;
        Ok(Self(bytes))
    }
}

impl<const N: usize> Serialize for ByteArray<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de, const N: usize> Deserialize<'de> for ByteArray<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits = text
            .strip_prefix("0x")
            .ok_or_else(|| de::Error::custom("byte string must start with 0x"))?;

        let mut bytes = [0u8; N];
        hex::decode_to_slice(digits, &mut bytes).map_err(de::Error::custom)?;
        Ok(Self(bytes))
    }
}

/// Block slot index.
pub type TimeSlot = u32;
/// 32-byte hash output.
pub type OpaqueHash = ByteArray<32>;
/// One entry of the entropy buffer.
pub type Entropy = OpaqueHash;
/// Bandersnatch public key.
pub type BandersnatchPublic = ByteArray<32>;
/// Ed25519 public key.
pub type Ed25519Public = ByteArray<32>;
/// BLS public key.
pub type BlsPublic = ByteArray<144>;
/// Opaque validator metadata.
pub type ValidatorMetadata = ByteArray<128>;
/// Ring commitment ("ring root") over a set of Bandersnatch keys.
pub type RingCommitment = ByteArray<144>;
/// Ring-VRF signature carried by a ticket envelope.
pub type RingVrfSignature = ByteArray<784>;

/// Public key material of one validator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub bandersnatch: BandersnatchPublic,
    pub ed25519: Ed25519Public,
    pub bls: BlsPublic,
    pub metadata: ValidatorMetadata,
}

impl ValidatorInfo {
    /// Whether this is the all-zero key set used in place of an offender.
    pub fn is_null(&self) -> bool {
        self.bandersnatch.is_zero()
            && self.ed25519.is_zero()
            && self.bls.is_zero()
            && self.metadata.is_zero()
    }
}

/// An ordered validator set. Its length is `Params::validator_count`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorSet(pub Vec<ValidatorInfo>);

impl ValidatorSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ValidatorInfo> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatorInfo> {
        self.0.iter()
    }

    /// Bandersnatch keys in set order, the ring of ticket proofs.
    pub fn bandersnatch_keys(&self) -> Vec<BandersnatchPublic> {
        self.0.iter().map(|v| v.bandersnatch).collect()
    }

    /// Copy of the set where every validator whose Ed25519 key is listed in
    /// `offenders` is replaced by a null key set.
    pub fn without_offenders(&self, offenders: &[Ed25519Public]) -> ValidatorSet {
        ValidatorSet(
            self.0
                .iter()
                .map(|v| {
                    if offenders.contains(&v.ed25519) {
                        ValidatorInfo::default()
                    } else {
                        v.clone()
                    }
                })
                .collect(),
        )
    }
}

/// A verified ticket: the VRF output of its proof and the attempt index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct TicketMark {
    pub id: OpaqueHash,
    pub attempt: u8,
}

/// A ticket as submitted in the block extrinsic.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TicketEnvelope {
    pub attempt: u8,
    pub signature: RingVrfSignature,
}

/// Keys of one validator announced in an epoch mark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EpochMarkValidator {
    pub bandersnatch: BandersnatchPublic,
    pub ed25519: Ed25519Public,
}

/// Emitted in the first block of a new epoch.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EpochMark {
    /// Entropy accumulator before this block's rotation.
    pub entropy: Entropy,
    /// First historical entropy snapshot before this block's rotation.
    pub tickets_entropy: Entropy,
    /// The new pending validator set.
    pub validators: Vec<EpochMarkValidator>,
}

/// The sealer sequence of an epoch. Both variants hold exactly
/// `Params::epoch_length` entries.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketsOrKeys {
    /// Sequence derived from the winning tickets of the contest.
    #[codec(index = 0)]
    Tickets(Vec<TicketMark>),
    /// Fallback sequence of validator keys.
    #[codec(index = 1)]
    Keys(Vec<BandersnatchPublic>),
}

impl TicketsOrKeys {
    pub fn len(&self) -> usize {
        match self {
            TicketsOrKeys::Tickets(tickets) => tickets.len(),
            TicketsOrKeys::Keys(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_tickets(&self) -> bool {
        matches!(self, TicketsOrKeys::Tickets(_))
    }

    /// Sealer for the given slot phase within the epoch.
    pub fn sealer(&self, phase: usize) -> Option<SealerKey> {
        match self {
            TicketsOrKeys::Tickets(tickets) => tickets.get(phase).copied().map(SealerKey::Ticket),
            TicketsOrKeys::Keys(keys) => keys.get(phase).copied().map(SealerKey::Key),
        }
    }
}

/// What a block author of a given slot has to seal with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SealerKey {
    /// The author must reveal the ticket with this id.
    Ticket(TicketMark),
    /// The author must own this Bandersnatch key.
    Key(BandersnatchPublic),
}

/// Consensus state advanced once per block.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct SafroleState {
    /// Last applied slot.
    pub tau: TimeSlot,
    /// Entropy buffer. `eta[0]` is live, the rest are epoch snapshots.
    pub eta: [Entropy; 4],
    /// Previous epoch validators.
    pub lambda: ValidatorSet,
    /// Current epoch validators.
    pub kappa: ValidatorSet,
    /// Pending validators of the next epoch.
    pub gamma_k: ValidatorSet,
    /// Designated validators of the epoch after next.
    pub iota: ValidatorSet,
    /// Ticket accumulator of the running contest.
    pub gamma_a: TicketAccumulator,
    /// Sealer sequence of the current epoch.
    pub gamma_s: TicketsOrKeys,
    /// Ring commitment over `gamma_k`.
    pub gamma_z: RingCommitment,
    /// Offenders reported by disputes.
    pub post_offenders: Vec<Ed25519Public>,
}

impl SafroleState {
    /// Epoch of the last applied slot.
    pub fn epoch(&self, params: &Params) -> u32 {
        params.epoch_of(self.tau)
    }

    /// Permitted sealer of `slot`, as long as the slot is in the current
    /// epoch.
    pub fn sealer(&self, slot: TimeSlot, params: &Params) -> Option<SealerKey> {
        if params.epoch_of(slot) != self.epoch(params) {
            return None;
        }

        self.gamma_s.sealer(params.phase_of(slot) as usize)
    }

    /// Check the structural invariants that sizes and ordering must satisfy
    /// under `params`. Decoded states are not trusted before this passes.
    pub fn check(&self, params: &Params) -> Result<(), StateError> {
        let sets = [
            ("lambda", &self.lambda),
            ("kappa", &self.kappa),
            ("gamma_k", &self.gamma_k),
            ("iota", &self.iota),
        ];
        for (set, validators) in sets {
            if validators.len() != params.validator_count {
                return Err(StateError::ValidatorSetSize {
                    set,
                    expected: params.validator_count,
                    actual: validators.len(),
                });
            }
        }

        let epoch_length = params.epoch_length as usize;
        if self.gamma_a.len() > epoch_length {
            return Err(StateError::AccumulatorOverflow {
                len: self.gamma_a.len(),
                capacity: epoch_length,
            });
        }
        if !self.gamma_a.is_well_formed() {
            return Err(StateError::AccumulatorOrder);
        }
        if self.gamma_s.len() != epoch_length {
            return Err(StateError::SealerSequenceLength {
                expected: epoch_length,
                actual: self.gamma_s.len(),
            });
        }

        Ok(())
    }
}

/// Per-block input of the transition.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct SafroleInput {
    /// Slot of the block being imported.
    pub slot: TimeSlot,
    /// Fresh entropy revealed by the block seal.
    pub entropy: Entropy,
    /// Ticket envelopes of the block.
    pub extrinsic: Vec<TicketEnvelope>,
}

/// Marks that an accepted block has to carry in its header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct OutputMarks {
    pub epoch_mark: Option<EpochMark>,
    pub tickets_mark: Option<Vec<TicketMark>>,
}

/// Transition outcome as recorded in conformance vectors.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafroleOutput {
    #[codec(index = 0)]
    Ok(OutputMarks),
    #[codec(index = 1)]
    Err(ErrorCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_array_json_is_prefixed_hex() {
        let hash = OpaqueHash::from([0xab; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));
        assert_eq!(serde_json::from_str::<OpaqueHash>(&json).unwrap(), hash);
    }

    #[test]
    fn byte_array_json_rejects_malformed_strings() {
        let unprefixed = format!("\"{}\"", "00".repeat(32));
        assert!(serde_json::from_str::<OpaqueHash>(&unprefixed).is_err());

        let short = format!("\"0x{}\"", "00".repeat(31));
        assert!(serde_json::from_str::<OpaqueHash>(&short).is_err());

        let not_hex = format!("\"0x{}\"", "zz".repeat(32));
        assert!(serde_json::from_str::<OpaqueHash>(&not_hex).is_err());
    }

    #[test]
    fn sealer_sequence_encodes_with_variant_byte() {
        let keys = TicketsOrKeys::Keys(vec![BandersnatchPublic::from([7; 32])]);
        let encoded = keys.encode();
        assert_eq!(encoded[0], 1);
        assert_eq!(encoded.len(), 1 + 1 + 32);

        let json = serde_json::to_value(&keys).unwrap();
        assert!(json["keys"].is_array());
    }

    #[test]
    fn offenders_are_nulled() {
        let validator = |i: u8| ValidatorInfo {
            bandersnatch: [i; 32].into(),
            ed25519: [i; 32].into(),
            bls: [i; 144].into(),
            metadata: [i; 128].into(),
        };
        let set = ValidatorSet(vec![validator(1), validator(2), validator(3)]);

        let filtered = set.without_offenders(&[[2; 32].into()]);
        assert_eq!(filtered.get(0), Some(&validator(1)));
        assert!(filtered.get(1).map(ValidatorInfo::is_null).unwrap_or(false));
        assert_eq!(filtered.get(2), Some(&validator(3)));
    }
}
