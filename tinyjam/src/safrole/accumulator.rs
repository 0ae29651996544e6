//! Ticket accumulator of the running contest.

use itertools::Itertools;
use parity_scale_codec::{Decode, Encode, EncodeLike, Error as CodecError, Input, Output};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

use crate::error::ErrorCode;
use crate::types::TicketMark;

/// Tickets kept inline before spilling to the heap; the tiny epoch length.
const INLINE_TICKETS: usize = 12;

/// Sorted, capped set of the best tickets seen in the current contest.
///
/// Entries are ordered by id. Two entries may only share an id if their
/// attempts differ, the later one having the greater attempt. The set never
/// grows beyond the capacity passed to [`TicketAccumulator::merge`]: the
/// lowest ids win.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketAccumulator(SmallVec<[TicketMark; INLINE_TICKETS]>);

impl TicketAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[TicketMark] {
        self.0.as_slice()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TicketMark> {
        self.0.iter()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Whether the ordering invariant holds.
    pub fn is_well_formed(&self) -> bool {
        self.0
            .iter()
            .tuple_windows::<(&TicketMark, &TicketMark)>()
            .all(|(prev, curr)| {
                prev.id < curr.id || (prev.id == curr.id && prev.attempt < curr.attempt)
            })
    }

    /// Merge freshly verified tickets, in extrinsic order, into a copy of the
    /// accumulator and cap it at `capacity`.
    pub fn merge(&self, candidates: &[TicketMark], capacity: usize) -> Result<Self, ErrorCode> {
        if candidates
            .iter()
            .tuple_windows::<(&TicketMark, &TicketMark)>()
            .any(|(prev, curr)| prev.id > curr.id)
        {
            return Err(ErrorCode::BadTicketOrder);
        }

        let mut merged: SmallVec<[TicketMark; INLINE_TICKETS]> =
            self.0.iter().chain(candidates).copied().collect();
        // Stable: on an id collision the accumulated entry stays first.
        merged.sort_by(|a, b| a.id.cmp(&b.id));

        for (prev, curr) in merged.iter().tuple_windows::<(&TicketMark, &TicketMark)>() {
            if prev.id != curr.id {
                continue;
            }
            if prev.attempt == curr.attempt {
                return Err(ErrorCode::DuplicateTicket);
            }
            if curr.attempt <= prev.attempt {
                return Err(ErrorCode::BadTicketAttempt);
            }
        }

        if merged.len() > capacity {
            tracing::trace!(
                evicted = merged.len() - capacity,
                capacity,
                "ticket accumulator full, dropping highest ids"
            );
            merged.truncate(capacity);
        }

        Ok(Self(merged))
    }
}

impl FromIterator<TicketMark> for TicketAccumulator {
    /// Collects without checking the ordering, as decoding does. Use
    /// [`TicketAccumulator::merge`] to admit tickets.
    fn from_iter<I: IntoIterator<Item = TicketMark>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Encode for TicketAccumulator {
    fn size_hint(&self) -> usize {
        self.as_slice().size_hint()
    }

    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        self.as_slice().encode_to(dest)
    }
}

impl EncodeLike for TicketAccumulator {}

impl Decode for TicketAccumulator {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        Ok(Self(SmallVec::from_vec(Vec::<TicketMark>::decode(input)?)))
    }
}

impl Serialize for TicketAccumulator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for TicketAccumulator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(SmallVec::from_vec(Vec::<TicketMark>::deserialize(deserializer)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OpaqueHash;

    fn mark(id: u8, attempt: u8) -> TicketMark {
        TicketMark {
            id: OpaqueHash::from([id; 32]),
            attempt,
        }
    }

    fn ids(accumulator: &TicketAccumulator) -> Vec<u8> {
        accumulator.iter().map(|m| m.id.0[0]).collect()
    }

    #[test]
    fn merge_sorts_by_id() {
        let accumulator: TicketAccumulator = [mark(10, 0), mark(30, 0)].into_iter().collect();
        let merged = accumulator.merge(&[mark(5, 1), mark(20, 0)], 12).unwrap();

        assert_eq!(ids(&merged), vec![5, 10, 20, 30]);
        assert!(merged.is_well_formed());
        // The source is left alone.
        assert_eq!(ids(&accumulator), vec![10, 30]);
    }

    #[test]
    fn candidates_must_ascend() {
        let accumulator = TicketAccumulator::new();
        assert_eq!(
            accumulator.merge(&[mark(2, 0), mark(1, 0)], 12),
            Err(ErrorCode::BadTicketOrder)
        );
    }

    #[test]
    fn duplicate_of_accumulated_ticket() {
        let accumulator: TicketAccumulator = [mark(10, 1)].into_iter().collect();
        assert_eq!(
            accumulator.merge(&[mark(10, 1)], 12),
            Err(ErrorCode::DuplicateTicket)
        );
    }

    #[test]
    fn id_collision_needs_increasing_attempt() {
        let accumulator: TicketAccumulator = [mark(10, 1)].into_iter().collect();
        assert_eq!(
            accumulator.merge(&[mark(10, 0)], 12),
            Err(ErrorCode::BadTicketAttempt)
        );

        let merged = accumulator.merge(&[mark(10, 2)], 12).unwrap();
        assert_eq!(merged.as_slice(), &[mark(10, 1), mark(10, 2)]);
        assert!(merged.is_well_formed());
    }

    #[test]
    fn overflow_keeps_lowest_ids() {
        let accumulator: TicketAccumulator = (1..=12).map(|i| mark(i * 10, 0)).collect();
        let merged = accumulator
            .merge(&[mark(5, 0), mark(15, 0), mark(200, 0)], 12)
            .unwrap();

        assert_eq!(merged.len(), 12);
        assert_eq!(
            ids(&merged),
            vec![5, 10, 15, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
    }

    #[test]
    fn well_formedness() {
        let unordered: TicketAccumulator = [mark(2, 0), mark(1, 0)].into_iter().collect();
        assert!(!unordered.is_well_formed());

        let duplicated: TicketAccumulator = [mark(1, 0), mark(1, 0)].into_iter().collect();
        assert!(!duplicated.is_well_formed());
    }
}
