//! Protocol parameters.

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::types::TimeSlot;

/// Sizes and windows the Safrole transition is run with.
///
/// Two presets exist, [`Params::tiny`] for tests and small networks, and
/// [`Params::full`] for the full validator set. A custom set can be built
/// from a preset with the `with_*` setters, or read from JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Params {
    /// Number of validators in each validator set.
    pub validator_count: usize,
    /// Number of slots in an epoch.
    pub epoch_length: u32,
    /// Slots at the start of an epoch during which tickets are accepted.
    pub contest_duration: u32,
    /// Ticket attempts each validator may submit per epoch.
    pub tickets_per_validator: u8,
}

impl Params {
    /// 6 validators, 12-slot epochs.
    pub const fn tiny() -> Self {
        Self {
            validator_count: 6,
            epoch_length: 12,
            contest_duration: 10,
            tickets_per_validator: 3,
        }
    }

    /// 1023 validators, 600-slot epochs.
    pub const fn full() -> Self {
        Self {
            validator_count: 1023,
            epoch_length: 600,
            contest_duration: 500,
            tickets_per_validator: 2,
        }
    }

    pub fn with_validator_count(mut self, validator_count: usize) -> Self {
        self.validator_count = validator_count;
        self
    }

    pub fn with_epoch_length(mut self, epoch_length: u32) -> Self {
        self.epoch_length = epoch_length;
        self
    }

    pub fn with_contest_duration(mut self, contest_duration: u32) -> Self {
        self.contest_duration = contest_duration;
        self
    }

    pub fn with_tickets_per_validator(mut self, tickets_per_validator: u8) -> Self {
        self.tickets_per_validator = tickets_per_validator;
        self
    }

    /// Parse and validate parameters from JSON.
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        let params: Params = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.validator_count == 0 {
            return Err(ParamsError::Zero("validator_count"));
        }
        if self.epoch_length == 0 {
            return Err(ParamsError::Zero("epoch_length"));
        }
        if self.tickets_per_validator == 0 {
            return Err(ParamsError::Zero("tickets_per_validator"));
        }
        if self.contest_duration >= self.epoch_length {
            return Err(ParamsError::ContestTooLong {
                contest_duration: self.contest_duration,
                epoch_length: self.epoch_length,
            });
        }

        Ok(())
    }

    /// Epoch index of a slot.
    pub fn epoch_of(&self, slot: TimeSlot) -> u32 {
        slot / self.epoch_length
    }

    /// Position of a slot within its epoch.
    pub fn phase_of(&self, slot: TimeSlot) -> u32 {
        slot % self.epoch_length
    }

    /// Whether tickets may still be submitted at `slot`.
    pub fn is_contest_open(&self, slot: TimeSlot) -> bool {
        self.phase_of(slot) < self.contest_duration
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::tiny()
    }
}
