//! Power-supply status word.
//!
//! Packed 16-bit word shared through message RAM:
//!
//! | Bits  | Field      |
//! |-------|------------|
//! | 3:0   | state      |
//! | 4     | open loop  |
//! | 6:5   | interface  |
//! | 7     | active     |
//! | 12:8  | model      |
//! | 13    | unlocked   |
//! | 15:14 | reserved   |

use serde::{Deserialize, Serialize};

const STATE_MASK: u16 = 0x000F;
const OPEN_LOOP_BIT: u16 = 1 << 4;
const INTERFACE_SHIFT: u16 = 5;
const INTERFACE_MASK: u16 = 0x3 << INTERFACE_SHIFT;
const ACTIVE_BIT: u16 = 1 << 7;
const MODEL_SHIFT: u16 = 8;
const MODEL_MASK: u16 = 0x1F << MODEL_SHIFT;
const UNLOCKED_BIT: u16 = 1 << 13;

/// Operating state of one power-supply module.
///
/// Every state from `SlowRef` upward drives the power stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum PsState {
    /// Output disabled.
    #[default]
    Off = 0,
    /// Hard interlock latched; leaves only through an explicit reset.
    Interlock = 1,
    /// Power stage charging / contactors closing.
    Initializing = 2,
    /// Regulating to the slow reference.
    SlowRef = 3,
    /// Slow reference synchronised to timing trigger.
    SlowRefSync = 4,
    /// Running the signal generator cycle.
    Cycle = 5,
    /// Ramp waveform.
    RmpWfm = 6,
    /// Migration waveform.
    MigWfm = 7,
    /// Fast reference from the orbit feedback.
    FastRef = 8,
}

impl PsState {
    /// Convert from raw value. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::Interlock),
            2 => Some(Self::Initializing),
            3 => Some(Self::SlowRef),
            4 => Some(Self::SlowRefSync),
            5 => Some(Self::Cycle),
            6 => Some(Self::RmpWfm),
            7 => Some(Self::MigWfm),
            8 => Some(Self::FastRef),
            _ => None,
        }
    }

    /// Returns true if the module is actuating.
    #[inline]
    pub const fn is_operating(&self) -> bool {
        (*self as u8) >= (Self::SlowRef as u8)
    }
}

/// Power-supply model (5-bit code in the status word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PsModel {
    /// FBP: four low-power modules sharing one controller.
    #[serde(rename = "fbp")]
    Fbp = 0,
    /// DC-link for FBP crates.
    #[serde(rename = "fbp_dclink")]
    FbpDclink = 1,
    /// FAC input (AC/DC) stage.
    #[serde(rename = "fac_acdc")]
    FacAcdc = 2,
    /// FAC output (DC/DC) stage.
    #[serde(rename = "fac_dcdc")]
    FacDcdc = 3,
    /// FAP: single high-power module.
    #[serde(rename = "fap")]
    Fap = 4,
    /// FAP-4P: four paralleled FAP modules, each monitored by one IIB.
    #[serde(rename = "fap_4p")]
    Fap4P = 5,
    /// Model not configured.
    #[serde(rename = "uninitialized")]
    Uninitialized = 31,
}

impl PsModel {
    /// Convert from raw 5-bit code. Returns `None` for unknown codes.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Fbp),
            1 => Some(Self::FbpDclink),
            2 => Some(Self::FacAcdc),
            3 => Some(Self::FacDcdc),
            4 => Some(Self::Fap),
            5 => Some(Self::Fap4P),
            31 => Some(Self::Uninitialized),
            _ => None,
        }
    }
}

/// Packed status word of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct PsStatus(u16);

impl PsStatus {
    /// All-zero status word.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Wrap a raw word read from message RAM.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw word.
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Operating state, `None` if the field holds an unknown code.
    pub const fn state(&self) -> Option<PsState> {
        PsState::from_u8((self.0 & STATE_MASK) as u8)
    }

    /// Set the operating state.
    pub fn set_state(&mut self, state: PsState) {
        self.0 = (self.0 & !STATE_MASK) | (state as u16);
    }

    /// Open-loop flag.
    pub const fn open_loop(&self) -> bool {
        self.0 & OPEN_LOOP_BIT != 0
    }

    /// Set or clear the open-loop flag.
    pub fn set_open_loop(&mut self, open: bool) {
        self.set_bit(OPEN_LOOP_BIT, open);
    }

    /// Command interface selector (2 bits).
    pub const fn interface(&self) -> u8 {
        ((self.0 & INTERFACE_MASK) >> INTERFACE_SHIFT) as u8
    }

    /// Set the command interface selector; extra bits are dropped.
    pub fn set_interface(&mut self, interface: u8) {
        self.0 = (self.0 & !INTERFACE_MASK) | (((interface as u16) << INTERFACE_SHIFT) & INTERFACE_MASK);
    }

    /// Whether this module slot is in use.
    pub const fn active(&self) -> bool {
        self.0 & ACTIVE_BIT != 0
    }

    /// Mark this module slot as in use.
    pub fn set_active(&mut self, active: bool) {
        self.set_bit(ACTIVE_BIT, active);
    }

    /// Raw 5-bit model code.
    pub const fn model_code(&self) -> u8 {
        ((self.0 & MODEL_MASK) >> MODEL_SHIFT) as u8
    }

    /// Model, `None` for unknown codes.
    pub const fn model(&self) -> Option<PsModel> {
        PsModel::from_u8(self.model_code())
    }

    /// Set the model code.
    pub fn set_model(&mut self, model: PsModel) {
        self.0 = (self.0 & !MODEL_MASK) | (((model as u16) << MODEL_SHIFT) & MODEL_MASK);
    }

    /// Whether protected parameters may be written.
    pub const fn unlocked(&self) -> bool {
        self.0 & UNLOCKED_BIT != 0
    }

    /// Lock or unlock protected parameters.
    pub fn set_unlocked(&mut self, unlocked: bool) {
        self.set_bit(UNLOCKED_BIT, unlocked);
    }

    #[inline]
    fn set_bit(&mut self, mask: u16, value: bool) {
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_do_not_overlap() {
        let mut s = PsStatus::new();
        s.set_state(PsState::FastRef);
        s.set_open_loop(true);
        s.set_interface(0b11);
        s.set_active(true);
        s.set_model(PsModel::Uninitialized);
        s.set_unlocked(true);
        assert_eq!(s.bits(), 0x3FF8);

        s.set_state(PsState::Off);
        assert_eq!(s.state(), Some(PsState::Off));
        assert!(s.open_loop());
        assert_eq!(s.interface(), 0b11);
        assert!(s.active());
        assert_eq!(s.model(), Some(PsModel::Uninitialized));
        assert!(s.unlocked());
    }

    #[test]
    fn interface_is_masked() {
        let mut s = PsStatus::new();
        s.set_interface(0xFF);
        assert_eq!(s.interface(), 0b11);
        assert!(!s.active());
    }

    #[test]
    fn unknown_state_code() {
        let s = PsStatus::from_bits(0x000F);
        assert_eq!(s.state(), None);
    }

    #[test]
    fn operating_states() {
        assert!(!PsState::Off.is_operating());
        assert!(!PsState::Interlock.is_operating());
        assert!(!PsState::Initializing.is_operating());
        assert!(PsState::SlowRef.is_operating());
        assert!(PsState::FastRef.is_operating());
    }

    #[test]
    fn model_roundtrip() {
        for v in 0..32u8 {
            if let Some(m) = PsModel::from_u8(v) {
                assert_eq!(m as u8, v);
            }
        }
        assert_eq!(PsModel::from_u8(5), Some(PsModel::Fap4P));
        assert!(PsModel::from_u8(6).is_none());
    }
}
