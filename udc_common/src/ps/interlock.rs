//! Interlock causes and sticky interlock registers.
//!
//! Each module family defines an ordered list of causes. The discriminant
//! of a cause is its bit position in the 32-bit register, and that order
//! is shared with the peer core and with remote monitoring clients.
//! Reordering a cause list is a protocol break.
//!
//! Registers only ever gain bits through [`InterlockRegister::latch`] and
//! [`InterlockRegister::latch_raw`]; [`InterlockRegister::reset`] is the
//! single clearing path and is reserved for explicit operator resets.

use serde::{Deserialize, Serialize};

/// One named bit of an interlock register.
pub trait InterlockCause: Copy {
    /// Bit position (`0..32`).
    fn bit_index(self) -> u8;

    /// Register mask for this cause.
    #[inline]
    fn bit(self) -> u32 {
        1u32 << self.bit_index()
    }
}

/// Sticky 32-bit interlock bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct InterlockRegister(u32);

impl InterlockRegister {
    /// Register with no cause latched.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw register value.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Latch one cause. Never clears other bits.
    #[inline]
    pub fn latch<C: InterlockCause>(&mut self, cause: C) {
        self.0 |= cause.bit();
    }

    /// Latch every bit set in `bits`.
    #[inline]
    pub fn latch_raw(&mut self, bits: u32) {
        self.0 |= bits;
    }

    /// Whether `cause` is latched.
    #[inline]
    pub fn contains<C: InterlockCause>(&self, cause: C) -> bool {
        self.0 & cause.bit() != 0
    }

    /// Whether any cause is latched.
    #[inline]
    pub const fn is_latched(&self) -> bool {
        self.0 != 0
    }

    /// Number of latched causes.
    #[inline]
    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Clear every cause. Operator reset only.
    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Hard interlocks of the FAP-4P family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Fap4pHardInterlock {
    /// Load current above limit.
    LoadOvercurrent = 0,
    /// Load voltage above limit.
    LoadOvervoltage = 1,
    /// Module 1, IGBT leg 1 overcurrent.
    Igbt1Mod1Overcurrent = 2,
    /// Module 1, IGBT leg 2 overcurrent.
    Igbt2Mod1Overcurrent = 3,
    /// Module 2, IGBT leg 1 overcurrent.
    Igbt1Mod2Overcurrent = 4,
    /// Module 2, IGBT leg 2 overcurrent.
    Igbt2Mod2Overcurrent = 5,
    /// Module 3, IGBT leg 1 overcurrent.
    Igbt1Mod3Overcurrent = 6,
    /// Module 3, IGBT leg 2 overcurrent.
    Igbt2Mod3Overcurrent = 7,
    /// Module 4, IGBT leg 1 overcurrent.
    Igbt1Mod4Overcurrent = 8,
    /// Module 4, IGBT leg 2 overcurrent.
    Igbt2Mod4Overcurrent = 9,
    /// Module 1 DC-link contactor fault.
    DclinkMod1ContactorFault = 10,
    /// Module 2 DC-link contactor fault.
    DclinkMod2ContactorFault = 11,
    /// Module 3 DC-link contactor fault.
    DclinkMod3ContactorFault = 12,
    /// Module 4 DC-link contactor fault.
    DclinkMod4ContactorFault = 13,
    /// Module 1 DC-link overvoltage.
    DclinkMod1Overvoltage = 14,
    /// Module 2 DC-link overvoltage.
    DclinkMod2Overvoltage = 15,
    /// Module 3 DC-link overvoltage.
    DclinkMod3Overvoltage = 16,
    /// Module 4 DC-link overvoltage.
    DclinkMod4Overvoltage = 17,
    /// Module 1 DC-link undervoltage.
    DclinkMod1Undervoltage = 18,
    /// Module 2 DC-link undervoltage.
    DclinkMod2Undervoltage = 19,
    /// Module 3 DC-link undervoltage.
    DclinkMod3Undervoltage = 20,
    /// Module 4 DC-link undervoltage.
    DclinkMod4Undervoltage = 21,
    /// Interlock reported by the module's IIB board.
    IibItlk = 22,
}

impl Fap4pHardInterlock {
    /// Every cause in bit order.
    pub const ALL: [Self; 23] = [
        Self::LoadOvercurrent,
        Self::LoadOvervoltage,
        Self::Igbt1Mod1Overcurrent,
        Self::Igbt2Mod1Overcurrent,
        Self::Igbt1Mod2Overcurrent,
        Self::Igbt2Mod2Overcurrent,
        Self::Igbt1Mod3Overcurrent,
        Self::Igbt2Mod3Overcurrent,
        Self::Igbt1Mod4Overcurrent,
        Self::Igbt2Mod4Overcurrent,
        Self::DclinkMod1ContactorFault,
        Self::DclinkMod2ContactorFault,
        Self::DclinkMod3ContactorFault,
        Self::DclinkMod4ContactorFault,
        Self::DclinkMod1Overvoltage,
        Self::DclinkMod2Overvoltage,
        Self::DclinkMod3Overvoltage,
        Self::DclinkMod4Overvoltage,
        Self::DclinkMod1Undervoltage,
        Self::DclinkMod2Undervoltage,
        Self::DclinkMod3Undervoltage,
        Self::DclinkMod4Undervoltage,
        Self::IibItlk,
    ];

    /// Convert from a bit position. Returns `None` past the last cause.
    #[inline]
    pub fn from_bit_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

impl InterlockCause for Fap4pHardInterlock {
    #[inline]
    fn bit_index(self) -> u8 {
        self as u8
    }
}
