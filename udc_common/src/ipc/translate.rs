//! Shared-memory address translation between the two cores.
//!
//! The supervisory core addresses memory in bytes, the control core in
//! 16-bit words. A shared buffer therefore has two addresses:
//!
//! ```text
//! to_peer(x) = (x - base) >> 1
//! to_self(y) = (y << 1) + base
//! ```
//!
//! where `base` depends on the region the address falls in. Only the
//! regions listed in [`REGIONS`] are translatable; anything else is
//! rejected instead of producing a meaningless address.

use thiserror::Error;

/// Error returned for addresses outside every shared region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// Address is not inside a shared region.
    #[error("address {addr:#010x} is outside every shared region")]
    OutOfRange {
        /// Offending address.
        addr: u32,
    },

    /// Supervisory address is not 16-bit aligned.
    #[error("address {addr:#010x} is not 16-bit aligned")]
    Misaligned {
        /// Offending address.
        addr: u32,
    },
}

/// Kind of shared memory an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// General shared RAM (Sx blocks).
    SharedRam,
    /// Control → supervisory message RAM.
    CtomMsgRam,
    /// Supervisory → control message RAM.
    MtocMsgRam,
}

/// One translatable region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedRegion {
    /// Classification.
    pub kind: RegionKind,
    /// First supervisory byte address.
    pub self_start: u32,
    /// One past the last supervisory byte address.
    pub self_end: u32,
    /// First control-core word address.
    pub peer_start: u32,
    /// Offset removed before halving.
    pub base: u32,
}

impl SharedRegion {
    /// One past the last control-core word address.
    #[inline]
    pub const fn peer_end(&self) -> u32 {
        self.peer_start + (self.self_end - self.self_start) / 2
    }

    #[inline]
    const fn contains_self(&self, addr: u32) -> bool {
        addr >= self.self_start && addr < self.self_end
    }

    #[inline]
    const fn contains_peer(&self, addr: u32) -> bool {
        addr >= self.peer_start && addr < self.peer_end()
    }
}

const SX_RAM_BASE: u32 = 0x1FFF_0000;
const MSG_RAM_BASE: u32 = 0x2000_0000;

/// Supervisory-side start of the CtoM message RAM.
pub const M3_CTOM_MSGRAM_START: u32 = 0x2007_F000;
/// Control-side start of the CtoM message RAM.
pub const C28_CTOM_MSGRAM_START: u32 = 0x0003_F800;

/// Every translatable region.
pub const REGIONS: [SharedRegion; 3] = [
    SharedRegion {
        kind: RegionKind::SharedRam,
        self_start: 0x2000_8000,
        self_end: 0x2001_8000,
        peer_start: 0x0000_C000,
        base: SX_RAM_BASE,
    },
    SharedRegion {
        kind: RegionKind::CtomMsgRam,
        self_start: M3_CTOM_MSGRAM_START,
        self_end: 0x2007_F800,
        peer_start: C28_CTOM_MSGRAM_START,
        base: MSG_RAM_BASE,
    },
    SharedRegion {
        kind: RegionKind::MtocMsgRam,
        self_start: 0x2007_F800,
        self_end: 0x2008_0000,
        peer_start: 0x0003_FC00,
        base: MSG_RAM_BASE,
    },
];

/// Region holding supervisory address `addr`.
pub fn classify_self(addr: u32) -> Option<&'static SharedRegion> {
    REGIONS.iter().find(|r| r.contains_self(addr))
}

/// Region holding control-core address `addr`.
pub fn classify_peer(addr: u32) -> Option<&'static SharedRegion> {
    REGIONS.iter().find(|r| r.contains_peer(addr))
}

/// Supervisory byte address → control-core word address.
pub fn to_peer(addr: u32) -> Result<u32, TranslateError> {
    let region = classify_self(addr).ok_or(TranslateError::OutOfRange { addr })?;
    if addr & 1 != 0 {
        return Err(TranslateError::Misaligned { addr });
    }
    Ok((addr - region.base) >> 1)
}

/// Control-core word address → supervisory byte address.
pub fn to_self(addr: u32) -> Result<u32, TranslateError> {
    let region = classify_peer(addr).ok_or(TranslateError::OutOfRange { addr })?;
    Ok((addr << 1) + region.base)
}
