//! Field-bus frame decoding.
//!
//! Every frame is exactly 8 bytes:
//!
//! | Byte | Content                                   |
//! |------|-------------------------------------------|
//! | 0    | source address (1-based)                  |
//! | 1    | data id                                   |
//! | 2-3  | reserved                                  |
//! | 4-7  | little-endian `f32` (data) or `u32` (raw) |
//!
//! Decoding is pure and total over 8-byte input. Validation of the
//! address and of the data id happens when the sample is applied.

use crate::consts::MAX_IIB_MODULES;

/// Frame length in bytes.
pub const FRAME_LEN: usize = 8;

/// Bus message id of telemetry frames.
pub const FIELD_BUS_DATA_ID: u32 = 0x01;
/// Bus message id of interlock-report frames.
pub const FIELD_BUS_ITLK_ID: u32 = 0x02;
/// Bus message id of alarm-report frames.
pub const FIELD_BUS_ALARM_ID: u32 = 0x03;

/// Kind of an incoming frame, selected by the bus message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// One measurement.
    Data,
    /// Raw interlock bitmask; always latches a hard interlock.
    Interlock,
    /// Raw alarm bitmask; advisory only.
    Alarm,
}

impl FrameKind {
    /// Frame kind for a bus message id. Returns `None` for ids this
    /// controller does not listen to.
    #[inline]
    pub const fn from_message_id(id: u32) -> Option<Self> {
        match id {
            FIELD_BUS_DATA_ID => Some(Self::Data),
            FIELD_BUS_ITLK_ID => Some(Self::Interlock),
            FIELD_BUS_ALARM_ID => Some(Self::Alarm),
            _ => None,
        }
    }

    /// Bus message id of this kind.
    #[inline]
    pub const fn message_id(self) -> u32 {
        match self {
            Self::Data => FIELD_BUS_DATA_ID,
            Self::Interlock => FIELD_BUS_ITLK_ID,
            Self::Alarm => FIELD_BUS_ALARM_ID,
        }
    }
}

/// Module index for a 1-based bus address, `None` when out of range.
#[inline]
pub const fn address_to_index(address: u8) -> Option<usize> {
    if address >= 1 && (address as usize) <= MAX_IIB_MODULES {
        Some(address as usize - 1)
    } else {
        None
    }
}

/// One decoded measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    /// Source address (1-based).
    pub address: u8,
    /// Raw data id.
    pub data_id: u8,
    /// Measured value.
    pub value: f32,
}

impl TelemetrySample {
    /// Module index of the source, `None` when the address is out of range.
    #[inline]
    pub const fn module_index(&self) -> Option<usize> {
        address_to_index(self.address)
    }
}

/// One decoded interlock or alarm report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterlockReport {
    /// Source address (1-based).
    pub address: u8,
    /// Raw bitmask reported by the board.
    pub raw: u32,
}

impl InterlockReport {
    /// Module index of the source, `None` when the address is out of range.
    #[inline]
    pub const fn module_index(&self) -> Option<usize> {
        address_to_index(self.address)
    }
}

/// Decode a telemetry frame.
#[inline]
pub fn decode_frame(bytes: &[u8; FRAME_LEN]) -> TelemetrySample {
    TelemetrySample {
        address: bytes[0],
        data_id: bytes[1],
        value: f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    }
}

/// Decode an interlock or alarm report frame.
#[inline]
pub fn decode_interlock(bytes: &[u8; FRAME_LEN]) -> InterlockReport {
    InterlockReport {
        address: bytes[0],
        raw: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    }
}

/// Build a telemetry frame (used by simulators and tests).
pub fn encode_frame(address: u8, data_id: u8, value: f32) -> [u8; FRAME_LEN] {
    let v = value.to_le_bytes();
    [address, data_id, 0, 0, v[0], v[1], v[2], v[3]]
}

/// Build an interlock/alarm frame (used by simulators and tests).
pub fn encode_interlock(address: u8, raw: u32) -> [u8; FRAME_LEN] {
    let v = raw.to_le_bytes();
    [address, 0, 0, 0, v[0], v[1], v[2], v[3]]
}
