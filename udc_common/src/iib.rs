//! IIB field-bus boards.
//!
//! Each power module carries an isolated interface board (IIB) reporting
//! measurements and faults as 8-byte frames on a shared bus.
//!
//! - `frame`: frame kinds and the pure frame decoders.
//! - `data`: data ids, the per-board telemetry snapshot and the raw
//!   interlock bits reported by the board.

pub mod data;
pub mod frame;

pub use data::{IibDataId, IibFapModule, IibItlkFlags};
pub use frame::{
    FRAME_LEN, FrameKind, InterlockReport, TelemetrySample, decode_frame, decode_interlock,
};
