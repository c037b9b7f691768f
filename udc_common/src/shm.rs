//! Shared message memory.
//!
//! This module contains:
//! - `segments`: the fixed `#[repr(C)]` layout of one message-RAM region.
//! - `memory`: ownership of both regions and the per-core views that
//!   enforce single-writer discipline.

pub mod memory;
pub mod segments;

pub use memory::{Core, CoreView, SharedMemory};
pub use segments::{DspModule, IpcErrorCode, IpcRegion, ModuleStatus, SigGen, SignalSlot};
