//! Prelude module for common re-exports.
//!
//! `use udc_common::prelude::*;` brings in the types both firmware cores
//! touch on every path.
//!
//! # Usage
//!
//! ```rust
//! use udc_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, PsConfig, SharedConfig, UdcConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MAX_IIB_MODULES, MAX_PS_MODULES, NUM_NET_SIGNALS, NUM_OUTPUT_SIGNALS};

// ─── Shared Message Memory ──────────────────────────────────────────
pub use crate::shm::{Core, CoreView, IpcErrorCode, IpcRegion, ModuleStatus, SharedMemory, SignalSlot};

// ─── Inter-Processor Messages ───────────────────────────────────────
pub use crate::ipc::{
    CtomCommand, LowPriorityCommand, MessageId, MtocCommand, TranslateError, to_peer, to_self,
};

// ─── Field Bus ──────────────────────────────────────────────────────
pub use crate::iib::{FrameKind, IibDataId, IibFapModule, TelemetrySample, decode_frame};

// ─── Power Supply ───────────────────────────────────────────────────
pub use crate::ps::{Fap4pHardInterlock, InterlockCause, InterlockRegister, PsModel, PsState, PsStatus};
