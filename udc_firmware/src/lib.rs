//! # UDC Firmware Library
//!
//! Runtime logic of both cores of the UDC power-supply controller.
//!
//! Hardware registers are reached through the `IpcTransport` trait, so the
//! same protocol code runs on the target and against the simulated link
//! used by the `udc_sim` binary and the tests.
//!
//! # Module Structure
//!
//! - [`transport`] - Flag-register access trait and simulated link
//! - [`ipc`] - Send / busy / receive protocol and command handlers
//! - [`iib`] - IIB telemetry and interlock aggregation
//! - [`fap_4p`] - FAP-4P signal indices and remote-variable table
//! - [`registry`] - Remote-variable bindings
//! - [`core`] - Supervisory and control core entry points
//! - [`sim`] - Host-side simulation of both cores
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐         ┌──────────────────────────────┐
//! │ Supervisor                   │  mtoc   │ ControlCore                  │
//! │  IibAggregator ──► mtoc ─────┼────────►│  ControlHandler ──► ctom     │
//! │  SupervisoryHandler ◄────────┼─────────┼── ctom                       │
//! │  (HRADC reset)               │  ctom   │                              │
//! └──────────────┬───────────────┘         └──────────────┬───────────────┘
//!                └──────────── IpcTransport (flags) ───────┘
//! ```

#![warn(missing_docs)]

pub mod core;
pub mod fap_4p;
pub mod iib;
pub mod ipc;
pub mod registry;
pub mod sim;
pub mod transport;

pub use crate::core::{CommandError, ControlCore, Supervisor};
pub use crate::iib::{IibAggregator, IibError, IibStats, apply_interlock};
pub use crate::ipc::{
    ControlHandler, HradcControl, HradcResetLine, IpcEndpoint, IpcStats, LowPriorityHandler,
    SupervisoryHandler,
};
pub use crate::registry::{RegistryError, StaticRegistry, VarBinding, VarSource, VariableRegistry};
pub use crate::transport::{IpcTransport, SimulatedLink, SimulatedPort};
