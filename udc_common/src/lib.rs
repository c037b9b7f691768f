//! UDC Common Library
//!
//! Types shared by both cores of the UDC power-supply controller: the
//! layout of the two message-RAM regions, the inter-processor flag
//! encoding, the address translator and the field-bus (IIB) frame codec.
//!
//! # Module Structure
//!
//! - [`consts`] - Capacity limits shared by both cores
//! - [`config`] - Configuration loading traits and types
//! - [`shm`] - Shared message memory regions and per-module status
//! - [`ipc`] - Message ids, low-priority command encoding, address translation
//! - [`iib`] - Field-bus frame decoding and telemetry snapshots
//! - [`ps`] - Power-supply status word, states, models and interlocks
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use udc_common::ipc::translate::{to_peer, to_self};
//!
//! let word = to_peer(0x2007_F000).unwrap();
//! assert_eq!(to_self(word).unwrap(), 0x2007_F000);
//! ```

pub mod config;
pub mod consts;
pub mod iib;
pub mod ipc;
pub mod prelude;
pub mod ps;
pub mod shm;
