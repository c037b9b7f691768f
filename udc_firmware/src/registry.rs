//! Remote-variable registry.
//!
//! The monitoring protocol exposes numbered variables that alias storage
//! in shared memory or in the IIB snapshots. This module defines the
//! binding handed to the registry and a fixed-capacity registry that can
//! resolve bindings to their current little-endian byte image.

use heapless::Vec;
use serde::Serialize;
use thiserror::Error;
use udc_common::consts::MAX_REGISTRY_VARS;
use udc_common::iib::{IibDataId, IibFapModule};
use udc_common::shm::{Core, SharedMemory};

/// Storage a variable aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VarSource {
    /// `net_signals[index]` of the region written by `core`.
    NetSignal {
        /// Owning core.
        core: Core,
        /// Slot index.
        index: usize,
    },
    /// `output_signals[index]` of the region written by `core`.
    OutputSignal {
        /// Owning core.
        core: Core,
        /// Slot index.
        index: usize,
    },
    /// Soft-interlock register of one module.
    SoftInterlock {
        /// Owning core.
        core: Core,
        /// Module index.
        module: usize,
    },
    /// Hard-interlock register of one module.
    HardInterlock {
        /// Owning core.
        core: Core,
        /// Module index.
        module: usize,
    },
    /// One measurement of an IIB snapshot.
    Iib {
        /// IIB index (address - 1).
        module: usize,
        /// Measurement.
        field: IibDataId,
    },
}

/// One registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VarBinding {
    /// Variable id on the wire.
    pub id: u8,
    /// Size in bytes.
    pub size: u8,
    /// Whether remote clients may write the variable.
    pub writable: bool,
    /// Aliased storage.
    pub source: VarSource,
}

/// Registry rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No room for another variable.
    #[error("variable registry full ({capacity} entries)")]
    Full {
        /// Registry capacity.
        capacity: usize,
    },

    /// Id already bound.
    #[error("variable id {id} already bound")]
    DuplicateId {
        /// Offending id.
        id: u8,
    },
}

/// Consumer of variable bindings.
pub trait VariableRegistry {
    /// Register one variable.
    fn create_var(&mut self, binding: VarBinding) -> Result<(), RegistryError>;
}

/// Fixed-capacity registry.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    vars: Vec<VarBinding, MAX_REGISTRY_VARS>,
}

impl StaticRegistry {
    /// Empty registry.
    pub const fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Binding for `id`.
    pub fn get(&self, id: u8) -> Option<&VarBinding> {
        self.vars.iter().find(|v| v.id == id)
    }

    /// Every binding in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &VarBinding> {
        self.vars.iter()
    }

    /// Current value of `id` as little-endian bytes.
    ///
    /// Returns `None` for unbound ids and for bindings pointing outside
    /// the arrays they name.
    pub fn read(&self, shm: &SharedMemory, iib: &[IibFapModule], id: u8) -> Option<[u8; 4]> {
        let binding = self.get(id)?;
        let bytes = match binding.source {
            VarSource::NetSignal { core, index } => {
                shm.region(core).net_signals.get(index)?.to_le_bytes()
            }
            VarSource::OutputSignal { core, index } => {
                shm.region(core).output_signals.get(index)?.to_le_bytes()
            }
            VarSource::SoftInterlock { core, module } => {
                shm.region(core).module(module)?.soft_interlock.bits().to_le_bytes()
            }
            VarSource::HardInterlock { core, module } => {
                shm.region(core).module(module)?.hard_interlock.bits().to_le_bytes()
            }
            VarSource::Iib { module, field } => iib.get(module)?.get(field).to_le_bytes(),
        };
        Some(bytes)
    }
}

impl VariableRegistry for StaticRegistry {
    fn create_var(&mut self, binding: VarBinding) -> Result<(), RegistryError> {
        if self.get(binding.id).is_some() {
            return Err(RegistryError::DuplicateId { id: binding.id });
        }
        self.vars.push(binding).map_err(|_| RegistryError::Full {
            capacity: MAX_REGISTRY_VARS,
        })
    }
}
