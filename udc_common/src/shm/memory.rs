//! Ownership of the two message-RAM regions.
//!
//! On hardware each region sits at a fixed address in a linker section;
//! here both are fields of [`SharedMemory`] and each core reaches them
//! through a [`CoreView`]: `local` is the region that core writes,
//! `peer` is the region it may only read. Splitting the borrow this way
//! lets the compiler check the single-writer rule.

use serde::{Deserialize, Serialize};

use crate::config::PsConfig;
use crate::shm::segments::IpcRegion;

/// Which of the two processing cores a view belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Core {
    /// Communications and monitoring core; owns the MtoC region.
    Supervisory,
    /// Real-time regulation core; owns the CtoM region.
    Control,
}

impl Core {
    /// The other core.
    #[inline]
    pub const fn peer(self) -> Self {
        match self {
            Self::Supervisory => Self::Control,
            Self::Control => Self::Supervisory,
        }
    }
}

/// Both message-RAM regions.
#[derive(Debug, Clone, Default)]
pub struct SharedMemory {
    /// Supervisory → control region.
    mtoc: IpcRegion,
    /// Control → supervisory region.
    ctom: IpcRegion,
}

/// One core's handle onto shared memory.
#[derive(Debug)]
pub struct CoreView<'a> {
    /// Core owning this view.
    pub core: Core,
    /// Region written by this core.
    pub local: &'a mut IpcRegion,
    /// Region written by the peer core.
    pub peer: &'a IpcRegion,
}

impl SharedMemory {
    /// Both regions zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start-up initialisation of both regions.
    pub fn init(&mut self, config: &PsConfig) {
        self.mtoc.init(config);
        self.ctom.init(config);
    }

    /// View for `core`.
    pub fn view(&mut self, core: Core) -> CoreView<'_> {
        match core {
            Core::Supervisory => CoreView {
                core,
                local: &mut self.mtoc,
                peer: &self.ctom,
            },
            Core::Control => CoreView {
                core,
                local: &mut self.ctom,
                peer: &self.mtoc,
            },
        }
    }

    /// View of the supervisory core.
    #[inline]
    pub fn supervisory(&mut self) -> CoreView<'_> {
        self.view(Core::Supervisory)
    }

    /// View of the control core.
    #[inline]
    pub fn control(&mut self) -> CoreView<'_> {
        self.view(Core::Control)
    }

    /// Region written by `core`, read-only.
    pub fn region(&self, core: Core) -> &IpcRegion {
        match core {
            Core::Supervisory => &self.mtoc,
            Core::Control => &self.ctom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ps::PsModel;

    #[test]
    fn views_split_regions() {
        let mut shm = SharedMemory::new();
        shm.init(&PsConfig {
            model: PsModel::Fap,
            num_ps_modules: 1,
        });

        {
            let view = shm.supervisory();
            assert_eq!(view.core, Core::Supervisory);
            view.local.ps_module[0].setpoint = 10.0;
            assert_eq!(view.peer.ps_module[0].setpoint, 0.0);
        }
        {
            let view = shm.control();
            assert_eq!(view.peer.ps_module[0].setpoint, 10.0);
            view.local.ps_module[0].reference = 5.0;
        }

        assert_eq!(shm.region(Core::Supervisory).ps_module[0].reference, 0.0);
        assert_eq!(shm.region(Core::Control).ps_module[0].reference, 5.0);
    }

    #[test]
    fn peer_of_peer_is_self() {
        assert_eq!(Core::Supervisory.peer(), Core::Control);
        assert_eq!(Core::Control.peer().peer(), Core::Control);
    }
}
