//! FAP-4P family: four paralleled FAP modules, each with one IIB board.
//!
//! Signal indices are fixed for the build. Supervisory-region (`mtoc`)
//! signals carry analog inputs sampled by the supervisory core and data
//! reported by the IIB boards; control-region (`ctom`) signals carry the
//! regulation loop's measurements and duty cycles.

use udc_common::consts::MAX_IIB_MODULES;
use udc_common::iib::IibDataId;
use udc_common::ps::Fap4pHardInterlock;
use udc_common::shm::{Core, IpcRegion};

use crate::registry::{RegistryError, VarBinding, VarSource, VariableRegistry};

// ─── Control region (ctom) net signals ──────────────────────────────

/// Load current, transducer 1.
pub const I_LOAD_1: usize = 0;
/// Load current, transducer 2.
pub const I_LOAD_2: usize = 1;
/// Load voltage.
pub const V_LOAD: usize = 2;
/// Mean load current.
pub const I_LOAD_MEAN: usize = 3;
/// Load current error.
pub const I_LOAD_ERROR: usize = 4;
/// Mean duty cycle.
pub const DUTY_MEAN: usize = 5;
/// Difference between the two load transducers.
pub const I_LOAD_DIFF: usize = 6;
/// Output current of each module.
pub const I_MOD: [usize; 4] = [7, 8, 9, 10];
/// Mean module current.
pub const I_MOD_MEAN: usize = 11;

// ─── Supervisory region (mtoc) net signals ──────────────────────────

/// IGBT currents of each module, `[module][leg]`.
pub const I_IGBT_MOD: [[usize; 2]; 4] = [[0, 1], [2, 3], [4, 5], [6, 7]];
/// DC-link voltage of each module, reported by its IIB.
pub const V_DCLINK_MOD: [usize; 4] = [8, 9, 10, 11];
/// Interlock word of each module's IIB.
pub const IIB_ITLK_REG_MOD: [usize; 4] = [12, 13, 14, 15];

// ─── Control region (ctom) output signals ───────────────────────────

/// IGBT duty cycles of each module, `[module][leg]`.
pub const DUTY_CYCLE_IGBT_MOD: [[usize; 2]; 4] = [[0, 1], [2, 3], [4, 5], [6, 7]];

/// Hard interlock latched when an IIB reports a fault.
pub const IIB_INTERLOCK: Fap4pHardInterlock = Fap4pHardInterlock::IibItlk;

/// First and last remote-variable id of this family.
pub const VAR_ID_RANGE: (u8, u8) = (25, 103);

const _: () = assert!(IIB_ITLK_REG_MOD.len() == MAX_IIB_MODULES);
const _: () = assert!(V_DCLINK_MOD.len() == MAX_IIB_MODULES);

/// Mirror an IIB interlock summary into the supervisory region.
pub fn publish_iib_interlock(local: &mut IpcRegion, module_index: usize, summary: u32) {
    if let Some(slot) = IIB_ITLK_REG_MOD
        .get(module_index)
        .and_then(|&i| local.net_signals.get_mut(i))
    {
        slot.set_u32(summary);
    }
}

/// Mirror IIB telemetry that feeds a supervisory-region signal.
///
/// Only the input voltage has a signal slot (the module's DC link).
pub fn publish_iib_telemetry(local: &mut IpcRegion, module_index: usize, id: IibDataId, value: f32) {
    if id != IibDataId::Vin {
        return;
    }
    if let Some(slot) = V_DCLINK_MOD
        .get(module_index)
        .and_then(|&i| local.net_signals.get_mut(i))
    {
        slot.set_f32(value);
    }
}

fn read_only(id: u8, source: VarSource) -> VarBinding {
    VarBinding {
        id,
        size: 4,
        writable: false,
        source,
    }
}

/// Register every remote variable of the family.
pub fn bind_variables<R: VariableRegistry>(registry: &mut R) -> Result<(), RegistryError> {
    let ctom_net = |index| VarSource::NetSignal {
        core: Core::Control,
        index,
    };
    let mtoc_net = |index| VarSource::NetSignal {
        core: Core::Supervisory,
        index,
    };

    registry.create_var(read_only(
        25,
        VarSource::SoftInterlock {
            core: Core::Control,
            module: 0,
        },
    ))?;
    registry.create_var(read_only(
        26,
        VarSource::HardInterlock {
            core: Core::Control,
            module: 0,
        },
    ))?;

    registry.create_var(read_only(27, ctom_net(I_LOAD_1)))?;
    registry.create_var(read_only(28, ctom_net(I_LOAD_2)))?;
    registry.create_var(read_only(29, ctom_net(I_LOAD_MEAN)))?;
    registry.create_var(read_only(30, ctom_net(V_LOAD)))?;

    let mut id = 31;
    for legs in I_IGBT_MOD {
        for index in legs {
            registry.create_var(read_only(id, mtoc_net(index)))?;
            id += 1;
        }
    }
    for index in V_DCLINK_MOD {
        registry.create_var(read_only(id, mtoc_net(index)))?;
        id += 1;
    }

    registry.create_var(read_only(id, ctom_net(DUTY_MEAN)))?;
    id += 1;
    for legs in DUTY_CYCLE_IGBT_MOD {
        for index in legs {
            let source = VarSource::OutputSignal {
                core: Core::Control,
                index,
            };
            registry.create_var(read_only(id, source))?;
            id += 1;
        }
    }

    for module in 0..MAX_IIB_MODULES {
        for field in IibDataId::ALL {
            registry.create_var(read_only(id, VarSource::Iib { module, field }))?;
            id += 1;
        }
    }

    for index in IIB_ITLK_REG_MOD {
        registry.create_var(read_only(id, mtoc_net(index)))?;
        id += 1;
    }
    for index in I_MOD {
        registry.create_var(read_only(id, ctom_net(index)))?;
        id += 1;
    }

    debug_assert_eq!(id - 1, VAR_ID_RANGE.1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticRegistry;

    #[test]
    fn variable_table_is_contiguous() {
        let mut registry = StaticRegistry::new();
        bind_variables(&mut registry).unwrap();
        let (first, last) = VAR_ID_RANGE;
        assert_eq!(registry.len(), usize::from(last - first) + 1);
        for id in first..=last {
            assert!(registry.get(id).is_some(), "missing var {id}");
        }
    }

    #[test]
    fn well_known_ids() {
        let mut registry = StaticRegistry::new();
        bind_variables(&mut registry).unwrap();

        assert_eq!(
            registry.get(26).unwrap().source,
            VarSource::HardInterlock {
                core: Core::Control,
                module: 0
            }
        );
        assert_eq!(
            registry.get(56).unwrap().source,
            VarSource::Iib {
                module: 0,
                field: IibDataId::TempIgbt1
            }
        );
        assert_eq!(
            registry.get(95).unwrap().source,
            VarSource::Iib {
                module: 3,
                field: IibDataId::TempHeatSink
            }
        );
        assert_eq!(
            registry.get(97).unwrap().source,
            VarSource::NetSignal {
                core: Core::Supervisory,
                index: 13
            }
        );
        assert_eq!(
            registry.get(103).unwrap().source,
            VarSource::NetSignal {
                core: Core::Control,
                index: 10
            }
        );
    }

    #[test]
    fn binding_twice_is_rejected() {
        let mut registry = StaticRegistry::new();
        bind_variables(&mut registry).unwrap();
        assert_eq!(
            bind_variables(&mut registry),
            Err(RegistryError::DuplicateId { id: 25 })
        );
    }

    #[test]
    fn only_vin_reaches_dclink_signal() {
        let mut region = IpcRegion::default();
        publish_iib_telemetry(&mut region, 2, IibDataId::TempIgbt1, 40.0);
        assert!(region.net_signals.iter().all(|s| s.u32() == 0));

        publish_iib_telemetry(&mut region, 2, IibDataId::Vin, 510.0);
        assert_eq!(region.net_signals[V_DCLINK_MOD[2]].f32(), 510.0);
    }

    #[test]
    fn interlock_summary_out_of_range_is_ignored() {
        let mut region = IpcRegion::default();
        publish_iib_interlock(&mut region, MAX_IIB_MODULES, 0xFF);
        assert!(region.net_signals.iter().all(|s| s.u32() == 0));
        publish_iib_interlock(&mut region, 0, 0x10);
        assert_eq!(region.net_signals[IIB_ITLK_REG_MOD[0]].u32(), 0x10);
    }
}
