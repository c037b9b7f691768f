//! IIB telemetry and interlock aggregation.
//!
//! Frames from the field bus are decoded by the pure functions in
//! `udc_common::iib::frame` and applied here:
//!
//! - telemetry frames update exactly one field of the sender's snapshot;
//! - interlock reports OR the raw word into the sender's summary and
//!   latch the IIB hard interlock in the supervisory region, whatever the
//!   raw value;
//! - alarm reports OR the raw word into the sender's alarm summary and
//!   latch nothing.
//!
//! Latched bits are only cleared by [`IibAggregator::reset`] and by the
//! explicit interlock reset on the control core.

use std::fmt::Debug;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace, warn};
use udc_common::consts::{MAX_IIB_MODULES, MAX_PS_MODULES};
use udc_common::iib::frame::{FRAME_LEN, FrameKind, address_to_index};
use udc_common::iib::{IibDataId, IibFapModule, decode_frame, decode_interlock};
use udc_common::ps::InterlockCause;
use udc_common::shm::IpcRegion;

use crate::fap_4p;

/// Rejected frame or index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IibError {
    /// Frame source address outside `1..=MAX_IIB_MODULES`.
    #[error("IIB address {address} outside 1..={max}", max = MAX_IIB_MODULES)]
    AddressOutOfRange {
        /// Address carried by the frame.
        address: u8,
    },

    /// Module index outside the snapshot or region arrays.
    #[error("module index {index} out of range")]
    ModuleOutOfRange {
        /// Offending index.
        index: usize,
    },
}

/// Frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IibStats {
    /// Frames handled, rejected ones included.
    pub frames: u64,
    /// Telemetry samples with an unrecognised data id.
    pub unknown_data_id: u64,
    /// Frames dropped for an out-of-range source address.
    pub rejected_address: u64,
    /// Interlock reports applied.
    pub interlock_reports: u64,
    /// Alarm reports applied.
    pub alarm_reports: u64,
}

/// Latch `cause` in the hard-interlock register of `module_index`.
///
/// Never clears a bit.
pub fn apply_interlock<C: InterlockCause + Debug>(
    local: &mut IpcRegion,
    module_index: usize,
    cause: C,
) -> Result<(), IibError> {
    let module = local
        .module_mut(module_index)
        .ok_or(IibError::ModuleOutOfRange { index: module_index })?;
    if !module.hard_interlock.contains(cause) {
        warn!(module = module_index, ?cause, "hard interlock latched");
    }
    module.hard_interlock.latch(cause);
    Ok(())
}

/// Snapshots and counters of every IIB board.
#[derive(Debug, Clone)]
pub struct IibAggregator {
    modules: [IibFapModule; MAX_IIB_MODULES],
    stats: IibStats,
}

impl Default for IibAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl IibAggregator {
    /// Aggregator with one empty snapshot per bus address.
    pub fn new() -> Self {
        let mut modules = [IibFapModule::default(); MAX_IIB_MODULES];
        for (i, m) in modules.iter_mut().enumerate() {
            m.can_address = (i + 1) as u8;
        }
        Self {
            modules,
            stats: IibStats::default(),
        }
    }

    /// Every snapshot, indexed by `address - 1`.
    #[inline]
    pub fn modules(&self) -> &[IibFapModule; MAX_IIB_MODULES] {
        &self.modules
    }

    /// Snapshot at `index`.
    #[inline]
    pub fn module(&self, index: usize) -> Option<&IibFapModule> {
        self.modules.get(index)
    }

    /// Frame counters.
    #[inline]
    pub fn stats(&self) -> IibStats {
        self.stats
    }

    /// Store one measurement.
    ///
    /// Returns the recognised data id, or `None` when `data_id` is
    /// unknown; in that case nothing changes except the
    /// `unknown_data_id` counter.
    pub fn apply_telemetry(
        &mut self,
        module_index: usize,
        data_id: u8,
        value: f32,
    ) -> Result<Option<IibDataId>, IibError> {
        let module = self
            .modules
            .get_mut(module_index)
            .ok_or(IibError::ModuleOutOfRange { index: module_index })?;

        match IibDataId::from_u8(data_id) {
            Some(id) => {
                module.apply(id, value);
                Ok(Some(id))
            }
            None => {
                self.stats.unknown_data_id += 1;
                debug!(module = module_index, data_id, "discarding unknown IIB data id");
                Ok(None)
            }
        }
    }

    /// Handle one field-bus frame.
    ///
    /// `local` is the supervisory region: it receives the latched IIB
    /// interlock and the family's mirrored signals.
    pub fn handle_frame(
        &mut self,
        local: &mut IpcRegion,
        kind: FrameKind,
        bytes: &[u8; FRAME_LEN],
    ) -> Result<(), IibError> {
        self.stats.frames += 1;
        let result = match kind {
            FrameKind::Data => self.handle_data(local, bytes),
            FrameKind::Interlock => self.handle_interlock_report(local, bytes),
            FrameKind::Alarm => self.handle_alarm_report(bytes),
        };
        if let Err(IibError::AddressOutOfRange { address }) = result {
            self.stats.rejected_address += 1;
            debug!(address, ?kind, "dropping frame from unknown IIB address");
        }
        result
    }

    fn handle_data(&mut self, local: &mut IpcRegion, bytes: &[u8; FRAME_LEN]) -> Result<(), IibError> {
        let sample = decode_frame(bytes);
        let index = sample
            .module_index()
            .ok_or(IibError::AddressOutOfRange { address: sample.address })?;

        trace!(address = sample.address, data_id = sample.data_id, value = sample.value, "IIB data");
        if let Some(id) = self.apply_telemetry(index, sample.data_id, sample.value)? {
            fap_4p::publish_iib_telemetry(local, index, id, sample.value);
        }
        Ok(())
    }

    fn handle_interlock_report(
        &mut self,
        local: &mut IpcRegion,
        bytes: &[u8; FRAME_LEN],
    ) -> Result<(), IibError> {
        let report = decode_interlock(bytes);
        let index = address_to_index(report.address)
            .ok_or(IibError::AddressOutOfRange { address: report.address })?;
        let module = &mut self.modules[index];

        module.itlk_summary |= report.raw;
        self.stats.interlock_reports += 1;
        warn!(
            address = report.address,
            raw = format_args!("{:#010x}", report.raw),
            flags = ?module.itlk_flags(),
            "IIB interlock report"
        );

        fap_4p::publish_iib_interlock(local, index, module.itlk_summary);
        apply_interlock(local, index, fap_4p::IIB_INTERLOCK)
    }

    fn handle_alarm_report(&mut self, bytes: &[u8; FRAME_LEN]) -> Result<(), IibError> {
        let report = decode_interlock(bytes);
        let index = address_to_index(report.address)
            .ok_or(IibError::AddressOutOfRange { address: report.address })?;

        self.modules[index].alarm_summary |= report.raw;
        self.stats.alarm_reports += 1;
        debug!(
            address = report.address,
            raw = format_args!("{:#010x}", report.raw),
            "IIB alarm report"
        );
        Ok(())
    }

    /// Operator reset of one board's summaries.
    ///
    /// Measurements are kept. The mirrored interlock word in `local` is
    /// cleared with the summary.
    pub fn reset(&mut self, local: &mut IpcRegion, module_index: usize) -> Result<(), IibError> {
        let module = self
            .modules
            .get_mut(module_index)
            .ok_or(IibError::ModuleOutOfRange { index: module_index })?;
        module.reset_summaries();
        fap_4p::publish_iib_interlock(local, module_index, 0);
        Ok(())
    }
}

const _: () = assert!(MAX_IIB_MODULES <= MAX_PS_MODULES);
