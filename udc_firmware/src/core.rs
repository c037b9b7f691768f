//! Per-core entry points.
//!
//! The scheduler and the interrupt vectors call into these two types;
//! neither keeps any timing state of its own.
//!
//! ```text
//!  field bus ──► Supervisor::on_field_bus_frame ──► IibAggregator ──► mtoc region
//!                Supervisor::housekeeping ──SetHardInterlock──► ControlCore
//!                Supervisor::on_ipc_interrupt ◄──CtomCommand── ControlCore
//! ```

use thiserror::Error;
use tracing::{debug, info, trace};
use udc_common::consts::MAX_PS_MODULES;
use udc_common::iib::{FRAME_LEN, FrameKind};
use udc_common::ipc::{CtomCommand, MessageId, MtocCommand};
use udc_common::shm::{Core, CoreView};

use crate::iib::IibAggregator;
use crate::ipc::{ControlHandler, HradcControl, IpcEndpoint, SupervisoryHandler};
use crate::transport::IpcTransport;

/// Rejected operator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Module index outside the region.
    #[error("module index {index} out of range")]
    ModuleOutOfRange {
        /// Offending index.
        index: usize,
    },

    /// The previous low-priority command has not been acknowledged.
    #[error("low-priority lane busy")]
    LaneBusy,
}

fn message_id_for(index: usize) -> Result<MessageId, CommandError> {
    if index >= MAX_PS_MODULES {
        return Err(CommandError::ModuleOutOfRange { index });
    }
    u8::try_from(index)
        .ok()
        .and_then(MessageId::new)
        .ok_or(CommandError::ModuleOutOfRange { index })
}

/// `SetHardInterlock` sent to the control core and not yet acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Forward {
    index: usize,
    bits: u32,
}

/// Supervisory (communications) core.
#[derive(Debug)]
pub struct Supervisor<T: IpcTransport, H: HradcControl> {
    ipc: IpcEndpoint<T>,
    handler: SupervisoryHandler<H>,
    iib: IibAggregator,
    forwarded: [u32; MAX_PS_MODULES],
    in_flight: Option<Forward>,
}

impl<T: IpcTransport, H: HradcControl> Supervisor<T, H> {
    /// Supervisor over `transport`, driving `hradc`.
    pub fn new(transport: T, hradc: H) -> Self {
        Self {
            ipc: IpcEndpoint::new(Core::Supervisory, transport),
            handler: SupervisoryHandler::new(hradc),
            iib: IibAggregator::new(),
            forwarded: [0; MAX_PS_MODULES],
            in_flight: None,
        }
    }

    /// Enable the IPC receive interrupt.
    pub fn init(&self) {
        self.ipc.init();
        info!("supervisory core ready");
    }

    /// IPC endpoint.
    pub fn ipc(&self) -> &IpcEndpoint<T> {
        &self.ipc
    }

    /// IIB snapshots and counters.
    pub fn iib(&self) -> &IibAggregator {
        &self.iib
    }

    /// HRADC reset line.
    pub fn hradc(&self) -> &H {
        self.handler.hradc()
    }

    /// Field-bus receive interrupt.
    ///
    /// Frames with a message id this controller does not listen to, or
    /// from an unknown address, are dropped. Returns whether the frame was
    /// applied.
    pub fn on_field_bus_frame(
        &mut self,
        view: &mut CoreView<'_>,
        message_id: u32,
        bytes: &[u8; FRAME_LEN],
    ) -> bool {
        let Some(kind) = FrameKind::from_message_id(message_id) else {
            trace!(message_id, "ignoring field-bus message id");
            return false;
        };
        self.iib.handle_frame(view.local, kind, bytes).is_ok()
    }

    /// IPC receive interrupt.
    pub fn on_ipc_interrupt(&mut self, view: &mut CoreView<'_>) -> Option<u32> {
        self.ipc.on_receive(view, &mut self.handler)
    }

    /// Hard-interlock bits the control core has acknowledged for
    /// `module_index`.
    pub fn forwarded(&self, module_index: usize) -> u32 {
        self.forwarded.get(module_index).copied().unwrap_or(0)
    }

    /// Commit the in-flight forward once the control core has taken it
    /// off the lane.
    fn confirm_forward(&mut self) {
        if self.ipc.is_low_priority_busy() {
            return;
        }
        if let Some(Forward { index, bits }) = self.in_flight.take() {
            self.forwarded[index] |= bits;
            trace!(index, bits = format_args!("{bits:#010x}"), "hard interlock acknowledged");
        }
    }

    /// The lane is about to be overwritten: an unacknowledged forward is
    /// dropped from the lane and will be sent again.
    fn requeue_forward(&mut self) {
        if let Some(Forward { index, .. }) = self.in_flight.take() {
            debug!(index, "hard interlock forward displaced, requeued");
        }
    }

    /// Periodic task: forward newly latched hard interlocks to the
    /// control core.
    ///
    /// At most one module is forwarded per call, and only while the
    /// low-priority lane is idle. Bits count as forwarded once the control
    /// core acknowledges them. Slots inactive on the control core are
    /// skipped; their causes stay latched in the supervisory region.
    /// Returns the forwarded module index.
    pub fn housekeeping(&mut self, view: &mut CoreView<'_>) -> Option<usize> {
        self.confirm_forward();
        if self.ipc.is_low_priority_busy() {
            return None;
        }

        for index in 0..MAX_PS_MODULES {
            let latched = view.local.ps_module[index].hard_interlock.bits();
            let fresh = latched & !self.forwarded[index];
            if fresh == 0 {
                continue;
            }
            if !view.peer.ps_module[index].status.active() {
                trace!(index, "hard interlock on inactive slot not forwarded");
                continue;
            }
            let id = message_id_for(index).ok()?;
            self.ipc
                .send_low_priority(view.local, id, MtocCommand::SetHardInterlock);
            self.in_flight = Some(Forward { index, bits: fresh });
            debug!(index, fresh = format_args!("{fresh:#010x}"), "hard interlock forwarded");
            return Some(index);
        }
        None
    }

    /// Send a module command. Refused while the lane is busy.
    pub fn send_command(
        &mut self,
        view: &mut CoreView<'_>,
        module_index: usize,
        command: MtocCommand,
    ) -> Result<(), CommandError> {
        let id = message_id_for(module_index)?;
        self.confirm_forward();
        if self.ipc.is_low_priority_busy() {
            return Err(CommandError::LaneBusy);
        }
        self.ipc.send_low_priority(view.local, id, command);
        Ok(())
    }

    /// Operator interlock reset of one module.
    ///
    /// Clears the supervisory request registers and the IIB summaries,
    /// then asks the control core to clear its registers. Replaces any
    /// command still pending on the lane; a displaced interlock forward is
    /// sent again by the next [`housekeeping`](Self::housekeeping).
    pub fn reset_interlocks(
        &mut self,
        view: &mut CoreView<'_>,
        module_index: usize,
    ) -> Result<(), CommandError> {
        let id = message_id_for(module_index)?;
        self.confirm_forward();
        self.requeue_forward();
        let module = &mut view.local.ps_module[module_index];
        module.hard_interlock.reset();
        module.soft_interlock.reset();
        self.forwarded[module_index] = 0;
        if self.iib.reset(view.local, module_index).is_err() {
            trace!(module_index, "no IIB board at this index");
        }
        self.ipc
            .send_low_priority(view.local, id, MtocCommand::ResetInterlocks);
        info!(module_index, "interlock reset requested");
        Ok(())
    }
}

/// Control (regulation) core.
#[derive(Debug)]
pub struct ControlCore<T: IpcTransport> {
    ipc: IpcEndpoint<T>,
    handler: ControlHandler,
}

impl<T: IpcTransport> ControlCore<T> {
    /// Control core over `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            ipc: IpcEndpoint::new(Core::Control, transport),
            handler: ControlHandler,
        }
    }

    /// Enable the IPC receive interrupt.
    pub fn init(&self) {
        self.ipc.init();
        info!("control core ready");
    }

    /// IPC endpoint.
    pub fn ipc(&self) -> &IpcEndpoint<T> {
        &self.ipc
    }

    /// IPC receive interrupt.
    pub fn on_ipc_interrupt(&mut self, view: &mut CoreView<'_>) -> Option<u32> {
        self.ipc.on_receive(view, &mut self.handler)
    }

    /// Ask the supervisory core to release (`true`) or hold (`false`)
    /// the HRADC boards.
    pub fn request_hradc(&mut self, view: &mut CoreView<'_>, enable: bool) {
        let command = if enable {
            CtomCommand::EnableHradcBoards
        } else {
            CtomCommand::DisableHradcBoards
        };
        self.ipc
            .send_low_priority(view.local, MessageId::ZERO, command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::HradcResetLine;
    use crate::transport::{SimulatedLink, SimulatedPort};
    use udc_common::config::PsConfig;
    use udc_common::iib::frame::encode_interlock;
    use udc_common::ps::{Fap4pHardInterlock, InterlockCause, PsModel, PsState};
    use udc_common::shm::{IpcErrorCode, SharedMemory};

    struct Rig {
        shm: SharedMemory,
        m3: Supervisor<SimulatedPort, HradcResetLine>,
        c28: ControlCore<SimulatedPort>,
    }

    fn rig() -> Rig {
        let mut shm = SharedMemory::new();
        shm.init(&PsConfig {
            model: PsModel::Fap4P,
            num_ps_modules: 4,
        });
        let (m3, c28) = SimulatedLink::pair();
        let rig = Rig {
            shm,
            m3: Supervisor::new(m3, HradcResetLine::new()),
            c28: ControlCore::new(c28),
        };
        rig.m3.init();
        rig.c28.init();
        rig
    }

    #[test]
    fn iib_interlock_reaches_control_core() {
        let mut r = rig();
        assert!(r.m3.on_field_bus_frame(
            &mut r.shm.supervisory(),
            FrameKind::Interlock.message_id(),
            &encode_interlock(3, 0x20),
        ));

        assert_eq!(r.m3.housekeeping(&mut r.shm.supervisory()), Some(2));
        assert_eq!(r.m3.housekeeping(&mut r.shm.supervisory()), None);
        assert!(r.c28.on_ipc_interrupt(&mut r.shm.control()).is_some());

        let module = r.shm.region(Core::Control).ps_module[2];
        assert!(module.hard_interlock.contains(Fap4pHardInterlock::IibItlk));
        assert_eq!(module.status.state(), Some(PsState::Interlock));

        assert_eq!(r.m3.housekeeping(&mut r.shm.supervisory()), None);
    }

    #[test]
    fn unknown_bus_message_id_is_dropped() {
        let mut r = rig();
        assert!(!r.m3.on_field_bus_frame(&mut r.shm.supervisory(), 0x40, &[1; 8]));
        assert_eq!(r.m3.iib().stats().frames, 0);
    }

    #[test]
    fn send_command_waits_for_idle_lane() {
        let mut r = rig();
        r.m3.send_command(&mut r.shm.supervisory(), 0, MtocCommand::TurnOn)
            .unwrap();
        assert_eq!(
            r.m3.send_command(&mut r.shm.supervisory(), 1, MtocCommand::TurnOn),
            Err(CommandError::LaneBusy)
        );
        r.c28.on_ipc_interrupt(&mut r.shm.control());
        r.m3.send_command(&mut r.shm.supervisory(), 1, MtocCommand::TurnOn)
            .unwrap();
        r.c28.on_ipc_interrupt(&mut r.shm.control());

        let region = r.shm.region(Core::Control);
        assert_eq!(region.ps_module[0].status.state(), Some(PsState::SlowRef));
        assert_eq!(region.ps_module[1].status.state(), Some(PsState::SlowRef));
        assert_eq!(
            r.m3.send_command(&mut r.shm.supervisory(), MAX_PS_MODULES, MtocCommand::TurnOn),
            Err(CommandError::ModuleOutOfRange {
                index: MAX_PS_MODULES
            })
        );
    }

    #[test]
    fn reset_clears_both_sides_and_allows_new_latch() {
        let mut r = rig();
        let frame = encode_interlock(1, 0x1);
        r.m3.on_field_bus_frame(&mut r.shm.supervisory(), FrameKind::Interlock.message_id(), &frame);
        r.m3.housekeeping(&mut r.shm.supervisory());
        r.c28.on_ipc_interrupt(&mut r.shm.control());

        r.m3.reset_interlocks(&mut r.shm.supervisory(), 0).unwrap();
        r.c28.on_ipc_interrupt(&mut r.shm.control());
        assert!(!r.shm.region(Core::Supervisory).ps_module[0].hard_interlock.is_latched());
        assert!(!r.shm.region(Core::Control).ps_module[0].hard_interlock.is_latched());
        assert_eq!(
            r.shm.region(Core::Control).ps_module[0].status.state(),
            Some(PsState::Off)
        );
        assert_eq!(r.m3.iib().module(0).unwrap().itlk_summary, 0);

        r.m3.on_field_bus_frame(&mut r.shm.supervisory(), FrameKind::Interlock.message_id(), &frame);
        assert_eq!(r.m3.housekeeping(&mut r.shm.supervisory()), Some(0));
    }

    #[test]
    fn reset_of_one_module_keeps_pending_forward_of_another() {
        let mut r = rig();
        r.m3.send_command(&mut r.shm.supervisory(), 2, MtocCommand::TurnOn)
            .unwrap();
        r.c28.on_ipc_interrupt(&mut r.shm.control());

        r.m3.on_field_bus_frame(
            &mut r.shm.supervisory(),
            FrameKind::Interlock.message_id(),
            &encode_interlock(3, 0x1),
        );
        assert_eq!(r.m3.housekeeping(&mut r.shm.supervisory()), Some(2));
        r.m3.reset_interlocks(&mut r.shm.supervisory(), 0).unwrap();
        assert_eq!(r.m3.forwarded(2), 0);

        for _ in 0..10 {
            r.c28.on_ipc_interrupt(&mut r.shm.control());
            r.m3.housekeeping(&mut r.shm.supervisory());
        }

        let module = r.shm.region(Core::Control).ps_module[2];
        assert!(module.hard_interlock.contains(Fap4pHardInterlock::IibItlk));
        assert_eq!(module.status.state(), Some(PsState::Interlock));
        assert_eq!(r.m3.forwarded(2), Fap4pHardInterlock::IibItlk.bit());
    }

    #[test]
    fn forward_counts_only_after_acknowledgment() {
        let mut r = rig();
        r.m3.on_field_bus_frame(
            &mut r.shm.supervisory(),
            FrameKind::Interlock.message_id(),
            &encode_interlock(1, 0x1),
        );
        assert_eq!(r.m3.housekeeping(&mut r.shm.supervisory()), Some(0));
        assert_eq!(r.m3.forwarded(0), 0);

        r.c28.on_ipc_interrupt(&mut r.shm.control());
        assert_eq!(r.m3.housekeeping(&mut r.shm.supervisory()), None);
        assert_eq!(r.m3.forwarded(0), Fap4pHardInterlock::IibItlk.bit());
    }

    #[test]
    fn inactive_slot_is_not_forwarded() {
        let mut shm = SharedMemory::new();
        shm.init(&PsConfig {
            model: PsModel::Fap4P,
            num_ps_modules: 1,
        });
        let (m3, c28) = SimulatedLink::pair();
        let mut m3 = Supervisor::new(m3, HradcResetLine::new());
        let mut c28 = ControlCore::new(c28);
        m3.init();
        c28.init();

        m3.on_field_bus_frame(
            &mut shm.supervisory(),
            FrameKind::Interlock.message_id(),
            &encode_interlock(2, 0x1),
        );
        assert!(shm.region(Core::Supervisory).ps_module[1].hard_interlock.is_latched());
        assert_eq!(m3.housekeeping(&mut shm.supervisory()), None);
        assert!(!m3.ipc().is_low_priority_busy());
        assert_eq!(m3.forwarded(1), 0);

        // The active slot still gets its forward.
        m3.on_field_bus_frame(
            &mut shm.supervisory(),
            FrameKind::Interlock.message_id(),
            &encode_interlock(1, 0x1),
        );
        assert_eq!(m3.housekeeping(&mut shm.supervisory()), Some(0));
        c28.on_ipc_interrupt(&mut shm.control());
        assert_eq!(shm.region(Core::Control).error(), Some(IpcErrorCode::NoError));
        assert_eq!(
            shm.region(Core::Control).ps_module[0].status.state(),
            Some(PsState::Interlock)
        );
    }

    #[test]
    fn hradc_request_toggles_supervisory_line() {
        let mut r = rig();
        r.c28.request_hradc(&mut r.shm.control(), true);
        r.m3.on_ipc_interrupt(&mut r.shm.supervisory());
        assert!(!r.m3.hradc().asserted());
    }
}
