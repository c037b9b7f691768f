//! Message transport between the two cores.
//!
//! An [`IpcEndpoint`] wraps one core's [`IpcTransport`] and implements the
//! send / busy / receive protocol on top of it. Received low-priority
//! commands are dispatched to a [`LowPriorityHandler`]:
//!
//! - [`SupervisoryHandler`] handles [`CtomCommand`]s on the supervisory
//!   core (HRADC reset line).
//! - [`ControlHandler`] handles [`MtocCommand`]s on the control core
//!   (module state, interlocks, signal generator).
//!
//! Handlers run in interrupt context: each command is a handful of field
//! writes, never a loop over external input or a wait on the peer.

use std::fmt::Debug;

use serde::Serialize;
use tracing::{debug, trace, warn};
use udc_common::ipc::{
    CtomCommand, LOW_PRIORITY_LANE_MASK, LowPriorityCommand, MessageId, MtocCommand,
    low_priority_code, low_priority_msg_to_reg,
};
use udc_common::ps::PsState;
use udc_common::shm::{Core, CoreView, IpcErrorCode, IpcRegion};

use crate::transport::IpcTransport;

/// Receiver of decoded low-priority commands.
pub trait LowPriorityHandler {
    /// Command set this handler understands.
    type Command: LowPriorityCommand + Debug;

    /// Apply one command. Must complete in bounded time.
    fn handle(&mut self, command: Self::Command, view: &mut CoreView<'_>);
}

/// Traffic counters of one endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IpcStats {
    /// Messages sent (both lanes).
    pub sent: u64,
    /// Non-empty receive interrupts serviced.
    pub received: u64,
    /// Low-priority commands dispatched.
    pub dispatched: u64,
    /// Tagged messages with a code outside the command set.
    pub ignored: u64,
}

/// One core's side of the message protocol.
#[derive(Debug)]
pub struct IpcEndpoint<T: IpcTransport> {
    core: Core,
    transport: T,
    stats: IpcStats,
}

impl<T: IpcTransport> IpcEndpoint<T> {
    /// Endpoint for `core` over `transport`.
    pub fn new(core: Core, transport: T) -> Self {
        Self {
            core,
            transport,
            stats: IpcStats::default(),
        }
    }

    /// Enable the receive interrupt. Call once at start-up.
    pub fn init(&self) {
        self.transport.enable_receive_interrupt();
        debug!(core = ?self.core, "IPC receive interrupt enabled");
    }

    /// Core owning this endpoint.
    #[inline]
    pub fn core(&self) -> Core {
        self.core
    }

    /// Underlying transport.
    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Traffic counters.
    #[inline]
    pub fn stats(&self) -> IpcStats {
        self.stats
    }

    /// Record `id` as the last message sent and raise `flag` to the peer.
    ///
    /// Does not check whether the peer has acknowledged earlier flags;
    /// use [`is_busy`](Self::is_busy) first when that matters.
    pub fn send(&mut self, local: &mut IpcRegion, id: MessageId, flag: u32) {
        local.msg_id = u32::from(id.get());
        self.transport.raise(flag);
        self.stats.sent += 1;
        trace!(core = ?self.core, id = id.get(), flag = format_args!("{flag:#010x}"), "IPC send");
    }

    /// Send a low-priority command.
    ///
    /// A command still pending on the low-priority lane is replaced.
    pub fn send_low_priority<C: LowPriorityCommand>(
        &mut self,
        local: &mut IpcRegion,
        id: MessageId,
        command: C,
    ) {
        let flag = low_priority_msg_to_reg(command.code());
        self.transport.retract(LOW_PRIORITY_LANE_MASK);
        self.send(local, id, flag);
    }

    /// Whether any bit of `mask` is still waiting for the peer's
    /// acknowledgment.
    #[inline]
    pub fn is_busy(&self, mask: u32) -> bool {
        self.transport.pending() & mask != 0
    }

    /// Whether a low-priority command is still unacknowledged.
    #[inline]
    pub fn is_low_priority_busy(&self) -> bool {
        self.is_busy(LOW_PRIORITY_LANE_MASK)
    }

    /// Receive interrupt body.
    ///
    /// Stores the incoming flags in `msg_in`, acknowledges exactly those
    /// bits and dispatches a tagged low-priority command to `handler`.
    /// Codes outside the handler's command set are dropped. Returns the
    /// flags read, `None` when nothing was pending.
    pub fn on_receive<H: LowPriorityHandler>(
        &mut self,
        view: &mut CoreView<'_>,
        handler: &mut H,
    ) -> Option<u32> {
        let flags = self.transport.status();
        if flags == 0 {
            return None;
        }

        view.local.msg_in = flags;
        self.transport.acknowledge(flags);
        self.stats.received += 1;

        if let Some(code) = low_priority_code(flags) {
            match H::Command::from_code(code) {
                Some(command) => {
                    trace!(core = ?self.core, ?command, "low-priority command");
                    handler.handle(command, view);
                    self.stats.dispatched += 1;
                }
                None => {
                    debug!(core = ?self.core, code, "ignoring unknown low-priority command");
                    self.stats.ignored += 1;
                }
            }
        }

        Some(flags)
    }
}

// ─── Supervisory core ───────────────────────────────────────────────

/// Reset line of the high-resolution ADC boards.
pub trait HradcControl {
    /// Assert (`true`) or release (`false`) the boards' reset.
    fn set_reset(&mut self, asserted: bool);
}

/// In-memory reset line used by the simulator and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HradcResetLine {
    asserted: bool,
    toggles: u32,
}

impl HradcResetLine {
    /// Line in its power-on state (boards held in reset).
    pub const fn new() -> Self {
        Self {
            asserted: true,
            toggles: 0,
        }
    }

    /// Whether the boards are held in reset.
    #[inline]
    pub const fn asserted(&self) -> bool {
        self.asserted
    }

    /// Number of level changes since power-on.
    #[inline]
    pub const fn toggles(&self) -> u32 {
        self.toggles
    }
}

impl Default for HradcResetLine {
    fn default() -> Self {
        Self::new()
    }
}

impl HradcControl for HradcResetLine {
    fn set_reset(&mut self, asserted: bool) {
        if self.asserted != asserted {
            self.toggles += 1;
        }
        self.asserted = asserted;
    }
}

/// Handler for commands arriving at the supervisory core.
#[derive(Debug, Default)]
pub struct SupervisoryHandler<H: HradcControl> {
    hradc: H,
}

impl<H: HradcControl> SupervisoryHandler<H> {
    /// Handler driving `hradc`.
    pub fn new(hradc: H) -> Self {
        Self { hradc }
    }

    /// HRADC reset line.
    pub fn hradc(&self) -> &H {
        &self.hradc
    }
}

impl<H: HradcControl> LowPriorityHandler for SupervisoryHandler<H> {
    type Command = CtomCommand;

    fn handle(&mut self, command: CtomCommand, _view: &mut CoreView<'_>) {
        match command {
            CtomCommand::EnableHradcBoards => self.hradc.set_reset(false),
            CtomCommand::DisableHradcBoards => self.hradc.set_reset(true),
        }
    }
}

// ─── Control core ───────────────────────────────────────────────────

/// Handler for commands arriving at the control core.
///
/// The target module is the `msg_id` the supervisory core recorded with
/// the command. Commands for inactive slots publish
/// [`IpcErrorCode::InvalidModule`] and change nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlHandler;

impl LowPriorityHandler for ControlHandler {
    type Command = MtocCommand;

    fn handle(&mut self, command: MtocCommand, view: &mut CoreView<'_>) {
        let index = view.peer.msg_id as usize;
        let Some(request) = view.peer.module(index).copied() else {
            warn!(index, ?command, "command for module outside the region");
            view.local.set_error(IpcErrorCode::InvalidModule);
            return;
        };

        let local = &mut *view.local;
        let Some(module) = local.ps_module.get_mut(index).filter(|m| m.status.active()) else {
            warn!(index, ?command, "command for inactive module");
            local.set_error(IpcErrorCode::InvalidModule);
            return;
        };

        let mut error = IpcErrorCode::NoError;
        match command {
            MtocCommand::TurnOn => {
                if module.hard_interlock.is_latched() {
                    warn!(index, "turn-on refused, hard interlock latched");
                    error = IpcErrorCode::TurnOnWithInterlock;
                } else {
                    module.status.set_state(PsState::SlowRef);
                }
            }
            MtocCommand::TurnOff => {
                if module.status.state() != Some(PsState::Interlock) {
                    module.status.set_state(PsState::Off);
                }
            }
            MtocCommand::OpenLoop => module.status.set_open_loop(true),
            MtocCommand::CloseLoop => module.status.set_open_loop(false),
            MtocCommand::SetSlowRef => module.setpoint = request.setpoint,
            MtocCommand::ResetInterlocks => {
                module.hard_interlock.reset();
                module.soft_interlock.reset();
                if module.status.state() == Some(PsState::Interlock) {
                    module.status.set_state(PsState::Off);
                }
                debug!(index, "interlocks reset");
            }
            MtocCommand::SetHardInterlock => {
                module.hard_interlock.latch_raw(request.hard_interlock.bits());
                if module.hard_interlock.is_latched() {
                    module.status.set_state(PsState::Interlock);
                    warn!(
                        index,
                        hard = format_args!("{:#010x}", module.hard_interlock.bits()),
                        "hard interlock latched"
                    );
                }
            }
            MtocCommand::SetSoftInterlock => {
                module.soft_interlock.latch_raw(request.soft_interlock.bits());
            }
            MtocCommand::EnableSigGen => {
                local.siggen = view.peer.siggen;
                local.siggen.enable = 1;
            }
            MtocCommand::DisableSigGen => local.siggen.enable = 0,
        }
        local.set_error(error);
    }
}
