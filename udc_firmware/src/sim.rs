//! Host-side simulation of both cores.
//!
//! Wires a [`Supervisor`] and a [`ControlCore`] to one [`SharedMemory`]
//! over a [`SimulatedLink`], feeds recorded field-bus frames through the
//! supervisor and services both IPC interrupts until no message is left
//! in flight.
//!
//! Frame files hold one frame per line:
//!
//! ```text
//! # kind  b0 b1 b2 b3 b4 b5 b6 b7
//! data    03 06 00 00 00 00 2a 42
//! itlk    02 00 00 00 00 00 00 00
//! alarm   01 00 00 00 00 08 00 00
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use udc_common::config::UdcConfig;
use udc_common::iib::{FRAME_LEN, FrameKind, IibFapModule};
use udc_common::ps::{PsModel, PsState};
use udc_common::shm::{Core, SharedMemory};

use crate::core::{ControlCore, Supervisor};
use crate::fap_4p;
use crate::iib::IibStats;
use crate::ipc::{HradcResetLine, IpcStats};
use crate::registry::{RegistryError, StaticRegistry};
use crate::transport::{IpcTransport, SimulatedLink, SimulatedPort};

/// Upper bound on interrupt rounds per [`Simulator::settle`] call.
pub const MAX_SETTLE_ROUNDS: usize = 64;

/// Malformed frame-file line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameParseError {
    /// First token is not `data`, `itlk` or `alarm`.
    #[error("line {line}: unknown frame kind '{kind}'")]
    UnknownKind {
        /// 1-based line number.
        line: usize,
        /// Token found.
        kind: String,
    },

    /// A byte token is not two hex digits.
    #[error("line {line}: invalid byte '{token}'")]
    InvalidByte {
        /// 1-based line number.
        line: usize,
        /// Token found.
        token: String,
    },

    /// Not exactly eight bytes.
    #[error("line {line}: expected {expected} bytes, found {found}", expected = FRAME_LEN)]
    WrongLength {
        /// 1-based line number.
        line: usize,
        /// Bytes found.
        found: usize,
    },
}

/// Parse a frame file. Blank lines and `#` comments are skipped.
pub fn parse_frames(text: &str) -> Result<Vec<(FrameKind, [u8; FRAME_LEN])>, FrameParseError> {
    let mut frames = Vec::new();
    for (n, raw) in text.lines().enumerate() {
        let line = n + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let mut tokens = content.split_whitespace();
        let kind = match tokens.next() {
            Some("data") => FrameKind::Data,
            Some("itlk") => FrameKind::Interlock,
            Some("alarm") => FrameKind::Alarm,
            other => {
                return Err(FrameParseError::UnknownKind {
                    line,
                    kind: other.unwrap_or_default().to_string(),
                });
            }
        };

        let mut bytes = [0u8; FRAME_LEN];
        let mut found = 0;
        for token in tokens {
            let value = u8::from_str_radix(token.trim_start_matches("0x"), 16).map_err(|_| {
                FrameParseError::InvalidByte {
                    line,
                    token: token.to_string(),
                }
            })?;
            if found < FRAME_LEN {
                bytes[found] = value;
            }
            found += 1;
        }
        if found != FRAME_LEN {
            return Err(FrameParseError::WrongLength { line, found });
        }
        frames.push((kind, bytes));
    }
    Ok(frames)
}

/// Per-module slice of the report.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    /// Module index.
    pub index: usize,
    /// Slot in use.
    pub active: bool,
    /// Operating state on the control core.
    pub state: Option<PsState>,
    /// Open-loop flag on the control core.
    pub open_loop: bool,
    /// Hard interlocks requested by the supervisory core.
    pub supervisory_hard_interlock: u32,
    /// Hard interlocks latched on the control core.
    pub hard_interlock: u32,
    /// Soft interlocks latched on the control core.
    pub soft_interlock: u32,
    /// Applied setpoint.
    pub setpoint: f32,
}

/// Final state printed by `udc_sim`.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    /// Instance name from the configuration.
    pub service_name: String,
    /// Configured model.
    pub model: PsModel,
    /// Frames fed to the supervisor.
    pub frames_in: usize,
    /// Frames applied.
    pub frames_applied: usize,
    /// Per-module status.
    pub modules: Vec<ModuleReport>,
    /// IIB snapshots.
    pub iib: Vec<IibFapModule>,
    /// IIB frame counters.
    pub iib_stats: IibStats,
    /// Supervisory endpoint counters.
    pub supervisory_ipc: IpcStats,
    /// Control endpoint counters.
    pub control_ipc: IpcStats,
    /// HRADC boards held in reset.
    pub hradc_reset: bool,
    /// Bound remote variables.
    pub variables: usize,
}

/// Both cores and their shared memory.
#[derive(Debug)]
pub struct Simulator {
    config: UdcConfig,
    shm: SharedMemory,
    supervisor: Supervisor<SimulatedPort, HradcResetLine>,
    control: ControlCore<SimulatedPort>,
    registry: StaticRegistry,
    frames_in: usize,
    frames_applied: usize,
}

impl Simulator {
    /// Initialise shared memory and both cores from `config`.
    pub fn new(config: UdcConfig) -> Result<Self, RegistryError> {
        let mut shm = SharedMemory::new();
        shm.init(&config.ps);

        let (m3, c28) = SimulatedLink::pair();
        let supervisor = Supervisor::new(m3, HradcResetLine::new());
        let control = ControlCore::new(c28);
        supervisor.init();
        control.init();

        let mut registry = StaticRegistry::new();
        if config.ps.model == PsModel::Fap4P {
            fap_4p::bind_variables(&mut registry)?;
        }
        info!(
            model = ?config.ps.model,
            modules = config.ps.num_ps_modules,
            variables = registry.len(),
            "simulator initialised"
        );

        Ok(Self {
            config,
            shm,
            supervisor,
            control,
            registry,
            frames_in: 0,
            frames_applied: 0,
        })
    }

    /// Shared memory.
    pub fn shared_memory(&self) -> &SharedMemory {
        &self.shm
    }

    /// Supervisory core.
    pub fn supervisor(&self) -> &Supervisor<SimulatedPort, HradcResetLine> {
        &self.supervisor
    }

    /// Variable registry.
    pub fn registry(&self) -> &StaticRegistry {
        &self.registry
    }

    /// Deliver one field-bus frame to the supervisor.
    pub fn feed(&mut self, kind: FrameKind, bytes: &[u8; FRAME_LEN]) -> bool {
        self.frames_in += 1;
        let applied = self
            .supervisor
            .on_field_bus_frame(&mut self.shm.supervisory(), kind.message_id(), bytes);
        if applied {
            self.frames_applied += 1;
        }
        applied
    }

    /// Run housekeeping and service both receive interrupts until no
    /// flag is pending. Returns the number of rounds that did work.
    pub fn settle(&mut self) -> usize {
        let mut busy_rounds = 0;
        for _ in 0..MAX_SETTLE_ROUNDS {
            let mut worked = false;
            if self.control.ipc().transport().irq_asserted() {
                worked |= self.control.on_ipc_interrupt(&mut self.shm.control()).is_some();
            }
            if self.supervisor.ipc().transport().irq_asserted() {
                worked |= self.supervisor.on_ipc_interrupt(&mut self.shm.supervisory()).is_some();
            }
            worked |= self.supervisor.housekeeping(&mut self.shm.supervisory()).is_some();
            if !worked {
                break;
            }
            busy_rounds += 1;
        }
        debug!(rounds = busy_rounds, "IPC settled");
        busy_rounds
    }

    /// Feed every frame, settling after each one.
    pub fn run(&mut self, frames: &[(FrameKind, [u8; FRAME_LEN])]) {
        for (kind, bytes) in frames {
            self.feed(*kind, bytes);
            self.settle();
        }
    }

    /// Ask the control core to release the HRADC boards.
    pub fn enable_hradc(&mut self) {
        self.control.request_hradc(&mut self.shm.control(), true);
    }

    /// Snapshot of both cores.
    pub fn report(&self) -> SimReport {
        let mtoc = self.shm.region(Core::Supervisory);
        let ctom = self.shm.region(Core::Control);
        let modules = ctom
            .ps_module
            .iter()
            .zip(mtoc.ps_module.iter())
            .enumerate()
            .map(|(index, (c, s))| ModuleReport {
                index,
                active: c.status.active(),
                state: c.status.state(),
                open_loop: c.status.open_loop(),
                supervisory_hard_interlock: s.hard_interlock.bits(),
                hard_interlock: c.hard_interlock.bits(),
                soft_interlock: c.soft_interlock.bits(),
                setpoint: c.setpoint,
            })
            .collect();

        SimReport {
            service_name: self.config.shared.service_name.clone(),
            model: self.config.ps.model,
            frames_in: self.frames_in,
            frames_applied: self.frames_applied,
            modules,
            iib: self.supervisor.iib().modules().to_vec(),
            iib_stats: self.supervisor.iib().stats(),
            supervisory_ipc: self.supervisor.ipc().stats(),
            control_ipc: self.control.ipc().stats(),
            hradc_reset: self.supervisor.hradc().asserted(),
            variables: self.registry.len(),
        }
    }
}
