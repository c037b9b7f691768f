//! Message-RAM region layout.
//!
//! Each core owns one region and only reads the other. Both regions share
//! this layout; field offsets are a contract between the two firmware
//! images and are pinned by the assertions at the bottom of this file.
//!
//! | Offset | Field            | Type                                  |
//! |--------|------------------|---------------------------------------|
//! | 0      | `msg_id`         | `u32` (last message id sent)          |
//! | 4      | `msg_in`         | `u32` (last flags received)           |
//! | 8      | `error`          | `u16` (`IpcErrorCode`)                |
//! | 12     | `ps_module`      | `[ModuleStatus; MAX_PS_MODULES]`      |
//! | 92     | `net_signals`    | `[SignalSlot; NUM_NET_SIGNALS]`       |
//! | 220    | `output_signals` | `[SignalSlot; NUM_OUTPUT_SIGNALS]`    |
//! | 252    | `siggen`         | `SigGen`                              |
//! | 288    | `dsp_module`     | `DspModule`                           |

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

use crate::config::PsConfig;
use crate::consts::{MAX_PS_MODULES, NUM_NET_SIGNALS, NUM_OUTPUT_SIGNALS, NUM_SIGGEN_AUX_PARAMS};
use crate::ps::{InterlockRegister, PsStatus};

/// One 32-bit signal cell.
///
/// Producers and consumers agree on the meaning of each index at build
/// time. The cell is stored as raw bits and converted explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SignalSlot(u32);

impl SignalSlot {
    /// Slot holding `value` as IEEE-754 bits.
    #[inline]
    pub const fn from_f32(value: f32) -> Self {
        Self(value.to_bits())
    }

    /// Slot holding raw bits.
    #[inline]
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    /// Value as a float.
    #[inline]
    pub const fn f32(&self) -> f32 {
        f32::from_bits(self.0)
    }

    /// Value as raw bits.
    #[inline]
    pub const fn u32(&self) -> u32 {
        self.0
    }

    /// Store a float.
    #[inline]
    pub fn set_f32(&mut self, value: f32) {
        self.0 = value.to_bits();
    }

    /// Store raw bits.
    #[inline]
    pub fn set_u32(&mut self, value: u32) {
        self.0 = value;
    }

    /// Little-endian byte image, as exposed to remote monitoring.
    #[inline]
    pub const fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

/// Status, interlocks and references of one power-supply module.
///
/// Size: 20 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct ModuleStatus {
    /// Packed status word.
    pub status: PsStatus,
    /// Padding.
    pub _reserved: u16,
    /// Non-fatal causes.
    pub soft_interlock: InterlockRegister,
    /// Fatal causes; any bit forces the module out of its operating state.
    pub hard_interlock: InterlockRegister,
    /// Setpoint requested by the supervisory core.
    pub setpoint: f32,
    /// Reference currently applied by the control loop.
    pub reference: f32,
}

/// Signal generator parameters.
///
/// Size: 36 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct SigGen {
    /// Non-zero while the generator drives the reference.
    pub enable: u16,
    /// Waveform kind.
    pub kind: u16,
    /// Number of cycles (0 = continuous).
    pub num_cycles: u16,
    /// Padding.
    pub _pad: u16,
    /// Frequency [Hz].
    pub freq: f32,
    /// Amplitude [A].
    pub amplitude: f32,
    /// Offset [A].
    pub offset: f32,
    /// Waveform-specific parameters.
    pub aux_param: [f32; NUM_SIGGEN_AUX_PARAMS],
}

/// DSP module identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct DspModule {
    /// DSP class code.
    pub dsp_class: u16,
    /// Instance id.
    pub id: u16,
}

/// Last-error code published by a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u16)]
pub enum IpcErrorCode {
    /// No error.
    #[default]
    NoError = 0,
    /// Turn-on refused because a hard interlock is latched.
    TurnOnWithInterlock = 1,
    /// Command addressed a module slot that is not active.
    InvalidModule = 2,
}

impl IpcErrorCode {
    /// Convert from raw value. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::NoError),
            1 => Some(Self::TurnOnWithInterlock),
            2 => Some(Self::InvalidModule),
            _ => None,
        }
    }
}

/// One message-RAM region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct IpcRegion {
    /// Id of the last message sent by the owning core.
    pub msg_id: u32,
    /// Flags of the last message received by the owning core.
    pub msg_in: u32,
    /// Raw `IpcErrorCode`.
    pub error: u16,
    /// Padding.
    pub _pad: u16,
    /// Per-module status.
    pub ps_module: [ModuleStatus; MAX_PS_MODULES],
    /// Measurement and intermediate signals.
    pub net_signals: [SignalSlot; NUM_NET_SIGNALS],
    /// Actuation signals (duty cycles).
    pub output_signals: [SignalSlot; NUM_OUTPUT_SIGNALS],
    /// Signal generator block.
    pub siggen: SigGen,
    /// DSP identification block.
    pub dsp_module: DspModule,
}

impl IpcRegion {
    /// Start-up initialisation.
    ///
    /// Zeroes the region, writes the configured model into every module
    /// slot and marks the first `num_ps_modules` slots active. Message and
    /// error fields end at their "no message" / `NoError` values.
    pub fn init(&mut self, config: &PsConfig) {
        *self = Self::default();

        for module in self.ps_module.iter_mut() {
            module.status.set_model(config.model);
        }

        let active = (config.num_ps_modules as usize).min(MAX_PS_MODULES);
        for module in self.ps_module[..active].iter_mut() {
            module.status.set_active(true);
        }

        self.error = IpcErrorCode::NoError as u16;
    }

    /// Module slot by index.
    #[inline]
    pub fn module(&self, index: usize) -> Option<&ModuleStatus> {
        self.ps_module.get(index)
    }

    /// Mutable module slot by index.
    #[inline]
    pub fn module_mut(&mut self, index: usize) -> Option<&mut ModuleStatus> {
        self.ps_module.get_mut(index)
    }

    /// Number of active module slots.
    pub fn active_modules(&self) -> usize {
        self.ps_module.iter().filter(|m| m.status.active()).count()
    }

    /// Decoded last-error code.
    #[inline]
    pub const fn error(&self) -> Option<IpcErrorCode> {
        IpcErrorCode::from_u16(self.error)
    }

    /// Publish a last-error code.
    #[inline]
    pub fn set_error(&mut self, code: IpcErrorCode) {
        self.error = code as u16;
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Static Assertions
// ═══════════════════════════════════════════════════════════════════

const_assert_eq!(core::mem::size_of::<SignalSlot>(), 4);
const_assert_eq!(core::mem::size_of::<ModuleStatus>(), 20);
const_assert_eq!(core::mem::size_of::<SigGen>(), 36);
const_assert_eq!(core::mem::size_of::<DspModule>(), 4);
const_assert_eq!(core::mem::size_of::<IpcRegion>(), 292);

const _: () = assert!(core::mem::offset_of!(IpcRegion, ps_module) == 12);
const _: () = assert!(core::mem::offset_of!(IpcRegion, net_signals) == 92);
const _: () = assert!(core::mem::offset_of!(IpcRegion, output_signals) == 220);
const _: () = assert!(core::mem::offset_of!(IpcRegion, siggen) == 252);
const _: () = assert!(core::mem::offset_of!(IpcRegion, dsp_module) == 288);
