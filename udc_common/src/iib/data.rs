//! IIB telemetry snapshot for FAP modules.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Measurement carried by a telemetry frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum IibDataId {
    /// Input (DC-link) voltage [V].
    Vin = 2,
    /// Output voltage [V].
    Vout = 3,
    /// Output current, arm 1 [A].
    IoutA1 = 4,
    /// Output current, arm 2 [A].
    IoutA2 = 5,
    /// IGBT 1 temperature [°C].
    TempIgbt1 = 6,
    /// IGBT 2 temperature [°C].
    TempIgbt2 = 7,
    /// Gate-driver supply voltage [V].
    DriveVoltage = 8,
    /// Gate-driver 1 current [A].
    Drive1Current = 9,
    /// Gate-driver 2 current [A].
    Drive2Current = 10,
    /// Output inductor temperature [°C].
    TempL = 11,
    /// Heat-sink temperature [°C].
    TempHeatSink = 12,
}

impl IibDataId {
    /// Every data id in wire order.
    pub const ALL: [Self; 11] = [
        Self::Vin,
        Self::Vout,
        Self::IoutA1,
        Self::IoutA2,
        Self::TempIgbt1,
        Self::TempIgbt2,
        Self::DriveVoltage,
        Self::Drive1Current,
        Self::Drive2Current,
        Self::TempL,
        Self::TempHeatSink,
    ];

    /// Convert from the wire id. Unknown ids return `None`.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(Self::Vin),
            3 => Some(Self::Vout),
            4 => Some(Self::IoutA1),
            5 => Some(Self::IoutA2),
            6 => Some(Self::TempIgbt1),
            7 => Some(Self::TempIgbt2),
            8 => Some(Self::DriveVoltage),
            9 => Some(Self::Drive1Current),
            10 => Some(Self::Drive2Current),
            11 => Some(Self::TempL),
            12 => Some(Self::TempHeatSink),
            _ => None,
        }
    }
}

bitflags! {
    /// Raw interlock bits reported by an IIB board of a FAP module.
    ///
    /// The controller stores the raw word; these names are for diagnostics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IibItlkFlags: u32 {
        /// Input overvoltage.
        const INPUT_OVERVOLTAGE   = 0x0000_0001;
        /// Output overvoltage.
        const OUTPUT_OVERVOLTAGE  = 0x0000_0002;
        /// Arm 1 overcurrent.
        const IOUT_A1_OVERCURRENT = 0x0000_0004;
        /// Arm 2 overcurrent.
        const IOUT_A2_OVERCURRENT = 0x0000_0008;
        /// IGBT 1 overtemperature.
        const IGBT1_OVERTEMP      = 0x0000_0010;
        /// IGBT 2 overtemperature.
        const IGBT2_OVERTEMP      = 0x0000_0020;
        /// Gate-driver supply overvoltage.
        const DRIVER_OVERVOLTAGE  = 0x0000_0040;
        /// Gate-driver 1 overcurrent.
        const DRIVER1_OVERCURRENT = 0x0000_0080;
        /// Gate-driver 2 overcurrent.
        const DRIVER2_OVERCURRENT = 0x0000_0100;
        /// Gate-driver 1 error.
        const DRIVER1_ERROR       = 0x0000_0200;
        /// Gate-driver 2 error.
        const DRIVER2_ERROR       = 0x0000_0400;
        /// Inductor overtemperature.
        const INDUCTOR_OVERTEMP   = 0x0000_0800;
        /// Heat-sink overtemperature.
        const HEATSINK_OVERTEMP   = 0x0000_1000;
    }
}

/// Latest values reported by one IIB board.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IibFapModule {
    /// Bus address of the board.
    pub can_address: u8,
    /// Input voltage [V].
    pub vin: f32,
    /// Output voltage [V].
    pub vout: f32,
    /// Arm 1 output current [A].
    pub iout_a1: f32,
    /// Arm 2 output current [A].
    pub iout_a2: f32,
    /// IGBT 1 temperature [°C].
    pub temp_igbt1: f32,
    /// IGBT 2 temperature [°C].
    pub temp_igbt2: f32,
    /// Gate-driver supply voltage [V].
    pub drive_voltage: f32,
    /// Gate-driver 1 current [A].
    pub drive1_current: f32,
    /// Gate-driver 2 current [A].
    pub drive2_current: f32,
    /// Inductor temperature [°C].
    pub temp_l: f32,
    /// Heat-sink temperature [°C].
    pub temp_heat_sink: f32,
    /// OR of every interlock word reported since the last reset.
    pub itlk_summary: u32,
    /// OR of every alarm word reported since the last reset.
    pub alarm_summary: u32,
}

impl IibFapModule {
    /// Snapshot for the board at `can_address`.
    pub fn new(can_address: u8) -> Self {
        Self {
            can_address,
            ..Self::default()
        }
    }

    /// Store one measurement.
    pub fn apply(&mut self, id: IibDataId, value: f32) {
        *self.field_mut(id) = value;
    }

    /// Read one measurement.
    pub fn get(&self, id: IibDataId) -> f32 {
        match id {
            IibDataId::Vin => self.vin,
            IibDataId::Vout => self.vout,
            IibDataId::IoutA1 => self.iout_a1,
            IibDataId::IoutA2 => self.iout_a2,
            IibDataId::TempIgbt1 => self.temp_igbt1,
            IibDataId::TempIgbt2 => self.temp_igbt2,
            IibDataId::DriveVoltage => self.drive_voltage,
            IibDataId::Drive1Current => self.drive1_current,
            IibDataId::Drive2Current => self.drive2_current,
            IibDataId::TempL => self.temp_l,
            IibDataId::TempHeatSink => self.temp_heat_sink,
        }
    }

    fn field_mut(&mut self, id: IibDataId) -> &mut f32 {
        match id {
            IibDataId::Vin => &mut self.vin,
            IibDataId::Vout => &mut self.vout,
            IibDataId::IoutA1 => &mut self.iout_a1,
            IibDataId::IoutA2 => &mut self.iout_a2,
            IibDataId::TempIgbt1 => &mut self.temp_igbt1,
            IibDataId::TempIgbt2 => &mut self.temp_igbt2,
            IibDataId::DriveVoltage => &mut self.drive_voltage,
            IibDataId::Drive1Current => &mut self.drive1_current,
            IibDataId::Drive2Current => &mut self.drive2_current,
            IibDataId::TempL => &mut self.temp_l,
            IibDataId::TempHeatSink => &mut self.temp_heat_sink,
        }
    }

    /// Decoded interlock summary.
    pub fn itlk_flags(&self) -> IibItlkFlags {
        IibItlkFlags::from_bits_retain(self.itlk_summary)
    }

    /// Clear the interlock and alarm summaries (operator reset).
    pub fn reset_summaries(&mut self) {
        self.itlk_summary = 0;
        self.alarm_summary = 0;
    }
}
