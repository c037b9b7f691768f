//! Flag-register message encoding.
//!
//! A flag register carries two lanes. The high-priority lane is any 32-bit
//! flag the receiver interprets on its own. The low-priority lane packs a
//! 4-bit command into the same register:
//!
//! | Bits  | Content                      |
//! |-------|------------------------------|
//! | 3:0   | `LOW_PRIORITY_TAG`           |
//! | 7:4   | command code                 |
//! | 15:8  | unused                       |
//!
//! The encoded value is masked to 16 bits.

/// Tag in bits 3:0 marking a low-priority command.
pub const LOW_PRIORITY_TAG: u32 = 0x0000_0001;

/// Register bits owned by the low-priority lane (tag and code).
///
/// High-priority flags must stay clear of these bits.
pub const LOW_PRIORITY_LANE_MASK: u32 = 0x0000_00FF;

const TAG_MASK: u32 = 0x0000_000F;
const CODE_SHIFT: u32 = 4;
const CODE_MASK: u32 = 0x0000_000F;
const REGISTER_MASK: u32 = 0x0000_FFFF;

/// Conversation slot of a message (`0..=3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u8);

impl MessageId {
    /// Highest valid id.
    pub const MAX: u8 = crate::consts::NUM_MESSAGE_IDS - 1;

    /// Id 0, used for messages not addressed to a module.
    pub const ZERO: Self = Self(0);

    /// Construct a message id. Returns `None` above [`Self::MAX`].
    #[inline]
    pub const fn new(id: u8) -> Option<Self> {
        if id <= Self::MAX { Some(Self(id)) } else { None }
    }

    /// Raw id.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Encode a command code into a low-priority register value.
#[inline]
pub const fn low_priority_msg_to_reg(code: u8) -> u32 {
    (((code as u32) << CODE_SHIFT) | LOW_PRIORITY_TAG) & REGISTER_MASK
}

/// Command code carried by `flags`, or `None` if `flags` is not tagged as
/// a low-priority message.
#[inline]
pub const fn low_priority_code(flags: u32) -> Option<u8> {
    if flags & TAG_MASK == LOW_PRIORITY_TAG {
        Some(((flags >> CODE_SHIFT) & CODE_MASK) as u8)
    } else {
        None
    }
}

/// A closed set of low-priority commands for one direction.
pub trait LowPriorityCommand: Copy + Sized {
    /// 4-bit wire code.
    fn code(self) -> u8;

    /// Decode a wire code. Unknown codes return `None`.
    fn from_code(code: u8) -> Option<Self>;
}

/// Commands sent by the control core to the supervisory core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CtomCommand {
    /// Release the HRADC boards from reset.
    EnableHradcBoards = 0,
    /// Hold the HRADC boards in reset.
    DisableHradcBoards = 1,
}

impl LowPriorityCommand for CtomCommand {
    #[inline]
    fn code(self) -> u8 {
        self as u8
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::EnableHradcBoards),
            1 => Some(Self::DisableHradcBoards),
            _ => None,
        }
    }
}

/// Commands sent by the supervisory core to the control core.
///
/// The sender's `msg_id` names the target module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MtocCommand {
    /// Enter `SlowRef` unless a hard interlock is latched.
    TurnOn = 0,
    /// Return to `Off`.
    TurnOff = 1,
    /// Open the regulation loop.
    OpenLoop = 2,
    /// Close the regulation loop.
    CloseLoop = 3,
    /// Apply the supervisory setpoint.
    SetSlowRef = 4,
    /// Operator reset of both interlock registers.
    ResetInterlocks = 5,
    /// Latch the hard interlocks requested in the supervisory region.
    SetHardInterlock = 6,
    /// Latch the soft interlocks requested in the supervisory region.
    SetSoftInterlock = 7,
    /// Start the signal generator.
    EnableSigGen = 8,
    /// Stop the signal generator.
    DisableSigGen = 9,
}

impl LowPriorityCommand for MtocCommand {
    #[inline]
    fn code(self) -> u8 {
        self as u8
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::TurnOn),
            1 => Some(Self::TurnOff),
            2 => Some(Self::OpenLoop),
            3 => Some(Self::CloseLoop),
            4 => Some(Self::SetSlowRef),
            5 => Some(Self::ResetInterlocks),
            6 => Some(Self::SetHardInterlock),
            7 => Some(Self::SetSoftInterlock),
            8 => Some(Self::EnableSigGen),
            9 => Some(Self::DisableSigGen),
            _ => None,
        }
    }
}
