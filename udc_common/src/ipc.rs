//! Inter-processor communication encoding.
//!
//! - `message`: message ids, the low-priority lane encoding and the
//!   command sets of both directions.
//! - `translate`: address conversion between the two cores.

pub mod message;
pub mod translate;

pub use message::{
    CtomCommand, LOW_PRIORITY_LANE_MASK, LOW_PRIORITY_TAG, LowPriorityCommand, MessageId, MtocCommand,
    low_priority_code, low_priority_msg_to_reg,
};
pub use translate::{TranslateError, to_peer, to_self};
