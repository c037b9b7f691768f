//! Power-supply module model.
//!
//! - `status`: 16-bit status word, operating states and model codes.
//! - `interlock`: ordered interlock causes and the sticky 32-bit registers.

pub mod interlock;
pub mod status;

pub use interlock::{Fap4pHardInterlock, InterlockCause, InterlockRegister};
pub use status::{PsModel, PsState, PsStatus};
