//! Inter-processor flag registers.
//!
//! Each direction has one flag register. The sending core ORs bits in
//! (`raise`) and may withdraw bits the receiver has not seen yet
//! (`retract`). The receiving core reads them as its status register
//! and clears them by acknowledging. The sender observes its pending
//! bits until that acknowledgment.
//!
//! [`IpcTransport`] is the seam between the protocol logic and the
//! hardware. [`SimulatedLink`] provides both ends of a pair of registers
//! for tests and for the `udc_sim` binary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// One core's access to the inter-processor flag registers.
///
/// Every method is a single register access: bounded, non-blocking and
/// safe to call from interrupt context.
pub trait IpcTransport {
    /// OR `flags` into the outgoing set register.
    ///
    /// Writes to the local region made before this call are visible to
    /// the peer once it observes the flag.
    fn raise(&self, flags: u32);

    /// Withdraw outgoing bits the peer has not acknowledged yet.
    fn retract(&self, mask: u32);

    /// Outgoing bits not yet acknowledged by the peer.
    fn pending(&self) -> u32;

    /// Incoming bits set by the peer.
    fn status(&self) -> u32;

    /// Clear incoming `flags` (acknowledge them to the peer).
    fn acknowledge(&self, flags: u32);

    /// Route incoming flags to this core's receive interrupt.
    fn enable_receive_interrupt(&self);

    /// Whether the receive interrupt line is asserted.
    fn irq_asserted(&self) -> bool;
}

#[derive(Debug, Default)]
struct FlagRegister {
    bits: AtomicU32,
    irq_enabled: AtomicBool,
}

/// Both flag registers of a simulated core pair.
#[derive(Debug, Default)]
pub struct SimulatedLink {
    mtoc: Arc<FlagRegister>,
    ctom: Arc<FlagRegister>,
}

impl SimulatedLink {
    /// Create a link and return `(supervisory, control)` ports.
    pub fn pair() -> (SimulatedPort, SimulatedPort) {
        let link = Self::default();
        let supervisory = SimulatedPort {
            outgoing: Arc::clone(&link.mtoc),
            incoming: Arc::clone(&link.ctom),
        };
        let control = SimulatedPort {
            outgoing: link.ctom,
            incoming: link.mtoc,
        };
        (supervisory, control)
    }
}

/// One end of a [`SimulatedLink`].
///
/// Clones refer to the same registers and may be moved to another thread
/// to model the peer core.
#[derive(Debug, Clone)]
pub struct SimulatedPort {
    outgoing: Arc<FlagRegister>,
    incoming: Arc<FlagRegister>,
}

impl IpcTransport for SimulatedPort {
    #[inline]
    fn raise(&self, flags: u32) {
        self.outgoing.bits.fetch_or(flags, Ordering::Release);
    }

    #[inline]
    fn retract(&self, mask: u32) {
        self.outgoing.bits.fetch_and(!mask, Ordering::AcqRel);
    }

    #[inline]
    fn pending(&self) -> u32 {
        self.outgoing.bits.load(Ordering::Acquire)
    }

    #[inline]
    fn status(&self) -> u32 {
        self.incoming.bits.load(Ordering::Acquire)
    }

    #[inline]
    fn acknowledge(&self, flags: u32) {
        self.incoming.bits.fetch_and(!flags, Ordering::AcqRel);
    }

    fn enable_receive_interrupt(&self) {
        self.incoming.irq_enabled.store(true, Ordering::Release);
    }

    #[inline]
    fn irq_asserted(&self) -> bool {
        self.incoming.irq_enabled.load(Ordering::Acquire) && self.status() != 0
    }
}
