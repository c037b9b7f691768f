//! System-wide constants for the UDC workspace.
//!
//! Single source of truth for all capacity limits. The layout of the
//! message-RAM regions depends on these values, so both cores must be
//! built from the same set.

/// Maximum number of power-supply modules handled by one controller.
pub const MAX_PS_MODULES: usize = 4;

/// Maximum number of IIB field-bus boards (addresses `1..=MAX_IIB_MODULES`).
pub const MAX_IIB_MODULES: usize = 4;

/// Number of 32-bit "net signal" slots per region.
pub const NUM_NET_SIGNALS: usize = 32;

/// Number of 32-bit "output signal" slots per region.
pub const NUM_OUTPUT_SIGNALS: usize = 8;

/// Number of auxiliary parameters of the signal generator block.
pub const NUM_SIGGEN_AUX_PARAMS: usize = 4;

/// Number of concurrently outstanding conversations (message ids `0..=3`).
pub const NUM_MESSAGE_IDS: u8 = 4;

/// Capacity of the static variable registry.
pub const MAX_REGISTRY_VARS: usize = 128;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(MAX_PS_MODULES > 0 && MAX_PS_MODULES <= 32);
        assert!(MAX_IIB_MODULES > 0 && MAX_IIB_MODULES <= u8::MAX as usize);
        assert!(NUM_NET_SIGNALS > 0);
        assert!(NUM_OUTPUT_SIGNALS > 0);
    }

    #[test]
    fn message_ids_cover_every_module() {
        // Module-directed commands carry the module index as message id.
        assert!(MAX_PS_MODULES <= NUM_MESSAGE_IDS as usize);
    }
}
