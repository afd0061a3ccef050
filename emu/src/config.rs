use serde::{Deserialize, Serialize};

use crate::cpu::cpu_modes::Mode;

/// Reset state and host policy of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// PC after reset.
    pub reset_vector: u32,

    pub reset_mode: Mode,

    /// Starts decoding Thumb instead of ARM.
    pub start_in_thumb: bool,

    pub irq_disabled_at_reset: bool,
    pub fiq_disabled_at_reset: bool,

    /// Returns from `execute` at the next instruction boundary after a
    /// program tried to switch to an invalid mode.
    pub halt_on_invalid_mode: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            reset_vector: 0,
            reset_mode: Mode::Supervisor,
            start_in_thumb: false,
            irq_disabled_at_reset: true,
            fiq_disabled_at_reset: true,
            halt_on_invalid_mode: false,
        }
    }
}
