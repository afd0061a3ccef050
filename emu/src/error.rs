use thiserror::Error;

/// Diagnostics the core surfaces to its host.
///
/// Architectural traps (undefined opcodes, software interrupts) are not errors
/// and never show up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("invalid mode bits 0b{0:05b}")]
    InvalidMode(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{len} bytes do not fit at {address:#010x}")]
    DoesNotFit { address: u32, len: usize },
}
