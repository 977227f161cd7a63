use std::fmt;

/// Execution device tag.
///
/// Storage is host-visible in all cases (unified-memory model); the tag
/// exists so that kernel routing can reject batches that mix devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,
    /// An accelerator, identified by ordinal.
    Accel(u32),
}

impl Default for Device {
    fn default() -> Self {
        Device::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Accel(ord) => write!(f, "accel:{}", ord),
        }
    }
}
