//! Process resource probes (CPU clock + memory map).

use std::fmt::Debug;
use std::time::Duration;

use crate::error::Result;
use crate::memory::MemorySnapshot;

/// Reads process-wide resource counters.
///
/// Implementations must be cheap enough to call twice per request. The real
/// implementation is [`ProcProbe`]; tests substitute scripted values.
pub trait ResourceProbe: Debug + Send + Sync + 'static {
    /// Process CPU time (user + system) consumed so far.
    fn cpu_time(&self) -> Result<Duration>;

    /// Memory map of the process, summed across all regions.
    fn memory(&self) -> Result<MemorySnapshot>;
}

/// Probe backed by the OS: `cpu-time` for the process clock and
/// `/proc/self/smaps` for the memory map.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcProbe;

impl ProcProbe {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceProbe for ProcProbe {
    fn cpu_time(&self) -> Result<Duration> {
        let now = cpu_time::ProcessTime::try_now()?;
        Ok(now.as_duration())
    }

    #[cfg(target_os = "linux")]
    fn memory(&self) -> Result<MemorySnapshot> {
        // Synchronous read on the calling thread, twice per measured request.
        let raw = std::fs::read("/proc/self/smaps")?;
        let regions = crate::memory::parse_smaps_bytes(&raw)?;
        Ok(MemorySnapshot::summed(&regions))
    }

    #[cfg(not(target_os = "linux"))]
    fn memory(&self) -> Result<MemorySnapshot> {
        Err(crate::error::ViewMeterError::Unsupported(
            "memory maps are only read from /proc on linux",
        ))
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn reads_own_process() {
        let probe = ProcProbe::new();
        let before = probe.cpu_time().unwrap();
        let mut x = 0u64;
        for i in 0..200_000u64 {
            x = x.wrapping_mul(31).wrapping_add(i);
        }
        std::hint::black_box(x);
        assert!(probe.cpu_time().unwrap() >= before);

        let mem = probe.memory().unwrap();
        assert!(mem.rss > 0);
    }
}
