//! Local host resource sampling.
//!
//! Produces partial [`ResourceUsagePatch`] values for the store while a
//! training run is active. Only CPU load and RAM come from the local host;
//! GPU figures belong to the backend and stay absent here.

use sysinfo::System;

use crate::domain::ResourceUsagePatch;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Samples CPU and memory usage of the machine running the client.
#[derive(Debug)]
pub struct ResourceSampler {
    system: System,
}

impl ResourceSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        // First CPU reading needs a baseline refresh to diff against.
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self { system }
    }

    /// Take one reading. GPU fields are left unset so backend-reported
    /// values are never overwritten.
    pub fn sample(&mut self) -> ResourceUsagePatch {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        ResourceUsagePatch {
            cpu_load_pct: Some(f64::from(self.system.global_cpu_usage())),
            ram_used_gb: Some(self.system.used_memory() as f64 / BYTES_PER_GIB),
            ..ResourceUsagePatch::default()
        }
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_reports_cpu_and_ram_only() {
        let mut sampler = ResourceSampler::new();
        let patch = sampler.sample();
        assert!(patch.cpu_load_pct.is_some());
        assert!(patch.ram_used_gb.is_some());
        assert!(patch.gpu_memory_gb.is_none());
        assert!(patch.gpu_load_pct.is_none());
    }

    #[test]
    fn readings_stay_in_plausible_ranges() {
        let mut sampler = ResourceSampler::new();
        let patch = sampler.sample();
        assert!(patch.cpu_load_pct.unwrap() >= 0.0);
        assert!(patch.ram_used_gb.unwrap() >= 0.0);
    }
}
