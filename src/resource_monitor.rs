//! Resource monitoring for evaluation runs
//!
//! Tracks process memory and timing around model loading and the evaluation
//! loop. The run is single-threaded, so peak memory is sampled by the caller
//! (once per progress tick) rather than by a background thread.

use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Resource usage of one evaluation run
#[derive(Debug, Clone, Default)]
pub struct ResourceMetrics {
    /// Word vectors plus sequence model
    pub model_load_time_secs: f64,
    pub evaluation_time_secs: f64,
    /// Scored entities per second
    pub throughput_per_sec: f64,
    pub baseline_memory_mb: f64,
    pub model_memory_mb: f64,
    pub peak_memory_mb: f64,
}

impl ResourceMetrics {
    pub fn format_summary(&self) -> String {
        format!(
            "Load: {:.1}s | Eval: {:.1}s | Throughput: {:.1}/s | Models: {:.0}MB | Peak RAM: {:.0}MB",
            self.model_load_time_secs,
            self.evaluation_time_secs,
            self.throughput_per_sec,
            self.model_memory_mb,
            self.peak_memory_mb
        )
    }
}

pub struct ResourceMonitor {
    system: System,
    pid: Pid,
    baseline_memory_mb: f64,
    model_memory_mb: f64,
    model_load_time: Option<Duration>,
    peak_memory_mb: f64,
}

impl ResourceMonitor {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(std::process::id()),
            baseline_memory_mb: 0.0,
            model_memory_mb: 0.0,
            model_load_time: None,
            peak_memory_mb: 0.0,
        }
    }

    /// Current resident set size in MB
    fn process_memory_mb(&mut self) -> f64 {
        // Refresh only our process (sysinfo 0.32+ API)
        self.system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        match self.system.process(self.pid) {
            Some(process) => process.memory() as f64 / (1024.0 * 1024.0),
            None => 0.0,
        }
    }

    /// Snapshot memory before the vectors and model are loaded
    pub fn snapshot_baseline(&mut self) {
        self.baseline_memory_mb = self.process_memory_mb();
        self.peak_memory_mb = self.baseline_memory_mb;
        tracing::debug!("Baseline memory: {:.1} MB", self.baseline_memory_mb);
    }

    /// Record memory once the vectors and model are resident
    pub fn record_models_loaded(&mut self, load_duration: Duration) {
        let current = self.sample();
        self.model_memory_mb = current - self.baseline_memory_mb;
        self.model_load_time = Some(load_duration);
        tracing::debug!(
            "Models loaded: {:.1} MB (delta: {:.1} MB) in {:?}",
            current,
            self.model_memory_mb,
            load_duration
        );
    }

    /// Take a reading and fold it into the peak
    pub fn sample(&mut self) -> f64 {
        let current = self.process_memory_mb();
        self.peak_memory_mb = self.peak_memory_mb.max(current);
        current
    }

    pub fn finalize(mut self, eval_duration: Duration, scored: usize) -> ResourceMetrics {
        self.sample();

        let eval_secs = eval_duration.as_secs_f64();
        let throughput = if eval_secs > 0.0 {
            scored as f64 / eval_secs
        } else {
            0.0
        };

        ResourceMetrics {
            model_load_time_secs: self.model_load_time.map(|d| d.as_secs_f64()).unwrap_or(0.0),
            evaluation_time_secs: eval_secs,
            throughput_per_sec: throughput,
            baseline_memory_mb: self.baseline_memory_mb,
            model_memory_mb: self.model_memory_mb,
            peak_memory_mb: self.peak_memory_mb,
        }
    }
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_monitor_basic() {
        let mut monitor = ResourceMonitor::new();
        monitor.snapshot_baseline();

        let table: Vec<f32> = vec![0.5; 1 << 16];
        monitor.record_models_loaded(Duration::from_millis(100));
        monitor.sample();
        assert_eq!(table.len(), 1 << 16);

        let metrics = monitor.finalize(Duration::from_secs(2), 100);

        assert!(metrics.peak_memory_mb >= metrics.baseline_memory_mb);
        assert_eq!(metrics.throughput_per_sec, 50.0);
        assert!((metrics.model_load_time_secs - 0.1).abs() < 1e-9);
        assert!(metrics.format_summary().contains("Throughput: 50.0/s"));
    }

    #[test]
    fn test_zero_duration_has_zero_throughput() {
        let metrics = ResourceMonitor::new().finalize(Duration::ZERO, 10);
        assert_eq!(metrics.throughput_per_sec, 0.0);
    }
}
