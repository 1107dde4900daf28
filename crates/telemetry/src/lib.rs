//! Logging and metrics for lastmile
//!
//! This crate provides:
//! - Structured logging with tracing, to stderr and optionally a file
//! - Request counters and latency histograms with JSON export
//! - Session ids for correlating a run's log lines

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Metric names recorded by the bot
pub mod names {
    /// Inbound messages seen
    pub const REQUESTS_TOTAL: &str = "requests_total";
    /// Messages dropped by the allow-list
    pub const REQUESTS_REJECTED: &str = "requests_rejected";
    /// Messages that carried no location
    pub const REQUESTS_IGNORED: &str = "requests_ignored";
    /// Feasible verdicts
    pub const VERDICTS_FEASIBLE: &str = "verdicts_feasible";
    /// Infeasible verdicts
    pub const VERDICTS_INFEASIBLE: &str = "verdicts_infeasible";
    /// Verdicts whose metric failed
    pub const VERDICTS_UNKNOWN: &str = "verdicts_unknown";
    /// Time to resolve every technology for one point
    pub const RESOLVE_MS: &str = "resolve_ms";
}

/// Keeps background log writers alive; drop it last.
pub struct TelemetryGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize with custom configuration
///
/// `RUST_LOG` takes precedence over `config.log_level`. Console output goes
/// to stderr so stdout stays free for replies.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let console = if config.json {
        fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_target(config.show_target)
            .with_current_span(false)
            .boxed()
    } else {
        fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number)
            .boxed()
    };

    let (file_layer, file_guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(&dir)?;

            let appender = tracing_appender::rolling::never(&dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))?;

    tracing::info!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _file_guard: file_guard,
    })
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Fresh correlation id for one request
pub fn request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
    /// Also write logs to this file
    pub log_file: Option<PathBuf>,
    /// Include the event target
    pub show_target: bool,
    /// Include thread ids
    pub show_thread_ids: bool,
    /// Include source file
    pub show_file: bool,
    /// Include source line
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            log_file: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

/// Samples kept per histogram for percentiles. Count, sum, min and max
/// cover every sample ever recorded.
pub const HISTOGRAM_WINDOW: usize = 1024;

/// Running totals plus a bounded window of recent samples.
#[derive(Debug, Default)]
struct Histogram {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    recent: VecDeque<f64>,
}

impl Histogram {
    fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;

        if self.recent.len() == HISTOGRAM_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(value);
    }

    fn stats(&self) -> HistogramStats {
        let (head, tail) = self.recent.as_slices();
        let mut stats = HistogramStats::from_values(&[head, tail].concat());
        if self.count > 0 {
            stats.count = self.count as usize;
            stats.min = self.min;
            stats.max = self.max;
            stats.mean = self.sum / self.count as f64;
        }
        stats
    }
}

/// Metrics registry for collecting and exporting metrics
#[derive(Debug)]
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, AtomicU64>>,
    gauges: RwLock<HashMap<String, AtomicU64>>,
    histograms: RwLock<HashMap<String, Histogram>>,
    start_time: Instant,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Increment a counter
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    /// Increment a counter by a specific amount
    pub fn increment_by(&self, name: &str, value: u64) {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(counter) = counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        } else {
            drop(counters);
            let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
            counters
                .entry(name.to_string())
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(value, Ordering::Relaxed);
        }
    }

    /// Current value of a counter; zero if never incremented
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Set a gauge value
    pub fn gauge(&self, name: &str, value: u64) {
        let mut gauges = self.gauges.write().unwrap_or_else(PoisonError::into_inner);
        gauges
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .store(value, Ordering::Relaxed);
    }

    /// Record a histogram value
    pub fn histogram(&self, name: &str, value: f64) {
        let mut histograms = self.histograms.write().unwrap_or_else(PoisonError::into_inner);
        histograms.entry(name.to_string()).or_default().record(value);
    }

    /// Number of samples recorded for a histogram
    pub fn histogram_count(&self, name: &str) -> usize {
        self.histograms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |h| h.count as usize)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Start a timer that records into this registry
    pub fn timer(&self, name: impl Into<String>) -> Timer<'_> {
        Timer::on(self, name)
    }

    /// Export metrics as JSON
    pub fn export_json(&self) -> serde_json::Value {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        let histograms = self.histograms.read().unwrap_or_else(PoisonError::into_inner);

        let counter_values: HashMap<String, u64> = counters
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();

        let gauge_values: HashMap<String, u64> = gauges
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();

        let histogram_stats: HashMap<String, HistogramStats> = histograms
            .iter()
            .map(|(k, v)| (k.clone(), v.stats()))
            .collect();

        serde_json::json!({
            "session_id": session_id(),
            "exported_at": Utc::now().to_rfc3339(),
            "uptime_secs": self.uptime_secs(),
            "counters": counter_values,
            "gauges": gauge_values,
            "histograms": histogram_stats,
        })
    }
}

/// Histogram statistics
#[derive(Debug, Serialize)]
pub struct HistogramStats {
    /// Samples
    pub count: usize,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Mean of samples
    pub mean: f64,
    /// Median
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
}

impl HistogramStats {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                p50: 0.0,
                p95: 0.0,
                p99: 0.0,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sum / count as f64,
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        }
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Timer for measuring operation duration, in milliseconds.
///
/// Records once, on [`Timer::stop`] or on drop.
pub struct Timer<'a> {
    registry: &'a MetricsRegistry,
    name: String,
    start: Instant,
    recorded: bool,
}

impl<'a> Timer<'a> {
    /// Start a timer on a specific registry
    pub fn on(registry: &'a MetricsRegistry, name: impl Into<String>) -> Self {
        Self {
            registry,
            name: name.into(),
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(mut self) -> Duration {
        let duration = self.record();
        tracing::debug!(
            metric = %self.name,
            duration_ms = duration.as_millis(),
            "Timer completed"
        );
        duration
    }

    fn record(&mut self) -> Duration {
        let duration = self.start.elapsed();
        if !self.recorded {
            self.registry.histogram(&self.name, duration.as_secs_f64() * 1000.0);
            self.recorded = true;
        }
        duration
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.record();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_counter() {
        let registry = MetricsRegistry::new();
        registry.increment(names::REQUESTS_TOTAL);
        registry.increment(names::REQUESTS_TOTAL);
        registry.increment_by(names::REQUESTS_TOTAL, 3);

        assert_eq!(registry.counter(names::REQUESTS_TOTAL), 5);
        assert_eq!(registry.counter(names::REQUESTS_REJECTED), 0);
    }

    #[test]
    fn test_metrics_gauge() {
        let registry = MetricsRegistry::new();
        registry.gauge("facilities_wireless", 42);
        registry.gauge("facilities_wireless", 100);

        let gauges = registry.gauges.read().unwrap();
        assert_eq!(gauges.get("facilities_wireless").unwrap().load(Ordering::Relaxed), 100);
    }

    #[test]
    fn test_histogram_stats() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let stats = HistogramStats::from_values(&values);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.mean, 5.5);
    }

    #[test]
    fn test_histogram_window_is_bounded() {
        let registry = MetricsRegistry::new();
        for i in 0..(HISTOGRAM_WINDOW * 3) {
            registry.histogram(names::RESOLVE_MS, i as f64);
        }

        let histograms = registry.histograms.read().unwrap();
        let histogram = &histograms[names::RESOLVE_MS];
        assert_eq!(histogram.recent.len(), HISTOGRAM_WINDOW);
        assert_eq!(histogram.recent.front().copied(), Some((HISTOGRAM_WINDOW * 2) as f64));

        let stats = histogram.stats();
        assert_eq!(stats.count, HISTOGRAM_WINDOW * 3);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, (HISTOGRAM_WINDOW * 3 - 1) as f64);
        assert!(stats.p50 >= (HISTOGRAM_WINDOW * 2) as f64);
    }

    #[test]
    fn test_timer_records_once() {
        let registry = MetricsRegistry::new();
        let timer = registry.timer(names::RESOLVE_MS);
        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.stop();
        assert!(duration.as_millis() >= 10);
        assert_eq!(registry.histogram_count(names::RESOLVE_MS), 1);

        {
            let _timer = registry.timer(names::RESOLVE_MS);
        }
        assert_eq!(registry.histogram_count(names::RESOLVE_MS), 2);
    }

    #[test]
    fn test_export_json() {
        let registry = MetricsRegistry::new();
        registry.increment(names::VERDICTS_FEASIBLE);
        registry.histogram(names::RESOLVE_MS, 4.0);

        let json = registry.export_json();
        assert_eq!(json["counters"][names::VERDICTS_FEASIBLE], 1);
        assert_eq!(json["histograms"][names::RESOLVE_MS]["count"], 1);
        assert!(json["exported_at"].is_string());
    }

    #[test]
    fn test_session_id() {
        let id = session_id();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(id).is_ok());
        assert_ne!(request_id(), request_id());
    }
}
