//! Feasibility checks across every registered technology.
//!
//! The service owns one registry and one distance metric per technology.
//! A check resolves all technologies concurrently and always produces one
//! verdict per technology: a failing or slow metric turns into an unknown
//! verdict for that technology alone.

use futures::future::join_all;
use lastmile_core::config::{Config, MetricKind};
use lastmile_core::{Error, ErrorCode, Result};
use lastmile_geo::loader::{load_path, LoadReport};
use lastmile_geo::ranking::shortlist;
use lastmile_geo::{
    classify, resolve, unavailable, Coordinate, DistanceMetric, FacilitySet, FeasibilityVerdict, Geodesic,
    MetricError, Outcome, Resolution, Technology, Unavailable,
};
use lastmile_routing::{RoadNetwork, RoutingClient, RoutingConfig};
use lastmile_telemetry::{names, MetricsRegistry};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default bound on one technology's resolution
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// One technology as the service sees it.
#[derive(Clone)]
pub struct TechnologyEntry {
    /// Technology judged
    pub technology: Technology,
    /// Threshold in meters
    pub threshold_m: f64,
    /// Facilities, immutable after load
    pub registry: FacilitySet,
    /// How distance is measured
    pub metric: Arc<dyn DistanceMetric>,
    /// Geodesic shortlist size before the metric runs (0 = every record)
    pub candidates: usize,
}

impl TechnologyEntry {
    /// Entry measured with `metric` over the whole registry.
    pub fn new(registry: FacilitySet, threshold_m: f64, metric: Arc<dyn DistanceMetric>) -> Self {
        Self {
            technology: registry.technology(),
            threshold_m,
            registry,
            metric,
            candidates: 0,
        }
    }

    /// Entry measured by great-circle distance.
    pub fn geodesic(registry: FacilitySet, threshold_m: f64) -> Self {
        Self::new(registry, threshold_m, Arc::new(Geodesic))
    }

    /// Builder-style method to set the shortlist size
    #[must_use]
    pub fn with_candidates(mut self, candidates: usize) -> Self {
        self.candidates = candidates;
        self
    }
}

/// What was loaded for one technology at startup.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    /// Technology loaded
    pub technology: Technology,
    /// Source file, if one was configured
    pub source: Option<PathBuf>,
    /// Records in the registry
    pub records: usize,
    /// Malformed records skipped
    pub skipped: usize,
    /// False when the source could not be read
    pub available: bool,
    /// Distance metric in use
    pub metric: &'static str,
    /// Threshold in meters
    pub threshold_m: f64,
}

/// Verdicts for one point, in technology order.
#[derive(Debug, Clone, Serialize)]
pub struct FeasibilityReport {
    /// Point checked
    pub point: Coordinate,
    /// One verdict per registered technology
    pub verdicts: Vec<FeasibilityVerdict>,
}

impl FeasibilityReport {
    /// True when no technology resolved a facility, whether for lack of
    /// data or because every metric failed.
    pub fn all_unknown(&self) -> bool {
        !self.verdicts.iter().any(|v| v.outcome == Outcome::Resolved)
    }

    /// Verdict for one technology.
    pub fn verdict(&self, technology: Technology) -> Option<&FeasibilityVerdict> {
        self.verdicts.iter().find(|v| v.technology == technology)
    }
}

/// Resolves and classifies a point against every technology.
#[derive(Clone)]
pub struct FeasibilityService {
    entries: Arc<[TechnologyEntry]>,
    timeout: Duration,
    metrics: Arc<MetricsRegistry>,
}

impl FeasibilityService {
    /// Start building a service.
    pub fn builder() -> FeasibilityServiceBuilder {
        FeasibilityServiceBuilder::default()
    }

    /// Build from configuration: load every source and pick each metric.
    ///
    /// Unreadable sources become empty registries. A road metric without a
    /// routing endpoint makes that technology report unknown. Errors are
    /// returned only for invalid configuration.
    pub fn from_config(config: &Config, metrics: Arc<MetricsRegistry>) -> Result<(Self, Vec<LoadSummary>)> {
        let routing = routing_client(config)?;
        let routing_section = &config.schema.routing;

        let mut builder = Self::builder().timeout(config.routing_timeout()).metrics(metrics);
        let mut summaries = Vec::with_capacity(config.schema.technologies.len());

        for (name, tech) in &config.schema.technologies {
            let technology: Technology = name
                .parse()
                .map_err(|e: String| Error::config_invalid(e).with_context(format!("[technologies.{name}]")))?;
            if builder.entries.iter().any(|e| e.technology == technology) {
                return Err(Error::config_invalid(format!(
                    "technology '{technology}' is configured more than once"
                )));
            }

            let source = tech.source.as_deref().map(|s| config.resolve_source(s));
            let (report, available) = match &source {
                Some(path) => match load_path(technology, path) {
                    Ok(report) => (report, true),
                    Err(e) => {
                        let err = Error::data_unavailable(format!("cannot load {technology} facilities"))
                            .with_context(path.display().to_string())
                            .with_source(e);
                        warn!(
                            technology = %technology,
                            code = %err.code,
                            error = %err,
                            "Facility source unavailable, registry left empty"
                        );
                        (LoadReport::empty(technology), false)
                    }
                },
                None => (LoadReport::empty(technology), true),
            };

            let (metric, candidates): (Arc<dyn DistanceMetric>, usize) = match (tech.metric, &routing) {
                (MetricKind::Geodesic, _) => (Arc::new(Geodesic), 0),
                (MetricKind::Road, Some(client)) => (
                    Arc::new(RoadNetwork::new(client.clone())),
                    routing_section.candidates,
                ),
                (MetricKind::Road, None) => {
                    let err = Error::metric_unavailable("routing service not configured")
                        .with_suggestion("Set [routing] endpoint or LASTMILE_ROUTING_URL");
                    warn!(technology = %technology, code = %err.code, "{}", err.message);
                    (Arc::new(Unavailable::new(err.message)), 0)
                }
            };

            summaries.push(LoadSummary {
                technology,
                source,
                records: report.set.len(),
                skipped: report.skipped,
                available,
                metric: metric.name(),
                threshold_m: tech.threshold_m,
            });
            builder = builder.technology(
                TechnologyEntry::new(report.set, tech.threshold_m, metric).with_candidates(candidates),
            );
        }

        summaries.sort_by_key(|s| s.technology);
        let service = builder.build();
        for summary in &summaries {
            service
                .metrics
                .gauge(&format!("facilities_{}", summary.technology), summary.records as u64);
            info!(
                technology = %summary.technology,
                records = summary.records,
                skipped = summary.skipped,
                metric = summary.metric,
                "Registry ready"
            );
        }
        Ok((service, summaries))
    }

    /// Registered technologies in report order
    pub fn technologies(&self) -> impl Iterator<Item = Technology> + '_ {
        self.entries.iter().map(|e| e.technology)
    }

    /// Registry for one technology
    pub fn registry(&self, technology: Technology) -> Option<&FacilitySet> {
        self.entries
            .iter()
            .find(|e| e.technology == technology)
            .map(|e| &e.registry)
    }

    /// Metrics registry the service records into
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Check a point against every technology concurrently.
    pub async fn check(&self, point: Coordinate) -> FeasibilityReport {
        let timer = self.metrics.timer(names::RESOLVE_MS);
        let verdicts = join_all(self.entries.iter().map(|entry| self.check_one(entry, &point))).await;
        timer.stop();

        for verdict in &verdicts {
            let counter = match (&verdict.outcome, verdict.is_feasible) {
                (Outcome::MetricUnavailable(_), _) => names::VERDICTS_UNKNOWN,
                (_, true) => names::VERDICTS_FEASIBLE,
                (_, false) => names::VERDICTS_INFEASIBLE,
            };
            self.metrics.increment(counter);
        }

        FeasibilityReport { point, verdicts }
    }

    async fn check_one(&self, entry: &TechnologyEntry, point: &Coordinate) -> FeasibilityVerdict {
        if entry.registry.is_empty() {
            debug!(technology = %entry.technology, "No facilities registered");
            return classify(entry.technology, &Resolution::none(), entry.threshold_m);
        }

        let candidates = shortlist(point, &entry.registry, entry.candidates);
        match timeout(self.timeout, resolve(point, &candidates, entry.metric.as_ref())).await {
            Ok(Ok(resolution)) => classify(entry.technology, &resolution, entry.threshold_m),
            Ok(Err(e)) => {
                warn!(technology = %entry.technology, metric = entry.metric.name(), error = %e, "Distance metric failed");
                unavailable(entry.technology, entry.threshold_m, e.to_string())
            }
            Err(_) => {
                let e = MetricError::Timeout(self.timeout);
                warn!(
                    technology = %entry.technology,
                    metric = entry.metric.name(),
                    code = %ErrorCode::MetricTimeout,
                    "Distance metric timed out"
                );
                unavailable(entry.technology, entry.threshold_m, e.to_string())
            }
        }
    }
}

/// Builder for [`FeasibilityService`].
#[derive(Default)]
pub struct FeasibilityServiceBuilder {
    entries: Vec<TechnologyEntry>,
    timeout: Option<Duration>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl FeasibilityServiceBuilder {
    /// Register a technology. A later entry for the same technology replaces
    /// the earlier one.
    #[must_use]
    pub fn technology(mut self, entry: TechnologyEntry) -> Self {
        self.entries.retain(|e| e.technology != entry.technology);
        self.entries.push(entry);
        self
    }

    /// Bound on one technology's resolution
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Metrics registry to record into
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Finish, ordering technologies for reports.
    pub fn build(mut self) -> FeasibilityService {
        self.entries.sort_by_key(|e| e.technology);
        FeasibilityService {
            entries: self.entries.into(),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            metrics: self.metrics.unwrap_or_default(),
        }
    }
}

fn routing_client(config: &Config) -> Result<Option<RoutingClient>> {
    if !config.uses_road_metric() {
        return Ok(None);
    }
    let Some(routing) = RoutingConfig::from_config(config) else {
        return Ok(None);
    };
    RoutingClient::with_config(routing)
        .map(Some)
        .map_err(|e| Error::config(format!("invalid routing settings: {e}")).with_source(e))
}
