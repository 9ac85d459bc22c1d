//! Metrics infrastructure for MobSim.
//!
//! This crate describes every metric emitted by the scenario engines. It
//! re-exports the `metrics` crate and declares each metric as a structured
//! [`Metric`] constant so names are never spelled twice.
//!
//! # Example
//!
//! ```rust,ignore
//! use mobsim_metrics::{describe_metrics, metric_defs};
//!
//! // Initialize metrics descriptions at startup
//! describe_metrics();
//!
//! metrics::counter!(metric_defs::SCHEDULER_FIRED.name, "kind" => "stop_movement").increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// How a metric is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonic count of occurrences.
    Counter,
    /// Current level of something.
    Gauge,
    /// Distribution of observed values.
    Histogram,
}

/// A metric declaration: name, kind and the metadata handed to the recorder.
///
/// ```rust
/// use mobsim_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const QUERIES: Metric = Metric::counter("mobsim.coverage.queries")
///     .with_description("Coverage membership queries")
///     .with_unit(Unit::Count);
///
/// assert_eq!(QUERIES.name, "mobsim.coverage.queries");
/// assert_eq!(QUERIES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// Dotted metric name, always prefixed `mobsim.`.
    pub name: &'static str,
    /// Counter, gauge or histogram.
    pub kind: MetricKind,
    /// Text passed to the recorder's describe call.
    pub description: &'static str,
    /// Unit, if any.
    pub unit: Option<Unit>,
    /// Label keys attached at the emission sites.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Declares a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Declares a gauge.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Declares a histogram.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Attaches a description.
    pub const fn with_description(self, description: &'static str) -> Self {
        Self { description, ..self }
    }

    /// Attaches a unit.
    pub const fn with_unit(self, unit: Unit) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    /// Records the label keys used when emitting.
    pub const fn with_labels(self, labels: &'static [&'static str]) -> Self {
        Self { labels, ..self }
    }

    /// Hands the description (and unit) to the installed recorder.
    pub fn describe(&self) {
        let (name, text) = (self.name, self.description);
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(name, unit, text),
            (MetricKind::Counter, None) => describe_counter!(name, text),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(name, unit, text),
            (MetricKind::Gauge, None) => describe_gauge!(name, text),
            (MetricKind::Histogram, Some(unit)) => describe_histogram!(name, unit, text),
            (MetricKind::Histogram, None) => describe_histogram!(name, text),
        }
    }
}

/// All metric definitions for the scenario engines.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Event Scheduler
    // ========================================================================

    /// Delayed instructions accepted by the scheduler.
    ///
    /// Labels: kind (`stop_movement` | `change_equipment`)
    pub const SCHEDULER_SCHEDULED: Metric = Metric::counter("mobsim.scheduler.scheduled")
        .with_description("Delayed instructions added to the scheduler")
        .with_unit(Unit::Count)
        .with_labels(&["kind"]);

    /// Delayed instructions fired.
    ///
    /// Labels: kind
    pub const SCHEDULER_FIRED: Metric = Metric::counter("mobsim.scheduler.fired")
        .with_description("Delayed instructions applied to unit state")
        .with_unit(Unit::Count)
        .with_labels(&["kind"]);

    /// Delayed instructions cancelled before firing.
    pub const SCHEDULER_CANCELLED: Metric = Metric::counter("mobsim.scheduler.cancelled")
        .with_description("Delayed instructions discarded before firing")
        .with_unit(Unit::Count);

    /// Instructions still pending after the last advance.
    pub const SCHEDULER_PENDING: Metric = Metric::gauge("mobsim.scheduler.pending")
        .with_description("Delayed instructions waiting for their fire time")
        .with_unit(Unit::Count);

    // ========================================================================
    // Coverage
    // ========================================================================

    /// Coverage membership queries.
    pub const COVERAGE_QUERIES: Metric = Metric::counter("mobsim.coverage.queries")
        .with_description("Point-in-coverage queries answered")
        .with_unit(Unit::Count);

    /// Coverage queries whose point was inside at least one zone.
    pub const COVERAGE_HITS: Metric = Metric::counter("mobsim.coverage.hits")
        .with_description("Point-in-coverage queries that found a covering zone")
        .with_unit(Unit::Count);

    // ========================================================================
    // Radio Link
    // ========================================================================

    /// Link evaluations performed.
    ///
    /// Labels: medium (`standard_radio` | `cellular_radio` | `satellite_link` | `none`)
    pub const LINK_EVALUATIONS: Metric = Metric::counter("mobsim.link.evaluations")
        .with_description("Link quality evaluations")
        .with_unit(Unit::Count)
        .with_labels(&["medium"]);

    /// Shannon capacity of evaluated links.
    ///
    /// Labels: medium
    pub const LINK_CAPACITY: Metric = Metric::histogram("mobsim.link.capacity_bps")
        .with_description("Shannon capacity of evaluated links")
        .with_unit(Unit::BitsPerSecond)
        .with_labels(&["medium"]);

    /// Packet error probability of evaluated links.
    ///
    /// Labels: medium
    pub const LINK_ERROR_PROBABILITY: Metric =
        Metric::histogram("mobsim.link.error_probability")
            .with_description("Packet error probability of evaluated links")
            .with_labels(&["medium"]);

    /// Shadowing samples drawn from the scenario generator.
    pub const SHADOWING_DRAWS: Metric = Metric::counter("mobsim.link.shadowing_draws")
        .with_description("Log-normal shadowing samples drawn")
        .with_unit(Unit::Count);

    /// All metrics, for bulk description.
    pub const ALL: &[Metric] = &[
        SCHEDULER_SCHEDULED,
        SCHEDULER_FIRED,
        SCHEDULER_CANCELLED,
        SCHEDULER_PENDING,
        COVERAGE_QUERIES,
        COVERAGE_HITS,
        LINK_EVALUATIONS,
        LINK_CAPACITY,
        LINK_ERROR_PROBABILITY,
        SHADOWING_DRAWS,
    ];
}

/// Describes all metrics used by the scenario engines.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
