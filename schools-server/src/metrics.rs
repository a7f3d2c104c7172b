//! Request metrics in Prometheus text format
//!
//! One counter family, `http_requests_total{method, route, status}`, plus the
//! process collector (memory, CPU, fds, start time) on Linux. The route label
//! comes from the closed [`Route`] enum so label cardinality stays bounded.
//!
//! Handlers talk to a [`RequestRecorder`] trait object; [`NoopRecorder`]
//! stands in when metrics are disabled.

use std::collections::BTreeMap;

use axum::http::{Method, StatusCode};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

const REQUESTS_TOTAL: &str = "http_requests_total";

/// Route templates used as metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Schools,
    SchoolById,
    Setup,
}

impl Route {
    pub fn template(self) -> &'static str {
        match self {
            Self::Schools => "/schools",
            Self::SchoolById => "/schools/:id",
            Self::Setup => "/setup",
        }
    }
}

/// Sink for one sample per finished request.
///
/// Implementations must not panic or block; a failed recording is the
/// recorder's problem, never the request's.
pub trait RequestRecorder: Send + Sync {
    fn record(&self, method: &Method, route: Route, status: StatusCode);
}

/// Recorder used when metrics are turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl RequestRecorder for NoopRecorder {
    fn record(&self, _method: &Method, _route: Route, _status: StatusCode) {}
}

/// Label triple as stored in the registry
pub type SampleKey = (String, String, String);

/// Prometheus registry holding the request counter
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    requests: IntCounterVec,
}

impl HttpMetrics {
    /// Build a fresh registry with the request counter and default
    /// process metrics registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new(REQUESTS_TOTAL, "Total number of HTTP requests"),
            &["method", "route", "status"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self { registry, requests })
    }

    /// Add one to the counter for this label triple, creating it if absent.
    pub fn increment(&self, method: &str, route: &str, status: u16) {
        let status = status.to_string();
        match self
            .requests
            .get_metric_with_label_values(&[method, route, &status])
        {
            Ok(counter) => counter.inc(),
            Err(e) => tracing::warn!(error = %e, method, route, "dropping request sample"),
        }
    }

    /// Render every registered metric in the text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Content type matching [`HttpMetrics::render`].
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    /// Current value of every request counter, keyed by (method, route, status).
    pub fn snapshot(&self) -> BTreeMap<SampleKey, u64> {
        let mut samples = BTreeMap::new();
        for family in self.registry.gather() {
            if family.get_name() != REQUESTS_TOTAL {
                continue;
            }
            for metric in family.get_metric() {
                let label = |name: &str| {
                    metric
                        .get_label()
                        .iter()
                        .find(|pair| pair.get_name() == name)
                        .map(|pair| pair.get_value().to_owned())
                        .unwrap_or_default()
                };
                samples.insert(
                    (label("method"), label("route"), label("status")),
                    metric.get_counter().get_value() as u64,
                );
            }
        }
        samples
    }

    /// Value of a single counter; zero if it was never observed.
    pub fn count(&self, method: &str, route: Route, status: u16) -> u64 {
        let key = (
            method.to_owned(),
            route.template().to_owned(),
            status.to_string(),
        );
        self.snapshot().get(&key).copied().unwrap_or(0)
    }
}

impl RequestRecorder for HttpMetrics {
    fn record(&self, method: &Method, route: Route, status: StatusCode) {
        self.increment(method.as_str(), route.template(), status.as_u16());
    }
}
