use super::cache::Coord;
use super::error::RoutingError;
use super::provider::{CustomPathProvider, OsrmProvider};
use super::service::RoutingProvider;
use crate::sdk::config::{RoutingMode, TransportConfig};
use crate::sdk::util::rate_limit::Limiter;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_hours: f64,
}

impl RouteSummary {
    /// Builds a summary from the metres/seconds pair routing services report.
    pub fn from_metres_seconds(distance: Option<f64>, duration: Option<f64>) -> Option<Self> {
        match (distance, duration) {
            (Some(distance), Some(duration)) => Some(Self {
                distance_km: distance / 1000.0,
                duration_hours: duration / 3600.0,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRoute {
    pub coordinates: Vec<Coord>,
    pub summary: Option<RouteSummary>,
}

/// Picks the provider for a routing mode and normalizes every failure to an empty route.
pub struct RouteResolver {
    osrm: Arc<dyn RoutingProvider>,
    custom: Arc<dyn RoutingProvider>,
}

impl RouteResolver {
    pub fn new(osrm: Arc<dyn RoutingProvider>, custom: Arc<dyn RoutingProvider>) -> Self {
        Self { osrm, custom }
    }

    pub fn from_config(config: &TransportConfig, client: Client, limiter: Limiter) -> Self {
        Self::new(
            Arc::new(OsrmProvider::new(client.clone(), &config.osrm_url, limiter)),
            Arc::new(CustomPathProvider::new(client, &config.backend_url)),
        )
    }

    fn provider(&self, mode: RoutingMode) -> &dyn RoutingProvider {
        match mode {
            RoutingMode::Osrm => self.osrm.as_ref(),
            RoutingMode::Custom => self.custom.as_ref(),
        }
    }

    /// Resolves a route, surfacing the reason on failure.
    pub async fn resolve(
        &self,
        points: &[Coord],
        mode: RoutingMode,
    ) -> Result<ResolvedRoute, RoutingError> {
        if points.is_empty() {
            return Err(RoutingError::NoWaypoints);
        }
        let provider = self.provider(mode);
        log::debug!(
            "[RESOLVER] Requesting route through {} waypoint(s) from {}",
            points.len(),
            provider.name()
        );
        let route = provider.get_route(points).await?;
        if let Some(summary) = route.summary {
            log::info!(
                "Route from {}: {} points, {:.2} km, {:.2} hrs",
                provider.name(),
                route.coordinates.len(),
                summary.distance_km,
                summary.duration_hours
            );
        }
        Ok(route)
    }

    /// Resolves a route, returning `[]` on any failure. Never errors.
    pub async fn define_route(&self, points: &[Coord], mode: RoutingMode) -> Vec<Coord> {
        match self.resolve(points, mode).await {
            Ok(route) => route.coordinates,
            Err(RoutingError::NoWaypoints) => {
                log::warn!("define_route called without waypoints");
                Vec::new()
            }
            Err(err) => {
                log::error!(
                    "Route resolution via {} failed: {}",
                    self.provider(mode).name(),
                    err
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the points it was asked for and replays a canned outcome.
    struct MockProvider {
        label: &'static str,
        outcome: fn() -> Result<ResolvedRoute, RoutingError>,
        calls: Mutex<Vec<Vec<Coord>>>,
    }

    impl MockProvider {
        fn new(
            label: &'static str,
            outcome: fn() -> Result<ResolvedRoute, RoutingError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                label,
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RoutingProvider for MockProvider {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn get_route(&self, waypoints: &[Coord]) -> Result<ResolvedRoute, RoutingError> {
            self.calls.lock().unwrap().push(waypoints.to_vec());
            (self.outcome)()
        }
    }

    fn three_points() -> Result<ResolvedRoute, RoutingError> {
        Ok(ResolvedRoute {
            coordinates: vec![(-64.349, -33.123), (-64.350, -33.124), (-64.351, -33.125)],
            summary: RouteSummary::from_metres_seconds(Some(1100.5), Some(130.0)),
        })
    }

    fn server_error() -> Result<ResolvedRoute, RoutingError> {
        Err(RoutingError::Status {
            status: 500,
            body: "Internal Server Error".to_string(),
        })
    }

    fn malformed() -> Result<ResolvedRoute, RoutingError> {
        Err(RoutingError::MissingRoute)
    }

    #[tokio::test]
    async fn dispatches_on_mode() {
        let osrm = MockProvider::new("osrm", three_points);
        let custom = MockProvider::new("custom", server_error);
        let resolver = RouteResolver::new(osrm.clone(), custom.clone());
        let points = [(-64.349, -33.123), (-64.351, -33.125)];

        assert_eq!(resolver.define_route(&points, RoutingMode::Osrm).await.len(), 3);
        assert!(resolver.define_route(&points, RoutingMode::Custom).await.is_empty());
        assert_eq!(osrm.calls.lock().unwrap().len(), 1);
        assert_eq!(custom.calls.lock().unwrap()[0], points.to_vec());
    }

    #[tokio::test]
    async fn failures_become_empty_routes() {
        let resolver = RouteResolver::new(
            MockProvider::new("osrm", malformed),
            MockProvider::new("custom", server_error),
        );
        let points = [(-64.349, -33.123), (-64.351, -33.125)];
        assert!(resolver.define_route(&points, RoutingMode::Osrm).await.is_empty());
        assert!(resolver.define_route(&points, RoutingMode::Custom).await.is_empty());
    }

    #[tokio::test]
    async fn empty_input_skips_the_provider() {
        let osrm = MockProvider::new("osrm", three_points);
        let resolver = RouteResolver::new(osrm.clone(), MockProvider::new("custom", three_points));
        assert!(resolver.define_route(&[], RoutingMode::Osrm).await.is_empty());
        assert!(matches!(
            resolver.resolve(&[], RoutingMode::Osrm).await,
            Err(RoutingError::NoWaypoints)
        ));
        assert!(osrm.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn summary_needs_both_figures() {
        let summary = RouteSummary::from_metres_seconds(Some(1100.5), Some(130.0)).unwrap();
        assert!((summary.distance_km - 1.1005).abs() < 1e-9);
        assert!(RouteSummary::from_metres_seconds(Some(1.0), None).is_none());
    }
}
