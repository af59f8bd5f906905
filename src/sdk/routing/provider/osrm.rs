use super::types::OsrmResponse;
use crate::sdk::routing::cache::Coord;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::route::{ResolvedRoute, RouteSummary};
use crate::sdk::routing::service::RoutingProvider;
use crate::sdk::util::rate_limit::Limiter;
use async_trait::async_trait;
use reqwest::Client;

/// Public OSRM-compatible directions service (`route/v1`).
pub struct OsrmProvider {
    client: Client,
    base_url: String,
    profile: String,
    limiter: Limiter,
}

impl OsrmProvider {
    pub fn new(client: Client, base_url: &str, limiter: Limiter) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile: "driving".to_string(),
            limiter,
        }
    }

    /// The coordinate list is part of the path: `{lon},{lat};{lon},{lat}...`.
    pub fn route_url(&self, waypoints: &[Coord]) -> String {
        let coords = waypoints
            .iter()
            .map(|(lon, lat)| format!("{},{}", lon, lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.base_url, self.profile, coords
        )
    }
}

#[async_trait]
impl RoutingProvider for OsrmProvider {
    fn name(&self) -> &'static str {
        "osrm"
    }

    async fn get_route(&self, waypoints: &[Coord]) -> Result<ResolvedRoute, RoutingError> {
        let url = self.route_url(waypoints);
        self.limiter.until_ready().await;
        log::debug!("[PROVIDER] Calling OSRM route: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::error!(
                "OSRM returned non-success status: {}. Body: {}",
                status,
                text
            );
            return Err(RoutingError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: OsrmResponse = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "Failed to parse OsrmResponse. URL: {}\nError: {}. Body: {}",
                url,
                e,
                text
            );
            e
        })?;

        if let Some(code) = parsed.code.as_deref().filter(|code| *code != "Ok") {
            log::warn!("OSRM answered with code {}", code);
        }

        let route = parsed
            .routes
            .into_iter()
            .next()
            .ok_or(RoutingError::MissingRoute)?;

        Ok(ResolvedRoute {
            summary: RouteSummary::from_metres_seconds(route.distance, route.duration),
            coordinates: route.geometry.coordinates,
        })
    }
}
