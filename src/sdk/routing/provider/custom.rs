use super::types::{CalculatePathRequest, CalculatePathResponse};
use crate::sdk::routing::cache::Coord;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::route::{ResolvedRoute, RouteSummary};
use crate::sdk::routing::service::RoutingProvider;
use async_trait::async_trait;
use reqwest::Client;

/// The project backend's placeholder path endpoint.
pub struct CustomPathProvider {
    client: Client,
    base_url: String,
}

impl CustomPathProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn calculate_url(&self) -> String {
        format!("{}/api/paths/calculate", self.base_url)
    }
}

#[async_trait]
impl RoutingProvider for CustomPathProvider {
    fn name(&self) -> &'static str {
        "custom"
    }

    async fn get_route(&self, waypoints: &[Coord]) -> Result<ResolvedRoute, RoutingError> {
        let body = CalculatePathRequest::from_points(waypoints).ok_or(RoutingError::NoWaypoints)?;
        let url = self.calculate_url();
        log::debug!(
            "[PROVIDER] Calling backend path calculation for {:?} -> {:?} via {} point(s)",
            body.start_node,
            body.end_node,
            body.waypoints.len()
        );

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                log::error!(
                    "Failed to send POST request. URL: {}\nBody: {}\nError: {}",
                    url,
                    serde_json::to_string(&body).unwrap_or_default(),
                    e
                );
                return Err(e.into());
            }
        };

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::error!(
                "Backend returned non-success status: {}. Body: {}",
                status,
                text
            );
            return Err(RoutingError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CalculatePathResponse = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "Failed to parse CalculatePathResponse. URL: {}\nError: {}. Body: {}",
                url,
                e,
                text
            );
            e
        })?;

        let path = parsed
            .route
            .into_iter()
            .next()
            .ok_or(RoutingError::MissingRoute)?;

        Ok(ResolvedRoute {
            summary: RouteSummary::from_metres_seconds(path.distance, path.duration),
            coordinates: path.coordinates,
        })
    }
}
