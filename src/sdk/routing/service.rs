use super::error::RoutingError;
use super::route::ResolvedRoute;
use super::cache::Coord;
use async_trait::async_trait;

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Resolves a polyline passing through `waypoints` in order.
    async fn get_route(&self, waypoints: &[Coord]) -> Result<ResolvedRoute, RoutingError>;
}
