pub mod cache;
pub mod error;
pub mod geocode;
pub mod provider;
pub mod route;
pub mod service;

pub use cache::{Coord, GeoCache};
pub use error::{GeocodeError, RoutingError};
pub use geocode::{Geocoder, GeocodingResult, NominatimGeocoder};
pub use provider::{CustomPathProvider, OsrmProvider};
pub use route::{ResolvedRoute, RouteResolver, RouteSummary};
pub use service::RoutingProvider;
