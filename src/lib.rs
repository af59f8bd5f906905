pub mod sdk;

pub use sdk::auth::{AuthClient, AuthError, NewUser, UserRole};
pub use sdk::config::{RoutingMode, TransportConfig};
pub use sdk::layers::RouteLayers;
pub use sdk::routing::{
    Coord, GeoCache, Geocoder, GeocodingResult, NominatimGeocoder, RouteResolver, RoutingError,
};
pub use sdk::selection::PointSelection;
pub use sdk::session::{Session, SessionStore};
pub use sdk::travel::{TravelFlow, TravelMode};
pub use sdk::trip::{TripRunner, TripSimulation, TripState};
