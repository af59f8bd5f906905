use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("At least one waypoint is required")]
    NoWaypoints,

    #[error("Routing service returned {status}: {body}")]
    Status { status: u16, body: String },

    // 200 response whose body has no usable route
    #[error("Route response is missing coordinates")]
    MissingRoute,

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("The address cannot be empty")]
    EmptyAddress,

    #[error("No results found for \"{0}\"")]
    NotFound(String),

    #[error("Geocoding service returned {0}")]
    Status(u16),

    #[error("Geocoder returned an unparseable coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}
