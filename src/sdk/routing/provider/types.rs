use crate::sdk::routing::cache::Coord;
use serde::{Deserialize, Serialize};

// --- OSRM `route/v1` response ---

#[derive(Deserialize, Debug)]
pub struct OsrmResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}
#[derive(Deserialize, Debug)]
pub struct OsrmRoute {
    pub geometry: LineGeometry,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}
#[derive(Deserialize, Debug)]
pub struct LineGeometry {
    pub coordinates: Vec<Coord>,
}

// --- Backend `/api/paths/calculate` ---

#[derive(Serialize, Debug, PartialEq)]
pub struct CalculatePathRequest {
    pub start_node: Coord,
    pub end_node: Coord,
    pub waypoints: Vec<Coord>,
}

impl CalculatePathRequest {
    /// First point is the start, last is the end, everything between is a via-point.
    pub fn from_points(points: &[Coord]) -> Option<Self> {
        let (&start_node, rest) = points.split_first()?;
        let (end_node, interior) = match rest.split_last() {
            Some((&end, interior)) => (end, interior.to_vec()),
            None => (start_node, Vec::new()),
        };
        Some(Self {
            start_node,
            end_node,
            waypoints: interior,
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct CalculatePathResponse {
    #[serde(default)]
    pub route: Vec<PathGeometry>,
}
#[derive(Deserialize, Debug)]
pub struct PathGeometry {
    pub coordinates: Vec<Coord>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_splits_start_end_and_interior() {
        let points = [(-64.349, -33.123), (-64.349, -33.123), (-64.351, -33.125)];
        let request = CalculatePathRequest::from_points(&points).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "start_node": [-64.349, -33.123],
                "end_node": [-64.351, -33.125],
                "waypoints": [[-64.349, -33.123]],
            })
        );
    }

    #[test]
    fn two_points_have_no_interior() {
        let points = [(-64.349, -33.123), (-64.351, -33.125)];
        let request = CalculatePathRequest::from_points(&points).unwrap();
        assert!(request.waypoints.is_empty());
        assert_eq!(request.end_node, (-64.351, -33.125));
    }

    #[test]
    fn single_point_is_both_ends() {
        let request = CalculatePathRequest::from_points(&[(1.0, 2.0)]).unwrap();
        assert_eq!(request.start_node, (1.0, 2.0));
        assert_eq!(request.end_node, (1.0, 2.0));
        assert!(request.waypoints.is_empty());
        assert!(CalculatePathRequest::from_points(&[]).is_none());
    }

    #[test]
    fn backend_response_ignores_extra_fields() {
        let body = r#"{"route":[{"coordinates":[[-64.349,-33.123],[-64.35,-33.124]],"duration":130.0,"distance":1100.5}],"waypoints":[-64.349]}"#;
        let parsed: CalculatePathResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.route[0].coordinates.len(), 2);
        assert_eq!(parsed.route[0].distance, Some(1100.5));
    }
}
