use crate::sdk::routing::Coord;
use serde_json::{json, Value};

/// GeoJSON for the travel map: waypoints, full route, covered route and the vehicle.
#[derive(Debug, Clone, Copy)]
pub struct RouteLayers<'a> {
    route: &'a [Coord],
    waypoints: &'a [Coord],
    current_index: usize,
}

impl<'a> RouteLayers<'a> {
    pub fn new(route: &'a [Coord], waypoints: &'a [Coord], current_index: usize) -> Self {
        Self {
            route,
            waypoints,
            current_index: current_index.min(route.len().saturating_sub(1)),
        }
    }

    pub fn waypoint_features(&self) -> Vec<Value> {
        let last = self.waypoints.len().saturating_sub(1);
        self.waypoints
            .iter()
            .enumerate()
            .map(|(i, point)| {
                feature(
                    "waypoints",
                    json!({ "type": "Point", "coordinates": point }),
                    json!({
                        "index": i + 1,
                        "is_start": i == 0,
                        "is_end": i == last,
                    }),
                )
            })
            .collect()
    }

    pub fn full_route(&self) -> Option<Value> {
        (!self.route.is_empty()).then(|| line("full-route", self.route))
    }

    pub fn completed_route(&self) -> Option<Value> {
        (!self.route.is_empty())
            .then(|| line("completed-route", &self.route[..=self.current_index]))
    }

    pub fn vehicle(&self) -> Option<Value> {
        self.route.get(self.current_index).map(|position| {
            feature(
                "vehicle",
                json!({ "type": "Point", "coordinates": position }),
                json!({ "index": self.current_index }),
            )
        })
    }

    pub fn to_feature_collection(&self) -> Value {
        let mut features = self.waypoint_features();
        features.extend(self.full_route());
        features.extend(self.completed_route());
        features.extend(self.vehicle());
        json!({ "type": "FeatureCollection", "features": features })
    }
}

fn line(layer: &str, coordinates: &[Coord]) -> Value {
    feature(
        layer,
        json!({ "type": "LineString", "coordinates": coordinates }),
        json!({}),
    )
}

fn feature(layer: &str, geometry: Value, mut properties: Value) -> Value {
    if let Some(props) = properties.as_object_mut() {
        props.insert("layer".to_string(), Value::from(layer));
    }
    json!({ "type": "Feature", "geometry": geometry, "properties": properties })
}
