use crate::sdk::config::DEFAULT_MAX_POINTS;
use crate::sdk::routing::{Coord, GeocodeError, Geocoder, GeocodingResult};

/// Ordered waypoints picked by the user, capped at `max_points`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSelection {
    points: Vec<Coord>,
    max_points: usize,
}

impl Default for PointSelection {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

impl PointSelection {
    pub fn new(max_points: usize) -> Self {
        Self {
            points: Vec::new(),
            max_points: max_points.max(1),
        }
    }

    /// Appends a point; at capacity the last point is replaced instead.
    pub fn add_point(&mut self, coord: Coord) {
        if self.points.len() >= self.max_points {
            if let Some(last) = self.points.last_mut() {
                log::debug!("Selection full, replacing {:?} with {:?}", last, coord);
                *last = coord;
            }
        } else {
            self.points.push(coord);
        }
    }

    /// Removes the point at `index`, if there is one.
    pub fn remove_point(&mut self, index: usize) -> Option<Coord> {
        (index < self.points.len()).then(|| self.points.remove(index))
    }

    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    /// Geocodes `address` and adds the result like a clicked point.
    /// On failure the selection is left untouched.
    pub async fn add_point_from_address(
        &mut self,
        geocoder: &dyn Geocoder,
        address: &str,
    ) -> Result<GeocodingResult, GeocodeError> {
        let result = geocoder.geocode(address).await.map_err(|e| {
            log::warn!("Could not geocode \"{}\": {}", address, e);
            e
        })?;
        self.add_point(result.coordinates);
        Ok(result)
    }

    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    pub fn can_generate_route(&self) -> bool {
        !self.points.is_empty()
    }

    pub fn can_add_more_points(&self) -> bool {
        self.points.len() < self.max_points
    }
}
