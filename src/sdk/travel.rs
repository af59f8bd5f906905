use crate::sdk::config::RoutingMode;
use crate::sdk::layers::RouteLayers;
use crate::sdk::routing::{Coord, RouteResolver};
use crate::sdk::selection::PointSelection;
use crate::sdk::trip::TripSimulation;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TravelError {
    #[error("Select at least one point before generating a route")]
    NoPointsSelected,

    #[error("No route could be found through the selected points")]
    NoRouteFound,

    #[error("A route is already being shown; go back to selection first")]
    NotInSelection,
}

/// What the travel page is showing.
#[derive(Debug)]
pub enum TravelMode {
    Selection,
    Route {
        waypoints: Vec<Coord>,
        trip: TripSimulation,
    },
}

/// Switches between picking points and following a resolved route.
#[derive(Debug)]
pub struct TravelFlow {
    selection: PointSelection,
    destination: Option<Coord>,
    mode: TravelMode,
}

impl TravelFlow {
    /// `destination`, when set, is appended as the final waypoint of every route.
    pub fn new(selection: PointSelection, destination: Option<Coord>) -> Self {
        Self {
            selection,
            destination,
            mode: TravelMode::Selection,
        }
    }

    pub fn selection(&self) -> &PointSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut PointSelection {
        &mut self.selection
    }

    pub fn mode(&self) -> &TravelMode {
        &self.mode
    }

    pub fn trip(&self) -> Option<&TripSimulation> {
        match &self.mode {
            TravelMode::Route { trip, .. } => Some(trip),
            TravelMode::Selection => None,
        }
    }

    /// Waypoints sent to the router: the selection plus the fixed destination.
    pub fn planned_waypoints(&self) -> Vec<Coord> {
        let mut waypoints = self.selection.points().to_vec();
        waypoints.extend(self.destination);
        waypoints
    }

    /// Resolves the selected points and switches to route mode on success.
    /// An empty route keeps the flow in selection mode.
    pub async fn generate_route(
        &mut self,
        resolver: &RouteResolver,
        routing: RoutingMode,
    ) -> Result<&TripSimulation, TravelError> {
        if !matches!(self.mode, TravelMode::Selection) {
            return Err(TravelError::NotInSelection);
        }
        if !self.selection.can_generate_route() {
            return Err(TravelError::NoPointsSelected);
        }

        let waypoints = self.planned_waypoints();
        let route = resolver.define_route(&waypoints, routing).await;
        let trip = TripSimulation::new(route).map_err(|_| TravelError::NoRouteFound)?;
        log::info!(
            "Route ready: {} waypoints, {} route points",
            waypoints.len(),
            trip.route().len()
        );

        self.mode = TravelMode::Route { waypoints, trip };
        self.trip().ok_or(TravelError::NoRouteFound)
    }

    /// Drops the route, its waypoints and the trip, and starts a fresh selection.
    pub fn back_to_selection(&mut self) {
        self.mode = TravelMode::Selection;
        self.selection.clear_points();
    }

    /// Map layers for the current mode.
    pub fn layers(&self) -> serde_json::Value {
        match &self.mode {
            TravelMode::Route { waypoints, trip } => {
                RouteLayers::new(trip.route(), waypoints, trip.state().current_index)
                    .to_feature_collection()
            }
            TravelMode::Selection => {
                RouteLayers::new(&[], self.selection.points(), 0).to_feature_collection()
            }
        }
    }
}
