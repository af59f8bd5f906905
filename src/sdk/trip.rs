//! Simulated traversal of a resolved route.
//!
//! [`TripSimulation`] is the plain state machine. [`TripRunner`] drives one on a
//! fixed period from a tokio task that owns it; the task is aborted when the
//! runner is cancelled or dropped, so no tick lands after disposal.

use crate::sdk::routing::Coord;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TripError {
    #[error("A trip needs a route with at least one point")]
    EmptyRoute,

    #[error("The trip period must be greater than zero")]
    ZeroPeriod,
}

/// Invariant: `current_index < route.len()` and
/// `completed == (started && current_index == route.len() - 1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TripState {
    pub current_index: usize,
    pub started: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripUpdate {
    pub position: Coord,
    pub index: usize,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct TripSimulation {
    route: Vec<Coord>,
    state: TripState,
}

impl TripSimulation {
    pub fn new(route: Vec<Coord>) -> Result<Self, TripError> {
        if route.is_empty() {
            return Err(TripError::EmptyRoute);
        }
        Ok(Self {
            route,
            state: TripState::default(),
        })
    }

    fn last_index(&self) -> usize {
        self.route.len() - 1
    }

    pub fn start(&mut self) {
        self.state = TripState {
            current_index: 0,
            started: true,
            // a one-point route is already at its destination
            completed: self.last_index() == 0,
        };
    }

    pub fn reset(&mut self) {
        self.state = TripState::default();
    }

    /// Advances one point. Returns `None` when not started or already at the end.
    pub fn tick(&mut self) -> Option<TripUpdate> {
        if !self.state.started || self.state.current_index >= self.last_index() {
            return None;
        }
        self.state.current_index += 1;
        self.state.completed = self.state.current_index == self.last_index();
        Some(TripUpdate {
            position: self.car_position(),
            index: self.state.current_index,
            completed: self.state.completed,
        })
    }

    pub fn state(&self) -> TripState {
        self.state
    }

    pub fn route(&self) -> &[Coord] {
        &self.route
    }

    pub fn car_position(&self) -> Coord {
        self.route[self.state.current_index]
    }

    /// Route prefix already covered, including the current point.
    pub fn traveled(&self) -> &[Coord] {
        &self.route[..=self.state.current_index]
    }

    pub fn progress_percent(&self) -> f64 {
        let percent = (self.state.current_index + 1) as f64 / self.route.len() as f64 * 100.0;
        percent.clamp(0.0, 100.0)
    }

    pub fn snapshot(&self) -> TripSnapshot {
        TripSnapshot {
            state: self.state,
            position: self.car_position(),
            progress_percent: self.progress_percent(),
            total_points: self.route.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripSnapshot {
    pub state: TripState,
    pub position: Coord,
    pub progress_percent: f64,
    pub total_points: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TripCommand {
    Start,
    Reset,
}

/// Handle to the scheduled task advancing a [`TripSimulation`].
pub struct TripRunner {
    commands: mpsc::UnboundedSender<TripCommand>,
    snapshots: watch::Receiver<TripSnapshot>,
    task: JoinHandle<()>,
}

impl TripRunner {
    /// Spawns the tick task on the current tokio runtime.
    /// The trip stays idle until [`start`](Self::start).
    pub fn spawn(simulation: TripSimulation, period: Duration) -> Result<Self, TripError> {
        if period.is_zero() {
            return Err(TripError::ZeroPeriod);
        }
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(simulation.snapshot());
        let task = tokio::spawn(run_trip(simulation, period, command_rx, snapshot_tx));
        Ok(Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        })
    }

    pub fn start(&self) {
        self.send(TripCommand::Start);
    }

    pub fn reset(&self) {
        self.send(TripCommand::Reset);
    }

    fn send(&self, command: TripCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("Trip task already stopped, dropping {:?}", command);
        }
    }

    pub fn snapshot(&self) -> TripSnapshot {
        *self.snapshots.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TripSnapshot> {
        self.snapshots.clone()
    }

    /// Resolves once the trip reaches its destination, or returns the last
    /// snapshot if the task goes away first.
    pub async fn wait_until_completed(&self) -> TripSnapshot {
        let mut snapshots = self.snapshots.clone();
        if let Ok(snapshot) = snapshots.wait_for(|s| s.state.completed).await {
            return *snapshot;
        }
        let last = *snapshots.borrow();
        last
    }

    /// Stops the timer. Equivalent to dropping the runner.
    pub fn cancel(self) {}
}

impl Drop for TripRunner {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_trip(
    mut simulation: TripSimulation,
    period: Duration,
    mut commands: mpsc::UnboundedReceiver<TripCommand>,
    snapshots: watch::Sender<TripSnapshot>,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick of a tokio interval fires immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(TripCommand::Start) => {
                        simulation.start();
                        ticker.reset();
                        log::info!("Trip started over {} points", simulation.route().len());
                    }
                    Some(TripCommand::Reset) => {
                        simulation.reset();
                        log::info!("Trip reset");
                    }
                    None => break,
                }
                snapshots.send_replace(simulation.snapshot());
            }
            _ = ticker.tick() => {
                if let Some(update) = simulation.tick() {
                    log::debug!(
                        "Vehicle at {:?} ({}/{})",
                        update.position,
                        update.index + 1,
                        simulation.route().len()
                    );
                    if update.completed {
                        log::info!("Destination reached");
                    }
                    snapshots.send_replace(simulation.snapshot());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(n: usize) -> Vec<Coord> {
        (0..n).map(|i| (-64.349 - i as f64 * 0.001, -33.123)).collect()
    }

    #[test]
    fn empty_route_is_rejected() {
        assert_eq!(TripSimulation::new(Vec::new()).unwrap_err(), TripError::EmptyRoute);
    }

    #[test]
    fn does_not_move_before_start() {
        let mut sim = TripSimulation::new(route(3)).unwrap();
        assert!(sim.tick().is_none());
        assert_eq!(sim.state(), TripState::default());
    }

    #[test]
    fn completes_after_len_minus_one_ticks() {
        let n = 5;
        let mut sim = TripSimulation::new(route(n)).unwrap();
        sim.start();
        for _ in 0..n - 2 {
            let update = sim.tick().unwrap();
            assert!(!update.completed);
        }
        let last = sim.tick().unwrap();
        assert!(last.completed);
        assert_eq!(sim.state().current_index, n - 1);
        assert!(sim.state().completed);
        assert_eq!(sim.car_position(), route(n)[n - 1]);

        // stays parked at the destination
        assert!(sim.tick().is_none());
        assert_eq!(sim.state().current_index, n - 1);
        assert_eq!(sim.progress_percent(), 100.0);
    }

    #[test]
    fn reset_always_returns_to_idle() {
        let mut sim = TripSimulation::new(route(4)).unwrap();
        sim.start();
        sim.tick();
        sim.reset();
        assert_eq!(sim.state(), TripState::default());
        assert_eq!(sim.traveled(), &route(4)[..1]);

        sim.start();
        for _ in 0..3 {
            sim.tick();
        }
        sim.reset();
        assert_eq!(sim.state().current_index, 0);
        assert!(!sim.state().started);
        assert!(!sim.state().completed);
    }

    #[test]
    fn single_point_route_completes_on_start() {
        let mut sim = TripSimulation::new(route(1)).unwrap();
        sim.start();
        assert!(sim.state().completed);
        assert!(sim.tick().is_none());
    }

    #[test]
    fn progress_counts_the_current_point() {
        let mut sim = TripSimulation::new(route(4)).unwrap();
        assert_eq!(sim.progress_percent(), 25.0);
        sim.start();
        sim.tick();
        assert_eq!(sim.progress_percent(), 50.0);
        assert_eq!(sim.traveled().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn runner_advances_once_per_period() {
        let period = Duration::from_millis(3000);
        let runner = TripRunner::spawn(TripSimulation::new(route(4)).unwrap(), period).unwrap();
        runner.start();

        let mut snapshots = runner.subscribe();
        snapshots.wait_for(|s| s.state.started).await.unwrap();
        assert_eq!(runner.snapshot().state.current_index, 0);

        time::sleep(period + Duration::from_millis(10)).await;
        assert_eq!(runner.snapshot().state.current_index, 1);

        let done = runner.wait_until_completed().await;
        assert_eq!(done.state.current_index, 3);
        assert!(done.state.completed);
    }

    #[tokio::test(start_paused = true)]
    async fn runner_idles_until_started() {
        let sim = TripSimulation::new(route(3)).unwrap();
        let runner = TripRunner::spawn(sim, Duration::from_millis(300)).unwrap();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runner.snapshot().state, TripState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn runner_reset_stops_the_vehicle() {
        let period = Duration::from_millis(300);
        let runner = TripRunner::spawn(TripSimulation::new(route(10)).unwrap(), period).unwrap();
        runner.start();
        time::sleep(period * 2 + Duration::from_millis(10)).await;
        runner.reset();

        let mut snapshots = runner.subscribe();
        let idle = *snapshots.wait_for(|s| !s.state.started).await.unwrap();
        assert_eq!(idle.state.current_index, 0);

        time::sleep(period * 3).await;
        assert_eq!(runner.snapshot().state, TripState::default());
    }

    #[tokio::test]
    async fn dropping_the_runner_closes_the_channel() {
        let sim = TripSimulation::new(route(3)).unwrap();
        let runner = TripRunner::spawn(sim, Duration::from_millis(300)).unwrap();
        let mut snapshots = runner.subscribe();
        drop(runner);
        assert!(snapshots.changed().await.is_err());
    }

    #[tokio::test]
    async fn zero_period_is_rejected_up_front() {
        let sim = TripSimulation::new(route(3)).unwrap();
        assert!(matches!(
            TripRunner::spawn(sim, Duration::ZERO),
            Err(TripError::ZeroPeriod)
        ));
    }
}
