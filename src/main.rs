use anyhow::{bail, Context, Result};
use campus_transport::{
    sdk::config::parse_coord,
    sdk::util::{http::build_client, log::init_logging, rate_limit::requests_per_second},
    AuthClient, Coord, GeoCache, Geocoder, NewUser, NominatimGeocoder, PointSelection,
    RouteLayers, RouteResolver, RoutingMode, SessionStore, TransportConfig, TravelFlow,
    TravelMode, TripRunner, UserRole,
};
use clap::{Args, Parser, Subcommand};
use std::{fs, path::PathBuf, time::Duration};

/// Plan a campus trip, resolve its route and simulate the ride.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Waypoints {
    /// A waypoint as "lon,lat" (repeatable, in order)
    #[arg(short, long = "point", value_parser = parse_coord, allow_hyphen_values = true)]
    points: Vec<Coord>,

    /// A free-text address to geocode and add after the --point values (repeatable)
    #[arg(short, long = "address")]
    addresses: Vec<String>,

    /// Routing backend; defaults to CT_ROUTING_MODE
    #[arg(long, value_enum)]
    mode: Option<RoutingMode>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a route through the given waypoints and print it as JSON
    Route {
        #[command(flatten)]
        waypoints: Waypoints,
    },
    /// Resolve a route and simulate driving along it
    Trip {
        #[command(flatten)]
        waypoints: Waypoints,

        /// Milliseconds between vehicle steps; defaults to CT_TRIP_INTERVAL_MS
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Write the final map layers as GeoJSON to this file
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Look up the coordinate of an address
    Geocode { address: String },
    /// Look up the address of a coordinate
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account, then log in with it
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        dni: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value_t = UserRole::Passenger)]
        role: UserRole,
    },
    /// End the stored session
    Logout,
    /// Show who the stored session belongs to
    Whoami,
}

struct App {
    config: TransportConfig,
    resolver: RouteResolver,
    geocoder: NominatimGeocoder,
    auth: AuthClient,
    sessions: SessionStore,
}

impl App {
    fn new(config: TransportConfig) -> Result<Self> {
        let client = build_client(&config.user_agent, config.http_timeout)
            .context("Failed to build HTTP client")?;
        let limiter = requests_per_second(config.requests_per_second);
        let cache = GeoCache::load_from_file(&config.geo_cache_file).with_context(|| {
            format!("Failed to read geo cache {}", config.geo_cache_file.display())
        })?;

        Ok(Self {
            resolver: RouteResolver::from_config(&config, client.clone(), limiter.clone()),
            geocoder: NominatimGeocoder::with_cache(
                client.clone(),
                &config.nominatim_url,
                limiter,
                cache,
            ),
            auth: AuthClient::new(client, &config.backend_url),
            sessions: SessionStore::new(&config.session_file),
            config,
        })
    }

    async fn select(&self, waypoints: &Waypoints) -> Result<TravelFlow> {
        let mut flow = TravelFlow::new(
            PointSelection::new(self.config.max_points),
            self.config.campus_destination,
        );
        for point in &waypoints.points {
            flow.selection_mut().add_point(*point);
        }
        for address in &waypoints.addresses {
            let result = flow
                .selection_mut()
                .add_point_from_address(&self.geocoder, address)
                .await
                .with_context(|| format!("Could not add \"{}\"", address))?;
            log::info!("{} -> {:?}", result.formatted_address, result.coordinates);
        }
        if flow.selection().len() < waypoints.points.len() + waypoints.addresses.len() {
            log::warn!(
                "More than {} points given; extra points replaced the last one",
                flow.selection().max_points()
            );
        }
        Ok(flow)
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Route { waypoints } => {
                let mode = waypoints.mode.unwrap_or(self.config.routing_mode);
                let flow = self.select(&waypoints).await?;
                let route = self
                    .resolver
                    .resolve(&flow.planned_waypoints(), mode)
                    .await
                    .context("Route resolution failed")?;
                println!("{}", serde_json::to_string_pretty(&route)?);
            }
            Command::Trip {
                waypoints,
                interval_ms,
                geojson,
            } => {
                let mode = waypoints.mode.unwrap_or(self.config.routing_mode);
                let interval = interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(self.config.trip_interval);
                let mut flow = self.select(&waypoints).await?;
                flow.generate_route(&self.resolver, mode).await?;
                let TravelMode::Route { waypoints, trip } = flow.mode() else {
                    bail!("No route to follow");
                };

                let runner = TripRunner::spawn(trip.clone(), interval)?;
                runner.start();
                let mut updates = runner.subscribe();
                let mut last = runner.snapshot();
                while !last.state.completed && updates.changed().await.is_ok() {
                    last = *updates.borrow_and_update();
                    log::info!(
                        "Progress {}/{} ({:.0}%) at {:?}",
                        last.state.current_index + 1,
                        last.total_points,
                        last.progress_percent,
                        last.position
                    );
                }
                runner.cancel();
                println!("{}", serde_json::to_string_pretty(&last)?);

                if let Some(path) = geojson {
                    let layers =
                        RouteLayers::new(trip.route(), waypoints, last.state.current_index);
                    fs::write(
                        &path,
                        serde_json::to_string_pretty(&layers.to_feature_collection())?,
                    )
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                    log::info!("Map layers written to {}", path.display());
                }
            }
            Command::Geocode { address } => {
                let result = self.geocoder.geocode(&address).await?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Command::Reverse { lon, lat } => {
                println!("{}", self.geocoder.reverse_geocode((lon, lat)).await?);
            }
            Command::Login { email, password } => {
                let mut session = self.sessions.load()?;
                self.auth.login(&mut session, &email, &password).await?;
                self.sessions.save(&session)?;
            }
            Command::Register {
                first_name,
                last_name,
                dni,
                email,
                password,
                role,
            } => {
                let mut session = self.sessions.load()?;
                let user = NewUser {
                    first_name,
                    last_name,
                    dni,
                    email,
                    password,
                    role,
                };
                let created = self.auth.register(&mut session, &user).await?;
                self.sessions.save(&session)?;
                log::info!("Registered user #{} ({})", created.id, created.email);
            }
            Command::Logout => {
                let mut session = self.sessions.load()?;
                let result = self.auth.logout(&mut session).await;
                self.sessions.save(&session)?;
                result?;
            }
            Command::Whoami => {
                let session = self.sessions.load()?;
                match (session.email(), session.logged_in_at()) {
                    (Some(email), Some(at)) => println!("{} (since {})", email, at),
                    _ => println!("Not logged in"),
                }
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging("info");

    let cli = Cli::parse();
    let config = TransportConfig::from_env()?;
    log::debug!("Loaded configuration: {:?}", config);

    let app = App::new(config)?;
    let outcome = app.run(cli.command).await;

    app.geocoder
        .save_cache(&app.config.geo_cache_file)
        .await
        .with_context(|| format!("Failed to save {}", app.config.geo_cache_file.display()))?;
    outcome
}
