use super::cache::{CachedPlace, Coord, GeoCache};
use super::error::GeocodeError;
use crate::sdk::util::rate_limit::Limiter;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::Result as IoResult;
use std::path::Path;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodingResult {
    pub address: String,
    pub coordinates: Coord,
    pub formatted_address: String,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward geocoding: free-text address to the best matching coordinate.
    async fn geocode(&self, address: &str) -> Result<GeocodingResult, GeocodeError>;

    /// Reverse geocoding: coordinate to a human-readable address.
    async fn reverse_geocode(&self, coord: Coord) -> Result<String, GeocodeError>;
}

// Nominatim returns coordinates as strings.
#[derive(Deserialize, Debug)]
struct SearchPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Deserialize, Debug)]
struct ReversePlace {
    #[serde(default)]
    display_name: Option<String>,
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    limiter: Limiter,
    cache: Mutex<GeoCache>,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: &str, limiter: Limiter) -> Self {
        Self::with_cache(client, base_url, limiter, GeoCache::default())
    }

    pub fn with_cache(client: Client, base_url: &str, limiter: Limiter, cache: GeoCache) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter,
            cache: Mutex::new(cache),
        }
    }

    pub async fn save_cache<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        self.cache.lock().await.save_to_file(path)
    }

    async fn fetch_text(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, GeocodeError> {
        self.limiter.until_ready().await;
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            log::error!("Nominatim returned non-success status: {} for {}", status, url);
            return Err(GeocodeError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

fn parse_degrees(raw: &str) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse()
        .map_err(|_| GeocodeError::InvalidCoordinate(raw.to_string()))
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodingResult, GeocodeError> {
        if address.trim().is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }

        if let Some(place) = self.cache.lock().await.get_place(address) {
            log::debug!("[CACHE HIT] geocode \"{}\"", address);
            return Ok(GeocodingResult {
                address: address.to_string(),
                coordinates: place.coord,
                formatted_address: place.display_name.clone(),
            });
        }

        log::debug!("[PROVIDER] Calling Nominatim search for \"{}\"", address);
        let url = format!("{}/search", self.base_url);
        let text = self
            .fetch_text(
                &url,
                &[
                    ("format", "json".to_string()),
                    ("q", address.to_string()),
                    ("limit", "1".to_string()),
                    ("addressdetails", "1".to_string()),
                ],
            )
            .await?;

        let places: Vec<SearchPlace> = serde_json::from_str(&text).map_err(|e| {
            log::error!("Failed to parse search response. Error: {}. Body: {}", e, text);
            e
        })?;
        let first = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;

        let coordinates = (parse_degrees(&first.lon)?, parse_degrees(&first.lat)?);
        self.cache.lock().await.insert_place(
            address,
            CachedPlace {
                coord: coordinates,
                display_name: first.display_name.clone(),
            },
        );

        Ok(GeocodingResult {
            address: address.to_string(),
            coordinates,
            formatted_address: first.display_name,
        })
    }

    async fn reverse_geocode(&self, coord: Coord) -> Result<String, GeocodeError> {
        if let Some(name) = self.cache.lock().await.get_address(coord) {
            log::debug!("[CACHE HIT] reverse {:?}", coord);
            return Ok(name.to_string());
        }

        let (lon, lat) = coord;
        log::debug!("[PROVIDER] Calling Nominatim reverse for {:?}", coord);
        let url = format!("{}/reverse", self.base_url);
        let text = self
            .fetch_text(
                &url,
                &[
                    ("format", "json".to_string()),
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("addressdetails", "1".to_string()),
                ],
            )
            .await?;

        let place: ReversePlace = serde_json::from_str(&text)?;
        let name = place
            .display_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| GeocodeError::NotFound(format!("{},{}", lon, lat)))?;

        self.cache.lock().await.insert_address(coord, name.clone());
        Ok(name)
    }
}
