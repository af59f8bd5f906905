use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, fs, io::Result as IoResult, path::Path, str::FromStr};

/// `(longitude, latitude)`. Serializes as a `[lon, lat]` JSON array.
pub type Coord = (f64, f64);

/// Hashable form of a coordinate, rounded to 6 decimals (about 10 cm).
#[derive(Eq, PartialEq, Hash, Clone, Copy, Debug)]
pub struct CoordKey {
    lon_e6: i64,
    lat_e6: i64,
}

impl CoordKey {
    pub fn new(coord: Coord) -> Self {
        Self {
            lon_e6: (coord.0 * 1e6).round() as i64,
            lat_e6: (coord.1 * 1e6).round() as i64,
        }
    }
}

impl fmt::Display for CoordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6}",
            self.lon_e6 as f64 / 1e6,
            self.lat_e6 as f64 / 1e6
        )
    }
}

impl FromStr for CoordKey {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lon, lat) = s.split_once(',').ok_or("Invalid CoordKey format")?;
        let lon: f64 = lon.parse().map_err(|_| "Invalid CoordKey longitude")?;
        let lat: f64 = lat.parse().map_err(|_| "Invalid CoordKey latitude")?;
        Ok(CoordKey::new((lon, lat)))
    }
}

// JSON object keys must be strings, so the reverse map goes through `CoordKey`'s Display/FromStr.
mod coord_key_map {
    use super::CoordKey;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
    use std::{collections::HashMap, str::FromStr};

    pub fn serialize<S: Serializer>(
        map: &HashMap<CoordKey, String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let string_map: HashMap<String, &String> =
            map.iter().map(|(k, v)| (k.to_string(), v)).collect();
        string_map.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<CoordKey, String>, D::Error> {
        let string_map = HashMap::<String, String>::deserialize(deserializer)?;
        string_map
            .into_iter()
            .map(|(k, v)| Ok((CoordKey::from_str(&k).map_err(Error::custom)?, v)))
            .collect()
    }
}

/// A geocoding hit worth remembering between runs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CachedPlace {
    pub coord: Coord,
    pub display_name: String,
}

/// Memoizes forward and reverse geocoding results, optionally persisted as JSON.
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct GeoCache {
    #[serde(default)]
    places: HashMap<String, CachedPlace>,
    #[serde(default, with = "coord_key_map")]
    addresses: HashMap<CoordKey, String>,
}

impl GeoCache {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        if path.as_ref().exists() {
            let data = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)
    }

    fn address_key(address: &str) -> String {
        address.trim().to_lowercase()
    }

    pub fn get_place(&self, address: &str) -> Option<&CachedPlace> {
        self.places.get(&Self::address_key(address))
    }

    pub fn insert_place(&mut self, address: &str, place: CachedPlace) {
        self.places.insert(Self::address_key(address), place);
    }

    pub fn get_address(&self, coord: Coord) -> Option<&str> {
        self.addresses.get(&CoordKey::new(coord)).map(String::as_str)
    }

    pub fn insert_address(&mut self, coord: Coord, display_name: String) {
        self.addresses.insert(CoordKey::new(coord), display_name);
    }

    pub fn len(&self) -> usize {
        self.places.len() + self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
