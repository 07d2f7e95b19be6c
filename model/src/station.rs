use serde::{Deserialize, Deserializer};

use crate::Coords;

/// One row of the price comparison file: a home-brand store and the
/// competitors found around it.
#[derive(Debug, Default, Deserialize)]
pub struct ComparisonEntry {
    #[serde(default, deserialize_with = "text")]
    pub rr_store: String,
    #[serde(default)]
    pub rr_store_data: Option<StoreData>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "coordinate")]
    pub longitude: Option<f64>,
}

impl StoreData {
    pub fn coords(&self) -> Option<Coords> {
        Some(Coords::new(self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Competitor {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default)]
    pub data: Option<StoreData>,
}

impl Competitor {
    pub fn coords(&self) -> Option<Coords> {
        self.data.as_ref()?.coords()
    }
}

// null reads as empty
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
}

// upstream writes 0 (or "") for unknown positions
fn coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw: Option<RawCoordinate> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawCoordinate::Number(x)) => Some(x),
        Some(RawCoordinate::Text(x)) => x.trim().parse().ok(),
        None => None,
    }
    .filter(|x: &f64| *x != 0.0 && x.is_finite()))
}
