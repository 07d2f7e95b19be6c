use serde::{Deserialize, Serialize};

mod brand;
mod station;

pub use brand::{contains_alias, BrandAliases, BrandTable, HOME_BRAND};
pub use station::{Competitor, ComparisonEntry, StoreData};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coords {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}
