use std::{collections::BTreeSet, time::Duration};

use _model::{contains_alias, Coords};
use anyhow::{Context, Result};
use serde::Deserialize;
use ureq::Agent;

pub const API_BASE: &str = "https://api.mudflapinc.com";

const HEADERS: [(&str, &str); 3] = [
    ("bundle_id", "com.mudflap.mudflap"),
    (
        "user-agent",
        "Mudflap/3.32 (com.mudflap.mudflap; build:772; iOS 26.2.0) Alamofire/1.0",
    ),
    ("accept", "application/json"),
];

#[derive(Debug, Default, Deserialize)]
pub struct NearbyResponse {
    #[serde(default)]
    pub data: Vec<NearbyStation>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NearbyStation {
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default)]
    pub small_branded_pin_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    pub chain: String,
    pub url: String,
}

pub struct Mudflap {
    agent: Agent,
    base: String,
    radius: u32,
    timeout: Duration,
}

impl Mudflap {
    pub fn new(agent: Agent, base: &str, radius: u32, timeout: Duration) -> Self {
        Self {
            agent,
            base: base.trim_end_matches('/').to_string(),
            radius,
            timeout,
        }
    }

    pub fn search_nearby(&self, coords: Coords) -> Result<NearbyResponse> {
        let mut request = self
            .agent
            .get(&format!("{}/api/v4/truck_stops/nearby", self.base))
            .timeout(self.timeout)
            .query("origin[latitude]", &coords.latitude.to_string())
            .query("origin[longitude]", &coords.longitude.to_string())
            .query("radius", &self.radius.to_string());
        for (name, value) in HEADERS {
            request = request.set(name, value);
        }

        let response = request.call().context("API request failed")?;
        response
            .into_json()
            .context("API request failed: unreadable response")
    }

    /// Search around `coords` and return the first station whose chain matches
    /// one of `aliases`. Every chain name in the response lands in `seen`.
    pub fn find_logo(
        &self,
        aliases: &[&str],
        coords: Coords,
        seen: &mut BTreeSet<String>,
    ) -> Result<Option<Logo>> {
        let response = self.search_nearby(coords).context("Search failed")?;
        Ok(match_logo(&response.data, aliases, seen))
    }
}

pub fn match_logo(
    stations: &[NearbyStation],
    aliases: &[&str],
    seen: &mut BTreeSet<String>,
) -> Option<Logo> {
    for x in stations {
        if let Some(chain) = x.chain.as_deref().filter(|x| !x.is_empty()) {
            seen.insert(chain.to_string());
        }
    }

    stations.iter().find_map(|x| {
        let chain = x.chain.as_deref().filter(|x| !x.is_empty())?;
        let url = x.small_branded_pin_url.as_deref().filter(|x| !x.is_empty())?;
        aliases
            .iter()
            .any(|alias| contains_alias(chain, alias))
            .then(|| Logo {
                chain: chain.to_string(),
                url: url.to_string(),
            })
    })
}
