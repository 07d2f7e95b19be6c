use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::utils::sanitize_filename;

use super::mudflap::Logo;

/// Example names kept per brand in the summary.
const EXAMPLES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct LogoEntry {
    pub chain: String,
    pub url: String,
    pub location_count: usize,
    pub examples: Vec<String>,
}

impl LogoEntry {
    pub fn new(logo: Logo, location_count: usize, examples: &[String]) -> Self {
        Self {
            chain: logo.chain,
            url: logo.url,
            location_count,
            examples: examples.iter().take(EXAMPLES).cloned().collect(),
        }
    }
}

pub type LogoDatabase = BTreeMap<String, LogoEntry>;

pub fn local_file(brand: &str) -> String {
    format!("{}.png", sanitize_filename(brand))
}

#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub generated_at: NaiveDateTime,
    pub total_brands: usize,
    pub brands: Vec<SummaryBrand<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SummaryBrand<'a> {
    pub brand: &'a str,
    pub chain: &'a str,
    pub url: &'a str,
    pub local_file: String,
    pub location_count: usize,
    pub example_stations: &'a [String],
}

impl<'a> Summary<'a> {
    pub fn new(database: &'a LogoDatabase) -> Self {
        Self {
            generated_at: Local::now().naive_local(),
            total_brands: database.len(),
            brands: database
                .iter()
                .map(|(brand, x)| SummaryBrand {
                    brand,
                    chain: &x.chain,
                    url: &x.url,
                    local_file: local_file(brand),
                    location_count: x.location_count,
                    example_stations: &x.examples,
                })
                .collect(),
        }
    }
}
