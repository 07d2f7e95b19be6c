use std::{collections::BTreeMap, fs, path::Path};

use _model::Coords;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

pub type StoreCoords = BTreeMap<u32, Coords>;

const SNIFF_BYTES: usize = 1024;
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

pub fn load(path: &Path) -> Result<StoreCoords> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse(text: &str) -> Result<StoreCoords> {
    let delimiter = sniff_delimiter(text).context("Could not determine the CSV delimiter")?;
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    info!("CSV columns found: {:?}", headers.iter().collect::<Vec<_>>());
    let columns = Columns::detect(&headers);

    let mut output = StoreCoords::new();
    for record in reader.records() {
        let record = record?;
        let field = |i: Option<usize>| i.and_then(|i| record.get(i)).map(str::trim).unwrap_or("");

        let store = Some(field(columns.store))
            .filter(|x| !x.is_empty())
            .or_else(|| record.iter().map(str::trim).find(|x| is_number(x)));
        let Some(store) = store else {
            warn!("Could not find store number in row: {:?}", record.iter().collect::<Vec<_>>());
            continue;
        };

        let (lat, lon) = (field(columns.latitude), field(columns.longitude));
        if lat.is_empty() || lon.is_empty() {
            warn!("Missing coordinates for store {store}");
            continue;
        }

        match (store.parse::<u32>(), lat.parse::<f64>(), lon.parse::<f64>()) {
            (Ok(store), Ok(lat), Ok(lon)) => {
                output.insert(store, Coords::new(lat, lon));
            }
            _ => warn!("Could not parse coordinates for store {store}: {lat}, {lon}"),
        }
    }

    Ok(output)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Columns {
    store: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl Columns {
    fn detect(headers: &StringRecord) -> Self {
        let mut columns = Self::default();
        for (i, header) in headers.iter().enumerate() {
            let header = header.to_lowercase();
            if columns.store.is_none()
                && header.contains("store")
                && (header.contains('#') || header.contains("number"))
            {
                columns.store = Some(i);
            }
            // later columns win
            if header.contains("lat") {
                columns.latitude = Some(i);
            } else if header.contains("lon") || header.contains("lng") {
                columns.longitude = Some(i);
            }
        }
        columns
    }
}

fn is_number(x: &str) -> bool {
    !x.is_empty() && x.chars().all(|c| c.is_ascii_digit())
}

/// Pick the delimiter that shows up the same number of times on every line of
/// the first kilobyte, ignoring anything inside quotes.
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let mut end = text.len().min(SNIFF_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &text[..end];

    let mut lines: Vec<&str> = sample.lines().filter(|x| !x.trim().is_empty()).collect();
    // the last line is probably cut short
    if end < text.len() && lines.len() > 1 {
        lines.pop();
    }

    let mut best: Option<(u8, usize)> = None;
    for delimiter in DELIMITERS {
        let counts: Vec<usize> = lines.iter().map(|x| count_unquoted(x, delimiter)).collect();
        let Some(&first) = counts.first() else {
            continue;
        };
        if first == 0 || counts.iter().any(|x| *x != first) {
            continue;
        }
        if best.map_or(true, |(_, count)| first > count) {
            best = Some((delimiter, first));
        }
    }
    best.map(|(delimiter, _)| delimiter)
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            quoted = !quoted;
        } else if b == delimiter && !quoted {
            count += 1;
        }
    }
    count
}
