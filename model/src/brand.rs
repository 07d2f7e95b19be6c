use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Brand the comparison file is built around; its own stores are grouped
/// under this name before any competitor is looked at.
pub const HOME_BRAND: &str = "Road Ranger";

const DEFAULT_BRANDS: &[(&str, &[&str])] = &[
    ("Road Ranger", &["Road Ranger", "RoadRanger"]),
    (
        "TA",
        &["TA", "TravelCenters", "TA Express", "TA Petro", "Travel Centers"],
    ),
    ("Speedway", &["Speedway"]),
    ("Circle K", &["Circle K", "CircleK"]),
    ("Kwik Trip", &["Kwik Trip", "Kwik Star"]),
    ("Casey's", &["Casey's", "Caseys", "Casey's General"]),
    ("Huck's", &["Huck's", "Hucks"]),
    ("Shell", &["Shell"]),
    ("BP", &["BP"]),
    ("Petro", &["Petro"]),
    ("7-Eleven", &["7-Eleven", "7-11", "7 Eleven"]),
    ("Pilot", &["Pilot", "Flying J"]),
    ("Love's", &["Love's", "Loves"]),
    ("Stripes", &["Stripes", "7Fleet", "7FLEET"]),
    ("Allsup's", &["Allsup's", "Allsups", "Allsup"]),
    ("Maverik", &["Maverik", "Kum & Go", "Kum 'n Go"]),
    ("PWI", &["PWI"]),
    ("Haymakers", &["Haymakers"]),
    ("Beck's", &["Beck's", "Becks"]),
    ("Mach 1", &["Mach 1", "Mach1"]),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandAliases {
    pub brand: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Ordered brand -> aliases table. The first brand with a matching alias wins.
#[derive(Clone, Debug)]
pub struct BrandTable {
    entries: Vec<BrandAliases>,
}

impl Default for BrandTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_BRANDS
                .iter()
                .map(|(brand, aliases)| BrandAliases {
                    brand: brand.to_string(),
                    aliases: aliases.iter().map(|x| x.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl BrandTable {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read brand table {}", path.display()))?;
        let entries: Vec<BrandAliases> = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse brand table {}", path.display()))?;
        Self::new(entries)
    }

    pub fn new(mut entries: Vec<BrandAliases>) -> Result<Self> {
        if entries.is_empty() {
            bail!("brand table is empty");
        }
        for x in &mut entries {
            if x.aliases.is_empty() {
                x.aliases.push(x.brand.clone());
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collapse a raw station name like "Pilot Travel Center #412" down to its
    /// brand. Names no alias matches fall back to their first meaningful word.
    pub fn consolidate(&self, name: &str) -> String {
        for x in &self.entries {
            if x.aliases.iter().any(|alias| contains_alias(name, alias)) {
                return x.brand.clone();
            }
        }
        fallback_brand(name)
    }

    /// Aliases to look for when matching `brand` against something else.
    /// Brands outside the table (fallback names) are their own alias.
    pub fn aliases<'a>(&'a self, brand: &'a str) -> Vec<&'a str> {
        match self.entries.iter().find(|x| x.brand == brand) {
            Some(x) => x.aliases.iter().map(|x| x.as_str()).collect(),
            None => vec![brand],
        }
    }
}

/// Case-insensitive search for `alias` in `text`. An alias edge that is a
/// letter or digit must not touch another letter or digit, so "TA" is found in
/// "TA Express" but not in "Kwik Star".
pub fn contains_alias(text: &str, alias: &str) -> bool {
    let text = text.to_lowercase();
    let alias = alias.to_lowercase();
    if alias.is_empty() {
        return false;
    }

    let check_start = alias.starts_with(char::is_alphanumeric);
    let check_end = alias.ends_with(char::is_alphanumeric);

    // every start, since a glued match can overlap a clean one
    text.char_indices()
        .map(|(i, _)| i)
        .filter(|i| text[*i..].starts_with(&alias))
        .any(|i| {
            let before = text[..i].chars().next_back();
            let after = text[i + alias.len()..].chars().next();
            !(check_start && before.is_some_and(char::is_alphanumeric))
                && !(check_end && after.is_some_and(char::is_alphanumeric))
        })
}

fn fallback_brand(name: &str) -> String {
    let head = name.split(['#', '-']).next().unwrap_or_default().trim();
    let is_number = |w: &str| w.chars().all(|c| c.is_ascii_digit());

    head.split_whitespace()
        .find(|w| !is_number(w) && w.chars().count() > 1)
        .or_else(|| head.split_whitespace().next())
        .unwrap_or(head)
        .to_string()
}
