use std::collections::HashMap;

use _model::{BrandTable, ComparisonEntry, Coords, HOME_BRAND};

#[derive(Debug, Clone, PartialEq)]
pub struct BrandFamily {
    pub brand: String,
    /// Any one location of the brand, used to centre the nearby search.
    pub coords: Option<Coords>,
    pub examples: Vec<String>,
    pub count: usize,
}

/// Group every station in the comparison file into brand families, largest
/// first. Families with the same count stay in the order they were first seen.
pub fn collect(entries: &[ComparisonEntry], brands: &BrandTable) -> Vec<BrandFamily> {
    let mut families: Vec<BrandFamily> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let mut add = |brand: String, name: String, coords: Option<Coords>| {
        let i = *index.entry(brand.clone()).or_insert_with(|| {
            families.push(BrandFamily {
                brand,
                coords,
                examples: Vec::new(),
                count: 0,
            });
            families.len() - 1
        });
        let family = &mut families[i];
        family.examples.push(name);
        family.count += 1;
        if family.coords.is_none() {
            family.coords = coords;
        }
    };

    // only home stores with a known position count
    for entry in entries {
        let Some(store) = &entry.rr_store_data else {
            continue;
        };
        if let Some(coords) = store.coords() {
            let name = store.name.clone().unwrap_or_else(|| HOME_BRAND.to_string());
            add(HOME_BRAND.to_string(), name, Some(coords));
        }
    }

    for entry in entries {
        for competitor in &entry.competitors {
            if competitor.name.is_empty() {
                continue;
            }
            add(
                brands.consolidate(&competitor.name),
                competitor.name.clone(),
                competitor.coords(),
            );
        }
    }

    families.sort_by(|a, b| b.count.cmp(&a.count));
    families
}
