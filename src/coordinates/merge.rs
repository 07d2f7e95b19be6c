use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::table::StoreCoords;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub updated: usize,
    /// Store numbers from the CSV that no comparison entry referenced.
    pub unused: Vec<u32>,
}

/// Copy coordinates into each entry's `rr_store_data`, keyed by the store
/// number in its `rr_store` name ("Road Ranger 118" -> 118).
pub fn apply(data: &mut Value, coords: &StoreCoords) -> Result<MergeReport> {
    let entries = data
        .as_array_mut()
        .context("Expected a JSON array of store comparisons")?;
    let number = Regex::new(r"\d+")?;

    let mut report = MergeReport::default();
    let mut used = BTreeSet::new();
    for entry in entries {
        let Some(object) = entry.as_object_mut() else {
            continue;
        };
        let Some(name) = object.get("rr_store").and_then(Value::as_str) else {
            continue;
        };
        let Some(found) = number.find(name) else {
            continue;
        };
        let name = name.to_string();

        let Ok(store) = found.as_str().parse::<u32>() else {
            warn!("Store number out of range in {name:?}");
            continue;
        };
        let Some(position) = coords.get(&store) else {
            warn!("No coordinates for store {store} ({name})");
            continue;
        };

        let store_data = object
            .entry("rr_store_data")
            .or_insert_with(|| json!({}));
        if !store_data.is_object() {
            *store_data = json!({});
        }
        store_data["latitude"] = json!(position.latitude);
        store_data["longitude"] = json!(position.longitude);

        info!("Updated {name} with coordinates");
        used.insert(store);
        report.updated += 1;
    }

    report.unused = coords
        .keys()
        .filter(|x| !used.contains(*x))
        .copied()
        .collect();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use _model::Coords;

    use super::*;

    fn coords() -> StoreCoords {
        StoreCoords::from([
            (118, Coords::new(41.5, -90.3)),
            (7, Coords::new(42.27, -89.09)),
            (55, Coords::new(39.0, -88.0)),
        ])
    }

    #[test]
    fn patches_matching_entries() {
        let mut data = json!([
            {
                "rr_store": "Road Ranger 118",
                "rr_store_data": {"name": "Road Ranger 118", "latitude": null, "longitude": null},
                "competitors": []
            },
            {"rr_store": "Road Ranger #7"}
        ]);

        let report = apply(&mut data, &coords()).unwrap();
        assert_eq!(
            report,
            MergeReport {
                updated: 2,
                unused: vec![55]
            }
        );
        assert_eq!(data[0]["rr_store_data"]["latitude"], json!(41.5));
        assert_eq!(data[0]["rr_store_data"]["longitude"], json!(-90.3));
        assert_eq!(data[0]["rr_store_data"]["name"], "Road Ranger 118");
        assert_eq!(data[1]["rr_store_data"]["longitude"], json!(-89.09));
    }

    #[test]
    fn leaves_unknown_stores_alone() {
        let original = json!([
            {"rr_store": "Road Ranger 999", "rr_store_data": {"latitude": 1.0, "longitude": 2.0}},
            {"rr_store": "Road Ranger"},
            {"rr_store": 118},
            "not an entry"
        ]);
        let mut data = original.clone();

        let report = apply(&mut data, &coords()).unwrap();
        assert_eq!(report.updated, 0);
        assert_eq!(report.unused, vec![7, 55, 118]);
        assert_eq!(data, original);
    }

    #[derive(Clone, Default)]
    struct Logs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Logs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn absent_store_is_warned() {
        let logs = Logs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut data = json!([{"rr_store": "Road Ranger 999", "rr_store_data": {}}]);
        let report = tracing::subscriber::with_default(subscriber, || {
            apply(&mut data, &coords()).unwrap()
        });
        assert_eq!(report.updated, 0);
        assert_eq!(data[0]["rr_store_data"], json!({}));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("No coordinates for store 999"));
    }

    #[test]
    fn keeps_key_order() {
        let mut data: Value = serde_json::from_str(
            r#"[{"rr_store": "Road Ranger 55", "rr_store_data": {"zip": "61801", "longitude": 0, "latitude": 0}}]"#,
        )
        .unwrap();
        apply(&mut data, &coords()).unwrap();

        let keys: Vec<_> = data[0]["rr_store_data"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["zip", "longitude", "latitude"]);
    }

    #[test]
    fn rejects_non_array() {
        assert!(apply(&mut json!({"rr_store": "Road Ranger 1"}), &coords()).is_err());
    }
}
