//! Normalization of upstream task entries into flat print records.
//!
//! MakerWorld reports each print as a nested document with a variable number
//! of AMS filament slots. The ingestion API stores one row per print with a
//! fixed set of columns, so every entry is projected onto exactly
//! [`FILAMENT_SLOTS`] slots:
//!
//! ```text
//! RawTaskEntry                         NormalizedPrintRecord
//! ├── id: 123                     →    id: "123"
//! ├── status: 2                   →    status: "Success"
//! ├── startTime: "...00Z"         →    start_time: "...00"
//! ├── weight: 50                  →    total_weight: 50
//! └── amsDetailMapping: [a]       →    filament_1_* = a
//!                                      filament_2_* .. filament_4_* = null
//! ```
//!
//! Everything here is pure: no I/O, no clock, no shared state.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::{RelayError, RelayResult};

/// Number of filament columns emitted per record.
pub const FILAMENT_SLOTS: usize = 4;

/// Status emitted when the upstream entry carries no status at all.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Upstream status code → display label. Codes not listed pass through.
static STATUS_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("1", "Printing"),
        ("2", "Success"),
        ("3", "Canceled"),
        ("4", "Printing"),
    ])
});

/// An identifier or code that upstream sends either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TaskCode {
    Number(Number),
    Text(String),
}

impl fmt::Display for TaskCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskCode::Number(n) => write!(f, "{n}"),
            TaskCode::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for TaskCode {
    fn from(value: i64) -> Self {
        TaskCode::Number(value.into())
    }
}

impl From<&str> for TaskCode {
    fn from(value: &str) -> Self {
        TaskCode::Text(value.to_string())
    }
}

/// One AMS slot as reported upstream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilamentSlot {
    pub filament_type: Option<String>,
    pub target_color: Option<String>,
    pub weight: Option<Value>,
}

/// One historical print job from the task listing.
///
/// Only the fields the relay projects are modelled; anything else upstream
/// sends is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTaskEntry {
    pub id: Option<TaskCode>,
    pub title: Option<String>,
    pub cover: Option<String>,
    pub status: Option<TaskCode>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Relayed as-is, whatever JSON type upstream uses.
    pub weight: Option<Value>,
    #[serde(deserialize_with = "null_as_empty")]
    pub ams_detail_mapping: Vec<FilamentSlot>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FilamentSlot>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<FilamentSlot>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The three columns derived from one filament slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilamentColumns {
    pub material: Option<String>,
    pub colour: Option<String>,
    pub weight: Option<Value>,
}

impl From<&FilamentSlot> for FilamentColumns {
    fn from(slot: &FilamentSlot) -> Self {
        Self {
            material: slot.filament_type.clone(),
            colour: slot.target_color.clone(),
            weight: slot.weight.clone(),
        }
    }
}

/// Flat, forward-ready representation of a task entry.
///
/// Serializes to the ingestion API's column layout, with the filament slots
/// expanded into `filament_{1..=4}_{material,colour,weight}` keys.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPrintRecord {
    pub id: String,
    pub title: String,
    pub cover: Option<String>,
    pub status: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub total_weight: Option<Value>,
    pub filaments: [FilamentColumns; FILAMENT_SLOTS],
}

impl Serialize for NormalizedPrintRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7 + FILAMENT_SLOTS * 3))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("cover", &self.cover)?;
        map.serialize_entry("status", &self.status)?;
        map.serialize_entry("start_time", &self.start_time)?;
        map.serialize_entry("end_time", &self.end_time)?;
        map.serialize_entry("total_weight", &self.total_weight)?;
        for (i, slot) in self.filaments.iter().enumerate() {
            let n = i + 1;
            map.serialize_entry(&format!("filament_{n}_material"), &slot.material)?;
            map.serialize_entry(&format!("filament_{n}_colour"), &slot.colour)?;
            map.serialize_entry(&format!("filament_{n}_weight"), &slot.weight)?;
        }
        map.end()
    }
}

/// Map an upstream status code to its label.
///
/// Total: unknown codes come back as their string form, and a missing code
/// becomes [`UNKNOWN_STATUS`]. The scraper this relay replaces emitted
/// `"None"` for a missing code; `Unknown` is a deliberate departure.
pub fn map_status(code: Option<&TaskCode>) -> String {
    let Some(code) = code else {
        return UNKNOWN_STATUS.to_string();
    };
    let key = code.to_string();
    match STATUS_LABELS.get(key.as_str()) {
        Some(label) => (*label).to_string(),
        None => key,
    }
}

/// Drop one trailing `Z` zone marker. No timezone conversion happens.
pub fn strip_zone_marker(ts: &str) -> String {
    ts.strip_suffix('Z').unwrap_or(ts).to_string()
}

/// Project the upstream slot list onto exactly [`FILAMENT_SLOTS`] columns.
fn filament_columns(slots: &[FilamentSlot]) -> [FilamentColumns; FILAMENT_SLOTS] {
    let mut columns: [FilamentColumns; FILAMENT_SLOTS] = Default::default();
    for (index, column) in columns.iter_mut().enumerate() {
        if let Some(slot) = slots.get(index) {
            *column = FilamentColumns::from(slot);
        }
    }
    columns
}

/// Normalize a single entry. `index` is its position in the page and only
/// feeds the error message.
pub fn normalize_entry(index: usize, entry: &RawTaskEntry) -> RelayResult<NormalizedPrintRecord> {
    let id = entry
        .id
        .as_ref()
        .ok_or(RelayError::MissingField { index, field: "id" })?;

    Ok(NormalizedPrintRecord {
        id: id.to_string(),
        title: entry.title.clone().unwrap_or_default(),
        cover: entry.cover.clone(),
        status: map_status(entry.status.as_ref()),
        start_time: entry.start_time.as_deref().map(strip_zone_marker),
        end_time: entry.end_time.as_deref().map(strip_zone_marker),
        total_weight: entry.weight.clone(),
        filaments: filament_columns(&entry.ams_detail_mapping),
    })
}

/// Normalize a page of entries, preserving order. The first bad entry
/// fails the whole batch.
pub fn normalize_all(entries: &[RawTaskEntry]) -> RelayResult<Vec<NormalizedPrintRecord>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| normalize_entry(index, entry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: serde_json::Value) -> RawTaskEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn status_table_is_fixed() {
        let cases = [
            (TaskCode::from(1_i64), "Printing"),
            (TaskCode::from(2_i64), "Success"),
            (TaskCode::from(3_i64), "Canceled"),
            (TaskCode::from(4_i64), "Printing"),
            (TaskCode::from("2"), "Success"),
            (TaskCode::from(7_i64), "7"),
            (TaskCode::from("queued"), "queued"),
        ];
        for (code, expected) in cases {
            assert_eq!(map_status(Some(&code)), expected, "code {code}");
        }
        assert_eq!(map_status(None), UNKNOWN_STATUS);
    }

    #[test]
    fn strips_exactly_one_trailing_z() {
        assert_eq!(strip_zone_marker("2024-01-01T00:00:00Z"), "2024-01-01T00:00:00");
        assert_eq!(strip_zone_marker("2024-01-01T00:00:00ZZ"), "2024-01-01T00:00:00Z");
        assert_eq!(strip_zone_marker("2024-01-01T00:00:00"), "2024-01-01T00:00:00");
        assert_eq!(strip_zone_marker("2024-01-01T00:00:00+02:00"), "2024-01-01T00:00:00+02:00");
    }

    #[test]
    fn id_is_stringified() {
        let numeric = normalize_entry(0, &entry(json!({ "id": 987654321 }))).unwrap();
        let text = normalize_entry(0, &entry(json!({ "id": "abc-1" }))).unwrap();
        assert_eq!(numeric.id, "987654321");
        assert_eq!(text.id, "abc-1");
    }

    #[test]
    fn missing_id_is_an_error() {
        let err = normalize_entry(5, &entry(json!({ "title": "x" }))).unwrap_err();
        assert!(matches!(err, RelayError::MissingField { index: 5, field: "id" }));
    }

    #[test]
    fn absent_and_null_fields_default() {
        let record = normalize_entry(
            0,
            &entry(json!({ "id": 1, "title": null, "startTime": null, "amsDetailMapping": null })),
        )
        .unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.cover, None);
        assert_eq!(record.start_time, None);
        assert_eq!(record.end_time, None);
        assert_eq!(record.status, UNKNOWN_STATUS);
        assert!(record.filaments.iter().all(|f| *f == FilamentColumns::default()));
    }

    #[test]
    fn always_four_filament_slots() {
        let six: Vec<_> = (1..=6)
            .map(|i| json!({ "filamentType": format!("M{i}"), "targetColor": "Black", "weight": i }))
            .collect();
        let record = normalize_entry(0, &entry(json!({ "id": 1, "amsDetailMapping": six }))).unwrap();
        assert_eq!(record.filaments[3].material.as_deref(), Some("M4"));

        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 7 + FILAMENT_SLOTS * 3);
        assert!(!obj.contains_key("filament_5_material"));

        let two = json!([{ "filamentType": "PLA" }, { "targetColor": "Blue" }]);
        let record = normalize_entry(0, &entry(json!({ "id": 1, "amsDetailMapping": two }))).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["filament_1_material"], "PLA");
        assert_eq!(value["filament_1_colour"], serde_json::Value::Null);
        assert_eq!(value["filament_2_colour"], "Blue");
        for n in 3..=4 {
            for col in ["material", "colour", "weight"] {
                assert!(value[format!("filament_{n}_{col}")].is_null());
            }
        }
    }

    #[test]
    fn page_order_is_preserved() {
        let entries: Vec<RawTaskEntry> = (0..5).map(|i| entry(json!({ "id": i }))).collect();
        let records = normalize_all(&entries).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn one_bad_entry_fails_the_batch() {
        let entries = vec![entry(json!({ "id": 1 })), entry(json!({}))];
        let err = normalize_all(&entries).unwrap_err();
        assert!(matches!(err, RelayError::MissingField { index: 1, .. }));
    }

    #[test]
    fn vase_round_trip() {
        let raw = entry(json!({
            "id": 123,
            "title": "Vase",
            "status": 2,
            "startTime": "2024-01-01T00:00:00Z",
            "endTime": null,
            "weight": 50,
            "amsDetailMapping": [{ "filamentType": "PLA", "targetColor": "Red", "weight": 50 }]
        }));
        let record = normalize_entry(0, &raw).unwrap();

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "id": "123",
                "title": "Vase",
                "cover": null,
                "status": "Success",
                "start_time": "2024-01-01T00:00:00",
                "end_time": null,
                "total_weight": 50,
                "filament_1_material": "PLA",
                "filament_1_colour": "Red",
                "filament_1_weight": 50,
                "filament_2_material": null,
                "filament_2_colour": null,
                "filament_2_weight": null,
                "filament_3_material": null,
                "filament_3_colour": null,
                "filament_3_weight": null,
                "filament_4_material": null,
                "filament_4_colour": null,
                "filament_4_weight": null
            })
        );
    }

    #[test]
    fn fractional_weights_are_copied_verbatim() {
        let record = normalize_entry(
            0,
            &entry(json!({ "id": 1, "weight": 12.37, "amsDetailMapping": [{ "weight": 3.5 }] })),
        )
        .unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["total_weight"], json!(12.37));
        assert_eq!(value["filament_1_weight"], json!(3.5));
    }

    #[test]
    fn non_numeric_weights_pass_through() {
        let page: Vec<RawTaskEntry> = serde_json::from_value(json!([
            { "id": 1, "weight": "12.5", "amsDetailMapping": [{ "weight": "3g" }] },
            { "id": 2, "weight": 40 }
        ]))
        .unwrap();
        let records = normalize_all(&page).unwrap();

        let first = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(first["total_weight"], json!("12.5"));
        assert_eq!(first["filament_1_weight"], json!("3g"));
        let second = serde_json::to_value(&records[1]).unwrap();
        assert_eq!(second["total_weight"], json!(40));
    }
}
