//! Extraction of readings from the management API's thermal and power documents.
//!
//! Thermal: `{"Temperatures": [{"Name": .., "ReadingCelsius": ..}, ..]}`
//! Power:   `{"Voltages":     [{"Name": .., "ReadingVolts": ..}, ..]}`

use serde_json::Value;

use crate::model::{SensorMap, SensorReading, SensorUnit};

/// One category of readings inside a structured document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Category {
    pub list_key: &'static str,
    pub reading_key: &'static str,
    pub unit: SensorUnit,
}

pub(crate) const TEMPERATURES: Category = Category {
    list_key: "Temperatures",
    reading_key: "ReadingCelsius",
    unit: SensorUnit::Celsius,
};

pub(crate) const VOLTAGES: Category = Category {
    list_key: "Voltages",
    reading_key: "ReadingVolts",
    unit: SensorUnit::Volts,
};

/// Extract temperature and voltage readings.
///
/// A missing document (failed fetch) just omits its category. Entries without
/// a numeric reading are dropped.
pub fn extract_structured(thermal: Option<&Value>, power: Option<&Value>) -> SensorMap {
    let mut map = SensorMap::new();

    for (doc, category) in [(thermal, TEMPERATURES), (power, VOLTAGES)] {
        let Some(doc) = doc else {
            tracing::debug!(category = category.list_key, "structured document absent");
            continue;
        };
        for reading in category_readings(doc, category) {
            map.insert(reading);
        }
    }

    tracing::info!(sensors = map.len(), "extracted structured sensor readings");
    map
}

/// Entries of `category` in `doc`, or an empty slice when the document has
/// an unexpected shape.
pub(crate) fn category_entries<'a>(doc: &'a Value, category: Category) -> &'a [Value] {
    match doc.get(category.list_key) {
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => {
            tracing::warn!(
                category = category.list_key,
                found = json_kind(other),
                "expected an array, ignoring category"
            );
            &[]
        }
        None => &[],
    }
}

/// `Name` of an entry; missing or non-string names become empty.
pub(crate) fn entry_name(entry: &Value) -> &str {
    entry.get("Name").and_then(Value::as_str).unwrap_or("")
}

fn category_readings(doc: &Value, category: Category) -> impl Iterator<Item = SensorReading> + '_ {
    category_entries(doc, category).iter().filter_map(move |entry| {
        let value = entry.get(category.reading_key).and_then(Value::as_f64)?;
        Some(SensorReading::structured(entry_name(entry), Some(value), category.unit))
    })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
