//! On-disk record codec.
//!
//! A record is a two-element JSON array: the entry name followed by the curve
//! parameters, keys sorted, two-space indent:
//!
//! ```json
//! [
//!   "square",
//!   {
//!     "degree": 1,
//!     "knot": [0.0, 1.0, 2.0, 3.0, 4.0],
//!     "periodic": false,
//!     "point": [[-1.0, 0.0, -1.0], ...]
//!   }
//! ]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::curve::CurveData;

/// A named curve as stored in the library. The thumbnail is not embedded; it
/// lives next to the record under the same name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry(pub String, pub CurveData);

impl LibraryEntry {
    pub fn new(name: impl Into<String>, curve: CurveData) -> Self {
        LibraryEntry(name.into(), curve)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn curve(&self) -> &CurveData {
        &self.1
    }

    pub fn into_curve(self) -> CurveData {
        self.1
    }
}

impl fmt::Display for LibraryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0, self.1)
    }
}

/// Serialize `entry` into record text.
pub fn encode_record(entry: &LibraryEntry) -> Result<String, String> {
    serde_json::to_string_pretty(entry).map_err(|e| format!("serialize error: {e}"))
}

/// Parse record text and check the curve's structure.
pub fn decode_record(s: &str) -> Result<LibraryEntry, String> {
    let entry: LibraryEntry = serde_json::from_str(s).map_err(|e| format!("parse error: {e}"))?;
    if entry.0.is_empty() {
        return Err("record has an empty name".to_string());
    }
    entry.1.validate()?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn line() -> LibraryEntry {
        LibraryEntry::new(
            "line",
            CurveData::new(
                1,
                false,
                vec![DVec3::ZERO, DVec3::new(0.0, 2.0, 0.0)],
                vec![0.0, 1.0],
            ),
        )
    }

    #[test]
    fn encodes_sorted_lowercase_keys_inside_name_pair() {
        let text = encode_record(&line()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let arr = value.as_array().expect("top-level array");
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0], "line");
        let keys: Vec<&str> = arr[1]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["degree", "knot", "periodic", "point"]);

        let degree_at = text.find("\"degree\"").unwrap();
        let point_at = text.find("\"point\"").unwrap();
        assert!(degree_at < point_at);
        assert!(text.contains("\n  \"line\""));
    }

    #[test]
    fn legacy_capitalised_degree_key_is_rejected() {
        let text = r#"["old", {"Degrees": 1, "knot": [0, 1], "periodic": false, "point": [[0,0,0],[1,0,0]]}]"#;
        let err = decode_record(text).unwrap_err();
        assert!(err.contains("degree"), "{err}");
    }

    #[test]
    fn integer_coordinates_are_accepted() {
        let text = r#"["ints", {"degree": 1, "knot": [0, 1], "periodic": false, "point": [[0,0,0],[1,2,3]]}]"#;
        let entry = decode_record(text).unwrap();
        assert_eq!(entry.curve().points[1], DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn structurally_invalid_curve_is_rejected() {
        let text = r#"["bad", {"degree": 3, "knot": [0, 1], "periodic": false, "point": [[0,0,0],[1,0,0]]}]"#;
        assert!(decode_record(text).unwrap_err().contains("control points"));
    }
}
