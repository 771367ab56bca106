use serde::{Deserialize, Serialize};

/// Raw row from the published service-area sheet.
///
/// Values stay as the sheet wrote them; ZIP padding and coordinate parsing
/// belong to the consumer. Columns the sheet does not carry read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAreaRecord {
    #[serde(rename = "ZipCode")]
    pub zip_code: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Lat")]
    pub lat: Option<String>,
    #[serde(rename = "Lon")]
    pub lon: Option<String>,
}

impl ServiceAreaRecord {
    pub fn new(zip_code: &str, city: &str, lat: &str, lon: &str) -> Self {
        Self {
            zip_code: Some(zip_code.to_string()),
            city: Some(city.to_string()),
            lat: Some(lat.to_string()),
            lon: Some(lon.to_string()),
        }
    }

    /// ZIP field if present and not blank
    pub fn zip(&self) -> Option<&str> {
        self.zip_code.as_deref().filter(|z| !z.trim().is_empty())
    }

    pub fn latitude(&self) -> f64 {
        parse_degrees(self.lat.as_deref())
    }

    pub fn longitude(&self) -> f64 {
        parse_degrees(self.lon.as_deref())
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude(), self.longitude())
    }
}

/// Unparseable or missing degrees become NaN; serde_json writes those as null.
fn parse_degrees(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Latitude/longitude pair, serialized as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<(f64, f64)> for Coordinates {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl From<Coordinates> for (f64, f64) {
    fn from(c: Coordinates) -> Self {
        (c.lat, c.lon)
    }
}

/// Marker derived from the last successful search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedLocation {
    pub city: String,
    pub coordinates: Coordinates,
}

impl From<&ServiceAreaRecord> for SelectedLocation {
    fn from(record: &ServiceAreaRecord) -> Self {
        Self {
            city: record.city.clone().unwrap_or_default(),
            coordinates: record.coordinates(),
        }
    }
}

/// Query text, last match and user-visible error, owned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub query: String,
    pub selected: Option<SelectedLocation>,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_from_record() {
        let record = ServiceAreaRecord::new("02134", "Boston", "42.35", "-71.06");
        let selected = SelectedLocation::from(&record);
        assert_eq!(selected.city, "Boston");
        assert_eq!(selected.coordinates, Coordinates::new(42.35, -71.06));
    }

    #[test]
    fn test_bad_coordinates_are_nan() {
        let record = ServiceAreaRecord {
            zip_code: Some("02134".into()),
            city: None,
            lat: Some("north".into()),
            lon: None,
        };
        assert!(record.latitude().is_nan());
        assert!(record.longitude().is_nan());
        assert!(!record.coordinates().is_finite());
        assert_eq!(SelectedLocation::from(&record).city, "");
    }

    #[test]
    fn test_blank_zip_is_absent() {
        let record = ServiceAreaRecord::new("", "Nowhere", "0", "0");
        assert_eq!(record.zip(), None);
        assert_eq!(ServiceAreaRecord::new("  ", "Nowhere", "0", "0").zip(), None);
        assert_eq!(ServiceAreaRecord::default().zip(), None);
    }

    #[test]
    fn test_coordinates_serialize_as_pair() {
        let json = serde_json::to_string(&Coordinates::new(42.5, -71.25)).unwrap();
        assert_eq!(json, "[42.5,-71.25]");
    }
}
