//! School API response structures.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::listing::coerce_f64;

/// One page of school search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolPage {
    #[serde(default)]
    pub items: Vec<Value>,

    #[serde(default)]
    pub links: SchoolLinks,
}

impl SchoolPage {
    pub fn from_value(value: &Value) -> crate::error::Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// URL of the next page, when the server provided one.
    pub fn next_link(&self) -> Option<&str> {
        self.links.next.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolLinks {
    #[serde(default)]
    pub next: Option<String>,
}

/// Closed set of school type labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchoolType {
    Public,
    Charter,
    Private,
}

impl SchoolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolType::Public => "public",
            SchoolType::Charter => "charter",
            SchoolType::Private => "private",
        }
    }
}

impl std::fmt::Display for SchoolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One school record.
///
/// Fields the API sends inconsistently (`schoolType` vs `school_type` vs
/// `type`, string or numeric ratings) are absorbed here with aliases and
/// lenient accessors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct School {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub lat: Value,

    #[serde(default)]
    pub lon: Value,

    #[serde(default)]
    pub rating: Value,

    #[serde(rename = "schoolType", alias = "school_type", alias = "type", default)]
    pub type_label: Option<String>,

    #[serde(rename = "isCharter", default)]
    pub is_charter: Option<bool>,

    #[serde(rename = "isPrivate", default)]
    pub is_private: Option<bool>,

    #[serde(default)]
    pub address: SchoolAddress,
}

impl School {
    pub fn latitude(&self) -> Option<f64> {
        coerce_f64(&self.lat)
    }

    pub fn longitude(&self) -> Option<f64> {
        coerce_f64(&self.lon)
    }

    /// Numeric rating from either a number or a digit string.
    pub fn rating(&self) -> Option<i64> {
        match &self.rating {
            Value::Number(n) => n.as_f64().map(|f| f as i64),
            Value::String(s) => {
                let s = s.trim();
                if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                    s.parse().ok()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Resolve the type label via the fallback chain:
    /// explicit type string, then boolean hints, then "public".
    pub fn school_type(&self) -> SchoolType {
        if let Some(raw) = &self.type_label {
            match raw.trim().to_lowercase().as_str() {
                "public" | "district" | "magnet" => return SchoolType::Public,
                "charter" => return SchoolType::Charter,
                "private" | "religious" | "parochial" => return SchoolType::Private,
                _ => {}
            }
        }
        if self.is_private == Some(true) {
            SchoolType::Private
        } else if self.is_charter == Some(true) {
            SchoolType::Charter
        } else {
            SchoolType::Public
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolAddress {
    #[serde(default)]
    pub street1: String,

    #[serde(default)]
    pub city: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn school(value: Value) -> School {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_next_link_absent_ends_pagination() {
        let page = SchoolPage::from_value(&json!({"items": []})).unwrap();
        assert_eq!(page.next_link(), None);

        let page = SchoolPage::from_value(&json!({
            "items": [],
            "links": {"next": "https://example.com/p2"}
        }))
        .unwrap();
        assert_eq!(page.next_link(), Some("https://example.com/p2"));
    }

    #[test]
    fn test_rating_number_and_digit_string() {
        assert_eq!(school(json!({"rating": 7})).rating(), Some(7));
        assert_eq!(school(json!({"rating": "9"})).rating(), Some(9));
        assert_eq!(school(json!({"rating": "N/A"})).rating(), None);
        assert_eq!(school(json!({"rating": null})).rating(), None);
        assert_eq!(school(json!({})).rating(), None);
    }

    #[test]
    fn test_type_from_explicit_string() {
        assert_eq!(school(json!({"schoolType": "charter"})).school_type(), SchoolType::Charter);
        assert_eq!(school(json!({"school_type": "private"})).school_type(), SchoolType::Private);
        assert_eq!(school(json!({"type": "magnet"})).school_type(), SchoolType::Public);
        assert_eq!(school(json!({"schoolType": "Parochial"})).school_type(), SchoolType::Private);
    }

    #[test]
    fn test_type_falls_back_to_booleans() {
        assert_eq!(school(json!({"isCharter": true})).school_type(), SchoolType::Charter);
        assert_eq!(school(json!({"isPrivate": true})).school_type(), SchoolType::Private);
        // isPrivate wins over isCharter when both are set.
        assert_eq!(
            school(json!({"isPrivate": true, "isCharter": true})).school_type(),
            SchoolType::Private
        );
    }

    #[test]
    fn test_type_defaults_to_public() {
        assert_eq!(school(json!({})).school_type(), SchoolType::Public);
        assert_eq!(school(json!({"schoolType": "montessori"})).school_type(), SchoolType::Public);
    }

    #[test]
    fn test_coordinates_accept_strings() {
        let s = school(json!({"lat": "40.85", "lon": -73.87}));
        assert_eq!(s.latitude(), Some(40.85));
        assert_eq!(s.longitude(), Some(-73.87));
    }
}
