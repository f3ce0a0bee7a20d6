//! Business records produced by extraction.

use serde::{Deserialize, Serialize};

/// One business as returned by the place-search provider.
///
/// Every field may be absent. The provider reports numbers and flags
/// inconsistently (sometimes as strings, sometimes as `""` for "unknown"),
/// so those fields deserialize leniently: blanks become `None` and numeric
/// or boolean strings are parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessRecord {
    /// External place identifier.
    pub place_id: Option<String>,
    pub business_name: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub province_state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub full_address: Option<String>,
    pub phone: Option<String>,
    pub international_phone: Option<String>,
    pub website: Option<String>,
    pub google_maps_url: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "lenient::count")]
    pub user_rating_count: Option<u64>,
    pub price_level: Option<String>,
    pub hours: Option<String>,
    pub categories: Option<String>,
    pub business_status: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub longitude: Option<f64>,
    pub photo_url: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub delivery: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub dine_in: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub takeout: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub reservable: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub serves_breakfast: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub serves_lunch: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub serves_dinner: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub serves_beer: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub serves_wine: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub wheelchair_accessible: Option<bool>,
    /// Query string the record was extracted for.
    pub search_query: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl BusinessRecord {
    /// Create a record with just a place id and a name.
    pub fn new(place_id: impl Into<String>, business_name: impl Into<String>) -> Self {
        Self {
            place_id: Some(place_id.into()),
            business_name: Some(business_name.into()),
            ..Default::default()
        }
    }

    /// Read one of the scored fields.
    pub fn field(&self, field: RecordField) -> FieldValue<'_> {
        match field {
            RecordField::BusinessName => FieldValue::text(&self.business_name),
            RecordField::Phone => FieldValue::text(&self.phone),
            RecordField::Website => FieldValue::text(&self.website),
            RecordField::FullAddress => FieldValue::text(&self.full_address),
            RecordField::City => FieldValue::text(&self.city),
            RecordField::Rating => FieldValue::number(self.rating),
            RecordField::StreetAddress => FieldValue::text(&self.street_address),
            RecordField::PostalCode => FieldValue::text(&self.postal_code),
            RecordField::ProvinceState => FieldValue::text(&self.province_state),
            RecordField::Categories => FieldValue::text(&self.categories),
            RecordField::Hours => FieldValue::text(&self.hours),
            RecordField::InternationalPhone => FieldValue::text(&self.international_phone),
            RecordField::GoogleMapsUrl => FieldValue::text(&self.google_maps_url),
            RecordField::PhotoUrl => FieldValue::text(&self.photo_url),
            RecordField::Latitude => FieldValue::number(self.latitude),
            RecordField::Longitude => FieldValue::number(self.longitude),
        }
    }

    /// Place id, if present and not blank.
    pub fn place_id(&self) -> Option<&str> {
        self.place_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Borrowed view of a field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Absent,
    Text(&'a str),
    Number(f64),
    Flag(bool),
}

impl<'a> FieldValue<'a> {
    fn text(value: &'a Option<String>) -> Self {
        value.as_deref().map_or(FieldValue::Absent, FieldValue::Text)
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Absent, FieldValue::Number)
    }

    /// Whether the value counts as present for completeness scoring.
    ///
    /// Text must contain something other than whitespace; any number or
    /// flag counts.
    pub fn is_filled(&self) -> bool {
        match self {
            FieldValue::Absent => false,
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Flag(_) => true,
        }
    }
}

/// Fields that take part in completeness scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    BusinessName,
    Phone,
    Website,
    FullAddress,
    City,
    Rating,
    StreetAddress,
    PostalCode,
    ProvinceState,
    Categories,
    Hours,
    InternationalPhone,
    GoogleMapsUrl,
    PhotoUrl,
    Latitude,
    Longitude,
}

impl RecordField {
    pub const ALL: [RecordField; 16] = [
        RecordField::BusinessName,
        RecordField::Phone,
        RecordField::Website,
        RecordField::FullAddress,
        RecordField::City,
        RecordField::Rating,
        RecordField::StreetAddress,
        RecordField::PostalCode,
        RecordField::ProvinceState,
        RecordField::Categories,
        RecordField::Hours,
        RecordField::InternationalPhone,
        RecordField::GoogleMapsUrl,
        RecordField::PhotoUrl,
        RecordField::Latitude,
        RecordField::Longitude,
    ];

    /// Field name as it appears on the record.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::BusinessName => "business_name",
            RecordField::Phone => "phone",
            RecordField::Website => "website",
            RecordField::FullAddress => "full_address",
            RecordField::City => "city",
            RecordField::Rating => "rating",
            RecordField::StreetAddress => "street_address",
            RecordField::PostalCode => "postal_code",
            RecordField::ProvinceState => "province_state",
            RecordField::Categories => "categories",
            RecordField::Hours => "hours",
            RecordField::InternationalPhone => "international_phone",
            RecordField::GoogleMapsUrl => "google_maps_url",
            RecordField::PhotoUrl => "photo_url",
            RecordField::Latitude => "latitude",
            RecordField::Longitude => "longitude",
        }
    }
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record after phone/URL cleanup, with its completeness attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(flatten)]
    pub record: BusinessRecord,
    /// Completeness score, 0-100.
    pub data_quality_score: u8,
    /// Empty scored fields, in tier order.
    pub missing_fields: Vec<RecordField>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }))
    }

    pub fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }))
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| match v {
            Value::Bool(b) => Some(b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }))
    }
}
