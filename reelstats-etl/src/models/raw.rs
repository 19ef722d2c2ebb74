//! Raw catalog responses
//!
//! [`RawMovie`] holds one `movie/{id}?append_to_response=credits` response
//! exactly as received. [`MovieDetails`] is the typed view the flattener reads
//! from it. Decoding the view never fails: scalars accept a JSON number or a
//! numeric string and anything else decodes as absent; arrays tolerate items
//! that are not objects.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Unmodified catalog response for one identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMovie(Map<String, Value>);

impl RawMovie {
    /// Wrap a decoded response body; `None` unless the body is a JSON object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Catalog identifier, if the response carries a usable one
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(coerce_integer)
    }

    /// Raw field access
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Typed, lenient view of the fields the pipeline uses
    pub fn details(&self) -> MovieDetails {
        MovieDetails::deserialize(Value::Object(self.0.clone())).unwrap_or_default()
    }
}

/// Fields of a catalog response that the flattener consumes
///
/// Columns such as `adult`, `imdb_id`, `original_title`, `video`, `homepage`
/// and `status` are not modelled and never leave the raw record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieDetails {
    #[serde(default, deserialize_with = "integer")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub tagline: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub overview: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub original_language: Option<String>,

    #[serde(default, deserialize_with = "number")]
    pub budget: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub revenue: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub runtime: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub popularity: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub vote_average: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub vote_count: Option<f64>,

    #[serde(default, deserialize_with = "object")]
    pub belongs_to_collection: Option<NamedEntity>,
    #[serde(default, deserialize_with = "object_list")]
    pub genres: Option<Vec<NamedEntity>>,
    #[serde(default, deserialize_with = "object_list")]
    pub production_companies: Option<Vec<NamedEntity>>,
    #[serde(default, deserialize_with = "object_list")]
    pub production_countries: Option<Vec<NamedEntity>>,
    #[serde(default, deserialize_with = "object_list")]
    pub spoken_languages: Option<Vec<NamedEntity>>,

    #[serde(default, deserialize_with = "object")]
    pub credits: Option<Credits>,
}

/// Any `{ "name": ... }` tagged object (genre, company, collection, ...)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedEntity {
    #[serde(default, deserialize_with = "text")]
    pub name: Option<String>,
}

/// Embedded `credits` sub-resource
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default, deserialize_with = "object_list")]
    pub cast: Option<Vec<CastMember>>,
    #[serde(default, deserialize_with = "object_list")]
    pub crew: Option<Vec<CrewMember>>,
}

/// Billing entry in `credits.cast`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CastMember {
    #[serde(default, deserialize_with = "text")]
    pub name: Option<String>,
}

/// Entry in `credits.crew`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrewMember {
    #[serde(default, deserialize_with = "text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub job: Option<String>,
}

// ============================================================================
// Lenient decoding
// ============================================================================

/// Number or numeric string → finite f64
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Number or numeric string with no fractional part → i64
pub(crate) fn coerce_integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    coerce_number(value)
        .filter(|v| v.fract() == 0.0 && *v >= i64::MIN as f64 && *v <= i64::MAX as f64)
        .map(|v| v as i64)
}

fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_number))
}

fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_integer))
}

fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => Ok(serde_json::from_value(value).ok()),
        _ => Ok(None),
    }
}

/// Array of objects; items that fail to decode become `T::default()` so
/// the array length is preserved
fn object_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Ok(Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawMovie {
        RawMovie::from_value(value).unwrap()
    }

    #[test]
    fn test_from_value_requires_object() {
        assert!(RawMovie::from_value(json!([1, 2])).is_none());
        assert!(RawMovie::from_value(json!("movie")).is_none());
        assert!(RawMovie::from_value(json!({"id": 1})).is_some());
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let details = raw(json!({
            "id": "603",
            "budget": "63000000",
            "revenue": 463517383,
            "vote_average": "8.2"
        }))
        .details();

        assert_eq!(details.id, Some(603));
        assert_eq!(details.budget, Some(63_000_000.0));
        assert_eq!(details.revenue, Some(463_517_383.0));
        assert_eq!(details.vote_average, Some(8.2));
    }

    #[test]
    fn test_garbage_scalars_decode_as_absent() {
        let details = raw(json!({
            "id": 7,
            "title": 42,
            "budget": "lots",
            "runtime": {"minutes": 120},
            "popularity": "NaN",
            "release_date": null
        }))
        .details();

        assert_eq!(details.id, Some(7));
        assert!(details.title.is_none());
        assert!(details.budget.is_none());
        assert!(details.runtime.is_none());
        assert!(details.popularity.is_none());
        assert!(details.release_date.is_none());
    }

    #[test]
    fn test_non_object_list_items_keep_length() {
        let details = raw(json!({
            "id": 1,
            "genres": [{"id": 28, "name": "Action"}, "oops", {"id": 12}],
            "credits": {"cast": [{"name": "A"}, 3], "crew": "not a list"}
        }))
        .details();

        let genres = details.genres.unwrap();
        assert_eq!(genres.len(), 3);
        assert_eq!(genres[0].name.as_deref(), Some("Action"));
        assert!(genres[1].name.is_none());
        assert!(genres[2].name.is_none());

        let credits = details.credits.unwrap();
        assert_eq!(credits.cast.unwrap().len(), 2);
        assert!(credits.crew.is_none());
    }

    #[test]
    fn test_fractional_id_is_rejected() {
        assert_eq!(raw(json!({"id": 1.5})).id(), None);
        assert_eq!(raw(json!({"id": 19995})).id(), Some(19995));
    }

    #[test]
    fn test_raw_round_trip_is_verbatim() {
        let body = json!({
            "id": 299534,
            "adult": false,
            "imdb_id": "tt4154796",
            "budget": 356000000,
            "credits": {"cast": [{"name": "Robert Downey Jr.", "profile_path": "/x.jpg"}]}
        });
        let movie = raw(body.clone());

        let line = serde_json::to_string(&movie).unwrap();
        let back: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(back, body);
        assert_eq!(movie.get("adult"), Some(&json!(false)));
    }
}
