//! Flattener: nested catalog JSON → one flat row per movie
//!
//! Pure functions; missing nested fields become `None` or empty lists and
//! nothing here can fail.

use crate::models::{Credits, FlatMovie, NamedEntity, PipeList, RawMovie};

/// Crew job marking the director (exact, case-sensitive)
pub const DIRECTOR_JOB: &str = "Director";

/// Flatten one raw record, keeping at most `cast_limit` cast names
pub fn flatten(raw: &RawMovie, cast_limit: usize) -> FlatMovie {
    let details = raw.details();
    let credits = extract_credits(details.credits.as_ref(), cast_limit);

    FlatMovie {
        id: details.id,
        title: details.title,
        tagline: details.tagline,
        overview: details.overview,
        poster_path: details.poster_path,
        release_date: details.release_date,
        original_language: details.original_language,
        franchise: details.belongs_to_collection.and_then(|c| c.name),
        genres: details.genres.as_deref().map(join_names),
        production_companies: details.production_companies.as_deref().map(join_names),
        production_countries: details.production_countries.as_deref().map(join_names),
        spoken_languages: details.spoken_languages.as_deref().map(join_names),
        budget: details.budget,
        revenue: details.revenue,
        runtime: details.runtime,
        popularity: details.popularity,
        vote_average: details.vote_average,
        vote_count: details.vote_count,
        cast: credits.cast,
        cast_size: credits.cast_size,
        director: credits.director,
        crew_size: credits.crew_size,
    }
}

/// Flatten a batch, preserving order
pub fn flatten_all(raws: &[RawMovie], cast_limit: usize) -> Vec<FlatMovie> {
    raws.iter().map(|raw| flatten(raw, cast_limit)).collect()
}

/// Names of a tagged-object array in array order; entries without a name
/// are skipped
pub fn join_names(entities: &[NamedEntity]) -> PipeList {
    entities
        .iter()
        .filter_map(|entity| entity.name.clone())
        .collect()
}

/// Cast/crew summary extracted from `credits`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreditsSummary {
    pub cast: PipeList,
    pub cast_size: usize,
    pub director: Option<String>,
    pub crew_size: usize,
}

/// Summarise the credits sub-resource
///
/// `cast_size` and `crew_size` count every array entry, including entries
/// whose name is missing, so `cast_size >= cast.len()` always holds.
pub fn extract_credits(credits: Option<&Credits>, cast_limit: usize) -> CreditsSummary {
    let Some(credits) = credits else {
        return CreditsSummary::default();
    };

    let cast = credits.cast.as_deref().unwrap_or_default();
    let crew = credits.crew.as_deref().unwrap_or_default();

    let director = crew
        .iter()
        .find(|member| member.job.as_deref() == Some(DIRECTOR_JOB))
        .and_then(|member| member.name.clone());

    CreditsSummary {
        cast: cast
            .iter()
            .take(cast_limit)
            .filter_map(|member| member.name.clone())
            .collect(),
        cast_size: cast.len(),
        director,
        crew_size: crew.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn raw(value: Value) -> RawMovie {
        RawMovie::from_value(value).unwrap()
    }

    #[test]
    fn test_tagged_arrays_keep_order() {
        let flat = flatten(
            &raw(json!({
                "id": 19995,
                "genres": [
                    {"id": 28, "name": "Action"},
                    {"id": 12, "name": "Adventure"},
                    {"id": 14, "name": "Fantasy"},
                    {"id": 878, "name": "Science Fiction"}
                ],
                "spoken_languages": [
                    {"english_name": "English", "iso_639_1": "en", "name": "English"},
                    {"english_name": "Spanish", "iso_639_1": "es", "name": "Español"}
                ]
            })),
            10,
        );

        let genres = flat.genres.unwrap();
        assert_eq!(genres.to_string(), "Action|Adventure|Fantasy|Science Fiction");
        assert_eq!(
            PipeList::parse(&genres.to_string()).names(),
            &["Action", "Adventure", "Fantasy", "Science Fiction"]
        );
        assert_eq!(flat.spoken_languages.unwrap().to_string(), "English|Español");
    }

    #[test]
    fn test_empty_array_is_empty_string_not_null() {
        let flat = flatten(&raw(json!({"id": 1, "genres": []})), 10);
        let genres = flat.genres.expect("empty array must not be null");
        assert_eq!(genres.to_string(), "");
    }

    #[test]
    fn test_names_with_separator_keep_their_count() {
        let flat = flatten(
            &raw(json!({"id": 1, "production_companies": [{"name": "A|B"}, {"name": "C"}]})),
            10,
        );
        let companies = flat.production_companies.unwrap();
        let stored = companies.to_string();
        assert_eq!(stored, "A/B|C");
        assert_eq!(PipeList::parse(&stored).names(), &["A/B", "C"]);
    }

    #[test]
    fn test_absent_array_is_null() {
        let flat = flatten(&raw(json!({"id": 1})), 10);
        assert!(flat.genres.is_none());
        assert!(flat.production_companies.is_none());
        assert!(flat.franchise.is_none());
        assert!(flat.director.is_none());
        assert_eq!(flat.cast_size, 0);
        assert_eq!(flat.crew_size, 0);
        assert!(flat.cast.is_empty());
    }

    #[test]
    fn test_franchise_name() {
        let flat = flatten(
            &raw(json!({
                "id": 299534,
                "belongs_to_collection": {"id": 86311, "name": "The Avengers Collection"}
            })),
            10,
        );
        assert_eq!(flat.franchise.as_deref(), Some("The Avengers Collection"));

        let standalone = flatten(&raw(json!({"id": 2, "belongs_to_collection": null})), 10);
        assert!(standalone.franchise.is_none());
    }

    #[test]
    fn test_first_director_wins_and_match_is_exact() {
        let credits = json!({
            "cast": [],
            "crew": [
                {"job": "director", "name": "Lowercase"},
                {"job": "Producer", "name": "Kevin Feige"},
                {"job": "Director", "name": "Anthony Russo"},
                {"job": "Director", "name": "Joe Russo"}
            ]
        });
        let flat = flatten(&raw(json!({"id": 299534, "credits": credits})), 10);
        assert_eq!(flat.director.as_deref(), Some("Anthony Russo"));
        assert_eq!(flat.crew_size, 4);
    }

    #[test]
    fn test_cast_truncated_but_size_untruncated() {
        let cast: Vec<Value> = (0..15)
            .map(|i| json!({"name": format!("Actor {}", i), "order": i}))
            .collect();
        let flat = flatten(
            &raw(json!({"id": 1, "credits": {"cast": cast, "crew": []}})),
            10,
        );

        assert_eq!(flat.cast.len(), 10);
        assert_eq!(flat.cast.first(), Some("Actor 0"));
        assert_eq!(flat.cast.names()[9], "Actor 9");
        assert_eq!(flat.cast_size, 15);
        assert!(flat.cast_size >= flat.cast.len());
    }

    #[test]
    fn test_unnamed_cast_entries_count_toward_size() {
        let flat = flatten(
            &raw(json!({"id": 1, "credits": {"cast": [{"name": "B"}, {"character": "X"}, 5]}})),
            10,
        );
        assert_eq!(flat.cast.names(), &["B"]);
        assert_eq!(flat.cast_size, 3);
    }

    #[test]
    fn test_scalars_pass_through_in_source_units() {
        let flat = flatten(
            &raw(json!({
                "id": 100,
                "title": "Scenario",
                "budget": 0,
                "revenue": 50000000,
                "release_date": "2019-04-24",
                "vote_count": 12000
            })),
            10,
        );
        assert_eq!(flat.id, Some(100));
        assert_eq!(flat.title.as_deref(), Some("Scenario"));
        assert_eq!(flat.budget, Some(0.0));
        assert_eq!(flat.revenue, Some(50_000_000.0));
        assert_eq!(flat.release_date.as_deref(), Some("2019-04-24"));
        assert_eq!(flat.vote_count, Some(12000.0));
    }
}
