//! Embedded film data and the `film` attribute transform.

use just_core::{Transform, Transformed, Value};
use serde::{Deserialize, Serialize};

const FILMS_JSON: &str = include_str!("../data/films.json");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    pub id: String,
    pub title: String,
    pub director: String,
    pub release_date: String,
    pub rt_score: String,
    pub description: String,
}

pub fn load() -> Result<Vec<Film>, serde_json::Error> {
    serde_json::from_str(FILMS_JSON)
}

/// Stores a film in an attribute as JSON and reads it back as a map value.
pub struct FilmTransform;

impl Transform for FilmTransform {
    fn type_for(&self) -> &str {
        "film"
    }

    fn detect(&self, value: &Value) -> bool {
        value
            .as_map()
            .is_some_and(|film| film.contains_key("id") && film.contains_key("title"))
    }

    fn extract(&self, value: &Value) -> Transformed<Value> {
        value
            .as_str()
            .and_then(|json| serde_json::from_str::<Film>(json).ok())
            .and_then(|film| Value::from_serialize(&film).ok())
            .into()
    }

    fn serialize(&self, value: &Value) -> Transformed<String> {
        serde_json::from_value::<Film>(value.to_json())
            .ok()
            .and_then(|film| serde_json::to_string(&film).ok())
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_films_parse() {
        let films = load().unwrap();
        assert_eq!(films.len(), 4);
        assert_eq!(films[1].title, "My Neighbor Totoro");
    }

    #[test]
    fn film_survives_the_attribute_round_trip() {
        let film = Value::from_serialize(&load().unwrap()[0]).unwrap();
        let transform = FilmTransform;
        assert!(transform.detect(&film));

        let json = transform.serialize(&film).ok().unwrap();
        assert_eq!(transform.extract(&Value::from(json)), Transformed::Valid(film));
    }

    #[test]
    fn malformed_json_is_invalid() {
        let transform = FilmTransform;
        assert!(transform.extract(&Value::from("{\"title\":")).is_invalid());
        assert!(transform.extract(&Value::Null).is_invalid());
        assert!(transform.serialize(&Value::from("Totoro")).is_invalid());
        assert!(!transform.detect(&Value::from("Totoro")));
    }
}
