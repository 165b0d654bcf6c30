//! Puzzle validation
//!
//! Turns the generator's raw JSON payload into a well-formed [`Puzzle`]: four categories of
//! four uppercase words, sixteen unique words overall, sorted by difficulty.

use crate::types::{Category, Difficulty, Puzzle, Word, CATEGORY_COUNT, GROUP_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Raw puzzle as produced by a generator. Every field is optional so that a missing field
/// is reported as a shape problem instead of a JSON error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPuzzle {
    #[serde(default)]
    pub categories: Option<Vec<RawCategory>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub name: Option<String>,
    /// Kept loose: anything other than an integer lands in the unranked tier
    #[serde(default)]
    pub difficulty: Option<serde_json::Value>,
    #[serde(default)]
    pub words: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid puzzle format: {0}")]
    Shape(String),

    #[error("Duplicate word detected: {0}")]
    DuplicateWord(String),
}

/// Validate and normalize a raw puzzle
pub fn validate(raw: &RawPuzzle) -> Result<Puzzle, ValidationError> {
    let raw_categories = raw
        .categories
        .as_ref()
        .ok_or_else(|| ValidationError::Shape("missing categories".to_string()))?;

    if raw_categories.len() != CATEGORY_COUNT {
        return Err(ValidationError::Shape(format!(
            "expected {} categories, got {}",
            CATEGORY_COUNT,
            raw_categories.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut categories = Vec::with_capacity(CATEGORY_COUNT);

    for (index, raw_category) in raw_categories.iter().enumerate() {
        let name = raw_category
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ValidationError::Shape(format!("category {} has no name", index)))?;

        let difficulty = raw_category
            .difficulty
            .as_ref()
            .filter(|d| !d.is_null())
            .map(|d| d.as_i64().map_or(Difficulty::UNRANKED, Difficulty))
            .ok_or_else(|| {
                ValidationError::Shape(format!("category '{}' has no difficulty", name))
            })?;

        let raw_words = raw_category.words.as_deref().unwrap_or_default();
        if raw_words.len() != GROUP_SIZE {
            return Err(ValidationError::Shape(format!(
                "category '{}' has {} words, expected {}",
                name,
                raw_words.len(),
                GROUP_SIZE
            )));
        }

        let words: Vec<Word> = raw_words.iter().map(|w| Word::new(w)).collect();
        if words.iter().any(Word::is_blank) {
            return Err(ValidationError::Shape(format!(
                "category '{}' contains a blank word",
                name
            )));
        }
        for word in &words {
            if !seen.insert(word.clone()) {
                return Err(ValidationError::DuplicateWord(word.to_string()));
            }
        }

        let words: [Word; GROUP_SIZE] = words
            .try_into()
            .map_err(|_| ValidationError::Shape(format!("category '{}' is malformed", name)))?;

        categories.push(Category {
            id: 0,
            name: name.to_string(),
            difficulty,
            words,
        });
    }

    // Stable sort keeps generator order among equal difficulties
    categories.sort_by_key(|c| c.difficulty);
    for (id, category) in categories.iter_mut().enumerate() {
        category.id = id;
    }

    Ok(Puzzle { categories })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::Tier;

    pub(crate) fn raw(categories: &[(&str, i64, [&str; 4])]) -> RawPuzzle {
        RawPuzzle {
            categories: Some(
                categories
                    .iter()
                    .map(|(name, difficulty, words)| RawCategory {
                        name: Some(name.to_string()),
                        difficulty: Some((*difficulty).into()),
                        words: Some(words.iter().map(|w| w.to_string()).collect()),
                    })
                    .collect(),
            ),
        }
    }

    /// The four-group puzzle used across the test suite
    pub(crate) fn sample_raw() -> RawPuzzle {
        raw(&[
            ("FRUIT", 1, ["apple", "pear", "plum", "kiwi"]),
            ("CARS", 2, ["ford", "audi", "fiat", "opel"]),
            ("BIRDS", 3, ["crow", "wren", "owl", "jay"]),
            ("METAL", 4, ["iron", "gold", "tin", "lead"]),
        ])
    }

    pub(crate) fn sample_puzzle() -> Puzzle {
        validate(&sample_raw()).expect("sample puzzle is valid")
    }

    #[test]
    fn test_validate_normalizes_words() {
        let puzzle = sample_puzzle();
        assert_eq!(puzzle.categories().len(), 4);
        assert_eq!(puzzle.words().count(), 16);
        assert!(puzzle
            .words()
            .all(|w| w.as_str() == w.as_str().to_uppercase()));
        assert_eq!(puzzle.categories()[0].words[0], Word::new("APPLE"));
    }

    #[test]
    fn test_validate_sorts_by_difficulty_stably() {
        let puzzle = validate(&raw(&[
            ("D", 4, ["a", "b", "c", "d"]),
            ("B1", 2, ["e", "f", "g", "h"]),
            ("A", 1, ["i", "j", "k", "l"]),
            ("B2", 2, ["m", "n", "o", "p"]),
        ]))
        .unwrap();

        let names: Vec<_> = puzzle.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B1", "B2", "D"]);
        let ids: Vec<_> = puzzle.categories().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_validate_keeps_category_names() {
        let puzzle = validate(&raw(&[
            ("Things in a Bank", 1, ["a", "b", "c", "d"]),
            ("b", 2, ["e", "f", "g", "h"]),
            ("c", 3, ["i", "j", "k", "l"]),
            ("d", 4, ["m", "n", "o", "p"]),
        ]))
        .unwrap();
        assert_eq!(puzzle.categories()[0].name, "Things in a Bank");
    }

    #[test]
    fn test_validate_rejects_wrong_category_count() {
        let mut puzzle = sample_raw();
        puzzle.categories.as_mut().unwrap().pop();
        assert!(matches!(validate(&puzzle), Err(ValidationError::Shape(_))));

        assert!(matches!(
            validate(&RawPuzzle::default()),
            Err(ValidationError::Shape(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_category_shape() {
        let mut no_name = sample_raw();
        no_name.categories.as_mut().unwrap()[1].name = Some("   ".to_string());
        assert!(matches!(validate(&no_name), Err(ValidationError::Shape(_))));

        let mut no_difficulty = sample_raw();
        no_difficulty.categories.as_mut().unwrap()[2].difficulty = None;
        assert!(matches!(
            validate(&no_difficulty),
            Err(ValidationError::Shape(_))
        ));

        let mut null_difficulty = sample_raw();
        null_difficulty.categories.as_mut().unwrap()[2].difficulty =
            Some(serde_json::Value::Null);
        assert!(matches!(
            validate(&null_difficulty),
            Err(ValidationError::Shape(_))
        ));

        let mut three_words = sample_raw();
        three_words.categories.as_mut().unwrap()[0]
            .words
            .as_mut()
            .unwrap()
            .pop();
        assert!(matches!(
            validate(&three_words),
            Err(ValidationError::Shape(_))
        ));
    }

    #[test]
    fn test_validate_rejects_case_insensitive_duplicates() {
        let result = validate(&raw(&[
            ("A", 1, ["apple", "b", "c", "d"]),
            ("B", 2, ["e", "f", "g", "h"]),
            ("C", 3, ["i", " APPLE ", "k", "l"]),
            ("D", 4, ["m", "n", "o", "p"]),
        ]));
        assert_eq!(
            result,
            Err(ValidationError::DuplicateWord("APPLE".to_string()))
        );
    }

    #[test]
    fn test_validate_accepts_unknown_difficulty() {
        let puzzle = validate(&raw(&[
            ("A", 1, ["a", "b", "c", "d"]),
            ("B", 2, ["e", "f", "g", "h"]),
            ("C", 3, ["i", "j", "k", "l"]),
            ("Z", 9, ["m", "n", "o", "p"]),
        ]))
        .unwrap();
        assert_eq!(puzzle.categories()[3].tier(), Tier::Unranked);
    }

    #[test]
    fn test_validate_ranks_string_difficulty_last() {
        let mut puzzle = sample_raw();
        puzzle.categories.as_mut().unwrap()[0].difficulty = Some(serde_json::json!("expert"));
        let puzzle = validate(&puzzle).unwrap();

        let names: Vec<_> = puzzle.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["CARS", "BIRDS", "METAL", "FRUIT"]);
        assert_eq!(puzzle.categories()[3].tier(), Tier::Unranked);
        assert_eq!(puzzle.categories()[3].id, 3);
    }

    #[test]
    fn test_validate_ranks_float_difficulty_last() {
        let json = r#"{"categories": [
            {"name": "A", "difficulty": 4.0, "words": ["a", "b", "c", "d"]},
            {"name": "B", "difficulty": 1, "words": ["e", "f", "g", "h"]},
            {"name": "C", "difficulty": 2, "words": ["i", "j", "k", "l"]},
            {"name": "D", "difficulty": "4", "words": ["m", "n", "o", "p"]}
        ]}"#;
        let raw: RawPuzzle = serde_json::from_str(json).unwrap();
        let puzzle = validate(&raw).unwrap();

        let names: Vec<_> = puzzle.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A", "D"]);
        assert_eq!(puzzle.categories()[2].tier(), Tier::Unranked);
        assert_eq!(puzzle.categories()[3].tier(), Tier::Unranked);
    }

    #[test]
    fn test_raw_puzzle_deserializes_generator_json() {
        let json = r#"{"categories": [{"name": "X", "difficulty": 1, "words": ["A"]}, {"name": "Y"}]}"#;
        let raw: RawPuzzle = serde_json::from_str(json).unwrap();
        let categories = raw.categories.as_ref().unwrap();
        assert_eq!(categories.len(), 2);
        assert!(categories[1].words.is_none());
        assert!(matches!(validate(&raw), Err(ValidationError::Shape(_))));
    }
}
