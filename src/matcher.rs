//! Match evaluation for a four-word selection

use crate::types::{Category, CategoryId, Word, GROUP_SIZE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum MatchVerdict {
    /// The selection is exactly the words of this category
    Exact(CategoryId),
    /// "One away": some unsolved category shares three of the four words
    Close,
    Miss,
}

/// Decide how a selection relates to the unsolved categories.
///
/// Words are globally unique, so at most one category can match exactly. A selection that is
/// not exactly four words is always a miss.
pub fn evaluate<'a, I>(unsolved: I, selection: &[Word]) -> MatchVerdict
where
    I: IntoIterator<Item = &'a Category>,
{
    if selection.len() != GROUP_SIZE {
        return MatchVerdict::Miss;
    }

    let mut close = false;
    for category in unsolved {
        let shared = category
            .words
            .iter()
            .filter(|w| selection.contains(w))
            .count();
        if shared == GROUP_SIZE {
            return MatchVerdict::Exact(category.id);
        }
        if shared == GROUP_SIZE - 1 {
            close = true;
        }
    }

    if close {
        MatchVerdict::Close
    } else {
        MatchVerdict::Miss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::tests::sample_puzzle;

    fn words(list: &[&str]) -> Vec<Word> {
        list.iter().map(|w| Word::new(w)).collect()
    }

    #[test]
    fn test_exact_match_ignores_order() {
        let puzzle = sample_puzzle();
        let verdict = evaluate(
            puzzle.categories(),
            &words(&["kiwi", "plum", "apple", "pear"]),
        );
        assert_eq!(verdict, MatchVerdict::Exact(0));
    }

    #[test]
    fn test_one_away() {
        let puzzle = sample_puzzle();
        let verdict = evaluate(
            puzzle.categories(),
            &words(&["apple", "pear", "plum", "ford"]),
        );
        assert_eq!(verdict, MatchVerdict::Close);
    }

    #[test]
    fn test_one_from_each_group_is_a_miss() {
        let puzzle = sample_puzzle();
        let verdict = evaluate(
            puzzle.categories(),
            &words(&["apple", "ford", "crow", "iron"]),
        );
        assert_eq!(verdict, MatchVerdict::Miss);
    }

    #[test]
    fn test_solved_categories_are_not_considered() {
        let puzzle = sample_puzzle();
        let unsolved = puzzle.categories().iter().filter(|c| c.id != 0);
        let verdict = evaluate(unsolved, &words(&["apple", "pear", "plum", "kiwi"]));
        assert_eq!(verdict, MatchVerdict::Miss);
    }

    #[test]
    fn test_short_selection_never_matches() {
        let puzzle = sample_puzzle();
        let verdict = evaluate(puzzle.categories(), &words(&["apple", "pear", "plum"]));
        assert_eq!(verdict, MatchVerdict::Miss);
    }
}
