//! Per-user score aggregation.

use crate::error::{LadderError, Result};
use crate::types::{AwardedEvent, User, UserScore};
use std::collections::HashMap;

/// Sum windowed awards per user over the full registered population.
///
/// Left-join semantics: every user in `users` gets exactly one score, zero
/// if nothing of theirs is in `awards`. Awards for unregistered users are
/// dropped. Output keeps the order of `users`.
pub fn aggregate_scores<'a, I>(awards: I, users: &[User]) -> Result<Vec<UserScore>>
where
    I: IntoIterator<Item = &'a AwardedEvent>,
{
    let mut sums: HashMap<&str, u64> = users.iter().map(|u| (u.user_id.as_str(), 0)).collect();

    for award in awards {
        if let Some(sum) = sums.get_mut(award.user_id()) {
            *sum = sum
                .checked_add(award.score())
                .ok_or_else(|| LadderError::score_overflow(award.user_id()))?;
        }
    }

    Ok(users
        .iter()
        .map(|user| UserScore {
            user: user.clone(),
            score: sums.get(user.user_id.as_str()).copied().unwrap_or(0),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::award::dedupe_awards;
    use crate::types::NewPlayEvent;

    #[test]
    fn test_every_user_gets_a_score() {
        let users = vec![User::new("a", 1), User::new("b", 2), User::new("c", 3)];
        let events = vec![
            NewPlayEvent::new("a", "g1", "easy", 10, 1).into_event(1),
            NewPlayEvent::new("a", "g2", "easy", 5, 2).into_event(2),
            NewPlayEvent::new("c", "g1", "easy", 1, 3).into_event(3),
            NewPlayEvent::new("ghost", "g1", "easy", 100, 4).into_event(4),
        ];
        let awards = dedupe_awards(&events);
        let scores = aggregate_scores(&awards, &users).unwrap();

        let totals: Vec<(&str, u64)> = scores
            .iter()
            .map(|s| (s.user.user_id.as_str(), s.score))
            .collect();
        assert_eq!(totals, vec![("a", 15), ("b", 0), ("c", 1)]);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let users = vec![User::new("a", 1)];
        let events = vec![
            NewPlayEvent::new("a", "g1", "easy", u64::MAX, 1).into_event(1),
            NewPlayEvent::new("a", "g2", "easy", 1, 2).into_event(2),
        ];
        let awards = dedupe_awards(&events);

        let err = aggregate_scores(&awards, &users).unwrap_err();
        assert!(matches!(err, LadderError::ScoreOverflow { ref user_id } if user_id == "a"));
    }

    #[test]
    fn test_empty_population() {
        let scores = aggregate_scores(std::iter::empty::<&AwardedEvent>(), &[]).unwrap();
        assert!(scores.is_empty());
    }
}
