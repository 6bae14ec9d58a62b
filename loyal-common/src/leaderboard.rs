//! Leaderboard ranked by vote differential

use serde::Serialize;
use std::cmp::Reverse;

use crate::model::{Gender, Person};

/// Number of entries shown
pub const LEADERBOARD_SIZE: usize = 20;

/// Top entries by descending score
///
/// Stable sort keyed only on score, so ties keep their input order and
/// ranking an already ranked list returns it unchanged.
pub fn top(people: &[Person]) -> Vec<&Person> {
    let mut ranked: Vec<&Person> = people.iter().collect();
    ranked.sort_by_key(|p| Reverse(p.score()));
    ranked.truncate(LEADERBOARD_SIZE);
    ranked
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub area: String,
    pub score: i64,
}

/// [`top`] with ranks attached
pub fn entries(people: &[Person]) -> Vec<LeaderboardEntry> {
    top(people)
        .into_iter()
        .enumerate()
        .map(|(i, p)| LeaderboardEntry {
            rank: i + 1,
            id: p.id.clone(),
            name: p.name.clone(),
            gender: p.gender,
            area: p.area.clone(),
            score: p.score(),
        })
        .collect()
}
