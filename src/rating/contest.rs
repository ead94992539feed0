//! Rating of registered teams within a single contest.

use crate::error::RatingError;
use crate::matching::match_team;
use crate::registry::{Registry, Team};
use crate::services::judge_api::RanklistRow;

/// Rating awarded to first place when it also has the top score.
pub const RATING_SCALE: f64 = 3000.0;
/// Contests with fewer registered teams are rated as if this many took part.
pub const MIN_FIELD_SIZE: usize = 50;

/// Normalization constants of one contest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContestScale {
    pub n: usize,
    pub max_solved: f64,
}

impl ContestScale {
    pub fn new(included_rows: usize, max_solved: f64) -> Self {
        Self {
            n: included_rows.max(MIN_FIELD_SIZE),
            max_solved,
        }
    }

    /// `3000 * (n - rank + 1) / n * (points / max_solved)` for a 1-based
    /// group rank. The score ratio is 0 when nobody scored.
    pub fn rating(&self, rank: usize, points: f64) -> f64 {
        let placement = (self.n + 1).saturating_sub(rank) as f64 / self.n as f64;
        let score = if self.max_solved > 0.0 {
            points / self.max_solved
        } else {
            0.0
        };
        RATING_SCALE * placement * score
    }
}

/// A registered team's result in one contest.
#[derive(Debug, Clone, PartialEq)]
pub struct ContestRating<'a> {
    pub team: &'a Team,
    /// 1-based position among registered teams only.
    pub group_rank: usize,
    pub points: f64,
    pub rating: f64,
}

/// Standings rows that belong to a registered team, in standings order.
pub fn registered_rows<'r, 'a>(
    rows: &'r [RanklistRow],
    registry: &'a Registry,
) -> Vec<(&'r RanklistRow, &'a Team)> {
    rows.iter()
        .filter_map(|row| match_team(&row.party, registry).team().map(|team| (row, team)))
        .collect()
}

/// Rates every registered team in one contest's standings.
///
/// `rows` must be in rank order. Unregistered rows are skipped and do not
/// count towards the group rank or the field size.
pub fn rate_contest<'a>(
    contest_id: u64,
    rows: &[RanklistRow],
    registry: &'a Registry,
) -> Result<Vec<ContestRating<'a>>, RatingError> {
    let included = registered_rows(rows, registry);
    let max_solved = included
        .iter()
        .map(|(row, _)| row.points)
        .reduce(f64::max)
        .ok_or(RatingError::EmptyContest { contest_id })?;

    let scale = ContestScale::new(included.len(), max_solved);
    Ok(included
        .into_iter()
        .enumerate()
        .map(|(idx, (row, team))| ContestRating {
            team,
            group_rank: idx + 1,
            points: row.points,
            rating: scale.rating(idx + 1, row.points),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_place_with_top_score() {
        let scale = ContestScale::new(10, 9.0);
        assert_eq!(scale.n, 50);
        assert_eq!(scale.rating(1, 9.0), 3000.0);
    }

    #[test]
    fn test_rating_decreases_with_rank() {
        let scale = ContestScale::new(80, 10.0);
        for rank in 1..80 {
            assert!(scale.rating(rank, 7.0) > scale.rating(rank + 1, 7.0));
        }
    }

    #[test]
    fn test_rating_increases_with_points() {
        let scale = ContestScale::new(50, 10.0);
        for points in 0..10 {
            let p = points as f64;
            assert!(scale.rating(17, p) < scale.rating(17, p + 1.0));
        }
    }

    #[test]
    fn test_zero_top_score_rates_zero() {
        let scale = ContestScale::new(3, 0.0);
        assert_eq!(scale.rating(1, 0.0), 0.0);
    }

    #[test]
    fn test_large_field_uses_actual_size() {
        let scale = ContestScale::new(100, 4.0);
        assert_eq!(scale.n, 100);
        assert!((scale.rating(100, 4.0) - 30.0).abs() < 1e-9);
    }
}
