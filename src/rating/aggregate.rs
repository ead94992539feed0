use std::collections::HashMap;

use serde::Serialize;

use crate::rating::contest::ContestRating;
use crate::rating::utility::top_k_mean;
use crate::registry::Team;

/// Per-contest ratings of every team seen so far.
///
/// Keyed by team fingerprint, so two equal-named teams from different
/// institutes stay apart. Remembers the order teams were first seen in, which
/// breaks ties in the final ordering.
#[derive(Debug, Default, Clone)]
pub struct RatingBook {
    order: Vec<String>,
    teams: HashMap<String, Team>,
    ratings: HashMap<String, Vec<f64>>,
}

impl RatingBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, team: &Team, rating: f64) {
        let key = team.fingerprint();
        if !self.teams.contains_key(&key) {
            self.order.push(key.clone());
            self.teams.insert(key.clone(), team.clone());
        }
        self.ratings.entry(key).or_default().push(rating);
    }

    pub fn add_contest(&mut self, ratings: &[ContestRating<'_>]) {
        for r in ratings {
            self.record(r.team, r.rating);
        }
    }

    pub fn ratings_of(&self, team: &Team) -> &[f64] {
        self.ratings
            .get(&team.fingerprint())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn entries(&self) -> impl Iterator<Item = (&Team, &[f64])> {
        self.order
            .iter()
            .map(|key| (&self.teams[key], self.ratings[key].as_slice()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRating {
    pub team: Team,
    pub rating: f64,
    pub contests: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub qualified: Vec<AggregateRating>,
    pub disqualified: Vec<AggregateRating>,
}

/// Splits teams on `min_contests` and computes their final ratings.
///
/// Qualified teams get the mean of their best `min_contests` ratings.
/// Teams short of the threshold are kept in `disqualified` with the mean of
/// what they have. Both lists are sorted by rating, highest first, with ties
/// left in first-seen order.
pub fn aggregate(book: &RatingBook, min_contests: usize) -> Aggregation {
    let mut out = Aggregation::default();
    for (team, ratings) in book.entries() {
        let entry = AggregateRating {
            team: team.clone(),
            rating: top_k_mean(ratings, min_contests),
            contests: ratings.len(),
        };
        if ratings.len() >= min_contests {
            out.qualified.push(entry);
        } else {
            out.disqualified.push(entry);
        }
    }
    out.qualified.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    out.disqualified.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Member;
    use std::collections::BTreeSet;

    fn team(name: &str, handle: &str) -> Team {
        Team {
            name: name.to_string(),
            institute: "IIT".to_string(),
            members: vec![Member {
                handle: handle.to_string(),
                name: String::new(),
            }],
            alts: BTreeSet::new(),
            emails: BTreeSet::new(),
        }
    }

    fn book(entries: &[(&Team, &[f64])]) -> RatingBook {
        let mut book = RatingBook::new();
        for (team, ratings) in entries {
            for r in *ratings {
                book.record(team, *r);
            }
        }
        book
    }

    #[test]
    fn test_same_name_teams_are_kept_apart() {
        let a = team("Alpha", "a1");
        let b = team("Alpha", "b1");
        let book = book(&[(&a, &[1.0, 2.0][..]), (&b, &[3.0][..])]);
        assert_eq!(book.len(), 2);
        assert_eq!(book.ratings_of(&a), [1.0, 2.0]);
        assert_eq!(book.ratings_of(&b), [3.0]);
    }

    #[test]
    fn test_qualification_boundary() {
        let four = team("Four", "f");
        let five = team("Five", "v");
        let book = book(&[
            (&four, &[100.0, 100.0, 100.0, 100.0][..]),
            (&five, &[10.0, 20.0, 30.0, 40.0, 50.0][..]),
        ]);

        let out = aggregate(&book, 5);
        assert_eq!(out.qualified.len(), 1);
        assert_eq!(out.qualified[0].team, five);
        assert_eq!(out.qualified[0].rating, 30.0);
        assert_eq!(out.disqualified.len(), 1);
        assert_eq!(out.disqualified[0].team, four);
        assert_eq!(out.disqualified[0].contests, 4);
    }

    #[test]
    fn test_extra_contests_are_truncated() {
        let t = team("Seven", "s");
        let book = book(&[(&t, &[10.0, 90.0, 20.0, 80.0, 30.0, 70.0, 5.0][..])]);
        let out = aggregate(&book, 5);
        assert_eq!(out.qualified[0].rating, 58.0);
        assert_eq!(out.qualified[0].contests, 7);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let first = team("First", "x");
        let second = team("Second", "y");
        let top = team("Top", "z");
        let book = book(&[(&first, &[50.0][..]), (&second, &[50.0][..]), (&top, &[90.0][..])]);

        let out = aggregate(&book, 1);
        let names: Vec<_> = out.qualified.iter().map(|r| r.team.name.as_str()).collect();
        assert_eq!(names, vec!["Top", "First", "Second"]);
    }
}
