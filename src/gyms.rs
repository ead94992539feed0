//! Finds practice contests nobody in the camp has seen yet.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::error::JudgeError;
use crate::services::judge_api::{CachePolicy, Contest, ContestType, JudgeApi, StandingsQuery};

/// Five hours, the regional contest format.
pub const GYM_DURATION_SECONDS: u64 = 5 * 60 * 60;
pub const MIN_DIFFICULTY: u8 = 4;

/// ICPC rules, five hours and at least [`MIN_DIFFICULTY`].
pub fn is_candidate(contest: &Contest) -> bool {
    contest.kind == ContestType::ICPC
        && contest.duration_seconds == GYM_DURATION_SECONDS
        && contest.difficulty.is_some_and(|d| d >= MIN_DIFFICULTY)
}

/// Candidate gyms whose standings, unofficial included, contain none of
/// `handles`. Handles are compared case-insensitively.
///
/// A contest whose standings cannot be fetched is logged and skipped.
#[tracing::instrument(skip_all, fields(handles = handles.len()))]
pub async fn find_unseen_gyms(
    api: &dyn JudgeApi,
    handles: &BTreeSet<String>,
    contest_cache: Option<&str>,
) -> Result<Vec<Contest>, JudgeError> {
    let cache = contest_cache.map(CachePolicy::file).unwrap_or_default();
    let candidates: Vec<Contest> = api
        .contest_list(true, cache)
        .await?
        .into_iter()
        .filter(is_candidate)
        .collect();

    let camp: BTreeSet<String> = handles.iter().map(|h| h.to_lowercase()).collect();
    let total = candidates.len();
    let mut unseen = Vec::new();

    for (idx, contest) in candidates.into_iter().enumerate() {
        info!("Processing {}/{}", idx + 1, total);
        let query = StandingsQuery {
            as_manager: true,
            show_unofficial: true,
            ..StandingsQuery::new(contest.id)
        };
        let standings = match api.standings(query, CachePolicy::default()).await {
            Ok(s) => s,
            Err(e) => {
                warn!(contest_id = contest.id, error = %e, "Skipping gym");
                continue;
            }
        };

        let seen = standings
            .rows
            .iter()
            .flat_map(|row| row.party.handles())
            .any(|h| camp.contains(&h.to_lowercase()));
        if !seen {
            info!(contest_id = contest.id, name = %contest.name, "Unseen gym");
            unseen.push(contest);
        }
    }

    Ok(unseen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contest(kind: ContestType, duration: u64, difficulty: Option<u8>) -> Contest {
        Contest {
            id: 100_001,
            name: "Regional".to_string(),
            kind,
            phase: "FINISHED".to_string(),
            frozen: false,
            duration_seconds: duration,
            start_time_seconds: None,
            difficulty,
        }
    }

    #[test]
    fn test_candidate_filter() {
        assert!(is_candidate(&contest(ContestType::ICPC, 18_000, Some(4))));
        assert!(is_candidate(&contest(ContestType::ICPC, 18_000, Some(5))));
        assert!(!is_candidate(&contest(ContestType::ICPC, 18_000, Some(3))));
        assert!(!is_candidate(&contest(ContestType::ICPC, 18_000, None)));
        assert!(!is_candidate(&contest(ContestType::ICPC, 10_800, Some(5))));
        assert!(!is_candidate(&contest(ContestType::IOI, 18_000, Some(5))));
    }
}
