//! Institute-scoped ranklist report for one contest.
//!
//! Only registered teams appear. Ranks, medals and ratings are computed
//! within that group, not from the judge's global standings.

pub mod medal;
pub mod table;

use std::collections::HashSet;

use crate::error::RatingError;
use crate::rating::{rate_contest, registered_rows};
use crate::registry::Registry;
use crate::services::judge_api::{ProblemResult, Standings};

use medal::rank_label;
use table::{bold, center, tag};

#[derive(Debug, Clone, PartialEq)]
pub struct FirstSolve {
    pub problem: String,
    pub time_seconds: i64,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RanklistEntry {
    pub group_rank: usize,
    pub team_name: String,
    pub handles: Vec<String>,
    pub institute: String,
    pub rating: f64,
    pub points: f64,
    pub penalty: i64,
    pub results: Vec<ProblemResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub contest_name: String,
    pub problems: Vec<String>,
    /// First team of each institute in rank order, as (institute, team).
    pub champions: Vec<(String, String)>,
    /// Earliest accepted solution per problem, in problem order.
    pub first_solves: Vec<FirstSolve>,
    pub entries: Vec<RanklistEntry>,
}

pub fn build_report(standings: &Standings, registry: &Registry) -> Result<Report, RatingError> {
    let ratings = rate_contest(standings.contest.id, &standings.rows, registry)?;
    let rows = registered_rows(&standings.rows, registry);
    let problems: Vec<String> = standings.problems.iter().map(|p| p.index.clone()).collect();

    let mut entries = Vec::with_capacity(rows.len());
    let mut champions = Vec::new();
    let mut seen_institutes = HashSet::new();
    let mut first_solves: Vec<Option<FirstSolve>> = vec![None; problems.len()];

    for ((row, team), rated) in rows.into_iter().zip(ratings) {
        let team_name = row.party.team_name.clone().unwrap_or_default();

        if seen_institutes.insert(team.institute.clone()) {
            champions.push((team.institute.clone(), team_name.clone()));
        }

        for (idx, result) in row.problem_results.iter().enumerate() {
            if result.points <= 0.0 || idx >= problems.len() {
                continue;
            }
            let time_seconds = result.best_submission_time_seconds.unwrap_or_default();
            let slot = &mut first_solves[idx];
            if slot.as_ref().is_none_or(|best| best.time_seconds > time_seconds) {
                *slot = Some(FirstSolve {
                    problem: problems[idx].clone(),
                    time_seconds,
                    team: team_name.clone(),
                });
            }
        }

        entries.push(RanklistEntry {
            group_rank: rated.group_rank,
            team_name,
            handles: row.party.handles().into_iter().map(str::to_string).collect(),
            institute: team.institute.clone(),
            rating: rated.rating,
            points: row.points,
            penalty: row.penalty,
            results: row.problem_results.clone(),
        });
    }

    Ok(Report {
        contest_name: standings.contest.name.clone(),
        problems,
        champions,
        first_solves: first_solves.into_iter().flatten().collect(),
        entries,
    })
}

/// `H:MM:SS`, hours unpadded.
pub fn clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

/// `+k` accepted after k rejections with the solve time, `-k` only rejected,
/// blank when untouched.
pub fn problem_cell(result: &ProblemResult) -> String {
    let attempts = match result.rejected_attempt_count {
        0 => String::new(),
        n => n.to_string(),
    };
    if result.points > 0.0 {
        let time = clock(result.best_submission_time_seconds.unwrap_or_default());
        format!(
            "{}<br>{time}",
            tag(&format!("+{attempts}"), "span", &[("class", "problem-ac")])
        )
    } else if result.rejected_attempt_count > 0 {
        tag(&format!("-{attempts}"), "span", &[("class", "problem-wa")])
    } else {
        String::new()
    }
}

fn team_cell(entry: &RanklistEntry) -> String {
    format!(
        "{}: {}",
        tag(&entry.team_name, "span", &[("class", "team-name")]),
        entry.handles.join(", ")
    )
}

fn team_name_cell(name: &str) -> String {
    center(&tag(name, "span", &[("class", "team-name")]))
}

/// Awards section followed by the full ranklist.
pub fn render_markdown(report: &Report) -> String {
    let champions: Vec<Vec<String>> = report
        .champions
        .iter()
        .map(|(institute, team)| vec![center(institute), team_name_cell(team)])
        .collect();

    let first_solves: Vec<Vec<String>> = report
        .first_solves
        .iter()
        .map(|fs| {
            vec![
                center(&fs.problem),
                center(&clock(fs.time_seconds)),
                team_name_cell(&fs.team),
            ]
        })
        .collect();

    let mut headers: Vec<String> = ["#", "Team", "Representing", "Rating", "=", "Penalty"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    headers.extend(report.problems.iter().cloned());

    let ranklist: Vec<Vec<String>> = report
        .entries
        .iter()
        .map(|entry| {
            let mut cells = vec![
                center(&rank_label(entry.group_rank)),
                team_cell(entry),
                center(&entry.institute),
                center(&bold(&format!("{:.2}", entry.rating))),
                center(&format!("{}", entry.points.round() as i64)),
                center(&entry.penalty.to_string()),
            ];
            cells.extend(entry.results.iter().map(|r| center(&problem_cell(r))));
            cells
        })
        .collect();

    let strings = |hs: &[&str]| hs.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    format!(
        "# Awards\n\n## Regional Champions\n\n{}\n\n## First Solves\n\n{}\n\n# Ranklist\n\n{}\n",
        table::render(&strings(&["Region", "Team"]), &champions),
        table::render(&strings(&["Problem", "Solve Time", "Team"]), &first_solves),
        table::render(&headers, &ranklist),
    )
}

/// Output file name for a report: the contest name with spaces as dashes.
pub fn report_file_name(contest_name: &str) -> String {
    contest_name.replace(' ', "-")
}
