//! Event feed for contest replay and awards tooling.
//!
//! One contest's standings and submissions become a newline-delimited stream
//! of `{type, id, data}` events. Teams are tagged with their region through a
//! [`RegionTable`].

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use chrono::DateTime;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::matching::{RegionTable, fingerprint, resolve_region};
use crate::ranklist::clock;
use crate::services::judge_api::{Party, ParticipantType, Standings, Submission};

pub const DEFAULT_FREEZE_SECONDS: u64 = 60 * 60;
pub const DEFAULT_REGION: &str = "Other";
const PENALTY_MINUTES: u32 = 20;

/// `(id, name, penalty, solved)` for every judgement the feed can emit.
const JUDGEMENT_TYPES: [(&str, &str, bool, bool); 6] = [
    ("AC", "Accepted", false, true),
    ("WA", "Wrong Answer", true, false),
    ("TLE", "Time Limit Exceeded", true, false),
    ("MLE", "Memory Limit Exceeded", true, false),
    ("RTE", "Run-Time Error", true, false),
    ("CE", "Compilation Error", false, false),
];

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub freeze_duration_seconds: u64,
    /// Region for teams missing from the table. Always the first organization.
    pub fallback_region: String,
    pub include_virtual: bool,
    pub include_out_of_comp: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            freeze_duration_seconds: DEFAULT_FREEZE_SECONDS,
            fallback_region: DEFAULT_REGION.to_string(),
            include_virtual: false,
            include_out_of_comp: false,
        }
    }
}

impl FeedConfig {
    fn includes(&self, participant: ParticipantType) -> bool {
        match participant {
            ParticipantType::Contestant => true,
            ParticipantType::Virtual => self.include_virtual,
            ParticipantType::OutOfCompetition => self.include_out_of_comp,
            ParticipantType::Practice | ParticipantType::Manager => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: Option<String>,
    pub data: Value,
}

impl Event {
    fn new(kind: &'static str, id: impl Into<String>, data: Value) -> Self {
        Self {
            kind,
            id: Some(id.into()),
            data,
        }
    }
}

/// Judgement type of a final verdict. `None` while the submission is still
/// being judged.
pub fn judgement_type(verdict: Option<&str>) -> Option<&'static str> {
    match verdict? {
        "TESTING" => None,
        "OK" => Some("AC"),
        "WRONG_ANSWER" => Some("WA"),
        "TIME_LIMIT_EXCEEDED" => Some("TLE"),
        "MEMORY_LIMIT_EXCEEDED" => Some("MLE"),
        "RUNTIME_ERROR" => Some("RTE"),
        "COMPILATION_ERROR" => Some("CE"),
        _ => Some("WA"),
    }
}

/// `H:MM:SS.000`
fn relative_time(seconds: i64) -> String {
    format!("{}.000", clock(seconds))
}

fn absolute_time(epoch_seconds: Option<i64>) -> Value {
    epoch_seconds
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or(Value::Null, |t| Value::String(t.to_rfc3339()))
}

fn language_id(language: &str) -> String {
    language
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn party_key(party: &Party) -> String {
    fingerprint(&party.display_name(), &party.handles())
}

/// Builds the full event stream for one contest.
#[tracing::instrument(skip_all, fields(contest_id = standings.contest.id))]
pub fn generate(
    config: &FeedConfig,
    table: &RegionTable,
    standings: &Standings,
    submissions: &[Submission],
) -> Vec<Event> {
    let contest = &standings.contest;
    let mut events = Vec::new();

    events.push(Event::new(
        "contest",
        contest.id.to_string(),
        json!({
            "id": contest.id.to_string(),
            "name": contest.name,
            "formal_name": contest.name,
            "start_time": absolute_time(contest.start_time_seconds),
            "duration": relative_time(contest.duration_seconds as i64),
            "scoreboard_freeze_duration": relative_time(config.freeze_duration_seconds as i64),
            "penalty_time": PENALTY_MINUTES,
        }),
    ));

    for (id, name, penalty, solved) in JUDGEMENT_TYPES {
        events.push(Event::new(
            "judgement-types",
            id,
            json!({ "id": id, "name": name, "penalty": penalty, "solved": solved }),
        ));
    }

    let rows: Vec<_> = standings
        .rows
        .iter()
        .filter(|row| config.includes(row.party.participant_type))
        .collect();
    let mut team_ids: HashMap<String, String> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        team_ids
            .entry(party_key(&row.party))
            .or_insert_with(|| (idx + 1).to_string());
    }

    let accepted: Vec<(&Submission, &str)> = submissions
        .iter()
        .filter(|s| config.includes(s.author.participant_type))
        .filter(|s| (0..=contest.duration_seconds as i64).contains(&s.relative_time_seconds))
        .filter_map(|s| team_ids.get(&party_key(&s.author)).map(|id| (s, id.as_str())))
        .collect();

    let languages: BTreeSet<&str> = accepted
        .iter()
        .map(|(s, _)| s.programming_language.as_str())
        .collect();
    for language in languages {
        let id = language_id(language);
        events.push(Event::new(
            "languages",
            id.clone(),
            json!({ "id": id, "name": language }),
        ));
    }

    let regions = table.regions(&config.fallback_region);
    for (idx, region) in regions.iter().enumerate() {
        events.push(Event::new(
            "organizations",
            idx.to_string(),
            json!({ "id": idx.to_string(), "name": region, "formal_name": region }),
        ));
    }

    for (ordinal, problem) in standings.problems.iter().enumerate() {
        events.push(Event::new(
            "problems",
            problem.index.clone(),
            json!({
                "id": problem.index,
                "label": problem.index,
                "name": problem.name,
                "ordinal": ordinal,
                "test_data_count": 1,
            }),
        ));
    }

    for row in &rows {
        let Some(id) = team_ids.get(&party_key(&row.party)) else {
            continue;
        };
        let region = resolve_region(&row.party, table, &config.fallback_region);
        let organization = regions.iter().position(|r| *r == region).unwrap_or(0);
        events.push(Event::new(
            "teams",
            id.clone(),
            json!({
                "id": id,
                "name": row.party.display_name(),
                "organization_id": organization.to_string(),
                "members": row.party.handles(),
            }),
        ));
    }

    for (submission, team_id) in &accepted {
        events.push(Event::new(
            "submissions",
            submission.id.to_string(),
            json!({
                "id": submission.id.to_string(),
                "language_id": language_id(&submission.programming_language),
                "problem_id": submission.problem.index,
                "team_id": team_id,
                "time": absolute_time(Some(submission.creation_time_seconds)),
                "contest_time": relative_time(submission.relative_time_seconds),
            }),
        ));
    }

    for (submission, _) in &accepted {
        let Some(kind) = judgement_type(submission.verdict.as_deref()) else {
            continue;
        };
        let at = relative_time(submission.relative_time_seconds);
        events.push(Event::new(
            "judgements",
            submission.id.to_string(),
            json!({
                "id": submission.id.to_string(),
                "submission_id": submission.id.to_string(),
                "judgement_type_id": kind,
                "start_contest_time": at,
                "end_contest_time": at,
            }),
        ));
    }

    let start = contest.start_time_seconds;
    let end = start.map(|s| s + contest.duration_seconds as i64);
    let frozen = end.map(|e| e - config.freeze_duration_seconds as i64);
    events.push(Event {
        kind: "state",
        id: None,
        data: json!({
            "started": absolute_time(start),
            "frozen": absolute_time(frozen),
            "ended": absolute_time(end),
            "thawed": Value::Null,
            "finalized": absolute_time(end),
            "end_of_updates": Value::Null,
        }),
    });

    debug!(
        teams = rows.len(),
        submissions = accepted.len(),
        events = events.len(),
        "Feed generated"
    );
    events
}

/// Writes one JSON event per line, gzip-compressed when the path ends in `.gz`.
pub fn write_events(path: &Path, events: &[Event]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(path)?);

    if path.extension().is_some_and(|ext| ext == "gz") {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_lines(&mut encoder, events)?;
        encoder.finish()?.flush()?;
    } else {
        let mut file = file;
        write_lines(&mut file, events)?;
        file.flush()?;
    }

    info!(path = %path.display(), events = events.len(), "Feed written");
    Ok(())
}

fn write_lines<W: Write>(out: &mut W, events: &[Event]) -> Result<()> {
    for event in events {
        serde_json::to_writer(&mut *out, event)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
