//! Records returned by the judge API and the trait used to fetch them.
//!
//! Field names follow the judge's camelCase JSON. Optional fields the judge
//! omits for some contest kinds are `Option` or defaulted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::JudgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContestType {
    CF,
    IOI,
    ICPC,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ContestType,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub frozen: bool,
    pub duration_seconds: u64,
    #[serde(default)]
    pub start_time_seconds: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(default)]
    pub contest_id: Option<u64>,
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub rating: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyMember {
    pub handle: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantType {
    Contestant,
    Practice,
    Virtual,
    Manager,
    OutOfCompetition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub contest_id: Option<u64>,
    pub members: Vec<PartyMember>,
    pub participant_type: ParticipantType,
    #[serde(default)]
    pub team_id: Option<u64>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub ghost: bool,
    #[serde(default)]
    pub start_time_seconds: Option<i64>,
}

impl Party {
    pub fn handles(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.handle.as_str()).collect()
    }

    /// Team name when present, otherwise the member handles joined.
    pub fn display_name(&self) -> String {
        match &self.team_name {
            Some(name) => name.clone(),
            None => self.handles().join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResult {
    pub points: f64,
    #[serde(default)]
    pub penalty: Option<i64>,
    #[serde(default)]
    pub rejected_attempt_count: u32,
    #[serde(default)]
    pub best_submission_time_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RanklistRow {
    pub party: Party,
    pub rank: u32,
    pub points: f64,
    pub penalty: i64,
    #[serde(default)]
    pub problem_results: Vec<ProblemResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub contest: Contest,
    pub problems: Vec<Problem>,
    pub rows: Vec<RanklistRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: u64,
    #[serde(default)]
    pub contest_id: Option<u64>,
    pub creation_time_seconds: i64,
    pub relative_time_seconds: i64,
    pub problem: Problem,
    pub author: Party,
    pub programming_language: String,
    #[serde(default)]
    pub verdict: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub handle: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub max_rating: Option<i32>,
    #[serde(default)]
    pub rank: Option<String>,
}

/// Paging and visibility options for a standings request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandingsQuery {
    pub contest_id: u64,
    pub from: u32,
    pub count: u32,
    pub as_manager: bool,
    pub show_unofficial: bool,
}

impl StandingsQuery {
    pub fn new(contest_id: u64) -> Self {
        Self {
            contest_id,
            from: 1,
            count: 40_000,
            as_manager: false,
            show_unofficial: false,
        }
    }
}

/// Where a call may read or write its JSON response on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicy<'a> {
    /// Written after every successful fetch.
    pub output_file: Option<&'a str>,
    /// Read instead of fetching when the file exists.
    pub load_from_file: Option<&'a str>,
}

impl<'a> CachePolicy<'a> {
    /// Read-through and write-through on the same file.
    pub fn file(path: &'a str) -> Self {
        Self {
            output_file: Some(path),
            load_from_file: Some(path),
        }
    }
}

/// Abstraction over the judge's HTTP API.
#[async_trait]
pub trait JudgeApi: Send + Sync {
    async fn standings(
        &self,
        query: StandingsQuery,
        cache: CachePolicy<'_>,
    ) -> Result<Standings, JudgeError>;

    async fn submissions(
        &self,
        contest_id: u64,
        from: u32,
        count: u32,
        cache: CachePolicy<'_>,
    ) -> Result<Vec<Submission>, JudgeError>;

    async fn user_info(&self, handles: &[String]) -> Result<Vec<User>, JudgeError>;

    async fn contest_list(&self, gym: bool, cache: CachePolicy<'_>)
    -> Result<Vec<Contest>, JudgeError>;

    async fn rated_list(&self, active_only: bool, cache: CachePolicy<'_>)
    -> Result<Vec<User>, JudgeError>;
}
