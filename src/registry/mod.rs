//! Team registry built from the registration sheet.
//!
//! Rows are validated one by one. A bad row lands in [`Registry::error_logs`]
//! and never aborts the load. The validated result can be snapshotted to disk
//! so later runs skip the sheet and every handle lookup.

mod model;
mod rated;
pub mod snapshot;
mod validate;

pub use model::{Member, Team};
pub use rated::RatedHandles;
pub use validate::{
    HandleResolver, LENGTH_MISMATCH, MISSING_REQUIRED, RowFields, construct_team, headers,
};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::error::ValidationError;
use crate::services::sheet_api::SheetSource;

#[derive(Debug, Default, Clone)]
pub struct Registry {
    teams: Vec<Team>,
    error_logs: Vec<ValidationError>,
    by_name: HashMap<String, Vec<usize>>,
}

impl Registry {
    /// Builds the lookup index over already validated teams.
    pub fn from_parts(teams: Vec<Team>, error_logs: Vec<ValidationError>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, team) in teams.iter().enumerate() {
            by_name.entry(team.name.to_lowercase()).or_default().push(idx);
        }
        Self {
            teams,
            error_logs,
            by_name,
        }
    }

    /// Validates every data row of `rows` (first row = headers).
    pub async fn load(
        rows: &[Vec<String>],
        resolver: &dyn HandleResolver,
        rated: &RatedHandles,
    ) -> Self {
        let Some((header_row, data)) = rows.split_first() else {
            warn!("Sheet is empty, registry has no teams");
            return Self::default();
        };
        let headers: Vec<String> = header_row.iter().map(|h| h.trim().to_string()).collect();

        let mut teams = Vec::new();
        let mut error_logs = Vec::new();
        let num_teams = data.len();

        for (idx, row) in data.iter().enumerate() {
            info!("Processing team {}/{}", idx + 1, num_teams);
            let fields = RowFields::from_row(&headers, row);
            match construct_team(idx + 1, &fields, resolver, rated).await {
                Ok(team) => teams.push(team),
                Err(e) => {
                    warn!(row = e.row, team = %e.team, institute = %e.institute, "{e}");
                    error_logs.push(e);
                }
            }
            info!("Errors logged: {}", error_logs.len());
        }

        Self::from_parts(teams, error_logs)
    }

    /// Registry stored at `path`, or `None` when there is no usable snapshot.
    pub fn from_snapshot(path: &Path) -> Result<Option<Self>> {
        let Some((teams, error_logs)) = snapshot::load(path)? else {
            return Ok(None);
        };
        info!(
            teams = teams.len(),
            errors = error_logs.len(),
            "Registry loaded from snapshot"
        );
        Ok(Some(Self::from_parts(teams, error_logs)))
    }

    /// Fetches the sheet, validates it and writes the snapshot when a path is
    /// given. A snapshot that cannot be written only costs the next run time.
    #[tracing::instrument(skip(sheet, resolver, rated))]
    pub async fn load_fresh(
        snapshot_path: Option<&Path>,
        sheet: &dyn SheetSource,
        resolver: &dyn HandleResolver,
        rated: &RatedHandles,
    ) -> Result<Self> {
        let rows = sheet.fetch_all_rows().await?;
        let registry = Self::load(&rows, resolver, rated).await;
        info!(
            teams = registry.teams.len(),
            errors = registry.error_logs.len(),
            "Registry validated"
        );

        if let Some(path) = snapshot_path {
            match snapshot::save(path, &registry.teams, &registry.error_logs) {
                Ok(()) => info!(path = %path.display(), "Registry snapshot written"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Registry snapshot not written")
                }
            }
        }
        Ok(registry)
    }

    /// Loads from `snapshot_path` when it holds a usable snapshot, otherwise
    /// falls back to [`Registry::load_fresh`].
    pub async fn load_cached(
        snapshot_path: Option<&Path>,
        sheet: &dyn SheetSource,
        resolver: &dyn HandleResolver,
        rated: &RatedHandles,
    ) -> Result<Self> {
        if let Some(path) = snapshot_path {
            if let Some(registry) = Self::from_snapshot(path)? {
                return Ok(registry);
            }
        }
        Self::load_fresh(snapshot_path, sheet, resolver, rated).await
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn error_logs(&self) -> &[ValidationError] {
        &self.error_logs
    }

    /// Teams registered under `name`, compared case-insensitively, in sheet order.
    pub fn teams_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Team> + use<'a> {
        self.by_name
            .get(&name.to_lowercase())
            .into_iter()
            .flatten()
            .map(|&idx| &self.teams[idx])
    }

    /// Every member handle and alternate handle across all valid teams.
    pub fn get_all_handles(&self) -> BTreeSet<String> {
        self.handles_where(|_| true)
    }

    pub fn handles_of_institute(&self, institute: &str) -> BTreeSet<String> {
        self.handles_where(|team| team.institute == institute)
    }

    fn handles_where(&self, keep: impl Fn(&Team) -> bool) -> BTreeSet<String> {
        self.teams
            .iter()
            .filter(|team| keep(team))
            .flat_map(|team| {
                team.members
                    .iter()
                    .map(|m| m.handle.clone())
                    .chain(team.alts.iter().cloned())
            })
            .collect()
    }

    /// Contact emails grouped by institute.
    pub fn emails_by_institute(&self) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for team in &self.teams {
            out.entry(team.institute.clone())
                .or_default()
                .extend(team.emails.iter().cloned());
        }
        out
    }
}
