//! Turns one raw registration row into a validated [`Team`].

use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;

use crate::error::{LookupFailure, ValidationError};
use crate::registry::model::{Member, Team};
use crate::registry::rated::RatedHandles;

/// Column headers of the registration form. Member columns repeat once per
/// member, so a header can own several cells in one row.
pub mod headers {
    pub const TEAM: &str = "Team Name";
    pub const INSTITUTE: &str = "Institute";
    pub const ALTS_CSV: &str =
        "Comma separated list of accounts used by members to give Gym contests on CF";
    pub const NAME: &str = "Name";
    pub const HANDLE: &str = "CF Handle";
    pub const EMAIL: &str = "Institute Email";
}

pub const MISSING_REQUIRED: &str = "Required arguments not provided";
pub const LENGTH_MISMATCH: &str = "Mismatch in the number of required fields provided";

/// Checks that a handle exists on the judge.
#[async_trait]
pub trait HandleResolver: Send + Sync {
    async fn resolve(&self, handle: &str) -> Result<(), LookupFailure>;
}

/// The non-blank cells of one row, grouped by (trimmed) column header.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RowFields(HashMap<String, Vec<String>>);

impl RowFields {
    pub fn from_row(headers: &[String], row: &[String]) -> Self {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (header, cell) in headers.iter().zip(row) {
            let cell = cell.trim();
            if !cell.is_empty() {
                fields
                    .entry(header.trim().to_string())
                    .or_default()
                    .push(cell.to_string());
            }
        }
        Self(fields)
    }

    pub fn values(&self, header: &str) -> &[String] {
        self.0.get(header).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first(&self, header: &str) -> Option<&str> {
        self.values(header).first().map(String::as_str)
    }

    /// Alternate accounts: the first alternates cell split on commas.
    pub fn alts(&self) -> Vec<String> {
        self.first(headers::ALTS_CSV)
            .map(|csv| {
                csv.split(',')
                    .map(str::trim)
                    .filter(|alt| !alt.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Validates `fields` and builds the team, or reports every problem found.
///
/// Handles present in `rated` are trusted without a lookup. Each remaining
/// handle, alternates included, is checked once through `resolver`.
pub async fn construct_team(
    row: usize,
    fields: &RowFields,
    resolver: &dyn HandleResolver,
    rated: &RatedHandles,
) -> Result<Team, ValidationError> {
    let mut reasons = Vec::new();

    let names = fields.values(headers::NAME);
    let handles = fields.values(headers::HANDLE);
    let emails = fields.values(headers::EMAIL);
    let alts = fields.alts();

    let required = [headers::TEAM, headers::INSTITUTE, headers::NAME, headers::HANDLE];
    if required.iter().any(|h| fields.values(h).is_empty()) {
        reasons.push(MISSING_REQUIRED.to_string());
    }

    if names.len() != handles.len() || handles.len() != emails.len() {
        reasons.push(LENGTH_MISMATCH.to_string());
    }

    let mut checked = HashSet::new();
    for handle in handles.iter().chain(alts.iter()) {
        if !checked.insert(handle.to_lowercase()) || rated.contains(handle) {
            continue;
        }
        if let Err(failure) = resolver.resolve(handle).await {
            reasons.push(failure.0);
        }
    }

    let team = fields.first(headers::TEAM).unwrap_or_default().to_string();
    let institute = fields.first(headers::INSTITUTE).unwrap_or_default().to_string();

    if !reasons.is_empty() {
        return Err(ValidationError {
            row,
            institute,
            team,
            reasons,
        });
    }

    let members = names
        .iter()
        .zip(handles)
        .map(|(name, handle)| Member {
            handle: handle.clone(),
            name: name.clone(),
        })
        .collect();

    Ok(Team {
        name: team,
        institute,
        members,
        alts: alts.into_iter().collect::<BTreeSet<_>>(),
        emails: emails.iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::judge_api::User;

    struct KnownHandles(Vec<&'static str>);

    #[async_trait]
    impl HandleResolver for KnownHandles {
        async fn resolve(&self, handle: &str) -> Result<(), LookupFailure> {
            if self.0.iter().any(|h| h.eq_ignore_ascii_case(handle)) {
                Ok(())
            } else {
                Err(LookupFailure(format!(
                    "handles: User with handle {handle} not found"
                )))
            }
        }
    }

    fn header_row() -> Vec<String> {
        [
            headers::TEAM,
            headers::INSTITUTE,
            headers::ALTS_CSV,
            headers::NAME,
            headers::HANDLE,
            headers::EMAIL,
            headers::NAME,
            headers::HANDLE,
            headers::EMAIL,
        ]
        .iter()
        .map(|h| format!(" {h} "))
        .collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn fields(cells: &[&str]) -> RowFields {
        RowFields::from_row(&header_row(), &row(cells))
    }

    #[test]
    fn test_from_row_groups_repeated_headers() {
        let f = fields(&["Alpha", "IIT", "", "Alice", "alice", "a@x", " Bob ", "bob", "b@x"]);
        assert_eq!(f.values(headers::NAME), ["Alice", "Bob"]);
        assert_eq!(f.values(headers::HANDLE), ["alice", "bob"]);
        assert!(f.values(headers::ALTS_CSV).is_empty());
    }

    #[test]
    fn test_alts_are_split_and_trimmed() {
        let f = fields(&["Alpha", "IIT", " alt1 ,alt2,, ", "Alice", "alice", "a@x"]);
        assert_eq!(f.alts(), vec!["alt1", "alt2"]);
    }

    #[tokio::test]
    async fn test_valid_row_builds_team() {
        let f = fields(&["Alpha", "IIT", "alt1", "Alice", "alice", "a@x", "Bob", "bob", "b@x"]);
        let resolver = KnownHandles(vec!["alice", "bob", "alt1"]);
        let team = construct_team(1, &f, &resolver, &RatedHandles::default())
            .await
            .unwrap();

        assert_eq!(team.name, "Alpha");
        assert_eq!(team.institute, "IIT");
        assert_eq!(team.handles(), vec!["alice", "bob"]);
        assert!(team.alts.contains("alt1"));
        assert_eq!(team.emails.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_institute_is_reported() {
        let f = fields(&["Alpha", "", "", "Alice", "alice", "a@x"]);
        let err = construct_team(3, &f, &KnownHandles(vec!["alice"]), &RatedHandles::default())
            .await
            .unwrap_err();
        assert_eq!(err.row, 3);
        assert_eq!(err.team, "Alpha");
        assert_eq!(err.reasons, vec![MISSING_REQUIRED]);
    }

    #[tokio::test]
    async fn test_length_mismatch_is_reported() {
        let f = fields(&["Alpha", "IIT", "", "Alice", "alice", "", "Bob", "bob", "b@x"]);
        let resolver = KnownHandles(vec!["alice", "bob"]);
        let err = construct_team(1, &f, &resolver, &RatedHandles::default())
            .await
            .unwrap_err();
        assert_eq!(err.reasons, vec![LENGTH_MISMATCH]);
    }

    #[tokio::test]
    async fn test_unknown_alt_is_reported() {
        let f = fields(&["Alpha", "IIT", "ghost", "Alice", "alice", "a@x"]);
        let err = construct_team(1, &f, &KnownHandles(vec!["alice"]), &RatedHandles::default())
            .await
            .unwrap_err();
        assert_eq!(err.reasons.len(), 1);
        assert!(err.reasons[0].contains("ghost"));
    }

    #[tokio::test]
    async fn test_rated_handles_skip_lookup() {
        let f = fields(&["Alpha", "IIT", "", "Alice", "Alice", "a@x"]);
        let rated = RatedHandles::from_users(vec![User {
            handle: "alice".to_string(),
            rating: Some(1900),
            max_rating: Some(2000),
            rank: None,
        }]);
        let team = construct_team(1, &f, &KnownHandles(vec![]), &rated).await;
        assert!(team.is_ok());
    }
}
