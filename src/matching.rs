//! Joining judge-side parties to registered teams.
//!
//! Team names are typed by hand on both sides, so they collide and drift.
//! A party is matched to a registered team only when the names agree
//! (ignoring case) and at least one member handle is shared.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;

use crate::registry::{Registry, Team};
use crate::services::judge_api::{Party, RanklistRow};

const SEPARATOR: char = '#';

/// Team name, then each member handle in sorted order, each followed by `#`.
///
/// Sorting makes the key independent of the order the handles were recorded
/// in, which differs between the sheet and the judge.
pub fn fingerprint<S: AsRef<str>>(team_name: &str, handles: &[S]) -> String {
    let mut sorted: Vec<&str> = handles.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut key = String::from(team_name);
    key.push(SEPARATOR);
    for handle in sorted {
        key.push_str(handle);
        key.push(SEPARATOR);
    }
    key
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome<'a> {
    Matched(&'a Team),
    Unregistered,
}

impl<'a> MatchOutcome<'a> {
    pub fn team(self) -> Option<&'a Team> {
        match self {
            MatchOutcome::Matched(team) => Some(team),
            MatchOutcome::Unregistered => None,
        }
    }
}

/// Finds the registered team behind a party.
///
/// Among teams sharing the party's name, the first in registration order
/// with an overlapping member handle wins. Parties without a team name are
/// always unregistered.
pub fn match_team<'a>(party: &Party, registry: &'a Registry) -> MatchOutcome<'a> {
    let Some(name) = party.team_name.as_deref() else {
        return MatchOutcome::Unregistered;
    };
    let handles = party.handles();
    registry
        .teams_named(name)
        .find(|team| team.shares_member_with(&handles))
        .map_or(MatchOutcome::Unregistered, MatchOutcome::Matched)
}

/// Fingerprint to region lookup, built once and read-only afterwards.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RegionTable {
    regions: HashMap<String, String>,
}

impl RegionTable {
    /// Every registered party in `rows` mapped to its team's institute.
    ///
    /// Keyed by the party's own name and handles as the judge reports them,
    /// so [`resolve_region`] agrees with [`match_team`] even when the sheet
    /// spells a name or handle with different case.
    pub fn from_standings(rows: &[RanklistRow], registry: &Registry) -> Self {
        let regions = rows
            .iter()
            .filter_map(|row| {
                let team = match_team(&row.party, registry).team()?;
                Some((party_fingerprint(&row.party), team.institute.clone()))
            })
            .collect();
        Self { regions }
    }

    /// Accepts keys of the form `name#h1#h2#...#` in any handle order and
    /// re-normalizes them through [`fingerprint`].
    pub fn from_raw(raw: HashMap<String, String>) -> Self {
        let regions = raw
            .into_iter()
            .map(|(key, region)| {
                let mut words: Vec<&str> = key.split(SEPARATOR).collect();
                if key.ends_with(SEPARATOR) {
                    words.pop();
                }
                let (name, handles) = words.split_first().map_or(("", &[][..]), |(n, h)| (*n, h));
                (fingerprint(name, handles), region)
            })
            .collect();
        Self { regions }
    }

    /// Loads a JSON object of raw keys to regions, see [`RegionTable::from_raw`].
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: HashMap<String, String> = serde_json::from_str(&content)?;
        Ok(Self::from_raw(raw))
    }

    pub fn get(&self, fingerprint: &str) -> Option<&str> {
        self.regions.get(fingerprint).map(String::as_str)
    }

    /// `fallback` followed by every distinct region, sorted.
    pub fn regions(&self, fallback: &str) -> Vec<String> {
        let distinct: BTreeSet<&str> = self
            .regions
            .values()
            .map(String::as_str)
            .filter(|r| *r != fallback)
            .collect();
        std::iter::once(fallback)
            .chain(distinct)
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn party_fingerprint(party: &Party) -> String {
    fingerprint(party.team_name.as_deref().unwrap_or_default(), &party.handles())
}

/// Region of a party by its fingerprint, or `fallback` when unknown.
pub fn resolve_region(party: &Party, table: &RegionTable, fallback: &str) -> String {
    table.get(&party_fingerprint(party)).unwrap_or(fallback).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Member;
    use crate::services::judge_api::{ParticipantType, PartyMember};
    use std::collections::BTreeSet;

    fn team(name: &str, institute: &str, handles: &[&str]) -> Team {
        Team {
            name: name.to_string(),
            institute: institute.to_string(),
            members: handles
                .iter()
                .map(|h| Member {
                    handle: h.to_string(),
                    name: String::new(),
                })
                .collect(),
            alts: BTreeSet::new(),
            emails: BTreeSet::new(),
        }
    }

    fn party(name: Option<&str>, handles: &[&str]) -> Party {
        Party {
            contest_id: None,
            members: handles
                .iter()
                .map(|h| PartyMember {
                    handle: h.to_string(),
                    name: None,
                })
                .collect(),
            participant_type: ParticipantType::Contestant,
            team_id: None,
            team_name: name.map(str::to_string),
            ghost: false,
            start_time_seconds: None,
        }
    }

    #[test]
    fn test_fingerprint_format() {
        assert_eq!(fingerprint("Alpha", &["bob", "alice"]), "Alpha#alice#bob#");
        assert_eq!(fingerprint::<&str>("Solo", &[]), "Solo#");
    }

    #[test]
    fn test_fingerprint_is_permutation_invariant() {
        let handles = ["carol", "alice", "bob"];
        let expected = fingerprint("Alpha", &handles);
        let perms = [
            ["alice", "bob", "carol"],
            ["alice", "carol", "bob"],
            ["bob", "alice", "carol"],
            ["bob", "carol", "alice"],
            ["carol", "bob", "alice"],
        ];
        for perm in perms {
            assert_eq!(fingerprint("Alpha", &perm), expected);
        }
    }

    #[test]
    fn test_match_picks_team_with_shared_handle() {
        let registry = Registry::from_parts(
            vec![
                team("Alpha", "IIT", &["a1", "a2"]),
                team("Alpha", "NIT", &["b1", "b2"]),
            ],
            vec![],
        );
        let outcome = match_team(&party(Some("alpha"), &["B2", "x"]), &registry);
        assert_eq!(outcome.team().map(|t| t.institute.as_str()), Some("NIT"));
    }

    #[test]
    fn test_name_without_shared_handle_is_unregistered() {
        let registry = Registry::from_parts(vec![team("Alpha", "IIT", &["a1"])], vec![]);
        assert_eq!(
            match_team(&party(Some("Alpha"), &["zz"]), &registry),
            MatchOutcome::Unregistered
        );
        assert_eq!(
            match_team(&party(Some("Beta"), &["a1"]), &registry),
            MatchOutcome::Unregistered
        );
        assert_eq!(
            match_team(&party(None, &["a1"]), &registry),
            MatchOutcome::Unregistered
        );
    }

    #[test]
    fn test_first_overlapping_team_wins() {
        let registry = Registry::from_parts(
            vec![
                team("Alpha", "IIT", &["a1", "shared"]),
                team("Alpha", "NIT", &["shared", "b1"]),
            ],
            vec![],
        );
        let outcome = match_team(&party(Some("Alpha"), &["shared"]), &registry);
        assert_eq!(outcome.team().map(|t| t.institute.as_str()), Some("IIT"));
    }

    #[test]
    fn test_raw_keys_are_renormalized() {
        let raw = HashMap::from([("Alpha#bob#alice#".to_string(), "IIT".to_string())]);
        let table = RegionTable::from_raw(raw);
        assert_eq!(table.get("Alpha#alice#bob#"), Some("IIT"));
    }

    fn standings_row(party: Party) -> RanklistRow {
        RanklistRow {
            party,
            rank: 1,
            points: 0.0,
            penalty: 0,
            problem_results: vec![],
        }
    }

    #[test]
    fn test_resolve_region_with_fallback() {
        let registry = Registry::from_parts(vec![team("Alpha", "IIT", &["a1", "a2"])], vec![]);
        let rows = [
            standings_row(party(Some("Alpha"), &["a2", "a1"])),
            standings_row(party(Some("Stranger"), &["zz"])),
        ];
        let table = RegionTable::from_standings(&rows, &registry);
        assert_eq!(table.len(), 1);

        assert_eq!(
            resolve_region(&party(Some("Alpha"), &["a1", "a2"]), &table, "Other"),
            "IIT"
        );
        assert_eq!(
            resolve_region(&party(Some("Stranger"), &["zz"]), &table, "Other"),
            "Other"
        );
    }

    #[test]
    fn test_region_agrees_with_match_despite_case() {
        let registry = Registry::from_parts(vec![team("Alpha", "IIT", &["Alice"])], vec![]);
        let judge_party = party(Some("alpha"), &["alice"]);
        let table = RegionTable::from_standings(&[standings_row(judge_party.clone())], &registry);

        let matched = match_team(&judge_party, &registry).team().map(|t| t.institute.as_str());
        assert_eq!(matched, Some("IIT"));
        assert_eq!(resolve_region(&judge_party, &table, "Other"), "IIT");
    }

    #[test]
    fn test_regions_list_fallback_first() {
        let raw = HashMap::from([
            ("A#x#".to_string(), "NIT".to_string()),
            ("B#y#".to_string(), "IIT".to_string()),
            ("C#z#".to_string(), "IIT".to_string()),
        ]);
        let table = RegionTable::from_raw(raw);
        assert_eq!(table.regions("Other"), vec!["Other", "IIT", "NIT"]);
    }
}
