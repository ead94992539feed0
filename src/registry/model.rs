use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::matching::fingerprint;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub handle: String,
    pub name: String,
}

/// A registered team. Only built from rows that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub institute: String,
    pub members: Vec<Member>,
    pub alts: BTreeSet<String>,
    pub emails: BTreeSet<String>,
}

impl Team {
    pub fn handles(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.handle.as_str()).collect()
    }

    /// Identity key: name plus sorted member handles.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.name, &self.handles())
    }

    /// True when any member handle matches one of `handles`, ignoring case.
    pub fn shares_member_with<S: AsRef<str>>(&self, handles: &[S]) -> bool {
        let ours: HashSet<String> = self
            .members
            .iter()
            .map(|m| m.handle.to_lowercase())
            .collect();
        handles
            .iter()
            .any(|h| ours.contains(&h.as_ref().to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Team {
        Team {
            name: "Alpha".to_string(),
            institute: "IIT".to_string(),
            members: vec![
                Member {
                    handle: "Bob".to_string(),
                    name: "Bob B".to_string(),
                },
                Member {
                    handle: "alice".to_string(),
                    name: "Alice A".to_string(),
                },
            ],
            alts: BTreeSet::new(),
            emails: BTreeSet::new(),
        }
    }

    #[test]
    fn test_shares_member_ignores_case() {
        assert!(team().shares_member_with(&["BOB"]));
        assert!(team().shares_member_with(&["carol", "ALICE"]));
        assert!(!team().shares_member_with(&["carol"]));
        assert!(!team().shares_member_with::<&str>(&[]));
    }

    #[test]
    fn test_fingerprint_sorts_handles() {
        assert_eq!(team().fingerprint(), "Alpha#Bob#alice#");
    }
}
