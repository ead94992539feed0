//! Known judge users, used to skip per-handle lookups during validation.

use std::collections::HashMap;

use anyhow::Result;
use tracing::info;

use crate::services::judge_api::{CachePolicy, JudgeApi, User};

#[derive(Debug, Default, Clone)]
pub struct RatedHandles {
    users: HashMap<String, User>,
}

impl RatedHandles {
    pub fn from_users(users: Vec<User>) -> Self {
        let users = users
            .into_iter()
            .map(|u| (u.handle.to_lowercase(), u))
            .collect();
        Self { users }
    }

    /// Loads the judge's full rated list, reading and writing `snapshot`.
    pub async fn load_or_fetch<J: JudgeApi + ?Sized>(api: &J, snapshot: &str) -> Result<Self> {
        let users = api.rated_list(false, CachePolicy::file(snapshot)).await?;
        info!(users = users.len(), snapshot, "Rated handles loaded");
        Ok(Self::from_users(users))
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.users.contains_key(&handle.to_lowercase())
    }

    pub fn get(&self, handle: &str) -> Option<&User> {
        self.users.get(&handle.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
