use async_trait::async_trait;
use tracing::debug;

use crate::error::LookupFailure;
use crate::registry::HandleResolver;
use crate::services::judge_api::JudgeApi;

/// Resolves handles one at a time through `user.info`.
///
/// Transient failures are already retried by the [`JudgeApi`]
/// implementation; whatever error survives is reported as a lookup failure.
pub struct JudgeHandleResolver<'a, J: ?Sized> {
    api: &'a J,
}

impl<'a, J: JudgeApi + ?Sized> JudgeHandleResolver<'a, J> {
    pub fn new(api: &'a J) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<J: JudgeApi + ?Sized> HandleResolver for JudgeHandleResolver<'_, J> {
    async fn resolve(&self, handle: &str) -> Result<(), LookupFailure> {
        match self.api.user_info(&[handle.to_string()]).await {
            Ok(_) => Ok(()),
            Err(e) => {
                debug!(handle, error = %e, "Handle lookup failed");
                Err(LookupFailure(e.to_string()))
            }
        }
    }
}
