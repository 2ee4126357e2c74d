use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::application::services::{ExpireReport, UploadStagingManager};
use crate::error::IngestResult;

/// Removes uploads that sat in staging longer than the configured lifetime.
pub struct ExpireStagedUploadsUseCase {
    staging: Arc<UploadStagingManager>,
    time_to_live: Duration,
}

impl ExpireStagedUploadsUseCase {
    pub fn new(staging: Arc<UploadStagingManager>, time_to_live: Duration) -> Self {
        Self {
            staging,
            time_to_live,
        }
    }

    pub async fn execute(&self) -> IngestResult<ExpireReport> {
        self.staging.expire(Utc::now() - self.time_to_live).await
    }
}
