use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::application::use_cases::ExpireStagedUploadsUseCase;

/// Periodically removes abandoned staged uploads.
pub struct StagingSweeper {
    use_case: Arc<ExpireStagedUploadsUseCase>,
    period: Duration,
}

impl StagingSweeper {
    pub fn new(use_case: Arc<ExpireStagedUploadsUseCase>, period: Duration) -> Self {
        Self { use_case, period }
    }

    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.use_case.execute().await {
                Ok(report) if report.removed > 0 || report.blob_failures > 0 => info!(
                    "Staging sweep removed {} upload(s), {} blob(s) could not be deleted",
                    report.removed, report.blob_failures
                ),
                Ok(_) => {}
                Err(e) => error!("Staging sweep failed: {}", e),
            }
        }
    }
}
