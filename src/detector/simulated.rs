use super::DetectionBackend;
use crate::error::Result;
use emberaid_common::{simulation, DetectedItem, ImageUpload};
use std::time::Duration;

/// 応答待ちを模した遅延の後、デモ品目を返す
#[derive(Debug, Clone)]
pub struct SimulatedDetector {
    delay: Duration,
}

impl SimulatedDetector {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl DetectionBackend for SimulatedDetector {
    async fn detect(&self, image: &ImageUpload) -> Result<Vec<DetectedItem>> {
        tracing::debug!(file = %image.file_name, delay_ms = self.delay.as_millis() as u64, "simulating detection");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(simulation::demo_items())
    }
}
