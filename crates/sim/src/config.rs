use std::path::PathBuf;

use duel::{LinkConditions, SyncConfig};

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub sync: SyncConfig,
    pub render_fps: u32,
    pub link: LinkConditions,
    /// Frame id at which the link goes down, with the outage length.
    pub drop_at: Option<u32>,
    pub drop_ms: u64,
    pub resume_timeout_ms: u64,
    pub heartbeat_ms: u64,
    pub seed: u64,
    pub max_secs: u64,
    pub record: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            render_fps: 60,
            link: LinkConditions::default(),
            drop_at: None,
            drop_ms: 2000,
            resume_timeout_ms: 10_000,
            heartbeat_ms: 1000,
            seed: 1,
            max_secs: 120,
            record: None,
        }
    }
}

impl SimConfig {
    pub fn render_interval_ms(&self) -> u64 {
        1000 / u64::from(self.render_fps.max(1))
    }
}
