use anyhow::Result;

use crate::client::Client;
use crate::events::SimEvent;

const OVERLAY_EVERY_MS: u64 = 5000;

/// Shows one client update. Returning `false` ends the run.
pub trait Presenter {
    fn present(&mut self, client: &Client, events: &[SimEvent], now_ms: u64) -> Result<bool>;
}

/// Log-only output for `--headless`.
#[derive(Default)]
pub struct Headless {
    next_overlay_ms: u64,
}

impl Headless {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for Headless {
    fn present(&mut self, client: &Client, events: &[SimEvent], now_ms: u64) -> Result<bool> {
        for event in events.iter().filter(|e| !e.is_noise()) {
            if event.is_warning() {
                log::warn!("{}", event.describe());
            } else {
                log::info!("{}", event.describe());
            }
        }

        if now_ms >= self.next_overlay_ms {
            self.next_overlay_ms = now_ms + OVERLAY_EVERY_MS;
            let overlay = client.sync().debug_overlay(now_ms);
            log::info!("{}", overlay.lines().join(" | "));
        }
        Ok(true)
    }
}
