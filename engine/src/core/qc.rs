//! Quality control markers for assessment runs. These flags capture context that helps interpret results.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityFlags {
    pub visibility_blur_events: u32,
    pub focus_lost_events: u32,
    pub min_trials_met: bool,
}

impl QualityFlags {
    /// Flags for a run that has not finished yet.
    pub fn pristine() -> Self {
        Self {
            visibility_blur_events: 0,
            focus_lost_events: 0,
            min_trials_met: false,
        }
    }

    pub fn log_visibility_blur(&mut self) {
        self.visibility_blur_events = self.visibility_blur_events.saturating_add(1);
    }

    pub fn log_focus_loss(&mut self) {
        self.focus_lost_events = self.focus_lost_events.saturating_add(1);
    }

    pub fn mark_min_trials(&mut self, met: bool) {
        self.min_trials_met = met;
    }

    pub fn is_clean(&self) -> bool {
        self.min_trials_met && self.focus_lost_events == 0 && self.visibility_blur_events == 0
    }

    /// One-line description, e.g. `QC: Focus lost ×2`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.focus_lost_events > 0 {
            parts.push(format!("Focus lost ×{}", self.focus_lost_events));
        }
        if self.visibility_blur_events > 0 {
            parts.push(format!("Window blur ×{}", self.visibility_blur_events));
        }
        if !self.min_trials_met {
            parts.push("Min trials not met".to_string());
        }

        if parts.is_empty() {
            "QC: clean run".to_string()
        } else {
            format!("QC: {}", parts.join(", "))
        }
    }
}

impl Default for QualityFlags {
    fn default() -> Self {
        Self::pristine()
    }
}
