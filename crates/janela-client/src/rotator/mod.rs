// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Time-driven rotation over the pending window queue.
//!
//! [`Rotator`] holds the visible index and its transition rules; it has no
//! notion of time. [`RotationTimer`] is the periodic tick that drives it and is
//! only armed while there is something to rotate through.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Default rotation period (10 seconds).
pub const DEFAULT_ROTATION_PERIOD: Duration = Duration::from_millis(10_000);

/// What happens to the visible index when the queue is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexPolicy {
    /// Start again from the first pending window.
    #[default]
    Restart,
    /// Keep the index, wrapped into the new queue length.
    Preserve,
}

/// Configuration for queue rotation.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Time between two rotation ticks.
    pub period: Duration,
    /// Index handling on re-arm.
    pub index_policy: IndexPolicy,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_ROTATION_PERIOD,
            index_policy: IndexPolicy::default(),
        }
    }
}

/// Visible index over a queue of `pending_len` windows.
#[derive(Debug, Clone, Default)]
pub struct Rotator {
    visible_index: usize,
    pending_len: usize,
    policy: IndexPolicy,
}

impl Rotator {
    #[must_use]
    pub fn new(policy: IndexPolicy) -> Self {
        Self {
            visible_index: 0,
            pending_len: 0,
            policy,
        }
    }

    /// Index of the visible pending window. Always 0 when inactive.
    #[must_use]
    pub fn visible_index(&self) -> usize {
        self.visible_index
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending_len
    }

    #[must_use]
    pub fn policy(&self) -> IndexPolicy {
        self.policy
    }

    /// Rotation only runs with two or more pending windows.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.pending_len > 1
    }

    /// Adopt a new queue length. Returns whether rotation is active.
    pub fn rearm(&mut self, pending_len: usize) -> bool {
        self.pending_len = pending_len;
        self.visible_index = if pending_len <= 1 || self.policy == IndexPolicy::Restart {
            0
        } else {
            self.visible_index % pending_len
        };
        self.is_active()
    }

    /// Advance one step. Returns the new index, or `None` when inactive.
    pub fn tick(&mut self) -> Option<usize> {
        if !self.is_active() {
            return None;
        }
        self.visible_index = (self.visible_index + 1) % self.pending_len;
        Some(self.visible_index)
    }
}

/// Periodic tick source for a [`Rotator`].
///
/// Arming replaces any previous interval, so the first tick after a re-arm is
/// always one full period away. A disarmed timer never fires.
#[derive(Debug)]
pub struct RotationTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl RotationTimer {
    /// Create a disarmed timer. Zero periods are raised to one millisecond.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: None,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Cancel any running interval and start a new one if `active`.
    pub fn arm(&mut self, active: bool) {
        self.interval = active.then(|| {
            let mut interval = interval_at(Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
    }

    pub fn disarm(&mut self) {
        self.interval = None;
    }

    /// Wait for the next tick. Pends forever while disarmed.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_with_zero_or_one_pending() {
        let mut rotator = Rotator::new(IndexPolicy::Restart);
        assert!(!rotator.rearm(0));
        assert_eq!(rotator.tick(), None);
        assert!(!rotator.rearm(1));
        assert_eq!(rotator.tick(), None);
        assert_eq!(rotator.visible_index(), 0);
    }

    #[test]
    fn test_three_windows_cycle() {
        let mut rotator = Rotator::new(IndexPolicy::Restart);
        assert!(rotator.rearm(2));
        assert_eq!(rotator.tick(), Some(1));
        assert_eq!(rotator.tick(), Some(0));
    }

    #[test]
    fn test_index_after_n_ticks_is_n_mod_k() {
        for k in 2..6 {
            let mut rotator = Rotator::new(IndexPolicy::Restart);
            rotator.rearm(k);
            for n in 1..=3 * k {
                rotator.tick();
                assert_eq!(rotator.visible_index(), n % k);
            }
        }
    }

    #[test]
    fn test_restart_policy_resets_on_rearm() {
        let mut rotator = Rotator::new(IndexPolicy::Restart);
        rotator.rearm(4);
        rotator.tick();
        rotator.tick();
        assert_eq!(rotator.visible_index(), 2);
        rotator.rearm(4);
        assert_eq!(rotator.visible_index(), 0);
    }

    #[test]
    fn test_preserve_policy_wraps_into_new_length() {
        let mut rotator = Rotator::new(IndexPolicy::Preserve);
        rotator.rearm(5);
        for _ in 0..4 {
            rotator.tick();
        }
        assert_eq!(rotator.visible_index(), 4);

        rotator.rearm(3);
        assert_eq!(rotator.visible_index(), 1);
        rotator.rearm(6);
        assert_eq!(rotator.visible_index(), 1);
        rotator.rearm(1);
        assert_eq!(rotator.visible_index(), 0);
    }

    #[test]
    fn test_policy_deserializes_lowercase() {
        let policy: IndexPolicy = serde_json::from_str("\"preserve\"").unwrap();
        assert_eq!(policy, IndexPolicy::Preserve);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_first_tick_after_full_period() {
        let mut timer = RotationTimer::new(Duration::from_secs(10));
        timer.arm(true);
        let start = Instant::now();
        timer.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        timer.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_the_period() {
        let mut timer = RotationTimer::new(Duration::from_secs(10));
        timer.arm(true);
        tokio::time::advance(Duration::from_secs(7)).await;
        timer.arm(true);
        let rearmed_at = Instant::now();
        timer.tick().await;
        assert_eq!(rearmed_at.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_timer_never_fires() {
        let mut timer = RotationTimer::new(Duration::from_secs(10));
        timer.arm(false);
        assert!(!timer.is_armed());
        let waited = tokio::time::timeout(Duration::from_secs(60), timer.tick()).await;
        assert!(waited.is_err());
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let timer = RotationTimer::new(Duration::ZERO);
        assert_eq!(timer.period(), Duration::from_millis(1));
    }
}
