use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::timer::Periodic;

pub const DEFAULT_SAMPLE_PERIOD: Duration = Duration::from_secs(2);
pub const DEFAULT_WPM_CAP: u32 = 200;

/// Whitespace-delimited tokens; runs of whitespace count as one separator.
pub fn word_count(input: &str) -> usize {
    input.split_whitespace().count()
}

/// Words per elapsed minute, rounded. Zero before any time has passed.
pub fn instantaneous_wpm(words: usize, elapsed: Duration) -> u32 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes <= 0.0 {
        return 0;
    }

    let wpm = (words as f64 / minutes).round();
    if wpm.is_finite() && wpm >= 0.0 {
        wpm.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SamplingPolicy {
    /// Sample on a fixed period, cap each sample and keep a history.
    #[default]
    Periodic,
    /// Recompute on every input change, no history.
    Continuous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WpmSampler {
    policy: SamplingPolicy,
    schedule: Periodic,
    cap: u32,
    current: u32,
    history: Vec<u32>,
    // elapsed since start for each history entry
    sample_times: Vec<Duration>,
    last_sample_at: Option<Instant>,
}

impl Default for WpmSampler {
    fn default() -> Self {
        Self::new(SamplingPolicy::Periodic, DEFAULT_SAMPLE_PERIOD, DEFAULT_WPM_CAP)
    }
}

impl WpmSampler {
    pub fn new(policy: SamplingPolicy, period: Duration, cap: u32) -> Self {
        Self {
            policy,
            schedule: Periodic::new(period),
            cap,
            current: 0,
            history: Vec::new(),
            sample_times: Vec::new(),
            last_sample_at: None,
        }
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    pub fn period(&self) -> Duration {
        self.schedule.period()
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn history(&self) -> &[u32] {
        &self.history
    }

    /// When each history entry was measured, relative to the session start.
    pub fn sample_times(&self) -> &[Duration] {
        &self.sample_times
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_armed()
    }

    pub fn start(&mut self, now: Instant) {
        self.clear();
        if self.policy == SamplingPolicy::Periodic {
            self.schedule.arm(now);
        }
    }

    pub fn stop(&mut self) {
        self.schedule.cancel();
    }

    pub fn reset(&mut self) {
        self.stop();
        self.clear();
    }

    /// Takes a sample when the period has elapsed; returns it.
    ///
    /// A late poll records a single sample: periods that were skipped were
    /// never measured.
    pub fn on_tick(&mut self, now: Instant, started_at: Instant, input: &str) -> Option<u32> {
        if self.schedule.poll(now) == 0 {
            return None;
        }

        let sample = self.capped(self.measure(now, started_at, input));
        self.record(now, started_at, sample);
        Some(sample)
    }

    pub fn on_input(&mut self, now: Instant, started_at: Instant, input: &str) {
        if self.policy == SamplingPolicy::Continuous {
            self.current = self.measure(now, started_at, input);
        }
    }

    /// Final measurement at the end of a session. Under the periodic
    /// policy it is skipped when a sample was already taken at `now`.
    pub fn finish(&mut self, now: Instant, started_at: Instant, input: &str) -> u32 {
        self.stop();
        match self.policy {
            SamplingPolicy::Periodic if self.last_sample_at == Some(now) => {}
            SamplingPolicy::Periodic => {
                let sample = self.capped(self.measure(now, started_at, input));
                self.record(now, started_at, sample);
            }
            SamplingPolicy::Continuous => {
                self.current = self.measure(now, started_at, input);
            }
        }
        self.current
    }

    pub fn summary(&self) -> Option<HistorySummary> {
        HistorySummary::from_samples(&self.history)
    }

    fn measure(&self, now: Instant, started_at: Instant, input: &str) -> u32 {
        instantaneous_wpm(word_count(input), now.saturating_duration_since(started_at))
    }

    fn record(&mut self, now: Instant, started_at: Instant, sample: u32) {
        self.current = sample;
        self.history.push(sample);
        self.sample_times
            .push(now.saturating_duration_since(started_at));
        self.last_sample_at = Some(now);
    }

    fn clear(&mut self) {
        self.current = 0;
        self.history.clear();
        self.sample_times.clear();
        self.last_sample_at = None;
    }

    fn capped(&self, wpm: u32) -> u32 {
        wpm.min(self.cap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub average: f64,
    pub peak: u32,
    pub std_dev: f64,
}

impl HistorySummary {
    pub fn from_samples(samples: &[u32]) -> Option<Self> {
        let peak = samples.iter().copied().max()?;
        let count = samples.len() as f64;
        let average = samples.iter().map(|&s| s as f64).sum::<f64>() / count;
        let variance = samples
            .iter()
            .map(|&s| {
                let diff = average - s as f64;
                diff * diff
            })
            .sum::<f64>()
            / count;

        Some(Self {
            average,
            peak,
            std_dev: variance.sqrt(),
        })
    }
}

/// Qualitative label for a final speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SpeedTier {
    Beginner,
    Casual,
    Efficient,
    Professional,
    #[strum(serialize = "Speed Demon")]
    SpeedDemon,
}

impl SpeedTier {
    pub fn from_wpm(wpm: u32) -> Self {
        match wpm {
            0..=29 => SpeedTier::Beginner,
            30..=49 => SpeedTier::Casual,
            50..=69 => SpeedTier::Efficient,
            70..=89 => SpeedTier::Professional,
            _ => SpeedTier::SpeedDemon,
        }
    }
}
