use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use std::time::{Duration, Instant};

use crate::{
    completion::CompletionPolicy,
    corpus::Corpus,
    scorer::{self, CharState, Score},
    timer::Countdown,
    wpm::{
        HistorySummary, SamplingPolicy, SpeedTier, WpmSampler, DEFAULT_SAMPLE_PERIOD,
        DEFAULT_WPM_CAP,
    },
};

pub const DEFAULT_DURATION_SECS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Completed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub duration_secs: u32,
    pub completion: CompletionPolicy,
    pub sampling: SamplingPolicy,
    pub sample_period: Duration,
    pub wpm_cap: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            completion: CompletionPolicy::default(),
            sampling: SamplingPolicy::default(),
            sample_period: DEFAULT_SAMPLE_PERIOD,
            wpm_cap: DEFAULT_WPM_CAP,
        }
    }
}

/// Results snapshot shown once a session has finished
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub wpm: u32,
    pub accuracy: u32,
    pub correct: usize,
    pub incorrect: usize,
    pub tier: SpeedTier,
    pub reason: FinishReason,
    pub elapsed: Duration,
    pub history: Vec<u32>,
    pub sample_times: Vec<Duration>,
    pub history_summary: Option<HistorySummary>,
}

/// One typing attempt against a paragraph drawn from the corpus.
///
/// Phases only move forward (idle, active, finished); `reset` and `retry`
/// are the only way back to idle. The countdown and the wpm sampler are
/// armed on start and cancelled on every exit from the active phase.
#[derive(Debug)]
pub struct Session {
    corpus: Corpus,
    config: SessionConfig,
    rng: StdRng,
    target_text: String,
    user_input: String,
    phase: Phase,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    finish_reason: Option<FinishReason>,
    countdown: Countdown,
    sampler: WpmSampler,
    score: Score,
    accuracy: u32,
    focus_requested: bool,
}

impl Session {
    pub fn new(corpus: Corpus, config: SessionConfig) -> Self {
        Self::with_rng(corpus, config, StdRng::from_entropy())
    }

    pub fn with_rng(corpus: Corpus, config: SessionConfig, mut rng: StdRng) -> Self {
        let target_text = corpus.pick(&mut rng).to_string();
        Self::build(corpus, config, rng, target_text)
    }

    /// Session for a caller-supplied paragraph. Resets still draw from the corpus.
    pub fn with_target(corpus: Corpus, config: SessionConfig, target_text: String) -> Self {
        Self::build(corpus, config, StdRng::from_entropy(), target_text)
    }

    fn build(corpus: Corpus, config: SessionConfig, rng: StdRng, target_text: String) -> Self {
        Self {
            countdown: Countdown::new(config.duration_secs),
            sampler: WpmSampler::new(config.sampling, config.sample_period, config.wpm_cap),
            corpus,
            config,
            rng,
            target_text,
            user_input: String::new(),
            phase: Phase::Idle,
            started_at: None,
            finished_at: None,
            finish_reason: None,
            score: Score::default(),
            accuracy: 100,
            focus_requested: false,
        }
    }

    pub fn start(&mut self) -> bool {
        self.start_at(Instant::now())
    }

    pub fn start_at(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Idle {
            debug!("start ignored in phase {:?}", self.phase);
            return false;
        }

        self.phase = Phase::Active;
        self.started_at = Some(now);
        self.user_input.clear();
        self.score = Score::default();
        self.countdown.start(now);
        self.sampler.start(now);
        self.focus_requested = true;

        info!(
            "session started: {} chars, {}s",
            self.target_text.chars().count(),
            self.countdown.total_secs()
        );
        true
    }

    pub fn on_input(&mut self, value: &str) -> bool {
        self.on_input_at(value, Instant::now())
    }

    /// Replaces the typed text. Returns true when this input finished the session.
    pub fn on_input_at(&mut self, value: &str, now: Instant) -> bool {
        if self.phase == Phase::Finished {
            debug!("input ignored after finish");
            return false;
        }

        if self.phase == Phase::Idle && !value.is_empty() {
            self.start_at(now);
        }

        self.user_input.clear();
        self.user_input.push_str(value);
        self.score = scorer::score(&self.target_text, &self.user_input);

        if self.phase != Phase::Active {
            return false;
        }

        if let Some(started_at) = self.started_at {
            self.sampler.on_input(now, started_at, &self.user_input);
        }

        if self
            .config
            .completion
            .is_complete(&self.target_text, &self.user_input)
        {
            return self.finish_at(now, FinishReason::Completed);
        }
        false
    }

    pub fn push_char(&mut self, c: char) -> bool {
        self.push_char_at(c, Instant::now())
    }

    pub fn push_char_at(&mut self, c: char, now: Instant) -> bool {
        let mut value = self.user_input.clone();
        value.push(c);
        self.on_input_at(&value, now)
    }

    pub fn backspace(&mut self) -> bool {
        self.backspace_at(Instant::now())
    }

    pub fn backspace_at(&mut self, now: Instant) -> bool {
        let mut value = self.user_input.clone();
        if value.pop().is_none() {
            return false;
        }
        self.on_input_at(&value, now)
    }

    pub fn delete_word(&mut self) -> bool {
        self.delete_word_at(Instant::now())
    }

    /// Drops trailing whitespace and the word before it.
    pub fn delete_word_at(&mut self, now: Instant) -> bool {
        if self.user_input.is_empty() {
            return false;
        }

        let trimmed = self.user_input.trim_end();
        let cut = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map_or(0, |(idx, c)| idx + c.len_utf8());
        let value = trimmed[..cut].to_string();
        self.on_input_at(&value, now)
    }

    pub fn on_tick(&mut self) -> bool {
        self.on_tick_at(Instant::now())
    }

    /// Advances the countdown and the wpm sampler. Returns true on the tick
    /// that times the session out.
    pub fn on_tick_at(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        let Some(started_at) = self.started_at else {
            return false;
        };

        if let Some(sample) = self.sampler.on_tick(now, started_at, &self.user_input) {
            debug!("wpm sample: {sample}");
        }

        if self.countdown.on_tick(now) {
            return self.finish_at(now, FinishReason::TimedOut);
        }
        false
    }

    pub fn finish(&mut self, reason: FinishReason) -> bool {
        self.finish_at(Instant::now(), reason)
    }

    /// Stops both schedules and freezes the results. A second call is a no-op.
    pub fn finish_at(&mut self, now: Instant, reason: FinishReason) -> bool {
        if self.phase == Phase::Finished {
            return false;
        }

        let started_at = self.started_at.unwrap_or(now);
        self.phase = Phase::Finished;
        self.finished_at = Some(now);
        self.finish_reason = Some(reason);
        self.countdown.stop();
        self.sampler.finish(now, started_at, &self.user_input);
        self.accuracy = scorer::accuracy(self.score);
        self.focus_requested = false;

        info!(
            "session finished ({:?}): {} wpm, {}% acc, {} correct, {} incorrect",
            reason,
            self.wpm(),
            self.accuracy,
            self.score.correct,
            self.score.incorrect
        );
        true
    }

    /// Back to idle with a freshly drawn paragraph.
    pub fn reset(&mut self) {
        self.target_text = self.corpus.pick(&mut self.rng).to_string();
        self.clear();
        debug!("session reset");
    }

    /// Back to idle on the same paragraph.
    pub fn retry(&mut self) {
        self.clear();
        debug!("session retry");
    }

    fn clear(&mut self) {
        self.countdown.reset();
        self.sampler.reset();
        self.phase = Phase::Idle;
        self.user_input.clear();
        self.started_at = None;
        self.finished_at = None;
        self.finish_reason = None;
        self.score = Score::default();
        self.accuracy = 100;
        self.focus_requested = false;
    }

    /// Set when the session starts; the caller moves input focus, best effort.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn correct_count(&self) -> usize {
        self.score.correct
    }

    pub fn incorrect_count(&self) -> usize {
        self.score.incorrect
    }

    pub fn wpm(&self) -> u32 {
        self.sampler.current()
    }

    pub fn wpm_history(&self) -> &[u32] {
        self.sampler.history()
    }

    /// Accuracy frozen at finish; 100 before that.
    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    /// Accuracy of the input as it stands.
    pub fn live_accuracy(&self) -> u32 {
        match self.phase {
            Phase::Finished => self.accuracy,
            Phase::Idle | Phase::Active => scorer::accuracy(self.score),
        }
    }

    pub fn char_states(&self) -> Vec<CharState> {
        scorer::classify(&self.target_text, &self.user_input)
    }

    pub fn overflow(&self) -> usize {
        scorer::overflow(&self.target_text, &self.user_input)
    }

    pub fn is_input_enabled(&self) -> bool {
        self.phase != Phase::Finished
    }

    /// The manual start action is only offered before the first keystroke.
    pub fn can_start(&self) -> bool {
        self.phase == Phase::Idle && self.user_input.is_empty()
    }

    pub fn timers_running(&self) -> bool {
        self.countdown.is_running() || self.sampler.is_running()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => now.saturating_duration_since(start),
            (None, _) => Duration::ZERO,
        }
    }

    pub fn summary(&self) -> Option<Summary> {
        let reason = self.finish_reason.filter(|_| self.phase == Phase::Finished)?;
        let wpm = self.wpm();

        Some(Summary {
            wpm,
            accuracy: self.accuracy,
            correct: self.score.correct,
            incorrect: self.score.incorrect,
            tier: SpeedTier::from_wpm(wpm),
            reason,
            elapsed: self.elapsed(Instant::now()),
            history: self.sampler.history().to_vec(),
            sample_times: self.sampler.sample_times().to_vec(),
            history_summary: self.sampler.summary(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn corpus(texts: &[&str]) -> Corpus {
        Corpus::from_paragraphs(texts.iter().map(|t| t.to_string()).collect()).unwrap()
    }

    fn session(target: &str) -> Session {
        Session::with_target(corpus(&[target]), SessionConfig::default(), target.to_string())
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_new_session_is_idle() {
        let s = session("cat dog");

        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.remaining_secs(), 60);
        assert_eq!(s.user_input(), "");
        assert_eq!(s.wpm(), 0);
        assert_eq!(s.accuracy(), 100);
        assert!(s.started_at().is_none());
        assert!(s.can_start());
        assert!(!s.timers_running());
    }

    #[test]
    fn test_first_keystroke_starts_session() {
        let t0 = Instant::now();
        let mut s = session("cat dog");

        s.on_input_at("c", t0);

        assert_eq!(s.phase(), Phase::Active);
        assert_eq!(s.started_at(), Some(t0));
        assert_eq!(s.correct_count(), 1);
        assert!(s.timers_running());
        assert!(s.take_focus_request());
        assert!(!s.take_focus_request());
    }

    #[test]
    fn test_empty_input_does_not_start() {
        let mut s = session("cat dog");
        s.on_input_at("", Instant::now());

        assert_eq!(s.phase(), Phase::Idle);
        assert!(!s.timers_running());
    }

    #[test]
    fn test_manual_start() {
        let t0 = Instant::now();
        let mut s = session("cat dog");

        assert!(s.start_at(t0));
        assert_eq!(s.phase(), Phase::Active);
        assert!(!s.can_start());
        assert!(!s.start_at(t0 + secs(1)));
        assert_eq!(s.started_at(), Some(t0));
    }

    #[test]
    fn test_exact_typing_finishes() {
        let t0 = Instant::now();
        let mut s = session("cat dog");

        let finished = s.on_input_at("cat dog", t0 + secs(3));

        assert!(finished);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.correct_count(), 7);
        assert_eq!(s.incorrect_count(), 0);
        assert_eq!(s.accuracy(), 100);
        assert_eq!(s.finish_reason(), Some(FinishReason::Completed));
        assert!(!s.timers_running());
    }

    #[test]
    fn test_substitution_accuracy() {
        let t0 = Instant::now();
        let mut s = session("cat dog");

        for (i, c) in "cat fo".chars().enumerate() {
            s.push_char_at(c, t0 + Duration::from_millis(200 * i as u64));
        }
        assert_eq!(s.phase(), Phase::Active);

        s.push_char_at('g', t0 + secs(2));

        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.correct_count(), 6);
        assert_eq!(s.incorrect_count(), 1);
        assert_eq!(s.accuracy(), 86);
    }

    #[test]
    fn test_input_ignored_after_finish() {
        let t0 = Instant::now();
        let mut s = session("hi");
        s.on_input_at("hi", t0);

        assert!(!s.on_input_at("hix", t0 + secs(1)));
        assert_eq!(s.user_input(), "hi");
        assert!(!s.is_input_enabled());
    }

    #[test]
    fn test_exact_match_policy_keeps_going_on_errors() {
        let t0 = Instant::now();
        let config = SessionConfig {
            completion: CompletionPolicy::ExactMatch,
            ..SessionConfig::default()
        };
        let mut s = Session::with_target(corpus(&["cat dog"]), config, "cat dog".into());

        s.on_input_at("cat fog", t0);
        assert_eq!(s.phase(), Phase::Active);

        s.on_input_at("cat do", t0 + secs(1));
        s.on_input_at("cat dog", t0 + secs(2));
        assert_eq!(s.phase(), Phase::Finished);
    }

    #[test]
    fn test_timeout_finishes_exactly_once() {
        let t0 = Instant::now();
        let mut s = session("cat dog");
        s.start_at(t0);

        let mut finishes = 0;
        for n in 1..=65 {
            if s.on_tick_at(t0 + secs(n)) {
                finishes += 1;
            }
        }

        assert_eq!(finishes, 1);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.remaining_secs(), 0);
        assert_eq!(s.finish_reason(), Some(FinishReason::TimedOut));
        assert!(!s.finish_at(t0 + secs(70), FinishReason::Completed));
    }

    #[test]
    fn test_late_tick_records_single_sample() {
        let t0 = Instant::now();
        let mut s = session("one two three four five");
        s.on_input_at("one", t0);
        s.on_input_at("one two three", t0 + secs(5));

        s.on_tick_at(t0 + secs(7));
        assert_eq!(s.wpm_history(), &[26]);
        assert_eq!(s.remaining_secs(), 53);
    }

    #[test]
    fn test_timeout_does_not_repeat_last_sample() {
        let t0 = Instant::now();
        let mut s = session("cat dog");
        s.on_input_at("c", t0);

        for n in 1..=60 {
            s.on_tick_at(t0 + secs(n));
        }

        let summary = s.summary().unwrap();
        assert_eq!(summary.history.len(), 30);
        assert_eq!(summary.sample_times.last(), Some(&secs(60)));
        assert_eq!(summary.sample_times.len(), summary.history.len());
    }

    #[test]
    fn test_remaining_frozen_outside_active() {
        let t0 = Instant::now();
        let mut s = session("cat dog");

        s.on_tick_at(t0 + secs(5));
        assert_eq!(s.remaining_secs(), 60);

        s.start_at(t0);
        s.on_tick_at(t0 + secs(5));
        assert_eq!(s.remaining_secs(), 55);

        s.on_input_at("cat dog", t0 + secs(6));
        s.on_tick_at(t0 + secs(10));
        assert_eq!(s.remaining_secs(), 55);
    }

    #[test]
    fn test_wpm_sampled_every_period() {
        let t0 = Instant::now();
        let mut s = session("one two three four five six");
        s.on_input_at("one two", t0);

        assert_eq!(s.wpm(), 0);
        s.on_tick_at(t0 + secs(1));
        assert!(s.wpm_history().is_empty());
        s.on_tick_at(t0 + secs(2));
        assert_eq!(s.wpm_history(), &[60]);
        assert_eq!(s.wpm(), 60);
    }

    #[test]
    fn test_wpm_never_exceeds_cap() {
        let t0 = Instant::now();
        let target = "a ".repeat(300);
        let mut s = session(&target);
        s.on_input_at(&"a ".repeat(150), t0);

        for n in 1..=10 {
            s.on_tick_at(t0 + secs(n));
        }

        assert!(s.wpm() <= DEFAULT_WPM_CAP);
        assert!(s.wpm_history().iter().all(|&w| w <= DEFAULT_WPM_CAP));
    }

    #[test]
    fn test_reset_returns_to_idle_with_corpus_text() {
        let t0 = Instant::now();
        let texts = ["alpha beta", "gamma delta", "epsilon zeta"];
        let mut s = Session::with_rng(
            corpus(&texts),
            SessionConfig::default(),
            StdRng::seed_from_u64(3),
        );
        s.on_input_at("alp", t0);
        s.on_tick_at(t0 + secs(4));

        for _ in 0..10 {
            s.reset();

            assert_eq!(s.phase(), Phase::Idle);
            assert_eq!(s.remaining_secs(), 60);
            assert_eq!(s.user_input(), "");
            assert_eq!(s.score(), Score::default());
            assert!(s.wpm_history().is_empty());
            assert!(!s.timers_running());
            assert!(s.corpus().contains(s.target_text()));
        }
    }

    #[test]
    fn test_reset_cancels_ticks() {
        let t0 = Instant::now();
        let mut s = session("cat dog");
        s.start_at(t0);
        s.reset();

        assert!(!s.on_tick_at(t0 + secs(120)));
        assert_eq!(s.remaining_secs(), 60);
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn test_retry_keeps_target() {
        let mut s = session("cat dog");
        s.on_input_at("cat", Instant::now());
        s.retry();

        assert_eq!(s.target_text(), "cat dog");
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn test_backspace_and_delete_word() {
        let t0 = Instant::now();
        let mut s = session("cat dog fish");

        s.on_input_at("cat dox", t0);
        s.backspace_at(t0);
        assert_eq!(s.user_input(), "cat do");
        assert_eq!(s.incorrect_count(), 0);

        s.delete_word_at(t0);
        assert_eq!(s.user_input(), "cat ");

        s.delete_word_at(t0);
        assert_eq!(s.user_input(), "");
        assert_eq!(s.phase(), Phase::Active);

        assert!(!s.backspace_at(t0));
        assert!(!s.delete_word_at(t0));
    }

    #[test]
    fn test_counts_always_cover_input() {
        let t0 = Instant::now();
        let mut s = session("The quick brown fox.");

        for value in ["T", "Th", "Tx", "The quack", "The quick brown fox. and more", "The"] {
            s.on_input_at(value, t0);
            assert_eq!(
                s.correct_count() + s.incorrect_count(),
                s.user_input().chars().count()
            );
            if s.phase() == Phase::Finished {
                break;
            }
        }
    }

    #[test]
    fn test_live_accuracy_with_no_input() {
        let mut s = session("cat");
        assert_eq!(s.live_accuracy(), 100);

        s.start_at(Instant::now());
        assert_eq!(s.live_accuracy(), 100);
    }

    #[test]
    fn test_summary_only_when_finished() {
        let t0 = Instant::now();
        let mut s = session("cat dog");
        assert!(s.summary().is_none());

        s.on_input_at("cat", t0);
        assert!(s.summary().is_none());

        s.on_input_at("cat dog", t0 + secs(6));
        let summary = s.summary().unwrap();

        assert_eq!(summary.wpm, 20);
        assert_eq!(summary.tier, SpeedTier::Beginner);
        assert_eq!(summary.correct, 7);
        assert_eq!(summary.elapsed, secs(6));
        assert_matches!(summary.reason, FinishReason::Completed);
        assert_eq!(summary.history.last(), Some(&20));
    }

    #[test]
    fn test_continuous_sampling() {
        let t0 = Instant::now();
        let config = SessionConfig {
            sampling: SamplingPolicy::Continuous,
            ..SessionConfig::default()
        };
        let mut s = Session::with_target(corpus(&["a b c d e f"]), config, "a b c d e f".into());

        s.on_input_at("a", t0);
        assert_eq!(s.wpm(), 0);
        s.on_input_at("a b c", t0 + secs(30));
        assert_eq!(s.wpm(), 6);
        assert!(s.wpm_history().is_empty());
    }
}
