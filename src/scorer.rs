use itertools::{EitherOrBoth, Itertools};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub incorrect: usize,
}

impl Score {
    /// Number of classified characters, always the char length of the input.
    pub fn typed(&self) -> usize {
        self.correct + self.incorrect
    }

    pub fn accuracy(&self) -> u32 {
        accuracy(*self)
    }
}

/// Highlight state of a single target character
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharState {
    Untyped,
    Correct,
    Incorrect,
}

/// Walks input and target in lockstep. Input past the end of the target
/// has nothing to match and counts as incorrect.
pub fn score(target: &str, input: &str) -> Score {
    input
        .chars()
        .zip_longest(target.chars())
        .fold(Score::default(), |mut score, pair| {
            match pair {
                EitherOrBoth::Both(typed, expected) if typed == expected => score.correct += 1,
                EitherOrBoth::Both(_, _) | EitherOrBoth::Left(_) => score.incorrect += 1,
                EitherOrBoth::Right(_) => {}
            }
            score
        })
}

/// Percentage of correct characters, rounded; 100 when nothing was typed.
pub fn accuracy(score: Score) -> u32 {
    let total = score.typed();
    if total == 0 {
        return 100;
    }

    let pct = (score.correct as f64 / total as f64) * 100.0;
    if pct.is_finite() {
        pct.round().clamp(0.0, 100.0) as u32
    } else {
        100
    }
}

/// One state per target character
pub fn classify(target: &str, input: &str) -> Vec<CharState> {
    target
        .chars()
        .zip_longest(input.chars())
        .filter_map(|pair| match pair {
            EitherOrBoth::Both(expected, typed) if expected == typed => Some(CharState::Correct),
            EitherOrBoth::Both(_, _) => Some(CharState::Incorrect),
            EitherOrBoth::Left(_) => Some(CharState::Untyped),
            EitherOrBoth::Right(_) => None,
        })
        .collect()
}

/// Characters typed beyond the end of the target
pub fn overflow(target: &str, input: &str) -> usize {
    input
        .chars()
        .count()
        .saturating_sub(target.chars().count())
}
