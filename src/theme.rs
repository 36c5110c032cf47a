use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Presentation variant. The session logic is the same for all of them.
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
pub enum Theme {
    /// Plain labels
    Basic,
    /// Labels prefixed with glyphs
    Icons,
    /// Dark palette with an intro screen, wpm chart and speed tier
    #[default]
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub accent: Color,
    pub untyped: Color,
    pub correct: Color,
    pub incorrect: Color,
    pub muted: Color,
}

/// Header labels; glyphs only for the themes that use them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Labels {
    pub timer: &'static str,
    pub wpm: &'static str,
    pub accuracy: &'static str,
    pub reset: &'static str,
}

impl Theme {
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Basic | Theme::Icons => Palette {
                background: Color::Reset,
                text: Color::Reset,
                accent: Color::Magenta,
                untyped: Color::Gray,
                correct: Color::Green,
                incorrect: Color::Red,
                muted: Color::DarkGray,
            },
            Theme::Dark => Palette {
                background: Color::Rgb(17, 24, 39),
                text: Color::Rgb(229, 231, 235),
                accent: Color::Rgb(96, 165, 250),
                untyped: Color::Rgb(107, 114, 128),
                correct: Color::Rgb(74, 222, 128),
                incorrect: Color::Rgb(248, 113, 113),
                muted: Color::Rgb(75, 85, 99),
            },
        }
    }

    pub fn labels(&self) -> Labels {
        match self {
            Theme::Basic => Labels {
                timer: "",
                wpm: "",
                accuracy: "",
                reset: "",
            },
            Theme::Icons | Theme::Dark => Labels {
                timer: "⏱ ",
                wpm: "⚡ ",
                accuracy: "🎯 ",
                reset: "↻ ",
            },
        }
    }

    pub fn has_intro(&self) -> bool {
        matches!(self, Theme::Dark)
    }

    /// Chart of sampled wpm and the speed-tier label on the results screen
    pub fn has_chart(&self) -> bool {
        matches!(self, Theme::Dark)
    }
}
