pub mod charting;

use std::rc::Rc;
use std::time::Duration;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Gauge, Paragraph, Widget, Wrap},
    Frame,
};
use typespeed::{
    completion::CompletionPolicy,
    scorer::CharState,
    theme::{Labels, Palette},
    wpm::SamplingPolicy,
    Phase,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{App, Screen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const INPUT_HEIGHT: u16 = 3;

// indices into the typing layout
const TITLE: usize = 0;
const HEADER: usize = 1;
const PROGRESS: usize = 3;
const PROMPT: usize = 5;
const INPUT: usize = 7;
const HINT: usize = 8;
const LEGEND: usize = 10;

pub fn draw(app: &App, f: &mut Frame) {
    let area = f.area();
    f.render_widget(app, area);

    if let Some(pos) = cursor_position(app, area) {
        f.set_cursor_position(pos);
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = self.theme.palette();

        Block::default()
            .style(Style::default().bg(palette.background).fg(palette.text))
            .render(area, buf);

        match self.screen {
            Screen::Intro => render_intro(self, &palette, area, buf),
            Screen::Typing => render_typing(self, &palette, area, buf),
            Screen::Results => render_results(self, &palette, area, buf),
        }
    }
}

fn typing_layout(app: &App, area: Rect) -> Rc<[Rect]> {
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1) as usize;
    let prompt_width = app.session.target_text().width();
    let prompt_lines = if prompt_width <= max_chars_per_line {
        1
    } else {
        // one spare line for word wrapping slack
        prompt_width.div_ceil(max_chars_per_line) + 1
    };

    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // header
            Constraint::Length(1),
            Constraint::Length(1), // progress
            Constraint::Length(1),
            Constraint::Length(prompt_lines.min(u16::MAX as usize) as u16), // prompt
            Constraint::Length(1),
            Constraint::Length(INPUT_HEIGHT), // input
            Constraint::Length(1),            // hint
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area)
}

/// Where the terminal cursor goes while the input has focus
fn cursor_position(app: &App, area: Rect) -> Option<Position> {
    if app.screen != Screen::Typing
        || !app.input_focused
        || app.session.phase() != Phase::Active
    {
        return None;
    }

    let input = typing_layout(app, area)[INPUT];
    if input.width < 3 || input.height < 3 {
        return None;
    }

    let inner_width = (input.width - 2) as usize;
    let visible = tail_fitting(app.session.user_input(), inner_width.saturating_sub(1));
    let x = input.x + 1 + visible.width().min(inner_width - 1) as u16;

    Some(Position::new(x, input.y + 1))
}

/// Longest suffix of `s` that fits in `max_width` columns
fn tail_fitting(s: &str, max_width: usize) -> &str {
    let mut width = 0;
    let mut start = s.len();

    for (idx, c) in s.char_indices().rev() {
        width += c.width().unwrap_or(0);
        if width > max_width {
            break;
        }
        start = idx;
    }

    &s[start..]
}

fn header_line(app: &App, palette: &Palette, labels: &Labels) -> Line<'static> {
    let stat = Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(palette.muted);
    let session = &app.session;

    Line::from(vec![
        Span::styled(format!("{}{}s", labels.timer, session.remaining_secs()), stat),
        Span::styled("   ", muted),
        Span::styled(format!("{}{} WPM", labels.wpm, session.wpm()), stat),
        Span::styled("   ", muted),
        Span::styled(
            format!("{}{}% Accuracy", labels.accuracy, session.live_accuracy()),
            stat,
        ),
        Span::styled("   ", muted),
        Span::styled(format!("{}(tab) reset", labels.reset), muted),
    ])
}

fn prompt_spans(app: &App, palette: &Palette) -> Vec<Span<'static>> {
    let session = &app.session;
    let typed = session.user_input().chars().count();
    let states = session.char_states();

    let untyped = Style::default().fg(palette.untyped);
    let next = untyped.add_modifier(Modifier::UNDERLINED);
    let correct = Style::default().fg(palette.correct);
    let incorrect = Style::default()
        .fg(palette.incorrect)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let chunks = session
        .target_text()
        .chars()
        .zip(states)
        .enumerate()
        .chunk_by(|(idx, (_, state))| (*state, *idx == typed));

    let mut spans = Vec::new();
    for ((state, is_next), group) in &chunks {
        let text: String = group
            .map(|(_, (c, _))| match (state, c) {
                // a mistyped space would be invisible
                (CharState::Incorrect, ' ') => '·',
                _ => c,
            })
            .collect();
        let style = match (state, is_next) {
            (CharState::Correct, _) => correct,
            (CharState::Incorrect, _) => incorrect,
            (CharState::Untyped, true) => next,
            (CharState::Untyped, false) => untyped,
        };
        spans.push(Span::styled(text, style));
    }

    let overflow = session.overflow();
    if overflow > 0 {
        spans.push(Span::styled(format!(" +{overflow}"), incorrect));
    }
    spans
}

fn render_typing(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let labels = app.theme.labels();
    let chunks = typing_layout(app, area);
    let session = &app.session;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(palette.muted);
    let italic_muted = muted.add_modifier(Modifier::ITALIC);

    Paragraph::new(Line::from(vec![
        Span::styled("Typing ", bold.fg(palette.text)),
        Span::styled("Speed", bold.fg(palette.accent)),
        Span::styled(" Test", bold.fg(palette.text)),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[TITLE], buf);

    Paragraph::new(header_line(app, palette, &labels))
        .alignment(Alignment::Center)
        .render(chunks[HEADER], buf);

    let target_len = session.target_text().chars().count();
    let typed = session.user_input().chars().count();
    let ratio = charting::progress_ratio(typed, target_len);
    Gauge::default()
        .gauge_style(Style::default().fg(palette.accent).bg(palette.muted))
        .ratio(ratio)
        .label(format!("{:.0}%", ratio * 100.0))
        .render(chunks[PROGRESS], buf);

    let prompt_area = chunks[PROMPT];
    let fits_one_line = session.target_text().width() <= prompt_area.width as usize;
    Paragraph::new(Line::from(prompt_spans(app, palette)))
        .alignment(if fits_one_line {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(prompt_area, buf);

    let input_area = chunks[INPUT];
    let border = if app.input_focused {
        Style::default().fg(palette.accent)
    } else {
        muted
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(" your input ");
    let inner_width = input_area.width.saturating_sub(3) as usize;
    let input_line = if session.user_input().is_empty() {
        Line::from(Span::styled("Start typing here...", italic_muted))
    } else {
        Line::from(Span::styled(
            tail_fitting(session.user_input(), inner_width).to_string(),
            Style::default().fg(palette.text),
        ))
    };
    Paragraph::new(input_line)
        .block(input_block)
        .render(input_area, buf);

    if session.can_start() {
        Paragraph::new(Span::styled(
            "press (enter) to start, or just start typing",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[HINT], buf);
    }

    Paragraph::new(Span::styled(
        "(tab) new text / (ctrl+r) retry / (ctrl+w) delete word / (esc)ape",
        italic_muted,
    ))
    .render(chunks[LEGEND], buf);
}

fn render_results(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let Some(summary) = session.summary() else {
        return;
    };
    let extras = app.theme.has_chart();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(palette.muted);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // tier
            Constraint::Length(1),
            Constraint::Length(2), // stats
            Constraint::Length(1), // history summary
            Constraint::Length(1),
            Constraint::Min(0), // chart
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled("Test Results", bold.fg(palette.text)))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if extras {
        Paragraph::new(Span::styled(
            summary.tier.to_string(),
            bold.fg(palette.accent),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);

    let stat = |label: &str, value: String, color| {
        Line::from(vec![
            Span::styled(format!("{label}: "), muted),
            Span::styled(value, bold.fg(color)),
        ])
    };

    Paragraph::new(vec![
        stat("Words Per Minute", summary.wpm.to_string(), palette.accent),
        stat("Correct Characters", summary.correct.to_string(), palette.correct),
    ])
    .alignment(Alignment::Center)
    .render(columns[0], buf);

    Paragraph::new(vec![
        stat("Accuracy", format!("{}%", summary.accuracy), palette.accent),
        stat(
            "Incorrect Characters",
            summary.incorrect.to_string(),
            palette.incorrect,
        ),
    ])
    .alignment(Alignment::Center)
    .render(columns[1], buf);

    if extras {
        if let Some(history) = summary.history_summary {
            Paragraph::new(Span::styled(
                format!(
                    "avg {:.0} wpm   peak {} wpm   sd {:.1}   {:.1}s",
                    history.average,
                    history.peak,
                    history.std_dev,
                    summary.elapsed.as_secs_f64()
                ),
                muted.add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
        }

        render_wpm_chart(&summary.history, &summary.sample_times, palette, chunks[6], buf);
    }

    Paragraph::new(Span::styled(
        "(enter) try again / (tab) new text / (ctrl+r) retry / (esc)ape",
        muted.add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[7], buf);
}

fn render_wpm_chart(
    history: &[u32],
    sample_times: &[Duration],
    palette: &Palette,
    area: Rect,
    buf: &mut Buffer,
) {
    if history.is_empty() || area.height < 3 {
        return;
    }

    let gap = 1u16;
    let count = u16::try_from(history.len()).unwrap_or(u16::MAX);
    let gaps = gap.saturating_mul(count.saturating_sub(1));
    let usable = area.width.saturating_sub(gaps.saturating_add(2));
    let bar_width = (usable / count.max(1)).clamp(1, 6);

    // keep the most recent bars that fit inside the borders
    let inner = area.width.saturating_sub(2);
    let fits = usize::from((inner + gap) / (bar_width + gap)).max(1);
    let skip = history.len().saturating_sub(fits);

    let labels = charting::bar_labels(&sample_times[skip.min(sample_times.len())..]);
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(&history[skip..])
        .map(|(label, &wpm)| (label.as_str(), u64::from(wpm)))
        .collect();

    BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.muted))
                .title(" wpm over time "),
        )
        .data(data.as_slice())
        .bar_width(bar_width)
        .bar_gap(gap)
        .max(charting::compute_chart_max(history))
        .bar_style(Style::default().fg(palette.accent))
        .value_style(
            Style::default()
                .fg(palette.background)
                .bg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .label_style(Style::default().fg(palette.muted))
        .render(area, buf);
}

fn completion_rule(policy: CompletionPolicy) -> &'static str {
    match policy {
        CompletionPolicy::LengthReached => "the test ends once you have typed as much as the paragraph",
        CompletionPolicy::ExactMatch => "the test ends once the paragraph is typed exactly",
    }
}

fn render_intro(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let config = app.session.config();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(palette.muted);
    let body = Style::default().fg(palette.text);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Typing ", bold.fg(palette.text)),
            Span::styled("Speed", bold.fg(palette.accent)),
            Span::styled(" Test", bold.fg(palette.text)),
        ]),
        Line::from(Span::styled("Test your typing speed and accuracy", muted)),
        Line::default(),
        Line::from(Span::styled(
            format!(
                "• {}s on the clock, starting with your first keystroke",
                config.duration_secs
            ),
            body,
        )),
        Line::from(Span::styled(
            format!("• {}", completion_rule(config.completion)),
            body,
        )),
    ];
    let sampling_line = match config.sampling {
        SamplingPolicy::Periodic => format!(
            "• wpm is sampled every {}s and charted at the end",
            config.sample_period.as_secs()
        ),
        SamplingPolicy::Continuous => String::from("• wpm updates with every keystroke"),
    };
    lines.push(Line::from(Span::styled(sampling_line, body)));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "press (enter) to begin  ·  (esc) to quit",
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::ITALIC),
    )));

    let height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}
