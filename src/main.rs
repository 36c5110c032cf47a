mod ui;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn, LevelFilter};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io::{self, stdin};
use typespeed::{
    app_dirs::AppDirs,
    completion::CompletionPolicy,
    config::{Config, ConfigStore, FileConfigStore},
    corpus::Corpus,
    logging,
    runtime::{self, Runner, TypingEvent, TICK_RATE},
    theme::Theme,
    wpm::SamplingPolicy,
    Phase, Session,
};

/// typing speed test for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing speed test: type the paragraph shown, watch wpm and accuracy live, and get a summary when the time runs out or the paragraph is done."
)]
pub struct Cli {
    /// number of seconds the test runs for
    #[clap(short = 's', long)]
    duration_secs: Option<u32>,

    /// when typing alone ends the test
    #[clap(short = 'c', long, value_enum)]
    completion: Option<CompletionPolicy>,

    /// how wpm is measured while typing
    #[clap(long, value_enum)]
    sampling: Option<SamplingPolicy>,

    /// seconds between wpm samples
    #[clap(long)]
    sample_secs: Option<u32>,

    /// upper bound for a single wpm sample
    #[clap(long)]
    wpm_cap: Option<u32>,

    /// presentation theme
    #[clap(short = 't', long, value_enum)]
    theme: Option<Theme>,

    /// custom paragraph for the first test
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// log file verbosity (overrides RUST_LOG)
    #[clap(long)]
    log_level: Option<LevelFilter>,
}

impl Cli {
    /// Flags win over the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(secs) = self.duration_secs {
            config.duration_secs = secs;
        }
        if let Some(completion) = self.completion {
            config.completion = completion;
        }
        if let Some(sampling) = self.sampling {
            config.sampling = sampling;
        }
        if let Some(secs) = self.sample_secs {
            config.sample_secs = secs;
        }
        if let Some(cap) = self.wpm_cap {
            config.wpm_cap = cap;
        }
        if let Some(theme) = self.theme {
            config.theme = theme;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Intro,
    Typing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub theme: Theme,
    pub screen: Screen,
    pub input_focused: bool,
}

impl App {
    pub fn new(session: Session, theme: Theme) -> Self {
        Self {
            session,
            theme,
            screen: if theme.has_intro() {
                Screen::Intro
            } else {
                Screen::Typing
            },
            input_focused: false,
        }
    }

    /// New paragraph, back to the typing screen
    pub fn reset(&mut self) {
        self.session.reset();
        self.screen = Screen::Typing;
        self.input_focused = false;
    }

    /// Same paragraph, back to the typing screen
    pub fn retry(&mut self) {
        self.session.retry();
        self.screen = Screen::Typing;
        self.input_focused = false;
    }

    pub fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => return KeyOutcome::Quit,
            KeyCode::Char('c') if ctrl => return KeyOutcome::Quit,
            KeyCode::Char('r') if ctrl => {
                self.retry();
                return KeyOutcome::Continue;
            }
            KeyCode::Tab => {
                self.reset();
                return KeyOutcome::Continue;
            }
            _ => {}
        }

        match self.screen {
            Screen::Intro => {
                if key.code == KeyCode::Enter {
                    self.screen = Screen::Typing;
                    self.session.start();
                }
            }
            Screen::Typing => match key.code {
                KeyCode::Enter if self.session.can_start() => {
                    self.session.start();
                }
                KeyCode::Backspace if ctrl || alt => {
                    self.session.delete_word();
                }
                KeyCode::Backspace => {
                    self.session.backspace();
                }
                KeyCode::Char('w') if ctrl => {
                    self.session.delete_word();
                }
                KeyCode::Char(c) if !ctrl && !alt => {
                    self.session.push_char(c);
                }
                _ => {}
            },
            Screen::Results => {
                if key.code == KeyCode::Enter {
                    self.reset();
                }
            }
        }

        self.sync();
        KeyOutcome::Continue
    }

    /// Polls the session timers. Returns true when the frame needs redrawing.
    pub fn on_tick(&mut self) -> bool {
        if self.session.phase() != Phase::Active {
            return false;
        }

        self.session.on_tick();
        self.sync();
        true
    }

    fn sync(&mut self) {
        if self.session.take_focus_request() {
            self.input_focused = true;
        }
        if self.session.phase() == Phase::Finished {
            self.screen = Screen::Results;
            self.input_focused = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::log_path() {
        if let Err(e) = logging::init(&path, cli.log_level) {
            eprintln!("typespeed: logging disabled: {e:#}");
        }
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store
            .save(&config)
            .with_context(|| format!("saving config to {}", store.path().display()))?;
        info!("saved config to {}", store.path().display());
    }

    let corpus = Corpus::builtin().context("loading builtin corpus")?;
    let session = match cli.prompt.clone().filter(|p| !p.is_empty()) {
        Some(prompt) => Session::with_target(corpus, config.session_config(), prompt),
        None => Session::new(corpus, config.session_config()),
    };
    let mut app = App::new(session, config.theme);

    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    if let Err(e) = restore_terminal(&mut terminal) {
        warn!("failed to restore terminal: {e:#}");
    }

    result
}

fn restore_terminal<B: Backend + io::Write>(terminal: &mut Terminal<B>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let runner = Runner::new(runtime::terminal_events(), TICK_RATE);

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            TypingEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            TypingEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            TypingEvent::Key(key) => {
                if app.on_key(key) == KeyOutcome::Quit {
                    break;
                }
                // steady typing can starve the tick timeout
                app.on_tick();
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn test_app(target: &str, theme: Theme) -> App {
        let corpus = Corpus::from_paragraphs(vec![target.to_string()]).unwrap();
        let session = Session::with_target(
            corpus,
            Config::default().session_config(),
            target.to_string(),
        );
        App::new(session, theme)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["typespeed"]);

        assert_eq!(cli.duration_secs, None);
        assert_eq!(cli.completion, None);
        assert_eq!(cli.theme, None);
        assert_eq!(cli.prompt, None);
        assert!(!cli.save_config);
        assert_eq!(cli.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::parse_from([
            "typespeed",
            "-s",
            "30",
            "--completion",
            "exact-match",
            "--sampling",
            "continuous",
            "--sample-secs",
            "3",
            "--wpm-cap",
            "150",
            "--theme",
            "icons",
        ]);
        let config = cli.apply(Config::default());

        assert_eq!(config.duration_secs, 30);
        assert_eq!(config.completion, CompletionPolicy::ExactMatch);
        assert_eq!(config.sampling, SamplingPolicy::Continuous);
        assert_eq!(config.sample_secs, 3);
        assert_eq!(config.wpm_cap, 150);
        assert_eq!(config.theme, Theme::Icons);
    }

    #[test]
    fn test_cli_prompt_and_log_level() {
        let cli = Cli::parse_from(["typespeed", "-p", "hello world", "--log-level", "debug"]);
        assert_eq!(cli.prompt.as_deref(), Some("hello world"));
        assert_eq!(cli.log_level, Some(LevelFilter::Debug));
    }

    #[test]
    fn test_dark_theme_opens_on_intro() {
        let mut app = test_app("cat dog", Theme::Dark);
        assert_eq!(app.screen, Screen::Intro);

        app.on_key(key(KeyCode::Char('x')));
        assert_eq!(app.screen, Screen::Intro);
        assert_eq!(app.session.phase(), Phase::Idle);

        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Typing);
        assert_eq!(app.session.phase(), Phase::Active);
        assert!(app.input_focused);
    }

    #[test]
    fn test_basic_theme_skips_intro() {
        let app = test_app("cat dog", Theme::Basic);
        assert_eq!(app.screen, Screen::Typing);
    }

    #[test]
    fn test_typing_through_to_results() {
        let mut app = test_app("cat dog", Theme::Basic);

        for c in "cat dog".chars() {
            app.on_key(key(KeyCode::Char(c)));
        }

        assert_eq!(app.screen, Screen::Results);
        assert_eq!(app.session.correct_count(), 7);
        assert_eq!(app.session.accuracy(), 100);
        assert!(!app.input_focused);
    }

    #[test]
    fn test_keys_ignored_on_results() {
        let mut app = test_app("hi", Theme::Basic);
        app.on_key(key(KeyCode::Char('h')));
        app.on_key(key(KeyCode::Char('i')));
        assert_eq!(app.screen, Screen::Results);

        app.on_key(key(KeyCode::Char('x')));
        assert_eq!(app.session.user_input(), "hi");

        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Typing);
        assert_eq!(app.session.phase(), Phase::Idle);
    }

    #[test]
    fn test_editing_keys() {
        let mut app = test_app("cat dog fish", Theme::Basic);
        for c in "cat dox".chars() {
            app.on_key(key(KeyCode::Char(c)));
        }

        app.on_key(key(KeyCode::Backspace));
        assert_eq!(app.session.user_input(), "cat do");

        app.on_key(ctrl('w'));
        assert_eq!(app.session.user_input(), "cat ");

        app.on_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::ALT));
        assert_eq!(app.session.user_input(), "");
    }

    #[test]
    fn test_enter_starts_only_before_typing() {
        let mut app = test_app("cat dog", Theme::Basic);

        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.session.phase(), Phase::Active);

        app.on_key(key(KeyCode::Char('c')));
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.session.user_input(), "c");
    }

    #[test]
    fn test_control_chars_are_not_typed() {
        let mut app = test_app("cat dog", Theme::Basic);
        app.on_key(ctrl('x'));

        assert_eq!(app.session.user_input(), "");
        assert_eq!(app.session.phase(), Phase::Idle);
    }

    #[test]
    fn test_tab_resets_and_ctrl_r_retries() {
        let mut app = test_app("cat dog", Theme::Basic);
        app.on_key(key(KeyCode::Char('c')));

        app.on_key(ctrl('r'));
        assert_eq!(app.session.phase(), Phase::Idle);
        assert_eq!(app.session.target_text(), "cat dog");

        app.on_key(key(KeyCode::Char('c')));
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.session.phase(), Phase::Idle);
        assert_eq!(app.session.user_input(), "");
        assert!(app.session.corpus().contains(app.session.target_text()));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = test_app("cat", Theme::Basic);
        assert_eq!(app.on_key(key(KeyCode::Esc)), KeyOutcome::Quit);
        assert_eq!(app.on_key(ctrl('c')), KeyOutcome::Quit);
        assert_eq!(app.on_key(key(KeyCode::Char('c'))), KeyOutcome::Continue);
    }

    #[test]
    fn test_tick_only_redraws_while_active() {
        let mut app = test_app("cat dog", Theme::Basic);
        assert!(!app.on_tick());

        app.on_key(key(KeyCode::Char('c')));
        assert!(app.on_tick());
    }
}
