//! Terminal status panel
//!
//! Draws a small boxed panel at the top of the terminal and redraws it in
//! place on every update:
//!
//! ```text
//! ╭────────────────────────────────────────────────────╮
//! │                     MACRO TOOL                     │
//! ├────────────────────────────────────────────────────┤
//! │ Status: ▶ Playing                        Speed: 1.5x │
//! │                                                    │
//! │ Progress: ██████████━━━━━━━━━━━━━━━━━━━━━━━━━━  25% │
//! ├────────────────────────────────────────────────────┤
//! │ [F8]           Record/Stop    [F9]           Play/Stop │
//! ╰────────────────────────────────────────────────────╯
//! ```

use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use parking_lot::Mutex;
use rust_i18n::t;
use std::collections::BTreeMap;
use std::io::{self, Write};

use super::StatusReporter;
use crate::config::{ThemeColor, ThemeConfig};

/// Narrowest panel, in terminal cells
const MIN_WIDTH: usize = 54;

/// Cells reserved for a `[KEY]` label in the hotkey table
const KEY_WIDTH: usize = 14;

/// Narrowest hotkey description column
const MIN_DESC_WIDTH: usize = 10;

/// Hotkey table layout, two pairs per row
const HOTKEY_ROWS: &[[&str; 2]] = &[
    ["record", "play"],
    ["speed_up", "speed_down"],
    ["toggle_language", ""],
];

/// Resolved panel colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelTheme {
    pub title: Color,
    pub border: Color,
    pub label: Color,
    pub recording: Color,
    pub playing: Color,
    pub idle: Color,
    pub progress: Color,
    pub progress_empty: Color,
    pub guide: Color,
}

impl PanelTheme {
    /// Resolve configured color names; unknown names use the terminal default
    pub fn from_config(config: &ThemeConfig) -> Self {
        let color = |field: &str, name: &str| to_color(ThemeColor::parse_or_reset(field, name));
        Self {
            title: color("title", &config.title),
            border: color("border", &config.border),
            label: color("label", &config.label),
            recording: color("status_recording", &config.status_recording),
            playing: color("status_playing", &config.status_playing),
            idle: Color::White,
            progress: color("progress_bar", &config.progress_bar),
            progress_empty: Color::DarkGrey,
            guide: color("guide_title", &config.guide_title),
        }
    }
}

impl Default for PanelTheme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}

fn to_color(color: ThemeColor) -> Color {
    match color {
        ThemeColor::Black => Color::Black,
        ThemeColor::Red => Color::DarkRed,
        ThemeColor::Green => Color::DarkGreen,
        ThemeColor::Yellow => Color::DarkYellow,
        ThemeColor::Blue => Color::DarkBlue,
        ThemeColor::Magenta => Color::DarkMagenta,
        ThemeColor::Cyan => Color::DarkCyan,
        ThemeColor::White => Color::Grey,
        ThemeColor::BrightBlack => Color::DarkGrey,
        ThemeColor::BrightRed => Color::Red,
        ThemeColor::BrightGreen => Color::Green,
        ThemeColor::BrightYellow => Color::Yellow,
        ThemeColor::BrightBlue => Color::Blue,
        ThemeColor::BrightMagenta => Color::Magenta,
        ThemeColor::BrightCyan => Color::Cyan,
        ThemeColor::BrightWhite => Color::White,
        ThemeColor::Reset => Color::Reset,
    }
}

/// Coarse activity shown by the status symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Recording,
    Playing,
    Idle,
}

impl Activity {
    fn of(status: &str) -> Self {
        let starts = |key: &str| status.starts_with(&*t!(key));
        if starts("status.recording") || starts("status.saving") {
            Activity::Recording
        } else if starts("status.playing") || starts("status.stopping") {
            Activity::Playing
        } else {
            Activity::Idle
        }
    }

    fn symbol(&self) -> char {
        match self {
            Activity::Recording => '●',
            Activity::Playing => '▶',
            Activity::Idle => '■',
        }
    }

    fn color(&self, theme: &PanelTheme) -> Color {
        match self {
            Activity::Recording => theme.recording,
            Activity::Playing => theme.playing,
            Activity::Idle => theme.idle,
        }
    }
}

/// Snapshot of everything the panel shows
#[derive(Debug, Clone)]
struct PanelState {
    status: String,
    speed: f64,
    progress: (usize, usize),
    hotkeys: BTreeMap<String, String>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            status: t!("status.ready").to_string(),
            speed: 1.0,
            progress: (0, 0),
            hotkeys: BTreeMap::new(),
        }
    }
}

/// Text drawn in one color
#[derive(Debug, Clone, PartialEq)]
struct Span {
    text: String,
    color: Color,
}

fn span(text: impl Into<String>, color: Color) -> Span {
    Span {
        text: text.into(),
        color,
    }
}

fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| display_width(&s.text)).sum()
}

/// One rendered row
#[derive(Debug, Clone, PartialEq, Default)]
struct PanelLine {
    spans: Vec<Span>,
}

impl PanelLine {
    fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

struct Inner {
    state: PanelState,
    theme: PanelTheme,
    out: Box<dyn Write + Send>,
}

/// [`StatusReporter`] that draws a boxed panel with crossterm
pub struct TerminalPanel {
    inner: Mutex<Inner>,
}

impl TerminalPanel {
    /// Panel drawing to stdout; clears the screen first
    pub fn stdout() -> Self {
        let mut out = io::stdout();
        if let Err(e) = execute!(out, Clear(ClearType::All), cursor::MoveTo(0, 0)) {
            tracing::debug!("Failed to clear terminal: {}", e);
        }
        Self::with_writer(Box::new(out))
    }

    /// Panel drawing to an arbitrary writer
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: PanelState::default(),
                theme: PanelTheme::default(),
                out,
            }),
        }
    }

    /// Use `theme` for subsequent draws
    pub fn with_theme(self, theme: PanelTheme) -> Self {
        self.inner.lock().theme = theme;
        self
    }

    /// Redraw with the current state
    pub fn redraw(&self) {
        let mut inner = self.inner.lock();
        Self::render(&mut inner);
    }

    fn update(&self, apply: impl FnOnce(&mut PanelState)) {
        let mut inner = self.inner.lock();
        apply(&mut inner.state);
        Self::render(&mut inner);
    }

    fn render(inner: &mut Inner) {
        let lines = layout(&inner.state, &inner.theme);
        if let Err(e) = draw(&mut inner.out, &lines) {
            tracing::debug!("Failed to draw status panel: {}", e);
        }
    }
}

impl StatusReporter for TerminalPanel {
    fn update_status(&self, status: &str) {
        self.update(|state| state.status = status.to_string());
    }

    fn update_speed(&self, speed: f64) {
        self.update(|state| state.speed = speed);
    }

    fn update_progress(&self, current: usize, total: usize) {
        self.update(|state| state.progress = (current, total));
    }

    fn set_hotkeys(&self, hotkeys: &BTreeMap<String, String>) {
        self.update(|state| state.hotkeys = hotkeys.clone());
    }
}

fn draw<W: Write>(out: &mut W, lines: &[PanelLine]) -> io::Result<()> {
    queue!(out, cursor::MoveTo(0, 0))?;
    for line in lines {
        for span in &line.spans {
            queue!(out, SetForegroundColor(span.color), Print(&span.text))?;
        }
        queue!(
            out,
            ResetColor,
            Clear(ClearType::UntilNewLine),
            Print("\r\n")
        )?;
    }
    queue!(out, Clear(ClearType::FromCursorDown))?;
    out.flush()
}

fn layout(state: &PanelState, theme: &PanelTheme) -> Vec<PanelLine> {
    let descriptions: Vec<String> = HOTKEY_ROWS
        .iter()
        .flatten()
        .filter(|action| !action.is_empty())
        .map(|action| t!(format!("hotkey.{}", action)).to_string())
        .collect();
    let desc_width = descriptions
        .iter()
        .map(|d| display_width(d))
        .max()
        .unwrap_or(0)
        .max(MIN_DESC_WIDTH);
    let width = MIN_WIDTH.max(2 * (KEY_WIDTH + 1 + desc_width) + 4);
    let inner = width - 2;

    let rule = |left: char, right: char| PanelLine {
        spans: vec![span(
            format!("{}{}{}", left, "─".repeat(inner), right),
            theme.border,
        )],
    };
    let row = |mut content: Vec<Span>, align: Align| {
        let padding = inner.saturating_sub(spans_width(&content));
        let (before, after) = match align {
            Align::Left => (0, padding),
            Align::Center => (padding / 2, padding - padding / 2),
        };
        let mut spans = vec![span("│", theme.border), span(" ".repeat(before), Color::Reset)];
        spans.append(&mut content);
        spans.push(span(" ".repeat(after), Color::Reset));
        spans.push(span("│", theme.border));
        PanelLine { spans }
    };

    let mut lines = vec![
        rule('╭', '╮'),
        row(vec![span(t!("title"), theme.title)], Align::Center),
        rule('├', '┤'),
    ];

    let activity = Activity::of(&state.status);
    let status_label = format!("{}:", t!("label.status"));
    let status_text = format!(" {} {}", activity.symbol(), state.status);
    let speed_label = format!("{}:", t!("label.speed"));
    let speed_text = format!(" {:.1}x", state.speed);
    let used = 2
        + display_width(&status_label)
        + display_width(&status_text)
        + display_width(&speed_label)
        + display_width(&speed_text);
    let gap = inner.saturating_sub(used).max(1);
    lines.push(row(
        vec![
            span(" ", Color::Reset),
            span(status_label, theme.label),
            span(status_text, activity.color(theme)),
            span(" ".repeat(gap), Color::Reset),
            span(speed_label, theme.label),
            span(speed_text, Color::Reset),
            span(" ", Color::Reset),
        ],
        Align::Left,
    ));
    lines.push(row(Vec::new(), Align::Left));

    let mut progress = vec![span(" ", Color::Reset)];
    progress.extend(progress_spans(state.progress, inner, theme));
    lines.push(row(progress, Align::Left));
    lines.push(rule('├', '┤'));

    if state.hotkeys.is_empty() {
        lines.push(row(
            vec![span(t!("loading.hotkeys"), Color::Reset)],
            Align::Center,
        ));
    } else {
        for pair in HOTKEY_ROWS {
            let mut cells = Vec::new();
            for action in pair {
                let Some(key) = state.hotkeys.get(*action) else {
                    continue;
                };
                let label = format!("[{}]", key.to_uppercase());
                let desc = t!(format!("hotkey.{}", action));
                cells.push(span(" ", Color::Reset));
                cells.push(span(pad(&label, KEY_WIDTH, Align::Left), theme.guide));
                cells.push(span(
                    format!(" {}", pad(&desc, desc_width, Align::Left)),
                    Color::Reset,
                ));
            }
            if !cells.is_empty() {
                lines.push(row(cells, Align::Left));
            }
        }
    }

    lines.push(rule('╰', '╯'));
    lines
}

fn progress_spans(
    (current, total): (usize, usize),
    inner: usize,
    theme: &PanelTheme,
) -> Vec<Span> {
    let label = span(format!("{}:", t!("label.progress")), theme.label);
    if total == 0 {
        return vec![label, span(" --", Color::Reset)];
    }

    let fraction = (current as f64 / total as f64).clamp(0.0, 1.0);
    let percent = format!(" {:>3}%", (fraction * 100.0) as u32);
    let reserved = 1 + display_width(&label.text) + 1 + display_width(&percent);
    let bar_len = inner.saturating_sub(reserved);
    let filled = (bar_len as f64 * fraction) as usize;
    vec![
        label,
        span(" ", Color::Reset),
        span("█".repeat(filled), theme.progress),
        span("━".repeat(bar_len - filled), theme.progress_empty),
        span(percent, Color::Reset),
    ]
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let padding = width.saturating_sub(display_width(text));
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(padding)),
        Align::Center => {
            let left = padding / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(padding - left))
        }
    }
}

/// Terminal cells occupied by `text`; CJK and fullwidth forms take two
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| {
            let c = c as u32;
            let wide = matches!(c,
                0x1100..=0x115F
                | 0x2E80..=0x303E
                | 0x3041..=0x33FF
                | 0x3400..=0x4DBF
                | 0x4E00..=0x9FFF
                | 0xA000..=0xA4CF
                | 0xAC00..=0xD7A3
                | 0xF900..=0xFAFF
                | 0xFE30..=0xFE4F
                | 0xFF00..=0xFF60
                | 0xFFE0..=0xFFE6);
            if wide {
                2
            } else {
                1
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{set_language, Language};
    use serial_test::serial;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn state(status: &str) -> PanelState {
        PanelState {
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("就绪"), 4);
        assert_eq!(display_width("●"), 1);
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("ab", 5, Align::Left), "ab   ");
        assert_eq!(pad("ab", 6, Align::Center), "  ab  ");
        assert_eq!(pad("就绪", 6, Align::Left), "就绪  ");
        assert_eq!(pad("toolong", 3, Align::Left), "toolong");
    }

    #[test]
    #[serial]
    fn test_lines_share_width() {
        set_language(Language::English);
        let mut s = state("Playing");
        s.progress = (3, 4);
        s.hotkeys.insert("record".into(), "f8".into());
        s.hotkeys.insert("play".into(), "f9".into());

        let lines = layout(&s, &PanelTheme::default());
        let width = display_width(&lines[0].text());
        assert!(width >= MIN_WIDTH);
        for line in &lines {
            assert_eq!(display_width(&line.text()), width, "{:?}", line.text());
        }
    }

    #[test]
    #[serial]
    fn test_status_symbol_follows_activity() {
        set_language(Language::English);
        assert_eq!(Activity::of("Recording"), Activity::Recording);
        assert_eq!(Activity::of("Playing (Pass 1/3)"), Activity::Playing);
        assert_eq!(Activity::of("Ready"), Activity::Idle);
        assert_eq!(Activity::of("Saved: macro.json"), Activity::Idle);

        let lines = layout(&state("Recording"), &PanelTheme::default());
        assert!(lines[3].text().contains("● Recording"));
    }

    #[test]
    #[serial]
    fn test_progress_bar() {
        set_language(Language::English);
        let theme = PanelTheme::default();
        let text = |progress| {
            progress_spans(progress, 52, &theme)
                .iter()
                .map(|s| s.text.clone())
                .collect::<String>()
        };
        assert_eq!(text((0, 0)), "Progress: --");

        let half = text((1, 2));
        assert!(half.ends_with(" 50%"));
        assert_eq!(display_width(&half), 52 - 1);

        let full = text((9, 4));
        assert!(full.ends_with("100%"));
        assert!(!full.contains('━'));
    }

    #[test]
    #[serial]
    fn test_theme_colors_reach_spans() {
        set_language(Language::English);
        let theme = PanelTheme::from_config(&ThemeConfig {
            border: "GREEN".to_string(),
            status_recording: "BRIGHT_MAGENTA".to_string(),
            label: "not-a-color".to_string(),
            ..Default::default()
        });
        assert_eq!(theme.border, Color::DarkGreen);
        assert_eq!(theme.label, Color::Reset);

        let lines = layout(&state("Recording"), &theme);
        assert!(lines[0].spans.iter().all(|s| s.color == Color::DarkGreen));
        let status = lines[3]
            .spans
            .iter()
            .find(|s| s.text.contains("● Recording"))
            .unwrap();
        assert_eq!(status.color, Color::Magenta);
    }

    #[test]
    #[serial]
    fn test_panel_writes_on_update() {
        set_language(Language::English);
        let buffer = SharedBuffer::default();
        let panel = TerminalPanel::with_writer(Box::new(buffer.clone()));

        panel.update_speed(2.5);
        let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
        assert!(output.contains("MACRO TOOL"));
        assert!(output.contains("Speed: 2.5x"));
        assert!(output.contains("Loading..."));
    }
}
