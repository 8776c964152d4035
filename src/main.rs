//! Macro Recorder - Main Entry Point
//!
//! Installs the global input hook, shows the status panel and dispatches
//! hotkeys to the session controller until the process is interrupted.

use anyhow::Context;
use clap::Parser;
use macrokey_rs::{
    config::{self, AppConfig, HotkeyAction, HotkeyBindings},
    i18n,
    input::{HotkeyListener, InputHub, RdevHook, RdevInjector},
    session::{Player, Recorder, SessionController, SpeedHandle},
    status::{PanelTheme, StatusReporter, TerminalPanel, TracingReporter},
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Record and replay mouse and keyboard macros with global hotkeys
#[derive(Debug, Parser)]
#[command(name = "macrokey", version, about)]
struct Args {
    /// Settings file (created with defaults if missing)
    #[arg(long, default_value = config::SETTINGS_FILE)]
    config: PathBuf,

    /// Macro file to record to and play from (overrides settings)
    #[arg(long = "macro")]
    macro_file: Option<PathBuf>,

    /// Playback passes, 0 loops until stopped (overrides settings)
    #[arg(long)]
    repeats: Option<u32>,

    /// Initial playback speed (overrides settings)
    #[arg(long)]
    speed: Option<f64>,

    /// Log status to stdout instead of drawing the panel
    #[arg(long)]
    headless: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.headless);

    tracing::info!("Starting macro recorder");

    if let Err(e) = run(args) {
        tracing::error!("Fatal error: {:#}", e);
        eprintln!("\n{:#}", e);
        eprintln!("{}", i18n::fatal_error_prompt());
        if std::io::stdin().is_terminal() {
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
        }
        return Err(e);
    }
    Ok(())
}

/// Log to `macro.log` in the app data directory, and to stdout when headless
fn init_logging(headless: bool) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,macrokey_rs=debug"));

    let log_dir = config::ensure_app_data_dir().unwrap_or_else(|_| PathBuf::from("."));
    let appender = tracing_appender::rolling::never(log_dir, config::LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false);
    let stdout_layer = headless.then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut app_config = AppConfig::load_or_create(&args.config);
    if let Some(path) = &args.macro_file {
        app_config.macro_filename = path.display().to_string();
    }
    if let Some(repeats) = args.repeats {
        app_config.repeats = repeats;
    }
    if let Some(speed) = args.speed {
        app_config.default_speed = speed;
    }
    app_config.validate();
    i18n::set_language(app_config.language);

    let hub = Arc::new(InputHub::new());
    let _hook = RdevHook::spawn(hub.clone()).context("Failed to install the input hook")?;

    let reporter: Arc<dyn StatusReporter> = if args.headless {
        Arc::new(TracingReporter)
    } else {
        let theme = PanelTheme::from_config(&app_config.theme);
        Arc::new(TerminalPanel::stdout().with_theme(theme))
    };

    let playback = app_config.playback();
    let recorder = Recorder::new(hub.clone(), reporter.clone(), &app_config.macro_filename)
        .with_sample_interval(app_config.sample_interval())
        .with_excluded_key(app_config.hotkeys.key_for(HotkeyAction::ToggleRecord));
    let player = Player::new(
        reporter.clone(),
        Arc::new(RdevInjector::new()),
        SpeedHandle::new(playback.speed),
    )
    .with_repeats(playback.repeats);

    let mut controller = SessionController::new(recorder, player, reporter);
    controller.set_hotkeys(app_config.hotkeys.display_map());
    controller.announce();

    let bindings = HotkeyBindings::from_config(&app_config.hotkeys);
    let (_listener, actions) = HotkeyListener::attach(hub, bindings);

    tracing::info!(
        macro_file = %controller.macro_path().display(),
        speed = playback.speed,
        repeats = playback.repeats,
        "Ready for hotkeys"
    );

    for action in actions.iter() {
        controller.handle(action);
    }

    controller.shutdown();
    Ok(())
}
