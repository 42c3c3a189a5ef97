use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use workflow_tracker::app::App;
use workflow_tracker::cli::{run_command, Cli};
use workflow_tracker::logging::{init_tracing, LogTarget};
use workflow_tracker::sdk::WorkflowApi;
use workflow_tracker::tracker::{open_gate, TrackerOptions};
use workflow_tracker::ui::ui;
use workflow_tracker::{HttpWorkflowClient, TrackerConfig};

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = TrackerConfig::load(cli.config.as_deref(), &cli.overrides())?;
    let target = if cli.command.is_some() {
        LogTarget::Stderr
    } else {
        LogTarget::File
    };
    let _log_guard = init_tracing(&config, target)?;

    let api: Arc<dyn WorkflowApi> = Arc::new(HttpWorkflowClient::new(&config.api)?);
    let options = TrackerOptions {
        poll_interval: config.poll_interval(),
    };
    let runtime = tokio::runtime::Runtime::new()?;

    match &cli.command {
        Some(command) => {
            let mut stdout = io::stdout();
            runtime.block_on(run_command(api, command, cli.json, options, &mut stdout))
        }
        None => {
            info!(base_url = %config.api.base_url, "Starting terminal UI");
            let mut app = App::new(
                api,
                runtime.handle().clone(),
                options,
                open_gate(),
                config.api.base_url.clone(),
            );
            run_tui(&mut app)
        }
    }
}

fn run_tui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = %err, "Terminal UI exited with an error");
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.tick();

        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        app.should_quit = true;
                    } else {
                        app.handle_key(key.code);
                    }
                }
            }
        }

        if app.should_quit {
            info!("Quitting");
            return Ok(());
        }
    }
}
