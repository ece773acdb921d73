use std::{io, path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use pollpanel::app::App;
use pollpanel::config::{Overrides, Settings, get_save_path};
use pollpanel::input::handle_key;
use pollpanel::network::{ActionGateway, HttpGateway};
use pollpanel::theme::Theme;
use pollpanel::ui;
use pollpanel::utils::init_logger;

#[derive(Parser, Debug)]
#[command(name = "pollpanel", version, about = "Dispatch and manage WhatsApp polls through an action walker")]
struct Cli {
    /// Extra config file merged over the user config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Action walker base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Agent that owns the poll manager action
    #[arg(long)]
    agent_id: Option<String>,

    /// Polls per page
    #[arg(long)]
    page_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let overrides = Overrides {
        config: cli.config,
        base_url: cli.base_url,
        agent_id: cli.agent_id,
        page_limit: cli.page_limit,
    };
    let settings = Settings::new(&overrides)?;
    let config_path = get_save_path(&overrides).ok();
    if let Some(path) = settings.log_path() {
        init_logger(&path)?;
    }

    let gateway = HttpGateway::new(&settings);
    info!("pollpanel talking to {} as agent {:?}", gateway.endpoint(), settings.agent_id);

    let mut app = App::new(settings, config_path);

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &gateway).await;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn run<B: Backend, G: ActionGateway>(terminal: &mut Terminal<B>, app: &mut App, gateway: &G) -> Result<()> {
    let theme = Theme::default();
    app.sync(gateway).await;

    loop {
        terminal.draw(|f| ui::render(f, app, &theme))?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                handle_key(key, app, gateway).await;
                if app.should_quit {
                    break;
                }
                app.sync(gateway).await;
            }
        }
    }

    info!("pollpanel exiting");
    Ok(())
}
