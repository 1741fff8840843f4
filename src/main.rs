use color_eyre::Result;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use sakura_nav::{
    api::MapsClient,
    app::{App, Command},
    config::Config,
    events::{Event, EventHandler},
    location, logging, ui,
};
use std::{io, path::Path};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging(Path::new("logs"));
    color_eyre::install()?;
    // Chains onto color-eyre's hook
    install_panic_hook();

    let config = Config::load();
    let maps = match MapsClient::from_config(&config.maps) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("Maps services unavailable: {}", e);
            None
        }
    };

    let mut app = App::new(config.clone(), maps.is_some());
    let mut events = EventHandler::new(config.ui.tick_rate_ms);

    // Location updates for as long as the widget is up
    let subscription = location::from_config(&config.location).subscribe(events.tx.clone());

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut app, &mut events, maps.as_ref()).await;

    subscription.cancel();
    restore_terminal(terminal)?;
    info!("Shut down");
    result
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
    maps: Option<&MapsClient>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, app))?;

        let Some(event) = events.next().await else {
            break;
        };
        for command in app.handle_event(event) {
            match maps {
                Some(client) => dispatch(command, client.clone(), events.tx.clone()),
                None => warn!("Dropping {:?}: no maps client", command),
            }
        }
    }
    Ok(())
}

/// Runs a maps request in the background and posts its result as an event.
fn dispatch(command: Command, client: MapsClient, tx: UnboundedSender<Event>) {
    tokio::spawn(async move {
        let event = match command {
            Command::Autocomplete { seq, target, input } => Event::Predictions {
                seq,
                target,
                result: client.autocomplete(&input).await,
            },
            Command::ResolvePlace { seq, target, place_id } => Event::PlaceResolved {
                seq,
                target,
                result: client.place_details(&place_id).await,
            },
            Command::Directions { seq, origin, destination } => Event::DirectionsReceived {
                seq,
                result: client.directions(&origin, &destination).await,
            },
        };
        // The loop may already have exited.
        let _ = tx.send(event);
    });
}

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

/// Undoes `setup_terminal`. Shared by normal shutdown and the panic hook.
fn leave_screen(out: &mut impl io::Write) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(out, LeaveAlternateScreen, cursor::Show)
}

fn restore_terminal(mut terminal: Tui) -> Result<()> {
    leave_screen(terminal.backend_mut())?;
    Ok(())
}

fn install_panic_hook() {
    let report = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        // The report is unreadable on the alternate screen
        let _ = leave_screen(&mut io::stdout());
        report(info);
    }));
}
