use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use coach::cli::{self, Command, PgnPaste};
use coach::clients::gemini::GeminiClient;
use coach::clients::lichess::LichessClient;
use coach::config::Config;
use coach::render;
use coach::session::{Event, SessionController};

/// Replay chess games and talk them over with an AI coach.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PGN file to load at startup
    #[arg(long)]
    pgn_file: Option<PathBuf>,

    /// Lichess user whose recent games are listed at startup
    #[arg(long)]
    lichess_user: Option<String>,

    /// Gemini model name (overrides GEMINI_MODEL)
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with the board
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(model) = args.model {
        config.gemini_model = model;
    }
    if config.gemini_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY not set - analysis and chat are unavailable");
    }

    let lichess = LichessClient::new(&config)?;
    let gemini = GeminiClient::new(&config)?;
    let mut controller = SessionController::new(Arc::new(lichess), Arc::new(gemini));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if let Some(path) = args.pgn_file {
        load_file(&mut controller, path).await;
    }
    if let Some(user) = args.lichess_user {
        handle(&mut controller, Command::Session(Event::SearchUser(user)), &mut lines).await?;
    }

    println!("Type 'help' for commands.");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match cli::parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => handle(&mut controller, command, &mut lines).await?,
            Err(e) => println!("{e}"),
        }
    }

    Ok(())
}

async fn handle(
    controller: &mut SessionController,
    command: Command,
    lines: &mut Lines<BufReader<Stdin>>,
) -> anyhow::Result<()> {
    match command {
        Command::Session(event) => dispatch(controller, event).await,
        Command::LoadFile(path) => load_file(controller, path).await,
        Command::PastePgn => {
            println!("Paste the PGN, then an empty line:");
            let mut paste = PgnPaste::default();
            while let Some(line) = lines.next_line().await? {
                if paste.push_line(&line) {
                    break;
                }
            }
            if !paste.is_empty() {
                dispatch(controller, Event::SubmitPgn(paste.into_text())).await;
            }
        }
        Command::ShowBoard => println!("{}", render::board(controller.state())),
        Command::ShowMoves => println!("{}", render::moves(&controller.state().replay)),
        Command::ShowReport => println!("{}", render::report(controller.state().analysis.as_ref())),
        Command::ShowGames => println!("{}", render::games(&controller.state().games)),
        Command::ShowChat => println!("{}", render::chat(&controller.state().chat)),
        Command::Help => println!("{}", cli::HELP),
        Command::Quit => {}
    }
    Ok(())
}

/// Run one session event and print what changed.
async fn dispatch(controller: &mut SessionController, event: Event) {
    let view = view_after(&event);
    let chat_before = controller.state().chat.len();
    let state = controller.dispatch(event).await;

    if let Some(status) = render::status(state) {
        println!("{status}");
    }
    if state.error.is_some() && !matches!(view, View::Board) {
        return;
    }
    match view {
        View::Board => println!("{}", render::board(state)),
        View::Games => println!("{}", render::games(&state.games)),
        View::Report => println!("{}", render::report(state.analysis.as_ref())),
        View::Reply => {
            // Skip the question itself, it is already on screen
            if state.chat.len() > chat_before + 1 {
                println!("{}", render::chat(&state.chat[chat_before + 1..]));
            }
        }
        View::Nothing => {}
    }
}

/// Read a PGN file in full and submit it as the game text.
async fn load_file(controller: &mut SessionController, path: PathBuf) {
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => dispatch(controller, Event::SubmitPgn(text)).await,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read PGN file");
            println!("Could not read {}: {e}", path.display());
        }
    }
}

enum View {
    Board,
    Games,
    Report,
    Reply,
    Nothing,
}

fn view_after(event: &Event) -> View {
    match event {
        Event::SubmitPgn(_)
        | Event::SelectGame(_)
        | Event::UserMove { .. }
        | Event::Navigate(_)
        | Event::Reset => View::Board,
        Event::SearchUser(_) => View::Games,
        Event::RequestAnalysis => View::Report,
        Event::SendChat(_) => View::Reply,
        _ => View::Nothing,
    }
}
