use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, anyhow};
use chrono::Local;
use tracing::{debug, info, instrument, warn};

use crate::cli::{BooksCommand, Command, NotesCommand, SessionCommand, TaskCommand};
use crate::config::Config;
use crate::deck::{DeckFilter, DeckView, TaskDeck, TaskPatch, UuidIds};
use crate::feeds::{Coordinates, NewsClient, WeatherClient};
use crate::layout;
use crate::mode::{Mode, mode_flag};
use crate::relay::ChatRelay;
use crate::render::Renderer;
use crate::session::TimerSession;
use crate::store::SessionStore;
use crate::timer::TimerDurations;
use crate::widgets::audio::Turntable;
use crate::widgets::books::Books;
use crate::widgets::enforcer::Terminal;
use crate::widgets::incinerator::{Incinerator, Press};
use crate::widgets::notes::Notepad;
use crate::widgets::{dice, poker, quotes, revolver, wheel};

#[instrument(skip(store, cfg, renderer, command))]
pub fn dispatch(
    store: &SessionStore,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::Task(action) => cmd_task(store, renderer, action),
        Command::Notes(action) => cmd_notes(store, action),
        Command::Books(action) => cmd_books(store, renderer, action),
        Command::Timer { mode } => block_on(cmd_timer(cfg, renderer, mode)),
        Command::Chat { message } => block_on(cmd_chat(cfg, message.join(" "))),
        Command::Weather { lat, lon } => block_on(cmd_weather(cfg, lat, lon)),
        Command::News => block_on(cmd_news(cfg)),
        Command::Quote => {
            let quote = quotes::QuoteDeck::new().next(&mut rand::thread_rng());
            println!("\"{}\"\n  - {}", quote.text, quote.author);
            Ok(())
        }
        Command::Dice => {
            let roll = dice::roll(&mut rand::thread_rng());
            for row in 0..3 {
                let [left, right] = roll.dice.map(|value| dice::pips(value)[row]);
                println!("[{left}] [{right}]");
            }
            println!("Total: {}", roll.total());
            Ok(())
        }
        Command::Roulette => {
            let mut gun = revolver::Revolver::default();
            let state = gun
                .pull(&mut rand::thread_rng())
                .ok_or_else(|| anyhow!("the revolver is jammed"))?;
            println!("{}", revolver::describe(state));
            Ok(())
        }
        Command::Wheel => {
            let spin = wheel::spin(&mut rand::thread_rng());
            println!("{} {}", spin.number, spin.color.as_str());
            Ok(())
        }
        Command::Poker => cmd_poker(),
        Command::Enforcer { command } => cmd_enforcer(renderer, &command.join(" ")),
        Command::Layout { mode } => cmd_layout(mode),
        Command::Reset { yes } => cmd_reset(store, cfg, yes),
        Command::Session(SessionCommand::End) => {
            store.clear()?;
            println!("Session ended. Everything stored is gone.");
            Ok(())
        }
    }
}

fn block_on<F: Future<Output = anyhow::Result<()>>>(future: F) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?
        .block_on(future)
}

#[instrument(skip(store, renderer))]
fn cmd_task(store: &SessionStore, renderer: &Renderer, action: TaskCommand) -> anyhow::Result<()> {
    let mut deck = TaskDeck::mount(store);

    match action {
        TaskCommand::Add {
            title,
            description,
            due,
            priority,
        } => {
            let id = deck
                .create(&title, &description, due.as_deref(), priority)?
                .ok_or_else(|| anyhow!("a task needs a title"))?;
            println!("Created task {id}.");
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            due,
            priority,
        } => {
            let id = deck.resolve(&id)?.id.clone();
            let patch = TaskPatch {
                title,
                description,
                due_date: due.map(|due| Some(due).filter(|d| !d.trim().is_empty())),
                priority,
                completed: None,
            };
            if patch.is_empty() {
                return Err(anyhow!("edit requires at least one field"));
            }
            deck.update(&id, patch)?;
            println!("Modified task {id}.");
        }
        TaskCommand::Done { id } => {
            let id = deck.resolve(&id)?.id.clone();
            match deck.toggle_complete(&id)? {
                Some(true) => println!("Archived task {id}."),
                Some(false) => println!("Reopened task {id}."),
                None => warn!(id = %id, "task vanished before toggle"),
            }
        }
        TaskCommand::Delete { id } => {
            let id = deck.resolve(&id)?.id.clone();
            deck.delete(&id)?;
            println!("Deleted task {id}.");
        }
        TaskCommand::List { archive } => {
            let view = if archive {
                DeckFilter::Archive
            } else {
                DeckFilter::Active
            };
            let tasks = deck.filter(view);
            if tasks.is_empty() {
                println!("No tasks.");
            } else {
                renderer.write_deck(io::stdout().lock(), &tasks, view)?;
            }
        }
        TaskCommand::Show { id, face } => {
            let task = deck.resolve(&id)?;
            let mut view = DeckView::default();
            let mut out = io::stdout().lock();
            match face {
                Some(face) => {
                    let face = view.turn_to(&task.id, face);
                    renderer.write_card(&mut out, task, face)?;
                }
                None => {
                    renderer.write_card(&mut out, task, view.face(&task.id))?;
                    writeln!(out)?;
                    renderer.write_card(&mut out, task, view.flip(&task.id))?;
                }
            }
        }
    }
    Ok(())
}

#[instrument(skip(store))]
fn cmd_notes(store: &SessionStore, action: NotesCommand) -> anyhow::Result<()> {
    let mut pad = Notepad::mount(store);

    match action {
        NotesCommand::Show => {
            let (time, date) = crate::widgets::notes::clock_lines(Local::now());
            println!("{time}  {date}");
            println!("{}", pad.text());
        }
        NotesCommand::Write { text } => pad.write(&text)?,
        NotesCommand::Append { text } => pad.append(&text)?,
        NotesCommand::Export { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => default_export_dir()?,
            };
            let path = pad.export(&dir, Local::now().date_naive())?;
            println!("Exported {}.", path.display());
        }
    }
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_books(store: &SessionStore, renderer: &Renderer, action: BooksCommand) -> anyhow::Result<()> {
    let mut books = Books::mount(store, UuidIds);

    match action {
        BooksCommand::Add {
            kind,
            amount,
            description,
        } => {
            let id = books
                .add(kind, &amount, &description, Local::now().date_naive())?
                .ok_or_else(|| anyhow!("amount must be a non-negative number, got {amount:?}"))?;
            println!("Recorded {kind} {id}.");
        }
        BooksCommand::Delete { id } => {
            let id = books.resolve(&id)?.id.clone();
            books.delete(&id)?;
            println!("Deleted entry {id}.");
        }
        BooksCommand::List => {
            renderer.write_books(io::stdout().lock(), books.entries(), books.balance())?;
        }
    }
    Ok(())
}

async fn cmd_timer(cfg: &Config, renderer: &Renderer, mode: Mode) -> anyhow::Result<()> {
    let durations = TimerDurations::from_config(cfg)?;
    let tracks = cfg
        .get_u64("audio.tracks")?
        .map(u32::try_from)
        .transpose()
        .context("audio.tracks is out of range")?
        .unwrap_or(2);

    let (switch, _view) = mode_flag(mode);
    let mut session = TimerSession::new(
        switch,
        durations,
        Turntable::new(mode, tracks),
        renderer.clone(),
        io::stdout(),
    );
    session
        .run(tokio::io::BufReader::new(tokio::io::stdin()))
        .await
}

async fn cmd_chat(cfg: &Config, message: String) -> anyhow::Result<()> {
    let relay = ChatRelay::from_config(cfg)?;
    match relay.relay(&message).await {
        Ok(reply) => println!("{reply}"),
        Err(failure) => println!("{failure}"),
    }
    Ok(())
}

async fn cmd_weather(cfg: &Config, lat: Option<f64>, lon: Option<f64>) -> anyhow::Result<()> {
    let configured = Coordinates::from_config(cfg)?;
    let at = match (lat, lon, configured) {
        (Some(latitude), Some(longitude), _) => Coordinates {
            latitude,
            longitude,
        },
        (None, None, Some(at)) => at,
        _ => {
            return Err(anyhow!(
                "no coordinates: pass --lat and --lon or set weather.latitude and weather.longitude"
            ));
        }
    };

    let client = WeatherClient::from_config(cfg)?;
    match client.outlook(at).await {
        Ok(report) => println!(
            "{}°  {}  wind {} km/h",
            report.temperature,
            report.caption(),
            report.wind
        ),
        Err(placeholder) => println!("{placeholder}"),
    }
    Ok(())
}

async fn cmd_news(cfg: &Config) -> anyhow::Result<()> {
    let client = NewsClient::from_config(cfg)?;
    let mut ticker = crate::feeds::NewsTicker::default();
    ticker.refresh(client.top_stories().await);

    if ticker.is_lost() {
        println!("{}", ticker.headline());
        return Ok(());
    }
    for story in ticker.stories() {
        let link = story.url.as_deref().unwrap_or("");
        println!("[{:>4}] {}  {link}", story.score, story.title);
    }
    Ok(())
}

fn cmd_poker() -> anyhow::Result<()> {
    let hand = poker::deal(&mut rand::thread_rng())?;
    let show = |cards: &[poker::Card]| {
        cards
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };
    println!("House:     {}", show(&hand.house));
    println!("Community: {}", show(&hand.community));
    println!("You:       {}", show(&hand.player));
    println!("{}", hand.winner.banner());
    Ok(())
}

fn cmd_enforcer(renderer: &Renderer, line: &str) -> anyhow::Result<()> {
    let mut terminal = Terminal::default();
    let added = terminal.submit(line, &mut rand::thread_rng(), Local::now());
    let history = terminal.history();
    let shown = if line.trim().is_empty() {
        history
    } else {
        &history[history.len().saturating_sub(added)..]
    };
    renderer.write_terminal(io::stdout().lock(), shown)
}

fn cmd_layout(mode: Mode) -> anyhow::Result<()> {
    println!("{}", layout::header(&Local::now()));
    println!("{mode} mode:");
    for widget in layout::widgets_for(mode) {
        println!("  {}", widget.title());
    }
    Ok(())
}

#[instrument(skip(store, cfg))]
fn cmd_reset(store: &SessionStore, cfg: &Config, yes: bool) -> anyhow::Result<()> {
    let mut burner = Incinerator::from_config(cfg)?;
    burner.press(store, Instant::now())?;

    if !yes {
        println!(
            "Armed. Press Enter within {}s to confirm the burn.",
            burner.window().as_secs()
        );
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed reading confirmation")?;
    }

    match burner.press(store, Instant::now())? {
        Press::Burned => {
            info!("dashboard reset");
            println!("Burned. Tasks and notes are gone.");
        }
        Press::Armed => println!("Too slow. The incinerator disarmed."),
    }
    Ok(())
}

/// Where `notes export` writes when no `--dir` is given.
pub fn default_export_dir() -> anyhow::Result<PathBuf> {
    std::env::current_dir().context("failed to read current directory")
}
