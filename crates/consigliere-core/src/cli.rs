use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::deck::{CardFace, Priority};
use crate::mode::Mode;
use crate::widgets::books::EntryKind;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "consigliere",
    version,
    about = "Consigliere: a two-mode focus dashboard for the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Operations: the task deck.
    #[command(subcommand)]
    Task(TaskCommand),
    /// The ledger notepad.
    #[command(subcommand)]
    Notes(NotesCommand),
    /// Collections and expenses.
    #[command(subcommand)]
    Books(BooksCommand),
    /// Interactive countdown session reading commands from stdin.
    Timer {
        #[arg(long, value_enum, default_value_t = Mode::Focus)]
        mode: Mode,
    },
    /// Ask the secure line.
    Chat {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    Weather {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    News,
    Quote,
    Dice,
    Roulette,
    Wheel,
    Poker,
    /// Run one line on the enforcer terminal.
    Enforcer {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Widgets shown for a mode.
    Layout {
        #[arg(long, value_enum, default_value_t = Mode::Focus)]
        mode: Mode,
    },
    /// Burn the task deck and the notes.
    Reset {
        #[arg(long)]
        yes: bool,
    },
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// End the session: every stored dataset is dropped.
    End,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// An empty value clears the due date.
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },
    /// Toggle completion.
    Done { id: String },
    Delete { id: String },
    List {
        #[arg(long)]
        archive: bool,
    },
    /// One face of a card, or both when `--face` is omitted.
    Show {
        id: String,
        #[arg(long, value_enum)]
        face: Option<CardFace>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum NotesCommand {
    Show,
    Write { text: String },
    Append { text: String },
    Export {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum BooksCommand {
    Add {
        #[arg(value_enum)]
        kind: EntryKind,
        #[arg(allow_hyphen_values = true)]
        amount: String,
        #[arg(default_value = "")]
        description: String,
    },
    Delete { id: String },
    List,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` / `rc.key:value` words out of the
/// argument list.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest
                .split_once('=')
                .or_else(|| rest.split_once(':'))
                .map(|(k, v)| (format!("rc.{k}"), v.to_string()));

            if let Some((k, v)) = parsed {
                debug!(key = %k, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::config::Config;

    fn args(words: &[&str]) -> Vec<OsString> {
        words.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_words_become_overrides() {
        let pre = preprocess_args(&args(&[
            "consigliere",
            "rc.color=off",
            "task",
            "rc.timer.focus.minutes:50",
            "list",
        ]))
        .expect("preprocess");

        assert_eq!(pre.cleaned_args, args(&["consigliere", "task", "list"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.timer.focus.minutes".to_string(), "50".to_string()),
            ]
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn override_values_stay_out_of_debug_logs() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let pre = preprocess_args(&args(&[
                "consigliere",
                "rc.relay.api_key:hush-hush-1234",
                "chat",
                "hello",
            ]))
            .expect("preprocess");
            let mut cfg = Config::default();
            cfg.apply_overrides(pre.rc_overrides);
            assert_eq!(
                cfg.get("relay.api_key").as_deref(),
                Some("hush-hush-1234")
            );
        });

        let logged = String::from_utf8(captured.0.lock().clone()).expect("utf8");
        assert!(logged.contains("relay.api_key"));
        assert!(!logged.contains("hush-hush-1234"));
    }

    #[test]
    fn subcommands_parse() {
        let cli = GlobalCli::parse_from([
            "consigliere",
            "-vv",
            "--rc",
            "news.count=3",
            "task",
            "add",
            "Acquire the asset",
            "--priority",
            "high",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides[0].key, "news.count");
        match cli.command {
            Command::Task(TaskCommand::Add {
                title, priority, ..
            }) => {
                assert_eq!(title, "Acquire the asset");
                assert_eq!(priority, Priority::High);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = GlobalCli::parse_from(["consigliere", "timer", "--mode", "relax"]);
        assert!(matches!(cli.command, Command::Timer { mode: Mode::Relax }));
    }

    #[test]
    fn show_face_and_session_end_parse() {
        let cli = GlobalCli::parse_from(["consigliere", "task", "show", "3f2a", "--face", "detail"]);
        assert!(matches!(
            cli.command,
            Command::Task(TaskCommand::Show {
                face: Some(CardFace::Detail),
                ..
            })
        ));

        let cli = GlobalCli::parse_from(["consigliere", "task", "show", "3f2a"]);
        assert!(matches!(
            cli.command,
            Command::Task(TaskCommand::Show { face: None, .. })
        ));

        let cli = GlobalCli::parse_from(["consigliere", "session", "end"]);
        assert!(matches!(cli.command, Command::Session(SessionCommand::End)));
    }

    #[test]
    fn key_val_requires_equals() {
        assert!("color".parse::<KeyVal>().is_err());
        let kv: KeyVal = " color = off ".parse().expect("parse");
        assert_eq!((kv.key.as_str(), kv.value.as_str()), ("color", "off"));
    }
}
