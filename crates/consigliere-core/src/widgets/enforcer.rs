use chrono::{DateTime, Local};
use rand::Rng;
use tracing::debug;

pub const HELP_TEXT: &str = "Available commands:
  help      - Show this list
  clear     - Clear terminal
  roll      - Roll dice (e.g. roll 1 100)
  time      - Show local time
  whoami    - Identify user
  roulette  - Test your luck
  ping      - Test network latency";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Input,
    Output,
    Error,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// The toy command terminal. Nothing it does touches the host.
#[derive(Debug, Clone)]
pub struct Terminal {
    history: Vec<Line>,
}

impl Default for Terminal {
    fn default() -> Self {
        Self {
            history: vec![
                Line::new(LineKind::System, "ENFORCER_OS v1.0.4 initialized..."),
                Line::new(LineKind::System, "Type 'help' for available commands."),
            ],
        }
    }
}

impl Terminal {
    pub fn history(&self) -> &[Line] {
        &self.history
    }

    /// Runs one command line and returns how many history lines it added.
    /// Blank input is ignored; `clear` empties the history.
    pub fn submit<R: Rng + ?Sized>(
        &mut self,
        input: &str,
        rng: &mut R,
        now: DateTime<Local>,
    ) -> usize {
        if input.trim().is_empty() {
            return 0;
        }

        let mut args = input.split_whitespace();
        let command = args.next().unwrap_or_default().to_lowercase();
        debug!(command = %command, "enforcer command");

        if command == "clear" {
            self.history.clear();
            return 0;
        }

        let before = self.history.len();
        self.history
            .push(Line::new(LineKind::Input, format!("> {input}")));

        match command.as_str() {
            "help" => self.output(HELP_TEXT),
            "roll" => {
                let min = parse_bound(args.next()).unwrap_or(1);
                let max = parse_bound(args.next()).unwrap_or(100);
                let (low, high) = if min <= max { (min, max) } else { (max, min) };
                let result = rng.gen_range(low..=high);
                self.output(format!("Rolled: {result}"));
            }
            "time" => self.output(now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()),
            "whoami" => self.output("Don Corelli (Admin)"),
            "roulette" => {
                if rng.gen_range(0..6) == 0 {
                    self.history
                        .push(Line::new(LineKind::Error, "BANG! You're dead."));
                } else {
                    self.output("*Click* ... You survive.");
                }
            }
            "ping" => {
                self.output("Pinging server...");
                let latency = rng.gen_range(0..20);
                self.output(format!(
                    "Reply from 127.0.0.1: bytes=32 time={latency}ms TTL=128"
                ));
            }
            _ => self.history.push(Line::new(
                LineKind::Error,
                format!("Command not found: {command}"),
            )),
        }

        self.history.len() - before
    }

    fn output(&mut self, text: impl Into<String>) {
        self.history.push(Line::new(LineKind::Output, text));
    }
}

/// Zero and unparsable bounds fall back to the default.
fn parse_bound(raw: Option<&str>) -> Option<i64> {
    raw?.parse::<i64>().ok().filter(|value| *value != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 10, 18, 21, 4, 9)
            .single()
            .expect("local time")
    }

    fn last(term: &Terminal) -> &Line {
        term.history().last().expect("history")
    }

    #[test]
    fn boots_with_banner() {
        let term = Terminal::default();
        assert_eq!(term.history().len(), 2);
        assert!(term.history().iter().all(|l| l.kind == LineKind::System));
    }

    #[test]
    fn basic_commands() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut term = Terminal::default();

        assert_eq!(term.submit("WHOAMI", &mut rng, now()), 2);
        assert_eq!(term.history()[2].text, "> WHOAMI");
        assert_eq!(last(&term).text, "Don Corelli (Admin)");

        term.submit("time", &mut rng, now());
        assert_eq!(last(&term).text, "10/18/2026, 9:04:09 PM");

        term.submit("sudo rm -rf /", &mut rng, now());
        assert_eq!(last(&term).kind, LineKind::Error);
        assert_eq!(last(&term).text, "Command not found: sudo");

        assert_eq!(term.submit("   ", &mut rng, now()), 0);
        term.submit("clear", &mut rng, now());
        assert!(term.history().is_empty());
    }

    #[test]
    fn roll_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut term = Terminal::default();
        for _ in 0..50 {
            term.submit("roll 5 7", &mut rng, now());
            let value: i64 = last(&term)
                .text
                .trim_start_matches("Rolled: ")
                .parse()
                .expect("number");
            assert!((5..=7).contains(&value));
        }
    }

    #[test]
    fn ping_and_roulette_reply() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut term = Terminal::default();
        assert_eq!(term.submit("ping", &mut rng, now()), 3);
        assert!(last(&term).text.starts_with("Reply from 127.0.0.1: bytes=32 time="));

        term.submit("roulette", &mut rng, now());
        let outcome = last(&term);
        assert!(
            outcome.text == "BANG! You're dead." || outcome.text == "*Click* ... You survive."
        );
    }
}
