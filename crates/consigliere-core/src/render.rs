use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::deck::{CardFace, DeckFilter, Task};
use crate::timer::{TimerSnapshot, TimerState};
use crate::widgets::books::{EntryKind, Transaction};
use crate::widgets::enforcer::{Line, LineKind};

const SHORT_ID: usize = 8;
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, tasks))]
    pub fn write_deck<W: Write>(
        &self,
        out: W,
        tasks: &[&Task],
        view: DeckFilter,
    ) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Card".to_string(),
            "Due".to_string(),
            "Title".to_string(),
        ];

        let rows = tasks
            .iter()
            .map(|task| {
                let id = self.paint(short_id(&task.id), "33");
                let marker = task.priority.marker();
                let marker = match view {
                    DeckFilter::Archive => self.paint(&marker, "2"),
                    DeckFilter::Active => marker,
                };
                vec![
                    id,
                    marker,
                    task.due_date.clone().unwrap_or_default(),
                    task.title.clone(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    /// One face of a task card.
    pub fn write_card<W: Write>(
        &self,
        mut out: W,
        task: &Task,
        face: CardFace,
    ) -> anyhow::Result<()> {
        match face {
            CardFace::Summary => {
                writeln!(out, "{}  {}", task.priority.marker(), self.paint(&task.title, "1"))?;
                if let Some(due) = &task.due_date {
                    writeln!(out, "due       {due}")?;
                }
            }
            CardFace::Detail => {
                writeln!(out, "id        {}", task.id)?;
                writeln!(out, "priority  {}", task.priority)?;
                writeln!(
                    out,
                    "status    {}",
                    if task.completed { "archived" } else { "active" }
                )?;
                let description = if task.description.trim().is_empty() {
                    "(no briefing)"
                } else {
                    task.description.as_str()
                };
                writeln!(out, "briefing  {description}")?;
            }
        }
        Ok(())
    }

    pub fn write_books<W: Write>(
        &self,
        mut out: W,
        entries: &[Transaction],
        balance: f64,
    ) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Date".to_string(),
            "Amount".to_string(),
            "Description".to_string(),
        ];
        let rows = entries
            .iter()
            .map(|entry| {
                let amount = format!("{}{:.2}", entry.kind.sign(), entry.amount);
                let amount = match entry.kind {
                    EntryKind::Collection => self.paint(&amount, "32"),
                    EntryKind::Expense => self.paint(&amount, "31"),
                };
                vec![
                    self.paint(short_id(&entry.id), "33"),
                    entry.date.clone(),
                    amount,
                    entry.description.clone(),
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)?;
        writeln!(out)?;
        writeln!(out, "Balance: {balance:.2}")?;
        Ok(())
    }

    pub fn write_timer<W: Write>(
        &self,
        mut out: W,
        label: &str,
        formatted: &str,
        progress: f64,
        snapshot: TimerSnapshot,
    ) -> anyhow::Result<()> {
        let state = match snapshot.state() {
            TimerState::LockedRunning => self.paint("running", "32"),
            TimerState::LockedIdle => "paused".to_string(),
            TimerState::UnlockedIdle => self.paint("unlocked", "33"),
        };
        writeln!(
            out,
            "{label} [{}] {formatted} {} {state}",
            progress_bar(progress),
            if snapshot.locked { "🔒" } else { "🔓" }
        )?;
        Ok(())
    }

    pub fn write_terminal<W: Write>(&self, mut out: W, lines: &[Line]) -> anyhow::Result<()> {
        for line in lines {
            let text = match line.kind {
                LineKind::Input => line.text.clone(),
                LineKind::Output => self.paint(&line.text, "33"),
                LineKind::Error => self.paint(&line.text, "31"),
                LineKind::System => self.paint(&line.text, "2"),
            };
            writeln!(out, "{text}")?;
        }
        Ok(())
    }

    pub fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn short_id(id: &str) -> &str {
    id.char_indices()
        .nth(SHORT_ID)
        .map_or(id, |(idx, _)| &id[..idx])
}

fn progress_bar(progress: f64) -> String {
    let filled = (progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths).take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Priority;
    use crate::mode::Mode;

    fn task() -> Task {
        Task {
            id: "0f3c2a9e-aaaa-bbbb-cccc-123456789abc".to_string(),
            title: "Acquire the asset".to_string(),
            description: String::new(),
            due_date: Some("2026-11-01".to_string()),
            priority: Priority::High,
            completed: false,
        }
    }

    #[test]
    fn table_pads_to_visible_width() {
        let mut buf = Vec::new();
        let renderer = Renderer { color: true };
        let task = task();
        renderer
            .write_deck(&mut buf, &[&task], DeckFilter::Active)
            .expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("0f3c2a9e"));
        assert!(lines[2].contains("A♠"));
        assert_eq!(
            UnicodeWidthStr::width(strip_ansi(lines[0]).as_str()),
            UnicodeWidthStr::width(strip_ansi(lines[2]).as_str())
        );
    }

    #[test]
    fn card_faces_show_different_sides() {
        let renderer = Renderer::plain();
        let task = task();

        let mut summary = Vec::new();
        renderer
            .write_card(&mut summary, &task, CardFace::Summary)
            .expect("render");
        let summary = String::from_utf8(summary).expect("utf8");
        assert!(summary.starts_with("A♠  Acquire the asset"));

        let mut detail = Vec::new();
        renderer
            .write_card(&mut detail, &task, CardFace::Detail)
            .expect("render");
        let detail = String::from_utf8(detail).expect("utf8");
        assert!(detail.contains("briefing  (no briefing)"));
        assert!(detail.contains("status    active"));
    }

    #[test]
    fn timer_line_shows_lock_state() {
        let mut buf = Vec::new();
        let snapshot = TimerSnapshot {
            mode: Mode::Focus,
            remaining_seconds: 750,
            running: false,
            locked: true,
        };
        Renderer::plain()
            .write_timer(&mut buf, "The Grind", "12:30", 0.5, snapshot)
            .expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text, "The Grind [##########..........] 12:30 🔒 paused\n");
    }

    #[test]
    fn short_ids_and_ansi() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("task-123456789"), "task-123");
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
    }
}
