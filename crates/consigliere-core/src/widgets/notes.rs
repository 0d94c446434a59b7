use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate};
use tracing::{error, info, instrument};

use crate::store::{KeyValueStore, NOTES_KEY};

/// Free-text notepad. Stored verbatim (not JSON) and saved on every edit.
#[derive(Debug)]
pub struct Notepad<S: KeyValueStore> {
    store: S,
    text: String,
}

impl<S: KeyValueStore> Notepad<S> {
    pub fn mount(store: S) -> Self {
        let text = match store.load_raw(NOTES_KEY) {
            Ok(text) => text.unwrap_or_default(),
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed loading notes; starting blank");
                String::new()
            }
        };
        Self { store, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub fn write(&mut self, text: &str) -> anyhow::Result<()> {
        self.text = text.to_string();
        self.store.save_raw(NOTES_KEY, &self.text)
    }

    /// Adds `line` on its own line at the end of the note.
    pub fn append(&mut self, line: &str) -> anyhow::Result<()> {
        let mut next = self.text.clone();
        if !next.is_empty() && !next.ends_with('\n') {
            next.push('\n');
        }
        next.push_str(line);
        self.write(&next)
    }

    /// Writes the note to `consigliere-ledger-<date>.txt` inside `dir`.
    #[instrument(skip(self))]
    pub fn export(&self, dir: &Path, today: NaiveDate) -> anyhow::Result<PathBuf> {
        let path = dir.join(export_file_name(today));
        fs::write(&path, &self.text)
            .with_context(|| format!("failed writing {}", path.display()))?;
        info!(file = %path.display(), "notes exported");
        Ok(path)
    }
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("consigliere-ledger-{}.txt", today.format("%Y-%m-%d"))
}

/// The notepad header clock: `HH:MM` and `Mon DD, YYYY`.
pub fn clock_lines(now: DateTime<Local>) -> (String, String) {
    (
        now.format("%H:%M").to_string(),
        now.format("%b %d, %Y").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn edits_survive_remount() {
        let store = MemoryStore::new();
        {
            let mut pad = Notepad::mount(&store);
            pad.write("Sollozzo at Louis'").expect("write");
            pad.append("bring the car").expect("append");
        }
        let pad = Notepad::mount(&store);
        assert_eq!(pad.text(), "Sollozzo at Louis'\nbring the car");
    }

    #[test]
    fn export_writes_dated_file() {
        let temp = tempdir().expect("tempdir");
        let store = MemoryStore::new();
        let mut pad = Notepad::mount(&store);
        pad.write("ledger").expect("write");

        let day = NaiveDate::from_ymd_opt(2026, 10, 18).expect("date");
        let path = pad.export(temp.path(), day).expect("export");
        assert!(path.ends_with("consigliere-ledger-2026-10-18.txt"));
        assert_eq!(fs::read_to_string(path).expect("read"), "ledger");
    }

    #[test]
    fn clock_formats() {
        let now = Local
            .with_ymd_and_hms(2026, 3, 7, 9, 5, 0)
            .single()
            .expect("local time");
        let (time, date) = clock_lines(now);
        assert_eq!(time, "09:05");
        assert_eq!(date, "Mar 07, 2026");
    }
}
