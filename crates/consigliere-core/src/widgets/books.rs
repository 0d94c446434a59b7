use std::fmt;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::deck::IdGenerator;
use crate::store::{BOOKS_KEY, KeyValueStore, TypedStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Collection,
    Expense,
}

impl EntryKind {
    fn default_description(self) -> &'static str {
        match self {
            EntryKind::Collection => "Unspecified Collection",
            EntryKind::Expense => "Unspecified Expense",
        }
    }

    pub fn sign(self) -> char {
        match self {
            EntryKind::Collection => '+',
            EntryKind::Expense => '-',
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Collection => f.write_str("collection"),
            EntryKind::Expense => f.write_str("expense"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub amount: f64,
    pub description: String,
    pub date: String,
}

/// Collections and expenses, newest first.
#[derive(Debug)]
pub struct Books<S: KeyValueStore, G: IdGenerator> {
    store: S,
    ids: G,
    entries: Vec<Transaction>,
}

impl<S: KeyValueStore, G: IdGenerator> Books<S, G> {
    pub fn mount(store: S, ids: G) -> Self {
        let entries: Vec<Transaction> = store.load_or_default(BOOKS_KEY);
        debug!(count = entries.len(), "books mounted");
        Self {
            store,
            ids,
            entries,
        }
    }

    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    /// Records an entry. Blank, non-numeric, negative or non-finite amounts
    /// are rejected without effect.
    #[instrument(skip(self, description))]
    pub fn add(
        &mut self,
        kind: EntryKind,
        amount: &str,
        description: &str,
        today: NaiveDate,
    ) -> anyhow::Result<Option<String>> {
        let Some(amount) = parse_amount(amount) else {
            debug!("invalid amount rejected");
            return Ok(None);
        };

        let description = match description.trim() {
            "" => kind.default_description().to_string(),
            text => text.to_string(),
        };
        let id = self.ids.next_id();
        self.entries.insert(
            0,
            Transaction {
                id: id.clone(),
                kind,
                amount,
                description,
                date: today.format("%Y-%m-%d").to_string(),
            },
        );
        self.store.save(BOOKS_KEY, &self.entries)?;

        info!(id = %id, %kind, amount, "books entry recorded");
        Ok(Some(id))
    }

    /// Resolves a full id or a unique id prefix, as listed by `books list`.
    pub fn resolve(&self, needle: &str) -> anyhow::Result<&Transaction> {
        let needle = needle.trim();
        if needle.is_empty() {
            return Err(anyhow!("entry id cannot be empty"));
        }
        if let Some(entry) = self.entries.iter().find(|entry| entry.id == needle) {
            return Ok(entry);
        }

        let mut matches = self
            .entries
            .iter()
            .filter(|entry| entry.id.starts_with(needle));
        let first = matches
            .next()
            .ok_or_else(|| anyhow!("no books entry matches {needle}"))?;
        if matches.next().is_some() {
            return Err(anyhow!("entry id prefix {needle} is ambiguous"));
        }
        Ok(first)
    }

    pub fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.store.save(BOOKS_KEY, &self.entries)?;
        Ok(true)
    }

    pub fn balance(&self) -> f64 {
        self.entries.iter().fold(0.0, |acc, entry| match entry.kind {
            EntryKind::Collection => acc + entry.amount,
            EntryKind::Expense => acc - entry.amount,
        })
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{SequentialIds, UuidIds};
    use crate::render::Renderer;
    use crate::store::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("date")
    }

    #[test]
    fn balance_nets_collections_against_expenses() {
        let store = MemoryStore::new();
        let mut books = Books::mount(&store, SequentialIds::with_prefix("entry"));
        books
            .add(EntryKind::Collection, "1500", "Protection", today())
            .expect("add");
        books
            .add(EntryKind::Expense, "200.5", "", today())
            .expect("add");

        assert!((books.balance() - 1299.5).abs() < 1e-9);
        assert_eq!(books.entries()[0].description, "Unspecified Expense");

        let remounted = Books::mount(&store, SequentialIds::starting_at(2));
        assert_eq!(remounted.entries(), books.entries());
    }

    #[test]
    fn bad_amounts_are_ignored() {
        let mut books = Books::mount(MemoryStore::new(), SequentialIds::with_prefix("entry"));
        for raw in ["", "abc", "-5", "NaN", "inf"] {
            assert_eq!(
                books
                    .add(EntryKind::Collection, raw, "x", today())
                    .expect("add"),
                None,
                "{raw}"
            );
        }
        assert!(books.entries().is_empty());
    }

    #[test]
    fn delete_removes_entry() {
        let mut books = Books::mount(MemoryStore::new(), SequentialIds::with_prefix("entry"));
        let id = books
            .add(EntryKind::Collection, "10", "tip", today())
            .expect("add")
            .expect("id");
        assert!(books.delete(&id).expect("delete"));
        assert!(!books.delete(&id).expect("delete"));
        assert_eq!(books.balance(), 0.0);
    }

    #[test]
    fn listed_short_ids_resolve_for_delete() {
        let store = MemoryStore::new();
        let mut books = Books::mount(&store, UuidIds);
        let id = books
            .add(EntryKind::Expense, "40", "tailor", today())
            .expect("add")
            .expect("id");

        let mut listing = Vec::new();
        Renderer::plain()
            .write_books(&mut listing, books.entries(), books.balance())
            .expect("render");
        let listing = String::from_utf8(listing).expect("utf8");
        let shown = listing
            .lines()
            .nth(2)
            .and_then(|row| row.split_whitespace().next())
            .expect("listed id")
            .to_string();
        assert!(shown.len() < id.len());

        let full = books.resolve(&shown).expect("resolve").id.clone();
        assert_eq!(full, id);
        assert!(books.delete(&full).expect("delete"));
        assert!(books.entries().is_empty());
        assert!(books.resolve(&shown).is_err());
    }

    #[test]
    fn ambiguous_prefix_is_rejected() {
        let mut books = Books::mount(MemoryStore::new(), SequentialIds::with_prefix("entry"));
        books
            .add(EntryKind::Collection, "1", "", today())
            .expect("add");
        books
            .add(EntryKind::Collection, "2", "", today())
            .expect("add");
        assert!(books.resolve("entry-").is_err());
        assert!(books.resolve("entry-2").is_ok());
    }
}
