use std::collections::BTreeSet;
use std::fmt;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::store::{KeyValueStore, TASKS_KEY, TypedStore};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
}

impl Suit {
    pub fn symbol(self) -> char {
        match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
        }
    }
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn suit(self) -> Suit {
        match self {
            Priority::High => Suit::Spades,
            Priority::Medium => Suit::Hearts,
            Priority::Low => Suit::Diamonds,
        }
    }

    pub fn rank(self) -> &'static str {
        match self {
            Priority::High => "A",
            Priority::Medium => "K",
            Priority::Low => "Q",
        }
    }

    /// Playing-card corner shown on the summary face, e.g. `A♠`.
    pub fn marker(self) -> String {
        format!("{}{}", self.rank(), self.suit().symbol())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &TaskPatch::default()
    }
}

pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `task-1`, `task-2`, ... for deterministic callers.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: &'static str,
    next: u64,
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self {
            prefix: "task",
            next: 0,
        }
    }
}

impl SequentialIds {
    pub fn starting_at(next: u64) -> Self {
        Self {
            next,
            ..Self::default()
        }
    }

    pub fn with_prefix(prefix: &'static str) -> Self {
        Self { prefix, next: 0 }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.next += 1;
        format!("{}-{}", self.prefix, self.next)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DeckFilter {
    #[default]
    Active,
    Archive,
}

impl DeckFilter {
    pub fn admits(self, task: &Task) -> bool {
        match self {
            DeckFilter::Active => !task.completed,
            DeckFilter::Archive => task.completed,
        }
    }
}

/// The ordered task sequence, persisted whole under one store key after
/// every mutation.
#[derive(Debug)]
pub struct TaskDeck<S: KeyValueStore, G: IdGenerator = UuidIds> {
    store: S,
    ids: G,
    tasks: Vec<Task>,
}

impl<S: KeyValueStore> TaskDeck<S, UuidIds> {
    pub fn mount(store: S) -> Self {
        Self::mount_with_ids(store, UuidIds)
    }
}

impl<S: KeyValueStore, G: IdGenerator> TaskDeck<S, G> {
    #[instrument(skip(store, ids))]
    pub fn mount_with_ids(store: S, ids: G) -> Self {
        let mut tasks: Vec<Task> = store.load_or_default(TASKS_KEY);

        let mut seen = BTreeSet::new();
        let before = tasks.len();
        tasks.retain(|task| seen.insert(task.id.clone()));
        if tasks.len() != before {
            debug!(dropped = before - tasks.len(), "dropped duplicate task ids");
        }

        info!(count = tasks.len(), "task deck mounted");
        Self { store, ids, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Resolves a full id or a unique id prefix.
    pub fn resolve(&self, needle: &str) -> anyhow::Result<&Task> {
        let needle = needle.trim();
        if needle.is_empty() {
            return Err(anyhow!("task id cannot be empty"));
        }
        if let Some(task) = self.get(needle) {
            return Ok(task);
        }

        let mut matches = self.tasks.iter().filter(|task| task.id.starts_with(needle));
        let first = matches
            .next()
            .ok_or_else(|| anyhow!("no task matches {needle}"))?;
        if matches.next().is_some() {
            return Err(anyhow!("task id prefix {needle} is ambiguous"));
        }
        Ok(first)
    }

    /// Adds a task at the front. A blank title is rejected without effect
    /// and yields `None`.
    #[instrument(skip(self, description, due_date))]
    pub fn create(
        &mut self,
        title: &str,
        description: &str,
        due_date: Option<&str>,
        priority: Priority,
    ) -> anyhow::Result<Option<String>> {
        let title = title.trim();
        if title.is_empty() {
            debug!("blank title rejected");
            return Ok(None);
        }

        let mut id = self.ids.next_id();
        while self.get(&id).is_some() {
            id = self.ids.next_id();
        }

        let task = Task {
            id: id.clone(),
            title: title.to_string(),
            description: description.trim().to_string(),
            due_date: due_date
                .map(str::trim)
                .filter(|due| !due.is_empty())
                .map(str::to_string),
            priority,
            completed: false,
        };
        self.tasks.insert(0, task);
        self.persist()?;

        info!(id = %id, "task created");
        Ok(Some(id))
    }

    /// Merges `patch` into the task. Unknown ids and empty patches are
    /// no-ops; a blank title in the patch keeps the current title.
    #[instrument(skip(self, patch))]
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> anyhow::Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("update for unknown task ignored");
            return Ok(false);
        };
        if patch.is_empty() {
            return Ok(false);
        }

        if let Some(title) = patch.title {
            let title = title.trim();
            if !title.is_empty() {
                task.title = title.to_string();
            }
        }
        if let Some(description) = patch.description {
            task.description = description.trim().to_string();
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date.filter(|due| !due.trim().is_empty());
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }

        self.persist()?;
        info!("task updated");
        Ok(true)
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            debug!("delete for unknown task ignored");
            return Ok(false);
        }

        self.persist()?;
        info!("task deleted");
        Ok(true)
    }

    /// Flips `completed`; returns the new value, or `None` for unknown ids.
    #[instrument(skip(self))]
    pub fn toggle_complete(&mut self, id: &str) -> anyhow::Result<Option<bool>> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("toggle for unknown task ignored");
            return Ok(None);
        };
        task.completed = !task.completed;
        let completed = task.completed;

        self.persist()?;
        info!(completed, "task toggled");
        Ok(Some(completed))
    }

    pub fn filter(&self, view: DeckFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|task| view.admits(task)).collect()
    }

    fn persist(&self) -> anyhow::Result<()> {
        debug!(count = self.tasks.len(), "persisting task deck");
        self.store.save(TASKS_KEY, &self.tasks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CardFace {
    Summary,
    Detail,
}

/// Carousel view state over a deck: the selected filter, the card under
/// the cursor and which cards are flipped. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct DeckView {
    filter: DeckFilter,
    cursor: usize,
    flipped: BTreeSet<String>,
}

impl DeckView {
    pub fn new(filter: DeckFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn filter(&self) -> DeckFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: DeckFilter) {
        if self.filter != filter {
            self.filter = filter;
            self.cursor = 0;
        }
    }

    pub fn face(&self, id: &str) -> CardFace {
        if self.flipped.contains(id) {
            CardFace::Detail
        } else {
            CardFace::Summary
        }
    }

    pub fn flip(&mut self, id: &str) -> CardFace {
        if !self.flipped.remove(id) {
            self.flipped.insert(id.to_string());
        }
        self.face(id)
    }

    /// Flips the card only if it is not already showing `face`.
    pub fn turn_to(&mut self, id: &str, face: CardFace) -> CardFace {
        if self.face(id) == face {
            face
        } else {
            self.flip(id)
        }
    }

    pub fn visible<'a, S: KeyValueStore, G: IdGenerator>(
        &self,
        deck: &'a TaskDeck<S, G>,
    ) -> Vec<&'a Task> {
        deck.filter(self.filter)
    }

    pub fn cursor<S: KeyValueStore, G: IdGenerator>(&self, deck: &TaskDeck<S, G>) -> usize {
        let len = self.visible(deck).len();
        self.cursor.min(len.saturating_sub(1))
    }

    pub fn current<'a, S: KeyValueStore, G: IdGenerator>(
        &self,
        deck: &'a TaskDeck<S, G>,
    ) -> Option<&'a Task> {
        let visible = self.visible(deck);
        visible.get(self.cursor(deck)).copied()
    }

    pub fn next<S: KeyValueStore, G: IdGenerator>(&mut self, deck: &TaskDeck<S, G>) -> usize {
        let len = self.visible(deck).len();
        self.cursor = (self.cursor(deck) + 1).min(len.saturating_sub(1));
        self.cursor
    }

    pub fn prev<S: KeyValueStore, G: IdGenerator>(&mut self, deck: &TaskDeck<S, G>) -> usize {
        self.cursor = self.cursor(deck).saturating_sub(1);
        self.cursor
    }

    /// Forgets flip state for cards that no longer exist.
    pub fn prune<S: KeyValueStore, G: IdGenerator>(&mut self, deck: &TaskDeck<S, G>) {
        self.flipped.retain(|id| deck.get(id).is_some());
        self.cursor = self.cursor(deck);
    }
}
