//! Per-mode countdown that gates switching between focus and relax.
//!
//! The timer is always in one of three states:
//!
//! * `LockedIdle` - fresh session or paused; `start` is offered.
//! * `LockedRunning` - counting down once per tick; `pause` is offered.
//! * `UnlockedIdle` - countdown expired or the lock was forced; the only
//!   actions are `confirm_switch` or re-locking.
//!
//! Disallowed transitions are ignored and reported as `false`/`None`.

use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::mode::{Mode, ModeSwitch};
use crate::ticker::{Tick, TickScheduler};

pub const DEFAULT_FOCUS_MINUTES: u64 = 25;
pub const DEFAULT_RELAX_MINUTES: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerDurations {
    pub focus_secs: u64,
    pub relax_secs: u64,
}

impl Default for TimerDurations {
    fn default() -> Self {
        Self {
            focus_secs: DEFAULT_FOCUS_MINUTES * 60,
            relax_secs: DEFAULT_RELAX_MINUTES * 60,
        }
    }
}

impl TimerDurations {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let focus = cfg
            .get_u64("timer.focus.minutes")?
            .unwrap_or(DEFAULT_FOCUS_MINUTES);
        let relax = cfg
            .get_u64("timer.relax.minutes")?
            .unwrap_or(DEFAULT_RELAX_MINUTES);
        if focus == 0 || relax == 0 {
            anyhow::bail!("timer durations must be at least one minute");
        }
        let focus_secs = focus
            .checked_mul(60)
            .ok_or_else(|| anyhow::anyhow!("timer.focus.minutes is too large: {focus}"))?;
        let relax_secs = relax
            .checked_mul(60)
            .ok_or_else(|| anyhow::anyhow!("timer.relax.minutes is too large: {relax}"))?;
        Ok(Self {
            focus_secs,
            relax_secs,
        })
    }

    pub fn for_mode(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Focus => self.focus_secs,
            Mode::Relax => self.relax_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    LockedIdle,
    LockedRunning,
    UnlockedIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or a tick from a ticker that has since been disarmed.
    Ignored,
    Counted { remaining_seconds: u64 },
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub mode: Mode,
    pub remaining_seconds: u64,
    pub running: bool,
    pub locked: bool,
}

impl TimerSnapshot {
    pub fn state(&self) -> TimerState {
        match (self.locked, self.running) {
            (true, true) => TimerState::LockedRunning,
            (true, false) => TimerState::LockedIdle,
            (false, _) => TimerState::UnlockedIdle,
        }
    }
}

pub struct Timer<S: TickScheduler> {
    switch: ModeSwitch,
    durations: TimerDurations,
    scheduler: S,
    mode: Mode,
    remaining: u64,
    locked: bool,
    ticker: Option<S::Handle>,
    generation: u64,
}

impl<S: TickScheduler> Timer<S> {
    pub fn new(switch: ModeSwitch, durations: TimerDurations, scheduler: S) -> Self {
        let mode = switch.get();
        let remaining = durations.for_mode(mode);
        debug!(%mode, remaining, "timer session created");
        Self {
            switch,
            durations,
            scheduler,
            mode,
            remaining,
            locked: true,
            ticker: None,
            generation: 0,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            remaining_seconds: self.remaining,
            running: self.is_running(),
            locked: self.locked,
        }
    }

    pub fn state(&self) -> TimerState {
        self.snapshot().state()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    #[instrument(skip(self), fields(mode = %self.mode, remaining = self.remaining))]
    pub fn start(&mut self) -> bool {
        if !self.locked || self.is_running() {
            debug!("start ignored");
            return false;
        }
        if self.remaining == 0 {
            self.expire();
            return true;
        }

        self.generation += 1;
        self.ticker = Some(self.scheduler.arm(self.generation));
        info!(generation = self.generation, "countdown started");
        true
    }

    #[instrument(skip(self), fields(mode = %self.mode, remaining = self.remaining))]
    pub fn pause(&mut self) -> bool {
        if !self.locked || !self.is_running() {
            debug!("pause ignored");
            return false;
        }
        self.disarm();
        info!("countdown paused");
        true
    }

    /// The play/pause button.
    pub fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Applies a tick delivered by the scheduler, dropping ticks from
    /// tickers that were disarmed after the tick was sent.
    pub fn on_tick(&mut self, tick: Tick) -> TickOutcome {
        if tick.generation != self.generation {
            debug!(
                tick = tick.generation,
                current = self.generation,
                "stale tick dropped"
            );
            return TickOutcome::Ignored;
        }
        self.tick()
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Ignored;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expire();
            return TickOutcome::Expired;
        }
        TickOutcome::Counted {
            remaining_seconds: self.remaining,
        }
    }

    /// Manual override: flips the lock from any state and stops the
    /// countdown. Returns the new `locked` value.
    #[instrument(skip(self), fields(mode = %self.mode, locked = self.locked))]
    pub fn force_toggle_lock(&mut self) -> bool {
        self.disarm();
        self.locked = !self.locked;
        info!(locked = self.locked, "lock overridden");
        self.locked
    }

    /// Commits the mode flip once unlocked and starts a fresh session for
    /// the new mode.
    #[instrument(skip(self), fields(mode = %self.mode, locked = self.locked))]
    pub fn confirm_switch(&mut self) -> Option<Mode> {
        if self.locked {
            debug!("switch refused while locked");
            return None;
        }

        let next = self.mode.other();
        self.switch.set(next);
        self.reset_for(next);
        Some(next)
    }

    pub fn duration(&self) -> u64 {
        self.durations.for_mode(self.mode)
    }

    /// `MM:SS` of the remaining time.
    pub fn formatted(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }

    /// Fraction of the session already elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let total = self.duration();
        if total == 0 {
            return 1.0;
        }
        (total.saturating_sub(self.remaining)) as f64 / total as f64
    }

    pub fn label(&self) -> &'static str {
        match self.mode {
            Mode::Focus => "The Grind",
            Mode::Relax => "The Break",
        }
    }

    pub fn switch_label(&self) -> &'static str {
        match self.mode {
            Mode::Focus => "Enter Lounge",
            Mode::Relax => "Enter Focus",
        }
    }

    fn expire(&mut self) {
        self.disarm();
        self.remaining = 0;
        self.locked = false;
        info!(mode = %self.mode, "countdown expired; switch unlocked");
    }

    fn disarm(&mut self) {
        if self.ticker.take().is_some() {
            debug!(generation = self.generation, "ticker released");
        }
    }

    fn reset_for(&mut self, mode: Mode) {
        self.disarm();
        self.mode = mode;
        self.remaining = self.durations.for_mode(mode);
        self.locked = true;
        info!(%mode, remaining = self.remaining, "timer session reset");
    }
}
