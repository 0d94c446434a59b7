//! The interactive timer session: one-second ticks and typed commands
//! multiplexed on a single task.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, instrument};

use crate::mode::ModeSwitch;
use crate::render::Renderer;
use crate::ticker::{TICK_PERIOD, Tick, TokioTicker};
use crate::timer::{TickOutcome, Timer, TimerDurations};
use crate::widgets::audio::Turntable;

pub const SESSION_HELP: &str =
    "commands: start, pause, toggle, key, switch, status, play, skip, help, quit";

pub struct TimerSession<W: Write> {
    timer: Timer<TokioTicker>,
    ticks: UnboundedReceiver<Tick>,
    turntable: Arc<Mutex<Turntable>>,
    renderer: Renderer,
    out: W,
}

impl<W: Write> TimerSession<W> {
    /// Must be called inside a tokio runtime. The turntable follows mode
    /// changes through a subscription on the mode flag.
    pub fn new(
        switch: ModeSwitch,
        durations: TimerDurations,
        turntable: Turntable,
        renderer: Renderer,
        out: W,
    ) -> Self {
        let (ticker, ticks) = TokioTicker::new(TICK_PERIOD);
        let turntable = Arc::new(Mutex::new(turntable));

        let follower = Arc::clone(&turntable);
        switch
            .view()
            .subscribe(move |mode| follower.lock().on_mode_change(mode));

        Self {
            timer: Timer::new(switch, durations, ticker),
            ticks,
            turntable,
            renderer,
            out,
        }
    }

    pub fn timer(&self) -> &Timer<TokioTicker> {
        &self.timer
    }

    pub fn turntable(&self) -> Turntable {
        self.turntable.lock().clone()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Runs until `quit` or end of input.
    #[instrument(skip_all)]
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> anyhow::Result<()> {
        let mut lines = input.lines();
        self.status()?;

        loop {
            tokio::select! {
                Some(tick) = self.ticks.recv() => self.on_tick(tick)?,
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("input closed");
                        break;
                    };
                    if !self.handle(line.trim())? {
                        break;
                    }
                }
            }
        }

        info!(mode = %self.timer.mode(), "timer session ended");
        Ok(())
    }

    fn on_tick(&mut self, tick: Tick) -> anyhow::Result<()> {
        match self.timer.on_tick(tick) {
            TickOutcome::Expired => {
                writeln!(
                    self.out,
                    "Time's up. The lock is open: type 'switch' to {}.",
                    self.timer.switch_label().to_lowercase()
                )?;
            }
            TickOutcome::Counted { remaining_seconds } if remaining_seconds % 60 == 0 => {
                self.status()?;
            }
            TickOutcome::Counted { .. } | TickOutcome::Ignored => {}
        }
        Ok(())
    }

    /// Applies one typed command. Returns `false` when the session should end.
    fn handle(&mut self, command: &str) -> anyhow::Result<bool> {
        debug!(command, "session command");
        match command.to_ascii_lowercase().as_str() {
            "" => {}
            "start" => {
                let started = self.timer.start();
                self.report(started, "counting down", "start refused")?;
            }
            "pause" => {
                let paused = self.timer.pause();
                self.report(paused, "paused", "nothing to pause")?;
            }
            "toggle" => {
                let changed = self.timer.toggle();
                self.report(changed, "toggled", "toggle refused")?;
            }
            "key" => {
                let locked = self.timer.force_toggle_lock();
                writeln!(
                    self.out,
                    "{}",
                    if locked { "Locked." } else { "Unlocked." }
                )?;
            }
            "switch" => match self.timer.confirm_switch() {
                Some(mode) => writeln!(self.out, "Now in {mode} mode.")?,
                None => writeln!(self.out, "Still locked. Finish the session first.")?,
            },
            "status" => self.status()?,
            "play" => {
                let playing = self.turntable.lock().toggle_play();
                self.now_playing(playing)?;
            }
            "skip" => {
                self.turntable.lock().skip();
                self.now_playing(true)?;
            }
            "help" => writeln!(self.out, "{SESSION_HELP}")?,
            "quit" | "exit" => return Ok(false),
            other => writeln!(self.out, "unknown command: {other} ({SESSION_HELP})")?,
        }
        Ok(true)
    }

    fn report(&mut self, ok: bool, done: &str, refused: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{}", if ok { done } else { refused })?;
        if ok {
            self.status()?;
        }
        Ok(())
    }

    fn now_playing(&mut self, playing: bool) -> anyhow::Result<()> {
        let deck = self.turntable.lock().clone();
        writeln!(
            self.out,
            "{} {} ({})",
            if playing { "▶" } else { "⏸" },
            deck.title(),
            deck.source()
        )?;
        Ok(())
    }

    fn status(&mut self) -> anyhow::Result<()> {
        self.renderer.write_timer(
            &mut self.out,
            self.timer.label(),
            &self.timer.formatted(),
            self.timer.progress(),
            self.timer.snapshot(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{Mode, mode_flag};
    use std::time::Duration;
    use tokio::io::{AsyncWriteExt, BufReader};

    fn one_minute() -> TimerDurations {
        TimerDurations {
            focus_secs: 60,
            relax_secs: 60,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_unlocks_and_switch_resets_turntable() {
        let (switch, view) = mode_flag(Mode::Focus);
        let mut deck = Turntable::new(Mode::Focus, 2);
        deck.skip();

        let mut session = TimerSession::new(
            switch,
            one_minute(),
            deck,
            Renderer::plain(),
            Vec::new(),
        );

        let (mut client, server) = tokio::io::duplex(256);
        let script = tokio::spawn(async move {
            client.write_all(b"start\n").await.expect("write");
            tokio::time::sleep(Duration::from_secs(61)).await;
            client.write_all(b"switch\nquit\n").await.expect("write");
        });

        session.run(BufReader::new(server)).await.expect("run");
        script.await.expect("script");

        assert_eq!(view.get(), Mode::Relax);
        assert_eq!(session.timer().mode(), Mode::Relax);
        assert!(session.timer().is_locked());
        assert_eq!(session.timer().remaining_seconds(), 60);

        let deck = session.turntable();
        assert_eq!(deck.track(), 1);
        assert!(!deck.is_playing());

        let text = String::from_utf8(session.output().clone()).expect("utf8");
        assert!(text.contains("Time's up."));
        assert!(text.contains("Now in relax mode."));
    }

    #[tokio::test(start_paused = true)]
    async fn switch_is_refused_while_locked() {
        let (switch, view) = mode_flag(Mode::Focus);
        let mut session = TimerSession::new(
            switch,
            one_minute(),
            Turntable::new(Mode::Focus, 2),
            Renderer::plain(),
            Vec::new(),
        );

        let input: &[u8] = b"switch\nkey\nswitch\n";
        session.run(BufReader::new(input)).await.expect("run");

        assert_eq!(view.get(), Mode::Relax);
        let text = String::from_utf8(session.output().clone()).expect("utf8");
        assert!(text.contains("Still locked."));
        assert!(text.contains("Unlocked."));
    }
}
