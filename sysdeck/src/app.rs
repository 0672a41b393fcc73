//! Runtime: terminal setup, the single event channel, worker tasks and drawing.
//! All state changes happen in `Controller::dispatch` on this loop.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self as term, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::controller::{Controller, Dispatch, Effect, Event};
use crate::error::{CommandError, FetchError};
use crate::ops::{OpKind, Operation, Outcome};
use crate::providers::Backend;

/// Upper bounds for a single provider or executor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub fetch: Duration,
    pub command: Duration,
}

impl From<&Config> for Timeouts {
    fn from(cfg: &Config) -> Self {
        Self {
            fetch: cfg.fetch_timeout(),
            command: cfg.command_timeout(),
        }
    }
}

/// Run one operation to completion. A hung collaborator becomes a timeout
/// failure instead of holding its domain busy forever.
pub async fn run_operation(backend: &dyn Backend, kind: OpKind, limits: Timeouts) -> Outcome {
    match kind {
        OpKind::Fetch(spec) => {
            let result = timeout(limits.fetch, backend.fetch(spec))
                .await
                .unwrap_or(Err(FetchError::Timeout(limits.fetch)));
            Outcome::Fetched(result)
        }
        OpKind::Command(cmd) => {
            let result = timeout(limits.command, backend.execute(cmd))
                .await
                .unwrap_or(Err(CommandError::Timeout(limits.command)));
            Outcome::Commanded(result)
        }
    }
}

/// Spawn the operation as its own task; it posts exactly one `Completed`.
pub fn spawn_operation(
    backend: Arc<dyn Backend>,
    op: Operation,
    limits: Timeouts,
    tx: UnboundedSender<Event>,
) {
    tokio::spawn(async move {
        let outcome = run_operation(backend.as_ref(), op.kind, limits).await;
        // receiver gone means we are shutting down
        let _ = tx.send(Event::Completed(op.id, outcome));
    });
}

pub struct App {
    controller: Controller,
    backend: Arc<dyn Backend>,
    limits: Timeouts,
}

impl App {
    pub fn new(cfg: &Config, backend: Arc<dyn Backend>) -> Self {
        Self {
            controller: Controller::new(cfg),
            backend,
            limits: Timeouts::from(cfg),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal).await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_input_reader(tx.clone());

        let first = self.controller.init();
        if self.apply(first, &tx) {
            return Ok(());
        }
        self.draw(terminal)?;

        while let Some(event) = rx.recv().await {
            let dispatch = self.controller.dispatch(event);
            let render = dispatch.render;
            if self.apply(dispatch, &tx) {
                info!("quit requested");
                break;
            }
            if render {
                self.draw(terminal)?;
            }
        }
        Ok(())
    }

    /// Carry out effects. Returns true on quit.
    fn apply(&self, dispatch: Dispatch, tx: &UnboundedSender<Event>) -> bool {
        let mut quit = false;
        for effect in dispatch.effects {
            match effect {
                Effect::Launch(op) => {
                    spawn_operation(self.backend.clone(), op, self.limits, tx.clone())
                }
                Effect::ScheduleTick(after) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        sleep(after).await;
                        let _ = tx.send(Event::Tick);
                    });
                }
                Effect::Quit => quit = true,
            }
        }
        quit
    }

    fn draw<B: ratatui::backend::Backend>(&self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|f| {
            if let Some(screen) = self.controller.screen() {
                f.render_widget(&screen, f.area());
            }
        })?;
        Ok(())
    }
}

/// Blocking terminal reads on a plain thread, forwarded into the event channel.
fn spawn_input_reader(tx: UnboundedSender<Event>) {
    thread::spawn(move || loop {
        let forwarded = match term::read() {
            Ok(term::Event::Key(k)) if k.kind == KeyEventKind::Press => tx.send(Event::Input(k)),
            Ok(term::Event::Resize(w, h)) => tx.send(Event::Resize(w, h)),
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "terminal input closed");
                return;
            }
        };
        if forwarded.is_err() {
            debug!("event loop gone; input reader exiting");
            return;
        }
    });
}
