//! The refresh scheduler. `dispatch` is a pure state transition: it mutates
//! the store and returns the effects for the runtime to carry out. It never
//! blocks and never awaits.

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::ops::{
    CommandOutcome, CommandResult, CommandSpec, Domain, FetchSpec, OpId, OpKind, Operation,
    Outcome, Request, ViewId,
};
use crate::state::Store;
use crate::ui::Screen;
use crate::views::{self, View, DASHBOARD_FETCHES};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Tick,
    Input(KeyEvent),
    Completed(OpId, Outcome),
    SwitchView(ViewId),
    Resize(u16, u16),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Launch(Operation),
    ScheduleTick(Duration),
    Quit,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dispatch {
    pub effects: Vec<Effect>,
    pub render: bool,
}

impl Dispatch {
    fn redraw() -> Self {
        Self {
            effects: Vec::new(),
            render: true,
        }
    }

    pub fn launched(&self) -> impl Iterator<Item = &Operation> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Launch(op) => Some(op),
            _ => None,
        })
    }
}

pub struct Controller {
    active: ViewId,
    views: Vec<Box<dyn View + Send>>,
    store: Store,
    in_flight: HashMap<OpId, Operation>,
    // a changed query waiting for the running fetch of its domain
    queued: HashMap<Domain, (ViewId, FetchSpec)>,
    next_id: u64,
    tick: Duration,
    background_sampling: bool,
}

impl Controller {
    pub fn new(cfg: &Config) -> Self {
        Self::with_views(views::all(cfg), cfg.tick(), cfg.background_sampling)
    }

    pub fn with_views(
        views: Vec<Box<dyn View + Send>>,
        tick: Duration,
        background_sampling: bool,
    ) -> Self {
        Self {
            active: ViewId::Dashboard,
            views,
            store: Store::new(),
            in_flight: HashMap::new(),
            queued: HashMap::new(),
            next_id: 1,
            tick,
            background_sampling,
        }
    }

    pub fn active(&self) -> ViewId {
        self.active
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &Operation> {
        self.in_flight.values()
    }

    pub fn fetching(&self, domain: Domain) -> bool {
        self.in_flight
            .values()
            .any(|op| op.is_fetch() && op.domain() == domain)
    }

    pub fn queued(&self, domain: Domain) -> Option<&FetchSpec> {
        self.queued.get(&domain).map(|(_, spec)| spec)
    }

    fn running_fetches(&self, domain: Domain) -> impl Iterator<Item = &FetchSpec> {
        self.in_flight.values().filter_map(move |op| match &op.kind {
            OpKind::Fetch(spec) if spec.domain() == domain => Some(spec),
            _ => None,
        })
    }

    fn view(&self, id: ViewId) -> Option<&(dyn View + Send)> {
        self.views.get(id.index()).map(|v| v.as_ref())
    }

    pub fn screen(&self) -> Option<Screen<'_>> {
        let view = self.view(self.active)?;
        Some(Screen {
            active: self.active,
            view,
            store: &self.store,
        })
    }

    /// Startup: one fetch per domain any view shows, and the first tick.
    pub fn init(&mut self) -> Dispatch {
        let mut out = Dispatch::redraw();
        let specs: Vec<(ViewId, FetchSpec)> = self
            .views
            .iter()
            .flat_map(|v| {
                let id = v.id();
                v.fetches().into_iter().map(move |f| (id, f))
            })
            .collect();
        for (origin, spec) in specs {
            self.launch_fetch(origin, spec, &mut out);
        }
        out.effects.push(Effect::ScheduleTick(self.tick));
        out
    }

    pub fn dispatch(&mut self, event: Event) -> Dispatch {
        match event {
            Event::Tick => self.on_tick(),
            Event::Input(key) => self.on_key(key),
            Event::Completed(id, outcome) => self.on_completed(id, outcome),
            Event::SwitchView(target) => self.switch(target),
            Event::Resize(..) => Dispatch::redraw(),
        }
    }

    fn on_tick(&mut self) -> Dispatch {
        let mut out = Dispatch::default();
        if self.active == ViewId::Dashboard || self.background_sampling {
            for spec in DASHBOARD_FETCHES {
                self.launch_fetch(ViewId::Dashboard, spec, &mut out);
            }
        }
        out.effects.push(Effect::ScheduleTick(self.tick));
        out
    }

    fn on_key(&mut self, key: KeyEvent) -> Dispatch {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return quit(),
            KeyCode::Char('c') if ctrl => return quit(),
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                if let Some(target) = ViewId::from_index(idx) {
                    return self.switch(target);
                }
            }
            KeyCode::Tab => {
                let next = (self.active.index() + 1) % ViewId::ALL.len();
                return self.switch(ViewId::ALL[next]);
            }
            KeyCode::BackTab => {
                let n = ViewId::ALL.len();
                let prev = (self.active.index() + n - 1) % n;
                return self.switch(ViewId::ALL[prev]);
            }
            _ => {}
        }

        let origin = self.active;
        let Some(view) = self.views.get_mut(origin.index()) else {
            error!(view = ?origin, "no view registered");
            return Dispatch::default();
        };
        let requests = view.handle_key(key, &mut self.store);

        let mut out = Dispatch::redraw();
        let mut seen: Vec<Domain> = Vec::new();
        for req in requests {
            let domain = match &req {
                Request::Fetch(f) => f.domain(),
                Request::Command(c) => c.domain(),
            };
            // at most one operation per domain from a single key
            if seen.contains(&domain) {
                continue;
            }
            seen.push(domain);
            match req {
                Request::Fetch(spec) => self.launch_fetch(origin, spec, &mut out),
                Request::Command(cmd) => self.launch(origin, OpKind::Command(cmd), &mut out),
            }
        }
        out
    }

    fn switch(&mut self, target: ViewId) -> Dispatch {
        if self.view(target).is_none() {
            error!(view = ?target, "switch to unregistered view");
            return Dispatch::default();
        }
        self.active = target;
        Dispatch::redraw()
    }

    fn on_completed(&mut self, id: OpId, outcome: Outcome) -> Dispatch {
        let Some(op) = self.in_flight.remove(&id) else {
            error!(%id, "completion for unknown operation");
            return Dispatch::default();
        };
        let domain = op.domain();
        let mut out = Dispatch::redraw();

        match (op.kind, outcome) {
            (OpKind::Fetch(_), Outcome::Fetched(result)) => {
                if let Err(e) = &result {
                    warn!(%id, %domain, error = %e, "fetch failed");
                }
                if let Err(m) = self.store.apply_fetch(domain, result) {
                    error!(%id, expected = %m.expected, got = %m.got, "snapshot for wrong domain");
                    out.render = false;
                }
                if !self.fetching(domain) {
                    if let Some((origin, spec)) = self.queued.remove(&domain) {
                        debug!(%domain, "launching queued fetch");
                        self.launch(origin, OpKind::Fetch(spec), &mut out);
                        out.render = true;
                    }
                }
            }
            (OpKind::Command(cmd), Outcome::Commanded(result)) => {
                let (outcome, err) = match result {
                    Ok(()) => (CommandOutcome::Succeeded, None),
                    Err(e) => {
                        warn!(%id, command = %cmd.describe(), error = %e, "command failed");
                        (CommandOutcome::Failed(e.to_string()), Some(e))
                    }
                };
                let succeeded = outcome == CommandOutcome::Succeeded;
                self.store.apply_command(
                    CommandResult {
                        domain,
                        target_key: cmd.target_key(),
                        action: cmd.describe(),
                        outcome,
                    },
                    err,
                );
                if succeeded {
                    // read-your-writes: always refetch, even if a tick fetch is pending
                    if let Some(spec) = refetch_for(&cmd) {
                        self.launch(op.origin, OpKind::Fetch(spec), &mut out);
                    }
                }
            }
            (kind, outcome) => {
                error!(%id, ?kind, ?outcome, "outcome does not match operation kind");
                out.render = false;
            }
        }
        out
    }

    /// Launch unless the same query is already in flight for the domain. A
    /// different query waits for the running one and replaces any earlier wait.
    fn launch_fetch(&mut self, origin: ViewId, spec: FetchSpec, out: &mut Dispatch) {
        let domain = spec.domain();
        if !self.fetching(domain) {
            self.launch(origin, OpKind::Fetch(spec), out);
            return;
        }
        if self.running_fetches(domain).any(|running| *running == spec) {
            debug!(%domain, "fetch coalesced");
            self.queued.remove(&domain);
        } else {
            debug!(%domain, "fetch queued behind a different query");
            self.queued.insert(domain, (origin, spec));
        }
    }

    fn launch(&mut self, origin: ViewId, kind: OpKind, out: &mut Dispatch) {
        let id = OpId(self.next_id);
        self.next_id += 1;
        let op = Operation { id, origin, kind };
        debug!(%id, domain = %op.domain(), "launch");
        self.in_flight.insert(id, op.clone());
        out.effects.push(Effect::Launch(op));
    }
}

fn quit() -> Dispatch {
    Dispatch {
        effects: vec![Effect::Quit],
        render: false,
    }
}

fn refetch_for(cmd: &CommandSpec) -> Option<FetchSpec> {
    match cmd.domain() {
        Domain::Processes => Some(FetchSpec::Processes),
        Domain::Services => Some(FetchSpec::Services),
        other => {
            error!(domain = %other, "command for a domain without a listing");
            None
        }
    }
}
