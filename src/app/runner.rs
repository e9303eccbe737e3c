//! Async drivers: frame tick, match clock, link events and console input

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{error, info};

use crate::config::{Config, ConfigError, NetMode};
use crate::game::MatchPhase;
use crate::util::time::{tick_interval, MATCH_CLOCK_PERIOD};
use crate::ws::client::dial;
use crate::ws::handler::HostListener;
use crate::ws::LinkEvent;

use super::console::Command;
use super::session::{ConnectionStatus, LinkHandle, Session};

/// How often the status line is logged
pub const STATUS_PERIOD: Duration = Duration::from_secs(1);

/// 1 Hz timer that only runs while a round is in progress
#[derive(Debug, Default)]
pub struct MatchClock {
    interval: Option<Interval>,
}

impl MatchClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start; the first tick lands one full period from now
    pub fn start(&mut self) {
        let mut ticker = interval_at(Instant::now() + MATCH_CLOCK_PERIOD, MATCH_CLOCK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(ticker);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Follow the match phase
    pub fn sync(&mut self, playing: bool) {
        if playing && !self.is_running() {
            self.start();
        } else if !playing && self.is_running() {
            self.stop();
        }
    }

    /// Completes on the next tick; never completes while stopped
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Bind or dial according to the configured mode.
/// Transport failures end up in the session status, not as errors.
pub async fn establish_link(
    session: &mut Session,
    config: &Config,
    events: mpsc::Sender<LinkEvent>,
) -> Result<(), ConfigError> {
    match config.net_mode {
        NetMode::Offline => {}
        NetMode::Host => match HostListener::bind(config.listen_addr, events).await {
            Ok(listener) => {
                info!(
                    peer_id = %listener.peer_id(),
                    addr = %listener.local_addr(),
                    "Share this peer id with the other player"
                );
                session.attach(LinkHandle::Host(listener));
            }
            Err(e) => {
                error!(error = %e, "Could not host");
                session.disconnect(ConnectionStatus::Error(e.to_string()));
            }
        },
        NetMode::Client => {
            let url = config.host_url.clone().ok_or(ConfigError::Missing("HOST_URL"))?;
            let peer_id = config.host_peer_id.ok_or(ConfigError::Missing("HOST_PEER_ID"))?;
            session.attach(LinkHandle::Dialer(dial(url, peer_id, events)));
        }
    }
    Ok(())
}

fn apply_command(session: &mut Session, clock: &mut MatchClock, cmd: Command) {
    match cmd {
        Command::Keys(codes) => session.set_local_keys(codes),
        Command::Select { slot, character } => {
            session.select_character(slot, character);
        }
        Command::Start => {
            if session.start_match() {
                clock.start();
            }
        }
        Command::Menu => session.return_to_menu(),
    }
}

fn log_status(session: &Session) {
    let controller = session.controller();
    let [p1, p2] = &controller.sim().players;
    info!(
        mode = %session.mode(),
        link = %session.status(),
        phase = ?controller.phase(),
        time_left = controller.time_left(),
        wind = controller.wind_force(),
        p1_hp = p1.hp,
        p2_hp = p2.hp,
        winner = ?controller.outcome().and_then(|o| o.winner),
        "Status"
    );
}

/// Drive the session until `shutdown` completes; returns it for teardown
pub async fn run<F>(
    mut session: Session,
    mut link_events: mpsc::Receiver<LinkEvent>,
    mut commands: mpsc::Receiver<Command>,
    tick_rate: u32,
    shutdown: F,
) -> Session
where
    F: Future<Output = ()>,
{
    let mut frames = interval(tick_interval(tick_rate));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut status = interval(STATUS_PERIOD);
    let mut clock = MatchClock::new();
    tokio::pin!(shutdown);

    info!(tick_rate, mode = %session.mode(), "Session loop started");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = frames.tick() => session.tick(),
            _ = clock.tick() => session.on_second(),
            Some(event) = link_events.recv() => session.handle_link_event(event),
            Some(cmd) = commands.recv() => apply_command(&mut session, &mut clock, cmd),
            _ = status.tick() => log_status(&session),
        }
        clock.sync(session.phase() == MatchPhase::Playing);
    }

    clock.stop();
    info!("Session loop stopped");
    session
}
