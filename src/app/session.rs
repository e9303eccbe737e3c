//! Session: single owner of the match, the peer link and the tick role

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::NetMode;
use crate::game::{
    advance_tick, apply_snapshot, CharacterType, InputSet, MatchController, MatchPhase,
    ParticleSpawn, ParticleSystem, PlayerId, RoundOutcome, SnapshotBuilder, TickInputs,
};
use crate::ws::handler::HostListener;
use crate::ws::{LinkEvent, NetMessage, PeerSender};

/// Connection status shown to the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Initializing,
    WaitingForPlayer,
    ReadyToJoin,
    Connecting,
    Connected,
    Error(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => f.write_str("Disconnected"),
            ConnectionStatus::Initializing => f.write_str("Initializing..."),
            ConnectionStatus::WaitingForPlayer => f.write_str("Waiting for player..."),
            ConnectionStatus::ReadyToJoin => f.write_str("Ready to join"),
            ConnectionStatus::Connecting => f.write_str("Connecting..."),
            ConnectionStatus::Connected => f.write_str("Connected!"),
            ConnectionStatus::Error(reason) => write!(f, "Error: {reason}"),
        }
    }
}

/// Archetypes picked in the menu for the next match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub p1: CharacterType,
    pub p2: CharacterType,
}

/// Transport resources held while linked; released on disconnect
pub enum LinkHandle {
    /// Bound host identity
    Host(HostListener),
    /// Client connection task
    Dialer(JoinHandle<()>),
}

impl LinkHandle {
    fn release(self) {
        match self {
            LinkHandle::Host(listener) => listener.release(),
            LinkHandle::Dialer(task) => task.abort(),
        }
    }
}

/// State a tick role reads and writes
pub struct SessionState {
    controller: MatchController,
    particles: ParticleSystem,
    local_input: InputSet,
    remote_input: InputSet,
    peer: Option<PeerSender>,
    /// Latest snapshot not yet applied (client); last write wins
    pending_snapshot: Option<NetMessage>,
    snapshots: SnapshotBuilder,
    sim_rng: ChaCha8Rng,
    fx_rng: ChaCha8Rng,
}

impl SessionState {
    fn new(seed: u64) -> Self {
        Self {
            controller: MatchController::new(),
            particles: ParticleSystem::new(),
            local_input: InputSet::new(),
            remote_input: InputSet::new(),
            peer: None,
            pending_snapshot: None,
            snapshots: SnapshotBuilder::new(),
            sim_rng: ChaCha8Rng::seed_from_u64(seed),
            fx_rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
        }
    }

    fn send(&self, msg: NetMessage) {
        if let Some(peer) = &self.peer {
            peer.send(msg);
        }
    }

    fn send_snapshot(&mut self, outcome: Option<RoundOutcome>) {
        let Some(peer) = &self.peer else {
            return;
        };
        let msg = self.snapshots.build(&self.controller, outcome);
        if let Err(e) = self.snapshots.measure(&msg) {
            warn!(error = %e, "Snapshot could not be encoded");
            return;
        }
        peer.send(msg);
    }

    /// Spawn locally and mirror to the peer
    fn emit_particles(&mut self, spawns: Vec<ParticleSpawn>) {
        for spawn in spawns {
            self.particles.spawn(&spawn, &mut self.fx_rng);
            self.send(NetMessage::particle(&spawn));
        }
    }
}

/// Per-session strategy for the two periodic drivers
pub trait TickRole: fmt::Debug + Send {
    /// One frame tick
    fn tick(&mut self, state: &mut SessionState);

    /// Once-per-second match cadence
    fn on_second(&mut self, state: &mut SessionState);
}

/// Runs the engine (offline and host)
#[derive(Debug)]
pub struct Authoritative {
    /// P2 reads the remote set instead of the local one
    remote_p2: bool,
}

impl Authoritative {
    pub fn offline() -> Self {
        Self { remote_p2: false }
    }

    pub fn host() -> Self {
        Self { remote_p2: true }
    }
}

impl TickRole for Authoritative {
    fn tick(&mut self, state: &mut SessionState) {
        if state.controller.is_playing() {
            let inputs = if self.remote_p2 {
                TickInputs::split(&state.local_input, &state.remote_input)
            } else {
                TickInputs::shared(&state.local_input)
            };
            let wind = state.controller.wind_force();
            let out = advance_tick(state.controller.sim_mut(), &inputs, wind, &mut state.sim_rng);

            state.emit_particles(out.particle_spawns);
            if let Some(outcome) = out.round_ended {
                state.controller.end_round(outcome);
            }
            state.send_snapshot(out.round_ended);
        }
        state.particles.update();
    }

    fn on_second(&mut self, state: &mut SessionState) {
        let out = state.controller.on_second(&mut state.sim_rng);
        if out.round_ended.is_some() {
            state.send_snapshot(out.round_ended);
        }
    }
}

/// Mirrors the host: sends input, applies snapshots, never simulates
#[derive(Debug)]
pub struct Mirror;

impl TickRole for Mirror {
    fn tick(&mut self, state: &mut SessionState) {
        state.send(NetMessage::Input {
            keys: state.local_input.to_codes(),
        });

        if let Some(msg) = state.pending_snapshot.take() {
            if let Some(outcome) = apply_snapshot(&mut state.controller, msg) {
                state.controller.end_round(outcome);
            }
        }
        state.particles.update();
    }

    fn on_second(&mut self, _state: &mut SessionState) {}
}

fn role_for(mode: NetMode) -> Box<dyn TickRole> {
    match mode {
        NetMode::Offline => Box::new(Authoritative::offline()),
        NetMode::Host => Box::new(Authoritative::host()),
        NetMode::Client => Box::new(Mirror),
    }
}

/// One player's game instance
pub struct Session {
    mode: NetMode,
    role: Box<dyn TickRole>,
    state: SessionState,
    selection: Selection,
    status: ConnectionStatus,
    link: Option<LinkHandle>,
}

impl Session {
    pub fn new(mode: NetMode, seed: u64, selection: Selection) -> Self {
        let status = match mode {
            NetMode::Offline => ConnectionStatus::Disconnected,
            NetMode::Host | NetMode::Client => ConnectionStatus::Initializing,
        };
        info!(mode = %mode, seed, "Session created");
        Self {
            mode,
            role: role_for(mode),
            state: SessionState::new(seed),
            selection,
            status,
            link: None,
        }
    }

    pub fn mode(&self) -> NetMode {
        self.mode
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn controller(&self) -> &MatchController {
        &self.state.controller
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.controller.phase()
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.state.particles
    }

    pub fn is_linked(&self) -> bool {
        self.state.peer.is_some()
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            info!(status = %status, "Connection status");
            self.status = status;
        }
    }

    /// Hand transport resources to the session
    pub fn attach(&mut self, link: LinkHandle) {
        let status = match &link {
            LinkHandle::Host(_) => ConnectionStatus::WaitingForPlayer,
            LinkHandle::Dialer(_) => ConnectionStatus::Connecting,
        };
        if let Some(old) = self.link.replace(link) {
            old.release();
        }
        self.set_status(status);
    }

    /// Replace the locally held action codes
    pub fn set_local_keys<I, S>(&mut self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.local_input.replace(codes);
    }

    pub fn tick(&mut self) {
        self.role.tick(&mut self.state);
    }

    pub fn on_second(&mut self) {
        self.role.on_second(&mut self.state);
    }

    pub fn handle_link_event(&mut self, event: LinkEvent) {
        if self.mode == NetMode::Offline {
            debug!(?event, "Ignoring link event while offline");
            return;
        }

        match event {
            LinkEvent::Opened(peer) => {
                info!(mode = %self.mode, "Peer linked");
                self.state.peer = Some(peer);
                self.set_status(ConnectionStatus::Connected);
            }
            LinkEvent::Data(msg) => self.handle_message(msg),
            LinkEvent::Closed => self.disconnect(ConnectionStatus::Disconnected),
            LinkEvent::Error(reason) => self.disconnect(ConnectionStatus::Error(reason)),
        }
    }

    fn handle_message(&mut self, msg: NetMessage) {
        match (self.mode, msg) {
            (NetMode::Host, NetMessage::Input { keys }) => {
                self.state.remote_input.replace(keys);
            }
            (NetMode::Client, msg @ NetMessage::GameState { .. }) => {
                self.state.pending_snapshot = Some(msg);
            }
            (NetMode::Client, NetMessage::ParticleEvent { x, y, color, count }) => {
                let spawn = ParticleSpawn::new(x, y, &color, count);
                self.state.particles.spawn(&spawn, &mut self.state.fx_rng);
            }
            (_, NetMessage::MenuUpdate { p1_char, p2_char, start_game }) => {
                if let Some(c) = p1_char {
                    self.selection.p1 = c;
                }
                if let Some(c) = p2_char {
                    self.selection.p2 = c;
                }
                if start_game == Some(true) {
                    if self.mode == NetMode::Client {
                        self.begin_match();
                    } else {
                        warn!("Ignoring start request from client");
                    }
                }
            }
            (mode, msg) => {
                debug!(mode = %mode, kind = msg.kind(), "Unexpected message for role");
            }
        }
    }

    /// Change one slot's archetype and relay it to the peer
    pub fn select_character(&mut self, slot: PlayerId, character: CharacterType) -> bool {
        let msg = match slot {
            1 => {
                self.selection.p1 = character;
                NetMessage::MenuUpdate {
                    p1_char: Some(character),
                    p2_char: None,
                    start_game: None,
                }
            }
            2 => {
                self.selection.p2 = character;
                NetMessage::MenuUpdate {
                    p1_char: None,
                    p2_char: Some(character),
                    start_game: None,
                }
            }
            _ => return false,
        };
        info!(slot, character = %character, "Character selected");
        self.state.send(msg);
        true
    }

    /// Start a round (offline, or host with a paired client)
    pub fn start_match(&mut self) -> bool {
        match self.mode {
            NetMode::Client => {
                warn!("Only the host can start a match");
                return false;
            }
            NetMode::Host if self.state.peer.is_none() => {
                warn!("Cannot start, no player connected");
                return false;
            }
            _ => {}
        }
        self.begin_match();
        self.state.send(NetMessage::start_game());
        true
    }

    fn begin_match(&mut self) {
        self.state.controller.start_match(self.selection.p1, self.selection.p2);
        self.state.particles.clear();
        self.state.remote_input = InputSet::new();
        self.state.pending_snapshot = None;
    }

    /// Back to character selection; the link stays up for a rematch
    pub fn return_to_menu(&mut self) {
        self.state.controller.return_to_menu();
    }

    /// Tear the link down: MENU, role OFFLINE, identity released
    pub fn disconnect(&mut self, status: ConnectionStatus) {
        if self.mode != NetMode::Offline {
            info!(mode = %self.mode, status = %status, "Link lost, going offline");
        }
        self.state.controller.return_to_menu();
        self.mode = NetMode::Offline;
        self.role = role_for(NetMode::Offline);
        self.state.peer = None;
        self.state.remote_input = InputSet::new();
        self.state.pending_snapshot = None;
        if let Some(link) = self.link.take() {
            link.release();
        }
        self.set_status(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Hazard;
    use tokio::sync::mpsc;

    fn selection() -> Selection {
        Selection {
            p1: CharacterType::SirWobbles,
            p2: CharacterType::GumbyLegs,
        }
    }

    fn linked(mode: NetMode) -> (Session, mpsc::Receiver<NetMessage>) {
        let mut session = Session::new(mode, 7, selection());
        let (peer, rx) = PeerSender::channel(256);
        session.handle_link_event(LinkEvent::Opened(peer));
        (session, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<NetMessage>) -> Vec<NetMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn snapshot_of(controller: &MatchController, outcome: Option<RoundOutcome>) -> NetMessage {
        SnapshotBuilder::new().build(controller, outcome)
    }

    #[test]
    fn status_strings() {
        assert_eq!(ConnectionStatus::WaitingForPlayer.to_string(), "Waiting for player...");
        assert_eq!(ConnectionStatus::Connected.to_string(), "Connected!");
        assert_eq!(
            ConnectionStatus::Error("peer-unavailable".into()).to_string(),
            "Error: peer-unavailable"
        );
    }

    #[test]
    fn offline_both_players_share_the_keyboard() {
        let mut session = Session::new(NetMode::Offline, 1, selection());
        assert!(session.start_match());
        session.set_local_keys(["KeyD", "ArrowLeft"]);
        for _ in 0..5 {
            session.tick();
        }
        let [p1, p2] = &session.controller().sim().players;
        assert!(p1.x > 200.0);
        assert!(p2.x < 1000.0);
    }

    #[test]
    fn menu_ticks_do_not_simulate() {
        let mut session = Session::new(NetMode::Offline, 1, selection());
        let before = session.controller().sim().clone();
        session.set_local_keys(["KeyD"]);
        session.tick();
        assert_eq!(session.controller().sim(), &before);
    }

    #[test]
    fn host_reads_remote_input_for_p2() {
        let (mut session, _rx) = linked(NetMode::Host);
        assert!(session.start_match());
        session.handle_link_event(LinkEvent::Data(NetMessage::Input {
            keys: vec!["ArrowLeft".into(), "KeyD".into()],
        }));
        for _ in 0..5 {
            session.tick();
        }
        let [p1, p2] = &session.controller().sim().players;
        assert_eq!(p1.x, 200.0);
        assert!(p2.x < 1000.0);
    }

    #[test]
    fn host_broadcasts_start_state_and_particles() {
        let (mut session, mut rx) = linked(NetMode::Host);
        assert!(session.start_match());
        assert_eq!(drain(&mut rx), vec![NetMessage::start_game()]);

        // Ground quake: both grounded, so a burst spawns on P2
        session.set_local_keys(["KeyF"]);
        session.tick();
        let sent = drain(&mut rx);
        assert!(sent.iter().any(|m| matches!(m, NetMessage::ParticleEvent { count: 10, .. })));
        assert!(matches!(sent.last(), Some(NetMessage::GameState { outcome: None, .. })));
        assert!(!session.particles().is_empty());
    }

    #[test]
    fn host_knockout_ships_outcome() {
        let (mut session, mut rx) = linked(NetMode::Host);
        session.start_match();
        session.state.controller.sim_mut().players[1].hp = 0.0;
        session.tick();

        assert_eq!(session.phase(), MatchPhase::GameOver);
        let sent = drain(&mut rx);
        assert!(sent.iter().any(|m| matches!(
            m,
            NetMessage::GameState { outcome: Some(o), .. } if *o == RoundOutcome::won_by(1)
        )));

        // Nothing more is simulated or sent after the round
        session.tick();
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn start_is_reserved_for_host_with_peer() {
        let mut host = Session::new(NetMode::Host, 1, selection());
        assert!(!host.start_match());
        assert_eq!(host.phase(), MatchPhase::Menu);

        let (mut client, mut rx) = linked(NetMode::Client);
        assert!(!client.start_match());
        assert_eq!(client.phase(), MatchPhase::Menu);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn client_starts_on_request_without_echo() {
        let (mut client, mut rx) = linked(NetMode::Client);
        client.handle_link_event(LinkEvent::Data(NetMessage::start_game()));
        assert_eq!(client.phase(), MatchPhase::Playing);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn client_sends_input_and_never_simulates() {
        let (mut client, mut rx) = linked(NetMode::Client);
        client.handle_link_event(LinkEvent::Data(NetMessage::start_game()));
        client.set_local_keys(["ArrowRight"]);
        let before = client.controller().sim().clone();
        for _ in 0..10 {
            client.tick();
        }
        assert_eq!(client.controller().sim(), &before);

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 10);
        assert!(sent.iter().all(|m| m
            == &NetMessage::Input {
                keys: vec!["ArrowRight".into()]
            }));
    }

    #[test]
    fn client_applies_only_latest_snapshot() {
        let (mut client, _rx) = linked(NetMode::Client);
        client.handle_link_event(LinkEvent::Data(NetMessage::start_game()));

        let mut host = MatchController::new();
        host.start_match(CharacterType::SirWobbles, CharacterType::GumbyLegs);
        host.sim_mut().players[0].x = 300.0;
        let older = snapshot_of(&host, None);
        host.sim_mut().players[0].x = 333.0;
        host.sim_mut().hazards.push(Hazard::anvil(1, 0.5));
        host.mirror_environment(12, -0.2);
        let newer = snapshot_of(&host, None);

        client.handle_link_event(LinkEvent::Data(older));
        client.handle_link_event(LinkEvent::Data(newer));
        client.tick();

        assert_eq!(client.controller().sim().players[0].x, 333.0);
        assert_eq!(client.controller().sim().hazards.len(), 1);
        assert_eq!(client.controller().time_left(), 12);
        assert_eq!(client.controller().wind_force(), -0.2);
    }

    #[test]
    fn client_follows_host_outcome() {
        let (mut client, _rx) = linked(NetMode::Client);
        client.handle_link_event(LinkEvent::Data(NetMessage::start_game()));
        let mut host = MatchController::new();
        host.start_match(CharacterType::SirWobbles, CharacterType::GumbyLegs);
        client.handle_link_event(LinkEvent::Data(snapshot_of(&host, Some(RoundOutcome::draw()))));
        client.tick();
        assert_eq!(client.phase(), MatchPhase::GameOver);
        assert_eq!(client.controller().outcome(), Some(RoundOutcome::draw()));
    }

    #[test]
    fn client_replays_particle_events() {
        let (mut client, _rx) = linked(NetMode::Client);
        client.handle_link_event(LinkEvent::Data(NetMessage::ParticleEvent {
            x: 10.0,
            y: 20.0,
            color: "#fff".into(),
            count: 4,
        }));
        assert_eq!(client.particles().len(), 4);
    }

    #[test]
    fn selection_is_relayed_and_applied() {
        let (mut host, mut rx) = linked(NetMode::Host);
        assert!(host.select_character(2, CharacterType::TinyTim));
        assert!(!host.select_character(3, CharacterType::TinyTim));
        assert_eq!(host.selection().p2, CharacterType::TinyTim);
        assert_eq!(
            drain(&mut rx),
            vec![NetMessage::MenuUpdate {
                p1_char: None,
                p2_char: Some(CharacterType::TinyTim),
                start_game: None,
            }]
        );

        let (mut client, _rx) = linked(NetMode::Client);
        client.handle_link_event(LinkEvent::Data(NetMessage::MenuUpdate {
            p1_char: Some(CharacterType::BarrelBob),
            p2_char: None,
            start_game: Some(true),
        }));
        assert_eq!(client.selection().p1, CharacterType::BarrelBob);
        assert_eq!(client.controller().sim().players[0].character, CharacterType::BarrelBob);
    }

    #[test]
    fn disconnect_mid_match_goes_offline() {
        let (mut session, _rx) = linked(NetMode::Host);
        session.start_match();
        session.handle_link_event(LinkEvent::Closed);

        assert_eq!(session.phase(), MatchPhase::Menu);
        assert_eq!(session.mode(), NetMode::Offline);
        assert_eq!(session.status(), &ConnectionStatus::Disconnected);
        assert!(!session.is_linked());

        // Now an ordinary offline instance
        assert!(session.start_match());
        session.set_local_keys(["ArrowLeft"]);
        session.tick();
        assert!(session.controller().sim().players[1].x < 1000.0);
    }

    #[test]
    fn link_error_surfaces_in_status() {
        let mut session = Session::new(NetMode::Client, 1, selection());
        assert_eq!(session.status(), &ConnectionStatus::Initializing);
        session.handle_link_event(LinkEvent::Error("connection refused".into()));
        assert_eq!(session.status().to_string(), "Error: connection refused");
        assert_eq!(session.mode(), NetMode::Offline);
    }

    #[test]
    fn stale_events_after_going_offline_are_ignored() {
        let mut session = Session::new(NetMode::Offline, 1, selection());
        let (peer, _rx) = PeerSender::channel(4);
        session.handle_link_event(LinkEvent::Opened(peer));
        assert!(!session.is_linked());
        assert_eq!(session.status(), &ConnectionStatus::Disconnected);
    }

    #[test]
    fn menu_return_keeps_link() {
        let (mut session, _rx) = linked(NetMode::Host);
        session.start_match();
        session.return_to_menu();
        assert_eq!(session.phase(), MatchPhase::Menu);
        assert!(session.is_linked());
        assert!(session.start_match());
    }

    #[test]
    fn same_seed_same_match() {
        let run = || {
            let mut session = Session::new(NetMode::Offline, 99, selection());
            session.start_match();
            session.set_local_keys(["KeyD", "Space", "ArrowLeft", "Enter"]);
            for frame in 0..600 {
                session.tick();
                if frame % 60 == 59 {
                    session.on_second();
                }
            }
            session.controller().sim().clone()
        };
        assert_eq!(run(), run());
    }
}
