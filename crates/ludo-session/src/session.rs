//! One running game: seats, the turn state machine, and dice.
//!
//! [`GameSession`] is plain synchronous state. Every operation checks who is
//! asking, applies the change to its [`LocalGame`], and returns the messages
//! to deliver as `(Recipient, ServerMessage)` pairs; the session actor hands
//! those to [`GameSession::dispatch`]. Keeping delivery out of the game logic
//! is what makes this testable without sockets.

use std::fmt;
use std::time::{Duration, Instant};

use ludo_engine::{BoardState, Color, LocalGame, MoveSummary, RollSummary};
use ludo_protocol::{GameStateView, PlayerId, PlayerView, Recipient, ServerMessage, SessionId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use crate::{SessionConfig, SessionError};

/// Channel sender for delivering outbound messages to a player's
/// connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Messages produced by one session operation.
pub type Outbox = Vec<(Recipient, ServerMessage)>;

/// A player about to be seated in a new session.
#[derive(Debug, Clone)]
pub struct SeatSpec {
    pub player_id: PlayerId,
    pub name: String,
    pub sender: PlayerSender,
}

/// A seat at the table. Seat indices are dense `0..player_count` and never
/// change once the game starts.
#[derive(Debug)]
pub struct Seat {
    player_id: PlayerId,
    name: String,
    index: u8,
    color: Color,
    sender: Option<PlayerSender>,
    connected: bool,
    departed: bool,
}

impl Seat {
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The player gave up the seat with `leave_game`.
    pub fn has_departed(&self) -> bool {
        self.departed
    }

    /// Whether the connection behind `sender` currently holds this seat.
    ///
    /// Each connection has its own outbound channel, so the channel stands
    /// in for the connection.
    pub fn is_held_by(&self, sender: &PlayerSender) -> bool {
        self.connected
            && self
                .sender
                .as_ref()
                .is_some_and(|held| held.same_channel(sender))
    }

    fn view(&self) -> PlayerView {
        PlayerView {
            player_id: self.player_id.clone(),
            name: self.name.clone(),
            player_index: self.index,
            color: self.color,
            connected: self.connected,
            has_left: self.departed,
        }
    }
}

/// Why the sweep removes a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// Finished longer ago than the grace period.
    Finished,
    /// Nobody is connected.
    Abandoned,
    /// No roll or move within the inactivity timeout.
    Inactive,
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => write!(f, "finished"),
            Self::Abandoned => write!(f, "abandoned"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

/// A snapshot of session metadata, used by the registry sweep.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub is_game_over: bool,
    pub all_disconnected: bool,
    pub last_activity: Instant,
    pub finished_at: Option<Instant>,
}

impl SessionInfo {
    /// Whether the session should be removed at `now`, and why.
    pub fn expiry(&self, now: Instant, config: &SessionConfig) -> Option<ExpiryReason> {
        let elapsed = |since: Instant| now.saturating_duration_since(since);

        if let Some(finished_at) = self.finished_at {
            if elapsed(finished_at) >= config.finished_grace {
                return Some(ExpiryReason::Finished);
            }
        }
        if self.all_disconnected {
            return Some(ExpiryReason::Abandoned);
        }
        if elapsed(self.last_activity) >= config.inactivity_timeout {
            return Some(ExpiryReason::Inactive);
        }
        None
    }
}

/// One running game.
#[derive(Debug)]
pub struct GameSession {
    session_id: SessionId,
    game: LocalGame,
    seats: Vec<Seat>,
    rng: StdRng,
    allow_forced_dice: bool,
    /// Set when every other seat has left.
    forfeit_winner: Option<u8>,
    last_activity: Instant,
    finished_at: Option<Instant>,
}

impl GameSession {
    /// Seats `players` in order and starts the game with seat 0 to roll.
    pub fn new(
        session_id: SessionId,
        players: Vec<SeatSpec>,
        config: &SessionConfig,
        now: Instant,
    ) -> Result<Self, SessionError> {
        let player_count = u8::try_from(players.len())
            .ok()
            .filter(|n| (ludo_engine::MIN_PLAYERS..=ludo_engine::MAX_PLAYERS).contains(n))
            .ok_or(SessionError::InvalidPlayerCount(players.len()))?;

        for (i, seat) in players.iter().enumerate() {
            if players[..i].iter().any(|s| s.player_id == seat.player_id) {
                return Err(SessionError::DuplicatePlayer(seat.player_id.clone()));
            }
        }

        let (game, _events) = LocalGame::create(player_count, config.rules)
            .map_err(|_| SessionError::InvalidPlayerCount(players.len()))?;

        let seats = players
            .into_iter()
            .zip(0u8..)
            .map(|(spec, index)| Seat {
                player_id: spec.player_id,
                name: spec.name,
                index,
                color: Color::for_seat(player_count, index),
                sender: Some(spec.sender),
                connected: true,
                departed: false,
            })
            .collect();

        Ok(Self {
            session_id,
            game,
            seats,
            rng: StdRng::from_os_rng(),
            allow_forced_dice: config.allow_forced_dice,
            forfeit_winner: None,
            last_activity: now,
            finished_at: None,
        })
    }

    /// Replaces the dice source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    // -- Queries --

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn player_count(&self) -> u8 {
        self.game.board().player_count()
    }

    pub fn board(&self) -> &BoardState {
        self.game.board()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, player_id: &PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| &s.player_id == player_id)
    }

    pub fn pending_dice(&self) -> Option<u8> {
        self.game.pending_dice()
    }

    pub fn winner_index(&self) -> Option<u8> {
        self.game.winner().or(self.forfeit_winner)
    }

    pub fn is_game_over(&self) -> bool {
        self.winner_index().is_some()
    }

    pub fn all_players_disconnected(&self) -> bool {
        self.seats.iter().all(|s| !s.connected)
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id,
            is_game_over: self.is_game_over(),
            all_disconnected: self.all_players_disconnected(),
            last_activity: self.last_activity,
            finished_at: self.finished_at,
        }
    }

    pub fn players_view(&self) -> Vec<PlayerView> {
        self.seats.iter().map(Seat::view).collect()
    }

    /// Full snapshot for `game_state`, `match_found`, and `token_moved`.
    pub fn state_view(&self) -> GameStateView {
        let board = self.game.board();
        GameStateView {
            session_id: self.session_id,
            player_count: board.player_count(),
            current_player: board.current_player(),
            consecutive_sixes: board.consecutive_sixes(),
            turn_count: board.turn_count(),
            token_positions: board.tokens()[..board.active_slots()].to_vec(),
            pending_dice: self.game.pending_dice(),
            valid_moves: self.game.pending_moves().to_vec(),
            is_game_over: self.is_game_over(),
            winner_id: self
                .winner_index()
                .map(|i| self.seats[usize::from(i)].player_id.clone()),
            players: self.players_view(),
            board: board.to_base64(),
        }
    }

    // -- Operations --

    /// The `match_found` broadcast that opens the game.
    pub fn match_found(&self) -> Outbox {
        vec![(
            Recipient::All,
            ServerMessage::MatchFound {
                session_id: self.session_id,
                player_count: self.player_count(),
                players: self.players_view(),
                game_state: self.state_view(),
            },
        )]
    }

    /// Rolls for `player_id`. `forced` replaces the random value when the
    /// session allows it.
    pub fn roll_dice(
        &mut self,
        player_id: &PlayerId,
        forced: Option<u8>,
        now: Instant,
    ) -> Result<Outbox, SessionError> {
        let seat = self.check_turn(player_id)?;
        if self.game.pending_dice().is_some() {
            return Err(SessionError::RollPending);
        }

        let dice = match forced {
            Some(_) if !self.allow_forced_dice => return Err(SessionError::ForcedDiceDisallowed),
            Some(value) if !(1..=6).contains(&value) => {
                return Err(SessionError::InvalidForcedValue(value));
            }
            Some(value) => value,
            None => self.rng.random_range(1..=6),
        };

        let summary = self.game.process_dice_roll(dice)?;
        self.last_activity = now;
        if summary.turn_switched {
            self.skip_departed_seats();
        }

        tracing::debug!(
            session_id = %self.session_id,
            seat,
            dice,
            moves = summary.valid_moves.len(),
            "dice rolled"
        );

        Ok(vec![(Recipient::All, self.dice_rolled(&summary))])
    }

    /// Moves `token` (a board slot, `0..player_count * 4`) by the pending
    /// roll.
    ///
    /// A move the rules forbid is answered with `move_failed` to the mover
    /// only, and the roll stays pending.
    pub fn move_token(
        &mut self,
        player_id: &PlayerId,
        token: usize,
        now: Instant,
    ) -> Result<Outbox, SessionError> {
        let seat = self.check_turn(player_id)?;
        let dice = self.game.pending_dice().ok_or(SessionError::NoPendingRoll)?;

        let summary = self.game.move_token(token)?;
        self.last_activity = now;

        if !summary.result.is_success() {
            tracing::debug!(
                session_id = %self.session_id,
                seat,
                token,
                result = ?summary.result,
                "move rejected"
            );
            let failed = ServerMessage::MoveFailed {
                player_index: seat,
                token_index: token,
                move_result: summary.result,
                dice_value: dice,
                valid_moves: self.game.pending_moves().to_vec(),
            };
            return Ok(vec![(Recipient::Player(player_id.clone()), failed)]);
        }

        if summary.turn_switched {
            self.skip_departed_seats();
        }
        if summary.has_won {
            self.finished_at = Some(now);
            tracing::info!(session_id = %self.session_id, %player_id, "game won");
        }

        let mut out = vec![(Recipient::All, self.token_moved(&summary))];
        if summary.has_won {
            out.push((Recipient::All, self.game_over(seat)));
        }
        Ok(out)
    }

    /// Current snapshot for one seat.
    pub fn game_state(&self, player_id: &PlayerId) -> Result<GameStateView, SessionError> {
        self.active_seat(player_id)?;
        Ok(self.state_view())
    }

    /// The connection behind `sender` dropped. The seat is kept for a
    /// reconnect.
    ///
    /// Nothing changes unless that connection still holds the seat, so a
    /// late close from a replaced connection cannot cut off its successor.
    pub fn disconnect_player(
        &mut self,
        player_id: &PlayerId,
        sender: &PlayerSender,
    ) -> Result<Outbox, SessionError> {
        let index = self.active_seat(player_id)?;
        let seat = &mut self.seats[usize::from(index)];
        if !seat.is_held_by(sender) {
            tracing::debug!(session_id = %self.session_id, %player_id, "stale disconnect ignored");
            return Ok(Vec::new());
        }
        seat.connected = false;
        seat.sender = None;
        tracing::info!(session_id = %self.session_id, %player_id, "player disconnected");

        Ok(vec![(
            Recipient::AllExcept(player_id.clone()),
            ServerMessage::PlayerDisconnected {
                player_id: player_id.clone(),
            },
        )])
    }

    /// Attaches a new connection to a disconnected seat and re-syncs it.
    ///
    /// A seat whose connection is still live is refused.
    pub fn reconnect_player(
        &mut self,
        player_id: &PlayerId,
        sender: PlayerSender,
    ) -> Result<Outbox, SessionError> {
        let index = self.active_seat(player_id)?;
        let seat = &mut self.seats[usize::from(index)];
        if seat.connected {
            return Err(SessionError::StillConnected(player_id.clone()));
        }
        seat.sender = Some(sender);
        seat.connected = true;
        tracing::info!(session_id = %self.session_id, %player_id, "player reconnected");

        Ok(vec![
            (
                Recipient::Player(player_id.clone()),
                ServerMessage::GameState(self.state_view()),
            ),
            (
                Recipient::AllExcept(player_id.clone()),
                ServerMessage::PlayerReconnected {
                    player_id: player_id.clone(),
                },
            ),
        ])
    }

    /// The player gives up their seat for good.
    ///
    /// If they held the turn it passes on. When only one seat is left in an
    /// unfinished game, that seat wins by forfeit.
    pub fn remove_player(
        &mut self,
        player_id: &PlayerId,
        now: Instant,
    ) -> Result<Outbox, SessionError> {
        let index = self.active_seat(player_id)?;
        let seat = &mut self.seats[usize::from(index)];
        seat.departed = true;
        seat.connected = false;
        seat.sender = None;
        tracing::info!(session_id = %self.session_id, %player_id, "player left game");

        let mut out = vec![(
            Recipient::AllExcept(player_id.clone()),
            ServerMessage::PlayerLeft {
                player_id: player_id.clone(),
            },
        )];
        if self.is_game_over() {
            return Ok(out);
        }

        let mut remaining = self.seats.iter().filter(|s| !s.has_departed());
        if let (Some(last), None) = (remaining.next(), remaining.next()) {
            let winner = last.index;
            self.forfeit_winner = Some(winner);
            self.finished_at = Some(now);
            tracing::info!(session_id = %self.session_id, winner, "game won by forfeit");
            out.push((Recipient::All, self.game_over(winner)));
            return Ok(out);
        }

        if self.game.current_player() == index {
            // The board cannot be finished here: is_game_over was checked above.
            let _ = self.game.skip_turn();
            self.skip_departed_seats();
        }
        out.push((Recipient::All, ServerMessage::GameState(self.state_view())));
        Ok(out)
    }

    // -- Delivery --

    /// Delivers `out` to the addressed seats.
    pub fn dispatch(&self, out: Outbox) {
        for (recipient, msg) in out {
            match recipient {
                Recipient::All => self.broadcast(&msg, None),
                Recipient::AllExcept(excluded) => self.broadcast(&msg, Some(&excluded)),
                Recipient::Player(pid) => {
                    self.send_to_player(&pid, msg);
                }
            }
        }
    }

    /// Sends to every connected seat except `exclude`. A closed receiver is
    /// skipped; it never stops delivery to the others.
    pub fn broadcast(&self, msg: &ServerMessage, exclude: Option<&PlayerId>) {
        for seat in &self.seats {
            if Some(&seat.player_id) == exclude {
                continue;
            }
            if let Some(sender) = seat.sender.as_ref().filter(|_| seat.connected) {
                let _ = sender.send(msg.clone());
            }
        }
    }

    /// Returns `false` if the seat is unknown, disconnected, or its
    /// receiver is gone.
    pub fn send_to_player(&self, player_id: &PlayerId, msg: ServerMessage) -> bool {
        self.seat(player_id)
            .filter(|s| s.connected)
            .and_then(|s| s.sender.as_ref())
            .is_some_and(|sender| sender.send(msg).is_ok())
    }

    // -- Internals --

    /// Seat index of a player still at the table.
    fn active_seat(&self, player_id: &PlayerId) -> Result<u8, SessionError> {
        self.seat(player_id)
            .filter(|s| !s.has_departed())
            .map(|s| s.index)
            .ok_or_else(|| SessionError::NotInGame(player_id.clone()))
    }

    /// Seat index of `player_id` if it is their turn in a running game.
    fn check_turn(&self, player_id: &PlayerId) -> Result<u8, SessionError> {
        let seat = self.active_seat(player_id)?;
        if self.is_game_over() {
            return Err(SessionError::GameOver);
        }
        if self.game.current_player() != seat {
            return Err(SessionError::NotYourTurn(player_id.clone()));
        }
        Ok(seat)
    }

    /// Passes the turn over seats whose players have left.
    fn skip_departed_seats(&mut self) {
        for _ in 0..self.seats.len() {
            let current = usize::from(self.game.current_player());
            if !self.seats[current].has_departed() || self.game.skip_turn().is_err() {
                break;
            }
        }
    }

    fn dice_rolled(&self, summary: &RollSummary) -> ServerMessage {
        ServerMessage::DiceRolled {
            player_index: summary.player,
            dice_value: summary.dice,
            valid_moves: summary.valid_moves.clone(),
            no_valid_moves: summary.no_valid_moves(),
            turn_switched: summary.turn_switched,
            next_player: self.game.current_player(),
        }
    }

    fn token_moved(&self, summary: &MoveSummary) -> ServerMessage {
        ServerMessage::TokenMoved {
            player_index: summary.player,
            token_index: summary.token,
            move_result: summary.result,
            new_position: summary.new_position,
            evicted_tokens: summary.evicted.clone(),
            has_won: summary.has_won,
            turn_switched: summary.turn_switched,
            next_player: self.game.current_player(),
            game_state: self.state_view(),
        }
    }

    fn game_over(&self, winner: u8) -> ServerMessage {
        let seat = &self.seats[usize::from(winner)];
        ServerMessage::GameOver {
            winner_id: seat.player_id.clone(),
            winner_index: winner,
            winner_name: seat.name.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_game(&mut self, game: LocalGame) {
        self.game = game;
    }
}

/// Time since the session last saw a roll or a move.
pub fn idle_for(info: &SessionInfo, now: Instant) -> Duration {
    now.saturating_duration_since(info.last_activity)
}

// =========================================================================
// Tests
// =========================================================================
