//! Session registry: one game per connected client
//!
//! This module owns every live game on the server, including:
//! - Admission control against the maximum number of concurrent games
//! - Lookup by session ID (driving loops) and by address (incoming packets)
//! - Activity tracking and the idle-expiry sweep
//!
//! The games themselves know nothing about each other or about this registry.

use crate::config::{ConfigError, GameConfig};
use crate::game::Game;
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("maximum number of games reached ({max})")]
    MaxGamesReached { max: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A client's game and the metadata needed to route and expire it
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier assigned by the registry
    pub id: u32,
    /// Where frames for this session are sent
    pub addr: SocketAddr,
    pub game: Arc<Game>,
    /// Last time the client sent anything
    pub last_seen: Instant,
}

impl Session {
    pub fn new(id: u32, addr: SocketAddr, game: Arc<Game>) -> Self {
        Self {
            id,
            addr,
            game,
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

pub struct GameRegistry {
    sessions: HashMap<u32, Session>,
    next_session_id: u32,
    max_games: usize,
    game_config: GameConfig,
}

impl GameRegistry {
    pub fn new(max_games: usize, game_config: GameConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
            max_games,
            game_config,
        }
    }

    /// Creates a fresh game for `addr`, or refuses if the server is full.
    pub fn create_game(&mut self, addr: SocketAddr) -> Result<(u32, Arc<Game>), RegistryError> {
        if self.sessions.len() >= self.max_games {
            return Err(RegistryError::MaxGamesReached {
                max: self.max_games,
            });
        }

        let game = Arc::new(Game::with_config(self.game_config)?);
        let session_id = self.next_session_id;
        self.next_session_id += 1;

        info!("Session {} created for {}", session_id, addr);
        self.sessions
            .insert(session_id, Session::new(session_id, addr, Arc::clone(&game)));

        Ok((session_id, game))
    }

    pub fn get_game(&self, session_id: u32) -> Option<Arc<Game>> {
        self.sessions
            .get(&session_id)
            .map(|session| Arc::clone(&session.game))
    }

    pub fn find_session_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.sessions
            .iter()
            .find(|(_, session)| session.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Records client activity. Returns false for unknown sessions.
    pub fn touch(&mut self, session_id: u32) -> bool {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.touch();
            true
        } else {
            false
        }
    }

    pub fn remove_game(&mut self, session_id: u32) -> bool {
        if let Some(session) = self.sessions.remove(&session_id) {
            info!("Session {} removed", session.id);
            true
        } else {
            false
        }
    }

    /// Drops every session idle for longer than `timeout` and returns their IDs and addresses.
    pub fn cleanup_inactive(&mut self, timeout: Duration) -> Vec<(u32, SocketAddr)> {
        let expired: Vec<(u32, SocketAddr)> = self
            .sessions
            .values()
            .filter(|session| session.is_timed_out(timeout))
            .map(|session| (session.id, session.addr))
            .collect();

        for (session_id, _) in &expired {
            self.remove_game(*session_id);
        }

        expired
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn max_games(&self) -> usize {
        self.max_games
    }
}
