//! Render callback contract
//!
//! A renderer receives a read-only view of the locked [`GameState`] whenever a
//! redraw is due. It runs while the game lock is held, so it must not block or
//! call back into the same [`Game`](crate::game::Game). A failed render leaves
//! the dirty flag set and is retried on the next tick.

use crate::game::GameState;
use crate::network::GameMessage;
use shared::Packet;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("transport closed")]
    Closed,
    #[error("transport is full")]
    Full,
    #[error("renderer failed: {0}")]
    Other(String),
}

pub trait Renderer {
    fn render(&mut self, state: &GameState) -> Result<(), RenderError>;
}

impl<F> Renderer for F
where
    F: FnMut(&GameState) -> Result<(), RenderError>,
{
    fn render(&mut self, state: &GameState) -> Result<(), RenderError> {
        self(state)
    }
}

/// Pushes each frame onto the outgoing packet queue without waiting.
pub struct ChannelRenderer {
    tx: mpsc::Sender<GameMessage>,
    addr: SocketAddr,
}

impl ChannelRenderer {
    pub fn new(tx: mpsc::Sender<GameMessage>, addr: SocketAddr) -> Self {
        Self { tx, addr }
    }
}

impl Renderer for ChannelRenderer {
    fn render(&mut self, state: &GameState) -> Result<(), RenderError> {
        let message = GameMessage::SendPacket {
            packet: Packet::Frame(state.snapshot()),
            addr: self.addr,
        };

        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => RenderError::Full,
            TrySendError::Closed(_) => RenderError::Closed,
        })
    }
}
