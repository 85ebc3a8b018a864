//! # Snake Server Library
//!
//! This library provides the authoritative server for a real-time Snake game.
//! The server owns every piece of game state; clients only send key presses
//! and receive snapshots to draw.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Each session runs its own [`game::Game`]: a single-snake state machine that
//! integrates movement on a row/column grid, detects wall and self
//! collisions, spawns fruit, grows the tail and keeps score. There is no game
//! over screen; a collision silently resets the board and play continues.
//!
//! ### Session Management
//! The [`registry::GameRegistry`] creates one game per client, refuses new
//! games once the configured limit is reached, and drops games that have
//! been idle for too long.
//!
//! ### Frame Delivery
//! A driving loop per session ticks its game on a fixed cadence (16ms by
//! default). Whenever the state changed since the last successful frame, the
//! game hands a read-only view to a [`render::Renderer`], which queues a
//! snapshot for the network layer to send.
//!
//! ## Architecture Design
//!
//! ### One Lock Per Game
//! All state of a game sits behind one mutex. Input handlers and the tick
//! both take it for their whole body, so every transition is atomic with
//! respect to the others. The renderer is called with the lock held and must
//! therefore return promptly.
//!
//! ### Time-Gated Movement
//! The tick cadence and the snake's speed are independent: a tick only moves
//! the snake once `1000 / speed` milliseconds have passed since its last move.
//!
//! ## Module Organization
//!
//! - `config`: command-line and per-game settings
//! - `grid`, `entity`: board bounds, snake and fruit
//! - `game`: the state machine and its tick
//! - `render`: the render callback contract
//! - `registry`: sessions, admission limit and idle expiry
//! - `driver`: the per-session tick loop
//! - `network`: UDP transport tying packets to sessions
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let mut server = Server::new(&config).await?;
//!
//!     // Accepts clients, creates one game each and streams frames until shutdown
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! The core can also be driven without any networking:
//!
//! ```rust
//! use server::game::{Game, GameState};
//! use server::render::RenderError;
//! use shared::Direction;
//!
//! let game = Game::new(10, 10).unwrap();
//! game.set_direction(Direction::Right);
//!
//! let mut print = |state: &GameState| -> Result<(), RenderError> {
//!     println!("{}", state.snapshot().to_ascii());
//!     Ok(())
//! };
//! game.update(&mut print, true);
//! assert_eq!(game.snapshot().player.x, 1);
//! ```

pub mod config;
pub mod driver;
pub mod entity;
pub mod game;
pub mod grid;
pub mod network;
pub mod registry;
pub mod render;
pub mod utils;
