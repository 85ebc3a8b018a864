//! Per-session driving loop
//!
//! Each accepted session gets one task that ticks its game on a fixed cadence
//! and pushes frames to the outgoing queue. The loop owns the decision to stop:
//! it ends once the session leaves the registry or the queue closes.

use crate::game::{Game, RenderOutcome, Transition};
use crate::network::GameMessage;
use crate::registry::GameRegistry;
use crate::render::{ChannelRenderer, RenderError};
use log::debug;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Ticks `game` every `tick` until the session is gone. Returns the number of frames sent.
pub async fn run_session(
    session_id: u32,
    addr: SocketAddr,
    game: Arc<Game>,
    registry: Arc<RwLock<GameRegistry>>,
    game_tx: mpsc::Sender<GameMessage>,
    tick: Duration,
) -> u64 {
    let mut interval_timer = interval(tick);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut renderer = ChannelRenderer::new(game_tx.clone(), addr);
    let mut first_frame = true;
    let mut frames = 0;

    debug!("Driving session {} every {:?}", session_id, tick);

    loop {
        interval_timer.tick().await;

        if game_tx.is_closed() {
            break;
        }

        // A reconnect replaces the game under a new ID, so compare instances too.
        let registered = registry.read().await.get_game(session_id);
        match registered {
            Some(current) if Arc::ptr_eq(&current, &game) => {}
            _ => break,
        }

        let report = game.update(&mut renderer, first_frame);
        first_frame = false;

        if let Transition::Reset(cause) = report.transition {
            debug!("Session {} hit the {} and was reset", session_id, cause);
        }

        match report.render {
            RenderOutcome::Rendered => frames += 1,
            RenderOutcome::Skipped => {}
            RenderOutcome::Failed(RenderError::Closed) => break,
            RenderOutcome::Failed(e) => {
                debug!("Session {} frame deferred: {}", session_id, e);
            }
        }
    }

    debug!("Session {} stopped after {} frames", session_id, frames);
    frames
}
