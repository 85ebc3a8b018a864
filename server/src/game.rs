//! Authoritative state machine for a single game
//!
//! [`GameState`] holds the board, the snake, the fruit and the session flags.
//! [`Game`] wraps it in one mutex; every public entry point takes that lock for
//! its whole body, so an input and a tick never observe each other half-done.

use crate::config::{ConfigError, GameConfig};
use crate::entity::{Fruit, Player};
use crate::grid::Grid;
use crate::render::{RenderError, Renderer};
use crate::utils::{system_clock, Clock};
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    Action, Direction, FruitSnapshot, PlayerSnapshot, Snapshot, FRUIT_RESPAWN_DELAY_MS,
    FRUIT_SPAWN_ATTEMPTS,
};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Wall,
    Tail,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collision::Wall => write!(f, "wall"),
            Collision::Tail => write!(f, "tail"),
        }
    }
}

/// What the simulation step of a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Paused,
    Idle,
    Moved,
    Ate,
    /// Game over: the state was reinitialized in place and play continues.
    Reset(Collision),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Skipped,
    Rendered,
    Failed(RenderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub transition: Transition,
    pub render: RenderOutcome,
}

#[derive(Debug)]
pub struct GameState {
    grid: Grid,
    player: Player,
    fruit: Fruit,
    score: u32,
    is_paused: bool,
    show_help: bool,
    start_time_ms: u64,
    last_frame_time_ms: u64,
    should_redraw: bool,
    /// Time of the tick being processed
    now_ms: u64,
    rng: StdRng,
}

impl GameState {
    fn new(config: GameConfig, rng: StdRng, now_ms: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = Grid::new(config.rows, config.cols)?;

        Ok(Self {
            grid,
            player: Player::new(config.speed),
            fruit: Fruit::default(),
            score: 0,
            is_paused: false,
            show_help: true,
            start_time_ms: now_ms,
            last_frame_time_ms: now_ms,
            should_redraw: true,
            now_ms,
            rng,
        })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn fruit(&self) -> &Fruit {
        &self.fruit
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn start_time_ms(&self) -> u64 {
        self.start_time_ms
    }

    pub fn last_frame_time_ms(&self) -> u64 {
        self.last_frame_time_ms
    }

    pub fn should_redraw(&self) -> bool {
        self.should_redraw
    }

    /// Time played as of the tick being processed.
    pub fn elapsed_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.start_time_ms)
    }

    /// Render surface as of the tick being processed.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_at(self.now_ms)
    }

    fn snapshot_at(&self, now_ms: u64) -> Snapshot {
        Snapshot {
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            player: PlayerSnapshot {
                x: self.player.x,
                y: self.player.y,
                direction: self.player.direction,
                tail: self.player.tail.iter().map(|s| (s.x, s.y)).collect(),
            },
            fruit: FruitSnapshot {
                active: self.fruit.active,
                x: self.fruit.x,
                y: self.fruit.y,
            },
            score: self.score,
            is_paused: self.is_paused,
            show_help: self.show_help,
            elapsed_ms: now_ms.saturating_sub(self.start_time_ms),
        }
    }

    /// Back to the starting position. Pause/help flags and speed survive.
    fn reset(&mut self, now_ms: u64) {
        self.player.x = 0;
        self.player.y = 0;
        self.player.direction = Direction::None;
        self.player.tail.clear();
        self.fruit.active = false;
        self.score = 0;
        self.now_ms = now_ms;
        self.start_time_ms = now_ms;
        self.should_redraw = true;
    }

    /// Simulation half of a tick: movement, collisions and fruit.
    fn advance(&mut self, now_ms: u64) -> Transition {
        self.now_ms = now_ms;

        if self.is_paused {
            return Transition::Paused;
        }

        let mut transition = Transition::Idle;

        if self.player.ready_to_move(now_ms) {
            let (prev_x, prev_y) = self.player.step();

            if !self.grid.contains(self.player.x, self.player.y) {
                self.reset(now_ms);
                return Transition::Reset(Collision::Wall);
            }

            if self.player.head_hits_tail() {
                self.reset(now_ms);
                return Transition::Reset(Collision::Tail);
            }

            self.player.follow(prev_x, prev_y);
            self.player.last_move_time_ms = now_ms;
            self.should_redraw = true;
            transition = Transition::Moved;
        }

        if self.fruit.active {
            if self.fruit.is_at(self.player.x, self.player.y) {
                self.score += 1;
                self.fruit.active = false;
                self.spawn_fruit(now_ms);
                self.player.grow();
                self.should_redraw = true;
                transition = Transition::Ate;
            }
        } else if now_ms.saturating_sub(self.fruit.spawn_time_ms) > FRUIT_RESPAWN_DELAY_MS {
            self.spawn_fruit(now_ms);
        }

        transition
    }

    /// Places the fruit on a cell sharing neither row nor column with the head.
    /// Gives up silently after a bounded number of draws.
    fn spawn_fruit(&mut self, now_ms: u64) -> bool {
        let cols = i32::from(self.grid.cols());
        let rows = i32::from(self.grid.rows());

        for _ in 0..FRUIT_SPAWN_ATTEMPTS {
            let x = self.rng.gen_range(0..cols);
            let y = self.rng.gen_range(0..rows);

            if x != self.player.x && y != self.player.y {
                self.fruit = Fruit {
                    active: true,
                    x,
                    y,
                    spawn_time_ms: now_ms,
                };
                self.should_redraw = true;
                return true;
            }
        }

        trace!(
            "No fruit cell found in {} attempts on a {}x{} grid",
            FRUIT_SPAWN_ATTEMPTS,
            rows,
            cols
        );
        false
    }

    /// Render half of a tick. A failure keeps the frame dirty for the next tick.
    fn present<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        force_redraw: bool,
    ) -> RenderOutcome {
        if !self.should_redraw && !force_redraw {
            return RenderOutcome::Skipped;
        }

        match renderer.render(self) {
            Ok(()) => {
                self.should_redraw = false;
                self.last_frame_time_ms = self.now_ms;
                RenderOutcome::Rendered
            }
            Err(e) => RenderOutcome::Failed(e),
        }
    }
}

/// One game instance shared between the input path and its driving loop.
pub struct Game {
    state: Mutex<GameState>,
    clock: Clock,
}

impl Game {
    pub fn new(rows: u16, cols: u16) -> Result<Self, ConfigError> {
        Self::with_config(GameConfig::new(rows, cols))
    }

    pub fn with_config(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_parts(config, StdRng::from_entropy(), system_clock())
    }

    /// Builds a game with an explicit random source and clock.
    pub fn with_parts(config: GameConfig, rng: StdRng, clock: Clock) -> Result<Self, ConfigError> {
        let state = GameState::new(config, rng, clock())?;
        Ok(Self {
            state: Mutex::new(state),
            clock,
        })
    }

    // Every transition leaves the state consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepted while paused; takes effect once ticking resumes.
    pub fn set_direction(&self, direction: Direction) {
        self.lock().player.direction = direction;
    }

    pub fn toggle_pause(&self) {
        let mut state = self.lock();
        state.is_paused = !state.is_paused;
        state.should_redraw = true;
    }

    pub fn toggle_help(&self) {
        let mut state = self.lock();
        state.show_help = !state.show_help;
        state.should_redraw = true;
    }

    pub fn restart(&self) {
        let mut state = self.lock();
        let now = (self.clock)();
        state.reset(now);
    }

    pub fn apply(&self, action: Action) {
        match action {
            Action::Move(direction) => self.set_direction(direction),
            Action::TogglePause => self.toggle_pause(),
            Action::Restart => self.restart(),
            Action::ToggleHelp => self.toggle_help(),
        }
    }

    /// Advances the game by one tick and renders if anything changed.
    ///
    /// The lock is held for the whole tick, renderer included. A collision
    /// resets the game and ends the tick without rendering; the reset leaves
    /// the state dirty so the next tick draws it.
    pub fn update<R: Renderer + ?Sized>(&self, renderer: &mut R, force_redraw: bool) -> TickReport {
        let mut state = self.lock();
        let now = (self.clock)();

        let transition = state.advance(now);
        if let Transition::Reset(_) = transition {
            return TickReport {
                transition,
                render: RenderOutcome::Skipped,
            };
        }

        let render = state.present(renderer, force_redraw);
        TickReport { transition, render }
    }

    /// Current render surface, with the elapsed time read from the clock
    /// rather than from the last tick.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        state.snapshot_at((self.clock)())
    }

    /// Runs `f` against the locked state.
    pub fn with_state<T>(&self, f: impl FnOnce(&GameState) -> T) -> T {
        f(&self.lock())
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Game");
        match self.state.try_lock() {
            Ok(state) => s.field("state", &*state),
            Err(_) => s.field("state", &"<locked>"),
        };
        s.finish_non_exhaustive()
    }
}
