//! Command-line configuration for the server and per-game settings

use clap::Parser;
use shared::{DEFAULT_COLS, DEFAULT_ROWS, DEFAULT_SPEED, TICK_INTERVAL_MS};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid must have at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: u16, cols: u16 },
    #[error("speed must be at least one move per second")]
    ZeroSpeed,
    #[error("tick interval must be greater than zero")]
    ZeroTick,
    #[error("max games must be at least one")]
    ZeroMaxGames,
}

/// Settings a single game is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: u16,
    pub cols: u16,
    /// Moves per second
    pub speed: u32,
}

impl GameConfig {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            rows,
            cols,
            speed: DEFAULT_SPEED,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3223")]
    pub port: u16,

    /// Milliseconds between ticks of each session's game loop
    #[arg(short, long, default_value_t = TICK_INTERVAL_MS)]
    pub tick_ms: u64,

    /// Maximum number of concurrent games
    #[arg(short, long, default_value = "100")]
    pub max_games: usize,

    /// Seconds without input before a game is dropped
    #[arg(long, default_value = "300")]
    pub idle_timeout_secs: u64,

    /// Board rows
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    pub rows: u16,

    /// Board columns
    #[arg(long, default_value_t = DEFAULT_COLS)]
    pub cols: u16,

    /// Snake speed in moves per second
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    pub speed: u32,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            rows: self.rows,
            cols: self.cols,
            speed: self.speed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.max_games == 0 {
            return Err(ConfigError::ZeroMaxGames);
        }
        self.game_config().validate()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let game = GameConfig::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 3223,
            tick_ms: TICK_INTERVAL_MS,
            max_games: 100,
            idle_timeout_secs: 300,
            rows: game.rows,
            cols: game.cols,
            speed: game.speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let parsed = ServerConfig::try_parse_from(["snake-server"]).unwrap();
        let default = ServerConfig::default();

        assert_eq!(parsed.host, default.host);
        assert_eq!(parsed.port, default.port);
        assert_eq!(parsed.tick_ms, default.tick_ms);
        assert_eq!(parsed.max_games, default.max_games);
        assert_eq!(parsed.idle_timeout_secs, default.idle_timeout_secs);
        assert_eq!(parsed.game_config(), default.game_config());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides() {
        let parsed = ServerConfig::try_parse_from([
            "snake-server",
            "-H",
            "0.0.0.0",
            "--port",
            "9000",
            "--rows",
            "10",
            "--cols",
            "12",
            "--speed",
            "8",
            "--tick-ms",
            "33",
        ])
        .unwrap();

        assert_eq!(parsed.address(), "0.0.0.0:9000");
        assert_eq!(parsed.tick_duration(), Duration::from_millis(33));
        assert_eq!(
            parsed.game_config(),
            GameConfig {
                rows: 10,
                cols: 12,
                speed: 8
            }
        );
    }

    #[test]
    fn test_validation_rejects_degenerate_values() {
        let mut config = ServerConfig::default();
        config.rows = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyGrid { rows: 0, cols: 20 })
        );

        let mut config = ServerConfig::default();
        config.speed = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroSpeed));

        let mut config = ServerConfig::default();
        config.tick_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTick));

        let mut config = ServerConfig::default();
        config.max_games = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxGames));
    }
}
