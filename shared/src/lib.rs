use serde::{Deserialize, Serialize};

pub const DEFAULT_ROWS: u16 = 20;
pub const DEFAULT_COLS: u16 = 20;
pub const DEFAULT_SPEED: u32 = 5;
pub const TICK_INTERVAL_MS: u64 = 16;
pub const FRUIT_RESPAWN_DELAY_MS: u64 = 3000;
pub const FRUIT_SPAWN_ATTEMPTS: u32 = 1000;
pub const PROTOCOL_VERSION: u32 = 1;

/// Heading of the snake's head. `None` means the snake is standing still.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    None,
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Unit displacement `(dx, dy)`; y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

/// The complete input surface of a game: four headings plus pause, restart and help.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    TogglePause,
    Restart,
    ToggleHelp,
}

impl Action {
    /// Maps a browser-style key identifier to an action.
    pub fn from_key(key: &str) -> Option<Action> {
        match key {
            "ArrowLeft" => Some(Action::Move(Direction::Left)),
            "ArrowUp" => Some(Action::Move(Direction::Up)),
            "ArrowRight" => Some(Action::Move(Direction::Right)),
            "ArrowDown" => Some(Action::Move(Direction::Down)),
            "Escape" => Some(Action::TogglePause),
            "r" => Some(Action::Restart),
            "h" => Some(Action::ToggleHelp),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub tail: Vec<(i32, i32)>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FruitSnapshot {
    pub active: bool,
    pub x: i32,
    pub y: i32,
}

/// Everything a client needs to draw one frame.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub rows: u16,
    pub cols: u16,
    pub player: PlayerSnapshot,
    pub fruit: FruitSnapshot,
    pub score: u32,
    pub is_paused: bool,
    pub show_help: bool,
    pub elapsed_ms: u64,
}

impl Snapshot {
    /// Renders the board as text, one line per row. Used by terminal clients and logs.
    pub fn to_ascii(&self) -> String {
        let cols = self.cols as usize;
        let mut cells = vec![b'.'; self.rows as usize * cols];
        let mut put = |x: i32, y: i32, c: u8| {
            if x >= 0 && y >= 0 && (x as usize) < cols && (y as usize) < self.rows as usize {
                cells[y as usize * cols + x as usize] = c;
            }
        };

        if self.fruit.active {
            put(self.fruit.x, self.fruit.y, b'*');
        }
        for &(x, y) in &self.player.tail {
            put(x, y, b'o');
        }
        put(self.player.x, self.player.y, b'@');

        let mut out = String::with_capacity(cells.len() + self.rows as usize);
        for row in cells.chunks(cols.max(1)) {
            out.extend(row.iter().map(|&c| c as char));
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect { client_version: u32 },
    Key { key: String },
    Disconnect,

    Connected { session_id: u32 },
    Frame(Snapshot),
    Rejected { reason: String },
    GameTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            rows: 3,
            cols: 4,
            player: PlayerSnapshot {
                x: 1,
                y: 1,
                direction: Direction::Right,
                tail: vec![(0, 1)],
            },
            fruit: FruitSnapshot {
                active: true,
                x: 3,
                y: 0,
            },
            score: 1,
            is_paused: false,
            show_help: true,
            elapsed_ms: 1500,
        }
    }

    #[test]
    fn test_direction_deltas_are_unit_steps() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
        assert_eq!(Direction::None.delta(), (0, 0));
        assert_eq!(Direction::default(), Direction::None);
    }

    #[test]
    fn test_key_mapping_covers_all_actions() {
        assert_eq!(
            Action::from_key("ArrowLeft"),
            Some(Action::Move(Direction::Left))
        );
        assert_eq!(Action::from_key("ArrowUp"), Some(Action::Move(Direction::Up)));
        assert_eq!(
            Action::from_key("ArrowRight"),
            Some(Action::Move(Direction::Right))
        );
        assert_eq!(
            Action::from_key("ArrowDown"),
            Some(Action::Move(Direction::Down))
        );
        assert_eq!(Action::from_key("Escape"), Some(Action::TogglePause));
        assert_eq!(Action::from_key("r"), Some(Action::Restart));
        assert_eq!(Action::from_key("h"), Some(Action::ToggleHelp));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        assert_eq!(Action::from_key(""), None);
        assert_eq!(Action::from_key("R"), None);
        assert_eq!(Action::from_key("Space"), None);
    }

    #[test]
    fn test_snapshot_ascii_layout() {
        let text = sample_snapshot().to_ascii();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "...*");
        assert_eq!(lines[1], "o@..");
        assert_eq!(lines[2], "....");
    }

    #[test]
    fn test_snapshot_ascii_hides_inactive_fruit() {
        let mut snapshot = sample_snapshot();
        snapshot.fruit.active = false;

        assert!(!snapshot.to_ascii().contains('*'));
    }

    #[test]
    fn test_packet_serialization_frame() {
        let packet = Packet::Frame(sample_snapshot());
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Frame(snapshot) => assert_eq!(snapshot, sample_snapshot()),
            _ => panic!("Wrong packet type after deserialization"),
        }
    }
}
