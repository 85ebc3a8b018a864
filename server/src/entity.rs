use shared::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailSegment {
    pub x: i32,
    pub y: i32,
}

/// The snake. `tail[0]` is the segment right behind the head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub active: bool,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub tail: Vec<TailSegment>,
    /// Moves per second
    pub speed: u32,
    /// 0 until the first move
    pub last_move_time_ms: u64,
}

impl Player {
    pub fn new(speed: u32) -> Self {
        Self {
            active: true,
            x: 0,
            y: 0,
            direction: Direction::None,
            tail: Vec::new(),
            speed,
            last_move_time_ms: 0,
        }
    }

    pub fn move_interval_ms(&self) -> u64 {
        1000 / u64::from(self.speed.max(1))
    }

    /// Movement gate: a heading is set and the per-speed interval has passed.
    pub fn ready_to_move(&self, now_ms: u64) -> bool {
        self.direction != Direction::None
            && (self.last_move_time_ms == 0
                || now_ms.saturating_sub(self.last_move_time_ms) > self.move_interval_ms())
    }

    /// Moves the head one cell and returns where it was.
    pub fn step(&mut self) -> (i32, i32) {
        let previous = (self.x, self.y);
        let (dx, dy) = self.direction.delta();
        self.x += dx;
        self.y += dy;
        previous
    }

    pub fn head_hits_tail(&self) -> bool {
        self.tail.iter().any(|s| s.x == self.x && s.y == self.y)
    }

    /// Shifts every segment into the slot vacated by the one ahead of it.
    pub fn follow(&mut self, x: i32, y: i32) {
        let mut carried = TailSegment { x, y };
        for segment in &mut self.tail {
            carried = std::mem::replace(segment, carried);
        }
    }

    pub fn grow(&mut self) {
        self.tail.push(TailSegment {
            x: self.x,
            y: self.y,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fruit {
    pub active: bool,
    pub x: i32,
    pub y: i32,
    pub spawn_time_ms: u64,
}

impl Fruit {
    pub fn is_at(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(coords: &[(i32, i32)]) -> Vec<TailSegment> {
        coords.iter().map(|&(x, y)| TailSegment { x, y }).collect()
    }

    #[test]
    fn test_player_creation() {
        let player = Player::new(5);
        assert!(player.active);
        assert_eq!((player.x, player.y), (0, 0));
        assert_eq!(player.direction, Direction::None);
        assert!(player.tail.is_empty());
        assert_eq!(player.last_move_time_ms, 0);
        assert_eq!(player.move_interval_ms(), 200);
    }

    #[test]
    fn test_movement_gate() {
        let mut player = Player::new(5);
        assert!(!player.ready_to_move(10_000));

        player.direction = Direction::Right;
        assert!(player.ready_to_move(10_000));

        player.last_move_time_ms = 10_000;
        assert!(!player.ready_to_move(10_100));
        assert!(!player.ready_to_move(10_200));
        assert!(player.ready_to_move(10_201));
    }

    #[test]
    fn test_step_returns_previous_head() {
        let mut player = Player::new(5);
        player.x = 3;
        player.y = 3;

        player.direction = Direction::Up;
        assert_eq!(player.step(), (3, 3));
        assert_eq!((player.x, player.y), (3, 2));

        player.direction = Direction::Left;
        assert_eq!(player.step(), (3, 2));
        assert_eq!((player.x, player.y), (2, 2));
    }

    #[test]
    fn test_follow_is_fifo_shift() {
        let mut player = Player::new(5);
        player.tail = segments(&[(4, 5), (3, 5), (2, 5)]);

        player.follow(5, 5);

        assert_eq!(player.tail, segments(&[(5, 5), (4, 5), (3, 5)]));
    }

    #[test]
    fn test_follow_on_empty_tail_is_noop() {
        let mut player = Player::new(5);
        player.follow(1, 1);
        assert!(player.tail.is_empty());
    }

    #[test]
    fn test_grow_appends_at_head() {
        let mut player = Player::new(5);
        player.x = 2;
        player.y = 7;
        player.tail = segments(&[(1, 7)]);

        player.grow();

        assert_eq!(player.tail, segments(&[(1, 7), (2, 7)]));
        assert!(player.head_hits_tail());
    }
}
