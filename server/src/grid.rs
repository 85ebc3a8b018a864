use crate::config::ConfigError;

/// Fixed rows x cols board. Cells are addressed as `(x, y)` with `x` the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    rows: u16,
    cols: u16,
}

impl Grid {
    pub fn new(rows: u16, cols: u16) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::EmptyGrid { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.cols) && y < i32::from(self.rows)
    }
}
