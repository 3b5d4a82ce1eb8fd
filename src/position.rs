use std::fmt;

/// Column sentinel meaning "no column information".
pub const NO_COLUMN: i32 = -1;

/// A source span: first/last line and first/last column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub first_line: i32,
    pub first_col: i32,
    pub last_line: i32,
    pub last_col: i32,
}

impl Position {
    pub fn new(first_line: i32, first_col: i32, last_line: i32, last_col: i32) -> Self {
        Self {
            first_line,
            first_col,
            last_line,
            last_col,
        }
    }

    pub fn has_columns(&self) -> bool {
        self.last_col != NO_COLUMN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_columns() {
            write!(
                f,
                "{}:{}-{}:{}",
                self.first_line, self.first_col, self.last_line, self.last_col
            )
        } else {
            write!(f, "{}-{}", self.first_line, self.last_line)
        }
    }
}

/// A single source line, modelled as `[line, line + 1)` without columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinePosition {
    line: i32,
}

impl LinePosition {
    pub fn new(line: i32) -> Self {
        Self { line }
    }

    pub fn first_line(&self) -> i32 {
        self.line
    }

    pub fn last_line(&self) -> i32 {
        self.line + 1
    }

    pub fn first_col(&self) -> i32 {
        0
    }

    pub fn last_col(&self) -> i32 {
        NO_COLUMN
    }
}

impl From<LinePosition> for Position {
    fn from(line: LinePosition) -> Self {
        Position::new(
            line.first_line(),
            line.first_col(),
            line.last_line(),
            line.last_col(),
        )
    }
}
