//! Grid navigation: the single authority over which entry is selected.
//!
//! Movement saturates at the grid edges; there is no wrap-around.

use crate::entry::{Command, Entry};

/// A directional navigation intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// The ordered entries shown by the launcher plus their column count.
#[derive(Debug, Clone)]
pub struct Grid {
    entries: Vec<Entry>,
    columns: usize,
}

impl Grid {
    /// Create a grid. A column count of 0 is clamped to 1.
    pub fn new(entries: Vec<Entry>, columns: usize) -> Self {
        if columns == 0 {
            log::warn!("Grid column count 0 is invalid, using 1");
        }
        Self {
            entries,
            columns: columns.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }
}

/// Selection state over a [`Grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    selection: usize,
    len: usize,
    columns: usize,
}

impl Navigator {
    /// Start at the first entry of `grid`.
    pub fn new(grid: &Grid) -> Self {
        Self::with_shape(grid.len(), grid.columns())
    }

    /// Navigator for `len` entries laid out in `columns` columns.
    pub fn with_shape(len: usize, columns: usize) -> Self {
        Self {
            selection: 0,
            len,
            columns: columns.max(1),
        }
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    /// Apply one intent. Returns `true` if the selection changed.
    pub fn apply(&mut self, dir: Direction) -> bool {
        match dir {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Up => self.move_up(),
            Direction::Down => self.move_down(),
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.set(self.selection.saturating_sub(1))
    }

    pub fn move_right(&mut self) -> bool {
        self.set((self.selection + 1).min(self.last()))
    }

    pub fn move_up(&mut self) -> bool {
        self.set(self.selection - self.selection.min(self.columns))
    }

    pub fn move_down(&mut self) -> bool {
        self.set((self.selection + self.columns).min(self.last()))
    }

    /// The command of the selected entry. Does not change the selection.
    pub fn activate<'g>(&self, grid: &'g Grid) -> Option<&'g Command> {
        grid.get(self.selection).map(|e| &e.command)
    }

    fn last(&self) -> usize {
        self.len.saturating_sub(1)
    }

    fn set(&mut self, next: usize) -> bool {
        if self.len == 0 || next == self.selection {
            return false;
        }
        self.selection = next;
        true
    }
}
