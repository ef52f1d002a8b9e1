//! D-pad style focus movement over grids and lists

/// Arrow-key direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Up,
    Down,
    Left,
    Right,
}

/// Focused cell in a row-major grid of `len` items laid out `columns` wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridFocus {
    pub index: usize,
}

impl GridFocus {
    /// Move focus; stays put at the edges
    pub fn step(&mut self, nav: Nav, columns: usize, len: usize) {
        if len == 0 {
            self.index = 0;
            return;
        }
        let columns = columns.max(1);
        let i = self.index.min(len - 1);

        self.index = match nav {
            Nav::Left if i % columns > 0 => i - 1,
            Nav::Right if i % columns + 1 < columns && i + 1 < len => i + 1,
            Nav::Up if i >= columns => i - columns,
            Nav::Down if i + columns < len => i + columns,
            // Partial last row: drop onto its last item
            Nav::Down if i / columns < (len - 1) / columns => len - 1,
            _ => i,
        };
    }

    pub fn clamp(&mut self, len: usize) {
        self.index = self.index.min(len.saturating_sub(1));
    }
}
