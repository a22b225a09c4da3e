//! Pixel geometry of the entry grid.

/// Space between an icon and its cell edge.
pub const BORDER: u32 = 16;
/// Offset of the grid from the top-left screen corner.
pub const PADDING: i32 = 64;
/// Stroke width of the selection highlight.
pub const HIGHLIGHT_STROKE: u16 = 8;
/// Label font size in points.
pub const LABEL_FONT_SIZE: u16 = 24;

const ELLIPSIS: &str = "...";

/// A screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// Grid cell placement for a given screen and icon size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub screen: (u32, u32),
    pub icon: u32,
    pub columns: usize,
    /// Height reserved under each icon for its label.
    pub label_height: u32,
}

impl GridLayout {
    pub fn new(screen: (u32, u32), icon: u32, columns: usize) -> Self {
        Self {
            screen,
            icon,
            columns: columns.max(1),
            label_height: u32::from(LABEL_FONT_SIZE) + 8,
        }
    }

    pub fn cell_width(&self) -> u32 {
        self.icon + 2 * BORDER
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_width() + self.label_height
    }

    /// Number of rows that fit below the top padding (at least one).
    pub fn visible_rows(&self) -> usize {
        let avail = self.screen.1.saturating_sub(PADDING as u32);
        ((avail / self.cell_height()) as usize).max(1)
    }

    /// First visible row after scrolling so that `selection` is on screen.
    pub fn scroll_for(&self, selection: usize, first_row: usize) -> usize {
        let row = selection / self.columns;
        let rows = self.visible_rows();
        if row < first_row {
            row
        } else if row >= first_row + rows {
            row + 1 - rows
        } else {
            first_row
        }
    }

    /// Top-left corner of cell `index`, or `None` when it is scrolled out.
    pub fn cell_origin(&self, index: usize, first_row: usize) -> Option<(i32, i32)> {
        let row = index / self.columns;
        if row < first_row || row >= first_row + self.visible_rows() {
            return None;
        }
        let col = index % self.columns;
        let x = PADDING + (col as u32 * self.cell_width()) as i32;
        let y = PADDING + ((row - first_row) as u32 * self.cell_height()) as i32;
        Some((x, y))
    }

    /// Where the icon of cell `index` is drawn.
    pub fn icon_rect(&self, index: usize, first_row: usize) -> Option<Rect> {
        self.cell_origin(index, first_row).map(|(x, y)| Rect {
            x: x + BORDER as i32,
            y: y + BORDER as i32,
            w: self.icon,
            h: self.icon,
        })
    }

    /// Top edge of the label under an icon.
    pub fn label_y(&self, icon: &Rect) -> i32 {
        icon.y + icon.h as i32 + BORDER as i32 / 2
    }
}

/// Shorten `text` with a trailing ellipsis until `measure` fits `max_w`.
pub fn truncate_label(text: &str, max_w: u32, measure: impl Fn(&str) -> u32) -> String {
    if measure(text) <= max_w {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    for keep in (0..chars.len()).rev() {
        let candidate: String = chars[..keep].iter().collect::<String>() + ELLIPSIS;
        if measure(&candidate) <= max_w {
            return candidate;
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> GridLayout {
        // 256 icons on a 1080p screen: cells 288 wide, 320 tall.
        GridLayout::new((1920, 1080), 256, 6)
    }

    #[test]
    fn cell_positions() {
        let l = layout();
        assert_eq!(l.cell_width(), 288);
        assert_eq!(l.cell_origin(0, 0), Some((64, 64)));
        assert_eq!(l.cell_origin(1, 0), Some((64 + 288, 64)));
        assert_eq!(l.cell_origin(6, 0), Some((64, 64 + 320)));
    }

    #[test]
    fn icon_inset_by_border() {
        let r = layout().icon_rect(0, 0).unwrap();
        assert_eq!(r, Rect { x: 80, y: 80, w: 256, h: 256 });
        assert_eq!(layout().label_y(&r), 80 + 256 + 8);
    }

    #[test]
    fn rows_outside_view_are_hidden() {
        let l = layout();
        assert_eq!(l.visible_rows(), 3);
        assert!(l.cell_origin(18, 0).is_none());
        assert!(l.cell_origin(0, 1).is_none());
        assert_eq!(l.cell_origin(18, 1), Some((64, 64 + 2 * 320)));
    }

    #[test]
    fn scroll_follows_selection() {
        let l = layout();
        assert_eq!(l.scroll_for(0, 0), 0);
        assert_eq!(l.scroll_for(17, 0), 0);
        assert_eq!(l.scroll_for(18, 0), 1);
        assert_eq!(l.scroll_for(30, 1), 3);
        assert_eq!(l.scroll_for(7, 3), 1);
    }

    #[test]
    fn tiny_screen_shows_one_row() {
        let l = GridLayout::new((320, 200), 256, 2);
        assert_eq!(l.visible_rows(), 1);
        assert_eq!(l.scroll_for(5, 0), 2);
    }

    #[test]
    fn truncate_fits_width() {
        let measure = |s: &str| s.chars().count() as u32 * 10;
        assert_eq!(truncate_label("Kodi", 100, measure), "Kodi");
        assert_eq!(truncate_label("Steam Big Picture", 100, measure), "Steam B...");
        assert_eq!(truncate_label("Anything", 20, measure), "");
    }
}
