//! Character-grid layout

/// Horizontal step between glyphs
pub const HSTEP: i32 = 13;
/// Vertical step between lines
pub const VSTEP: i32 = 18;
/// Default page width
pub const WIDTH: i32 = 800;

/// Grid settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    pub width: i32,
    pub hstep: i32,
    pub vstep: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            hstep: HSTEP,
            vstep: VSTEP,
        }
    }
}

/// One positioned glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayItem {
    pub x: i32,
    pub y: i32,
    pub glyph: char,
}

/// Place each character of `text` on the grid, wrapping at the page width
pub fn layout(text: &str, config: &LayoutConfig) -> Vec<DisplayItem> {
    let mut display_list = Vec::with_capacity(text.len());
    let (mut x, mut y) = (config.hstep, config.vstep);

    for glyph in text.chars() {
        if glyph == '\n' {
            x = config.hstep;
            y += config.vstep;
            continue;
        }

        if x >= config.width - config.hstep {
            x = config.hstep;
            y += config.vstep;
        }
        display_list.push(DisplayItem { x, y, glyph });
        x += config.hstep;
    }

    display_list
}
