// Slot symbols as data: each fruit is a list of grid rectangles on a 24x24
// unit grid, painted in order. Keeping the shapes declarative means the
// sprite geometry can be tested without rendering anything.

use crate::draw::fill_rect;
use crate::types::{FrameBuffer, Rect, Theme};

/// Symbol order on the reel strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fruit {
    Apple,
    Banana,
    Cherry,
}

pub const SYMBOL_COUNT: usize = 3;

impl Fruit {
    pub const ALL: [Fruit; SYMBOL_COUNT] = [Fruit::Apple, Fruit::Banana, Fruit::Cherry];

    pub fn from_index(i: usize) -> Self {
        Self::ALL[i % SYMBOL_COUNT]
    }
}

/// Which theme color a sprite rectangle is painted with. `Bg` rects carve
/// into previously painted shapes (the banana's inner curve).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ink {
    Fg,
    Dim,
    Bg,
}

#[derive(Clone, Copy, Debug)]
pub struct SpriteRect {
    pub rect: Rect,
    pub ink: Ink,
}

const fn fg(x: i32, y: i32, w: i32, h: i32) -> SpriteRect {
    SpriteRect { rect: Rect::new(x, y, w, h), ink: Ink::Fg }
}

const fn dim(x: i32, y: i32, w: i32, h: i32) -> SpriteRect {
    SpriteRect { rect: Rect::new(x, y, w, h), ink: Ink::Dim }
}

const fn bg(x: i32, y: i32, w: i32, h: i32) -> SpriteRect {
    SpriteRect { rect: Rect::new(x, y, w, h), ink: Ink::Bg }
}

// Round silhouette with a notch at the top, stem, leaf, contour accent.
const APPLE: &[SpriteRect] = &[
    fg(8, 6, 8, 10),
    fg(7, 7, 10, 8),
    fg(6, 8, 12, 6),
    fg(11, 4, 2, 3),
    dim(13, 5, 3, 1),
    dim(9, 13, 6, 1),
];

// Crescent built from stacked bars; the inner curve is carved back out
// with background rects, then tips and a highlight go on top.
const BANANA: &[SpriteRect] = &[
    fg(6, 14, 12, 2),
    fg(7, 13, 11, 2),
    fg(8, 12, 10, 2),
    fg(9, 11, 9, 2),
    fg(10, 10, 7, 2),
    fg(11, 9, 5, 2),
    fg(12, 8, 3, 2),
    bg(8, 12, 3, 1),
    bg(9, 11, 3, 1),
    bg(10, 10, 3, 1),
    bg(11, 9, 2, 1),
    fg(6, 13, 1, 1),
    fg(18, 14, 1, 1),
    dim(14, 12, 3, 1),
];

// Two cherries with joined stems and contour accents.
const CHERRY: &[SpriteRect] = &[
    fg(7, 12, 4, 4),
    fg(13, 12, 4, 4),
    fg(6, 13, 6, 2),
    fg(12, 13, 6, 2),
    fg(9, 7, 1, 5),
    fg(15, 7, 1, 5),
    fg(9, 7, 7, 1),
    dim(8, 15, 2, 1),
    dim(14, 15, 2, 1),
];

pub fn sprite(fruit: Fruit) -> &'static [SpriteRect] {
    match fruit {
        Fruit::Apple => APPLE,
        Fruit::Banana => BANANA,
        Fruit::Cherry => CHERRY,
    }
}

/// Grid unit for a square cell of the given pixel size.
#[inline]
pub fn sprite_unit(size: usize) -> i32 {
    ((size / 24) as i32).max(1)
}

/// Paint a fruit into a square cell whose top-left corner is (x, y).
pub fn draw_symbol(fb: &mut FrameBuffer, x: i32, y: i32, size: usize, fruit: Fruit, theme: &Theme) {
    let unit = sprite_unit(size);
    for s in sprite(fruit) {
        let color = match s.ink {
            Ink::Fg => theme.fg,
            Ink::Dim => theme.dim,
            Ink::Bg => theme.bg,
        };
        fill_rect(
            fb,
            Rect::new(
                x + s.rect.x * unit,
                y + s.rect.y * unit,
                s.rect.w * unit,
                s.rect.h * unit,
            ),
            color,
        );
    }
}

/// Clear a reel cell to the backdrop and stroke a 1-pixel border.
pub fn draw_reel_frame(fb: &mut FrameBuffer, x: i32, y: i32, size: usize, theme: &Theme) {
    let s = size as i32;
    fill_rect(fb, Rect::new(x, y, s, s), theme.bg);
    fill_rect(fb, Rect::new(x, y, s, 1), theme.fg);
    fill_rect(fb, Rect::new(x, y + s - 1, s, 1), theme.fg);
    fill_rect(fb, Rect::new(x, y, 1, s), theme.fg);
    fill_rect(fb, Rect::new(x + s - 1, y, 1, s), theme.fg);
}
