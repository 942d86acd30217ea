// Core types shared by the gallery renderer and the slot machine.

/// Software raster surface. Everything draws into this; the window only
/// presents it once per frame.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,     // surface width in pixels
    pub height: usize,    // surface height in pixels
    pub pixels: Vec<u32>, // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// Fresh surface, all pixels black.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Flood the whole surface with one color.
    /// Visual: the screen becomes a flat field of `color`.
    pub fn fill(&mut self, color: u32) {
        for px in &mut self.pixels {
            *px = color;
        }
    }
}

/// Binary reduced-resolution grid produced by the dither thresholder.
/// 1 = draw a foreground cell, 0 = leave the background.
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub bits: Vec<u8>, // length = width * height, values 0 or 1
}

impl Mask {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x] != 0
    }
}

/// Axis-aligned pixel rectangle. Used for blend-scoped fills and the
/// declarative sprite tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// Color hint attached to a status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    /// Key states, drawn in the primary theme color.
    Primary,
    /// Transitional states, drawn dimmed.
    Dim,
}

/// Receives human-readable phase strings from the gallery and the slot
/// machine. The binary's sink feeds the HUD; tests record the lines.
pub trait StatusSink {
    fn status(&mut self, text: &str, tone: Tone);
}

/// Terminal-style palette. The three colors come from environment variables
/// so the host shell theme can restyle both toys without a rebuild.
#[derive(Clone, Copy)]
pub struct Theme {
    pub fg: u32,  // primary phosphor green
    pub bg: u32,  // near-black backdrop
    pub dim: u32, // dimmed foreground for secondary strokes
}

/// Fallbacks when a variable is unset, empty, or unparsable.
const FALLBACK_FG: u32 = 0x39_FF_14;
const FALLBACK_BG: u32 = 0x0B_0F_10;
const FALLBACK_DIM: u32 = 0x9C_FF_6B;

impl Theme {
    /// Read `ARCADE_FG`, `ARCADE_BG` and `ARCADE_FG_DIM` (`#rrggbb` strings),
    /// falling back to the built-in palette per variable.
    pub fn from_env() -> Self {
        Self {
            fg: env_color("ARCADE_FG", FALLBACK_FG),
            bg: env_color("ARCADE_BG", FALLBACK_BG),
            dim: env_color("ARCADE_FG_DIM", FALLBACK_DIM),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self { fg: FALLBACK_FG, bg: FALLBACK_BG, dim: FALLBACK_DIM }
    }
}

fn env_color(name: &str, fallback: u32) -> u32 {
    match std::env::var(name) {
        Ok(v) => parse_hex_color(v.trim()).unwrap_or(fallback),
        Err(_) => fallback,
    }
}

/// Parse `#rrggbb` (leading `#` optional) into packed 0x00RRGGBB.
pub fn parse_hex_color(s: &str) -> Option<u32> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
