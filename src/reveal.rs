// Progressive-reveal engine: a cooperative per-frame scheduler, a
// generation-stamped cancellation token, and four reveal techniques.
//
// Each technique is an explicit state machine stepped once per presented
// frame. A step does a bounded chunk of work (time budget and/or item cap),
// mutates the surface, and returns; the main loop supplies the next frame.
// Cancellation is cooperative: a step whose captured token no longer matches
// the live token returns without touching the surface.

use crate::compose::ComposedBitmap;
use crate::draw::{
    ShadeMap, apply_shade, blit, fill_disc_screen, fill_rect, fill_rect_alpha, glow_band_screen,
};
use crate::gamma::GammaLut;
use crate::rng::Rng32;
use crate::types::{FrameBuffer, Mask, Rect, StatusSink, Theme, Tone};
use std::time::{Duration, Instant};

/// Monotonically increasing animation generation. The orchestrator bumps it
/// on every restart; anything still holding an older value is stale.
pub type RevealToken = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    /// Token mismatch; the step wrote nothing and should not be rescheduled.
    Cancelled,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Technique {
    /// Mask-based row scan of dithered phosphor dots.
    DitherScan,
    /// Row slices of the mosaic composition with a highlight bar.
    RowScan,
    /// Random cell shuffle with glow discs, then a crossfade to full detail.
    Particle,
    /// Old-TV beam sweep over the full composition.
    Crt,
}

impl Technique {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dither" => Some(Self::DitherScan),
            "rows" => Some(Self::RowScan),
            "particle" => Some(Self::Particle),
            "crt" => Some(Self::Crt),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DitherScan => "dither",
            Self::RowScan => "rows",
            Self::Particle => "particle",
            Self::Crt => "crt",
        }
    }
}

pub const MSG_COMPLETE: &str = "Scan complete! Press R to restart.";
pub const MSG_ENHANCING: &str = "Enhancing details...";

/* ---------- tuning ---------- */

// Dither scan (mask rows).
const DITHER_ROWS_PER_FRAME: usize = 3;
const DITHER_BUDGET: Duration = Duration::from_millis(8);
const DITHER_HIGHLIGHT_ALPHA: f32 = 0.3;

// Row scan (composed slices).
const SCAN_SLICE_HEIGHT: usize = 3;
const SCAN_SLICES_PER_FRAME: usize = 1;
const SCAN_BUDGET: Duration = Duration::from_millis(12);
const SCAN_HIGHLIGHT_ALPHA: f32 = 0.25;

// Particle shuffle.
const PARTICLE_CELL: usize = 6;
const PARTICLE_PER_FRAME: usize = 220;
const PARTICLE_BUDGET: Duration = Duration::from_millis(14);
const PARTICLE_GLOW_ALPHA: f32 = 0.22;
const CROSSFADE_MS: f32 = 450.0;

// CRT beam. Jitter amplitude and period are tuned by eye.
const CRT_BEAM_SPEED: usize = 2;
const CRT_GLOW_HEIGHT: i32 = 56;
const CRT_GLOW_PEAK: f32 = 0.6;
const CRT_NOISE_COUNT: usize = 70;
const CRT_NOISE_ALPHA: f32 = 0.25;
const CRT_SCANLINE_ALPHA: f32 = 0.18;
const CRT_VIGNETTE_ALPHA: f32 = 0.22;
const JITTER_AMPLITUDE: f32 = 1.2;
const JITTER_PERIOD_MS: f32 = 90.0;

/* ---------- state machine ---------- */

enum TechState {
    DitherScan {
        mask: Mask,
        row: usize,
        cell_x: usize,
        cell_y: usize,
    },
    RowScan {
        comp: ComposedBitmap,
        row: usize,
    },
    Particle {
        comp: ComposedBitmap,
        full: ComposedBitmap,
        order: Vec<u32>,
        next: usize,
        cols: usize,
        fade_start: Option<Instant>,
    },
    Crt {
        full: ComposedBitmap,
        overlay: ShadeMap,
        beam: usize,
        epoch: Instant,
    },
}

/// One live reveal animation. Created with a fresh token; superseded (never
/// explicitly stopped) when the orchestrator bumps the live token.
pub struct Reveal {
    token: RevealToken,
    state: TechState,
    theme: Theme,
    target_w: usize,
    target_h: usize,
    cleared: bool,
}

impl Reveal {
    pub fn dither_scan(
        token: RevealToken,
        mask: Mask,
        target_w: usize,
        target_h: usize,
        theme: Theme,
    ) -> Self {
        // Per-axis cell size; the grid is centered on the surface.
        let cell_x = (target_w / mask.width).max(2);
        let cell_y = (target_h / mask.height).max(2);
        Self {
            token,
            state: TechState::DitherScan { mask, row: 0, cell_x, cell_y },
            theme,
            target_w,
            target_h,
            cleared: false,
        }
    }

    pub fn row_scan(
        token: RevealToken,
        comp: ComposedBitmap,
        target_w: usize,
        target_h: usize,
        theme: Theme,
    ) -> Self {
        Self {
            token,
            state: TechState::RowScan { comp, row: 0 },
            theme,
            target_w,
            target_h,
            cleared: false,
        }
    }

    pub fn particle(
        token: RevealToken,
        comp: ComposedBitmap,
        full: ComposedBitmap,
        target_w: usize,
        target_h: usize,
        theme: Theme,
        rng: &mut Rng32,
    ) -> Self {
        let cols = comp.draw_w().div_ceil(PARTICLE_CELL);
        let rows = comp.draw_h().div_ceil(PARTICLE_CELL);
        let order = cell_permutation(cols, rows, rng);
        Self {
            token,
            state: TechState::Particle { comp, full, order, next: 0, cols, fade_start: None },
            theme,
            target_w,
            target_h,
            cleared: false,
        }
    }

    pub fn crt(
        token: RevealToken,
        full: ComposedBitmap,
        target_w: usize,
        target_h: usize,
        theme: Theme,
        now: Instant,
    ) -> Self {
        let overlay = scanline_overlay(full.draw_w(), full.draw_h());
        Self {
            token,
            state: TechState::Crt { full, overlay, beam: 0, epoch: now },
            theme,
            target_w,
            target_h,
            cleared: false,
        }
    }

    /// Advance the reveal by one frame of bounded work.
    ///
    /// The token comparison happens before any surface write; a stale step
    /// is a no-op that reports `Cancelled`. A live step always performs at
    /// least one work unit, so progress is monotone even when the frame
    /// budget is already exhausted.
    pub fn step(
        &mut self,
        live: RevealToken,
        surface: &mut FrameBuffer,
        now: Instant,
        rng: &mut Rng32,
        lut: &GammaLut,
        status: &mut dyn StatusSink,
    ) -> Status {
        if self.token != live {
            return Status::Cancelled;
        }

        if !self.cleared {
            surface.fill(self.theme.bg);
            self.cleared = true;
        }

        let theme = self.theme;
        let (tw, th) = (self.target_w, self.target_h);
        let finished = match &mut self.state {
            TechState::DitherScan { mask, row, cell_x, cell_y } => {
                step_dither(surface, mask, row, *cell_x, *cell_y, tw, th, theme, now)
            }
            TechState::RowScan { comp, row } => step_rows(surface, comp, row, tw, th, theme, now),
            TechState::Particle { comp, full, order, next, cols, fade_start } => step_particle(
                surface, comp, full, order, next, *cols, fade_start, tw, th, theme, now, lut, status,
            ),
            TechState::Crt { full, overlay, beam, epoch } => {
                step_crt(surface, full, overlay, beam, *epoch, tw, th, theme, now, rng)
            }
        };

        if finished {
            status.status(MSG_COMPLETE, Tone::Primary);
            Status::Done
        } else {
            Status::Running
        }
    }
}

/* ---------- per-technique steps ---------- */

#[allow(clippy::too_many_arguments)]
fn step_dither(
    surface: &mut FrameBuffer,
    mask: &Mask,
    row: &mut usize,
    cell_x: usize,
    cell_y: usize,
    target_w: usize,
    target_h: usize,
    theme: Theme,
    now: Instant,
) -> bool {
    let dx = (target_w as i32 - (mask.width * cell_x) as i32) / 2;
    let dy = (target_h as i32 - (mask.height * cell_y) as i32) / 2;
    let deadline = now + DITHER_BUDGET;

    let mut processed = 0;
    while *row < mask.height && processed < DITHER_ROWS_PER_FRAME {
        // Visual: one more row of phosphor dots pops in.
        for x in 0..mask.width {
            if mask.get(x, *row) {
                fill_rect(
                    surface,
                    Rect::new(
                        dx + (x * cell_x) as i32,
                        dy + (*row * cell_y) as i32,
                        cell_x as i32,
                        cell_y as i32,
                    ),
                    theme.fg,
                );
            }
        }
        // Thin highlight bar riding the scan edge.
        fill_rect_alpha(
            surface,
            Rect::new(dx, dy + (*row * cell_y) as i32, (mask.width * cell_x) as i32, 2),
            theme.fg,
            DITHER_HIGHLIGHT_ALPHA,
        );
        *row += 1;
        processed += 1;
        if Instant::now() >= deadline {
            break;
        }
    }
    *row >= mask.height
}

fn step_rows(
    surface: &mut FrameBuffer,
    comp: &ComposedBitmap,
    row: &mut usize,
    target_w: usize,
    target_h: usize,
    theme: Theme,
    now: Instant,
) -> bool {
    let (dx, dy) = comp.offsets(target_w, target_h);
    let total = comp.draw_h();
    let deadline = now + SCAN_BUDGET;

    let mut slices = 0;
    while *row < total && slices < SCAN_SLICES_PER_FRAME {
        let slice_h = SCAN_SLICE_HEIGHT.min(total - *row);
        // Re-blit everything up to the new edge; this also erases the
        // previous frame's highlight bar.
        blit(surface, &comp.frame, 0, 0, comp.draw_w(), *row + slice_h, dx, dy);
        fill_rect_alpha(
            surface,
            Rect::new(dx, dy + *row as i32, comp.draw_w() as i32, slice_h.max(2) as i32),
            theme.fg,
            SCAN_HIGHLIGHT_ALPHA,
        );
        *row += slice_h;
        slices += 1;
        if Instant::now() >= deadline {
            break;
        }
    }
    *row >= total
}

#[allow(clippy::too_many_arguments)]
fn step_particle(
    surface: &mut FrameBuffer,
    comp: &ComposedBitmap,
    full: &ComposedBitmap,
    order: &[u32],
    next: &mut usize,
    cols: usize,
    fade_start: &mut Option<Instant>,
    target_w: usize,
    target_h: usize,
    theme: Theme,
    now: Instant,
    lut: &GammaLut,
    status: &mut dyn StatusSink,
) -> bool {
    if let Some(start) = *fade_start {
        // Crossfade from the mosaic (already on the surface) to the
        // full-resolution composition, mixing in linear light.
        let t = ((now - start).as_secs_f32() * 1000.0 / CROSSFADE_MS).min(1.0);
        let (fx, fy) = full.offsets(target_w, target_h);
        for sy in 0..full.draw_h() {
            let y = fy + sy as i32;
            if y < 0 || y as usize >= surface.height {
                continue;
            }
            let drow = y as usize * surface.width;
            let srow = sy * full.draw_w();
            for sx in 0..full.draw_w() {
                let x = fx + sx as i32;
                if x < 0 || x as usize >= surface.width {
                    continue;
                }
                let idx = drow + x as usize;
                surface.pixels[idx] = lut.mix(surface.pixels[idx], full.frame.pixels[srow + sx], t);
            }
        }
        return t >= 1.0;
    }

    let (dx, dy) = comp.offsets(target_w, target_h);
    let deadline = now + PARTICLE_BUDGET;
    let glow_r = ((PARTICLE_CELL as f32 * 0.9) as i32).clamp(2, 10);

    let mut processed = 0;
    while *next < order.len() && processed < PARTICLE_PER_FRAME {
        let id = order[*next] as usize;
        *next += 1;
        let cx = id % cols;
        let cy = id / cols;
        let sx = cx * PARTICLE_CELL;
        let sy = cy * PARTICLE_CELL;
        let w = PARTICLE_CELL.min(comp.draw_w() - sx);
        let h = PARTICLE_CELL.min(comp.draw_h() - sy);
        // Visual: a random tile lands, with a soft glow spot on top.
        blit(surface, &comp.frame, sx, sy, w, h, dx + sx as i32, dy + sy as i32);
        fill_disc_screen(
            surface,
            dx + (sx + w / 2) as i32,
            dy + (sy + h / 2) as i32,
            glow_r,
            theme.fg,
            PARTICLE_GLOW_ALPHA,
        );
        processed += 1;
        if Instant::now() >= deadline {
            break;
        }
    }

    if *next >= order.len() {
        status.status(MSG_ENHANCING, Tone::Dim);
        *fade_start = Some(now);
    }
    false
}

#[allow(clippy::too_many_arguments)]
fn step_crt(
    surface: &mut FrameBuffer,
    full: &ComposedBitmap,
    overlay: &ShadeMap,
    beam: &mut usize,
    epoch: Instant,
    target_w: usize,
    target_h: usize,
    theme: Theme,
    now: Instant,
    rng: &mut Rng32,
) -> bool {
    let (dx, dy) = full.offsets(target_w, target_h);
    let t_ms = (now - epoch).as_secs_f32() * 1000.0;
    let jitter = ((t_ms / JITTER_PERIOD_MS).sin() * JITTER_AMPLITUDE).round() as i32;

    // The whole frame is redrawn every step: backdrop, revealed rows with
    // horizontal jitter, glow band, noise, then the scanline overlay.
    surface.fill(theme.bg);
    if *beam > 0 {
        blit(surface, &full.frame, 0, 0, full.draw_w(), *beam, dx + jitter, dy);
    }

    let band_top = dy + *beam as i32 - CRT_GLOW_HEIGHT / 2;
    glow_band_screen(
        surface,
        Rect::new(dx, band_top, full.draw_w() as i32, CRT_GLOW_HEIGHT),
        theme.fg,
        CRT_GLOW_PEAK,
    );

    // Sparkle noise inside the glow band.
    for _ in 0..CRT_NOISE_COUNT {
        let nx = dx + rng.range(0.0, full.draw_w() as f32) as i32;
        let ny = band_top + rng.range(0.0, CRT_GLOW_HEIGHT as f32) as i32;
        fill_rect_alpha(surface, Rect::new(nx, ny, 1, 1), theme.fg, CRT_NOISE_ALPHA);
    }

    apply_shade(surface, overlay, dx, dy);

    *beam += CRT_BEAM_SPEED;
    *beam >= full.draw_h()
}

/* ---------- precomputed pieces ---------- */

/// Identity permutation over the particle grid, shuffled uniformly.
pub(crate) fn cell_permutation(cols: usize, rows: usize, rng: &mut Rng32) -> Vec<u32> {
    let mut order: Vec<u32> = (0..(cols * rows) as u32).collect();
    rng.shuffle(&mut order);
    order
}

/// Scanline + vignette shade layer, built once per composition size.
/// Every other row is darkened, and brightness falls off radially from
/// 0.35*min(w,h) out to 0.7*max(w,h).
pub(crate) fn scanline_overlay(w: usize, h: usize) -> ShadeMap {
    let mut factors = vec![256u16; w * h];
    let scan_factor = (256.0 * (1.0 - CRT_SCANLINE_ALPHA)) as u16;
    for y in (0..h).step_by(2) {
        for f in &mut factors[y * w..y * w + w] {
            *f = scan_factor;
        }
    }

    let cx = w as f32 * 0.5;
    let cy = h as f32 * 0.5;
    let inner = (w.min(h)) as f32 * 0.35;
    let outer = (w.max(h)) as f32 * 0.7;
    for y in 0..h {
        for x in 0..w {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            let a = CRT_VIGNETTE_ALPHA * ((d - inner) / (outer - inner)).clamp(0.0, 1.0);
            let idx = y * w + x;
            factors[idx] = (factors[idx] as f32 * (1.0 - a)) as u16;
        }
    }

    ShadeMap { width: w, height: h, factors }
}
