// Slot machine game state: credits, the spin lifecycle, and the win check.
// Rendering composes per-reel buffers onto the surface, one buffer per reel,
// so sprites scrolling past a cell edge clip cleanly.

use crate::draw::{blit, draw_text_5x7};
use crate::reel::{self, ReelState};
use crate::rng::Rng32;
use crate::sprites::{self, Fruit, SYMBOL_COUNT};
use crate::types::{FrameBuffer, StatusSink, Theme, Tone};
use std::time::Instant;

pub const START_CREDIT: i32 = 10;
pub const SPIN_COST: i32 = 1;
pub const PAYOUT: i32 = 5;

pub const MSG_SPINNING: &str = "spinning...";
pub const MSG_TRY_AGAIN: &str = "try again";
pub const MSG_NO_CREDIT: &str = "no credit - press Restart";

const REEL_GAP: usize = 12;
const MARGIN: usize = 20;
const MIN_REEL: usize = 24;

/// Fire-and-forget sound cues. No return values; nothing here may affect
/// animation timing. The binary installs a silent sink.
pub trait SoundSink {
    fn spin_start(&mut self);
    fn tick(&mut self);
    fn win(&mut self);
    fn lose(&mut self);
}

/// Sink for builds without an audio backend.
pub struct NullSound;

impl SoundSink for NullSound {
    fn spin_start(&mut self) {}
    fn tick(&mut self) {}
    fn win(&mut self) {}
    fn lose(&mut self) {}
}

pub struct SlotMachine {
    theme: Theme,
    credit: i32,
    /// Symbol shown in each cell while idle.
    current: [usize; 3],
    targets: [usize; 3],
    reels: Option<[ReelState; 3]>,
    spin_started: Option<Instant>,
    last_frame: Option<Instant>,
    /// Reel cell size from the last layout pass; spins are planned in
    /// these pixels.
    cell: usize,
    buffers: Vec<FrameBuffer>,
}

impl SlotMachine {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            credit: START_CREDIT,
            current: [0, 1, 2],
            targets: [0, 0, 0],
            reels: None,
            spin_started: None,
            last_frame: None,
            cell: 0,
            buffers: Vec::new(),
        }
    }

    pub fn credit(&self) -> i32 {
        self.credit
    }

    pub fn spinning(&self) -> bool {
        self.reels.is_some()
    }

    /// Draw three random targets and launch the reels. Refused mid-spin and
    /// when the player is broke.
    pub fn spin(
        &mut self,
        now: Instant,
        rng: &mut Rng32,
        status: &mut dyn StatusSink,
        sound: &mut dyn SoundSink,
    ) {
        if self.spinning() {
            return;
        }
        if self.credit <= 0 {
            status.status(MSG_NO_CREDIT, Tone::Dim);
            return;
        }
        let targets = [
            rng.range_usize(SYMBOL_COUNT),
            rng.range_usize(SYMBOL_COUNT),
            rng.range_usize(SYMBOL_COUNT),
        ];
        self.spin_with_targets(targets, now, status, sound);
    }

    pub(crate) fn spin_with_targets(
        &mut self,
        targets: [usize; 3],
        now: Instant,
        status: &mut dyn StatusSink,
        sound: &mut dyn SoundSink,
    ) {
        self.credit -= SPIN_COST;
        status.status(MSG_SPINNING, Tone::Primary);
        sound.spin_start();

        let cell = self.cell.max(MIN_REEL);
        self.targets = targets;
        self.reels = Some([
            ReelState::spin(0, self.current[0], targets[0], cell),
            ReelState::spin(1, self.current[1], targets[1], cell),
            ReelState::spin(2, self.current[2], targets[2], cell),
        ]);
        self.spin_started = Some(now);
        self.last_frame = Some(now);
    }

    /// Reset the bank. Ignored mid-spin.
    pub fn restart(&mut self, status: &mut dyn StatusSink) {
        if self.spinning() {
            return;
        }
        self.credit = START_CREDIT;
        status.status("", Tone::Dim);
    }

    /// Per-frame entry point: advance any spinning reels, redraw the table.
    pub fn tick(
        &mut self,
        surface: &mut FrameBuffer,
        now: Instant,
        status: &mut dyn StatusSink,
        sound: &mut dyn SoundSink,
    ) {
        let size = self.layout(surface);
        let prev_frame = self.last_frame.replace(now);

        surface.fill(self.theme.bg);

        let mut settled = false;
        if let Some(reels) = &mut self.reels {
            let started = self.spin_started.unwrap_or(now);
            let mut all_done = true;
            for (i, state) in reels.iter_mut().enumerate() {
                let activation = started + state.delay();
                if now < activation {
                    // Still staggered out; hold the pre-spin symbol.
                    reel::render_reel(&mut self.buffers[i], size, self.current[i], 0.0, &self.theme);
                    all_done = false;
                    continue;
                }
                if !state.is_done() {
                    // dt runs from this reel's activation on its first
                    // active frame, from the previous frame after that.
                    let from = prev_frame.map_or(activation, |p| p.max(activation));
                    let dt = now.duration_since(from).as_secs_f32();
                    if state.advance(dt) {
                        sound.tick();
                    }
                    if !state.is_done() {
                        all_done = false;
                    }
                }
                let (center, frac) = state.visible();
                reel::render_reel(&mut self.buffers[i], size, center, frac, &self.theme);
            }
            settled = all_done;
        } else {
            for i in 0..3 {
                render_static(&mut self.buffers[i], size, self.current[i], &self.theme);
            }
        }

        if settled {
            self.current = self.targets;
            self.reels = None;
            self.spin_started = None;
            self.settle(status, sound);
        }

        // Compose the three cells centered on the surface.
        let total_w = 3 * size + 2 * REEL_GAP;
        let x0 = (surface.width as i32 - total_w as i32) / 2;
        let y0 = (surface.height as i32 - size as i32) / 2;
        for (i, buffer) in self.buffers.iter().enumerate() {
            let x = x0 + (i * (size + REEL_GAP)) as i32;
            blit(surface, buffer, 0, 0, size, size, x, y0);
        }

        draw_text_5x7(surface, 8, 8, &format!("credit: {}", self.credit), self.theme.fg);
    }

    fn settle(&mut self, status: &mut dyn StatusSink, sound: &mut dyn SoundSink) {
        let t = self.targets;
        if t[0] == t[1] && t[1] == t[2] {
            self.credit += PAYOUT;
            status.status(&format!("win! +{PAYOUT}"), Tone::Primary);
            sound.win();
        } else {
            status.status(MSG_TRY_AGAIN, Tone::Primary);
            sound.lose();
        }
    }

    /// Fit three square cells plus gaps into the surface; rebuild the
    /// per-reel buffers when the size changes.
    fn layout(&mut self, surface: &FrameBuffer) -> usize {
        let avail_w = surface.width.saturating_sub(2 * MARGIN + 2 * REEL_GAP) / 3;
        let avail_h = surface.height.saturating_sub(2 * MARGIN);
        let size = avail_w.min(avail_h).max(MIN_REEL);
        if self.cell != size || self.buffers.len() != 3 {
            self.cell = size;
            self.buffers = (0..3).map(|_| FrameBuffer::new(size, size)).collect();
        }
        size
    }
}

fn render_static(fb: &mut FrameBuffer, size: usize, index: usize, theme: &Theme) {
    sprites::draw_reel_frame(fb, 0, 0, size, theme);
    sprites::draw_symbol(fb, 0, 0, size, Fruit::from_index(index), theme);
}
