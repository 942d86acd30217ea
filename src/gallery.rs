// Render orchestrator for the gallery: owns the source bitmap reference,
// the live reveal token, and the cached build products. Reacts to surface
// resizes (debounced) and restarts, and drives the active reveal each frame.

use crate::compose;
use crate::draw::draw_text_centered;
use crate::error::Error;
use crate::gamma::GammaLut;
use crate::mono;
use crate::reveal::{Reveal, RevealToken, Status, Technique};
use crate::rng::Rng32;
use crate::types::{FrameBuffer, StatusSink, Theme, Tone};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Trailing delay before a size change is acted on; rapid resize streams
/// collapse into one rebuild.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

pub const MSG_CONVERTING: &str = "Converting to pixels...";
pub const MSG_PREPARING: &str = "Preparing scan...";
pub const MSG_INITIALIZING: &str = "Initializing scan...";
pub const MSG_RESTARTING: &str = "Restarting render...";
pub const MSG_LOAD_FAILED: &str = "Image failed to load";

pub struct Gallery {
    source: PathBuf,
    technique: Technique,
    theme: Theme,
    lut: GammaLut,

    /// Live animation generation. Bumped first on every rebuild, so any
    /// step still holding an older token cancels itself.
    token: RevealToken,
    reveal: Option<Reveal>,

    // Cache keys: a rebuild is skipped when neither changed.
    last_size: Option<(usize, usize)>,
    last_source: Option<PathBuf>,

    // Resize debounce state.
    pending_size: (usize, usize),
    pending_since: Option<Instant>,
    force: bool,
}

impl Gallery {
    pub fn new(source: PathBuf, technique: Technique, theme: Theme) -> Self {
        Self {
            source,
            technique,
            theme,
            lut: GammaLut::new(),
            token: 0,
            reveal: None,
            last_size: None,
            last_source: None,
            pending_size: (0, 0),
            pending_since: None,
            force: false,
        }
    }

    pub fn token(&self) -> RevealToken {
        self.token
    }

    /// Replay the whole pipeline from image load, skipping the cache.
    pub fn restart(&mut self, status: &mut dyn StatusSink) {
        status.status(MSG_RESTARTING, Tone::Dim);
        self.force = true;
    }

    /// Per-frame entry point. Watches the surface size, fires the debounced
    /// rebuild when due, then steps the active reveal.
    pub fn tick(
        &mut self,
        surface: &mut FrameBuffer,
        now: Instant,
        rng: &mut Rng32,
        status: &mut dyn StatusSink,
    ) {
        let dims = (surface.width, surface.height);
        if self.pending_size != dims {
            self.pending_size = dims;
            self.pending_since = Some(now);
        }

        let debounce_due =
            self.pending_since.is_some_and(|since| now.duration_since(since) >= RESIZE_DEBOUNCE);
        if self.force || debounce_due {
            let changed = self.last_size != Some(dims)
                || self.last_source.as_deref() != Some(self.source.as_path());
            if self.force || changed {
                self.rebuild(surface, now, rng, status);
            }
            self.pending_since = None;
            self.force = false;
        }

        if let Some(reveal) = &mut self.reveal {
            match reveal.step(self.token, surface, now, rng, &self.lut, status) {
                Status::Running => {}
                Status::Done | Status::Cancelled => self.reveal = None,
            }
        }
    }

    /// Invalidate everything and start a fresh reveal: bump the token,
    /// reload and re-derive the mask and compositions, then arm the
    /// configured technique.
    fn rebuild(
        &mut self,
        surface: &mut FrameBuffer,
        now: Instant,
        rng: &mut Rng32,
        status: &mut dyn StatusSink,
    ) {
        self.token += 1;
        self.reveal = None;
        let dims = (surface.width, surface.height);

        let img = match self.load_source() {
            Ok(img) => img,
            Err(err) => {
                // Non-fatal: static backdrop plus centered error text, no
                // reveal, no retry. The cache keys stay unset so a resize
                // or restart goes through the full path again.
                println!("gallery: {err}");
                surface.fill(self.theme.bg);
                draw_text_centered(
                    surface,
                    dims.0 as i32 / 2,
                    dims.1 as i32 / 2,
                    MSG_LOAD_FAILED,
                    self.theme.fg,
                );
                return;
            }
        };

        status.status(MSG_CONVERTING, Tone::Dim);
        let working = compose::pixelate(&img, dims.0, dims.1);
        let mask = mono::mono_mask(&img, dims.0, dims.1);

        status.status(MSG_PREPARING, Tone::Dim);
        let mosaic = compose::compose_mosaic(&working, dims.0, dims.1, &self.theme);
        let full = compose::compose_full(&img, dims.0, dims.1, &self.theme);

        status.status(MSG_INITIALIZING, Tone::Primary);
        let token = self.token;
        self.reveal = Some(match self.technique {
            Technique::DitherScan => Reveal::dither_scan(token, mask, dims.0, dims.1, self.theme),
            Technique::RowScan => Reveal::row_scan(token, mosaic, dims.0, dims.1, self.theme),
            Technique::Particle => {
                Reveal::particle(token, mosaic, full, dims.0, dims.1, self.theme, rng)
            }
            Technique::Crt => Reveal::crt(token, full, dims.0, dims.1, self.theme, now),
        });

        self.last_size = Some(dims);
        self.last_source = Some(self.source.clone());
    }

    fn load_source(&self) -> Result<image::RgbaImage, Error> {
        let img = image::open(&self.source)
            .map_err(|e| Error::ImageLoad(format!("{}: {e}", self.source.display())))?;
        Ok(img.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    struct RecordingSink(Vec<(String, Tone)>);

    impl StatusSink for RecordingSink {
        fn status(&mut self, text: &str, tone: Tone) {
            self.0.push((text.to_string(), tone));
        }
    }

    /// Write a small test bitmap and return its path.
    fn test_image(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("pixel-arcade-test-{name}.png"));
        let img = RgbaImage::from_fn(64, 48, |x, y| {
            if (x + y) % 2 == 0 { Rgba([220, 220, 220, 255]) } else { Rgba([30, 30, 30, 255]) }
        });
        img.save(&path).expect("write test image");
        path
    }

    #[test]
    fn unchanged_source_and_size_is_a_cache_hit() {
        let mut gallery = Gallery::new(test_image("cache"), Technique::RowScan, Theme::default());
        let mut surface = FrameBuffer::new(200, 150);
        let mut rng = Rng32::from_seed(1);
        let mut sink = RecordingSink(Vec::new());

        let t0 = Instant::now();
        gallery.tick(&mut surface, t0, &mut rng, &mut sink);
        assert_eq!(gallery.token(), 0, "debounce still pending");
        gallery.tick(&mut surface, t0 + Duration::from_millis(150), &mut rng, &mut sink);
        assert_eq!(gallery.token(), 1, "first rebuild after the trailing delay");

        // Many more frames at the same size: no recompute, no restart.
        for i in 0..50 {
            gallery.tick(
                &mut surface,
                t0 + Duration::from_millis(160 + i * 16),
                &mut rng,
                &mut sink,
            );
        }
        assert_eq!(gallery.token(), 1);
    }

    #[test]
    fn resize_bounce_back_to_same_size_skips_rebuild() {
        let mut gallery = Gallery::new(test_image("bounce"), Technique::RowScan, Theme::default());
        let mut rng = Rng32::from_seed(2);
        let mut sink = RecordingSink(Vec::new());

        let t0 = Instant::now();
        let mut surface = FrameBuffer::new(200, 150);
        gallery.tick(&mut surface, t0, &mut rng, &mut sink);
        gallery.tick(&mut surface, t0 + Duration::from_millis(150), &mut rng, &mut sink);
        assert_eq!(gallery.token(), 1);

        // Grow and immediately shrink back within the debounce window.
        let mut grown = FrameBuffer::new(300, 200);
        gallery.tick(&mut grown, t0 + Duration::from_millis(200), &mut rng, &mut sink);
        gallery.tick(&mut surface, t0 + Duration::from_millis(250), &mut rng, &mut sink);
        gallery.tick(&mut surface, t0 + Duration::from_millis(400), &mut rng, &mut sink);
        assert_eq!(gallery.token(), 1, "size settled where it started");
    }

    #[test]
    fn restart_bumps_the_token_and_replays_the_pipeline() {
        let mut gallery = Gallery::new(test_image("restart"), Technique::Crt, Theme::default());
        let mut surface = FrameBuffer::new(200, 150);
        let mut rng = Rng32::from_seed(3);
        let mut sink = RecordingSink(Vec::new());

        let t0 = Instant::now();
        gallery.tick(&mut surface, t0, &mut rng, &mut sink);
        gallery.tick(&mut surface, t0 + Duration::from_millis(150), &mut rng, &mut sink);
        assert_eq!(gallery.token(), 1);

        gallery.restart(&mut sink);
        gallery.tick(&mut surface, t0 + Duration::from_millis(200), &mut rng, &mut sink);
        assert_eq!(gallery.token(), 2);
        let texts: Vec<&str> = sink.0.iter().map(|(s, _)| s.as_str()).collect();
        assert!(texts.contains(&MSG_RESTARTING));
        assert!(texts.contains(&MSG_CONVERTING));
        assert!(texts.contains(&MSG_INITIALIZING));
    }

    #[test]
    fn status_phases_arrive_in_pipeline_order_with_tones() {
        let mut gallery = Gallery::new(test_image("order"), Technique::Particle, Theme::default());
        let mut surface = FrameBuffer::new(200, 150);
        let mut rng = Rng32::from_seed(4);
        let mut sink = RecordingSink(Vec::new());

        let t0 = Instant::now();
        gallery.tick(&mut surface, t0, &mut rng, &mut sink);
        gallery.tick(&mut surface, t0 + Duration::from_millis(150), &mut rng, &mut sink);

        let first_three: Vec<(&str, Tone)> =
            sink.0.iter().take(3).map(|(s, t)| (s.as_str(), *t)).collect();
        assert_eq!(
            first_three,
            vec![
                (MSG_CONVERTING, Tone::Dim),
                (MSG_PREPARING, Tone::Dim),
                (MSG_INITIALIZING, Tone::Primary),
            ]
        );
    }

    #[test]
    fn decode_failure_renders_error_text_and_no_reveal() {
        let mut gallery = Gallery::new(
            PathBuf::from("/nonexistent/pixel-arcade-missing.png"),
            Technique::Crt,
            Theme::default(),
        );
        let mut surface = FrameBuffer::new(200, 150);
        let mut rng = Rng32::from_seed(5);
        let mut sink = RecordingSink(Vec::new());

        let t0 = Instant::now();
        gallery.tick(&mut surface, t0, &mut rng, &mut sink);
        gallery.tick(&mut surface, t0 + Duration::from_millis(150), &mut rng, &mut sink);

        let theme = Theme::default();
        // Backdrop plus centered fg text; some pixels must be fg.
        assert!(surface.pixels.iter().any(|&p| p == theme.fg));
        assert!(surface.pixels.iter().any(|&p| p == theme.bg));

        // No reveal is running; further frames leave the surface untouched.
        let snapshot = surface.pixels.clone();
        gallery.tick(&mut surface, t0 + Duration::from_millis(300), &mut rng, &mut sink);
        assert_eq!(surface.pixels, snapshot);
    }

    #[test]
    fn end_to_end_crt_scan_completes_in_expected_frames() {
        // 800x600 source into a 400x300 surface: the full composition is
        // exactly 400x300, so the beam finishes in ceil(300/2) frames.
        let path = std::env::temp_dir().join("pixel-arcade-test-e2e.png");
        let img = RgbaImage::from_pixel(800, 600, Rgba([180, 200, 120, 255]));
        img.save(&path).expect("write test image");

        let mut gallery = Gallery::new(path, Technique::Crt, Theme::default());
        let mut surface = FrameBuffer::new(400, 300);
        let mut rng = Rng32::from_seed(6);
        let mut sink = RecordingSink(Vec::new());

        let t0 = Instant::now();
        gallery.tick(&mut surface, t0, &mut rng, &mut sink);
        // Rebuild fires and the first beam frame draws on the same tick.
        gallery.tick(&mut surface, t0 + Duration::from_millis(150), &mut rng, &mut sink);

        let mut frames = 1;
        while !sink.0.iter().any(|(s, _)| s == crate::reveal::MSG_COMPLETE) {
            gallery.tick(
                &mut surface,
                t0 + Duration::from_millis(150 + frames * 16),
                &mut rng,
                &mut sink,
            );
            frames += 1;
            assert!(frames <= 200, "beam should finish in 150 frames");
        }
        assert_eq!(frames, 150);
    }
}
