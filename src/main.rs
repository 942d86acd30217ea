// Pixel Arcade: two little canvas toys sharing one window.
// What you SEE:
// • default: an image progressively revealed in phosphor green
//   (pick the style with --reveal=crt|rows|particle|dither; R restarts).
// • --slots: a three-reel fruit machine (Space/Enter spins, R restarts).
// ESC quits either mode.

mod compose;
mod draw;
mod error;
mod gallery;
mod gamma;
mod mono;
mod reel;
mod reveal;
mod rng;
mod slots;
mod sprites;
mod types;

use draw::{Drawer, draw_text_5x7, fill_rect};
use error::Error;
use gallery::Gallery;
use reveal::Technique;
use rng::Rng32;
use slots::{NullSound, SlotMachine};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use types::{FrameBuffer, Rect, StatusSink, Theme, Tone};

const DEFAULT_IMAGE: &str = "assets/cyberpunk.png";
const WINDOW_W: usize = 960;
const WINDOW_H: usize = 720;

enum App {
    Gallery(Gallery),
    Slots(SlotMachine),
}

/// Status sink for the binary: keeps the latest phase line for the HUD and
/// echoes it to the terminal.
struct HudStatus {
    line: String,
    tone: Tone,
}

impl StatusSink for HudStatus {
    fn status(&mut self, text: &str, tone: Tone) {
        self.line.clear();
        self.line.push_str(text);
        self.tone = tone;
        println!("Status: {text}");
    }
}

fn main() -> Result<(), Error> {
    /* --- Arguments: mode, reveal technique, source bitmap --- */
    let mut slots_mode = false;
    let mut technique = Technique::Crt;
    let mut source = PathBuf::from(DEFAULT_IMAGE);
    for arg in std::env::args().skip(1) {
        if arg == "--slots" {
            slots_mode = true;
        } else if let Some(name) = arg.strip_prefix("--reveal=") {
            match Technique::from_name(name) {
                Some(t) => technique = t,
                None => println!("Unknown reveal '{name}', using '{}'", technique.name()),
            }
        } else {
            source = PathBuf::from(arg);
        }
    }
    // Resolve the bitmap reference against the working directory.
    if source.is_relative() {
        if let Ok(base) = std::env::current_dir() {
            source = base.join(source);
        }
    }

    let theme = Theme::from_env();
    let mut rng = Rng32::from_clock();
    let title = if slots_mode { "Pixel Arcade: Slots" } else { "Pixel Arcade: Gallery" };
    let mut drawer = Drawer::new(title, WINDOW_W, WINDOW_H)?;

    /* --- Reusable screen buffer ---
       Recreated (blank) whenever the window is resized, like a canvas. */
    let mut surface = FrameBuffer::new(WINDOW_W, WINDOW_H);

    let mut hud = HudStatus { line: String::new(), tone: Tone::Dim };
    let mut sound = NullSound;
    let mut app = if slots_mode {
        App::Slots(SlotMachine::new(theme))
    } else {
        App::Gallery(Gallery::new(source, technique, theme))
    };

    /* --- FPS bookkeeping (printed once per second) --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second = 0u32;

    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        // Resizes reach the toys as a fresh, larger or smaller surface; the
        // gallery debounces its rebuild, the slots just relayout.
        let (w, h) = drawer.size();
        if w > 0 && h > 0 && (w, h) != (surface.width, surface.height) {
            surface = FrameBuffer::new(w, h);
        }

        match &mut app {
            App::Gallery(g) => {
                if drawer.r_pressed_once() {
                    g.restart(&mut hud);
                }
                g.tick(&mut surface, now, &mut rng, &mut hud);
            }
            App::Slots(m) => {
                if drawer.r_pressed_once() {
                    m.restart(&mut hud);
                }
                if drawer.spin_pressed_once() {
                    m.spin(now, &mut rng, &mut hud, &mut sound);
                }
                m.tick(&mut surface, now, &mut hud, &mut sound);
            }
        }

        // HUD strip along the bottom edge.
        if !hud.line.is_empty() {
            let strip_y = surface.height as i32 - 20;
            let strip_w = surface.width as i32;
            fill_rect(&mut surface, Rect::new(0, strip_y, strip_w, 20), theme.bg);
            let color = match hud.tone {
                Tone::Primary => theme.fg,
                Tone::Dim => theme.dim,
            };
            draw_text_5x7(&mut surface, 8, strip_y + 6, &hud.line, color);
        }

        drawer.present(&surface)?;

        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            println!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}
