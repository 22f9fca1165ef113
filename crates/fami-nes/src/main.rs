//! NES emulator binary.
//!
//! Windowed mode runs the machine under winit with a pixels surface,
//! paced by frame deadlines; headless mode drives the cooperative run
//! loop for a fixed number of frames, optionally saving a PNG screenshot.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fami_nes::ppu::{FB_HEIGHT, FB_WIDTH};
use fami_nes::{capture, Nes, VideoSink};
use pixels::{Pixels, SurfaceTexture};
use tracing::error;
use winit::application::ApplicationHandler;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

mod controller_map;

/// Window scale factor.
const SCALE: usize = 3;

/// Frame deadline spacing for ~60 Hz NTSC.
const FRAME_DURATION: Duration = Duration::from_micros(16_639);

/// Frames emulated per pass at most; past this the backlog is dropped.
const MAX_CATCH_UP: u32 = 3;

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    rom_path: Option<PathBuf>,
    headless: bool,
    frames: u32,
    screenshot_path: Option<PathBuf>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        rom_path: None,
        headless: false,
        frames: 200,
        screenshot_path: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rom" => {
                i += 1;
                cli.rom_path = args.get(i).map(PathBuf::from);
            }
            "--headless" => {
                cli.headless = true;
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.frames = s.parse().unwrap_or(200);
                }
            }
            "--screenshot" => {
                i += 1;
                cli.screenshot_path = args.get(i).map(PathBuf::from);
            }
            "--help" | "-h" => {
                eprintln!("Usage: fami-nes [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --rom <file>         iNES ROM file (.nes)");
                eprintln!("  --headless           Run without a window");
                eprintln!(
                    "  --frames <n>         Number of frames in headless mode [default: 200]"
                );
                eprintln!("  --screenshot <file>  Save a PNG screenshot (headless)");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

/// Stops the run loop after a fixed number of frames.
struct FrameBudget {
    remaining: u32,
}

impl VideoSink for FrameBudget {
    fn present(&mut self, _frame: &[u8]) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining > 0
    }
}

fn run_headless(cli: &CliArgs) {
    let mut nes = make_nes(cli);
    let mut sink = FrameBudget {
        remaining: cli.frames.max(1),
    };
    nes.start(false, &mut sink);

    if let Some(ref path) = cli.screenshot_path {
        if let Err(e) = capture::save_screenshot(&nes, path) {
            eprintln!("Screenshot error: {e}");
            process::exit(1);
        }
        eprintln!("Screenshot saved to {}", path.display());
    }
}

// ---------------------------------------------------------------------------
// Windowed mode (winit + pixels)
// ---------------------------------------------------------------------------

/// The window and its pixel surface, created together once the event loop
/// is live. The surface holds its own handle to the window, so both drop
/// together and nothing needs a leaked borrow.
struct View {
    window: Arc<Window>,
    pixels: Pixels<'static>,
}

impl View {
    fn open(event_loop: &ActiveEventLoop) -> Result<Self, Box<dyn std::error::Error>> {
        let size = winit::dpi::LogicalSize::new(
            (FB_WIDTH * SCALE) as f64,
            (FB_HEIGHT * SCALE) as f64,
        );
        let window = Arc::new(event_loop.create_window(
            WindowAttributes::default()
                .with_title("Famicom")
                .with_inner_size(size)
                .with_resizable(false),
        )?);
        let inner = window.inner_size();
        let surface = SurfaceTexture::new(inner.width, inner.height, Arc::clone(&window));
        let pixels = Pixels::new(FB_WIDTH as u32, FB_HEIGHT as u32, surface)?;
        Ok(Self { window, pixels })
    }

    /// Copy a finished RGBA frame to the surface and schedule a redraw.
    fn blit(&mut self, frame: &[u8]) {
        self.pixels.frame_mut().copy_from_slice(frame);
        self.window.request_redraw();
    }
}

/// Windowed shell: owns the machine and emulates against frame deadlines.
struct Shell {
    nes: Nes,
    view: Option<View>,
    /// Deadline of the next frame to emulate.
    next_frame: Instant,
}

impl Shell {
    fn new(nes: Nes) -> Self {
        Self {
            nes,
            view: None,
            next_frame: Instant::now(),
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state.is_pressed();
        if code == KeyCode::Escape {
            if pressed {
                event_loop.exit();
            }
            return;
        }
        if let Some(button) = controller_map::map_keycode(code) {
            if pressed {
                self.nes.press_button(button);
            } else {
                self.nes.release_button(button);
            }
        }
    }

    /// Emulate every frame whose deadline has passed, then hand the newest
    /// one to the view.
    fn catch_up(&mut self) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let now = Instant::now();
        let mut produced = 0;
        while self.next_frame <= now {
            if produced == MAX_CATCH_UP {
                // Deep backlog (window drag, suspend): drop it and resync
                self.next_frame = now + FRAME_DURATION;
                break;
            }
            self.nes.run_frame();
            self.next_frame += FRAME_DURATION;
            produced += 1;
        }
        if produced > 0 {
            view.blit(self.nes.framebuffer());
        }
    }
}

impl ApplicationHandler for Shell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.view.is_some() {
            return;
        }
        match View::open(event_loop) {
            Ok(view) => {
                self.view = Some(view);
                self.next_frame = Instant::now();
            }
            Err(e) => {
                error!("could not open a window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::RedrawRequested => {
                if let Some(view) = self.view.as_mut() {
                    if let Err(e) = view.pixels.render() {
                        error!("lost the render surface: {e}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.catch_up();
        if self.view.is_some() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn make_nes(cli: &CliArgs) -> Nes {
    let rom_path = cli.rom_path.as_ref().unwrap_or_else(|| {
        eprintln!("No ROM file specified. Use --rom <file.nes>");
        process::exit(1);
    });

    match Nes::from_file(rom_path) {
        Ok(nes) => {
            eprintln!("Loaded ROM: {}", rom_path.display());
            nes
        }
        Err(e) => {
            eprintln!("Failed to load ROM {}: {e}", rom_path.display());
            process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = parse_args();

    if cli.headless {
        run_headless(&cli);
        return;
    }

    let nes = make_nes(&cli);
    let mut shell = Shell::new(nes);

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            error!("could not create the event loop: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = event_loop.run_app(&mut shell) {
        error!("event loop failed: {e}");
        process::exit(1);
    }
}
