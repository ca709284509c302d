// =============================================================================
// PRIMUS - Vulkan bootstrap: window, instance, GPU selection, logical device
// =============================================================================
//
// STARTUP FLOW:
// 1. Load config.toml (defaults if missing)
// 2. Initialize logging
// 3. Create the window once the event loop resumes
// 4. Engine::new - instance, surface, first suitable GPU, logical device
// 5. Poll events until the window is closed
// 6. Drop tears everything down in reverse order
//
// =============================================================================

use anyhow::Result;
use primus::{Config, Engine};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

fn main() -> Result<()> {
    // Load configuration from config.toml, report it once the logger is up
    let (config, source) = Config::load();

    init_logging(&config);
    source.log();
    log::debug!("Config: {:?}", config);
    log::info!("Starting {}", config.engine.name);
    log::info!(
        "Window: {}x{} '{}'",
        config.window.width,
        config.window.height,
        config.window.title
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Initialize logging, level from config unless RUST_LOG says otherwise
fn init_logging(config: &Config) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.log_level());
    builder.parse_default_env();
    builder.init();
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// IMPORTANT: Field order matters for Drop! The engine holds a surface that
/// must go before the window it was created for.
struct App {
    engine: Option<Engine>,
    window: Option<Arc<Window>>,
    config: Config,
    startup_error: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            engine: None,
            window: None,
            config,
            startup_error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.window.title.as_str())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_resizable(self.config.window.resizable);
        let window = Arc::new(event_loop.create_window(attributes)?);

        let size = window.inner_size();
        let engine = Engine::new(&self.config, &*window, size.width, size.height)?;

        let families = engine.selected().queue_families;
        log::info!(
            "Queue families: graphics {:?}, present {:?}, compute {:?}, transfer {:?}",
            families.graphics,
            families.present,
            families.compute,
            families.transfer
        );

        self.window = Some(window);
        self.engine = Some(engine);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.init(event_loop) {
            log::error!("Startup failed: {:#}", err);
            self.startup_error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            log::info!("Close requested, shutting down");
            // LogicalDevice waits for the GPU to go idle before it is destroyed
            self.engine = None;
            event_loop.exit();
        }
    }
}
