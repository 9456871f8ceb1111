use anyhow::{anyhow, Context, Result};
use glutin::{
    config::ConfigTemplateBuilder,
    context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
    display::{GetGlDisplay, GlDisplay},
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{info, warn};
use raw_window_handle::HasRawWindowHandle;
use simple_logger::SimpleLogger;
use std::{ffi::CString, num::NonZeroU32, rc::Rc};
use winit::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::{EventLoop, EventLoopBuilder},
    window::{Window, WindowBuilder},
};

use texquad::{
    config::{load_or_create_config, AppConfig},
    render::{GlApi, NativeGl},
    InputState, RenderPipeline,
};

struct App {
    // Declared first so its GL objects are deleted before the context goes.
    pipeline: RenderPipeline,
    input: InputState,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

impl App {
    fn new(config: &AppConfig) -> Result<(Self, EventLoop<()>)> {
        let event_loop = EventLoopBuilder::new().build()?;
        let window_builder = WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height));

        let template = ConfigTemplateBuilder::new().with_alpha_size(8);

        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |configs| {
                // glutin only calls the picker once it has found a config.
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    .expect("display offered no GL configs")
            })
            .map_err(|e| anyhow!("Failed to create GL display: {}", e))?;

        let window = window.context("Failed to create window")?;
        let raw_window_handle = window.raw_window_handle();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));

        let gl_display = gl_config.display();

        let gl_context = unsafe {
            gl_display
                .create_context(&gl_config, &context_attributes)
                .context("Failed to create OpenGL context")?
        };

        let attrs = window.build_surface_attributes(<_>::default());
        let gl_surface = unsafe {
            gl_display
                .create_window_surface(&gl_config, &attrs)
                .context("Failed to create GL surface")?
        };

        let gl_context = gl_context
            .make_current(&gl_surface)
            .context("Failed to make context current")?;

        if config.window.vsync {
            if let Err(e) = gl_surface
                .set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
            {
                warn!("Failed to enable vsync: {}", e);
            }
        }

        let gl: Rc<dyn GlApi> = Rc::new(NativeGl::load_with(|symbol| {
            match CString::new(symbol) {
                Ok(symbol) => gl_display.get_proc_address(symbol.as_c_str()) as *const _,
                Err(_) => std::ptr::null(),
            }
        }));

        let pipeline = RenderPipeline::new(gl, config)?;
        let size = window.inner_size();
        pipeline.resize(size.width, size.height);

        Ok((
            Self {
                pipeline,
                input: InputState::default(),
                gl_surface,
                gl_context,
                window,
            },
            event_loop,
        ))
    }

    /// Returns true when the loop should stop.
    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        if let WindowEvent::Resized(size) = event {
            self.resize(size.width, size.height);
        }
        self.input.handle_window_event(event)
    }

    fn resize(&self, width: u32, height: u32) {
        // Minimised windows report a zero-sized framebuffer.
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return;
        };
        self.gl_surface.resize(&self.gl_context, w, h);
        self.pipeline.resize(width, height);
    }

    fn redraw(&self) -> Result<()> {
        self.pipeline.render_frame();
        self.pipeline.drain_errors();
        self.gl_surface
            .swap_buffers(&self.gl_context)
            .context("Failed to swap buffers")
    }
}

fn load_config() -> (AppConfig, Option<anyhow::Error>) {
    match load_or_create_config() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    }
}

fn main() -> Result<()> {
    let (config, config_error) = load_config();
    SimpleLogger::new().with_level(config.log_level()).init()?;
    if let Some(e) = config_error {
        warn!("Using default configuration: {:#}", e);
    }
    info!("Initializing application...");

    let (mut app, event_loop) = App::new(&config)?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::RedrawRequested => {
                if let Err(e) = app.redraw() {
                    log::error!("{:#}", e);
                    elwt.exit();
                }
            }
            event => {
                if app.handle_window_event(&event) {
                    info!("Exit requested, shutting down");
                    elwt.exit();
                }
            }
        },
        Event::AboutToWait => {
            app.window.request_redraw();
        }
        _ => (),
    })?;

    Ok(())
}
