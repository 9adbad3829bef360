use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use shadersource::DefaultProvider;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use crate::bootstrap::Renderer;
use crate::frame::FrameLoop;
use crate::gl::{FrameError, GraphicsContext, SurfaceSize};
use crate::gpu::WgpuGraphics;
use crate::types::RendererConfig;

/// Event-loop state. Fields drop in declaration order, so the renderer (and
/// the surface created from the window's raw handles) goes before the window.
struct FrameHost {
    renderer: Renderer<WgpuGraphics>,
    window: Arc<Window>,
}

/// Opens the window, builds the program and animates it until the window closes.
pub fn run(config: RendererConfig) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let size = config.spec.size();
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(size.width, size.height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let graphics = WgpuGraphics::new(window.as_ref(), size)
        .context("failed to initialise wgpu on the window surface")?;
    let mut renderer = Renderer::new(graphics, config.spec.clone()).with_policy(config.policy);

    let provider = DefaultProvider::new().context("failed to create shader source client")?;
    let report = renderer
        .setup(&provider)
        .context("failed to set up the shader program")?;
    if !report.program.is_clean() {
        warn!(
            diagnostics = report.program.diagnostics().len(),
            "rendering with a program that did not build cleanly"
        );
    }

    info!(size = %renderer.surface_size(), title = %config.title, "entering frame loop");
    window.request_redraw();
    let origin = Instant::now();
    let mut host = FrameHost { renderer, window };

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == host.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        let frames = host.renderer.frame_loop().map_or(0, FrameLoop::frames);
                        info!(frames, "window closed");
                        elwt.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        host.renderer
                            .context_mut()
                            .set_surface_size(SurfaceSize::new(new_size.width, new_size.height));
                    }
                    WindowEvent::RedrawRequested => {
                        let timestamp_ms = origin.elapsed().as_secs_f64() * 1000.0;
                        host.render_frame(timestamp_ms, elwt);
                        host.window.request_redraw();
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                elwt.set_control_flow(ControlFlow::Wait);
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}

impl FrameHost {
    fn render_frame(&mut self, timestamp_ms: f64, elwt: &EventLoopWindowTarget<()>) {
        match self.renderer.tick(timestamp_ms) {
            Ok(()) => {}
            Err(FrameError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                debug!("surface lost or outdated; reconfiguring");
                self.renderer.context_mut().reconfigure();
            }
            Err(FrameError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                error!("surface out of memory; exiting");
                elwt.exit();
            }
            Err(FrameError::Surface(wgpu::SurfaceError::Timeout)) => {
                warn!("surface timeout; retrying next frame");
            }
            Err(err) => {
                warn!(error = %err, "frame failed; retrying next frame");
            }
        }
    }
}
