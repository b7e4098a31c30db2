//! Entry point for the toolpath viewer.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use toolpath_viewer::{
    app::App,
    config::Config,
    frame::{FrameDriver, TickOutcome},
    renderer::context::ContextId,
};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!("Starting toolpath viewer with {:?}", config);

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Toolpath Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
            .build(&event_loop)?,
    );

    let mut app = pollster::block_on(App::new(window.clone(), &config))
        .context("failed to initialise the viewer")?;
    let mut driver: FrameDriver<ContextId> = FrameDriver::new();

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent {
                window_id,
                event: WindowEvent::RedrawRequested,
            } if window_id == window.id() => match driver.tick(&mut app) {
                TickOutcome::Failed(err) => {
                    log::error!("Rendering failed: {:#}", err);
                    shutdown(&mut driver, &mut app, elwt);
                }
                TickOutcome::Rendered | TickOutcome::Skipped | TickOutcome::Cancelled => {}
            },
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                // Forward events to the app; handle unconsumed window events.
                if !app.handle_event(&event) {
                    match event {
                        WindowEvent::CloseRequested => shutdown(&mut driver, &mut app, elwt),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                shutdown(&mut driver, &mut app, elwt);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => driver.schedule(|| window.request_redraw()),
            _ => {}
        }
    })?;

    Ok(())
}

fn shutdown(driver: &mut FrameDriver<ContextId>, app: &mut App, elwt: &EventLoopWindowTarget<()>) {
    driver.cancel();
    app.teardown();
    elwt.exit();
}
