use std::sync::Arc;

use prism_assets::{GltfFileSource, ViewerConfig};
use prism_core::IoTaskPool;
use prism_renderer::{GpuResources, RenderContext, WgpuBackend};
use prism_scene::Viewer;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{error::AppError, gui::Gui, input::OrbitInput};

/// Everything that only exists once the OS gave us a window.
struct Session {
    window: Arc<Window>,
    context: RenderContext,
    gui: Gui,
    viewer: Viewer,
}

impl Session {
    fn start(
        event_loop: &ActiveEventLoop,
        config: ViewerConfig,
        io: IoTaskPool,
    ) -> Result<Self, AppError> {
        let window = Arc::new(
            event_loop.create_window(Window::default_attributes().with_title("Prism"))?,
        );
        let size = window.inner_size();
        let context = RenderContext::new(Arc::clone(&window), size.width, size.height)?;

        let backend = WgpuBackend::new(&context.device, &context.queue, context.format());
        let resources = GpuResources::new(Box::new(backend));
        let mut viewer = Viewer::new(config, Arc::new(GltfFileSource), io, resources)?;
        viewer.set_viewport(context.config.width, context.config.height);
        viewer.start()?;

        let gui = Gui::new(&context, &window);
        Ok(Self {
            window,
            context,
            gui,
            viewer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
        self.viewer.set_viewport(width, height);
    }

    fn redraw(&mut self) {
        self.viewer.poll();
        self.viewer.camera_mut().update();

        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = (self.context.config.width, self.context.config.height);
                self.context.resize(width, height);
                return;
            }
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (gui_frame, updates) = self.gui.frame(&self.window, &self.viewer);
        for update in updates {
            if let Err(e) = self.viewer.apply(update) {
                log::error!("{}", e);
            }
        }

        let items = self.viewer.draw_list();
        let globals = self.viewer.frame_globals();
        let background = self.viewer.background();

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if let Some(backend) = self.viewer.resources_mut().backend_mut::<WgpuBackend>() {
            backend.prepare(&globals, &items);

            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Scene Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: background.r as f64,
                                g: background.g as f64,
                                b: background.b as f64,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.context.depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            backend.record(&mut pass, &items);
        }

        self.gui
            .paint(&self.context, &self.window, &mut encoder, &view, gui_frame);

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

/// Holds the config until `resumed`, then the running session.
struct PrismRunner {
    config: Option<ViewerConfig>,
    io: IoTaskPool,
    session: Option<Session>,
    input: OrbitInput,
    error: Option<AppError>,
}

impl ApplicationHandler for PrismRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        let Some(config) = self.config.take() else {
            return;
        };

        match Session::start(event_loop, config, self.io.clone()) {
            Ok(session) => self.session = Some(session),
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &self.session {
            session.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let consumed = session.gui.on_window_event(&session.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                session.viewer.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => session.resize(size.width, size.height),
            WindowEvent::RedrawRequested => session.redraw(),
            other if !consumed => self.input.handle(&other, session.viewer.camera_mut()),
            _ => {}
        }
    }
}

pub fn run(config: ViewerConfig, io: IoTaskPool) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = PrismRunner {
        config: Some(config),
        io,
        session: None,
        input: OrbitInput::default(),
        error: None,
    };
    event_loop.run_app(&mut runner)?;

    match runner.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
