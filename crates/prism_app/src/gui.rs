use egui_wgpu::{RendererOptions, ScreenDescriptor};
use prism_core::{ParameterUpdate, Rgb};
use prism_renderer::RenderContext;
use prism_scene::{LoadState, Viewer};
use winit::{event::WindowEvent, window::Window};

/// egui context plus its winit and wgpu halves.
pub struct Gui {
    context: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// One frame of tessellated UI, waiting to be painted.
pub struct GuiFrame {
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
}

impl Gui {
    pub fn new(render_context: &RenderContext, window: &Window) -> Self {
        let context = egui::Context::default();
        let viewport_id = context.viewport_id();
        let state = egui_winit::State::new(
            context.clone(),
            viewport_id,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(
            &render_context.device,
            render_context.format(),
            RendererOptions::default(),
        );

        Self {
            context,
            state,
            renderer,
        }
    }

    /// Returns true when the panel used the event and the scene should not see it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(window, event);
        let pointer_event = matches!(
            event,
            WindowEvent::MouseInput { .. } | WindowEvent::MouseWheel { .. }
        );
        response.consumed || (pointer_event && self.context.is_pointer_over_area())
    }

    /// Lays out the control panel. Every widget edit becomes a one-field update.
    pub fn frame(&mut self, window: &Window, viewer: &Viewer) -> (GuiFrame, Vec<ParameterUpdate>) {
        let raw_input = self.state.take_egui_input(window);
        let mut updates = Vec::new();

        self.context.begin_pass(raw_input);
        control_panel(&self.context, viewer, &mut updates);
        let output = self.context.end_pass();

        self.state
            .handle_platform_output(window, output.platform_output);
        let paint_jobs = self
            .context
            .tessellate(output.shapes, output.pixels_per_point);

        (
            GuiFrame {
                paint_jobs,
                textures_delta: output.textures_delta,
            },
            updates,
        )
    }

    pub fn paint(
        &mut self,
        render_context: &RenderContext,
        window: &Window,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: GuiFrame,
    ) {
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [render_context.config.width, render_context.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };
        for (id, delta) in &frame.textures_delta.set {
            self.renderer
                .update_texture(&render_context.device, &render_context.queue, *id, delta);
        }
        self.renderer.update_buffers(
            &render_context.device,
            &render_context.queue,
            encoder,
            &frame.paint_jobs,
            &screen_descriptor,
        );

        {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut pass = pass.forget_lifetime();
            self.renderer
                .render(&mut pass, &frame.paint_jobs, &screen_descriptor);
        }

        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

fn control_panel(ctx: &egui::Context, viewer: &Viewer, updates: &mut Vec<ParameterUpdate>) {
    let state = viewer.state();

    egui::Window::new("Controls")
        .default_width(260.0)
        .show(ctx, |ui| {
            egui::ComboBox::from_label("Select Model")
                .selected_text(state.selected_model.as_str())
                .show_ui(ui, |ui| {
                    let retry = viewer.load_state() == LoadState::Empty;
                    for entry in viewer.catalog().models() {
                        let selected = entry.name == state.selected_model;
                        if ui.selectable_label(selected, entry.name.as_str()).clicked()
                            && (!selected || retry)
                        {
                            updates.push(ParameterUpdate {
                                selected_model: Some(entry.name.clone()),
                                ..Default::default()
                            });
                        }
                    }
                });

            egui::ComboBox::from_label("Shader")
                .selected_text(state.selected_shader.name())
                .show_ui(ui, |ui| {
                    for &kind in viewer.catalog().shaders() {
                        let selected = kind == state.selected_shader;
                        if ui.selectable_label(selected, kind.name()).clicked() && !selected {
                            updates.push(ParameterUpdate {
                                selected_shader: Some(kind),
                                ..Default::default()
                            });
                        }
                    }
                });

            ui.separator();

            if let Some(value) = toggle(ui, "Wireframe", state.wireframe_visible) {
                updates.push(ParameterUpdate {
                    wireframe_visible: Some(value),
                    ..Default::default()
                });
            }
            if let Some(value) = color(ui, "Wireframe Color", state.color) {
                updates.push(ParameterUpdate {
                    color: Some(value),
                    ..Default::default()
                });
            }
            if let Some(value) = slider(ui, "Wireframe Opacity", state.wireframe_opacity, 0.0..=1.0, 0.01) {
                updates.push(ParameterUpdate {
                    wireframe_opacity: Some(value),
                    ..Default::default()
                });
            }
            if let Some(value) = toggle(ui, "Normals", state.normals_visible) {
                updates.push(ParameterUpdate {
                    normals_visible: Some(value),
                    ..Default::default()
                });
            }
            if let Some(value) = toggle(ui, "Tangents", state.tangents_visible) {
                updates.push(ParameterUpdate {
                    tangents_visible: Some(value),
                    ..Default::default()
                });
            }
            if let Some(value) = toggle(ui, "Bounding Box", state.bounding_box_visible) {
                updates.push(ParameterUpdate {
                    bounding_box_visible: Some(value),
                    ..Default::default()
                });
            }

            egui::CollapsingHeader::new("Lights")
                .default_open(true)
                .show(ui, |ui| {
                    if let Some(value) =
                        slider(ui, "Sunlight Intensity", state.sun_light_intensity, 0.0..=10.0, 0.001)
                    {
                        updates.push(ParameterUpdate {
                            sun_light_intensity: Some(value),
                            ..Default::default()
                        });
                    }
                    if let Some(value) = color(ui, "Sunlight Color", state.sun_light_color) {
                        updates.push(ParameterUpdate {
                            sun_light_color: Some(value),
                            ..Default::default()
                        });
                    }
                    if let Some(value) = color(ui, "Ambient Light Color", state.ambient_light_color) {
                        updates.push(ParameterUpdate {
                            ambient_light_color: Some(value),
                            ..Default::default()
                        });
                    }
                    if let Some(value) = slider(
                        ui,
                        "Ambient Light Intensity",
                        state.ambient_light_intensity,
                        0.0..=10.0,
                        0.001,
                    ) {
                        updates.push(ParameterUpdate {
                            ambient_light_intensity: Some(value),
                            ..Default::default()
                        });
                    }
                    if let Some(value) = color(ui, "Background Color", state.background_color) {
                        updates.push(ParameterUpdate {
                            background_color: Some(value),
                            ..Default::default()
                        });
                    }
                });

            egui::CollapsingHeader::new("Material")
                .default_open(true)
                .show(ui, |ui| {
                    if let Some(value) = color(ui, "Diffuse Color", state.color) {
                        updates.push(ParameterUpdate {
                            color: Some(value),
                            ..Default::default()
                        });
                    }
                    if let Some(value) = slider(ui, "Shininess", state.shininess, 0.0..=100.0, 1.0) {
                        updates.push(ParameterUpdate {
                            shininess: Some(value),
                            ..Default::default()
                        });
                    }
                });

            ui.separator();
            status(ui, viewer);
        });
}

fn status(ui: &mut egui::Ui, viewer: &Viewer) {
    let text = match viewer.load_state() {
        LoadState::Empty => "No model",
        LoadState::Loading => "Loading...",
        LoadState::Ready => "Ready",
    };
    ui.label(text);

    if let Some(model) = viewer.current_model() {
        ui.label(format!("{}: {} meshes", model.name(), model.mesh_count()));
        for diagnostic in model.diagnostics() {
            ui.small(format!("{:?}", diagnostic));
        }
    }
    if let Some(error) = viewer.last_error() {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }

    let stats = viewer.resource_stats();
    ui.small(format!("Live GPU resources: {}", stats.total_live()));
}

fn toggle(ui: &mut egui::Ui, label: &str, current: bool) -> Option<bool> {
    let mut value = current;
    ui.checkbox(&mut value, label).changed().then_some(value)
}

fn slider(
    ui: &mut egui::Ui,
    label: &str,
    current: f32,
    range: std::ops::RangeInclusive<f32>,
    step: f64,
) -> Option<f32> {
    let mut value = current;
    ui.add(egui::Slider::new(&mut value, range).step_by(step).text(label))
        .changed()
        .then_some(value)
}

fn color(ui: &mut egui::Ui, label: &str, current: Rgb) -> Option<Rgb> {
    let mut rgb = current.to_array();
    let changed = ui
        .horizontal(|ui| {
            let changed = ui.color_edit_button_rgb(&mut rgb).changed();
            ui.label(label);
            changed
        })
        .inner;
    changed.then(|| Rgb::new(rgb[0], rgb[1], rgb[2]))
}
