use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{color::Rgb, events::EventChannel, shader::ShaderKind};

/// Every value the control panel can tune.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterState {
    pub wireframe_visible: bool,
    pub normals_visible: bool,
    pub tangents_visible: bool,
    pub bounding_box_visible: bool,
    pub wireframe_opacity: f32,
    pub color: Rgb,
    pub sun_light_color: Rgb,
    pub ambient_light_color: Rgb,
    #[serde(rename = "bgColor")]
    pub background_color: Rgb,
    pub sun_light_intensity: f32,
    pub ambient_light_intensity: f32,
    pub shininess: f32,
    pub selected_model: String,
    pub selected_shader: ShaderKind,
}

impl Default for ParameterState {
    fn default() -> Self {
        Self {
            wireframe_visible: true,
            normals_visible: true,
            tangents_visible: true,
            bounding_box_visible: true,
            wireframe_opacity: 1.0,
            color: Rgb::WHITE,
            sun_light_color: Rgb::WHITE,
            ambient_light_color: Rgb::from_hex(0xe7e7ee),
            background_color: Rgb::from_hex(0x3f3f64),
            sun_light_intensity: 5.0,
            ambient_light_intensity: 3.0,
            shininess: 30.0,
            selected_model: String::new(),
            selected_shader: ShaderKind::Normal,
        }
    }
}

/// A partial [`ParameterState`]: `Some` fields replace the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterUpdate {
    pub wireframe_visible: Option<bool>,
    pub normals_visible: Option<bool>,
    pub tangents_visible: Option<bool>,
    pub bounding_box_visible: Option<bool>,
    pub wireframe_opacity: Option<f32>,
    pub color: Option<Rgb>,
    pub sun_light_color: Option<Rgb>,
    pub ambient_light_color: Option<Rgb>,
    pub background_color: Option<Rgb>,
    pub sun_light_intensity: Option<f32>,
    pub ambient_light_intensity: Option<f32>,
    pub shininess: Option<f32>,
    pub selected_model: Option<String>,
    pub selected_shader: Option<ShaderKind>,
}

impl ParameterUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ParameterState {
    pub fn apply(&mut self, update: ParameterUpdate) {
        let ParameterUpdate {
            wireframe_visible,
            normals_visible,
            tangents_visible,
            bounding_box_visible,
            wireframe_opacity,
            color,
            sun_light_color,
            ambient_light_color,
            background_color,
            sun_light_intensity,
            ambient_light_intensity,
            shininess,
            selected_model,
            selected_shader,
        } = update;

        fn merge<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        merge(&mut self.wireframe_visible, wireframe_visible);
        merge(&mut self.normals_visible, normals_visible);
        merge(&mut self.tangents_visible, tangents_visible);
        merge(&mut self.bounding_box_visible, bounding_box_visible);
        merge(&mut self.wireframe_opacity, wireframe_opacity);
        merge(&mut self.color, color);
        merge(&mut self.sun_light_color, sun_light_color);
        merge(&mut self.ambient_light_color, ambient_light_color);
        merge(&mut self.background_color, background_color);
        merge(&mut self.sun_light_intensity, sun_light_intensity);
        merge(&mut self.ambient_light_intensity, ambient_light_intensity);
        merge(&mut self.shininess, shininess);
        merge(&mut self.selected_model, selected_model);
        merge(&mut self.selected_shader, selected_shader);
    }
}

/// Single owner of the live [`ParameterState`].
///
/// Every [`ParameterStore::update`] broadcasts the complete new state (never a
/// diff) exactly once, synchronously, in subscription order.
pub struct ParameterStore {
    state: ParameterState,
    changes: EventChannel<ParameterState>,
}

impl ParameterStore {
    pub fn new(state: ParameterState) -> Self {
        Self {
            state,
            changes: EventChannel::new(),
        }
    }

    pub fn state(&self) -> &ParameterState {
        &self.state
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<ParameterState> {
        self.changes.subscribe()
    }

    pub fn update(&mut self, update: ParameterUpdate) -> &ParameterState {
        self.state.apply(update);
        let delivered = self.changes.emit(&self.state);
        log::trace!("Parameter state broadcast to {} subscribers", delivered);
        &self.state
    }
}
