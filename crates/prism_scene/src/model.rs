use std::path::PathBuf;

use prism_core::{Aabb, ParameterState, Rgb};
use prism_renderer::{
    GeometryHandle, GpuResources, LineMaterial, Material, OverlayKinds, ShaderCatalog,
    ShaderOptions, TextureHandle, shaders::DEFAULT_SHININESS,
};

use crate::scene::{NodeId, Scene};

/// Mutable access to everything a model build or teardown touches.
pub struct BuildContext<'a> {
    pub scene: &'a mut Scene,
    pub resources: &'a mut GpuResources,
    pub shaders: &'a ShaderCatalog,
}

/// The parameter subset that shapes a built model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildParams {
    pub color: Rgb,
    pub shininess: Option<f32>,
    pub wireframe_opacity: f32,
    pub visible: OverlayKinds,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            shininess: None,
            wireframe_opacity: 1.0,
            visible: OverlayKinds::all(),
        }
    }
}

impl BuildParams {
    pub fn from_state(state: &ParameterState) -> Self {
        let mut visible = OverlayKinds::empty();
        visible.set(OverlayKinds::WIREFRAME, state.wireframe_visible);
        visible.set(OverlayKinds::NORMALS, state.normals_visible);
        visible.set(OverlayKinds::TANGENTS, state.tangents_visible);
        visible.set(OverlayKinds::BOUNDING_BOX, state.bounding_box_visible);

        // An explicit 0 stays 0; the default only fills in when nothing was set.
        Self {
            color: state.color,
            shininess: Some(state.shininess),
            wireframe_opacity: state.wireframe_opacity,
            visible,
        }
    }

    pub fn shininess(&self) -> f32 {
        self.shininess.unwrap_or(DEFAULT_SHININESS)
    }

    pub fn shader_options(&self, texture: Option<&TextureHandle>) -> ShaderOptions {
        ShaderOptions {
            base_color: self.color,
            shininess: self.shininess(),
            texture: texture.map(TextureHandle::id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildDiagnostic {
    /// A mesh carried several materials; only the first was inspected.
    UnexpectedMeshShape { mesh: String, material_count: usize },
    /// A mesh had no triangles to draw; its node became a plain group.
    EmptyMesh { mesh: String },
}

#[derive(Debug)]
pub struct MeshRecord {
    pub name: String,
    pub node: NodeId,
    pub geometry: GeometryHandle,
    /// Diffuse texture kept alive for shader switches.
    pub texture: Option<TextureHandle>,
}

#[derive(Debug)]
pub struct Overlay {
    pub node: NodeId,
    pub geometry: GeometryHandle,
    pub material: LineMaterial,
}

impl Overlay {
    fn dispose(self, ctx: &mut BuildContext<'_>) {
        ctx.scene.remove(self.node);
        ctx.resources.dispose_geometry(self.geometry);
        ctx.resources.dispose_line_material(self.material);
    }
}

/// Debug overlays, one entry per mesh per kind, index-aligned with the meshes.
#[derive(Debug, Default)]
pub struct Overlays {
    pub wireframes: Vec<Overlay>,
    pub normals: Vec<Overlay>,
    pub tangents: Vec<Overlay>,
    pub bounding_boxes: Vec<Overlay>,
}

impl Overlays {
    pub fn of_kind(&self, kind: OverlayKinds) -> &[Overlay] {
        if kind == OverlayKinds::WIREFRAME {
            &self.wireframes
        } else if kind == OverlayKinds::NORMALS {
            &self.normals
        } else if kind == OverlayKinds::TANGENTS {
            &self.tangents
        } else if kind == OverlayKinds::BOUNDING_BOX {
            &self.bounding_boxes
        } else {
            &[]
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (OverlayKinds, &Overlay)> {
        OverlayKinds::all()
            .iter()
            .flat_map(move |kind| self.of_kind(kind).iter().map(move |o| (kind, o)))
    }

    fn lens(&self) -> [usize; 4] {
        [
            self.wireframes.len(),
            self.normals.len(),
            self.tangents.len(),
            self.bounding_boxes.len(),
        ]
    }

    fn drain_all(&mut self) -> impl Iterator<Item = Overlay> + '_ {
        self.wireframes
            .drain(..)
            .chain(self.normals.drain(..))
            .chain(self.tangents.drain(..))
            .chain(self.bounding_boxes.drain(..))
    }
}

/// A model placed in the scene, together with every GPU resource it created.
#[derive(Debug)]
pub struct LoadedModel {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) root: NodeId,
    pub(crate) meshes: Vec<MeshRecord>,
    pub(crate) materials: Vec<Material>,
    pub(crate) overlays: Overlays,
    pub(crate) bounds: Aabb,
    pub(crate) diagnostics: Vec<BuildDiagnostic>,
}

impl LoadedModel {
    pub(crate) fn new(name: String, path: PathBuf, root: NodeId) -> Self {
        Self {
            name,
            path,
            root,
            meshes: Vec::new(),
            materials: Vec::new(),
            overlays: Overlays::default(),
            bounds: Aabb::EMPTY,
            diagnostics: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn meshes(&self) -> &[MeshRecord] {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    /// Materials and every overlay list line up with the meshes.
    pub fn is_consistent(&self) -> bool {
        let n = self.meshes.len();
        self.materials.len() == n && self.overlays.lens().iter().all(|&len| len == n)
    }

    /// Pushes visibility, colors, opacity and shininess without rebuilding anything.
    pub fn apply_cosmetics(&mut self, params: &BuildParams, ctx: &mut BuildContext<'_>) {
        for (kind, overlay) in self.overlays.iter() {
            ctx.scene.set_visible(overlay.node, params.visible.contains(kind));
        }
        for wireframe in &mut self.overlays.wireframes {
            ctx.resources
                .update_line_material(&mut wireframe.material, params.color, params.wireframe_opacity);
        }

        let shininess = params.shininess();
        for material in &mut self.materials {
            let mut next = material.program().uniforms;
            next.set_color(params.color);
            next.set_shininess(shininess);
            if next != material.program().uniforms {
                ctx.resources.update_material(material, |uniforms| *uniforms = next);
            }
        }
    }

    /// Releases every resource and detaches every node. Consumes the model,
    /// so nothing can be released twice.
    pub fn dispose(mut self, ctx: &mut BuildContext<'_>) {
        let overlays: Vec<Overlay> = self.overlays.drain_all().collect();
        for overlay in overlays {
            overlay.dispose(ctx);
        }

        // Mesh nodes go with the root.
        for record in self.meshes.drain(..) {
            ctx.resources.dispose_geometry(record.geometry);
            if let Some(texture) = record.texture {
                ctx.resources.dispose_texture(texture);
            }
        }
        for material in self.materials.drain(..) {
            ctx.resources.dispose_material(material);
        }

        ctx.scene.remove(self.root);
        log::debug!("Disposed model {}", self.name);
    }
}

#[cfg(test)]
mod tests {
    use prism_core::ParameterState;
    use prism_renderer::OverlayKinds;

    use super::BuildParams;

    #[test]
    fn zero_shininess_is_kept() {
        let state = ParameterState {
            shininess: 0.0,
            normals_visible: false,
            ..Default::default()
        };
        let params = BuildParams::from_state(&state);

        assert_eq!(params.shininess(), 0.0);
        assert_eq!(BuildParams::default().shininess(), 30.0);
        assert!(!params.visible.contains(OverlayKinds::NORMALS));
        assert!(params.visible.contains(OverlayKinds::WIREFRAME));
    }
}
