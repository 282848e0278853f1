use prism_core::{ShaderKind, UnknownShader};
use prism_renderer::ShaderError;

use crate::model::{BuildContext, BuildParams, LoadedModel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    Unchanged,
    /// The model's materials were replaced; carries how many.
    Switched(usize),
    /// The kind became active, but there was no model to rebuild.
    Deferred,
}

/// Tracks the active shading model and swaps the materials of a loaded model
/// in place. Geometry, textures and overlays are left alone.
#[derive(Debug)]
pub struct ShaderSwitcher {
    active: ShaderKind,
}

impl Default for ShaderSwitcher {
    fn default() -> Self {
        Self::new(ShaderKind::default())
    }
}

impl ShaderSwitcher {
    pub fn new(active: ShaderKind) -> Self {
        Self { active }
    }

    pub fn active(&self) -> ShaderKind {
        self.active
    }

    pub fn switch(
        &mut self,
        kind: ShaderKind,
        model: Option<&mut LoadedModel>,
        params: &BuildParams,
        ctx: &mut BuildContext<'_>,
    ) -> Result<SwitchOutcome, ShaderError> {
        if kind == self.active {
            return Ok(SwitchOutcome::Unchanged);
        }

        let Some(model) = model else {
            if !ctx.shaders.contains(kind) {
                return Err(UnknownShader(kind.name().to_owned()).into());
            }
            self.active = kind;
            return Ok(SwitchOutcome::Deferred);
        };

        // All programs first: an unknown kind must not cost the model its materials.
        let programs = model
            .meshes
            .iter()
            .map(|mesh| {
                let options = params.shader_options(mesh.texture.as_ref());
                ctx.shaders.create(kind, &options)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for material in model.materials.drain(..) {
            ctx.resources.dispose_material(material);
        }
        for (mesh, program) in model.meshes.iter().zip(programs) {
            let material = ctx.resources.create_material(program);
            ctx.scene.set_material(mesh.node, material.id());
            model.materials.push(material);
        }

        log::info!("Switched {} from {} to {}", model.name(), self.active, kind);
        self.active = kind;
        Ok(SwitchOutcome::Switched(model.materials.len()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use prism_core::ShaderKind;
    use prism_renderer::{GpuResources, ResourceKind, ShaderCatalog, ShaderUniforms};

    use super::{ShaderSwitcher, SwitchOutcome};
    use crate::{
        builder::ModelBuilder,
        model::{BuildContext, BuildParams},
        scene::{NodeContent, Scene},
        testing::two_mesh_model,
    };

    #[test]
    fn switching_to_the_active_kind_is_free() {
        let mut scene = Scene::default();
        let mut resources = GpuResources::headless();
        let shaders = ShaderCatalog::builtin();
        let mut ctx = BuildContext {
            scene: &mut scene,
            resources: &mut resources,
            shaders: &shaders,
        };
        let params = BuildParams::default();
        let mut model = ModelBuilder::new(ShaderKind::Normal, &params)
            .build(two_mesh_model(), PathBuf::from("two.gltf"), &mut ctx)
            .unwrap();

        let mut switcher = ShaderSwitcher::new(ShaderKind::Normal);
        let before = ctx.resources.stats();
        let outcome = switcher
            .switch(ShaderKind::Normal, Some(&mut model), &params, &mut ctx)
            .unwrap();

        assert_eq!(outcome, SwitchOutcome::Unchanged);
        assert_eq!(ctx.resources.stats(), before);
    }

    #[test]
    fn new_kind_replaces_only_materials() {
        let mut scene = Scene::default();
        let mut resources = GpuResources::headless();
        let shaders = ShaderCatalog::builtin();
        let mut ctx = BuildContext {
            scene: &mut scene,
            resources: &mut resources,
            shaders: &shaders,
        };
        let params = BuildParams::default();
        let mut model = ModelBuilder::new(ShaderKind::Normal, &params)
            .build(two_mesh_model(), PathBuf::from("two.gltf"), &mut ctx)
            .unwrap();

        let old_materials: Vec<_> = model.materials().iter().map(|m| m.id()).collect();
        let overlay_ids: Vec<_> = model
            .overlays()
            .iter()
            .map(|(_, o)| (o.geometry.id(), o.material.id()))
            .collect();

        let mut switcher = ShaderSwitcher::new(ShaderKind::Normal);
        let outcome = switcher
            .switch(ShaderKind::Toon, Some(&mut model), &params, &mut ctx)
            .unwrap();
        assert_eq!(outcome, SwitchOutcome::Switched(2));
        assert_eq!(switcher.active(), ShaderKind::Toon);

        let new_materials: Vec<_> = model.materials().iter().map(|m| m.id()).collect();
        assert!(new_materials.iter().all(|id| !old_materials.contains(id)));
        assert!(old_materials.iter().all(|&id| !ctx.resources.is_live(id)));
        assert!(matches!(
            model.materials()[0].program().uniforms,
            ShaderUniforms::Toon { .. }
        ));
        // The first mesh keeps its diffuse map.
        assert!(model.materials()[0].program().uniforms.map().is_some());

        let overlays_after: Vec<_> = model
            .overlays()
            .iter()
            .map(|(_, o)| (o.geometry.id(), o.material.id()))
            .collect();
        assert_eq!(overlay_ids, overlays_after);

        for (mesh, material) in model.meshes().iter().zip(&new_materials) {
            match ctx.scene.get(mesh.node).unwrap().content {
                NodeContent::Mesh { material: bound, .. } => assert_eq!(bound, *material),
                other => panic!("mesh node holds {:?}", other),
            }
        }

        let stats = ctx.resources.stats();
        assert_eq!(stats.live(ResourceKind::Material), 10);
        assert_eq!(stats.disposed(ResourceKind::Material), 2);
        assert_eq!(stats.disposed(ResourceKind::Geometry), 0);
        assert_eq!(stats.disposed(ResourceKind::Texture), 0);
    }

    #[test]
    fn unknown_kind_touches_nothing() {
        let mut scene = Scene::default();
        let mut resources = GpuResources::headless();
        let mut shaders = ShaderCatalog::new();
        shaders.register(ShaderKind::Normal, |options| {
            ShaderCatalog::builtin().create(ShaderKind::Normal, options).unwrap()
        });
        let mut ctx = BuildContext {
            scene: &mut scene,
            resources: &mut resources,
            shaders: &shaders,
        };
        let params = BuildParams::default();
        let mut model = ModelBuilder::new(ShaderKind::Normal, &params)
            .build(two_mesh_model(), PathBuf::from("two.gltf"), &mut ctx)
            .unwrap();

        let mut switcher = ShaderSwitcher::new(ShaderKind::Normal);
        let before = ctx.resources.stats();
        let result = switcher.switch(ShaderKind::Phong, Some(&mut model), &params, &mut ctx);

        assert!(result.is_err());
        assert_eq!(switcher.active(), ShaderKind::Normal);
        assert_eq!(ctx.resources.stats(), before);
        assert!(model.is_consistent());
    }

    #[test]
    fn switch_without_model_only_records_the_kind() {
        let mut scene = Scene::default();
        let mut resources = GpuResources::headless();
        let shaders = ShaderCatalog::builtin();
        let mut ctx = BuildContext {
            scene: &mut scene,
            resources: &mut resources,
            shaders: &shaders,
        };

        let mut switcher = ShaderSwitcher::default();
        let outcome = switcher
            .switch(ShaderKind::Silhouette, None, &BuildParams::default(), &mut ctx)
            .unwrap();

        assert_eq!(outcome, SwitchOutcome::Deferred);
        assert_eq!(switcher.active(), ShaderKind::Silhouette);
        assert_eq!(ctx.resources.stats().total_live(), 0);
    }
}
