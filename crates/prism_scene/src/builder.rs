use std::{collections::HashMap, path::PathBuf};

use glam::Mat4;
use prism_assets::{MeshData, ParsedModel};
use prism_core::{Rgb, ShaderKind};
use prism_renderer::{
    OverlayKinds,
    overlays::{
        BOUNDS_COLOR, HELPER_LENGTH, NORMALS_COLOR, TANGENTS_COLOR, box_lines, normal_lines,
        tangent_lines, wireframe_lines,
    },
};

use crate::{
    error::BuildError,
    model::{BuildContext, BuildDiagnostic, BuildParams, LoadedModel, MeshRecord, Overlay},
    scene::{NodeContent, NodeId},
};

/// Turns a parsed model into scene nodes, one viewer material per mesh and
/// the four debug overlays per mesh.
pub struct ModelBuilder<'p> {
    shader: ShaderKind,
    params: &'p BuildParams,
}

impl<'p> ModelBuilder<'p> {
    pub fn new(shader: ShaderKind, params: &'p BuildParams) -> Self {
        Self { shader, params }
    }

    /// On error everything created so far is released again, so a failed
    /// build leaves neither nodes nor resources behind.
    pub fn build(
        &self,
        mut parsed: ParsedModel,
        path: PathBuf,
        ctx: &mut BuildContext<'_>,
    ) -> Result<LoadedModel, BuildError> {
        for mesh in &mut parsed.meshes {
            let dropped = mesh.retain_valid_triangles();
            if dropped > 0 {
                log::warn!(
                    "Dropped {} triangles of mesh \"{}\" that index past its vertices",
                    dropped,
                    mesh.name
                );
            }
        }
        parsed.ensure_tangents();

        let root = ctx
            .scene
            .spawn(parsed.name.clone(), Mat4::IDENTITY, NodeContent::Group);
        let mut model = LoadedModel::new(parsed.name.clone(), path, root);

        match self.populate(&parsed, &mut model, ctx) {
            Ok(()) => {
                ctx.scene.attach(root, None);
                log::info!(
                    "Built model {} ({} meshes, shader {})",
                    model.name(),
                    model.mesh_count(),
                    self.shader
                );
                Ok(model)
            }
            Err(e) => {
                log::warn!("Build of {} failed, rolling back: {}", model.name(), e);
                model.dispose(ctx);
                Err(e)
            }
        }
    }

    fn populate(
        &self,
        parsed: &ParsedModel,
        model: &mut LoadedModel,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BuildError> {
        let mut visits = Vec::with_capacity(parsed.nodes.len());
        parsed.traverse(|index, parent, world| visits.push((index, parent, world)));

        let mut placed: HashMap<usize, NodeId> = HashMap::new();

        for (index, parent, world) in visits {
            let node = &parsed.nodes[index];
            let parent_node = parent
                .and_then(|p| placed.get(&p).copied())
                .unwrap_or(model.root);
            let local = node.transform.compute_matrix();

            let mesh = node.mesh.and_then(|m| parsed.meshes.get(m));
            let scene_node = match mesh {
                Some(mesh) if mesh.is_drawable() => {
                    self.add_mesh(parsed, mesh, local, world, parent_node, model, ctx)?
                }
                _ => {
                    if let Some(mesh) = mesh {
                        log::warn!(
                            "Mesh \"{}\" has no triangles, node \"{}\" is kept as a group",
                            mesh.name,
                            node.name
                        );
                        model.diagnostics.push(BuildDiagnostic::EmptyMesh {
                            mesh: mesh.name.clone(),
                        });
                    }
                    let group = ctx.scene.spawn(node.name.clone(), local, NodeContent::Group);
                    ctx.scene.attach(group, Some(parent_node));
                    group
                }
            };
            placed.insert(index, scene_node);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn add_mesh(
        &self,
        parsed: &ParsedModel,
        mesh: &MeshData,
        local: Mat4,
        world: Mat4,
        parent: NodeId,
        model: &mut LoadedModel,
        ctx: &mut BuildContext<'_>,
    ) -> Result<NodeId, BuildError> {
        if mesh.material_slots.len() > 1 {
            log::warn!(
                "Mesh \"{}\" has {} materials, only the first one is used",
                mesh.name,
                mesh.material_slots.len()
            );
            model.diagnostics.push(BuildDiagnostic::UnexpectedMeshShape {
                mesh: mesh.name.clone(),
                material_count: mesh.material_slots.len(),
            });
        }

        let diffuse = mesh
            .material_slots
            .first()
            .copied()
            .flatten()
            .and_then(|slot| parsed.materials.get(slot))
            .and_then(|material| material.diffuse_texture)
            .and_then(|texture| parsed.textures.get(texture));
        let texture = diffuse.map(|data| ctx.resources.create_texture(data));

        let options = self.params.shader_options(texture.as_ref());
        let program = match ctx.shaders.create(self.shader, &options) {
            Ok(program) => program,
            Err(e) => {
                if let Some(texture) = texture {
                    ctx.resources.dispose_texture(texture);
                }
                return Err(e.into());
            }
        };

        let material = ctx.resources.create_material(program);
        let geometry = ctx
            .resources
            .create_mesh_geometry(&mesh.vertices, &mesh.indices);
        let node = ctx.scene.spawn(
            mesh.name.clone(),
            local,
            NodeContent::Mesh {
                geometry: geometry.id(),
                material: material.id(),
            },
        );
        ctx.scene.attach(node, Some(parent));

        model.meshes.push(MeshRecord {
            name: mesh.name.clone(),
            node,
            geometry,
            texture,
        });
        model.materials.push(material);

        let bounds = mesh.local_bounds().transformed(&world);
        model.bounds = model.bounds.union(bounds);

        let visible = self.params.visible;
        let wireframe = add_overlay(
            ctx,
            format!("{}.wireframe", mesh.name),
            &wireframe_lines(&mesh.vertices, &mesh.indices),
            (self.params.color, self.params.wireframe_opacity),
            Some(node),
            visible.contains(OverlayKinds::WIREFRAME),
        );
        model.overlays.wireframes.push(wireframe);

        // Helpers live at the top level, in world space.
        let normals = add_overlay(
            ctx,
            format!("{}.normals", mesh.name),
            &normal_lines(&mesh.vertices, &world, HELPER_LENGTH),
            (NORMALS_COLOR, 1.0),
            None,
            visible.contains(OverlayKinds::NORMALS),
        );
        model.overlays.normals.push(normals);

        let tangents = add_overlay(
            ctx,
            format!("{}.tangents", mesh.name),
            &tangent_lines(&mesh.vertices, &world, HELPER_LENGTH),
            (TANGENTS_COLOR, 1.0),
            None,
            visible.contains(OverlayKinds::TANGENTS),
        );
        model.overlays.tangents.push(tangents);

        let bounding_box = add_overlay(
            ctx,
            format!("{}.bounds", mesh.name),
            &box_lines(&bounds),
            (BOUNDS_COLOR, 1.0),
            None,
            visible.contains(OverlayKinds::BOUNDING_BOX),
        );
        model.overlays.bounding_boxes.push(bounding_box);

        Ok(node)
    }
}

fn add_overlay(
    ctx: &mut BuildContext<'_>,
    name: String,
    points: &[glam::Vec3],
    (color, opacity): (Rgb, f32),
    parent: Option<NodeId>,
    visible: bool,
) -> Overlay {
    let geometry = ctx.resources.create_line_geometry(points);
    let material = ctx.resources.create_line_material(color, opacity);
    let node = ctx.scene.spawn(
        name,
        Mat4::IDENTITY,
        NodeContent::Lines {
            geometry: geometry.id(),
            material: material.id(),
        },
    );
    ctx.scene.attach(node, parent);
    ctx.scene.set_visible(node, visible);

    Overlay {
        node,
        geometry,
        material,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use prism_core::{Rgb, ShaderKind};
    use prism_renderer::{
        GpuResources, OverlayKinds, ResourceKind, ShaderCatalog, ShaderUniforms, Topology,
    };

    use super::ModelBuilder;
    use crate::{
        error::BuildError,
        model::{BuildContext, BuildDiagnostic, BuildParams},
        scene::Scene,
        testing::two_mesh_model,
    };

    #[test]
    fn one_material_and_four_overlays_per_mesh() {
        let mut scene = Scene::default();
        let mut resources = GpuResources::headless();
        let shaders = ShaderCatalog::builtin();
        let mut ctx = BuildContext {
            scene: &mut scene,
            resources: &mut resources,
            shaders: &shaders,
        };

        let params = BuildParams::default();
        let model = ModelBuilder::new(ShaderKind::Phong, &params)
            .build(two_mesh_model(), PathBuf::from("two.gltf"), &mut ctx)
            .unwrap();

        assert_eq!(model.mesh_count(), 2);
        assert!(model.is_consistent());
        assert_eq!(
            model.diagnostics(),
            &[BuildDiagnostic::UnexpectedMeshShape {
                mesh: "Second".into(),
                material_count: 2
            }]
        );

        let stats = resources.stats();
        assert_eq!(stats.live(ResourceKind::Geometry), 10);
        assert_eq!(stats.live(ResourceKind::Material), 10);
        assert_eq!(stats.live(ResourceKind::Texture), 1);

        // First mesh is textured, the second one's first slot is not.
        let maps: Vec<_> = model
            .materials()
            .iter()
            .map(|m| m.program().uniforms.map().is_some())
            .collect();
        assert_eq!(maps, [true, false]);
        assert!(matches!(
            model.materials()[0].program().uniforms,
            ShaderUniforms::Phong { shininess, .. } if shininess == 30.0
        ));
    }

    #[test]
    fn wireframe_follows_mesh_and_helpers_are_roots() {
        let mut scene = Scene::default();
        let mut resources = GpuResources::headless();
        let shaders = ShaderCatalog::builtin();
        let mut ctx = BuildContext {
            scene: &mut scene,
            resources: &mut resources,
            shaders: &shaders,
        };

        let params = BuildParams {
            visible: OverlayKinds::WIREFRAME,
            ..Default::default()
        };
        let model = ModelBuilder::new(ShaderKind::Normal, &params)
            .build(two_mesh_model(), PathBuf::from("two.gltf"), &mut ctx)
            .unwrap();

        let mesh_node = model.meshes()[0].node;
        let wireframe = &model.overlays().wireframes[0];
        assert_eq!(scene.get(wireframe.node).unwrap().parent(), Some(mesh_node));
        assert!(scene.get(wireframe.node).unwrap().visible);

        let normals = &model.overlays().normals[0];
        assert_eq!(scene.get(normals.node).unwrap().parent(), None);
        assert!(!scene.get(normals.node).unwrap().visible);
        assert!(scene.roots().contains(&model.root()));
    }

    #[test]
    fn bounds_cover_all_meshes_in_world_space() {
        let mut scene = Scene::default();
        let mut resources = GpuResources::headless();
        let shaders = ShaderCatalog::builtin();
        let mut ctx = BuildContext {
            scene: &mut scene,
            resources: &mut resources,
            shaders: &shaders,
        };

        let params = BuildParams::default();
        let model = ModelBuilder::new(ShaderKind::Toon, &params)
            .build(two_mesh_model(), PathBuf::from("two.gltf"), &mut ctx)
            .unwrap();

        // Quads of size 1 at x = -1 and x = +1
        let bounds = model.bounds();
        assert!((bounds.min.x + 1.5).abs() < 1e-6);
        assert!((bounds.max.x - 1.5).abs() < 1e-6);
    }

    #[test]
    fn meshes_without_triangles_become_groups() {
        let mut scene = Scene::default();
        let mut resources = GpuResources::headless();
        let shaders = ShaderCatalog::builtin();
        let mut ctx = BuildContext {
            scene: &mut scene,
            resources: &mut resources,
            shaders: &shaders,
        };

        let mut parsed = two_mesh_model();
        // Points-only: the parser keeps the mesh but no vertices.
        parsed.meshes[0].vertices.clear();
        parsed.meshes[0].indices.clear();
        parsed.meshes[0].material_slots.clear();
        // The second triangle points past the four vertices.
        parsed.meshes[1].indices = vec![0, 1, 2, 0, 2, 7];

        let params = BuildParams::default();
        let model = ModelBuilder::new(ShaderKind::Phong, &params)
            .build(parsed, PathBuf::from("degenerate.gltf"), &mut ctx)
            .unwrap();

        assert_eq!(model.mesh_count(), 1);
        assert!(model.is_consistent());
        assert!(model.diagnostics().contains(&BuildDiagnostic::EmptyMesh {
            mesh: "First".into()
        }));
        assert_eq!(resources.stats().live(ResourceKind::Geometry), 5);
        assert_eq!(resources.stats().live(ResourceKind::Texture), 0);

        // Root, the "Root" group, the emptied "First" group, then "Second" and
        // its wireframe, plus three helpers at the top level.
        assert_eq!(scene.len(), 5 + 3);
        let items = scene.draw_list();
        assert_eq!(items.len(), 5);
        assert_eq!(
            items
                .iter()
                .filter(|item| item.topology == Topology::Triangles)
                .count(),
            1
        );
    }

    #[test]
    fn failed_build_leaves_nothing_behind() {
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

        let params = BuildParams {
            color: Rgb::BLUE,
            ..Default::default()
        };
        let err = ModelBuilder::new(ShaderKind::Silhouette, &params)
            .build(two_mesh_model(), PathBuf::from("two.gltf"), &mut ctx)
            .unwrap_err();

        assert!(matches!(err, BuildError::Shader(_)));
        assert!(scene.is_empty());
        let stats = resources.stats();
        assert_eq!(stats.total_live(), 0);
        // The texture was uploaded before the material failed.
        assert_eq!(stats.created(ResourceKind::Texture), 1);
        assert_eq!(stats.disposed(ResourceKind::Texture), 1);
    }
}
