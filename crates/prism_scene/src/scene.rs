use flecs_ecs::prelude::*;
use glam::{Mat4, Vec3};
use prism_core::{ParameterState, Rgb};
use prism_renderer::{DrawItem, ResourceId, Topology};

/// A scene node, backed by a flecs entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(Entity);

/// What a node draws. Nodes only reference GPU resources, they never own them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeContent {
    Group,
    Mesh {
        geometry: ResourceId,
        material: ResourceId,
    },
    Lines {
        geometry: ResourceId,
        material: ResourceId,
    },
}

/// Snapshot of one node's components and links.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    /// Local transform, relative to the parent.
    pub transform: Mat4,
    pub visible: bool,
    pub content: NodeContent,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Background and lights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneEnvironment {
    pub background: Rgb,
    pub ambient_color: Rgb,
    pub ambient_intensity: f32,
    pub sun_color: Rgb,
    pub sun_intensity: f32,
    pub sun_position: Vec3,
}

impl SceneEnvironment {
    pub const SUN_POSITION: Vec3 = Vec3::new(-69.0, 44.0, 14.0);

    pub fn from_params(state: &ParameterState) -> Self {
        Self {
            background: state.background_color,
            ambient_color: state.ambient_light_color,
            ambient_intensity: state.ambient_light_intensity,
            sun_color: state.sun_light_color,
            sun_intensity: state.sun_light_intensity,
            sun_position: Self::SUN_POSITION,
        }
    }

    pub fn sync(&mut self, state: &ParameterState) {
        *self = Self {
            sun_position: self.sun_position,
            ..Self::from_params(state)
        };
    }

    pub fn sun_direction(&self) -> Vec3 {
        self.sun_position.normalize_or_zero()
    }
}

impl Default for SceneEnvironment {
    fn default() -> Self {
        Self::from_params(&ParameterState::default())
    }
}

#[derive(Component, Clone, Debug)]
struct NodeName(String);

#[derive(Component, Clone, Copy, Debug)]
struct LocalTransform(Mat4);

#[derive(Component, Clone, Copy, Debug)]
struct Visible(bool);

#[derive(Component, Clone, Copy, Debug)]
struct Content(NodeContent);

/// Resolved from the hierarchy on every [`Scene::draw_list`].
#[derive(Component, Clone, Copy, Debug)]
struct WorldState {
    matrix: Mat4,
    visible: bool,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            visible: false,
        }
    }
}

/// Marks a top-level node that is part of the drawn scene.
#[derive(Component)]
struct Attached;

type PropagateTerms = (
    &'static LocalTransform,
    &'static Visible,
    Option<&'static WorldState>,
    &'static mut WorldState,
);

/// Scene graph on a flecs world. Nodes are entities, the hierarchy is `ChildOf`.
///
/// Spawned nodes are detached until [`Scene::attach`] places them; only
/// top-level attached nodes and their descendants are drawn.
pub struct Scene {
    // Queries are declared before the world so they are dropped first.
    propagate: Query<PropagateTerms>,
    nodes: Query<(&'static WorldState, &'static Content)>,
    world: World,
    pub environment: SceneEnvironment,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneEnvironment::default())
    }
}

impl Scene {
    pub fn new(environment: SceneEnvironment) -> Self {
        let world = World::new();

        // Parents are visited before their children.
        let propagate = world
            .query::<PropagateTerms>()
            .term_at(2)
            .parent()
            .cascade()
            .set_cached()
            .build();
        let nodes = world
            .query::<(&WorldState, &Content)>()
            .set_cached()
            .build();

        Self {
            propagate,
            nodes,
            world,
            environment,
        }
    }

    fn entity(&self, id: NodeId) -> Option<EntityView<'_>> {
        let entity = self.world.entity_from_id(id.0);
        entity.is_alive().then_some(entity)
    }

    pub fn spawn(&mut self, name: impl Into<String>, transform: Mat4, content: NodeContent) -> NodeId {
        let entity = self
            .world
            .entity()
            .set(NodeName(name.into()))
            .set(LocalTransform(transform))
            .set(Visible(true))
            .set(Content(content))
            .set(WorldState::default());
        NodeId(entity.id())
    }

    /// Places `child` under `parent`, or at the top level when `parent` is `None`.
    /// Returns false if either node is unknown or the move would form a cycle.
    pub fn attach(&mut self, child: NodeId, parent: Option<NodeId>) -> bool {
        let Some(entity) = self.entity(child) else {
            return false;
        };

        match parent {
            Some(parent) => {
                let Some(parent_entity) = self.entity(parent) else {
                    return false;
                };
                if parent == child || is_ancestor(child, parent_entity) {
                    return false;
                }
                entity.remove(Attached::id());
                entity.child_of(parent_entity);
            }
            None => {
                if let Some(old) = entity.parent() {
                    entity.remove((flecs::ChildOf, old));
                }
                entity.add(Attached::id());
            }
        }
        true
    }

    /// Removes a node and its whole subtree. Returns how many nodes went away;
    /// removing an unknown node is a no-op.
    pub fn remove(&mut self, id: NodeId) -> usize {
        let Some(entity) = self.entity(id) else {
            return 0;
        };
        let removed = subtree_len(entity);
        // ChildOf cleanup deletes the children with it.
        entity.destruct();
        removed
    }

    pub fn get(&self, id: NodeId) -> Option<SceneNode> {
        let entity = self.entity(id)?;
        let mut node = entity.try_get::<(&NodeName, &LocalTransform, &Visible, &Content)>(
            |(name, transform, visible, content)| SceneNode {
                name: name.0.clone(),
                transform: transform.0,
                visible: visible.0,
                content: content.0,
                parent: None,
                children: Vec::new(),
            },
        )?;
        node.parent = entity.parent().map(|parent| NodeId(parent.id()));
        entity.each_child(|child| node.children.push(NodeId(child.id())));
        Some(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entity(id).is_some()
    }

    pub fn len(&self) -> usize {
        let mut len = 0;
        self.nodes.each(|_| len += 1);
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attached top-level nodes.
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots = Vec::new();
        self.nodes.each_entity(|entity, _| {
            if entity.has(Attached::id()) {
                roots.push(NodeId(entity.id()));
            }
        });
        roots
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(entity) = self.entity(id) {
            entity.set(Visible(visible));
        }
    }

    /// Re-points a mesh or line node at another material.
    pub fn set_material(&mut self, id: NodeId, new_material: ResourceId) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        entity
            .try_get::<&mut Content>(|content| match &mut content.0 {
                NodeContent::Mesh { material, .. } | NodeContent::Lines { material, .. } => {
                    *material = new_material;
                    true
                }
                NodeContent::Group => false,
            })
            .unwrap_or(false)
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let entity = self.entity(id)?;
        let mut world = entity.try_get::<&LocalTransform>(|local| local.0)?;
        let mut current = entity.parent();
        while let Some(parent) = current {
            world = parent.try_get::<&LocalTransform>(|local| local.0)? * world;
            current = parent.parent();
        }
        Some(world)
    }

    /// Everything visible, triangles before lines. A hidden node hides its subtree.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        self.propagate
            .each_entity(|entity, (local, visible, parent, world)| {
                let (parent_matrix, parent_visible) = match parent {
                    Some(parent) => (parent.matrix, parent.visible),
                    None => (Mat4::IDENTITY, entity.has(Attached::id())),
                };
                world.matrix = parent_matrix * local.0;
                world.visible = parent_visible && visible.0;
            });

        let mut items = Vec::new();
        self.nodes.each(|(world, content)| {
            if !world.visible {
                return;
            }
            let (geometry, material, topology) = match content.0 {
                NodeContent::Group => return,
                NodeContent::Mesh { geometry, material } => {
                    (geometry, material, Topology::Triangles)
                }
                NodeContent::Lines { geometry, material } => (geometry, material, Topology::Lines),
            };
            items.push(DrawItem {
                geometry,
                material,
                world: world.matrix,
                topology,
            });
        });
        // Blended lines go last.
        items.sort_by_key(|item| item.topology == Topology::Lines);
        items
    }
}

fn is_ancestor(candidate: NodeId, node: EntityView<'_>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.id() == candidate.0 {
            return true;
        }
        current = parent.parent();
    }
    false
}

fn subtree_len(entity: EntityView<'_>) -> usize {
    let mut len = 1;
    entity.each_child(|child| len += subtree_len(child));
    len
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};
    use prism_core::ParameterState;
    use prism_renderer::{GpuResources, Topology};

    use super::{NodeContent, Scene, SceneEnvironment};

    fn line_content(resources: &mut GpuResources) -> NodeContent {
        let geometry = resources.create_line_geometry(&[Vec3::ZERO, Vec3::X]);
        let material = resources.create_line_material(prism_core::Rgb::WHITE, 1.0);
        NodeContent::Lines {
            geometry: geometry.id(),
            material: material.id(),
        }
    }

    #[test]
    fn removal_takes_the_subtree() {
        let mut scene = Scene::default();
        let root = scene.spawn("root", Mat4::IDENTITY, NodeContent::Group);
        let child = scene.spawn("child", Mat4::IDENTITY, NodeContent::Group);
        let grandchild = scene.spawn("grandchild", Mat4::IDENTITY, NodeContent::Group);
        assert!(scene.attach(root, None));
        assert!(scene.attach(child, Some(root)));
        assert!(scene.attach(grandchild, Some(child)));

        assert_eq!(scene.remove(child), 2);
        assert_eq!(scene.len(), 1);
        assert!(!scene.contains(grandchild));
        assert!(scene.get(root).unwrap().children().is_empty());
        assert_eq!(scene.remove(child), 0);
    }

    #[test]
    fn draw_list_composes_transforms_and_skips_hidden() {
        let mut resources = GpuResources::headless();
        let lines = line_content(&mut resources);

        let mut scene = Scene::default();
        let root = scene.spawn("root", Mat4::from_translation(Vec3::X), NodeContent::Group);
        let a = scene.spawn("a", Mat4::from_translation(Vec3::Y), lines);
        let b = scene.spawn("b", Mat4::IDENTITY, lines);
        scene.attach(root, None);
        scene.attach(a, Some(root));
        scene.attach(b, None);

        let items = scene.draw_list();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.topology == Topology::Lines));
        let nested = items
            .iter()
            .find(|item| item.world != Mat4::IDENTITY)
            .unwrap();
        assert_eq!(nested.world.w_axis.truncate(), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(scene.world_matrix(a), Some(nested.world));

        scene.set_visible(root, false);
        let items = scene.draw_list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].world, Mat4::IDENTITY);

        // Detached nodes exist but are not drawn.
        let loose = scene.spawn("loose", Mat4::IDENTITY, lines);
        assert!(scene.contains(loose));
        assert_eq!(scene.draw_list().len(), 1);
    }

    #[test]
    fn meshes_are_listed_before_lines() {
        let mut resources = GpuResources::headless();
        let lines = line_content(&mut resources);
        let geometry = resources.create_mesh_geometry(&[], &[]);
        let material = resources.create_line_material(prism_core::Rgb::WHITE, 1.0);
        let mesh = NodeContent::Mesh {
            geometry: geometry.id(),
            material: material.id(),
        };

        let mut scene = Scene::default();
        let first = scene.spawn("lines", Mat4::IDENTITY, lines);
        let second = scene.spawn("mesh", Mat4::IDENTITY, mesh);
        scene.attach(first, None);
        scene.attach(second, None);

        let topologies: Vec<_> = scene.draw_list().iter().map(|item| item.topology).collect();
        assert_eq!(topologies, [Topology::Triangles, Topology::Lines]);
    }

    #[test]
    fn reattach_moves_between_parents() {
        let mut scene = Scene::default();
        let a = scene.spawn("a", Mat4::IDENTITY, NodeContent::Group);
        let b = scene.spawn("b", Mat4::IDENTITY, NodeContent::Group);
        scene.attach(a, None);
        scene.attach(b, None);
        assert!(scene.attach(b, Some(a)));

        assert_eq!(scene.roots(), vec![a]);
        assert_eq!(scene.get(b).unwrap().parent(), Some(a));
        assert_eq!(scene.get(a).unwrap().children(), &[b]);
        assert!(!scene.attach(a, Some(a)));
        assert!(!scene.attach(a, Some(b)));

        assert!(scene.attach(b, None));
        assert_eq!(scene.get(b).unwrap().parent(), None);
        assert_eq!(scene.roots().len(), 2);
    }

    #[test]
    fn material_can_be_repointed() {
        let mut resources = GpuResources::headless();
        let lines = line_content(&mut resources);
        let other = resources.create_line_material(prism_core::Rgb::BLUE, 1.0);

        let mut scene = Scene::default();
        let node = scene.spawn("lines", Mat4::IDENTITY, lines);
        let group = scene.spawn("group", Mat4::IDENTITY, NodeContent::Group);

        assert!(scene.set_material(node, other.id()));
        assert!(matches!(
            scene.get(node).unwrap().content,
            NodeContent::Lines { material, .. } if material == other.id()
        ));
        assert!(!scene.set_material(group, other.id()));
    }

    #[test]
    fn environment_follows_parameters() {
        let mut state = ParameterState::default();
        let mut env = SceneEnvironment::from_params(&state);
        assert_eq!(env.sun_position, SceneEnvironment::SUN_POSITION);

        state.sun_light_intensity = 1.5;
        env.sync(&state);
        assert_eq!(env.sun_intensity, 1.5);
        assert!((env.sun_direction().length() - 1.0).abs() < 1e-6);
    }
}
