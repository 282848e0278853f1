use std::collections::HashMap;

use prism_core::{Rgb, ShaderKind, UnknownShader};

use crate::resources::ResourceId;

pub const NORMAL_WGSL: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/normal.wgsl")
);
pub const SILHOUETTE_WGSL: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/silhouette.wgsl")
);
pub const TOON_WGSL: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/toon.wgsl")
);
pub const PHONG_WGSL: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/phong.wgsl")
);
pub const LINES_WGSL: &str = include_str!("shaders/lines.wgsl");

pub const DEFAULT_SHININESS: f32 = 30.0;

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error(transparent)]
    Unknown(#[from] UnknownShader),
}

/// Inputs every shader builder understands. Builders ignore what they do not use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaderOptions {
    pub base_color: Rgb,
    pub shininess: f32,
    pub texture: Option<ResourceId>,
}

impl Default for ShaderOptions {
    fn default() -> Self {
        Self {
            base_color: Rgb::WHITE,
            shininess: DEFAULT_SHININESS,
            texture: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShaderUniforms {
    Normal,
    Silhouette {
        color: Rgb,
    },
    Toon {
        color: Rgb,
    },
    Phong {
        diffuse: Rgb,
        shininess: f32,
        map: Option<ResourceId>,
    },
}

impl ShaderUniforms {
    pub fn names(&self) -> Vec<&'static str> {
        match self {
            ShaderUniforms::Normal => Vec::new(),
            ShaderUniforms::Silhouette { .. } | ShaderUniforms::Toon { .. } => vec!["color"],
            ShaderUniforms::Phong { map, .. } => {
                let mut names = vec!["diffuse", "shininess"];
                if map.is_some() {
                    names.push("map");
                }
                names
            }
        }
    }

    pub fn color(&self) -> Option<Rgb> {
        match *self {
            ShaderUniforms::Normal => None,
            ShaderUniforms::Silhouette { color } | ShaderUniforms::Toon { color } => Some(color),
            ShaderUniforms::Phong { diffuse, .. } => Some(diffuse),
        }
    }

    pub fn shininess(&self) -> Option<f32> {
        match *self {
            ShaderUniforms::Phong { shininess, .. } => Some(shininess),
            _ => None,
        }
    }

    pub fn map(&self) -> Option<ResourceId> {
        match *self {
            ShaderUniforms::Phong { map, .. } => map,
            _ => None,
        }
    }

    pub fn set_color(&mut self, value: Rgb) {
        match self {
            ShaderUniforms::Normal => {}
            ShaderUniforms::Silhouette { color } | ShaderUniforms::Toon { color } => *color = value,
            ShaderUniforms::Phong { diffuse, .. } => *diffuse = value,
        }
    }

    pub fn set_shininess(&mut self, value: f32) {
        if let ShaderUniforms::Phong { shininess, .. } = self {
            *shininess = value;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShaderFeatures {
    pub use_map: bool,
    pub use_uv: bool,
}

/// CPU description of a shader, ready to be uploaded as a material.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderProgram {
    pub kind: ShaderKind,
    pub source: &'static str,
    pub uniforms: ShaderUniforms,
    pub features: ShaderFeatures,
}

pub type ShaderBuilder = fn(&ShaderOptions) -> ShaderProgram;

/// Maps shader kinds to program builders.
#[derive(Clone, Default)]
pub struct ShaderCatalog {
    builders: HashMap<ShaderKind, ShaderBuilder>,
}

impl ShaderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(ShaderKind::Normal, normal_program);
        catalog.register(ShaderKind::Silhouette, silhouette_program);
        catalog.register(ShaderKind::Toon, toon_program);
        catalog.register(ShaderKind::Phong, phong_program);
        catalog
    }

    /// Later registrations replace earlier ones.
    pub fn register(&mut self, kind: ShaderKind, builder: ShaderBuilder) {
        if self.builders.insert(kind, builder).is_some() {
            log::debug!("Shader {} re-registered", kind);
        }
    }

    pub fn contains(&self, kind: ShaderKind) -> bool {
        self.builders.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<ShaderKind> {
        let mut kinds: Vec<_> = self.builders.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn create(&self, kind: ShaderKind, options: &ShaderOptions) -> Result<ShaderProgram, ShaderError> {
        let builder = self
            .builders
            .get(&kind)
            .ok_or_else(|| UnknownShader(kind.name().to_owned()))?;
        Ok(builder(options))
    }

    pub fn create_named(&self, name: &str, options: &ShaderOptions) -> Result<ShaderProgram, ShaderError> {
        let kind: ShaderKind = name.parse()?;
        self.create(kind, options)
    }
}

fn normal_program(_options: &ShaderOptions) -> ShaderProgram {
    ShaderProgram {
        kind: ShaderKind::Normal,
        source: NORMAL_WGSL,
        uniforms: ShaderUniforms::Normal,
        features: ShaderFeatures::default(),
    }
}

fn silhouette_program(options: &ShaderOptions) -> ShaderProgram {
    ShaderProgram {
        kind: ShaderKind::Silhouette,
        source: SILHOUETTE_WGSL,
        uniforms: ShaderUniforms::Silhouette {
            color: options.base_color,
        },
        features: ShaderFeatures::default(),
    }
}

fn toon_program(options: &ShaderOptions) -> ShaderProgram {
    ShaderProgram {
        kind: ShaderKind::Toon,
        source: TOON_WGSL,
        uniforms: ShaderUniforms::Toon {
            color: options.base_color,
        },
        features: ShaderFeatures::default(),
    }
}

fn phong_program(options: &ShaderOptions) -> ShaderProgram {
    let textured = options.texture.is_some();
    ShaderProgram {
        kind: ShaderKind::Phong,
        source: PHONG_WGSL,
        uniforms: ShaderUniforms::Phong {
            diffuse: options.base_color,
            shininess: options.shininess,
            map: options.texture,
        },
        features: ShaderFeatures {
            use_map: textured,
            use_uv: textured,
        },
    }
}

/// Brightness factor of the toon shader for a view/normal cosine.
/// Mirrors `fs_main` in `toon.wgsl`.
pub fn toon_band(intensity: f32) -> f32 {
    if intensity > 0.95 {
        1.0
    } else if intensity > 0.5 {
        0.8
    } else if intensity > 0.25 {
        0.6
    } else {
        0.4
    }
}

#[cfg(test)]
mod tests {
    use prism_core::{Rgb, ShaderKind};

    use super::{ShaderCatalog, ShaderError, ShaderOptions, ShaderUniforms, toon_band};
    use crate::resources::GpuResources;

    #[test]
    fn builtin_uniform_sets() {
        let catalog = ShaderCatalog::builtin();
        let options = ShaderOptions::default();

        let names = |kind| catalog.create(kind, &options).unwrap().uniforms.names();
        assert!(names(ShaderKind::Normal).is_empty());
        assert_eq!(names(ShaderKind::Silhouette), ["color"]);
        assert_eq!(names(ShaderKind::Toon), ["color"]);
        assert_eq!(names(ShaderKind::Phong), ["diffuse", "shininess"]);
    }

    #[test]
    fn phong_with_texture_samples_it() {
        let mut resources = GpuResources::headless();
        let texture = resources.create_texture(&prism_assets::TextureData {
            name: "t".into(),
            pixels: vec![0; 4],
            width: 1,
            height: 1,
            format: prism_assets::TextureFormat::Rgba8UnormSrgb,
        });

        let program = ShaderCatalog::builtin()
            .create(
                ShaderKind::Phong,
                &ShaderOptions {
                    base_color: Rgb::BLUE,
                    shininess: 64.0,
                    texture: Some(texture.id()),
                },
            )
            .unwrap();

        assert_eq!(program.uniforms.names(), ["diffuse", "shininess", "map"]);
        assert_eq!(program.uniforms.map(), Some(texture.id()));
        assert!(program.features.use_map && program.features.use_uv);
        assert!(program.source.contains("fn fs_main"));
        assert!(program.source.contains("fn vs_main"));
    }

    #[test]
    fn empty_catalog_rejects_everything() {
        let catalog = ShaderCatalog::new();
        let err = catalog
            .create(ShaderKind::Toon, &ShaderOptions::default())
            .unwrap_err();
        assert!(matches!(err, ShaderError::Unknown(_)));
        assert_eq!(err.to_string(), "shader \"Toon\" not registered");
    }

    #[test]
    fn unknown_names_are_rejected() {
        let catalog = ShaderCatalog::builtin();
        assert!(catalog.create_named("Gooch", &ShaderOptions::default()).is_err());
        assert!(catalog.create_named("Toon", &ShaderOptions::default()).is_ok());
    }

    #[test]
    fn registration_overwrites() {
        let mut catalog = ShaderCatalog::builtin();
        catalog.register(ShaderKind::Toon, |options| {
            let mut program = ShaderCatalog::builtin()
                .create(ShaderKind::Silhouette, options)
                .unwrap();
            program.kind = ShaderKind::Toon;
            program
        });

        let program = catalog.create(ShaderKind::Toon, &ShaderOptions::default()).unwrap();
        assert!(matches!(program.uniforms, ShaderUniforms::Silhouette { .. }));
        assert_eq!(catalog.kinds(), ShaderKind::ALL);
    }

    #[test]
    fn cosmetic_setters_ignore_missing_uniforms() {
        let mut normal = ShaderUniforms::Normal;
        normal.set_color(Rgb::BLUE);
        normal.set_shininess(5.0);
        assert_eq!(normal, ShaderUniforms::Normal);

        let mut toon = ShaderUniforms::Toon { color: Rgb::WHITE };
        toon.set_shininess(5.0);
        toon.set_color(Rgb::GREEN);
        assert_eq!(toon, ShaderUniforms::Toon { color: Rgb::GREEN });
    }

    #[test]
    fn toon_bands() {
        assert_eq!(toon_band(0.97), 1.0);
        assert_eq!(toon_band(0.6), 0.8);
        assert_eq!(toon_band(0.3), 0.6);
        assert_eq!(toon_band(0.1), 0.4);
    }
}
