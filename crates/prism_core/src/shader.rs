use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The shading models the viewer can put on a model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShaderKind {
    #[default]
    Normal,
    Silhouette,
    Toon,
    Phong,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("shader \"{0}\" not registered")]
pub struct UnknownShader(pub String);

impl ShaderKind {
    pub const ALL: [ShaderKind; 4] = [
        ShaderKind::Normal,
        ShaderKind::Silhouette,
        ShaderKind::Toon,
        ShaderKind::Phong,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShaderKind::Normal => "Normal",
            ShaderKind::Silhouette => "Silhouette",
            ShaderKind::Toon => "Toon",
            ShaderKind::Phong => "Phong",
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShaderKind {
    type Err = UnknownShader;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShaderKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownShader(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ShaderKind, UnknownShader};

    #[test]
    fn parses_display_names() {
        for kind in ShaderKind::ALL {
            assert_eq!(kind.name().parse::<ShaderKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "Cel".parse::<ShaderKind>(),
            Err(UnknownShader("Cel".to_owned()))
        );
    }
}
