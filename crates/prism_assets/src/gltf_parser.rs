use std::path::Path;

use glam::Quat;
use gltf::{image::Format, mesh::Mode};
use prism_core::transform::Transform;

use crate::{
    error::AssetLoadError,
    model::{
        MaterialData, MeshData, ParsedModel, ParsedNode, TextureData, TextureFormat, Vertex,
        valid_triangles,
    },
    tangents::generate_normals,
};

/// Decodes a `.gltf`/`.glb` file (external buffers resolved relative to it).
/// Blocking: call it from a worker.
pub fn parse_gltf(path: &Path) -> Result<ParsedModel, AssetLoadError> {
    let display = path.display().to_string();
    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetLoadError::Gltf {
        path: display.clone(),
        source,
    })?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or(display);
    convert(name, &document, &buffers, images)
}

/// Same as [`parse_gltf`] for data already in memory. Only embedded
/// (data URI or GLB) buffers can be resolved.
pub fn parse_gltf_slice(name: &str, bytes: &[u8]) -> Result<ParsedModel, AssetLoadError> {
    let (document, buffers, images) =
        gltf::import_slice(bytes).map_err(|source| AssetLoadError::Gltf {
            path: name.to_owned(),
            source,
        })?;
    convert(name.to_owned(), &document, &buffers, images)
}

fn convert(
    name: String,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: Vec<gltf::image::Data>,
) -> Result<ParsedModel, AssetLoadError> {
    // --- TEXTURES ---
    let mut textures: Vec<Option<TextureData>> = document
        .images()
        .zip(images)
        .map(|(image, data)| {
            let label = image.name().unwrap_or("glTF Image");
            to_rgba8(label, data)
        })
        .collect();

    // --- MATERIALS ---
    let mut materials = Vec::new();
    for material in document.materials() {
        let pbr = material.pbr_metallic_roughness();

        let diffuse_texture = pbr.base_color_texture().and_then(|info| {
            let index = info.texture().source().index();
            let texture = textures.get_mut(index)?.as_mut()?;
            texture.format = TextureFormat::Rgba8UnormSrgb;
            Some(index)
        });
        let normal_texture = material.normal_texture().and_then(|info| {
            let index = info.texture().source().index();
            textures.get(index)?.as_ref().map(|_| index)
        });

        materials.push(MaterialData {
            name: material.name().unwrap_or("Material").to_owned(),
            base_color: pbr.base_color_factor(),
            diffuse_texture,
            normal_texture,
        });
    }

    // --- MESHES ---
    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        meshes.push(read_mesh(&mesh, buffers)?);
    }

    // --- NODES ---
    let nodes = document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            ParsedNode {
                name: node.name().unwrap_or("Node").to_owned(),
                transform: Transform {
                    translation: t.into(),
                    rotation: Quat::from_array(r),
                    scale: s.into(),
                },
                mesh: node.mesh().map(|m| m.index()),
                children: node.children().map(|c| c.index()).collect(),
            }
        })
        .collect();

    let roots = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => Vec::new(),
    };

    // Textures that failed conversion keep their slot so indices stay valid.
    let textures = textures
        .into_iter()
        .enumerate()
        .map(|(i, texture)| {
            texture.unwrap_or_else(|| TextureData {
                name: format!("missing-{i}"),
                pixels: vec![255; 4],
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Unorm,
            })
        })
        .collect();

    log::debug!(
        "Parsed glTF {}: {} nodes, {} meshes, {} materials",
        name,
        document.nodes().len(),
        document.meshes().len(),
        document.materials().len()
    );

    Ok(ParsedModel {
        name,
        nodes,
        roots,
        meshes,
        materials,
        textures,
    })
}

/// Merges every triangle primitive of a glTF mesh into one vertex/index
/// buffer, keeping one material slot per primitive.
fn read_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Result<MeshData, AssetLoadError> {
    let mesh_name = mesh
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("Mesh {}", mesh.index()));

    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut material_slots = Vec::new();
    let mut has_tangents = true;

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            log::warn!(
                "Skipping {:?} primitive {} of mesh \"{}\"",
                primitive.mode(),
                primitive.index(),
                mesh_name
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()].0[..]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .map(|iter| iter.collect())
            .ok_or_else(|| AssetLoadError::MissingAttribute {
                mesh: mesh_name.clone(),
                attribute: "POSITION",
            })?;
        let count = positions.len();

        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|read| read.into_f32().collect())
            .unwrap_or_else(|| vec![[0.0, 0.0]; count]);
        let tangents: Option<Vec<[f32; 4]>> = reader.read_tangents().map(|iter| iter.collect());

        let raw_indices: Vec<u32> = reader
            .read_indices()
            .map(|read| read.into_u32().collect())
            .unwrap_or_else(|| (0..count as u32).collect());
        let local_indices = valid_triangles(&raw_indices, count);
        if local_indices.len() / 3 < raw_indices.len() / 3 {
            log::warn!(
                "Dropped {} triangles of mesh \"{}\" that index past its {} vertices",
                raw_indices.len() / 3 - local_indices.len() / 3,
                mesh_name,
                count
            );
        }

        let mut primitive_vertices: Vec<Vertex> = (0..count)
            .map(|i| {
                let normal = normals.as_ref().and_then(|n| n.get(i)).copied().unwrap_or([0.0; 3]);
                let uv = uvs.get(i).copied().unwrap_or([0.0, 0.0]);
                let mut vertex = Vertex::new(positions[i], normal, uv);
                if let Some(tangent) = tangents.as_ref().and_then(|t| t.get(i)) {
                    vertex.tangent = *tangent;
                }
                vertex
            })
            .collect();

        if normals.is_none() {
            generate_normals(&mut primitive_vertices, &local_indices);
        }
        has_tangents &= tangents.is_some();

        let base = vertices.len() as u32;
        indices.extend(local_indices.into_iter().map(|i| i + base));
        vertices.append(&mut primitive_vertices);
        material_slots.push(primitive.material().index());
    }

    if material_slots.is_empty() {
        has_tangents = false;
    }

    Ok(MeshData {
        name: mesh_name,
        vertices,
        indices,
        material_slots,
        has_tangents,
    })
}

/// Normalizes decoded glTF image data to tightly packed RGBA8.
fn to_rgba8(label: &str, data: gltf::image::Data) -> Option<TextureData> {
    let gltf::image::Data {
        pixels,
        format,
        width,
        height,
    } = data;

    let image = match format {
        Format::R8G8B8A8 => image::RgbaImage::from_raw(width, height, pixels),
        Format::R8G8B8 => image::RgbImage::from_raw(width, height, pixels)
            .map(|img| image::DynamicImage::ImageRgb8(img).to_rgba8()),
        Format::R8G8 => image::GrayAlphaImage::from_raw(width, height, pixels)
            .map(|img| image::DynamicImage::ImageLumaA8(img).to_rgba8()),
        Format::R8 => image::GrayImage::from_raw(width, height, pixels)
            .map(|img| image::DynamicImage::ImageLuma8(img).to_rgba8()),
        other => {
            log::warn!("Unsupported texture format {:?} for \"{}\"", other, label);
            return None;
        }
    };

    let Some(image) = image else {
        log::warn!("Texture \"{}\" has a truncated pixel buffer", label);
        return None;
    };

    Some(TextureData {
        name: label.to_owned(),
        width: image.width(),
        height: image.height(),
        pixels: image.into_raw(),
        format: TextureFormat::Rgba8Unorm,
    })
}
