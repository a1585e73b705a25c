//! Wavefront OBJ meshes for the built-in kinds.
//!
//! Faces are fan-triangulated by `tobj` and expanded into a non-indexed list
//! of position + uv vertices, the layout the instanced pipeline draws.
//! Normals and material libraries are ignored.

use std::io::{BufReader, Cursor};

use crate::{
    data_structures::mesh::{Mesh, MeshVertex},
    resources::{FetchError, load_binary},
};

#[derive(Debug, thiserror::Error)]
pub enum ObjError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to parse OBJ: {0}")]
    Parse(#[from] tobj::LoadError),
    #[error("OBJ file has no faces")]
    Empty,
}

/// Triangulated vertices of every object in `text`, in face order.
pub fn parse_obj(text: &str) -> Result<Vec<MeshVertex>, ObjError> {
    let mut reader = BufReader::new(Cursor::new(text));
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )?;

    let vertices: Vec<MeshVertex> = models
        .iter()
        .flat_map(|model| {
            let mesh = &model.mesh;
            mesh.indices.iter().map(move |&index| {
                let i = index as usize;
                MeshVertex {
                    position: [
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ],
                    // OBJ puts v = 0 at the bottom, wgpu at the top.
                    tex_coords: [
                        mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                        1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                    ],
                }
            })
        })
        .collect();

    if vertices.is_empty() {
        return Err(ObjError::Empty);
    }
    Ok(vertices)
}

pub async fn load_obj_vertices(url: &str) -> Result<Vec<MeshVertex>, ObjError> {
    let bytes = load_binary(url).await.map_err(|source| ObjError::Fetch {
        url: url.to_string(),
        source,
    })?;
    let vertices = parse_obj(&String::from_utf8_lossy(&bytes))?;
    log::info!("Loaded {} with {} vertices", url, vertices.len());
    Ok(vertices)
}

/// Load `url` into a vertex buffer that can replace a kind's built-in mesh.
pub async fn load_obj_mesh(url: &str, device: &wgpu::Device) -> Result<Mesh, ObjError> {
    let vertices = load_obj_vertices(url).await?;
    Ok(Mesh::new(device, url, &vertices))
}
