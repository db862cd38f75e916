//! Raw triangle geometry as it comes out of a model file.
//!
//! A `RawMesh` is a vertex table plus face index triples in object space. It
//! carries no material or placement; the renderer bakes it into world-space
//! triangles once it knows both.

use std::io::BufRead;
use std::path::Path;

use raytile_math::{Aabb, Vec3};
use thiserror::Error;

/// Errors that can occur while loading or validating mesh geometry.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Failed to load OBJ {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("Face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("{path} contains no faces")]
    Empty { path: String },

    #[error("Placement with scale {scale:?} collapses the mesh")]
    DegeneratePlacement { scale: Vec3 },
}

/// Object-space vertex positions and triangle faces.
#[derive(Clone, Debug, Default)]
pub struct RawMesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangle faces as indices into `positions`
    pub faces: Vec<[u32; 3]>,
}

impl RawMesh {
    /// Create a mesh, checking every face index against the vertex table.
    pub fn new(positions: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        let mesh = Self { positions, faces };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Load every model of an OBJ file into one mesh.
    ///
    /// Polygons are triangulated; normals, texture coordinates and materials
    /// in the file are ignored.
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Self, MeshError> {
        let path = path.as_ref();
        let (models, _materials) =
            tobj::load_obj(path, &load_options()).map_err(|source| MeshError::Load {
                path: path.display().to_string(),
                source,
            })?;

        let mesh = Self::from_models(&models, &path.display().to_string())?;
        log::info!(
            "Loaded {}: {} vertices, {} triangles from {} model(s)",
            path.display(),
            mesh.vertex_count(),
            mesh.triangle_count(),
            models.len()
        );
        Ok(mesh)
    }

    /// Parse OBJ text from a reader. Material libraries are not resolved.
    pub fn from_obj_reader<R: BufRead>(reader: &mut R) -> Result<Self, MeshError> {
        let (models, _materials) =
            tobj::load_obj_buf(reader, &load_options(), |_| Err(tobj::LoadError::OpenFileFailed))
                .map_err(|source| MeshError::Load {
                    path: "<buffer>".to_string(),
                    source,
                })?;
        Self::from_models(&models, "<buffer>")
    }

    fn from_models(models: &[tobj::Model], path: &str) -> Result<Self, MeshError> {
        let mut positions = Vec::new();
        let mut faces = Vec::new();

        for model in models {
            let base = positions.len() as u32;
            positions.extend(
                model
                    .mesh
                    .positions
                    .chunks_exact(3)
                    .map(|p| Vec3::new(p[0], p[1], p[2])),
            );
            faces.extend(
                model
                    .mesh
                    .indices
                    .chunks_exact(3)
                    .map(|f| [base + f[0], base + f[1], base + f[2]]),
            );
        }

        if faces.is_empty() {
            return Err(MeshError::Empty {
                path: path.to_string(),
            });
        }

        Self::new(positions, faces)
    }

    /// Check that every face index resolves against the vertex table.
    pub fn validate(&self) -> Result<(), MeshError> {
        for (face, indices) in self.faces.iter().enumerate() {
            if let Some(&index) = indices
                .iter()
                .find(|&&i| i as usize >= self.positions.len())
            {
                return Err(MeshError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count: self.positions.len(),
                });
            }
        }
        Ok(())
    }

    /// The three object-space vertices of face `face`, or an error when one of
    /// its indices is outside the vertex table.
    pub fn triangle(&self, face: usize) -> Result<[Vec3; 3], MeshError> {
        let indices = self.faces[face];
        let mut vertices = [Vec3::ZERO; 3];
        for (vertex, &index) in vertices.iter_mut().zip(&indices) {
            *vertex = *self
                .positions
                .get(index as usize)
                .ok_or(MeshError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count: self.positions.len(),
                })?;
        }
        Ok(vertices)
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Object-space bounds of the vertex table.
    pub fn bounds(&self) -> Aabb {
        Aabb::enclosing(self.positions.iter().copied())
    }
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    }
}
