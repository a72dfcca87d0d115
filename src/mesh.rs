use std::mem::offset_of;

use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, Mesh, PrimitiveTopology},
};
use bytemuck::{Pod, Zeroable};

use crate::types::{Point, Vector};

/// Vertex layout of the uploaded buffer: position then normal, both `3 × f32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub fn new(position: &Point, normal: &Vector) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            normal: [normal.x, normal.y, normal.z],
        }
    }

    pub fn position(&self) -> Point {
        Point::from(self.position)
    }

    pub fn normal(&self) -> Vector {
        Vector::from(self.normal)
    }
}

/// Format of one vertex attribute in [`VERTEX_LAYOUT`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeFormat {
    Float32x3,
}

/// One attribute of the vertex buffer: its name, byte offset and format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub offset: usize,
    pub format: AttributeFormat,
}

/// Per-vertex attributes of [`MeshVertex`], for consumers uploading [`IsoMesh::vertex_bytes`].
pub const VERTEX_LAYOUT: [VertexAttribute; 2] = [
    VertexAttribute {
        name: "position",
        offset: offset_of!(MeshVertex, position),
        format: AttributeFormat::Float32x3,
    },
    VertexAttribute {
        name: "normal",
        offset: offset_of!(MeshVertex, normal),
        format: AttributeFormat::Float32x3,
    },
];

/// Triangle mesh produced by an extraction.
///
/// Every group of three consecutive `indices` forms one triangle, wound
/// counter-clockwise when seen from outside the surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IsoMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl IsoMesh {
    /// Creates an empty mesh with no vertices or triangles.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Appends a vertex and returns its index.
    pub fn push_vertex(&mut self, position: &Point, normal: &Vector) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(MeshVertex::new(position, normal));
        index
    }

    /// Adds a triangle defined by three vertex indices.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        debug_assert!((a.max(b).max(c) as usize) < self.vertices.len());
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Moves `other` onto the end of this mesh, rebasing its indices.
    pub fn append(&mut self, mut other: IsoMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.append(&mut other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    /// True when the extraction found no surface.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the three vertex positions of triangle `tri`.
    pub fn tri_coords(&self, tri: usize) -> [Point; 3] {
        let i = &self.indices[tri * 3..tri * 3 + 3];
        [0, 1, 2].map(|k| self.vertices[i[k] as usize].position())
    }

    /// Computes the unit face normal for triangle `tri`.
    ///
    /// Returns the zero vector if the triangle is degenerate.
    pub fn tri_normal(&self, tri: usize) -> Vector {
        let [a, b, c] = self.tri_coords(tri);
        let cross = (b - a).cross(&(c - a));

        let nrm = cross.norm();
        if nrm == 0.0 {
            Vector::zeros()
        } else {
            cross / nrm
        }
    }

    /// The vertex buffer exactly as laid out in memory.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The 32-bit index buffer exactly as laid out in memory.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Builds a Bevy triangle-list mesh with position and normal attributes.
    pub fn to_bevy_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.vertices.iter().map(|v| v.position).collect();
        let normals: Vec<[f32; 3]> = self.vertices.iter().map(|v| v.normal).collect();

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}
