//! Fixed-capacity polygon storage
//!
//! Feasible velocity regions are rebuilt for every agent on every tick, so
//! their vertices live in an inline array sized to a proven upper bound
//! instead of a heap allocation.

use glam::Vec2;

use crate::{Error, Result};

/// Polygon vertex list with a compile-time capacity
#[derive(Debug, Clone)]
pub struct PolygonBuffer<const N: usize> {
    vertices: [Vec2; N],
    len: usize,
}

impl<const N: usize> Default for PolygonBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PolygonBuffer<N> {
    /// Maximum number of vertices the buffer can hold
    pub const CAPACITY: usize = N;

    /// Creates an empty buffer
    pub const fn new() -> Self {
        Self {
            vertices: [Vec2::ZERO; N],
            len: 0,
        }
    }

    /// Creates a buffer holding a copy of `vertices`
    pub fn from_slice(vertices: &[Vec2]) -> Result<Self> {
        let mut buffer = Self::new();
        for &v in vertices {
            buffer.push(v)?;
        }
        Ok(buffer)
    }

    /// Appends a vertex, failing once the capacity is reached
    #[inline]
    pub fn push(&mut self, v: Vec2) -> Result<()> {
        if self.len >= N {
            return Err(Error::PolygonCapacity { capacity: N });
        }
        self.vertices[self.len] = v;
        self.len += 1;
        Ok(())
    }

    /// Removes all vertices
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Number of stored vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks whether the buffer holds no vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stored vertices in order
    #[inline]
    pub fn as_slice(&self) -> &[Vec2] {
        &self.vertices[..self.len]
    }

    /// Iterates over the polygon edges as `(start, end)` pairs, closing the loop
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let verts = self.as_slice();
        let n = verts.len();
        (0..n).map(move |i| (verts[i], verts[(i + 1) % n]))
    }
}
