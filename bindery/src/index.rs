use crate::{Error, IndexType, PrimitiveTopology};

/// Trait implemented by types that can serve as indices.
///
/// # Safety
///
/// `TYPE` must match the size of `Self`.
pub unsafe trait VertexIndex: Copy + 'static {
    /// Index type.
    const TYPE: IndexType;

    fn to_u32(self) -> u32;
}

unsafe impl VertexIndex for u16 {
    const TYPE: IndexType = IndexType::U16;

    fn to_u32(self) -> u32 {
        self as u32
    }
}

unsafe impl VertexIndex for u32 {
    const TYPE: IndexType = IndexType::U32;

    fn to_u32(self) -> u32 {
        self
    }
}

/// Checks that a sequence of indices assembles whole primitives of the given topology and only
/// references vertices below `vertex_count`.
///
/// `base_vertex` is added to each index before the bounds check.
pub fn validate_indices(
    indices: impl IntoIterator<Item = u32>,
    topology: PrimitiveTopology,
    base_vertex: i32,
    vertex_count: u32,
) -> Result<u32, Error> {
    let mut count = 0u32;
    for (position, index) in indices.into_iter().enumerate() {
        let vertex = index as i64 + base_vertex as i64;
        if vertex < 0 || vertex >= vertex_count as i64 {
            return Err(Error::IndexOutOfBounds {
                position,
                index: vertex,
                vertex_count,
            });
        }
        count += 1;
    }
    if !topology.is_valid_vertex_count(count) {
        return Err(Error::IndexCountMismatch {
            count,
            topology: format!("{topology:?}"),
        });
    }
    Ok(count)
}

/// An ordered list of indices into a vertex array, validated against the vertex count.
///
/// # Examples
///
/// ```
/// use bindery::{IndexList, PrimitiveTopology};
///
/// let pentagon = IndexList::new(vec![0u16, 1, 4, 1, 2, 4, 2, 3, 4], PrimitiveTopology::TriangleList, 5).unwrap();
/// assert_eq!(pentagon.triangle_count(), 3);
/// assert!(IndexList::new(vec![0u16, 1, 5], PrimitiveTopology::TriangleList, 5).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexList<I = u16> {
    indices: Vec<I>,
    topology: PrimitiveTopology,
    vertex_count: u32,
}

impl<I: VertexIndex> IndexList<I> {
    pub fn new(indices: Vec<I>, topology: PrimitiveTopology, vertex_count: u32) -> Result<IndexList<I>, Error> {
        validate_indices(indices.iter().map(|i| i.to_u32()), topology, 0, vertex_count)?;
        Ok(IndexList {
            indices,
            topology,
            vertex_count,
        })
    }

    pub fn indices(&self) -> &[I] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Number of vertices the indices were validated against.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn primitive_count(&self) -> u32 {
        self.topology.primitive_count(self.indices.len() as u32)
    }

    /// Number of triangles, or 0 if the topology doesn't assemble triangles.
    pub fn triangle_count(&self) -> u32 {
        match self.topology {
            PrimitiveTopology::TriangleList | PrimitiveTopology::TriangleStrip => self.primitive_count(),
            _ => 0,
        }
    }

    pub fn max_index(&self) -> Option<u32> {
        self.indices.iter().map(|i| i.to_u32()).max()
    }

    pub fn into_inner(self) -> Vec<I> {
        self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_partial_triangles() {
        let err = IndexList::new(vec![0u16, 1, 2, 3], PrimitiveTopology::TriangleList, 4).unwrap_err();
        assert!(matches!(err, Error::IndexCountMismatch { count: 4, .. }));
    }

    #[test]
    fn reports_position_of_bad_index() {
        let err = IndexList::new(vec![0u32, 1, 2, 0, 2, 7], PrimitiveTopology::TriangleList, 4).unwrap_err();
        match err {
            Error::IndexOutOfBounds {
                position,
                index,
                vertex_count,
            } => {
                assert_eq!(position, 5);
                assert_eq!(index, 7);
                assert_eq!(vertex_count, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn base_vertex_is_applied() {
        assert_eq!(validate_indices([0, 1, 2], PrimitiveTopology::TriangleList, 2, 5).unwrap(), 3);
        assert!(validate_indices([0, 1, 3], PrimitiveTopology::TriangleList, 2, 5).is_err());
        assert!(validate_indices([0, 1, 2], PrimitiveTopology::TriangleList, -1, 5).is_err());
    }

    #[test]
    fn strips_accept_any_count() {
        let list = IndexList::new(vec![0u16, 1, 2, 3], PrimitiveTopology::TriangleStrip, 4).unwrap();
        assert_eq!(list.triangle_count(), 2);
        assert_eq!(list.max_index(), Some(3));
        let lines = IndexList::new(vec![0u16, 1, 2], PrimitiveTopology::LineStrip, 3).unwrap();
        assert_eq!(lines.triangle_count(), 0);
        assert_eq!(lines.primitive_count(), 2);
    }
}
