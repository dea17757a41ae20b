use std::fmt;

// Shape: N-dimensional shape representation
//
// Trajectory tensors in this workspace are small and dense:
//   - Sample sequence:  [agents, timesteps, 2]
//   - Sample mask:      [agents, timesteps]
//   - Relational:       [agents, obs_len, agents]
//   - Batched variants prepend the batch axis.
//
// A zero-sized axis is legal and meaningful: a rejected window carries a
// sequence with zero agents, and its element count is 0.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions (0 for scalar, 1 for vector, 2 for matrix, etc.).
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions).
    ///
    /// A scalar shape `[]` has 1 element; any zero-sized axis makes it 0.
    pub fn elem_count(&self) -> usize {
        self.0.iter().product::<usize>()
    }

    /// Contiguous (row-major / C-order) strides for this shape.
    ///
    /// For shape [2, 3, 4], strides are [12, 4, 1].
    pub fn stride_contiguous(&self) -> Vec<usize> {
        let mut strides = vec![0usize; self.rank()];
        if self.rank() > 0 {
            strides[self.rank() - 1] = 1;
            for i in (0..self.rank() - 1).rev() {
                strides[i] = strides[i + 1] * self.0[i + 1];
            }
        }
        strides
    }

    /// Size of a specific dimension.
    pub fn dim(&self, d: usize) -> crate::Result<usize> {
        self.0.get(d).copied().ok_or(crate::Error::DimOutOfRange {
            dim: d,
            rank: self.rank(),
        })
    }

    /// Flat row-major offset of a multi-dimensional index.
    pub fn offset_of(&self, index: &[usize]) -> crate::Result<usize> {
        if index.len() != self.rank() || index.iter().zip(&self.0).any(|(&i, &d)| i >= d) {
            return Err(crate::Error::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.clone(),
            });
        }
        Ok(index
            .iter()
            .zip(self.stride_contiguous())
            .map(|(&i, s)| i * s)
            .sum())
    }

    /// Copy of this shape with dimension `d` replaced by `size`.
    pub fn with_dim(&self, d: usize, size: usize) -> crate::Result<Shape> {
        if d >= self.rank() {
            return Err(crate::Error::DimOutOfRange {
                dim: d,
                rank: self.rank(),
            });
        }
        let mut dims = self.0.clone();
        dims[d] = size;
        Ok(Shape(dims))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

// Convenient From implementations
// These let you write: Shape::from((3, 4)) instead of Shape::new(vec![3, 4])

impl From<()> for Shape {
    /// Scalar shape (0 dimensions).
    fn from(_: ()) -> Self {
        Shape(vec![])
    }
}

impl From<usize> for Shape {
    /// 1-D shape.
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((d0, d1, d2): (usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2])
    }
}

impl From<(usize, usize, usize, usize)> for Shape {
    fn from((d0, d1, d2, d3): (usize, usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2, d3])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Shape(v)
    }
}

impl From<&[usize]> for Shape {
    fn from(s: &[usize]) -> Self {
        Shape(s.to_vec())
    }
}
