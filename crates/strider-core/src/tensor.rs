// Tensor: dense n-dimensional array over contiguous row-major storage
//
// Every trajectory tensor in the pipeline is owned and contiguous: samples
// are deep copies of scene data, batches are freshly allocated and padded.
// Views and strides are therefore unnecessary; `narrow` and `pad_to` copy.
//
// Padding discipline: `pad_to` places the source block at the origin of a
// larger zero-filled tensor. Padding the agent axis of a [n, T, 2] sequence
// to [N, T, 2] and both agent axes of a [n, T, n] relational matrix to
// [N, T, N] are the same operation.

use crate::dtype::WithDType;
use crate::error::{Error, Result};
use crate::shape::Shape;

/// Dense, owned, row-major tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: WithDType> {
    data: Vec<T>,
    shape: Shape,
}

impl<T: WithDType> Tensor<T> {
    // Creation

    /// Create a tensor from flat row-major data.
    pub fn from_vec(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.elem_count();
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Tensor { data, shape })
    }

    /// Tensor filled with `value`.
    pub fn full(shape: impl Into<Shape>, value: T) -> Self {
        let shape = shape.into();
        Tensor {
            data: vec![value; shape.elem_count()],
            shape,
        }
    }

    /// Zero-filled tensor (`false` for masks).
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        Self::full(shape, T::zero())
    }

    /// Stack equally-shaped tensors along a new leading axis.
    pub fn stack(tensors: &[Tensor<T>]) -> Result<Self> {
        let first = match tensors.first() {
            Some(t) => t,
            None => crate::bail!("cannot stack an empty list of tensors"),
        };
        let mut dims = Vec::with_capacity(first.rank() + 1);
        dims.push(tensors.len());
        dims.extend_from_slice(first.dims());

        let mut data = Vec::with_capacity(first.elem_count() * tensors.len());
        for t in tensors {
            if t.shape != first.shape {
                return Err(Error::ShapeMismatch {
                    expected: first.shape.clone(),
                    got: t.shape.clone(),
                });
            }
            data.extend_from_slice(&t.data);
        }
        Ok(Tensor {
            data,
            shape: Shape::new(dims),
        })
    }

    // Accessors

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn elem_count(&self) -> usize {
        self.data.len()
    }

    /// Size of dimension `d`.
    pub fn dim(&self, d: usize) -> Result<usize> {
        self.shape.dim(d)
    }

    /// Flat row-major view of the elements.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Element at a multi-dimensional index.
    pub fn get(&self, index: &[usize]) -> Result<T> {
        let offset = self.shape.offset_of(index)?;
        Ok(self.data[offset])
    }

    /// Overwrite the element at a multi-dimensional index.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        let offset = self.shape.offset_of(index)?;
        self.data[offset] = value;
        Ok(())
    }

    // Shape manipulation

    /// Copy out `len` entries of dimension `dim` starting at `start`.
    ///
    /// Example: a [n, 8, 2] sequence narrowed on dim 1 with start 0, len 4
    /// yields the [n, 4, 2] observation window.
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Self> {
        let dim_size = self.dim(dim)?;
        if start + len > dim_size {
            return Err(Error::NarrowOutOfBounds {
                dim,
                start,
                len,
                dim_size,
            });
        }
        let outer: usize = self.dims()[..dim].iter().product();
        let inner: usize = self.dims()[dim + 1..].iter().product();

        let mut data = Vec::with_capacity(outer * len * inner);
        for o in 0..outer {
            let base = o * dim_size * inner;
            data.extend_from_slice(&self.data[base + start * inner..base + (start + len) * inner]);
        }
        Ok(Tensor {
            data,
            shape: self.shape.with_dim(dim, len)?,
        })
    }

    /// Zero-pad to `target` dims, keeping the current data at the origin.
    ///
    /// Each target dimension must be at least as large as the current one.
    pub fn pad_to(&self, target: impl Into<Shape>) -> Result<Self> {
        let target = target.into();
        if target.rank() != self.rank() {
            return Err(Error::RankMismatch {
                expected: self.rank(),
                got: target.rank(),
            });
        }
        if target.dims().iter().zip(self.dims()).any(|(&t, &s)| t < s) {
            crate::bail!("cannot pad {} down to {}", self.shape, target);
        }
        if target == self.shape {
            return Ok(self.clone());
        }

        let mut out = Self::zeros(target.clone());
        let src_strides = self.shape.stride_contiguous();
        let dst_strides = target.stride_contiguous();
        for (flat, &value) in self.data.iter().enumerate() {
            let mut rem = flat;
            let mut dst = 0;
            for (s, d) in src_strides.iter().zip(&dst_strides) {
                dst += (rem / s) * d;
                rem %= s;
            }
            out.data[dst] = value;
        }
        Ok(out)
    }

    /// Whether every element satisfies `pred`.
    pub fn all(&self, pred: impl Fn(T) -> bool) -> bool {
        self.data.iter().all(|&v| pred(v))
    }

    /// Whether every element is finite when viewed as f64.
    pub fn is_finite(&self) -> bool {
        self.all(|v| v.to_f64().is_finite())
    }
}
