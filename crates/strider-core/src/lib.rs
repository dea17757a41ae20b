//! # strider-core
//!
//! Core tensor primitives for strider.
//!
//! This crate provides:
//! - [`Tensor`]: dense, owned, row-major n-dimensional array
//! - [`Shape`]: shape and contiguous strides
//! - [`DType`] / [`WithDType`]: element types (f32, u32, bool)
//! - [`Error`] / [`Result`]: shared error type and the [`bail!`] macro

pub mod dtype;
pub mod error;
pub mod shape;
pub mod tensor;

pub use dtype::{DType, WithDType};
pub use error::{Error, Result};
pub use shape::Shape;
pub use tensor::Tensor;
