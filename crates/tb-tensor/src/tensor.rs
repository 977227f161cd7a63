use crate::device::Device;
use crate::dtype::DType;
use crate::element::Element;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::Storage;

/// A tensor backed by host-visible storage.
///
/// Holds row-major data with an associated shape, explicit strides, dtype
/// and device tag. Tensors constructed directly are contiguous; `permuted`
/// produces a non-contiguous logical view over the same element values.
#[derive(Debug, Clone)]
pub struct Tensor {
    storage: Storage,
    shape: Shape,
    strides: Vec<usize>,
    device: Device,
}

impl Tensor {
    /// Create a contiguous tensor from typed data and a shape, on the CPU
    /// device.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn from_vec<T: Element>(data: Vec<T>, shape: impl Into<Shape>) -> Self {
        Self::from_vec_on(data, shape, Device::Cpu)
    }

    /// Create a contiguous tensor from typed data, a shape and a device tag.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn from_vec_on<T: Element>(
        data: Vec<T>,
        shape: impl Into<Shape>,
        device: Device,
    ) -> Self {
        let shape = shape.into();
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        let strides = shape.strides();
        Tensor {
            storage: T::into_storage(data),
            shape,
            strides,
            device,
        }
    }

    /// Create a zero-filled contiguous tensor.
    pub fn zeros(shape: impl Into<Shape>, dtype: DType, device: Device) -> Self {
        let shape = shape.into();
        let strides = shape.strides();
        Tensor {
            storage: Storage::zeros(dtype, shape.numel()),
            shape,
            strides,
            device,
        }
    }

    /// Allocate a fresh contiguous tensor with this tensor's shape, dtype
    /// and device. Contents are zero-initialized.
    ///
    /// This is the allocator used for out-of-place kernel results; it must
    /// run before descriptor building so result base addresses exist.
    pub fn empty_like(&self) -> Tensor {
        Tensor::zeros(self.shape.clone(), self.dtype(), self.device)
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's strides, in elements.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Returns the tensor's device tag.
    pub fn device(&self) -> Device {
        self.device
    }

    /// True if the strides describe a row-major contiguous layout.
    pub fn is_contiguous(&self) -> bool {
        self.shape.is_contiguous(&self.strides)
    }

    /// Typed view of the underlying storage.
    ///
    /// # Errors
    /// Returns `DTypeMismatch` if `T` does not match the storage dtype.
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        T::slice(&self.storage)
    }

    /// Typed mutable view of the underlying storage.
    pub fn data_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        T::slice_mut(&mut self.storage)
    }

    /// Returns the underlying storage reference.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Returns the underlying storage mutably.
    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    /// Returns a tensor with dimensions and strides permuted by `perm`,
    /// without moving element data. The result is non-contiguous for any
    /// non-identity permutation of a rank >= 2 tensor.
    pub fn permuted(&self, perm: &[usize]) -> Result<Tensor> {
        let ndim = self.shape.ndim();
        let mut seen = vec![false; ndim];
        if perm.len() != ndim || perm.iter().any(|&p| p >= ndim || std::mem::replace(&mut seen[p], true)) {
            return Err(TensorError::InvalidPermutation {
                perm: perm.to_vec(),
                ndim,
            });
        }
        let dims: Vec<usize> = perm.iter().map(|&p| self.shape.dim(p)).collect();
        let strides: Vec<usize> = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(Tensor {
            storage: self.storage.clone(),
            shape: Shape::new(dims),
            strides,
            device: self.device,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec() {
        let t = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        assert_eq!(t.shape().dims(), &[2, 3]);
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.device(), Device::Cpu);
        assert!(t.is_contiguous());
        assert_eq!(t.data::<f32>().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_from_vec_integer() {
        let t = Tensor::from_vec(vec![1i64, 2, 3], vec![3]);
        assert_eq!(t.dtype(), DType::I64);
        assert_eq!(t.data::<i64>().unwrap(), &[1, 2, 3]);
        assert!(t.data::<f32>().is_err());
    }

    #[test]
    fn test_zeros_and_empty_like() {
        let t = Tensor::from_vec_on(vec![1.0f32, 2.0], vec![2], Device::Accel(0));
        let e = t.empty_like();
        assert_eq!(e.shape().dims(), &[2]);
        assert_eq!(e.dtype(), DType::F32);
        assert_eq!(e.device(), Device::Accel(0));
        assert_eq!(e.data::<f32>().unwrap(), &[0.0, 0.0]);
    }

    #[test]
    #[should_panic]
    fn test_from_vec_shape_mismatch_panics() {
        let _t = Tensor::from_vec(vec![1.0f32, 2.0], vec![3]);
    }

    #[test]
    fn test_permuted_is_non_contiguous() {
        let t = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let p = t.permuted(&[1, 0]).unwrap();
        assert_eq!(p.shape().dims(), &[3, 2]);
        assert_eq!(p.strides(), &[1, 3]);
        assert!(!p.is_contiguous());
        // Same storage order underneath.
        assert_eq!(p.data::<f32>().unwrap(), t.data::<f32>().unwrap());
    }

    #[test]
    fn test_permuted_invalid() {
        let t = Tensor::from_vec(vec![1.0f32, 2.0], vec![2]);
        assert!(t.permuted(&[0, 1]).is_err());
        assert!(t.permuted(&[1]).is_err());
    }

    #[test]
    fn test_data_mut() {
        let mut t = Tensor::from_vec(vec![1.0f32, 2.0], vec![2]);
        t.data_mut::<f32>().unwrap()[0] = 42.0;
        assert_eq!(t.data::<f32>().unwrap()[0], 42.0);
    }
}
