// src/types.rs
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use crate::error::{NdChunkError, Result};

/// Element type of an array variable, tagged by width and kind.
///
/// The assembler never branches on the concrete type; it only needs the
/// byte width. The kind/sign tags exist so a downstream serialization
/// layer can pick the right wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            ElementType::Int8 | ElementType::UInt8 => 1,
            ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::Int32 | ElementType::UInt32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::UInt64 | ElementType::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ElementType::Float32 | ElementType::Float64)
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            ElementType::Int8
                | ElementType::Int16
                | ElementType::Int32
                | ElementType::Int64
                | ElementType::Float32
                | ElementType::Float64
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Int8 => "i8",
            ElementType::UInt8 => "u8",
            ElementType::Int16 => "i16",
            ElementType::UInt16 => "u16",
            ElementType::Int32 => "i32",
            ElementType::UInt32 => "u32",
            ElementType::Int64 => "i64",
            ElementType::UInt64 => "u64",
            ElementType::Float32 => "f32",
            ElementType::Float64 => "f64",
        }
    }
}

/// Byte order of the stored data.
///
/// The engine hands decoded bytes through untouched; the order tag tells
/// the consumer whether `swap_in_place` is needed before interpreting
/// them on a platform of the other endianness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    pub fn is_native(&self) -> bool {
        *self == Self::native()
    }
}

/// Reverse the bytes of every `width`-sized element in `data`.
///
/// `data.len()` must be a multiple of `width`; widths of 0 or 1 are a
/// no-op.
pub fn swap_in_place(data: &mut [u8], width: usize) {
    if width <= 1 {
        return;
    }
    debug_assert_eq!(data.len() % width, 0);
    for chunk in data.chunks_exact_mut(width) {
        chunk.reverse();
    }
}

/// Copy an assembled output buffer into a typed vector.
///
/// The assembler returns raw bytes; this is the supported way to read
/// them out as numeric values once the byte order is known to be native
/// (see [`ByteOrder::is_native`]). Fails when the buffer is not a whole
/// number of `T`-sized elements.
///
/// # Example
///
/// ```
/// use ndchunk::types::values_from_bytes;
///
/// let bytes = 1.5f32.to_ne_bytes();
/// let values: Vec<f32> = values_from_bytes(&bytes).unwrap();
/// assert_eq!(values, vec![1.5]);
/// ```
pub fn values_from_bytes<T: bytemuck::Pod>(bytes: &[u8]) -> Result<Vec<T>> {
    let width = std::mem::size_of::<T>();
    if width == 0 || bytes.len() % width != 0 {
        return Err(NdChunkError::ElementCast {
            len: bytes.len(),
            width,
        });
    }
    let mut out = vec![T::zeroed(); bytes.len() / width];
    bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(bytes);
    Ok(out)
}

/// The byte pattern written into output positions whose chunk was never
/// stored. Always exactly one element wide, in the variable's byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillValue(Vec<u8>);

impl FillValue {
    /// A fill value from raw bytes. Width is checked against the element
    /// type at descriptor construction.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        FillValue(bytes)
    }

    /// All-zero fill for the given element type. This is the HDF5 default
    /// when the variable declares none.
    pub fn zero(element: ElementType) -> Self {
        FillValue(vec![0u8; element.size()])
    }

    pub fn from_f32(value: f32, order: ByteOrder) -> Self {
        let mut buf = [0u8; 4];
        match order {
            ByteOrder::Little => LittleEndian::write_f32(&mut buf, value),
            ByteOrder::Big => BigEndian::write_f32(&mut buf, value),
        }
        FillValue(buf.to_vec())
    }

    pub fn from_f64(value: f64, order: ByteOrder) -> Self {
        let mut buf = [0u8; 8];
        match order {
            ByteOrder::Little => LittleEndian::write_f64(&mut buf, value),
            ByteOrder::Big => BigEndian::write_f64(&mut buf, value),
        }
        FillValue(buf.to_vec())
    }

    pub fn from_i32(value: i32, order: ByteOrder) -> Self {
        let mut buf = [0u8; 4];
        match order {
            ByteOrder::Little => LittleEndian::write_i32(&mut buf, value),
            ByteOrder::Big => BigEndian::write_i32(&mut buf, value),
        }
        FillValue(buf.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the fill pattern is exactly one element wide.
    pub(crate) fn check_width(&self, element: ElementType) -> Result<()> {
        if self.0.len() != element.size() {
            return Err(NdChunkError::FillValueWidth {
                got: self.0.len(),
                expected: element.size(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_sizes() {
        assert_eq!(ElementType::Int8.size(), 1);
        assert_eq!(ElementType::UInt16.size(), 2);
        assert_eq!(ElementType::Float32.size(), 4);
        assert_eq!(ElementType::Float64.size(), 8);
        assert_eq!(ElementType::UInt64.size(), 8);
    }

    #[test]
    fn test_element_predicates() {
        assert!(ElementType::Float64.is_float());
        assert!(!ElementType::Int32.is_float());
        assert!(ElementType::Int16.is_signed());
        assert!(!ElementType::UInt8.is_signed());
        assert_eq!(ElementType::Float32.name(), "f32");
    }

    #[test]
    fn test_swap_in_place() {
        let mut data = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_in_place(&mut data, 4);
        assert_eq!(data, vec![4, 3, 2, 1, 8, 7, 6, 5]);

        let mut bytes = vec![9u8, 10];
        swap_in_place(&mut bytes, 1);
        assert_eq!(bytes, vec![9, 10]);
    }

    #[test]
    fn test_fill_value_encoding() {
        let f = FillValue::from_f32(1.0, ByteOrder::Little);
        assert_eq!(f.as_bytes(), &[0, 0, 128, 63]);

        let f = FillValue::from_f32(1.0, ByteOrder::Big);
        assert_eq!(f.as_bytes(), &[63, 128, 0, 0]);

        let f = FillValue::zero(ElementType::Float64);
        assert_eq!(f.len(), 8);
        assert!(f.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_values_from_bytes() {
        let bytes: Vec<u8> = [1.0f32, -2.5, 0.0].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let values: Vec<f32> = values_from_bytes(&bytes).unwrap();
        assert_eq!(values, vec![1.0, -2.5, 0.0]);

        let err = values_from_bytes::<f64>(&bytes[..12]).unwrap_err();
        assert!(matches!(err, NdChunkError::ElementCast { len: 12, width: 8 }));
    }

    #[test]
    fn test_fill_value_width_check() {
        let f = FillValue::from_bytes(vec![0u8; 2]);
        assert!(f.check_width(ElementType::Int16).is_ok());
        assert!(f.check_width(ElementType::Int32).is_err());
    }
}
