//! Typed, strided memory layout descriptors.
//!
//! A [`DataDescriptor`] describes how to interpret a region of a raw
//! byte block: element type, component count, byte stride, and byte
//! offset. A [`VertexLayout`] is an ordered set of named fields over an
//! interleaved array-of-structures block, deriving one descriptor per
//! field. Declared field order is preserved; it drives the default
//! attribute binding order.

use crate::error::GlError;

/// Element type of buffer or texture data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl Dtype {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Dtype::I8 | Dtype::U8 => 1,
            Dtype::I16 | Dtype::U16 => 2,
            Dtype::I32 | Dtype::U32 | Dtype::F32 => 4,
        }
    }

    /// The corresponding GL type constant.
    pub fn gl_type(self) -> u32 {
        match self {
            Dtype::I8 => glow::BYTE,
            Dtype::U8 => glow::UNSIGNED_BYTE,
            Dtype::I16 => glow::SHORT,
            Dtype::U16 => glow::UNSIGNED_SHORT,
            Dtype::I32 => glow::INT,
            Dtype::U32 => glow::UNSIGNED_INT,
            Dtype::F32 => glow::FLOAT,
        }
    }

    /// Lowercase name for messages and logs.
    pub fn name(self) -> &'static str {
        match self {
            Dtype::I8 => "i8",
            Dtype::U8 => "u8",
            Dtype::I16 => "i16",
            Dtype::U16 => "u16",
            Dtype::I32 => "i32",
            Dtype::U32 => "u32",
            Dtype::F32 => "f32",
        }
    }
}

/// Immutable description of a typed, strided view into a raw byte block.
///
/// Pure value type: constructing one performs no allocation and no GL
/// calls. Multiple descriptors may describe (alias) the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    dtype: Dtype,
    count: usize,
    stride: usize,
    offset: usize,
}

impl DataDescriptor {
    /// Creates a descriptor with explicit stride and offset.
    pub fn new(dtype: Dtype, count: usize, stride: usize, offset: usize) -> Self {
        Self {
            dtype,
            count,
            stride,
            offset,
        }
    }

    /// Creates a tightly-packed descriptor: stride equals the element
    /// group size, offset zero.
    pub fn packed(dtype: Dtype, count: usize) -> Self {
        Self {
            dtype,
            count,
            stride: count * dtype.size(),
            offset: 0,
        }
    }

    /// Element type.
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Components per vertex (e.g. 3 for a vec3 position).
    pub fn count(&self) -> usize {
        self.count
    }

    /// Byte stride between consecutive records.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Byte offset of the first record within the block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Size in bytes of one element group (`count * dtype.size()`).
    pub fn byte_size(&self) -> usize {
        self.count * self.dtype.size()
    }

    /// Number of whole records this descriptor can read from a block of
    /// `len` bytes.
    pub fn record_count(&self, len: usize) -> usize {
        if self.stride == 0 || len < self.offset + self.byte_size() {
            return 0;
        }
        1 + (len - self.offset - self.byte_size()) / self.stride
    }

    /// Validates that `records` strided records fit within a block of
    /// `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `GlError::OutOfBounds` if the last record's final byte
    /// would fall outside the block.
    pub fn validate_within(&self, len: usize, records: usize) -> Result<(), GlError> {
        if records == 0 {
            return Ok(());
        }
        let span = (records - 1) * self.stride + self.byte_size();
        if self.offset + span > len {
            return Err(GlError::OutOfBounds {
                offset: self.offset,
                len: span,
                extent: len,
            });
        }
        Ok(())
    }
}

/// One named field of a [`VertexLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    name: String,
    dtype: Dtype,
    count: usize,
}

/// Ordered, named fields over an interleaved vertex record.
///
/// Each field derives one [`DataDescriptor`] whose stride is the whole
/// record size and whose offset is the sum of the preceding field
/// sizes. Field order is insertion order and is significant: it is the
/// default attribute binding order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    fields: Vec<Field>,
}

impl VertexLayout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, preserving declaration order. Builder-style.
    pub fn with(mut self, name: impl Into<String>, dtype: Dtype, count: usize) -> Self {
        self.fields.push(Field {
            name: name.into(),
            dtype,
            count,
        });
        self
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the layout has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total record size in bytes (the derived stride of every field).
    pub fn stride(&self) -> usize {
        self.fields.iter().map(|f| f.count * f.dtype.size()).sum()
    }

    /// Field names in declared order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// The derived descriptor for a named field, if declared.
    pub fn descriptor(&self, name: &str) -> Option<DataDescriptor> {
        let stride = self.stride();
        let mut offset = 0;
        for field in &self.fields {
            if field.name == name {
                return Some(DataDescriptor::new(field.dtype, field.count, stride, offset));
            }
            offset += field.count * field.dtype.size();
        }
        None
    }

    /// All derived descriptors paired with their field names, in
    /// declared order.
    pub fn descriptors(&self) -> Vec<(&str, DataDescriptor)> {
        let stride = self.stride();
        let mut out = Vec::with_capacity(self.fields.len());
        let mut offset = 0;
        for field in &self.fields {
            out.push((
                field.name.as_str(),
                DataDescriptor::new(field.dtype, field.count, stride, offset),
            ));
            offset += field.count * field.dtype.size();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_sizes_match_their_width() {
        assert_eq!(Dtype::U8.size(), 1);
        assert_eq!(Dtype::I16.size(), 2);
        assert_eq!(Dtype::U16.size(), 2);
        assert_eq!(Dtype::F32.size(), 4);
        assert_eq!(Dtype::U32.size(), 4);
    }

    #[test]
    fn dtype_gl_types_map_to_gl_constants() {
        assert_eq!(Dtype::U16.gl_type(), glow::UNSIGNED_SHORT);
        assert_eq!(Dtype::F32.gl_type(), glow::FLOAT);
        assert_eq!(Dtype::U8.gl_type(), glow::UNSIGNED_BYTE);
    }

    #[test]
    fn packed_descriptor_has_tight_stride_and_zero_offset() {
        let d = DataDescriptor::packed(Dtype::F32, 3);
        assert_eq!(d.byte_size(), 12);
        assert_eq!(d.stride(), 12);
        assert_eq!(d.offset(), 0);
    }

    #[test]
    fn interleaved_position_texcoord_layout_derives_expected_descriptors() {
        // 4 records of {position: 3 floats, texcoord: 2 floats}:
        // stride 20 bytes, offsets 0 and 12.
        let layout = VertexLayout::new()
            .with("a_position", Dtype::F32, 3)
            .with("a_texcoord", Dtype::F32, 2);

        assert_eq!(layout.stride(), 20);

        let pos = layout.descriptor("a_position").unwrap();
        assert_eq!(pos.stride(), 20);
        assert_eq!(pos.offset(), 0);
        assert_eq!(pos.count(), 3);

        let tex = layout.descriptor("a_texcoord").unwrap();
        assert_eq!(tex.stride(), 20);
        assert_eq!(tex.offset(), 12);
        assert_eq!(tex.count(), 2);
    }

    #[test]
    fn field_names_preserve_declaration_order() {
        let layout = VertexLayout::new()
            .with("z_last_alphabetically_first", Dtype::F32, 1)
            .with("a_position", Dtype::F32, 3)
            .with("m_middle", Dtype::U8, 4);
        assert_eq!(
            layout.field_names(),
            vec!["z_last_alphabetically_first", "a_position", "m_middle"]
        );
    }

    #[test]
    fn descriptors_match_field_names_in_order() {
        let layout = VertexLayout::new()
            .with("a", Dtype::F32, 2)
            .with("b", Dtype::U8, 4);
        let descs = layout.descriptors();
        assert_eq!(descs.len(), 2);
        assert_eq!(descs[0].0, "a");
        assert_eq!(descs[1].0, "b");
        assert_eq!(descs[0].1, layout.descriptor("a").unwrap());
        assert_eq!(descs[1].1, layout.descriptor("b").unwrap());
    }

    #[test]
    fn unknown_field_has_no_descriptor() {
        let layout = VertexLayout::new().with("a_position", Dtype::F32, 3);
        assert!(layout.descriptor("a_normal").is_none());
    }

    #[test]
    fn mixed_dtype_layout_offsets_accumulate_in_bytes() {
        let layout = VertexLayout::new()
            .with("color", Dtype::U8, 4)
            .with("position", Dtype::F32, 2);
        assert_eq!(layout.stride(), 12);
        assert_eq!(layout.descriptor("position").unwrap().offset(), 4);
    }

    #[test]
    fn validate_within_accepts_exact_fit() {
        // 4 records, stride 20, group size 12 at offset 0:
        // last byte = 3*20 + 12 = 72 <= 80.
        let d = DataDescriptor::new(Dtype::F32, 3, 20, 0);
        assert!(d.validate_within(80, 4).is_ok());
    }

    #[test]
    fn validate_within_rejects_overflow_with_out_of_bounds() {
        let d = DataDescriptor::new(Dtype::F32, 3, 20, 12);
        let err = d.validate_within(80, 4).unwrap_err();
        assert!(
            matches!(err, GlError::OutOfBounds { .. }),
            "expected OutOfBounds, got {err:?}"
        );
    }

    #[test]
    fn validate_within_accepts_zero_records() {
        let d = DataDescriptor::packed(Dtype::F32, 4);
        assert!(d.validate_within(0, 0).is_ok());
    }

    #[test]
    fn record_count_for_interleaved_block() {
        let layout = VertexLayout::new()
            .with("a_position", Dtype::F32, 3)
            .with("a_texcoord", Dtype::F32, 2);
        let tex = layout.descriptor("a_texcoord").unwrap();
        // 4 records * 20 bytes.
        assert_eq!(tex.record_count(80), 4);
    }

    #[test]
    fn record_count_is_zero_for_too_small_block() {
        let d = DataDescriptor::packed(Dtype::F32, 3);
        assert_eq!(d.record_count(8), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn dtype() -> impl Strategy<Value = Dtype> {
            prop_oneof![
                Just(Dtype::I8),
                Just(Dtype::U8),
                Just(Dtype::I16),
                Just(Dtype::U16),
                Just(Dtype::I32),
                Just(Dtype::U32),
                Just(Dtype::F32),
            ]
        }

        proptest! {
            #[test]
            fn packed_descriptor_fits_exactly_n_records(
                dt in dtype(),
                count in 1usize..8,
                records in 1usize..64,
            ) {
                let d = DataDescriptor::packed(dt, count);
                let len = d.stride() * records;
                prop_assert!(d.validate_within(len, records).is_ok());
                prop_assert!(d.validate_within(len - 1, records).is_err());
                prop_assert_eq!(d.record_count(len), records);
            }

            #[test]
            fn layout_stride_equals_sum_of_field_sizes(
                counts in proptest::collection::vec(1usize..5, 1..6),
            ) {
                let mut layout = VertexLayout::new();
                for (i, c) in counts.iter().enumerate() {
                    layout = layout.with(format!("f{i}"), Dtype::F32, *c);
                }
                let expected: usize = counts.iter().map(|c| c * 4).sum();
                prop_assert_eq!(layout.stride(), expected);
            }

            #[test]
            fn derived_offsets_are_strictly_increasing_and_within_stride(
                counts in proptest::collection::vec(1usize..5, 2..6),
            ) {
                let mut layout = VertexLayout::new();
                for (i, c) in counts.iter().enumerate() {
                    layout = layout.with(format!("f{i}"), Dtype::F32, *c);
                }
                let descs = layout.descriptors();
                for pair in descs.windows(2) {
                    prop_assert!(pair[0].1.offset() < pair[1].1.offset());
                }
                let last = &descs[descs.len() - 1].1;
                prop_assert_eq!(last.offset() + last.byte_size(), layout.stride());
            }
        }
    }
}
