//! Vertex and element buffer objects.
//!
//! A buffer owns a host-side byte block and syncs it to a GPU buffer
//! object lazily, on activation. Partial updates accumulate as dirty
//! ranges and only the modified bytes are re-uploaded; a full update
//! with a different total length reallocates instead, which changes the
//! native handle identity (observable through [`VertexBuffer::generation`]).
//!
//! Client-side buffers keep host memory as the source of truth and
//! re-submit the whole block on every activation with STREAM usage;
//! GPU-resident buffers upload once and then only changed ranges.
//!
//! Structured buffers carry a [`VertexLayout`] and hand out
//! [`BufferView`]s per field; a view shares the underlying block (the
//! handle types are reference-counted) and copies nothing.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::context::GlContext;
use crate::data::{DataDescriptor, Dtype, VertexLayout};
use crate::error::GlError;
use crate::object::{GlObject, Lifecycle, ObjectState};

/// GPU usage hint for buffer storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times.
    #[default]
    Static,
    /// Updated repeatedly, drawn many times.
    Dynamic,
    /// Updated for every draw.
    Stream,
}

impl BufferUsage {
    fn gl_usage(self) -> u32 {
        match self {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
            BufferUsage::Stream => glow::STREAM_DRAW,
        }
    }
}

#[derive(Debug)]
enum BufferLayout {
    /// A flat array: one anonymous descriptor.
    Flat(DataDescriptor),
    /// An interleaved array-of-structures with named fields.
    Structured(VertexLayout),
}

impl BufferLayout {
    fn stride(&self) -> usize {
        match self {
            BufferLayout::Flat(desc) => desc.stride(),
            BufferLayout::Structured(layout) => layout.stride(),
        }
    }
}

#[derive(Debug)]
struct BufferInner {
    lifecycle: Lifecycle,
    target: u32,
    kind: &'static str,
    usage: BufferUsage,
    client: bool,
    data: Vec<u8>,
    layout: BufferLayout,
    handle: Option<glow::Buffer>,
    generation: u64,
    needs_realloc: bool,
    dirty_ranges: Vec<(usize, usize)>,
}

/// Shared implementation of vertex and element buffers.
#[derive(Debug, Clone)]
pub(crate) struct BufferCore {
    inner: Rc<RefCell<BufferInner>>,
}

impl BufferCore {
    fn new(
        target: u32,
        kind: &'static str,
        data: Vec<u8>,
        layout: BufferLayout,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BufferInner {
                lifecycle: Lifecycle::new(),
                target,
                kind,
                usage: BufferUsage::default(),
                client: false,
                data,
                layout,
                handle: None,
                generation: 0,
                needs_realloc: true,
                dirty_ranges: Vec::new(),
            })),
        }
    }

    fn state(&self) -> ObjectState {
        self.inner.borrow().lifecycle.state()
    }

    fn set_usage(&self, usage: BufferUsage) {
        self.inner.borrow_mut().usage = usage;
    }

    fn set_client(&self) {
        self.inner.borrow_mut().client = true;
    }

    fn is_client(&self) -> bool {
        self.inner.borrow().client
    }

    fn usage(&self) -> BufferUsage {
        self.inner.borrow().usage
    }

    fn byte_len(&self) -> usize {
        self.inner.borrow().data.len()
    }

    fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    fn stride(&self) -> usize {
        self.inner.borrow().layout.stride()
    }

    fn set_data(&self, data: &[u8], offset: usize) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("set_data")?;

        if offset == 0 && data.len() != inner.data.len() {
            // Length change: full reallocation. The native handle will
            // be regenerated, so callers must not assume it is stable.
            let stride = inner.layout.stride();
            if stride > 0 && data.len() % stride != 0 {
                return Err(GlError::InvalidType {
                    name: "data".into(),
                    expected: format!("multiple of the {stride}-byte record size"),
                    got: format!("{} bytes", data.len()),
                });
            }
            inner.data = data.to_vec();
            inner.generation += 1;
            inner.needs_realloc = true;
            inner.dirty_ranges.clear();
            inner.lifecycle.set_dirty();
            debug!(
                "{} reallocated: {} bytes (generation {})",
                inner.kind,
                data.len(),
                inner.generation
            );
            return Ok(());
        }

        let extent = inner.data.len();
        if offset + data.len() > extent {
            return Err(GlError::OutOfBounds {
                offset,
                len: data.len(),
                extent,
            });
        }
        inner.data[offset..offset + data.len()].copy_from_slice(data);
        if !inner.client && !inner.needs_realloc {
            inner.dirty_ranges.push((offset, data.len()));
        }
        inner.lifecycle.set_dirty();
        Ok(())
    }

    fn descriptor(&self, field: Option<&str>) -> Result<DataDescriptor, GlError> {
        let inner = self.inner.borrow();
        match (&inner.layout, field) {
            (BufferLayout::Flat(desc), None) => Ok(*desc),
            (BufferLayout::Flat(_), Some(name)) => Err(GlError::UnknownField(name.into())),
            (BufferLayout::Structured(layout), Some(name)) => layout
                .descriptor(name)
                .ok_or_else(|| GlError::UnknownField(name.into())),
            (BufferLayout::Structured(_), None) => Err(GlError::InvalidType {
                name: "view".into(),
                expected: "a field name on a structured buffer".into(),
                got: "whole-buffer view".into(),
            }),
        }
    }

    fn field_names(&self) -> Vec<String> {
        let inner = self.inner.borrow();
        match &inner.layout {
            BufferLayout::Flat(_) => Vec::new(),
            BufferLayout::Structured(layout) => {
                layout.field_names().into_iter().map(String::from).collect()
            }
        }
    }

    #[allow(unsafe_code)]
    pub(crate) fn activate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("activate")?;

        let handle = match inner.handle {
            Some(handle) => handle,
            None => {
                // SAFETY: plain object creation on a current context.
                let handle = unsafe { ctx.gl().create_buffer() }.map_err(|reason| {
                    GlError::ResourceCreation {
                        kind: "buffer",
                        reason,
                    }
                })?;
                debug!("{} created: {} bytes", inner.kind, inner.data.len());
                inner.handle = Some(handle);
                inner.lifecycle.mark_created();
                handle
            }
        };

        ctx.bind_buffer(inner.target, Some(handle));

        if inner.client {
            // Host memory is the source of truth: re-submit everything.
            // SAFETY: handle is bound to target; data is a valid slice.
            unsafe {
                ctx.gl()
                    .buffer_data_u8_slice(inner.target, &inner.data, glow::STREAM_DRAW);
            }
        } else if inner.needs_realloc {
            // SAFETY: handle is bound to target; data is a valid slice.
            unsafe {
                ctx.gl().buffer_data_u8_slice(
                    inner.target,
                    &inner.data,
                    inner.usage.gl_usage(),
                );
            }
            inner.needs_realloc = false;
        } else {
            for &(offset, len) in &inner.dirty_ranges {
                // SAFETY: the range was bounds-checked in set_data and
                // the store was sized by the last full upload.
                unsafe {
                    ctx.gl().buffer_sub_data_u8_slice(
                        inner.target,
                        offset as i32,
                        &inner.data[offset..offset + len],
                    );
                }
            }
        }
        inner.dirty_ranges.clear();
        inner.lifecycle.clear_dirty();
        inner.lifecycle.mark_active();
        Ok(())
    }

    fn deactivate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("deactivate")?;
        ctx.bind_buffer(inner.target, None);
        inner.lifecycle.mark_inactive();
        Ok(())
    }

    #[allow(unsafe_code)]
    fn delete(&self, ctx: &mut GlContext) {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = inner.handle.take() {
            ctx.forget_buffer(handle);
            // SAFETY: handle is live and owned by this object; taken so
            // it is deleted at most once.
            unsafe { ctx.gl().delete_buffer(handle) };
        }
        inner.lifecycle.mark_deleted();
    }
}

fn f32_bytes(data: &[f32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

fn u16_bytes(data: &[u16]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

fn u32_bytes(data: &[u32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

/// A buffer of per-vertex attribute data.
///
/// Cheap to clone; clones share the same underlying buffer. Not `Send`:
/// the whole layer assumes a single thread talking to a single context.
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    core: BufferCore,
}

impl VertexBuffer {
    /// Creates a flat buffer of `f32` data grouped `components` per
    /// vertex (e.g. 3 for vec3 positions).
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` if `components` is zero or does not divide
    /// the data length.
    pub fn from_f32(data: &[f32], components: usize) -> Result<Self, GlError> {
        if components == 0 || data.len() % components != 0 {
            return Err(GlError::InvalidType {
                name: "components".into(),
                expected: "a non-zero divisor of the data length".into(),
                got: format!("{components} over {} elements", data.len()),
            });
        }
        let desc = DataDescriptor::packed(Dtype::F32, components);
        Ok(Self {
            core: BufferCore::new(
                glow::ARRAY_BUFFER,
                "vertex buffer",
                f32_bytes(data),
                BufferLayout::Flat(desc),
            ),
        })
    }

    /// Creates a structured buffer over interleaved records described
    /// by `layout`. Field order in the layout is preserved and drives
    /// the default attribute binding order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` if the layout is empty or the byte length
    /// is not a whole number of records.
    pub fn structured(layout: VertexLayout, data: &[u8]) -> Result<Self, GlError> {
        if layout.is_empty() {
            return Err(GlError::InvalidType {
                name: "layout".into(),
                expected: "at least one field".into(),
                got: "an empty layout".into(),
            });
        }
        let stride = layout.stride();
        if data.len() % stride != 0 {
            return Err(GlError::InvalidType {
                name: "data".into(),
                expected: format!("multiple of the {stride}-byte record size"),
                got: format!("{} bytes", data.len()),
            });
        }
        Ok(Self {
            core: BufferCore::new(
                glow::ARRAY_BUFFER,
                "vertex buffer",
                data.to_vec(),
                BufferLayout::Structured(layout),
            ),
        })
    }

    /// Sets the GPU usage hint. Takes effect on the next (re)allocation.
    pub fn with_usage(self, usage: BufferUsage) -> Self {
        self.core.set_usage(usage);
        self
    }

    /// Marks the buffer client-side: host memory stays the source of
    /// truth and the whole block is re-submitted on every activation.
    pub fn client(self) -> Self {
        self.core.set_client();
        self
    }

    /// Whether this buffer is client-side.
    pub fn is_client(&self) -> bool {
        self.core.is_client()
    }

    /// The usage hint.
    pub fn usage(&self) -> BufferUsage {
        self.core.usage()
    }

    /// Total size in bytes.
    pub fn byte_len(&self) -> usize {
        self.core.byte_len()
    }

    /// Number of whole vertex records.
    pub fn vertex_count(&self) -> usize {
        let stride = self.core.stride();
        if stride == 0 {
            0
        } else {
            self.core.byte_len() / stride
        }
    }

    /// Reallocation counter standing for native handle identity: equal
    /// values mean the handle has not been regenerated. Bumps exactly
    /// when a length-changing update forces reallocation.
    pub fn generation(&self) -> u64 {
        self.core.generation()
    }

    /// Field names in declared order (empty for flat buffers).
    pub fn field_names(&self) -> Vec<String> {
        self.core.field_names()
    }

    /// Updates `data.len()` bytes at `offset`.
    ///
    /// With `offset == 0` and a different total length, the buffer is
    /// fully reallocated instead (handle identity changes). Otherwise
    /// the region must lie within the current extent.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the region exceeds the current extent,
    /// `InvalidState` if deleted.
    pub fn set_data(&self, data: &[u8], offset: usize) -> Result<(), GlError> {
        self.core.set_data(data, offset)
    }

    /// `set_data` convenience for `f32` slices; `offset` is in bytes.
    pub fn set_data_f32(&self, data: &[f32], offset: usize) -> Result<(), GlError> {
        self.core.set_data(&f32_bytes(data), offset)
    }

    /// Returns a view of one named field for binding to a program
    /// attribute. The view shares the underlying block; nothing is
    /// copied.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` if the layout has no such field.
    pub fn view(&self, field: &str) -> Result<BufferView, GlError> {
        let descriptor = self.core.descriptor(Some(field))?;
        Ok(BufferView {
            buffer: self.clone(),
            name: Some(field.to_string()),
            descriptor,
        })
    }

    /// Returns a view of the whole buffer (flat buffers only).
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for structured buffers; use [`Self::view`]
    /// with a field name instead.
    pub fn view_all(&self) -> Result<BufferView, GlError> {
        let descriptor = self.core.descriptor(None)?;
        Ok(BufferView {
            buffer: self.clone(),
            name: None,
            descriptor,
        })
    }
}

impl GlObject for VertexBuffer {
    fn state(&self) -> ObjectState {
        self.core.state()
    }

    fn activate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.activate(ctx)
    }

    fn deactivate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.deactivate(ctx)
    }

    fn delete(&self, ctx: &mut GlContext) {
        self.core.delete(ctx);
    }
}

/// A buffer of vertex indices for indexed draws.
///
/// Exposes the element count and index type that an indexed draw call
/// needs. Cheap to clone; clones share the same underlying buffer.
#[derive(Debug, Clone)]
pub struct ElementBuffer {
    core: BufferCore,
    index_type: Dtype,
}

impl ElementBuffer {
    fn from_bytes(data: Vec<u8>, index_type: Dtype) -> Self {
        Self {
            core: BufferCore::new(
                glow::ELEMENT_ARRAY_BUFFER,
                "element buffer",
                data,
                BufferLayout::Flat(DataDescriptor::packed(index_type, 1)),
            ),
            index_type,
        }
    }

    /// Creates an element buffer of `u8` indices.
    pub fn from_u8(indices: &[u8]) -> Self {
        Self::from_bytes(indices.to_vec(), Dtype::U8)
    }

    /// Creates an element buffer of `u16` indices.
    pub fn from_u16(indices: &[u16]) -> Self {
        Self::from_bytes(u16_bytes(indices), Dtype::U16)
    }

    /// Creates an element buffer of `u32` indices.
    pub fn from_u32(indices: &[u32]) -> Self {
        Self::from_bytes(u32_bytes(indices), Dtype::U32)
    }

    /// Sets the GPU usage hint. Takes effect on the next (re)allocation.
    pub fn with_usage(self, usage: BufferUsage) -> Self {
        self.core.set_usage(usage);
        self
    }

    /// Marks the buffer client-side (re-submitted on every activation).
    pub fn client(self) -> Self {
        self.core.set_client();
        self
    }

    /// Whether this buffer is client-side.
    pub fn is_client(&self) -> bool {
        self.core.is_client()
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        self.core.byte_len() / self.index_type.size()
    }

    /// Whether the buffer holds no indices.
    pub fn is_empty(&self) -> bool {
        self.core.byte_len() == 0
    }

    /// The index element type (`U8`, `U16`, or `U32`).
    pub fn index_type(&self) -> Dtype {
        self.index_type
    }

    /// Reallocation counter standing for native handle identity.
    pub fn generation(&self) -> u64 {
        self.core.generation()
    }

    /// Updates indices; same reallocation rules as
    /// [`VertexBuffer::set_data`]. `offset` is in bytes.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the region exceeds the current extent.
    pub fn set_data(&self, data: &[u8], offset: usize) -> Result<(), GlError> {
        self.core.set_data(data, offset)
    }

    /// `set_data` convenience for `u16` indices; `offset` is in
    /// elements.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` if the buffer does not hold `u16` indices.
    pub fn set_data_u16(&self, indices: &[u16], offset: usize) -> Result<(), GlError> {
        if self.index_type != Dtype::U16 {
            return Err(GlError::InvalidType {
                name: "indices".into(),
                expected: self.index_type.name().into(),
                got: "u16".into(),
            });
        }
        self.core.set_data(&u16_bytes(indices), offset * 2)
    }

    /// `set_data` convenience for `u32` indices; `offset` is in
    /// elements.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` if the buffer does not hold `u32` indices.
    pub fn set_data_u32(&self, indices: &[u32], offset: usize) -> Result<(), GlError> {
        if self.index_type != Dtype::U32 {
            return Err(GlError::InvalidType {
                name: "indices".into(),
                expected: self.index_type.name().into(),
                got: "u32".into(),
            });
        }
        self.core.set_data(&u32_bytes(indices), offset * 4)
    }

    pub(crate) fn core(&self) -> &BufferCore {
        &self.core
    }
}

impl GlObject for ElementBuffer {
    fn state(&self) -> ObjectState {
        self.core.state()
    }

    fn activate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.activate(ctx)
    }

    fn deactivate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.deactivate(ctx)
    }

    fn delete(&self, ctx: &mut GlContext) {
        self.core.delete(ctx);
    }
}

/// A lightweight view of (part of) a [`VertexBuffer`] for binding to a
/// program attribute.
///
/// Shares the underlying block with the buffer it came from; no data is
/// copied. The descriptor is fixed at view creation (layouts are
/// immutable after construction).
#[derive(Debug, Clone)]
pub struct BufferView {
    buffer: VertexBuffer,
    name: Option<String>,
    descriptor: DataDescriptor,
}

impl BufferView {
    /// The field name this view was created from, if any.
    pub fn field_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The strided descriptor this view binds with.
    pub fn descriptor(&self) -> DataDescriptor {
        self.descriptor
    }

    /// Number of whole records readable through this view.
    pub fn vertex_count(&self) -> usize {
        self.descriptor.record_count(self.buffer.byte_len())
    }

    /// The buffer this view reads from.
    pub fn buffer(&self) -> &VertexBuffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_layout() -> VertexLayout {
        VertexLayout::new()
            .with("a_position", Dtype::F32, 3)
            .with("a_texcoord", Dtype::F32, 2)
    }

    fn quad_bytes(records: usize) -> Vec<u8> {
        vec![0u8; records * 20]
    }

    #[test]
    fn flat_buffer_reports_vertex_count() {
        let vbo = VertexBuffer::from_f32(&[0.0; 12], 3).unwrap();
        assert_eq!(vbo.vertex_count(), 4);
        assert_eq!(vbo.byte_len(), 48);
    }

    #[test]
    fn from_f32_rejects_non_dividing_component_count() {
        let err = VertexBuffer::from_f32(&[0.0; 10], 3).unwrap_err();
        assert!(matches!(err, GlError::InvalidType { .. }));
        assert!(matches!(
            VertexBuffer::from_f32(&[0.0; 10], 0),
            Err(GlError::InvalidType { .. })
        ));
    }

    #[test]
    fn structured_buffer_exposes_field_names_in_declared_order() {
        let vbo = VertexBuffer::structured(quad_layout(), &quad_bytes(4)).unwrap();
        assert_eq!(vbo.field_names(), vec!["a_position", "a_texcoord"]);
        assert_eq!(vbo.vertex_count(), 4);
    }

    #[test]
    fn structured_buffer_rejects_partial_records() {
        let err = VertexBuffer::structured(quad_layout(), &vec![0u8; 30]).unwrap_err();
        assert!(matches!(err, GlError::InvalidType { .. }));
    }

    #[test]
    fn structured_buffer_rejects_empty_layout() {
        let err = VertexBuffer::structured(VertexLayout::new(), &[]).unwrap_err();
        assert!(matches!(err, GlError::InvalidType { .. }));
    }

    #[test]
    fn view_carries_the_derived_descriptor() {
        let vbo = VertexBuffer::structured(quad_layout(), &quad_bytes(4)).unwrap();
        let view = vbo.view("a_texcoord").unwrap();
        assert_eq!(view.descriptor().stride(), 20);
        assert_eq!(view.descriptor().offset(), 12);
        assert_eq!(view.vertex_count(), 4);
        assert_eq!(view.field_name(), Some("a_texcoord"));
    }

    #[test]
    fn view_of_unknown_field_fails() {
        let vbo = VertexBuffer::structured(quad_layout(), &quad_bytes(4)).unwrap();
        let err = vbo.view("a_normal").unwrap_err();
        match err {
            GlError::UnknownField(name) => assert_eq!(name, "a_normal"),
            other => panic!("expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn view_shares_the_block_instead_of_copying() {
        let vbo = VertexBuffer::from_f32(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        let view = vbo.view_all().unwrap();
        // Updating through the original is visible through the view's
        // buffer handle (same vertex count after a growth realloc).
        vbo.set_data_f32(&[0.0; 8], 0).unwrap();
        assert_eq!(view.buffer().vertex_count(), 4);
        assert_eq!(view.vertex_count(), 4);
    }

    #[test]
    fn view_all_on_structured_buffer_fails() {
        let vbo = VertexBuffer::structured(quad_layout(), &quad_bytes(1)).unwrap();
        assert!(matches!(vbo.view_all(), Err(GlError::InvalidType { .. })));
    }

    #[test]
    fn same_length_update_keeps_generation() {
        let vbo = VertexBuffer::from_f32(&[0.0; 6], 3).unwrap();
        let before = vbo.generation();
        vbo.set_data_f32(&[1.0; 6], 0).unwrap();
        assert_eq!(vbo.generation(), before);
    }

    #[test]
    fn length_change_always_bumps_generation() {
        let vbo = VertexBuffer::from_f32(&[0.0; 6], 3).unwrap();
        let before = vbo.generation();
        vbo.set_data_f32(&[1.0; 9], 0).unwrap();
        assert_eq!(vbo.generation(), before + 1);
        vbo.set_data_f32(&[1.0; 3], 0).unwrap();
        assert_eq!(vbo.generation(), before + 2);
    }

    #[test]
    fn partial_update_within_extent_succeeds() {
        let vbo = VertexBuffer::from_f32(&[0.0; 8], 2).unwrap();
        // 8 floats = 32 bytes; write 2 floats at byte 24.
        vbo.set_data_f32(&[5.0, 6.0], 24).unwrap();
        assert_eq!(vbo.generation(), 0);
    }

    #[test]
    fn partial_update_past_extent_fails_with_out_of_bounds() {
        let vbo = VertexBuffer::from_f32(&[0.0; 8], 2).unwrap();
        let err = vbo.set_data_f32(&[5.0, 6.0], 28).unwrap_err();
        match err {
            GlError::OutOfBounds {
                offset,
                len,
                extent,
            } => {
                assert_eq!(offset, 28);
                assert_eq!(len, 8);
                assert_eq!(extent, 32);
            }
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn length_changing_realloc_rejects_partial_records() {
        let vbo = VertexBuffer::structured(quad_layout(), &quad_bytes(2)).unwrap();
        let err = vbo.set_data(&vec![0u8; 30], 0).unwrap_err();
        assert!(matches!(err, GlError::InvalidType { .. }));
    }

    #[test]
    fn set_data_on_deleted_buffer_fails_with_invalid_state() {
        // Exercise the guard through the lifecycle without a context:
        // a never-activated buffer holds no native handle, so deletion
        // is pure state bookkeeping.
        let vbo = VertexBuffer::from_f32(&[0.0; 3], 3).unwrap();
        vbo.core.inner.borrow_mut().lifecycle.mark_deleted();
        assert!(matches!(
            vbo.set_data_f32(&[1.0; 3], 0),
            Err(GlError::InvalidState { .. })
        ));
        assert_eq!(vbo.state(), ObjectState::Deleted);
    }

    #[test]
    fn element_buffer_reports_count_and_index_type() {
        let ibo = ElementBuffer::from_u16(&[0, 1, 2, 1, 2, 3]);
        assert_eq!(ibo.len(), 6);
        assert_eq!(ibo.index_type(), Dtype::U16);
        assert_eq!(ibo.index_type().gl_type(), glow::UNSIGNED_SHORT);
    }

    #[test]
    fn element_buffer_u32_has_four_byte_indices() {
        let ibo = ElementBuffer::from_u32(&[0, 1, 2]);
        assert_eq!(ibo.len(), 3);
        assert_eq!(ibo.index_type(), Dtype::U32);
    }

    #[test]
    fn element_buffer_typed_setter_checks_index_type() {
        let ibo = ElementBuffer::from_u16(&[0, 1, 2]);
        assert!(matches!(
            ibo.set_data_u32(&[0], 0),
            Err(GlError::InvalidType { .. })
        ));
        ibo.set_data_u16(&[7], 1).unwrap();
    }

    #[test]
    fn element_buffer_generation_follows_length_changes() {
        let ibo = ElementBuffer::from_u16(&[0, 1, 2]);
        ibo.set_data_u16(&[3, 4, 5], 0).unwrap();
        assert_eq!(ibo.generation(), 0, "same length keeps the handle");
        ibo.set_data_u16(&[0, 1, 2, 2, 1, 0], 0).unwrap();
        assert_eq!(ibo.generation(), 1, "length change regenerates");
    }

    #[test]
    fn client_flag_is_recorded() {
        let ibo = ElementBuffer::from_u16(&[0, 1, 2]).client();
        assert!(ibo.is_client());
        let vbo = VertexBuffer::from_f32(&[0.0; 3], 3).unwrap();
        assert!(!vbo.is_client());
    }

    #[test]
    fn usage_hint_is_recorded() {
        let vbo = VertexBuffer::from_f32(&[0.0; 3], 3)
            .unwrap()
            .with_usage(BufferUsage::Dynamic);
        assert_eq!(vbo.usage(), BufferUsage::Dynamic);
    }

    #[test]
    #[ignore = "requires GL context"]
    fn activation_uploads_only_dirty_ranges() {
        // Would test: after one full upload, a 4-byte set_data issues a
        // single glBufferSubData of 4 bytes.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn client_buffer_resubmits_every_activation() {
        // Would test: two activations of a client buffer issue two full
        // glBufferData uploads with STREAM_DRAW.
    }
}
