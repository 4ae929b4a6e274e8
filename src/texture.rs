//! Texture objects: 2D, 3D, and cube map.
//!
//! A texture owns its host-side pixel data, shape, and sampling
//! parameters, and syncs to the GPU on activation. The internal format
//! is inferred from the channel count (1 -> R, 3 -> RGB, 4 -> RGBA) and
//! the element type (u8 -> normalized 8-bit, f32 -> 32-bit float).
//! Sub-region updates must fit the current bounds; replacing the full
//! image with a different shape reallocates (handle identity changes,
//! observable via `generation`). Filter and wrap parameters accept
//! symbolic names and are validated through the enum resolver at the
//! call, never at draw time.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::context::GlContext;
use crate::data::Dtype;
use crate::enums::{self, EnumParam};
use crate::error::GlError;
use crate::object::{GlObject, Lifecycle, ObjectState};

/// One face of a cube map texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// All six faces in GL face-target order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Index of this face in storage order (matches [`Self::ALL`]).
    pub fn index(self) -> usize {
        match self {
            CubeFace::PositiveX => 0,
            CubeFace::NegativeX => 1,
            CubeFace::PositiveY => 2,
            CubeFace::NegativeY => 3,
            CubeFace::PositiveZ => 4,
            CubeFace::NegativeZ => 5,
        }
    }

    fn gl_target(self) -> u32 {
        glow::TEXTURE_CUBE_MAP_POSITIVE_X + self.index() as u32
    }
}

/// Maps channel count and element type to (internal format, pixel
/// format, pixel type).
fn infer_formats(channels: usize, dtype: Dtype) -> Result<(u32, u32, u32), GlError> {
    let internal = match (channels, dtype) {
        (1, Dtype::U8) => glow::R8,
        (3, Dtype::U8) => glow::RGB8,
        (4, Dtype::U8) => glow::RGBA8,
        (1, Dtype::F32) => glow::R32F,
        (3, Dtype::F32) => glow::RGB32F,
        (4, Dtype::F32) => glow::RGBA32F,
        (1 | 3 | 4, other) => {
            return Err(GlError::InvalidType {
                name: "dtype".into(),
                expected: "u8 or f32 pixels".into(),
                got: other.name().into(),
            })
        }
        (other, _) => {
            return Err(GlError::InvalidType {
                name: "channels".into(),
                expected: "1, 3, or 4".into(),
                got: other.to_string(),
            })
        }
    };
    let format = match channels {
        1 => glow::RED,
        3 => glow::RGB,
        _ => glow::RGBA,
    };
    Ok((internal, format, dtype.gl_type()))
}

/// A pending sub-region upload, in pixels.
#[derive(Debug, Clone, Copy)]
struct Region {
    face: usize,
    offset: [usize; 3],
    size: [usize; 3],
}

#[derive(Debug)]
struct TextureInner {
    lifecycle: Lifecycle,
    target: u32,
    kind: &'static str,
    faces: usize,
    extent: [usize; 3],
    channels: usize,
    dtype: Dtype,
    data: Vec<u8>,
    handle: Option<glow::Texture>,
    generation: u64,
    needs_realloc: bool,
    regions: Vec<Region>,
    min_filter: u32,
    mag_filter: u32,
    wrap_s: u32,
    wrap_t: u32,
    wrap_r: u32,
    params_dirty: bool,
}

impl TextureInner {
    fn pixel_size(&self) -> usize {
        self.channels * self.dtype.size()
    }

    fn face_bytes(&self) -> usize {
        self.extent[0] * self.extent[1] * self.extent[2] * self.pixel_size()
    }
}

/// Shared implementation of all texture kinds.
#[derive(Debug, Clone)]
pub(crate) struct TextureCore {
    inner: Rc<RefCell<TextureInner>>,
}

impl TextureCore {
    fn new(
        target: u32,
        kind: &'static str,
        faces: usize,
        extent: [usize; 3],
        channels: usize,
        dtype: Dtype,
        data: &[u8],
    ) -> Result<Self, GlError> {
        // Format inference fails early for unsupported channel counts
        // or element types.
        infer_formats(channels, dtype)?;

        let expected = faces * extent[0] * extent[1] * extent[2] * channels * dtype.size();
        if data.len() != expected {
            return Err(GlError::InvalidType {
                name: "data".into(),
                expected: format!("{expected} bytes for {extent:?} x {channels} channels"),
                got: format!("{} bytes", data.len()),
            });
        }

        Ok(Self {
            inner: Rc::new(RefCell::new(TextureInner {
                lifecycle: Lifecycle::new(),
                target,
                kind,
                faces,
                extent,
                channels,
                dtype,
                data: data.to_vec(),
                handle: None,
                generation: 0,
                needs_realloc: true,
                regions: Vec::new(),
                min_filter: glow::LINEAR,
                mag_filter: glow::LINEAR,
                wrap_s: glow::CLAMP_TO_EDGE,
                wrap_t: glow::CLAMP_TO_EDGE,
                wrap_r: glow::CLAMP_TO_EDGE,
                params_dirty: true,
            })),
        })
    }

    fn state(&self) -> ObjectState {
        self.inner.borrow().lifecycle.state()
    }

    fn extent(&self) -> [usize; 3] {
        self.inner.borrow().extent
    }

    fn channels(&self) -> usize {
        self.inner.borrow().channels
    }

    fn dtype(&self) -> Dtype {
        self.inner.borrow().dtype
    }

    fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    /// Writes a sub-region into the host copy and records it for the
    /// next activation.
    fn set_region(
        &self,
        face: usize,
        offset: [usize; 3],
        size: [usize; 3],
        data: &[u8],
    ) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("set_data")?;

        for axis in 0..3 {
            if offset[axis] + size[axis] > inner.extent[axis] {
                return Err(GlError::RegionOutOfBounds {
                    offset,
                    size,
                    extent: inner.extent,
                });
            }
        }

        let pixel = inner.pixel_size();
        let expected = size[0] * size[1] * size[2] * pixel;
        if data.len() != expected {
            return Err(GlError::InvalidType {
                name: "data".into(),
                expected: format!("{expected} bytes for region {size:?}"),
                got: format!("{} bytes", data.len()),
            });
        }
        if expected == 0 {
            return Ok(());
        }

        let [width, height, _] = inner.extent;
        let face_base = face * inner.face_bytes();
        let row_bytes = size[0] * pixel;
        let mut src = 0;
        for z in 0..size[2] {
            for y in 0..size[1] {
                let dst = face_base
                    + (((offset[2] + z) * height + offset[1] + y) * width + offset[0]) * pixel;
                inner.data[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
                src += row_bytes;
            }
        }

        if !inner.needs_realloc {
            inner.regions.push(Region { face, offset, size });
        }
        inner.lifecycle.set_dirty();
        Ok(())
    }

    /// Replaces the full image. A shape or type change reallocates and
    /// bumps the generation; an identical shape is a plain full-extent
    /// update that keeps the handle.
    fn set_image(
        &self,
        faces: usize,
        extent: [usize; 3],
        channels: usize,
        dtype: Dtype,
        data: &[u8],
    ) -> Result<(), GlError> {
        {
            let inner = self.inner.borrow();
            inner.lifecycle.guard("set_data")?;
            if inner.extent == extent && inner.channels == channels && inner.dtype == dtype {
                drop(inner);
                if faces == 1 {
                    return self.set_region(0, [0, 0, 0], extent, data);
                }
                let face_bytes = data.len() / faces;
                for face in 0..faces {
                    self.set_region(
                        face,
                        [0, 0, 0],
                        extent,
                        &data[face * face_bytes..(face + 1) * face_bytes],
                    )?;
                }
                return Ok(());
            }
        }

        infer_formats(channels, dtype)?;
        let expected = faces * extent[0] * extent[1] * extent[2] * channels * dtype.size();
        if data.len() != expected {
            return Err(GlError::InvalidType {
                name: "data".into(),
                expected: format!("{expected} bytes for {extent:?} x {channels} channels"),
                got: format!("{} bytes", data.len()),
            });
        }

        let mut inner = self.inner.borrow_mut();
        inner.extent = extent;
        inner.channels = channels;
        inner.dtype = dtype;
        inner.data = data.to_vec();
        inner.generation += 1;
        inner.needs_realloc = true;
        inner.regions.clear();
        inner.lifecycle.set_dirty();
        debug!(
            "{} reallocated: {:?} x {} channels (generation {})",
            inner.kind, extent, channels, inner.generation
        );
        Ok(())
    }

    fn set_filter<'a>(
        &self,
        min: impl Into<EnumParam<'a>>,
        mag: impl Into<EnumParam<'a>>,
    ) -> Result<(), GlError> {
        let min = validated(min, enums::FILTERS, "min_filter", "texture filter")?;
        let mag = validated(mag, enums::FILTERS, "mag_filter", "texture filter")?;
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("set_filter")?;
        inner.min_filter = min;
        inner.mag_filter = mag;
        inner.params_dirty = true;
        inner.lifecycle.set_dirty();
        Ok(())
    }

    fn set_wrap<'a>(
        &self,
        s: impl Into<EnumParam<'a>>,
        t: impl Into<EnumParam<'a>>,
    ) -> Result<(), GlError> {
        let s = validated(s, enums::WRAP_MODES, "wrap_s", "wrap mode")?;
        let t = validated(t, enums::WRAP_MODES, "wrap_t", "wrap mode")?;
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("set_wrap")?;
        inner.wrap_s = s;
        inner.wrap_t = t;
        inner.params_dirty = true;
        inner.lifecycle.set_dirty();
        Ok(())
    }

    fn set_wrap_r<'a>(&self, r: impl Into<EnumParam<'a>>) -> Result<(), GlError> {
        let r = validated(r, enums::WRAP_MODES, "wrap_r", "wrap mode")?;
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("set_wrap")?;
        inner.wrap_r = r;
        inner.params_dirty = true;
        inner.lifecycle.set_dirty();
        Ok(())
    }

    fn min_filter(&self) -> u32 {
        self.inner.borrow().min_filter
    }

    fn mag_filter(&self) -> u32 {
        self.inner.borrow().mag_filter
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
                let handle = unsafe { ctx.gl().create_texture() }.map_err(|reason| {
                    GlError::ResourceCreation {
                        kind: "texture",
                        reason,
                    }
                })?;
                debug!("{} created: {:?}", inner.kind, inner.extent);
                inner.handle = Some(handle);
                inner.lifecycle.mark_created();
                handle
            }
        };

        ctx.bind_texture(inner.target, Some(handle));

        let (internal, format, pixel_type) = infer_formats(inner.channels, inner.dtype)?;
        let [width, height, depth] = inner.extent;
        let pixel = inner.pixel_size();

        if inner.needs_realloc {
            if inner.target == glow::TEXTURE_3D {
                // SAFETY: the texture is bound; dimensions and formats
                // were validated at construction; data length matches.
                unsafe {
                    ctx.gl().tex_image_3d(
                        inner.target,
                        0,
                        internal as i32,
                        width as i32,
                        height as i32,
                        depth as i32,
                        0,
                        format,
                        pixel_type,
                        glow::PixelUnpackData::Slice(Some(&inner.data)),
                    );
                }
            } else {
                let face_bytes = inner.face_bytes();
                for face in 0..inner.faces {
                    let target = if inner.faces == 6 {
                        CubeFace::ALL[face].gl_target()
                    } else {
                        inner.target
                    };
                    let slice = &inner.data[face * face_bytes..(face + 1) * face_bytes];
                    // SAFETY: as above; each face slice is one full image.
                    unsafe {
                        ctx.gl().tex_image_2d(
                            target,
                            0,
                            internal as i32,
                            width as i32,
                            height as i32,
                            0,
                            format,
                            pixel_type,
                            glow::PixelUnpackData::Slice(Some(slice)),
                        );
                    }
                }
            }
            inner.needs_realloc = false;
            inner.regions.clear();
        } else {
            let face_bytes = inner.face_bytes();
            for region in &inner.regions {
                let tight = extract_region(
                    &inner.data,
                    inner.extent,
                    region.face * face_bytes,
                    region.offset,
                    region.size,
                    pixel,
                );
                if inner.target == glow::TEXTURE_3D {
                    // SAFETY: the region was bounds-checked in
                    // set_region; tight holds exactly the region bytes.
                    unsafe {
                        ctx.gl().tex_sub_image_3d(
                            inner.target,
                            0,
                            region.offset[0] as i32,
                            region.offset[1] as i32,
                            region.offset[2] as i32,
                            region.size[0] as i32,
                            region.size[1] as i32,
                            region.size[2] as i32,
                            format,
                            pixel_type,
                            glow::PixelUnpackData::Slice(Some(&tight)),
                        );
                    }
                } else {
                    let target = if inner.faces == 6 {
                        CubeFace::ALL[region.face].gl_target()
                    } else {
                        inner.target
                    };
                    // SAFETY: as above.
                    unsafe {
                        ctx.gl().tex_sub_image_2d(
                            target,
                            0,
                            region.offset[0] as i32,
                            region.offset[1] as i32,
                            region.size[0] as i32,
                            region.size[1] as i32,
                            format,
                            pixel_type,
                            glow::PixelUnpackData::Slice(Some(&tight)),
                        );
                    }
                }
            }
            inner.regions.clear();
        }

        if inner.params_dirty {
            // SAFETY: the texture is bound; parameters were validated
            // against the filter/wrap tables when set.
            unsafe {
                let gl = ctx.gl();
                gl.tex_parameter_i32(
                    inner.target,
                    glow::TEXTURE_MIN_FILTER,
                    inner.min_filter as i32,
                );
                gl.tex_parameter_i32(
                    inner.target,
                    glow::TEXTURE_MAG_FILTER,
                    inner.mag_filter as i32,
                );
                gl.tex_parameter_i32(inner.target, glow::TEXTURE_WRAP_S, inner.wrap_s as i32);
                gl.tex_parameter_i32(inner.target, glow::TEXTURE_WRAP_T, inner.wrap_t as i32);
                if inner.target == glow::TEXTURE_3D {
                    gl.tex_parameter_i32(inner.target, glow::TEXTURE_WRAP_R, inner.wrap_r as i32);
                }
            }
            inner.params_dirty = false;
        }

        inner.lifecycle.clear_dirty();
        inner.lifecycle.mark_active();
        Ok(())
    }

    fn deactivate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("deactivate")?;
        ctx.bind_texture(inner.target, None);
        inner.lifecycle.mark_inactive();
        Ok(())
    }

    #[allow(unsafe_code)]
    fn delete(&self, ctx: &mut GlContext) {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = inner.handle.take() {
            ctx.forget_texture(handle);
            // SAFETY: handle is live and owned by this object; taken so
            // it is deleted at most once.
            unsafe { ctx.gl().delete_texture(handle) };
        }
        inner.lifecycle.mark_deleted();
    }

    pub(crate) fn native_handle(&self) -> Option<glow::Texture> {
        self.inner.borrow().handle
    }
}

/// Resolves a symbolic parameter and checks it belongs to `allowed`.
fn validated<'a>(
    param: impl Into<EnumParam<'a>>,
    allowed: &[u32],
    name: &str,
    expected: &str,
) -> Result<u32, GlError> {
    let value = enums::resolve(param)?;
    if !allowed.contains(&value) {
        return Err(GlError::InvalidType {
            name: name.into(),
            expected: expected.into(),
            got: format!("0x{value:04X}"),
        });
    }
    Ok(value)
}

/// Copies a sub-region out of a row-major host block into a tight,
/// upload-ready byte vector.
fn extract_region(
    data: &[u8],
    extent: [usize; 3],
    face_base: usize,
    offset: [usize; 3],
    size: [usize; 3],
    pixel: usize,
) -> Vec<u8> {
    let [width, height, _] = extent;
    let row_bytes = size[0] * pixel;
    let mut out = Vec::with_capacity(row_bytes * size[1] * size[2]);
    for z in 0..size[2] {
        for y in 0..size[1] {
            let src =
                face_base + (((offset[2] + z) * height + offset[1] + y) * width + offset[0]) * pixel;
            out.extend_from_slice(&data[src..src + row_bytes]);
        }
    }
    out
}

fn f32_bytes(data: &[f32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

/// A two-dimensional texture.
///
/// Cheap to clone; clones share the same underlying texture.
#[derive(Debug, Clone)]
pub struct Texture2D {
    core: TextureCore,
}

impl Texture2D {
    /// Creates a 2D texture from 8-bit pixels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for unsupported channel counts or a data
    /// length that does not match the shape.
    pub fn from_u8(
        data: &[u8],
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, GlError> {
        Ok(Self {
            core: TextureCore::new(
                glow::TEXTURE_2D,
                "texture 2d",
                1,
                [width, height, 1],
                channels,
                Dtype::U8,
                data,
            )?,
        })
    }

    /// Creates a 2D texture from float pixels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for unsupported channel counts or a data
    /// length that does not match the shape.
    pub fn from_f32(
        data: &[f32],
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, GlError> {
        Ok(Self {
            core: TextureCore::new(
                glow::TEXTURE_2D,
                "texture 2d",
                1,
                [width, height, 1],
                channels,
                Dtype::F32,
                &f32_bytes(data),
            )?,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.core.extent()[0]
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.core.extent()[1]
    }

    /// Channels per pixel.
    pub fn channels(&self) -> usize {
        self.core.channels()
    }

    /// Pixel element type.
    pub fn dtype(&self) -> Dtype {
        self.core.dtype()
    }

    /// Reallocation counter standing for native handle identity.
    pub fn generation(&self) -> u64 {
        self.core.generation()
    }

    /// Uploads a sub-region of 8-bit pixels at `offset` (x, y).
    ///
    /// # Errors
    ///
    /// Returns `RegionOutOfBounds` if the region exceeds the current
    /// bounds, `InvalidType` on a data length mismatch.
    pub fn set_region_u8(
        &self,
        offset: (usize, usize),
        size: (usize, usize),
        data: &[u8],
    ) -> Result<(), GlError> {
        self.core
            .set_region(0, [offset.0, offset.1, 0], [size.0, size.1, 1], data)
    }

    /// Uploads a sub-region of float pixels at `offset` (x, y).
    ///
    /// # Errors
    ///
    /// Returns `RegionOutOfBounds` if the region exceeds the current
    /// bounds, `InvalidType` on a data length mismatch.
    pub fn set_region_f32(
        &self,
        offset: (usize, usize),
        size: (usize, usize),
        data: &[f32],
    ) -> Result<(), GlError> {
        self.core.set_region(
            0,
            [offset.0, offset.1, 0],
            [size.0, size.1, 1],
            &f32_bytes(data),
        )
    }

    /// Replaces the whole image. A different shape reallocates the
    /// native texture; the same shape updates in place.
    pub fn set_image_u8(
        &self,
        data: &[u8],
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<(), GlError> {
        self.core
            .set_image(1, [width, height, 1], channels, Dtype::U8, data)
    }

    /// Float variant of [`Self::set_image_u8`].
    pub fn set_image_f32(
        &self,
        data: &[f32],
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<(), GlError> {
        self.core
            .set_image(1, [width, height, 1], channels, Dtype::F32, &f32_bytes(data))
    }

    /// Sets minification and magnification filters (symbolic names or
    /// raw constants).
    ///
    /// # Errors
    ///
    /// Returns `UnknownEnum` for unresolvable names, `InvalidType` for
    /// constants that are not filters.
    pub fn set_filter<'a>(
        &self,
        min: impl Into<EnumParam<'a>>,
        mag: impl Into<EnumParam<'a>>,
    ) -> Result<(), GlError> {
        self.core.set_filter(min, mag)
    }

    /// Sets wrap modes for the s and t axes.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEnum` for unresolvable names, `InvalidType` for
    /// constants that are not wrap modes.
    pub fn set_wrap<'a>(
        &self,
        s: impl Into<EnumParam<'a>>,
        t: impl Into<EnumParam<'a>>,
    ) -> Result<(), GlError> {
        self.core.set_wrap(s, t)
    }

    /// Current minification filter constant.
    pub fn min_filter(&self) -> u32 {
        self.core.min_filter()
    }

    /// Current magnification filter constant.
    pub fn mag_filter(&self) -> u32 {
        self.core.mag_filter()
    }

    pub(crate) fn core(&self) -> &TextureCore {
        &self.core
    }
}

impl GlObject for Texture2D {
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

/// A three-dimensional texture.
#[derive(Debug, Clone)]
pub struct Texture3D {
    core: TextureCore,
}

impl Texture3D {
    /// Creates a 3D texture from 8-bit voxels.
    pub fn from_u8(
        data: &[u8],
        width: usize,
        height: usize,
        depth: usize,
        channels: usize,
    ) -> Result<Self, GlError> {
        Ok(Self {
            core: TextureCore::new(
                glow::TEXTURE_3D,
                "texture 3d",
                1,
                [width, height, depth],
                channels,
                Dtype::U8,
                data,
            )?,
        })
    }

    /// Creates a 3D texture from float voxels.
    pub fn from_f32(
        data: &[f32],
        width: usize,
        height: usize,
        depth: usize,
        channels: usize,
    ) -> Result<Self, GlError> {
        Ok(Self {
            core: TextureCore::new(
                glow::TEXTURE_3D,
                "texture 3d",
                1,
                [width, height, depth],
                channels,
                Dtype::F32,
                &f32_bytes(data),
            )?,
        })
    }

    /// Width in voxels.
    pub fn width(&self) -> usize {
        self.core.extent()[0]
    }

    /// Height in voxels.
    pub fn height(&self) -> usize {
        self.core.extent()[1]
    }

    /// Depth in voxels.
    pub fn depth(&self) -> usize {
        self.core.extent()[2]
    }

    /// Channels per voxel.
    pub fn channels(&self) -> usize {
        self.core.channels()
    }

    /// Reallocation counter standing for native handle identity.
    pub fn generation(&self) -> u64 {
        self.core.generation()
    }

    /// Uploads a sub-region at `offset` (x, y, z).
    ///
    /// # Errors
    ///
    /// Returns `RegionOutOfBounds` if the region exceeds the current
    /// bounds, `InvalidType` on a data length mismatch.
    pub fn set_region_u8(
        &self,
        offset: (usize, usize, usize),
        size: (usize, usize, usize),
        data: &[u8],
    ) -> Result<(), GlError> {
        self.core.set_region(
            0,
            [offset.0, offset.1, offset.2],
            [size.0, size.1, size.2],
            data,
        )
    }

    /// Replaces the whole volume; a shape change reallocates.
    pub fn set_image_u8(
        &self,
        data: &[u8],
        width: usize,
        height: usize,
        depth: usize,
        channels: usize,
    ) -> Result<(), GlError> {
        self.core
            .set_image(1, [width, height, depth], channels, Dtype::U8, data)
    }

    /// Sets minification and magnification filters.
    pub fn set_filter<'a>(
        &self,
        min: impl Into<EnumParam<'a>>,
        mag: impl Into<EnumParam<'a>>,
    ) -> Result<(), GlError> {
        self.core.set_filter(min, mag)
    }

    /// Sets wrap modes for the s and t axes.
    pub fn set_wrap<'a>(
        &self,
        s: impl Into<EnumParam<'a>>,
        t: impl Into<EnumParam<'a>>,
    ) -> Result<(), GlError> {
        self.core.set_wrap(s, t)
    }

    /// Sets the wrap mode for the r (depth) axis.
    pub fn set_wrap_r<'a>(&self, r: impl Into<EnumParam<'a>>) -> Result<(), GlError> {
        self.core.set_wrap_r(r)
    }

    pub(crate) fn core(&self) -> &TextureCore {
        &self.core
    }
}

impl GlObject for Texture3D {
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

/// A cube map texture: six square faces of identical shape.
#[derive(Debug, Clone)]
pub struct TextureCubeMap {
    core: TextureCore,
}

impl TextureCubeMap {
    /// Creates a cube map from six face images supplied together, in
    /// [`CubeFace::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` if any face's length does not match the
    /// shape.
    pub fn from_faces_u8(
        faces: &[&[u8]; 6],
        size: usize,
        channels: usize,
    ) -> Result<Self, GlError> {
        let mut data = Vec::with_capacity(6 * size * size * channels);
        for face in faces {
            data.extend_from_slice(face);
        }
        Ok(Self {
            core: TextureCore::new(
                glow::TEXTURE_CUBE_MAP,
                "cube map",
                6,
                [size, size, 1],
                channels,
                Dtype::U8,
                &data,
            )?,
        })
    }

    /// Edge length of each face in pixels.
    pub fn size(&self) -> usize {
        self.core.extent()[0]
    }

    /// Channels per pixel.
    pub fn channels(&self) -> usize {
        self.core.channels()
    }

    /// Reallocation counter standing for native handle identity.
    pub fn generation(&self) -> u64 {
        self.core.generation()
    }

    /// Replaces one face in full.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` if the data length does not match the face
    /// shape.
    pub fn set_face_u8(&self, face: CubeFace, data: &[u8]) -> Result<(), GlError> {
        let extent = self.core.extent();
        self.core.set_region(face.index(), [0, 0, 0], extent, data)
    }

    /// Uploads a sub-region of one face at `offset` (x, y).
    ///
    /// # Errors
    ///
    /// Returns `RegionOutOfBounds` if the region exceeds the face
    /// bounds, `InvalidType` on a data length mismatch.
    pub fn set_face_region_u8(
        &self,
        face: CubeFace,
        offset: (usize, usize),
        size: (usize, usize),
        data: &[u8],
    ) -> Result<(), GlError> {
        self.core
            .set_region(face.index(), [offset.0, offset.1, 0], [size.0, size.1, 1], data)
    }

    /// Sets minification and magnification filters.
    pub fn set_filter<'a>(
        &self,
        min: impl Into<EnumParam<'a>>,
        mag: impl Into<EnumParam<'a>>,
    ) -> Result<(), GlError> {
        self.core.set_filter(min, mag)
    }

    /// Sets wrap modes for the s and t axes.
    pub fn set_wrap<'a>(
        &self,
        s: impl Into<EnumParam<'a>>,
        t: impl Into<EnumParam<'a>>,
    ) -> Result<(), GlError> {
        self.core.set_wrap(s, t)
    }

    pub(crate) fn core(&self) -> &TextureCore {
        &self.core
    }
}

impl GlObject for TextureCubeMap {
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
