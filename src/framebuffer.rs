//! Off-screen render targets.
//!
//! A [`FrameBuffer`] maps attachment points to color/depth/stencil
//! targets, each either a [`Texture2D`] or a [`RenderBuffer`]. All
//! attachments must agree on dimensions; a mismatch fails at `attach`,
//! not at draw time. Only 2D texture attachments are supported: 3D and
//! cube map faces cannot be attached (documented limitation of this
//! layer, not an oversight).
//!
//! The framebuffer holds shared handles to its attachments, not
//! exclusive ownership; deleting the framebuffer leaves them alive.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::context::GlContext;
use crate::enums::{self, EnumParam};
use crate::error::GlError;
use crate::object::{GlObject, Lifecycle, ObjectState};
use crate::texture::Texture2D;

/// An off-screen buffer for depth, stencil, or color storage that is
/// rendered into but never sampled.
#[derive(Debug, Clone)]
pub struct RenderBuffer {
    inner: Rc<RefCell<RenderBufferInner>>,
}

#[derive(Debug)]
struct RenderBufferInner {
    lifecycle: Lifecycle,
    width: usize,
    height: usize,
    format: u32,
    handle: Option<glow::Renderbuffer>,
    allocated: bool,
}

impl RenderBuffer {
    /// Creates a renderbuffer description; storage is allocated on
    /// first activation.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEnum` for an unresolvable format name,
    /// `InvalidType` for a constant that is not a renderbuffer format.
    pub fn new<'a>(
        width: usize,
        height: usize,
        format: impl Into<EnumParam<'a>>,
    ) -> Result<Self, GlError> {
        let format = enums::resolve(format)?;
        if !enums::RENDERBUFFER_FORMATS.contains(&format) {
            return Err(GlError::InvalidType {
                name: "format".into(),
                expected: "a renderbuffer storage format".into(),
                got: format!("0x{format:04X}"),
            });
        }
        Ok(Self {
            inner: Rc::new(RefCell::new(RenderBufferInner {
                lifecycle: Lifecycle::new(),
                width,
                height,
                format,
                handle: None,
                allocated: false,
            })),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.inner.borrow().width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.inner.borrow().height
    }

    /// The resolved storage format constant.
    pub fn format(&self) -> u32 {
        self.inner.borrow().format
    }

    pub(crate) fn native_handle(&self) -> Option<glow::Renderbuffer> {
        self.inner.borrow().handle
    }
}

impl GlObject for RenderBuffer {
    fn state(&self) -> ObjectState {
        self.inner.borrow().lifecycle.state()
    }

    #[allow(unsafe_code)]
    fn activate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("activate")?;

        let handle = match inner.handle {
            Some(handle) => handle,
            None => {
                // SAFETY: plain object creation on a current context.
                let handle = unsafe { ctx.gl().create_renderbuffer() }.map_err(|reason| {
                    GlError::ResourceCreation {
                        kind: "renderbuffer",
                        reason,
                    }
                })?;
                debug!(
                    "renderbuffer created: {}x{} format 0x{:04X}",
                    inner.width, inner.height, inner.format
                );
                inner.handle = Some(handle);
                inner.lifecycle.mark_created();
                handle
            }
        };

        ctx.bind_renderbuffer(Some(handle));

        if !inner.allocated {
            // SAFETY: the renderbuffer is bound; format was validated at
            // construction.
            unsafe {
                ctx.gl().renderbuffer_storage(
                    glow::RENDERBUFFER,
                    inner.format,
                    inner.width as i32,
                    inner.height as i32,
                );
            }
            inner.allocated = true;
        }
        inner.lifecycle.clear_dirty();
        inner.lifecycle.mark_active();
        Ok(())
    }

    fn deactivate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("deactivate")?;
        ctx.bind_renderbuffer(None);
        inner.lifecycle.mark_inactive();
        Ok(())
    }

    #[allow(unsafe_code)]
    fn delete(&self, ctx: &mut GlContext) {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = inner.handle.take() {
            ctx.forget_renderbuffer(handle);
            // SAFETY: handle is live and owned by this object; taken so
            // it is deleted at most once.
            unsafe { ctx.gl().delete_renderbuffer(handle) };
        }
        inner.lifecycle.mark_deleted();
    }
}

/// A target attachable to a framebuffer attachment point.
#[derive(Debug, Clone)]
pub enum Attachment {
    /// A 2D texture, sampleable after rendering.
    Texture(Texture2D),
    /// A renderbuffer (render-only storage).
    RenderBuffer(RenderBuffer),
}

impl Attachment {
    fn size(&self) -> (usize, usize) {
        match self {
            Attachment::Texture(t) => (t.width(), t.height()),
            Attachment::RenderBuffer(rb) => (rb.width(), rb.height()),
        }
    }
}

impl From<Texture2D> for Attachment {
    fn from(texture: Texture2D) -> Self {
        Attachment::Texture(texture)
    }
}

impl From<RenderBuffer> for Attachment {
    fn from(renderbuffer: RenderBuffer) -> Self {
        Attachment::RenderBuffer(renderbuffer)
    }
}

#[derive(Debug)]
struct FrameBufferInner {
    lifecycle: Lifecycle,
    handle: Option<glow::Framebuffer>,
    attachments: Vec<(u32, Attachment)>,
    attachments_dirty: bool,
}

/// An off-screen framebuffer composed of attached textures and
/// renderbuffers. While active, draws land in it instead of the default
/// framebuffer.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    inner: Rc<RefCell<FrameBufferInner>>,
}

impl FrameBuffer {
    /// Creates an empty framebuffer.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(FrameBufferInner {
                lifecycle: Lifecycle::new(),
                handle: None,
                attachments: Vec::new(),
                attachments_dirty: false,
            })),
        }
    }

    /// Attaches a target to an attachment point, replacing any previous
    /// target at that point. Dimension compatibility with the existing
    /// attachments is validated here, immediately.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleAttachment` on a size mismatch,
    /// `UnknownEnum`/`InvalidType` for a bad attachment point.
    pub fn attach<'a>(
        &self,
        point: impl Into<EnumParam<'a>>,
        target: impl Into<Attachment>,
    ) -> Result<(), GlError> {
        let point = enums::resolve(point)?;
        if !enums::ATTACHMENT_POINTS.contains(&point) {
            return Err(GlError::InvalidType {
                name: "point".into(),
                expected: "a framebuffer attachment point".into(),
                got: format!("0x{point:04X}"),
            });
        }
        let target = target.into();

        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("attach")?;

        let (width, height) = target.size();
        for (existing_point, existing) in &inner.attachments {
            if *existing_point == point {
                continue;
            }
            let (ew, eh) = existing.size();
            if (ew, eh) != (width, height) {
                return Err(GlError::IncompatibleAttachment {
                    point: point_name(point),
                    expected_width: ew,
                    expected_height: eh,
                    width,
                    height,
                });
            }
        }

        if let Some(slot) = inner.attachments.iter_mut().find(|(p, _)| *p == point) {
            slot.1 = target;
        } else {
            inner.attachments.push((point, target));
        }
        inner.attachments_dirty = true;
        inner.lifecycle.set_dirty();
        Ok(())
    }

    /// Removes the target at an attachment point, if any.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the framebuffer has been deleted.
    pub fn detach<'a>(&self, point: impl Into<EnumParam<'a>>) -> Result<(), GlError> {
        let point = enums::resolve(point)?;
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("detach")?;
        let before = inner.attachments.len();
        inner.attachments.retain(|(p, _)| *p != point);
        if inner.attachments.len() != before {
            inner.attachments_dirty = true;
            inner.lifecycle.set_dirty();
        }
        Ok(())
    }

    /// Number of attachments.
    pub fn attachment_count(&self) -> usize {
        self.inner.borrow().attachments.len()
    }

    /// Common size of the attachments, if any are present.
    pub fn size(&self) -> Option<(usize, usize)> {
        self.inner
            .borrow()
            .attachments
            .first()
            .map(|(_, a)| a.size())
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GlObject for FrameBuffer {
    fn state(&self) -> ObjectState {
        self.inner.borrow().lifecycle.state()
    }

    #[allow(unsafe_code)]
    fn activate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        use glow::HasContext;

        {
            let inner = self.inner.borrow();
            inner.lifecycle.guard("activate")?;
        }

        let handle = {
            let mut inner = self.inner.borrow_mut();
            match inner.handle {
                Some(handle) => handle,
                None => {
                    // SAFETY: plain object creation on a current context.
                    let handle = unsafe { ctx.gl().create_framebuffer() }.map_err(|reason| {
                        GlError::ResourceCreation {
                            kind: "framebuffer",
                            reason,
                        }
                    })?;
                    debug!("framebuffer created");
                    inner.handle = Some(handle);
                    inner.lifecycle.mark_created();
                    handle
                }
            }
        };

        ctx.bind_framebuffer(Some(handle));

        let attachments_dirty = self.inner.borrow().attachments_dirty;
        if attachments_dirty {
            // Activating an attachment allocates and syncs it; the
            // texture/renderbuffer binds it issues do not disturb the
            // framebuffer binding.
            let attachments: Vec<(u32, Attachment)> =
                self.inner.borrow().attachments.clone();
            for (point, attachment) in &attachments {
                match attachment {
                    Attachment::Texture(texture) => {
                        texture.activate(ctx)?;
                        // SAFETY: the framebuffer is bound and the
                        // texture handle is live after activation.
                        unsafe {
                            ctx.gl().framebuffer_texture_2d(
                                glow::FRAMEBUFFER,
                                *point,
                                glow::TEXTURE_2D,
                                texture.core().native_handle(),
                                0,
                            );
                        }
                    }
                    Attachment::RenderBuffer(renderbuffer) => {
                        renderbuffer.activate(ctx)?;
                        // SAFETY: as above with a live renderbuffer.
                        unsafe {
                            ctx.gl().framebuffer_renderbuffer(
                                glow::FRAMEBUFFER,
                                *point,
                                glow::RENDERBUFFER,
                                renderbuffer.native_handle(),
                            );
                        }
                    }
                }
            }

            // SAFETY: status query on the bound framebuffer.
            let status = unsafe { ctx.gl().check_framebuffer_status(glow::FRAMEBUFFER) };
            if status != glow::FRAMEBUFFER_COMPLETE {
                ctx.bind_framebuffer(None);
                return Err(GlError::ResourceCreation {
                    kind: "framebuffer",
                    reason: format!("incomplete: status 0x{status:04X}"),
                });
            }

            let mut inner = self.inner.borrow_mut();
            inner.attachments_dirty = false;
        }

        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.clear_dirty();
        inner.lifecycle.mark_active();
        Ok(())
    }

    fn deactivate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("deactivate")?;
        ctx.bind_framebuffer(None);
        inner.lifecycle.mark_inactive();
        Ok(())
    }

    #[allow(unsafe_code)]
    fn delete(&self, ctx: &mut GlContext) {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = inner.handle.take() {
            ctx.forget_framebuffer(handle);
            // SAFETY: handle is live and owned by this object; taken so
            // it is deleted at most once. Attachments are shared, not
            // owned, and stay alive.
            unsafe { ctx.gl().delete_framebuffer(handle) };
        }
        inner.lifecycle.mark_deleted();
    }
}

/// Readable name for an attachment point, for error messages.
fn point_name(point: u32) -> String {
    match point {
        glow::COLOR_ATTACHMENT0 => "COLOR_ATTACHMENT0".into(),
        glow::COLOR_ATTACHMENT1 => "COLOR_ATTACHMENT1".into(),
        glow::COLOR_ATTACHMENT2 => "COLOR_ATTACHMENT2".into(),
        glow::COLOR_ATTACHMENT3 => "COLOR_ATTACHMENT3".into(),
        glow::DEPTH_ATTACHMENT => "DEPTH_ATTACHMENT".into(),
        glow::STENCIL_ATTACHMENT => "STENCIL_ATTACHMENT".into(),
        glow::DEPTH_STENCIL_ATTACHMENT => "DEPTH_STENCIL_ATTACHMENT".into(),
        other => format!("0x{other:04X}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_texture(width: usize, height: usize) -> Texture2D {
        Texture2D::from_u8(&vec![0u8; width * height * 4], width, height, 4).unwrap()
    }

    #[test]
    fn renderbuffer_resolves_symbolic_format() {
        let rb = RenderBuffer::new(64, 64, "depth_component16").unwrap();
        assert_eq!(rb.format(), glow::DEPTH_COMPONENT16);
        assert_eq!(rb.width(), 64);
        assert_eq!(rb.height(), 64);
    }

    #[test]
    fn renderbuffer_rejects_non_storage_format() {
        // TRIANGLES resolves but is not a renderbuffer format.
        assert!(matches!(
            RenderBuffer::new(1, 1, "triangles"),
            Err(GlError::InvalidType { .. })
        ));
        assert!(matches!(
            RenderBuffer::new(1, 1, "bogus_format"),
            Err(GlError::UnknownEnum(_))
        ));
    }

    #[test]
    fn attach_accepts_matching_sizes() {
        let fbo = FrameBuffer::new();
        fbo.attach("color_attachment0", color_texture(32, 32)).unwrap();
        fbo.attach(
            "depth_attachment",
            RenderBuffer::new(32, 32, "depth_component16").unwrap(),
        )
        .unwrap();
        assert_eq!(fbo.attachment_count(), 2);
        assert_eq!(fbo.size(), Some((32, 32)));
    }

    #[test]
    fn attach_rejects_size_mismatch_immediately() {
        let fbo = FrameBuffer::new();
        fbo.attach("color_attachment0", color_texture(32, 32)).unwrap();
        let err = fbo
            .attach("color_attachment1", color_texture(16, 16))
            .unwrap_err();
        match err {
            GlError::IncompatibleAttachment {
                point,
                expected_width,
                expected_height,
                width,
                height,
            } => {
                assert_eq!(point, "COLOR_ATTACHMENT1");
                assert_eq!((expected_width, expected_height), (32, 32));
                assert_eq!((width, height), (16, 16));
            }
            other => panic!("expected IncompatibleAttachment, got {other:?}"),
        }
        assert_eq!(fbo.attachment_count(), 1, "failed attach must not stick");
    }

    #[test]
    fn reattaching_a_point_replaces_and_may_resize() {
        let fbo = FrameBuffer::new();
        fbo.attach("color_attachment0", color_texture(32, 32)).unwrap();
        // Replacing the only attachment is free to change size.
        fbo.attach("color_attachment0", color_texture(64, 64)).unwrap();
        assert_eq!(fbo.attachment_count(), 1);
        assert_eq!(fbo.size(), Some((64, 64)));
    }

    #[test]
    fn attach_rejects_unknown_point() {
        let fbo = FrameBuffer::new();
        assert!(matches!(
            fbo.attach("color_attachment_zero", color_texture(4, 4)),
            Err(GlError::UnknownEnum(_))
        ));
        // LINEAR resolves but is not an attachment point.
        assert!(matches!(
            fbo.attach("linear", color_texture(4, 4)),
            Err(GlError::InvalidType { .. })
        ));
    }

    #[test]
    fn detach_removes_the_point() {
        let fbo = FrameBuffer::new();
        fbo.attach("color_attachment0", color_texture(8, 8)).unwrap();
        fbo.detach("color_attachment0").unwrap();
        assert_eq!(fbo.attachment_count(), 0);
        assert_eq!(fbo.size(), None);
    }

    #[test]
    fn renderbuffer_and_texture_mix_must_agree_on_size() {
        let fbo = FrameBuffer::new();
        fbo.attach(
            "depth_attachment",
            RenderBuffer::new(128, 128, "depth24_stencil8").unwrap(),
        )
        .unwrap();
        assert!(matches!(
            fbo.attach("color_attachment0", color_texture(64, 64)),
            Err(GlError::IncompatibleAttachment { .. })
        ));
    }

    #[test]
    #[ignore = "requires GL context"]
    fn activation_checks_framebuffer_completeness() {
        // Would test: activating with a color attachment reports
        // FRAMEBUFFER_COMPLETE; a depth-only framebuffer surfaces the
        // driver's incomplete status as ResourceCreation.
    }
}
