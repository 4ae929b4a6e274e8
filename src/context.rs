//! Context wrapper and explicit binding state.
//!
//! All GL objects share exactly one implicit current context. Instead of
//! leaving that state hidden inside the driver, [`GlContext`] pairs the
//! native `glow::Context` with a [`BindingTable`] that mirrors every
//! bind it issues: current program, buffer targets, texture units,
//! framebuffer, renderbuffer, vertex array. Binding an object to a
//! target implicitly replaces whatever was bound there before, which is
//! why draw ordering matters; the table makes that sequence observable.
//!
//! The model is single-threaded and synchronous. No locking is added:
//! the underlying context is not thread-safe and wrapping it in a lock
//! would not change that.

use log::{debug, info};

use crate::error::GlError;

/// Upper bound on tracked texture units. ES 3.0 guarantees at least 32
/// combined units.
pub const MAX_TEXTURE_UNITS: u32 = 32;

/// One effective change to the context's binding state.
///
/// Recorded by the [`BindingTable`] when recording is enabled. Redundant
/// binds (target already holds the handle) produce no event and no
/// native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindEvent {
    Program(Option<glow::Program>),
    Buffer {
        target: u32,
        buffer: Option<glow::Buffer>,
    },
    ActiveUnit(u32),
    Texture {
        unit: u32,
        target: u32,
        texture: Option<glow::Texture>,
    },
    Framebuffer(Option<glow::Framebuffer>),
    Renderbuffer(Option<glow::Renderbuffer>),
    VertexArray(Option<glow::VertexArray>),
}

/// Explicit model of the context's mutable binding state.
///
/// Pure bookkeeping: updating the table performs no GL calls. Each
/// mutator returns whether the request changed anything, letting the
/// caller skip the redundant native call.
#[derive(Debug, Default)]
pub struct BindingTable {
    program: Option<glow::Program>,
    array_buffer: Option<glow::Buffer>,
    element_buffer: Option<glow::Buffer>,
    framebuffer: Option<glow::Framebuffer>,
    renderbuffer: Option<glow::Renderbuffer>,
    vertex_array: Option<glow::VertexArray>,
    active_unit: u32,
    textures: std::collections::HashMap<(u32, u32), glow::Texture>,
    recording: bool,
    events: Vec<BindEvent>,
}

impl BindingTable {
    /// Creates an empty table: nothing bound, unit 0 active.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables bind-event recording.
    pub fn set_recording(&mut self, on: bool) {
        self.recording = on;
    }

    /// Drains and returns the recorded events.
    pub fn take_events(&mut self) -> Vec<BindEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, event: BindEvent) {
        if self.recording {
            self.events.push(event);
        }
    }

    /// Currently bound program.
    pub fn program(&self) -> Option<glow::Program> {
        self.program
    }

    /// Buffer bound to the given target, if tracked.
    pub fn buffer(&self, target: u32) -> Option<glow::Buffer> {
        match target {
            glow::ARRAY_BUFFER => self.array_buffer,
            glow::ELEMENT_ARRAY_BUFFER => self.element_buffer,
            _ => None,
        }
    }

    /// Currently bound framebuffer (`None` means the default).
    pub fn framebuffer(&self) -> Option<glow::Framebuffer> {
        self.framebuffer
    }

    /// Currently bound renderbuffer.
    pub fn renderbuffer(&self) -> Option<glow::Renderbuffer> {
        self.renderbuffer
    }

    /// Currently bound vertex array.
    pub fn vertex_array(&self) -> Option<glow::VertexArray> {
        self.vertex_array
    }

    /// The active texture unit (0-based).
    pub fn active_unit(&self) -> u32 {
        self.active_unit
    }

    /// Texture bound to `target` on `unit`.
    pub fn texture(&self, unit: u32, target: u32) -> Option<glow::Texture> {
        self.textures.get(&(unit, target)).copied()
    }

    /// Records a program bind. Returns false if already current.
    pub fn use_program(&mut self, program: Option<glow::Program>) -> bool {
        if self.program == program {
            return false;
        }
        self.program = program;
        self.record(BindEvent::Program(program));
        true
    }

    /// Records a buffer bind. Returns false if already current.
    pub fn bind_buffer(&mut self, target: u32, buffer: Option<glow::Buffer>) -> bool {
        let slot = match target {
            glow::ARRAY_BUFFER => &mut self.array_buffer,
            glow::ELEMENT_ARRAY_BUFFER => &mut self.element_buffer,
            // Untracked target: always issue the call.
            _ => {
                self.record(BindEvent::Buffer { target, buffer });
                return true;
            }
        };
        if *slot == buffer {
            return false;
        }
        *slot = buffer;
        self.record(BindEvent::Buffer { target, buffer });
        true
    }

    /// Records an active-unit switch. Returns false if already active.
    pub fn set_active_unit(&mut self, unit: u32) -> bool {
        if self.active_unit == unit {
            return false;
        }
        self.active_unit = unit;
        self.record(BindEvent::ActiveUnit(unit));
        true
    }

    /// Records a texture bind on the active unit. Returns false if that
    /// unit/target pair already holds the handle.
    pub fn bind_texture(&mut self, target: u32, texture: Option<glow::Texture>) -> bool {
        let key = (self.active_unit, target);
        let current = self.textures.get(&key).copied();
        if current == texture {
            return false;
        }
        match texture {
            Some(t) => {
                self.textures.insert(key, t);
            }
            None => {
                self.textures.remove(&key);
            }
        }
        self.record(BindEvent::Texture {
            unit: self.active_unit,
            target,
            texture,
        });
        true
    }

    /// Records a framebuffer bind. Returns false if already current.
    pub fn bind_framebuffer(&mut self, framebuffer: Option<glow::Framebuffer>) -> bool {
        if self.framebuffer == framebuffer {
            return false;
        }
        self.framebuffer = framebuffer;
        self.record(BindEvent::Framebuffer(framebuffer));
        true
    }

    /// Records a renderbuffer bind. Returns false if already current.
    pub fn bind_renderbuffer(&mut self, renderbuffer: Option<glow::Renderbuffer>) -> bool {
        if self.renderbuffer == renderbuffer {
            return false;
        }
        self.renderbuffer = renderbuffer;
        self.record(BindEvent::Renderbuffer(renderbuffer));
        true
    }

    /// Records a vertex-array bind. Returns false if already current.
    pub fn bind_vertex_array(&mut self, vertex_array: Option<glow::VertexArray>) -> bool {
        if self.vertex_array == vertex_array {
            return false;
        }
        self.vertex_array = vertex_array;
        self.record(BindEvent::VertexArray(vertex_array));
        true
    }

    /// Forgets a buffer everywhere it is bound. Deleting a bound object
    /// unbinds it in the native context; this keeps the table in step.
    pub fn forget_buffer(&mut self, buffer: glow::Buffer) {
        if self.array_buffer == Some(buffer) {
            self.array_buffer = None;
        }
        if self.element_buffer == Some(buffer) {
            self.element_buffer = None;
        }
    }

    /// Forgets a texture on every unit it is bound to.
    pub fn forget_texture(&mut self, texture: glow::Texture) {
        self.textures.retain(|_, t| *t != texture);
    }

    /// Forgets a program if current.
    pub fn forget_program(&mut self, program: glow::Program) {
        if self.program == Some(program) {
            self.program = None;
        }
    }

    /// Forgets a framebuffer if current.
    pub fn forget_framebuffer(&mut self, framebuffer: glow::Framebuffer) {
        if self.framebuffer == Some(framebuffer) {
            self.framebuffer = None;
        }
    }

    /// Forgets a renderbuffer if current.
    pub fn forget_renderbuffer(&mut self, renderbuffer: glow::Renderbuffer) {
        if self.renderbuffer == Some(renderbuffer) {
            self.renderbuffer = None;
        }
    }
}

/// Wraps a pre-initialized `glow::Context` together with the explicit
/// [`BindingTable`].
///
/// The caller owns context creation (windowing integration is out of
/// scope); the context must be current on the calling thread before any
/// object is activated. Every bind issued by the resource types goes
/// through this wrapper, so the table always reflects what the driver
/// sees, and redundant binds are skipped.
pub struct GlContext {
    gl: glow::Context,
    bindings: BindingTable,
    default_vao: Option<glow::VertexArray>,
}

impl GlContext {
    /// Wraps an already-current native context.
    #[allow(unsafe_code)]
    pub fn new(gl: glow::Context) -> Self {
        use glow::HasContext;

        // SAFETY: glow wraps raw GL calls as unsafe. VERSION is a valid
        // string parameter on every GL/GLES/WebGL context.
        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        info!("context wrapped: {version}");

        Self {
            gl,
            bindings: BindingTable::new(),
            default_vao: None,
        }
    }

    /// The underlying native context.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Consumes the wrapper and returns the native context.
    pub fn into_gl(self) -> glow::Context {
        self.gl
    }

    /// Read access to the binding state.
    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Enables or disables bind-event recording on the table.
    pub fn record_bindings(&mut self, on: bool) {
        self.bindings.set_recording(on);
    }

    /// Drains the recorded bind events.
    pub fn take_bind_events(&mut self) -> Vec<BindEvent> {
        self.bindings.take_events()
    }

    #[allow(unsafe_code)]
    pub(crate) fn use_program(&mut self, program: Option<glow::Program>) {
        use glow::HasContext;
        if self.bindings.use_program(program) {
            // SAFETY: program is either None or a live handle owned by a
            // Program wrapper that has not been deleted.
            unsafe { self.gl.use_program(program) };
        }
    }

    #[allow(unsafe_code)]
    pub(crate) fn bind_buffer(&mut self, target: u32, buffer: Option<glow::Buffer>) {
        use glow::HasContext;
        if self.bindings.bind_buffer(target, buffer) {
            // SAFETY: target is a valid buffer target and buffer a live
            // handle or None.
            unsafe { self.gl.bind_buffer(target, buffer) };
        }
    }

    #[allow(unsafe_code)]
    pub(crate) fn set_active_unit(&mut self, unit: u32) {
        use glow::HasContext;
        if self.bindings.set_active_unit(unit) {
            // SAFETY: TEXTURE0 + unit is valid for unit < the GL
            // implementation's unit count; MAX_TEXTURE_UNITS is the ES
            // 3.0 guaranteed minimum.
            unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
        }
    }

    #[allow(unsafe_code)]
    pub(crate) fn bind_texture(&mut self, target: u32, texture: Option<glow::Texture>) {
        use glow::HasContext;
        if self.bindings.bind_texture(target, texture) {
            // SAFETY: target is a valid texture target and texture a
            // live handle or None.
            unsafe { self.gl.bind_texture(target, texture) };
        }
    }

    #[allow(unsafe_code)]
    pub(crate) fn bind_framebuffer(&mut self, framebuffer: Option<glow::Framebuffer>) {
        use glow::HasContext;
        if self.bindings.bind_framebuffer(framebuffer) {
            // SAFETY: framebuffer is a live handle or None (the default
            // framebuffer).
            unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) };
        }
    }

    #[allow(unsafe_code)]
    pub(crate) fn bind_renderbuffer(&mut self, renderbuffer: Option<glow::Renderbuffer>) {
        use glow::HasContext;
        if self.bindings.bind_renderbuffer(renderbuffer) {
            // SAFETY: renderbuffer is a live handle or None.
            unsafe { self.gl.bind_renderbuffer(glow::RENDERBUFFER, renderbuffer) };
        }
    }

    /// Ensures a vertex array object is bound. Core profiles refuse
    /// attribute pointers without one; a single shared VAO is enough
    /// because pointers are re-specified on every draw.
    #[allow(unsafe_code)]
    pub(crate) fn ensure_vertex_array(&mut self) -> Result<(), GlError> {
        use glow::HasContext;

        if self.default_vao.is_none() {
            // SAFETY: plain object creation on a current context.
            let vao = unsafe { self.gl.create_vertex_array() }.map_err(|reason| {
                GlError::ResourceCreation {
                    kind: "vertex array",
                    reason,
                }
            })?;
            debug!("shared vertex array created");
            self.default_vao = Some(vao);
        }
        if self.bindings.bind_vertex_array(self.default_vao) {
            // SAFETY: default_vao was just created or cached; handle is live.
            unsafe { self.gl.bind_vertex_array(self.default_vao) };
        }
        Ok(())
    }

    pub(crate) fn forget_buffer(&mut self, buffer: glow::Buffer) {
        self.bindings.forget_buffer(buffer);
    }

    pub(crate) fn forget_texture(&mut self, texture: glow::Texture) {
        self.bindings.forget_texture(texture);
    }

    pub(crate) fn forget_program(&mut self, program: glow::Program) {
        self.bindings.forget_program(program);
    }

    pub(crate) fn forget_framebuffer(&mut self, framebuffer: glow::Framebuffer) {
        self.bindings.forget_framebuffer(framebuffer);
    }

    pub(crate) fn forget_renderbuffer(&mut self, renderbuffer: glow::Renderbuffer) {
        self.bindings.forget_renderbuffer(renderbuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn buf(n: u32) -> glow::Buffer {
        glow::NativeBuffer(NonZeroU32::new(n).unwrap())
    }

    fn tex(n: u32) -> glow::Texture {
        glow::NativeTexture(NonZeroU32::new(n).unwrap())
    }

    fn prog(n: u32) -> glow::Program {
        glow::NativeProgram(NonZeroU32::new(n).unwrap())
    }

    #[test]
    fn fresh_table_has_nothing_bound() {
        let table = BindingTable::new();
        assert_eq!(table.program(), None);
        assert_eq!(table.buffer(glow::ARRAY_BUFFER), None);
        assert_eq!(table.buffer(glow::ELEMENT_ARRAY_BUFFER), None);
        assert_eq!(table.framebuffer(), None);
        assert_eq!(table.active_unit(), 0);
        assert_eq!(table.texture(0, glow::TEXTURE_2D), None);
    }

    #[test]
    fn binding_a_buffer_replaces_the_previous_one_on_the_same_target() {
        let mut table = BindingTable::new();
        assert!(table.bind_buffer(glow::ARRAY_BUFFER, Some(buf(1))));
        assert!(table.bind_buffer(glow::ARRAY_BUFFER, Some(buf(2))));
        assert_eq!(table.buffer(glow::ARRAY_BUFFER), Some(buf(2)));
    }

    #[test]
    fn buffer_targets_are_independent() {
        let mut table = BindingTable::new();
        table.bind_buffer(glow::ARRAY_BUFFER, Some(buf(1)));
        table.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buf(2)));
        assert_eq!(table.buffer(glow::ARRAY_BUFFER), Some(buf(1)));
        assert_eq!(table.buffer(glow::ELEMENT_ARRAY_BUFFER), Some(buf(2)));
    }

    #[test]
    fn redundant_bind_reports_no_change_and_records_no_event() {
        let mut table = BindingTable::new();
        table.set_recording(true);
        assert!(table.bind_buffer(glow::ARRAY_BUFFER, Some(buf(1))));
        assert!(!table.bind_buffer(glow::ARRAY_BUFFER, Some(buf(1))));
        let events = table.take_events();
        assert_eq!(
            events,
            vec![BindEvent::Buffer {
                target: glow::ARRAY_BUFFER,
                buffer: Some(buf(1)),
            }]
        );
    }

    #[test]
    fn recorded_events_preserve_bind_order() {
        let mut table = BindingTable::new();
        table.set_recording(true);
        table.use_program(Some(prog(7)));
        table.bind_buffer(glow::ARRAY_BUFFER, Some(buf(1)));
        table.set_active_unit(2);
        table.bind_texture(glow::TEXTURE_2D, Some(tex(3)));
        table.bind_buffer(glow::ARRAY_BUFFER, None);

        assert_eq!(
            table.take_events(),
            vec![
                BindEvent::Program(Some(prog(7))),
                BindEvent::Buffer {
                    target: glow::ARRAY_BUFFER,
                    buffer: Some(buf(1)),
                },
                BindEvent::ActiveUnit(2),
                BindEvent::Texture {
                    unit: 2,
                    target: glow::TEXTURE_2D,
                    texture: Some(tex(3)),
                },
                BindEvent::Buffer {
                    target: glow::ARRAY_BUFFER,
                    buffer: None,
                },
            ]
        );
    }

    #[test]
    fn texture_binds_are_tracked_per_unit_and_target() {
        let mut table = BindingTable::new();
        table.bind_texture(glow::TEXTURE_2D, Some(tex(1)));
        table.set_active_unit(1);
        table.bind_texture(glow::TEXTURE_2D, Some(tex(2)));
        table.bind_texture(glow::TEXTURE_CUBE_MAP, Some(tex(3)));

        assert_eq!(table.texture(0, glow::TEXTURE_2D), Some(tex(1)));
        assert_eq!(table.texture(1, glow::TEXTURE_2D), Some(tex(2)));
        assert_eq!(table.texture(1, glow::TEXTURE_CUBE_MAP), Some(tex(3)));
    }

    #[test]
    fn unbinding_clears_the_slot() {
        let mut table = BindingTable::new();
        table.bind_texture(glow::TEXTURE_2D, Some(tex(1)));
        table.bind_texture(glow::TEXTURE_2D, None);
        assert_eq!(table.texture(0, glow::TEXTURE_2D), None);
    }

    #[test]
    fn forget_buffer_clears_every_target_it_occupies() {
        let mut table = BindingTable::new();
        table.bind_buffer(glow::ARRAY_BUFFER, Some(buf(5)));
        table.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buf(5)));
        table.forget_buffer(buf(5));
        assert_eq!(table.buffer(glow::ARRAY_BUFFER), None);
        assert_eq!(table.buffer(glow::ELEMENT_ARRAY_BUFFER), None);
    }

    #[test]
    fn forget_texture_clears_all_units() {
        let mut table = BindingTable::new();
        table.bind_texture(glow::TEXTURE_2D, Some(tex(9)));
        table.set_active_unit(4);
        table.bind_texture(glow::TEXTURE_2D, Some(tex(9)));
        table.forget_texture(tex(9));
        assert_eq!(table.texture(0, glow::TEXTURE_2D), None);
        assert_eq!(table.texture(4, glow::TEXTURE_2D), None);
    }

    #[test]
    fn forget_program_only_clears_if_current() {
        let mut table = BindingTable::new();
        table.use_program(Some(prog(1)));
        table.forget_program(prog(2));
        assert_eq!(table.program(), Some(prog(1)));
        table.forget_program(prog(1));
        assert_eq!(table.program(), None);
    }

    #[test]
    #[ignore = "requires GL context"]
    fn gl_context_skips_redundant_native_binds() {
        // Would test: two consecutive bind_buffer calls with the same
        // handle issue exactly one native glBindBuffer.
    }
}
