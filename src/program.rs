//! Shader programs: linking, variable binding, and draw dispatch.
//!
//! A [`Program`] holds shared handles to a vertex and a fragment shader
//! and an insertion-ordered map from variable names to bound values.
//! It is linkable only when both shaders are present and compile; any
//! attach, or a source change on an attached shader, returns it to the
//! unlinked state and the next draw relinks.
//!
//! Binding follows the tagged value kind: buffer views bind as vertex
//! attributes, textures as sampler uniforms (texture units assigned in
//! binding order at draw time), everything else as plain uniforms.
//! Names are validated against the linked program's active variables:
//! strict binds fail with `UnknownVariable`, bulk binds via
//! [`Program::set_vars`] skip silently but observably (skips are
//! counted and logged).
//!
//! After a draw, every bound object stays bound. State leaks across
//! draw calls on purpose, mirroring the underlying stateful context;
//! callers must not assume isolation between consecutive draws.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info, trace};

use crate::buffer::ElementBuffer;
use crate::buffer::VertexBuffer;
use crate::context::GlContext;
use crate::enums::{self, EnumParam};
use crate::error::GlError;
use crate::object::{GlObject, Lifecycle, ObjectState};
use crate::shader::{FragmentShader, VertexShader};
use crate::variable::{UniformValue, Variable};

/// An active variable discovered by program introspection after a link.
#[derive(Debug, Clone)]
enum ActiveKind {
    Attribute {
        location: u32,
    },
    Uniform {
        location: Option<glow::UniformLocation>,
        utype: u32,
    },
}

#[derive(Debug)]
struct BindingEntry {
    name: String,
    value: Variable,
    /// Bulk bindings (from `set_vars`) are dropped with a counted skip
    /// when they name nothing active; strict bindings error instead.
    lenient: bool,
}

#[derive(Debug)]
struct ProgramInner {
    lifecycle: Lifecycle,
    vertex: Option<VertexShader>,
    fragment: Option<FragmentShader>,
    handle: Option<glow::Program>,
    linked: bool,
    linked_revisions: (u64, u64),
    attached: Vec<glow::Shader>,
    entries: Vec<BindingEntry>,
    actives: HashMap<String, ActiveKind>,
    skipped: usize,
}

/// A linked shader program with named variable bindings.
///
/// Cheap to clone; clones share the same underlying program.
#[derive(Debug, Clone)]
pub struct Program {
    inner: Rc<RefCell<ProgramInner>>,
}

impl Program {
    /// Creates an empty program with no shaders attached.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ProgramInner {
                lifecycle: Lifecycle::new(),
                vertex: None,
                fragment: None,
                handle: None,
                linked: false,
                linked_revisions: (0, 0),
                attached: Vec::new(),
                entries: Vec::new(),
                actives: HashMap::new(),
                skipped: 0,
            })),
        }
    }

    /// Creates a program from vertex and fragment shader sources.
    pub fn from_sources(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        let program = Self::new();
        {
            let mut inner = program.inner.borrow_mut();
            inner.vertex = Some(VertexShader::new(vertex));
            inner.fragment = Some(FragmentShader::new(fragment));
        }
        program
    }

    /// Attaches (or replaces) the vertex shader. Returns the program to
    /// the unlinked state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the program has been deleted.
    pub fn attach_vertex(&self, shader: VertexShader) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("attach")?;
        inner.vertex = Some(shader);
        inner.linked = false;
        inner.lifecycle.set_dirty();
        Ok(())
    }

    /// Attaches (or replaces) the fragment shader. Returns the program
    /// to the unlinked state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the program has been deleted.
    pub fn attach_fragment(&self, shader: FragmentShader) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("attach")?;
        inner.fragment = Some(shader);
        inner.linked = false;
        inner.lifecycle.set_dirty();
        Ok(())
    }

    /// Whether the program linked successfully and no attached shader
    /// has changed since.
    pub fn is_linked(&self) -> bool {
        let inner = self.inner.borrow();
        inner.linked && !revisions_changed(&inner)
    }

    /// Whether both a vertex and a fragment shader are attached.
    pub fn can_link(&self) -> bool {
        let inner = self.inner.borrow();
        inner.vertex.is_some() && inner.fragment.is_some()
    }

    /// Binds a value to a named program variable, replacing any
    /// previous binding of that name (its position in binding order is
    /// kept).
    ///
    /// # Errors
    ///
    /// On a linked program, returns `UnknownVariable` if the name is
    /// not an active attribute or uniform, and `InvalidType` if the
    /// value kind does not match the variable. On an unlinked program
    /// validation is deferred to the next link.
    pub fn bind(&self, name: &str, value: impl Into<Variable>) -> Result<(), GlError> {
        let value = value.into();
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("bind")?;

        if inner.linked {
            match inner.actives.get(name) {
                None => return Err(GlError::UnknownVariable(name.to_string())),
                Some(active) => check_kind(name, &value, active)?,
            }
        }

        upsert(&mut inner.entries, name, value, false);
        inner.lifecycle.set_dirty();
        Ok(())
    }

    /// The value currently bound to a name, if any.
    pub fn get(&self, name: &str) -> Option<Variable> {
        self.inner
            .borrow()
            .entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.clone())
    }

    /// Removes a binding. Returns whether one was present.
    pub fn unbind(&self, name: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.name != name);
        inner.entries.len() != before
    }

    /// Names of the bound variables, in binding order.
    pub fn variable_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Binds every field of a structured buffer to the like-named
    /// program variable. Fields with no matching active variable are
    /// skipped, not errors: the skip is counted (see
    /// [`Self::skipped_vars`]), logged at debug level, and the number
    /// of fields skipped by this call is returned.
    ///
    /// On an unlinked program all fields are stored and the unmatched
    /// ones are dropped (and counted) at the next link.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the program has been deleted.
    pub fn set_vars(&self, buffer: &VertexBuffer) -> Result<usize, GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("set_vars")?;

        let mut skipped_now = 0;
        for field in buffer.field_names() {
            if inner.linked && !inner.actives.contains_key(&field) {
                debug!("set_vars: no active variable '{field}', skipping");
                skipped_now += 1;
                continue;
            }
            let view = buffer.view(&field)?;
            upsert(&mut inner.entries, &field, Variable::Attribute(view), true);
        }
        inner.skipped += skipped_now;
        inner.lifecycle.set_dirty();
        Ok(skipped_now)
    }

    /// Running count of bulk-bound fields skipped because they matched
    /// no active variable. Makes the permissive `set_vars` behavior
    /// observable instead of silent.
    pub fn skipped_vars(&self) -> usize {
        self.inner.borrow().skipped
    }

    /// Compiles attached shaders as needed, links, introspects active
    /// variables, and validates the stored bindings.
    ///
    /// # Errors
    ///
    /// Returns `ShaderLink` if shaders are missing or the driver
    /// rejects the link, `ShaderCompile` for a failing shader,
    /// `UnknownVariable`/`InvalidType` for invalid strict bindings.
    #[allow(unsafe_code)]
    pub fn link(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("link")?;

        let (vertex, fragment) = match (&inner.vertex, &inner.fragment) {
            (Some(v), Some(f)) => (v.clone(), f.clone()),
            _ => {
                return Err(GlError::ShaderLink(
                    "a vertex and a fragment shader must be attached before linking".into(),
                ))
            }
        };

        // Compile failures propagate verbatim; they are the primary
        // debugging signal of this layer.
        vertex.compile(ctx)?;
        fragment.compile(ctx)?;

        let program = match inner.handle {
            Some(program) => program,
            None => {
                // SAFETY: plain object creation on a current context.
                let program = unsafe { ctx.gl().create_program() }.map_err(|reason| {
                    GlError::ResourceCreation {
                        kind: "program",
                        reason,
                    }
                })?;
                inner.handle = Some(program);
                inner.lifecycle.mark_created();
                program
            }
        };

        let natives = [
            vertex.core.native_handle(),
            fragment.core.native_handle(),
        ];
        let natives: Vec<glow::Shader> = natives.into_iter().flatten().collect();

        // Detach stale shaders, attach current ones. Compiling into an
        // existing shader handle keeps it attached, so this only churns
        // when a shader object was replaced.
        let stale: Vec<glow::Shader> = inner
            .attached
            .iter()
            .copied()
            .filter(|s| !natives.contains(s))
            .collect();
        for shader in stale {
            // SAFETY: shader was attached to program by a previous link.
            unsafe { ctx.gl().detach_shader(program, shader) };
        }
        for shader in &natives {
            if !inner.attached.contains(shader) {
                // SAFETY: program and shader are live handles.
                unsafe { ctx.gl().attach_shader(program, *shader) };
            }
        }
        inner.attached = natives;

        // SAFETY: program is a live handle with both stages attached.
        let linked = unsafe {
            ctx.gl().link_program(program);
            ctx.gl().get_program_link_status(program)
        };
        if !linked {
            // SAFETY: reading the info log of a live program handle.
            let log = unsafe { ctx.gl().get_program_info_log(program) };
            inner.linked = false;
            return Err(GlError::ShaderLink(log));
        }

        // Introspect active attributes and uniforms; bindings are
        // validated against this set.
        inner.actives.clear();
        // SAFETY: introspection queries on a successfully linked program.
        unsafe {
            let gl = ctx.gl();
            for i in 0..gl.get_active_attributes(program) {
                if let Some(attr) = gl.get_active_attribute(program, i) {
                    if let Some(location) = gl.get_attrib_location(program, &attr.name) {
                        inner
                            .actives
                            .insert(attr.name, ActiveKind::Attribute { location });
                    }
                }
            }
            for i in 0..gl.get_active_uniforms(program) {
                if let Some(uniform) = gl.get_active_uniform(program, i) {
                    let location = gl.get_uniform_location(program, &uniform.name);
                    // Array uniforms introspect as "name[0]".
                    let name = uniform
                        .name
                        .strip_suffix("[0]")
                        .unwrap_or(&uniform.name)
                        .to_string();
                    inner.actives.insert(
                        name,
                        ActiveKind::Uniform {
                            location,
                            utype: uniform.utype,
                        },
                    );
                }
            }
        }

        inner.linked = true;
        inner.linked_revisions = (vertex.core.revision(), fragment.core.revision());

        validate_entries(&mut inner)?;

        info!(
            "program linked: {} active variables, {} bindings",
            inner.actives.len(),
            inner.entries.len()
        );
        Ok(())
    }

    /// Issues a draw call with the current bindings.
    ///
    /// Relinks first if needed (never linked, shader source changed).
    /// Bound textures are activated on texture units assigned in
    /// binding order; attribute pointers are re-specified from each
    /// view's descriptor. With an element buffer the draw is indexed
    /// using its element count and index type; without one the vertex
    /// count is the minimum record count over the bound attributes.
    ///
    /// Nothing is unbound afterwards.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEnum`/`InvalidType` for a bad mode, compile and
    /// link errors from relinking, and `InvalidState` for a deleted
    /// program or a non-indexed draw with no attributes bound.
    #[allow(unsafe_code)]
    pub fn draw<'a>(
        &self,
        ctx: &mut GlContext,
        mode: impl Into<EnumParam<'a>>,
        elements: Option<&ElementBuffer>,
    ) -> Result<(), GlError> {
        use glow::HasContext;

        let mode = enums::resolve(mode)?;
        if !enums::DRAW_MODES.contains(&mode) {
            return Err(GlError::InvalidType {
                name: "mode".into(),
                expected: "a primitive draw mode".into(),
                got: format!("0x{mode:04X}"),
            });
        }

        {
            let inner = self.inner.borrow();
            inner.lifecycle.guard("draw")?;
            if !inner.linked || inner.handle.is_none() || revisions_changed(&inner) {
                drop(inner);
                self.link(ctx)?;
            }
        }

        let inner = self.inner.borrow();
        let program = inner.handle.ok_or(GlError::InvalidState {
            operation: "draw",
            state: inner.lifecycle.state(),
        })?;

        ctx.use_program(Some(program));
        ctx.ensure_vertex_array()?;

        let mut unit: u32 = 0;
        let mut vertex_count: Option<usize> = None;

        for entry in &inner.entries {
            match (&entry.value, inner.actives.get(&entry.name)) {
                (Variable::Attribute(view), Some(ActiveKind::Attribute { location })) => {
                    view.buffer().activate(ctx)?;
                    let desc = view.descriptor();
                    // SAFETY: the view's buffer is bound to ARRAY_BUFFER
                    // and the descriptor was validated against it.
                    unsafe {
                        ctx.gl().enable_vertex_attrib_array(*location);
                        ctx.gl().vertex_attrib_pointer_f32(
                            *location,
                            desc.count() as i32,
                            desc.dtype().gl_type(),
                            false,
                            desc.stride() as i32,
                            desc.offset() as i32,
                        );
                    }
                    let count = view.vertex_count();
                    vertex_count = Some(vertex_count.map_or(count, |c| c.min(count)));
                }
                (Variable::Sampler(sampler), Some(ActiveKind::Uniform { location, .. })) => {
                    ctx.set_active_unit(unit);
                    sampler.core().activate(ctx)?;
                    if let Some(location) = location {
                        // SAFETY: location belongs to the bound program.
                        unsafe {
                            ctx.gl().uniform_1_i32(Some(location), unit as i32);
                        }
                    }
                    unit += 1;
                }
                (Variable::Uniform(value), Some(ActiveKind::Uniform { location, .. })) => {
                    if let Some(location) = location {
                        upload_uniform(ctx, location, value);
                    }
                }
                // Entries are validated at link; a leftover mismatch
                // (e.g. an active variable optimized away by a relink)
                // is skipped rather than crashing the draw.
                (_, _) => {
                    trace!("draw: binding '{}' has no matching active variable", entry.name);
                }
            }
        }

        match elements {
            Some(elements) => {
                elements.core().activate(ctx)?;
                let count = elements.len();
                // SAFETY: the element buffer is bound and count/type
                // describe exactly its contents.
                unsafe {
                    ctx.gl().draw_elements(
                        mode,
                        count as i32,
                        elements.index_type().gl_type(),
                        0,
                    );
                }
                trace!("indexed draw: {count} elements");
            }
            None => {
                let count = vertex_count.ok_or(GlError::InvalidState {
                    operation: "draw without any attribute bound",
                    state: inner.lifecycle.state(),
                })?;
                // SAFETY: attribute arrays are enabled and sized; count
                // is the minimum over the bound buffers.
                unsafe {
                    ctx.gl().draw_arrays(mode, 0, count as i32);
                }
                trace!("array draw: {count} vertices");
            }
        }
        Ok(())
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl GlObject for Program {
    fn state(&self) -> ObjectState {
        self.inner.borrow().lifecycle.state()
    }

    fn activate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        {
            let inner = self.inner.borrow();
            inner.lifecycle.guard("activate")?;
            if !inner.linked || inner.handle.is_none() || revisions_changed(&inner) {
                drop(inner);
                self.link(ctx)?;
            }
        }
        let mut inner = self.inner.borrow_mut();
        ctx.use_program(inner.handle);
        inner.lifecycle.mark_active();
        Ok(())
    }

    fn deactivate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("deactivate")?;
        ctx.use_program(None);
        inner.lifecycle.mark_inactive();
        Ok(())
    }

    #[allow(unsafe_code)]
    fn delete(&self, ctx: &mut GlContext) {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        if let Some(program) = inner.handle.take() {
            ctx.forget_program(program);
            // SAFETY: program is live and owned by this object; taken
            // so it is deleted at most once. Shaders are shared, not
            // owned, and stay alive.
            unsafe { ctx.gl().delete_program(program) };
        }
        inner.linked = false;
        inner.lifecycle.mark_deleted();
    }
}

fn revisions_changed(inner: &ProgramInner) -> bool {
    let current = (
        inner.vertex.as_ref().map_or(0, |v| v.core.revision()),
        inner.fragment.as_ref().map_or(0, |f| f.core.revision()),
    );
    current != inner.linked_revisions
}

/// Replaces the value bound to `name`, keeping its position in binding
/// order, or appends a new entry.
fn upsert(entries: &mut Vec<BindingEntry>, name: &str, value: Variable, lenient: bool) {
    if let Some(entry) = entries.iter_mut().find(|e| e.name == name) {
        entry.value = value;
        entry.lenient = lenient;
    } else {
        entries.push(BindingEntry {
            name: name.to_string(),
            value,
            lenient,
        });
    }
}

/// Checks a bound value against the introspected variable kind.
fn check_kind(name: &str, value: &Variable, active: &ActiveKind) -> Result<(), GlError> {
    match (value, active) {
        (Variable::Attribute(_), ActiveKind::Attribute { .. }) => Ok(()),
        (Variable::Sampler(sampler), ActiveKind::Uniform { utype, .. }) => {
            if sampler.matches_gl_type(*utype) {
                Ok(())
            } else {
                Err(GlError::InvalidType {
                    name: name.into(),
                    expected: format!("a texture for uniform type 0x{utype:04X}"),
                    got: sampler.kind_name().into(),
                })
            }
        }
        (Variable::Uniform(value), ActiveKind::Uniform { utype, .. }) => {
            if value.matches_gl_type(*utype) {
                Ok(())
            } else {
                Err(GlError::InvalidType {
                    name: name.into(),
                    expected: format!("a value for uniform type 0x{utype:04X}"),
                    got: value.kind_name().into(),
                })
            }
        }
        (value, ActiveKind::Attribute { .. }) => Err(GlError::InvalidType {
            name: name.into(),
            expected: "a buffer view for an attribute".into(),
            got: value.kind_name().into(),
        }),
        (Variable::Attribute(_), ActiveKind::Uniform { .. }) => Err(GlError::InvalidType {
            name: name.into(),
            expected: "a uniform value".into(),
            got: "attribute".into(),
        }),
    }
}

/// Drops lenient entries that name nothing active (counted skips) and
/// validates the rest. Strict entries are kept even when invalid so the
/// program state stays coherent while the error is surfaced.
fn validate_entries(inner: &mut ProgramInner) -> Result<(), GlError> {
    let entries = std::mem::take(&mut inner.entries);
    let mut kept = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    let mut failure = None;
    for entry in entries {
        match inner.actives.get(&entry.name) {
            None if entry.lenient => {
                debug!("link: no active variable '{}', dropping bulk binding", entry.name);
                skipped += 1;
                continue;
            }
            None => {
                if failure.is_none() {
                    failure = Some(GlError::UnknownVariable(entry.name.clone()));
                }
            }
            Some(active) => {
                if failure.is_none() {
                    if let Err(err) = check_kind(&entry.name, &entry.value, active) {
                        failure = Some(err);
                    }
                }
            }
        }
        kept.push(entry);
    }
    inner.entries = kept;
    inner.skipped += skipped;
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Uploads a plain uniform value to its location.
#[allow(unsafe_code)]
fn upload_uniform(ctx: &GlContext, location: &glow::UniformLocation, value: &UniformValue) {
    use glow::HasContext;

    let gl = ctx.gl();
    // SAFETY: location belongs to the currently bound program and the
    // value kind was validated against the introspected uniform type.
    unsafe {
        match value {
            UniformValue::Float(v) => gl.uniform_1_f32(Some(location), *v),
            UniformValue::Int(v) => gl.uniform_1_i32(Some(location), *v),
            UniformValue::Vec2(v) => gl.uniform_2_f32(Some(location), v[0], v[1]),
            UniformValue::Vec3(v) => gl.uniform_3_f32(Some(location), v[0], v[1], v[2]),
            UniformValue::Vec4(v) => gl.uniform_4_f32(Some(location), v[0], v[1], v[2], v[3]),
            UniformValue::Mat2(m) => gl.uniform_matrix_2_f32_slice(Some(location), false, m),
            UniformValue::Mat3(m) => gl.uniform_matrix_3_f32_slice(Some(location), false, m),
            UniformValue::Mat4(m) => gl.uniform_matrix_4_f32_slice(Some(location), false, m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dtype, VertexLayout};
    use crate::texture::Texture2D;

    const VERT: &str = "void main() {}";
    const FRAG: &str = "void main() {}";

    fn quad_buffer() -> VertexBuffer {
        let layout = VertexLayout::new()
            .with("a_position", Dtype::F32, 3)
            .with("a_texcoord", Dtype::F32, 2);
        VertexBuffer::structured(layout, &vec![0u8; 4 * 20]).unwrap()
    }

    /// Puts a program into the linked state with a hand-built active
    /// variable set, standing in for driver introspection.
    fn force_linked(program: &Program, actives: &[(&str, ActiveKind)]) {
        let mut inner = program.inner.borrow_mut();
        inner.linked = true;
        inner.actives = actives
            .iter()
            .map(|(n, k)| (n.to_string(), k.clone()))
            .collect();
    }

    fn attribute() -> ActiveKind {
        ActiveKind::Attribute { location: 0 }
    }

    fn uniform(utype: u32) -> ActiveKind {
        ActiveKind::Uniform {
            location: None,
            utype,
        }
    }

    #[test]
    fn new_program_is_unlinked_and_cannot_link() {
        let program = Program::new();
        assert!(!program.is_linked());
        assert!(!program.can_link());
    }

    #[test]
    fn from_sources_attaches_both_stages() {
        let program = Program::from_sources(VERT, FRAG);
        assert!(program.can_link());
        assert!(!program.is_linked(), "linking requires a context");
    }

    #[test]
    fn attaching_only_one_stage_is_not_linkable() {
        let program = Program::new();
        program.attach_vertex(VertexShader::new(VERT)).unwrap();
        assert!(!program.can_link());
        program.attach_fragment(FragmentShader::new(FRAG)).unwrap();
        assert!(program.can_link());
    }

    #[test]
    fn attach_returns_a_linked_program_to_unlinked() {
        let program = Program::from_sources(VERT, FRAG);
        force_linked(&program, &[]);
        assert!(program.is_linked());
        program.attach_fragment(FragmentShader::new(FRAG)).unwrap();
        assert!(!program.is_linked());
    }

    #[test]
    fn shader_source_change_unlinks_the_program() {
        let program = Program::from_sources(VERT, FRAG);
        let vertex = program.inner.borrow().vertex.clone().unwrap();
        force_linked(&program, &[]);
        {
            // Record the revisions the link would have seen.
            let mut inner = program.inner.borrow_mut();
            inner.linked_revisions = (0, 0);
        }
        assert!(program.is_linked());
        vertex.set_source("void main() { }").unwrap();
        assert!(!program.is_linked(), "source change must unlink");
    }

    #[test]
    fn bindings_keep_insertion_order() {
        let program = Program::from_sources(VERT, FRAG);
        program.bind("u_color", 1.0_f32).unwrap();
        program.bind("a_position", quad_buffer().view("a_position").unwrap()).unwrap();
        program.bind("u_scale", 2.0_f32).unwrap();
        // Rebinding keeps the original position.
        program.bind("u_color", 0.5_f32).unwrap();
        assert_eq!(
            program.variable_names(),
            vec!["u_color", "a_position", "u_scale"]
        );
    }

    #[test]
    fn get_returns_the_bound_value() {
        let program = Program::from_sources(VERT, FRAG);
        program.bind("u_factor", 0.25_f32).unwrap();
        match program.get("u_factor") {
            Some(Variable::Uniform(UniformValue::Float(v))) => assert_eq!(v, 0.25),
            other => panic!("expected a float uniform, got {:?}", other.map(|v| v.kind_name())),
        }
        assert!(program.get("u_missing").is_none());
    }

    #[test]
    fn unbind_removes_a_binding() {
        let program = Program::from_sources(VERT, FRAG);
        program.bind("u_color", 1.0_f32).unwrap();
        assert!(program.unbind("u_color"));
        assert!(!program.unbind("u_color"));
        assert!(program.get("u_color").is_none());
    }

    #[test]
    fn bind_on_unlinked_program_defers_name_validation() {
        let program = Program::from_sources(VERT, FRAG);
        // Unknown name is fine until link introspects the actives.
        program.bind("u_maybe_misspelled", 1.0_f32).unwrap();
    }

    #[test]
    fn bind_unknown_name_on_linked_program_fails() {
        let program = Program::from_sources(VERT, FRAG);
        force_linked(&program, &[("u_color", uniform(glow::FLOAT_VEC4))]);
        let err = program.bind("u_colour", [0.0_f32; 4]).unwrap_err();
        match err {
            GlError::UnknownVariable(name) => assert_eq!(name, "u_colour"),
            other => panic!("expected UnknownVariable, got {other:?}"),
        }
    }

    #[test]
    fn bind_texture_to_non_sampler_uniform_fails() {
        let program = Program::from_sources(VERT, FRAG);
        force_linked(&program, &[("u_gamma", uniform(glow::FLOAT))]);
        let tex = Texture2D::from_u8(&[0u8; 4], 1, 1, 4).unwrap();
        let err = program.bind("u_gamma", tex).unwrap_err();
        assert!(matches!(err, GlError::InvalidType { .. }));
    }

    #[test]
    fn bind_texture_to_matching_sampler_succeeds() {
        let program = Program::from_sources(VERT, FRAG);
        force_linked(&program, &[("s_texture", uniform(glow::SAMPLER_2D))]);
        let tex = Texture2D::from_u8(&[0u8; 4], 1, 1, 4).unwrap();
        program.bind("s_texture", tex).unwrap();
    }

    #[test]
    fn bind_wrong_uniform_shape_fails() {
        let program = Program::from_sources(VERT, FRAG);
        force_linked(&program, &[("u_offset", uniform(glow::FLOAT_VEC2))]);
        assert!(program.bind("u_offset", (1.0_f32, 2.0_f32)).is_ok());
        assert!(matches!(
            program.bind("u_offset", 1.0_f32),
            Err(GlError::InvalidType { .. })
        ));
    }

    #[test]
    fn bind_uniform_to_attribute_slot_fails() {
        let program = Program::from_sources(VERT, FRAG);
        force_linked(&program, &[("a_position", attribute())]);
        assert!(matches!(
            program.bind("a_position", 1.0_f32),
            Err(GlError::InvalidType { .. })
        ));
        program
            .bind("a_position", quad_buffer().view("a_position").unwrap())
            .unwrap();
    }

    #[test]
    fn set_vars_binds_every_field_before_link() {
        let program = Program::from_sources(VERT, FRAG);
        let skipped = program.set_vars(&quad_buffer()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(
            program.variable_names(),
            vec!["a_position", "a_texcoord"],
            "fields bind in declared order"
        );
    }

    #[test]
    fn set_vars_skips_unmatched_fields_observably() {
        let program = Program::from_sources(VERT, FRAG);
        force_linked(&program, &[("a_position", attribute())]);
        let skipped = program.set_vars(&quad_buffer()).unwrap();
        assert_eq!(skipped, 1, "a_texcoord matches nothing");
        assert_eq!(program.skipped_vars(), 1);
        assert_eq!(program.variable_names(), vec!["a_position"]);

        // Skips accumulate across calls.
        let skipped = program.set_vars(&quad_buffer()).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(program.skipped_vars(), 2);
    }

    #[test]
    fn link_time_validation_drops_lenient_and_rejects_strict_unknowns() {
        let program = Program::from_sources(VERT, FRAG);
        // Stored before "link": one bulk field that will not match, one
        // strict binding that will.
        program.set_vars(&quad_buffer()).unwrap();
        program.bind("u_color", [1.0_f32; 4]).unwrap();

        let mut inner = program.inner.borrow_mut();
        inner.actives = [
            ("a_position".to_string(), attribute()),
            ("u_color".to_string(), uniform(glow::FLOAT_VEC4)),
        ]
        .into_iter()
        .collect();
        validate_entries(&mut inner).unwrap();
        assert_eq!(inner.skipped, 1, "a_texcoord dropped as a counted skip");
        assert_eq!(inner.entries.len(), 2);
        drop(inner);

        // A strict binding naming nothing active is an error instead.
        let program = Program::from_sources(VERT, FRAG);
        program.bind("u_typo", 1.0_f32).unwrap();
        let mut inner = program.inner.borrow_mut();
        inner.actives = HashMap::new();
        let err = validate_entries(&mut inner).unwrap_err();
        assert!(matches!(err, GlError::UnknownVariable(name) if name == "u_typo"));
    }

    #[test]
    fn deleted_program_rejects_binds() {
        let program = Program::from_sources(VERT, FRAG);
        program.inner.borrow_mut().lifecycle.mark_deleted();
        assert!(matches!(
            program.bind("u_color", 1.0_f32),
            Err(GlError::InvalidState { .. })
        ));
        assert!(matches!(
            program.set_vars(&quad_buffer()),
            Err(GlError::InvalidState { .. })
        ));
    }

    #[test]
    #[ignore = "requires GL context"]
    fn draw_assigns_texture_units_in_binding_order() {
        // Would test: two sampler bindings receive units 0 and 1 in the
        // order they were bound, asserted through the binding table.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn indexed_draw_uses_element_count_and_index_type() {
        // Would test: drawing with a 6-index u16 element buffer issues
        // one glDrawElements(mode, 6, UNSIGNED_SHORT, 0).
    }

    #[test]
    #[ignore = "requires GL context"]
    fn draw_leaves_bindings_in_place() {
        // Would test: after draw, the binding table still reports the
        // program, array buffer, and textures as bound.
    }
}
