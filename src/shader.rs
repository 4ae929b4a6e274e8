//! Shader stage objects.
//!
//! A shader owns its source text and tracks compiled state. Compilation
//! is idempotent while the source is unchanged; replacing the source
//! invalidates the compiled state (and unlinks any program holding the
//! shader). Compile failure carries the driver's info log verbatim,
//! with numbered source lines prepended so log line references can be
//! matched against the GLSL. That log is the primary debugging signal
//! of this layer and is always propagated, never swallowed.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::context::GlContext;
use crate::error::GlError;
use crate::object::{GlObject, Lifecycle, ObjectState};

#[derive(Debug)]
struct ShaderInner {
    lifecycle: Lifecycle,
    stage: u32,
    stage_name: &'static str,
    source: String,
    handle: Option<glow::Shader>,
    compiled: bool,
    revision: u64,
}

/// Shared implementation of both shader stages.
#[derive(Debug, Clone)]
pub(crate) struct ShaderCore {
    inner: Rc<RefCell<ShaderInner>>,
}

impl ShaderCore {
    fn new(stage: u32, stage_name: &'static str, source: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ShaderInner {
                lifecycle: Lifecycle::new(),
                stage,
                stage_name,
                source: source.into(),
                handle: None,
                compiled: false,
                revision: 0,
            })),
        }
    }

    fn state(&self) -> ObjectState {
        self.inner.borrow().lifecycle.state()
    }

    fn source(&self) -> String {
        self.inner.borrow().source.clone()
    }

    fn set_source(&self, source: impl Into<String>) -> Result<(), GlError> {
        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("set_source")?;
        inner.source = source.into();
        inner.compiled = false;
        inner.revision += 1;
        inner.lifecycle.set_dirty();
        Ok(())
    }

    fn is_compiled(&self) -> bool {
        self.inner.borrow().compiled
    }

    /// Monotonic source revision; bumps on every `set_source`. Programs
    /// compare this against the revision they linked to decide whether
    /// a relink is needed.
    pub(crate) fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    pub(crate) fn native_handle(&self) -> Option<glow::Shader> {
        self.inner.borrow().handle
    }

    #[allow(unsafe_code)]
    pub(crate) fn compile(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        inner.lifecycle.guard("compile")?;
        if inner.compiled {
            return Ok(());
        }

        let gl = ctx.gl();
        let shader = match inner.handle {
            Some(shader) => shader,
            None => {
                // SAFETY: stage is VERTEX_SHADER or FRAGMENT_SHADER,
                // fixed at construction.
                let shader = unsafe { gl.create_shader(inner.stage) }.map_err(|reason| {
                    GlError::ResourceCreation {
                        kind: "shader",
                        reason,
                    }
                })?;
                inner.handle = Some(shader);
                inner.lifecycle.mark_created();
                shader
            }
        };

        // SAFETY: shader is the live handle created above; source is a
        // valid string.
        let compiled = unsafe {
            gl.shader_source(shader, &inner.source);
            gl.compile_shader(shader);
            gl.get_shader_compile_status(shader)
        };

        if !compiled {
            // SAFETY: shader is a live handle; reading the info log has
            // no side effects. The handle is kept so a corrected source
            // can be compiled into it later.
            let log = unsafe { gl.get_shader_info_log(shader) };
            inner.compiled = false;
            return Err(GlError::ShaderCompile {
                stage: inner.stage_name,
                log: format_shader_error(&inner.source, &log),
            });
        }

        inner.compiled = true;
        inner.lifecycle.clear_dirty();
        debug!("{} shader compiled (revision {})", inner.stage_name, inner.revision);
        Ok(())
    }

    fn deactivate(&self) -> Result<(), GlError> {
        // Shaders have no bind target of their own; deactivation only
        // checks liveness.
        self.inner.borrow().lifecycle.guard("deactivate")
    }

    #[allow(unsafe_code)]
    fn delete(&self, ctx: &mut GlContext) {
        use glow::HasContext;

        let mut inner = self.inner.borrow_mut();
        if let Some(shader) = inner.handle.take() {
            // SAFETY: shader is a live handle owned by this object;
            // deleting it at most once.
            unsafe { ctx.gl().delete_shader(shader) };
        }
        inner.compiled = false;
        inner.lifecycle.mark_deleted();
    }
}

/// A vertex shader stage.
#[derive(Debug, Clone)]
pub struct VertexShader {
    pub(crate) core: ShaderCore,
}

impl VertexShader {
    /// Creates a vertex shader from source. No GL call is made until
    /// first compilation.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            core: ShaderCore::new(glow::VERTEX_SHADER, "vertex", source),
        }
    }

    /// The current source text.
    pub fn source(&self) -> String {
        self.core.source()
    }

    /// Replaces the source, invalidating the compiled state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the shader has been deleted.
    pub fn set_source(&self, source: impl Into<String>) -> Result<(), GlError> {
        self.core.set_source(source)
    }

    /// Whether the current source has been compiled successfully.
    pub fn is_compiled(&self) -> bool {
        self.core.is_compiled()
    }

    /// Compiles the current source. Idempotent while the source is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ShaderCompile` with the driver log on rejection.
    pub fn compile(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.compile(ctx)
    }
}

impl GlObject for VertexShader {
    fn state(&self) -> ObjectState {
        self.core.state()
    }

    fn activate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.compile(ctx)
    }

    fn deactivate(&self, _ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.deactivate()
    }

    fn delete(&self, ctx: &mut GlContext) {
        self.core.delete(ctx);
    }
}

/// A fragment shader stage.
#[derive(Debug, Clone)]
pub struct FragmentShader {
    pub(crate) core: ShaderCore,
}

impl FragmentShader {
    /// Creates a fragment shader from source. No GL call is made until
    /// first compilation.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            core: ShaderCore::new(glow::FRAGMENT_SHADER, "fragment", source),
        }
    }

    /// The current source text.
    pub fn source(&self) -> String {
        self.core.source()
    }

    /// Replaces the source, invalidating the compiled state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the shader has been deleted.
    pub fn set_source(&self, source: impl Into<String>) -> Result<(), GlError> {
        self.core.set_source(source)
    }

    /// Whether the current source has been compiled successfully.
    pub fn is_compiled(&self) -> bool {
        self.core.is_compiled()
    }

    /// Compiles the current source. Idempotent while the source is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ShaderCompile` with the driver log on rejection.
    pub fn compile(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.compile(ctx)
    }
}

impl GlObject for FragmentShader {
    fn state(&self) -> ObjectState {
        self.core.state()
    }

    fn activate(&self, ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.compile(ctx)
    }

    fn deactivate(&self, _ctx: &mut GlContext) -> Result<(), GlError> {
        self.core.deactivate()
    }

    fn delete(&self, ctx: &mut GlContext) {
        self.core.delete(ctx);
    }
}

/// Formats a compile failure for human-readable debugging: the source
/// with right-aligned line numbers, then the driver log. Driver logs
/// reference line numbers, so numbering the source lets the reader
/// correlate them directly.
pub fn format_shader_error(source: &str, log: &str) -> String {
    if source.is_empty() {
        return log.to_string();
    }

    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().to_string().len();
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&format!("{:>width$}: {line}\n", i + 1));
    }

    if log.is_empty() {
        // Drop the trailing newline for a clean message.
        out.pop();
    } else {
        out.push('\n');
        out.push_str(log);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERT: &str = "#version 300 es\nin vec3 a_position;\nvoid main() { gl_Position = vec4(a_position, 1.0); }\n";

    #[test]
    fn new_shader_is_unloaded_and_uncompiled() {
        let vs = VertexShader::new(VERT);
        assert_eq!(vs.state(), ObjectState::Unloaded);
        assert!(!vs.is_compiled());
    }

    #[test]
    fn set_source_bumps_revision_and_clears_compiled() {
        let vs = VertexShader::new(VERT);
        let before = vs.core.revision();
        vs.set_source("void main() {}").unwrap();
        assert_eq!(vs.core.revision(), before + 1);
        assert!(!vs.is_compiled());
        assert_eq!(vs.source(), "void main() {}");
    }

    #[test]
    fn unchanged_source_keeps_revision_stable() {
        let fs = FragmentShader::new("void main() {}");
        let before = fs.core.revision();
        let _ = fs.source();
        assert_eq!(fs.core.revision(), before);
    }

    #[test]
    fn clones_share_the_same_shader() {
        let vs = VertexShader::new(VERT);
        let alias = vs.clone();
        alias.set_source("void main() {}").unwrap();
        assert_eq!(vs.source(), "void main() {}");
        assert_eq!(vs.core.revision(), alias.core.revision());
    }

    #[test]
    fn format_shader_error_numbers_lines_and_appends_log() {
        let out = format_shader_error("a\nb\nc", "ERROR: 0:2: oops");
        assert!(out.contains("1: a"), "missing line 1 in:\n{out}");
        assert!(out.contains("2: b"), "missing line 2 in:\n{out}");
        assert!(out.contains("3: c"), "missing line 3 in:\n{out}");
        assert!(out.contains("ERROR: 0:2: oops"), "missing log in:\n{out}");
    }

    #[test]
    fn format_shader_error_right_aligns_numbers_past_nine_lines() {
        let source = (0..12).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
        let out = format_shader_error(&source, "");
        assert!(out.contains(" 1: l0"), "expected padded '1:' in:\n{out}");
        assert!(out.contains("12: l11"), "expected '12:' in:\n{out}");
    }

    #[test]
    fn format_shader_error_with_empty_source_is_the_log() {
        assert_eq!(format_shader_error("", "some error"), "some error");
    }

    #[test]
    fn format_shader_error_with_empty_log_has_no_trailing_newline() {
        let out = format_shader_error("void main() {}", "");
        assert_eq!(out, "1: void main() {}");
    }

    #[test]
    #[ignore = "requires GL context"]
    fn compile_is_idempotent_for_unchanged_source() {
        // Would test: two compile() calls issue exactly one native
        // glCompileShader; the second returns Ok immediately.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn compile_failure_carries_driver_log() {
        // Would test: compiling "not glsl" returns ShaderCompile whose
        // log contains the driver's message and numbered source.
    }
}
