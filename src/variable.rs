//! Tagged values bindable to program variables.
//!
//! The kind of a binding is carried by an explicit variant tag, not
//! inferred from runtime types: a [`BufferView`] binds as a vertex
//! attribute, a texture as a sampler uniform, and anything convertible
//! to a [`UniformValue`] as a plain uniform. The `From` impls make
//! `program.bind(name, value)` read like an assignment.

use crate::buffer::BufferView;
use crate::texture::{Texture2D, Texture3D, TextureCubeMap, TextureCore};

/// A scalar, vector, or matrix uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

impl UniformValue {
    /// Readable kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Mat2(_) => "mat2",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
        }
    }

    /// Whether this value can be uploaded to a uniform of the given
    /// introspected GL type.
    pub(crate) fn matches_gl_type(&self, utype: u32) -> bool {
        match self {
            UniformValue::Float(_) => utype == glow::FLOAT,
            UniformValue::Int(_) => {
                matches!(utype, glow::INT | glow::BOOL | glow::UNSIGNED_INT)
            }
            UniformValue::Vec2(_) => utype == glow::FLOAT_VEC2,
            UniformValue::Vec3(_) => utype == glow::FLOAT_VEC3,
            UniformValue::Vec4(_) => utype == glow::FLOAT_VEC4,
            UniformValue::Mat2(_) => utype == glow::FLOAT_MAT2,
            UniformValue::Mat3(_) => utype == glow::FLOAT_MAT3,
            UniformValue::Mat4(_) => utype == glow::FLOAT_MAT4,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<(f32, f32)> for UniformValue {
    fn from(v: (f32, f32)) -> Self {
        UniformValue::Vec2([v.0, v.1])
    }
}

impl From<(f32, f32, f32)> for UniformValue {
    fn from(v: (f32, f32, f32)) -> Self {
        UniformValue::Vec3([v.0, v.1, v.2])
    }
}

impl From<(f32, f32, f32, f32)> for UniformValue {
    fn from(v: (f32, f32, f32, f32)) -> Self {
        UniformValue::Vec4([v.0, v.1, v.2, v.3])
    }
}

impl From<glam::Vec2> for UniformValue {
    fn from(v: glam::Vec2) -> Self {
        UniformValue::Vec2(v.to_array())
    }
}

impl From<glam::Vec3> for UniformValue {
    fn from(v: glam::Vec3) -> Self {
        UniformValue::Vec3(v.to_array())
    }
}

impl From<glam::Vec4> for UniformValue {
    fn from(v: glam::Vec4) -> Self {
        UniformValue::Vec4(v.to_array())
    }
}

impl From<glam::Mat2> for UniformValue {
    fn from(m: glam::Mat2) -> Self {
        UniformValue::Mat2(m.to_cols_array())
    }
}

impl From<glam::Mat3> for UniformValue {
    fn from(m: glam::Mat3) -> Self {
        UniformValue::Mat3(m.to_cols_array())
    }
}

impl From<glam::Mat4> for UniformValue {
    fn from(m: glam::Mat4) -> Self {
        UniformValue::Mat4(m.to_cols_array())
    }
}

/// A texture bound as a sampler uniform.
#[derive(Debug, Clone)]
pub enum Sampler {
    Texture2D(Texture2D),
    Texture3D(Texture3D),
    CubeMap(TextureCubeMap),
}

impl Sampler {
    /// Readable kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Sampler::Texture2D(_) => "sampler2D",
            Sampler::Texture3D(_) => "sampler3D",
            Sampler::CubeMap(_) => "samplerCube",
        }
    }

    /// Whether this texture matches the introspected sampler type.
    pub(crate) fn matches_gl_type(&self, utype: u32) -> bool {
        match self {
            Sampler::Texture2D(_) => utype == glow::SAMPLER_2D,
            Sampler::Texture3D(_) => utype == glow::SAMPLER_3D,
            Sampler::CubeMap(_) => utype == glow::SAMPLER_CUBE,
        }
    }

    pub(crate) fn core(&self) -> &TextureCore {
        match self {
            Sampler::Texture2D(t) => t.core(),
            Sampler::Texture3D(t) => t.core(),
            Sampler::CubeMap(t) => t.core(),
        }
    }
}

/// A value bound to a named program variable. The variant determines
/// the binding kind.
#[derive(Debug, Clone)]
pub enum Variable {
    /// A per-vertex input sourced from a buffer view.
    Attribute(BufferView),
    /// A texture sampled through an assigned texture unit.
    Sampler(Sampler),
    /// A per-draw constant.
    Uniform(UniformValue),
}

impl Variable {
    /// Readable kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Variable::Attribute(_) => "attribute",
            Variable::Sampler(s) => s.kind_name(),
            Variable::Uniform(u) => u.kind_name(),
        }
    }
}

impl From<BufferView> for Variable {
    fn from(view: BufferView) -> Self {
        Variable::Attribute(view)
    }
}

impl From<Texture2D> for Variable {
    fn from(texture: Texture2D) -> Self {
        Variable::Sampler(Sampler::Texture2D(texture))
    }
}

impl From<Texture3D> for Variable {
    fn from(texture: Texture3D) -> Self {
        Variable::Sampler(Sampler::Texture3D(texture))
    }
}

impl From<TextureCubeMap> for Variable {
    fn from(texture: TextureCubeMap) -> Self {
        Variable::Sampler(Sampler::CubeMap(texture))
    }
}

impl From<UniformValue> for Variable {
    fn from(value: UniformValue) -> Self {
        Variable::Uniform(value)
    }
}

impl From<f32> for Variable {
    fn from(v: f32) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<i32> for Variable {
    fn from(v: i32) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<[f32; 2]> for Variable {
    fn from(v: [f32; 2]) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<[f32; 3]> for Variable {
    fn from(v: [f32; 3]) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<[f32; 4]> for Variable {
    fn from(v: [f32; 4]) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<(f32, f32)> for Variable {
    fn from(v: (f32, f32)) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<(f32, f32, f32)> for Variable {
    fn from(v: (f32, f32, f32)) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<(f32, f32, f32, f32)> for Variable {
    fn from(v: (f32, f32, f32, f32)) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<glam::Vec2> for Variable {
    fn from(v: glam::Vec2) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<glam::Vec3> for Variable {
    fn from(v: glam::Vec3) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<glam::Vec4> for Variable {
    fn from(v: glam::Vec4) -> Self {
        Variable::Uniform(v.into())
    }
}

impl From<glam::Mat2> for Variable {
    fn from(m: glam::Mat2) -> Self {
        Variable::Uniform(m.into())
    }
}

impl From<glam::Mat3> for Variable {
    fn from(m: glam::Mat3) -> Self {
        Variable::Uniform(m.into())
    }
}

impl From<glam::Mat4> for Variable {
    fn from(m: glam::Mat4) -> Self {
        Variable::Uniform(m.into())
    }
}
