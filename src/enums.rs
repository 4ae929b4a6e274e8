//! Symbolic name resolution for GL enums.
//!
//! Callers may pass either a raw `u32` constant or a human-readable
//! name such as `"triangles"` or `"GL_CLAMP_TO_EDGE"`. Resolution is
//! case-insensitive and tolerates the `GL_` prefix. Failures surface
//! immediately at the resolving call site, never at draw time.

use crate::error::GlError;

/// A parameter that names a GL enum, either symbolically or as a raw
/// constant value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumParam<'a> {
    /// A symbolic name, e.g. `"triangles"` or `"GL_LINEAR"`.
    Name(&'a str),
    /// An already-native constant, passed through unchanged.
    Value(u32),
}

impl<'a> From<&'a str> for EnumParam<'a> {
    fn from(name: &'a str) -> Self {
        EnumParam::Name(name)
    }
}

impl<'a> From<u32> for EnumParam<'a> {
    fn from(value: u32) -> Self {
        EnumParam::Value(value)
    }
}

/// Resolves a parameter to a native GL constant.
///
/// Names are uppercased and looked up with or without a `GL_` prefix;
/// raw values pass through unchanged.
///
/// # Errors
///
/// Returns `GlError::UnknownEnum` if a name does not map to any known
/// constant.
pub fn resolve<'a>(param: impl Into<EnumParam<'a>>) -> Result<u32, GlError> {
    match param.into() {
        EnumParam::Value(value) => Ok(value),
        EnumParam::Name(name) => {
            let upper = name.to_ascii_uppercase();
            let key = upper.strip_prefix("GL_").unwrap_or(&upper);
            lookup(key).ok_or_else(|| GlError::UnknownEnum(name.to_string()))
        }
    }
}

/// Resolves an optional parameter, passing `None` through unchanged.
///
/// # Errors
///
/// Returns `GlError::UnknownEnum` if a present name does not resolve.
pub fn resolve_opt<'a>(
    param: Option<impl Into<EnumParam<'a>>>,
) -> Result<Option<u32>, GlError> {
    match param {
        None => Ok(None),
        Some(p) => resolve(p).map(Some),
    }
}

/// Looks up a normalized (uppercase, prefix-stripped) name in the
/// known-constant table.
fn lookup(key: &str) -> Option<u32> {
    let value = match key {
        // Draw modes
        "POINTS" => glow::POINTS,
        "LINES" => glow::LINES,
        "LINE_LOOP" => glow::LINE_LOOP,
        "LINE_STRIP" => glow::LINE_STRIP,
        "TRIANGLES" => glow::TRIANGLES,
        "TRIANGLE_STRIP" => glow::TRIANGLE_STRIP,
        "TRIANGLE_FAN" => glow::TRIANGLE_FAN,

        // Texture filters
        "NEAREST" => glow::NEAREST,
        "LINEAR" => glow::LINEAR,
        "NEAREST_MIPMAP_NEAREST" => glow::NEAREST_MIPMAP_NEAREST,
        "LINEAR_MIPMAP_NEAREST" => glow::LINEAR_MIPMAP_NEAREST,
        "NEAREST_MIPMAP_LINEAR" => glow::NEAREST_MIPMAP_LINEAR,
        "LINEAR_MIPMAP_LINEAR" => glow::LINEAR_MIPMAP_LINEAR,

        // Texture wrap modes
        "CLAMP_TO_EDGE" => glow::CLAMP_TO_EDGE,
        "REPEAT" => glow::REPEAT,
        "MIRRORED_REPEAT" => glow::MIRRORED_REPEAT,

        // Pixel formats
        "RED" => glow::RED,
        "RG" => glow::RG,
        "RGB" => glow::RGB,
        "RGBA" => glow::RGBA,

        // Internal formats
        "R8" => glow::R8,
        "RG8" => glow::RG8,
        "RGB8" => glow::RGB8,
        "RGBA8" => glow::RGBA8,
        "R32F" => glow::R32F,
        "RGB16F" => glow::RGB16F,
        "RGBA16F" => glow::RGBA16F,
        "RGB32F" => glow::RGB32F,
        "RGBA32F" => glow::RGBA32F,
        "DEPTH_COMPONENT16" => glow::DEPTH_COMPONENT16,
        "DEPTH_COMPONENT24" => glow::DEPTH_COMPONENT24,
        "DEPTH_COMPONENT32F" => glow::DEPTH_COMPONENT32F,
        "DEPTH24_STENCIL8" => glow::DEPTH24_STENCIL8,
        "STENCIL_INDEX8" => glow::STENCIL_INDEX8,

        // Framebuffer attachment points
        "COLOR_ATTACHMENT0" => glow::COLOR_ATTACHMENT0,
        "COLOR_ATTACHMENT1" => glow::COLOR_ATTACHMENT1,
        "COLOR_ATTACHMENT2" => glow::COLOR_ATTACHMENT2,
        "COLOR_ATTACHMENT3" => glow::COLOR_ATTACHMENT3,
        "DEPTH_ATTACHMENT" => glow::DEPTH_ATTACHMENT,
        "STENCIL_ATTACHMENT" => glow::STENCIL_ATTACHMENT,
        "DEPTH_STENCIL_ATTACHMENT" => glow::DEPTH_STENCIL_ATTACHMENT,

        // Object targets
        "ARRAY_BUFFER" => glow::ARRAY_BUFFER,
        "ELEMENT_ARRAY_BUFFER" => glow::ELEMENT_ARRAY_BUFFER,
        "TEXTURE_2D" => glow::TEXTURE_2D,
        "TEXTURE_3D" => glow::TEXTURE_3D,
        "TEXTURE_CUBE_MAP" => glow::TEXTURE_CUBE_MAP,
        "FRAMEBUFFER" => glow::FRAMEBUFFER,
        "RENDERBUFFER" => glow::RENDERBUFFER,

        // Cube map faces
        "TEXTURE_CUBE_MAP_POSITIVE_X" => glow::TEXTURE_CUBE_MAP_POSITIVE_X,
        "TEXTURE_CUBE_MAP_NEGATIVE_X" => glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
        "TEXTURE_CUBE_MAP_POSITIVE_Y" => glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
        "TEXTURE_CUBE_MAP_NEGATIVE_Y" => glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
        "TEXTURE_CUBE_MAP_POSITIVE_Z" => glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
        "TEXTURE_CUBE_MAP_NEGATIVE_Z" => glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,

        // Buffer usage hints
        "STATIC_DRAW" => glow::STATIC_DRAW,
        "DYNAMIC_DRAW" => glow::DYNAMIC_DRAW,
        "STREAM_DRAW" => glow::STREAM_DRAW,

        // Element types
        "BYTE" => glow::BYTE,
        "UNSIGNED_BYTE" => glow::UNSIGNED_BYTE,
        "SHORT" => glow::SHORT,
        "UNSIGNED_SHORT" => glow::UNSIGNED_SHORT,
        "INT" => glow::INT,
        "UNSIGNED_INT" => glow::UNSIGNED_INT,
        "FLOAT" => glow::FLOAT,
        "HALF_FLOAT" => glow::HALF_FLOAT,

        // Shader stages
        "VERTEX_SHADER" => glow::VERTEX_SHADER,
        "FRAGMENT_SHADER" => glow::FRAGMENT_SHADER,

        _ => return None,
    };
    Some(value)
}

/// The set of constants accepted as draw modes.
pub(crate) const DRAW_MODES: &[u32] = &[
    glow::POINTS,
    glow::LINES,
    glow::LINE_LOOP,
    glow::LINE_STRIP,
    glow::TRIANGLES,
    glow::TRIANGLE_STRIP,
    glow::TRIANGLE_FAN,
];

/// The set of constants accepted as texture filters.
pub(crate) const FILTERS: &[u32] = &[
    glow::NEAREST,
    glow::LINEAR,
    glow::NEAREST_MIPMAP_NEAREST,
    glow::LINEAR_MIPMAP_NEAREST,
    glow::NEAREST_MIPMAP_LINEAR,
    glow::LINEAR_MIPMAP_LINEAR,
];

/// The set of constants accepted as texture wrap modes.
pub(crate) const WRAP_MODES: &[u32] = &[
    glow::CLAMP_TO_EDGE,
    glow::REPEAT,
    glow::MIRRORED_REPEAT,
];

/// The set of constants accepted as framebuffer attachment points.
pub(crate) const ATTACHMENT_POINTS: &[u32] = &[
    glow::COLOR_ATTACHMENT0,
    glow::COLOR_ATTACHMENT1,
    glow::COLOR_ATTACHMENT2,
    glow::COLOR_ATTACHMENT3,
    glow::DEPTH_ATTACHMENT,
    glow::STENCIL_ATTACHMENT,
    glow::DEPTH_STENCIL_ATTACHMENT,
];

/// The set of constants accepted as renderbuffer storage formats.
pub(crate) const RENDERBUFFER_FORMATS: &[u32] = &[
    glow::RGBA8,
    glow::RGB8,
    glow::RGBA16F,
    glow::RGBA32F,
    glow::DEPTH_COMPONENT16,
    glow::DEPTH_COMPONENT24,
    glow::DEPTH_COMPONENT32F,
    glow::DEPTH24_STENCIL8,
    glow::STENCIL_INDEX8,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_name_resolves() {
        assert_eq!(resolve("triangles").unwrap(), glow::TRIANGLES);
    }

    #[test]
    fn prefixed_and_bare_names_resolve_to_the_same_value() {
        assert_eq!(
            resolve("GL_TRIANGLES").unwrap(),
            resolve("triangles").unwrap()
        );
        assert_eq!(
            resolve("gl_clamp_to_edge").unwrap(),
            resolve("CLAMP_TO_EDGE").unwrap()
        );
    }

    #[test]
    fn mixed_case_name_resolves() {
        assert_eq!(resolve("Linear").unwrap(), glow::LINEAR);
        assert_eq!(resolve("Gl_Nearest").unwrap(), glow::NEAREST);
    }

    #[test]
    fn raw_value_passes_through_unchanged() {
        assert_eq!(resolve(glow::TRIANGLES).unwrap(), glow::TRIANGLES);
        // Even a value that names nothing in the table passes through.
        assert_eq!(resolve(0xDEAD_u32).unwrap(), 0xDEAD);
    }

    #[test]
    fn unknown_name_fails_with_unknown_enum() {
        let err = resolve("triangels").unwrap_err();
        match err {
            GlError::UnknownEnum(name) => assert_eq!(name, "triangels"),
            other => panic!("expected UnknownEnum, got {other:?}"),
        }
    }

    #[test]
    fn empty_name_fails() {
        assert!(matches!(resolve(""), Err(GlError::UnknownEnum(_))));
    }

    #[test]
    fn resolve_opt_passes_none_through() {
        let none: Option<&str> = None;
        assert_eq!(resolve_opt(none).unwrap(), None);
    }

    #[test]
    fn resolve_opt_resolves_present_names() {
        assert_eq!(
            resolve_opt(Some("repeat")).unwrap(),
            Some(glow::REPEAT)
        );
    }

    #[test]
    fn resolve_opt_propagates_unknown_names() {
        assert!(matches!(
            resolve_opt(Some("not_an_enum")),
            Err(GlError::UnknownEnum(_))
        ));
    }

    #[test]
    fn filter_table_contains_all_mipmap_variants() {
        assert!(FILTERS.contains(&resolve("linear_mipmap_linear").unwrap()));
        assert!(FILTERS.contains(&resolve("nearest_mipmap_nearest").unwrap()));
    }

    #[test]
    fn draw_mode_table_rejects_filters() {
        assert!(!DRAW_MODES.contains(&glow::LINEAR));
    }
}
