//! Error types for the glisten object layer.

use thiserror::Error;

use crate::object::ObjectState;

/// Errors produced by GL object operations.
///
/// Every error is local to the misused object: the caller may catch it
/// and continue, though the object itself may need to be re-created.
/// Validation errors (enums, bounds, kinds) are raised by the call that
/// caused them; compile and link errors are raised by the first
/// operation that requires a valid compiled or linked state.
#[derive(Debug, Error)]
pub enum GlError {
    /// An operation was attempted on an object whose lifecycle state
    /// does not permit it (typically a deleted object).
    #[error("cannot {operation}: object is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: ObjectState,
    },

    /// A symbolic enum name did not map to any known GL constant.
    #[error("unknown GL enum: \"{0}\"")]
    UnknownEnum(String),

    /// A value of the wrong kind was supplied for a variable or
    /// parameter (e.g. a texture bound where a float uniform is active).
    #[error("invalid value for '{name}': expected {expected}, got {got}")]
    InvalidType {
        name: String,
        expected: String,
        got: String,
    },

    /// A linear sub-range update exceeded the allocated extent.
    #[error("update of {len} bytes at offset {offset} exceeds extent of {extent} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        extent: usize,
    },

    /// A texture sub-region update exceeded the current bounds.
    #[error(
        "region {size:?} at offset {offset:?} exceeds texture extent {extent:?}"
    )]
    RegionOutOfBounds {
        offset: [usize; 3],
        size: [usize; 3],
        extent: [usize; 3],
    },

    /// A named field was not present in a buffer's layout.
    #[error("no field named '{0}' in buffer layout")]
    UnknownField(String),

    /// A shader stage failed to compile. Carries the driver's info log
    /// verbatim (with numbered source lines prepended).
    #[error("{stage} shader compile failed:\n{log}")]
    ShaderCompile { stage: &'static str, log: String },

    /// A program failed to link. Carries the driver's info log.
    #[error("program link failed:\n{0}")]
    ShaderLink(String),

    /// A binding name did not correspond to any active attribute or
    /// uniform after linking.
    #[error("no active variable named '{0}' in linked program")]
    UnknownVariable(String),

    /// A framebuffer attachment did not match the dimensions of the
    /// already-attached targets.
    #[error(
        "attachment {point} size mismatch: expected {expected_width}x{expected_height}, \
         got {width}x{height}"
    )]
    IncompatibleAttachment {
        point: String,
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    /// The native context failed to allocate a resource, or left it in
    /// an unusable state (e.g. an incomplete framebuffer).
    #[error("failed to create {kind}: {reason}")]
    ResourceCreation { kind: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_names_operation_and_state() {
        let err = GlError::InvalidState {
            operation: "activate",
            state: ObjectState::Deleted,
        };
        let msg = format!("{err}");
        assert!(msg.contains("activate"), "missing operation in: {msg}");
        assert!(msg.contains("Deleted"), "missing state in: {msg}");
    }

    #[test]
    fn unknown_enum_includes_name() {
        let err = GlError::UnknownEnum("TRIANGELS".into());
        assert!(format!("{err}").contains("TRIANGELS"));
    }

    #[test]
    fn out_of_bounds_includes_offset_len_and_extent() {
        let err = GlError::OutOfBounds {
            offset: 16,
            len: 32,
            extent: 40,
        };
        let msg = format!("{err}");
        assert!(msg.contains("16"), "missing offset in: {msg}");
        assert!(msg.contains("32"), "missing len in: {msg}");
        assert!(msg.contains("40"), "missing extent in: {msg}");
    }

    #[test]
    fn shader_compile_carries_log_verbatim() {
        let err = GlError::ShaderCompile {
            stage: "vertex",
            log: "ERROR: 0:3: 'vec9' : no matching type".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("vertex"), "missing stage in: {msg}");
        assert!(msg.contains("'vec9'"), "missing driver log in: {msg}");
    }

    #[test]
    fn incompatible_attachment_reports_both_sizes() {
        let err = GlError::IncompatibleAttachment {
            point: "COLOR_ATTACHMENT1".into(),
            expected_width: 512,
            expected_height: 512,
            width: 256,
            height: 256,
        };
        let msg = format!("{err}");
        assert!(msg.contains("512x512"), "missing expected size in: {msg}");
        assert!(msg.contains("256x256"), "missing actual size in: {msg}");
    }

    #[test]
    fn gl_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<GlError>();
    }
}
