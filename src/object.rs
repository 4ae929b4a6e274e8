//! GPU object lifecycle tracking.
//!
//! Every resource wrapper carries a [`Lifecycle`] value: the current
//! [`ObjectState`] plus a dirty flag indicating pending GPU-side sync.
//! Native handles are allocated lazily (on first activation) and exist
//! only in the `Created` and `Active` states. Deletion is idempotent.
//!
//! There is no base-object hierarchy; each resource type implements the
//! [`GlObject`] capability trait directly, since activation semantics
//! differ per target (texture unit vs buffer target vs program slot).

use crate::context::GlContext;
use crate::error::GlError;

/// Lifecycle state of a GPU resource wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    /// No native handle exists yet.
    Unloaded,
    /// A native handle exists but the object is not currently bound.
    Created,
    /// The object is bound as current for its target.
    Active,
    /// The native handle has been released. Terminal.
    Deleted,
}

/// State machine shared by all GPU resource wrappers.
///
/// Tracks the [`ObjectState`] and a dirty flag. The dirty flag means
/// host-side data or parameters have changed and must be synced to the
/// GPU on the next activation.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: ObjectState,
    dirty: bool,
}

impl Lifecycle {
    /// Creates a fresh lifecycle: unloaded and dirty (nothing has been
    /// synced yet).
    pub fn new() -> Self {
        Self {
            state: ObjectState::Unloaded,
            dirty: true,
        }
    }

    /// Current state.
    pub fn state(&self) -> ObjectState {
        self.state
    }

    /// Whether host-side changes are pending GPU sync.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks pending host-side changes.
    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the dirty flag after a successful sync.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Fails with `InvalidState` if the object has been deleted.
    ///
    /// Called at the top of every operation except `delete` itself.
    pub fn guard(&self, operation: &'static str) -> Result<(), GlError> {
        if self.state == ObjectState::Deleted {
            return Err(GlError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Transitions `Unloaded` to `Created` after handle allocation.
    /// No-op in any other state.
    pub fn mark_created(&mut self) {
        if self.state == ObjectState::Unloaded {
            self.state = ObjectState::Created;
        }
    }

    /// Transitions `Created` to `Active` after a successful bind.
    /// No-op unless a handle exists.
    pub fn mark_active(&mut self) {
        if self.state == ObjectState::Created {
            self.state = ObjectState::Active;
        }
    }

    /// Transitions `Active` back to `Created` after an unbind.
    pub fn mark_inactive(&mut self) {
        if self.state == ObjectState::Active {
            self.state = ObjectState::Created;
        }
    }

    /// Transitions to `Deleted` from any state. Idempotent.
    pub fn mark_deleted(&mut self) {
        self.state = ObjectState::Deleted;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Common lifecycle capability of all GPU resource wrappers.
///
/// `activate` ensures the native handle exists, binds it as current for
/// its target, and flushes any dirty host-side data. `deactivate`
/// unbinds without deleting. `delete` releases the native handle and is
/// safe to call multiple times.
///
/// `Drop` cannot reach the context, so explicit `delete` is the
/// deterministic cleanup path.
pub trait GlObject {
    /// Current lifecycle state.
    fn state(&self) -> ObjectState;

    /// Ensures the native handle exists, binds it, and syncs dirty data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the object has been deleted, or an
    /// allocation/upload error from the native context.
    fn activate(&self, ctx: &mut GlContext) -> Result<(), GlError>;

    /// Unbinds the object from its target without deleting it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the object has been deleted.
    fn deactivate(&self, ctx: &mut GlContext) -> Result<(), GlError>;

    /// Releases the native handle. Calling this more than once is a
    /// no-op, not an error.
    fn delete(&self, ctx: &mut GlContext);
}
