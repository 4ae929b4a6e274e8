#![deny(unsafe_code)]
//! Object-oriented layer over OpenGL ES 3.0 / WebGL2 (via `glow`).
//!
//! Wraps the raw, stateful GL interface in persistent handles: buffers,
//! textures, shaders, framebuffers, and programs, each tracking its own
//! lifecycle (lazy creation, dirty-data sync on activation, idempotent
//! deletion) against the one shared context. Setting a uniform or
//! attribute reads like a plain assignment:
//!
//! ```no_run
//! use glisten::{Dtype, ElementBuffer, GlContext, Program, Texture2D,
//!               VertexBuffer, VertexLayout};
//!
//! fn paint(gl: glow::Context) -> Result<(), glisten::GlError> {
//!     let mut ctx = GlContext::new(gl);
//!
//!     let program = Program::from_sources(
//!         "attribute vec3 a_position;
//!          attribute vec2 a_texcoord;
//!          varying vec2 v_texcoord;
//!          void main() {
//!              v_texcoord = a_texcoord;
//!              gl_Position = vec4(a_position, 1.0);
//!          }",
//!         "uniform sampler2D s_texture;
//!          varying vec2 v_texcoord;
//!          void main() { gl_FragColor = texture2D(s_texture, v_texcoord); }",
//!     );
//!
//!     // One interleaved buffer, two attribute views bound by field name.
//!     let layout = VertexLayout::new()
//!         .with("a_position", Dtype::F32, 3)
//!         .with("a_texcoord", Dtype::F32, 2);
//!     let vertices = VertexBuffer::structured(layout, &[0u8; 80])?;
//!     program.set_vars(&vertices)?;
//!
//!     let image = Texture2D::from_u8(&[255u8; 16 * 16 * 4], 16, 16, 4)?;
//!     program.bind("s_texture", image)?;
//!
//!     let indices = ElementBuffer::from_u16(&[0, 1, 2, 1, 2, 3]);
//!     program.draw(&mut ctx, "triangles", Some(&indices))?;
//!     Ok(())
//! }
//! ```
//!
//! The caller owns context creation and the event loop; this layer
//! assumes a pre-initialized context that is current on the calling
//! thread. Everything is single-threaded and synchronous: handle types
//! are reference-counted and deliberately not `Send`, and draw calls
//! run to completion. Binding an object implicitly replaces whatever
//! was bound to the same target; the [`context::BindingTable`] makes
//! that otherwise-hidden state observable.
//!
//! Known limitations: framebuffers accept only 2D texture attachments
//! (no 3D or cube map faces), and compressed texture formats are not
//! supported.

pub mod buffer;
pub mod context;
pub mod data;
pub mod enums;
pub mod error;
pub mod framebuffer;
pub mod object;
pub mod program;
pub mod shader;
pub mod texture;
pub mod variable;

pub use buffer::{BufferUsage, BufferView, ElementBuffer, VertexBuffer};
pub use context::{BindEvent, BindingTable, GlContext};
pub use data::{DataDescriptor, Dtype, VertexLayout};
pub use enums::{resolve, resolve_opt, EnumParam};
pub use error::GlError;
pub use framebuffer::{Attachment, FrameBuffer, RenderBuffer};
pub use object::{GlObject, ObjectState};
pub use program::Program;
pub use shader::{format_shader_error, FragmentShader, VertexShader};
pub use texture::{CubeFace, Texture2D, Texture3D, TextureCubeMap};
pub use variable::{Sampler, UniformValue, Variable};
