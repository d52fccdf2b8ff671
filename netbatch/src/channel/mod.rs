//! The interactive shell: writing lines and reading up to a prompt.

mod buffer;
mod pty;

pub use buffer::PatternBuffer;
pub use pty::{PtyChannel, PtyConfig};
