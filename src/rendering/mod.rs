pub mod context;

pub use context::{DrawCommand, PathRenderStyle, RenderContext};
