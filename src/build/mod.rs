//! Local build: the build tree and the stylesheet pipeline

pub mod css;
pub mod tree;

pub use css::{CssPipeline, DeadCodeEliminator, Minifier, PostCss, PurgeCss};
pub use tree::{BuildLayout, CopyReport};
