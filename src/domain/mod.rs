//! Domain logic - version gating rules independent of any subprocess

pub mod dependency;
pub mod version;

pub use dependency::DependencyMap;
pub use version::Version;
