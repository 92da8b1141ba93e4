//! Spatial structures over projected positions.
//!
//! - [`grid::PixelGrid`]: fixed-cell hash grid for radius searches during a build
//! - [`level_tree::LevelTree`]: R-tree for rectangle queries against a built level

pub mod grid;
pub mod level_tree;
