//! Force-directed layout for the kinmap relationship graph.
//!
//! Everything here is synchronous and deterministic. A frontend owns a
//! [`Scene`], feeds it each fresh snapshot with [`Scene::sync`], advances it
//! with [`Scene::tick`], and draws what [`Scene::nodes`] and [`Scene::links`]
//! report through a [`Viewport`].

pub mod color;
pub mod error;
pub mod graph;
pub mod scene;
pub mod simulation;
pub mod style;
pub mod viewport;

pub use color::Rgb;
pub use error::{Error, Result};
pub use graph::{GraphData, Link, Node};
pub use scene::Scene;
pub use simulation::{Body, ForceConfig, Simulation};
pub use style::{Focus, NodeStyle};
pub use viewport::Viewport;
