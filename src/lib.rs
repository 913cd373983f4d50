//! Codec core for the legacy shapefile geometry and attribute formats:
//! raw shape records to tagged simple-feature geometries and back, schema
//! inference over native column descriptors, and typed attribute access
//! with on-demand column widening.
//!
//! Byte-level storage and text recoding are the responsibility of the
//! [`store`] traits; this crate supplies in-memory implementations for
//! round-trip use and testing.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod attr;
pub mod codec;
pub mod error;
pub mod feature;
pub mod geom;
pub mod multipatch;
pub mod record;
pub mod schema;
pub mod store;

pub use error::{ShapeError, ShapeResult};
