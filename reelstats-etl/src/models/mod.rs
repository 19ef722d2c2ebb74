//! Data models for the movie pipeline
//!
//! - [`RawMovie`]: catalog response as received
//! - [`FlatMovie`]: nested structures flattened, source units
//! - [`MovieRecord`]: normalized row with [`DerivedMetrics`]

pub mod movie;
pub mod raw;

pub use movie::{DerivedMetrics, FlatMovie, MovieRecord, MovieType, PipeList, PIPE, PIPE_SUBSTITUTE};
pub use raw::{CastMember, Credits, CrewMember, MovieDetails, NamedEntity, RawMovie};
