pub mod enrich;
pub mod error;
pub mod geometry;
pub mod normalize;
pub mod record;
pub mod schema;
pub mod spatial;

pub use enrich::{EnrichOptions, EnrichmentOutcome, RecordFailure, enrich, enrich_at};
pub use error::EnrichError;
pub use geometry::{GeometryFormat, GeometryValue, SpatialReference, build_point};
pub use normalize::{KeepKeys, NormalizedDisplayRecord, normalize};
pub use record::{
    Category, Coordinates, Document, EnrichedBusinessRecord, Location, RawBusinessRecord,
    ToDocument,
};
pub use schema::esri;
pub use spatial::cell_id;
