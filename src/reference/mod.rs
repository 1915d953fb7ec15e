// Reference data: the frozen catalogs every classification reads from.

pub mod builder;
pub mod snapshot;

pub use builder::{Advisory, LoadedReference, SnapshotBuilder};
pub use snapshot::{CatalogEntry, ClassificationKind, ReferenceSnapshot};
