//! In-memory state behind the simulated satellite.

pub mod bucket;
pub mod listing;
pub mod multipart;
pub mod object;
pub mod project;
pub mod satellite;

pub use bucket::Bucket;
pub use multipart::{PendingUpload, StoredPart};
pub use object::StoredObject;
pub use project::ProjectState;
pub use satellite::Satellite;
