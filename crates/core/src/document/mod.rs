pub mod model;
pub mod path;
pub mod validate;

pub use model::{Document, DocumentPatch, NewDocument, Visibility};
pub use path::BlobPath;
