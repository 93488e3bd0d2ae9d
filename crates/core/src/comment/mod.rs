pub mod label;
pub mod model;

pub use label::author_label;
pub use model::{Comment, CommentView, NewComment};
