// SpiceScape core domain
//
// DB-agnostic types shared by the HTTP layer and the storage layer.
//
// Key design decisions:
// - Entities cross-reference each other by id only (weak references)
// - Relationship lists are plain Vec<Uuid> kept consistent by the server's graph coordinator
// - Errors are a tagged enum; HTTP mapping happens in exactly one place (server api::error)
// - Authorization guards are pure predicates with no storage access

pub mod comment;
pub mod error;
pub mod guards;
pub mod image;
pub mod recipe;
pub mod user;

pub use comment::Comment;
pub use error::{parse_id, AppError, ErrorKind, Result};
pub use image::ImageRef;
pub use recipe::Recipe;
pub use user::{User, UserList};
