// Services layer for business logic
// Services run guards and validation, then call storage or the graph coordinator

pub mod comment;
pub mod graph;
pub mod profile;
pub mod recipe;

pub use comment::CommentService;
pub use graph::{DeletedUser, GraphCoordinator, ReconcileReport};
pub use profile::ProfileService;
pub use recipe::RecipeService;
