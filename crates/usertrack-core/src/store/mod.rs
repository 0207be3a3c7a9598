//! Local user store.

mod model;
mod repository;

pub use model::{NewUser, User};
pub use repository::UserStore;
