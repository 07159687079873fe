pub mod cache;
pub mod entities;
pub mod errors;
pub mod hashing;
pub mod view;

pub use cache::*;
pub use entities::*;
pub use errors::*;
pub use hashing::*;
pub use view::*;
