pub mod event;
pub mod member;
pub mod points;
pub mod submission;

pub use event::*;
pub use member::*;
pub use points::*;
pub use submission::*;
