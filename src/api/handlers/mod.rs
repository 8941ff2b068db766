pub mod events;
pub mod members;
pub mod portal;
pub mod root;
pub mod submissions;
