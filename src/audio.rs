pub mod buffer;
pub mod mix;
pub mod pass;
pub mod sources;
