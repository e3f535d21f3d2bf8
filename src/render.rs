pub mod bounds;
pub mod composite;
pub mod compositor;
pub mod context;
pub mod retry;
pub mod sticker;
pub mod surface;
pub mod text;
pub mod validate;
pub mod video;
