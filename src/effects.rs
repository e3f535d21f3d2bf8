pub mod blend;
pub mod blur;
pub mod chain;
pub mod filter;
pub mod params;
pub mod pipeline;
pub mod pixel;
pub mod store;
