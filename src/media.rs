pub mod decode;
pub mod ffmpeg;
pub mod seek;
pub mod source;
