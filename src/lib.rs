#![warn(clippy::all, rust_2018_idioms)]

pub mod chunk;
pub mod uploader;

pub use chunk::{ChunkSource, CHUNK_DATA_SIZE, CHUNK_HEIGHT, CHUNK_SIZE};
pub use uploader::{UploadError, Uploader};
