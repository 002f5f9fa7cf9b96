pub mod align;
pub mod angle;
pub mod bins;
pub mod bulk;
pub mod compression;
pub mod constants;
pub mod directional;
pub mod error;
pub mod format;
pub mod ingest;
pub mod parser;
pub mod spectrum;
pub mod store;
