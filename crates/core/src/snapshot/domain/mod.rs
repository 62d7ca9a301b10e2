pub mod image_writer;
pub mod snapshot_store;
