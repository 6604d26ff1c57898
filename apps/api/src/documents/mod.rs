// Document upload, extraction, listing and deletion.

pub mod blob;
pub mod extract;
pub mod handlers;
pub mod upload;
