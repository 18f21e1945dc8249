pub mod multipart;
pub mod service;

pub use service::{FileService, IncomingFile, viewer_link};
