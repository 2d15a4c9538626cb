mod photo_archive;
mod processor;

pub use photo_archive::FilePhotoArchive;
pub use processor::{ImageMediaProcessor, MediaError};
