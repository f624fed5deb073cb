//! Container format transcoders.

pub mod gnu_writer;
pub mod tar;
pub mod zip;

pub use tar::transcode_tar;
pub use zip::transcode_zip;
pub use zip::transcode_zip_path;
pub use zip::transcode_zip_to_stream;
