pub mod config;
pub mod models;
pub mod session;
pub mod stream;
pub mod upload;
pub mod vision;

pub use session::{ChatSession, Message, Sender};
pub use stream::{consume_response, consume_stream};
pub use upload::{UploadClient, UploadError, UploadInput, Uploaded};
pub use vision::{VisionClient, VisionError};
