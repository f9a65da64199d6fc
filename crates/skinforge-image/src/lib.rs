pub mod temp_file;
pub mod validator;

pub use temp_file::{TempDirKind, TempFileManager, TempHandle};
pub use validator::{validate, ValidatedImage, ValidationError};
