pub mod account;
pub mod constants;
pub mod error;
pub mod request;
pub mod skin;
pub mod types;

pub use account::Account;
pub use constants::*;
pub use error::{EngineError, ErrorKind};
pub use request::{GenerateOptions, GenerateRequest, InputKind};
pub use skin::{DuplicateSource, Skin, Variant, Visibility};
pub use types::{LongUuid, ShortUuid};
