//! Domain model (keys, payloads, validation, locators, errors, ids).

pub mod errors;
pub mod ids;
pub mod key;
pub mod locator;
pub mod payload;
pub mod put_result;
pub mod validation;

pub use self::errors::{ErrorKind, StorageError};
pub use self::ids::{BatchId, UploadId};
pub use self::key::ObjectKey;
pub use self::locator::{DEFAULT_PUBLIC_BASE, Locator, SignedUrl};
pub use self::payload::Payload;
pub use self::put_result::PutResult;
pub use self::validation::{NO_DATA_PROVIDED, ValidationPolicy, ValidationResult, validate};
