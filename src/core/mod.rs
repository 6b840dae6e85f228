pub mod cancel;
pub mod error;
pub mod patch;

pub use cancel::Cancellation;
pub use error::{Result, WaitlistError};
pub use patch::Patch;
