pub mod ai_verifier;
pub mod storage;

pub use ai_verifier::*;
pub use storage::*;
