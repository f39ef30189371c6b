pub use ferry_core::*;
pub use ferry_macros::*;
