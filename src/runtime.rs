mod builder;
mod class_loader;
pub(crate) mod hierarchy;
pub mod layout;
mod linker;
pub(crate) mod native;
mod structs;

pub use builder::*;
pub use class_loader::*;
pub use linker::*;
pub use native::{Exception, NativeEnv, NativeFunction, NativeResult, NativeVariable, register_native};
pub use structs::*;
