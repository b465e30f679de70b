//! Class file loading for a small JVM: a validating class file reader,
//! descriptor parsing, and the builder and linker that turn parsed or
//! native class definitions into shared class records.

pub mod class;
pub mod config;
pub mod consts;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod runtime;

pub use class::{ParsedClassData, parse_class_data, parse_class_data_with};
pub use config::{LoaderConfig, ParseOptions};
pub use error::{ClassError, ErrorKind, LinkageKind, Result};
pub use runtime::{BootstrapClassLoader, Class};
