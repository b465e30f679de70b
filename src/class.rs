mod code;
mod parser;
mod pool;
mod structs;

pub use code::parse_method_code;
pub use parser::{parse_class_data, parse_class_data_with};
pub(crate) use pool::{read_constant_pool_index, read_optional_pool_index};
pub use structs::*;
