mod class;
mod object;
mod throwable;

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;

use crate::runtime::Class;

pub(crate) use class::class_methods;
pub(crate) use object::object_methods;
pub(crate) use throwable::{throwable_fields, throwable_methods};

pub type NativeFunction = fn(NativeEnv) -> NativeResult<Option<NativeVariable>>;

pub struct NativeEnv {
    pub args: Vec<NativeVariable>,
    pub class: Arc<Class>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeVariable {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Heap handle; 0 is null.
    Reference(u32),
}

impl NativeVariable {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            NativeVariable::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            NativeVariable::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Option<u32> {
        match self {
            NativeVariable::Reference(r) => Some(*r),
            _ => None,
        }
    }
}

/// Failure raised out of a native method.
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    VmException {
        exception_type: &'static str,
        message: String,
    },
    UserException(u32),
}

impl Exception {
    pub(crate) fn new_vm(exception_type: &'static str, message: impl Into<String>) -> Self {
        Exception::VmException {
            exception_type,
            message: message.into(),
        }
    }
}

pub type NativeResult<T> = std::result::Result<T, Exception>;

// key: class_name, method_name, method_descriptor
type Key = (String, String, String);
static NATIVE_FUNCTIONS: LazyLock<DashMap<Key, NativeFunction>> = LazyLock::new(DashMap::new);

/// Binds an implementation to a `native` method declared in bytecode.
/// Class names may use either package separator.
pub fn register_native(class_name: &str, name: &str, descriptor: &str, function: NativeFunction) {
    NATIVE_FUNCTIONS.insert(
        (
            crate::consts::slash_to_dot(class_name),
            name.to_string(),
            descriptor.to_string(),
        ),
        function,
    );
}

pub(crate) fn lookup_native(class_name: &str, name: &str, descriptor: &str) -> Option<NativeFunction> {
    NATIVE_FUNCTIONS
        .get(&(class_name.to_string(), name.to_string(), descriptor.to_string()))
        .map(|entry| *entry.value())
}

fn native_nop(_: NativeEnv) -> NativeResult<Option<NativeVariable>> {
    Ok(None)
}

fn receiver(env: &NativeEnv) -> NativeResult<u32> {
    env.args
        .first()
        .and_then(NativeVariable::as_ref)
        .ok_or_else(|| Exception::new_vm("java.lang.NullPointerException", "missing receiver"))
}

// Monitors and the object heap live outside the loader.
fn native_unsupported(env: NativeEnv) -> NativeResult<Option<NativeVariable>> {
    Err(Exception::new_vm(
        "java.lang.UnsupportedOperationException",
        format!("{}: native method needs a running VM", env.class.name()),
    ))
}
