use crate::{
    consts::{FieldAccessFlag, MethodAccessFlag as M},
    runtime::{
        NativeEnv, NativeField, NativeMethod, NativeResult, NativeVariable,
        layout::POINTER_SIZE,
        native::{native_nop, native_unsupported, receiver},
    },
};

// public native Throwable fillInStackTrace();
fn native_throwable_fill_in_stack_trace(env: NativeEnv) -> NativeResult<Option<NativeVariable>> {
    let rf = receiver(&env)?;
    Ok(Some(NativeVariable::Reference(rf)))
}

pub(crate) fn throwable_methods() -> Vec<NativeMethod> {
    vec![
        NativeMethod::new("<init>", "()V", M::PUBLIC, native_nop),
        NativeMethod::new("<init>", "(Ljava/lang/String;)V", M::PUBLIC, native_nop),
        NativeMethod::new(
            "fillInStackTrace",
            "()Ljava/lang/Throwable;",
            M::PUBLIC | M::SYNCHRONIZED,
            native_throwable_fill_in_stack_trace,
        ),
        NativeMethod::new(
            "getLocalizedMessage",
            "()Ljava/lang/String;",
            M::PUBLIC,
            native_unsupported,
        ),
        NativeMethod::new("getMessage", "()Ljava/lang/String;", M::PUBLIC, native_unsupported),
        NativeMethod::new("printStackTrace", "()V", M::PUBLIC, native_unsupported),
        NativeMethod::new(
            "printStackTrace",
            "(Ljava/io/PrintStream;)V",
            M::PUBLIC,
            native_unsupported,
        ),
        NativeMethod::new(
            "printStackTrace",
            "(Ljava/io/PrintWriter;)V",
            M::PUBLIC,
            native_unsupported,
        ),
        NativeMethod::new("toString", "()Ljava/lang/String;", M::PUBLIC, native_unsupported),
    ]
}

/// Message and backtrace slots, reserved without java names.
pub(crate) fn throwable_fields() -> Vec<NativeField> {
    vec![NativeField::placeholder(FieldAccessFlag::PRIVATE, 2 * POINTER_SIZE)]
}
