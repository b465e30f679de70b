use crate::{
    consts::MethodAccessFlag as M,
    runtime::{
        NativeEnv, NativeMethod, NativeResult, NativeVariable,
        native::native_unsupported,
    },
};

// private static native boolean desiredAssertionStatus0(Class<?> clazz);
fn desired_assertion_status0(_env: NativeEnv) -> NativeResult<Option<NativeVariable>> {
    Ok(Some(NativeVariable::Boolean(false)))
}

pub(crate) fn class_methods() -> Vec<NativeMethod> {
    let static_private = M::PRIVATE | M::STATIC;
    vec![
        NativeMethod::new(
            "desiredAssertionStatus0",
            "(Ljava/lang/Class;)Z",
            static_private,
            desired_assertion_status0,
        ),
        NativeMethod::new(
            "forName",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            M::PUBLIC | M::STATIC,
            native_unsupported,
        ),
        NativeMethod::new("getName", "()Ljava/lang/String;", M::PUBLIC, native_unsupported),
        NativeMethod::new(
            "getSuperclass",
            "()Ljava/lang/Class;",
            M::PUBLIC,
            native_unsupported,
        ),
        NativeMethod::new(
            "getInterfaces",
            "()[Ljava/lang/Class;",
            M::PUBLIC,
            native_unsupported,
        ),
        NativeMethod::new("getModifiers", "()I", M::PUBLIC, native_unsupported),
        NativeMethod::new("isArray", "()Z", M::PUBLIC, native_unsupported),
        NativeMethod::new("isInterface", "()Z", M::PUBLIC, native_unsupported),
        NativeMethod::new("isPrimitive", "()Z", M::PUBLIC, native_unsupported),
        NativeMethod::new(
            "isInstance",
            "(Ljava/lang/Object;)Z",
            M::PUBLIC,
            native_unsupported,
        ),
        NativeMethod::new(
            "isAssignableFrom",
            "(Ljava/lang/Class;)Z",
            M::PUBLIC,
            native_unsupported,
        ),
        NativeMethod::new("toString", "()Ljava/lang/String;", M::PUBLIC, native_unsupported),
    ]
}
