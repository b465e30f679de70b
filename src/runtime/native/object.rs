use crate::{
    consts::MethodAccessFlag as M,
    runtime::{
        NativeEnv, NativeMethod, NativeResult, NativeVariable,
        native::{native_nop, native_unsupported, receiver},
    },
};

// public native int hashCode();
fn native_object_hash_code(env: NativeEnv) -> NativeResult<Option<NativeVariable>> {
    let rf = receiver(&env)?;
    Ok(Some(NativeVariable::Int(rf as i32)))
}

// public boolean equals(Object obj);
fn native_object_equals(env: NativeEnv) -> NativeResult<Option<NativeVariable>> {
    let rf = receiver(&env)?;
    let other = env.args.get(1).and_then(NativeVariable::as_ref);
    Ok(Some(NativeVariable::Boolean(other == Some(rf))))
}

pub(crate) fn object_methods() -> Vec<NativeMethod> {
    vec![
        NativeMethod::new("<init>", "()V", M::PUBLIC, native_nop),
        NativeMethod::new("clone", "()Ljava/lang/Object;", M::PROTECTED, native_unsupported),
        NativeMethod::new("equals", "(Ljava/lang/Object;)Z", M::PUBLIC, native_object_equals),
        NativeMethod::new("finalize", "()V", M::PROTECTED, native_nop),
        NativeMethod::new(
            "getClass",
            "()Ljava/lang/Class;",
            M::PUBLIC | M::FINAL,
            native_unsupported,
        ),
        NativeMethod::new("hashCode", "()I", M::PUBLIC, native_object_hash_code),
        NativeMethod::new("notify", "()V", M::PUBLIC | M::FINAL, native_unsupported),
        NativeMethod::new("notifyAll", "()V", M::PUBLIC | M::FINAL, native_unsupported),
        NativeMethod::new("toString", "()Ljava/lang/String;", M::PUBLIC, native_unsupported),
        NativeMethod::new("wait", "()V", M::PUBLIC | M::FINAL, native_unsupported),
        NativeMethod::new("wait", "(J)V", M::PUBLIC | M::FINAL, native_unsupported),
        NativeMethod::new("wait", "(JI)V", M::PUBLIC | M::FINAL, native_unsupported),
    ]
}
