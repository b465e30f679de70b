mod common;

use std::sync::Arc;

use common::init_tracing;
use jvm_loader::{
    BootstrapClassLoader, ErrorKind, LoaderConfig,
    consts::{ClassAccessFlag as C, FieldAccessFlag as F, MethodAccessFlag as M, OBJECT_CLASS_NAME},
    runtime::{
        ClassState, LinkRequest, LinkedClass, NativeClassSpec, NativeField, NativeMethod,
        NativeVariable, build_class, create_std_class, link_class,
    },
};

fn loader() -> BootstrapClassLoader {
    init_tracing();
    let loader = BootstrapClassLoader::new(LoaderConfig::default());
    loader.bootstrap().unwrap();
    loader
}

#[test]
fn std_class_links_through_its_ancestors() {
    let loader = loader();
    let object = loader.find_class(OBJECT_CLASS_NAME).unwrap();
    let throwable = loader.find_class("java.lang.Throwable").unwrap();

    let class = create_std_class(
        &loader,
        NativeClassSpec::new("demo/Registry", C::PUBLIC | C::FINAL)
            .extends(&object)
            .with_methods(vec![
                NativeMethod::new("<init>", "()V", M::PRIVATE, |_| Ok(None)),
                NativeMethod::new("lookup", "(I)Ljava/lang/Object;", M::PUBLIC, |_| Ok(None)),
            ])
            .with_fields(vec![NativeField::new("SIZE", "I", F::PUBLIC | F::STATIC)]),
        &[
            LinkRequest::class(Some(&throwable)),
            LinkRequest::class(None),
            LinkRequest::method(None, "lookup", "(I)Ljava/lang/Object;"),
            LinkRequest::method(None, "toString", "()Ljava/lang/String;"),
            LinkRequest::method(Some(&throwable), "<init>", "(Ljava/lang/String;)V"),
            LinkRequest::field(None, "SIZE", "I"),
        ],
        Some(&[NativeVariable::Int(16)]),
    )
    .unwrap();

    assert_eq!(class.state(), ClassState::InitComplete);
    let links = class.links();
    assert!(matches!(links.classes()[0], LinkedClass::Other(_)));
    assert!(matches!(links.classes()[1], LinkedClass::This));
    assert!(Arc::ptr_eq(&class.linked_class(0).unwrap(), &throwable));
    assert!(Arc::ptr_eq(&class.linked_class(1).unwrap(), &class));

    let methods = links.methods();
    assert_eq!(methods[0].parent_class(), "demo.Registry");
    assert_eq!(methods[1].parent_class(), OBJECT_CLASS_NAME);
    assert_eq!(methods[2].parent_class(), "java.lang.Throwable");
    assert_eq!(
        class.get_static(&links.fields()[0]),
        Some(NativeVariable::Int(16))
    );
    assert!(Arc::ptr_eq(&loader.find_class("demo.Registry").unwrap(), &class));
}

#[test]
fn fields_are_found_on_interfaces_before_superclasses() {
    let loader = loader();
    let object = loader.find_class(OBJECT_CLASS_NAME).unwrap();
    let constants = Arc::new(
        build_class(
            NativeClassSpec::new("demo.Constants", C::PUBLIC | C::INTERFACE)
                .extends(&object)
                .with_fields(vec![NativeField::new(
                    "LIMIT",
                    "I",
                    F::PUBLIC | F::STATIC | F::FINAL,
                )]),
        )
        .unwrap(),
    );
    let base = Arc::new(
        build_class(
            NativeClassSpec::new("demo.Base", C::PUBLIC)
                .extends(&object)
                .with_fields(vec![NativeField::new("LIMIT", "I", F::PUBLIC | F::STATIC)]),
        )
        .unwrap(),
    );
    let mut class = build_class(
        NativeClassSpec::new("demo.Leaf", C::PUBLIC)
            .extends(&base)
            .implements(&constants),
    )
    .unwrap();

    link_class(&mut class, &[LinkRequest::field(None, "LIMIT", "I")]).unwrap();
    assert_eq!(class.links().fields()[0].parent_class(), "demo.Constants");
}

#[test]
fn misses_leave_the_class_unlinked() {
    let loader = loader();
    let object = loader.find_class(OBJECT_CLASS_NAME).unwrap();
    let mut class = build_class(NativeClassSpec::new("demo.Empty", C::PUBLIC).extends(&object)).unwrap();

    let err = link_class(
        &mut class,
        &[
            LinkRequest::method(None, "hashCode", "()I"),
            LinkRequest::method(Some(&object), "hashCode", "()J"),
        ],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Linkage);
    assert_eq!(
        err.message(),
        "demo.Empty: Unable to locate method java.lang.Object.hashCode"
    );
    assert_eq!(class.state(), ClassState::Built);
    assert!(class.links().is_empty());

    // a failed std class is never registered
    let err = create_std_class(
        &loader,
        NativeClassSpec::new("demo.Orphan", C::PUBLIC).extends(&object),
        &[LinkRequest::field(None, "missing", "I")],
        None,
    )
    .unwrap_err();
    assert_eq!(err.message(), "demo.Orphan: Unable to locate field demo.Orphan.missing");
    assert!(loader.find_class("demo.Orphan").is_none());
}
