use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    consts::INIT,
    error::{ClassError, Result},
    runtime::{Class, ClassLinks, ClassState, LinkedClass},
};

/// One direct reference to resolve for a native class. A `None` target
/// names the class being linked.
#[derive(Debug, Clone)]
pub enum LinkRequest {
    Class {
        target: Option<Arc<Class>>,
    },
    Method {
        target: Option<Arc<Class>>,
        name: String,
        descriptor: String,
    },
    Field {
        target: Option<Arc<Class>>,
        name: String,
        descriptor: String,
    },
}

impl LinkRequest {
    pub fn class(target: Option<&Arc<Class>>) -> Self {
        LinkRequest::Class {
            target: target.cloned(),
        }
    }

    pub fn method(target: Option<&Arc<Class>>, name: &str, descriptor: &str) -> Self {
        LinkRequest::Method {
            target: target.cloned(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    pub fn field(target: Option<&Arc<Class>>, name: &str, descriptor: &str) -> Self {
        LinkRequest::Field {
            target: target.cloned(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }
}

/// Resolves `requests` against `class` and its ancestors, recording the
/// results in the class's link tables in request order per kind.
///
/// Constructors are only searched among the target's own methods; every
/// other method goes through the virtual table.
pub fn link_class(class: &mut Class, requests: &[LinkRequest]) -> Result<()> {
    let mut links = ClassLinks::default();

    for request in requests {
        match request {
            LinkRequest::Class { target } => {
                links.classes.push(match target {
                    Some(target) => LinkedClass::Other(Arc::downgrade(target)),
                    None => LinkedClass::This,
                });
            }
            LinkRequest::Method {
                target,
                name,
                descriptor,
            } => {
                let owner: &Class = target.as_deref().unwrap_or(&*class);
                let method = if name == INIT {
                    owner.locate_local_method(name, descriptor)
                } else {
                    owner.locate_method(name, descriptor)
                };
                let Some(method) = method else {
                    return Err(ClassError::linkage(format!(
                        "{}: Unable to locate method {}.{}",
                        class.name, owner.name, name
                    )));
                };
                trace!(class = %class.name, method = %method.signature(), "linked method");
                links.methods.push(Arc::clone(method));
            }
            LinkRequest::Field {
                target,
                name,
                descriptor,
            } => {
                let owner: &Class = target.as_deref().unwrap_or(&*class);
                let Some(field) = owner.locate_field(name, descriptor) else {
                    return Err(ClassError::linkage(format!(
                        "{}: Unable to locate field {}.{}",
                        class.name, owner.name, name
                    )));
                };
                trace!(class = %class.name, field = %field.name, "linked field");
                links.fields.push(field);
            }
        }
    }

    debug!(
        class = %class.name,
        classes = links.classes.len(),
        methods = links.methods.len(),
        fields = links.fields.len(),
        "linked class"
    );
    class.links = links;
    class.set_state(ClassState::Linked);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        consts::{ClassAccessFlag as C, FieldAccessFlag as F, MethodAccessFlag as M, OBJECT_CLASS_NAME},
        error::ErrorKind,
        runtime::{NativeClassSpec, NativeField, NativeMethod, build_class, native::object_methods},
    };

    fn object() -> Arc<Class> {
        Arc::new(
            build_class(NativeClassSpec::new(OBJECT_CLASS_NAME, C::PUBLIC).with_methods(object_methods()))
                .unwrap(),
        )
    }

    fn point(object: &Arc<Class>) -> Class {
        build_class(
            NativeClassSpec::new("demo/Point", C::PUBLIC)
                .extends(object)
                .with_methods(vec![
                    NativeMethod::new("<init>", "(II)V", M::PUBLIC, |_| Ok(None)),
                    NativeMethod::new("norm", "()D", M::PUBLIC, |_| Ok(None)),
                ])
                .with_fields(vec![
                    NativeField::new("x", "I", F::PUBLIC),
                    NativeField::new("origin", "Ldemo/Point;", F::PUBLIC | F::STATIC),
                ]),
        )
        .unwrap()
    }

    #[test]
    fn resolves_each_kind_in_order() {
        let object = object();
        let mut class = point(&object);
        link_class(
            &mut class,
            &[
                LinkRequest::class(None),
                LinkRequest::method(None, "norm", "()D"),
                LinkRequest::class(Some(&object)),
                LinkRequest::method(Some(&object), "hashCode", "()I"),
                LinkRequest::method(None, "<init>", "(II)V"),
                LinkRequest::field(None, "origin", "Ldemo/Point;"),
            ],
        )
        .unwrap();

        let class = Arc::new(class);
        assert_eq!(class.state(), ClassState::Linked);
        assert!(Arc::ptr_eq(&class.linked_class(0).unwrap(), &class));
        assert!(Arc::ptr_eq(&class.linked_class(1).unwrap(), &object));
        assert!(class.linked_class(2).is_none());

        let methods = class.links().methods();
        assert_eq!(methods.len(), 3);
        assert_eq!(methods[0].name(), "norm");
        assert_eq!(methods[1].parent_class(), OBJECT_CLASS_NAME);
        assert_eq!(methods[2].descriptor_str(), "(II)V");
        assert_eq!(class.links().fields()[0].name(), "origin");
    }

    #[test]
    fn constructors_are_not_inherited() {
        let object = object();
        let mut class = point(&object);
        let err = link_class(&mut class, &[LinkRequest::method(None, "<init>", "()V")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Linkage);
        assert_eq!(err.message(), "demo.Point: Unable to locate method demo.Point.<init>");
        assert!(class.links().is_empty());
    }

    #[test]
    fn reports_missing_fields_against_the_target() {
        let object = object();
        let mut class = point(&object);
        let err =
            link_class(&mut class, &[LinkRequest::field(Some(&object), "x", "I")]).unwrap_err();
        assert_eq!(err.message(), "demo.Point: Unable to locate field java.lang.Object.x");
        assert_eq!(err.throwable_class(), "java.lang.LinkageError");
    }
}
