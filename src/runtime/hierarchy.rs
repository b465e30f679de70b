use std::sync::Arc;

use tracing::{trace, warn};

use crate::{
    consts::{CLINIT, ClassAccessFlag, ClassTraits, MethodAccessFlag},
    error::{ClassError, LinkageKind, Result},
    runtime::{Class, Method, structs::same_class},
};

/// Inheritance data of a class under construction.
pub(crate) struct Lineage<'a> {
    pub(crate) name: &'a Arc<str>,
    pub(crate) access_flags: ClassAccessFlag,
    pub(crate) traits: ClassTraits,
    pub(crate) super_class: Option<&'a Arc<Class>>,
    pub(crate) interfaces: &'a [Arc<Class>],
}

#[derive(Debug)]
pub(crate) struct Hierarchy {
    pub(crate) assignment_list: Vec<Arc<Class>>,
    pub(crate) methods: Arc<[Arc<Method>]>,
    pub(crate) virtual_table: Arc<[Arc<Method>]>,
    pub(crate) method_tables: Vec<Arc<[Arc<Method>]>>,
    pub(crate) synthetic_method_count: usize,
    /// A concrete bytecode class left an interface method unimplemented.
    pub(crate) abstract_error: bool,
}

fn find(table: &[Arc<Method>], name: &str, descriptor: &str) -> Option<usize> {
    table.iter().position(|method| method.matches(name, descriptor))
}

/// Merges the inherited virtual table with `methods` and builds one
/// dispatch table per entry of the assignment list.
pub(crate) fn compose(lineage: &Lineage<'_>, methods: Vec<Method>) -> Result<Hierarchy> {
    let is_interface = lineage.access_flags.contains(ClassAccessFlag::INTERFACE);

    // interfaces start from whichever parent carries the most methods
    let mut base = lineage.super_class;
    if is_interface {
        let mut count = base.map_or(0, |class| class.virtual_table.len());
        for interface in lineage.interfaces {
            if interface.virtual_table.len() > count {
                count = interface.virtual_table.len();
                base = Some(interface);
            }
        }
    }
    let mut table: Vec<Arc<Method>> = base
        .map(|class| class.virtual_table.to_vec())
        .unwrap_or_default();

    let mut local = Vec::with_capacity(methods.len());
    let mut clinit = None;
    for (position, mut method) in methods.into_iter().enumerate() {
        if method.name.starts_with('<') {
            if method.name.as_ref() == CLINIT {
                clinit = Some(position);
            }
            method.method_index = None;
            local.push(Arc::new(method));
            continue;
        }

        let index = find(&table, &method.name, &method.descriptor_str).unwrap_or(table.len());
        method.method_index = Some(index);
        let method = Arc::new(method);
        if index < table.len() {
            table[index] = Arc::clone(&method);
        } else {
            table.push(Arc::clone(&method));
        }
        local.push(method);
    }
    if let Some(position) = clinit {
        local.swap(0, position);
    }

    let mut assignment_list: Vec<Arc<Class>> = Vec::new();
    let mut assign = |class: &Arc<Class>| {
        if !assignment_list.iter().any(|entry| same_class(entry, class)) {
            assignment_list.push(Arc::clone(class));
        }
    };
    if let Some(super_class) = lineage.super_class {
        assign(super_class);
    }
    lineage.interfaces.iter().for_each(&mut assign);
    if let Some(super_class) = lineage.super_class {
        super_class.assignment_list.iter().for_each(&mut assign);
    }
    for interface in lineage.interfaces {
        interface.assignment_list.iter().for_each(&mut assign);
    }

    let synthesize = lineage.access_flags.contains(ClassAccessFlag::ABSTRACT);
    let native = lineage.traits.contains(ClassTraits::NATIVE_DEFINED);
    let mut synthetic_method_count = 0;
    let mut abstract_error = false;
    let mut interface_tables = Vec::with_capacity(assignment_list.len());
    for entry in &assignment_list {
        if !entry.is_interface() {
            interface_tables.push(None);
            continue;
        }

        let mut mapped = Vec::with_capacity(entry.virtual_table.len());
        for wanted in entry.virtual_table.iter() {
            if let Some(index) = find(&table, &wanted.name, &wanted.descriptor_str) {
                mapped.push(Arc::clone(&table[index]));
                continue;
            }
            if synthesize {
                let mut copy = Method::clone(wanted);
                copy.access_flags |= MethodAccessFlag::SYNTHETIC;
                copy.parent_class = Arc::clone(lineage.name);
                copy.method_index = Some(table.len());
                let copy = Arc::new(copy);
                table.push(Arc::clone(&copy));
                mapped.push(copy);
                synthetic_method_count += 1;
            } else if native {
                return Err(ClassError::linkage_of(
                    LinkageKind::AbstractMethod,
                    format!(
                        "Concrete class, method undefined: {}.{}",
                        lineage.name, wanted.name
                    ),
                ));
            } else {
                warn!(
                    class = %lineage.name,
                    method = %wanted.name,
                    interface = entry.name(),
                    "concrete class does not implement interface method"
                );
                abstract_error = true;
                mapped.push(Arc::clone(wanted));
            }
        }
        interface_tables.push(Some(mapped));
    }

    let virtual_table: Arc<[Arc<Method>]> = table.into();
    let method_tables = interface_tables
        .into_iter()
        .map(|mapped| match mapped {
            Some(mapped) => mapped.into(),
            None => Arc::clone(&virtual_table),
        })
        .collect();
    trace!(
        class = %lineage.name,
        virtual_methods = virtual_table.len(),
        assignments = assignment_list.len(),
        "composed class hierarchy"
    );

    Ok(Hierarchy {
        assignment_list,
        methods: local.into(),
        virtual_table,
        method_tables,
        synthetic_method_count,
        abstract_error,
    })
}
