use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    class::{
        AttributeInfo, ConstantPool, ConstantPoolInfo, JavaStr, ParsedClassData,
        read_constant_pool_index, read_optional_pool_index,
    },
    consts::{
        CLINIT, ClassAccessFlag, ClassTraits, FieldAccessFlag, MethodAccessFlag,
        STRING_CLASS_NAME, attribute, slash_to_dot, tag,
    },
    cursor::ByteCursor,
    descriptor::{self, BaseType, Descriptor},
    error::{ClassError, LinkageKind, Result},
    runtime::{
        BootstrapClassLoader, Class, ClassLinks, ClassState, ConstantValue, Field, LinkRequest,
        LinkedClass, Method, MethodBody, NativeFunction, NativeVariable,
        hierarchy::{self, Lineage},
        layout::{self, OBJECT_HEADER_SIZE, POINTER_SIZE, PendingField},
        link_class, native,
    },
};

/// Entry of a native method table. A `None` body declares an abstract
/// method.
#[derive(Debug, Clone)]
pub struct NativeMethod {
    pub access_flags: MethodAccessFlag,
    pub name: String,
    pub descriptor: String,
    pub body: Option<NativeFunction>,
}

impl NativeMethod {
    pub fn new(
        name: &str,
        descriptor: &str,
        access_flags: MethodAccessFlag,
        body: NativeFunction,
    ) -> Self {
        Self {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            body: Some(body),
        }
    }

    pub fn abstract_method(name: &str, descriptor: &str, access_flags: MethodAccessFlag) -> Self {
        Self {
            access_flags: access_flags | MethodAccessFlag::ABSTRACT,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            body: None,
        }
    }
}

/// Entry of a native field table.
#[derive(Debug, Clone)]
pub struct NativeField {
    pub access_flags: FieldAccessFlag,
    /// `None` marks a private placeholder reserving `offset` bytes of
    /// native storage.
    pub name: Option<String>,
    pub descriptor: Option<String>,
    /// Fixed offset past the object header, or `None` to pack it.
    pub offset: Option<usize>,
}

impl NativeField {
    pub fn new(name: &str, descriptor: &str, access_flags: FieldAccessFlag) -> Self {
        Self {
            access_flags,
            name: Some(name.to_string()),
            descriptor: Some(descriptor.to_string()),
            offset: None,
        }
    }

    pub fn placeholder(access_flags: FieldAccessFlag, size: usize) -> Self {
        Self {
            access_flags,
            name: None,
            descriptor: None,
            offset: Some(size),
        }
    }

    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Everything needed to build a class that has no class file.
#[derive(Debug, Clone)]
pub struct NativeClassSpec {
    pub name: String,
    pub access_flags: ClassAccessFlag,
    pub traits: ClassTraits,
    pub super_class: Option<Arc<Class>>,
    pub interfaces: Vec<Arc<Class>>,
    pub methods: Vec<NativeMethod>,
    pub fields: Vec<NativeField>,
}

impl NativeClassSpec {
    pub fn new(name: &str, access_flags: ClassAccessFlag) -> Self {
        Self {
            name: slash_to_dot(name),
            access_flags,
            traits: ClassTraits::empty(),
            super_class: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_traits(mut self, traits: ClassTraits) -> Self {
        self.traits |= traits;
        self
    }

    pub fn extends(mut self, super_class: &Arc<Class>) -> Self {
        self.super_class = Some(Arc::clone(super_class));
        self
    }

    pub fn implements(mut self, interface: &Arc<Class>) -> Self {
        self.interfaces.push(Arc::clone(interface));
        self
    }

    pub fn with_methods(mut self, methods: Vec<NativeMethod>) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_fields(mut self, fields: Vec<NativeField>) -> Self {
        self.fields = fields;
        self
    }
}

struct DraftField {
    access_flags: FieldAccessFlag,
    name: Option<Arc<str>>,
    descriptor_str: Arc<str>,
    descriptor: Option<Descriptor>,
    offset: Option<usize>,
    constant_value: Option<ConstantValue>,
}

struct ClassDraft {
    name: Arc<str>,
    access_flags: ClassAccessFlag,
    traits: ClassTraits,
    super_class: Option<Arc<Class>>,
    interfaces: Vec<Arc<Class>>,
    methods: Vec<Method>,
    fields: Vec<DraftField>,
    constant_pool: Option<ConstantPool>,
    source_file: Option<JavaStr>,
}

fn stack_consume(access_flags: MethodAccessFlag, descriptor: &Descriptor) -> usize {
    let params: usize = descriptor.params().iter().map(Descriptor::stack_size).sum();
    if access_flags.contains(MethodAccessFlag::STATIC) {
        params
    } else {
        params + 1
    }
}

/// Builds a class record from native method and field tables.
pub fn build_class(spec: NativeClassSpec) -> Result<Class> {
    let name: Arc<str> = Arc::from(spec.name.as_str());
    let mut access_flags = spec.access_flags;
    let traits = spec.traits | ClassTraits::NATIVE_DEFINED;

    if traits.contains(ClassTraits::NATIVE_DATA)
        && spec.super_class.as_ref().is_some_and(|sup| sup.instance_size != 0)
    {
        return Err(ClassError::linkage(format!(
            "{name}: JEMCC native data element must be at root"
        )));
    }
    let is_interface = access_flags.contains(ClassAccessFlag::INTERFACE);
    if is_interface {
        access_flags |= ClassAccessFlag::ABSTRACT;
    }

    let mut methods = Vec::with_capacity(spec.methods.len());
    for entry in spec.methods {
        let mut flags = entry.access_flags;
        if entry.name == CLINIT {
            flags.remove(MethodAccessFlag::PUBLIC | MethodAccessFlag::PROTECTED);
            flags |= MethodAccessFlag::PRIVATE | MethodAccessFlag::STATIC;
        } else if is_interface {
            flags |= MethodAccessFlag::ABSTRACT;
        }

        let body = match (flags.contains(MethodAccessFlag::ABSTRACT), entry.body) {
            (true, Some(_)) => {
                return Err(ClassError::access(format!(
                    "{name}: Abstract methods cannot have code information"
                )));
            }
            (false, None) => {
                return Err(ClassError::access(format!(
                    "{name}: Non-abstract methods require code information"
                )));
            }
            (true, None) => MethodBody::Abstract,
            (false, Some(function)) => MethodBody::Native(function),
        };

        let parsed = descriptor::parse(&entry.descriptor, flags.contains(MethodAccessFlag::STATIC))?;
        if !parsed.is_method() {
            return Err(ClassError::descriptor(format!(
                "{name}: Invalid descriptor for method instance"
            )));
        }
        methods.push(Method {
            access_flags: flags,
            name: entry.name.into(),
            descriptor_str: entry.descriptor.into(),
            stack_consume: stack_consume(flags, &parsed),
            descriptor: parsed,
            parent_class: Arc::clone(&name),
            method_index: None,
            exceptions: Vec::new(),
            body,
        });
    }

    let mut fields = Vec::with_capacity(spec.fields.len());
    for entry in spec.fields {
        let descriptor_str: Arc<str> = entry.descriptor.unwrap_or_default().into();
        let descriptor = match entry.name {
            Some(_) => {
                let parsed = descriptor::parse(&descriptor_str, false)?;
                if parsed.is_method() {
                    return Err(ClassError::descriptor(format!(
                        "{name}: Invalid descriptor for field instance"
                    )));
                }
                Some(parsed)
            }
            None => None,
        };
        fields.push(DraftField {
            access_flags: entry.access_flags,
            name: entry.name.map(Arc::from),
            descriptor_str,
            descriptor,
            offset: entry.offset,
            constant_value: None,
        });
    }

    let (class, _) = assemble(ClassDraft {
        name,
        access_flags,
        traits,
        super_class: spec.super_class,
        interfaces: spec.interfaces,
        methods,
        fields,
        constant_pool: None,
        source_file: None,
    })?;
    debug!(class = %class.name, "built native class");
    Ok(class)
}

/// Builds a class record from parsed class file data. The superclass and
/// interfaces must already be resolved to the classes the file names.
pub fn build_from_parsed(
    parsed: ParsedClassData,
    super_class: Option<Arc<Class>>,
    interfaces: Vec<Arc<Class>>,
) -> Result<Class> {
    let pool = &parsed.constant_pool;
    let name: Arc<str> = slash_to_dot(&parsed.class_name().to_str()).into();

    if let Some(sup) = &super_class {
        if sup.is_interface() {
            return Err(ClassError::linkage_of(
                LinkageKind::IncompatibleClassChange,
                format!("{name}: Class cannot extend interface"),
            ));
        }
        if sup.is_final() {
            return Err(ClassError::linkage_of(
                LinkageKind::Verify,
                format!("{name}: Class cannot extend a final class"),
            ));
        }
    }
    if interfaces.iter().any(|interface| !interface.is_interface()) {
        return Err(ClassError::linkage_of(
            LinkageKind::IncompatibleClassChange,
            format!("{name}: Class cannot implement a class"),
        ));
    }

    let mut methods = Vec::with_capacity(parsed.methods.len());
    for info in parsed.methods {
        let method_name = pool.utf8_unchecked(info.name_index).to_str();
        let descriptor_str = pool.utf8_unchecked(info.descriptor_index).to_str();
        let mut flags = info.access_flags;
        let parsed_desc = descriptor::parse(&descriptor_str, flags.contains(MethodAccessFlag::STATIC))?;
        if !parsed_desc.is_method() {
            return Err(ClassError::descriptor("Invalid descriptor for method instance"));
        }
        if has_attribute(pool, &info.attributes, attribute::SYNTHETIC) {
            flags |= MethodAccessFlag::SYNTHETIC;
        }

        let body = if flags.intersects(MethodAccessFlag::ABSTRACT | MethodAccessFlag::NATIVE) {
            if info.code.is_some() {
                return Err(ClassError::access(
                    "Abstract/native methods cannot have code information",
                ));
            }
            if flags.contains(MethodAccessFlag::NATIVE) {
                native::lookup_native(&name, &method_name, &descriptor_str)
                    .map_or(MethodBody::UnboundNative, MethodBody::Native)
            } else {
                MethodBody::Abstract
            }
        } else {
            match info.code {
                Some(code) => MethodBody::Bytecode(Arc::new(code)),
                None => {
                    return Err(ClassError::access(
                        "Non-abstract/native method missing code information",
                    ));
                }
            }
        };

        let exceptions = info
            .exceptions
            .iter()
            .map(|index| Arc::from(slash_to_dot(&pool.class_name_unchecked(*index).to_str())))
            .collect();
        methods.push(Method {
            access_flags: flags,
            name: method_name.into(),
            descriptor_str: descriptor_str.into(),
            stack_consume: stack_consume(flags, &parsed_desc),
            descriptor: parsed_desc,
            parent_class: Arc::clone(&name),
            method_index: None,
            exceptions,
            body,
        });
    }

    let mut fields = Vec::with_capacity(parsed.fields.len());
    for info in &parsed.fields {
        let field_name = pool.utf8_unchecked(info.name_index).to_str();
        let descriptor_str = pool.utf8_unchecked(info.descriptor_index).to_str();
        let parsed_desc = descriptor::parse(&descriptor_str, false)?;
        if parsed_desc.is_method() {
            return Err(ClassError::descriptor("Invalid descriptor for field instance"));
        }

        let mut flags = info.access_flags;
        let mut constant_value = None;
        let mut found_constant = false;
        for attr in &info.attributes {
            let attr_name = pool.utf8_unchecked(attr.name_index);
            if attr_name.is(attribute::CONSTANT_VALUE) {
                if found_constant {
                    return Err(ClassError::malformed("Multiple constant values for same field"));
                }
                if attr.info.len() != 2 {
                    return Err(ClassError::malformed("Invalid constant value attribute data"));
                }
                if !flags.contains(FieldAccessFlag::STATIC) {
                    continue;
                }
                constant_value = Some(read_constant_value(pool, attr, &parsed_desc)?);
                found_constant = true;
            } else if attr_name.is(attribute::SYNTHETIC) {
                flags |= FieldAccessFlag::SYNTHETIC;
            }
        }

        fields.push(DraftField {
            access_flags: flags,
            name: Some(field_name.into()),
            descriptor_str: descriptor_str.into(),
            descriptor: Some(parsed_desc),
            offset: None,
            constant_value,
        });
    }

    let source_file = read_class_attributes(pool, &parsed.attributes)?;

    let mut access_flags = parsed.access_flags;
    if access_flags.contains(ClassAccessFlag::INTERFACE) {
        access_flags |= ClassAccessFlag::ABSTRACT;
    }
    let (class, abstract_error) = assemble(ClassDraft {
        name,
        access_flags,
        traits: ClassTraits::empty(),
        super_class,
        interfaces,
        methods,
        fields,
        constant_pool: Some(parsed.constant_pool),
        source_file,
    })?;
    class.set_state(if abstract_error {
        ClassState::AbstractError
    } else {
        ClassState::Linked
    });
    debug!(class = %class.name, state = ?class.state(), "built class from class data");
    Ok(class)
}

fn has_attribute(pool: &ConstantPool, attributes: &[AttributeInfo], name: &str) -> bool {
    attributes
        .iter()
        .any(|attr| pool.utf8_unchecked(attr.name_index).is(name))
}

fn read_constant_value(
    pool: &ConstantPool,
    attr: &AttributeInfo,
    field_type: &Descriptor,
) -> Result<ConstantValue> {
    let mut cursor = ByteCursor::new(&attr.info);
    let index = read_constant_pool_index(&mut cursor, pool, None, "Invalid constant value index")?;
    let value = match (pool.get(index), field_type) {
        (
            Some(ConstantPoolInfo::Integer(value)),
            Descriptor::Base(
                BaseType::Boolean | BaseType::Byte | BaseType::Short | BaseType::Char | BaseType::Int,
            ),
        ) => ConstantValue::Int(*value),
        (Some(ConstantPoolInfo::Integer(_)), _) => {
            return Err(ClassError::malformed("Invalid field type for int constant"));
        }
        (Some(ConstantPoolInfo::Float(value)), Descriptor::Base(BaseType::Float)) => {
            ConstantValue::Float(*value)
        }
        (Some(ConstantPoolInfo::Float(_)), _) => {
            return Err(ClassError::malformed("Invalid field type for float constant"));
        }
        (Some(ConstantPoolInfo::Long(value)), Descriptor::Base(BaseType::Long)) => {
            ConstantValue::Long(*value)
        }
        (Some(ConstantPoolInfo::Long(_)), _) => {
            return Err(ClassError::malformed("Invalid field type for long constant"));
        }
        (Some(ConstantPoolInfo::Double(value)), Descriptor::Base(BaseType::Double)) => {
            ConstantValue::Double(*value)
        }
        (Some(ConstantPoolInfo::Double(_)), _) => {
            return Err(ClassError::malformed("Invalid field type for double constant"));
        }
        (Some(ConstantPoolInfo::String { string_index }), Descriptor::Object(class))
            if class.as_ref() == STRING_CLASS_NAME =>
        {
            ConstantValue::String(pool.utf8_unchecked(*string_index).clone())
        }
        (Some(ConstantPoolInfo::String { .. }), _) => {
            return Err(ClassError::malformed("Invalid field type for string constant"));
        }
        _ => return Err(ClassError::malformed("Invalid constant value type")),
    };
    Ok(value)
}

/// Checks `SourceFile` and `InnerClasses`; other class attributes are
/// ignored.
fn read_class_attributes(
    pool: &ConstantPool,
    attributes: &[AttributeInfo],
) -> Result<Option<JavaStr>> {
    let mut source_file = None;
    for attr in attributes {
        let attr_name = pool.utf8_unchecked(attr.name_index);
        if attr_name.is(attribute::SOURCE_FILE) {
            if attr.info.len() != 2 {
                return Err(ClassError::malformed("Incorrect length for SourceFile attribute"));
            }
            if source_file.is_some() {
                return Err(ClassError::malformed("Multiple SourceFile attribute statements"));
            }
            let mut cursor = ByteCursor::new(&attr.info);
            let index = read_constant_pool_index(
                &mut cursor,
                pool,
                Some(tag::UTF8),
                "Invalid SourceFile data index",
            )?;
            source_file = Some(pool.utf8_unchecked(index).clone());
        } else if attr_name.is(attribute::INNER_CLASSES) {
            if attr.info.len() < 2 {
                return Err(ClassError::truncation("Insufficient InnerClass attribute data"));
            }
            let mut cursor = ByteCursor::new(&attr.info);
            let count = usize::from(cursor.read_u16()?);
            if attr.info.len() != 2 + count * 8 {
                return Err(ClassError::malformed("Incorrect InnerClass attribute length"));
            }
            for _ in 0..count {
                read_optional_pool_index(&mut cursor, pool, tag::CLASS, "Invalid inner class info index")?;
                read_optional_pool_index(&mut cursor, pool, tag::CLASS, "Invalid outer class info index")?;
                read_optional_pool_index(&mut cursor, pool, tag::UTF8, "Invalid inner class name index")?;
                cursor.skip(2)?;
            }
        }
    }
    Ok(source_file)
}

fn zeroed_storage(size: usize) -> Result<Box<[u8]>> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(size)
        .map_err(|_| ClassError::allocation(size))?;
    storage.resize(size, 0);
    Ok(storage.into_boxed_slice())
}

fn pack(class_name: &str, fields: &[&DraftField], start: usize, header: usize) -> Result<layout::Packed> {
    let pending: Vec<PendingField> = fields
        .iter()
        .map(|field| PendingField {
            name: field.name.clone(),
            descriptor: field.descriptor.clone(),
            offset: field.offset,
        })
        .collect();
    layout::pack_fields(class_name, &pending, start, header)
}

// Shared tail of both build paths: method tables, field layout, static
// storage and constant values.
fn assemble(draft: ClassDraft) -> Result<(Class, bool)> {
    let hierarchy = hierarchy::compose(
        &Lineage {
            name: &draft.name,
            access_flags: draft.access_flags,
            traits: draft.traits,
            super_class: draft.super_class.as_ref(),
            interfaces: &draft.interfaces,
        },
        draft.methods,
    )?;

    let mut instance_start = if draft.access_flags.contains(ClassAccessFlag::INTERFACE) {
        0
    } else {
        draft.super_class.as_ref().map_or(0, |sup| sup.instance_size)
    };
    if draft.traits.contains(ClassTraits::NATIVE_DATA) {
        instance_start += POINTER_SIZE;
    }

    let (statics, instance): (Vec<&DraftField>, Vec<&DraftField>) = draft
        .fields
        .iter()
        .partition(|field| field.access_flags.contains(FieldAccessFlag::STATIC));
    let instance_packed = pack(&draft.name, &instance, instance_start, OBJECT_HEADER_SIZE)?;
    let static_packed = pack(&draft.name, &statics, 0, 0)?;

    let mut instance_offsets = instance_packed.offsets.into_iter();
    let mut static_offsets = static_packed.offsets.into_iter();
    let mut fields = Vec::with_capacity(draft.fields.len());
    for field in draft.fields {
        let offset = if field.access_flags.contains(FieldAccessFlag::STATIC) {
            static_offsets.next()
        } else {
            instance_offsets.next()
        }
        .unwrap_or_default();
        let (Some(name), Some(descriptor)) = (field.name, field.descriptor) else {
            continue;
        };
        fields.push(Arc::new(Field {
            access_flags: field.access_flags,
            name,
            descriptor_str: field.descriptor_str,
            descriptor,
            parent_class: Arc::clone(&draft.name),
            offset,
            constant_value: field.constant_value,
        }));
    }

    let class = Class {
        name: draft.name,
        access_flags: draft.access_flags,
        traits: draft.traits,
        super_class: draft.super_class,
        interfaces: draft.interfaces,
        assignment_list: hierarchy.assignment_list,
        methods: hierarchy.methods,
        virtual_table: hierarchy.virtual_table,
        method_tables: hierarchy.method_tables,
        synthetic_method_count: hierarchy.synthetic_method_count,
        fields: fields.into(),
        instance_size: instance_packed.size,
        static_data: RwLock::new(zeroed_storage(static_packed.size)?),
        metaclass: OnceCell::new(),
        state: RwLock::new(ClassState::Built),
        links: ClassLinks::default(),
        constant_pool: draft.constant_pool,
        source_file: draft.source_file,
        owns_tables: true,
    };

    for field in class.fields.iter() {
        if let Some(value) = field.constant_value.as_ref().and_then(|v| constant_to_variable(v, field)) {
            class.set_static(field, &value);
        }
    }
    Ok((class, hierarchy.abstract_error))
}

fn constant_to_variable(value: &ConstantValue, field: &Field) -> Option<NativeVariable> {
    let variable = match (value, &field.descriptor) {
        (ConstantValue::Int(v), Descriptor::Base(base)) => match base {
            BaseType::Boolean => NativeVariable::Boolean(*v != 0),
            BaseType::Byte => NativeVariable::Byte(*v as i8),
            BaseType::Char => NativeVariable::Char(*v as u16),
            BaseType::Short => NativeVariable::Short(*v as i16),
            _ => NativeVariable::Int(*v),
        },
        (ConstantValue::Float(v), _) => NativeVariable::Float(*v),
        (ConstantValue::Long(v), _) => NativeVariable::Long(*v),
        (ConstantValue::Double(v), _) => NativeVariable::Double(*v),
        _ => return None,
    };
    Some(variable)
}

/// Writes one value per static field of `class`, in declaration order.
pub fn initialize_static_fields(class: &Class, values: &[NativeVariable]) -> Result<()> {
    let statics: Vec<&Arc<Field>> = class.fields.iter().filter(|f| f.is_static()).collect();
    if statics.len() != values.len() {
        return Err(ClassError::linkage(format!(
            "{}: Expected {} static initializers, got {}",
            class.name,
            statics.len(),
            values.len()
        )));
    }
    for (field, value) in statics.into_iter().zip(values) {
        if !class.set_static(field, value) {
            return Err(ClassError::linkage(format!(
                "{}: Invalid static initializer for field {}",
                class.name, field.name
            )));
        }
    }
    Ok(())
}

/// Builds, links, initializes and registers a native class.
pub fn create_std_class(
    loader: &BootstrapClassLoader,
    spec: NativeClassSpec,
    links: &[LinkRequest],
    statics: Option<&[NativeVariable]>,
) -> Result<Arc<Class>> {
    let mut class = build_class(spec)?;
    if !links.is_empty() {
        link_class(&mut class, links)?;
    }
    if let Some(values) = statics {
        initialize_static_fields(&class, values)?;
    }
    let has_clinit = class.methods.first().is_some_and(|m| m.name.as_ref() == CLINIT);
    class.set_state(if has_clinit {
        ClassState::Linked
    } else {
        ClassState::InitComplete
    });
    loader.register(Arc::new(class))
}

/// Creates a throwable subclass that declares nothing of its own. Method
/// tables, fields and layout are shared with `super_class`.
pub fn create_std_throwable_class(
    loader: &BootstrapClassLoader,
    name: &str,
    super_class: &Arc<Class>,
) -> Result<Arc<Class>> {
    let name: Arc<str> = slash_to_dot(name).into();
    if !super_class.traits.contains(ClassTraits::STD_THROWABLE) {
        return Err(ClassError::linkage(format!(
            "{name}: Std throwable must have std throwable superclass"
        )));
    }

    let mut assignment_list = Vec::with_capacity(super_class.assignment_list.len() + 1);
    assignment_list.push(Arc::clone(super_class));
    assignment_list.extend(super_class.assignment_list.iter().cloned());
    let mut method_tables = Vec::with_capacity(super_class.method_tables.len() + 1);
    method_tables.push(Arc::clone(&super_class.virtual_table));
    method_tables.extend(super_class.method_tables.iter().cloned());

    let links = ClassLinks {
        classes: super_class
            .links
            .classes
            .iter()
            .map(|link| match link {
                LinkedClass::This => LinkedClass::Other(Arc::downgrade(super_class)),
                other => other.clone(),
            })
            .collect(),
        methods: super_class.links.methods.clone(),
        fields: super_class.links.fields.clone(),
    };

    let class = Class {
        name,
        access_flags: super_class.access_flags,
        traits: super_class.traits,
        super_class: Some(Arc::clone(super_class)),
        interfaces: Vec::new(),
        assignment_list,
        methods: Arc::clone(&super_class.methods),
        virtual_table: Arc::clone(&super_class.virtual_table),
        method_tables,
        synthetic_method_count: super_class.synthetic_method_count,
        fields: Arc::clone(&super_class.fields),
        instance_size: super_class.instance_size,
        static_data: RwLock::new(zeroed_storage(super_class.static_size())?),
        metaclass: OnceCell::new(),
        state: RwLock::new(super_class.state()),
        links,
        constant_pool: None,
        source_file: None,
        owns_tables: false,
    };
    if let Some(metaclass) = super_class.metaclass() {
        class.set_metaclass(&metaclass);
    }
    debug!(class = %class.name, parent = %super_class.name, "created std throwable");
    loader.register(Arc::new(class))
}
