use std::{
    fmt,
    sync::{Arc, Weak},
};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::{
    class::{ConstantPool, JavaStr, MethodCode},
    consts::{ClassAccessFlag, ClassTraits, FieldAccessFlag, MethodAccessFlag},
    descriptor::{BaseType, Descriptor},
    runtime::{NativeFunction, NativeVariable},
};

/// Resolution progress of a [`Class`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassState {
    /// Requested from the loader but not yet built; see
    /// [`BootstrapClassLoader::class_state`](crate::runtime::BootstrapClassLoader::class_state).
    Unresolved,
    Built,
    Linked,
    InitComplete,
    /// A concrete bytecode class is missing an interface method; raised
    /// as `AbstractMethodError` when the class is initialized.
    AbstractError,
}

/// A built class record.
///
/// Superclass and interface handles are shared with the loader that owns
/// every class; the metaclass is patched in after construction.
pub struct Class {
    pub(crate) name: Arc<str>,
    pub(crate) access_flags: ClassAccessFlag,
    pub(crate) traits: ClassTraits,
    pub(crate) super_class: Option<Arc<Class>>,
    pub(crate) interfaces: Vec<Arc<Class>>,
    pub(crate) assignment_list: Vec<Arc<Class>>,
    /// Local methods, `<clinit>` first when present.
    pub(crate) methods: Arc<[Arc<Method>]>,
    pub(crate) virtual_table: Arc<[Arc<Method>]>,
    /// One table per `assignment_list` entry, in the same order.
    pub(crate) method_tables: Vec<Arc<[Arc<Method>]>>,
    pub(crate) synthetic_method_count: usize,
    pub(crate) fields: Arc<[Arc<Field>]>,
    pub(crate) instance_size: usize,
    pub(crate) static_data: RwLock<Box<[u8]>>,
    pub(crate) metaclass: OnceCell<Weak<Class>>,
    pub(crate) state: RwLock<ClassState>,
    pub(crate) links: ClassLinks,
    pub(crate) constant_pool: Option<ConstantPool>,
    pub(crate) source_file: Option<JavaStr>,
    pub(crate) owns_tables: bool,
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("access_flags", &self.access_flags)
            .field("traits", &self.traits)
            .field("super_class", &self.super_class.as_ref().map(|c| &c.name))
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl Class {
    /// Fully qualified name with `.` separators.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access_flags(&self) -> ClassAccessFlag {
        self.access_flags
    }

    pub fn traits(&self) -> ClassTraits {
        self.traits
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlag::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(ClassAccessFlag::ABSTRACT)
    }

    pub fn is_final(&self) -> bool {
        self.access_flags.contains(ClassAccessFlag::FINAL)
    }

    pub fn is_primitive(&self) -> bool {
        self.traits.contains(ClassTraits::PRIMITIVE)
    }

    pub fn super_class(&self) -> Option<&Arc<Class>> {
        self.super_class.as_ref()
    }

    pub fn interfaces(&self) -> &[Arc<Class>] {
        &self.interfaces
    }

    /// Every class and interface this class may be assigned to, direct
    /// superclass first.
    pub fn assignment_list(&self) -> &[Arc<Class>] {
        &self.assignment_list
    }

    pub fn methods(&self) -> &[Arc<Method>] {
        &self.methods
    }

    pub fn virtual_table(&self) -> &[Arc<Method>] {
        &self.virtual_table
    }

    pub fn method_tables(&self) -> &[Arc<[Arc<Method>]>] {
        &self.method_tables
    }

    /// Dispatch table mapping `ancestor`'s virtual methods onto this
    /// class's implementations.
    pub fn method_table_for(&self, ancestor: &Class) -> Option<&[Arc<Method>]> {
        self.assignment_list
            .iter()
            .position(|entry| same_class(entry, ancestor))
            .map(|index| &*self.method_tables[index])
    }

    pub fn synthetic_method_count(&self) -> usize {
        self.synthetic_method_count
    }

    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    /// Bytes of java field data in an instance, header excluded.
    pub fn instance_size(&self) -> usize {
        self.instance_size
    }

    pub fn static_size(&self) -> usize {
        self.static_data.read().len()
    }

    pub fn metaclass(&self) -> Option<Arc<Class>> {
        self.metaclass.get().and_then(Weak::upgrade)
    }

    /// Points this class at its metaclass. Only the first call has any
    /// effect.
    pub(crate) fn set_metaclass(&self, metaclass: &Arc<Class>) -> bool {
        self.metaclass.set(Arc::downgrade(metaclass)).is_ok()
    }

    pub fn state(&self) -> ClassState {
        *self.state.read()
    }

    pub(crate) fn set_state(&self, state: ClassState) {
        *self.state.write() = state;
    }

    pub fn links(&self) -> &ClassLinks {
        &self.links
    }

    pub fn constant_pool(&self) -> Option<&ConstantPool> {
        self.constant_pool.as_ref()
    }

    pub fn source_file(&self) -> Option<&JavaStr> {
        self.source_file.as_ref()
    }

    /// False for classes that borrow their method and field tables from
    /// a standard throwable superclass.
    pub fn owns_method_tables(&self) -> bool {
        self.owns_tables
    }

    pub fn is_assignable_to(&self, target: &Class) -> bool {
        same_class(self, target)
            || self
                .assignment_list
                .iter()
                .any(|entry| same_class(entry, target))
    }

    /// Looks a method up by name and descriptor in the virtual table.
    pub fn locate_method(&self, name: &str, descriptor: &str) -> Option<&Arc<Method>> {
        self.virtual_table
            .iter()
            .find(|method| method.matches(name, descriptor))
    }

    /// Looks a method up among the methods this class declares itself.
    pub fn locate_local_method(&self, name: &str, descriptor: &str) -> Option<&Arc<Method>> {
        self.methods.iter().find(|method| method.matches(name, descriptor))
    }

    /// Searches local fields, then direct interfaces (last first), then
    /// the superclass.
    pub fn locate_field(&self, name: &str, descriptor: &str) -> Option<Arc<Field>> {
        if let Some(field) = self
            .fields
            .iter()
            .find(|field| field.name.as_ref() == name && field.descriptor_str.as_ref() == descriptor)
        {
            return Some(Arc::clone(field));
        }
        self.interfaces
            .iter()
            .rev()
            .chain(self.super_class.iter())
            .find_map(|ancestor| ancestor.locate_field(name, descriptor))
    }

    /// Reads a static field of this class from static storage. Reference
    /// slots hold heap handles.
    pub fn get_static(&self, field: &Field) -> Option<NativeVariable> {
        if !field.is_static() {
            return None;
        }
        let data = self.static_data.read();
        let bytes = data.get(field.offset..field.offset + field.size())?;
        let value = match field.descriptor {
            Descriptor::Base(base) => match base {
                BaseType::Boolean => NativeVariable::Boolean(bytes[0] != 0),
                BaseType::Byte => NativeVariable::Byte(bytes[0] as i8),
                BaseType::Char => NativeVariable::Char(u16::from_ne_bytes([bytes[0], bytes[1]])),
                BaseType::Short => NativeVariable::Short(i16::from_ne_bytes([bytes[0], bytes[1]])),
                BaseType::Int => NativeVariable::Int(i32::from_ne_bytes(bytes.try_into().ok()?)),
                BaseType::Float => NativeVariable::Float(f32::from_ne_bytes(bytes.try_into().ok()?)),
                BaseType::Long => NativeVariable::Long(i64::from_ne_bytes(bytes.try_into().ok()?)),
                BaseType::Double => {
                    NativeVariable::Double(f64::from_ne_bytes(bytes.try_into().ok()?))
                }
            },
            _ => NativeVariable::Reference(u32::from_ne_bytes(bytes[..4].try_into().ok()?)),
        };
        Some(value)
    }

    /// Writes `value` into a static slot of this class. Values of the
    /// wrong type are rejected.
    pub fn set_static(&self, field: &Field, value: &NativeVariable) -> bool {
        if !field.is_static() {
            return false;
        }
        let mut bytes = [0u8; 8];
        let encoded: &[u8] = match (&field.descriptor, value) {
            (Descriptor::Base(BaseType::Boolean), NativeVariable::Boolean(v)) => {
                bytes[0] = u8::from(*v);
                &bytes[..1]
            }
            (Descriptor::Base(BaseType::Byte), NativeVariable::Byte(v)) => {
                bytes[0] = *v as u8;
                &bytes[..1]
            }
            (Descriptor::Base(BaseType::Char), NativeVariable::Char(v)) => {
                bytes[..2].copy_from_slice(&v.to_ne_bytes());
                &bytes[..2]
            }
            (Descriptor::Base(BaseType::Short), NativeVariable::Short(v)) => {
                bytes[..2].copy_from_slice(&v.to_ne_bytes());
                &bytes[..2]
            }
            (Descriptor::Base(BaseType::Int), NativeVariable::Int(v)) => {
                bytes[..4].copy_from_slice(&v.to_ne_bytes());
                &bytes[..4]
            }
            (Descriptor::Base(BaseType::Float), NativeVariable::Float(v)) => {
                bytes[..4].copy_from_slice(&v.to_ne_bytes());
                &bytes[..4]
            }
            (Descriptor::Base(BaseType::Long), NativeVariable::Long(v)) => {
                bytes.copy_from_slice(&v.to_ne_bytes());
                &bytes[..]
            }
            (Descriptor::Base(BaseType::Double), NativeVariable::Double(v)) => {
                bytes.copy_from_slice(&v.to_ne_bytes());
                &bytes[..]
            }
            (Descriptor::Object(_) | Descriptor::Array(_), NativeVariable::Reference(v)) => {
                bytes[..4].copy_from_slice(&v.to_ne_bytes());
                &bytes[..4]
            }
            _ => return false,
        };
        let mut data = self.static_data.write();
        match data.get_mut(field.offset..field.offset + encoded.len()) {
            Some(slot) => {
                slot.copy_from_slice(encoded);
                true
            }
            None => false,
        }
    }
}

pub(crate) fn same_class(a: &Class, b: &Class) -> bool {
    std::ptr::eq(a, b)
}

/// What runs when a method is invoked.
#[derive(Debug, Clone)]
pub enum MethodBody {
    Abstract,
    Native(NativeFunction),
    /// A bytecode `native` method with no registered implementation.
    UnboundNative,
    Bytecode(Arc<MethodCode>),
}

#[derive(Debug, Clone)]
pub struct Method {
    pub(crate) access_flags: MethodAccessFlag,
    pub(crate) name: Arc<str>,
    pub(crate) descriptor_str: Arc<str>,
    pub(crate) descriptor: Descriptor,
    /// Name of the declaring class. Synthetic copies name the class that
    /// received them.
    pub(crate) parent_class: Arc<str>,
    /// Slot in the virtual table; `None` for `<init>` and `<clinit>`.
    pub(crate) method_index: Option<usize>,
    pub(crate) stack_consume: usize,
    pub(crate) exceptions: Vec<Arc<str>>,
    pub(crate) body: MethodBody,
}

impl Method {
    pub fn access_flags(&self) -> MethodAccessFlag {
        self.access_flags
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor_str(&self) -> &str {
        &self.descriptor_str
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn parent_class(&self) -> &str {
        &self.parent_class
    }

    pub fn method_index(&self) -> Option<usize> {
        self.method_index
    }

    /// Operand stack slots consumed by a call, receiver included.
    pub fn stack_consume(&self) -> usize {
        self.stack_consume
    }

    /// Class names from the `Exceptions` attribute.
    pub fn exceptions(&self) -> &[Arc<str>] {
        &self.exceptions
    }

    pub fn body(&self) -> &MethodBody {
        &self.body
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlag::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(MethodAccessFlag::ABSTRACT)
    }

    pub fn matches(&self, name: &str, descriptor: &str) -> bool {
        self.name.as_ref() == name && self.descriptor_str.as_ref() == descriptor
    }

    /// Java-source rendering such as `void wait(long,int)`.
    pub fn signature(&self) -> String {
        self.descriptor.to_readable(&self.name)
    }
}

/// A field constant from a `ConstantValue` attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(JavaStr),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) access_flags: FieldAccessFlag,
    pub(crate) name: Arc<str>,
    pub(crate) descriptor_str: Arc<str>,
    pub(crate) descriptor: Descriptor,
    pub(crate) parent_class: Arc<str>,
    /// Byte offset into instance data (header excluded) or static storage.
    pub(crate) offset: usize,
    pub(crate) constant_value: Option<ConstantValue>,
}

impl Field {
    pub fn access_flags(&self) -> FieldAccessFlag {
        self.access_flags
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor_str(&self) -> &str {
        &self.descriptor_str
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn parent_class(&self) -> &str {
        &self.parent_class
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn constant_value(&self) -> Option<&ConstantValue> {
        self.constant_value.as_ref()
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(FieldAccessFlag::STATIC)
    }

    /// Storage bytes for a value of this field's type.
    pub fn size(&self) -> usize {
        crate::runtime::layout::value_size(&self.descriptor)
    }
}

/// A resolved class reference; `This` stands for the owning class.
#[derive(Debug, Clone)]
pub enum LinkedClass {
    This,
    Other(Weak<Class>),
}

/// Direct references filled in by [`link_class`](crate::runtime::link_class).
#[derive(Debug, Default)]
pub struct ClassLinks {
    pub(crate) classes: Vec<LinkedClass>,
    pub(crate) methods: Vec<Arc<Method>>,
    pub(crate) fields: Vec<Arc<Field>>,
}

impl ClassLinks {
    pub fn classes(&self) -> &[LinkedClass] {
        &self.classes
    }

    pub fn methods(&self) -> &[Arc<Method>] {
        &self.methods
    }

    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.methods.is_empty() && self.fields.is_empty()
    }
}

impl Class {
    /// Resolves the `index`th class link. `This` yields `self`.
    pub fn linked_class(self: &Arc<Self>, index: usize) -> Option<Arc<Class>> {
        match self.links.classes.get(index)? {
            LinkedClass::This => Some(Arc::clone(self)),
            LinkedClass::Other(class) => class.upgrade(),
        }
    }
}
