use crate::{
    consts::{ClassAccessFlag, FieldAccessFlag, MethodAccessFlag, tag},
    error::{ClassError, Result},
};

mod java_str;

pub use java_str::JavaStr;

/// Output of [`parse_class_data`](crate::class::parse_class_data): the
/// structurally validated, still symbolic view of one class file.
#[derive(Debug)]
pub struct ParsedClassData {
    pub(crate) minor_version: u16,
    pub(crate) major_version: u16,
    pub(crate) constant_pool: ConstantPool,
    pub(crate) access_flags: ClassAccessFlag,
    pub(crate) this_class: u16,
    pub(crate) super_class: u16,
    pub(crate) interfaces: Vec<u16>,
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) attributes: Vec<AttributeInfo>,
}

impl ParsedClassData {
    pub fn version(&self) -> (u16, u16) {
        (self.major_version, self.minor_version)
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    pub fn access_flags(&self) -> ClassAccessFlag {
        self.access_flags
    }

    /// Name of this class as written in the class file (`/` separators).
    pub fn class_name(&self) -> &JavaStr {
        self.constant_pool.class_name_unchecked(self.this_class)
    }

    pub fn super_class_name(&self) -> &JavaStr {
        self.constant_pool.class_name_unchecked(self.super_class)
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &JavaStr> {
        self.interfaces
            .iter()
            .map(|index| self.constant_pool.class_name_unchecked(*index))
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlag::INTERFACE)
    }
}

#[derive(Debug, Clone)]
pub enum ConstantPoolInfo {
    Utf8(JavaStr),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    Fieldref {
        class_index: u16,
        name_and_type_index: u16,
    },
    Methodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    /// Second slot of a `Long` or `Double`.
    Reserved,
}

impl ConstantPoolInfo {
    pub fn tag(&self) -> Option<u8> {
        let tag = match self {
            ConstantPoolInfo::Utf8(_) => tag::UTF8,
            ConstantPoolInfo::Integer(_) => tag::INTEGER,
            ConstantPoolInfo::Float(_) => tag::FLOAT,
            ConstantPoolInfo::Long(_) => tag::LONG,
            ConstantPoolInfo::Double(_) => tag::DOUBLE,
            ConstantPoolInfo::Class { .. } => tag::CLASS,
            ConstantPoolInfo::String { .. } => tag::STRING,
            ConstantPoolInfo::Fieldref { .. } => tag::FIELDREF,
            ConstantPoolInfo::Methodref { .. } => tag::METHODREF,
            ConstantPoolInfo::InterfaceMethodref { .. } => tag::INTERFACE_METHODREF,
            ConstantPoolInfo::NameAndType { .. } => tag::NAME_AND_TYPE,
            ConstantPoolInfo::Reserved => return None,
        };
        Some(tag)
    }
}

/// Constant pool entries, addressed 1-based as in the class file.
#[derive(Debug, Clone)]
pub struct ConstantPool {
    pub(crate) entries: Vec<ConstantPoolInfo>,
}

impl ConstantPool {
    /// The `constant_pool_count` declared in the class file, one more
    /// than the number of slots.
    pub fn count(&self) -> usize {
        self.entries.len() + 1
    }

    pub fn get(&self, index: u16) -> Option<&ConstantPoolInfo> {
        let slot = usize::from(index).checked_sub(1)?;
        self.entries.get(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &ConstantPoolInfo)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(slot, entry)| ((slot + 1) as u16, entry))
    }

    /// Checks that `index` names a live slot holding a `expected` entry.
    /// An out-of-range index is always reported as such; a wrong tag is
    /// reported with the caller's `message`.
    pub fn check_constant_pool_type(
        &self,
        index: u16,
        expected: u8,
        message: &str,
    ) -> Result<&ConstantPoolInfo> {
        let entry = self
            .get(index)
            .ok_or_else(|| ClassError::cross_reference("Invalid constant pool index"))?;
        if entry.tag() != Some(expected) {
            return Err(ClassError::cross_reference(message));
        }
        Ok(entry)
    }

    pub fn utf8(&self, index: u16, message: &str) -> Result<&JavaStr> {
        match self.check_constant_pool_type(index, tag::UTF8, message)? {
            ConstantPoolInfo::Utf8(text) => Ok(text),
            _ => Err(ClassError::cross_reference(message)),
        }
    }

    /// Name of the `Class` entry at `index`.
    pub fn class_name(&self, index: u16, message: &str) -> Result<&JavaStr> {
        match self.check_constant_pool_type(index, tag::CLASS, message)? {
            ConstantPoolInfo::Class { name_index } => self.utf8(*name_index, message),
            _ => Err(ClassError::cross_reference(message)),
        }
    }

    /// Lookup for indices that validation has already vouched for.
    pub(crate) fn utf8_unchecked(&self, index: u16) -> &JavaStr {
        match self.get(index) {
            Some(ConstantPoolInfo::Utf8(text)) => text,
            _ => unreachable!("constant pool validated: {index} is utf8"),
        }
    }

    pub(crate) fn class_name_unchecked(&self, index: u16) -> &JavaStr {
        match self.get(index) {
            Some(ConstantPoolInfo::Class { name_index }) => self.utf8_unchecked(*name_index),
            _ => unreachable!("constant pool validated: {index} is a class"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub(crate) access_flags: FieldAccessFlag,
    pub(crate) name_index: u16,
    pub(crate) descriptor_index: u16,
    pub(crate) attributes: Vec<AttributeInfo>,
}

impl FieldInfo {
    pub fn access_flags(&self) -> FieldAccessFlag {
        self.access_flags
    }

    pub fn name_index(&self) -> u16 {
        self.name_index
    }

    pub fn descriptor_index(&self) -> u16 {
        self.descriptor_index
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub(crate) access_flags: MethodAccessFlag,
    pub(crate) name_index: u16,
    pub(crate) descriptor_index: u16,
    pub(crate) attributes: Vec<AttributeInfo>,
    /// Class indices from the `Exceptions` attribute.
    pub(crate) exceptions: Vec<u16>,
    pub(crate) code: Option<MethodCode>,
}

impl MethodInfo {
    pub fn access_flags(&self) -> MethodAccessFlag {
        self.access_flags
    }

    pub fn name_index(&self) -> u16 {
        self.name_index
    }

    pub fn descriptor_index(&self) -> u16 {
        self.descriptor_index
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    pub fn exceptions(&self) -> &[u16] {
        &self.exceptions
    }

    pub fn code(&self) -> Option<&MethodCode> {
        self.code.as_ref()
    }
}

/// An attribute whose body is kept uninterpreted.
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    pub(crate) name_index: u16,
    pub(crate) info: Vec<u8>,
}

impl AttributeInfo {
    pub fn name_index(&self) -> u16 {
        self.name_index
    }

    pub fn info(&self) -> &[u8] {
        &self.info
    }
}

/// Body of a method's `Code` attribute.
#[derive(Debug, Clone)]
pub struct MethodCode {
    pub(crate) max_stack: u16,
    pub(crate) max_locals: u16,
    pub(crate) code: Vec<u8>,
    pub(crate) exception_table: Vec<ExceptionTableItem>,
    pub(crate) line_numbers: Vec<LineNumberTableItem>,
    pub(crate) local_variables: Vec<LocalVariable>,
    pub(crate) attributes: Vec<AttributeInfo>,
}

impl MethodCode {
    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.code
    }

    pub fn exception_table(&self) -> &[ExceptionTableItem] {
        &self.exception_table
    }

    pub fn line_numbers(&self) -> &[LineNumberTableItem] {
        &self.line_numbers
    }

    pub fn local_variables(&self) -> &[LocalVariable] {
        &self.local_variables
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionTableItem {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// `None` for a catch-all (`finally`) handler.
    pub catch_type: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberTableItem {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name: JavaStr,
    pub descriptor: JavaStr,
    pub index: u16,
}
