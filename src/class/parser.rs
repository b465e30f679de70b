use tracing::{debug, trace};

use crate::{
    class::{
        AttributeInfo, ConstantPool, FieldInfo, MethodInfo, ParsedClassData,
        code::parse_method_code,
        pool::{read_constant_pool, read_constant_pool_index},
    },
    config::ParseOptions,
    consts::{
        ACCESS_MASK, CLASS_MAGIC, CLINIT, ClassAccessFlag, FieldAccessFlag, INIT, MethodAccessFlag,
        attribute, class_names_equal, tag,
    },
    cursor::{ByteCursor, UNEXPECTED_END},
    descriptor,
    error::{ClassError, Result},
};

const FIELD_TRUNCATED: &str = "Unexpected end of field data";
const METHOD_TRUNCATED: &str = "Unexpected end of method data";
const ATTRIBUTE_TRUNCATED: &str = "Unexpected end of attribute data";

/// Parses and structurally validates one class file with the default
/// [`ParseOptions`].
pub fn parse_class_data(bytes: &[u8]) -> Result<ParsedClassData> {
    parse_class_data_with(bytes, &ParseOptions::default())
}

pub fn parse_class_data_with(bytes: &[u8], options: &ParseOptions) -> Result<ParsedClassData> {
    // header, pool count and the fixed tail counts
    if bytes.len() < 24 {
        return Err(ClassError::truncation(UNEXPECTED_END));
    }
    let mut cursor = ByteCursor::new(bytes);
    if cursor.read_u32()? != CLASS_MAGIC {
        return Err(ClassError::malformed("Class data has invalid magic number"));
    }
    let minor_version = cursor.read_u16()?;
    let major_version = cursor.read_u16()?;
    if !options.accepts_major(major_version) {
        return Err(ClassError::malformed("Unsupported class version for JEMCC VM"));
    }

    let constant_pool = read_constant_pool(&mut cursor)?;

    cursor.ensure(14, UNEXPECTED_END)?;
    let access_flags = ClassAccessFlag::from_bits_retain(cursor.read_u16()?);
    check_class_flags(access_flags)?;
    let this_class = cursor.read_u16()?;
    let super_class = cursor.read_u16()?;

    let interfaces = read_interfaces(&mut cursor)?;
    cursor.ensure(6, UNEXPECTED_END)?;
    let fields = read_fields(&mut cursor)?;
    cursor.ensure(4, UNEXPECTED_END)?;
    let methods = read_methods(&mut cursor)?;
    cursor.ensure(2, UNEXPECTED_END)?;
    let attributes = read_attributes(&mut cursor)?;

    if !cursor.is_empty() {
        return Err(ClassError::truncation("Extra information following class data"));
    }
    trace!(
        interfaces = interfaces.len(),
        fields = fields.len(),
        methods = methods.len(),
        attributes = attributes.len(),
        "read class sections"
    );

    let mut class = ParsedClassData {
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    };

    class.constant_pool.validate()?;
    validate_hierarchy(&class)?;
    validate_fields(&class)?;
    validate_methods(&mut class)?;
    for attr in &class.attributes {
        class
            .constant_pool
            .check_constant_pool_type(attr.name_index, tag::UTF8, "Invalid class attribute name index")?;
    }
    attach_method_code(&mut class, options)?;

    debug!(
        class = %class.class_name(),
        major = major_version,
        minor = minor_version,
        "parsed class data"
    );
    Ok(class)
}

fn check_class_flags(flags: ClassAccessFlag) -> Result<()> {
    if flags.contains(ClassAccessFlag::INTERFACE) {
        let expected = ClassAccessFlag::PUBLIC | ClassAccessFlag::INTERFACE | ClassAccessFlag::ABSTRACT;
        if (flags | ClassAccessFlag::PUBLIC) != expected {
            return Err(ClassError::access("Interface class must also be abstract."));
        }
    }
    if flags.contains(ClassAccessFlag::FINAL | ClassAccessFlag::ABSTRACT) {
        return Err(ClassError::access("Final class cannot also be abstract."));
    }
    Ok(())
}

fn read_interfaces(cursor: &mut ByteCursor<'_>) -> Result<Vec<u16>> {
    let count = usize::from(cursor.read_u16()?);
    cursor.ensure(count * 2, UNEXPECTED_END)?;
    let mut interfaces = Vec::with_capacity(count);
    for _ in 0..count {
        interfaces.push(cursor.read_u16()?);
    }
    Ok(interfaces)
}

fn read_fields(cursor: &mut ByteCursor<'_>) -> Result<Vec<FieldInfo>> {
    let count = cursor.read_u16()?;
    let mut fields = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        cursor.ensure(8, FIELD_TRUNCATED)?;
        let access_flags = FieldAccessFlag::from_bits_retain(cursor.read_u16()?);
        let name_index = cursor.read_u16()?;
        let descriptor_index = cursor.read_u16()?;
        let attributes = read_attributes(cursor)?;
        fields.push(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
    }
    Ok(fields)
}

fn read_methods(cursor: &mut ByteCursor<'_>) -> Result<Vec<MethodInfo>> {
    let count = cursor.read_u16()?;
    let mut methods = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        cursor.ensure(8, METHOD_TRUNCATED)?;
        let access_flags = MethodAccessFlag::from_bits_retain(cursor.read_u16()?);
        let name_index = cursor.read_u16()?;
        let descriptor_index = cursor.read_u16()?;
        let attributes = read_attributes(cursor)?;
        methods.push(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
            exceptions: Vec::new(),
            code: None,
        });
    }
    Ok(methods)
}

/// Reads an attribute table. Bodies are copied without interpretation;
/// shared by class, field, method and code attributes.
pub(crate) fn read_attributes(cursor: &mut ByteCursor<'_>) -> Result<Vec<AttributeInfo>> {
    let count = usize::from(cursor.read_u16()?);
    cursor.ensure(count * 6, ATTRIBUTE_TRUNCATED)?;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        cursor.ensure(6, ATTRIBUTE_TRUNCATED)?;
        let name_index = cursor.read_u16()?;
        let length = cursor.read_u32()? as usize;
        cursor.ensure(length, ATTRIBUTE_TRUNCATED)?;
        let info = cursor.read_bytes(length)?;
        attributes.push(AttributeInfo { name_index, info });
    }
    Ok(attributes)
}

fn validate_hierarchy(class: &ParsedClassData) -> Result<()> {
    let pool = &class.constant_pool;
    let this_name = pool.class_name(class.this_class, "Invalid primary class index")?;
    if class.super_class == 0 {
        return Err(ClassError::cross_reference(
            "All classes must have a superclass defined",
        ));
    }
    let super_name = pool.class_name(class.super_class, "Invalid super class index")?;
    if class_names_equal(&this_name.to_str(), &super_name.to_str()) {
        return Err(ClassError::cross_reference("Class cannot be its own superclass"));
    }

    for (i, index) in class.interfaces.iter().enumerate() {
        let name = pool.class_name(*index, "Invalid interface class index")?.to_str();
        for earlier in &class.interfaces[..i] {
            if class_names_equal(&name, &pool.class_name_unchecked(*earlier).to_str()) {
                return Err(ClassError::cross_reference(format!(
                    "Repeated interface instance ({name})"
                )));
            }
        }
    }

    if class.is_interface() && !class_names_equal(&super_name.to_str(), "java/lang/Object") {
        return Err(ClassError::cross_reference(
            "Interfaces must have superclass of java.lang.Object",
        ));
    }
    Ok(())
}

fn validate_fields(class: &ParsedClassData) -> Result<()> {
    let pool = &class.constant_pool;
    for field in &class.fields {
        pool.check_constant_pool_type(field.name_index, tag::UTF8, "Invalid field name index")?;
        let descriptor = pool.utf8(field.descriptor_index, "Invalid field descriptor index")?;
        for attr in &field.attributes {
            pool.check_constant_pool_type(
                attr.name_index,
                tag::UTF8,
                "Invalid field attribute name index",
            )?;
        }

        let flags = field.access_flags;
        let visibility = FieldAccessFlag::PUBLIC | FieldAccessFlag::PROTECTED | FieldAccessFlag::PRIVATE;
        if flags.intersection(visibility).bits().count_ones() > 1 {
            return Err(ClassError::access(
                "Fields must be only one of public/protected/private",
            ));
        }
        if flags.contains(FieldAccessFlag::FINAL | FieldAccessFlag::VOLATILE) {
            return Err(ClassError::access("Fields cannot be final and volatile"));
        }
        let constant = FieldAccessFlag::PUBLIC | FieldAccessFlag::FINAL | FieldAccessFlag::STATIC;
        if class.is_interface() && flags.bits() & ACCESS_MASK != constant.bits() {
            return Err(ClassError::access(
                "Interface fields must be public/final/static",
            ));
        }

        descriptor::validate(&descriptor.to_str(), false)?;
    }
    Ok(())
}

fn validate_methods(class: &mut ParsedClassData) -> Result<()> {
    let pool = &class.constant_pool;
    let is_interface = class.is_interface();
    for method in &mut class.methods {
        let name = pool.utf8(method.name_index, "Invalid method name index")?;
        let descriptor = pool.utf8(method.descriptor_index, "Invalid method descriptor index")?;

        let mut exceptions = Vec::new();
        for attr in &method.attributes {
            let attr_name = pool.utf8(attr.name_index, "Invalid method attribute name index")?;
            if attr_name.is(attribute::EXCEPTIONS) {
                exceptions.extend(read_exceptions(attr, pool)?);
            }
        }
        method.exceptions = exceptions;

        if !name.is(CLINIT) {
            check_method_flags(method.access_flags, name.is(INIT), is_interface)?;
        }

        descriptor::validate(&descriptor.to_str(), true)?;
    }
    Ok(())
}

fn check_method_flags(flags: MethodAccessFlag, is_init: bool, is_interface: bool) -> Result<()> {
    let visibility = MethodAccessFlag::PUBLIC | MethodAccessFlag::PROTECTED | MethodAccessFlag::PRIVATE;
    if flags.intersection(visibility).bits().count_ones() > 1 {
        return Err(ClassError::access(
            "Methods must be only one of public/protected/private",
        ));
    }

    let not_abstract = MethodAccessFlag::FINAL
        | MethodAccessFlag::NATIVE
        | MethodAccessFlag::PRIVATE
        | MethodAccessFlag::STATIC
        | MethodAccessFlag::STRICT
        | MethodAccessFlag::SYNCHRONIZED;
    if flags.contains(MethodAccessFlag::ABSTRACT) && flags.intersects(not_abstract) {
        return Err(ClassError::access(
            "Abstract methods cannot be fnl/ntv/prvt/synch/sttc/strct",
        ));
    }

    let init_allowed = visibility | MethodAccessFlag::STRICT;
    if is_init && flags.bits() & ACCESS_MASK & !init_allowed.bits() != 0 {
        return Err(ClassError::access(
            "Initialization methods cannot be native/synch/static",
        ));
    }

    let interface_method = MethodAccessFlag::PUBLIC | MethodAccessFlag::ABSTRACT;
    if is_interface && flags.bits() & ACCESS_MASK != interface_method.bits() {
        return Err(ClassError::access("Interface methods must be public/abstract"));
    }
    Ok(())
}

fn read_exceptions(attr: &AttributeInfo, pool: &ConstantPool) -> Result<Vec<u16>> {
    if attr.info.len() < 2 {
        return Err(ClassError::truncation("Unexpected end of exceptions attribute"));
    }
    let mut cursor = ByteCursor::new(&attr.info);
    let count = usize::from(cursor.read_u16()?);
    if attr.info.len() != 2 + count * 2 {
        return Err(ClassError::cross_reference("Invalid exceptions list length"));
    }

    let mut exceptions = Vec::with_capacity(count);
    for _ in 0..count {
        exceptions.push(read_constant_pool_index(
            &mut cursor,
            pool,
            Some(tag::CLASS),
            "Invalid exceptions list entry",
        )?);
    }
    Ok(exceptions)
}

fn attach_method_code(class: &mut ParsedClassData, options: &ParseOptions) -> Result<()> {
    let pool = &class.constant_pool;
    for method in &mut class.methods {
        let mut code = None;
        for attr in &method.attributes {
            if !pool.utf8_unchecked(attr.name_index).is(attribute::CODE) {
                continue;
            }
            if code.is_some() {
                return Err(ClassError::malformed("Multiple code definitions for method"));
            }
            code = Some(parse_method_code(&attr.info, pool, options)?);
        }
        method.code = code;
    }
    Ok(())
}
