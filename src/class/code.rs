use tracing::warn;

use crate::{
    class::{
        AttributeInfo, ConstantPool, ExceptionTableItem, LineNumberTableItem, LocalVariable,
        MethodCode,
        parser::read_attributes,
        pool::{read_constant_pool_index, read_optional_pool_index},
    },
    config::ParseOptions,
    consts::{attribute, tag},
    cursor::ByteCursor,
    error::{ClassError, Result},
};

const CODE_TRUNCATED: &str = "Unexpected end of code attribute information";

/// Parses the body of a method's `Code` attribute against the pool it
/// was read from. The body must be consumed exactly.
pub fn parse_method_code(
    info: &[u8],
    pool: &ConstantPool,
    options: &ParseOptions,
) -> Result<MethodCode> {
    let mut cursor = ByteCursor::new(info);
    cursor.ensure(12, CODE_TRUNCATED)?;
    let max_stack = cursor.read_u16()?;
    let max_locals = cursor.read_u16()?;

    let code_length = cursor.read_u32()? as usize;
    if code_length == 0 {
        return Err(ClassError::malformed("No code body provided for method"));
    }
    // the exception table count must follow the code
    cursor.ensure(code_length.saturating_add(4), CODE_TRUNCATED)?;
    let code = cursor.read_bytes(code_length)?;

    let exception_count = usize::from(cursor.read_u16()?);
    cursor.ensure(exception_count * 8 + 2, CODE_TRUNCATED)?;
    let mut exception_table = Vec::with_capacity(exception_count);
    for _ in 0..exception_count {
        exception_table.push(ExceptionTableItem {
            start_pc: cursor.read_u16()?,
            end_pc: cursor.read_u16()?,
            handler_pc: cursor.read_u16()?,
            catch_type: read_optional_pool_index(
                &mut cursor,
                pool,
                tag::CLASS,
                "Invalid exception class index",
            )?,
        });
    }

    let mut line_numbers = Vec::new();
    let mut local_variables = Vec::new();
    let mut attributes = Vec::new();
    for attr in read_attributes(&mut cursor)? {
        let name = pool.utf8(attr.name_index, "Invalid code attribute name index")?;
        if name.is(attribute::LINE_NUMBER_TABLE) || name.is(attribute::LOCAL_VARIABLE_TABLE) {
            if !options.debug_info {
                warn!(attribute = %name, "debug info disabled, keeping attribute raw");
                attributes.push(attr);
                continue;
            }
            if name.is(attribute::LINE_NUMBER_TABLE) {
                line_numbers = read_line_numbers(&attr)?;
            } else {
                local_variables = read_local_variables(&attr, pool)?;
            }
            continue;
        }
        attributes.push(attr);
    }

    if !cursor.is_empty() {
        return Err(ClassError::truncation("Extra information in code attribute"));
    }

    Ok(MethodCode {
        max_stack,
        max_locals,
        code,
        exception_table,
        line_numbers,
        local_variables,
        attributes,
    })
}

fn read_line_numbers(attr: &AttributeInfo) -> Result<Vec<LineNumberTableItem>> {
    let mut cursor = ByteCursor::new(&attr.info);
    cursor.ensure(2, CODE_TRUNCATED)?;
    let count = usize::from(cursor.read_u16()?);
    if attr.info.len() != 2 + count * 4 {
        return Err(ClassError::malformed(
            "Invalid code line number attribute information",
        ));
    }

    let mut line_numbers = Vec::with_capacity(count);
    for _ in 0..count {
        line_numbers.push(LineNumberTableItem {
            start_pc: cursor.read_u16()?,
            line_number: cursor.read_u16()?,
        });
    }
    Ok(line_numbers)
}

fn read_local_variables(attr: &AttributeInfo, pool: &ConstantPool) -> Result<Vec<LocalVariable>> {
    let mut cursor = ByteCursor::new(&attr.info);
    cursor.ensure(2, CODE_TRUNCATED)?;
    let count = usize::from(cursor.read_u16()?);
    if attr.info.len() != 2 + count * 10 {
        return Err(ClassError::malformed(
            "Invalid code local variable attribute information",
        ));
    }

    let mut variables = Vec::with_capacity(count);
    for _ in 0..count {
        let start_pc = cursor.read_u16()?;
        let length = cursor.read_u16()?;
        let name_index = read_constant_pool_index(
            &mut cursor,
            pool,
            Some(tag::UTF8),
            "Invalid local variable name index",
        )?;
        let descriptor_index = read_constant_pool_index(
            &mut cursor,
            pool,
            Some(tag::UTF8),
            "Invalid local variable desc index",
        )?;
        variables.push(LocalVariable {
            start_pc,
            length,
            name: pool.utf8_unchecked(name_index).clone(),
            descriptor: pool.utf8_unchecked(descriptor_index).clone(),
            index: cursor.read_u16()?,
        });
    }
    Ok(variables)
}
