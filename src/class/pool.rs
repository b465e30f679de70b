use tracing::trace;

use crate::{
    class::{ConstantPool, ConstantPoolInfo, JavaStr},
    consts::tag,
    cursor::ByteCursor,
    error::{ClassError, Result},
};

/// Smallest on-disk record for each tag, tag byte included. Zero marks
/// tags that have no record.
const MIN_RECORD_SIZE: [usize; tag::MAX as usize + 1] = [0, 3, 0, 5, 5, 9, 9, 3, 3, 5, 5, 5, 5];

const POOL_TRUNCATED: &str = "Unexpected end of constant pool data";

pub(crate) fn read_constant_pool(cursor: &mut ByteCursor<'_>) -> Result<ConstantPool> {
    let count = usize::from(cursor.read_u16()?);
    if count < 2 {
        return Err(ClassError::malformed("Invalid class constant pool count"));
    }
    trace!(count, "reading constant pool");

    let mut entries = Vec::with_capacity(count - 1);
    while entries.len() < count - 1 {
        let entry = read_constant(cursor)?;
        let wide = matches!(entry, ConstantPoolInfo::Long(_) | ConstantPoolInfo::Double(_));
        entries.push(entry);
        if wide {
            if entries.len() >= count - 1 {
                return Err(ClassError::malformed("Incorrect long/double end offset"));
            }
            entries.push(ConstantPoolInfo::Reserved);
        }
    }

    Ok(ConstantPool { entries })
}

fn read_constant(cursor: &mut ByteCursor<'_>) -> Result<ConstantPoolInfo> {
    let tag_byte = cursor
        .rest()
        .first()
        .copied()
        .ok_or_else(|| ClassError::truncation(POOL_TRUNCATED))?;
    let min_size = MIN_RECORD_SIZE
        .get(usize::from(tag_byte))
        .copied()
        .filter(|size| *size != 0)
        .ok_or_else(|| ClassError::malformed("Unknown constant pool entry type"))?;
    cursor.ensure(min_size, POOL_TRUNCATED)?;
    cursor.read_u8()?;

    let entry = match tag_byte {
        tag::UTF8 => {
            let length = usize::from(cursor.read_u16()?);
            cursor.ensure(length, POOL_TRUNCATED)?;
            ConstantPoolInfo::Utf8(JavaStr::new(cursor.read_bytes(length)?))
        }
        tag::INTEGER => ConstantPoolInfo::Integer(cursor.read_i32()?),
        tag::FLOAT => ConstantPoolInfo::Float(cursor.read_f32()?),
        tag::LONG => ConstantPoolInfo::Long(cursor.read_i64()?),
        tag::DOUBLE => ConstantPoolInfo::Double(cursor.read_f64()?),
        tag::CLASS => ConstantPoolInfo::Class {
            name_index: cursor.read_u16()?,
        },
        tag::STRING => ConstantPoolInfo::String {
            string_index: cursor.read_u16()?,
        },
        tag::FIELDREF | tag::METHODREF | tag::INTERFACE_METHODREF => {
            let class_index = cursor.read_u16()?;
            let name_and_type_index = cursor.read_u16()?;
            match tag_byte {
                tag::FIELDREF => ConstantPoolInfo::Fieldref {
                    class_index,
                    name_and_type_index,
                },
                tag::METHODREF => ConstantPoolInfo::Methodref {
                    class_index,
                    name_and_type_index,
                },
                _ => ConstantPoolInfo::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                },
            }
        }
        tag::NAME_AND_TYPE => ConstantPoolInfo::NameAndType {
            name_index: cursor.read_u16()?,
            descriptor_index: cursor.read_u16()?,
        },
        _ => return Err(ClassError::malformed("Unknown constant pool entry type")),
    };
    Ok(entry)
}

/// Reads a u2 pool index and checks it against `expected` (any live slot
/// when `None`).
pub(crate) fn read_constant_pool_index(
    cursor: &mut ByteCursor<'_>,
    pool: &ConstantPool,
    expected: Option<u8>,
    message: &str,
) -> Result<u16> {
    let index = cursor.read_u16()?;
    match expected {
        Some(tag) => {
            pool.check_constant_pool_type(index, tag, message)?;
        }
        None => {
            pool.get(index)
                .ok_or_else(|| ClassError::cross_reference("Invalid constant pool index"))?;
        }
    }
    Ok(index)
}

/// Like [`read_constant_pool_index`], but zero is accepted as "absent".
pub(crate) fn read_optional_pool_index(
    cursor: &mut ByteCursor<'_>,
    pool: &ConstantPool,
    expected: u8,
    message: &str,
) -> Result<Option<u16>> {
    let index = cursor.read_u16()?;
    if index == 0 {
        return Ok(None);
    }
    pool.check_constant_pool_type(index, expected, message)?;
    Ok(Some(index))
}

impl ConstantPool {
    /// Checks every cross-reference between pool entries.
    pub fn validate(&self) -> Result<()> {
        for (_, entry) in self.iter() {
            match entry {
                ConstantPoolInfo::Class { name_index } => {
                    let name = self.utf8(*name_index, "Invalid class constant name index")?;
                    if !is_valid_class_lead(name.first_byte()) {
                        return Err(ClassError::cross_reference("Invalid classname lead character"));
                    }
                }
                ConstantPoolInfo::Fieldref {
                    class_index,
                    name_and_type_index,
                }
                | ConstantPoolInfo::Methodref {
                    class_index,
                    name_and_type_index,
                }
                | ConstantPoolInfo::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => {
                    self.check_constant_pool_type(
                        *class_index,
                        tag::CLASS,
                        "Invalid reference constant class index",
                    )?;
                    self.check_constant_pool_type(
                        *name_and_type_index,
                        tag::NAME_AND_TYPE,
                        "Invalid reference constant name and type index",
                    )?;
                }
                ConstantPoolInfo::String { string_index } => {
                    self.check_constant_pool_type(
                        *string_index,
                        tag::UTF8,
                        "Invalid string constant data index",
                    )?;
                }
                ConstantPoolInfo::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    self.check_constant_pool_type(
                        *name_index,
                        tag::UTF8,
                        "Invalid name/type constant name index",
                    )?;
                    self.check_constant_pool_type(
                        *descriptor_index,
                        tag::UTF8,
                        "Invalid name/type constant descriptor index",
                    )?;
                }
                ConstantPoolInfo::Utf8(_)
                | ConstantPoolInfo::Integer(_)
                | ConstantPoolInfo::Float(_)
                | ConstantPoolInfo::Long(_)
                | ConstantPoolInfo::Double(_)
                | ConstantPoolInfo::Reserved => {}
            }
        }
        Ok(())
    }
}

// Rejects control characters, punctuation and the empty name; `[` stays
// legal for array classes.
fn is_valid_class_lead(lead: Option<u8>) -> bool {
    match lead {
        None => false,
        Some(byte) => !matches!(byte, 0x00..=0x2F | 0x3A..=0x40 | 0x5C..=0x60 | 0x7B..=0x7F),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn pool_of(count: u16, body: &[u8]) -> Result<ConstantPool> {
        let mut data = count.to_be_bytes().to_vec();
        data.extend_from_slice(body);
        read_constant_pool(&mut ByteCursor::new(&data))
    }

    #[test]
    fn long_consumes_two_slots() {
        let pool = pool_of(3, &[tag::LONG, 0, 0, 0, 0, 0, 0, 0, 42]).unwrap();
        assert_eq!(pool.count(), 3);
        assert!(matches!(pool.get(1), Some(ConstantPoolInfo::Long(42))));
        let err = pool.check_constant_pool_type(2, tag::LONG, "Bad slot").unwrap_err();
        assert_eq!(err, ClassError::BadCrossReference("Bad slot".into()));
        let err = pool.check_constant_pool_type(3, tag::LONG, "Bad slot").unwrap_err();
        assert_eq!(err.message(), "Invalid constant pool index");
        assert!(pool.check_constant_pool_type(0, tag::LONG, "Bad slot").is_err());
    }

    #[test]
    fn long_past_declared_count() {
        let err = pool_of(2, &[tag::DOUBLE, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(err.message(), "Incorrect long/double end offset");
    }

    #[test]
    fn rejects_small_counts_and_unknown_tags() {
        assert_eq!(pool_of(1, &[]).unwrap_err().message(), "Invalid class constant pool count");
        assert_eq!(pool_of(0, &[]).unwrap_err().kind(), ErrorKind::MalformedConstant);
        for bad in [0u8, 2, 13, 15, 255] {
            let err = pool_of(2, &[bad, 0, 0, 0, 0]).unwrap_err();
            assert_eq!(err.message(), "Unknown constant pool entry type", "tag {bad}");
        }
    }

    #[test]
    fn short_records_are_truncation() {
        let err = pool_of(2, &[tag::INTEGER, 0, 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncation);
        let err = pool_of(2, &[tag::UTF8, 0, 5, b'a', b'b']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncation);
        let err = pool_of(3, &[tag::CLASS, 0, 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncation);
    }

    #[test]
    fn decodes_numbers() {
        let mut body = vec![tag::FLOAT];
        body.extend_from_slice(&0.5f32.to_bits().to_be_bytes());
        body.push(tag::INTEGER);
        body.extend_from_slice(&(-7i32).to_be_bytes());
        let pool = pool_of(3, &body).unwrap();
        assert!(matches!(pool.get(1), Some(ConstantPoolInfo::Float(v)) if *v == 0.5));
        assert!(matches!(pool.get(2), Some(ConstantPoolInfo::Integer(-7))));
    }

    #[test]
    fn validates_cross_references() {
        // #1 Class -> #2 Utf8 "Foo"
        let pool = pool_of(3, &[tag::CLASS, 0, 2, tag::UTF8, 0, 3, b'F', b'o', b'o']).unwrap();
        pool.validate().unwrap();

        // class name pointing at itself
        let pool = pool_of(2, &[tag::CLASS, 0, 1]).unwrap();
        assert_eq!(pool.validate().unwrap_err().message(), "Invalid class constant name index");

        let pool = pool_of(3, &[tag::STRING, 0, 2, tag::INTEGER, 0, 0, 0, 1]).unwrap();
        assert_eq!(pool.validate().unwrap_err().message(), "Invalid string constant data index");

        let pool = pool_of(3, &[tag::METHODREF, 0, 2, 0, 2, tag::UTF8, 0, 1, b'x']).unwrap();
        assert_eq!(
            pool.validate().unwrap_err().message(),
            "Invalid reference constant class index"
        );

        let pool = pool_of(3, &[tag::NAME_AND_TYPE, 0, 2, 0, 1, tag::UTF8, 0, 1, b'x']).unwrap();
        assert_eq!(
            pool.validate().unwrap_err().message(),
            "Invalid name/type constant descriptor index"
        );
    }

    #[test]
    fn class_name_lead_ranges() {
        for (lead, ok) in [
            (b'j', true),
            (b'[', true),
            (b'A', true),
            (b'_', false),
            (b'0', true),
            (b'9', true),
            (b'/', false),
            (b':', false),
            (b'@', false),
            (b'\\', false),
            (b'`', false),
            (b';', false),
            (b'{', false),
            (0x7F, false),
            (0x80, true),
            (0xC3, true),
        ] {
            let pool = pool_of(3, &[tag::CLASS, 0, 2, tag::UTF8, 0, 1, lead]).unwrap();
            assert_eq!(pool.validate().is_ok(), ok, "lead {lead:#x}");
        }
        let pool = pool_of(3, &[tag::CLASS, 0, 2, tag::UTF8, 0, 0]).unwrap();
        assert_eq!(pool.validate().unwrap_err().message(), "Invalid classname lead character");
    }
}
