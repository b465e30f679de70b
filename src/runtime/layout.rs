use std::sync::Arc;

use crate::{
    descriptor::{BaseType, Descriptor},
    error::{ClassError, Result},
};

pub const POINTER_SIZE: usize = size_of::<usize>();

/// Bytes ahead of the first java field in every instance.
pub const OBJECT_HEADER_SIZE: usize = 2 * POINTER_SIZE;

/// Storage bytes for a value of the given type.
pub fn value_size(descriptor: &Descriptor) -> usize {
    match descriptor {
        Descriptor::Base(BaseType::Byte | BaseType::Boolean) => 1,
        Descriptor::Base(BaseType::Char | BaseType::Short) => 2,
        Descriptor::Base(BaseType::Int | BaseType::Float) => 4,
        Descriptor::Base(BaseType::Long | BaseType::Double) => 8,
        Descriptor::Object(_) | Descriptor::Array(_) => POINTER_SIZE,
        Descriptor::Method { .. } => 0,
    }
}

// Packing passes, in order, after the predefined offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Byte,
    Boolean,
    Char,
    Short,
    Int,
    Float,
    Object,
    Array,
    Long,
    Double,
}

const PASSES: [Slot; 10] = [
    Slot::Byte,
    Slot::Boolean,
    Slot::Char,
    Slot::Short,
    Slot::Int,
    Slot::Float,
    Slot::Object,
    Slot::Array,
    Slot::Long,
    Slot::Double,
];

fn slot_of(descriptor: &Descriptor) -> Option<Slot> {
    let slot = match descriptor {
        Descriptor::Base(base) => match base {
            BaseType::Byte => Slot::Byte,
            BaseType::Boolean => Slot::Boolean,
            BaseType::Char => Slot::Char,
            BaseType::Short => Slot::Short,
            BaseType::Int => Slot::Int,
            BaseType::Float => Slot::Float,
            BaseType::Long => Slot::Long,
            BaseType::Double => Slot::Double,
        },
        Descriptor::Object(_) => Slot::Object,
        Descriptor::Array(_) => Slot::Array,
        Descriptor::Method { .. } => return None,
    };
    Some(slot)
}

/// One entry of a field table awaiting an offset.
///
/// A nameless entry is a native placeholder: its `offset` is the number
/// of bytes it reserves rather than a position.
#[derive(Debug, Clone)]
pub(crate) struct PendingField {
    pub(crate) name: Option<Arc<str>>,
    pub(crate) descriptor: Option<Descriptor>,
    pub(crate) offset: Option<usize>,
}

#[derive(Debug)]
pub(crate) struct Packed {
    /// Offset per input entry, header excluded. Placeholders get their
    /// starting position.
    pub(crate) offsets: Vec<usize>,
    /// End of the packed area, header excluded.
    pub(crate) size: usize,
}

/// Assigns storage offsets to `fields`, starting at `start` past a
/// `header` of bytes that offsets do not count.
pub(crate) fn pack_fields(
    class_name: &str,
    fields: &[PendingField],
    start: usize,
    header: usize,
) -> Result<Packed> {
    let mut offsets = vec![0; fields.len()];
    let mut position = start + header;

    for (index, field) in fields.iter().enumerate() {
        match (&field.name, field.offset) {
            (None, Some(reserved)) => {
                offsets[index] = position - header;
                position += reserved;
            }
            (None, None) => {
                return Err(ClassError::malformed(format!(
                    "Invalid field offset (private): {class_name}.(name)"
                )));
            }
            (Some(name), Some(offset)) => {
                let size = field.descriptor.as_ref().map_or(0, value_size);
                let target = offset + header;
                if target < position {
                    return Err(ClassError::malformed(format!(
                        "Invalid field offset (overlap): {class_name}.{name}"
                    )));
                }
                if size != 0 && target % size != 0 {
                    return Err(ClassError::malformed(format!(
                        "Invalid field offset (align): {class_name}.{name}"
                    )));
                }
                offsets[index] = offset;
                position = target + size;
            }
            (Some(_), None) => {}
        }
    }

    for pass in PASSES {
        for (index, field) in fields.iter().enumerate() {
            if field.name.is_none() || field.offset.is_some() {
                continue;
            }
            let Some(descriptor) = &field.descriptor else {
                continue;
            };
            if slot_of(descriptor) != Some(pass) {
                continue;
            }
            let size = value_size(descriptor);
            position = position.next_multiple_of(size);
            offsets[index] = position - header;
            position += size;
        }
    }

    Ok(Packed {
        offsets,
        size: position - header,
    })
}
