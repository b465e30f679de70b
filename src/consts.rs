pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

pub const MIN_MAJOR_VERSION: u16 = 45;
pub const MAX_MAJOR_VERSION: u16 = 55;

pub const OBJECT_CLASS_NAME: &str = "java.lang.Object";
pub const CLASS_CLASS_NAME: &str = "java.lang.Class";
pub const SERIALIZABLE_CLASS_NAME: &str = "java.io.Serializable";
pub const THROWABLE_CLASS_NAME: &str = "java.lang.Throwable";
pub const STRING_CLASS_NAME: &str = "java.lang.String";

pub const CLINIT: &str = "<clinit>";
pub const INIT: &str = "<init>";

/// Constant pool tags as they appear on disk.
pub mod tag {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;

    pub const MAX: u8 = NAME_AND_TYPE;
}

pub mod attribute {
    pub const CODE: &str = "Code";
    pub const CONSTANT_VALUE: &str = "ConstantValue";
    pub const EXCEPTIONS: &str = "Exceptions";
    pub const INNER_CLASSES: &str = "InnerClasses";
    pub const LINE_NUMBER_TABLE: &str = "LineNumberTable";
    pub const LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
    pub const SOURCE_FILE: &str = "SourceFile";
    pub const SYNTHETIC: &str = "Synthetic";
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClassAccessFlag: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FieldAccessFlag: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodAccessFlag: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }

    /// VM-side properties of a built class that have no on-disk flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassTraits: u8 {
        /// Instances carry an extra native pointer ahead of all java fields.
        const NATIVE_DATA = 0x01;
        /// Subclasses may be created through the shared-table throwable shortcut.
        const STD_THROWABLE = 0x02;
        /// Built from a native method/field table rather than bytecode.
        const NATIVE_DEFINED = 0x04;
        const PRIMITIVE = 0x08;
    }
}

/// Bits of the access word that are defined by the class file format.
pub(crate) const ACCESS_MASK: u16 = 0x0FFF;

/// `.` and `/` are interchangeable package separators in class names.
pub fn class_names_equal(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes().zip(b.bytes()).all(|(x, y)| {
            x == y || (matches!(x, b'.' | b'/') && matches!(y, b'.' | b'/'))
        })
}

pub fn slash_to_dot(name: &str) -> String {
    name.replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_insensitive_names() {
        assert!(class_names_equal("java/lang/Object", "java.lang.Object"));
        assert!(class_names_equal("java.lang/Object", "java/lang.Object"));
        assert!(!class_names_equal("java/lang/Object", "java/lang/Objects"));
        assert!(!class_names_equal("java/lang/Object", "java_lang/Object"));
    }
}
