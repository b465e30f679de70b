#![allow(dead_code)]

use std::{collections::HashMap, sync::Once};

use tracing::Level;

pub const PUBLIC: u16 = 0x0001;
pub const PRIVATE: u16 = 0x0002;
pub const STATIC: u16 = 0x0008;
pub const FINAL: u16 = 0x0010;
pub const SUPER: u16 = 0x0020;
pub const NATIVE: u16 = 0x0100;
pub const INTERFACE: u16 = 0x0200;
pub const ABSTRACT: u16 = 0x0400;
pub const SYNTHETIC: u16 = 0x1000;

pub fn u1(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_test_writer()
            .try_init();
    });
}

/// Constant pool under construction. Utf8 and Class entries are shared
/// by value.
#[derive(Debug, Default)]
pub struct CpBuilder {
    bytes: Vec<u8>,
    next: u16,
    utf8s: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl CpBuilder {
    pub fn new() -> Self {
        Self {
            next: 1,
            ..Self::default()
        }
    }

    /// The `constant_pool_count` to write.
    pub fn count(&self) -> u16 {
        self.next
    }

    fn push(&mut self, record: &[u8], slots: u16) -> u16 {
        let index = self.next;
        self.bytes.extend_from_slice(record);
        self.next += slots;
        index
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        if let Some(index) = self.utf8s.get(text) {
            return *index;
        }
        let mut record = vec![1];
        u2(&mut record, text.len() as u16);
        record.extend_from_slice(text.as_bytes());
        let index = self.push(&record, 1);
        self.utf8s.insert(text.to_string(), index);
        index
    }

    pub fn class(&mut self, name: &str) -> u16 {
        if let Some(index) = self.classes.get(name) {
            return *index;
        }
        let name_index = self.utf8(name);
        let mut record = vec![7];
        u2(&mut record, name_index);
        let index = self.push(&record, 1);
        self.classes.insert(name.to_string(), index);
        index
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut record = vec![3];
        record.extend_from_slice(&value.to_be_bytes());
        self.push(&record, 1)
    }

    pub fn float(&mut self, value: f32) -> u16 {
        let mut record = vec![4];
        record.extend_from_slice(&value.to_bits().to_be_bytes());
        self.push(&record, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut record = vec![5];
        record.extend_from_slice(&value.to_be_bytes());
        self.push(&record, 2)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        let mut record = vec![6];
        record.extend_from_slice(&value.to_bits().to_be_bytes());
        self.push(&record, 2)
    }

    pub fn string(&mut self, text: &str) -> u16 {
        let text_index = self.utf8(text);
        let mut record = vec![8];
        u2(&mut record, text_index);
        self.push(&record, 1)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut record = vec![12];
        u2(&mut record, name_index);
        u2(&mut record, descriptor_index);
        self.push(&record, 1)
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(class);
        let nat_index = self.name_and_type(name, descriptor);
        let mut record = vec![10];
        u2(&mut record, class_index);
        u2(&mut record, nat_index);
        self.push(&record, 1)
    }

    /// Appends a raw record occupying `slots` indices.
    pub fn raw(&mut self, record: &[u8], slots: u16) -> u16 {
        self.push(record, slots)
    }
}

#[derive(Debug, Clone)]
pub struct Attr {
    pub name: String,
    pub info: Vec<u8>,
}

impl Attr {
    pub fn new(name: &str, info: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            info,
        }
    }

    /// A `Code` body with no exception handlers.
    pub fn code(max_stack: u16, max_locals: u16, bytecode: &[u8]) -> Self {
        Self::code_with(max_stack, max_locals, bytecode, &[])
    }

    /// A `Code` body whose nested attributes are already encoded.
    pub fn code_with(max_stack: u16, max_locals: u16, bytecode: &[u8], nested: &[u8]) -> Self {
        let mut info = Vec::new();
        u2(&mut info, max_stack);
        u2(&mut info, max_locals);
        u4(&mut info, bytecode.len() as u32);
        info.extend_from_slice(bytecode);
        u2(&mut info, 0);
        if nested.is_empty() {
            u2(&mut info, 0);
        } else {
            info.extend_from_slice(nested);
        }
        Self::new("Code", info)
    }

    pub fn index(name: &str, index: u16) -> Self {
        Self::new(name, index.to_be_bytes().to_vec())
    }
}

#[derive(Debug, Clone)]
struct Member {
    access_flags: u16,
    name: String,
    descriptor: String,
    attributes: Vec<Attr>,
}

/// Assembles a class file from named parts.
#[derive(Debug)]
pub struct ClassFileBuilder {
    pub pool: CpBuilder,
    pub magic: u32,
    pub major: u16,
    pub minor: u16,
    pub access_flags: u16,
    this_class: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    attributes: Vec<Attr>,
}

impl ClassFileBuilder {
    pub fn new(name: &str, super_class: &str) -> Self {
        Self {
            pool: CpBuilder::new(),
            magic: 0xCAFE_BABE,
            major: 50,
            minor: 0,
            access_flags: PUBLIC | SUPER,
            this_class: name.to_string(),
            super_class: Some(super_class.to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn interface(name: &str) -> Self {
        let mut builder = Self::new(name, "java/lang/Object");
        builder.access_flags = PUBLIC | INTERFACE | ABSTRACT;
        builder
    }

    pub fn access(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn version(mut self, major: u16, minor: u16) -> Self {
        self.major = major;
        self.minor = minor;
        self
    }

    pub fn without_super(mut self) -> Self {
        self.super_class = None;
        self
    }

    pub fn implements(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn field(mut self, access_flags: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push(Member {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes: Vec::new(),
        });
        self
    }

    pub fn field_with(
        mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attr>,
    ) -> Self {
        self.fields.push(Member {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes,
        });
        self
    }

    pub fn method(
        mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attr>,
    ) -> Self {
        self.methods.push(Member {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes,
        });
        self
    }

    /// A method whose body is a single `return`.
    pub fn concrete(self, access_flags: u16, name: &str, descriptor: &str) -> Self {
        self.method(access_flags, name, descriptor, vec![Attr::code(1, 4, &[0xB1])])
    }

    pub fn attribute(mut self, attribute: Attr) -> Self {
        self.attributes.push(attribute);
        self
    }

    fn write_attributes(pool: &mut CpBuilder, out: &mut Vec<u8>, attributes: &[Attr]) {
        u2(out, attributes.len() as u16);
        for attr in attributes {
            u2(out, pool.utf8(&attr.name));
            u4(out, attr.info.len() as u32);
            out.extend_from_slice(&attr.info);
        }
    }

    fn write_members(pool: &mut CpBuilder, out: &mut Vec<u8>, members: &[Member]) {
        u2(out, members.len() as u16);
        for member in members {
            u2(out, member.access_flags);
            u2(out, pool.utf8(&member.name));
            u2(out, pool.utf8(&member.descriptor));
            Self::write_attributes(pool, out, &member.attributes);
        }
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = self.pool;
        let this_index = pool.class(&self.this_class);
        let super_index = self.super_class.as_deref().map_or(0, |name| pool.class(name));
        let interface_indices: Vec<u16> =
            self.interfaces.iter().map(|name| pool.class(name)).collect();

        let mut body = Vec::new();
        u2(&mut body, self.access_flags);
        u2(&mut body, this_index);
        u2(&mut body, super_index);
        u2(&mut body, interface_indices.len() as u16);
        for index in interface_indices {
            u2(&mut body, index);
        }
        Self::write_members(&mut pool, &mut body, &self.fields);
        Self::write_members(&mut pool, &mut body, &self.methods);
        Self::write_attributes(&mut pool, &mut body, &self.attributes);

        let mut out = Vec::new();
        u4(&mut out, self.magic);
        u2(&mut out, self.minor);
        u2(&mut out, self.major);
        u2(&mut out, pool.count());
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        out
    }
}

/// A plain public class extending `java/lang/Object` with a no-arg
/// constructor.
pub fn simple_class(name: &str) -> Vec<u8> {
    ClassFileBuilder::new(name, "java/lang/Object")
        .concrete(PUBLIC, "<init>", "()V")
        .build()
}
