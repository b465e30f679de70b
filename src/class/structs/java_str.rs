use std::{
    borrow::Cow,
    fmt::{Debug, Display},
    sync::Arc,
};

/// Text of a `CONSTANT_Utf8` entry, kept as the raw modified UTF-8 bytes
/// found in the class file.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct JavaStr {
    inner: Arc<[u8]>,
}

impl JavaStr {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Arc::from(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn first_byte(&self) -> Option<u8> {
        self.inner.first().copied()
    }

    pub fn to_str(&self) -> Cow<'_, str> {
        match cesu8::from_java_cesu8(&self.inner) {
            Ok(text) => text,
            Err(_) => String::from_utf8_lossy(&self.inner),
        }
    }

    pub fn is(&self, text: &str) -> bool {
        self.to_str() == text
    }
}

impl From<&str> for JavaStr {
    fn from(text: &str) -> Self {
        Self::new(cesu8::to_java_cesu8(text).into_owned())
    }
}

impl Display for JavaStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_str())
    }
}

impl Debug for JavaStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.to_str(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_modified_utf8() {
        // NUL is encoded as two bytes in modified UTF-8
        let s = JavaStr::new(vec![b'a', 0xC0, 0x80, b'b']);
        assert_eq!(s.to_str(), "a\0b");
        assert_eq!(JavaStr::from("a\0b").as_bytes(), &[b'a', 0xC0, 0x80, b'b']);
    }

    #[test]
    fn malformed_bytes_decode_lossily() {
        let s = JavaStr::new(vec![b'x', 0xFF]);
        assert!(s.to_str().starts_with('x'));
        assert_eq!(s.first_byte(), Some(b'x'));
    }
}
