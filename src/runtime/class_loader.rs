use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    path::PathBuf,
};

mod bootstrap;
pub use bootstrap::BootstrapClassLoader;

/// Source of class file bytes.
pub trait ResourceReader: Debug + Send + Sync {
    // must end with .class
    fn read(&self, resource_name: &str) -> Option<Vec<u8>>;
}

/// `java.lang.Object` -> `java/lang/Object.class`
pub fn class_resource_name(class_name: &str) -> String {
    class_name.replace('.', "/") + ".class"
}

/// Class files held in memory, keyed by resource name.
#[derive(Debug, Default)]
pub struct MemoryReader {
    resources: HashMap<String, Vec<u8>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_name: &str, bytes: Vec<u8>) {
        self.resources.insert(class_resource_name(class_name), bytes);
    }

    pub fn with_class(mut self, class_name: &str, bytes: Vec<u8>) -> Self {
        self.insert(class_name, bytes);
        self
    }
}

impl ResourceReader for MemoryReader {
    fn read(&self, resource_name: &str) -> Option<Vec<u8>> {
        self.resources.get(resource_name).cloned()
    }
}

/// Class files laid out by package under a base directory.
#[derive(Debug)]
pub struct DirectoryReader {
    base_path: PathBuf,
}

impl DirectoryReader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl ResourceReader for DirectoryReader {
    fn read(&self, resource_name: &str) -> Option<Vec<u8>> {
        fs::read(self.base_path.join(resource_name)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_use_slashes() {
        assert_eq!(class_resource_name("java.lang.Object"), "java/lang/Object.class");
        assert_eq!(class_resource_name("a/B"), "a/B.class");

        let reader = MemoryReader::new().with_class("demo.Thing", vec![1, 2]);
        assert_eq!(reader.read("demo/Thing.class"), Some(vec![1, 2]));
        assert_eq!(reader.read("demo/Other.class"), None);
    }
}
