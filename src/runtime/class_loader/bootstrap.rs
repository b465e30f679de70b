use std::{
    sync::Arc,
    thread::{self, ThreadId},
};

use dashmap::{DashMap, DashSet};
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::{
    class::{self, ParsedClassData},
    config::LoaderConfig,
    consts::{
        CLASS_CLASS_NAME, ClassAccessFlag, ClassTraits, OBJECT_CLASS_NAME, SERIALIZABLE_CLASS_NAME,
        THROWABLE_CLASS_NAME, slash_to_dot,
    },
    error::{ClassError, LinkageKind, Result},
    runtime::{
        Class, ClassState, NativeClassSpec, ResourceReader, build_class, build_from_parsed,
        class_loader::class_resource_name, create_std_class, create_std_throwable_class,
        native::{class_methods, object_methods, throwable_fields, throwable_methods},
    },
};

const PRIMITIVE_NAMES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "float", "long", "double", "void",
];

// (class, superclass), parents first
const STD_THROWABLES: [(&str, &str); 16] = [
    ("java.lang.Exception", THROWABLE_CLASS_NAME),
    ("java.lang.RuntimeException", "java.lang.Exception"),
    ("java.lang.NullPointerException", "java.lang.RuntimeException"),
    ("java.lang.UnsupportedOperationException", "java.lang.RuntimeException"),
    ("java.lang.Error", THROWABLE_CLASS_NAME),
    ("java.lang.LinkageError", "java.lang.Error"),
    ("java.lang.ClassFormatError", "java.lang.LinkageError"),
    ("java.lang.UnsupportedClassVersionError", "java.lang.ClassFormatError"),
    ("java.lang.IncompatibleClassChangeError", "java.lang.LinkageError"),
    ("java.lang.AbstractMethodError", "java.lang.IncompatibleClassChangeError"),
    ("java.lang.VerifyError", "java.lang.LinkageError"),
    ("java.lang.NoClassDefFoundError", "java.lang.LinkageError"),
    ("java.lang.ClassCircularityError", "java.lang.LinkageError"),
    ("java.lang.VirtualMachineError", "java.lang.Error"),
    ("java.lang.OutOfMemoryError", "java.lang.VirtualMachineError"),
    ("java.lang.InternalError", "java.lang.VirtualMachineError"),
];

/// The loader that owns every class it defines.
#[derive(Debug, Default)]
pub struct BootstrapClassLoader {
    config: LoaderConfig,
    readers: Vec<Box<dyn ResourceReader>>,
    class_registry: DashMap<Arc<str>, Arc<OnceCell<Arc<Class>>>>,
    primitives: DashMap<Arc<str>, Arc<Class>>,
    // classes whose lineage is being resolved, with the resolving thread
    loading: DashSet<(Arc<str>, ThreadId)>,
}

struct LoadingGuard<'a> {
    loading: &'a DashSet<(Arc<str>, ThreadId)>,
    key: (Arc<str>, ThreadId),
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading.remove(&self.key);
    }
}

impl BootstrapClassLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn add_reader(&mut self, reader: Box<dyn ResourceReader>) {
        self.readers.push(reader);
    }

    pub fn with_reader(mut self, reader: impl ResourceReader + 'static) -> Self {
        self.add_reader(Box::new(reader));
        self
    }

    /// Creates the root classes, the primitive classes and the standard
    /// throwables.
    pub fn bootstrap(&self) -> Result<()> {
        // Object, Serializable and Class need a metaclass that does not
        // exist yet; it is patched in once all three are registered.
        let object = self.register(Arc::new(build_class(
            NativeClassSpec::new(OBJECT_CLASS_NAME, ClassAccessFlag::PUBLIC)
                .with_methods(object_methods()),
        )?))?;
        let serializable = self.register(Arc::new(build_class(
            NativeClassSpec::new(
                SERIALIZABLE_CLASS_NAME,
                ClassAccessFlag::PUBLIC | ClassAccessFlag::INTERFACE,
            )
            .extends(&object),
        )?))?;
        let class_class = self.register(Arc::new(build_class(
            NativeClassSpec::new(CLASS_CLASS_NAME, ClassAccessFlag::PUBLIC | ClassAccessFlag::FINAL)
                .with_traits(ClassTraits::NATIVE_DATA)
                .extends(&object)
                .implements(&serializable)
                .with_methods(class_methods()),
        )?))?;
        for class in [&object, &serializable, &class_class] {
            class.set_metaclass(&class_class);
        }

        for name in PRIMITIVE_NAMES {
            create_std_class(
                self,
                NativeClassSpec::new(name, ClassAccessFlag::PUBLIC | ClassAccessFlag::FINAL)
                    .with_traits(ClassTraits::PRIMITIVE),
                &[],
                None,
            )?;
        }

        let throwable = create_std_class(
            self,
            NativeClassSpec::new(THROWABLE_CLASS_NAME, ClassAccessFlag::PUBLIC)
                .with_traits(ClassTraits::STD_THROWABLE)
                .extends(&object)
                .implements(&serializable)
                .with_methods(throwable_methods())
                .with_fields(throwable_fields()),
            &[],
            None,
        )?;
        for (name, parent) in STD_THROWABLES {
            let parent = match self.find_class(parent) {
                Some(parent) => parent,
                None => Arc::clone(&throwable),
            };
            create_std_throwable_class(self, name, &parent)?;
        }
        debug!(classes = self.class_registry.len(), "bootstrap complete");
        Ok(())
    }

    /// Adds a built class to the registry. A native class that is already
    /// present yields the existing record; a bytecode class may only be
    /// defined once.
    pub fn register(&self, class: Arc<Class>) -> Result<Arc<Class>> {
        if class.is_primitive() {
            // the entry guard locks its shard; release it before any lookup
            let stored = Arc::clone(
                self.primitives
                    .entry(Arc::clone(&class.name))
                    .or_insert(class)
                    .value(),
            );
            self.attach_metaclass(&stored);
            return Ok(stored);
        }

        let cell = self.slot(&class.name);
        let mut stored = false;
        let registered = cell.get_or_init(|| {
            stored = true;
            Arc::clone(&class)
        });
        if !stored {
            if class.traits.contains(ClassTraits::NATIVE_DEFINED) {
                return Ok(Arc::clone(registered));
            }
            return Err(existing_class(&class.name));
        }

        self.attach_metaclass(&class);
        debug!(class = %class.name, "registered class");
        Ok(class)
    }

    fn attach_metaclass(&self, class: &Class) {
        if let Some(metaclass) = self.find_class(CLASS_CLASS_NAME) {
            class.set_metaclass(&metaclass);
        }
    }

    /// Looks a class up by name without loading it. Either package
    /// separator is accepted.
    pub fn find_class(&self, name: &str) -> Option<Arc<Class>> {
        let name = slash_to_dot(name);
        if let Some(primitive) = self.primitives.get(name.as_str()) {
            return Some(Arc::clone(primitive.value()));
        }
        let cell = self
            .class_registry
            .get(name.as_str())
            .map(|entry| Arc::clone(entry.value()))?;
        cell.get().cloned()
    }

    pub fn primitive_class(&self, name: &str) -> Option<Arc<Class>> {
        self.primitives.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Progress of a named class. A name that was requested but never
    /// built, because it is still loading or its load failed, is
    /// `Unresolved`; a name never requested is `None`.
    pub fn class_state(&self, name: &str) -> Option<ClassState> {
        let name = slash_to_dot(name);
        if let Some(primitive) = self.primitives.get(name.as_str()) {
            return Some(primitive.state());
        }
        let cell = self
            .class_registry
            .get(name.as_str())
            .map(|entry| Arc::clone(entry.value()))?;
        Some(cell.get().map_or(ClassState::Unresolved, |class| class.state()))
    }

    /// Returns the named class, reading and defining it through the
    /// resource readers if it is not yet registered.
    pub fn load_class(&self, name: &str) -> Result<Arc<Class>> {
        if let Some(class) = self.find_class(name) {
            return Ok(class);
        }
        let name: Arc<str> = slash_to_dot(name).into();
        let _guard = self.enter_loading(&name)?;
        let cell = self.slot(&name);

        let resource = class_resource_name(&name);
        let bytes = self
            .readers
            .iter()
            .find_map(|reader| reader.read(&resource))
            .ok_or_else(|| ClassError::linkage_of(LinkageKind::NoClassDef, &name))?;
        let parsed = class::parse_class_data_with(&bytes, &self.config.parse)?;
        let found = slash_to_dot(&parsed.class_name().to_str());
        if found != *name {
            return Err(ClassError::linkage_of(
                LinkageKind::NoClassDef,
                format!("{name} (wrong name: {found})"),
            ));
        }

        // ancestors load before the slot is entered; the cell is held only
        // while building
        let (super_class, interfaces) = self.resolve_lineage(&parsed)?;
        let class = cell.get_or_try_init(|| self.build_parsed(parsed, super_class, interfaces))?;
        Ok(Arc::clone(class))
    }

    /// Parses and defines a class from raw class file bytes.
    pub fn define_class(&self, bytes: &[u8]) -> Result<Arc<Class>> {
        let parsed = class::parse_class_data_with(bytes, &self.config.parse)?;
        let name: Arc<str> = slash_to_dot(&parsed.class_name().to_str()).into();
        let _guard = self.enter_loading(&name)?;
        let cell = self.slot(&name);
        if cell.get().is_some() {
            return Err(existing_class(&name));
        }

        let (super_class, interfaces) = self.resolve_lineage(&parsed)?;
        let mut created = false;
        let class = cell.get_or_try_init(|| {
            created = true;
            self.build_parsed(parsed, super_class, interfaces)
        })?;
        if !created {
            return Err(existing_class(&name));
        }
        Ok(Arc::clone(class))
    }

    fn slot(&self, name: &Arc<str>) -> Arc<OnceCell<Arc<Class>>> {
        Arc::clone(
            self.class_registry
                .entry(Arc::clone(name))
                .or_default()
                .value(),
        )
    }

    fn enter_loading(&self, name: &Arc<str>) -> Result<LoadingGuard<'_>> {
        let key = (Arc::clone(name), thread::current().id());
        if !self.loading.insert(key.clone()) {
            return Err(ClassError::linkage_of(LinkageKind::ClassCircularity, name));
        }
        Ok(LoadingGuard {
            loading: &self.loading,
            key,
        })
    }

    fn resolve_lineage(&self, parsed: &ParsedClassData) -> Result<(Arc<Class>, Vec<Arc<Class>>)> {
        let super_name = parsed.super_class_name().to_str();
        if super_name.starts_with('[') {
            return Err(ClassError::malformed("Invalid superclass name (array)"));
        }
        let super_class = self.load_class(&super_name)?;

        let mut interfaces = Vec::with_capacity(parsed.interfaces.len());
        for interface_name in parsed.interface_names() {
            let interface_name = interface_name.to_str();
            if interface_name.starts_with('[') {
                return Err(ClassError::malformed("Invalid superinterface name (array)"));
            }
            interfaces.push(self.load_class(&interface_name)?);
        }
        trace!(
            super_class = %super_class.name,
            interfaces = interfaces.len(),
            "resolved class lineage"
        );
        Ok((super_class, interfaces))
    }

    fn build_parsed(
        &self,
        parsed: ParsedClassData,
        super_class: Arc<Class>,
        interfaces: Vec<Arc<Class>>,
    ) -> Result<Arc<Class>> {
        let class = build_from_parsed(parsed, Some(super_class), interfaces)?;
        self.attach_metaclass(&class);
        debug!(class = %class.name, "defined class");
        Ok(Arc::new(class))
    }
}

fn existing_class(name: &str) -> ClassError {
    ClassError::linkage(format!("Definition of existing class: {name}"))
}
