use crate::consts::{MAX_MAJOR_VERSION, MIN_MAJOR_VERSION};

/// Knobs for the class file parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Interpret `LineNumberTable` and `LocalVariableTable` inside code
    /// attributes. When off they are kept as raw attributes.
    pub debug_info: bool,
    pub min_major_version: u16,
    pub max_major_version: u16,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            debug_info: cfg!(feature = "debug-info"),
            min_major_version: MIN_MAJOR_VERSION,
            max_major_version: MAX_MAJOR_VERSION,
        }
    }
}

impl ParseOptions {
    pub fn with_debug_info(mut self, debug_info: bool) -> Self {
        self.debug_info = debug_info;
        self
    }

    pub fn with_major_versions(mut self, min: u16, max: u16) -> Self {
        self.min_major_version = min;
        self.max_major_version = max;
        self
    }

    pub(crate) fn accepts_major(&self, major: u16) -> bool {
        (self.min_major_version..=self.max_major_version).contains(&major)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    pub parse: ParseOptions,
}

impl LoaderConfig {
    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }
}
