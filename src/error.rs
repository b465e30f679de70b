use std::fmt::Display;

use thiserror::Error;

/// Coarse classification of a [`ClassError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Truncation,
    MalformedConstant,
    BadCrossReference,
    AccessFlagViolation,
    DescriptorSyntax,
    Linkage,
    Allocation,
}

/// The throwable a VM raises for a [`ClassError::Linkage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkageKind {
    Linkage,
    IncompatibleClassChange,
    Verify,
    AbstractMethod,
    NoClassDef,
    ClassCircularity,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassError {
    /// Declared length exceeds the remaining input.
    #[error("{0}")]
    Truncation(String),
    /// Bad tag, bad magic, unsupported version or bad encoding.
    #[error("{0}")]
    MalformedConstant(String),
    /// An index resolves to the wrong tag, an out-of-range slot or a
    /// contradictory entry.
    #[error("{0}")]
    BadCrossReference(String),
    #[error("{0}")]
    AccessFlagViolation(String),
    #[error("{0}")]
    DescriptorSyntax(String),
    #[error("{message}")]
    Linkage { kind: LinkageKind, message: String },
    #[error("{0}")]
    Allocation(String),
}

pub type Result<T> = std::result::Result<T, ClassError>;

impl ClassError {
    pub(crate) fn truncation(message: impl Display) -> Self {
        ClassError::Truncation(message.to_string())
    }

    pub(crate) fn malformed(message: impl Display) -> Self {
        ClassError::MalformedConstant(message.to_string())
    }

    pub(crate) fn cross_reference(message: impl Display) -> Self {
        ClassError::BadCrossReference(message.to_string())
    }

    pub(crate) fn access(message: impl Display) -> Self {
        ClassError::AccessFlagViolation(message.to_string())
    }

    pub(crate) fn descriptor(message: impl Display) -> Self {
        ClassError::DescriptorSyntax(message.to_string())
    }

    pub(crate) fn linkage(message: impl Display) -> Self {
        Self::linkage_of(LinkageKind::Linkage, message)
    }

    pub(crate) fn linkage_of(kind: LinkageKind, message: impl Display) -> Self {
        ClassError::Linkage {
            kind,
            message: message.to_string(),
        }
    }

    pub(crate) fn allocation(bytes: usize) -> Self {
        ClassError::Allocation(format!("Unable to allocate {bytes} bytes"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassError::Truncation(_) => ErrorKind::Truncation,
            ClassError::MalformedConstant(_) => ErrorKind::MalformedConstant,
            ClassError::BadCrossReference(_) => ErrorKind::BadCrossReference,
            ClassError::AccessFlagViolation(_) => ErrorKind::AccessFlagViolation,
            ClassError::DescriptorSyntax(_) => ErrorKind::DescriptorSyntax,
            ClassError::Linkage { .. } => ErrorKind::Linkage,
            ClassError::Allocation(_) => ErrorKind::Allocation,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ClassError::Truncation(message)
            | ClassError::MalformedConstant(message)
            | ClassError::BadCrossReference(message)
            | ClassError::AccessFlagViolation(message)
            | ClassError::DescriptorSyntax(message)
            | ClassError::Linkage { message, .. }
            | ClassError::Allocation(message) => message,
        }
    }

    /// Allocation failures may succeed on retry; everything else is a
    /// property of the input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClassError::Allocation(_))
    }

    /// Fully qualified name of the Java throwable reporting this error.
    pub fn throwable_class(&self) -> &'static str {
        match self {
            ClassError::MalformedConstant(message) if message.starts_with("Unsupported class version") => {
                "java.lang.UnsupportedClassVersionError"
            }
            ClassError::Truncation(_)
            | ClassError::MalformedConstant(_)
            | ClassError::BadCrossReference(_)
            | ClassError::AccessFlagViolation(_)
            | ClassError::DescriptorSyntax(_) => "java.lang.ClassFormatError",
            ClassError::Linkage { kind, .. } => match kind {
                LinkageKind::Linkage => "java.lang.LinkageError",
                LinkageKind::IncompatibleClassChange => "java.lang.IncompatibleClassChangeError",
                LinkageKind::Verify => "java.lang.VerifyError",
                LinkageKind::AbstractMethod => "java.lang.AbstractMethodError",
                LinkageKind::NoClassDef => "java.lang.NoClassDefFoundError",
                LinkageKind::ClassCircularity => "java.lang.ClassCircularityError",
            },
            ClassError::Allocation(_) => "java.lang.OutOfMemoryError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throwable_names_follow_kind() {
        let err = ClassError::malformed("Unsupported class version for JEMCC VM");
        assert_eq!(err.throwable_class(), "java.lang.UnsupportedClassVersionError");
        assert_eq!(err.kind(), ErrorKind::MalformedConstant);

        let err = ClassError::linkage_of(LinkageKind::Verify, "A: Class cannot extend a final class");
        assert_eq!(err.throwable_class(), "java.lang.VerifyError");
        assert_eq!(err.to_string(), "A: Class cannot extend a final class");

        assert!(ClassError::allocation(16).is_retryable());
        assert!(!ClassError::truncation("x").is_retryable());
    }
}
