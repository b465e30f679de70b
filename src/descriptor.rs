use std::{
    fmt::{self, Display, Write},
    sync::Arc,
};

use nom::{
    IResult,
    bytes::complete::take_till,
    character::complete::{char, one_of},
    error::{ErrorKind, ParseError},
};

use crate::error::{ClassError, Result};

const EMPTY: &str = "Provided descriptor is empty";
const INVALID_CHAR: &str = "Invalid character in descriptor";
const EXTRA_TEXT: &str = "Extra text at end of descriptor";
const MISSING_SEMICOLON: &str = "Missing semi-colon from object type descriptor";
const UNTERMINATED_ARRAY: &str = "Unterminated array descriptor";
const UNTERMINATED_METHOD: &str = "Unterminated method descriptor";
const EMBEDDED_METHOD: &str = "Method descriptors cannot be embedded";
const TOO_MANY_PARAMS: &str = "Too many parameters for method descriptor";

const BASE_TYPES: &str = "BCDFIJSZ";

/// Parameter slots available to a static method; instance methods lose
/// one to the receiver.
pub const MAX_METHOD_PARAMS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    fn from_char(ch: char) -> Option<Self> {
        let base = match ch {
            'B' => BaseType::Byte,
            'C' => BaseType::Char,
            'D' => BaseType::Double,
            'F' => BaseType::Float,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'S' => BaseType::Short,
            'Z' => BaseType::Boolean,
            _ => return None,
        };
        Some(base)
    }

    pub fn descriptor_char(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    pub fn java_name(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }

    pub fn is_wide(self) -> bool {
        matches!(self, BaseType::Long | BaseType::Double)
    }
}

/// Parsed form of a field, array or method type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Descriptor {
    Base(BaseType),
    /// Class name with `.` package separators.
    Object(Arc<str>),
    Array(Box<Descriptor>),
    Method {
        params: Vec<Descriptor>,
        /// `None` for `void`.
        ret: Option<Box<Descriptor>>,
    },
}

impl Descriptor {
    pub fn is_method(&self) -> bool {
        matches!(self, Descriptor::Method { .. })
    }

    /// Operand stack slots taken by a value of this type.
    pub fn stack_size(&self) -> usize {
        match self {
            Descriptor::Base(base) if base.is_wide() => 2,
            Descriptor::Method { .. } => 0,
            _ => 1,
        }
    }

    pub fn params(&self) -> &[Descriptor] {
        match self {
            Descriptor::Method { params, .. } => params,
            _ => &[],
        }
    }

    /// Type as it reads in Java source: `int[][]`, `java.lang.String`.
    pub fn readable_type(&self) -> String {
        let mut out = String::new();
        self.write_readable_type(&mut out);
        out
    }

    /// Member signature as it reads in Java source, e.g.
    /// `void foo(int,char[])` for a method or `long count` for a field.
    pub fn to_readable(&self, name: &str) -> String {
        let mut out = String::new();
        match self {
            Descriptor::Method { params, ret } => {
                match ret {
                    Some(ret) => ret.write_readable_type(&mut out),
                    None => out.push_str("void"),
                }
                out.push(' ');
                out.push_str(name);
                out.push('(');
                for (i, param) in params.iter().enumerate() {
                    if i != 0 {
                        out.push(',');
                    }
                    param.write_readable_type(&mut out);
                }
                out.push(')');
            }
            _ => {
                self.write_readable_type(&mut out);
                out.push(' ');
                out.push_str(name);
            }
        }
        out
    }

    fn write_readable_type(&self, out: &mut String) {
        let mut depth = 0;
        let mut node = self;
        while let Descriptor::Array(component) = node {
            depth += 1;
            node = component;
        }
        match node {
            Descriptor::Base(base) => out.push_str(base.java_name()),
            Descriptor::Object(name) => out.push_str(name),
            Descriptor::Method { .. } | Descriptor::Array(_) => {}
        }
        for _ in 0..depth {
            out.push_str("[]");
        }
    }
}

/// Unparses back into the compact descriptor grammar.
impl Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Base(base) => f.write_char(base.descriptor_char()),
            Descriptor::Object(name) => {
                f.write_char('L')?;
                for ch in name.chars() {
                    f.write_char(if ch == '.' { '/' } else { ch })?;
                }
                f.write_char(';')
            }
            Descriptor::Array(component) => write!(f, "[{component}"),
            Descriptor::Method { params, ret } => {
                f.write_char('(')?;
                for param in params {
                    write!(f, "{param}")?;
                }
                f.write_char(')')?;
                match ret {
                    Some(ret) => write!(f, "{ret}"),
                    None => f.write_char('V'),
                }
            }
        }
    }
}

/// Grammar failure. Every failure is final; the grammar never backtracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DescriptorError(&'static str);

impl<I> ParseError<I> for DescriptorError {
    fn from_error_kind(_input: I, _kind: ErrorKind) -> Self {
        DescriptorError(INVALID_CHAR)
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, DescriptorError>;

fn fail<T>(message: &'static str) -> PResult<'static, T> {
    Err(nom::Err::Failure(DescriptorError(message)))
}

fn into_class_error(err: nom::Err<DescriptorError>) -> ClassError {
    match err {
        nom::Err::Error(DescriptorError(message)) | nom::Err::Failure(DescriptorError(message)) => {
            ClassError::descriptor(message)
        }
        nom::Err::Incomplete(_) => ClassError::descriptor(INVALID_CHAR),
    }
}

/// Parses a complete descriptor. `is_static` selects the parameter
/// ceiling for method descriptors.
pub fn parse(text: &str, is_static: bool) -> Result<Descriptor> {
    let (rest, descriptor) = parse_element(text, false, is_static).map_err(into_class_error)?;
    if !rest.is_empty() {
        return Err(ClassError::descriptor(EXTRA_TEXT));
    }
    Ok(descriptor)
}

/// Parses one field type from the front of `text`, returning it with the
/// unparsed remainder. Method descriptors are rejected.
pub fn parse_nested(text: &str) -> Result<(Descriptor, &str)> {
    let (rest, descriptor) = parse_element(text, true, true).map_err(into_class_error)?;
    Ok((descriptor, rest))
}

fn parse_element(input: &str, nested: bool, is_static: bool) -> PResult<'_, Descriptor> {
    let Some(lead) = input.chars().next() else {
        return fail(EMPTY);
    };
    match lead {
        'L' => parse_object(input),
        '[' => parse_array(input, is_static),
        '(' if nested => fail(EMBEDDED_METHOD),
        '(' => parse_method(input, is_static),
        _ => parse_base(input),
    }
}

fn parse_base(input: &str) -> PResult<'_, Descriptor> {
    let (input, ch) = one_of(BASE_TYPES)(input).or_else(|_: nom::Err<DescriptorError>| fail(INVALID_CHAR))?;
    match BaseType::from_char(ch) {
        Some(base) => Ok((input, Descriptor::Base(base))),
        None => fail(INVALID_CHAR),
    }
}

fn parse_object(input: &str) -> PResult<'_, Descriptor> {
    let (input, _) = char('L')(input)?;
    let (input, class_name) = take_till(|ch| ch == ';' || ch == ')')(input)?;
    let Ok((input, _)) = char::<_, DescriptorError>(';')(input) else {
        return fail(MISSING_SEMICOLON);
    };
    Ok((input, Descriptor::Object(Arc::from(class_name.replace('/', ".")))))
}

fn parse_array(input: &str, is_static: bool) -> PResult<'_, Descriptor> {
    let (input, _) = char('[')(input)?;
    if input.is_empty() {
        return fail(UNTERMINATED_ARRAY);
    }
    let (input, component) = parse_element(input, true, is_static)?;
    Ok((input, Descriptor::Array(Box::new(component))))
}

fn parse_method(input: &str, is_static: bool) -> PResult<'_, Descriptor> {
    let ceiling = if is_static {
        MAX_METHOD_PARAMS
    } else {
        MAX_METHOD_PARAMS - 1
    };

    let (mut input, _) = char('(')(input)?;
    let mut params = Vec::new();
    loop {
        if input.is_empty() {
            return fail(UNTERMINATED_METHOD);
        }
        if let Ok((rest, _)) = char::<_, DescriptorError>(')')(input) {
            input = rest;
            break;
        }
        let param;
        (input, param) = parse_element(input, true, is_static)?;
        params.push(param);
        if params.len() > ceiling {
            return fail(TOO_MANY_PARAMS);
        }
    }

    let ret = match char::<_, DescriptorError>('V')(input) {
        Ok((rest, _)) => {
            input = rest;
            None
        }
        Err(_) => {
            let ret;
            (input, ret) = parse_element(input, true, is_static)?;
            Some(Box::new(ret))
        }
    };
    if !input.is_empty() {
        return fail(EXTRA_TEXT);
    }
    Ok((input, Descriptor::Method { params, ret }))
}

/// Checks well-formedness without building a tree. `is_method` demands a
/// method descriptor; otherwise a single field type is expected.
pub fn validate(text: &str, is_method: bool) -> Result<()> {
    let mut bytes = text.bytes().peekable();
    if bytes.peek().is_none() {
        return Err(ClassError::descriptor(EMPTY));
    }
    if is_method && bytes.next() != Some(b'(') {
        return Err(ClassError::descriptor(INVALID_CHAR));
    }

    let mut in_array = false;
    let mut in_return = false;
    let mut param_count = 0usize;
    while let Some(byte) = bytes.next() {
        match byte {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => {
                param_count += 1;
                in_array = false;
            }
            b'V' => {
                if !in_return || in_array {
                    return Err(ClassError::descriptor(INVALID_CHAR));
                }
            }
            b'L' => {
                loop {
                    match bytes.peek() {
                        Some(b';') => {
                            bytes.next();
                            break;
                        }
                        None | Some(b')') => {
                            return Err(ClassError::descriptor(MISSING_SEMICOLON));
                        }
                        Some(_) => {
                            bytes.next();
                        }
                    }
                }
                param_count += 1;
                in_array = false;
            }
            b'[' => in_array = true,
            b'(' => return Err(ClassError::descriptor(EMBEDDED_METHOD)),
            b')' => {
                if !is_method || in_return {
                    return Err(ClassError::descriptor(INVALID_CHAR));
                }
                if param_count > MAX_METHOD_PARAMS {
                    return Err(ClassError::descriptor(TOO_MANY_PARAMS));
                }
                in_return = true;
                continue;
            }
            _ => return Err(ClassError::descriptor(INVALID_CHAR)),
        }

        // fields and return values hold exactly one element
        if !in_array && (!is_method || in_return) && bytes.peek().is_some() {
            return Err(ClassError::descriptor(EXTRA_TEXT));
        }
    }

    if is_method && !in_return {
        return Err(ClassError::descriptor(UNTERMINATED_METHOD));
    }
    if in_array {
        return Err(ClassError::descriptor(UNTERMINATED_ARRAY));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: ClassError) -> String {
        err.message().to_string()
    }

    #[test]
    fn parses_field_types() {
        assert_eq!(parse("I", false).unwrap(), Descriptor::Base(BaseType::Int));
        assert_eq!(
            parse("Ljava/lang/String;", false).unwrap(),
            Descriptor::Object(Arc::from("java.lang.String"))
        );
        assert_eq!(
            parse("[[J", false).unwrap(),
            Descriptor::Array(Box::new(Descriptor::Array(Box::new(Descriptor::Base(
                BaseType::Long
            )))))
        );
    }

    #[test]
    fn parses_method_types() {
        let method = parse("(I[CLjava/lang/Object;)V", false).unwrap();
        let Descriptor::Method { params, ret } = &method else {
            panic!("not a method: {method:?}");
        };
        assert_eq!(params.len(), 3);
        assert!(ret.is_none());
        assert_eq!(method.to_readable("foo"), "void foo(int,char[],java.lang.Object)");

        let method = parse("()[[Ljava/lang/String;", true).unwrap();
        assert_eq!(method.to_readable("names"), "java.lang.String[][] names()");
    }

    #[test]
    fn nested_returns_remainder() {
        let (descriptor, rest) = parse_nested("Ljava/util/List;IZ)V").unwrap();
        assert_eq!(descriptor, Descriptor::Object(Arc::from("java.util.List")));
        assert_eq!(rest, "IZ)V");
        assert_eq!(message(parse_nested("(I)V").unwrap_err()), EMBEDDED_METHOD);
    }

    #[test]
    fn reports_grammar_errors() {
        for (text, expected) in [
            ("", EMPTY),
            ("(I)X", INVALID_CHAR),
            ("Ljava/lang/Object", MISSING_SEMICOLON),
            ("(Ljava/lang/Object)V", MISSING_SEMICOLON),
            ("[", UNTERMINATED_ARRAY),
            ("(II", UNTERMINATED_METHOD),
            ("(", UNTERMINATED_METHOD),
            ("(I)", EMPTY),
            ("(I)VV", EXTRA_TEXT),
            ("Ljava/lang/Object;I", EXTRA_TEXT),
            ("II", EXTRA_TEXT),
            ("([(I)V)V", EMBEDDED_METHOD),
            ("V", INVALID_CHAR),
            ("[V", INVALID_CHAR),
            ("(V)V", INVALID_CHAR),
        ] {
            let err = parse(text, true).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::DescriptorSyntax);
            assert_eq!(message(err), expected, "descriptor {text:?}");
        }
    }

    #[test]
    fn parameter_ceiling_depends_on_receiver() {
        let text = format!("({})V", "I".repeat(255));
        assert_eq!(parse(&text, true).unwrap().params().len(), 255);
        assert_eq!(message(parse(&text, false).unwrap_err()), TOO_MANY_PARAMS);

        let text = format!("({})V", "I".repeat(254));
        assert!(parse(&text, false).is_ok());

        let text = format!("({})V", "J".repeat(256));
        assert_eq!(message(parse(&text, true).unwrap_err()), TOO_MANY_PARAMS);
    }

    #[test]
    fn unparse_round_trips() {
        for text in [
            "Z",
            "[[[D",
            "Ljava/lang/Object;",
            "()V",
            "(IJ[Ljava/lang/String;)Ljava/lang/Class;",
            "([[B)[I",
        ] {
            assert_eq!(parse(text, true).unwrap().to_string(), text);
        }
    }

    #[test]
    fn validator_matches_parser() {
        assert!(validate("I", false).is_ok());
        assert!(validate("[Ljava/lang/String;", false).is_ok());
        assert!(validate("(IJ)V", true).is_ok());
        assert!(validate("()[I", true).is_ok());

        for (text, is_method, expected) in [
            ("", false, EMPTY),
            ("I", true, INVALID_CHAR),
            ("(I)X", true, INVALID_CHAR),
            ("Ljava/lang/Object", false, MISSING_SEMICOLON),
            ("II", false, EXTRA_TEXT),
            ("(I)VI", true, EXTRA_TEXT),
            ("(I", true, UNTERMINATED_METHOD),
            ("[", false, UNTERMINATED_ARRAY),
            ("I)", false, EXTRA_TEXT),
            (")", false, INVALID_CHAR),
            ("(II)(V", true, EMBEDDED_METHOD),
            ("V", false, INVALID_CHAR),
        ] {
            assert_eq!(
                message(validate(text, is_method).unwrap_err()),
                expected,
                "descriptor {text:?}"
            );
        }

        let text = format!("({})V", "I".repeat(256));
        assert_eq!(message(validate(&text, true).unwrap_err()), TOO_MANY_PARAMS);
        let text = format!("({})V", "I".repeat(255));
        assert!(validate(&text, true).is_ok());
    }

    #[test]
    fn stack_sizes() {
        assert_eq!(parse("J", false).unwrap().stack_size(), 2);
        assert_eq!(parse("D", false).unwrap().stack_size(), 2);
        assert_eq!(parse("[J", false).unwrap().stack_size(), 1);
        assert_eq!(parse("Ljava/lang/Object;", false).unwrap().stack_size(), 1);
    }
}
