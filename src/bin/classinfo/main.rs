use std::{env, fs, process::ExitCode};

use jvm_loader::{
    BootstrapClassLoader, ClassError, LoaderConfig, ParsedClassData,
    class::ConstantPoolInfo,
    consts::{MethodAccessFlag, slash_to_dot},
    descriptor,
    parse_class_data,
    runtime::DirectoryReader,
};
use tracing::Level;
use tracing_subscriber::fmt;

const USAGE: &str = "usage: classinfo [--classpath DIR] FILE.class";

fn print_parsed(parsed: &ParsedClassData) -> Result<(), ClassError> {
    let pool = parsed.constant_pool();
    let (major, minor) = parsed.version();
    println!("class {}", slash_to_dot(&parsed.class_name().to_str()));
    println!("  version: {major}.{minor}");
    println!("  flags: {:?}", parsed.access_flags());
    println!("  extends {}", slash_to_dot(&parsed.super_class_name().to_str()));
    for interface in parsed.interface_names() {
        println!("  implements {}", slash_to_dot(&interface.to_str()));
    }
    println!("  constant pool: {} slots", pool.count());

    for field in parsed.fields() {
        let name = pool.utf8(field.name_index(), "field name")?.to_str();
        let desc = pool.utf8(field.descriptor_index(), "field descriptor")?.to_str();
        let ty = descriptor::parse(&desc, false)?;
        println!("  field {} {:?}", ty.to_readable(&name), field.access_flags());
    }
    for method in parsed.methods() {
        let name = pool.utf8(method.name_index(), "method name")?.to_str();
        let desc = pool.utf8(method.descriptor_index(), "method descriptor")?.to_str();
        let is_static = method.access_flags().contains(MethodAccessFlag::STATIC);
        let signature = descriptor::parse(&desc, is_static)?.to_readable(&name);
        match method.code() {
            Some(code) => println!(
                "  method {} {:?} (stack {}, locals {}, {} bytes)",
                signature,
                method.access_flags(),
                code.max_stack(),
                code.max_locals(),
                code.bytecode().len()
            ),
            None => println!("  method {} {:?}", signature, method.access_flags()),
        }
    }

    let strings = pool
        .iter()
        .filter(|(_, entry)| matches!(entry, ConstantPoolInfo::String { .. }))
        .count();
    println!("  string constants: {strings}");
    Ok(())
}

fn print_linked(classpath: &str, bytes: &[u8]) -> Result<(), ClassError> {
    let loader = BootstrapClassLoader::new(LoaderConfig::default())
        .with_reader(DirectoryReader::new(classpath));
    loader.bootstrap()?;
    let class = loader.define_class(bytes)?;

    println!("linked {} ({:?})", class.name(), class.state());
    println!("  instance size: {}", class.instance_size());
    println!("  static size: {}", class.static_size());
    for entry in class.assignment_list() {
        println!("  assignable to {}", entry.name());
    }
    for (index, method) in class.virtual_table().iter().enumerate() {
        println!("  vtable[{index}] {} from {}", method.signature(), method.parent_class());
    }
    Ok(())
}

fn main() -> ExitCode {
    let format = fmt::format()
        .without_time()
        .with_level(true)
        .with_target(false)
        .compact();
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .event_format(format)
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let mut classpath = None;
    let mut file = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--classpath" | "-cp" => classpath = args.next(),
            _ if file.is_none() => file = Some(arg),
            _ => {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            }
        }
    }
    let Some(file) = file else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let bytes = match fs::read(&file) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{file}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = parse_class_data(&bytes).and_then(|parsed| print_parsed(&parsed));
    let result = match (result, classpath) {
        (Ok(()), Some(classpath)) => print_linked(&classpath, &bytes),
        (result, _) => result,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {}", err.throwable_class(), err);
            ExitCode::FAILURE
        }
    }
}
