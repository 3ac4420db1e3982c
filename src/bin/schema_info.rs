//! Print the resolved descriptors of schema files: messages with field
//! numbers, labels, kinds and defaults (map fields shown as their lowered
//! repeated entry types), and enums with their variants.
//!
//! Usage:
//!   schema_info [OPTIONS] [FILE.proto ...]
//!   schema_info < file.proto
//!
//! Options:
//!   --messages-only, -m  Skip enum listings

use pbhost::dump::{enum_descriptor_to_dump, message_descriptor_to_dump};
use pbhost::{parse, Schema};
use std::io::Read;

fn print_schema(schema: &Schema, messages_only: bool) {
    for name in schema.message_names() {
        if let Some(desc) = schema.message(name) {
            println!("{}", message_descriptor_to_dump(desc));
            println!();
        }
    }
    if messages_only {
        return;
    }
    for name in schema.enum_names() {
        if let Some(desc) = schema.enum_type(name) {
            println!("{}", enum_descriptor_to_dump(desc));
            println!();
        }
    }
}

fn load(source: &str, origin: &str, messages_only: bool) -> anyhow::Result<()> {
    let raw = parse(source).map_err(|e| anyhow::anyhow!("{}: {}", origin, e))?;
    let schema = Schema::resolve(raw).map_err(|e| anyhow::anyhow!("{}: {}", origin, e))?;
    print_schema(&schema, messages_only);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let messages_only = if let Some(pos) = args.iter().position(|a| a == "--messages-only" || a == "-m") {
        args.remove(pos);
        true
    } else {
        false
    };

    if args.is_empty() {
        let mut src = String::new();
        std::io::stdin().read_to_string(&mut src)?;
        return load(&src, "<stdin>", messages_only);
    }

    for path in &args {
        let src = std::fs::read_to_string(path)?;
        load(&src, path, messages_only)?;
    }
    Ok(())
}
