//! Parse proto-subset schema source into the raw AST using PEST.

use crate::descriptor::*;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

/// Parse schema source into a [`RawSchema`].
pub fn parse(source: &str) -> Result<RawSchema, String> {
    let pairs = SchemaParser::parse(Rule::schema, source)
        .map_err(|e| format!("Parse error: {}", e))?;
    let pair = pairs.into_iter().next().ok_or("Empty parse")?;
    build_schema(pair)
}

fn build_schema(pair: pest::iterators::Pair<Rule>) -> Result<RawSchema, String> {
    let mut messages = Vec::new();
    let mut enums = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::message_def => messages.push(build_message(inner)?),
            Rule::enum_def => enums.push(build_enum(inner)?),
            _ => {}
        }
    }
    Ok(RawSchema { messages, enums })
}

fn build_message(pair: pest::iterators::Pair<Rule>) -> Result<RawMessage, String> {
    let mut name = String::new();
    let mut fields = Vec::new();
    let mut nested = Vec::new();
    let mut enums = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::field => fields.push(build_field(inner)?),
            Rule::map_field => fields.push(build_map_field(inner)?),
            Rule::message_def => nested.push(build_message(inner)?),
            Rule::enum_def => enums.push(build_enum(inner)?),
            _ => {}
        }
    }
    if name.is_empty() {
        return Err("message: missing name".to_string());
    }
    Ok(RawMessage {
        name,
        fields,
        nested,
        enums,
    })
}

fn build_enum(pair: pest::iterators::Pair<Rule>) -> Result<RawEnum, String> {
    let mut name = String::new();
    let mut variants = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::enum_variant => {
                let mut it = inner.into_inner();
                let var_name = it.next().ok_or("enum variant: name")?.as_str().to_string();
                let value: i64 = it
                    .next()
                    .ok_or("enum variant: value")?
                    .as_str()
                    .parse()
                    .map_err(|e| format!("enum variant value: {}", e))?;
                variants.push((var_name, value));
            }
            _ => {}
        }
    }
    if name.is_empty() {
        return Err("enum: missing name".to_string());
    }
    Ok(RawEnum { name, variants })
}

fn build_field(pair: pest::iterators::Pair<Rule>) -> Result<RawField, String> {
    let mut label = None;
    let mut type_ref = None;
    let mut name = String::new();
    let mut number = None;
    let mut default = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::label => {
                label = Some(match inner.as_str() {
                    "repeated" => RawLabel::Repeated,
                    _ => RawLabel::Optional,
                })
            }
            Rule::type_ref => type_ref = Some(build_type_ref(inner)?),
            Rule::ident => name = inner.as_str().to_string(),
            Rule::number => {
                number = Some(
                    inner
                        .as_str()
                        .parse::<u32>()
                        .map_err(|e| format!("field number: {}", e))?,
                )
            }
            Rule::default_opt => {
                let lit = inner.into_inner().next().ok_or("default: missing literal")?;
                let lit = lit.into_inner().next().ok_or("default: empty literal")?;
                default = Some(build_literal(lit)?);
            }
            _ => {}
        }
    }
    Ok(RawField {
        name,
        number: number.ok_or("field: missing number")?,
        label,
        type_ref: type_ref.ok_or("field: missing type")?,
        default,
    })
}

fn build_map_field(pair: pest::iterators::Pair<Rule>) -> Result<RawField, String> {
    let mut key = None;
    let mut value = None;
    let mut name = String::new();
    let mut number = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::scalar_type => key = Some(scalar_kind(inner.as_str())?),
            Rule::type_ref => value = Some(build_type_ref(inner)?),
            Rule::ident => name = inner.as_str().to_string(),
            Rule::number => {
                number = Some(
                    inner
                        .as_str()
                        .parse::<u32>()
                        .map_err(|e| format!("field number: {}", e))?,
                )
            }
            _ => {}
        }
    }
    Ok(RawField {
        name,
        number: number.ok_or("map field: missing number")?,
        label: None,
        type_ref: RawTypeRef::Map {
            key: key.ok_or("map field: missing key type")?,
            value: Box::new(value.ok_or("map field: missing value type")?),
        },
        default: None,
    })
}

fn build_type_ref(pair: pest::iterators::Pair<Rule>) -> Result<RawTypeRef, String> {
    let inner = pair.into_inner().next().ok_or("empty type")?;
    match inner.as_rule() {
        Rule::scalar_type => Ok(RawTypeRef::Scalar(scalar_kind(inner.as_str())?)),
        Rule::qualified_ident => Ok(RawTypeRef::Named(inner.as_str().to_string())),
        other => Err(format!("unexpected type rule: {:?}", other)),
    }
}

fn scalar_kind(s: &str) -> Result<FieldKind, String> {
    match s {
        "int32" => Ok(FieldKind::Int32),
        "int64" => Ok(FieldKind::Int64),
        "uint32" => Ok(FieldKind::UInt32),
        "uint64" => Ok(FieldKind::UInt64),
        "double" => Ok(FieldKind::Double),
        "float" => Ok(FieldKind::Float),
        "bool" => Ok(FieldKind::Bool),
        "string" => Ok(FieldKind::String),
        other => Err(format!("unknown scalar type: {}", other)),
    }
}

fn build_literal(pair: pest::iterators::Pair<Rule>) -> Result<Literal, String> {
    match pair.as_rule() {
        Rule::int => pair
            .as_str()
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|e| format!("int literal: {}", e)),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(Literal::Float)
            .map_err(|e| format!("float literal: {}", e)),
        Rule::boolean => Ok(Literal::Bool(pair.as_str() == "true")),
        Rule::string => {
            let inner = pair.into_inner().next().ok_or("string literal: empty")?;
            Ok(Literal::Str(unescape(inner.as_str())))
        }
        Rule::ident => Ok(Literal::Ident(pair.as_str().to_string())),
        other => Err(format!("unexpected literal rule: {:?}", other)),
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
