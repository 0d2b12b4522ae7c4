//! XML type descriptors (`<name>.tlb`).
//!
//! # Format
//!
//! ```xml
//! <typelib>
//!   <numeric name="/int32_t" category="sint" size="4"/>
//!   <null name="/nil"/>
//!   <compound name="/base/Time">
//!     <field name="microseconds" type="/int64_t"/>
//!   </compound>
//!   <enum name="/base/Mode">
//!     <value symbol="IDLE" value="0"/>
//!   </enum>
//!   <array name="/double[3]" of="/double" size="3"/>
//!   <container name="/std/vector&lt;/double&gt;" kind="/std/vector" of="/double"/>
//!   <alias name="/base/Seconds" source="/double"/>
//!   <opaque name="/handles/Handle" marshal_as="/handles/HandleM"
//!           includes="handles/Handle.hpp" needs_copy="1"/>
//! </typelib>
//! ```
//!
//! An `opaque` element without `marshal_as` declares the type only; its
//! marshalling rule may come from another typekit.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument};

use taskforge_core::{
    application::{ApplicationError, ports::DescriptorParser},
    domain::{
        Field, NumericCategory, OpaqueEntry, TypeCategory, TypeDef, TypeName, TypeRegistry,
        TypekitDescriptor,
    },
    error::{ForgeError, ForgeResult},
};

/// Parses typelib-style XML descriptors with `quick-xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDescriptorParser;

impl XmlDescriptorParser {
    pub fn new() -> Self {
        Self
    }
}

/// A type element whose children are still being read.
enum Open {
    Compound { name: String, fields: Vec<Field> },
    Enum { name: String, symbols: Vec<(String, i64)> },
}

impl DescriptorParser for XmlDescriptorParser {
    #[instrument(skip(self, document))]
    fn parse(&self, source_name: &str, document: &str) -> ForgeResult<TypekitDescriptor> {
        let fail = parse_error(source_name);

        let mut reader = Reader::from_str(document);
        let mut descriptor = TypekitDescriptor {
            registry: TypeRegistry::with_standard_types(),
            ..TypekitDescriptor::default()
        };
        let mut open: Option<Open> = None;
        // A leaf element written as `<x ...></x>` waiting for its end tag.
        let mut closing: Option<Vec<u8>> = None;
        let mut saw_root = false;

        loop {
            let event = reader.read_event();
            if let (Some(pending), Ok(Event::Start(e) | Event::Empty(e))) = (&closing, &event) {
                return Err(fail(format!(
                    "unexpected <{}> inside <{}>",
                    String::from_utf8_lossy(e.name().as_ref()),
                    String::from_utf8_lossy(pending)
                )));
            }
            match event {
                Ok(Event::Start(ref e)) => {
                    let attrs = attributes(e).map_err(&fail)?;
                    let tag = e.name().as_ref().to_vec();
                    match (tag.as_slice(), open.is_some()) {
                        (b"typelib", false) if !saw_root => saw_root = true,
                        (b"compound", false) => {
                            open = Some(Open::Compound {
                                name: required(&attrs, "name").map_err(&fail)?,
                                fields: Vec::new(),
                            })
                        }
                        (b"enum", false) => {
                            open = Some(Open::Enum {
                                name: required(&attrs, "name").map_err(&fail)?,
                                symbols: Vec::new(),
                            })
                        }
                        (b"typelib" | b"compound" | b"enum", _) => {
                            return Err(fail(format!(
                                "unexpected <{}>",
                                String::from_utf8_lossy(&tag)
                            )));
                        }
                        _ => {
                            leaf(&tag, &attrs, &mut open, &mut descriptor, &fail)?;
                            closing = Some(tag.clone());
                        }
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let attrs = attributes(e).map_err(&fail)?;
                    let tag = e.name().as_ref().to_vec();
                    leaf(&tag, &attrs, &mut open, &mut descriptor, &fail)?;
                }
                Ok(Event::End(ref e)) if closing.as_deref() == Some(e.name().as_ref()) => {
                    closing = None;
                }
                Ok(Event::End(ref e)) => match (e.name().as_ref(), open.take()) {
                    (b"compound", Some(Open::Compound { name, fields })) => {
                        add(
                            &mut descriptor.registry,
                            TypeDef::new(type_name(&name)?, TypeCategory::Compound { fields }),
                        )?;
                    }
                    (b"enum", Some(Open::Enum { name, symbols })) => {
                        add(
                            &mut descriptor.registry,
                            TypeDef::new(type_name(&name)?, TypeCategory::Enum { symbols }),
                        )?;
                    }
                    (b"typelib", None) => {}
                    (tag, _) => {
                        return Err(fail(format!(
                            "mismatched </{}>",
                            String::from_utf8_lossy(tag)
                        )));
                    }
                },
                Ok(Event::Eof) => break,
                Ok(_) => {} // comments, declarations, whitespace
                Err(e) => return Err(fail(format!("XML parse error: {}", e))),
            }
        }

        if !saw_root {
            return Err(fail("missing <typelib> root element".into()));
        }
        debug!(
            types = descriptor.registry.len(),
            opaques = descriptor.opaques.len(),
            "Descriptor parsed"
        );
        Ok(descriptor)
    }
}

fn parse_error(source_name: &str) -> impl Fn(String) -> ForgeError + '_ {
    move |reason| {
        ApplicationError::DescriptorParse {
            source_name: source_name.to_string(),
            reason,
        }
        .into()
    }
}

/// Handle an element that has no children of its own: a field, an enum
/// value, or a top-level type.
fn leaf(
    tag: &[u8],
    attrs: &HashMap<String, String>,
    open: &mut Option<Open>,
    descriptor: &mut TypekitDescriptor,
    fail: &dyn Fn(String) -> ForgeError,
) -> ForgeResult<()> {
    match open.as_mut() {
        Some(Open::Compound { fields, .. }) if tag == b"field" => {
            fields.push(Field {
                name: required(attrs, "name").map_err(fail)?,
                type_name: type_name(&required(attrs, "type").map_err(fail)?)?,
            });
        }
        Some(Open::Enum { symbols, .. }) if tag == b"value" => {
            let value = required(attrs, "value").map_err(fail)?;
            let value = value
                .parse::<i64>()
                .map_err(|_| fail(format!("invalid enum value '{}'", value)))?;
            symbols.push((required(attrs, "symbol").map_err(fail)?, value));
        }
        Some(_) => {
            return Err(fail(format!(
                "unexpected <{}> inside a type",
                String::from_utf8_lossy(tag)
            )));
        }
        None => {
            let (def, opaque) = leaf_type(tag, attrs).map_err(fail)?;
            add(&mut descriptor.registry, def?)?;
            descriptor.opaques.extend(opaque);
        }
    }
    Ok(())
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, String> {
    e.attributes()
        .map(|attr| {
            let attr = attr.map_err(|err| format!("bad attribute: {}", err))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|err| format!("bad attribute '{}': {}", key, err))?
                .to_string();
            Ok((key, value))
        })
        .collect()
}

fn required(attrs: &HashMap<String, String>, key: &str) -> Result<String, String> {
    attrs
        .get(key)
        .cloned()
        .ok_or_else(|| format!("missing '{}' attribute", key))
}

fn type_name(raw: &str) -> ForgeResult<TypeName> {
    Ok(TypeName::parse(raw)?)
}

fn add(registry: &mut TypeRegistry, def: TypeDef) -> ForgeResult<()> {
    Ok(registry.add(def)?)
}

/// A top-level type element, plus its opaque annotation if any.
///
/// The outer error is a format problem; the inner one a rejected type name.
fn leaf_type(
    tag: &[u8],
    attrs: &HashMap<String, String>,
) -> Result<(ForgeResult<TypeDef>, Option<OpaqueEntry>), String> {
    let name = required(attrs, "name")?;
    let size = |key: &str| -> Result<usize, String> {
        let raw = required(attrs, key)?;
        raw.parse()
            .map_err(|_| format!("invalid {} '{}' for '{}'", key, raw, name))
    };

    let category = match tag {
        b"numeric" => {
            let category = match required(attrs, "category")?.as_str() {
                "sint" => NumericCategory::Signed,
                "uint" => NumericCategory::Unsigned,
                "float" => NumericCategory::Float,
                other => return Err(format!("unknown numeric category '{}'", other)),
            };
            let size = u8::try_from(size("size")?)
                .map_err(|_| format!("numeric size out of range for '{}'", name))?;
            TypeCategory::Numeric { category, size }
        }
        b"null" => TypeCategory::Null,
        b"opaque" => TypeCategory::Opaque,
        b"array" | b"container" | b"alias" => {
            let target_key = if tag == b"alias" { "source" } else { "of" };
            let target = match TypeName::parse(&required(attrs, target_key)?) {
                Ok(target) => target,
                Err(err) => return Ok((Err(err.into()), None)),
            };
            match tag {
                b"array" => TypeCategory::Array {
                    element: target,
                    length: size("size")?,
                },
                b"container" => TypeCategory::Container {
                    kind: required(attrs, "kind")?,
                    element: target,
                },
                _ => TypeCategory::Alias { target },
            }
        }
        other => return Err(format!("unknown type element <{}>", String::from_utf8_lossy(other))),
    };

    let opaque = match (tag, attrs.get("marshal_as")) {
        (b"opaque", Some(marshal_as)) => Some(OpaqueEntry {
            name: name.clone(),
            marshal_as: marshal_as.clone(),
            includes: attrs.get("includes").cloned().unwrap_or_default(),
            needs_copy: attrs.get("needs_copy").cloned().unwrap_or_default(),
        }),
        _ => None,
    };
    let def = type_name(&name).map(|name| TypeDef::new(name, category));
    Ok((def, opaque))
}
