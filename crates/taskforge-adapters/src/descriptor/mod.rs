//! Type descriptor parsers.

mod xml;

pub use xml::XmlDescriptorParser;
