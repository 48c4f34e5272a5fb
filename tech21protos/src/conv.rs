//!
//! # ProtoBuf Conversion Utilities
//!
//! Conversions between prost messages and their binary and text encodings.
//! The text format goes through [DynamicMessage]s described by the schema's
//! compiled [FILE_DESCRIPTOR_SET].
//!

// Crates.io Imports
use prost::{DecodeError, Message};
use prost_reflect::text_format::FormatOptions;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor};

// Local Imports
use crate::tech::FILE_DESCRIPTOR_SET;

/// Encode to protobuf wire bytes
pub fn to_bytes<T: Message>(data: &T) -> Vec<u8> {
    data.encode_to_vec()
}
/// Decode from protobuf wire bytes
pub fn from_bytes<T: Message + Default>(bytes: &[u8]) -> Result<T, DecodeError> {
    T::decode(bytes)
}

/// Descriptor of the schema message with full name `name`, e.g. `kpex.tech.Technology`
pub fn message_descriptor(name: &str) -> Result<MessageDescriptor, TextFormatError> {
    let pool = DescriptorPool::decode(FILE_DESCRIPTOR_SET)
        .map_err(|e| TextFormatError::Descriptor(e.to_string()))?;
    pool.get_message_by_name(name)
        .ok_or_else(|| TextFormatError::UnknownMessage(name.to_string()))
}
/// Print `data`, an instance of schema message `name`, in protobuf text format
pub fn to_text<T: Message>(data: &T, name: &str) -> Result<String, TextFormatError> {
    let desc = message_descriptor(name)?;
    let dynamic = DynamicMessage::decode(desc, to_bytes(data).as_slice())?;
    Ok(dynamic.to_text_format_with_options(&FormatOptions::new().pretty(true)))
}
/// Parse protobuf-text-format `text` as schema message `name`
pub fn from_text<T: Message + Default>(text: &str, name: &str) -> Result<T, TextFormatError> {
    let desc = message_descriptor(name)?;
    let dynamic = DynamicMessage::parse_text_format(desc, text)
        .map_err(|e| TextFormatError::Parse(e.to_string()))?;
    Ok(from_bytes(&dynamic.encode_to_vec())?)
}

/// # Text Format Errors
#[derive(Debug)]
pub enum TextFormatError {
    /// The embedded descriptor set failed to load
    Descriptor(String),
    /// No message of this name in the schema
    UnknownMessage(String),
    /// Malformed text
    Parse(String),
    /// Wire-format mismatch between the message and its descriptor
    Decode(DecodeError),
}
impl std::fmt::Display for TextFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Descriptor(e) => write!(f, "Invalid schema descriptors: {}", e),
            Self::UnknownMessage(name) => write!(f, "No message `{}` in schema", name),
            Self::Parse(e) => write!(f, "Invalid protobuf text: {}", e),
            Self::Decode(e) => write!(f, "{}", e),
        }
    }
}
impl std::error::Error for TextFormatError {}
impl From<DecodeError> for TextFormatError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tech::{capacitance_info, layer_info, CapacitanceInfo, GdsPair, LayerInfo, Technology};
    use crate::TECHNOLOGY_MESSAGE;

    fn demo() -> Technology {
        let mut tech = Technology::default();
        tech.name = "demo".into();
        tech.side_halo = 8.0;
        let mut met1 = LayerInfo {
            name: "met1".into(),
            drw_gds_pair: Some(GdsPair {
                layer: 68,
                datatype: 20,
            }),
            ..Default::default()
        };
        met1.set_purpose(layer_info::Purpose::Metal);
        tech.layers.push(met1);
        tech.capacitance = Some(CapacitanceInfo {
            substrates: vec![capacitance_info::SubstrateCapacitance {
                layer_name: "met1".into(),
                area_capacitance: 25.78,
                perimeter_capacitance: 40.57,
            }],
            ..Default::default()
        });
        tech
    }

    #[test]
    fn text_roundtrip() -> Result<(), TextFormatError> {
        let tech = demo();
        let text = to_text(&tech, TECHNOLOGY_MESSAGE)?;
        assert!(text.contains("name: \"demo\""));
        assert!(text.contains("layers {"));
        assert!(text.contains("purpose: PURPOSE_METAL"));
        let back: Technology = from_text(&text, TECHNOLOGY_MESSAGE)?;
        assert_eq!(back, tech);
        Ok(())
    }

    #[test]
    fn text_comments_and_defaults() -> Result<(), TextFormatError> {
        let text = "# proto-message: kpex.tech.Technology\nname: \"t\"\nlayers { name: \"COMP\" drw_gds_pair { layer: 22 } }\n";
        let back: Technology = from_text(text, TECHNOLOGY_MESSAGE)?;
        assert_eq!(back.layers[0].drw_gds_pair, Some(GdsPair { layer: 22, datatype: 0 }));
        assert_eq!(back.layers[0].purpose(), layer_info::Purpose::Unspecified);
        Ok(())
    }

    #[test]
    fn text_errors() {
        let res: Result<Technology, _> = from_text("layers { name: ", TECHNOLOGY_MESSAGE);
        assert!(matches!(res, Err(TextFormatError::Parse(_))));
        let res: Result<Technology, _> = from_text("name: \"t\"", "kpex.tech.Nope");
        assert!(matches!(res, Err(TextFormatError::UnknownMessage(_))));
    }

    #[test]
    fn garbage_fails_to_decode() {
        // Field 1 (string) claims 200 bytes that are not there
        let bytes = [0x0a, 0xc8, 0x01, b'x'];
        assert!(from_bytes::<Technology>(&bytes).is_err());
    }
}
