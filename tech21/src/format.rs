//!
//! # Technology Serialization
//!
//! Reads and writes a [Technology] in each of the `kpex.tech` schema's representations:
//!
//! * [Format::Json], pretty-printed, with the schema's snake_case field names and enum value names
//! * [Format::Binary], the protobuf wire encoding
//! * [Format::Text], protobuf text format, headed by comments naming the schema file and message
//!
//! Writes go through a temporary file in the destination directory,
//! which replaces the destination only once fully written.
//!

// Std-Lib Imports
use std::path::Path;

// Crates.io Imports
use log::info;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::proto::{proto, ProtoExporter, ProtoImporter};
use crate::protos::TECHNOLOGY_MESSAGE;
use crate::utils::{enumstr, write_atomic, EnumStr, SerializationFormat};
use crate::{TechResult, Technology};

/// Header lines of [Format::Text] files
pub const TEXT_HEADER: &str = "# proto-file: tech.proto\n# proto-message: kpex.tech.Technology\n\n";

enumstr!(
    /// # Technology File Formats
    Format {
        Json: "json",
        Binary: "binary",
        Text: "text",
    }
);
impl Format {
    /// Conventional file extension, without leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "pb.json",
            Self::Binary => "binpb",
            Self::Text => "txtpb",
        }
    }
    /// Description for log messages
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Binary => "Protobuf Binary",
            Self::Text => "Protobuf Textual",
        }
    }
    /// Infer the format from the extension of `path`
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let fname = path.as_ref().file_name()?.to_str()?.to_lowercase();
        let ext = fname.rsplit('.').next()?;
        match ext {
            "json" => Some(Self::Json),
            "binpb" | "pb" | "bin" => Some(Self::Binary),
            "txtpb" | "textproto" | "pbtxt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Serialize `tech` to bytes in `format`
pub fn to_bytes(tech: &Technology, format: Format) -> TechResult<Vec<u8>> {
    Ok(match format {
        Format::Json => SerializationFormat::Json.to_string(tech)?.into_bytes(),
        Format::Binary => tech21protos::to_bytes(&ProtoExporter::export(tech)?),
        Format::Text => {
            let body = tech21protos::to_text(&ProtoExporter::export(tech)?, TECHNOLOGY_MESSAGE)?;
            format!("{}{}\n", TEXT_HEADER, body.trim_end()).into_bytes()
        }
    })
}
/// Parse a [Technology] from `format`-encoded `bytes`
pub fn from_bytes(bytes: &[u8], format: Format) -> TechResult<Technology> {
    match format {
        Format::Json => Ok(serde_json::from_slice(bytes)?),
        Format::Binary => {
            let ptech: proto::Technology = tech21protos::from_bytes(bytes)?;
            ProtoImporter::import(&ptech)
        }
        Format::Text => {
            let text = std::str::from_utf8(bytes)?;
            let ptech: proto::Technology = tech21protos::from_text(text, TECHNOLOGY_MESSAGE)?;
            ProtoImporter::import(&ptech)
        }
    }
}

/// Write `tech` to file `path` in `format`
pub fn write(tech: &Technology, path: impl AsRef<Path>, format: Format) -> TechResult<()> {
    let path = path.as_ref();
    info!(
        "Writing technology protobuf message to file '{}' in {} format.",
        path.display(),
        format.describe()
    );
    let bytes = to_bytes(tech, format)?;
    write_atomic(path, &bytes)?;
    Ok(())
}
/// Read a [Technology] from `format`-encoded file `path`
pub fn read(path: impl AsRef<Path>, format: Format) -> TechResult<Technology> {
    let path = path.as_ref();
    info!(
        "Reading technology protobuf message from file '{}' in {} format.",
        path.display(),
        format.describe()
    );
    let bytes = std::fs::read(path)?;
    from_bytes(&bytes, format)
}
/// Read from `input` in `input_format`, and write to `output` in `output_format`
pub fn convert(
    input: impl AsRef<Path>,
    input_format: Format,
    output: impl AsRef<Path>,
    output_format: Format,
) -> TechResult<()> {
    info!(
        "Converting technology from {} to {}",
        input_format.describe(),
        output_format.describe()
    );
    let tech = read(input, input_format)?;
    write(&tech, output, output_format)
}

impl Technology {
    /// Write to file `path` in `format`. See [write].
    pub fn write(&self, path: impl AsRef<Path>, format: Format) -> TechResult<()> {
        write(self, path, format)
    }
    /// Read from file `path` in `format`. See [read].
    pub fn read(path: impl AsRef<Path>, format: Format) -> TechResult<Self> {
        read(path, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GdsPair, LayerInfo, LayerPurpose};

    #[test]
    fn format_names() {
        assert_eq!(Format::from_str("binary"), Some(Format::Binary));
        assert_eq!(Format::Text.to_string(), "text");
        assert_eq!(Format::Json.describe(), "JSON");
        assert_eq!(Format::from_path("out/sky130A_tech.pb.json"), Some(Format::Json));
        assert_eq!(Format::from_path("sky130A_tech.binpb"), Some(Format::Binary));
        assert_eq!(Format::from_path("SKY130A_TECH.TXTPB"), Some(Format::Text));
        assert_eq!(Format::from_path("sky130A_tech"), None);
        assert_eq!(Format::from_path("sky130A_tech.gds"), None);
        assert_eq!(Format::from_path("sky130A_tech.yaml"), None);
    }

    #[test]
    fn text_header() -> TechResult<()> {
        let tech = Technology::new("hdr");
        let bytes = to_bytes(&tech, Format::Text)?;
        let text = std::str::from_utf8(&bytes)?;
        assert!(text.starts_with("# proto-file: tech.proto\n# proto-message: kpex.tech.Technology\n\n"));
        assert_eq!(from_bytes(&bytes, Format::Text)?, tech);
        Ok(())
    }

    #[test]
    fn text_is_protobuf_text_format() -> TechResult<()> {
        let mut tech = Technology::new("t");
        tech.add_layer(LayerInfo::new("M1", LayerPurpose::Metal, (8, 0)));
        tech.process_stack.add_metal_layer("M1", 0.4, 0.42, "", "");
        let bytes = to_bytes(&tech, Format::Text)?;
        let text = std::str::from_utf8(&bytes)?;
        assert!(text.contains("layers {"));
        assert!(text.contains("purpose: PURPOSE_METAL"));
        assert!(text.contains("metal_layer {"));
        assert!(!text.contains("- name"));
        assert_eq!(from_bytes(&bytes, Format::Text)?, tech);
        Ok(())
    }

    #[test]
    fn reads_hand_written_text() -> TechResult<()> {
        let text = r#"# proto-file: tech.proto
# proto-message: kpex.tech.Technology

name: "hand"
layers {
  name: "COMP"
  purpose: PURPOSE_DIFF
  drw_gds_pair { layer: 22 }
}
process_stack {
  layers {
    name: "subs"
    layer_type: LAYER_TYPE_SUBSTRATE
    substrate_layer { thickness: 0.28 }
  }
}
"#;
        let tech = from_bytes(text.as_bytes(), Format::Text)?;
        assert_eq!(tech.name, "hand");
        assert_eq!(tech.layers[0].drw_gds_pair, GdsPair::new(22, 0));
        assert_eq!(tech.layers[0].purpose, LayerPurpose::Diff);
        assert_eq!(tech.process_stack.len(), 1);
        Ok(())
    }

    #[test]
    fn reads_zero_omitting_json() -> TechResult<()> {
        // Canonical proto3 JSON leaves out zero-valued scalars
        let json = r#"{
            "name": "p",
            "layers": [{"name": "COMP", "purpose": "PURPOSE_DIFF", "drw_gds_pair": {"layer": 22}}],
            "process_stack": {"layers": [
                {"name": "subs", "layer_type": "LAYER_TYPE_SUBSTRATE", "substrate_layer": {"thickness": 0.28}}
            ]},
            "resistance": {"layers": [{"layer_name": "COMP", "resistance": 56}]}
        }"#;
        let tech = from_bytes(json.as_bytes(), Format::Json)?;
        assert_eq!(tech.layers[0].drw_gds_pair, GdsPair::new(22, 0));
        assert_eq!(tech.layers[0].description, "");
        let subs = tech.process_stack.find("subs").and_then(|id| tech.process_stack.get(id));
        assert_eq!(subs.and_then(|l| l.params.height()), Some(0.0));
        assert_eq!(tech.resistance.layers[0].corner_adjustment_fraction, 0.0);
        assert_eq!(tech.side_halo, 0.0);
        Ok(())
    }

    #[test]
    fn malformed_input_fails() {
        assert!(from_bytes(b"{ \"name\": ", Format::Json).is_err());
        assert!(from_bytes(&[0x0a, 0xc8, 0x01, b'x'], Format::Binary).is_err());
        assert!(from_bytes(&[0xff, 0xfe], Format::Text).is_err());
        assert!(from_bytes(b"name: \"y\"\nlayers:\n  - name: M1\n", Format::Text).is_err());
    }

    #[test]
    fn missing_file_fails() -> TechResult<()> {
        let dir = tempfile::tempdir()?;
        assert!(read(dir.path().join("nope.pb.json"), Format::Json).is_err());
        Ok(())
    }
}
