//!
//! # PDK Data Tables
//!
//! The declarative, per-PDK description from which [PdkTable::build] creates a [Technology].
//! Tables are TOML documents. Layer registries and parasitic coefficients are plain rows;
//! the process stack additionally supports a few forms of height derivation,
//! so that values the foundry specifies relative to other layers are written that way.
//!

// Std-Lib Imports
use std::path::Path;

// Crates.io Imports
use serde::Deserialize;

// Local Imports
use tech21::{
    ComputedLayerKind, CapacitanceInfo, GdsPair, LayerPurpose, ResistanceInfo, TechResult,
    Technology,
};
use tech21utils::SerializationFormat;

///
/// # PDK Table
///
/// Top-level content of a PDK definition file.
///
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PdkTable {
    /// Technology name, e.g. `sky130A`
    pub name: String,
    #[serde(default)]
    pub side_halo: f64,
    #[serde(default)]
    pub layers: Vec<LayerRow>,
    #[serde(default)]
    pub pin_mappings: Vec<MappingRow>,
    #[serde(default)]
    pub label_mappings: Vec<MappingRow>,
    #[serde(default)]
    pub computed_layers: Vec<ComputedRow>,
    #[serde(default)]
    pub stack: Vec<StackRow>,
    #[serde(default)]
    pub resistance: ResistanceInfo,
    #[serde(default)]
    pub capacitance: CapacitanceInfo,
}
impl PdkTable {
    /// Parse a table from TOML text
    pub fn from_toml(text: &str) -> TechResult<Self> {
        Ok(SerializationFormat::Toml.from_str(text)?)
    }
    /// Load a table from TOML file `fname`
    pub fn open(fname: impl AsRef<Path>) -> TechResult<Self> {
        Ok(SerializationFormat::Toml.open(fname)?)
    }
    /// Parse and build in one go
    pub fn build_toml(text: &str) -> TechResult<Technology> {
        Self::from_toml(text)?.build()
    }
}

/// A drawn layer
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LayerRow {
    pub name: String,
    #[serde(default)]
    pub purpose: LayerPurpose,
    pub drw: (u32, u32),
    #[serde(default)]
    pub pin: Option<(u32, u32)>,
    #[serde(default)]
    pub label: Option<(u32, u32)>,
    #[serde(default)]
    pub description: String,
}
impl LayerRow {
    pub fn drw(&self) -> GdsPair {
        self.drw.into()
    }
}

/// Pin or label datatype for all layers drawn on `drw`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MappingRow {
    /// Descriptive only, e.g. `met1.pin`
    #[serde(default)]
    pub name: String,
    #[serde(alias = "pin", alias = "label")]
    pub pair: (u32, u32),
    pub drw: (u32, u32),
}

/// An LVS computed layer
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ComputedRow {
    #[serde(default)]
    pub kind: ComputedLayerKind,
    pub name: String,
    pub gds: (u32, u32),
    /// Name of the drawn layer, computed layer, or pin/label alias this derives from
    pub original: String,
    /// Defaults to the purpose of `original`
    #[serde(default)]
    pub purpose: Option<LayerPurpose>,
    #[serde(default)]
    pub description: String,
}

///
/// # Stack Height
///
/// Either a literal, or derived from an earlier stack entry `e`:
/// * `{ above = e }` sits on top of `e`'s contact: `e.height + e.thickness + e.contact.thickness`
/// * `{ above = e, gap = g }` sits `g` above the top of `e`: `e.height + e.thickness + g`
/// * `{ same_as = e }` shares `e`'s height
///
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HeightSpec {
    Literal(f64),
    Above {
        above: String,
        #[serde(default)]
        gap: Option<f64>,
    },
    SameAs {
        same_as: String,
    },
}
impl Default for HeightSpec {
    fn default() -> Self {
        Self::Literal(0.0)
    }
}

///
/// # Contact Thickness
///
/// Either a literal, or `{ reach = m }`: whatever spans the gap from the top of the owning layer
/// to the bottom of the first later stack metal named `m`.
///
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ThicknessSpec {
    Literal(f64),
    Reach { reach: String },
}

/// Contact attached to a well, diffusion or metal stack entry
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ContactRow {
    pub name: String,
    /// Defaults to the owning stack entry's name
    #[serde(default)]
    pub layer_below: String,
    pub metal_above: String,
    pub thickness: ThicknessSpec,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub spacing: f64,
    #[serde(default)]
    pub border: f64,
}

///
/// # Stack Row
///
/// One process-stack entry, tagged by its `type` field.
///
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StackRow {
    Substrate {
        name: String,
        height: f64,
        thickness: f64,
        #[serde(default)]
        reference: String,
    },
    Nwell {
        name: String,
        height: HeightSpec,
        #[serde(default)]
        reference: String,
        #[serde(default)]
        contact: Option<ContactRow>,
    },
    Diffusion {
        name: String,
        height: HeightSpec,
        #[serde(default)]
        reference: String,
        #[serde(default)]
        contact: Option<ContactRow>,
    },
    FieldOxide {
        name: String,
        dielectric_k: f64,
    },
    Metal {
        name: String,
        height: HeightSpec,
        thickness: f64,
        #[serde(default)]
        reference_below: String,
        #[serde(default)]
        reference_above: String,
        #[serde(default)]
        contact: Option<ContactRow>,
    },
    SidewallDielectric {
        name: String,
        dielectric_k: f64,
        height_above_metal: f64,
        width_outside_sidewall: f64,
        #[serde(default)]
        reference: String,
    },
    SimpleDielectric {
        name: String,
        dielectric_k: f64,
        #[serde(default)]
        reference: String,
    },
    ConformalDielectric {
        name: String,
        dielectric_k: f64,
        thickness_over_metal: f64,
        thickness_where_no_metal: f64,
        thickness_sidewall: f64,
        #[serde(default)]
        reference: String,
    },
}
impl StackRow {
    pub fn name(&self) -> &str {
        match self {
            Self::Substrate { name, .. }
            | Self::Nwell { name, .. }
            | Self::Diffusion { name, .. }
            | Self::FieldOxide { name, .. }
            | Self::Metal { name, .. }
            | Self::SidewallDielectric { name, .. }
            | Self::SimpleDielectric { name, .. }
            | Self::ConformalDielectric { name, .. } => name,
        }
    }
    pub fn contact(&self) -> Option<&ContactRow> {
        match self {
            Self::Nwell { contact, .. } | Self::Diffusion { contact, .. } | Self::Metal { contact, .. } => {
                contact.as_ref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_forms() -> TechResult<()> {
        let table = PdkTable::from_toml(
            r#"
            name = "forms"

            [[stack]]
            type = "metal"
            name = "m1"
            height = 1.0
            thickness = 0.5

            [[stack]]
            type = "metal"
            name = "m2"
            height = { above = "m1" }
            thickness = 0.5

            [[stack]]
            type = "metal"
            name = "cap"
            height = { above = "m1", gap = 0.02 }
            thickness = 0.1
            contact = { name = "v", metal_above = "m2", thickness = { reach = "m2" } }

            [[stack]]
            type = "metal"
            name = "m2b"
            height = { same_as = "m2" }
            thickness = 0.5
            "#,
        )?;
        let heights: Vec<&HeightSpec> = table
            .stack
            .iter()
            .filter_map(|row| match row {
                StackRow::Metal { height, .. } => Some(height),
                _ => None,
            })
            .collect();
        assert_eq!(heights[0], &HeightSpec::Literal(1.0));
        assert_eq!(
            heights[1],
            &HeightSpec::Above {
                above: "m1".into(),
                gap: None
            }
        );
        assert_eq!(
            heights[2],
            &HeightSpec::Above {
                above: "m1".into(),
                gap: Some(0.02)
            }
        );
        assert_eq!(heights[3], &HeightSpec::SameAs { same_as: "m2".into() });
        let contact = table.stack[2].contact().unwrap();
        assert_eq!(contact.thickness, ThicknessSpec::Reach { reach: "m2".into() });
        assert_eq!(contact.layer_below, "");
        Ok(())
    }

    #[test]
    fn mapping_aliases() -> TechResult<()> {
        let table = PdkTable::from_toml(
            r#"
            name = "maps"
            pin_mappings = [ { name = "M1.pin", pin = [8, 2], drw = [8, 0] } ]
            label_mappings = [ { label = [8, 25], drw = [8, 0] } ]
            "#,
        )?;
        assert_eq!(table.pin_mappings[0].pair, (8, 2));
        assert_eq!(table.label_mappings[0].pair, (8, 25));
        assert_eq!(table.label_mappings[0].name, "");
        Ok(())
    }

    #[test]
    fn unknown_stack_type_fails() {
        let res = PdkTable::from_toml(
            r#"
            name = "bad"

            [[stack]]
            type = "plasma"
            name = "p"
            "#,
        );
        assert!(res.is_err());
    }
}
