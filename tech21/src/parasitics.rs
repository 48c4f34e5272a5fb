//!
//! # Parasitics Tables
//!
//! Empirical resistance and capacitance coefficients, keyed by layer name (or layer pair).
//! Names are free-form strings, matched against the layer registries by convention only.
//!
//! Units follow the extractor's conventions:
//! resistances in mΩ per square (layers) or mΩ per cut (contacts, vias),
//! area capacitances in aF/µm², perimeter and sidewall capacitances in aF/µm.
//!

// Std-Lib Imports
use std::collections::HashSet;

// Crates.io Imports
use serde::{Deserialize, Serialize};

// Local Imports
use crate::error::TechError;

/// Sheet resistance of a layer
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LayerResistance {
    pub layer_name: String,
    pub resistance: f64,
    pub corner_adjustment_fraction: f64,
}
/// Per-cut resistance of a contact between two named layers
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ContactResistance {
    pub contact_name: String,
    pub layer_below: String,
    pub layer_above: String,
    pub resistance: f64,
}
/// Per-cut resistance of a via
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ViaResistance {
    pub via_name: String,
    pub resistance: f64,
}

/// # Resistance Tables
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResistanceInfo {
    pub layers: Vec<LayerResistance>,
    pub contacts: Vec<ContactResistance>,
    pub vias: Vec<ViaResistance>,
}
impl ResistanceInfo {
    pub fn add_layer_resistance(
        &mut self,
        layer_name: impl Into<String>,
        resistance: f64,
        corner_adjustment_fraction: f64,
    ) {
        self.layers.push(LayerResistance {
            layer_name: layer_name.into(),
            resistance,
            corner_adjustment_fraction,
        });
    }
    pub fn add_contact_resistance(
        &mut self,
        contact_name: impl Into<String>,
        layer_below: impl Into<String>,
        layer_above: impl Into<String>,
        resistance: f64,
    ) {
        self.contacts.push(ContactResistance {
            contact_name: contact_name.into(),
            layer_below: layer_below.into(),
            layer_above: layer_above.into(),
            resistance,
        });
    }
    pub fn add_via_resistance(&mut self, via_name: impl Into<String>, resistance: f64) {
        self.vias.push(ViaResistance {
            via_name: via_name.into(),
            resistance,
        });
    }
    /// Sheet resistance of layer `name`, if tabulated
    pub fn layer(&self, name: &str) -> Option<&LayerResistance> {
        self.layers.iter().find(|r| r.layer_name == name)
    }
    /// Per-cut resistance of via `name`, if tabulated
    pub fn via(&self, name: &str) -> Option<&ViaResistance> {
        self.vias.iter().find(|r| r.via_name == name)
    }
    /// Key-uniqueness violations, one per repeated key
    pub fn duplicate_keys(&self) -> Vec<TechError> {
        let mut errs = duplicates("resistance.layers", self.layers.iter().map(|r| r.layer_name.clone()));
        errs.extend(duplicates(
            "resistance.contacts",
            self.contacts
                .iter()
                .map(|r| format!("{} ({} / {})", r.contact_name, r.layer_below, r.layer_above)),
        ));
        errs.extend(duplicates("resistance.vias", self.vias.iter().map(|r| r.via_name.clone())));
        errs
    }
}

/// Area and perimeter capacitance of a layer to substrate
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SubstrateCapacitance {
    pub layer_name: String,
    pub area_capacitance: f32,
    pub perimeter_capacitance: f32,
}
/// Area capacitance where `top_layer_name` overlaps `bottom_layer_name`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OverlapCapacitance {
    pub top_layer_name: String,
    pub bottom_layer_name: String,
    pub capacitance: f32,
}
/// Sidewall capacitance between parallel edges on the same layer
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SidewallCapacitance {
    pub layer_name: String,
    pub capacitance: f32,
    pub offset: f32,
}
/// Fringe capacitance from the edge of `in_layer_name` onto `out_layer_name`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SideOverlapCapacitance {
    pub in_layer_name: String,
    pub out_layer_name: String,
    pub capacitance: f32,
}

/// # Capacitance Tables
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CapacitanceInfo {
    pub substrates: Vec<SubstrateCapacitance>,
    pub overlaps: Vec<OverlapCapacitance>,
    pub sidewalls: Vec<SidewallCapacitance>,
    #[serde(default, alias = "fringes")]
    pub sideoverlaps: Vec<SideOverlapCapacitance>,
}
impl CapacitanceInfo {
    pub fn add_substrate_cap(
        &mut self,
        layer_name: impl Into<String>,
        area_capacitance: f32,
        perimeter_capacitance: f32,
    ) {
        self.substrates.push(SubstrateCapacitance {
            layer_name: layer_name.into(),
            area_capacitance,
            perimeter_capacitance,
        });
    }
    pub fn add_overlap_cap(
        &mut self,
        top_layer_name: impl Into<String>,
        bottom_layer_name: impl Into<String>,
        capacitance: f32,
    ) {
        self.overlaps.push(OverlapCapacitance {
            top_layer_name: top_layer_name.into(),
            bottom_layer_name: bottom_layer_name.into(),
            capacitance,
        });
    }
    pub fn add_sidewall_cap(&mut self, layer_name: impl Into<String>, capacitance: f32, offset: f32) {
        self.sidewalls.push(SidewallCapacitance {
            layer_name: layer_name.into(),
            capacitance,
            offset,
        });
    }
    pub fn add_sidewall_overlap_cap(
        &mut self,
        in_layer_name: impl Into<String>,
        out_layer_name: impl Into<String>,
        capacitance: f32,
    ) {
        self.sideoverlaps.push(SideOverlapCapacitance {
            in_layer_name: in_layer_name.into(),
            out_layer_name: out_layer_name.into(),
            capacitance,
        });
    }
    /// Overlap capacitance of `top` over `bottom`, if tabulated
    pub fn overlap(&self, top: &str, bottom: &str) -> Option<f32> {
        self.overlaps
            .iter()
            .find(|c| c.top_layer_name == top && c.bottom_layer_name == bottom)
            .map(|c| c.capacitance)
    }
    /// Key-uniqueness violations, one per repeated key
    pub fn duplicate_keys(&self) -> Vec<TechError> {
        let mut errs = duplicates(
            "capacitance.substrates",
            self.substrates.iter().map(|c| c.layer_name.clone()),
        );
        errs.extend(duplicates(
            "capacitance.overlaps",
            self.overlaps
                .iter()
                .map(|c| format!("{} / {}", c.top_layer_name, c.bottom_layer_name)),
        ));
        errs.extend(duplicates(
            "capacitance.sidewalls",
            self.sidewalls.iter().map(|c| c.layer_name.clone()),
        ));
        errs.extend(duplicates(
            "capacitance.sideoverlaps",
            self.sideoverlaps
                .iter()
                .map(|c| format!("{} / {}", c.in_layer_name, c.out_layer_name)),
        ));
        errs
    }
}

/// Report each key of `keys` which was already seen
fn duplicates(table: &'static str, keys: impl Iterator<Item = String>) -> Vec<TechError> {
    let mut seen = HashSet::new();
    keys.filter_map(|key| {
        if seen.insert(key.clone()) {
            None
        } else {
            Some(TechError::DuplicateKey { table, key })
        }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        let mut ri = ResistanceInfo::default();
        ri.add_layer_resistance("met1", 125.0, 0.0);
        ri.add_via_resistance("mcon", 9300.0);
        assert_eq!(ri.layer("met1").map(|r| r.resistance), Some(125.0));
        assert_eq!(ri.via("mcon").map(|r| r.resistance), Some(9300.0));
        assert!(ri.layer("met9").is_none());

        let mut ci = CapacitanceInfo::default();
        ci.add_overlap_cap("met1", "li1", 114.2);
        assert_eq!(ci.overlap("met1", "li1"), Some(114.2));
        assert_eq!(ci.overlap("li1", "met1"), None);
    }

    #[test]
    fn duplicate_overlaps() {
        let mut ci = CapacitanceInfo::default();
        ci.add_overlap_cap("li1", "pwell", 36.99);
        ci.add_overlap_cap("li1", "nwell", 36.99);
        ci.add_overlap_cap("li1", "nwell", 36.99);
        ci.add_sidewall_cap("li1", 25.5, 0.14);
        let errs = ci.duplicate_keys();
        assert_eq!(errs.len(), 1);
        match &errs[0] {
            TechError::DuplicateKey { table, key } => {
                assert_eq!(*table, "capacitance.overlaps");
                assert_eq!(key, "li1 / nwell");
            }
            e => panic!("Unexpected error {:?}", e),
        }
    }

    #[test]
    fn contacts_keyed_by_layers() {
        let mut ri = ResistanceInfo::default();
        ri.add_contact_resistance("licon1", "ndiff", "li1", 185000.0);
        ri.add_contact_resistance("licon1", "pdiff", "li1", 585000.0);
        assert!(ri.duplicate_keys().is_empty());
        ri.add_via_resistance("via", 4500.0);
        ri.add_via_resistance("via", 4500.0);
        assert_eq!(ri.duplicate_keys().len(), 1);
    }

    #[test]
    fn fringes_alias() {
        let json = r#"{ "fringes": [ { "in_layer_name": "met1", "out_layer_name": "li1", "capacitance": 59.5 } ] }"#;
        let ci: CapacitanceInfo = serde_json::from_str(json).unwrap();
        assert_eq!(ci.sideoverlaps.len(), 1);
        let out = serde_json::to_value(&ci).unwrap();
        assert!(out.get("sideoverlaps").is_some());
        assert!(out.get("fringes").is_none());
    }
}
