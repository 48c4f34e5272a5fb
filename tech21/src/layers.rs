//!
//! # Layer Registries
//!
//! Drawn layers ([LayerInfo]) and the LVS computed layers derived from them ([ComputedLayerInfo]).
//!

// Crates.io Imports
use serde::{Deserialize, Serialize};

// Local Imports
use tech21utils::{enumstr, EnumStr};

/// # GDS Layer/ Datatype Pair
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(default)]
pub struct GdsPair {
    pub layer: u32,
    pub datatype: u32,
}
impl GdsPair {
    pub fn new(layer: u32, datatype: u32) -> Self {
        Self { layer, datatype }
    }
}
impl From<(u32, u32)> for GdsPair {
    fn from(tup: (u32, u32)) -> Self {
        Self::new(tup.0, tup.1)
    }
}
impl std::fmt::Display for GdsPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.layer, self.datatype)
    }
}

enumstr!(
    /// # Layer Purpose
    ///
    /// Classification of a drawn layer's role in the process.
    LayerPurpose {
        Unspecified: "PURPOSE_UNSPECIFIED",
        Dnwell: "PURPOSE_DNWELL",
        Nwell: "PURPOSE_NWELL",
        Diff: "PURPOSE_DIFF",
        NtapOrPtap: "PURPOSE_NTAP_OR_PTAP",
        Ntap: "PURPOSE_NTAP",
        Ptap: "PURPOSE_PTAP",
        PImplant: "PURPOSE_P_IMPLANT",
        NImplant: "PURPOSE_N_IMPLANT",
        Contact: "PURPOSE_CONTACT",
        Metal: "PURPOSE_METAL",
        Via: "PURPOSE_VIA",
        MimCap: "PURPOSE_MIM_CAP",
        Substrate: "PURPOSE_SUBSTRATE",
    }
);
impl Default for LayerPurpose {
    fn default() -> Self {
        Self::Unspecified
    }
}
impl LayerPurpose {
    /// Boolean indication of whether shapes on this layer conduct current:
    /// metals, vias, contacts and MiM capacitor plates.
    pub fn is_conductor(&self) -> bool {
        matches!(self, Self::Metal | Self::Via | Self::Contact | Self::MimCap)
    }
}

///
/// # Drawn Layer
///
/// A layer as drawn in GDS, with optional pin and label datatypes.
///
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LayerInfo {
    /// Layer Name, unique within its registry
    pub name: String,
    pub purpose: LayerPurpose,
    pub description: String,
    /// Drawing GDS pair
    pub drw_gds_pair: GdsPair,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_gds_pair: Option<GdsPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_gds_pair: Option<GdsPair>,
}
impl LayerInfo {
    /// Create a new [LayerInfo] with no pin or label pairs
    pub fn new(name: impl Into<String>, purpose: LayerPurpose, drw_gds_pair: impl Into<GdsPair>) -> Self {
        Self {
            name: name.into(),
            purpose,
            drw_gds_pair: drw_gds_pair.into(),
            ..Default::default()
        }
    }
    /// Name under which this layer's pin datatype is referenced, if it has one.
    /// E.g. `met1.pin`.
    pub fn pin_alias(&self) -> Option<String> {
        self.pin_gds_pair.map(|_| format!("{}.pin", self.name))
    }
    /// Name under which this layer's label datatype is referenced, if it has one.
    /// E.g. `Metal1.label`.
    pub fn label_alias(&self) -> Option<String> {
        self.label_gds_pair.map(|_| format!("{}.label", self.name))
    }
}

enumstr!(
    /// # Computed Layer Kind
    ///
    /// Decides how the extractor treats shapes on the layer. See [Treatment].
    ComputedLayerKind {
        Unspecified: "KIND_UNSPECIFIED",
        Regular: "KIND_REGULAR",
        DeviceCapacitor: "KIND_DEVICE_CAPACITOR",
        DeviceResistor: "KIND_DEVICE_RESISTOR",
        Pin: "KIND_PIN",
        Label: "KIND_LABEL",
    }
);
impl Default for ComputedLayerKind {
    fn default() -> Self {
        Self::Regular
    }
}

/// # Extraction Treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    /// Parasitic-bearing interconnect
    Extract,
    /// Device terminal already modeled in the netlist. Not parasitic-extracted.
    Blackbox,
    /// Annotation only
    Exclude,
}
impl ComputedLayerKind {
    /// Boolean indication of a lumped-device kind
    pub fn is_device(&self) -> bool {
        matches!(self, Self::DeviceCapacitor | Self::DeviceResistor)
    }
    /// Extraction treatment of layers of this kind
    pub fn treatment(&self) -> Treatment {
        match self {
            Self::Regular | Self::Unspecified => Treatment::Extract,
            Self::DeviceCapacitor | Self::DeviceResistor => Treatment::Blackbox,
            Self::Pin | Self::Label => Treatment::Exclude,
        }
    }
}

///
/// # LVS Computed Layer
///
/// A layer derived by the LVS deck, mapped onto its own GDS pair.
/// `original_layer_name` names the [LayerInfo] (or earlier [ComputedLayerInfo]) it derives from.
/// It is a plain name lookup, never ownership.
///
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ComputedLayerInfo {
    pub kind: ComputedLayerKind,
    pub layer_info: LayerInfo,
    pub original_layer_name: String,
}
impl ComputedLayerInfo {
    pub fn name(&self) -> &str {
        &self.layer_info.name
    }
    pub fn gds_pair(&self) -> GdsPair {
        self.layer_info.drw_gds_pair
    }
    pub fn purpose(&self) -> LayerPurpose {
        self.layer_info.purpose
    }
}
