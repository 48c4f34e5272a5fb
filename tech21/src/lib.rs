//!
//! # Tech21 Process-Technology Model
//!
//! In-memory description of a semiconductor process, as consumed by a parasitic extractor:
//!
//! * The drawn [LayerInfo] registry, each layer with its GDS pairs and [LayerPurpose]
//! * The LVS [ComputedLayerInfo] registry, each tagged with the [ComputedLayerKind]
//!   which decides its extraction [Treatment]
//! * The bottom-to-top [ProcessStack], with [Contact]s linking conductors
//! * [ResistanceInfo] and [CapacitanceInfo] coefficient tables
//!
//! All collected in the [Technology] aggregate, which is built once per PDK,
//! checked via [Technology::validate], and written in any of the [Format]s
//! of the `kpex.tech` schema via [format::write].
//!

// Crates.io
use log::debug;
use serde::{Deserialize, Serialize};

// Internal modules & re-exports
pub use tech21protos as protos;
pub use tech21utils as utils;

pub mod error;
pub use error::*;
pub mod layers;
pub use layers::*;
pub mod stack;
pub use stack::*;
pub mod parasitics;
pub use parasitics::*;
pub mod validate;
pub use validate::ValidationMode;
pub mod query;
pub use query::TechIndex;
pub mod proto;
pub mod format;
pub use format::Format;


///
/// # Technology
///
/// The aggregate root. Owns every registry and table.
/// Cross-references between them are by name only.
///
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Technology {
    /// PDK Name
    pub name: String,
    /// Drawn Layers
    pub layers: Vec<LayerInfo>,
    /// LVS Computed Layers
    pub lvs_computed_layers: Vec<ComputedLayerInfo>,
    /// Vertical Stack-Up
    pub process_stack: ProcessStack,
    pub resistance: ResistanceInfo,
    pub capacitance: CapacitanceInfo,
    /// Lateral distance within which neighboring shapes are considered for coupling
    pub side_halo: f64,
}
impl Technology {
    /// Create a new and empty [Technology] named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Append a drawn layer.
    /// Name uniqueness is not checked here; see [Technology::validate].
    pub fn add_layer(&mut self, layer: LayerInfo) {
        debug!("Adding layer `{}` ({})", layer.name, layer.drw_gds_pair);
        self.layers.push(layer);
    }
    /// Append an LVS computed layer `layer`, derived from `original_layer_name`.
    pub fn add_computed_layer(
        &mut self,
        kind: ComputedLayerKind,
        layer: LayerInfo,
        original_layer_name: impl Into<String>,
    ) {
        let original_layer_name = original_layer_name.into();
        debug!(
            "Adding computed layer `{}` ({}) from `{}`",
            layer.name,
            kind,
            original_layer_name
        );
        self.lvs_computed_layers.push(ComputedLayerInfo {
            kind,
            layer_info: layer,
            original_layer_name,
        });
    }
    /// Set the pin pair of every layer drawn on `drw`.
    /// Returns the number of layers updated. Zero is an error.
    pub fn map_pin_layer(&mut self, drw: GdsPair, pin: GdsPair) -> TechResult<usize> {
        self.map_layers(drw, pin, "pin", |l| &mut l.pin_gds_pair)
    }
    /// Set the label pair of every layer drawn on `drw`.
    /// Returns the number of layers updated. Zero is an error.
    pub fn map_label_layer(&mut self, drw: GdsPair, label: GdsPair) -> TechResult<usize> {
        self.map_layers(drw, label, "label", |l| &mut l.label_gds_pair)
    }
    fn map_layers(
        &mut self,
        drw: GdsPair,
        pair: GdsPair,
        what: &str,
        slot: impl Fn(&mut LayerInfo) -> &mut Option<GdsPair>,
    ) -> TechResult<usize> {
        let mut count = 0;
        for layer in self.layers.iter_mut().filter(|l| l.drw_gds_pair == drw) {
            *slot(layer) = Some(pair);
            count += 1;
        }
        if count == 0 {
            return Err(TechError::dangling(
                drw.to_string(),
                format!("{} mapping {}", what, pair),
            ));
        }
        Ok(count)
    }
    /// Build the name-lookup [TechIndex]
    pub fn index(&self) -> TechIndex<'_> {
        TechIndex::new(self)
    }
}
