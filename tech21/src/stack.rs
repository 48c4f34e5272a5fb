//!
//! # Process Stack
//!
//! The ordered, bottom-to-top vertical stack-up of a process:
//! substrate, wells and diffusion, field oxide, then alternating metals and dielectrics.
//!
//! Entries live in a flat arena ([ProcessStack::layers]) and are addressed by [StackLayerId].
//! Names are *not* unique. Dielectrics split around an optional MiM capacitor
//! legitimately appear several times, and the list is kept in order, with repetition.
//!

// Crates.io Imports
use log::debug;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::error::{TechError, TechResult};
use tech21utils::{enumstr, EnumStr};

/// # Stack Layer Handle
///
/// Index of an entry in its [ProcessStack].
/// Returned by each of the `add_*` methods, and consumed by [ProcessStack::set_contact].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct StackLayerId(pub usize);

enumstr!(
    /// # Stack Layer Type
    StackLayerType {
        Unspecified: "LAYER_TYPE_UNSPECIFIED",
        Substrate: "LAYER_TYPE_SUBSTRATE",
        NWell: "LAYER_TYPE_NWELL",
        Diffusion: "LAYER_TYPE_DIFFUSION",
        FieldOxide: "LAYER_TYPE_FIELD_OXIDE",
        Metal: "LAYER_TYPE_METAL",
        SidewallDielectric: "LAYER_TYPE_SIDEWALL_DIELECTRIC",
        SimpleDielectric: "LAYER_TYPE_SIMPLE_DIELECTRIC",
        ConformalDielectric: "LAYER_TYPE_CONFORMAL_DIELECTRIC",
    }
);
impl Default for StackLayerType {
    fn default() -> Self {
        Self::Unspecified
    }
}

///
/// # Contact
///
/// Vertical connection from a well, diffusion or metal layer up to `metal_above`.
/// `width`, `spacing` and `border` are layout rules for the extractor's resistance model.
///
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Contact {
    /// Contact or via layer name
    pub name: String,
    pub layer_below: String,
    pub metal_above: String,
    /// Vertical span between the top of the layer below and the bottom of `metal_above`
    pub thickness: f64,
    pub width: f64,
    pub spacing: f64,
    pub border: f64,
}
impl Contact {
    /// Create a [Contact] to `metal_above`.
    /// Its `layer_below` is filled in when attached via [ProcessStack::set_contact].
    pub fn new(name: impl Into<String>, metal_above: impl Into<String>, thickness: f64) -> Self {
        Self {
            name: name.into(),
            metal_above: metal_above.into(),
            thickness,
            ..Default::default()
        }
    }
    /// Set an explicit `layer_below`, e.g. where it differs from the stack entry's name
    pub fn below(mut self, layer_below: impl Into<String>) -> Self {
        self.layer_below = layer_below.into();
        self
    }
    /// Set the layout-rule geometry
    pub fn geometry(mut self, width: f64, spacing: f64, border: f64) -> Self {
        self.width = width;
        self.spacing = spacing;
        self.border = border;
        self
    }
}

/// Substrate. Its `thickness` extends *below* `height`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SubstrateLayer {
    pub height: f64,
    pub thickness: f64,
    pub reference: String,
}
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NWellLayer {
    pub height: f64,
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_above: Option<Contact>,
}
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DiffusionLayer {
    pub height: f64,
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_above: Option<Contact>,
}
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FieldOxideLayer {
    pub dielectric_k: f64,
}
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MetalLayer {
    pub height: f64,
    pub thickness: f64,
    pub reference_below: String,
    pub reference_above: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_above: Option<Contact>,
}
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SidewallDielectricLayer {
    pub dielectric_k: f64,
    pub height_above_metal: f64,
    pub width_outside_sidewall: f64,
    /// The metal whose sidewalls this dielectric wraps
    pub reference: String,
}
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SimpleDielectricLayer {
    pub dielectric_k: f64,
    /// The layer this dielectric sits on
    pub reference: String,
}
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConformalDielectricLayer {
    pub dielectric_k: f64,
    pub thickness_over_metal: f64,
    pub thickness_where_no_metal: f64,
    pub thickness_sidewall: f64,
    pub reference: String,
}

/// # Stack Layer Parameters
///
/// Tagged union over the stack layer types.
#[derive(Debug, Clone, PartialEq)]
pub enum StackLayerParams {
    Substrate(SubstrateLayer),
    NWell(NWellLayer),
    Diffusion(DiffusionLayer),
    FieldOxide(FieldOxideLayer),
    Metal(MetalLayer),
    SidewallDielectric(SidewallDielectricLayer),
    SimpleDielectric(SimpleDielectricLayer),
    ConformalDielectric(ConformalDielectricLayer),
}
impl StackLayerParams {
    pub fn layer_type(&self) -> StackLayerType {
        match self {
            Self::Substrate(_) => StackLayerType::Substrate,
            Self::NWell(_) => StackLayerType::NWell,
            Self::Diffusion(_) => StackLayerType::Diffusion,
            Self::FieldOxide(_) => StackLayerType::FieldOxide,
            Self::Metal(_) => StackLayerType::Metal,
            Self::SidewallDielectric(_) => StackLayerType::SidewallDielectric,
            Self::SimpleDielectric(_) => StackLayerType::SimpleDielectric,
            Self::ConformalDielectric(_) => StackLayerType::ConformalDielectric,
        }
    }
    /// The attached contact, if this layer-type has one and it is set
    pub fn contact(&self) -> Option<&Contact> {
        match self {
            Self::NWell(l) => l.contact_above.as_ref(),
            Self::Diffusion(l) => l.contact_above.as_ref(),
            Self::Metal(l) => l.contact_above.as_ref(),
            _ => None,
        }
    }
    /// The contact slot, for layer-types which have one
    fn contact_slot(&mut self) -> Option<&mut Option<Contact>> {
        match self {
            Self::NWell(l) => Some(&mut l.contact_above),
            Self::Diffusion(l) => Some(&mut l.contact_above),
            Self::Metal(l) => Some(&mut l.contact_above),
            _ => None,
        }
    }
    /// Height of the layer's bottom face, for layer-types which are placed by height
    pub fn height(&self) -> Option<f64> {
        match self {
            Self::Substrate(l) => Some(l.height),
            Self::NWell(l) => Some(l.height),
            Self::Diffusion(l) => Some(l.height),
            Self::Metal(l) => Some(l.height),
            _ => None,
        }
    }
    pub fn dielectric_k(&self) -> Option<f64> {
        match self {
            Self::FieldOxide(l) => Some(l.dielectric_k),
            Self::SidewallDielectric(l) => Some(l.dielectric_k),
            Self::SimpleDielectric(l) => Some(l.dielectric_k),
            Self::ConformalDielectric(l) => Some(l.dielectric_k),
            _ => None,
        }
    }
    /// Named references to other stack entries, as `(field-name, value)` pairs.
    /// Empty (unset) references are skipped.
    pub fn references(&self) -> Vec<(&'static str, &str)> {
        let refs: Vec<(&'static str, &str)> = match self {
            Self::Substrate(l) => vec![("reference", l.reference.as_str())],
            Self::NWell(l) => vec![("reference", l.reference.as_str())],
            Self::Diffusion(l) => vec![("reference", l.reference.as_str())],
            Self::FieldOxide(_) => vec![],
            Self::Metal(l) => vec![
                ("reference_below", l.reference_below.as_str()),
                ("reference_above", l.reference_above.as_str()),
            ],
            Self::SidewallDielectric(l) => vec![("reference", l.reference.as_str())],
            Self::SimpleDielectric(l) => vec![("reference", l.reference.as_str())],
            Self::ConformalDielectric(l) => vec![("reference", l.reference.as_str())],
        };
        refs.into_iter().filter(|(_, r)| !r.is_empty()).collect()
    }
}

///
/// # Process Stack Entry
///
/// Serializes in the schema's JSON mapping, as `name`, `layer_type`,
/// and a single populated `<type>_layer` field. See [StackLayerRepr].
///
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(into = "StackLayerRepr", try_from = "StackLayerRepr")]
pub struct StackLayer {
    pub name: String,
    pub params: StackLayerParams,
}
impl StackLayer {
    pub fn layer_type(&self) -> StackLayerType {
        self.params.layer_type()
    }
    pub fn contact(&self) -> Option<&Contact> {
        self.params.contact()
    }
    pub fn metal(&self) -> Option<&MetalLayer> {
        match &self.params {
            StackLayerParams::Metal(m) => Some(m),
            _ => None,
        }
    }
}

/// Serialized form of [StackLayer]
#[derive(Deserialize, Serialize)]
struct StackLayerRepr {
    #[serde(default)]
    name: String,
    #[serde(default)]
    layer_type: StackLayerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    substrate_layer: Option<SubstrateLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nwell_layer: Option<NWellLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    diffusion_layer: Option<DiffusionLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field_oxide_layer: Option<FieldOxideLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metal_layer: Option<MetalLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sidewall_dielectric_layer: Option<SidewallDielectricLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    simple_dielectric_layer: Option<SimpleDielectricLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conformal_dielectric_layer: Option<ConformalDielectricLayer>,
}
impl StackLayerRepr {
    fn new(name: String, layer_type: StackLayerType) -> Self {
        Self {
            name,
            layer_type,
            substrate_layer: None,
            nwell_layer: None,
            diffusion_layer: None,
            field_oxide_layer: None,
            metal_layer: None,
            sidewall_dielectric_layer: None,
            simple_dielectric_layer: None,
            conformal_dielectric_layer: None,
        }
    }
}
impl From<StackLayer> for StackLayerRepr {
    fn from(layer: StackLayer) -> Self {
        let mut repr = Self::new(layer.name, layer.params.layer_type());
        match layer.params {
            StackLayerParams::Substrate(p) => repr.substrate_layer = Some(p),
            StackLayerParams::NWell(p) => repr.nwell_layer = Some(p),
            StackLayerParams::Diffusion(p) => repr.diffusion_layer = Some(p),
            StackLayerParams::FieldOxide(p) => repr.field_oxide_layer = Some(p),
            StackLayerParams::Metal(p) => repr.metal_layer = Some(p),
            StackLayerParams::SidewallDielectric(p) => repr.sidewall_dielectric_layer = Some(p),
            StackLayerParams::SimpleDielectric(p) => repr.simple_dielectric_layer = Some(p),
            StackLayerParams::ConformalDielectric(p) => repr.conformal_dielectric_layer = Some(p),
        }
        repr
    }
}
impl TryFrom<StackLayerRepr> for StackLayer {
    type Error = TechError;
    fn try_from(repr: StackLayerRepr) -> Result<Self, Self::Error> {
        let StackLayerRepr {
            name,
            layer_type,
            substrate_layer,
            nwell_layer,
            diffusion_layer,
            field_oxide_layer,
            metal_layer,
            sidewall_dielectric_layer,
            simple_dielectric_layer,
            conformal_dielectric_layer,
        } = repr;
        let mut found: Vec<StackLayerParams> = Vec::new();
        found.extend(substrate_layer.map(StackLayerParams::Substrate));
        found.extend(nwell_layer.map(StackLayerParams::NWell));
        found.extend(diffusion_layer.map(StackLayerParams::Diffusion));
        found.extend(field_oxide_layer.map(StackLayerParams::FieldOxide));
        found.extend(metal_layer.map(StackLayerParams::Metal));
        found.extend(sidewall_dielectric_layer.map(StackLayerParams::SidewallDielectric));
        found.extend(simple_dielectric_layer.map(StackLayerParams::SimpleDielectric));
        found.extend(conformal_dielectric_layer.map(StackLayerParams::ConformalDielectric));

        if found.len() != 1 {
            return TechError::fail(format!(
                "Stack layer `{}` must have exactly one parameter set, found {}",
                name,
                found.len()
            ));
        }
        let params = found.remove(0);
        if params.layer_type() != layer_type {
            return TechError::fail(format!(
                "Stack layer `{}` has layer_type {} but {} parameters",
                name,
                layer_type,
                params.layer_type()
            ));
        }
        Ok(StackLayer { name, params })
    }
}

///
/// # Process Stack
///
/// Built bottom-to-top through the `add_*` methods.
/// Heights are stored exactly as given; nothing is inferred.
///
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProcessStack {
    pub layers: Vec<StackLayer>,
}
impl ProcessStack {
    /// Append a layer, returning its handle
    pub fn add(&mut self, name: impl Into<String>, params: StackLayerParams) -> StackLayerId {
        let name = name.into();
        debug!("Adding {} stack layer `{}`", params.layer_type(), name);
        self.layers.push(StackLayer { name, params });
        StackLayerId(self.layers.len() - 1)
    }
    pub fn add_substrate_layer(
        &mut self,
        name: impl Into<String>,
        height: f64,
        thickness: f64,
        reference: impl Into<String>,
    ) -> StackLayerId {
        self.add(
            name,
            StackLayerParams::Substrate(SubstrateLayer {
                height,
                thickness,
                reference: reference.into(),
            }),
        )
    }
    pub fn add_nwell_layer(
        &mut self,
        name: impl Into<String>,
        height: f64,
        reference: impl Into<String>,
    ) -> StackLayerId {
        self.add(
            name,
            StackLayerParams::NWell(NWellLayer {
                height,
                reference: reference.into(),
                contact_above: None,
            }),
        )
    }
    pub fn add_diffusion_layer(
        &mut self,
        name: impl Into<String>,
        height: f64,
        reference: impl Into<String>,
    ) -> StackLayerId {
        self.add(
            name,
            StackLayerParams::Diffusion(DiffusionLayer {
                height,
                reference: reference.into(),
                contact_above: None,
            }),
        )
    }
    pub fn add_field_oxide_layer(&mut self, name: impl Into<String>, dielectric_k: f64) -> StackLayerId {
        self.add(name, StackLayerParams::FieldOxide(FieldOxideLayer { dielectric_k }))
    }
    pub fn add_metal_layer(
        &mut self,
        name: impl Into<String>,
        height: f64,
        thickness: f64,
        reference_below: impl Into<String>,
        reference_above: impl Into<String>,
    ) -> StackLayerId {
        self.add(
            name,
            StackLayerParams::Metal(MetalLayer {
                height,
                thickness,
                reference_below: reference_below.into(),
                reference_above: reference_above.into(),
                contact_above: None,
            }),
        )
    }
    pub fn add_sidewall_dielectric(
        &mut self,
        name: impl Into<String>,
        dielectric_k: f64,
        height_above_metal: f64,
        width_outside_sidewall: f64,
        reference: impl Into<String>,
    ) -> StackLayerId {
        self.add(
            name,
            StackLayerParams::SidewallDielectric(SidewallDielectricLayer {
                dielectric_k,
                height_above_metal,
                width_outside_sidewall,
                reference: reference.into(),
            }),
        )
    }
    pub fn add_simple_dielectric(
        &mut self,
        name: impl Into<String>,
        dielectric_k: f64,
        reference: impl Into<String>,
    ) -> StackLayerId {
        self.add(
            name,
            StackLayerParams::SimpleDielectric(SimpleDielectricLayer {
                dielectric_k,
                reference: reference.into(),
            }),
        )
    }
    pub fn add_conformal_dielectric(
        &mut self,
        name: impl Into<String>,
        dielectric_k: f64,
        thickness_over_metal: f64,
        thickness_where_no_metal: f64,
        thickness_sidewall: f64,
        reference: impl Into<String>,
    ) -> StackLayerId {
        self.add(
            name,
            StackLayerParams::ConformalDielectric(ConformalDielectricLayer {
                dielectric_k,
                thickness_over_metal,
                thickness_where_no_metal,
                thickness_sidewall,
                reference: reference.into(),
            }),
        )
    }
    ///
    /// Attach `contact` to the layer at `id`, replacing any existing contact.
    ///
    /// An empty `contact.layer_below` is set to the layer's own name.
    /// Fails for invalid handles, and for layer-types without a contact
    /// (everything but wells, diffusion and metals).
    ///
    pub fn set_contact(&mut self, id: StackLayerId, mut contact: Contact) -> TechResult<()> {
        let layer = self.layers.get_mut(id.0).ok_or(TechError::InvalidHandle(id))?;
        let layer_type = layer.params.layer_type();
        let slot = match layer.params.contact_slot() {
            Some(s) => s,
            None => {
                return Err(TechError::NoContactSlot {
                    name: layer.name.clone(),
                    layer_type: layer_type.to_str(),
                })
            }
        };
        if contact.layer_below.is_empty() {
            contact.layer_below = layer.name.clone();
        }
        debug!(
            "Attaching contact `{}` from `{}` to `{}`",
            contact.name,
            contact.layer_below,
            contact.metal_above
        );
        *slot = Some(contact);
        Ok(())
    }
    /// Get the layer at `id`
    pub fn get(&self, id: StackLayerId) -> Option<&StackLayer> {
        self.layers.get(id.0)
    }
    /// Iterate over `(handle, layer)` pairs, bottom to top
    pub fn iter(&self) -> impl Iterator<Item = (StackLayerId, &StackLayer)> {
        self.layers.iter().enumerate().map(|(i, l)| (StackLayerId(i), l))
    }
    /// Handle of the first entry named `name`
    pub fn find(&self, name: &str) -> Option<StackLayerId> {
        self.layers.iter().position(|l| l.name == name).map(StackLayerId)
    }
    pub fn len(&self) -> usize {
        self.layers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
    ///
    /// Height at which the next conductor up sits, per the cumulative-sum rule:
    /// * Metals: `height + thickness + contact.thickness`
    /// * Wells and diffusion: `height + contact.thickness`
    ///
    /// Without a contact, the contact term is zero.
    /// Returns `None` for layer-types which are not placed by height.
    ///
    pub fn height_above(&self, id: StackLayerId) -> TechResult<Option<f64>> {
        let layer = self.get(id).ok_or(TechError::InvalidHandle(id))?;
        let contact_t = layer.contact().map(|c| c.thickness).unwrap_or(0.0);
        Ok(match &layer.params {
            StackLayerParams::Metal(m) => Some(m.height + m.thickness + contact_t),
            StackLayerParams::NWell(l) => Some(l.height + contact_t),
            StackLayerParams::Diffusion(l) => Some(l.height + contact_t),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_positions() -> TechResult<()> {
        let mut stack = ProcessStack::default();
        let sub = stack.add_substrate_layer("subs", 0.1, 0.33, "fox");
        let fox = stack.add_field_oxide_layer("fox", 3.9);
        let m1 = stack.add_metal_layer("met1", 1.3, 0.36, "nild4", "nild5");
        assert_eq!((sub, fox, m1), (StackLayerId(0), StackLayerId(1), StackLayerId(2)));
        stack.set_contact(m1, Contact::new("via", "met2", 0.27))?;
        let contact = stack.get(m1).and_then(|l| l.contact()).unwrap();
        assert_eq!(contact.layer_below, "met1");
        assert_eq!(contact.metal_above, "met2");
        Ok(())
    }

    #[test]
    fn contact_slots() {
        let mut stack = ProcessStack::default();
        let fox = stack.add_field_oxide_layer("fox", 3.9);
        match stack.set_contact(fox, Contact::new("x", "met1", 0.1)) {
            Err(TechError::NoContactSlot { name, layer_type }) => {
                assert_eq!(name, "fox");
                assert_eq!(layer_type, "LAYER_TYPE_FIELD_OXIDE");
            }
            other => panic!("Expected NoContactSlot, got {:?}", other),
        }
        match stack.set_contact(StackLayerId(7), Contact::new("x", "met1", 0.1)) {
            Err(TechError::InvalidHandle(StackLayerId(7))) => (),
            other => panic!("Expected InvalidHandle, got {:?}", other),
        }
    }

    #[test]
    fn explicit_layer_below_is_kept() -> TechResult<()> {
        let mut stack = ProcessStack::default();
        let diff = stack.add_diffusion_layer("diff", 0.323, "fox");
        stack.set_contact(diff, Contact::new("licon", "poly", 0.0).below("tap"))?;
        assert_eq!(stack.get(diff).unwrap().contact().unwrap().layer_below, "tap");
        Ok(())
    }

    #[test]
    fn height_above() -> TechResult<()> {
        let mut stack = ProcessStack::default();
        let nwell = stack.add_nwell_layer("nwell", 0.0, "");
        stack.set_contact(nwell, Contact::new("licon1", "li1", 0.9361))?;
        let li1 = stack.add_metal_layer("li1", 0.9361, 0.1, "", "");
        let fox = stack.add_field_oxide_layer("fox", 3.9);
        assert!((stack.height_above(nwell)?.unwrap() - 0.9361).abs() < 1e-12);
        assert!((stack.height_above(li1)?.unwrap() - 1.0361).abs() < 1e-12);
        assert_eq!(stack.height_above(fox)?, None);
        Ok(())
    }

    #[test]
    fn repeated_names_keep_order() {
        let mut stack = ProcessStack::default();
        stack.add_simple_dielectric("nild6", 4.0, "met4");
        stack.add_metal_layer("capm", 5.3711, 0.1, "nild6", "nild6");
        stack.add_simple_dielectric("nild6", 4.0, "capm");
        let names: Vec<&str> = stack.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["nild6", "capm", "nild6"]);
        assert_eq!(stack.find("nild6"), Some(StackLayerId(0)));
    }

    #[test]
    fn json_mapping() {
        let mut stack = ProcessStack::default();
        stack.add_sidewall_dielectric("nild5", 4.1, 0.0, 0.0, "met1");
        let json = serde_json::to_value(&stack).unwrap();
        let entry = &json["layers"][0];
        assert_eq!(entry["name"], "nild5");
        assert_eq!(entry["layer_type"], "LAYER_TYPE_SIDEWALL_DIELECTRIC");
        assert_eq!(entry["sidewall_dielectric_layer"]["dielectric_k"], 4.1);
        assert!(entry.get("metal_layer").is_none());

        let back: ProcessStack = serde_json::from_value(json).unwrap();
        assert_eq!(back, stack);
    }

    #[test]
    fn mismatched_layer_type_fails() {
        let json = r#"{
            "name": "met1",
            "layer_type": "LAYER_TYPE_METAL",
            "simple_dielectric_layer": { "dielectric_k": 4.0 }
        }"#;
        assert!(serde_json::from_str::<StackLayer>(json).is_err());
        let json = r#"{ "name": "met1", "layer_type": "LAYER_TYPE_METAL" }"#;
        assert!(serde_json::from_str::<StackLayer>(json).is_err());
    }
}
