//!
//! # Technology Validation
//!
//! Post-build checks over a [Technology]. Construction itself is best-effort and never fails;
//! these passes surface what construction lets through:
//!
//! * Name uniqueness in the layer and computed-layer registries
//! * Resolvability of every name-based reference
//! * The metal height rule, `upper.height == lower.height + lower.thickness + contact.thickness`
//! * Kind/purpose consistency of device computed layers
//! * Key uniqueness in each parasitics table
//!

// Std-Lib Imports
use std::collections::HashSet;

// Crates.io Imports
use log::warn;

// Local Imports
use crate::{StackLayerParams, TechError, TechResult, Technology};

/// Absolute tolerance of the height rule
pub const HEIGHT_TOLERANCE: f64 = 1e-9;

/// # Validation Mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Fail on the first issue
    Strict,
    /// Log each issue as a warning, and succeed
    Lenient,
}
impl Default for ValidationMode {
    fn default() -> Self {
        Self::Strict
    }
}

impl Technology {
    /// Collect every validation issue, in check order
    pub fn issues(&self) -> Vec<TechError> {
        let names = NameSets::new(self);
        let mut issues = Vec::new();
        issues.extend(self.duplicate_names());
        issues.extend(self.dangling_originals(&names));
        issues.extend(self.dangling_stack_references(&names));
        issues.extend(self.height_mismatches());
        issues.extend(self.kind_purpose_mismatches(&names));
        issues.extend(self.resistance.duplicate_keys());
        issues.extend(self.capacitance.duplicate_keys());
        issues
    }
    /// Validate, failing on the first issue
    pub fn validate(&self) -> TechResult<()> {
        match self.issues().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
    /// Validate in `mode`
    pub fn check(&self, mode: ValidationMode) -> TechResult<()> {
        match mode {
            ValidationMode::Strict => self.validate(),
            ValidationMode::Lenient => {
                for issue in self.issues() {
                    warn!("{}: {}", self.name, issue);
                }
                Ok(())
            }
        }
    }
    fn duplicate_names(&self) -> Vec<TechError> {
        let mut errs = Vec::new();
        let mut seen = HashSet::new();
        for layer in self.layers.iter() {
            if !seen.insert(layer.name.as_str()) {
                errs.push(TechError::DuplicateName {
                    registry: "layers",
                    name: layer.name.clone(),
                });
            }
        }
        let mut seen = HashSet::new();
        for layer in self.lvs_computed_layers.iter() {
            if !seen.insert(layer.name()) {
                errs.push(TechError::DuplicateName {
                    registry: "lvs_computed_layers",
                    name: layer.name().to_string(),
                });
            }
        }
        errs
    }
    fn dangling_originals(&self, names: &NameSets) -> Vec<TechError> {
        self.lvs_computed_layers
            .iter()
            .filter(|c| !c.original_layer_name.is_empty())
            .filter(|c| !names.is_original(&c.original_layer_name))
            .map(|c| {
                TechError::dangling(
                    c.original_layer_name.clone(),
                    format!("computed layer `{}`", c.name()),
                )
            })
            .collect()
    }
    fn dangling_stack_references(&self, names: &NameSets) -> Vec<TechError> {
        let mut errs = Vec::new();
        for layer in self.process_stack.layers.iter() {
            for (field, reference) in layer.params.references() {
                if !names.stack.contains(reference) {
                    errs.push(TechError::dangling(
                        reference,
                        format!("{} of stack layer `{}`", field, layer.name),
                    ));
                }
            }
            if let Some(contact) = layer.contact() {
                for (field, reference) in [
                    ("layer_below", &contact.layer_below),
                    ("metal_above", &contact.metal_above),
                ] {
                    if !names.is_stack_or_layer(reference) {
                        errs.push(TechError::dangling(
                            reference.clone(),
                            format!("{} of contact `{}` on `{}`", field, contact.name, layer.name),
                        ));
                    }
                }
            }
        }
        errs
    }
    ///
    /// Check the height rule for every metal with a contact.
    ///
    /// The upper metal is the first later stack metal named by the contact's `metal_above`.
    /// Contacts onto drawn layers without a stack entry of that name are not checked.
    ///
    fn height_mismatches(&self) -> Vec<TechError> {
        let layers = &self.process_stack.layers;
        let mut errs = Vec::new();
        for (idx, layer) in layers.iter().enumerate() {
            let (metal, contact) = match (&layer.params, layer.contact()) {
                (StackLayerParams::Metal(m), Some(c)) => (m, c),
                _ => continue,
            };
            let upper = layers[idx + 1..]
                .iter()
                .find(|l| l.name == contact.metal_above && l.metal().is_some());
            let upper = match upper.and_then(|l| l.metal()) {
                Some(u) => u,
                None => continue,
            };
            let expected = metal.height + metal.thickness + contact.thickness;
            if (upper.height - expected).abs() > HEIGHT_TOLERANCE {
                errs.push(TechError::HeightMismatch {
                    lower: layer.name.clone(),
                    upper: contact.metal_above.clone(),
                    expected,
                    actual: upper.height,
                });
            }
        }
        errs
    }
    ///
    /// Device capacitor and resistor layers must derive from a conductor:
    /// a metal, via, contact or MiM layer. Never from a pin or label alias.
    ///
    fn kind_purpose_mismatches(&self, names: &NameSets) -> Vec<TechError> {
        let mut errs = Vec::new();
        for computed in self.lvs_computed_layers.iter().filter(|c| c.kind.is_device()) {
            let original = computed.original_layer_name.as_str();
            let fail = |message: String| TechError::KindPurpose {
                name: computed.name().to_string(),
                message,
            };
            if original.is_empty() {
                errs.push(fail(format!("{} layer has no original layer", computed.kind)));
                continue;
            }
            if names.aliases.contains(original) {
                errs.push(fail(format!(
                    "{} layer derives from pin/label layer `{}`",
                    computed.kind, original
                )));
                continue;
            }
            let purpose = self
                .layers
                .iter()
                .find(|l| l.name == original)
                .map(|l| l.purpose)
                .or_else(|| {
                    self.lvs_computed_layers
                        .iter()
                        .find(|c| c.name() == original)
                        .map(|c| c.purpose())
                });
            // Unresolved names are reported as dangling references
            if let Some(purpose) = purpose {
                if !purpose.is_conductor() {
                    errs.push(fail(format!(
                        "{} layer derives from `{}`, of non-conducting purpose {}",
                        computed.kind, original, purpose
                    )));
                }
            }
        }
        errs
    }
}

/// Name sets against which references resolve
struct NameSets<'t> {
    layers: HashSet<&'t str>,
    computed: HashSet<&'t str>,
    /// `<layer>.pin` and `<layer>.label`
    aliases: HashSet<String>,
    stack: HashSet<&'t str>,
}
impl<'t> NameSets<'t> {
    fn new(tech: &'t Technology) -> Self {
        let mut aliases = HashSet::new();
        for layer in tech.layers.iter() {
            aliases.extend(layer.pin_alias());
            aliases.extend(layer.label_alias());
        }
        Self {
            layers: tech.layers.iter().map(|l| l.name.as_str()).collect(),
            computed: tech.lvs_computed_layers.iter().map(|c| c.name()).collect(),
            aliases,
            stack: tech.process_stack.layers.iter().map(|l| l.name.as_str()).collect(),
        }
    }
    fn is_original(&self, name: &str) -> bool {
        self.layers.contains(name) || self.computed.contains(name) || self.aliases.contains(name)
    }
    fn is_stack_or_layer(&self, name: &str) -> bool {
        self.stack.contains(name) || self.layers.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComputedLayerKind, Contact, LayerInfo, LayerPurpose};

    fn tech() -> TechResult<Technology> {
        let mut tech = Technology::new("vtest");
        tech.add_layer(LayerInfo::new("met1", LayerPurpose::Metal, (68, 20)));
        tech.add_layer(LayerInfo::new("via", LayerPurpose::Via, (68, 44)));
        tech.add_layer(LayerInfo::new("met2", LayerPurpose::Metal, (69, 20)));
        tech.add_layer(LayerInfo::new("psdm", LayerPurpose::PImplant, (94, 20)));
        tech.map_pin_layer((68, 20).into(), (68, 16).into())?;

        let stack = &mut tech.process_stack;
        stack.add_substrate_layer("subs", 0.1, 0.33, "fox");
        stack.add_field_oxide_layer("fox", 3.9);
        let met1 = stack.add_metal_layer("met1", 1.3761, 0.36, "fox", "nild3");
        stack.set_contact(met1, Contact::new("via", "met2", 0.27))?;
        stack.add_simple_dielectric("nild3", 4.5, "fox");
        stack.add_metal_layer("met2", 2.0061, 0.36, "nild3", "");
        Ok(tech)
    }

    #[test]
    fn clean_tech_validates() -> TechResult<()> {
        let tech = tech()?;
        assert!(tech.issues().is_empty(), "{:?}", tech.issues());
        tech.validate()?;
        Ok(())
    }

    #[test]
    fn duplicate_layer_names() -> TechResult<()> {
        let mut tech = tech()?;
        tech.add_layer(LayerInfo::new("met1", LayerPurpose::Metal, (68, 5)));
        match tech.validate() {
            Err(TechError::DuplicateName { registry, name }) => {
                assert_eq!(registry, "layers");
                assert_eq!(name, "met1");
            }
            other => panic!("Expected DuplicateName, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn pin_alias_resolves() -> TechResult<()> {
        let mut tech = tech()?;
        let pin = LayerInfo::new("met1_pin_con", LayerPurpose::Metal, (68, 16));
        tech.add_computed_layer(ComputedLayerKind::Pin, pin, "met1.pin");
        tech.validate()?;
        // But there is no `met2.pin`
        let pin = LayerInfo::new("met2_pin_con", LayerPurpose::Metal, (69, 16));
        tech.add_computed_layer(ComputedLayerKind::Pin, pin, "met2.pin");
        assert!(matches!(
            tech.validate(),
            Err(TechError::DanglingReference { name, .. }) if name == "met2.pin"
        ));
        Ok(())
    }

    #[test]
    fn dangling_stack_reference() -> TechResult<()> {
        let mut tech = tech()?;
        tech.process_stack.add_simple_dielectric("air", 3.0, "topnit");
        let issues = tech.issues();
        assert_eq!(issues.len(), 1);
        match &issues[0] {
            TechError::DanglingReference { name, referrer } => {
                assert_eq!(name, "topnit");
                assert!(referrer.contains("`air`"));
            }
            e => panic!("Unexpected {:?}", e),
        }
        Ok(())
    }

    #[test]
    fn height_mismatch() -> TechResult<()> {
        let mut tech = tech()?;
        let met2 = tech.process_stack.find("met2").unwrap();
        if let StackLayerParams::Metal(m) = &mut tech.process_stack.layers[met2.0].params {
            m.height = 2.1;
        }
        match tech.validate() {
            Err(TechError::HeightMismatch {
                lower,
                upper,
                expected,
                actual,
            }) => {
                assert_eq!(lower, "met1");
                assert_eq!(upper, "met2");
                assert!((expected - 2.0061).abs() < 1e-12);
                assert_eq!(actual, 2.1);
            }
            other => panic!("Expected HeightMismatch, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn contacts_onto_drawn_layers_are_not_height_checked() -> TechResult<()> {
        let mut tech = tech()?;
        tech.add_layer(LayerInfo::new("met3", LayerPurpose::Metal, (70, 20)));
        let met2 = tech.process_stack.find("met2").unwrap();
        tech.process_stack
            .set_contact(met2, Contact::new("via2", "met3", 0.42))?;
        tech.validate()?;
        Ok(())
    }

    #[test]
    fn device_layers_need_conductors() -> TechResult<()> {
        let mut tech = tech()?;
        let vpp = LayerInfo::new("via1_vpp", LayerPurpose::Via, (68, 44));
        tech.add_computed_layer(ComputedLayerKind::DeviceCapacitor, vpp, "via");
        tech.validate()?;

        let mut bad = tech.clone();
        let implant = LayerInfo::new("psdm_res", LayerPurpose::PImplant, (94, 20));
        bad.add_computed_layer(ComputedLayerKind::DeviceResistor, implant, "psdm");
        assert!(matches!(bad.validate(), Err(TechError::KindPurpose { name, .. }) if name == "psdm_res"));

        let mut bad = tech.clone();
        let pin = LayerInfo::new("met1_vpp_pin", LayerPurpose::Metal, (68, 16));
        bad.add_computed_layer(ComputedLayerKind::DeviceCapacitor, pin, "met1.pin");
        assert!(matches!(bad.validate(), Err(TechError::KindPurpose { .. })));

        let mut bad = tech;
        let orphan = LayerInfo::new("orphan", LayerPurpose::Metal, (1, 1));
        bad.add_computed_layer(ComputedLayerKind::DeviceCapacitor, orphan, "");
        assert!(matches!(bad.validate(), Err(TechError::KindPurpose { .. })));
        Ok(())
    }

    #[test]
    fn device_layers_may_derive_from_contacts_and_mim_caps() -> TechResult<()> {
        // As sky130's `licon_vpp` capacitor and ihp's `cmim_top` plate do
        let mut tech = tech()?;
        tech.add_layer(LayerInfo::new("licon1", LayerPurpose::Contact, (66, 44)));
        tech.add_layer(LayerInfo::new("cmim", LayerPurpose::MimCap, (36, 0)));
        let licon_vpp = LayerInfo::new("licon_vpp", LayerPurpose::Contact, (66, 44));
        tech.add_computed_layer(ComputedLayerKind::DeviceCapacitor, licon_vpp, "licon1");
        let cmim_top = LayerInfo::new("cmim_top", LayerPurpose::MimCap, (36, 0));
        tech.add_computed_layer(ComputedLayerKind::DeviceCapacitor, cmim_top, "cmim");
        let kind_issues: Vec<TechError> = tech
            .issues()
            .into_iter()
            .filter(|e| matches!(e, TechError::KindPurpose { .. }))
            .collect();
        assert!(kind_issues.is_empty(), "{:?}", kind_issues);

        // Diffusion is not among them
        tech.add_layer(LayerInfo::new("diff", LayerPurpose::Diff, (65, 20)));
        let diff_res = LayerInfo::new("diff_res", LayerPurpose::Diff, (65, 20));
        tech.add_computed_layer(ComputedLayerKind::DeviceResistor, diff_res, "diff");
        assert!(tech
            .issues()
            .iter()
            .any(|e| matches!(e, TechError::KindPurpose { name, .. } if name == "diff_res")));
        Ok(())
    }

    #[test]
    fn lenient_mode_succeeds() -> TechResult<()> {
        let mut tech = tech()?;
        tech.resistance.add_via_resistance("via", 4500.0);
        tech.resistance.add_via_resistance("via", 4500.0);
        assert!(tech.check(ValidationMode::Strict).is_err());
        tech.check(ValidationMode::Lenient)?;
        Ok(())
    }
}
