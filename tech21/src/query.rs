//!
//! # Technology Lookups
//!
//! Name-keyed views over a [Technology], as used by the extractor which consumes it.
//!

// Std-Lib Imports
use std::collections::HashMap;

// Local Imports
use crate::{
    ComputedLayerInfo, GdsPair, LayerInfo, StackLayer, StackLayerId, StackLayerParams,
    StackLayerType, TechError, TechResult, Technology,
};

///
/// # Technology Index
///
/// Name-to-position tables, built once per [Technology] and borrowed from it.
/// Stack names may repeat, so stack lookups return every position.
///
#[derive(Debug)]
pub struct TechIndex<'t> {
    tech: &'t Technology,
    layers: HashMap<&'t str, usize>,
    computed: HashMap<&'t str, usize>,
    gds: HashMap<GdsPair, usize>,
    stack: HashMap<&'t str, Vec<StackLayerId>>,
}
impl<'t> TechIndex<'t> {
    pub fn new(tech: &'t Technology) -> Self {
        let mut layers = HashMap::new();
        let mut gds = HashMap::new();
        for (idx, layer) in tech.layers.iter().enumerate() {
            layers.entry(layer.name.as_str()).or_insert(idx);
            gds.entry(layer.drw_gds_pair).or_insert(idx);
        }
        let mut computed = HashMap::new();
        for (idx, layer) in tech.lvs_computed_layers.iter().enumerate() {
            computed.entry(layer.name()).or_insert(idx);
        }
        let mut stack: HashMap<&str, Vec<StackLayerId>> = HashMap::new();
        for (id, layer) in tech.process_stack.iter() {
            stack.entry(layer.name.as_str()).or_default().push(id);
        }
        Self {
            tech,
            layers,
            computed,
            gds,
            stack,
        }
    }
    /// Drawn layer named `name`
    pub fn layer(&self, name: &str) -> Option<&'t LayerInfo> {
        self.layers.get(name).map(|idx| &self.tech.layers[*idx])
    }
    /// Computed layer named `name`
    pub fn computed_layer(&self, name: &str) -> Option<&'t ComputedLayerInfo> {
        self.computed
            .get(name)
            .map(|idx| &self.tech.lvs_computed_layers[*idx])
    }
    /// First drawn layer on `pair`
    pub fn layer_by_gds_pair(&self, pair: GdsPair) -> Option<&'t LayerInfo> {
        self.gds.get(&pair).map(|idx| &self.tech.layers[*idx])
    }
    /// Every stack entry named `name`, bottom to top
    pub fn stack_layers(&self, name: &str) -> Vec<&'t StackLayer> {
        self.stack
            .get(name)
            .map(|ids| ids.iter().map(|id| &self.tech.process_stack.layers[id.0]).collect())
            .unwrap_or_default()
    }
    fn of_type(&self, layer_type: StackLayerType) -> impl Iterator<Item = &'t StackLayer> {
        self.tech
            .process_stack
            .layers
            .iter()
            .filter(move |l| l.layer_type() == layer_type)
    }
    /// The (first) substrate layer
    pub fn substrate(&self) -> Option<&'t StackLayer> {
        self.of_type(StackLayerType::Substrate).next()
    }
    pub fn diffusion_layers(&self) -> Vec<&'t StackLayer> {
        self.of_type(StackLayerType::Diffusion).collect()
    }
    pub fn metal_layers(&self) -> Vec<&'t StackLayer> {
        self.of_type(StackLayerType::Metal).collect()
    }
    /// Dielectric constant of the first dielectric stack entry named `name`
    pub fn dielectric_k(&self, name: &str) -> Option<f64> {
        self.stack_layers(name)
            .into_iter()
            .find_map(|l| l.params.dielectric_k())
    }
    ///
    /// The sidewall or conformal dielectric which wraps metal `metal`.
    ///
    /// Returns `Ok(None)` if there is none, and an error if there is more than one.
    ///
    pub fn sidewall_dielectric(&self, metal: &str) -> TechResult<Option<&'t StackLayer>> {
        let found: Vec<&'t StackLayer> = self
            .tech
            .process_stack
            .layers
            .iter()
            .filter(|l| match &l.params {
                StackLayerParams::SidewallDielectric(d) => d.reference == metal,
                StackLayerParams::ConformalDielectric(d) => d.reference == metal,
                _ => false,
            })
            .collect();
        match found.len() {
            0 => Ok(None),
            1 => Ok(Some(found[0])),
            n => TechError::fail(format!(
                "Found {} sidewall dielectric layers for `{}`",
                n, metal
            )),
        }
    }
    ///
    /// The first simple dielectric above (the first stack entry named) `metal`,
    /// and the vertical distance from `metal` to the next metal up.
    ///
    /// The distance is `None` when `metal` is the topmost metal.
    /// Returns `None` altogether if there is no metal named `metal`.
    ///
    pub fn simple_dielectric_above(&self, metal: &str) -> Option<(Option<&'t StackLayer>, Option<f64>)> {
        let layers = &self.tech.process_stack.layers;
        let (pos, base) = layers
            .iter()
            .enumerate()
            .find_map(|(i, l)| match (l.name == metal, l.metal()) {
                (true, Some(m)) => Some((i, m)),
                _ => None,
            })?;
        let mut dielectric = None;
        for layer in layers[pos + 1..].iter() {
            if dielectric.is_none() && layer.layer_type() == StackLayerType::SimpleDielectric {
                dielectric = Some(layer);
            }
            if let Some(next) = layer.metal() {
                return Some((dielectric, Some(next.height - base.height)));
            }
        }
        Some((dielectric, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LayerPurpose;

    fn tech() -> Technology {
        let mut tech = Technology::new("qtest");
        tech.add_layer(LayerInfo::new("met1", LayerPurpose::Metal, (68, 20)));
        tech.add_layer(LayerInfo::new("met1_alt", LayerPurpose::Metal, (68, 20)));
        let stack = &mut tech.process_stack;
        stack.add_substrate_layer("subs", 0.1, 0.33, "fox");
        stack.add_diffusion_layer("diff", 0.323, "fox");
        stack.add_field_oxide_layer("fox", 4.632);
        stack.add_metal_layer("met1", 1.3761, 0.36, "nild2", "nild3");
        stack.add_sidewall_dielectric("nild3c", 3.5, 0.0, 0.03, "met1");
        stack.add_simple_dielectric("nild3", 4.5, "nild2");
        stack.add_metal_layer("met2", 2.0061, 0.36, "nild3", "nild4");
        stack.add_simple_dielectric("nild4", 4.2, "nild3");
        stack.add_conformal_dielectric("capild", 4.52, 0.02, 0.0, 0.0, "met2");
        stack.add_simple_dielectric("nild4", 4.2, "capild");
        tech
    }

    #[test]
    fn layer_lookups() {
        let tech = tech();
        let index = tech.index();
        assert_eq!(index.layer("met1").unwrap().drw_gds_pair, GdsPair::new(68, 20));
        assert_eq!(index.layer_by_gds_pair((68, 20).into()).unwrap().name, "met1");
        assert!(index.layer("met9").is_none());
        assert!(index.computed_layer("met1").is_none());
    }

    #[test]
    fn stack_lookups() -> TechResult<()> {
        let tech = tech();
        let index = tech.index();
        assert_eq!(index.substrate().unwrap().name, "subs");
        assert_eq!(index.diffusion_layers().len(), 1);
        let metals: Vec<&str> = index.metal_layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(metals, vec!["met1", "met2"]);
        assert_eq!(index.stack_layers("nild4").len(), 2);
        assert_eq!(index.dielectric_k("fox"), Some(4.632));
        assert_eq!(index.dielectric_k("met1"), None);

        assert_eq!(index.sidewall_dielectric("met1")?.unwrap().name, "nild3c");
        assert_eq!(index.sidewall_dielectric("met2")?.unwrap().name, "capild");
        assert!(index.sidewall_dielectric("diff")?.is_none());
        Ok(())
    }

    #[test]
    fn ambiguous_sidewall() {
        let mut tech = tech();
        tech.process_stack
            .add_sidewall_dielectric("nild3d", 3.5, 0.0, 0.03, "met1");
        assert!(tech.index().sidewall_dielectric("met1").is_err());
    }

    #[test]
    fn dielectric_above() {
        let tech = tech();
        let index = tech.index();
        let (diel, dist) = index.simple_dielectric_above("met1").unwrap();
        assert_eq!(diel.unwrap().name, "nild3");
        assert!((dist.unwrap() - 0.63).abs() < 1e-9);
        let (diel, dist) = index.simple_dielectric_above("met2").unwrap();
        assert_eq!(diel.unwrap().name, "nild4");
        assert_eq!(dist, None);
        assert!(index.simple_dielectric_above("nild3").is_none());
    }
}
