//!
//! # PDK Table Builder
//!
//! The one generic builder shared by every PDK.
//! Registries first, then the process stack, then the coefficient tables.
//!

// Std-Lib Imports
use std::collections::HashMap;

// Crates.io Imports
use log::{debug, info};

// Local Imports
use crate::table::{ContactRow, HeightSpec, PdkTable, StackRow, ThicknessSpec};
use tech21::{
    Contact, LayerInfo, LayerPurpose, ProcessStack, StackLayerId, TechError, TechResult, Technology,
};

impl PdkTable {
    /// Create the [Technology] described by this table.
    /// Heights and contact thicknesses are resolved here; the result is not validated.
    pub fn build(&self) -> TechResult<Technology> {
        info!("Building technology `{}`", self.name);
        let mut tech = Technology::new(&self.name);
        tech.side_halo = self.side_halo;

        for row in &self.layers {
            let mut layer = LayerInfo::new(&row.name, row.purpose, row.drw());
            layer.description = row.description.clone();
            layer.pin_gds_pair = row.pin.map(Into::into);
            layer.label_gds_pair = row.label.map(Into::into);
            tech.add_layer(layer);
        }
        for m in &self.pin_mappings {
            tech.map_pin_layer(m.drw.into(), m.pair.into())?;
        }
        for m in &self.label_mappings {
            tech.map_label_layer(m.drw.into(), m.pair.into())?;
        }
        for row in &self.computed_layers {
            let purpose = match row.purpose {
                Some(p) => p,
                None => inherited_purpose(&tech, &row.original),
            };
            let mut layer = LayerInfo::new(&row.name, purpose, row.gds);
            layer.description = row.description.clone();
            tech.add_computed_layer(row.kind, layer, &row.original);
        }

        StackPlacer::default().place(&self.stack, &mut tech.process_stack)?;

        tech.resistance = self.resistance.clone();
        tech.capacitance = self.capacitance.clone();
        debug!(
            "Built `{}`: {} layers, {} computed layers, {} stack layers",
            tech.name,
            tech.layers.len(),
            tech.lvs_computed_layers.len(),
            tech.process_stack.len()
        );
        Ok(tech)
    }
}

/// Purpose of whatever `original` names: a drawn layer, an earlier computed layer,
/// or the drawn layer behind a `.pin`/`.label` alias.
/// Unresolved names get the default purpose, and are reported by validation.
fn inherited_purpose(tech: &Technology, original: &str) -> LayerPurpose {
    let drawn = |name: &str| tech.layers.iter().find(|l| l.name == name).map(|l| l.purpose);
    drawn(original)
        .or_else(|| {
            tech.lvs_computed_layers
                .iter()
                .find(|c| c.name() == original)
                .map(|c| c.purpose())
        })
        .or_else(|| {
            let base = original
                .strip_suffix(".pin")
                .or_else(|| original.strip_suffix(".label"))?;
            drawn(base)
        })
        .unwrap_or_default()
}

/// Thickness of the contact above a placed entry
#[derive(Debug, Clone, Copy)]
enum Span {
    None,
    Fixed(f64),
    /// `reach` contacts, known once the whole stack is placed
    Pending,
}

/// Vertical extent of a placed well, diffusion or metal
#[derive(Debug, Clone, Copy)]
struct Placed {
    height: f64,
    thickness: f64,
    contact: Span,
}

#[derive(Debug)]
struct PendingContact<'t> {
    id: StackLayerId,
    owner: &'t str,
    row: &'t ContactRow,
    target: &'t str,
    /// Top of the owning layer
    top: f64,
    /// Only metals from this position on are candidate targets
    after: usize,
}

/// Places [StackRow]s into a [ProcessStack], bottom to top
#[derive(Debug, Default)]
struct StackPlacer<'t> {
    /// Most recent entry of each name
    placed: HashMap<&'t str, Placed>,
    /// Metals in stack order, with their heights
    metals: Vec<(&'t str, f64)>,
    pending: Vec<PendingContact<'t>>,
}
impl<'t> StackPlacer<'t> {
    fn place(mut self, rows: &'t [StackRow], stack: &mut ProcessStack) -> TechResult<()> {
        for row in rows {
            match row {
                StackRow::Substrate {
                    name,
                    height,
                    thickness,
                    reference,
                } => {
                    stack.add_substrate_layer(name, *height, *thickness, reference);
                }
                StackRow::Nwell {
                    name,
                    height,
                    reference,
                    contact,
                } => {
                    let height = self.height(name, height)?;
                    let id = stack.add_nwell_layer(name, height, reference);
                    self.attach(stack, id, name, height, 0.0, contact.as_ref())?;
                }
                StackRow::Diffusion {
                    name,
                    height,
                    reference,
                    contact,
                } => {
                    let height = self.height(name, height)?;
                    let id = stack.add_diffusion_layer(name, height, reference);
                    self.attach(stack, id, name, height, 0.0, contact.as_ref())?;
                }
                StackRow::FieldOxide { name, dielectric_k } => {
                    stack.add_field_oxide_layer(name, *dielectric_k);
                }
                StackRow::Metal {
                    name,
                    height,
                    thickness,
                    reference_below,
                    reference_above,
                    contact,
                } => {
                    let height = self.height(name, height)?;
                    let id = stack.add_metal_layer(name, height, *thickness, reference_below, reference_above);
                    self.metals.push((name.as_str(), height));
                    self.attach(stack, id, name, height, *thickness, contact.as_ref())?;
                }
                StackRow::SidewallDielectric {
                    name,
                    dielectric_k,
                    height_above_metal,
                    width_outside_sidewall,
                    reference,
                } => {
                    stack.add_sidewall_dielectric(
                        name,
                        *dielectric_k,
                        *height_above_metal,
                        *width_outside_sidewall,
                        reference,
                    );
                }
                StackRow::SimpleDielectric {
                    name,
                    dielectric_k,
                    reference,
                } => {
                    stack.add_simple_dielectric(name, *dielectric_k, reference);
                }
                StackRow::ConformalDielectric {
                    name,
                    dielectric_k,
                    thickness_over_metal,
                    thickness_where_no_metal,
                    thickness_sidewall,
                    reference,
                } => {
                    stack.add_conformal_dielectric(
                        name,
                        *dielectric_k,
                        *thickness_over_metal,
                        *thickness_where_no_metal,
                        *thickness_sidewall,
                        reference,
                    );
                }
            }
        }
        self.resolve_pending(stack)
    }
    /// Resolve `spec` for the entry named `name`
    fn height(&self, name: &str, spec: &HeightSpec) -> TechResult<f64> {
        match spec {
            HeightSpec::Literal(h) => Ok(*h),
            HeightSpec::SameAs { same_as } => Ok(self.lookup(name, same_as)?.height),
            HeightSpec::Above {
                above,
                gap: Some(gap),
            } => {
                let below = self.lookup(name, above)?;
                Ok(below.height + below.thickness + gap)
            }
            HeightSpec::Above { above, gap: None } => {
                let below = self.lookup(name, above)?;
                match below.contact {
                    Span::None => Ok(below.height + below.thickness),
                    Span::Fixed(t) => Ok(below.height + below.thickness + t),
                    Span::Pending => TechError::fail(format!(
                        "Height of `{}` is above the contact on `{}`, which itself reaches for a later layer",
                        name, above
                    )),
                }
            }
        }
    }
    fn lookup(&self, name: &str, target: &str) -> TechResult<Placed> {
        self.placed
            .get(target)
            .copied()
            .ok_or_else(|| TechError::dangling(target, format!("height of stack layer `{}`", name)))
    }
    /// Record the entry at `id`, and attach or defer its contact
    fn attach(
        &mut self,
        stack: &mut ProcessStack,
        id: StackLayerId,
        name: &'t str,
        height: f64,
        thickness: f64,
        contact: Option<&'t ContactRow>,
    ) -> TechResult<()> {
        let span = match contact {
            None => Span::None,
            Some(row) => match &row.thickness {
                ThicknessSpec::Literal(t) => {
                    stack.set_contact(id, contact_from(row, *t))?;
                    Span::Fixed(*t)
                }
                ThicknessSpec::Reach { reach } => {
                    self.pending.push(PendingContact {
                        id,
                        owner: name,
                        row,
                        target: reach,
                        top: height + thickness,
                        after: self.metals.len(),
                    });
                    Span::Pending
                }
            },
        };
        self.placed.insert(
            name,
            Placed {
                height,
                thickness,
                contact: span,
            },
        );
        Ok(())
    }
    /// Attach each `reach` contact, spanning up to the first later metal of its target name
    fn resolve_pending(self, stack: &mut ProcessStack) -> TechResult<()> {
        for p in self.pending.iter() {
            let target = self.metals[p.after..]
                .iter()
                .find(|(name, _)| *name == p.target)
                .map(|(_, height)| *height);
            let target = match target {
                Some(h) => h,
                None => {
                    return Err(TechError::dangling(
                        p.target,
                        format!("thickness of contact `{}` on `{}`", p.row.name, p.owner),
                    ))
                }
            };
            let thickness = target - p.top;
            if thickness < 0.0 {
                return TechError::fail(format!(
                    "Contact `{}` on `{}` reaches for `{}`, which sits below it",
                    p.row.name, p.owner, p.target
                ));
            }
            stack.set_contact(p.id, contact_from(p.row, thickness))?;
        }
        Ok(())
    }
}

fn contact_from(row: &ContactRow, thickness: f64) -> Contact {
    Contact::new(&row.name, &row.metal_above, thickness)
        .below(&row.layer_below)
        .geometry(row.width, row.spacing, row.border)
}
