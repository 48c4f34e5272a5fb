//! # ProtoBuf Import & Export
//!
//! Converts between [crate::Technology] and the [tech21protos] message types.
//! The two are nearly field-for-field identical. They differ in:
//!
//! * Enumerations, which the proto-side stores as `i32`
//! * Sub-messages, which the proto-side wraps in [Option]s
//! * Stack layers, which the proto-side stores as a `layer_type` plus a `oneof` of parameters,
//!   and which we store as a single tagged union.
//!
//! Both directions are lossless.
//!

// Local imports
use crate::utils::{EnumStr, ErrorHelper, Unwrapper};
use crate::{
    CapacitanceInfo, ComputedLayerInfo, ComputedLayerKind, Contact, ConformalDielectricLayer,
    DiffusionLayer, ErrorContext, FieldOxideLayer, GdsPair, LayerInfo, LayerPurpose, MetalLayer,
    NWellLayer, ProcessStack, ResistanceInfo, SidewallDielectricLayer, SimpleDielectricLayer,
    StackLayer, StackLayerParams, StackLayerType, SubstrateLayer, TechError, TechResult,
    Technology,
};
use crate::{
    ContactResistance, LayerResistance, OverlapCapacitance, SideOverlapCapacitance,
    SidewallCapacitance, SubstrateCapacitance, ViaResistance,
};
pub use tech21protos as proto;
use proto::process_stack_info as pstack;

/// # ProtoBuf Exporter
#[derive(Debug)]
pub struct ProtoExporter<'tech> {
    tech: &'tech Technology,
    ctx_stack: Vec<ErrorContext>,
}
impl<'tech> ProtoExporter<'tech> {
    pub fn export(tech: &'tech Technology) -> TechResult<proto::Technology> {
        Self {
            tech,
            ctx_stack: Vec::new(),
        }
        .export_tech()
    }
    /// Internal implementation method. Convert everything, starting from the top-level [Technology].
    fn export_tech(&mut self) -> TechResult<proto::Technology> {
        let tech = self.tech;
        self.ctx_stack.push(ErrorContext::Technology(tech.name.clone()));
        let layers = tech
            .layers
            .iter()
            .map(|l| self.export_layer(l))
            .collect::<Result<Vec<_>, _>>()?;
        let lvs_computed_layers = tech
            .lvs_computed_layers
            .iter()
            .map(|l| self.export_computed_layer(l))
            .collect::<Result<Vec<_>, _>>()?;
        let process_stack = self.export_stack(&tech.process_stack)?;
        let ptech = proto::Technology {
            name: tech.name.clone(),
            layers,
            lvs_computed_layers,
            process_stack: Some(process_stack),
            resistance: Some(self.export_resistance(&tech.resistance)),
            capacitance: Some(self.export_capacitance(&tech.capacitance)),
            side_halo: tech.side_halo,
        };
        self.ctx_stack.pop();
        Ok(ptech)
    }
    fn export_gds_pair(&self, pair: &GdsPair) -> proto::GdsPair {
        proto::GdsPair {
            layer: pair.layer,
            datatype: pair.datatype,
        }
    }
    /// Convert a [LayerInfo]. Shared by drawn and computed layers.
    fn export_layer(&mut self, layer: &LayerInfo) -> TechResult<proto::LayerInfo> {
        self.ctx_stack.push(ErrorContext::Layer(layer.name.clone()));
        let mut player = proto::LayerInfo {
            name: layer.name.clone(),
            purpose: 0,
            description: layer.description.clone(),
            drw_gds_pair: Some(self.export_gds_pair(&layer.drw_gds_pair)),
            pin_gds_pair: layer.pin_gds_pair.as_ref().map(|p| self.export_gds_pair(p)),
            label_gds_pair: layer.label_gds_pair.as_ref().map(|p| self.export_gds_pair(p)),
        };
        player.set_purpose(self.export_purpose(layer.purpose));
        self.ctx_stack.pop();
        Ok(player)
    }
    fn export_purpose(&self, purpose: LayerPurpose) -> proto::layer_info::Purpose {
        use proto::layer_info::Purpose as P;
        match purpose {
            LayerPurpose::Unspecified => P::Unspecified,
            LayerPurpose::Dnwell => P::Dnwell,
            LayerPurpose::Nwell => P::Nwell,
            LayerPurpose::Diff => P::Diff,
            LayerPurpose::NtapOrPtap => P::NtapOrPtap,
            LayerPurpose::Ntap => P::Ntap,
            LayerPurpose::Ptap => P::Ptap,
            LayerPurpose::PImplant => P::PImplant,
            LayerPurpose::NImplant => P::NImplant,
            LayerPurpose::Contact => P::Contact,
            LayerPurpose::Metal => P::Metal,
            LayerPurpose::Via => P::Via,
            LayerPurpose::MimCap => P::MimCap,
            LayerPurpose::Substrate => P::Substrate,
        }
    }
    fn export_computed_layer(&mut self, layer: &ComputedLayerInfo) -> TechResult<proto::ComputedLayerInfo> {
        self.ctx_stack
            .push(ErrorContext::ComputedLayer(layer.name().to_string()));
        let mut player = proto::ComputedLayerInfo {
            kind: 0,
            layer_info: Some(self.export_layer(&layer.layer_info)?),
            original_layer_name: layer.original_layer_name.clone(),
        };
        use proto::computed_layer_info::Kind as K;
        player.set_kind(match layer.kind {
            ComputedLayerKind::Unspecified => K::Unspecified,
            ComputedLayerKind::Regular => K::Regular,
            ComputedLayerKind::DeviceCapacitor => K::DeviceCapacitor,
            ComputedLayerKind::DeviceResistor => K::DeviceResistor,
            ComputedLayerKind::Pin => K::Pin,
            ComputedLayerKind::Label => K::Label,
        });
        self.ctx_stack.pop();
        Ok(player)
    }
    fn export_stack(&mut self, stack: &ProcessStack) -> TechResult<proto::ProcessStackInfo> {
        let layers = stack
            .layers
            .iter()
            .map(|l| self.export_stack_layer(l))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(proto::ProcessStackInfo { layers })
    }
    fn export_stack_layer(&mut self, layer: &StackLayer) -> TechResult<pstack::LayerInfo> {
        self.ctx_stack.push(ErrorContext::StackLayer(layer.name.clone()));
        use pstack::layer_info::Parameters as P;
        let parameters = match &layer.params {
            StackLayerParams::Substrate(l) => P::SubstrateLayer(pstack::SubstrateLayer {
                height: l.height,
                thickness: l.thickness,
                reference: l.reference.clone(),
            }),
            StackLayerParams::NWell(l) => P::NwellLayer(pstack::NWellLayer {
                height: l.height,
                reference: l.reference.clone(),
                contact_above: self.export_contact(&l.contact_above),
            }),
            StackLayerParams::Diffusion(l) => P::DiffusionLayer(pstack::DiffusionLayer {
                height: l.height,
                reference: l.reference.clone(),
                contact_above: self.export_contact(&l.contact_above),
            }),
            StackLayerParams::FieldOxide(l) => P::FieldOxideLayer(pstack::FieldOxideLayer {
                dielectric_k: l.dielectric_k,
            }),
            StackLayerParams::Metal(l) => P::MetalLayer(pstack::MetalLayer {
                height: l.height,
                thickness: l.thickness,
                reference_below: l.reference_below.clone(),
                reference_above: l.reference_above.clone(),
                contact_above: self.export_contact(&l.contact_above),
            }),
            StackLayerParams::SidewallDielectric(l) => {
                P::SidewallDielectricLayer(pstack::SidewallDielectricLayer {
                    dielectric_k: l.dielectric_k,
                    height_above_metal: l.height_above_metal,
                    width_outside_sidewall: l.width_outside_sidewall,
                    reference: l.reference.clone(),
                })
            }
            StackLayerParams::SimpleDielectric(l) => {
                P::SimpleDielectricLayer(pstack::SimpleDielectricLayer {
                    dielectric_k: l.dielectric_k,
                    reference: l.reference.clone(),
                })
            }
            StackLayerParams::ConformalDielectric(l) => {
                P::ConformalDielectricLayer(pstack::ConformalDielectricLayer {
                    dielectric_k: l.dielectric_k,
                    thickness_over_metal: l.thickness_over_metal,
                    thickness_where_no_metal: l.thickness_where_no_metal,
                    thickness_sidewall: l.thickness_sidewall,
                    reference: l.reference.clone(),
                })
            }
        };
        let mut player = pstack::LayerInfo {
            name: layer.name.clone(),
            layer_type: 0,
            parameters: Some(parameters),
        };
        player.set_layer_type(self.export_layer_type(layer.layer_type())?);
        self.ctx_stack.pop();
        Ok(player)
    }
    fn export_layer_type(&self, layer_type: StackLayerType) -> TechResult<pstack::LayerType> {
        Ok(match layer_type {
            StackLayerType::Substrate => pstack::LayerType::Substrate,
            StackLayerType::NWell => pstack::LayerType::Nwell,
            StackLayerType::Diffusion => pstack::LayerType::Diffusion,
            StackLayerType::FieldOxide => pstack::LayerType::FieldOxide,
            StackLayerType::Metal => pstack::LayerType::Metal,
            StackLayerType::SidewallDielectric => pstack::LayerType::SidewallDielectric,
            StackLayerType::SimpleDielectric => pstack::LayerType::SimpleDielectric,
            StackLayerType::ConformalDielectric => pstack::LayerType::ConformalDielectric,
            // Never produced by a populated [StackLayerParams]
            StackLayerType::Unspecified => self.fail("Unspecified stack layer type")?,
        })
    }
    fn export_contact(&self, contact: &Option<Contact>) -> Option<pstack::Contact> {
        contact.as_ref().map(|c| pstack::Contact {
            name: c.name.clone(),
            layer_below: c.layer_below.clone(),
            metal_above: c.metal_above.clone(),
            thickness: c.thickness,
            width: c.width,
            spacing: c.spacing,
            border: c.border,
        })
    }
    fn export_resistance(&self, res: &ResistanceInfo) -> proto::ResistanceInfo {
        use proto::resistance_info as r;
        proto::ResistanceInfo {
            layers: res
                .layers
                .iter()
                .map(|x| r::LayerResistance {
                    layer_name: x.layer_name.clone(),
                    resistance: x.resistance,
                    corner_adjustment_fraction: x.corner_adjustment_fraction,
                })
                .collect(),
            contacts: res
                .contacts
                .iter()
                .map(|x| r::ContactResistance {
                    contact_name: x.contact_name.clone(),
                    layer_below: x.layer_below.clone(),
                    layer_above: x.layer_above.clone(),
                    resistance: x.resistance,
                })
                .collect(),
            vias: res
                .vias
                .iter()
                .map(|x| r::ViaResistance {
                    via_name: x.via_name.clone(),
                    resistance: x.resistance,
                })
                .collect(),
        }
    }
    fn export_capacitance(&self, cap: &CapacitanceInfo) -> proto::CapacitanceInfo {
        use proto::capacitance_info as c;
        proto::CapacitanceInfo {
            substrates: cap
                .substrates
                .iter()
                .map(|x| c::SubstrateCapacitance {
                    layer_name: x.layer_name.clone(),
                    area_capacitance: x.area_capacitance,
                    perimeter_capacitance: x.perimeter_capacitance,
                })
                .collect(),
            overlaps: cap
                .overlaps
                .iter()
                .map(|x| c::OverlapCapacitance {
                    top_layer_name: x.top_layer_name.clone(),
                    bottom_layer_name: x.bottom_layer_name.clone(),
                    capacitance: x.capacitance,
                })
                .collect(),
            sidewalls: cap
                .sidewalls
                .iter()
                .map(|x| c::SidewallCapacitance {
                    layer_name: x.layer_name.clone(),
                    capacitance: x.capacitance,
                    offset: x.offset,
                })
                .collect(),
            sideoverlaps: cap
                .sideoverlaps
                .iter()
                .map(|x| c::SideOverlapCapacitance {
                    in_layer_name: x.in_layer_name.clone(),
                    out_layer_name: x.out_layer_name.clone(),
                    capacitance: x.capacitance,
                })
                .collect(),
        }
    }
}
impl ErrorHelper for ProtoExporter<'_> {
    type Error = TechError;
    fn err(&self, msg: impl Into<String>) -> TechError {
        TechError::Export {
            message: msg.into(),
            stack: self.ctx_stack.clone(),
        }
    }
}

/// # ProtoBuf Importer
#[derive(Debug, Default)]
pub struct ProtoImporter {
    ctx_stack: Vec<ErrorContext>,
}
impl ProtoImporter {
    pub fn import(ptech: &proto::Technology) -> TechResult<Technology> {
        Self::default().import_tech(ptech)
    }
    /// Internal implementation method. Convert the top-level [proto::Technology].
    fn import_tech(&mut self, ptech: &proto::Technology) -> TechResult<Technology> {
        self.ctx_stack
            .push(ErrorContext::Technology(ptech.name.clone()));
        let mut tech = Technology::new(ptech.name.clone());
        tech.side_halo = ptech.side_halo;
        for player in ptech.layers.iter() {
            tech.layers.push(self.import_layer(player)?);
        }
        for player in ptech.lvs_computed_layers.iter() {
            tech.lvs_computed_layers
                .push(self.import_computed_layer(player)?);
        }
        if let Some(pstack) = &ptech.process_stack {
            for player in pstack.layers.iter() {
                tech.process_stack
                    .layers
                    .push(self.import_stack_layer(player)?);
            }
        }
        if let Some(pres) = &ptech.resistance {
            tech.resistance = self.import_resistance(pres);
        }
        if let Some(pcap) = &ptech.capacitance {
            tech.capacitance = self.import_capacitance(pcap);
        }
        self.ctx_stack.pop();
        Ok(tech)
    }
    fn import_gds_pair(&self, pair: &proto::GdsPair) -> GdsPair {
        GdsPair::new(pair.layer, pair.datatype)
    }
    fn import_layer(&mut self, player: &proto::LayerInfo) -> TechResult<LayerInfo> {
        self.ctx_stack.push(ErrorContext::Layer(player.name.clone()));
        let drw = player
            .drw_gds_pair
            .as_ref()
            .unwrapper(&*self, "Missing drawing GDS pair")?;
        let layer = LayerInfo {
            name: player.name.clone(),
            purpose: self.import_purpose(player.purpose)?,
            description: player.description.clone(),
            drw_gds_pair: self.import_gds_pair(drw),
            pin_gds_pair: player.pin_gds_pair.as_ref().map(|p| self.import_gds_pair(p)),
            label_gds_pair: player.label_gds_pair.as_ref().map(|p| self.import_gds_pair(p)),
        };
        self.ctx_stack.pop();
        Ok(layer)
    }
    /// Import a [LayerPurpose]. (The proto-side keeps it as an integer.)
    fn import_purpose(&self, ppurpose: i32) -> TechResult<LayerPurpose> {
        use proto::layer_info::Purpose as P;
        let ppurpose = P::try_from(ppurpose).unwrapper(self, "Invalid layer purpose")?;
        Ok(match ppurpose {
            P::Unspecified => LayerPurpose::Unspecified,
            P::Dnwell => LayerPurpose::Dnwell,
            P::Nwell => LayerPurpose::Nwell,
            P::Diff => LayerPurpose::Diff,
            P::NtapOrPtap => LayerPurpose::NtapOrPtap,
            P::Ntap => LayerPurpose::Ntap,
            P::Ptap => LayerPurpose::Ptap,
            P::PImplant => LayerPurpose::PImplant,
            P::NImplant => LayerPurpose::NImplant,
            P::Contact => LayerPurpose::Contact,
            P::Metal => LayerPurpose::Metal,
            P::Via => LayerPurpose::Via,
            P::MimCap => LayerPurpose::MimCap,
            P::Substrate => LayerPurpose::Substrate,
        })
    }
    fn import_computed_layer(&mut self, player: &proto::ComputedLayerInfo) -> TechResult<ComputedLayerInfo> {
        let name = player
            .layer_info
            .as_ref()
            .map(|l| l.name.clone())
            .unwrap_or_default();
        self.ctx_stack.push(ErrorContext::ComputedLayer(name));
        use proto::computed_layer_info::Kind as K;
        let kind = match self.ok(K::try_from(player.kind), "Invalid computed layer kind")? {
            K::Unspecified => ComputedLayerKind::Unspecified,
            K::Regular => ComputedLayerKind::Regular,
            K::DeviceCapacitor => ComputedLayerKind::DeviceCapacitor,
            K::DeviceResistor => ComputedLayerKind::DeviceResistor,
            K::Pin => ComputedLayerKind::Pin,
            K::Label => ComputedLayerKind::Label,
        };
        let layer_info = self.unwrap(player.layer_info.as_ref(), "Missing layer info")?;
        let layer_info = self.import_layer(layer_info)?;
        self.ctx_stack.pop();
        Ok(ComputedLayerInfo {
            kind,
            layer_info,
            original_layer_name: player.original_layer_name.clone(),
        })
    }
    fn import_stack_layer(&mut self, player: &pstack::LayerInfo) -> TechResult<StackLayer> {
        self.ctx_stack
            .push(ErrorContext::StackLayer(player.name.clone()));
        use pstack::layer_info::Parameters as P;
        let pparams = self.unwrap(player.parameters.as_ref(), "Missing stack layer parameters")?;
        let params = match pparams {
            P::SubstrateLayer(l) => StackLayerParams::Substrate(SubstrateLayer {
                height: l.height,
                thickness: l.thickness,
                reference: l.reference.clone(),
            }),
            P::NwellLayer(l) => StackLayerParams::NWell(NWellLayer {
                height: l.height,
                reference: l.reference.clone(),
                contact_above: self.import_contact(&l.contact_above),
            }),
            P::DiffusionLayer(l) => StackLayerParams::Diffusion(DiffusionLayer {
                height: l.height,
                reference: l.reference.clone(),
                contact_above: self.import_contact(&l.contact_above),
            }),
            P::FieldOxideLayer(l) => StackLayerParams::FieldOxide(FieldOxideLayer {
                dielectric_k: l.dielectric_k,
            }),
            P::MetalLayer(l) => StackLayerParams::Metal(MetalLayer {
                height: l.height,
                thickness: l.thickness,
                reference_below: l.reference_below.clone(),
                reference_above: l.reference_above.clone(),
                contact_above: self.import_contact(&l.contact_above),
            }),
            P::SidewallDielectricLayer(l) => StackLayerParams::SidewallDielectric(SidewallDielectricLayer {
                dielectric_k: l.dielectric_k,
                height_above_metal: l.height_above_metal,
                width_outside_sidewall: l.width_outside_sidewall,
                reference: l.reference.clone(),
            }),
            P::SimpleDielectricLayer(l) => StackLayerParams::SimpleDielectric(SimpleDielectricLayer {
                dielectric_k: l.dielectric_k,
                reference: l.reference.clone(),
            }),
            P::ConformalDielectricLayer(l) => {
                StackLayerParams::ConformalDielectric(ConformalDielectricLayer {
                    dielectric_k: l.dielectric_k,
                    thickness_over_metal: l.thickness_over_metal,
                    thickness_where_no_metal: l.thickness_where_no_metal,
                    thickness_sidewall: l.thickness_sidewall,
                    reference: l.reference.clone(),
                })
            }
        };
        // Check the declared `layer_type` agrees with the populated parameters
        let ptype = self.ok(pstack::LayerType::try_from(player.layer_type), "Invalid layer type")?;
        let declared = match ptype {
            pstack::LayerType::Unspecified => StackLayerType::Unspecified,
            pstack::LayerType::Substrate => StackLayerType::Substrate,
            pstack::LayerType::Nwell => StackLayerType::NWell,
            pstack::LayerType::Diffusion => StackLayerType::Diffusion,
            pstack::LayerType::FieldOxide => StackLayerType::FieldOxide,
            pstack::LayerType::Metal => StackLayerType::Metal,
            pstack::LayerType::SidewallDielectric => StackLayerType::SidewallDielectric,
            pstack::LayerType::SimpleDielectric => StackLayerType::SimpleDielectric,
            pstack::LayerType::ConformalDielectric => StackLayerType::ConformalDielectric,
        };
        self.assert(
            declared == params.layer_type(),
            format!(
                "Layer type {} does not match {} parameters",
                declared.to_str(),
                params.layer_type().to_str()
            ),
        )?;
        self.ctx_stack.pop();
        Ok(StackLayer {
            name: player.name.clone(),
            params,
        })
    }
    fn import_contact(&self, pcontact: &Option<pstack::Contact>) -> Option<Contact> {
        pcontact.as_ref().map(|c| Contact {
            name: c.name.clone(),
            layer_below: c.layer_below.clone(),
            metal_above: c.metal_above.clone(),
            thickness: c.thickness,
            width: c.width,
            spacing: c.spacing,
            border: c.border,
        })
    }
    fn import_resistance(&mut self, pres: &proto::ResistanceInfo) -> ResistanceInfo {
        ResistanceInfo {
            layers: pres
                .layers
                .iter()
                .map(|x| LayerResistance {
                    layer_name: x.layer_name.clone(),
                    resistance: x.resistance,
                    corner_adjustment_fraction: x.corner_adjustment_fraction,
                })
                .collect(),
            contacts: pres
                .contacts
                .iter()
                .map(|x| ContactResistance {
                    contact_name: x.contact_name.clone(),
                    layer_below: x.layer_below.clone(),
                    layer_above: x.layer_above.clone(),
                    resistance: x.resistance,
                })
                .collect(),
            vias: pres
                .vias
                .iter()
                .map(|x| ViaResistance {
                    via_name: x.via_name.clone(),
                    resistance: x.resistance,
                })
                .collect(),
        }
    }
    fn import_capacitance(&mut self, pcap: &proto::CapacitanceInfo) -> CapacitanceInfo {
        CapacitanceInfo {
            substrates: pcap
                .substrates
                .iter()
                .map(|x| SubstrateCapacitance {
                    layer_name: x.layer_name.clone(),
                    area_capacitance: x.area_capacitance,
                    perimeter_capacitance: x.perimeter_capacitance,
                })
                .collect(),
            overlaps: pcap
                .overlaps
                .iter()
                .map(|x| OverlapCapacitance {
                    top_layer_name: x.top_layer_name.clone(),
                    bottom_layer_name: x.bottom_layer_name.clone(),
                    capacitance: x.capacitance,
                })
                .collect(),
            sidewalls: pcap
                .sidewalls
                .iter()
                .map(|x| SidewallCapacitance {
                    layer_name: x.layer_name.clone(),
                    capacitance: x.capacitance,
                    offset: x.offset,
                })
                .collect(),
            sideoverlaps: pcap
                .sideoverlaps
                .iter()
                .map(|x| SideOverlapCapacitance {
                    in_layer_name: x.in_layer_name.clone(),
                    out_layer_name: x.out_layer_name.clone(),
                    capacitance: x.capacitance,
                })
                .collect(),
        }
    }
}
impl ErrorHelper for ProtoImporter {
    type Error = TechError;
    fn err(&self, msg: impl Into<String>) -> TechError {
        TechError::Import {
            message: msg.into(),
            stack: self.ctx_stack.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tech() -> TechResult<Technology> {
        let mut tech = Technology::new("ptest");
        tech.side_halo = 8.0;
        let mut met1 = LayerInfo::new("Metal1", LayerPurpose::Metal, (8, 0));
        met1.pin_gds_pair = Some((8, 2).into());
        met1.label_gds_pair = Some((8, 25).into());
        tech.add_layer(met1);
        tech.add_computed_layer(
            ComputedLayerKind::DeviceCapacitor,
            LayerInfo::new("metal5_cap", LayerPurpose::Metal, (67, 100)),
            "Metal5",
        );
        let stack = &mut tech.process_stack;
        stack.add_substrate_layer("subs", 0.0, 0.28, "fox");
        let nwell = stack.add_nwell_layer("nwell", 0.0, "");
        stack.set_contact(nwell, Contact::new("Cont", "Metal1", 0.64).geometry(0.16, 0.18, 0.0))?;
        stack.add_metal_layer("Metal1", 0.64, 0.42, "ild0", "ild1");
        stack.add_conformal_dielectric("nitride", 6.5, 0.05, 0.05, 0.05, "Metal1");
        tech.resistance.add_layer_resistance("Metal1", 135.0, 0.0);
        tech.resistance.add_contact_resistance("Cont", "Activ", "Metal1", 17000.0);
        tech.capacitance.add_sidewall_cap("Metal1", 37.54, 0.0);
        tech.capacitance.add_sidewall_overlap_cap("Metal1", "Activ", 49.0);
        Ok(tech)
    }

    #[test]
    fn roundtrip() -> TechResult<()> {
        let tech = tech()?;
        let ptech = ProtoExporter::export(&tech)?;
        assert_eq!(ptech.layers[0].purpose(), proto::layer_info::Purpose::Metal);
        assert_eq!(
            ptech.lvs_computed_layers[0].kind(),
            proto::computed_layer_info::Kind::DeviceCapacitor
        );
        let pstack = ptech.process_stack.as_ref().unwrap();
        assert_eq!(pstack.layers[1].layer_type(), pstack::LayerType::Nwell);

        let back = ProtoImporter::import(&ptech)?;
        assert_eq!(back, tech);
        Ok(())
    }

    #[test]
    fn missing_parameters() -> TechResult<()> {
        let mut ptech = ProtoExporter::export(&tech()?)?;
        if let Some(pstack) = ptech.process_stack.as_mut() {
            pstack.layers[2].parameters = None;
        }
        match ProtoImporter::import(&ptech) {
            Err(TechError::Import { message, stack }) => {
                assert!(message.contains("Missing stack layer parameters"));
                assert!(matches!(stack.last(), Some(ErrorContext::StackLayer(name)) if name == "Metal1"));
            }
            other => panic!("Expected Import error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn mismatched_layer_type() -> TechResult<()> {
        let mut ptech = ProtoExporter::export(&tech()?)?;
        if let Some(pstack) = ptech.process_stack.as_mut() {
            pstack.layers[0].set_layer_type(pstack::LayerType::Metal);
        }
        assert!(matches!(ProtoImporter::import(&ptech), Err(TechError::Import { .. })));
        Ok(())
    }

    #[test]
    fn invalid_enum_value() -> TechResult<()> {
        let mut ptech = ProtoExporter::export(&tech()?)?;
        ptech.layers[0].purpose = 99;
        match ProtoImporter::import(&ptech) {
            Err(TechError::Import { message, .. }) => assert!(message.contains("Invalid layer purpose")),
            other => panic!("Expected Import error, got {:?}", other),
        }
        Ok(())
    }
}
