//!
//! # Tech21 PDK Definitions
//!
//! Each supported process is a declarative [PdkTable], bundled as TOML under `data/`,
//! and turned into a [Technology] by the one generic [PdkTable::build].
//! Tables of the same schema can also be loaded at runtime via [PdkTable::open].
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Workspace
use tech21::{TechResult, Technology};
use tech21utils::{enumstr, EnumStr};

pub mod table;
pub use table::*;
mod builder;


enumstr!(
    /// # Bundled PDKs
    Pdk {
        Sky130A: "sky130A",
        IhpSg13g2: "ihp_sg13g2",
        Gf180mcuD: "gf180mcuD",
    }
);
impl Pdk {
    /// TOML source of the bundled table
    pub fn source(&self) -> &'static str {
        match self {
            Self::Sky130A => include_str!("../data/sky130A.toml"),
            Self::IhpSg13g2 => include_str!("../data/ihp_sg13g2.toml"),
            Self::Gf180mcuD => include_str!("../data/gf180mcuD.toml"),
        }
    }
    pub fn table(&self) -> TechResult<PdkTable> {
        PdkTable::from_toml(self.source())
    }
    /// Build a fresh [Technology]. Each call returns an independent value.
    pub fn build(&self) -> TechResult<Technology> {
        self.table()?.build()
    }
}

/// Build every bundled PDK, in declaration order
pub fn build_all() -> TechResult<Vec<Technology>> {
    Pdk::variants().iter().map(Pdk::build).collect()
}
