use crate::error::CutError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// One routing-table operation on the diamond. Wire codes follow the cut
/// entrypoint: 0 = add, 1 = replace, 2 = remove.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutAction {
    Add,
    Replace,
    Remove,
}

impl CutAction {
    pub fn parse(raw: &str) -> Result<Self, CutError> {
        match raw.trim() {
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            "remove" => Ok(Self::Remove),
            other => Err(CutError::InvalidAction {
                action: other.to_string(),
            }),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Add => 0,
            Self::Replace => 1,
            Self::Remove => 2,
        }
    }
}

/// The closed set of facet kinds this deployer knows how to cut. The diamond
/// proxy itself is not a facet; it is deployed through its own port method
/// with `(owner, diamond_cut_facet)` constructor arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FacetKind {
    DiamondCut,
    Ownership,
    DiamondLoupe,
    Inventory,
}

/// Initializer call encoded after a cut, for facet kinds that have one.
/// All registered initializers take static arguments only.
#[derive(Clone, Copy, Debug)]
pub struct InitializerAbi {
    pub name: &'static str,
    pub input_kinds: &'static [&'static str],
}

impl FacetKind {
    pub const ALL: [FacetKind; 4] = [
        FacetKind::DiamondCut,
        FacetKind::Ownership,
        FacetKind::DiamondLoupe,
        FacetKind::Inventory,
    ];

    pub fn contract_name(&self) -> &'static str {
        match self {
            Self::DiamondCut => "DiamondCutFacet",
            Self::Ownership => "OwnershipFacet",
            Self::DiamondLoupe => "DiamondLoupeFacet",
            Self::Inventory => "InventoryFacet",
        }
    }

    pub fn from_contract_name(name: &str) -> Result<Self, CutError> {
        let trimmed = name.trim();
        Self::ALL
            .iter()
            .find(|kind| kind.contract_name() == trimmed)
            .copied()
            .ok_or_else(|| CutError::InvalidFacetName {
                name: trimmed.to_string(),
                choices: Self::ALL
                    .iter()
                    .map(|kind| kind.contract_name())
                    .collect::<Vec<_>>()
                    .join(","),
            })
    }

    pub fn initializer_abi(&self) -> Option<InitializerAbi> {
        match self {
            Self::Inventory => Some(InitializerAbi {
                name: "init",
                input_kinds: &["address", "uint256", "address"],
            }),
            _ => None,
        }
    }
}

/// A named capability bundle layered onto the base precedence for one
/// composed deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    Inventory,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inventory => "Inventory",
        }
    }

    pub fn from_facet_name(name: &str) -> Option<Self> {
        match name.trim() {
            "InventoryFacet" => Some(Self::Inventory),
            _ => None,
        }
    }
}

/// Extra facets a feature appends to the base precedence, plus the ignore
/// rules applied at the position of the feature's own facet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureDefinition {
    pub feature: Feature,
    pub extra_facets: Vec<FacetKind>,
    pub ignore_methods: BTreeSet<String>,
    pub ignore_selectors: BTreeSet<String>,
}

/// One `(facetAddress, actionCode, selectors)` triple submitted to the cut
/// entrypoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCut {
    pub facet_address: String,
    pub action: CutAction,
    pub selectors: Vec<String>,
}

/// Accumulated outcome of one orchestration run. Mutated incrementally as
/// stages complete; final once the run terminates at success or at the first
/// failing stage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub contracts: BTreeMap<String, String>,
    pub attached: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_diamond_facets: Option<bool>,
}

pub fn normalize_address(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().to_ascii_lowercase();
    let valid = trimmed.len() == 42
        && trimmed.starts_with("0x")
        && trimmed
            .as_bytes()
            .iter()
            .skip(2)
            .all(|byte| byte.is_ascii_hexdigit());
    if !valid {
        return Err("address must be a 0x-prefixed 20-byte hex string".to_string());
    }
    Ok(trimmed)
}

pub fn normalize_selector_hex(raw: &str) -> Result<String, String> {
    let compact = raw.trim().to_ascii_lowercase();
    let without_prefix = compact.strip_prefix("0x").unwrap_or(&compact);
    if without_prefix.len() != 8 {
        return Err("selector must be exactly 4 bytes hex".to_string());
    }
    if !without_prefix
        .as_bytes()
        .iter()
        .all(|byte| byte.is_ascii_hexdigit())
    {
        return Err("selector must be valid hex".to_string());
    }
    Ok(format!("0x{without_prefix}"))
}
