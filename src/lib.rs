//! Deployment and facet-composition orchestration for EIP-2535 diamond
//! proxies: deterministic selector resolution for cuts, and sequential
//! multi-contract deployment with partial-failure reporting.

pub mod chain;
pub mod cut;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod registry;

pub use chain::{
    ContractHost, CutEntrypoint, MockChainHost, MockCutEntrypoint, SubmittedCut, TxReceipt,
};
pub use cut::executor::{facet_cut, CutRequest};
pub use cut::resolver::{resolve_selectors, SelectorFilters};
pub use domain::state_machine::{next_stage, DeployStage};
pub use domain::types::{
    CutAction, DeploymentResult, FacetCut, FacetKind, Feature, FeatureDefinition, ZERO_ADDRESS,
};
pub use error::{CutError, StageError};
pub use orchestrator::{deploy, DeploymentPlan, FeatureMount};
pub use registry::abi::{load_project_abis, AbiEntry, AbiParam, AbiRegistry};
pub use registry::features::{DiamondConfig, FeatureCatalog, BASE_PRECEDENCE};
