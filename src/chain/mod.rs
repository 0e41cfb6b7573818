/// Ports to the externally supplied chain services. Implementations own key
/// management, transaction signing, and confirmation waits; the core only
/// sequences calls and consumes confirmed results.
use crate::domain::types::{FacetCut, FacetKind};
use alloy_primitives::keccak256;
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::BTreeSet;

/// Handle for a submitted transaction.
#[derive(Clone, Debug)]
pub struct TxReceipt {
    pub tx_hash: String,
}

/// Deployment and verification bindings for the known contracts. `deploy_*`
/// resolves once the deployment transaction reaches a terminal state.
#[async_trait(?Send)]
pub trait ContractHost {
    /// Address of the account paying for deployments.
    fn operator_address(&self) -> String;

    /// Deploy a fresh facet contract and return its address.
    async fn deploy_facet(&self, kind: FacetKind) -> Result<String, String>;

    /// Deploy the diamond proxy with its constructor arguments.
    async fn deploy_diamond(
        &self,
        owner_address: &str,
        diamond_cut_address: &str,
    ) -> Result<String, String>;

    /// Publish and verify the source of a deployed contract.
    async fn verify_source(&self, contract_name: &str, address: &str) -> Result<(), String>;
}

/// The diamond's cut entrypoint: applies a batch of cuts atomically, then
/// delegatecalls the initializer when one is supplied.
#[async_trait(?Send)]
pub trait CutEntrypoint {
    async fn diamond_cut(
        &self,
        diamond_address: &str,
        cuts: &[FacetCut],
        initializer_address: &str,
        calldata: &str,
    ) -> Result<TxReceipt, String>;
}

/// Deterministic in-memory host for tests: addresses derived from contract
/// names, optional scripted failures, and a record of every deployment.
#[derive(Debug, Default)]
pub struct MockChainHost {
    fail_deploy: BTreeSet<String>,
    fail_verify: BTreeSet<String>,
    deployed: RefCell<Vec<String>>,
    verified: RefCell<Vec<String>>,
}

impl MockChainHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_deploy(mut self, contract_name: &str) -> Self {
        self.fail_deploy.insert(contract_name.to_string());
        self
    }

    pub fn failing_verify(mut self, contract_name: &str) -> Self {
        self.fail_verify.insert(contract_name.to_string());
        self
    }

    pub fn deployed_contracts(&self) -> Vec<String> {
        self.deployed.borrow().clone()
    }

    pub fn verified_contracts(&self) -> Vec<String> {
        self.verified.borrow().clone()
    }

    /// Stable fake address derived from the contract name.
    pub fn mock_address(contract_name: &str) -> String {
        let hash = keccak256(contract_name.as_bytes());
        format!("0x{}", hex::encode(&hash.as_slice()[12..32]))
    }
}

#[async_trait(?Send)]
impl ContractHost for MockChainHost {
    fn operator_address(&self) -> String {
        "0x00000000000000000000000000000000000000aa".to_string()
    }

    async fn deploy_facet(&self, kind: FacetKind) -> Result<String, String> {
        let name = kind.contract_name();
        if self.fail_deploy.contains(name) {
            return Err(format!("deployment reverted for {name}"));
        }
        self.deployed.borrow_mut().push(name.to_string());
        Ok(Self::mock_address(name))
    }

    async fn deploy_diamond(
        &self,
        _owner_address: &str,
        _diamond_cut_address: &str,
    ) -> Result<String, String> {
        if self.fail_deploy.contains("Diamond") {
            return Err("deployment reverted for Diamond".to_string());
        }
        self.deployed.borrow_mut().push("Diamond".to_string());
        Ok(Self::mock_address("Diamond"))
    }

    async fn verify_source(&self, contract_name: &str, _address: &str) -> Result<(), String> {
        if self.fail_verify.contains(contract_name) {
            return Err(format!("verification rejected for {contract_name}"));
        }
        self.verified.borrow_mut().push(contract_name.to_string());
        Ok(())
    }
}

/// One request as it reached the mock entrypoint.
#[derive(Clone, Debug)]
pub struct SubmittedCut {
    pub diamond_address: String,
    pub cuts: Vec<FacetCut>,
    pub initializer_address: String,
    pub calldata: String,
}

/// Records every submitted cut; failures can be scripted per facet address.
#[derive(Debug, Default)]
pub struct MockCutEntrypoint {
    fail_facet_addresses: BTreeSet<String>,
    submissions: RefCell<Vec<SubmittedCut>>,
}

impl MockCutEntrypoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, facet_address: &str) -> Self {
        self.fail_facet_addresses
            .insert(facet_address.to_ascii_lowercase());
        self
    }

    pub fn submissions(&self) -> Vec<SubmittedCut> {
        self.submissions.borrow().clone()
    }
}

#[async_trait(?Send)]
impl CutEntrypoint for MockCutEntrypoint {
    async fn diamond_cut(
        &self,
        diamond_address: &str,
        cuts: &[FacetCut],
        initializer_address: &str,
        calldata: &str,
    ) -> Result<TxReceipt, String> {
        if cuts
            .iter()
            .any(|cut| self.fail_facet_addresses.contains(&cut.facet_address))
        {
            return Err("diamond cut reverted".to_string());
        }
        let mut submissions = self.submissions.borrow_mut();
        submissions.push(SubmittedCut {
            diamond_address: diamond_address.to_string(),
            cuts: cuts.to_vec(),
            initializer_address: initializer_address.to_string(),
            calldata: calldata.to_string(),
        });
        Ok(TxReceipt {
            tx_hash: format!("0x{:064x}", submissions.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ContractHost, CutEntrypoint, MockChainHost, MockCutEntrypoint};
    use crate::domain::types::{CutAction, FacetCut, FacetKind};

    #[tokio::test]
    async fn mock_host_addresses_are_stable_per_contract() {
        let host = MockChainHost::new();
        let first = host
            .deploy_facet(FacetKind::Ownership)
            .await
            .expect("deploy should succeed");
        let second = host
            .deploy_facet(FacetKind::Ownership)
            .await
            .expect("deploy should succeed");
        assert_eq!(first, second);
        assert_eq!(first, MockChainHost::mock_address("OwnershipFacet"));
        assert_eq!(host.deployed_contracts().len(), 2);
    }

    #[tokio::test]
    async fn mock_entrypoint_scripts_failures_per_facet_address() {
        let entrypoint = MockCutEntrypoint::new().failing_for("0x00000000000000000000000000000000000000fa");
        let cut = FacetCut {
            facet_address: "0x00000000000000000000000000000000000000fa".to_string(),
            action: CutAction::Add,
            selectors: vec!["0x7a0ed627".to_string()],
        };
        let err = entrypoint
            .diamond_cut("0xd1", std::slice::from_ref(&cut), "0x00", "0x")
            .await
            .expect_err("scripted failure must surface");
        assert_eq!(err, "diamond cut reverted");
        assert!(entrypoint.submissions().is_empty());
    }
}
