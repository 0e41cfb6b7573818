/// Deployment orchestration: walk the stage machine strictly in sequence,
/// deploying and attaching facets, and accumulate a partial result when a
/// stage fails. The first failing stage halts the run; nothing deployed
/// before it is rolled back.
use crate::chain::{ContractHost, CutEntrypoint};
use crate::cut::executor::{facet_cut, CutRequest};
use crate::domain::state_machine::{next_stage, DeployStage};
use crate::domain::types::{DeploymentResult, FacetKind, Feature};
use crate::error::StageError;
use crate::registry::features::DiamondConfig;

const DIAMOND_CONTRACT: &str = "Diamond";

/// A feature facet to mount after the foundational attachments.
#[derive(Clone, Debug)]
pub struct FeatureMount {
    pub feature: Feature,
    /// Pre-existing facet address; applies when the feature mounts a single
    /// facet. `None` deploys fresh.
    pub facet_address: Option<String>,
    pub initializer_args: Vec<String>,
}

impl FeatureMount {
    /// Inventory mount: the terminus pool gates administrative access, the
    /// subject contract is the ERC721 the inventory modifies.
    pub fn inventory(
        admin_terminus_address: &str,
        admin_terminus_pool_id: u64,
        subject_erc721_address: &str,
    ) -> Self {
        Self {
            feature: Feature::Inventory,
            facet_address: None,
            initializer_args: vec![
                admin_terminus_address.to_string(),
                admin_terminus_pool_id.to_string(),
                subject_erc721_address.to_string(),
            ],
        }
    }
}

/// Inputs for one orchestration run. A pre-existing address skips the
/// corresponding deploy stage and is recorded as supplied.
#[derive(Clone, Debug, Default)]
pub struct DeploymentPlan {
    /// Owner handed to the diamond constructor; defaults to the host's
    /// operator address.
    pub owner_address: Option<String>,
    pub diamond_cut_address: Option<String>,
    pub diamond_address: Option<String>,
    pub diamond_loupe_address: Option<String>,
    pub ownership_address: Option<String>,
    pub feature: Option<FeatureMount>,
    pub verify_sources: bool,
}

/// Run one deployment to completion or to its first failing stage.
///
/// Never returns an error: failures are recorded on the result's `error`
/// field and the partial result reflects exactly the work completed before
/// the failure.
pub async fn deploy(
    host: &dyn ContractHost,
    entrypoint: &dyn CutEntrypoint,
    config: &DiamondConfig,
    plan: &DeploymentPlan,
) -> DeploymentResult {
    let mut result = DeploymentResult::default();
    let feature_requested = plan.feature.is_some();
    tracing::info!(
        feature = feature_requested,
        verify = plan.verify_sources,
        "deployment run starting"
    );

    let mut stage = DeployStage::DeployCutFacet;
    while stage != DeployStage::Done {
        if let Err(failure) = run_stage(stage, host, entrypoint, config, plan, &mut result).await {
            tracing::error!(stage = ?stage, error = %failure, "deployment run halted");
            result.error = Some(failure.to_string());
            return result;
        }
        stage = next_stage(stage, feature_requested, plan.verify_sources);
    }

    if plan.verify_sources {
        result.verified_diamond_facets = Some(true);
    }
    tracing::info!(
        contracts = result.contracts.len(),
        attached = result.attached.len(),
        "deployment run complete"
    );
    result
}

async fn run_stage(
    stage: DeployStage,
    host: &dyn ContractHost,
    entrypoint: &dyn CutEntrypoint,
    config: &DiamondConfig,
    plan: &DeploymentPlan,
    result: &mut DeploymentResult,
) -> Result<(), StageError> {
    match stage {
        DeployStage::DeployCutFacet => {
            deploy_facet_stage(
                host,
                FacetKind::DiamondCut,
                plan.diamond_cut_address.as_deref(),
                result,
            )
            .await
        }
        DeployStage::DeployDiamond => deploy_diamond_stage(host, plan, result).await,
        DeployStage::DeployLoupeFacet => {
            deploy_facet_stage(
                host,
                FacetKind::DiamondLoupe,
                plan.diamond_loupe_address.as_deref(),
                result,
            )
            .await
        }
        DeployStage::DeployOwnershipFacet => {
            deploy_facet_stage(
                host,
                FacetKind::Ownership,
                plan.ownership_address.as_deref(),
                result,
            )
            .await
        }
        DeployStage::AttachLoupe => {
            attach_stage(entrypoint, config, FacetKind::DiamondLoupe, None, result).await
        }
        DeployStage::AttachOwnership => {
            attach_stage(entrypoint, config, FacetKind::Ownership, None, result).await
        }
        DeployStage::DeployFeatureFacet => match plan.feature.as_ref() {
            Some(mount) => deploy_feature_stage(host, config, mount, result).await,
            None => Ok(()),
        },
        DeployStage::AttachFeatureFacet => match plan.feature.as_ref() {
            Some(mount) => attach_feature_stage(entrypoint, config, mount, result).await,
            None => Ok(()),
        },
        DeployStage::VerifySources => verify_stage(host, result).await,
        DeployStage::Done => Ok(()),
    }
}

async fn deploy_facet_stage(
    host: &dyn ContractHost,
    kind: FacetKind,
    supplied: Option<&str>,
    result: &mut DeploymentResult,
) -> Result<(), StageError> {
    let name = kind.contract_name();
    let address = match supplied {
        Some(address) => address.to_string(),
        None => host.deploy_facet(kind).await.map_err(|error| {
            tracing::error!(contract = name, error = error.as_str(), "facet deployment failed");
            StageError::Deployment(name.to_string())
        })?,
    };
    result.contracts.insert(name.to_string(), address);
    Ok(())
}

async fn deploy_diamond_stage(
    host: &dyn ContractHost,
    plan: &DeploymentPlan,
    result: &mut DeploymentResult,
) -> Result<(), StageError> {
    let address = match plan.diamond_address.as_deref() {
        Some(address) => address.to_string(),
        None => {
            let owner = plan
                .owner_address
                .clone()
                .unwrap_or_else(|| host.operator_address());
            let cut_facet = result
                .contracts
                .get(FacetKind::DiamondCut.contract_name())
                .cloned()
                .ok_or_else(|| StageError::Deployment(DIAMOND_CONTRACT.to_string()))?;
            host.deploy_diamond(&owner, &cut_facet).await.map_err(|error| {
                tracing::error!(error = error.as_str(), "diamond deployment failed");
                StageError::Deployment(DIAMOND_CONTRACT.to_string())
            })?
        }
    };
    result.contracts.insert(DIAMOND_CONTRACT.to_string(), address);
    Ok(())
}

async fn deploy_feature_stage(
    host: &dyn ContractHost,
    config: &DiamondConfig,
    mount: &FeatureMount,
    result: &mut DeploymentResult,
) -> Result<(), StageError> {
    let Some(definition) = config.features.definition(mount.feature) else {
        return Err(StageError::Deployment(format!(
            "{} feature",
            mount.feature.name()
        )));
    };
    let single_facet = definition.extra_facets.len() == 1;
    for kind in definition.extra_facets.clone() {
        let supplied = if single_facet {
            mount.facet_address.as_deref()
        } else {
            None
        };
        deploy_facet_stage(host, kind, supplied, result).await?;
    }
    Ok(())
}

async fn attach_stage(
    entrypoint: &dyn CutEntrypoint,
    config: &DiamondConfig,
    facet: FacetKind,
    mount: Option<&FeatureMount>,
    result: &mut DeploymentResult,
) -> Result<(), StageError> {
    let name = facet.contract_name();
    let diamond_address = result
        .contracts
        .get(DIAMOND_CONTRACT)
        .cloned()
        .ok_or_else(|| StageError::Attachment(name.to_string()))?;
    let facet_address = result
        .contracts
        .get(name)
        .cloned()
        .ok_or_else(|| StageError::Attachment(name.to_string()))?;

    let mut request = CutRequest::new(&diamond_address, name, &facet_address, "add");
    if let Some(mount) = mount {
        request.feature = Some(mount.feature);
        request.initializer_address = facet_address.clone();
        request.initializer_args = mount.initializer_args.clone();
    }

    match facet_cut(entrypoint, config, &request).await {
        Ok(receipt) => {
            tracing::info!(facet = name, tx_hash = receipt.tx_hash.as_str(), "facet attached");
            result.attached.push(name.to_string());
            Ok(())
        }
        Err(error) => {
            tracing::error!(facet = name, error = %error, "facet attachment failed");
            Err(StageError::Attachment(name.to_string()))
        }
    }
}

async fn attach_feature_stage(
    entrypoint: &dyn CutEntrypoint,
    config: &DiamondConfig,
    mount: &FeatureMount,
    result: &mut DeploymentResult,
) -> Result<(), StageError> {
    let Some(definition) = config.features.definition(mount.feature) else {
        return Err(StageError::Attachment(format!(
            "{} feature",
            mount.feature.name()
        )));
    };
    for kind in definition.extra_facets.clone() {
        attach_stage(entrypoint, config, kind, Some(mount), result).await?;
    }
    Ok(())
}

async fn verify_stage(
    host: &dyn ContractHost,
    result: &mut DeploymentResult,
) -> Result<(), StageError> {
    for (contract, address) in &result.contracts {
        if let Err(error) = host.verify_source(contract, address).await {
            tracing::error!(
                contract = contract.as_str(),
                error = error.as_str(),
                "source verification failed"
            );
            return Err(StageError::Verification);
        }
    }
    Ok(())
}
