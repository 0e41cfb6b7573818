use crate::chain::{CutEntrypoint, TxReceipt};
use crate::cut::resolver::{resolve_selectors, SelectorFilters};
use crate::domain::types::{
    normalize_address, CutAction, FacetCut, FacetKind, Feature, ZERO_ADDRESS,
};
use crate::error::CutError;
use crate::registry::abi;
use crate::registry::features::DiamondConfig;

/// One raw facet-cut request as supplied by the trigger surface.
#[derive(Clone, Debug)]
pub struct CutRequest {
    pub diamond_address: String,
    pub facet_name: String,
    pub facet_address: String,
    pub action: String,
    pub initializer_address: String,
    pub initializer_args: Vec<String>,
    pub feature: Option<Feature>,
    pub filters: SelectorFilters,
}

impl CutRequest {
    pub fn new(diamond_address: &str, facet_name: &str, facet_address: &str, action: &str) -> Self {
        Self {
            diamond_address: diamond_address.to_string(),
            facet_name: facet_name.to_string(),
            facet_address: facet_address.to_string(),
            action: action.to_string(),
            initializer_address: ZERO_ADDRESS.to_string(),
            initializer_args: Vec::new(),
            feature: None,
            filters: SelectorFilters::default(),
        }
    }
}

/// Resolve, assemble, and submit one diamond cut as a single batch.
///
/// Precondition failures (unknown facet, unknown action) are returned before
/// any artifact I/O or chain interaction. A remove always targets the zero
/// address regardless of the supplied facet address. Entrypoint failures
/// propagate unmodified; there is no retry.
pub async fn facet_cut(
    entrypoint: &dyn CutEntrypoint,
    config: &DiamondConfig,
    request: &CutRequest,
) -> Result<TxReceipt, CutError> {
    let facet = FacetKind::from_contract_name(&request.facet_name)?;
    let action = CutAction::parse(&request.action)?;

    let feature_definition = request
        .feature
        .map(|feature| {
            config
                .features
                .definition(feature)
                .ok_or_else(|| CutError::UnknownFeature {
                    feature: feature.name().to_string(),
                })
        })
        .transpose()?;
    let mut precedence = config.base_precedence.clone();
    if let Some(definition) = feature_definition {
        precedence.extend(definition.extra_facets.iter().copied());
    }

    let mut contract_names: Vec<&str> = precedence
        .iter()
        .map(|member| member.contract_name())
        .collect();
    if !precedence.contains(&facet) {
        contract_names.push(facet.contract_name());
    }
    let registry = abi::load_project_abis(&config.artifacts_dir, contract_names)?;

    let selectors = resolve_selectors(
        &registry,
        &precedence,
        facet,
        feature_definition,
        &request.filters,
    )?;
    if selectors.is_empty() && action != CutAction::Remove {
        return Err(CutError::EmptySelectors {
            facet: request.facet_name.clone(),
        });
    }

    // Removed functions no longer point at any implementation.
    let target_address = if action == CutAction::Remove {
        ZERO_ADDRESS.to_string()
    } else {
        checked_address(&request.facet_address, "facet")?
    };
    let diamond_address = checked_address(&request.diamond_address, "diamond")?;
    let initializer_address = checked_address(&request.initializer_address, "initializer")?;

    let calldata = match facet.initializer_abi() {
        Some(init) => abi::encode_call(init.name, init.input_kinds, &request.initializer_args)
            .map_err(|reason| CutError::InvalidInitializerArgs {
                facet: request.facet_name.clone(),
                reason,
            })?,
        None => "0x".to_string(),
    };

    let cut = FacetCut {
        facet_address: target_address,
        action,
        selectors,
    };
    tracing::info!(
        facet = request.facet_name.as_str(),
        action = ?action,
        selector_count = cut.selectors.len(),
        "submitting diamond cut"
    );
    entrypoint
        .diamond_cut(
            &diamond_address,
            std::slice::from_ref(&cut),
            &initializer_address,
            &calldata,
        )
        .await
        .map_err(CutError::Submission)
}

fn checked_address(raw: &str, field: &str) -> Result<String, CutError> {
    normalize_address(raw).map_err(|reason| CutError::InvalidAddress {
        field: field.to_string(),
        reason,
    })
}
