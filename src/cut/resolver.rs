use crate::domain::types::{normalize_selector_hex, FacetKind, FeatureDefinition};
use crate::error::CutError;
use crate::registry::abi::{entry_selector, AbiRegistry};
use std::collections::BTreeSet;

/// Deny/allow lists applied to one cut. A non-empty `methods` or `selectors`
/// switches the resolver into inclusion mode, where the allow-lists alone
/// decide membership and the deny-lists are ignored.
#[derive(Clone, Debug, Default)]
pub struct SelectorFilters {
    pub ignore_methods: Vec<String>,
    pub ignore_selectors: Vec<String>,
    pub methods: Vec<String>,
    pub selectors: Vec<String>,
}

/// Resolve the ordered selector list `facet` contributes to one cut.
///
/// Walks `precedence` in order, reserving every function selector of each
/// facet strictly before `facet`'s position. At `facet`'s position the active
/// feature's ignore rules are folded into the reserved set and the walk
/// stops; a facet that never appears in the list leaves the whole list
/// reserved. In default mode a function is selected when its name clears
/// `ignore_methods` and its selector clears both the reserved set and
/// `ignore_selectors`; in inclusion mode a function is selected when its name
/// is in `methods` or its selector is in `selectors`. Output preserves ABI
/// declaration order.
pub fn resolve_selectors(
    registry: &AbiRegistry,
    precedence: &[FacetKind],
    facet: FacetKind,
    feature_ignores: Option<&FeatureDefinition>,
    filters: &SelectorFilters,
) -> Result<Vec<String>, CutError> {
    let contract = facet.contract_name();

    let mut reserved: BTreeSet<String> = BTreeSet::new();
    for member in precedence {
        if *member == facet {
            if let Some(definition) = feature_ignores {
                for entry in registry.entries(contract) {
                    if !entry.is_function() {
                        continue;
                    }
                    let name = entry.name.as_deref().unwrap_or_default();
                    if definition.ignore_methods.contains(name) {
                        reserved.insert(entry_selector(contract, entry)?);
                    }
                }
                for selector in &definition.ignore_selectors {
                    reserved.insert(normalized_selector(selector)?);
                }
            }
            break;
        }
        for selector in registry.function_selectors(member.contract_name())? {
            reserved.insert(selector);
        }
    }

    let inclusion_mode = !filters.methods.is_empty() || !filters.selectors.is_empty();
    let allow_selectors = normalized_selector_set(&filters.selectors)?;
    let deny_selectors = normalized_selector_set(&filters.ignore_selectors)?;

    let mut resolved = Vec::new();
    for entry in registry.entries(contract) {
        if !entry.is_function() {
            continue;
        }
        let selector = entry_selector(contract, entry)?;
        let name = entry.name.as_deref().unwrap_or_default();
        let selected = if inclusion_mode {
            filters.methods.iter().any(|method| method == name)
                || allow_selectors.contains(&selector)
        } else {
            !filters.ignore_methods.iter().any(|method| method == name)
                && !reserved.contains(&selector)
                && !deny_selectors.contains(&selector)
        };
        if selected {
            resolved.push(selector);
        }
    }
    Ok(resolved)
}

fn normalized_selector(raw: &str) -> Result<String, CutError> {
    normalize_selector_hex(raw).map_err(|reason| CutError::InvalidSelector {
        value: raw.to_string(),
        reason,
    })
}

fn normalized_selector_set(raws: &[String]) -> Result<BTreeSet<String>, CutError> {
    raws.iter()
        .map(|raw| normalized_selector(raw))
        .collect()
}
