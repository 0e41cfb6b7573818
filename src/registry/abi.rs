use crate::domain::types::normalize_address;
use crate::error::CutError;
use alloy_primitives::{keccak256, U256};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// One entry of a contract ABI, kept in declaration order.
#[derive(Clone, Debug, Deserialize)]
pub struct AbiEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(rename = "stateMutability", default)]
    pub state_mutability: Option<String>,
}

impl AbiEntry {
    pub fn is_function(&self) -> bool {
        self.entry_type == "function"
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AbiParam {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub components: Vec<AbiParam>,
}

/// Per-contract ABI entries loaded from a compiled-artifact directory.
/// Rebuilt for every resolution call; nothing is cached across runs.
#[derive(Clone, Debug, Default)]
pub struct AbiRegistry {
    abis: BTreeMap<String, Vec<AbiEntry>>,
}

impl AbiRegistry {
    pub fn from_entries(abis: BTreeMap<String, Vec<AbiEntry>>) -> Self {
        Self { abis }
    }

    /// Entries for a contract, in declaration order. Unknown contracts yield
    /// an empty slice; loading is where absence is reported.
    pub fn entries(&self, contract: &str) -> &[AbiEntry] {
        self.abis.get(contract).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Selectors of every `function` entry of a contract, in declaration order.
    pub fn function_selectors(&self, contract: &str) -> Result<Vec<String>, CutError> {
        self.entries(contract)
            .iter()
            .filter(|entry| entry.is_function())
            .map(|entry| entry_selector(contract, entry))
            .collect()
    }
}

/// Compute a function entry's selector, lifting malformed entries into the
/// artifact error for `contract`.
pub fn entry_selector(contract: &str, entry: &AbiEntry) -> Result<String, CutError> {
    function_selector(entry).map_err(|reason| CutError::MalformedArtifact {
        contract: contract.to_string(),
        reason,
    })
}

/// Load artifacts `{dir}/{Name}.json` for every requested contract name.
///
/// A missing file is `MissingArtifact`; unreadable JSON or a document without
/// an ABI section is `MalformedArtifact`.
pub fn load_project_abis<'a>(
    artifacts_dir: &Path,
    contracts: impl IntoIterator<Item = &'a str>,
) -> Result<AbiRegistry, CutError> {
    let mut abis = BTreeMap::new();
    for contract in contracts {
        if abis.contains_key(contract) {
            continue;
        }
        abis.insert(contract.to_string(), load_artifact(artifacts_dir, contract)?);
    }
    Ok(AbiRegistry::from_entries(abis))
}

fn load_artifact(artifacts_dir: &Path, contract: &str) -> Result<Vec<AbiEntry>, CutError> {
    let path = artifacts_dir.join(format!("{contract}.json"));
    if !path.is_file() {
        return Err(CutError::MissingArtifact {
            contract: contract.to_string(),
            path,
        });
    }
    let raw = std::fs::read_to_string(&path).map_err(|error| CutError::MalformedArtifact {
        contract: contract.to_string(),
        reason: format!("failed to read {}: {error}", path.display()),
    })?;
    decode_abi_entries(&raw).map_err(|reason| CutError::MalformedArtifact {
        contract: contract.to_string(),
        reason,
    })
}

/// Accepts either a bare JSON array of entries or an object carrying an `abi`
/// array; both shapes occur in compiled-artifact formats.
fn decode_abi_entries(raw: &str) -> Result<Vec<AbiEntry>, String> {
    let value: Value =
        serde_json::from_str(raw).map_err(|error| format!("invalid abi json: {error}"))?;
    let entries_value = if value.is_array() {
        value
    } else if let Some(array) = value.get("abi") {
        array.clone()
    } else {
        return Err("abi json must be an array or object containing an `abi` array".to_string());
    };
    serde_json::from_value(entries_value).map_err(|error| format!("invalid abi format: {error}"))
}

/// Canonical signature `name(type1,type2,...)` for a function entry.
pub fn canonical_signature(entry: &AbiEntry) -> Result<String, String> {
    if !entry.is_function() {
        return Err(format!(
            "cannot build a signature for abi entry of type {}",
            entry.entry_type
        ));
    }
    let name = entry
        .name
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| "function entry must include a non-empty name".to_string())?;
    let mut normalized_args = Vec::with_capacity(entry.inputs.len());
    for input in &entry.inputs {
        normalized_args.push(canonicalize_param(input)?);
    }
    Ok(format!("{name}({})", normalized_args.join(",")))
}

/// First 4 bytes of the keccak-256 hash of the signature, as 0x-prefixed hex.
pub fn selector_from_signature(signature: &str) -> String {
    let hash = keccak256(signature.as_bytes());
    format!("0x{}", hex::encode(&hash.as_slice()[..4]))
}

pub fn function_selector(entry: &AbiEntry) -> Result<String, String> {
    Ok(selector_from_signature(&canonical_signature(entry)?))
}

fn canonicalize_param(param: &AbiParam) -> Result<String, String> {
    let normalized_kind = normalize_kind(&param.kind)?;
    if let Some(suffix) = normalized_kind.strip_prefix("tuple") {
        if param.components.is_empty() {
            return Err("tuple parameter must provide components".to_string());
        }
        let mut components = Vec::with_capacity(param.components.len());
        for component in &param.components {
            components.push(canonicalize_param(component)?);
        }
        return Ok(format!("({}){suffix}", components.join(",")));
    }
    Ok(normalized_kind)
}

fn normalize_kind(raw_kind: &str) -> Result<String, String> {
    let compact = raw_kind
        .chars()
        .filter(|char| !char.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if compact.is_empty() {
        return Err("abi type must be non-empty".to_string());
    }

    if let Some(suffix) = compact.strip_prefix("tuple") {
        validate_array_suffix(suffix)?;
        return Ok(format!("tuple{suffix}"));
    }

    let (base, suffix) = split_base_and_suffix(&compact);
    validate_array_suffix(suffix)?;
    let canonical_base = match base {
        "uint" => "uint256".to_string(),
        "int" => "int256".to_string(),
        _ => base.to_string(),
    };
    if canonical_base.is_empty() {
        return Err("abi type base must be non-empty".to_string());
    }
    Ok(format!("{canonical_base}{suffix}"))
}

fn split_base_and_suffix(kind: &str) -> (&str, &str) {
    if let Some(start) = kind.find('[') {
        (&kind[..start], &kind[start..])
    } else {
        (kind, "")
    }
}

fn validate_array_suffix(raw_suffix: &str) -> Result<(), String> {
    if raw_suffix.is_empty() {
        return Ok(());
    }
    let bytes = raw_suffix.as_bytes();
    let mut index = 0usize;
    while index < bytes.len() {
        if bytes[index] != b'[' {
            return Err(format!("invalid array suffix in abi type: {raw_suffix}"));
        }
        index = index.saturating_add(1);
        while index < bytes.len() && bytes[index].is_ascii_digit() {
            index = index.saturating_add(1);
        }
        if index >= bytes.len() || bytes[index] != b']' {
            return Err(format!("invalid array suffix in abi type: {raw_suffix}"));
        }
        index = index.saturating_add(1);
    }
    Ok(())
}

// ── Initializer calldata ─────────────────────────────────────────────────────

/// Encode a static-argument call: 4-byte selector followed by one 32-byte
/// word per argument. Covers the primitive kinds registered initializers
/// use: `address`, `bool`, `uint*`/`int*` (non-negative), `bytes1..32`.
pub fn encode_call(name: &str, input_kinds: &[&str], args: &[String]) -> Result<String, String> {
    if args.len() != input_kinds.len() {
        return Err(format!(
            "argument count mismatch for {name}: expected {} got {}",
            input_kinds.len(),
            args.len()
        ));
    }
    let signature = format!("{name}({})", input_kinds.join(","));
    let mut data = selector_from_signature(&signature);
    for (kind, arg) in input_kinds.iter().zip(args.iter()) {
        data.push_str(&hex::encode(encode_primitive_word(kind, arg)?));
    }
    Ok(data)
}

fn encode_primitive_word(kind: &str, raw: &str) -> Result<[u8; 32], String> {
    let mut word = [0u8; 32];
    match kind {
        "address" => {
            let normalized = normalize_address(raw)?;
            let bytes = hex::decode(normalized.trim_start_matches("0x"))
                .map_err(|error| format!("failed to decode address argument: {error}"))?;
            word[12..].copy_from_slice(&bytes);
        }
        "bool" => {
            word[31] = match raw.trim() {
                "true" | "1" => 1,
                "false" | "0" => 0,
                other => return Err(format!("bool argument must be true/false, got {other}")),
            };
        }
        _ if kind.starts_with("uint") || kind.starts_with("int") => {
            let parsed = parse_u256_from_decimal_or_hex(raw, kind)?;
            word.copy_from_slice(&parsed.to_be_bytes::<32>());
        }
        _ if kind.starts_with("bytes") => {
            let width = kind
                .trim_start_matches("bytes")
                .parse::<usize>()
                .map_err(|_error| format!("unsupported abi type: {kind}"))?;
            if !(1..=32).contains(&width) {
                return Err(format!("fixed bytes width must be in 1..=32, got {width}"));
            }
            let normalized = raw.trim().to_ascii_lowercase();
            let digits = normalized
                .strip_prefix("0x")
                .ok_or_else(|| format!("{kind} argument must be 0x-prefixed hex"))?;
            let bytes = hex::decode(digits)
                .map_err(|error| format!("failed to decode {kind} argument: {error}"))?;
            if bytes.len() > width {
                return Err(format!("{kind} argument exceeds {width} bytes"));
            }
            word[..bytes.len()].copy_from_slice(&bytes);
        }
        other => return Err(format!("unsupported initializer argument type: {other}")),
    }
    Ok(word)
}

fn parse_u256_from_decimal_or_hex(raw: &str, field: &str) -> Result<U256, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} argument cannot be empty"));
    }
    if let Some(hex_digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex_digits.is_empty() {
            return Ok(U256::ZERO);
        }
        if !hex_digits
            .as_bytes()
            .iter()
            .all(|byte| byte.is_ascii_hexdigit())
        {
            return Err(format!("{field} argument must be valid hex"));
        }
        return U256::from_str_radix(hex_digits, 16)
            .map_err(|error| format!("failed to parse {field} argument as hex: {error}"));
    }
    if !trimmed.as_bytes().iter().all(|byte| byte.is_ascii_digit()) {
        return Err(format!(
            "{field} argument must be a decimal string or hex quantity"
        ));
    }
    U256::from_str(trimmed).map_err(|error| format!("failed to parse {field} argument: {error}"))
}

#[cfg(test)]
mod tests {
    use super::{
        canonical_signature, encode_call, function_selector, load_project_abis,
        selector_from_signature, AbiEntry, AbiParam,
    };
    use crate::error::CutError;

    fn function_entry(name: &str, input_kinds: &[&str]) -> AbiEntry {
        AbiEntry {
            entry_type: "function".to_string(),
            name: Some(name.to_string()),
            inputs: input_kinds
                .iter()
                .map(|kind| AbiParam {
                    kind: kind.to_string(),
                    components: Vec::new(),
                })
                .collect(),
            state_mutability: Some("nonpayable".to_string()),
        }
    }

    #[test]
    fn selector_matches_known_transfer_vector() {
        assert_eq!(
            selector_from_signature("transfer(address,uint256)"),
            "0xa9059cbb"
        );
    }

    #[test]
    fn canonical_signature_widens_uint_and_int() {
        let entry = function_entry("transfer", &["address", "uint"]);
        assert_eq!(
            canonical_signature(&entry).expect("signature should normalize"),
            "transfer(address,uint256)"
        );
        assert_eq!(
            function_selector(&entry).expect("selector should compute"),
            "0xa9059cbb"
        );
    }

    #[test]
    fn canonical_signature_renders_tuple_arrays() {
        let cut_param = AbiParam {
            kind: "tuple[]".to_string(),
            components: vec![
                AbiParam {
                    kind: "address".to_string(),
                    components: Vec::new(),
                },
                AbiParam {
                    kind: "uint8".to_string(),
                    components: Vec::new(),
                },
                AbiParam {
                    kind: "bytes4[]".to_string(),
                    components: Vec::new(),
                },
            ],
        };
        let entry = AbiEntry {
            entry_type: "function".to_string(),
            name: Some("diamondCut".to_string()),
            inputs: vec![
                cut_param,
                AbiParam {
                    kind: "address".to_string(),
                    components: Vec::new(),
                },
                AbiParam {
                    kind: "bytes".to_string(),
                    components: Vec::new(),
                },
            ],
            state_mutability: Some("nonpayable".to_string()),
        };
        assert_eq!(
            canonical_signature(&entry).expect("signature should normalize"),
            "diamondCut((address,uint8,bytes4[])[],address,bytes)"
        );
        assert_eq!(
            function_selector(&entry).expect("selector should compute"),
            "0x1f931c1c"
        );
    }

    #[test]
    fn canonical_signature_rejects_nameless_functions() {
        let mut entry = function_entry("owner", &[]);
        entry.name = Some("  ".to_string());
        let err = canonical_signature(&entry).expect_err("blank name must fail");
        assert!(
            err.contains("non-empty name"),
            "expected name validation error but got {err}"
        );
    }

    #[test]
    fn load_project_abis_reports_a_missing_artifact() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        std::fs::write(
            dir.path().join("OwnershipFacet.json"),
            r#"{"abi":[{"type":"function","name":"owner","inputs":[],"stateMutability":"view"}]}"#,
        )
        .expect("artifact should write");

        let err = load_project_abis(dir.path(), ["OwnershipFacet", "DiamondLoupeFacet"])
            .expect_err("absent artifact must fail");
        match err {
            CutError::MissingArtifact { contract, .. } => {
                assert_eq!(contract, "DiamondLoupeFacet");
            }
            other => panic!("expected MissingArtifact but got {other:?}"),
        }
    }

    #[test]
    fn load_project_abis_reports_a_document_without_an_abi_section() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        std::fs::write(
            dir.path().join("OwnershipFacet.json"),
            r#"{"bytecode":"0x00"}"#,
        )
        .expect("artifact should write");

        let err = load_project_abis(dir.path(), ["OwnershipFacet"])
            .expect_err("artifact without abi must fail");
        match err {
            CutError::MalformedArtifact { contract, reason } => {
                assert_eq!(contract, "OwnershipFacet");
                assert!(reason.contains("`abi`"), "unexpected reason: {reason}");
            }
            other => panic!("expected MalformedArtifact but got {other:?}"),
        }
    }

    #[test]
    fn load_project_abis_preserves_declaration_order() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        std::fs::write(
            dir.path().join("DiamondLoupeFacet.json"),
            r#"[
                {"type":"function","name":"facets","inputs":[],"stateMutability":"view"},
                {"type":"event","name":"Probe","inputs":[]},
                {"type":"function","name":"facetAddress","inputs":[{"type":"bytes4"}],"stateMutability":"view"}
            ]"#,
        )
        .expect("artifact should write");

        let registry = load_project_abis(dir.path(), ["DiamondLoupeFacet"])
            .expect("artifact should load");
        let selectors = registry
            .function_selectors("DiamondLoupeFacet")
            .expect("selectors should compute");
        assert_eq!(selectors, vec!["0x7a0ed627", "0xcdffacc6"]);
    }

    #[test]
    fn encode_call_packs_selector_and_static_words() {
        let data = encode_call(
            "init",
            &["address", "uint256", "address"],
            &[
                "0x1111111111111111111111111111111111111111".to_string(),
                "7".to_string(),
                "0x2222222222222222222222222222222222222222".to_string(),
            ],
        )
        .expect("initializer should encode");

        let expected_selector = selector_from_signature("init(address,uint256,address)");
        assert!(data.starts_with(&expected_selector));
        assert_eq!(data.len(), 2 + 8 + 64 * 3);
        assert_eq!(
            &data[10..74],
            format!("{:0>64}", "1111111111111111111111111111111111111111")
        );
        assert_eq!(&data[74..138], format!("{:064x}", 7));
    }

    #[test]
    fn encode_call_rejects_argument_count_mismatch() {
        let err = encode_call("init", &["address", "uint256"], &["0x00".to_string()])
            .expect_err("argument mismatch must fail");
        assert!(
            err.contains("argument count mismatch"),
            "expected count mismatch error but got {err}"
        );
    }
}
