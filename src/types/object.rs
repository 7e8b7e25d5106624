//! Typed decoding of object query results.
//!
//! The ledger returns objects as JSON field maps. Everything the orchestrator reads goes through
//! [`LedgerObject::decode`], which dispatches on the Move type and fails on the first missing or
//! mistyped field instead of handing untyped values further in.

use super::{
    Address, BalanceWrapper, ConditionalMarket, Escrow, EscrowReceiptRecord, ObjectDigest,
    ObjectId, ObjectRef, Proposal, ProposalState, SharedObject,
};
use crate::{
    constants::{
        BALANCE_WRAPPER_STRUCT, CONDITIONAL_MARKET_STRUCT, ESCROW_RECEIPT_STRUCT,
        MARKET_ESCROW_STRUCT, MAX_OUTCOMES, MODULE_AMM, MODULE_BALANCE, MODULE_COIN_ESCROW,
        MODULE_ESCROW, MODULE_PROPOSAL, OUTCOME_ESCROW_STRUCT, PROPOSAL_STRUCT,
    },
    error::ObjectDecodeError,
    transaction::ObjectHandle,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Response of a single object query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectResponse {
    /// The object, if it exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ObjectData>,
    /// Error reported by the ledger, e.g. `notExists`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ObjectResponse {
    /// Returns the object data, or [`ObjectDecodeError::NotFound`].
    pub fn into_data(self, object_id: ObjectId) -> Result<ObjectData, ObjectDecodeError> {
        self.data.ok_or(ObjectDecodeError::NotFound { object_id })
    }
}

/// Options for an object query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDataOptions {
    /// Include the Move type.
    pub show_type: bool,
    /// Include the owner.
    pub show_owner: bool,
    /// Include the field map.
    pub show_content: bool,
}

impl Default for ObjectDataOptions {
    fn default() -> Self {
        Self { show_type: true, show_owner: true, show_content: true }
    }
}

/// One object version as returned by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    /// The object id.
    pub object_id: ObjectId,
    /// The object version.
    #[serde(with = "crate::serde::string_u64")]
    pub version: u64,
    /// The object digest.
    pub digest: ObjectDigest,
    /// The fully qualified Move type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// The owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    /// The field map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ObjectContent>,
}

impl ObjectData {
    /// The reference to this version.
    pub const fn object_ref(&self) -> ObjectRef {
        ObjectRef { id: self.object_id, version: self.version, digest: self.digest }
    }

    /// The object as a shared input. Fails unless the owner is `Shared`.
    pub fn shared_object(&self) -> Result<SharedObject, ObjectDecodeError> {
        match self.owner {
            Some(Owner::Shared { initial_shared_version }) => {
                Ok(SharedObject { id: self.object_id, initial_shared_version })
            }
            ref other => Err(ObjectDecodeError::InvalidField {
                object_id: self.object_id,
                field: "owner",
                reason: format!("expected a shared object, got {other:?}"),
            }),
        }
    }

    /// The market escrow of conditional tokens as a shared input.
    pub fn market_escrow(&self) -> Result<SharedObject, ObjectDecodeError> {
        self.expect_type(MODULE_COIN_ESCROW, MARKET_ESCROW_STRUCT)?;
        self.shared_object()
    }

    /// The Move type, parsed.
    pub fn move_type(&self) -> Result<MoveType, ObjectDecodeError> {
        let raw = match (&self.type_, &self.content) {
            (Some(ty), _) | (None, Some(ObjectContent::MoveObject { type_: ty, .. })) => ty,
            _ => return Err(ObjectDecodeError::MissingContent { object_id: self.object_id }),
        };
        raw.parse().map_err(|reason| ObjectDecodeError::InvalidField {
            object_id: self.object_id,
            field: "type",
            reason,
        })
    }

    fn fields(&self) -> Result<Fields<'_>, ObjectDecodeError> {
        match &self.content {
            Some(ObjectContent::MoveObject { fields, .. }) => {
                Ok(Fields { object_id: self.object_id, fields })
            }
            _ => Err(ObjectDecodeError::MissingContent { object_id: self.object_id }),
        }
    }

    fn expect_type(&self, module: &str, name: &'static str) -> Result<MoveType, ObjectDecodeError> {
        let ty = self.move_type()?;
        if ty.module != module || ty.name != name {
            return Err(ObjectDecodeError::UnexpectedType {
                object_id: self.object_id,
                expected: name,
                got: ty.to_string(),
            });
        }
        Ok(ty)
    }
}

/// Owner of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    /// Owned by an account.
    AddressOwner(Address),
    /// Owned by another object.
    ObjectOwner(Address),
    /// Shared.
    Shared {
        /// Version at which the object became shared.
        initial_shared_version: u64,
    },
    /// Frozen.
    Immutable,
}

/// Content of an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "dataType", rename_all = "camelCase")]
pub enum ObjectContent {
    /// A Move struct.
    MoveObject {
        /// The fully qualified Move type.
        #[serde(rename = "type")]
        type_: String,
        /// Whether the object has `store`.
        #[serde(rename = "hasPublicTransfer", default)]
        has_public_transfer: bool,
        /// Field map.
        fields: Map<String, Value>,
    },
    /// A package.
    Package {
        /// Disassembled modules.
        #[serde(default)]
        disassembled: Value,
    },
}

/// A parsed Move struct type, e.g. `0x2::coin::Coin<0x2::sui::SUI>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveType {
    /// Defining package.
    pub address: ObjectId,
    /// Module name.
    pub module: String,
    /// Struct name.
    pub name: String,
    /// Type parameters, as written.
    pub type_params: Vec<String>,
}

impl FromStr for MoveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, params) = match s.find('<') {
            Some(open) => {
                let inner = s[open + 1..]
                    .strip_suffix('>')
                    .ok_or_else(|| format!("unbalanced type parameters in {s:?}"))?;
                (&s[..open], split_type_params(inner))
            }
            None => (s, Vec::new()),
        };
        let mut parts = head.split("::");
        let (Some(address), Some(module), Some(name), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("{s:?} is not a struct type"));
        };
        Ok(Self {
            address: address.parse().map_err(|err| format!("{err}"))?,
            module: module.to_string(),
            name: name.to_string(),
            type_params: params,
        })
    }
}

impl std::fmt::Display for MoveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if !self.type_params.is_empty() {
            write!(f, "<{}>", self.type_params.join(", "))?;
        }
        Ok(())
    }
}

/// Splits on top-level commas only, so nested generics stay intact.
fn split_type_params(inner: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(inner[start..idx].trim().to_string());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        params.push(last.to_string());
    }
    params
}

struct Fields<'a> {
    object_id: ObjectId,
    fields: &'a Map<String, Value>,
}

impl Fields<'_> {
    fn get(&self, field: &'static str) -> Result<&Value, ObjectDecodeError> {
        self.fields
            .get(field)
            .ok_or(ObjectDecodeError::MissingField { object_id: self.object_id, field })
    }

    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> ObjectDecodeError {
        ObjectDecodeError::InvalidField { object_id: self.object_id, field, reason: reason.into() }
    }

    fn u64(&self, field: &'static str) -> Result<u64, ObjectDecodeError> {
        let value = self.get(field)?;
        value_u64(value).ok_or_else(|| self.invalid(field, format!("expected u64, got {value}")))
    }

    fn u8(&self, field: &'static str) -> Result<u8, ObjectDecodeError> {
        let value = self.u64(field)?;
        u8::try_from(value).map_err(|_| self.invalid(field, format!("{value} does not fit u8")))
    }

    fn outcome_count(&self, field: &'static str) -> Result<u16, ObjectDecodeError> {
        let value = self.u64(field)?;
        u16::try_from(value)
            .ok()
            .filter(|count| *count <= MAX_OUTCOMES)
            .ok_or_else(|| self.invalid(field, format!("{value} exceeds {MAX_OUTCOMES} outcomes")))
    }

    fn option_u8(&self, field: &'static str) -> Result<Option<u8>, ObjectDecodeError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.u8(field).map(Some),
        }
    }

    fn id(&self, field: &'static str) -> Result<ObjectId, ObjectDecodeError> {
        let value = self.get(field)?;
        let raw = match value {
            Value::String(s) => s.as_str(),
            // `UID` renders as `{ "id": "0x.." }`.
            Value::Object(map) => map.get("id").and_then(Value::as_str).unwrap_or_default(),
            _ => "",
        };
        raw.parse().map_err(|err| self.invalid(field, format!("{err}")))
    }

    fn address(&self, field: &'static str) -> Result<Address, ObjectDecodeError> {
        self.id(field).map(|id| Address(id.0))
    }

    fn array(&self, field: &'static str) -> Result<&[Value], ObjectDecodeError> {
        match self.get(field)? {
            Value::Array(values) => Ok(values),
            other => Err(self.invalid(field, format!("expected vector, got {other}"))),
        }
    }

    fn u64_vec(&self, field: &'static str) -> Result<Vec<u64>, ObjectDecodeError> {
        self.array(field)?
            .iter()
            .map(|v| value_u64(v).ok_or_else(|| self.invalid(field, format!("bad entry {v}"))))
            .collect()
    }

    fn id_vec(&self, field: &'static str) -> Result<Vec<ObjectId>, ObjectDecodeError> {
        self.array(field)?
            .iter()
            .map(|v| {
                v.as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| self.invalid(field, format!("bad entry {v}")))
            })
            .collect()
    }

    fn string_vec_or_empty(&self, field: &'static str) -> Result<Vec<String>, ObjectDecodeError> {
        if !self.fields.contains_key(field) {
            return Ok(Vec::new());
        }
        self.array(field)?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(field, format!("bad entry {v}")))
            })
            .collect()
    }
}

/// Reads a `u64` from either a decimal string or a JSON number.
fn value_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// A proposal together with what is needed to pass it to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalObject {
    /// The shared proposal object.
    pub object: SharedObject,
    /// The decoded proposal.
    pub proposal: Proposal,
    /// Spot asset type parameter.
    pub asset_type: String,
    /// Spot stable type parameter.
    pub stable_type: String,
}

impl ProposalObject {
    /// Decodes a `proposal::Proposal<Asset, Stable>`.
    pub fn decode(data: &ObjectData) -> Result<Self, ObjectDecodeError> {
        let ty = data.expect_type(MODULE_PROPOSAL, PROPOSAL_STRUCT)?;
        let [asset_type, stable_type]: [String; 2] =
            ty.type_params.try_into().map_err(|params: Vec<String>| {
                ObjectDecodeError::InvalidField {
                    object_id: data.object_id,
                    field: "type",
                    reason: format!("expected 2 type parameters, got {}", params.len()),
                }
            })?;
        let fields = data.fields()?;
        let tag = fields.u8("state")?;
        let state = ProposalState::from_tag(tag)
            .ok_or_else(|| fields.invalid("state", format!("unknown state {tag}")))?;
        let proposal = Proposal {
            id: data.object_id,
            market_id: fields.id("escrow_id")?,
            outcome_count: fields.outcome_count("outcome_count")?,
            state,
            winning_outcome: fields.option_u8("winning_outcome")?,
            outcome_labels: fields.string_vec_or_empty("outcome_messages")?,
        };
        Ok(Self { object: data.shared_object()?, proposal, asset_type, stable_type })
    }
}

/// A balance wrapper together with its object reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperObject {
    /// The owned object.
    pub object: ObjectRef,
    /// The decoded wrapper.
    pub wrapper: BalanceWrapper,
}

impl WrapperObject {
    /// Decodes a `conditional_balance::ConditionalMarketBalance`.
    pub fn decode(data: &ObjectData) -> Result<Self, ObjectDecodeError> {
        data.expect_type(MODULE_BALANCE, BALANCE_WRAPPER_STRUCT)?;
        let fields = data.fields()?;
        let wrapper = BalanceWrapper::from_parts(
            fields.id("market_id")?,
            fields.u64("outcome_count")?,
            fields.u64("version")?,
            fields.u64_vec("balances")?,
        )
        .map_err(|source| ObjectDecodeError::Wrapper { object_id: data.object_id, source })?;
        Ok(Self { object: data.object_ref(), wrapper })
    }
}

impl ConditionalMarket {
    /// Decodes a `conditional_amm::LiquidityPool`.
    pub fn decode(data: &ObjectData) -> Result<Self, ObjectDecodeError> {
        data.expect_type(MODULE_AMM, CONDITIONAL_MARKET_STRUCT)?;
        let fields = data.fields()?;
        Ok(Self {
            id: data.object_id,
            market_id: fields.id("market_id")?,
            outcome: fields.u8("outcome_idx")?,
            asset_reserve: fields.u64("asset_reserve")?,
            stable_reserve: fields.u64("stable_reserve")?,
        })
    }
}

impl Escrow {
    /// Decodes an `outcome_escrow::OutcomeEscrow`.
    pub fn decode(data: &ObjectData) -> Result<Self, ObjectDecodeError> {
        data.expect_type(MODULE_ESCROW, OUTCOME_ESCROW_STRUCT)?;
        let fields = data.fields()?;
        let shared = data.shared_object()?;
        Ok(Self::from_snapshot(
            ObjectHandle::Shared {
                id: shared.id,
                initial_shared_version: shared.initial_shared_version,
            },
            fields.id("proposal_id")?,
            fields.u8("outcome_index")?,
            fields.u64("balance")?,
            fields.id_vec("objects")?,
        ))
    }
}

impl EscrowReceiptRecord {
    /// Decodes an `outcome_escrow::EscrowReceipt`.
    pub fn decode(data: &ObjectData) -> Result<Self, ObjectDecodeError> {
        data.expect_type(MODULE_ESCROW, ESCROW_RECEIPT_STRUCT)?;
        let fields = data.fields()?;
        Ok(Self {
            object: data.object_ref(),
            escrow_id: fields.id("escrow_id")?,
            proposal_id: fields.id("proposal_id")?,
            outcome: fields.u8("outcome_index")?,
            depositor: fields.address("depositor")?,
        })
    }
}

/// Every object shape the orchestrator reads from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerObject {
    /// A proposal.
    Proposal(ProposalObject),
    /// A per-outcome conditional market.
    ConditionalMarket(ConditionalMarket),
    /// A balance wrapper.
    BalanceWrapper(WrapperObject),
    /// An outcome escrow.
    Escrow(Escrow),
    /// An escrow receipt.
    EscrowReceipt(EscrowReceiptRecord),
}

impl LedgerObject {
    /// Decodes `data`, picking the shape from its Move type.
    pub fn decode(data: &ObjectData) -> Result<Self, ObjectDecodeError> {
        let ty = data.move_type()?;
        match (ty.module.as_str(), ty.name.as_str()) {
            (MODULE_PROPOSAL, PROPOSAL_STRUCT) => ProposalObject::decode(data).map(Self::Proposal),
            (MODULE_AMM, CONDITIONAL_MARKET_STRUCT) => {
                ConditionalMarket::decode(data).map(Self::ConditionalMarket)
            }
            (MODULE_BALANCE, BALANCE_WRAPPER_STRUCT) => {
                WrapperObject::decode(data).map(Self::BalanceWrapper)
            }
            (MODULE_ESCROW, OUTCOME_ESCROW_STRUCT) => Escrow::decode(data).map(Self::Escrow),
            (MODULE_ESCROW, ESCROW_RECEIPT_STRUCT) => {
                EscrowReceiptRecord::decode(data).map(Self::EscrowReceipt)
            }
            _ => Err(ObjectDecodeError::UnexpectedType {
                object_id: data.object_id,
                expected: "a futarchy object",
                got: ty.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::WrapperError, types::Leg};
    use serde_json::json;

    const PKG: &str = "0x00000000000000000000000000000000000000000000000000000000000000ab";

    fn object(ty: &str, owner: Value, fields: Value) -> ObjectData {
        serde_json::from_value(json!({
            "objectId": format!("0x{}", "11".repeat(32)),
            "version": "42",
            "digest": bs58::encode([3u8; 32]).into_string(),
            "type": ty,
            "owner": owner,
            "content": {
                "dataType": "moveObject",
                "type": ty,
                "hasPublicTransfer": true,
                "fields": fields,
            }
        }))
        .unwrap()
    }

    #[test]
    fn parses_nested_type_params() {
        let ty: MoveType =
            format!("{PKG}::proposal::Proposal<0x2::sui::SUI, {PKG}::lp::LP<0x2::a::A, 0x2::b::B>>")
                .parse()
                .unwrap();
        assert_eq!(ty.module, "proposal");
        assert_eq!(ty.name, "Proposal");
        assert_eq!(ty.type_params.len(), 2);
        assert_eq!(ty.type_params[1], format!("{PKG}::lp::LP<0x2::a::A, 0x2::b::B>"));
        assert!("0x2::coin".parse::<MoveType>().is_err());
    }

    #[test]
    fn decodes_proposal() {
        let data = object(
            &format!("{PKG}::proposal::Proposal<0x2::sui::SUI, {PKG}::usdc::USDC>"),
            json!({ "Shared": { "initial_shared_version": 7 } }),
            json!({
                "id": { "id": format!("0x{}", "11".repeat(32)) },
                "escrow_id": "0x22",
                "outcome_count": 2,
                "state": 2,
                "winning_outcome": 1,
                "outcome_messages": ["Reject", "Accept"],
            }),
        );
        let LedgerObject::Proposal(decoded) = LedgerObject::decode(&data).unwrap() else {
            panic!("expected a proposal");
        };
        assert_eq!(decoded.object.initial_shared_version, 7);
        assert_eq!(decoded.proposal.market_id, ObjectId::with_last_byte(0x22));
        assert_eq!(decoded.proposal.winner(), Some(1));
        assert_eq!(decoded.asset_type, "0x2::sui::SUI");
    }

    #[test]
    fn missing_field_is_named() {
        let data = object(
            &format!("{PKG}::conditional_amm::LiquidityPool"),
            json!({ "Shared": { "initial_shared_version": 1 } }),
            json!({ "market_id": "0x22", "outcome_idx": 1, "asset_reserve": "10" }),
        );
        let err = LedgerObject::decode(&data).unwrap_err();
        assert!(matches!(err, ObjectDecodeError::MissingField { field: "stable_reserve", .. }));
    }

    #[test]
    fn decodes_wrapper_and_rejects_bad_layout() {
        let ty = format!("{PKG}::conditional_balance::ConditionalMarketBalance");
        let owner = json!({ "AddressOwner": "0x5" });
        let good = object(
            &ty,
            owner.clone(),
            json!({ "market_id": "0x22", "outcome_count": "2", "version": "1",
                    "balances": ["0", "0", "300", "0"] }),
        );
        let LedgerObject::BalanceWrapper(decoded) = LedgerObject::decode(&good).unwrap() else {
            panic!("expected a wrapper");
        };
        assert_eq!(decoded.object.version, 42);
        assert_eq!(decoded.wrapper.sum_for_outcome(1, Leg::Asset).unwrap(), 300);

        let bad = object(
            &ty,
            owner,
            json!({ "market_id": "0x22", "outcome_count": "3", "version": "1",
                    "balances": ["0", "0"] }),
        );
        let err = LedgerObject::decode(&bad).unwrap_err();
        assert!(matches!(
            err,
            ObjectDecodeError::Wrapper { source: WrapperError::MalformedWrapper { .. }, .. }
        ));
    }

    #[test]
    fn rejects_foreign_type() {
        let data = object("0x2::coin::Coin<0x2::sui::SUI>", json!("Immutable"), json!({}));
        assert!(matches!(
            LedgerObject::decode(&data),
            Err(ObjectDecodeError::UnexpectedType { .. })
        ));
    }

    #[test]
    fn escrow_must_be_shared() {
        let data = object(
            &format!("{PKG}::outcome_escrow::OutcomeEscrow<0x2::sui::SUI>"),
            json!({ "AddressOwner": "0x5" }),
            json!({ "proposal_id": "0x1", "outcome_index": 1, "balance": "5", "objects": [] }),
        );
        assert!(matches!(
            LedgerObject::decode(&data),
            Err(ObjectDecodeError::InvalidField { field: "owner", .. })
        ));
    }
}
