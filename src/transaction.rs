//! Programmable transaction assembly.
//!
//! A transaction is a list of inputs (pure BCS values and object references) and a list of
//! commands that reference inputs and the results of earlier commands. Every orchestrator step
//! appends one Move call here.
//!
//! The builder also tracks linear resources (split progress, swap batches). A resource opened
//! by a `begin` call must be closed by its finishing call before [`finish`] succeeds, which
//! mirrors the on-chain rule that such values cannot outlive the transaction.
//!
//! [`finish`]: ProgrammableTransactionBuilder::finish
//!
//! Every type here mirrors the ledger's BCS layout: enum variants are encoded by declaration
//! index, so variant order is part of the wire format.

use crate::{
    constants::{CLOCK_INITIAL_SHARED_VERSION, CLOCK_OBJECT_ID},
    error::TransactionError,
    types::{Address, MoveType, ObjectId, ObjectRef},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use tracing::trace;

/// Upper bound on the number of commands or inputs addressable by a `u16` argument.
const MAX_ARGUMENTS: usize = u16::MAX as usize;

/// A reference to a value inside the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Argument {
    /// The gas coin.
    GasCoin,
    /// An input, by position.
    Input(u16),
    /// The single result of a command.
    Result(u16),
    /// One value of a command returning a tuple.
    NestedResult(u16, u16),
}

/// An object passed as a transaction input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectArg {
    /// An owned or immutable object, pinned to a version.
    ImmOrOwnedObject(ObjectRef),
    /// A shared object.
    SharedObject {
        /// The object id.
        id: ObjectId,
        /// Version at which the object became shared.
        initial_shared_version: u64,
        /// Whether the transaction mutates it.
        mutable: bool,
    },
}

/// How an object is referenced by the transaction under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectHandle {
    /// Created by an earlier command of the same transaction.
    Pending(Argument),
    /// A shared object already on the ledger.
    Shared {
        /// The object id.
        id: ObjectId,
        /// Initial shared version.
        initial_shared_version: u64,
    },
    /// An owned object already on the ledger.
    Owned(ObjectRef),
}

impl ObjectHandle {
    /// Returns an argument for this object, adding an input if needed.
    pub fn input(
        &self,
        tx: &mut ProgrammableTransactionBuilder,
    ) -> Result<Argument, TransactionError> {
        match *self {
            Self::Pending(argument) => Ok(argument),
            Self::Shared { id, initial_shared_version } => {
                tx.shared_object(id, initial_shared_version, true)
            }
            Self::Owned(object) => tx.object(object),
        }
    }

    /// The object id, when the object already exists on the ledger.
    pub const fn id(&self) -> Option<ObjectId> {
        match self {
            Self::Pending(_) => None,
            Self::Shared { id, .. } => Some(*id),
            Self::Owned(object) => Some(object.id),
        }
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(argument) => write!(f, "pending {argument:?}"),
            Self::Shared { id, .. } => write!(f, "{id}"),
            Self::Owned(object) => write!(f, "{}", object.id),
        }
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    /// A BCS-encoded value.
    Pure(Vec<u8>),
    /// An object.
    Object(ObjectArg),
}

/// A Move type used as a type argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// `bool`
    Bool,
    /// `u8`
    U8,
    /// `u64`
    U64,
    /// `u128`
    U128,
    /// `address`
    Address,
    /// `signer`
    Signer,
    /// `vector<T>`
    Vector(Box<TypeTag>),
    /// A struct type.
    Struct(Box<StructTag>),
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u256`
    U256,
}

/// A fully qualified struct type, e.g. `0x2::coin::Coin<0x2::sui::SUI>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructTag {
    /// Defining package.
    pub address: ObjectId,
    /// Module name.
    pub module: String,
    /// Struct name.
    pub name: String,
    /// Type parameters.
    pub type_params: Vec<TypeTag>,
}

impl FromStr for TypeTag {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let tag = match s {
            "bool" => Self::Bool,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "u128" => Self::U128,
            "u256" => Self::U256,
            "address" => Self::Address,
            "signer" => Self::Signer,
            _ => match s.strip_prefix("vector<").and_then(|rest| rest.strip_suffix('>')) {
                Some(inner) => Self::Vector(Box::new(inner.parse()?)),
                None => {
                    let ty: MoveType = s.parse().map_err(|reason| {
                        TransactionError::InvalidTypeTag { type_tag: s.to_string(), reason }
                    })?;
                    Self::Struct(Box::new(StructTag::try_from(ty)?))
                }
            },
        };
        Ok(tag)
    }
}

impl TryFrom<MoveType> for StructTag {
    type Error = TransactionError;

    fn try_from(ty: MoveType) -> Result<Self, Self::Error> {
        let type_params =
            ty.type_params.iter().map(|param| param.parse()).collect::<Result<_, _>>()?;
        Ok(Self { address: ty.address, module: ty.module, name: ty.name, type_params })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::U128 => f.write_str("u128"),
            Self::U256 => f.write_str("u256"),
            Self::Address => f.write_str("address"),
            Self::Signer => f.write_str("signer"),
            Self::Vector(inner) => write!(f, "vector<{inner}>"),
            Self::Struct(tag) => {
                write!(f, "{}::{}::{}", tag.address, tag.module, tag.name)?;
                if let Some((first, rest)) = tag.type_params.split_first() {
                    write!(f, "<{first}")?;
                    for param in rest {
                        write!(f, ", {param}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

/// A call into a Move function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCall {
    /// Package id.
    pub package: ObjectId,
    /// Module name.
    pub module: String,
    /// Function name.
    pub function: String,
    /// Type arguments.
    pub type_arguments: Vec<TypeTag>,
    /// Call arguments.
    pub arguments: Vec<Argument>,
}

impl MoveCall {
    /// Creates a call with no type arguments and no arguments.
    pub fn new(package: ObjectId, module: &str, function: &str) -> Self {
        Self {
            package,
            module: module.to_string(),
            function: function.to_string(),
            type_arguments: Vec::new(),
            arguments: Vec::new(),
        }
    }

    /// Sets the type arguments.
    pub fn with_type_arguments(mut self, type_arguments: Vec<TypeTag>) -> Self {
        self.type_arguments = type_arguments;
        self
    }

    /// Sets the arguments.
    pub fn with_arguments(mut self, arguments: Vec<Argument>) -> Self {
        self.arguments = arguments;
        self
    }
}

impl fmt::Display for MoveCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.package, self.module, self.function)
    }
}

/// A transaction command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Call a Move function.
    MoveCall(Box<MoveCall>),
    /// Send objects to an address.
    TransferObjects(Vec<Argument>, Argument),
    /// Split amounts off a coin.
    SplitCoins(Argument, Vec<Argument>),
    /// Merge coins into the first one.
    MergeCoins(Argument, Vec<Argument>),
}

/// A finished programmable transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableTransaction {
    /// Inputs.
    pub inputs: Vec<CallArg>,
    /// Commands, executed in order.
    pub commands: Vec<Command>,
}

impl ProgrammableTransaction {
    /// Returns the Move calls in execution order.
    pub fn move_calls(&self) -> impl Iterator<Item = &MoveCall> {
        self.commands.iter().filter_map(|command| match command {
            Command::MoveCall(call) => Some(call.as_ref()),
            _ => None,
        })
    }
}

/// The kind of a linear resource tracked by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinearKind {
    /// A split in progress.
    SplitProgress,
    /// A conditional swap batch.
    SwapBatch,
}

impl fmt::Display for LinearKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SplitProgress => f.write_str("split progress"),
            Self::SwapBatch => f.write_str("swap batch"),
        }
    }
}

/// Handle to an open linear resource. Not `Clone`, so each one is closed at most once.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct LinearToken {
    id: u32,
    kind: LinearKind,
}

/// Builds a [`ProgrammableTransaction`].
#[derive(Debug, Default)]
pub struct ProgrammableTransactionBuilder {
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
    shared: HashMap<ObjectId, u16>,
    open: HashMap<u32, (LinearKind, u16)>,
    next_token: u32,
}

impl ProgrammableTransactionBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn push_input(&mut self, arg: CallArg) -> Result<Argument, TransactionError> {
        if self.inputs.len() >= MAX_ARGUMENTS {
            return Err(TransactionError::LimitExceeded { what: "inputs", limit: MAX_ARGUMENTS });
        }
        self.inputs.push(arg);
        Ok(Argument::Input((self.inputs.len() - 1) as u16))
    }

    /// Adds a BCS-encoded pure input.
    pub fn pure<T: Serialize>(&mut self, value: &T) -> Result<Argument, TransactionError> {
        let bytes = bcs::to_bytes(value)?;
        self.push_input(CallArg::Pure(bytes))
    }

    /// Adds an owned or immutable object input.
    pub fn object(&mut self, object: ObjectRef) -> Result<Argument, TransactionError> {
        self.push_input(CallArg::Object(ObjectArg::ImmOrOwnedObject(object)))
    }

    /// Adds a shared object input. Passing the same object twice reuses the first input, upgrading
    /// it to mutable if either use is mutable.
    pub fn shared_object(
        &mut self,
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    ) -> Result<Argument, TransactionError> {
        if let Some(&idx) = self.shared.get(&id) {
            if let CallArg::Object(ObjectArg::SharedObject { mutable: existing, .. }) =
                &mut self.inputs[idx as usize]
            {
                *existing |= mutable;
            }
            return Ok(Argument::Input(idx));
        }
        let arg = self.push_input(CallArg::Object(ObjectArg::SharedObject {
            id,
            initial_shared_version,
            mutable,
        }))?;
        if let Argument::Input(idx) = arg {
            self.shared.insert(id, idx);
        }
        Ok(arg)
    }

    /// Adds the shared clock as a read-only input.
    pub fn clock(&mut self) -> Result<Argument, TransactionError> {
        self.shared_object(CLOCK_OBJECT_ID, CLOCK_INITIAL_SHARED_VERSION, false)
    }

    /// Appends a command, returning its result argument.
    pub fn command(&mut self, command: Command) -> Result<Argument, TransactionError> {
        if self.commands.len() >= MAX_ARGUMENTS {
            return Err(TransactionError::LimitExceeded {
                what: "commands",
                limit: MAX_ARGUMENTS,
            });
        }
        self.commands.push(command);
        Ok(Argument::Result((self.commands.len() - 1) as u16))
    }

    /// Appends a Move call, returning its result argument.
    pub fn move_call(&mut self, call: MoveCall) -> Result<Argument, TransactionError> {
        trace!(call = %call, args = call.arguments.len(), "appending move call");
        self.command(Command::MoveCall(Box::new(call)))
    }

    /// Transfers `objects` to `recipient`.
    pub fn transfer_objects(
        &mut self,
        objects: Vec<Argument>,
        recipient: Address,
    ) -> Result<(), TransactionError> {
        let recipient = self.pure(&recipient)?;
        self.command(Command::TransferObjects(objects, recipient))?;
        Ok(())
    }

    /// Splits `amount` off `coin`, returning the new coin.
    pub fn split_coin(
        &mut self,
        coin: Argument,
        amount: u64,
    ) -> Result<Argument, TransactionError> {
        let amount = self.pure(&amount)?;
        match self.command(Command::SplitCoins(coin, vec![amount]))? {
            Argument::Result(idx) => Ok(Argument::NestedResult(idx, 0)),
            other => Ok(other),
        }
    }

    /// Number of commands appended so far.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Registers a linear resource produced by the most recent command.
    pub(crate) fn open_linear(&mut self, kind: LinearKind) -> LinearToken {
        let id = self.next_token;
        self.next_token += 1;
        let at = self.commands.len().saturating_sub(1) as u16;
        self.open.insert(id, (kind, at));
        LinearToken { id, kind }
    }

    /// Marks a linear resource consumed.
    pub(crate) fn close_linear(&mut self, token: LinearToken) {
        let removed = self.open.remove(&token.id);
        debug_assert!(
            matches!(removed, Some((kind, _)) if kind == token.kind),
            "linear token closed twice"
        );
    }

    /// Finishes the transaction.
    ///
    /// Fails if a split or swap batch was begun but never finished.
    pub fn finish(self) -> Result<ProgrammableTransaction, TransactionError> {
        if let Some((kind, opened_at)) = self.open.values().min_by_key(|(_, at)| *at) {
            return Err(TransactionError::UnconsumedResource { kind: *kind, opened_at: *opened_at });
        }
        Ok(ProgrammableTransaction { inputs: self.inputs, commands: self.commands })
    }
}

/// Gas payment for a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasData {
    /// Coins paying for gas.
    pub payment: Vec<ObjectRef>,
    /// Owner of the gas coins.
    pub owner: Address,
    /// Gas price.
    pub price: u64,
    /// Gas budget.
    pub budget: u64,
}

/// What a transaction does. Only programmable transactions are built by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// A programmable transaction.
    ProgrammableTransaction(ProgrammableTransaction),
}

/// The epoch after which a transaction is no longer valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionExpiration {
    /// Valid in any epoch.
    #[default]
    None,
    /// Valid up to and including this epoch.
    Epoch(u64),
}

/// Version 1 of the transaction envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDataV1 {
    /// What the transaction does.
    pub kind: TransactionKind,
    /// The sender.
    pub sender: Address,
    /// Gas payment.
    pub gas_data: GasData,
    /// Expiration.
    pub expiration: TransactionExpiration,
}

/// A transaction ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionData {
    /// The current envelope.
    V1(TransactionDataV1),
}

impl TransactionData {
    /// Wraps a programmable transaction sent by `sender`, paid by `gas_data`, with no
    /// expiration.
    pub fn new(transaction: ProgrammableTransaction, sender: Address, gas_data: GasData) -> Self {
        Self::V1(TransactionDataV1 {
            kind: TransactionKind::ProgrammableTransaction(transaction),
            sender,
            gas_data,
            expiration: TransactionExpiration::None,
        })
    }

    /// Expires the transaction after `epoch`.
    pub fn with_expiration(mut self, epoch: u64) -> Self {
        let Self::V1(data) = &mut self;
        data.expiration = TransactionExpiration::Epoch(epoch);
        self
    }

    /// The sender.
    pub const fn sender(&self) -> Address {
        let Self::V1(data) = self;
        data.sender
    }

    /// The programmable transaction.
    pub const fn programmable(&self) -> &ProgrammableTransaction {
        let Self::V1(TransactionDataV1 {
            kind: TransactionKind::ProgrammableTransaction(transaction),
            ..
        }) = self;
        transaction
    }

    /// Encodes the transaction with BCS.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Encodes the transaction with BCS and base64, the form expected by the ledger RPC.
    pub fn to_base64(&self) -> Result<String, TransactionError> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// Attaches signatures produced over [`Self::to_bytes`].
    pub fn into_signed(
        self,
        signatures: Vec<String>,
    ) -> Result<SignedTransaction, TransactionError> {
        Ok(SignedTransaction { tx_bytes: self.to_base64()?, signatures })
    }
}

/// A signed transaction, as submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    /// Base64 BCS transaction bytes.
    pub tx_bytes: String,
    /// Base64 serialized signatures.
    pub signatures: Vec<String>,
}
