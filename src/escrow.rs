//! Escrow receipt guard.
//!
//! Custody bound to a single outcome of a proposal. A deposit is locked in an escrow at creation
//! and the depositor receives an [`EscrowReceipt`]. Once the proposal is finalized, the receipt
//! redeems the deposit only if the escrowed outcome is the winner. Every rule is checked against
//! the client-side [`Escrow`] view before a call is appended, so a transaction that would abort
//! on-chain is never assembled.

use crate::{
    constants::MODULE_ESCROW,
    error::{EscrowError, Operation, TransactionError},
    transaction::{Argument, MoveCall, ObjectHandle, ProgrammableTransactionBuilder},
    types::{Address, Deposit, Escrow, EscrowPayout, EscrowReceipt, ObjectId, ProposalObject},
};
use tracing::{debug, info};

/// Appends outcome escrow calls for one escrowed item type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowGuard {
    package: ObjectId,
    item_type: String,
}

impl EscrowGuard {
    /// Creates a guard for escrows of `item_type` (a coin type or an object type) in `package`.
    pub fn new(package: ObjectId, item_type: impl Into<String>) -> Self {
        Self { package, item_type: item_type.into() }
    }

    fn call(
        &self,
        function: &str,
        arguments: Vec<Argument>,
    ) -> Result<MoveCall, TransactionError> {
        Ok(MoveCall::new(self.package, MODULE_ESCROW, function)
            .with_type_arguments(vec![self.item_type.parse()?])
            .with_arguments(arguments))
    }

    /// Locks `deposit` for `outcome` of `proposal`.
    ///
    /// Both returned values refer to results of the create call. They can be used by later
    /// commands of the same transaction and must be handed off with [`publish`](Self::publish).
    pub fn create_for_outcome(
        &self,
        tx: &mut ProgrammableTransactionBuilder,
        proposal: &ProposalObject,
        outcome: u8,
        deposit: Deposit,
        depositor: Address,
    ) -> Result<(Escrow, EscrowReceipt), EscrowError> {
        let outcome_count = proposal.proposal.outcome_count;
        if !proposal.proposal.has_outcome(outcome) {
            return Err(EscrowError::OutcomeOutOfBounds { outcome, outcome_count });
        }
        let (function, item, balance, objects) = match deposit {
            Deposit::Coin { amount: 0, .. } => return Err(EscrowError::ZeroAmount),
            Deposit::Coin { amount, coin } => ("create_with_coin", coin, amount, Vec::new()),
            Deposit::Object { id, object } => ("create_with_object", object, 0, vec![id]),
        };

        let proposal_arg = proposal.object.input(tx, false)?;
        let outcome_arg = tx.pure(&outcome)?;
        let created = tx.move_call(self.call(function, vec![proposal_arg, outcome_arg, item])?)?;
        let (escrow, receipt) = match created {
            Argument::Result(idx) => {
                (Argument::NestedResult(idx, 0), Argument::NestedResult(idx, 1))
            }
            other => (other, other),
        };
        debug!(proposal_id = %proposal.object.id, outcome, balance, "created outcome escrow");

        let escrow = Escrow {
            handle: ObjectHandle::Pending(escrow),
            proposal_id: proposal.object.id,
            outcome,
            balance,
            objects,
            destroyed: false,
        };
        let receipt = EscrowReceipt {
            handle: ObjectHandle::Pending(receipt),
            escrow: escrow.handle,
            proposal_id: proposal.object.id,
            outcome,
            depositor,
        };
        Ok((escrow, receipt))
    }

    /// Shares a freshly created escrow and sends its receipt to the depositor.
    pub fn publish(
        &self,
        tx: &mut ProgrammableTransactionBuilder,
        escrow: Escrow,
        receipt: EscrowReceipt,
    ) -> Result<(), EscrowError> {
        let escrow_arg = escrow.handle.input(tx)?;
        tx.move_call(self.call("share", vec![escrow_arg])?)?;
        let receipt_arg = receipt.handle.input(tx)?;
        tx.transfer_objects(vec![receipt_arg], receipt.depositor)?;
        Ok(())
    }

    /// Withdraws `amount` coins through `receipt`, keeping the receipt valid.
    pub fn withdraw(
        &self,
        tx: &mut ProgrammableTransactionBuilder,
        escrow: &mut Escrow,
        proposal: &ProposalObject,
        receipt: &EscrowReceipt,
        amount: u64,
    ) -> Result<EscrowPayout, EscrowError> {
        authorize(escrow, proposal, receipt)?;
        if amount == 0 {
            return Err(EscrowError::ZeroWithdrawal);
        }
        if amount > escrow.balance {
            return Err(EscrowError::InsufficientBalance {
                escrow: escrow.handle,
                available: escrow.balance,
                requested: amount,
            });
        }

        let args = vec![
            escrow.handle.input(tx)?,
            proposal.object.input(tx, false)?,
            receipt.handle.input(tx)?,
            tx.pure(&amount)?,
        ];
        let argument = tx.move_call(self.call("withdraw", args)?)?;

        escrow.balance -= amount;
        debug!(escrow = %escrow.handle, amount, remaining = escrow.balance, "withdrew from escrow");
        Ok(EscrowPayout { amount, objects: Vec::new(), argument })
    }

    /// Withdraws everything the escrow holds, consuming `receipt`.
    pub fn withdraw_all(
        &self,
        tx: &mut ProgrammableTransactionBuilder,
        escrow: &mut Escrow,
        proposal: &ProposalObject,
        receipt: EscrowReceipt,
    ) -> Result<EscrowPayout, EscrowError> {
        authorize(escrow, proposal, &receipt)?;

        let args = vec![
            escrow.handle.input(tx)?,
            proposal.object.input(tx, false)?,
            receipt.handle.input(tx)?,
        ];
        let argument = tx.move_call(self.call("withdraw_all", args)?)?;

        let amount = std::mem::take(&mut escrow.balance);
        let objects = std::mem::take(&mut escrow.objects);
        info!(
            escrow = %escrow.handle,
            outcome = escrow.outcome,
            amount,
            objects = objects.len(),
            "drained outcome escrow"
        );
        Ok(EscrowPayout { amount, objects, argument })
    }

    /// Destroys an escrow that holds nothing. The view reports
    /// [`EscrowStatus::Destroyed`](crate::types::EscrowStatus::Destroyed) afterwards.
    pub fn destroy_empty(
        &self,
        tx: &mut ProgrammableTransactionBuilder,
        escrow: &mut Escrow,
    ) -> Result<(), EscrowError> {
        if escrow.destroyed {
            return Err(EscrowError::Destroyed {
                escrow: escrow.handle,
                operation: Operation::EscrowDestroy,
            });
        }
        if !escrow.is_empty() {
            return Err(EscrowError::NotEmpty {
                escrow: escrow.handle,
                balance: escrow.balance,
                objects: escrow.objects.len(),
            });
        }
        let escrow_arg = escrow.handle.input(tx)?;
        tx.move_call(self.call("destroy_empty", vec![escrow_arg])?)?;
        escrow.destroyed = true;
        debug!(escrow = %escrow.handle, "destroyed outcome escrow");
        Ok(())
    }
}

/// Checks that `receipt` may redeem from `escrow` in the current state of `proposal`.
fn authorize(
    escrow: &Escrow,
    proposal: &ProposalObject,
    receipt: &EscrowReceipt,
) -> Result<(), EscrowError> {
    if escrow.destroyed {
        return Err(EscrowError::Destroyed {
            escrow: escrow.handle,
            operation: Operation::EscrowWithdraw,
        });
    }
    if escrow.proposal_id != proposal.object.id {
        return Err(EscrowError::ProposalMismatch {
            expected: escrow.proposal_id,
            got: proposal.object.id,
        });
    }
    if receipt.escrow != escrow.handle || receipt.outcome != escrow.outcome {
        return Err(EscrowError::ReceiptMismatch {
            escrow: escrow.handle.to_string(),
            receipt_escrow: receipt.escrow.to_string(),
        });
    }
    let proposal_id = proposal.object.id;
    match proposal.proposal.winner() {
        None => Err(EscrowError::NotFinalized { proposal_id }),
        Some(winner) if winner != receipt.outcome => {
            Err(EscrowError::OutcomeDidNotWin { proposal_id, outcome: receipt.outcome, winner })
        }
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FailureKind,
        types::{EscrowStatus, Proposal, ProposalState, SharedObject},
    };

    fn proposal(state: ProposalState, winner: Option<u8>) -> ProposalObject {
        ProposalObject {
            object: SharedObject { id: ObjectId::with_last_byte(1), initial_shared_version: 3 },
            proposal: Proposal {
                id: ObjectId::with_last_byte(1),
                market_id: ObjectId::with_last_byte(2),
                outcome_count: 2,
                state,
                winning_outcome: winner,
                outcome_labels: vec!["Reject".into(), "Accept".into()],
            },
            asset_type: "0x2::sui::SUI".into(),
            stable_type: "0xab::usdc::USDC".into(),
        }
    }

    fn guard() -> EscrowGuard {
        EscrowGuard::new(ObjectId::with_last_byte(0xab), "0x2::sui::SUI")
    }

    fn create(
        tx: &mut ProgrammableTransactionBuilder,
        proposal: &ProposalObject,
        outcome: u8,
        amount: u64,
    ) -> (Escrow, EscrowReceipt) {
        guard()
            .create_for_outcome(
                tx,
                proposal,
                outcome,
                Deposit::Coin { amount, coin: Argument::GasCoin },
                Address::with_last_byte(7),
            )
            .unwrap()
    }

    #[test]
    fn losing_outcome_cannot_withdraw() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let (mut escrow, receipt) =
            create(&mut tx, &proposal(ProposalState::Trading, None), 1, 1_000);

        let finalized = proposal(ProposalState::Finalized, Some(0));
        let err = guard().withdraw(&mut tx, &mut escrow, &finalized, &receipt, 10).unwrap_err();
        assert!(matches!(err, EscrowError::OutcomeDidNotWin { outcome: 1, winner: 0, .. }));
        let err = guard().withdraw_all(&mut tx, &mut escrow, &finalized, receipt).unwrap_err();
        assert!(matches!(err, EscrowError::OutcomeDidNotWin { .. }));
        assert_eq!(escrow.balance(), 1_000);
        assert_eq!(escrow.status(&finalized.proposal), EscrowStatus::Locked);
    }

    #[test]
    fn withdrawal_waits_for_finalization() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let trading = proposal(ProposalState::Trading, None);
        let (mut escrow, receipt) = create(&mut tx, &trading, 1, 1_000);
        let err = guard().withdraw(&mut tx, &mut escrow, &trading, &receipt, 1).unwrap_err();
        assert!(matches!(err, EscrowError::NotFinalized { .. }));

        // A winner recorded before finalization does not count.
        let pending = proposal(ProposalState::Trading, Some(1));
        let err = guard().withdraw(&mut tx, &mut escrow, &pending, &receipt, 1).unwrap_err();
        assert!(matches!(err, EscrowError::NotFinalized { .. }));
    }

    #[test]
    fn partial_then_full_withdrawal() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let (mut escrow, receipt) =
            create(&mut tx, &proposal(ProposalState::Trading, None), 1, 1_000);
        let won = proposal(ProposalState::Finalized, Some(1));

        let payout = guard().withdraw(&mut tx, &mut escrow, &won, &receipt, 400).unwrap();
        assert_eq!(payout.amount, 400);
        let err = guard().withdraw(&mut tx, &mut escrow, &won, &receipt, 601).unwrap_err();
        assert!(matches!(err, EscrowError::InsufficientBalance { available: 600, .. }));
        assert_eq!(escrow.status(&won.proposal), EscrowStatus::Redeemable);

        let payout = guard().withdraw_all(&mut tx, &mut escrow, &won, receipt).unwrap();
        assert_eq!(payout.amount, 600);
        assert_eq!(escrow.status(&won.proposal), EscrowStatus::Drained);
        guard().destroy_empty(&mut tx, &mut escrow).unwrap();
        assert!(escrow.is_destroyed());
        assert_eq!(escrow.status(&won.proposal), EscrowStatus::Destroyed);

        let functions: Vec<_> =
            tx.finish().unwrap().move_calls().map(|c| c.function.clone()).collect();
        assert_eq!(functions, ["create_with_coin", "withdraw", "withdraw_all", "destroy_empty"]);
    }

    #[test]
    fn create_checks_outcome_and_amount() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let trading = proposal(ProposalState::Trading, None);
        let deposit = Deposit::Coin { amount: 5, coin: Argument::GasCoin };
        let err = guard()
            .create_for_outcome(&mut tx, &trading, 2, deposit, Address::ZERO)
            .unwrap_err();
        assert!(matches!(err, EscrowError::OutcomeOutOfBounds { outcome: 2, outcome_count: 2 }));

        let deposit = Deposit::Coin { amount: 0, coin: Argument::GasCoin };
        let err = guard()
            .create_for_outcome(&mut tx, &trading, 0, deposit, Address::ZERO)
            .unwrap_err();
        assert!(matches!(err, EscrowError::ZeroAmount));
        assert_eq!(tx.command_count(), 0);
    }

    #[test]
    fn object_escrow_is_not_empty_until_drained() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let deposit =
            Deposit::Object { id: ObjectId::with_last_byte(0x42), object: Argument::Input(0) };
        let (mut escrow, receipt) = guard()
            .create_for_outcome(
                &mut tx,
                &proposal(ProposalState::Trading, None),
                0,
                deposit,
                Address::ZERO,
            )
            .unwrap();
        assert_eq!(escrow.objects(), &[ObjectId::with_last_byte(0x42)]);

        let err = guard().destroy_empty(&mut tx, &mut escrow).unwrap_err();
        assert!(matches!(err, EscrowError::NotEmpty { balance: 0, objects: 1, .. }));

        let won = proposal(ProposalState::Finalized, Some(0));
        let payout = guard().withdraw_all(&mut tx, &mut escrow, &won, receipt).unwrap();
        assert_eq!(payout.objects, vec![ObjectId::with_last_byte(0x42)]);
        assert!(escrow.is_empty());
        assert!(!escrow.is_destroyed());
    }

    #[test]
    fn zero_withdrawal_is_rejected() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let (mut escrow, receipt) =
            create(&mut tx, &proposal(ProposalState::Trading, None), 1, 1_000);
        let won = proposal(ProposalState::Finalized, Some(1));
        let before = tx.command_count();

        let err = guard().withdraw(&mut tx, &mut escrow, &won, &receipt, 0).unwrap_err();
        assert!(matches!(err, EscrowError::ZeroWithdrawal));
        assert_eq!(err.kind(), FailureKind::ZeroAmount);
        assert_eq!(err.operation(), Operation::EscrowWithdraw);
        assert_eq!(tx.command_count(), before);
        assert_eq!(escrow.balance(), 1_000);
    }

    #[test]
    fn destroyed_escrow_cannot_be_reused() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let (mut escrow, receipt) =
            create(&mut tx, &proposal(ProposalState::Trading, None), 1, 1_000);
        let won = proposal(ProposalState::Finalized, Some(1));
        guard().withdraw_all(&mut tx, &mut escrow, &won, receipt).unwrap();
        guard().destroy_empty(&mut tx, &mut escrow).unwrap();
        let before = tx.command_count();

        let err = guard().destroy_empty(&mut tx, &mut escrow).unwrap_err();
        assert!(matches!(err, EscrowError::Destroyed { operation: Operation::EscrowDestroy, .. }));
        assert_eq!(err.kind(), FailureKind::Destroyed);
        assert!(err.to_string().starts_with("escrow.destroy: escrow "));

        let (_, late_receipt) = create(&mut tx, &won, 1, 5);
        let late_receipt = EscrowReceipt { escrow: escrow.handle(), ..late_receipt };
        let err = guard().withdraw(&mut tx, &mut escrow, &won, &late_receipt, 1).unwrap_err();
        assert_eq!(err.operation(), Operation::EscrowWithdraw);
        assert_eq!(tx.command_count(), before + 1);
    }

    #[test]
    fn receipt_from_another_escrow_is_rejected() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let trading = proposal(ProposalState::Trading, None);
        let (mut first, _) = create(&mut tx, &trading, 1, 10);
        let (_, other_receipt) = create(&mut tx, &trading, 1, 10);

        let won = proposal(ProposalState::Finalized, Some(1));
        let err = guard().withdraw(&mut tx, &mut first, &won, &other_receipt, 1).unwrap_err();
        assert!(matches!(err, EscrowError::ReceiptMismatch { .. }));
    }
}
