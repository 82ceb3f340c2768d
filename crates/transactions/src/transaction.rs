use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, ItemId, TransactionId, UserId,
};

use crate::header::TransactionHeader;
use crate::kind::TransactionKind;
use crate::line::{TransactionLine, validate_lines};
use crate::status::TransactionStatus;

/// Persistable state of a transaction.
///
/// This is what stores read and write and what the API renders. Go through
/// [`Transaction`] to change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub number: String,
    pub status: TransactionStatus,
    pub header: TransactionHeader,
    pub lines: Vec<TransactionLine>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub signature_image: Option<String>,
    pub rejected_by: Option<UserId>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
    pub version: u64,
}

/// Aggregate root: one warehouse transaction of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    state: TransactionRecord,
}

/// Who may delete a transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Any status (current behaviour).
    #[default]
    AnyStatus,
    /// Only drafts.
    DraftOnly,
}

/// Command: open a new DRAFT transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTransaction {
    pub transaction_id: TransactionId,
    pub number: String,
    pub header: TransactionHeader,
    pub lines: Vec<TransactionLine>,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: replace header and lines of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTransaction {
    pub header: TransactionHeader,
    pub lines: Vec<TransactionLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: hand a draft over for approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTransaction {
    pub occurred_at: DateTime<Utc>,
}

/// Command: approve, excluding the lines of `rejected_item_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveTransaction {
    pub rejected_item_ids: Vec<ItemId>,
    pub signature_image: Option<String>,
    pub approved_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: reject the whole transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectTransaction {
    pub reason: String,
    pub rejected_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionCommand {
    Update(UpdateTransaction),
    Submit(SubmitTransaction),
    Approve(ApproveTransaction),
    Reject(RejectTransaction),
}

/// Event: TransactionUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionUpdated {
    pub header: TransactionHeader,
    pub lines: Vec<TransactionLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransactionSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSubmitted {
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransactionApproved.
///
/// `approved_lines` keep the order of the submitted lines; they are the lines whose stock
/// effect the caller applies before persisting this event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionApproved {
    pub approved_lines: Vec<TransactionLine>,
    pub rejected_lines: Vec<TransactionLine>,
    pub approved_by: UserId,
    pub signature_image: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransactionRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRejected {
    pub reason: String,
    pub rejected_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionEvent {
    Updated(TransactionUpdated),
    Submitted(TransactionSubmitted),
    Approved(TransactionApproved),
    Rejected(TransactionRejected),
}

impl TransactionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TransactionEvent::Updated(_) => "transaction.updated",
            TransactionEvent::Submitted(_) => "transaction.submitted",
            TransactionEvent::Approved(_) => "transaction.approved",
            TransactionEvent::Rejected(_) => "transaction.rejected",
        }
    }
}

impl Transaction {
    /// Open a new DRAFT transaction.
    pub fn open(cmd: OpenTransaction) -> DomainResult<Self> {
        if cmd.number.trim().is_empty() {
            return Err(DomainError::invariant("transaction number cannot be empty"));
        }
        cmd.header.validate()?;
        validate_lines(&cmd.lines)?;

        Ok(Self {
            state: TransactionRecord {
                id: cmd.transaction_id,
                kind: cmd.header.kind(),
                number: cmd.number,
                status: TransactionStatus::Draft,
                header: cmd.header,
                lines: cmd.lines,
                created_by: cmd.created_by,
                created_at: cmd.occurred_at,
                updated_at: cmd.occurred_at,
                submitted_at: None,
                approved_by: None,
                approved_at: None,
                signature_image: None,
                rejected_by: None,
                rejected_at: None,
                reject_reason: None,
                version: 1,
            },
        })
    }

    /// Rehydrate from persisted state.
    pub fn restore(record: TransactionRecord) -> DomainResult<Self> {
        if record.header.kind() != record.kind {
            return Err(DomainError::invariant(format!(
                "transaction {} has kind {} but a {} header",
                record.id,
                record.kind,
                record.header.kind()
            )));
        }
        if record.lines.is_empty() {
            return Err(DomainError::invariant(format!(
                "transaction {} has no lines",
                record.id
            )));
        }
        Ok(Self { state: record })
    }

    pub fn kind(&self) -> TransactionKind {
        self.state.kind
    }

    pub fn number(&self) -> &str {
        &self.state.number
    }

    pub fn status(&self) -> TransactionStatus {
        self.state.status
    }

    pub fn lines(&self) -> &[TransactionLine] {
        &self.state.lines
    }

    pub fn record(&self) -> &TransactionRecord {
        &self.state
    }

    pub fn into_record(self) -> TransactionRecord {
        self.state
    }

    /// Deletion check under the configured policy.
    pub fn check_delete(&self, policy: DeletePolicy) -> DomainResult<()> {
        match policy {
            DeletePolicy::AnyStatus => Ok(()),
            DeletePolicy::DraftOnly => self.ensure_status(TransactionStatus::Draft, "delete"),
        }
    }

    fn ensure_status(&self, expected: TransactionStatus, action: &'static str) -> DomainResult<()> {
        if self.state.status != expected {
            return Err(DomainError::invalid_state(self.state.status, action));
        }
        Ok(())
    }

    fn handle_update(&self, cmd: &UpdateTransaction) -> DomainResult<Vec<TransactionEvent>> {
        self.ensure_status(TransactionStatus::Draft, "update")?;

        if cmd.header.kind() != self.state.kind {
            return Err(DomainError::validation(format!(
                "cannot change a {} into a {}",
                self.state.kind,
                cmd.header.kind()
            )));
        }
        cmd.header.validate()?;
        validate_lines(&cmd.lines)?;

        Ok(vec![TransactionEvent::Updated(TransactionUpdated {
            header: cmd.header.clone(),
            lines: cmd.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit(&self, cmd: &SubmitTransaction) -> DomainResult<Vec<TransactionEvent>> {
        self.ensure_status(TransactionStatus::Draft, "submit")?;

        Ok(vec![TransactionEvent::Submitted(TransactionSubmitted {
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveTransaction) -> DomainResult<Vec<TransactionEvent>> {
        self.ensure_status(TransactionStatus::WaitingApproval, "approve")?;

        let (rejected_lines, approved_lines): (Vec<_>, Vec<_>) = self
            .state
            .lines
            .iter()
            .cloned()
            .partition(|line| cmd.rejected_item_ids.contains(&line.item_id));

        if approved_lines.is_empty() {
            return Err(DomainError::NoApprovableItems);
        }

        Ok(vec![TransactionEvent::Approved(TransactionApproved {
            approved_lines,
            rejected_lines,
            approved_by: cmd.approved_by,
            signature_image: cmd.signature_image.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectTransaction) -> DomainResult<Vec<TransactionEvent>> {
        self.ensure_status(TransactionStatus::WaitingApproval, "reject")?;

        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("reject reason is required"));
        }

        Ok(vec![TransactionEvent::Rejected(TransactionRejected {
            reason: cmd.reason.clone(),
            rejected_by: cmd.rejected_by,
            occurred_at: cmd.occurred_at,
        })])
    }
}

impl AggregateRoot for Transaction {
    type Id = TransactionId;

    fn id(&self) -> Self::Id {
        self.state.id
    }

    fn version(&self) -> u64 {
        self.state.version
    }
}

impl Aggregate for Transaction {
    type Command = TransactionCommand;
    type Event = TransactionEvent;

    fn apply(&mut self, event: &Self::Event) {
        let s = &mut self.state;
        match event {
            TransactionEvent::Updated(e) => {
                s.header = e.header.clone();
                s.lines = e.lines.clone();
                s.updated_at = e.occurred_at;
            }
            TransactionEvent::Submitted(e) => {
                s.status = TransactionStatus::WaitingApproval;
                s.submitted_at = Some(e.occurred_at);
                s.updated_at = e.occurred_at;
            }
            TransactionEvent::Approved(e) => {
                s.lines = e.approved_lines.clone();
                s.status = TransactionStatus::Approved;
                s.approved_by = Some(e.approved_by);
                s.approved_at = Some(e.occurred_at);
                s.signature_image = e.signature_image.clone();
                s.updated_at = e.occurred_at;
            }
            TransactionEvent::Rejected(e) => {
                s.status = TransactionStatus::Rejected;
                s.reject_reason = Some(e.reason.clone());
                s.rejected_by = Some(e.rejected_by);
                s.rejected_at = Some(e.occurred_at);
                s.updated_at = e.occurred_at;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        s.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> DomainResult<Vec<Self::Event>> {
        match command {
            TransactionCommand::Update(cmd) => self.handle_update(cmd),
            TransactionCommand::Submit(cmd) => self.handle_submit(cmd),
            TransactionCommand::Approve(cmd) => self.handle_approve(cmd),
            TransactionCommand::Reject(cmd) => self.handle_reject(cmd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{IncomingGoodsHeader, OutgoingGoodsHeader};
    use proptest::prelude::*;
    use stockroom_core::SupplierId;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn outgoing_header() -> TransactionHeader {
        TransactionHeader::OutgoingGoods(OutgoingGoodsHeader {
            destination: "Site B".to_string(),
            recipient_name: "Sam".to_string(),
            notes: None,
        })
    }

    fn open_with(lines: Vec<TransactionLine>) -> Transaction {
        Transaction::open(OpenTransaction {
            transaction_id: TransactionId::new(),
            number: "OUT-20260101-AB12".to_string(),
            header: outgoing_header(),
            lines,
            created_by: UserId::new(),
            occurred_at: test_time(),
        })
        .unwrap()
    }

    fn run(tx: &mut Transaction, cmd: TransactionCommand) -> DomainResult<Vec<TransactionEvent>> {
        let events = tx.handle(&cmd)?;
        for e in &events {
            tx.apply(e);
        }
        Ok(events)
    }

    fn submit(tx: &mut Transaction) {
        run(
            tx,
            TransactionCommand::Submit(SubmitTransaction {
                occurred_at: test_time(),
            }),
        )
        .unwrap();
    }

    fn approve_cmd(rejected: Vec<ItemId>) -> TransactionCommand {
        TransactionCommand::Approve(ApproveTransaction {
            rejected_item_ids: rejected,
            signature_image: Some("data:image/png;base64,AAAA".to_string()),
            approved_by: UserId::new(),
            occurred_at: test_time(),
        })
    }

    #[test]
    fn open_starts_in_draft_with_kind_from_header() {
        let tx = open_with(vec![TransactionLine::new(ItemId::new(), 4)]);
        assert_eq!(tx.status(), TransactionStatus::Draft);
        assert_eq!(tx.kind(), TransactionKind::OutgoingGoods);
        assert_eq!(tx.version(), 1);
    }

    #[test]
    fn open_rejects_empty_lines() {
        let err = Transaction::open(OpenTransaction {
            transaction_id: TransactionId::new(),
            number: "OUT-20260101-AB12".to_string(),
            header: outgoing_header(),
            lines: vec![],
            created_by: UserId::new(),
            occurred_at: test_time(),
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_replaces_lines_wholesale_while_draft() {
        let mut tx = open_with(vec![TransactionLine::new(ItemId::new(), 4)]);
        let replacement = vec![
            TransactionLine::new(ItemId::new(), 1),
            TransactionLine::new(ItemId::new(), 2),
        ];
        run(
            &mut tx,
            TransactionCommand::Update(UpdateTransaction {
                header: outgoing_header(),
                lines: replacement.clone(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        assert_eq!(tx.lines(), replacement.as_slice());
        assert_eq!(tx.status(), TransactionStatus::Draft);
    }

    #[test]
    fn update_cannot_change_kind() {
        let mut tx = open_with(vec![TransactionLine::new(ItemId::new(), 4)]);
        let err = run(
            &mut tx,
            TransactionCommand::Update(UpdateTransaction {
                header: TransactionHeader::IncomingGoods(IncomingGoodsHeader {
                    supplier_id: SupplierId::new(),
                    reference_number: None,
                    received_at: None,
                    notes: None,
                }),
                lines: vec![TransactionLine::new(ItemId::new(), 1)],
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_after_submit_is_invalid_state() {
        let mut tx = open_with(vec![TransactionLine::new(ItemId::new(), 4)]);
        submit(&mut tx);

        let err = run(
            &mut tx,
            TransactionCommand::Update(UpdateTransaction {
                header: outgoing_header(),
                lines: vec![TransactionLine::new(ItemId::new(), 1)],
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidState {
                current: "WAITING_APPROVAL".to_string(),
                action: "update",
            }
        );
    }

    #[test]
    fn approve_requires_waiting_approval() {
        let mut tx = open_with(vec![TransactionLine::new(ItemId::new(), 4)]);
        let err = run(&mut tx, approve_cmd(vec![])).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
        assert_eq!(tx.status(), TransactionStatus::Draft);
    }

    #[test]
    fn partial_approval_drops_rejected_item_lines() {
        let a = ItemId::new();
        let b = ItemId::new();
        let mut tx = open_with(vec![
            TransactionLine::new(a, 4),
            TransactionLine::new(b, 6),
        ]);
        submit(&mut tx);

        let events = run(&mut tx, approve_cmd(vec![b])).unwrap();
        match &events[0] {
            TransactionEvent::Approved(e) => {
                assert_eq!(e.approved_lines, vec![TransactionLine::new(a, 4)]);
                assert_eq!(e.rejected_lines, vec![TransactionLine::new(b, 6)]);
            }
            other => panic!("expected Approved, got {other:?}"),
        }
        assert_eq!(tx.status(), TransactionStatus::Approved);
        assert_eq!(tx.lines(), &[TransactionLine::new(a, 4)]);
        assert!(tx.record().approved_at.is_some());
        assert!(tx.record().signature_image.is_some());
    }

    #[test]
    fn rejecting_every_line_is_no_approvable_items() {
        let a = ItemId::new();
        let mut tx = open_with(vec![TransactionLine::new(a, 4)]);
        submit(&mut tx);

        let before = tx.clone();
        let err = run(&mut tx, approve_cmd(vec![a])).unwrap_err();
        assert_eq!(err, DomainError::NoApprovableItems);
        assert_eq!(tx, before);
    }

    #[test]
    fn terminal_states_do_not_reopen() {
        let mut tx = open_with(vec![TransactionLine::new(ItemId::new(), 4)]);
        submit(&mut tx);
        run(&mut tx, approve_cmd(vec![])).unwrap();

        assert!(run(&mut tx, approve_cmd(vec![])).is_err());
        let err = run(
            &mut tx,
            TransactionCommand::Reject(RejectTransaction {
                reason: "late".to_string(),
                rejected_by: UserId::new(),
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
        assert!(tx.status().is_terminal());
    }

    #[test]
    fn reject_records_reason_and_actor() {
        let mut tx = open_with(vec![TransactionLine::new(ItemId::new(), 4)]);
        submit(&mut tx);
        let by = UserId::new();
        run(
            &mut tx,
            TransactionCommand::Reject(RejectTransaction {
                reason: "wrong destination".to_string(),
                rejected_by: by,
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        assert_eq!(tx.status(), TransactionStatus::Rejected);
        assert_eq!(tx.record().reject_reason.as_deref(), Some("wrong destination"));
        assert_eq!(tx.record().rejected_by, Some(by));
        assert_eq!(tx.lines().len(), 1);
    }

    #[test]
    fn draft_only_delete_policy() {
        let mut tx = open_with(vec![TransactionLine::new(ItemId::new(), 4)]);
        assert!(tx.check_delete(DeletePolicy::DraftOnly).is_ok());
        submit(&mut tx);
        assert!(tx.check_delete(DeletePolicy::DraftOnly).is_err());
        assert!(tx.check_delete(DeletePolicy::AnyStatus).is_ok());
    }

    #[test]
    fn restore_rejects_kind_header_mismatch() {
        let tx = open_with(vec![TransactionLine::new(ItemId::new(), 4)]);
        let mut record = tx.into_record();
        record.kind = TransactionKind::PurchaseOrder;
        assert!(matches!(
            Transaction::restore(record),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    proptest! {
        #[test]
        fn approval_partitions_lines_in_order(
            quantities in prop::collection::vec(1i64..500, 1..8),
            reject_mask in prop::collection::vec(any::<bool>(), 8),
        ) {
            let items: Vec<ItemId> = quantities.iter().map(|_| ItemId::new()).collect();
            let lines: Vec<TransactionLine> = items
                .iter()
                .zip(&quantities)
                .map(|(id, q)| TransactionLine::new(*id, *q))
                .collect();
            let rejected: Vec<ItemId> = items
                .iter()
                .zip(&reject_mask)
                .filter(|(_, r)| **r)
                .map(|(id, _)| *id)
                .collect();

            let mut tx = open_with(lines.clone());
            submit(&mut tx);

            match run(&mut tx, approve_cmd(rejected.clone())) {
                Ok(events) => {
                    let TransactionEvent::Approved(e) = &events[0] else {
                        panic!("expected Approved");
                    };
                    prop_assert_eq!(e.approved_lines.len() + e.rejected_lines.len(), lines.len());
                    prop_assert!(e.approved_lines.iter().all(|l| !rejected.contains(&l.item_id)));
                    let expected: Vec<_> = lines.iter().filter(|l| !rejected.contains(&l.item_id)).cloned().collect();
                    prop_assert_eq!(&e.approved_lines, &expected);
                }
                Err(err) => {
                    prop_assert_eq!(err, DomainError::NoApprovableItems);
                    prop_assert_eq!(rejected.len(), lines.len());
                }
            }
        }
    }
}
