use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use facture_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, Entity, EntityId, Money, ValueObject,
};
use facture_events::Event;

use crate::totals;

/// Invoice identifier (one invoice per form session).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Line-item identifier (unique within an invoice, opaque to the form).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub EntityId);

impl LineItemId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Issuer details shown in the invoice header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    /// Present in the form model but not rendered anywhere yet.
    pub logo: Option<String>,
}

impl ValueObject for BusinessDetails {}

/// Billed-party details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

impl ValueObject for ClientInfo {}

/// Editable field of the issuer block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessField {
    Name,
    Address,
    Email,
    Phone,
    Logo,
}

/// Editable field of the client block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientField {
    Name,
    Email,
    Address,
    Phone,
}

/// Editable field of a line item.
///
/// `amount` is derived and deliberately has no variant here, so it can never
/// be set from outside the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemField {
    Description,
    Quantity,
    Rate,
}

impl LineItemField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemField::Description => "description",
            LineItemField::Quantity => "quantity",
            LineItemField::Rate => "rate",
        }
    }
}

/// One billable row.
///
/// `amount` is always `quantity x rate`; it is recomputed on every
/// quantity/rate change inside `apply` and exposed read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: LineItemId,
    description: String,
    quantity: u32,
    rate: Money,
    amount: Money,
}

impl LineItem {
    /// Fresh row as added by the form: empty description, quantity 1, rate 0.
    pub(crate) fn fresh(id: LineItemId) -> Self {
        Self::from_parts(id, String::new(), 1, Money::ZERO)
    }

    pub(crate) fn from_parts(
        id: LineItemId,
        description: String,
        quantity: u32,
        rate: Money,
    ) -> Self {
        Self {
            id,
            description,
            quantity,
            rate,
            amount: rate.saturating_mul(quantity),
        }
    }

    pub fn id_typed(&self) -> LineItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn rate(&self) -> Money {
        self.rate
    }

    pub fn amount(&self) -> Money {
        self.amount
    }
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Aggregate root: Invoice.
///
/// Holds the current form state and preserves the derived-state invariants:
/// `subtotal = sum(amount)`, `tax = 10% of subtotal`, `total = subtotal + tax`,
/// all recomputed synchronously on every line-item mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    invoice_number: String,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    business: BusinessDetails,
    client: ClientInfo,
    line_items: Vec<LineItem>,
    subtotal: Money,
    tax: Money,
    total: Money,
    notes: Option<String>,
    version: u64,
    opened: bool,
}

impl Invoice {
    /// Create an empty, not-yet-opened aggregate instance for rehydration.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            invoice_number: String::new(),
            issue_date: NaiveDate::default(),
            due_date: NaiveDate::default(),
            business: BusinessDetails::default(),
            client: ClientInfo::default(),
            line_items: Vec::new(),
            subtotal: Money::ZERO,
            tax: Money::ZERO,
            total: Money::ZERO,
            notes: None,
            version: 0,
            opened: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn business(&self) -> &BusinessDetails {
        &self.business
    }

    pub fn client(&self) -> &ClientInfo {
        &self.client
    }

    /// Line items in insertion order (display order).
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn line_item(&self, id: LineItemId) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.id == id)
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenInvoice (session start, carries the generated defaults).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenInvoice {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateBusinessDetails (replace one issuer field, free text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBusinessDetails {
    pub invoice_id: InvoiceId,
    pub field: BusinessField,
    pub value: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateClientInfo (replace one client field, free text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateClientInfo {
    pub invoice_id: InvoiceId,
    pub field: ClientField,
    pub value: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLineItem (append a fresh row with the given id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLineItem {
    pub invoice_id: InvoiceId,
    pub line_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateLineItem (raw form input; parsed and validated in `handle`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLineItem {
    pub invoice_id: InvoiceId,
    pub line_item_id: LineItemId,
    pub field: LineItemField,
    pub value: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLineItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLineItem {
    pub invoice_id: InvoiceId,
    pub line_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    OpenInvoice(OpenInvoice),
    UpdateBusinessDetails(UpdateBusinessDetails),
    UpdateClientInfo(UpdateClientInfo),
    AddLineItem(AddLineItem),
    UpdateLineItem(UpdateLineItem),
    RemoveLineItem(RemoveLineItem),
}

/// Event: InvoiceOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceOpened {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BusinessDetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetailsUpdated {
    pub invoice_id: InvoiceId,
    pub field: BusinessField,
    pub value: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ClientInfoUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfoUpdated {
    pub invoice_id: InvoiceId,
    pub field: ClientField,
    pub value: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemAdded {
    pub invoice_id: InvoiceId,
    pub line_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Validated, typed outcome of a line-item edit.
///
/// Parsing happens in `handle`, so events only ever carry values the
/// aggregate can apply without failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemChange {
    Description(String),
    Quantity(u32),
    Rate(Money),
}

/// Event: LineItemUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemUpdated {
    pub invoice_id: InvoiceId,
    pub line_item_id: LineItemId,
    pub change: LineItemChange,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRemoved {
    pub invoice_id: InvoiceId,
    pub line_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceOpened(InvoiceOpened),
    BusinessDetailsUpdated(BusinessDetailsUpdated),
    ClientInfoUpdated(ClientInfoUpdated),
    LineItemAdded(LineItemAdded),
    LineItemUpdated(LineItemUpdated),
    LineItemRemoved(LineItemRemoved),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceOpened(_) => "invoicing.invoice.opened",
            InvoiceEvent::BusinessDetailsUpdated(_) => "invoicing.invoice.business_details_updated",
            InvoiceEvent::ClientInfoUpdated(_) => "invoicing.invoice.client_info_updated",
            InvoiceEvent::LineItemAdded(_) => "invoicing.invoice.line_item_added",
            InvoiceEvent::LineItemUpdated(_) => "invoicing.invoice.line_item_updated",
            InvoiceEvent::LineItemRemoved(_) => "invoicing.invoice.line_item_removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceOpened(e) => e.occurred_at,
            InvoiceEvent::BusinessDetailsUpdated(e) => e.occurred_at,
            InvoiceEvent::ClientInfoUpdated(e) => e.occurred_at,
            InvoiceEvent::LineItemAdded(e) => e.occurred_at,
            InvoiceEvent::LineItemUpdated(e) => e.occurred_at,
            InvoiceEvent::LineItemRemoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceOpened(e) => {
                self.id = e.invoice_id;
                self.invoice_number = e.invoice_number.clone();
                self.issue_date = e.issue_date;
                self.due_date = e.due_date;
                self.opened = true;
            }
            InvoiceEvent::BusinessDetailsUpdated(e) => match e.field {
                BusinessField::Name => self.business.name = e.value.clone(),
                BusinessField::Address => self.business.address = e.value.clone(),
                BusinessField::Email => self.business.email = e.value.clone(),
                BusinessField::Phone => self.business.phone = e.value.clone(),
                BusinessField::Logo => self.business.logo = Some(e.value.clone()),
            },
            InvoiceEvent::ClientInfoUpdated(e) => match e.field {
                ClientField::Name => self.client.name = e.value.clone(),
                ClientField::Email => self.client.email = e.value.clone(),
                ClientField::Address => self.client.address = e.value.clone(),
                ClientField::Phone => self.client.phone = e.value.clone(),
            },
            InvoiceEvent::LineItemAdded(e) => {
                self.line_items.push(LineItem::fresh(e.line_item_id));
                self.recompute_totals();
            }
            InvoiceEvent::LineItemUpdated(e) => {
                if let Some(item) = self
                    .line_items
                    .iter_mut()
                    .find(|item| item.id == e.line_item_id)
                {
                    match &e.change {
                        LineItemChange::Description(description) => {
                            item.description = description.clone();
                        }
                        LineItemChange::Quantity(quantity) => {
                            item.quantity = *quantity;
                            item.amount = item.rate.saturating_mul(*quantity);
                        }
                        LineItemChange::Rate(rate) => {
                            item.rate = *rate;
                            item.amount = rate.saturating_mul(item.quantity);
                        }
                    }
                }
                self.recompute_totals();
            }
            InvoiceEvent::LineItemRemoved(e) => {
                self.line_items.retain(|item| item.id != e.line_item_id);
                self.recompute_totals();
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::OpenInvoice(cmd) => self.handle_open(cmd),
            InvoiceCommand::UpdateBusinessDetails(cmd) => self.handle_update_business(cmd),
            InvoiceCommand::UpdateClientInfo(cmd) => self.handle_update_client(cmd),
            InvoiceCommand::AddLineItem(cmd) => self.handle_add_line_item(cmd),
            InvoiceCommand::UpdateLineItem(cmd) => self.handle_update_line_item(cmd),
            InvoiceCommand::RemoveLineItem(cmd) => self.handle_remove_line_item(cmd),
        }
    }
}

impl Invoice {
    fn recompute_totals(&mut self) {
        let totals = totals::compute(&self.line_items);
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.total = totals.total;
    }

    fn ensure_opened(&self) -> Result<(), DomainError> {
        if !self.opened {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_invoice_id(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if self.id != invoice_id {
            return Err(DomainError::invariant("invoice_id mismatch"));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if self.opened {
            return Err(DomainError::conflict("invoice already opened"));
        }

        if cmd.invoice_number.trim().is_empty() {
            return Err(DomainError::validation(
                "invoice_number",
                "cannot be empty",
            ));
        }

        Ok(vec![InvoiceEvent::InvoiceOpened(InvoiceOpened {
            invoice_id: cmd.invoice_id,
            invoice_number: cmd.invoice_number.clone(),
            issue_date: cmd.issue_date,
            due_date: cmd.due_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_business(
        &self,
        cmd: &UpdateBusinessDetails,
    ) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_invoice_id(cmd.invoice_id)?;

        // Free text, no validation; totals are untouched.
        Ok(vec![InvoiceEvent::BusinessDetailsUpdated(
            BusinessDetailsUpdated {
                invoice_id: cmd.invoice_id,
                field: cmd.field,
                value: cmd.value.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_update_client(
        &self,
        cmd: &UpdateClientInfo,
    ) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_invoice_id(cmd.invoice_id)?;

        Ok(vec![InvoiceEvent::ClientInfoUpdated(ClientInfoUpdated {
            invoice_id: cmd.invoice_id,
            field: cmd.field,
            value: cmd.value.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line_item(&self, cmd: &AddLineItem) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_invoice_id(cmd.invoice_id)?;

        if self.line_item(cmd.line_item_id).is_some() {
            return Err(DomainError::conflict("line item already exists"));
        }

        Ok(vec![InvoiceEvent::LineItemAdded(LineItemAdded {
            invoice_id: cmd.invoice_id,
            line_item_id: cmd.line_item_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_line_item(
        &self,
        cmd: &UpdateLineItem,
    ) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_invoice_id(cmd.invoice_id)?;

        let item = self
            .line_item(cmd.line_item_id)
            .ok_or_else(DomainError::not_found)?;

        let change = parse_change(item, cmd.field, &cmd.value)?;

        Ok(vec![InvoiceEvent::LineItemUpdated(LineItemUpdated {
            invoice_id: cmd.invoice_id,
            line_item_id: cmd.line_item_id,
            change,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_line_item(
        &self,
        cmd: &RemoveLineItem,
    ) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_invoice_id(cmd.invoice_id)?;

        if self.line_item(cmd.line_item_id).is_none() {
            return Err(DomainError::not_found());
        }

        Ok(vec![InvoiceEvent::LineItemRemoved(LineItemRemoved {
            invoice_id: cmd.invoice_id,
            line_item_id: cmd.line_item_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

/// Parse raw form input into a typed change for one line-item field.
///
/// Policy: non-numeric quantity/rate input is rejected with a validation
/// error; negative values clamp to zero. The prospective amount is
/// overflow-checked here so `apply` can stay infallible.
fn parse_change(
    item: &LineItem,
    field: LineItemField,
    value: &str,
) -> Result<LineItemChange, DomainError> {
    match field {
        LineItemField::Description => Ok(LineItemChange::Description(value.to_string())),
        LineItemField::Quantity => {
            let parsed: i64 = value
                .trim()
                .parse()
                .map_err(|_| DomainError::validation(field.as_str(), "not a whole number"))?;
            let quantity = u32::try_from(parsed.max(0))
                .map_err(|_| DomainError::validation(field.as_str(), "out of range"))?;
            item.rate
                .checked_mul(quantity)
                .ok_or_else(|| DomainError::invariant("line item amount overflow"))?;
            Ok(LineItemChange::Quantity(quantity))
        }
        LineItemField::Rate => {
            let rate = value
                .parse::<Money>()
                .map_err(|e| DomainError::validation(field.as_str(), e.to_string()))?
                .clamp_non_negative();
            rate.checked_mul(item.quantity)
                .ok_or_else(|| DomainError::invariant("line item amount overflow"))?;
            Ok(LineItemChange::Rate(rate))
        }
    }
}
