use order_batch_types::{
    DraftOrder, FieldUpdate, OrderFields, OrderId, RunOutcome, RunReport, ValidationStatus,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::validator::OrderValidator;

/// Ordered collection of draft orders being edited by the user
///
/// Every mutator re-validates the orders it touches before returning, so
/// `status` always reflects the current fields.
#[derive(Debug)]
pub struct DraftStore {
    validator: OrderValidator,
    orders: Vec<DraftOrder>,
    next_id: u64,
}

/// Counts of drafts by validation status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub total: usize,
    pub pending: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl DraftStore {
    pub fn new(validator: OrderValidator) -> Self {
        Self {
            validator,
            orders: Vec::new(),
            next_id: 1,
        }
    }

    pub fn validator(&self) -> &OrderValidator {
        &self.validator
    }

    /// Swap in a new validator and re-validate every order against it
    pub fn set_validator(&mut self, validator: OrderValidator) {
        self.validator = validator;
        for order in &mut self.orders {
            order.status = self.validator.validate(&order.fields);
        }
    }

    /// Append a new draft order
    pub fn add(&mut self, fields: OrderFields) -> OrderId {
        let id = self.allocate_id();
        let mut order = DraftOrder::new(id, fields);
        order.status = self.validator.validate(&order.fields);

        debug!(order_id = %id, valid = order.is_valid(), "Draft order added");
        self.orders.push(order);
        id
    }

    /// Remove a draft order
    pub fn remove(&mut self, id: OrderId) -> Result<DraftOrder, StoreError> {
        let index = self.position(id)?;
        Ok(self.orders.remove(index))
    }

    /// Copy a draft order, placing the copy directly after the original
    pub fn duplicate(&mut self, id: OrderId) -> Result<OrderId, StoreError> {
        let index = self.position(id)?;
        let new_id = self.allocate_id();

        let mut copy = DraftOrder::new(new_id, self.orders[index].fields.clone());
        copy.status = self.validator.validate(&copy.fields);
        self.orders.insert(index + 1, copy);

        Ok(new_id)
    }

    /// Edit one field of a draft order
    pub fn update(
        &mut self,
        id: OrderId,
        update: &FieldUpdate,
    ) -> Result<&DraftOrder, StoreError> {
        let index = self.position(id)?;
        let order = &mut self.orders[index];

        update.apply_to(&mut order.fields);
        order.status = self.validator.validate(&order.fields);
        order.touch();

        Ok(order)
    }

    /// Apply one field edit to several orders
    ///
    /// All targets are checked before anything changes, so an unknown id
    /// leaves the store untouched.
    pub fn bulk_apply(
        &mut self,
        update: &FieldUpdate,
        targets: &[OrderId],
    ) -> Result<usize, StoreError> {
        let indices = targets
            .iter()
            .map(|id| self.position(*id))
            .collect::<Result<Vec<_>, _>>()?;

        for &index in &indices {
            let order = &mut self.orders[index];
            update.apply_to(&mut order.fields);
            order.status = self.validator.validate(&order.fields);
            order.touch();
        }

        debug!(
            field = update.field_name(),
            targets = indices.len(),
            "Bulk edit applied"
        );
        Ok(indices.len())
    }

    /// Remove every draft order
    pub fn clear(&mut self) {
        self.orders.clear();
    }

    pub fn items(&self) -> &[DraftOrder] {
        &self.orders
    }

    pub fn get(&self, id: OrderId) -> Option<&DraftOrder> {
        self.orders.iter().find(|order| order.id == id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn summary(&self) -> StoreSummary {
        let mut summary = StoreSummary {
            total: self.orders.len(),
            ..Default::default()
        };

        for order in &self.orders {
            match order.status {
                ValidationStatus::Pending => summary.pending += 1,
                ValidationStatus::Valid => summary.valid += 1,
                ValidationStatus::Invalid(_) => summary.invalid += 1,
            }
        }

        summary
    }

    /// Clone of the currently valid orders, in store order
    ///
    /// A run works on this copy, so later edits never reach it.
    pub fn valid_snapshot(&self) -> Vec<DraftOrder> {
        self.orders
            .iter()
            .filter(|order| order.is_valid())
            .cloned()
            .collect()
    }

    /// Drop orders whose last run outcome was a success
    pub fn remove_succeeded(&mut self) -> usize {
        let before = self.orders.len();
        self.orders
            .retain(|order| !matches!(order.last_outcome, Some(RunOutcome::Succeeded)));
        before - self.orders.len()
    }

    /// Write a finished run's per-order outcomes back onto the drafts
    ///
    /// Orders removed or edited while the run was in flight are skipped,
    /// since the outcome describes fields they no longer carry. Returns the
    /// number of orders updated.
    pub fn record_outcomes(&mut self, report: &RunReport) -> usize {
        let mut applied = 0;
        for item in &report.outcomes {
            let Some(order) = self.orders.iter_mut().find(|o| o.id == item.order_id) else {
                warn!(order_id = %item.order_id, "Draft removed during the run, outcome dropped");
                continue;
            };
            if order.revision != item.revision {
                warn!(
                    order_id = %item.order_id,
                    submitted = item.revision,
                    current = order.revision,
                    "Draft edited during the run, outcome dropped"
                );
                continue;
            }
            order.last_outcome = Some(item.outcome.clone());
            applied += 1;
        }
        applied
    }

    fn allocate_id(&mut self) -> OrderId {
        let id = OrderId(self.next_id);
        self.next_id += 1;
        id
    }

    fn position(&self, id: OrderId) -> Result<usize, StoreError> {
        self.orders
            .iter()
            .position(|order| order.id == id)
            .ok_or(StoreError::OrderNotFound(id))
    }
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new(OrderValidator::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    OrderNotFound(OrderId),
}
