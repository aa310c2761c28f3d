use crate::core::customer::Customer;
use crate::core::types::{CustomerId, TableBounds, TableId};

/// A seat slot created during layout initialization.
///
/// The table holds the seated customer itself; whoever sits here is in no
/// other collection.
#[derive(Debug)]
pub struct Table {
    id: TableId,
    bounds: TableBounds,
    seated: Option<Customer>,
}

impl Table {
    pub fn new(id: TableId, bounds: TableBounds) -> Self {
        Self { id, bounds, seated: None }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn bounds(&self) -> TableBounds {
        self.bounds
    }

    pub fn is_occupied(&self) -> bool {
        self.seated.is_some()
    }

    pub fn seated_customer(&self) -> Option<&Customer> {
        self.seated.as_ref()
    }

    pub(crate) fn seated_customer_mut(&mut self) -> Option<&mut Customer> {
        self.seated.as_mut()
    }

    /// True if `customer_id` is the one sitting here
    pub fn seats(&self, customer_id: CustomerId) -> bool {
        self.seated.as_ref().map_or(false, |c| c.id() == customer_id)
    }

    pub(crate) fn occupy(&mut self, customer: Customer) {
        self.seated = Some(customer);
    }

    /// Empty the table, handing back whoever sat here
    pub(crate) fn vacate(&mut self) -> Option<Customer> {
        self.seated.take()
    }
}
