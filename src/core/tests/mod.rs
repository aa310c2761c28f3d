mod diner_state_tests;

use crate::core::config::DinerConfig;
use crate::core::customer::CustomerFactory;
use crate::core::diner_state::{DinerLayout, DinerState};
use crate::core::types::{CustomerId, CustomerType, TableBounds};

/// Diner with `tables` empty tables and default tuning
pub(crate) fn diner_with_tables(tables: usize) -> DinerState {
    let layout = DinerLayout {
        tables: vec![TableBounds::default(); tables],
        ..DinerLayout::default()
    };
    DinerState::with_layout(&DinerConfig::default(), &layout)
}

/// Push a customer of `customer_type` through the arrival queue into the
/// waiting list
pub(crate) fn admit(
    diner: &mut DinerState,
    factory: &mut CustomerFactory,
    customer_type: CustomerType,
) -> CustomerId {
    let customer = factory.create_of_type(customer_type);
    let id = customer.id();
    assert!(diner.arrival_queue().offer(customer));
    diner.process_arrivals();
    id
}

/// Tick `steps` times with a fixed `dt`, returning the total angry count
pub(crate) fn run_ticks(diner: &mut DinerState, steps: usize, dt: f32) -> u32 {
    (0..steps).map(|_| diner.update(dt)).sum()
}
