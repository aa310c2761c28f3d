use crate::core::config::ServiceTiming;
use crate::core::types::{CustomerId, CustomerState, CustomerType};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A single diner guest and its patience/timer bookkeeping.
///
/// Customers are only mutated by the orchestrator. Identity is the `id`;
/// two customers are never compared by value.
#[derive(Debug)]
pub struct Customer {
    id: CustomerId,
    customer_type: CustomerType,
    initial_patience: f32,
    score_value: u32,
    rate_multiplier: f32,
    state: CustomerState,
    patience: f32,
    time_until_ready_to_order: Option<f32>,
    time_until_food_ready: Option<f32>,
    time_until_finished_eating: Option<f32>,
}

impl Customer {
    pub(crate) fn new(id: CustomerId, customer_type: CustomerType) -> Self {
        let config = customer_type.config();
        let customer = Self {
            id,
            customer_type,
            initial_patience: config.initial_patience,
            score_value: config.score_value,
            rate_multiplier: config.patience_rate_multiplier,
            state: CustomerState::WaitingQueue,
            patience: config.initial_patience,
            time_until_ready_to_order: None,
            time_until_food_ready: None,
            time_until_finished_eating: None,
        };
        debug!(
            "[Customer {}] Created {:?} (patience: {}, rate: {}, score: {}, icon: {})",
            customer.display_id(),
            customer_type,
            customer.initial_patience,
            customer.rate_multiplier,
            customer.score_value,
            config.icon
        );
        customer
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn customer_type(&self) -> CustomerType {
        self.customer_type
    }

    /// Type prefix plus numeric id, e.g. `VIP12`
    pub fn display_id(&self) -> String {
        format!("{}{}", self.customer_type.display_prefix(), self.id)
    }

    pub fn state(&self) -> CustomerState {
        self.state
    }

    pub fn patience(&self) -> f32 {
        self.patience
    }

    pub fn initial_patience(&self) -> f32 {
        self.initial_patience
    }

    pub fn score_value(&self) -> u32 {
        self.score_value
    }

    pub fn rate_multiplier(&self) -> f32 {
        self.rate_multiplier
    }

    pub fn icon(&self) -> &'static str {
        self.customer_type.config().icon
    }

    /// Remaining patience as a fraction in `[0, 1]`
    pub fn patience_percentage(&self) -> f32 {
        if self.initial_patience <= 0.0 {
            return 0.0;
        }
        (self.patience / self.initial_patience).clamp(0.0, 1.0)
    }

    /// Move to `new_state`, restarting or clearing the order-ready timer.
    ///
    /// Entering `SeatedIdle` starts the order-ready countdown; entering any
    /// state other than `WaitingOrderConfirm` clears it.
    pub(crate) fn set_state(&mut self, new_state: CustomerState, timing: &ServiceTiming) {
        if self.state == new_state {
            return;
        }
        debug!("[Customer {}] {} -> {}", self.display_id(), self.state, new_state);
        self.state = new_state;

        match new_state {
            CustomerState::SeatedIdle => {
                self.time_until_ready_to_order = Some(timing.order_ready_delay);
                debug!(
                    "[Customer {}] Order-ready timer started ({}s)",
                    self.display_id(),
                    timing.order_ready_delay
                );
            }
            CustomerState::WaitingOrderConfirm => {}
            _ => self.time_until_ready_to_order = None,
        }
    }

    /// Terminal transition when patience runs out
    pub(crate) fn leave_angry(&mut self) {
        self.state = CustomerState::AngryLeft;
        self.patience = 0.0;
        self.time_until_ready_to_order = None;
        warn!("[Customer {}] Left angry!", self.display_id());
    }

    /// Drain patience by `rate * multiplier * dt`, floored at zero.
    ///
    /// Returns true once patience is exhausted.
    pub(crate) fn decrease_patience(&mut self, rate: f32, dt: f32) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.patience = (self.patience - rate * self.rate_multiplier * dt).max(0.0);
        self.patience <= 0.0
    }

    pub(crate) fn decrease_order_ready_timer(&mut self, dt: f32) {
        if self.state != CustomerState::SeatedIdle {
            return;
        }
        if let Some(remaining) = self.time_until_ready_to_order.as_mut() {
            if *remaining > 0.0 {
                *remaining -= dt;
            }
        }
    }

    pub(crate) fn start_cooking_timer(&mut self, duration: f32) {
        self.time_until_food_ready = Some(duration);
    }

    pub(crate) fn decrease_cooking_timer(&mut self, dt: f32) {
        if self.state != CustomerState::WaitingFood {
            return;
        }
        if let Some(remaining) = self.time_until_food_ready.as_mut() {
            if *remaining > 0.0 {
                *remaining -= dt;
            }
        }
    }

    pub(crate) fn start_eating_timer(&mut self, duration: f32) {
        self.time_until_finished_eating = Some(duration);
        debug!("[Customer {}] Eating timer started ({}s)", self.display_id(), duration);
    }

    pub(crate) fn decrease_eating_timer(&mut self, dt: f32) {
        if self.state != CustomerState::Eating {
            return;
        }
        if let Some(remaining) = self.time_until_finished_eating.as_mut() {
            if *remaining > 0.0 {
                *remaining -= dt;
            }
        }
    }

    pub fn time_until_ready_to_order(&self) -> Option<f32> {
        self.time_until_ready_to_order
    }

    pub fn time_until_food_ready(&self) -> Option<f32> {
        self.time_until_food_ready
    }

    pub fn time_until_finished_eating(&self) -> Option<f32> {
        self.time_until_finished_eating
    }

    pub fn is_ready_to_order(&self) -> bool {
        self.state == CustomerState::SeatedIdle && expired(self.time_until_ready_to_order)
    }

    pub fn is_cooking_finished(&self) -> bool {
        self.state == CustomerState::WaitingFood && expired(self.time_until_food_ready)
    }

    pub fn is_finished_eating(&self) -> bool {
        self.state == CustomerState::Eating && expired(self.time_until_finished_eating)
    }
}

fn expired(timer: Option<f32>) -> bool {
    matches!(timer, Some(remaining) if remaining <= 0.0)
}

/// Builds customers with monotonically increasing ids and random types.
///
/// The id counter and RNG are owned here rather than global so runs can be
/// reproduced from a seed.
#[derive(Debug)]
pub struct CustomerFactory {
    next_id: u64,
    rng: StdRng,
}

impl CustomerFactory {
    /// Factory with a deterministic RNG
    pub fn with_seed(seed: u64) -> Self {
        Self {
            next_id: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Factory seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            next_id: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// Start numbering at `first_id` instead of zero
    pub fn starting_at(mut self, first_id: u64) -> Self {
        self.next_id = first_id;
        self
    }

    /// Create a customer of a uniformly random type
    pub fn create(&mut self) -> Customer {
        let index = self.rng.gen_range(0..CustomerType::ALL.len());
        self.create_of_type(CustomerType::ALL[index])
    }

    /// Create a customer of a specific type
    pub fn create_of_type(&mut self, customer_type: CustomerType) -> Customer {
        let id = CustomerId(self.next_id);
        self.next_id += 1;
        Customer::new(id, customer_type)
    }

    /// Id the next customer will receive
    pub fn peek_next_id(&self) -> CustomerId {
        CustomerId(self.next_id)
    }

    /// Restart numbering from zero. Test setup only.
    pub fn reset_ids(&mut self) {
        self.next_id = 0;
    }
}
