//! The diner orchestrator.
//!
//! `DinerState` owns every customer in play (waiting list and tables), the
//! score/lives/level counters and the arrival queue. It exposes the per-frame
//! [`update`](DinerState::update) tick and the player-intent operations. All
//! mutation must be serialized; [`SharedDiner`] provides the single lock used
//! by the scheduler and the input context.

use crate::core::arrivals::{ArrivalQueue, GeneratorHandle, ScoreProbe};
use crate::core::config::{DinerConfig, ServiceTiming};
use crate::core::customer::Customer;
use crate::core::error::{DinerError, DinerResult};
use crate::core::scoreboard::ScoreBoard;
use crate::core::table::Table;
use crate::core::types::{CustomerId, CustomerState, CustomerType, TableBounds, TableId};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Opaque geometry supplied by the layout collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DinerLayout {
    pub counter: Option<TableBounds>,
    pub door: Option<TableBounds>,
    pub tables: Vec<TableBounds>,
}

#[derive(Debug)]
pub struct DinerState {
    session_id: Uuid,
    service: ServiceTiming,
    waiting: Vec<Customer>,
    tables: Vec<Table>,
    arrival_queue: ArrivalQueue,
    counter_bounds: Option<TableBounds>,
    door_bounds: Option<TableBounds>,
    board: ScoreBoard,
    game_over: bool,
    generator: Option<GeneratorHandle>,
}

impl DinerState {
    /// Empty diner with no tables
    pub fn new(config: &DinerConfig) -> Self {
        let state = Self {
            session_id: Uuid::new_v4(),
            service: config.service,
            waiting: Vec::new(),
            tables: Vec::new(),
            arrival_queue: ArrivalQueue::new(config.arrivals.queue_capacity),
            counter_bounds: None,
            door_bounds: None,
            board: ScoreBoard::new(&config.progression),
            game_over: false,
            generator: None,
        };
        info!(
            "[DinerState] Session {} start - lives: {}, level: {}, next level at {}",
            state.session_id,
            state.board.player_lives(),
            state.board.current_level(),
            state.board.score_for_next_level()
        );
        state
    }

    /// Diner with tables and fixtures from `layout`
    pub fn with_layout(config: &DinerConfig, layout: &DinerLayout) -> Self {
        let mut state = Self::new(config);
        state.counter_bounds = layout.counter;
        state.door_bounds = layout.door;
        state.initialize_tables(&layout.tables);
        state
    }

    /// Replace the table set with one table per slot, ids `0..n` in slot order
    pub fn initialize_tables(&mut self, slots: &[TableBounds]) {
        self.tables = slots
            .iter()
            .enumerate()
            .map(|(index, bounds)| Table::new(TableId(index), *bounds))
            .collect();
        debug!("[DinerState] Initialized {} tables", self.tables.len());
    }

    /// Attach the generator to stop when the game ends
    pub fn set_generator(&mut self, generator: GeneratorHandle) {
        self.generator = Some(generator);
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn arrival_queue(&self) -> &ArrivalQueue {
        &self.arrival_queue
    }

    pub fn waiting_customers(&self) -> &[Customer] {
        &self.waiting
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id() == id)
    }

    pub fn counter_bounds(&self) -> Option<TableBounds> {
        self.counter_bounds
    }

    pub fn door_bounds(&self) -> Option<TableBounds> {
        self.door_bounds
    }

    pub fn scoreboard(&self) -> &ScoreBoard {
        &self.board
    }

    /// Continue from previously saved counters
    pub fn restore_scoreboard(&mut self, board: ScoreBoard) {
        self.board = board;
    }

    pub fn score(&self) -> u32 {
        self.board.score()
    }

    pub fn player_lives(&self) -> u32 {
        self.board.player_lives()
    }

    pub fn max_lives(&self) -> u32 {
        self.board.max_lives()
    }

    pub fn current_level(&self) -> u32 {
        self.board.current_level()
    }

    pub fn score_for_next_level(&self) -> u32 {
        self.board.score_for_next_level()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Look a customer up in the waiting list or at any table
    pub fn find_customer(&self, id: CustomerId) -> Option<&Customer> {
        self.waiting
            .iter()
            .find(|c| c.id() == id)
            .or_else(|| {
                self.tables
                    .iter()
                    .filter_map(Table::seated_customer)
                    .find(|c| c.id() == id)
            })
    }

    /// Table seating `id`, if any
    pub fn table_of(&self, id: CustomerId) -> Option<TableId> {
        self.tables.iter().find(|t| t.seats(id)).map(Table::id)
    }

    fn find_customer_mut(&mut self, id: CustomerId) -> Option<&mut Customer> {
        if let Some(index) = self.waiting.iter().position(|c| c.id() == id) {
            return self.waiting.get_mut(index);
        }
        self.tables
            .iter_mut()
            .filter_map(Table::seated_customer_mut)
            .find(|c| c.id() == id)
    }

    fn table_mut(&mut self, id: TableId) -> DinerResult<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or(DinerError::UnknownTable(id))
    }

    /// Advance every customer by `dt` seconds.
    ///
    /// The waiting list is processed before the tables, each in collection
    /// order. Returns how many customers left angry during this tick.
    pub fn update(&mut self, dt: f32) -> u32 {
        if self.game_over {
            return 0;
        }

        let rate = self.service.patience_decrease_rate;
        let mut angry_leaves = 0;
        let board = &mut self.board;

        self.waiting.retain_mut(|customer| {
            if customer.state() != CustomerState::WaitingQueue {
                return true;
            }
            if !customer.decrease_patience(rate, dt) {
                return true;
            }
            customer.leave_angry();
            let lives = board.lose_life();
            angry_leaves += 1;
            info!(
                "[DinerState] {} left angry from waiting. Lives remaining: {}",
                customer.display_id(),
                lives
            );
            false
        });

        for table in &mut self.tables {
            let left_angry = match table.seated_customer_mut() {
                Some(customer) if !customer.state().is_terminal() => {
                    advance_seated(customer, &self.service, dt)
                }
                _ => false,
            };
            if !left_angry {
                continue;
            }
            if let Some(customer) = table.vacate() {
                let lives = board.lose_life();
                angry_leaves += 1;
                info!(
                    "[DinerState] {} left angry from table {}. Lives remaining: {}",
                    customer.display_id(),
                    table.id(),
                    lives
                );
            }
        }

        if !self.game_over && self.board.is_out_of_lives() {
            self.game_over = true;
            info!(
                "[DinerState] GAME OVER - session {} ended with score {}",
                self.session_id,
                self.board.score()
            );
            match &self.generator {
                Some(generator) => {
                    if !generator.stop_generating() {
                        warn!("[DinerState] Arrival generator was already stopped");
                    }
                }
                None => warn!("[DinerState] Cannot stop arrival generator: none attached"),
            }
        }

        angry_leaves
    }

    /// Move every queued arrival onto the end of the waiting list
    pub fn process_arrivals(&mut self) -> usize {
        let moved = self.arrival_queue.drain_into(&mut self.waiting);
        if moved > 0 {
            debug!(
                "[DinerState] Moved {} customers to waiting list. Total waiting: {}",
                moved,
                self.waiting.len()
            );
        }
        moved
    }

    /// Seat a waiting customer at a free table
    pub fn seat(&mut self, customer_id: CustomerId, table_id: TableId) -> DinerResult<()> {
        let index = self
            .waiting
            .iter()
            .position(|c| c.id() == customer_id)
            .ok_or(DinerError::CustomerNotWaiting(customer_id))?;

        let service = self.service;
        let table = self
            .tables
            .iter_mut()
            .find(|t| t.id() == table_id)
            .ok_or(DinerError::UnknownTable(table_id))?;
        if table.is_occupied() {
            return Err(DinerError::TableOccupied(table_id));
        }

        let mut customer = self.waiting.remove(index);
        customer.set_state(CustomerState::SeatedIdle, &service);
        info!(
            "[DinerState] Seated {} at table {} (waiting: {})",
            customer.display_id(),
            table_id,
            self.waiting.len()
        );
        table.occupy(customer);
        Ok(())
    }

    /// Boolean form of [`seat`](Self::seat) for the input collaborator
    pub fn try_seat_customer_by_drag(
        &mut self,
        customer_id: CustomerId,
        table_id: TableId,
    ) -> bool {
        match self.seat(customer_id, table_id) {
            Ok(()) => true,
            Err(e) => {
                warn!("[DinerState] SEATING FAILED: {}", e);
                false
            }
        }
    }

    /// Take the order of a customer waiting for confirmation and start cooking
    pub fn confirm_order(&mut self, customer_id: CustomerId) -> DinerResult<()> {
        let service = self.service;
        let customer = self
            .find_customer_mut(customer_id)
            .ok_or(DinerError::UnknownCustomer(customer_id))?;
        expect_state(customer, CustomerState::WaitingOrderConfirm)?;

        customer.set_state(CustomerState::WaitingFood, &service);
        customer.start_cooking_timer(service.cook_duration);
        debug!(
            "[DinerState] Order confirmed for {}, cooking for {}s",
            customer.display_id(),
            service.cook_duration
        );
        Ok(())
    }

    pub fn confirm_customer_order(&mut self, customer_id: CustomerId) -> bool {
        match self.confirm_order(customer_id) {
            Ok(()) => true,
            Err(e) => {
                warn!("[DinerState] Order confirmation rejected: {}", e);
                false
            }
        }
    }

    /// Hand a finished dish to the customer seated at `table_id`
    pub fn deliver(&mut self, customer_id: CustomerId, table_id: TableId) -> DinerResult<()> {
        let service = self.service;
        let table = self.table_mut(table_id)?;
        let customer = table
            .seated_customer_mut()
            .ok_or(DinerError::TableNotOccupied(table_id))?;
        if customer.id() != customer_id {
            return Err(DinerError::WrongCustomer {
                table: table_id,
                seated: customer.id(),
                requested: customer_id,
            });
        }
        expect_state(customer, CustomerState::FoodReady)?;

        customer.set_state(CustomerState::Eating, &service);
        customer.start_eating_timer(service.eating_duration);
        info!(
            "[DinerState] Food delivered to {} at table {}",
            customer.display_id(),
            table_id
        );
        Ok(())
    }

    pub fn deliver_food(&mut self, customer_id: CustomerId, table_id: TableId) -> bool {
        match self.deliver(customer_id, table_id) {
            Ok(()) => true,
            Err(e) => {
                warn!("[DinerState] DELIVERY FAILED: {}", e);
                false
            }
        }
    }

    /// Clear the table of a customer who finished eating and award their
    /// score. Returns the points awarded.
    pub fn clear_table(&mut self, customer_id: CustomerId) -> DinerResult<u32> {
        let customer = self
            .find_customer(customer_id)
            .ok_or(DinerError::UnknownCustomer(customer_id))?;
        expect_state(customer, CustomerState::ReadyToLeave)?;

        let table = self
            .tables
            .iter_mut()
            .find(|t| t.seats(customer_id))
            .ok_or(DinerError::UnknownCustomer(customer_id))?;
        let table_id = table.id();
        let points = match table.vacate() {
            Some(customer) => customer.score_value(),
            None => return Err(DinerError::TableNotOccupied(table_id)),
        };

        self.board.award(points);
        info!(
            "[DinerState] Cleared table {}. Awarded {} points. Total score: {}",
            table_id,
            points,
            self.board.score()
        );
        Ok(points)
    }

    pub fn clear_table_for_customer(&mut self, customer_id: CustomerId) -> bool {
        match self.clear_table(customer_id) {
            Ok(_) => true,
            Err(e) => {
                warn!("[DinerState] Table clear rejected: {}", e);
                false
            }
        }
    }

    /// Owned copy of everything a renderer needs
    pub fn snapshot(&self) -> DinerSnapshot {
        DinerSnapshot {
            session_id: self.session_id,
            score: self.board.score(),
            player_lives: self.board.player_lives(),
            max_lives: self.board.max_lives(),
            current_level: self.board.current_level(),
            score_for_next_level: self.board.score_for_next_level(),
            game_over: self.game_over,
            waiting: self.waiting.iter().map(|c| CustomerView::of(c, None)).collect(),
            tables: self
                .tables
                .iter()
                .map(|t| TableView {
                    id: t.id(),
                    bounds: t.bounds(),
                    customer: t.seated_customer().map(|c| CustomerView::of(c, Some(t.id()))),
                })
                .collect(),
        }
    }
}

/// Run the state timer for a seated customer, then drain patience.
///
/// Returns true if the customer ran out of patience and left.
fn advance_seated(customer: &mut Customer, service: &ServiceTiming, dt: f32) -> bool {
    match customer.state() {
        CustomerState::SeatedIdle => {
            customer.decrease_order_ready_timer(dt);
            if customer.is_ready_to_order() {
                customer.set_state(CustomerState::WaitingOrderConfirm, service);
            }
        }
        CustomerState::WaitingFood => {
            customer.decrease_cooking_timer(dt);
            if customer.is_cooking_finished() {
                customer.set_state(CustomerState::FoodReady, service);
                debug!("[DinerState] Food ready for {}", customer.display_id());
            }
        }
        CustomerState::Eating => {
            customer.decrease_eating_timer(dt);
            if customer.is_finished_eating() {
                customer.set_state(CustomerState::ReadyToLeave, service);
                debug!("[DinerState] {} is ready to leave", customer.display_id());
            }
        }
        _ => {}
    }

    if customer.state().decays_patience()
        && customer.decrease_patience(service.patience_decrease_rate, dt)
    {
        customer.leave_angry();
        return true;
    }
    false
}

fn expect_state(customer: &Customer, expected: CustomerState) -> DinerResult<()> {
    if customer.state() == expected {
        Ok(())
    } else {
        Err(DinerError::WrongState {
            customer: customer.id(),
            expected,
            actual: customer.state(),
        })
    }
}

/// Serializable per-customer view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerView {
    pub id: CustomerId,
    pub display_id: String,
    pub customer_type: CustomerType,
    /// Asset key for the customer sprite
    pub icon: String,
    pub state: CustomerState,
    pub patience_percentage: f32,
    pub table: Option<TableId>,
}

impl CustomerView {
    fn of(customer: &Customer, table: Option<TableId>) -> Self {
        Self {
            id: customer.id(),
            display_id: customer.display_id(),
            customer_type: customer.customer_type(),
            icon: customer.icon().to_string(),
            state: customer.state(),
            patience_percentage: customer.patience_percentage(),
            table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub id: TableId,
    pub bounds: TableBounds,
    pub customer: Option<CustomerView>,
}

/// Point-in-time copy of the diner for collaborators that must not hold the lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DinerSnapshot {
    pub session_id: Uuid,
    pub score: u32,
    pub player_lives: u32,
    pub max_lives: u32,
    pub current_level: u32,
    pub score_for_next_level: u32,
    pub game_over: bool,
    pub waiting: Vec<CustomerView>,
    pub tables: Vec<TableView>,
}

/// The single lock every caller goes through to touch a [`DinerState`]
#[derive(Clone)]
pub struct SharedDiner {
    inner: Arc<Mutex<DinerState>>,
}

impl SharedDiner {
    pub fn new(state: DinerState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Lock the diner, recovering the state if a previous holder panicked
    pub fn lock(&self) -> MutexGuard<'_, DinerState> {
        self.inner.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            error!("[SharedDiner] Lock poisoned, recovering state");
            poisoned.into_inner()
        })
    }

    /// Run `f` with the lock held
    pub fn with<R>(&self, f: impl FnOnce(&mut DinerState) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }
}

impl ScoreProbe for SharedDiner {
    fn score(&self) -> u32 {
        self.lock().score()
    }

    fn is_game_over(&self) -> bool {
        self.lock().is_game_over()
    }
}
