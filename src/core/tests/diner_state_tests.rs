use super::{admit, diner_with_tables, run_ticks};
use crate::core::arrivals::{ArrivalGenerator, ArrivalQueue, ScoreProbe};
use crate::core::config::{ArrivalTiming, DinerConfig};
use crate::core::customer::CustomerFactory;
use crate::core::diner_state::DinerState;
use crate::core::types::{CustomerId, CustomerState, CustomerType, TableBounds, TableId};
use proptest::prelude::*;
use std::sync::Arc;

const DT: f32 = 0.5;

fn state_of(diner: &DinerState, id: CustomerId) -> Option<CustomerState> {
    diner.find_customer(id).map(|c| c.state())
}

fn patience_of(diner: &DinerState, id: CustomerId) -> f32 {
    diner.find_customer(id).map(|c| c.patience()).unwrap_or(-1.0)
}

/// Seat `id` at table 0 and walk it to `ReadyToLeave`
fn serve_to_ready(diner: &mut DinerState, id: CustomerId) {
    assert!(diner.try_seat_customer_by_drag(id, TableId(0)));
    run_ticks(diner, 10, DT);
    assert!(diner.confirm_customer_order(id));
    run_ticks(diner, 16, DT);
    assert!(diner.deliver_food(id, TableId(0)));
    run_ticks(diner, 20, DT);
    assert_eq!(state_of(diner, id), Some(CustomerState::ReadyToLeave));
}

struct FixedProbe;

impl ScoreProbe for FixedProbe {
    fn score(&self) -> u32 {
        0
    }

    fn is_game_over(&self) -> bool {
        false
    }
}

#[test]
fn test_initial_state() {
    let diner = diner_with_tables(3);
    assert_eq!(diner.score(), 0);
    assert_eq!(diner.player_lives(), 5);
    assert_eq!(diner.max_lives(), 7);
    assert_eq!(diner.current_level(), 1);
    assert_eq!(diner.score_for_next_level(), 500);
    assert!(!diner.is_game_over());
    assert!(diner.waiting_customers().is_empty());
    let ids: Vec<_> = diner.tables().iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec![TableId(0), TableId(1), TableId(2)]);
}

#[test]
fn test_initialize_tables_restarts_ids() {
    let mut diner = diner_with_tables(4);
    diner.initialize_tables(&[TableBounds::new(0.0, 0.0, 10.0, 10.0); 2]);
    let ids: Vec<_> = diner.tables().iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec![TableId(0), TableId(1)]);
    assert_eq!(diner.tables()[1].bounds(), TableBounds::new(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn test_process_arrivals_appends_in_order() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(11);
    let first = admit(&mut diner, &mut factory, CustomerType::Normal);

    for _ in 0..3 {
        diner.arrival_queue().offer(factory.create());
    }
    assert_eq!(diner.process_arrivals(), 3);
    assert_eq!(diner.process_arrivals(), 0);

    let ids: Vec<_> = diner.waiting_customers().iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![first, CustomerId(1), CustomerId(2), CustomerId(3)]);
}

#[test]
fn test_default_arrival_queue_holds_ten() {
    let diner = DinerState::new(&DinerConfig::default());
    let mut factory = CustomerFactory::with_seed(2);
    let queue = diner.arrival_queue();

    for _ in 0..10 {
        assert!(queue.offer(factory.create()));
    }
    assert!(!queue.offer(factory.create()));
    assert_eq!(queue.len(), 10);
    assert_eq!(queue.capacity(), 10);
}

#[test]
fn test_seat_moves_customer_to_table() {
    let mut diner = diner_with_tables(2);
    let mut factory = CustomerFactory::with_seed(1);
    let id = admit(&mut diner, &mut factory, CustomerType::Vip);

    assert!(diner.try_seat_customer_by_drag(id, TableId(1)));
    assert!(diner.waiting_customers().is_empty());
    assert_eq!(diner.table_of(id), Some(TableId(1)));
    assert!(diner.table(TableId(1)).map_or(false, |t| t.seats(id)));
    assert!(diner.table(TableId(2)).is_none());
    assert_eq!(state_of(&diner, id), Some(CustomerState::SeatedIdle));
    assert_eq!(diner.find_customer(id).and_then(|c| c.time_until_ready_to_order()), Some(5.0));
}

#[test]
fn test_seat_rejections_have_no_side_effects() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    let first = admit(&mut diner, &mut factory, CustomerType::Normal);
    let second = admit(&mut diner, &mut factory, CustomerType::Normal);

    assert!(diner.try_seat_customer_by_drag(first, TableId(0)));

    // Occupied table
    assert!(!diner.try_seat_customer_by_drag(second, TableId(0)));
    assert_eq!(diner.waiting_customers().len(), 1);
    assert_eq!(state_of(&diner, second), Some(CustomerState::WaitingQueue));

    // Unknown table
    assert!(!diner.try_seat_customer_by_drag(second, TableId(9)));
    assert_eq!(diner.waiting_customers().len(), 1);

    // Already seated, so not waiting
    assert!(!diner.try_seat_customer_by_drag(first, TableId(0)));
    assert_eq!(diner.table_of(first), Some(TableId(0)));

    // Never admitted
    assert!(!diner.try_seat_customer_by_drag(CustomerId(42), TableId(0)));
}

#[test]
fn test_order_timer_gates_confirmation() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    let id = admit(&mut diner, &mut factory, CustomerType::Normal);
    assert!(diner.try_seat_customer_by_drag(id, TableId(0)));

    run_ticks(&mut diner, 9, DT);
    assert_eq!(state_of(&diner, id), Some(CustomerState::SeatedIdle));
    assert!(!diner.confirm_customer_order(id));

    run_ticks(&mut diner, 1, DT);
    assert_eq!(state_of(&diner, id), Some(CustomerState::WaitingOrderConfirm));
    assert!(diner.confirm_customer_order(id));
    assert_eq!(state_of(&diner, id), Some(CustomerState::WaitingFood));
    assert_eq!(diner.find_customer(id).and_then(|c| c.time_until_food_ready()), Some(8.0));
    assert_eq!(diner.find_customer(id).and_then(|c| c.time_until_ready_to_order()), None);

    // Second confirmation is rejected
    assert!(!diner.confirm_customer_order(id));
}

#[test]
fn test_confirm_rejects_waiting_and_unknown_customers() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    let id = admit(&mut diner, &mut factory, CustomerType::Normal);
    assert!(!diner.confirm_customer_order(id));
    assert_eq!(state_of(&diner, id), Some(CustomerState::WaitingQueue));
    assert!(!diner.confirm_customer_order(CustomerId(77)));
}

#[test]
fn test_deliver_food_preconditions() {
    let mut diner = diner_with_tables(2);
    let mut factory = CustomerFactory::with_seed(1);
    let id = admit(&mut diner, &mut factory, CustomerType::Normal);
    let other = admit(&mut diner, &mut factory, CustomerType::Normal);
    assert!(diner.try_seat_customer_by_drag(id, TableId(0)));
    assert!(diner.try_seat_customer_by_drag(other, TableId(1)));

    run_ticks(&mut diner, 10, DT);
    assert!(diner.confirm_customer_order(id));

    // Still cooking
    assert!(!diner.deliver_food(id, TableId(0)));

    run_ticks(&mut diner, 15, DT);
    assert_eq!(state_of(&diner, id), Some(CustomerState::WaitingFood));
    run_ticks(&mut diner, 1, DT);
    assert_eq!(state_of(&diner, id), Some(CustomerState::FoodReady));

    // Wrong table, unknown table
    assert!(!diner.deliver_food(id, TableId(1)));
    assert!(!diner.deliver_food(id, TableId(5)));
    assert_eq!(state_of(&diner, id), Some(CustomerState::FoodReady));

    assert!(diner.deliver_food(id, TableId(0)));
    assert_eq!(state_of(&diner, id), Some(CustomerState::Eating));
    assert_eq!(
        diner.find_customer(id).and_then(|c| c.time_until_finished_eating()),
        Some(10.0)
    );
}

#[test]
fn test_deliver_to_empty_table_fails() {
    let mut diner = diner_with_tables(1);
    assert!(!diner.deliver_food(CustomerId(0), TableId(0)));
}

#[test]
fn test_eating_freezes_patience() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    let id = admit(&mut diner, &mut factory, CustomerType::Normal);
    assert!(diner.try_seat_customer_by_drag(id, TableId(0)));
    run_ticks(&mut diner, 10, DT);
    assert!(diner.confirm_customer_order(id));
    run_ticks(&mut diner, 16, DT);
    assert_eq!(patience_of(&diner, id), 224.0);

    assert!(diner.deliver_food(id, TableId(0)));
    run_ticks(&mut diner, 19, DT);
    assert_eq!(state_of(&diner, id), Some(CustomerState::Eating));
    run_ticks(&mut diner, 1, DT);
    assert_eq!(state_of(&diner, id), Some(CustomerState::ReadyToLeave));

    run_ticks(&mut diner, 100, DT);
    assert_eq!(patience_of(&diner, id), 224.0);
    assert_eq!(state_of(&diner, id), Some(CustomerState::ReadyToLeave));
}

#[test]
fn test_clear_table_awards_once() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    let id = admit(&mut diner, &mut factory, CustomerType::Impatient);
    serve_to_ready(&mut diner, id);

    assert!(diner.clear_table_for_customer(id));
    assert_eq!(diner.score(), 150);
    assert!(!diner.tables()[0].is_occupied());
    assert!(diner.find_customer(id).is_none());

    assert!(!diner.clear_table_for_customer(id));
    assert_eq!(diner.score(), 150);
}

#[test]
fn test_clear_rejects_customer_not_done() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    let id = admit(&mut diner, &mut factory, CustomerType::Normal);
    assert!(!diner.clear_table_for_customer(id));
    assert!(diner.try_seat_customer_by_drag(id, TableId(0)));
    assert!(!diner.clear_table_for_customer(id));
    assert!(diner.tables()[0].is_occupied());
    assert_eq!(diner.score(), 0);
}

#[test]
fn test_clear_levels_up() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    for _ in 0..2 {
        let id = admit(&mut diner, &mut factory, CustomerType::Vip);
        serve_to_ready(&mut diner, id);
        assert!(diner.clear_table_for_customer(id));
    }
    assert_eq!(diner.score(), 500);
    assert_eq!(diner.current_level(), 2);
    assert_eq!(diner.score_for_next_level(), 1000);
    assert_eq!(diner.player_lives(), 6);
}

#[test]
fn test_waiting_customer_leaves_angry() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    let id = admit(&mut diner, &mut factory, CustomerType::Normal);

    assert_eq!(run_ticks(&mut diner, 249, DT), 0);
    assert_eq!(patience_of(&diner, id), 1.0);

    assert_eq!(diner.update(DT), 1);
    assert!(diner.find_customer(id).is_none());
    assert!(diner.waiting_customers().is_empty());
    assert_eq!(diner.player_lives(), 4);
}

#[test]
fn test_seated_customer_leaving_angry_vacates_table() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    let id = admit(&mut diner, &mut factory, CustomerType::Impatient);
    assert!(diner.try_seat_customer_by_drag(id, TableId(0)));

    // 200 patience at 3 units/s, never served
    let angry = run_ticks(&mut diner, 140, DT);
    assert_eq!(angry, 1);
    assert!(!diner.tables()[0].is_occupied());
    assert!(diner.find_customer(id).is_none());
    assert_eq!(diner.player_lives(), 4);
}

#[test]
fn test_simultaneous_angry_leaves_counted_independently() {
    let mut diner = diner_with_tables(1);
    let mut factory = CustomerFactory::with_seed(1);
    let seated = admit(&mut diner, &mut factory, CustomerType::Normal);
    assert!(diner.try_seat_customer_by_drag(seated, TableId(0)));
    admit(&mut diner, &mut factory, CustomerType::Normal);
    admit(&mut diner, &mut factory, CustomerType::Normal);

    // Everyone drains 1.0 per tick from 250 and never gets served
    assert_eq!(run_ticks(&mut diner, 249, DT), 0);
    assert_eq!(diner.update(DT), 3);
    assert_eq!(diner.player_lives(), 2);
}

#[test]
fn test_game_over_stops_generator_and_freezes_state() {
    let mut diner = diner_with_tables(1);
    let generator = ArrivalGenerator::new(
        ArrivalQueue::new(10),
        Arc::new(FixedProbe),
        ArrivalTiming::default(),
        Some(5),
    );
    let handle = generator.handle();
    diner.set_generator(handle.clone());

    let mut factory = CustomerFactory::with_seed(1);
    for _ in 0..5 {
        admit(&mut diner, &mut factory, CustomerType::Normal);
    }
    assert_eq!(run_ticks(&mut diner, 100, DT), 0);
    let late = admit(&mut diner, &mut factory, CustomerType::Normal);

    assert_eq!(run_ticks(&mut diner, 149, DT), 0);
    assert_eq!(diner.update(DT), 5);
    assert!(diner.is_game_over());
    assert_eq!(diner.player_lives(), 0);
    assert!(!handle.is_running());
    assert_eq!(patience_of(&diner, late), 100.0);

    assert_eq!(run_ticks(&mut diner, 50, DT), 0);
    assert_eq!(patience_of(&diner, late), 100.0);
    assert!(!diner.try_seat_customer_by_drag(CustomerId(99), TableId(0)));
}

#[test]
fn test_snapshot_mirrors_state() {
    let mut diner = diner_with_tables(2);
    let mut factory = CustomerFactory::with_seed(1);
    let seated = admit(&mut diner, &mut factory, CustomerType::Vip);
    let waiting = admit(&mut diner, &mut factory, CustomerType::Impatient);
    assert!(diner.try_seat_customer_by_drag(seated, TableId(1)));

    let snapshot = diner.snapshot();
    assert_eq!(snapshot.session_id, diner.session_id());
    assert_eq!(snapshot.player_lives, 5);
    assert_eq!(snapshot.waiting.len(), 1);
    assert_eq!(snapshot.waiting[0].id, waiting);
    assert_eq!(snapshot.waiting[0].display_id, "IMP1");
    assert_eq!(snapshot.waiting[0].icon, "customer_impatient");
    assert!(snapshot.tables[0].customer.is_none());
    let at_table = snapshot.tables[1].customer.as_ref().map(|c| (c.id, c.table, c.state));
    assert_eq!(at_table, Some((seated, Some(TableId(1)), CustomerState::SeatedIdle)));
}

proptest! {
    #[test]
    fn prop_patience_stays_in_bounds(dts in proptest::collection::vec(0.0f32..0.5, 1..400)) {
        let mut diner = diner_with_tables(1);
        let mut factory = CustomerFactory::with_seed(9);
        let seated = admit(&mut diner, &mut factory, CustomerType::Impatient);
        admit(&mut diner, &mut factory, CustomerType::Vip);
        diner.try_seat_customer_by_drag(seated, TableId(0));

        for dt in dts {
            diner.update(dt);
            diner.confirm_customer_order(seated);
            diner.deliver_food(seated, TableId(0));

            let seated_customers = diner.tables().iter().filter_map(|t| t.seated_customer());
            for customer in diner.waiting_customers().iter().chain(seated_customers) {
                prop_assert!(customer.patience() >= 0.0);
                prop_assert!(customer.patience() <= customer.initial_patience());
                let pct = customer.patience_percentage();
                prop_assert!((0.0..=1.0).contains(&pct));
            }
            prop_assert!(diner.player_lives() <= diner.max_lives());
        }
    }

    #[test]
    fn prop_intents_follow_state_machine(ops in proptest::collection::vec(0u8..5, 1..200)) {
        let mut diner = diner_with_tables(2);
        let mut factory = CustomerFactory::with_seed(3);
        let ids: Vec<_> = (0..3).map(|_| admit(&mut diner, &mut factory, CustomerType::Normal)).collect();

        for (step, op) in ops.into_iter().enumerate() {
            let id = ids[step % ids.len()];
            let table = TableId(step % 2);
            let before = state_of(&diner, id);
            match op {
                0 => {
                    let ok = diner.try_seat_customer_by_drag(id, table);
                    if ok {
                        prop_assert_eq!(before, Some(CustomerState::WaitingQueue));
                    }
                }
                1 => {
                    if diner.confirm_customer_order(id) {
                        prop_assert_eq!(before, Some(CustomerState::WaitingOrderConfirm));
                    }
                }
                2 => {
                    if diner.deliver_food(id, table) {
                        prop_assert_eq!(before, Some(CustomerState::FoodReady));
                    }
                }
                3 => {
                    let score = diner.score();
                    if diner.clear_table_for_customer(id) {
                        prop_assert_eq!(before, Some(CustomerState::ReadyToLeave));
                        prop_assert_eq!(diner.score(), score + 100);
                    } else {
                        prop_assert_eq!(diner.score(), score);
                    }
                }
                _ => {
                    diner.update(2.0);
                    if let (Some(CustomerState::WaitingQueue), Some(after)) = (before, state_of(&diner, id)) {
                        prop_assert_eq!(after, CustomerState::WaitingQueue);
                    }
                }
            }
        }
    }
}
