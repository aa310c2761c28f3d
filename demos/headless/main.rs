use diner_sim::{
    CustomerState, DinerConfig, DinerLayout, DinerSession, FrameHooks, HighScoreKeeper,
    InMemoryHighScore, SharedDiner, TableBounds,
};
use std::thread;
use std::time::{Duration, Instant};

/// Console feedback in place of sound and vibration
struct ConsoleHooks;

impl FrameHooks for ConsoleHooks {
    fn on_game_over(&mut self, final_score: u32, new_high_score: bool) {
        println!(
            "💀 Game over! Final score {} (new high score: {})",
            final_score, new_high_score
        );
    }

    fn on_angry_leave(&mut self, count: u32) {
        println!("😠 {} customer(s) stormed out", count);
    }
}

/// One pass of an operator who works the floor greedily: clear, deliver,
/// confirm, then seat whoever has waited longest.
fn operate(diner: &SharedDiner) {
    diner.with(|d| {
        let seated: Vec<_> = d
            .tables()
            .iter()
            .filter_map(|t| t.seated_customer().map(|c| (t.id(), c.id(), c.state())))
            .collect();

        for (table_id, customer_id, state) in seated {
            match state {
                CustomerState::ReadyToLeave => {
                    d.clear_table_for_customer(customer_id);
                }
                CustomerState::FoodReady => {
                    d.deliver_food(customer_id, table_id);
                }
                CustomerState::WaitingOrderConfirm => {
                    d.confirm_customer_order(customer_id);
                }
                _ => {}
            }
        }

        let free: Vec<_> = d
            .tables()
            .iter()
            .filter(|t| !t.is_occupied())
            .map(|t| t.id())
            .collect();
        let waiting: Vec<_> = d.waiting_customers().iter().map(|c| c.id()).collect();
        for (table_id, customer_id) in free.into_iter().zip(waiting) {
            d.try_seat_customer_by_drag(customer_id, table_id);
        }
    });
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let run_for = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(60));

    println!("🍽️  Starting headless diner for {:?}", run_for);

    let config = DinerConfig::default().with_random_seed(Some(42));
    let layout = DinerLayout {
        counter: Some(TableBounds::new(0.0, 0.0, 400.0, 60.0)),
        door: Some(TableBounds::new(360.0, 540.0, 400.0, 600.0)),
        tables: (0..4)
            .map(|i| {
                let left = 20.0 + i as f32 * 90.0;
                TableBounds::new(left, 200.0, left + 70.0, 270.0)
            })
            .collect(),
    };
    let keeper = HighScoreKeeper::new(Box::new(InMemoryHighScore::default()));

    let mut session = DinerSession::start(&config, &layout, Box::new(ConsoleHooks), Some(keeper))?;
    let diner = session.diner().clone();

    let started = Instant::now();
    while started.elapsed() < run_for && !diner.lock().is_game_over() {
        operate(&diner);
        thread::sleep(Duration::from_millis(250));
    }
    session.stop();

    let snapshot = diner.lock().snapshot();
    println!();
    println!("Session {}", snapshot.session_id);
    println!(
        "  Score: {}  Level: {}  Lives: {}/{}  Game over: {}",
        snapshot.score,
        snapshot.current_level,
        snapshot.player_lives,
        snapshot.max_lives,
        snapshot.game_over
    );
    println!("  Waiting: {}", snapshot.waiting.len());
    for table in &snapshot.tables {
        match &table.customer {
            Some(c) => println!(
                "  Table {}: {} [{}] ({}, {:.0}% patience)",
                table.id,
                c.display_id,
                c.icon,
                c.state,
                c.patience_percentage * 100.0
            ),
            None => println!("  Table {}: empty", table.id),
        }
    }

    Ok(())
}
