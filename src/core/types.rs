use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, monotonically assigned customer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub u64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Table identifier, stable for one table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub usize);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Screen-space bounds handed in by the layout collaborator.
///
/// The simulation stores these for the view but never interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TableBounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl TableBounds {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }
}

/// Kind of customer, drawn uniformly at random by the arrival generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    Normal,
    Impatient,
    Vip,
}

/// Fixed per-type configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerTypeConfig {
    pub initial_patience: f32,
    pub score_value: u32,
    pub patience_rate_multiplier: f32,
    /// Opaque asset key for the view
    pub icon: &'static str,
}

const NORMAL_CONFIG: CustomerTypeConfig = CustomerTypeConfig {
    initial_patience: 250.0,
    score_value: 100,
    patience_rate_multiplier: 1.0,
    icon: "customer_normal",
};

const IMPATIENT_CONFIG: CustomerTypeConfig = CustomerTypeConfig {
    initial_patience: 200.0,
    score_value: 150,
    patience_rate_multiplier: 1.5,
    icon: "customer_impatient",
};

const VIP_CONFIG: CustomerTypeConfig = CustomerTypeConfig {
    initial_patience: 180.0,
    score_value: 250,
    patience_rate_multiplier: 1.0,
    icon: "customer_vip",
};

impl CustomerType {
    /// All variants, in the order used for random selection
    pub const ALL: [CustomerType; 3] = [
        CustomerType::Normal,
        CustomerType::Impatient,
        CustomerType::Vip,
    ];

    /// Configuration table entry for this type
    pub fn config(self) -> &'static CustomerTypeConfig {
        match self {
            CustomerType::Normal => &NORMAL_CONFIG,
            CustomerType::Impatient => &IMPATIENT_CONFIG,
            CustomerType::Vip => &VIP_CONFIG,
        }
    }

    /// Prefix used when rendering a customer id for logs and the view
    pub fn display_prefix(self) -> &'static str {
        match self {
            CustomerType::Normal => "C",
            CustomerType::Impatient => "IMP",
            CustomerType::Vip => "VIP",
        }
    }
}

/// Lifecycle state of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerState {
    WaitingQueue,
    SeatedIdle,
    WaitingOrderConfirm,
    WaitingFood,
    FoodReady,
    Eating,
    ReadyToLeave,
    AngryLeft,
}

impl CustomerState {
    /// States in which patience drains every tick
    pub fn decays_patience(self) -> bool {
        matches!(
            self,
            CustomerState::WaitingQueue
                | CustomerState::SeatedIdle
                | CustomerState::WaitingOrderConfirm
                | CustomerState::WaitingFood
                | CustomerState::FoodReady
        )
    }

    pub fn is_terminal(self) -> bool {
        self == CustomerState::AngryLeft
    }
}

impl fmt::Display for CustomerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
