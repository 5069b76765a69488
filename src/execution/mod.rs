// Turns trade decisions into futures orders and tracks the believed position
pub mod executor;

pub use executor::{
    plan_execution, ExecutionPlan, ExecutionReport, Executor, LeverageOutcome, OrderOutcome,
    OrderStatus, TradeSettings,
};
