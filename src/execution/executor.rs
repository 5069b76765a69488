use rust_decimal::Decimal;

use crate::exchange::{Exchange, OrderRequest};
use crate::models::{Decision, OrderAck, OrderSide, PositionState, TradeAction};

/// Fixed trading parameters for the single traded contract
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSettings {
    pub symbol: String,
    pub margin_coin: String,
    pub leverage: u32,
    pub trade_size: Decimal,
    /// Trading requires an available balance strictly above this
    pub min_balance: f64,
}

/// Orders to send for one decision, in order
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub orders: Vec<OrderSide>,
    /// State to adopt once the opening order succeeds
    pub target: Option<PositionState>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderStatus {
    Placed(OrderAck),
    Failed(String),
}

/// Result of one order call
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    pub side: OrderSide,
    pub status: OrderStatus,
}

impl OrderOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, OrderStatus::Placed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeverageOutcome {
    Set,
    Failed(String),
}

/// What the execution engine did for one decision
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub prior: PositionState,
    pub position: PositionState,
    pub leverage: LeverageOutcome,
    pub orders: Vec<OrderOutcome>,
    pub reason: String,
}

/// Decide which orders a decision translates to
///
/// Switching direction closes the opposite position first. Opening in the
/// direction already held is sent again.
pub fn plan_execution(
    decision: &Decision,
    prior: PositionState,
    balance: f64,
    min_balance: f64,
) -> ExecutionPlan {
    let (close, open, target) = match decision.action {
        TradeAction::OpenLong => (
            (prior == PositionState::Short).then_some(OrderSide::CloseShort),
            OrderSide::OpenLong,
            PositionState::Long,
        ),
        TradeAction::OpenShort => (
            (prior == PositionState::Long).then_some(OrderSide::CloseLong),
            OrderSide::OpenShort,
            PositionState::Short,
        ),
        TradeAction::Hold => {
            let reason = if prior == PositionState::Flat {
                "Hold signal with no position to hold".to_string()
            } else {
                format!("Hold signal, keeping {} position", prior)
            };
            return ExecutionPlan {
                orders: Vec::new(),
                target: None,
                reason,
            };
        }
        TradeAction::Unknown => {
            return ExecutionPlan {
                orders: Vec::new(),
                target: None,
                reason: "Unrecognized decision, no order placed".to_string(),
            };
        }
    };

    if balance <= min_balance {
        return ExecutionPlan {
            orders: Vec::new(),
            target: None,
            reason: format!(
                "{} skipped - balance {:.2} not above minimum {:.2}",
                decision.action, balance, min_balance
            ),
        };
    }

    let mut orders = Vec::new();
    orders.extend(close);
    orders.push(open);

    ExecutionPlan {
        orders,
        target: Some(target),
        reason: format!("{} with available balance {:.2}", decision.action, balance),
    }
}

/// Sends the orders for a decision and derives the new position state
///
/// Each call is isolated: a failed close does not stop the open that follows
/// it, and a failed open does not undo a close that already went through.
/// Only a successful open moves the state. After a failed open the prior
/// state is kept even if the close succeeded; nothing is reconciled with the
/// exchange.
pub struct Executor<'a, E> {
    exchange: &'a E,
    settings: &'a TradeSettings,
}

impl<'a, E: Exchange> Executor<'a, E> {
    pub fn new(exchange: &'a E, settings: &'a TradeSettings) -> Self {
        Self { exchange, settings }
    }

    pub async fn execute(
        &self,
        decision: &Decision,
        prior: PositionState,
        balance: f64,
    ) -> ExecutionReport {
        let leverage = self.set_leverage().await;

        let plan = plan_execution(decision, prior, balance, self.settings.min_balance);
        tracing::info!("  Decision: {} - {}", decision.action, plan.reason);

        let mut position = prior;
        let mut orders = Vec::with_capacity(plan.orders.len());

        for side in plan.orders {
            let outcome = self.place(side).await;

            let opens = matches!(side, OrderSide::OpenLong | OrderSide::OpenShort);
            if opens && outcome.succeeded() {
                position = plan.target.unwrap_or(position);
            }

            orders.push(outcome);
        }

        ExecutionReport {
            prior,
            position,
            leverage,
            orders,
            reason: plan.reason,
        }
    }

    async fn set_leverage(&self) -> LeverageOutcome {
        match self
            .exchange
            .set_leverage(&self.settings.symbol, &self.settings.margin_coin, self.settings.leverage)
            .await
        {
            Ok(()) => {
                tracing::debug!("  Leverage set to {}x", self.settings.leverage);
                LeverageOutcome::Set
            }
            Err(e) => {
                tracing::warn!("  ✗ Failed to set leverage: {}", e);
                LeverageOutcome::Failed(e.to_string())
            }
        }
    }

    async fn place(&self, side: OrderSide) -> OrderOutcome {
        let request = OrderRequest {
            symbol: self.settings.symbol.clone(),
            margin_coin: self.settings.margin_coin.clone(),
            side,
            size: self.settings.trade_size,
        };

        let status = match self.exchange.place_order(&request).await {
            Ok(ack) => {
                tracing::info!(
                    "  ✓ {} {} {} (order {})",
                    side,
                    request.size,
                    request.symbol,
                    ack.order_id
                );
                OrderStatus::Placed(ack)
            }
            Err(e) => {
                tracing::error!("  ✗ {} failed: {}", side, e);
                OrderStatus::Failed(e.to_string())
            }
        };

        OrderOutcome { side, status }
    }
}
