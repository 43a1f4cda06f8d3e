//! Balances, cash flow, balance history and financial health.

mod core;
mod db;
mod endpoints;

pub use core::{
    BalancePoint, CashFlow, FinancialHealth, HealthBand, balance_history, cash_flow,
    financial_health, trend_percentage,
};
pub use db::{
    balance_history_for_owner, cash_flow_for_window, current_balance, recompute_cached_balance,
};
pub use endpoints::{
    BalanceEndpointState, Summary, balance_endpoint, balance_history_endpoint, cash_flow_endpoint,
    chart_endpoint, financial_health_endpoint, summary_endpoint,
};
