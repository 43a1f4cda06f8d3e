//! Pure balance and health arithmetic.
//!
//! Nothing here touches the database; the endpoints feed these functions
//! ledger sums and daily totals.

use std::collections::HashMap;

use serde::Serialize;
use time::{Date, Duration};

/// Income and expenses over a window, with the net expressed both as an
/// amount and as a percentage of income.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CashFlow {
    /// Total income over the window.
    pub total_income: f64,
    /// Total expenses over the window.
    pub total_expenses: f64,
    /// Income minus expenses.
    pub net_cash_flow: f64,
    /// Net as a percentage of income, or 0 when there is no income.
    pub cash_flow_percentage: f64,
}

/// Combine windowed income and expense totals into a cash flow.
pub fn cash_flow(total_income: f64, total_expenses: f64) -> CashFlow {
    let net_cash_flow = total_income - total_expenses;
    let cash_flow_percentage = if total_income > 0.0 {
        100.0 * net_cash_flow / total_income
    } else {
        0.0
    };

    CashFlow {
        total_income,
        total_expenses,
        net_cash_flow,
        cash_flow_percentage,
    }
}

/// How one period compares to the previous one, as a percentage.
///
/// Returns 0 when the previous period had no activity, since there is no
/// baseline to compare against.
pub fn trend_percentage(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        100.0 * (current - previous) / previous
    } else {
        0.0
    }
}

/// One day on the relative balance trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancePoint {
    /// The calendar day.
    pub date: Date,
    /// The accumulated balance at the end of the day.
    pub balance: f64,
}

/// The day-by-day balance trajectory over the `days` leading up to `today`.
///
/// The walk starts from 0 rather than the lifetime opening balance, so the
/// series shows the relative movement within the window, not absolute worth.
/// This windowing is intentional.
pub fn balance_history(
    days: u32,
    today: Date,
    income_by_day: &[(Date, f64)],
    expenses_by_day: &[(Date, f64)],
) -> Vec<BalancePoint> {
    let income: HashMap<Date, f64> = income_by_day.iter().copied().collect();
    let expenses: HashMap<Date, f64> = expenses_by_day.iter().copied().collect();

    let mut balance = 0.0;
    let mut history = Vec::with_capacity(days as usize + 1);
    let start = today - Duration::days(days as i64);

    let mut day = start;
    while day <= today {
        balance += income.get(&day).copied().unwrap_or(0.0)
            - expenses.get(&day).copied().unwrap_or(0.0);
        history.push(BalancePoint { date: day, balance });
        day += Duration::days(1);
    }

    history
}

/// The qualitative band a health score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthBand {
    /// Score 80 and above.
    Excellent,
    /// Score 60 to 79.
    Good,
    /// Score 40 to 59.
    Fair,
    /// Score below 40.
    Poor,
}

/// A heuristic 0-100 score for an owner's finances with advisories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialHealth {
    /// The score, always within 0 to 100.
    pub score: u8,
    /// The band the score falls into.
    pub band: HealthBand,
    /// Fixed advisories; several can apply at once.
    pub recommendations: Vec<&'static str>,
}

const ADVISORY_NEGATIVE_NET: &str =
    "Your expenses exceed or equal your income. Review your spending to find areas to cut back.";
const ADVISORY_LOW_SAVINGS: &str =
    "You're saving less than 10% of your income. Aim to set aside a little more each month.";
const ADVISORY_THIN_BUFFER: &str =
    "Your balance is lower than a month of expenses. Consider building an emergency buffer.";
const ADVISORY_NEEDS_ATTENTION: &str =
    "Your financial health could use attention. Small, consistent changes add up.";
const ADVISORY_URGENT: &str =
    "Your finances need urgent attention. Prioritize reducing recurring costs.";

/// Score the owner's finances from their balance and this month's cash flow.
///
/// The score starts at 50 and earns points for a positive balance, a balance
/// above a month of income, positive net cash flow, and healthy savings
/// rates, clamped to 0-100. Each advisory is tested independently, so
/// several can apply at once.
pub fn financial_health(balance: f64, monthly: CashFlow) -> FinancialHealth {
    let savings_rate = monthly.cash_flow_percentage;

    let mut score: i32 = 50;

    if balance > 0.0 {
        score += 15;
    }

    if balance > monthly.total_income {
        score += 15;
    }

    if monthly.net_cash_flow > 0.0 {
        score += 20;
    }

    if monthly.cash_flow_percentage > 20.0 {
        score += 20;
    }

    if savings_rate > 10.0 {
        score += 15;
    }

    if savings_rate > 20.0 {
        score += 15;
    }

    let score = score.clamp(0, 100) as u8;

    let band = match score {
        80..=100 => HealthBand::Excellent,
        60..=79 => HealthBand::Good,
        40..=59 => HealthBand::Fair,
        _ => HealthBand::Poor,
    };

    let mut recommendations = Vec::new();

    if monthly.net_cash_flow <= 0.0 {
        recommendations.push(ADVISORY_NEGATIVE_NET);
    }

    if monthly.cash_flow_percentage < 10.0 {
        recommendations.push(ADVISORY_LOW_SAVINGS);
    }

    if balance < monthly.total_expenses {
        recommendations.push(ADVISORY_THIN_BUFFER);
    }

    if score < 60 {
        recommendations.push(ADVISORY_NEEDS_ATTENTION);
    }

    if score < 40 {
        recommendations.push(ADVISORY_URGENT);
    }

    FinancialHealth {
        score,
        band,
        recommendations,
    }
}

#[cfg(test)]
mod cash_flow_tests {
    use super::{cash_flow, trend_percentage};

    #[test]
    fn computes_net_and_percentage() {
        let flow = cash_flow(1000.0, 400.0);

        assert_eq!(flow.total_income, 1000.0);
        assert_eq!(flow.total_expenses, 400.0);
        assert_eq!(flow.net_cash_flow, 600.0);
        assert_eq!(flow.cash_flow_percentage, 60.0);
    }

    #[test]
    fn percentage_is_zero_without_income() {
        let flow = cash_flow(0.0, 500.0);

        assert_eq!(flow.net_cash_flow, -500.0);
        assert_eq!(flow.cash_flow_percentage, 0.0);
    }

    #[test]
    fn trend_compares_against_previous_period() {
        assert_eq!(trend_percentage(150.0, 100.0), 50.0);
        assert_eq!(trend_percentage(50.0, 100.0), -50.0);
    }

    #[test]
    fn trend_is_zero_without_a_baseline() {
        assert_eq!(trend_percentage(150.0, 0.0), 0.0);
    }
}


#[cfg(test)]
mod financial_health_tests {
    use super::{HealthBand, cash_flow, financial_health};

    #[test]
    fn score_is_always_within_bounds() {
        let combinations = [
            (-10_000.0, 0.0, 10_000.0),
            (0.0, 0.0, 0.0),
            (100_000.0, 10_000.0, 100.0),
            (50.0, 100.0, 100.0),
        ];

        for (balance, income, expenses) in combinations {
            let health = financial_health(balance, cash_flow(income, expenses));

            assert!(health.score <= 100);
        }
    }

    #[test]
    fn healthy_finances_score_excellent() {
        // Positive balance above monthly income, strong savings rate.
        let health = financial_health(10_000.0, cash_flow(2_000.0, 1_000.0));

        assert_eq!(health.score, 100);
        assert_eq!(health.band, HealthBand::Excellent);
        assert!(health.recommendations.is_empty());
    }

    #[test]
    fn break_even_finances_stay_near_fifty() {
        // Balance 0, income 1000, expenses 1000: only the zero-balance and
        // zero-net checks fail to add points.
        let health = financial_health(0.0, cash_flow(1_000.0, 1_000.0));

        assert_eq!(health.score, 50);
        assert_eq!(health.band, HealthBand::Fair);
        assert!(health.recommendations.contains(
            &"Your expenses exceed or equal your income. Review your spending to find areas to cut back."
        ));
    }

    #[test]
    fn multiple_advisories_can_co_occur() {
        // Negative net, weak savings, thin buffer and a sub-60 score all at
        // once.
        let health = financial_health(-100.0, cash_flow(100.0, 500.0));

        assert_eq!(health.band, HealthBand::Fair);
        assert_eq!(health.recommendations.len(), 4);
    }
}
