//! Console Insights
//! Plain-text summary of what the numbers say.

use super::aggregate::Aggregates;
use super::queries::{ExpenseDetail, ReportData, TripProfit};
use std::io::{self, Write};

/// Categories called out by name in the expense section.
pub const FOOD_CATEGORY: &str = "Food";
pub const MAINTENANCE_CATEGORY: &str = "Maintenance";

fn most_and_least_profitable(trips: &[TripProfit]) -> Option<(&TripProfit, &TripProfit)> {
    let cmp = |a: &&TripProfit, b: &&TripProfit| {
        a.net_profit
            .partial_cmp(&b.net_profit)
            .unwrap_or(std::cmp::Ordering::Equal)
    };
    // first occurrence wins ties: max_by keeps the last maximum, min_by the first minimum
    let most = trips.iter().rev().max_by(cmp)?;
    let least = trips.iter().min_by(cmp)?;
    Some((most, least))
}

fn largest_expense(details: &[ExpenseDetail]) -> Option<&ExpenseDetail> {
    details.iter().rev().max_by(|a, b| {
        a.amount
            .partial_cmp(&b.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

fn category_total(aggregates: &Aggregates, category: &str) -> f64 {
    aggregates
        .category_totals
        .iter()
        .filter(|c| c.category == category)
        .map(|c| c.total_spent)
        .sum()
}

/// Write the insight report.
pub fn write_insights<W: Write>(
    out: &mut W,
    data: &ReportData,
    aggregates: &Aggregates,
) -> io::Result<()> {
    writeln!(out, "--- Actionable Insights ---")?;

    writeln!(out)?;
    writeln!(out, "Profitability Insights:")?;
    match most_and_least_profitable(&data.trips) {
        None => writeln!(out, "  - No trips recorded yet.")?,
        Some((most, least)) => {
            writeln!(
                out,
                "  - Most Profitable Trip: to {} on {} with a net profit of ${:.2}.",
                most.dropoff_location, most.load_date, most.net_profit
            )?;
            writeln!(
                out,
                "  - Least Profitable Trip: to {} on {} with a net profit of ${:.2}.",
                least.dropoff_location, least.load_date, least.net_profit
            )?;

            if least.net_profit < 0.0 {
                writeln!(
                    out,
                    "    The trip to {} was unprofitable.",
                    least.dropoff_location
                )?;
                writeln!(
                    out,
                    "      - Revenue was ${:.2}, but total costs were ${:.2}.",
                    least.revenue,
                    least.total_costs()
                )?;
                writeln!(
                    out,
                    "      - Costs split into fuel (${:.2}) and other expenses (${:.2}).",
                    least.total_fuel_cost, least.total_other_expenses
                )?;
            }

            let stats = &aggregates.profit_stats;
            writeln!(
                out,
                "  - Net profit across {} trips: mean ${:.2}, median ${:.2}, std dev ${:.2} (5th-95th percentile ${:.2} to ${:.2}).",
                stats.count, stats.mean, stats.median, stats.std, stats.p05, stats.p95
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Expense Insights:")?;
    if aggregates.category_totals.is_empty() {
        writeln!(out, "  - No expenses recorded yet.")?;
        return Ok(());
    }

    let food = category_total(aggregates, FOOD_CATEGORY);
    writeln!(out, "  - Total spent on Food (snacks, meals): ${:.2}.", food)?;

    let maintenance = category_total(aggregates, MAINTENANCE_CATEGORY);
    if maintenance > 0.0 {
        writeln!(
            out,
            "  - Maintenance cost ${:.2} in total, a direct hit to the profitability of the trips it was booked against.",
            maintenance
        )?;
    }

    if let Some(top) = aggregates.category_totals.first() {
        writeln!(
            out,
            "  - Largest category: {} (${:.2}).",
            top.category, top.total_spent
        )?;
    }

    if let Some(expense) = largest_expense(&data.expense_details) {
        writeln!(
            out,
            "  - Largest single expense: ${:.2} for {} on {} (trip to {}).",
            expense.amount,
            expense
                .description
                .as_deref()
                .unwrap_or(expense.category.as_str()),
            expense.expense_date,
            expense.dropoff_location
        )?;
    }

    Ok(())
}
