//! Plain-text rendering of simulations and saved history.

use std::fmt::{self, Write};

use rust_decimal::Decimal;
use selic_core::calculations::Simulation;
use selic_core::calculations::common::format_money;
use selic_core::{HistoryRecord, ProjectionResult};

/// Runs `write` against a fresh buffer and returns what it wrote.
fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // A String sink never reports an error.
    match write(&mut out) {
        Ok(()) => out,
        Err(fmt::Error) => String::new(),
    }
}

/// Tax rate as a percentage with one decimal, e.g. `0.175` → `17.5%`.
fn percent(rate: Decimal) -> String {
    format!("{:.1}%", (rate * Decimal::ONE_HUNDRED).round_dp(1))
}

fn rate_label(annual_rate: Decimal) -> String {
    format!("{}%", annual_rate.normalize())
}

/// Summary of a single projection.
pub fn render_summary(result: &ProjectionResult) -> String {
    render(|out| write_summary(out, result))
}

fn write_summary(out: &mut impl Write, result: &ProjectionResult) -> fmt::Result {
    let input = &result.input;
    writeln!(out, "Investment summary")?;
    writeln!(out, "  Initial investment:    {}", format_money(input.principal))?;
    writeln!(
        out,
        "  Monthly contribution:  {}",
        format_money(input.monthly_contribution)
    )?;
    writeln!(out, "  Annual rate:           {}", rate_label(input.annual_rate))?;
    writeln!(
        out,
        "  Term:                  {} months ({} days)",
        input.term_months, result.elapsed_days
    )?;
    writeln!(
        out,
        "  Gross final balance:   {}",
        format_money(result.gross_final_balance)
    )?;
    writeln!(
        out,
        "  Income tax:            {} ({})",
        format_money(result.tax_amount),
        percent(result.tax_rate_applied)
    )?;
    writeln!(
        out,
        "  Net final balance:     {}",
        format_money(result.net_final_balance)
    )
}

/// One line per comparison scenario with its final figures.
pub fn render_comparison(scenarios: &[ProjectionResult]) -> String {
    render(|out| write_comparison(out, scenarios))
}

fn write_comparison(out: &mut impl Write, scenarios: &[ProjectionResult]) -> fmt::Result {
    writeln!(out, "Scenario comparison")?;
    writeln!(
        out,
        "  {:<10} {:>10} {:>18} {:>16} {:>18}",
        "Scenario", "Rate", "Gross", "Tax", "Net"
    )?;
    for (i, scenario) in scenarios.iter().enumerate() {
        writeln!(
            out,
            "  {:<10} {:>10} {:>18} {:>16} {:>18}",
            i + 1,
            rate_label(scenario.input.annual_rate),
            format_money(scenario.gross_final_balance),
            format_money(scenario.tax_amount),
            format_money(scenario.net_final_balance),
        )?;
    }
    Ok(())
}

/// Month-by-month table of the base balance and each scenario's balance.
///
/// Scenarios share the base term, so every row has a value in every column.
pub fn render_table(simulation: &Simulation) -> String {
    render(|out| write_table(out, simulation))
}

fn write_table(out: &mut impl Write, simulation: &Simulation) -> fmt::Result {
    write!(out, "{:>5} {:>18}", "Month", "Gross Balance")?;
    for (i, scenario) in simulation.scenarios.iter().enumerate() {
        let label = format!("S{} ({})", i + 1, rate_label(scenario.input.annual_rate));
        write!(out, " {:>18}", label)?;
    }
    writeln!(out)?;

    for (row, entry) in simulation.base.monthly_balances.iter().enumerate() {
        write!(out, "{:>5} {:>18}", entry.month, format_money(entry.balance))?;
        for scenario in &simulation.scenarios {
            let cell = scenario
                .monthly_balances
                .get(row)
                .map_or_else(String::new, |b| format_money(b.balance));
            write!(out, " {:>18}", cell)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Saved simulations, oldest first.
pub fn render_history(records: &[HistoryRecord]) -> String {
    if records.is_empty() {
        return "No saved simulations yet. Run `selic simulate --save` to add one.\n".to_string();
    }
    render(|out| write_history(out, records))
}

fn write_history(out: &mut impl Write, records: &[HistoryRecord]) -> fmt::Result {
    writeln!(
        out,
        "{:>4}  {:<19} {:>16} {:>14} {:>8} {:>6} {:>18} {:>14} {:>18}",
        "Id", "Saved at (UTC)", "Initial", "Monthly", "Rate", "Months", "Gross", "Tax", "Net"
    )?;
    for record in records {
        writeln!(
            out,
            "{:>4}  {:<19} {:>16} {:>14} {:>8} {:>6} {:>18} {:>14} {:>18}",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            format_money(record.principal),
            format_money(record.monthly_contribution),
            rate_label(record.annual_rate),
            record.term_months,
            format_money(record.gross_final_balance),
            format_money(record.tax_amount),
            format_money(record.net_final_balance),
        )?;
    }
    Ok(())
}
