use eyre::Result;
use itertools::Itertools;
use serde::Serialize;

use super::PoolRow;

/// Column headers of the pool table
const COLUMNS: [&str; 4] = ["Pool", "Epoch", "Balance", "Action"];

/// Renders the dashboard as a plain text table.
///
/// Nothing but the header line is printed until at least one pool was scanned.
pub fn render_text(current_epoch: Option<u128>, rows: &[PoolRow], contract_url: &str) -> String {
    let mut out = String::new();
    if let Some(current) = current_epoch {
        out.push_str(&format!("Current Epoch: {current}\n"));
    }
    if rows.is_empty() {
        return out;
    }

    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.name.clone(),
                row.epoch
                    .map_or_else(|| "-".to_string(), |epoch| format!("{epoch} ({})", row.status)),
                row.balance_pretty.clone(),
                row.action.to_string(),
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(str::len);
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.len());
        }
    }

    let format_line = |cells: &[&str]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .join(" | ")
            .trim_end()
            .to_string()
    };

    out.push_str("Staking Pools\n");
    out.push_str(&format_line(&COLUMNS));
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).join("-+-"));
    out.push('\n');
    for line in &cells {
        let refs: Vec<&str> = line.iter().map(String::as_str).collect();
        out.push_str(&format_line(&refs));
        out.push('\n');
    }
    out.push_str(&format!("Staking Contract: {contract_url}\n"));
    out
}

/// JSON shape of the dashboard
#[derive(Serialize)]
struct Snapshot<'a> {
    /// Contract's current epoch
    current_epoch: Option<u128>,
    /// Scanned pools
    pools: &'a [PoolRow],
    /// Explorer link to the staking contract
    staking_contract: &'a str,
}

/// Renders the dashboard as pretty JSON
///
/// # Errors
/// * If serialization fails
pub fn render_json(
    current_epoch: Option<u128>,
    rows: &[PoolRow],
    contract_url: &str,
) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Snapshot {
        current_epoch,
        pools: rows,
        staking_contract: contract_url,
    })?)
}
