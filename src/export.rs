use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::aggregate::{QueryOutput, ResultTable, TeamAggregate};
use crate::metrics::Metric;

/// Header row followed by one string row per result line.
pub fn table_rows(output: &QueryOutput) -> Vec<Vec<String>> {
    match &output.table {
        ResultTable::Leaderboard { metric, rows } => {
            let mut out = vec![vec![
                "Rank".to_string(),
                "Team".to_string(),
                "Team ID".to_string(),
                "Games".to_string(),
                metric.name().to_string(),
            ]];
            for row in rows {
                out.push(vec![
                    row.rank.to_string(),
                    row.team.abbreviation.clone(),
                    row.team.id.to_string(),
                    row.games.to_string(),
                    format_value(*metric, row.value),
                ]);
            }
            out
        }
        ResultTable::Scatter {
            x_metric,
            y_metric,
            points,
        } => {
            let mut out = vec![vec![
                "Team".to_string(),
                "Team ID".to_string(),
                "Games".to_string(),
                x_metric.name().to_string(),
                y_metric.name().to_string(),
            ]];
            for p in points {
                out.push(vec![
                    p.team.abbreviation.clone(),
                    p.team.id.to_string(),
                    p.games.to_string(),
                    format_value(*x_metric, p.x),
                    format_value(*y_metric, p.y),
                ]);
            }
            out
        }
        ResultTable::Compare { teams } => compare_rows(teams),
    }
}

// One row per metric, one column per team.
fn compare_rows(teams: &[TeamAggregate]) -> Vec<Vec<String>> {
    let mut header = vec!["Metric".to_string()];
    header.extend(teams.iter().map(|t| t.team.abbreviation.clone()));
    let mut out = vec![header];

    let mut games = vec!["Games".to_string()];
    games.extend(teams.iter().map(|t| t.games.to_string()));
    out.push(games);

    for metric in Metric::ALL {
        let mut row = vec![metric.name().to_string()];
        // Opponent metrics of an unpaired team are shown blank.
        row.extend(
            teams
                .iter()
                .map(|t| format_value(metric, t.value(metric).ok().flatten())),
        );
        out.push(row);
    }
    out
}

pub fn format_value(metric: Metric, value: Option<f64>) -> String {
    let Some(v) = value else {
        return String::new();
    };
    match metric {
        Metric::EfgPct | Metric::TsPct | Metric::AstRate | Metric::TovRate => format!("{v:.3}"),
        _ => format!("{v:.1}"),
    }
}

pub fn to_json(output: &QueryOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("serialize query output")
}

/// Write the result table and its explanation to an xlsx workbook.
pub fn export_xlsx(path: &Path, output: &QueryOutput) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Results")?;
        write_rows(sheet, &table_rows(output))?;
    }
    {
        let mut rows = vec![
            vec!["Season".to_string(), output.season.clone()],
            vec!["Chart".to_string(), output.spec.chart_label().to_string()],
            vec!["Window".to_string(), output.spec.window().to_string()],
            vec!["Teams".to_string(), output.teams_contributing.to_string()],
            vec!["Team-games".to_string(), output.games_contributing.to_string()],
        ];
        rows.extend(
            output
                .explanation
                .split(" | ")
                .map(|part| vec!["Note".to_string(), part.to_string()]),
        );
        let sheet = workbook.add_worksheet();
        sheet.set_name("Explanation")?;
        write_rows(sheet, &rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
