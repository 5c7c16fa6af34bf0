use serde::Serialize;
use tracing::debug;

use crate::analysis::{AnalysisInput, Report, ReportOutput};
use crate::data::repository;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ReportInfo {
    pub number: usize,
    pub id: Report,
    pub title: &'static str,
    pub description: &'static str,
}

pub fn list_reports() -> Vec<ReportInfo> {
    Report::ALL
        .iter()
        .enumerate()
        .map(|(idx, report)| ReportInfo {
            number: idx + 1,
            id: *report,
            title: report.title(),
            description: report.description(),
        })
        .collect()
}

fn load_input(state: &AppState) -> Result<AnalysisInput, AppError> {
    let orders = state.orders.read_all()?;
    let menu = {
        let conn = state.conn();
        repository::list_cocktails(&conn)?
    };
    debug!(orders = orders.len(), menu = menu.len(), "analysis input loaded");
    Ok(AnalysisInput::new(orders, menu))
}

/// Runs the selected reports in the order given; an empty selection runs all of them.
pub fn run_reports(state: &AppState, reports: &[Report]) -> Result<Vec<ReportOutput>, AppError> {
    let input = load_input(state)?;
    let selected: &[Report] = if reports.is_empty() {
        &Report::ALL
    } else {
        reports
    };
    Ok(selected.iter().map(|report| report.run(&input)).collect())
}
