//! Execution Step: runs the candidate once and turns whatever happens into
//! an [`ExecutionOutcome`].

use super::gateway::DataGateway;
use super::types::{ExecutionOutcome, SqlCandidate, NO_DATA_FOUND, NO_SQL_GENERATED, QUERY_FAILED};

/// Execute `candidate` against the Data Gateway. Single attempt, no retries.
pub async fn run(data: &dyn DataGateway, candidate: Option<&SqlCandidate>) -> ExecutionOutcome {
    let Some(sql) = candidate.filter(|c| !c.is_empty()) else {
        tracing::warn!("execution: no candidate to run");
        return ExecutionOutcome::notice(NO_SQL_GENERATED);
    };

    match data.execute(sql.as_str()).await {
        Ok(rows) if rows.is_empty() => {
            tracing::info!("execution: query returned no rows");
            ExecutionOutcome::notice(NO_DATA_FOUND)
        }
        Ok(rows) => {
            tracing::info!(row_count = rows.len(), "execution: query succeeded");
            ExecutionOutcome::Rows(rows)
        }
        Err(e) => {
            tracing::warn!(error = %e, sql = %sql, "execution: query failed");
            ExecutionOutcome::notice(QUERY_FAILED)
        }
    }
}
