use super::ImpactStore;
use crate::{error::ImpactResult, scenario::FlowResult};
use rusqlite::params;

impl ImpactStore {
    // ── Flow results ───────────────────────────────────────────

    /// Swap in a complete result set. Either all rows land or none do;
    /// prior contents survive a failed write.
    pub fn replace_flow_results(&self, rows: &[FlowResult]) -> ImpactResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM flow_result", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO flow_result (
                    market_id, cell_id, flow_status_quo, flow_planned,
                    share_status_quo, share_planned
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.market_id,
                    r.cell_id,
                    r.flow_status_quo,
                    r.flow_planned,
                    r.share_status_quo,
                    r.share_planned,
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("flow_result replaced with {} rows", rows.len());
        Ok(())
    }

    pub fn flow_results(&self) -> ImpactResult<Vec<FlowResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT market_id, cell_id, flow_status_quo, flow_planned,
                    share_status_quo, share_planned
             FROM flow_result ORDER BY market_id ASC, cell_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FlowResult {
                market_id:        row.get(0)?,
                cell_id:          row.get(1)?,
                flow_status_quo:  row.get(2)?,
                flow_planned:     row.get(3)?,
                share_status_quo: row.get(4)?,
                share_planned:    row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn flow_result_count(&self) -> ImpactResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM flow_result", [], |row| row.get(0))?;
        Ok(count)
    }
}
