use super::ImpactStore;
use crate::{
    error::ImpactResult,
    model::{Cell, DistanceRecord, Market, ModelInputs},
};
use rusqlite::{params, Transaction};

impl ImpactStore {
    // ── Markets ────────────────────────────────────────────────

    /// Replace the whole market table.
    pub fn replace_markets(&self, markets: &[Market]) -> ImpactResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_markets(&tx, markets)?;
        tx.commit()?;
        Ok(())
    }

    pub fn markets(&self) -> ImpactResult<Vec<Market>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, ags, chain_id, outlet_status_quo, outlet_planned, sales_area
             FROM market ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Market {
                id:                row.get(0)?,
                name:              row.get(1)?,
                ags:               row.get(2)?,
                chain_id:          row.get(3)?,
                outlet_status_quo: row.get(4)?,
                outlet_planned:    row.get(5)?,
                sales_area:        row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Cells ──────────────────────────────────────────────────

    pub fn replace_cells(&self, cells: &[Cell]) -> ImpactResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_cells(&tx, cells)?;
        tx.commit()?;
        Ok(())
    }

    pub fn cells(&self) -> ImpactResult<Vec<Cell>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, purchasing_power, planned_area_id, ags, inhabitants
             FROM cell ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Cell {
                id:               row.get(0)?,
                purchasing_power: row.get(1)?,
                planned_area_id:  row.get(2)?,
                ags:              row.get(3)?,
                inhabitants:      row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Distances ──────────────────────────────────────────────

    pub fn replace_distances(&self, distances: &[DistanceRecord]) -> ImpactResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_distances(&tx, distances)?;
        tx.commit()?;
        Ok(())
    }

    pub fn distances(&self) -> ImpactResult<Vec<DistanceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT market_id, cell_id, routed_m, beeline_m
             FROM distance ORDER BY market_id ASC, cell_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DistanceRecord {
                market_id: row.get(0)?,
                cell_id:   row.get(1)?,
                routed_m:  row.get(2)?,
                beeline_m: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// All three input tables at once.
    pub fn load_inputs(&self) -> ImpactResult<ModelInputs> {
        Ok(ModelInputs {
            markets:   self.markets()?,
            cells:     self.cells()?,
            distances: self.distances()?,
        })
    }

    /// Replace all three input tables in one transaction. A failing row
    /// leaves the previous inputs untouched.
    pub fn replace_inputs(&self, inputs: &ModelInputs) -> ImpactResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_markets(&tx, &inputs.markets)?;
        write_cells(&tx, &inputs.cells)?;
        write_distances(&tx, &inputs.distances)?;
        tx.commit()?;
        Ok(())
    }
}

fn write_markets(tx: &Transaction<'_>, markets: &[Market]) -> ImpactResult<()> {
    tx.execute("DELETE FROM market", [])?;
    let mut stmt = tx.prepare(
        "INSERT INTO market (
            id, name, ags, chain_id, outlet_status_quo, outlet_planned, sales_area
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for m in markets {
        stmt.execute(params![
            m.id,
            &m.name,
            &m.ags,
            m.chain_id,
            m.outlet_status_quo,
            m.outlet_planned,
            m.sales_area,
        ])?;
    }
    Ok(())
}

fn write_cells(tx: &Transaction<'_>, cells: &[Cell]) -> ImpactResult<()> {
    tx.execute("DELETE FROM cell", [])?;
    let mut stmt = tx.prepare(
        "INSERT INTO cell (id, purchasing_power, planned_area_id, ags, inhabitants)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for c in cells {
        stmt.execute(params![
            c.id,
            c.purchasing_power,
            c.planned_area_id,
            &c.ags,
            c.inhabitants,
        ])?;
    }
    Ok(())
}

fn write_distances(tx: &Transaction<'_>, distances: &[DistanceRecord]) -> ImpactResult<()> {
    tx.execute("DELETE FROM distance", [])?;
    let mut stmt = tx.prepare(
        "INSERT INTO distance (market_id, cell_id, routed_m, beeline_m)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(market_id, cell_id) DO UPDATE SET
            routed_m = excluded.routed_m,
            beeline_m = excluded.beeline_m",
    )?;
    for d in distances {
        stmt.execute(params![d.market_id, d.cell_id, d.routed_m, d.beeline_m])?;
    }
    Ok(())
}
