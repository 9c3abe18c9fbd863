//! Position store: add/update/close/remove over the holdings collection.
//!
//! Every mutation re-reads the collection through the repository, applies
//! the change in memory and writes the full collection back. A rejected
//! operation never writes.

use crate::domain::error::DashboardError;
use crate::domain::holding::{self, EntryDate, Holding, HoldingStatus};
use crate::ports::holding_port::{HoldingLoad, HoldingRepository};
use chrono::NaiveDate;
use tracing::{debug, info};

pub struct PositionStore<'a> {
    repo: &'a dyn HoldingRepository,
}

impl<'a> PositionStore<'a> {
    pub fn new(repo: &'a dyn HoldingRepository) -> Self {
        Self { repo }
    }

    pub fn list(&self) -> Result<Vec<Holding>, DashboardError> {
        Ok(self.repo.load()?.holdings)
    }

    /// Open holdings paired with their store index.
    pub fn open_positions(&self) -> Result<Vec<(usize, Holding)>, DashboardError> {
        self.indexed(|h| h.is_open())
    }

    /// Closed holdings paired with their store index.
    pub fn closed_positions(&self) -> Result<Vec<(usize, Holding)>, DashboardError> {
        self.indexed(|h| !h.is_open())
    }

    pub fn add(
        &self,
        ticker: &str,
        entry_date: EntryDate,
        entry_price: f64,
        quantity: f64,
        notes: &str,
    ) -> Result<usize, DashboardError> {
        holding::validate_amounts(entry_price, quantity)
            .map_err(|reason| DashboardError::InvalidHolding { reason })?;
        let ticker = holding::normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(DashboardError::InvalidHolding {
                reason: "ticker must not be empty".into(),
            });
        }

        let mut load = self.repo.load()?;
        if load
            .holdings
            .iter()
            .any(|h| h.ticker == ticker && h.is_open())
        {
            return Err(DashboardError::DuplicateOpenPosition { ticker });
        }

        load.holdings.push(Holding::open(
            &ticker,
            entry_date,
            entry_price,
            quantity,
            notes,
        ));
        let index = load.holdings.len() - 1;
        self.commit(&load)?;
        info!(%ticker, quantity, entry_price, index, "added holding");
        Ok(index)
    }

    pub fn update(
        &self,
        index: usize,
        quantity: f64,
        entry_price: f64,
        notes: &str,
    ) -> Result<(), DashboardError> {
        holding::validate_amounts(entry_price, quantity)
            .map_err(|reason| DashboardError::InvalidHolding { reason })?;
        let mut load = self.repo.load()?;
        let record = record_mut(&mut load, index)?;
        record.quantity = quantity;
        record.entry_price = entry_price;
        record.notes = notes.to_string();
        self.commit(&load)?;
        info!(index, quantity, entry_price, "updated holding");
        Ok(())
    }

    /// Mark the record closed on `close_date`. Closing an already closed
    /// record replaces its date.
    pub fn close(&self, index: usize, close_date: NaiveDate) -> Result<(), DashboardError> {
        let mut load = self.repo.load()?;
        let record = record_mut(&mut load, index)?;
        record.status = HoldingStatus::Closed(close_date);
        let ticker = record.ticker.clone();
        self.commit(&load)?;
        info!(index, %ticker, %close_date, "closed holding");
        Ok(())
    }

    /// Close the first open record for `ticker`, returning its index.
    pub fn close_open(&self, ticker: &str, close_date: NaiveDate) -> Result<usize, DashboardError> {
        let ticker = holding::normalize_ticker(ticker);
        let load = self.repo.load()?;
        let index = load
            .holdings
            .iter()
            .position(|h| h.ticker == ticker && h.is_open())
            .ok_or_else(|| DashboardError::InvalidHolding {
                reason: format!("no open position for {}", ticker),
            })?;
        self.close(index, close_date)?;
        Ok(index)
    }

    /// Delete a record permanently. Indices of later records shift down by one.
    pub fn remove(&self, index: usize) -> Result<Holding, DashboardError> {
        let mut load = self.repo.load()?;
        if index >= load.holdings.len() {
            return Err(DashboardError::RecordNotFound {
                index,
                len: load.holdings.len(),
            });
        }
        let removed = load.holdings.remove(index);
        self.commit(&load)?;
        info!(index, ticker = %removed.ticker, "removed holding");
        Ok(removed)
    }

    fn indexed<F>(&self, keep: F) -> Result<Vec<(usize, Holding)>, DashboardError>
    where
        F: Fn(&Holding) -> bool,
    {
        Ok(self
            .list()?
            .into_iter()
            .enumerate()
            .filter(|(_, h)| keep(h))
            .collect())
    }

    fn commit(&self, load: &HoldingLoad) -> Result<(), DashboardError> {
        debug!(
            records = load.holdings.len(),
            rejected = load.rejected.len(),
            "writing holdings"
        );
        self.repo.save(&load.holdings, &load.rejected)
    }
}

fn record_mut(load: &mut HoldingLoad, index: usize) -> Result<&mut Holding, DashboardError> {
    let len = load.holdings.len();
    load.holdings
        .get_mut(index)
        .ok_or(DashboardError::RecordNotFound { index, len })
}
