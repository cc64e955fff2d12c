// 📂 Table Sources - Where the three tables live
//
// Loads every table fresh on each call. A missing optional investor ledger is
// simply absent; any other load failure is reported to the caller.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::{GraphAssembler, GraphSnapshot};
use crate::records::{
    load_beneficiaries_csv, load_contributions_csv, BeneficiaryRecord, ContributorRecord, LedgerKind,
    LoadReport,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSources {
    /// Primary contribution ledger
    pub donations: PathBuf,

    /// Secondary ledger, optional
    pub investors: Option<PathBuf>,

    pub beneficiaries: PathBuf,
}

/// All tables loaded, contributors in ledger order (primary first)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedTables {
    pub contributors: Vec<ContributorRecord>,
    pub beneficiaries: Vec<BeneficiaryRecord>,

    /// Rows rejected by the loaders across all tables
    pub skipped: usize,
}

impl TableSources {
    pub fn new(donations: impl Into<PathBuf>, beneficiaries: impl Into<PathBuf>) -> Self {
        TableSources {
            donations: donations.into(),
            investors: None,
            beneficiaries: beneficiaries.into(),
        }
    }

    /// Builder pattern: add the secondary ledger
    pub fn with_investors(mut self, investors: impl Into<PathBuf>) -> Self {
        self.investors = Some(investors.into());
        self
    }

    pub fn load(&self) -> Result<LoadedTables> {
        let donations = load_contributions_csv(&self.donations, LedgerKind::Donation)?;

        let investors = match &self.investors {
            Some(path) => load_contributions_csv(path, LedgerKind::Investor)?,
            None => LoadReport::empty(),
        };

        let beneficiaries = load_beneficiaries_csv(&self.beneficiaries)?;

        let skipped = donations.skipped + investors.skipped + beneficiaries.skipped;
        let mut contributors = donations.records;
        contributors.extend(investors.records);

        info!(
            contributors = contributors.len(),
            beneficiaries = beneficiaries.records.len(),
            skipped,
            "tables loaded"
        );

        Ok(LoadedTables {
            contributors,
            beneficiaries: beneficiaries.records,
            skipped,
        })
    }
}

/// Load the tables and build a snapshot; load failures give the empty snapshot
pub fn snapshot_from_sources(sources: &TableSources, config: &EngineConfig) -> GraphSnapshot {
    match sources.load() {
        Ok(tables) => GraphAssembler::new(config.clone())
            .build(&tables.contributors, &tables.beneficiaries)
            .with_load_skips(tables.skipped),
        Err(e) => {
            error!(error = %e, "failed to load tables, returning empty snapshot");
            GraphSnapshot::empty()
        }
    }
}
