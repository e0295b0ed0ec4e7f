use anyhow::{bail, Result};
use std::env;

use super::worklist::WorkListOrder;

/// Environment variable selecting what is dumped after solving.
pub const DUMP_ENV_VAR: &str = "PTA_DUMP";

/// What the solver reports through the logger once the fixpoint is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    None,
    Statistics,
    CallGraph,
    All,
}

impl Default for DumpMode {
    fn default() -> Self {
        DumpMode::None
    }
}

impl DumpMode {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "" | "none" => Ok(DumpMode::None),
            "stats" => Ok(DumpMode::Statistics),
            "cg" => Ok(DumpMode::CallGraph),
            "all" => Ok(DumpMode::All),
            other => bail!(
                "{} set to {:?}, expected one of none, stats, cg, all",
                DUMP_ENV_VAR,
                other
            ),
        }
    }

    pub fn statistics(self) -> bool {
        matches!(self, DumpMode::Statistics | DumpMode::All)
    }

    pub fn call_graph(self) -> bool {
        matches!(self, DumpMode::CallGraph | DumpMode::All)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PtaOptions {
    pub dump: DumpMode,
    pub order: WorkListOrder,
}

impl PtaOptions {
    pub fn from_env() -> Result<Self> {
        let dump = match env::var(DUMP_ENV_VAR) {
            Ok(value) => DumpMode::parse(&value)?,
            Err(env::VarError::NotPresent) => DumpMode::None,
            Err(env::VarError::NotUnicode(_)) => bail!("{} is not valid unicode", DUMP_ENV_VAR),
        };
        Ok(Self {
            dump,
            ..Self::default()
        })
    }
}
