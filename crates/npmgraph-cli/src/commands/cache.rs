//! Cache command implementation.

use miette::Result;

use npmgraph_core::config::Config;

use crate::cli::CacheAction;

pub fn exec(config: &Config, action: CacheAction) -> Result<()> {
    match action {
        CacheAction::Info => npmgraph_ops::ops_cache::info(config),
        CacheAction::Clean => npmgraph_ops::ops_cache::clean(config),
    }
}
