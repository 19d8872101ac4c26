//! Handler for `npmgraph why`.

use miette::Result;

use npmgraph_core::config::Config;

pub async fn exec(config: &Config, target: &str, roots: &[String]) -> Result<()> {
    npmgraph_ops::ops_why::why(config, target, roots).await
}
