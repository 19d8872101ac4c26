//! Operation: inspect and clear the packument cache.

use npmgraph_core::config::Config;
use npmgraph_registry::cache::PackumentCache;
use npmgraph_util::fs::format_size;

fn cache(config: &Config) -> PackumentCache {
    PackumentCache::new(&config.registry.cache_path())
}

/// Print cache location, entry count and size.
pub fn info(config: &Config) -> miette::Result<()> {
    let cache = cache(config);
    println!("Packument cache: {}", cache.root().display());
    println!("  Entries: {}", cache.entry_count());
    println!("  Size:    {}", format_size(cache.size()));
    println!("  TTL:     {}s", config.registry.cache_ttl_secs);
    Ok(())
}

/// Remove every cached packument.
pub fn clean(config: &Config) -> miette::Result<()> {
    let freed = cache(config).clear()?;
    if freed == 0 {
        println!("Packument cache is already empty");
    } else {
        println!("Cleared packument cache ({} freed)", format_size(freed));
    }
    Ok(())
}
