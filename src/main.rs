use clap::Parser;
use sieve::SieveCache;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sieve-demo", about = "Walk through the SIEVE cache API")]
struct Cli {
    /// Capacity of the demo cache.
    #[arg(long, default_value_t = 3)]
    capacity: usize,

    /// Capacity to shrink the cache to halfway through.
    #[arg(long, default_value_t = 2)]
    shrink_to: usize,
}

fn main() -> sieve::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cache: SieveCache<String, u32> = SieveCache::try_new(cli.capacity)?;

    for (n, key) in ["A", "B", "C"].into_iter().enumerate() {
        cache.insert(key.to_string(), n as u32 + 1);
    }
    match cache.get("B") {
        Ok(value) => println!("value for 'B': {value}"),
        Err(err) => println!("error getting 'B': {err}"),
    }
    println!("after adding A, B and C: {cache}");
    println!("keys: {:?}", cache.keys());

    let evicted = cache.resize(cli.shrink_to);
    println!("evicted after resizing to {}: {evicted:?}", cli.shrink_to);

    cache.insert("D".to_string(), 4);
    cache.insert("E".to_string(), 5);
    println!("after adding D and E: {cache}");
    println!("len: {}, capacity: {}", cache.len(), cache.capacity());
    println!("keys: {:?}", cache.keys());

    match cache.evict() {
        Ok(key) => println!("evicted: {key}"),
        Err(err) => println!("error during eviction: {err}"),
    }
    println!("after eviction: {cache}");

    match cache.get("A") {
        Ok(value) => println!("value for 'A': {value}"),
        Err(err) => println!("error getting 'A': {err}"),
    }

    cache.clear();
    println!("after clearing: {cache}");
    Ok(())
}
