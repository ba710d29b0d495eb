pub mod chain_cache;
