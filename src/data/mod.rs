/// Data layer: core types, loading, and upload caching.
///
/// Architecture:
/// ```text
///   uploaded .csv bytes
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  sha256(bytes) → Arc<Dataset>, parse on miss
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse CSV → Dataset, convert `Timestamp`
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  column-wise cells, file column order
///   └──────────┘
/// ```

pub mod cache;
pub mod loader;
pub mod model;
