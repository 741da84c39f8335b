//! Chart layer: multi-axis assembly and export.
//!
//! ```text
//!   [&Dataset] + [SeriesSelection] + [Color]
//!        │
//!        ▼
//!   ┌────────────┐
//!   │ assemble    │  one trace + one y-axis per selection, fail-fast
//!   └────────────┘
//!        │
//!        ▼
//!   ┌────────────┐
//!   │ ChartSpec   │──► ui::plot (egui_plot)
//!   └────────────┘──► export (Plotly HTML, data URI)
//! ```

pub mod assemble;
pub mod error;
pub mod export;
pub mod spec;

pub use assemble::{build_chart, SeriesSelection};
pub use error::ChartError;
pub use spec::{AxisSide, ChartSpec, Color};
