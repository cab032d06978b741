//! File formats around the circuit builder: case files in, configuration,
//! and graph exports out.

pub mod case;
pub mod config;
pub mod export;

pub use case::{build_case, load_case, validate_case, CaseFile, ComplexValue, LatticeSpec};
pub use config::{load_config, load_config_or_default, ExportFormat, TpsConfig};
pub use export::{render_graph, write_graph, GraphExport};
