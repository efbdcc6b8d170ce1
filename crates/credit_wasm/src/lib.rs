//! WebAssembly bridge for the credit-cycle shooting core.
//!
//! The browser front end owns plotting and export; this crate only converts
//! configuration objects in and plot-ready reports out.

pub mod report;
pub mod search;
pub mod system;

pub use report::{SearchReport, TrajectoryReport};
pub use search::{run_shooting_search, WasmShootingSearchRunner};
pub use system::WasmCreditModel;
