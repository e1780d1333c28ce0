//! Projecting vaccine supply against forecasted registration demand.
//!
//! vaxline pairs two engines. A compartmental projector simulates how a
//! population moves toward vaccine registration: `eligible` people enter an
//! in-progress pool and complete into `registered`, producing a daily
//! demand trajectory. An allocation engine then left-joins per-manufacturer
//! shipment records onto the simulated calendar, accumulates them into
//! running totals, and splits cumulative supply into first- and second-dose
//! pools over a campaign window using a demand-capped proportional share.
//!
//! A typical run:
//! * load [`params::Parameters`] from JSON, or start from the defaults;
//! * integrate the daily trajectory with [`projector::project`];
//! * load per-manufacturer shipment sheets with [`supply::load_supply_dir`];
//! * merge and accumulate them with [`timeline::DoseGrid`];
//! * assemble the campaign-window table with
//!   [`timeline::MergedTimeline::assemble`];
//! * write the output tables with the [`report`] writers.
//!
//! [`runner::run_pipeline`] chains the computation stages for in-memory
//! inputs; the `vaxline` binary wraps a whole run, files in and files out,
//! behind a clap CLI.
pub mod allocation;
pub mod error;
pub mod log;
pub mod numeric;
pub mod ode;
pub mod params;
pub mod projector;
pub mod report;
pub mod runner;
pub mod supply;
pub mod timeline;

pub use crate::log::{debug, error, info, trace, warn};
pub use error::VaxlineError;
