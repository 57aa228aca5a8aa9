//! File formats around the tax engines: year parameter tables (TOML),
//! `key=value` input and carryforward files, the file-backed carryforward
//! repository, and what-if scenario CSVs.

pub mod carryforward;
pub mod inputs;
pub mod parameters;
pub mod scenarios;

pub use carryforward::FileCarryforwardRepository;
pub use inputs::{
    InputFileError, load_scenario_file, parse_carryforward, parse_scenario, render_carryforward,
};
pub use parameters::{ParameterLoader, ParameterLoaderError};
pub use scenarios::{Adjustment, ScenarioFileError, ScenarioLoader, WhatIfScenario};
