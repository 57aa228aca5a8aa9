//! Tax calculation engines for Massachusetts and US federal income tax.
//!
//! Every engine is a pure, single pass over an input record and a borrowed
//! parameter set. Intermediate values are emitted as `tracing` events;
//! nothing here performs I/O.

pub mod brackets;
pub mod capital_gains;
pub mod common;
pub mod deductions;
pub mod federal;
pub mod household;
pub mod state;

pub use brackets::{BracketTax, bracket_tax, stacked_bracket_tax};
pub use capital_gains::{
    CarryforwardSplit, FederalNetting, SignNetting, StateNetting, net_federal_gains,
    net_state_gains, sign_net,
};
pub use deductions::{DeductionEngine, DeductionInput, DeductionResult, InvestmentInterest};
pub use federal::{FederalTaxInput, UsFederalTaxEngine};
pub use household::{TaxYearSummary, calculate_tax_year};
pub use state::{MaStateTaxEngine, StateTaxInput};
