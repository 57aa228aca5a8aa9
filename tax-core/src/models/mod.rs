mod carryforward;
mod filing_status;
mod parameters;
mod scenario;
mod tax_bracket;
mod tax_result;

pub use carryforward::CarryforwardState;
pub use filing_status::FilingStatusCode;
pub use parameters::{FederalParameters, ParameterTables, StateParameters, TaxYearParameters};
pub use scenario::{ScenarioField, ScenarioInput};
pub use tax_bracket::{TaxBracket, validate_schedule};
pub use tax_result::{DeductionType, FederalTaxResult, StateTaxResult};
