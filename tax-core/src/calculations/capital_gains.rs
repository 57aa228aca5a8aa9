//! Capital gain and loss netting with carryforward handling.
//!
//! Both jurisdictions share [`sign_net`]. They differ in where prior-year
//! losses enter and in what happens to an excess loss:
//!
//! | Step | Massachusetts ([`net_state_gains`]) | Federal ([`net_federal_gains`]) |
//! |------|-------------------------------------|---------------------------------|
//! | 1 | sign-net short against long | subtract prior short/long losses from the year's figures |
//! | 2 | absorb prior loss: short gain first, then long | sign-net short against long |
//! | 3 | leftover loss reduces interest/dividend income up to a cap | up to $3,000 of net loss offsets ordinary income |
//! | 4 | rest carries forward | rest carries forward, split long/short by share of the loss |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::non_negative;

/// Net capital loss that may offset ordinary income in one federal year.
pub const FEDERAL_CAPITAL_LOSS_LIMIT: Decimal = Decimal::from_parts(3000, 0, 0, false, 0);

/// Short and long balances after offsetting opposite signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignNetting {
    pub short_term: Decimal,
    pub long_term: Decimal,
    /// Amount moved from the gain side to cancel the loss side.
    pub offset: Decimal,
}

/// Offsets a loss in one term against a gain in the other.
///
/// The smaller magnitude is consumed entirely; same-sign pairs are returned
/// unchanged. The sum of the two balances never changes.
pub fn sign_net(
    short_term: Decimal,
    long_term: Decimal,
) -> SignNetting {
    let mut short_term = short_term;
    let mut long_term = long_term;
    let mut offset = Decimal::ZERO;

    if short_term > Decimal::ZERO && long_term < Decimal::ZERO {
        offset = short_term.min(long_term.abs());
        short_term -= offset;
        long_term += offset;
    } else if short_term < Decimal::ZERO && long_term > Decimal::ZERO {
        offset = long_term.min(short_term.abs());
        long_term -= offset;
        short_term += offset;
    }

    SignNetting {
        short_term,
        long_term,
        offset,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Massachusetts
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of the Massachusetts netting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateNetting {
    /// Short-term balance after netting and carryforward absorption.
    pub short_term: Decimal,
    /// Long-term balance after netting and carryforward absorption.
    pub long_term: Decimal,
    pub sign_offset: Decimal,
    /// Prior-year loss absorbed by this year's gains.
    pub carryforward_applied: Decimal,
    /// Loss applied against interest/dividend income.
    pub investment_income_offset: Decimal,
    pub adjusted_investment_income: Decimal,
    /// Loss carried into next year.
    pub carryforward: Decimal,
}

impl StateNetting {
    pub fn taxable_short_term(&self) -> Decimal {
        non_negative(self.short_term)
    }

    pub fn taxable_long_term(&self) -> Decimal {
        non_negative(self.long_term)
    }
}

/// Massachusetts netting.
///
/// After sign netting, `prior_carryforward` offsets a positive short-term
/// balance and then a positive long-term balance. Whatever carryforward is
/// left, plus any loss still sitting in either balance, forms the offset
/// balance; up to `max_investment_income_offset` of it reduces investment
/// income (never below zero) and the rest carries forward.
pub fn net_state_gains(
    short_term: Decimal,
    long_term: Decimal,
    investment_income: Decimal,
    prior_carryforward: Decimal,
    max_investment_income_offset: Decimal,
) -> StateNetting {
    let netted = sign_net(short_term, long_term);
    let mut short_term = netted.short_term;
    let mut long_term = netted.long_term;

    let mut remaining = non_negative(prior_carryforward);
    let mut carryforward_applied = Decimal::ZERO;
    if remaining > Decimal::ZERO && short_term > Decimal::ZERO {
        let absorbed = short_term.min(remaining);
        short_term -= absorbed;
        remaining -= absorbed;
        carryforward_applied += absorbed;
    }
    if remaining > Decimal::ZERO && long_term > Decimal::ZERO {
        let absorbed = long_term.min(remaining);
        long_term -= absorbed;
        remaining -= absorbed;
        carryforward_applied += absorbed;
    }

    let mut offset_balance =
        remaining - short_term.min(Decimal::ZERO) - long_term.min(Decimal::ZERO);

    let mut adjusted_investment_income = investment_income;
    let mut investment_income_offset = Decimal::ZERO;
    if offset_balance > Decimal::ZERO {
        investment_income_offset = max_investment_income_offset.min(offset_balance);
        adjusted_investment_income = non_negative(investment_income - investment_income_offset);
        offset_balance -= investment_income_offset;
    }

    let carryforward = non_negative(offset_balance);

    debug!(
        short_term = %short_term,
        long_term = %long_term,
        sign_offset = %netted.offset,
        carryforward_applied = %carryforward_applied,
        investment_income_offset = %investment_income_offset,
        adjusted_investment_income = %adjusted_investment_income,
        carryforward = %carryforward,
        "MA capital gains netted"
    );

    StateNetting {
        short_term,
        long_term,
        sign_offset: netted.offset,
        carryforward_applied,
        investment_income_offset,
        adjusted_investment_income,
        carryforward,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Federal
// ─────────────────────────────────────────────────────────────────────────────

/// How the federal carryforward was divided between the two terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarryforwardSplit {
    /// Net position was not a loss beyond the annual limit.
    None,
    LongTermOnly,
    ShortTermOnly,
    /// Both terms ended negative; split by each term's share of the loss.
    ProRata,
}

/// Outcome of the federal netting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalNetting {
    /// Short-term balance after carryforward and sign netting.
    pub short_term: Decimal,
    /// Long-term balance after carryforward and sign netting.
    pub long_term: Decimal,
    pub sign_offset: Decimal,
    /// `long_term + min(0, short_term)`; negative means a net capital loss.
    pub net_ltcg: Decimal,
    /// Portion of a net loss deducted from ordinary income.
    pub capital_loss_deduction: Decimal,
    pub capital_loss_carryforward: Decimal,
    pub short_term_carryforward: Decimal,
    pub long_term_carryforward: Decimal,
    pub split: CarryforwardSplit,
}

impl FederalNetting {
    pub fn positive_short_term(&self) -> Decimal {
        non_negative(self.short_term)
    }
}

/// Federal netting.
///
/// Prior-year losses reduce this year's short and long figures before sign
/// netting. A negative net position offsets up to `loss_limit` of ordinary
/// income; the excess carries forward, divided between long and short in
/// proportion to each term's share of the total loss.
pub fn net_federal_gains(
    short_term: Decimal,
    long_term: Decimal,
    prior_short_term_loss: Decimal,
    prior_long_term_loss: Decimal,
    loss_limit: Decimal,
) -> FederalNetting {
    let short_term = short_term - non_negative(prior_short_term_loss);
    let long_term = long_term - non_negative(prior_long_term_loss);
    let netted = sign_net(short_term, long_term);
    let short_term = netted.short_term;
    let long_term = netted.long_term;
    let net_ltcg = long_term + short_term.min(Decimal::ZERO);

    let mut result = FederalNetting {
        short_term,
        long_term,
        sign_offset: netted.offset,
        net_ltcg,
        capital_loss_deduction: Decimal::ZERO,
        capital_loss_carryforward: Decimal::ZERO,
        short_term_carryforward: Decimal::ZERO,
        long_term_carryforward: Decimal::ZERO,
        split: CarryforwardSplit::None,
    };

    if net_ltcg < Decimal::ZERO {
        let net_loss = net_ltcg.abs();
        result.capital_loss_deduction = net_loss.min(non_negative(loss_limit));
        result.capital_loss_carryforward = net_loss - result.capital_loss_deduction;
        split_carryforward(&mut result);
    }

    debug!(
        short_term = %result.short_term,
        long_term = %result.long_term,
        sign_offset = %result.sign_offset,
        net_ltcg = %result.net_ltcg,
        capital_loss_deduction = %result.capital_loss_deduction,
        capital_loss_carryforward = %result.capital_loss_carryforward,
        short_term_carryforward = %result.short_term_carryforward,
        long_term_carryforward = %result.long_term_carryforward,
        "US capital gains netted"
    );

    result
}

/// Divides `capital_loss_carryforward` between the terms.
///
/// After sign netting a net loss means neither term holds a gain, so each
/// term's loss is its share of the total. The short-term share is derived
/// by subtraction so the parts always sum to the whole.
fn split_carryforward(result: &mut FederalNetting) {
    let carryforward = result.capital_loss_carryforward;
    if carryforward <= Decimal::ZERO {
        return;
    }

    let long_loss = non_negative(-result.long_term);
    let short_loss = non_negative(-result.short_term);

    match (long_loss > Decimal::ZERO, short_loss > Decimal::ZERO) {
        (true, false) => {
            result.long_term_carryforward = carryforward;
            result.split = CarryforwardSplit::LongTermOnly;
        }
        (false, true) => {
            result.short_term_carryforward = carryforward;
            result.split = CarryforwardSplit::ShortTermOnly;
        }
        (true, true) => {
            warn!(
                long_term_loss = %long_loss,
                short_term_loss = %short_loss,
                carryforward = %carryforward,
                "both terms carry a loss; carryforward split pro-rata by loss share"
            );
            let long_share = long_loss / (long_loss + short_loss);
            result.long_term_carryforward = carryforward * long_share;
            result.short_term_carryforward = carryforward - result.long_term_carryforward;
            result.split = CarryforwardSplit::ProRata;
        }
        (false, false) => {}
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    /// Routes WARN events to the test writer so the ambiguous-split warning shows up.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    const MA_OFFSET_CAP: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);

    fn pairs() -> Vec<(Decimal, Decimal)> {
        vec![
            (dec!(0), dec!(0)),
            (dec!(5000), dec!(-2000)),
            (dec!(2000), dec!(-5000)),
            (dec!(-3000), dec!(8000)),
            (dec!(-8000), dec!(3000)),
            (dec!(-1000), dec!(-2000)),
            (dec!(4000), dec!(6000)),
            (dec!(1234.56), dec!(-1234.56)),
        ]
    }

    // =========================================================================
    // sign_net tests
    // =========================================================================

    #[test]
    fn sign_net_long_loss_offsets_short_gain() {
        let result = sign_net(dec!(5000), dec!(-2000));

        assert_eq!(result.short_term, dec!(3000));
        assert_eq!(result.long_term, dec!(0));
        assert_eq!(result.offset, dec!(2000));
    }

    #[test]
    fn sign_net_short_loss_offsets_long_gain() {
        let result = sign_net(dec!(-8000), dec!(3000));

        assert_eq!(result.short_term, dec!(-5000));
        assert_eq!(result.long_term, dec!(0));
        assert_eq!(result.offset, dec!(3000));
    }

    #[test]
    fn sign_net_leaves_same_sign_values_untouched() {
        assert_eq!(
            sign_net(dec!(-1000), dec!(-2000)),
            SignNetting {
                short_term: dec!(-1000),
                long_term: dec!(-2000),
                offset: dec!(0),
            }
        );
        assert_eq!(sign_net(dec!(1000), dec!(2000)).offset, dec!(0));
    }

    #[test]
    fn sign_net_conserves_the_total() {
        for (short_term, long_term) in pairs() {
            let result = sign_net(short_term, long_term);
            assert_eq!(result.short_term + result.long_term, short_term + long_term);
        }
    }

    // =========================================================================
    // net_state_gains tests
    // =========================================================================

    #[test]
    fn state_netting_with_no_activity_carries_nothing() {
        let result = net_state_gains(dec!(0), dec!(0), dec!(5000), dec!(0), MA_OFFSET_CAP);

        assert_eq!(result.carryforward, dec!(0));
        assert_eq!(result.adjusted_investment_income, dec!(5000));
        assert_eq!(result.investment_income_offset, dec!(0));
    }

    #[test]
    fn state_netting_applies_carryforward_to_short_term_first() {
        let result = net_state_gains(dec!(3000), dec!(10000), dec!(0), dec!(5000), MA_OFFSET_CAP);

        assert_eq!(result.short_term, dec!(0));
        assert_eq!(result.long_term, dec!(8000));
        assert_eq!(result.carryforward_applied, dec!(5000));
        assert_eq!(result.carryforward, dec!(0));
    }

    #[test]
    fn state_netting_leftover_carryforward_reduces_investment_income() {
        let result = net_state_gains(dec!(1000), dec!(0), dec!(6000), dec!(10000), MA_OFFSET_CAP);

        assert_eq!(result.carryforward_applied, dec!(1000));
        assert_eq!(result.investment_income_offset, dec!(2000));
        assert_eq!(result.adjusted_investment_income, dec!(4000));
        assert_eq!(result.carryforward, dec!(7000));
    }

    #[test]
    fn state_netting_current_loss_feeds_offset_balance() {
        // Sign netting leaves -7,000 short; cap of 2,000 hits investment income.
        let result = net_state_gains(dec!(-10000), dec!(3000), dec!(1500), dec!(0), MA_OFFSET_CAP);

        assert_eq!(result.short_term, dec!(-7000));
        assert_eq!(result.long_term, dec!(0));
        assert_eq!(result.investment_income_offset, dec!(2000));
        assert_eq!(result.adjusted_investment_income, dec!(0));
        assert_eq!(result.carryforward, dec!(5000));
    }

    #[test]
    fn state_netting_taxable_amounts_ignore_losses() {
        let result = net_state_gains(dec!(-500), dec!(-700), dec!(0), dec!(0), MA_OFFSET_CAP);

        assert_eq!(result.taxable_short_term(), dec!(0));
        assert_eq!(result.taxable_long_term(), dec!(0));
    }

    #[test]
    fn state_netting_conserves_value() {
        for (short_term, long_term) in pairs() {
            for prior in [dec!(0), dec!(2500), dec!(20000)] {
                let result = net_state_gains(short_term, long_term, dec!(0), prior, MA_OFFSET_CAP);
                assert_eq!(
                    result.short_term + result.long_term + result.carryforward_applied,
                    short_term + long_term,
                    "short {short_term} long {long_term} prior {prior}"
                );
            }
        }
    }

    #[test]
    fn state_netting_carryforward_is_never_negative() {
        for (short_term, long_term) in pairs() {
            let result =
                net_state_gains(short_term, long_term, dec!(100), dec!(500), MA_OFFSET_CAP);
            assert!(result.carryforward >= Decimal::ZERO);
            assert!(result.adjusted_investment_income >= Decimal::ZERO);
        }
    }

    // =========================================================================
    // net_federal_gains tests
    // =========================================================================

    #[test]
    fn federal_netting_long_loss_against_short_gain() {
        let result = net_federal_gains(
            dec!(4000),
            dec!(-10000),
            dec!(0),
            dec!(0),
            FEDERAL_CAPITAL_LOSS_LIMIT,
        );

        assert_eq!(result.sign_offset, dec!(4000));
        assert_eq!(result.short_term, dec!(0));
        assert_eq!(result.net_ltcg, dec!(-6000));
        assert_eq!(result.capital_loss_deduction, dec!(3000));
        assert_eq!(result.capital_loss_carryforward, dec!(3000));
        assert_eq!(result.long_term_carryforward, dec!(3000));
        assert_eq!(result.short_term_carryforward, dec!(0));
        assert_eq!(result.split, CarryforwardSplit::LongTermOnly);
    }

    #[test]
    fn federal_netting_short_loss_only() {
        let result = net_federal_gains(
            dec!(-9000),
            dec!(0),
            dec!(0),
            dec!(0),
            FEDERAL_CAPITAL_LOSS_LIMIT,
        );

        assert_eq!(result.net_ltcg, dec!(-9000));
        assert_eq!(result.short_term_carryforward, dec!(6000));
        assert_eq!(result.long_term_carryforward, dec!(0));
        assert_eq!(result.split, CarryforwardSplit::ShortTermOnly);
    }

    #[test]
    fn federal_netting_loss_within_limit_carries_nothing() {
        let result = net_federal_gains(
            dec!(0),
            dec!(-2500),
            dec!(0),
            dec!(0),
            FEDERAL_CAPITAL_LOSS_LIMIT,
        );

        assert_eq!(result.capital_loss_deduction, dec!(2500));
        assert_eq!(result.capital_loss_carryforward, dec!(0));
        assert_eq!(result.split, CarryforwardSplit::None);
    }

    #[test]
    fn federal_netting_prior_losses_reduce_gains_before_netting() {
        let result = net_federal_gains(
            dec!(5000),
            dec!(20000),
            dec!(2000),
            dec!(8000),
            FEDERAL_CAPITAL_LOSS_LIMIT,
        );

        assert_eq!(result.short_term, dec!(3000));
        assert_eq!(result.long_term, dec!(12000));
        assert_eq!(result.net_ltcg, dec!(12000));
        assert_eq!(result.positive_short_term(), dec!(3000));
        assert_eq!(result.capital_loss_carryforward, dec!(0));
    }

    #[test]
    fn federal_netting_prior_loss_larger_than_gain_becomes_current_loss() {
        // Long: 5,000 - 15,000 = -10,000; short gain 1,000 nets it to -9,000.
        let result = net_federal_gains(
            dec!(1000),
            dec!(5000),
            dec!(0),
            dec!(15000),
            FEDERAL_CAPITAL_LOSS_LIMIT,
        );

        assert_eq!(result.net_ltcg, dec!(-9000));
        assert_eq!(result.long_term_carryforward, dec!(6000));
    }

    #[test]
    fn federal_netting_dual_loss_split_sums_to_total() {
        let _guard = init_test_tracing();
        let result = net_federal_gains(
            dec!(-4000),
            dec!(-12000),
            dec!(0),
            dec!(0),
            FEDERAL_CAPITAL_LOSS_LIMIT,
        );

        assert_eq!(result.split, CarryforwardSplit::ProRata);
        assert_eq!(result.capital_loss_carryforward, dec!(13000));
        assert_eq!(result.long_term_carryforward, dec!(9750));
        assert_eq!(result.short_term_carryforward, dec!(3250));
    }

    #[test]
    fn federal_netting_split_always_sums_to_carryforward() {
        let _guard = init_test_tracing();
        for (short_term, long_term) in pairs() {
            for prior in [dec!(0), dec!(777.77), dec!(15000)] {
                let result = net_federal_gains(
                    short_term,
                    long_term,
                    prior,
                    prior,
                    FEDERAL_CAPITAL_LOSS_LIMIT,
                );
                assert_eq!(
                    result.long_term_carryforward + result.short_term_carryforward,
                    result.capital_loss_carryforward
                );
                assert!(result.long_term_carryforward >= Decimal::ZERO);
                assert!(result.short_term_carryforward >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn federal_netting_gain_carries_nothing() {
        let result = net_federal_gains(
            dec!(-2000),
            dec!(9000),
            dec!(0),
            dec!(0),
            FEDERAL_CAPITAL_LOSS_LIMIT,
        );

        assert_eq!(result.net_ltcg, dec!(7000));
        assert_eq!(result.capital_loss_deduction, dec!(0));
        assert_eq!(result.capital_loss_carryforward, dec!(0));
    }
}
