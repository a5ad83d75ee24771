use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use super::amount::Amount;
use super::date::Date;
use super::Currency;

/// Cost basis attached to a posting, e.g. `{500.00 USD, 2020-10-01, "lot-a"}`.
///
/// Any subset of the components may be present; `{2014-02-11}` and
/// `{"ref-001"}` are valid lot-matching specs. `total` selects the
/// double-brace `{{...}}` form.
#[derive(Clone, Debug, PartialEq, Default, TypedBuilder)]
pub struct CostSpec {
    #[builder(default)]
    pub number: Option<Decimal>,

    #[builder(default)]
    pub currency: Option<Currency>,

    #[builder(default)]
    pub date: Option<Date>,

    #[builder(default)]
    pub label: Option<String>,

    #[builder(default)]
    pub total: bool,
}

/// Price annotation on a posting: `@ 1.09 CAD` per unit, or `@@ 436.01 CAD`
/// in total.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct PriceSpec {
    pub amount: Amount,

    #[builder(default)]
    pub total: bool,
}
