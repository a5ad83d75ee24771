use typed_builder::TypedBuilder;

use super::account::Account;
use super::amount::Amount;
use super::flags::Flag;
use super::metadata::Meta;
use super::position::{CostSpec, PriceSpec};

/// A single amount being deposited to or withdrawn from an account within a
/// transaction.
///
/// ```text
/// 2012-11-03 * "Transfer to account in Canada"
///   Assets:MyBank:Checking  -400.00 USD @ 1.09 CAD
///   Assets:FR:SocGen:Checking  436.01 CAD
/// ```
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Posting {
    /// Account being posted to.
    pub account: Account,

    /// The amount being posted, when stated explicitly.
    #[builder(default)]
    pub units: Option<Amount>,

    /// Cost basis of this posting.
    #[builder(default)]
    pub cost: Option<CostSpec>,

    /// Price annotation of this posting.
    #[builder(default)]
    pub price: Option<PriceSpec>,

    #[builder(default)]
    pub flag: Option<Flag>,

    /// Trailing `;` comment on the posting line.
    #[builder(default)]
    pub comment: Option<String>,

    #[builder(default)]
    pub meta: Meta,
}
