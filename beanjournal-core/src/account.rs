use std::error::Error;
use std::fmt;
use std::str::FromStr;

use typed_builder::TypedBuilder;

use super::account_types::AccountType;

/// Represents an account.
///
/// An account name is a colon-separated list of capitalized words whose first
/// word must be one of the five account root categories:
///
/// ```text
/// Assets:US:BofA:Checking
/// Liabilities:CA:RBC:CreditCard
/// Equity:Retained-Earnings
/// Income:US:Acme:Salary
/// Expenses:Food:Groceries
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash, TypedBuilder)]
pub struct Account {
    /// Root category of the account.
    pub ty: AccountType,

    /// Parts of the account name following the root category.
    pub parts: Vec<String>,
}

impl Account {
    /// The full colon-joined account name.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Case-insensitive substring match against the full account name.
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        self.name().to_lowercase().contains(&needle.to_lowercase())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty.name())?;
        for part in &self.parts {
            write!(f, ":{}", part)?;
        }
        Ok(())
    }
}

/// Error produced when an account name cannot be interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidAccount(pub String);

impl fmt::Display for InvalidAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid account name: '{}'", self.0)
    }
}

impl Error for InvalidAccount {}

impl FromStr for Account {
    type Err = InvalidAccount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pieces = s.split(':');
        let root = pieces.next().unwrap_or_default();
        let ty =
            AccountType::from_str(root).map_err(|_| InvalidAccount(s.to_string()))?;
        let parts: Vec<String> = pieces.map(str::to_string).collect();
        if parts.is_empty() || parts.iter().any(|p| p.is_empty()) {
            return Err(InvalidAccount(s.to_string()));
        }
        Ok(Account { ty, parts })
    }
}
