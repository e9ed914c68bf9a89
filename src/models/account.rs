use serde::{Deserialize, Deserializer, Serialize};

use super::DocumentId;

// Kind of financial account (e.g., "Checking", "Roth IRA", "brokerage").
// Wire strings are fixed and case-sensitive; anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(rename = "Checking")]
    Checking,
    #[serde(rename = "Savings")]
    Savings,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "CD")]
    Cd,
    #[serde(rename = "Money Market")]
    MoneyMarket,
    #[serde(rename = "PayPal")]
    PayPal,
    #[serde(rename = "Auto Loan")]
    AutoLoan,
    #[serde(rename = "Mortgage")]
    Mortgage,
    #[serde(rename = "Home Equity Line of Credit")]
    HomeEquity,
    #[serde(rename = "loan")]
    Loan,
    #[serde(rename = "Student Loan")]
    StudentLoan,
    #[serde(rename = "529")]
    Tuition529,
    #[serde(rename = "401(k)")]
    Retirement401k,
    #[serde(rename = "brokerage")]
    Brokerage,
    #[serde(rename = "crypto")]
    Crypto,
    #[serde(rename = "Coverdell ESA")]
    CoverdellEsa,
    #[serde(rename = "Annuity")]
    Annuity,
    #[serde(rename = "Traditional IRA")]
    TraditionalIra,
    #[serde(rename = "Roth IRA")]
    RothIra,
    #[serde(rename = "Mutual Fund")]
    MutualFund,
    #[serde(rename = "Roth 401(k)")]
    Roth401k,
}

impl AccountType {
    pub const ALL: [AccountType; 21] = [
        AccountType::Checking,
        AccountType::Savings,
        AccountType::CreditCard,
        AccountType::Cd,
        AccountType::MoneyMarket,
        AccountType::PayPal,
        AccountType::AutoLoan,
        AccountType::Mortgage,
        AccountType::HomeEquity,
        AccountType::Loan,
        AccountType::StudentLoan,
        AccountType::Tuition529,
        AccountType::Retirement401k,
        AccountType::Brokerage,
        AccountType::Crypto,
        AccountType::CoverdellEsa,
        AccountType::Annuity,
        AccountType::TraditionalIra,
        AccountType::RothIra,
        AccountType::MutualFund,
        AccountType::Roth401k,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
            AccountType::CreditCard => "Credit Card",
            AccountType::Cd => "CD",
            AccountType::MoneyMarket => "Money Market",
            AccountType::PayPal => "PayPal",
            AccountType::AutoLoan => "Auto Loan",
            AccountType::Mortgage => "Mortgage",
            AccountType::HomeEquity => "Home Equity Line of Credit",
            AccountType::Loan => "loan",
            AccountType::StudentLoan => "Student Loan",
            AccountType::Tuition529 => "529",
            AccountType::Retirement401k => "401(k)",
            AccountType::Brokerage => "brokerage",
            AccountType::Crypto => "crypto",
            AccountType::CoverdellEsa => "Coverdell ESA",
            AccountType::Annuity => "Annuity",
            AccountType::TraditionalIra => "Traditional IRA",
            AccountType::RothIra => "Roth IRA",
            AccountType::MutualFund => "Mutual Fund",
            AccountType::Roth401k => "Roth 401(k)",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Open,
    Closed,
    Hidden,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccountStatus::Open => "open",
            AccountStatus::Closed => "closed",
            AccountStatus::Hidden => "hidden",
        };
        f.write_str(s)
    }
}

// Bank or brokerage holding the account. Embedded in the account document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: DocumentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: DocumentId,
    pub account_number: Option<String>,
    pub account_type: AccountType,
    pub rate: Option<f64>,
    pub name: String,
    pub institution: Option<Institution>,
    #[serde(default)]
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstitution {
    #[serde(default)]
    pub id: Option<DocumentId>,
    pub name: String,
}

impl CreateInstitution {
    pub fn into_institution(self) -> Institution {
        Institution {
            id: self.id.unwrap_or_else(DocumentId::generate),
            name: self.name,
        }
    }
}

/// Client payload for a new account. Any `id` or `status` sent by the client
/// is ignored: the store assigns both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    #[serde(default)]
    pub account_number: Option<String>,
    pub account_type: AccountType,
    #[serde(default)]
    pub rate: Option<f64>,
    pub name: String,
    #[serde(default)]
    pub institution: Option<CreateInstitution>,
}

/// Fully-formed account waiting for the store to assign its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub account_number: Option<String>,
    pub account_type: AccountType,
    pub rate: Option<f64>,
    pub name: String,
    pub institution: Option<Institution>,
    pub status: AccountStatus,
}

impl NewAccount {
    pub fn from_request(input: CreateAccount) -> Self {
        Self {
            account_number: input.account_number,
            account_type: input.account_type,
            rate: input.rate,
            name: input.name.trim().to_string(),
            institution: input.institution.map(CreateInstitution::into_institution),
            status: AccountStatus::default(),
        }
    }

    pub fn with_id(self, id: DocumentId) -> Account {
        Account {
            id,
            account_number: self.account_number,
            account_type: self.account_type,
            rate: self.rate,
            name: self.name,
            institution: self.institution,
            status: self.status,
        }
    }
}

/// Partial update of an account.
///
/// `rate` is tri-state: field omitted (`None`) leaves the stored value alone,
/// `"rate": null` (`Some(None)`) clears it, `"rate": 1.5` sets it. Unknown
/// fields are rejected so `id` and `account_type` can never be patched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountUpdate {
    #[serde(default, deserialize_with = "present")]
    pub rate: Option<Option<f64>>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.rate.is_none()
    }

    pub fn apply(&self, account: &mut Account) {
        if let Some(rate) = self.rate {
            account.rate = rate;
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Predicates for listing accounts. Range bounds on `rate` are exclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountFilter {
    pub rate_above: Option<f64>,
    pub rate_below: Option<f64>,
    pub rate: Option<f64>,
    pub status: Option<AccountStatus>,
    pub account_type: Option<AccountType>,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        if self.rate_above.is_some() || self.rate_below.is_some() {
            let Some(rate) = account.rate else {
                return false;
            };
            if self.rate_above.is_some_and(|min| rate <= min) {
                return false;
            }
            if self.rate_below.is_some_and(|max| rate >= max) {
                return false;
            }
        }
        if self.rate.is_some_and(|r| account.rate != Some(r)) {
            return false;
        }
        if self.status.is_some_and(|s| account.status != s) {
            return false;
        }
        if self.account_type.is_some_and(|t| account.account_type != t) {
            return false;
        }
        true
    }
}
