//! Ledger vocabulary: directions, source types and account categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Direction of a ledger entry.
///
/// `Credit` increases the account balance, `Debit` decreases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryDirection {
    /// Money enters the account.
    Credit,
    /// Money leaves the account.
    Debit,
}

impl EntryDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            EntryDirection::Credit => EntryDirection::Debit,
            EntryDirection::Debit => EntryDirection::Credit,
        }
    }

    /// Returns the canonical label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryDirection::Credit => "CREDIT",
            EntryDirection::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of reasons money moves through the ledger.
///
/// Callers map their own transaction categories onto these values, e.g. a
/// cash installment is `LoanPaymentCash`, a bank deposit `LoanPaymentBank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    /// Money handed to a borrower.
    LoanGrant,
    /// Commission paid to the lead for placing a loan.
    LoanGrantCommission,
    /// Money returned to the fund when a disbursement is cancelled.
    LoanCancelledRestore,
    /// Installment received in cash.
    LoanPaymentCash,
    /// Installment received by bank deposit.
    LoanPaymentBank,
    /// Commission paid to the lead for collecting an installment.
    PaymentCommission,
    /// Outgoing side of an account-to-account transfer.
    TransferOut,
    /// Incoming side of an account-to-account transfer.
    TransferIn,
    /// Fuel bought with cash.
    Gasoline,
    /// Fuel charged to a prepaid card.
    GasolinePrepaid,
    /// Payroll.
    NominaSalary,
    /// Salary paid outside payroll.
    ExternalSalary,
    /// Per-diem allowance.
    Viatic,
    /// Travel costs.
    TravelExpenses,
    /// Lodging.
    Accommodation,
    /// Vehicle upkeep.
    VehicleMaintenance,
    /// Lead commissions paid outside a specific loan.
    LeadCommission,
    /// Expense incurred by a lead.
    LeadExpense,
    /// Bank fees.
    BankExpense,
    /// Anything else.
    OtherExpense,
    /// Opening balance of an account.
    InitialBalance,
    /// Manual correction produced by balance fixing.
    BalanceAdjustment,
}

impl SourceType {
    /// All source types, in declaration order.
    pub const ALL: [SourceType; 22] = [
        SourceType::LoanGrant,
        SourceType::LoanGrantCommission,
        SourceType::LoanCancelledRestore,
        SourceType::LoanPaymentCash,
        SourceType::LoanPaymentBank,
        SourceType::PaymentCommission,
        SourceType::TransferOut,
        SourceType::TransferIn,
        SourceType::Gasoline,
        SourceType::GasolinePrepaid,
        SourceType::NominaSalary,
        SourceType::ExternalSalary,
        SourceType::Viatic,
        SourceType::TravelExpenses,
        SourceType::Accommodation,
        SourceType::VehicleMaintenance,
        SourceType::LeadCommission,
        SourceType::LeadExpense,
        SourceType::BankExpense,
        SourceType::OtherExpense,
        SourceType::InitialBalance,
        SourceType::BalanceAdjustment,
    ];

    /// Returns the canonical SCREAMING_SNAKE_CASE label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::LoanGrant => "LOAN_GRANT",
            SourceType::LoanGrantCommission => "LOAN_GRANT_COMMISSION",
            SourceType::LoanCancelledRestore => "LOAN_CANCELLED_RESTORE",
            SourceType::LoanPaymentCash => "LOAN_PAYMENT_CASH",
            SourceType::LoanPaymentBank => "LOAN_PAYMENT_BANK",
            SourceType::PaymentCommission => "PAYMENT_COMMISSION",
            SourceType::TransferOut => "TRANSFER_OUT",
            SourceType::TransferIn => "TRANSFER_IN",
            SourceType::Gasoline => "GASOLINE",
            SourceType::GasolinePrepaid => "GASOLINE_PREPAID",
            SourceType::NominaSalary => "NOMINA_SALARY",
            SourceType::ExternalSalary => "EXTERNAL_SALARY",
            SourceType::Viatic => "VIATIC",
            SourceType::TravelExpenses => "TRAVEL_EXPENSES",
            SourceType::Accommodation => "ACCOMMODATION",
            SourceType::VehicleMaintenance => "VEHICLE_MAINTENANCE",
            SourceType::LeadCommission => "LEAD_COMMISSION",
            SourceType::LeadExpense => "LEAD_EXPENSE",
            SourceType::BankExpense => "BANK_EXPENSE",
            SourceType::OtherExpense => "OTHER_EXPENSE",
            SourceType::InitialBalance => "INITIAL_BALANCE",
            SourceType::BalanceAdjustment => "BALANCE_ADJUSTMENT",
        }
    }

    /// Returns true for operating expense categories.
    #[must_use]
    pub fn is_expense(&self) -> bool {
        matches!(
            self,
            SourceType::Gasoline
                | SourceType::GasolinePrepaid
                | SourceType::NominaSalary
                | SourceType::ExternalSalary
                | SourceType::Viatic
                | SourceType::TravelExpenses
                | SourceType::Accommodation
                | SourceType::VehicleMaintenance
                | SourceType::LeadCommission
                | SourceType::LeadExpense
                | SourceType::BankExpense
                | SourceType::OtherExpense
        )
    }

    /// Returns true for either side of a transfer.
    #[must_use]
    pub fn is_transfer(&self) -> bool {
        matches!(self, SourceType::TransferOut | SourceType::TransferIn)
    }

    /// Returns true for received installments.
    #[must_use]
    pub fn is_loan_payment(&self) -> bool {
        matches!(
            self,
            SourceType::LoanPaymentCash | SourceType::LoanPaymentBank
        )
    }

    /// Direction this category normally carries.
    ///
    /// Adjustments can go either way and report `None`.
    #[must_use]
    pub fn natural_direction(&self) -> Option<EntryDirection> {
        match self {
            SourceType::LoanCancelledRestore
            | SourceType::LoanPaymentCash
            | SourceType::LoanPaymentBank
            | SourceType::TransferIn
            | SourceType::InitialBalance => Some(EntryDirection::Credit),
            SourceType::BalanceAdjustment => None,
            _ => Some(EntryDirection::Debit),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        SourceType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| CoreError::unknown_variant("source type", s))
    }
}

/// Kind of money pool an account represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountCategory {
    /// Bank account.
    Bank,
    /// Cash held by the field team of one route.
    EmployeeCashFund,
    /// Prepaid fuel card.
    PrepaidGas,
    /// Travel expense fund.
    TravelExpenses,
    /// Office petty cash.
    OfficeCashFund,
}

impl AccountCategory {
    /// Returns the canonical label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Bank => "BANK",
            AccountCategory::EmployeeCashFund => "EMPLOYEE_CASH_FUND",
            AccountCategory::PrepaidGas => "PREPAID_GAS",
            AccountCategory::TravelExpenses => "TRAVEL_EXPENSES",
            AccountCategory::OfficeCashFund => "OFFICE_CASH_FUND",
        }
    }
}

impl fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BANK" => Ok(AccountCategory::Bank),
            "EMPLOYEE_CASH_FUND" => Ok(AccountCategory::EmployeeCashFund),
            "PREPAID_GAS" => Ok(AccountCategory::PrepaidGas),
            "TRAVEL_EXPENSES" => Ok(AccountCategory::TravelExpenses),
            "OFFICE_CASH_FUND" => Ok(AccountCategory::OfficeCashFund),
            _ => Err(CoreError::unknown_variant("account category", s)),
        }
    }
}

/// How an installment was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash collected by the lead.
    Cash,
    /// Bank deposit.
    Bank,
}

impl PaymentMethod {
    /// Source type used when booking an installment received this way.
    #[must_use]
    pub fn source_type(&self) -> SourceType {
        match self {
            PaymentMethod::Cash => SourceType::LoanPaymentCash,
            PaymentMethod::Bank => SourceType::LoanPaymentBank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_round_trips_through_label() {
        for st in SourceType::ALL {
            assert_eq!(st.as_str().parse::<SourceType>().unwrap(), st);
        }
        assert!("NOT_A_TYPE".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_source_type_serde_label() {
        let json = serde_json::to_string(&SourceType::LoanPaymentCash).unwrap();
        assert_eq!(json, "\"LOAN_PAYMENT_CASH\"");
        let json = serde_json::to_string(&SourceType::BalanceAdjustment).unwrap();
        assert_eq!(json, "\"BALANCE_ADJUSTMENT\"");
    }

    #[test]
    fn test_categories() {
        assert!(SourceType::Gasoline.is_expense());
        assert!(!SourceType::TransferIn.is_expense());
        assert!(SourceType::TransferOut.is_transfer());
        assert!(SourceType::LoanPaymentBank.is_loan_payment());
        assert_eq!(
            SourceType::LoanGrant.natural_direction(),
            Some(EntryDirection::Debit)
        );
        assert_eq!(SourceType::BalanceAdjustment.natural_direction(), None);
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(EntryDirection::Credit.opposite(), EntryDirection::Debit);
        assert_eq!(EntryDirection::Debit.opposite(), EntryDirection::Credit);
    }

    #[test]
    fn test_payment_method_source_type() {
        assert_eq!(PaymentMethod::Cash.source_type(), SourceType::LoanPaymentCash);
        assert_eq!(PaymentMethod::Bank.source_type(), SourceType::LoanPaymentBank);
    }

    #[test]
    fn test_account_category_parse() {
        assert_eq!(
            "employee_cash_fund".parse::<AccountCategory>().unwrap(),
            AccountCategory::EmployeeCashFund
        );
        assert!("wallet".parse::<AccountCategory>().is_err());
    }
}
