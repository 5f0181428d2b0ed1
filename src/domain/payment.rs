use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

use super::money::Amount;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Qris,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Qris => write!(f, "qris"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "qris" => Ok(PaymentMethod::Qris),
            other => Err(format!("Unknown payment method: {}", other)),
        }
    }
}

/// Where the payment flow stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPhase {
    /// Cashier is choosing a method and, for cash, typing the tendered amount.
    SelectingMethod,
    /// The order is in flight; every input is locked.
    Validating,
    /// The last submission failed. Inputs are live again.
    Rejected { reason: String },
}

/// Outcome of comparing tendered cash with the total due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashChange {
    Change(Amount),
    Insufficient { short_by: Amount },
}

/// State machine behind the payment modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFlow {
    method: PaymentMethod,
    tendered_input: String,
    total_due: Amount,
    phase: PaymentPhase,
}

impl PaymentFlow {
    pub const CONFIRM_LABEL: &'static str = "Complete Order";
    pub const PROCESSING_LABEL: &'static str = "Processing…";

    /// A fresh flow: cash selected, nothing tendered.
    pub fn open(total_due: Amount) -> Self {
        Self {
            method: PaymentMethod::Cash,
            tendered_input: String::new(),
            total_due,
            phase: PaymentPhase::SelectingMethod,
        }
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn tendered_input(&self) -> &str {
        &self.tendered_input
    }

    pub fn total_due(&self) -> Amount {
        self.total_due
    }

    pub fn phase(&self) -> &PaymentPhase {
        &self.phase
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase == PaymentPhase::Validating
    }

    pub fn select_method(&mut self, method: PaymentMethod) -> Result<(), PaymentError> {
        self.ensure_editable()?;
        self.method = method;
        self.phase = PaymentPhase::SelectingMethod;
        Ok(())
    }

    pub fn enter_tendered(&mut self, input: impl Into<String>) -> Result<(), PaymentError> {
        self.ensure_editable()?;
        self.tendered_input = input.into();
        self.phase = PaymentPhase::SelectingMethod;
        Ok(())
    }

    /// Keeps the amount due in line with the cart while the modal is open.
    pub fn set_total_due(&mut self, total_due: Amount) {
        self.total_due = total_due;
    }

    /// Tendered cash as typed, read like a browser `parseInt`: the leading
    /// integer wins, anything unparseable counts as zero.
    pub fn tendered(&self) -> i64 {
        parse_leading_int(&self.tendered_input).unwrap_or(0)
    }

    /// Change owed for a cash payment; `None` for QRIS.
    pub fn change(&self) -> Option<CashChange> {
        if self.method != PaymentMethod::Cash {
            return None;
        }
        let diff = i128::from(self.tendered()) - i128::from(self.total_due);
        Some(if diff >= 0 {
            CashChange::Change(diff as Amount)
        } else {
            CashChange::Insufficient {
                short_by: diff.unsigned_abs() as Amount,
            }
        })
    }

    /// Whether the confirm control is enabled, ignoring cart emptiness.
    pub fn is_confirmable(&self) -> bool {
        match self.phase {
            PaymentPhase::Validating => false,
            PaymentPhase::SelectingMethod | PaymentPhase::Rejected { .. } => match self.change() {
                Some(CashChange::Insufficient { .. }) => false,
                Some(CashChange::Change(_)) | None => true,
            },
        }
    }

    pub fn confirm_label(&self) -> &'static str {
        if self.is_in_flight() {
            Self::PROCESSING_LABEL
        } else {
            Self::CONFIRM_LABEL
        }
    }

    /// Locks the flow for submission and returns the chosen method.
    pub fn begin_submission(&mut self) -> Result<PaymentMethod, PaymentError> {
        self.ensure_editable()?;
        if let Some(CashChange::Insufficient { short_by }) = self.change() {
            return Err(PaymentError::InsufficientCash { short_by });
        }
        self.phase = PaymentPhase::Validating;
        Ok(self.method)
    }

    pub fn settle_rejected(&mut self, reason: impl Into<String>) {
        self.phase = PaymentPhase::Rejected {
            reason: reason.into(),
        };
    }

    fn ensure_editable(&self) -> Result<(), PaymentError> {
        match self.phase {
            PaymentPhase::Validating => Err(PaymentError::SubmissionInFlight),
            PaymentPhase::SelectingMethod | PaymentPhase::Rejected { .. } => Ok(()),
        }
    }
}

fn parse_leading_int(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }
    // A digit run too long for i64 saturates rather than reading as zero.
    Some(match digits.parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_defaults_to_cash_and_waits_for_input() {
        let flow = PaymentFlow::open(22_000);
        assert_eq!(flow.method(), PaymentMethod::Cash);
        assert_eq!(flow.tendered_input(), "");
        assert_eq!(flow.phase(), &PaymentPhase::SelectingMethod);
        assert_eq!(flow.change(), Some(CashChange::Insufficient { short_by: 22_000 }));
        assert!(!flow.is_confirmable());
        assert_eq!(flow.confirm_label(), "Complete Order");
    }

    #[test]
    fn test_exact_cash_and_one_short() {
        let mut flow = PaymentFlow::open(22_000);
        flow.enter_tendered("22000").unwrap();
        assert_eq!(flow.change(), Some(CashChange::Change(0)));
        assert!(flow.is_confirmable());

        flow.enter_tendered("21999").unwrap();
        assert_eq!(flow.change(), Some(CashChange::Insufficient { short_by: 1 }));
        assert!(!flow.is_confirmable());
    }

    #[test]
    fn test_change_for_larger_tender() {
        let mut flow = PaymentFlow::open(22_000);
        flow.enter_tendered("25000").unwrap();
        assert_eq!(flow.change(), Some(CashChange::Change(3_000)));
    }

    #[test]
    fn test_tendered_parsing() {
        let mut flow = PaymentFlow::open(0);
        for (input, expected) in [
            ("", 0),
            ("abc", 0),
            ("25000abc", 25_000),
            ("  42", 42),
            ("-5", -5),
            ("12.500", 12),
            ("99999999999999999999999", i64::MAX),
            ("-99999999999999999999999", i64::MIN),
        ] {
            flow.enter_tendered(input).unwrap();
            assert_eq!(flow.tendered(), expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_oversized_tender_still_covers_total() {
        let mut flow = PaymentFlow::open(22_000);
        flow.enter_tendered("99999999999999999999999").unwrap();
        assert_eq!(flow.change(), Some(CashChange::Change(i64::MAX as Amount - 22_000)));
        assert!(flow.is_confirmable());
    }

    #[test]
    fn test_qris_is_immediately_confirmable() {
        let mut flow = PaymentFlow::open(22_000);
        flow.select_method(PaymentMethod::Qris).unwrap();
        assert_eq!(flow.change(), None);
        assert!(flow.is_confirmable());
        assert_eq!(flow.begin_submission(), Ok(PaymentMethod::Qris));
    }

    #[test]
    fn test_in_flight_locks_inputs() {
        let mut flow = PaymentFlow::open(1_000);
        flow.enter_tendered("1000").unwrap();
        flow.begin_submission().unwrap();

        assert!(flow.is_in_flight());
        assert!(!flow.is_confirmable());
        assert_eq!(flow.confirm_label(), "Processing…");
        assert_eq!(flow.select_method(PaymentMethod::Qris), Err(PaymentError::SubmissionInFlight));
        assert_eq!(flow.enter_tendered("5"), Err(PaymentError::SubmissionInFlight));
        assert_eq!(flow.begin_submission(), Err(PaymentError::SubmissionInFlight));
    }

    #[test]
    fn test_rejection_reenables_confirm() {
        let mut flow = PaymentFlow::open(1_000);
        flow.enter_tendered("1000").unwrap();
        flow.begin_submission().unwrap();
        flow.settle_rejected("Insufficient stock for Roti");

        assert_eq!(flow.confirm_label(), "Complete Order");
        assert!(flow.is_confirmable());
        assert_eq!(flow.begin_submission(), Ok(PaymentMethod::Cash));
    }

    #[test]
    fn test_begin_submission_refuses_short_cash() {
        let mut flow = PaymentFlow::open(1_000);
        flow.enter_tendered("999").unwrap();
        assert_eq!(flow.begin_submission(), Err(PaymentError::InsufficientCash { short_by: 1 }));
        assert_eq!(flow.phase(), &PaymentPhase::SelectingMethod);
    }

    #[test]
    fn test_total_follows_cart() {
        let mut flow = PaymentFlow::open(10_000);
        flow.enter_tendered("11000").unwrap();
        assert!(flow.is_confirmable());
        flow.set_total_due(12_000);
        assert_eq!(flow.change(), Some(CashChange::Insufficient { short_by: 1_000 }));
    }

    #[test]
    fn test_method_wire_format() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Qris).unwrap(), "\"qris\"");
        assert_eq!("CASH".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
        assert!("card".parse::<PaymentMethod>().is_err());
    }
}
