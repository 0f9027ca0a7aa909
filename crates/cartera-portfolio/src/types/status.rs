//! Classification labels and KPI results.

use std::fmt;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why a loan is left out of delinquency evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExclusionReason {
    /// Written off.
    BadDebt,
    /// Removed by a portfolio cleanup.
    Cleanup,
    /// Nothing pending.
    NotActive,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExclusionReason::BadDebt => "BAD_DEBT",
            ExclusionReason::Cleanup => "CLEANUP",
            ExclusionReason::NotActive => "NOT_ACTIVE",
        };
        f.write_str(label)
    }
}

/// Delinquency label of a loan for one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "status")]
pub enum CvState {
    /// Not evaluated.
    Excluido {
        /// Why.
        reason: ExclusionReason,
    },
    /// In cartera vencida: active and no payment this week.
    EnCv,
    /// Current on payments.
    AlCorriente,
}

impl fmt::Display for CvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CvState::Excluido { reason } => write!(f, "EXCLUIDO ({reason})"),
            CvState::EnCv => f.write_str("EN_CV"),
            CvState::AlCorriente => f.write_str("AL_CORRIENTE"),
        }
    }
}

/// Result of evaluating one loan for one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvStatus {
    /// The label.
    #[serde(flatten)]
    pub status: CvState,
    /// Left cartera vencida this week (only ever set on `AlCorriente`).
    #[serde(rename = "exitedCVThisWeek")]
    pub exited_cv_this_week: bool,
    /// Payments received in the evaluated week.
    pub payments_in_week: usize,
}

impl CvStatus {
    /// True for `EnCv`.
    pub fn is_en_cv(&self) -> bool {
        self.status == CvState::EnCv
    }

    /// True for `Excluido`.
    pub fn is_excluded(&self) -> bool {
        matches!(self.status, CvState::Excluido { .. })
    }
}

/// Direction of a metric against its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    /// Higher than before.
    Up,
    /// Lower than before.
    Down,
    /// Equal, or nothing to compare with.
    #[default]
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Up => "UP",
            Trend::Down => "DOWN",
            Trend::Stable => "STABLE",
        };
        f.write_str(label)
    }
}

/// Client growth over a period.
///
/// `balance = nuevos + reintegros - terminados_sin_renovar`. Renewals are the
/// same client continuing and stay out of the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBalance {
    /// First loans signed in the period.
    pub nuevos: usize,
    /// Renewals signed in the period.
    pub renovados: usize,
    /// Returning clients signed in the period.
    pub reintegros: usize,
    /// Loans finished in the period and never renewed.
    pub terminados_sin_renovar: usize,
    /// Net client change.
    pub balance: i64,
    /// Against the previous balance.
    pub trend: Trend,
}

/// Renewal rate over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenovationKpis {
    /// Renewals signed in the period.
    pub total_renovaciones: usize,
    /// Loans finished in the period and never renewed.
    pub total_cierres_sin_renovar: usize,
    /// `renovaciones / (renovaciones + cierres)`, zero when both are zero.
    pub tasa_renovacion: Decimal,
    /// Against the previous rate.
    pub trend: Trend,
}

/// Delinquency counts for one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatusCounts {
    /// Loans evaluated (not excluded).
    pub total_activos: usize,
    /// In cartera vencida.
    pub en_cv: usize,
    /// Current on payments.
    pub al_corriente: usize,
    /// Current loans that left cartera vencida this week.
    pub salieron_de_cv: usize,
}

impl ClientStatusCounts {
    /// Adds one evaluated loan.
    #[must_use]
    pub fn record(mut self, status: &CvStatus) -> Self {
        match status.status {
            CvState::Excluido { .. } => return self,
            CvState::EnCv => self.en_cv += 1,
            CvState::AlCorriente => {
                self.al_corriente += 1;
                if status.exited_cv_this_week {
                    self.salieron_de_cv += 1;
                }
            }
        }
        self.total_activos += 1;
        self
    }
}

impl Add for ClientStatusCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            total_activos: self.total_activos + other.total_activos,
            en_cv: self.en_cv + other.en_cv,
            al_corriente: self.al_corriente + other.al_corriente,
            salieron_de_cv: self.salieron_de_cv + other.salieron_de_cv,
        }
    }
}
