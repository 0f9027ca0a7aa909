//! Classifier functions.
//!
//! Every function here is total, deterministic and independent of the order
//! of its input collections. Date windows are closed on both ends.

mod clients;
mod delinquency;

pub use clients::{
    calculate_client_balance, calculate_renovation_kpis, calculate_trend, is_finished_without_renewal,
    is_new_client, is_new_client_in_period, is_reintegro_in_period, is_renewal_in_period,
    was_renewed,
};
pub use delinquency::{
    calculate_cv_status, count_clients_status, count_payments_in_week, exited_cartera_vencida,
    is_active_loan, is_in_cartera_vencida, CV_EXIT_PAYMENTS,
};
