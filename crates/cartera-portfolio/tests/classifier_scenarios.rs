//! Business scenarios and order-independence properties of the classifier.

use cartera_core::types::{DateRange, LoanId, WeekRange};
use cartera_portfolio::prelude::*;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// FIXTURES
// =============================================================================

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 10, 0, 0).unwrap()
}

fn week_of(month: u32, day: u32) -> WeekRange {
    WeekRange::for_date(NaiveDate::from_ymd_opt(2024, month, day).unwrap())
}

fn december() -> DateRange {
    DateRange::month(2024, 12).unwrap()
}

/// 3 new clients, 1 closure without renewal, 2 renewals, 2 reintegros.
fn december_book() -> Vec<LoanSnapshot> {
    vec![
        LoanSnapshot::new("n1", dec!(1500), at(12, 2)),
        LoanSnapshot::new("n2", dec!(1500), at(12, 9)),
        LoanSnapshot::new("n3", dec!(1500), at(12, 16)),
        LoanSnapshot::new("f1", dec!(0), at(10, 1))
            .finished_on(at(12, 5))
            .with_was_renewed(false),
        LoanSnapshot::new("r1", dec!(4200), at(12, 3))
            .with_previous_loan("p1")
            .with_amounts(dec!(3000), dec!(900)),
        LoanSnapshot::new("r2", dec!(4200), at(12, 17))
            .with_previous_loan("p2")
            .with_amounts(dec!(3000), dec!(900)),
        LoanSnapshot::new("i1", dec!(4200), at(12, 4))
            .with_previous_loan("p3")
            .with_amounts(dec!(3000), dec!(3000)),
        LoanSnapshot::new("i2", dec!(4200), at(12, 18))
            .with_previous_loan("p4")
            .with_amounts(dec!(3000), dec!(3000)),
    ]
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn test_grace_period_then_delinquent() {
    let loan = LoanSnapshot::new("l1", dec!(3000), at(12, 10));

    let signing_week = week_of(12, 9);
    let count = count_payments_in_week(&[], &signing_week);
    assert!(!is_in_cartera_vencida(&loan, count, &signing_week));

    let following = week_of(12, 16);
    assert_eq!(following.monday(), NaiveDate::from_ymd_opt(2024, 12, 16).unwrap());
    assert!(is_in_cartera_vencida(&loan, 0, &following));

    let status = calculate_cv_status(&loan, &[], &following, &signing_week);
    assert_eq!(status.status, CvState::EnCv);
}

#[test]
fn test_exit_from_cartera_vencida() {
    let current = week_of(12, 9);
    let previous = current.previous();
    let two = vec![
        PaymentSnapshot::new("p1", at(12, 10), dec!(300)),
        PaymentSnapshot::new("p2", at(12, 11), dec!(300)),
    ];
    assert!(exited_cartera_vencida(&two, &previous, &current));
    assert!(!exited_cartera_vencida(&two[..1], &previous, &current));

    let loan = LoanSnapshot::new("l1", dec!(3000), at(11, 4));
    let status = calculate_cv_status(&loan, &two, &current, &previous);
    assert_eq!(status.status, CvState::AlCorriente);
    assert!(status.exited_cv_this_week);
}

#[test]
fn test_renewal_versus_reintegro() {
    let renewal = LoanSnapshot::new("l", dec!(4200), at(12, 10))
        .with_previous_loan("x")
        .with_amounts(dec!(3000), dec!(900));
    assert!(is_renewal_in_period(&renewal, &december()));
    assert!(!is_reintegro_in_period(&renewal, &december()));

    let reintegro = renewal.with_amounts(dec!(3000), dec!(3000));
    assert!(!is_renewal_in_period(&reintegro, &december()));
    assert!(is_reintegro_in_period(&reintegro, &december()));
}

#[test]
fn test_client_balance() {
    let balance = calculate_client_balance(
        &december_book(),
        &december(),
        Some(6),
        &ClassifierConfig::default(),
    );
    assert_eq!(balance.nuevos, 3);
    assert_eq!(balance.terminados_sin_renovar, 1);
    assert_eq!(balance.renovados, 2);
    assert_eq!(balance.reintegros, 2);
    assert_eq!(balance.balance, 4);
    assert_eq!(balance.trend, Trend::Down);
}

#[test]
fn test_renovation_kpis() {
    let mut loans: Vec<LoanSnapshot> = (1..=4)
        .map(|i| {
            LoanSnapshot::new(format!("r{i}"), dec!(4200), at(12, i))
                .with_previous_loan(format!("p{i}"))
                .with_amounts(dec!(3000), dec!(900))
        })
        .collect();
    loans.push(
        LoanSnapshot::new("f1", dec!(0), at(9, 1))
            .finished_on(at(12, 20))
            .with_was_renewed(false),
    );

    let kpis = calculate_renovation_kpis(&loans, &december(), Some(dec!(0.5)), &ClassifierConfig::default());
    assert_eq!(kpis.total_renovaciones, 4);
    assert_eq!(kpis.total_cierres_sin_renovar, 1);
    assert_eq!(kpis.tasa_renovacion, dec!(0.8));
    assert_eq!(kpis.trend, Trend::Up);

    let empty = calculate_renovation_kpis(&[], &december(), None, &ClassifierConfig::default());
    assert_eq!(empty.tasa_renovacion, Decimal::ZERO);
}

#[test]
fn test_annotated_renewals_feed_closures() {
    // p1 was renewed by r1; p2 finished and never came back.
    let mut loans = vec![
        LoanSnapshot::new("p1", dec!(0), at(9, 2)).finished_on(at(12, 3)),
        LoanSnapshot::new("p2", dec!(0), at(9, 2)).finished_on(at(12, 4)),
        LoanSnapshot::new("r1", dec!(4200), at(12, 3))
            .with_previous_loan("p1")
            .with_amounts(dec!(3000), dec!(900)),
    ];
    let index = annotate_renewals(&mut loans);
    assert_eq!(index.successor_of(&LoanId::from("p1")), Some(&LoanId::from("r1")));

    let kpis = calculate_renovation_kpis(&loans, &december(), None, &ClassifierConfig::default());
    assert_eq!(kpis.total_renovaciones, 1);
    assert_eq!(kpis.total_cierres_sin_renovar, 1);
    assert_eq!(kpis.tasa_renovacion, dec!(0.5));
}

#[test]
fn test_monthly_report_trends_chain() {
    let config = ClassifierConfig::default();
    let payments = PaymentsByLoan::new();
    let now = at(12, 31) + Duration::days(10);

    let november = monthly_report(&december_book(), &payments, 2024, 11, now, None, &config).unwrap();
    assert_eq!(november.client_balance.balance, 0);

    let december =
        monthly_report(&december_book(), &payments, 2024, 12, now, Some(&november), &config).unwrap();
    assert_eq!(december.client_balance.balance, 4);
    assert_eq!(december.client_balance.trend, Trend::Up);
    assert_eq!(december.renovation.trend, Trend::Up);
    assert_eq!(december.weeks.len(), 5);

    let json = serde_json::to_value(&december).unwrap();
    assert_eq!(json["clientBalance"]["balance"], 4);
}

// =============================================================================
// PROPERTIES
// =============================================================================

fn loan_strategy() -> impl Strategy<Value = LoanSnapshot> {
    (
        0u32..400,
        0i64..5_000,
        1i64..90,
        proptest::option::of(0i64..90),
        proptest::option::of(0u32..400),
        proptest::option::of(0i64..3_000),
        any::<bool>(),
    )
        .prop_map(|(id, pending, sign_offset, finished, previous, gived, bad_debt)| {
            let base = Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap();
            let sign_date = base + Duration::days(sign_offset);
            let mut loan = LoanSnapshot::new(format!("L{id:04}"), Decimal::from(pending), sign_date);
            loan.finished_date = finished.map(|d| sign_date + Duration::days(d));
            loan.previous_loan = previous.map(|p| LoanId::from(format!("L{p:04}")));
            if let Some(gived) = gived {
                loan.requested_amount = Some(dec!(3000));
                loan.amount_gived = Some(Decimal::from(gived));
            }
            if bad_debt && pending % 7 == 0 {
                loan.bad_debt_date = Some(sign_date + Duration::days(30));
            }
            loan
        })
}

fn book_and_shuffle() -> impl Strategy<Value = (Vec<LoanSnapshot>, Vec<LoanSnapshot>)> {
    prop::collection::vec(loan_strategy(), 0..60)
        .prop_flat_map(|loans| (Just(loans.clone()), Just(loans).prop_shuffle()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_order_independent((loans, shuffled) in book_and_shuffle()) {
        let config = ClassifierConfig::sequential();
        let period = december();
        let week = week_of(12, 9);
        let payments = PaymentsByLoan::new();

        prop_assert_eq!(
            calculate_client_balance(&loans, &period, None, &config),
            calculate_client_balance(&shuffled, &period, None, &config)
        );
        prop_assert_eq!(
            calculate_renovation_kpis(&loans, &period, None, &config),
            calculate_renovation_kpis(&shuffled, &period, None, &config)
        );
        prop_assert_eq!(
            count_clients_status(&loans, &payments, &week, true, at(12, 31), &config),
            count_clients_status(&shuffled, &payments, &week, true, at(12, 31), &config)
        );

        let mut annotated = loans.clone();
        let mut annotated_shuffled = shuffled.clone();
        annotate_renewals(&mut annotated);
        annotate_renewals(&mut annotated_shuffled);
        annotated.sort_by(|a, b| a.id.cmp(&b.id).then(a.sign_date.cmp(&b.sign_date)));
        annotated_shuffled.sort_by(|a, b| a.id.cmp(&b.id).then(a.sign_date.cmp(&b.sign_date)));
        let flags: Vec<_> = annotated.iter().map(|l| (l.id.clone(), l.was_renewed)).collect();
        let flags_shuffled: Vec<_> =
            annotated_shuffled.iter().map(|l| (l.id.clone(), l.was_renewed)).collect();
        prop_assert_eq!(flags, flags_shuffled);
    }

    #[test]
    fn prop_parallel_matches_sequential(loans in prop::collection::vec(loan_strategy(), 0..200)) {
        let sequential = ClassifierConfig::sequential();
        let parallel = ClassifierConfig::default().with_threshold(1);
        let period = december();
        let week = week_of(12, 16);
        let payments = PaymentsByLoan::new();

        prop_assert_eq!(
            calculate_client_balance(&loans, &period, Some(0), &sequential),
            calculate_client_balance(&loans, &period, Some(0), &parallel)
        );
        prop_assert_eq!(
            count_clients_status(&loans, &payments, &week, false, at(12, 18), &sequential),
            count_clients_status(&loans, &payments, &week, false, at(12, 18), &parallel)
        );
    }

    #[test]
    fn prop_status_counts_partition(loans in prop::collection::vec(loan_strategy(), 0..80)) {
        let counts = count_clients_status(
            &loans,
            &PaymentsByLoan::new(),
            &week_of(12, 9),
            true,
            at(12, 31),
            &ClassifierConfig::sequential(),
        );
        prop_assert_eq!(counts.total_activos, counts.en_cv + counts.al_corriente);
        prop_assert!(counts.salieron_de_cv <= counts.al_corriente);
    }

    #[test]
    fn prop_inactive_never_delinquent(loan in loan_strategy()) {
        if !is_active_loan(&loan) {
            let week = week_of(12, 16);
            prop_assert!(!is_in_cartera_vencida(&loan, 0, &week));
            prop_assert!(calculate_cv_status(&loan, &[], &week, &week.previous()).is_excluded());
        }
    }
}
