// ═══════════════════════════════════════════════════════════════════
// Service Tests: CurrencyService, BillService, PlatformService,
// InvestmentService, SaleService, SummaryService
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use finance_tracker_core::config::TrackerConfig;
use finance_tracker_core::errors::CoreError;
use finance_tracker_core::models::bill::{BaseBill, Bill};
use finance_tracker_core::models::currency::{Currency, ExchangeRateTable};
use finance_tracker_core::models::dataset::Dataset;
use finance_tracker_core::models::investment::InvestmentFields;
use finance_tracker_core::services::bill_service::BillService;
use finance_tracker_core::services::currency_service::CurrencyService;
use finance_tracker_core::services::investment_service::InvestmentService;
use finance_tracker_core::services::platform_service::PlatformService;
use finance_tracker_core::services::sale_service::SaleService;
use finance_tracker_core::services::summary_service::{percent_paid, SummaryService};

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn empty_dataset() -> Dataset {
    Dataset::new_default(&TrackerConfig::default(), 2026)
}

/// Dataset whose template is `[{Rent,1000},{Internet,50}]`.
fn dataset_with_template() -> Dataset {
    let mut ds = empty_dataset();
    ds.base_bills = vec![
        BaseBill::new("Rent", Decimal::from(1000)),
        BaseBill::new("Internet", Decimal::from(50)),
    ];
    ds
}

fn acme_usd() -> InvestmentFields {
    InvestmentFields::new("ACME", 1000.0, Currency::USD, "Stock Broker", 100.0, 10.0)
}

fn add(ds: &mut Dataset, fields: InvestmentFields) -> Uuid {
    InvestmentService::new().add_investment(ds, fields).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// CurrencyService
// ═══════════════════════════════════════════════════════════════════

mod currency_service {
    use super::*;

    #[test]
    fn same_currency_is_exact_identity() {
        let cs = CurrencyService::default();
        for c in Currency::ALL {
            for x in [0.0, -12.345, 0.1 + 0.2, 1e300, f64::MIN_POSITIVE] {
                assert_eq!(cs.convert(x, c, c).unwrap(), x);
            }
        }
    }

    #[test]
    fn converts_with_table_rate() {
        let cs = CurrencyService::default();
        assert!(approx_eq(cs.convert(1000.0, Currency::USD, Currency::EUR).unwrap(), 930.0));
        assert!(approx_eq(cs.convert(100.0, Currency::CHF, Currency::USD).unwrap(), 110.0));
        assert!(approx_eq(cs.convert(100.0, Currency::EUR, Currency::CHF).unwrap(), 98.0));
    }

    #[test]
    fn round_trip_is_not_exact() {
        let cs = CurrencyService::default();
        let eur = cs.convert(1000.0, Currency::USD, Currency::EUR).unwrap();
        let back = cs.convert(eur, Currency::EUR, Currency::USD).unwrap();
        assert!(approx_eq(back, 1004.4));
    }

    #[test]
    fn missing_row_is_unknown_source() {
        let cs = CurrencyService::new(ExchangeRateTable::empty());
        let err = cs.convert(1.0, Currency::USD, Currency::EUR).unwrap_err();
        assert!(matches!(err, CoreError::UnknownCurrency(ref c) if c == "USD"));
    }

    #[test]
    fn missing_column_is_unknown_target() {
        let mut rates = ExchangeRateTable::empty();
        rates.set_rate(Currency::USD, Currency::USD, 1.0);
        let cs = CurrencyService::new(rates);
        let err = cs.convert(1.0, Currency::USD, Currency::EUR).unwrap_err();
        assert!(matches!(err, CoreError::UnknownCurrency(ref c) if c == "EUR"));
    }

    #[test]
    fn same_currency_succeeds_on_empty_table() {
        let cs = CurrencyService::new(ExchangeRateTable::empty());
        assert_eq!(cs.convert(42.0, Currency::EUR, Currency::EUR).unwrap(), 42.0);
        assert_eq!(cs.rate(Currency::EUR, Currency::EUR).unwrap(), 1.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// BillService: months
// ═══════════════════════════════════════════════════════════════════

mod bill_months {
    use super::*;

    #[test]
    fn first_access_copies_template_unpaid() {
        let mut ds = dataset_with_template();
        let bills = BillService::new()
            .get_or_create_month(&mut ds, "2026", 3)
            .unwrap();
        let view: Vec<(&str, Decimal, bool)> = bills
            .iter()
            .map(|b| (b.name.as_str(), b.amount, b.paid))
            .collect();
        assert_eq!(
            view,
            vec![
                ("Rent", Decimal::from(1000), false),
                ("Internet", Decimal::from(50), false)
            ]
        );
    }

    #[test]
    fn second_access_returns_same_month() {
        let mut ds = dataset_with_template();
        let svc = BillService::new();
        let first_id = svc.get_or_create_month(&mut ds, "2026", 3).unwrap()[0].id;
        ds.base_bills.clear();
        let again = svc.get_or_create_month(&mut ds, "2026", 3).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].id, first_id);
    }

    #[test]
    fn template_edits_do_not_reach_existing_months() {
        let mut ds = dataset_with_template();
        let svc = BillService::new();
        svc.get_or_create_month(&mut ds, "2026", 3).unwrap();

        let rent_id = ds.base_bills[0].id;
        svc.edit_base_bill(&mut ds, rent_id, "Rent", 1200.0).unwrap();
        svc.add_base_bill(&mut ds, "Gym", 40.0).unwrap();

        let march = svc.month(&ds, "2026", 3).unwrap();
        assert_eq!(march.len(), 2);
        assert_eq!(march[0].amount, Decimal::from(1000));

        let april = svc.get_or_create_month(&mut ds, "2026", 4).unwrap();
        assert_eq!(april.len(), 3);
        assert_eq!(april[0].amount, Decimal::from(1200));
    }

    #[test]
    fn materializing_creates_missing_year() {
        let mut ds = empty_dataset();
        BillService::new()
            .get_or_create_month(&mut ds, "2030", 1)
            .unwrap();
        assert!(ds.years.contains_key("2030"));
    }

    #[test]
    fn invalid_month_rejected_without_mutation() {
        let mut ds = dataset_with_template();
        let before = ds.clone();
        let svc = BillService::new();
        assert!(matches!(
            svc.get_or_create_month(&mut ds, "2026", 0),
            Err(CoreError::InvalidMonth(0))
        ));
        assert!(matches!(
            svc.get_or_create_month(&mut ds, "2026", 13),
            Err(CoreError::InvalidMonth(13))
        ));
        assert_eq!(ds, before);
    }

    #[test]
    fn invalid_year_rejected() {
        let mut ds = empty_dataset();
        let err = BillService::new()
            .get_or_create_month(&mut ds, "26", 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidYear(_)));
    }

    #[test]
    fn month_or_template_does_not_mutate() {
        let ds = dataset_with_template();
        let svc = BillService::new();
        let view = svc.month_or_template(&ds, "2026", 5).unwrap();
        assert_eq!(view.len(), 2);
        assert!(svc.month(&ds, "2026", 5).is_none());
    }

    #[test]
    fn list_months_ascending() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        for m in [11, 2, 7] {
            svc.get_or_create_month(&mut ds, "2026", m).unwrap();
        }
        assert_eq!(svc.list_months(&ds, "2026"), vec![2, 7, 11]);
        assert!(svc.list_months(&ds, "1999").is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// BillService: bills
// ═══════════════════════════════════════════════════════════════════

mod bill_entries {
    use super::*;

    #[test]
    fn add_bill_appends_unpaid() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let id = svc.add_bill(&mut ds, "2026", 1, "Water", 30.0).unwrap();
        let jan = svc.month(&ds, "2026", 1).unwrap();
        assert_eq!(jan.len(), 1);
        assert_eq!(jan[0].id, id);
        assert!(!jan[0].paid);
    }

    #[test]
    fn add_bill_trims_name() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_bill(&mut ds, "2026", 1, "  Water  ", 30.0).unwrap();
        assert_eq!(svc.month(&ds, "2026", 1).unwrap()[0].name, "Water");
    }

    #[test]
    fn duplicate_name_ignores_case() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_bill(&mut ds, "2026", 1, "rent", 900.0).unwrap();
        let err = svc.add_bill(&mut ds, "2026", 1, "Rent", 1000.0).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { .. }));
        assert_eq!(svc.month(&ds, "2026", 1).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_of_template_entry_leaves_month_unmaterialized() {
        let mut ds = dataset_with_template();
        let svc = BillService::new();
        let err = svc.add_bill(&mut ds, "2026", 6, "RENT", 5.0).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { .. }));
        assert!(svc.month(&ds, "2026", 6).is_none());
    }

    #[test]
    fn same_name_allowed_in_other_month() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_bill(&mut ds, "2026", 1, "Rent", 1000.0).unwrap();
        assert!(svc.add_bill(&mut ds, "2026", 2, "Rent", 1000.0).is_ok());
    }

    #[test]
    fn add_bill_rejects_bad_input() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        assert!(matches!(
            svc.add_bill(&mut ds, "2026", 1, "   ", 1.0),
            Err(CoreError::InvalidField(_))
        ));
        assert!(matches!(
            svc.add_bill(&mut ds, "2026", 1, "Water", f64::NAN),
            Err(CoreError::InvalidAmount(_))
        ));
        assert!(matches!(
            svc.add_bill(&mut ds, "2026", 1, "Water", f64::INFINITY),
            Err(CoreError::InvalidAmount(_))
        ));
        // beyond the exact decimal range
        assert!(matches!(
            svc.add_bill(&mut ds, "2026", 1, "Water", 1e300),
            Err(CoreError::InvalidAmount(_))
        ));
        assert!(svc.month(&ds, "2026", 1).is_none());
    }

    #[test]
    fn float_input_is_stored_as_exact_decimal() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_bill(&mut ds, "2026", 1, "Power", 0.1).unwrap();
        svc.add_bill(&mut ds, "2026", 1, "Gas", 1804.01).unwrap();
        let jan = svc.month(&ds, "2026", 1).unwrap();
        assert_eq!(jan[0].amount, Decimal::new(1, 1));
        assert_eq!(jan[1].amount, Decimal::new(180401, 2));
    }

    #[test]
    fn year_lookups_ignore_surrounding_whitespace() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let id = svc.add_bill(&mut ds, "2026", 3, "Rent", 1000.0).unwrap();

        assert_eq!(svc.month(&ds, " 2026 ", 3).unwrap().len(), 1);
        assert_eq!(svc.list_months(&ds, "2026 "), vec![3]);
        assert!(svc.toggle_paid(&mut ds, " 2026", 3, id).unwrap());
        assert_eq!(svc.search_bills(&ds, "\t2026", 3, "rent").len(), 1);
    }

    #[test]
    fn negative_amount_is_allowed() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        assert!(svc.add_bill(&mut ds, "2026", 1, "Refund", -20.0).is_ok());
    }

    #[test]
    fn edit_bill_updates_fields() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let id = svc.add_bill(&mut ds, "2026", 1, "Water", 30.0).unwrap();
        svc.edit_bill(&mut ds, "2026", 1, id, "Water & Sewage", 45.0)
            .unwrap();
        let bill = &svc.month(&ds, "2026", 1).unwrap()[0];
        assert_eq!(bill.name, "Water & Sewage");
        assert_eq!(bill.amount, Decimal::from(45));
    }

    #[test]
    fn edit_bill_may_keep_own_name_in_other_case() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let id = svc.add_bill(&mut ds, "2026", 1, "water", 30.0).unwrap();
        assert!(svc.edit_bill(&mut ds, "2026", 1, id, "Water", 30.0).is_ok());
    }

    #[test]
    fn edit_bill_rejects_collision_with_other_bill() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_bill(&mut ds, "2026", 1, "Rent", 1000.0).unwrap();
        let id = svc.add_bill(&mut ds, "2026", 1, "Water", 30.0).unwrap();
        let err = svc
            .edit_bill(&mut ds, "2026", 1, id, "RENT", 30.0)
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { .. }));
        assert_eq!(svc.month(&ds, "2026", 1).unwrap()[1].name, "Water");
    }

    #[test]
    fn edit_bill_rejects_non_finite_amount() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let id = svc.add_bill(&mut ds, "2026", 1, "Water", 30.0).unwrap();
        let err = svc
            .edit_bill(&mut ds, "2026", 1, id, "Water", f64::NAN)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount(_)));
        assert_eq!(svc.month(&ds, "2026", 1).unwrap()[0].amount, Decimal::from(30));
    }

    #[test]
    fn unknown_bill_id_is_not_found() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_bill(&mut ds, "2026", 1, "Water", 30.0).unwrap();
        let ghost = Uuid::new_v4();
        assert!(matches!(
            svc.toggle_paid(&mut ds, "2026", 1, ghost),
            Err(CoreError::BillNotFound(_))
        ));
        assert!(matches!(
            svc.delete_bill(&mut ds, "2026", 2, ghost),
            Err(CoreError::BillNotFound(_))
        ));
    }

    #[test]
    fn toggle_paid_flips() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let id = svc.add_bill(&mut ds, "2026", 1, "Water", 30.0).unwrap();
        assert!(svc.toggle_paid(&mut ds, "2026", 1, id).unwrap());
        assert!(svc.month(&ds, "2026", 1).unwrap()[0].paid);
        assert!(!svc.toggle_paid(&mut ds, "2026", 1, id).unwrap());
    }

    #[test]
    fn delete_bill_by_id_keeps_others() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let a = svc.add_bill(&mut ds, "2026", 1, "A", 1.0).unwrap();
        let b = svc.add_bill(&mut ds, "2026", 1, "B", 2.0).unwrap();
        let c = svc.add_bill(&mut ds, "2026", 1, "C", 3.0).unwrap();

        let removed = svc.delete_bill(&mut ds, "2026", 1, a).unwrap();
        assert_eq!(removed.name, "A");
        // ids stay valid after an earlier row is removed
        svc.toggle_paid(&mut ds, "2026", 1, c).unwrap();
        let jan = svc.month(&ds, "2026", 1).unwrap();
        assert_eq!(jan.len(), 2);
        assert_eq!(jan[0].id, b);
        assert!(jan[1].paid);
    }

    #[test]
    fn search_bills_is_case_insensitive() {
        let mut ds = dataset_with_template();
        let svc = BillService::new();
        svc.get_or_create_month(&mut ds, "2026", 3).unwrap();
        let hits = svc.search_bills(&ds, "2026", 3, "INTER");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Internet");
        assert_eq!(svc.search_bills(&ds, "2026", 3, "").len(), 2);
        assert!(svc.search_bills(&ds, "2026", 4, "rent").is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// BillService: years
// ═══════════════════════════════════════════════════════════════════

mod bill_years {
    use super::*;

    #[test]
    fn add_year_creates_empty_year() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_year(&mut ds, "2027").unwrap();
        assert!(ds.years["2027"].is_empty());
    }

    #[test]
    fn add_year_requires_four_digits() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        for bad in ["27", "20270", "20a7", "", "-202"] {
            assert!(
                matches!(svc.add_year(&mut ds, bad), Err(CoreError::InvalidYear(_))),
                "{bad:?} should be rejected"
            );
        }
        assert_eq!(ds.years.len(), 1);
    }

    #[test]
    fn add_year_rejects_duplicate() {
        let mut ds = empty_dataset();
        let err = BillService::new().add_year(&mut ds, "2026").unwrap_err();
        assert!(matches!(err, CoreError::DuplicateYear(ref y) if y == "2026"));
    }

    #[test]
    fn delete_last_year_is_protected() {
        let mut ds = empty_dataset();
        let err = BillService::new().delete_year(&mut ds, "2026").unwrap_err();
        assert!(matches!(err, CoreError::LastYearProtected(_)));
        assert!(ds.years.contains_key("2026"));
    }

    #[test]
    fn delete_year_returns_lowest_remaining() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_year(&mut ds, "2024").unwrap();
        svc.add_year(&mut ds, "2025").unwrap();
        let next = svc.delete_year(&mut ds, "2025").unwrap();
        assert_eq!(next, "2024");
        assert!(!ds.years.contains_key("2025"));
    }

    #[test]
    fn delete_unknown_year() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_year(&mut ds, "2024").unwrap();
        let err = svc.delete_year(&mut ds, "1999").unwrap_err();
        assert!(matches!(err, CoreError::YearNotFound(_)));
    }

    #[test]
    fn list_years_sorted() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_year(&mut ds, "2031").unwrap();
        svc.add_year(&mut ds, "2019").unwrap();
        assert_eq!(svc.list_years(&ds), vec!["2019", "2026", "2031"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// BillService: base template
// ═══════════════════════════════════════════════════════════════════

mod base_bills {
    use super::*;

    #[test]
    fn add_edit_remove() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let id = svc.add_base_bill(&mut ds, "Rent", 1000.0).unwrap();
        svc.edit_base_bill(&mut ds, id, "Rent", 1100.0).unwrap();
        assert_eq!(ds.base_bills[0].amount, Decimal::from(1100));
        let removed = svc.remove_base_bill(&mut ds, id).unwrap();
        assert_eq!(removed.name, "Rent");
        assert!(ds.base_bills.is_empty());
    }

    #[test]
    fn duplicate_template_names_rejected() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        svc.add_base_bill(&mut ds, "Rent", 1000.0).unwrap();
        let other = svc.add_base_bill(&mut ds, "Internet", 50.0).unwrap();
        assert!(matches!(
            svc.add_base_bill(&mut ds, "rent", 1.0),
            Err(CoreError::DuplicateName { .. })
        ));
        assert!(matches!(
            svc.edit_base_bill(&mut ds, other, "RENT", 50.0),
            Err(CoreError::DuplicateName { .. })
        ));
    }

    #[test]
    fn unknown_template_entry() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let ghost = Uuid::new_v4();
        assert!(matches!(
            svc.remove_base_bill(&mut ds, ghost),
            Err(CoreError::BaseBillNotFound(_))
        ));
        assert!(matches!(
            svc.edit_base_bill(&mut ds, ghost, "X", 1.0),
            Err(CoreError::BaseBillNotFound(_))
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════
// PlatformService
// ═══════════════════════════════════════════════════════════════════

mod platforms {
    use super::*;

    #[test]
    fn add_keeps_list_sorted() {
        let mut ds = empty_dataset();
        let svc = PlatformService::new();
        svc.add_platform(&mut ds, "Angel Fund").unwrap();
        assert_eq!(ds.platforms[0], "Angel Fund");
        let mut sorted = ds.platforms.clone();
        sorted.sort();
        assert_eq!(ds.platforms, sorted);
    }

    #[test]
    fn add_duplicate_rejected() {
        let mut ds = empty_dataset();
        let err = PlatformService::new()
            .add_platform(&mut ds, "Bank")
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicatePlatform(_)));
    }

    #[test]
    fn remove_unreferenced_succeeds() {
        let mut ds = empty_dataset();
        PlatformService::new()
            .remove_platform(&mut ds, "Commodities")
            .unwrap();
        assert!(!ds.platforms.iter().any(|p| p == "Commodities"));
    }

    #[test]
    fn remove_referenced_by_open_investment_fails() {
        let mut ds = empty_dataset();
        add(&mut ds, acme_usd());
        let err = PlatformService::new()
            .remove_platform(&mut ds, "Stock Broker")
            .unwrap_err();
        assert!(matches!(err, CoreError::PlatformInUse(_)));
        assert!(ds.platforms.iter().any(|p| p == "Stock Broker"));
    }

    #[test]
    fn remove_referenced_by_sold_record_fails() {
        let mut ds = empty_dataset();
        let id = add(&mut ds, acme_usd());
        SaleService::new()
            .sell(
                &mut ds,
                id,
                120.0,
                Currency::USD,
                make_date(2026, 3, 1),
                &CurrencyService::default(),
                Currency::CHF,
            )
            .unwrap();
        let svc = PlatformService::new();
        assert!(svc.is_in_use(&ds, "Stock Broker"));
        assert!(matches!(
            svc.remove_platform(&mut ds, "Stock Broker"),
            Err(CoreError::PlatformInUse(_))
        ));
    }

    #[test]
    fn remove_unknown_platform() {
        let mut ds = empty_dataset();
        let err = PlatformService::new()
            .remove_platform(&mut ds, "Moon Bank")
            .unwrap_err();
        assert!(matches!(err, CoreError::PlatformNotFound(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// InvestmentService
// ═══════════════════════════════════════════════════════════════════

mod investments {
    use super::*;

    #[test]
    fn add_defaults_contribution_to_zero() {
        let mut ds = empty_dataset();
        let id = add(&mut ds, acme_usd());
        let inv = InvestmentService::new().get(&ds, id).unwrap();
        assert_eq!(inv.monthly_contribution, 0.0);
    }

    #[test]
    fn non_finite_contribution_falls_back_to_zero() {
        let mut ds = empty_dataset();
        let id = add(&mut ds, acme_usd().with_monthly_contribution(f64::NAN));
        assert_eq!(ds.investments[0].id, id);
        assert_eq!(ds.investments[0].monthly_contribution, 0.0);
    }

    #[test]
    fn negative_contribution_rejected() {
        let mut ds = empty_dataset();
        let err = InvestmentService::new()
            .add_investment(&mut ds, acme_usd().with_monthly_contribution(-5.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidField(_)));
    }

    #[test]
    fn duplicate_name_is_global_and_case_insensitive() {
        let mut ds = empty_dataset();
        add(&mut ds, acme_usd());
        let other = InvestmentFields::new("acme", 5.0, Currency::EUR, "Bank", 1.0, 5.0);
        let err = InvestmentService::new()
            .add_investment(&mut ds, other)
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { .. }));
        assert_eq!(ds.investments.len(), 1);
    }

    #[test]
    fn required_and_finite_fields() {
        let mut ds = empty_dataset();
        let svc = InvestmentService::new();
        let cases = [
            InvestmentFields::new("", 1.0, Currency::USD, "Bank", 1.0, 1.0),
            InvestmentFields::new("X", 1.0, Currency::USD, " ", 1.0, 1.0),
            InvestmentFields::new("X", f64::NAN, Currency::USD, "Bank", 1.0, 1.0),
            InvestmentFields::new("X", 1.0, Currency::USD, "Bank", f64::INFINITY, 1.0),
            InvestmentFields::new("X", 1.0, Currency::USD, "Bank", 1.0, f64::NAN),
        ];
        for fields in cases {
            assert!(matches!(
                svc.add_investment(&mut ds, fields),
                Err(CoreError::InvalidField(_))
            ));
        }
        assert!(ds.investments.is_empty());
    }

    #[test]
    fn platform_must_be_listed() {
        let mut ds = empty_dataset();
        let svc = InvestmentService::new();
        let fields = InvestmentFields::new("X", 1.0, Currency::USD, "Moon Bank", 1.0, 1.0);
        let err = svc.add_investment(&mut ds, fields).unwrap_err();
        assert!(matches!(err, CoreError::InvalidField(ref m) if m.contains("Moon Bank")));
        assert!(ds.investments.is_empty());

        PlatformService::new().add_platform(&mut ds, "Moon Bank").unwrap();
        let fields = InvestmentFields::new("X", 1.0, Currency::USD, "Moon Bank", 1.0, 1.0);
        assert!(svc.add_investment(&mut ds, fields).is_ok());
    }

    #[test]
    fn edit_may_keep_unlisted_platform_but_not_move_to_one() {
        let mut ds = empty_dataset();
        let svc = InvestmentService::new();
        let id = add(&mut ds, acme_usd());
        // a snapshot can carry a platform that is no longer listed
        ds.platforms.retain(|p| p != "Stock Broker");

        let renamed = InvestmentFields::new("ACME Corp", 1000.0, Currency::USD, "Stock Broker", 100.0, 10.0);
        svc.edit_investment(&mut ds, id, renamed).unwrap();
        assert_eq!(ds.investments[0].name, "ACME Corp");

        let moved = InvestmentFields::new("ACME Corp", 1000.0, Currency::USD, "Nowhere", 100.0, 10.0);
        assert!(matches!(
            svc.edit_investment(&mut ds, id, moved),
            Err(CoreError::InvalidField(_))
        ));
        assert_eq!(ds.investments[0].platform, "Stock Broker");
    }

    #[test]
    fn edit_keeps_id_and_excludes_self_from_duplicate_check() {
        let mut ds = empty_dataset();
        let svc = InvestmentService::new();
        let id = add(&mut ds, acme_usd());
        let fields = InvestmentFields::new("Acme", 1500.0, Currency::USD, "Stock Broker", 150.0, 10.0);
        svc.edit_investment(&mut ds, id, fields).unwrap();
        let inv = svc.get(&ds, id).unwrap();
        assert_eq!(inv.name, "Acme");
        assert_eq!(inv.amount, 1500.0);
    }

    #[test]
    fn edit_rejects_collision() {
        let mut ds = empty_dataset();
        let svc = InvestmentService::new();
        add(&mut ds, acme_usd());
        let id = add(
            &mut ds,
            InvestmentFields::new("Bond", 500.0, Currency::CHF, "Bonds", 100.0, 5.0),
        );
        let err = svc.edit_investment(&mut ds, id, acme_usd()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { .. }));
        assert_eq!(svc.get(&ds, id).unwrap().name, "Bond");
    }

    #[test]
    fn edit_unknown_id() {
        let mut ds = empty_dataset();
        let err = InvestmentService::new()
            .edit_investment(&mut ds, Uuid::new_v4(), acme_usd())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvestmentNotFound(_)));
    }

    #[test]
    fn delete_creates_no_sold_record() {
        let mut ds = empty_dataset();
        let id = add(&mut ds, acme_usd());
        let removed = InvestmentService::new()
            .delete_investment(&mut ds, id)
            .unwrap();
        assert_eq!(removed.name, "ACME");
        assert!(ds.investments.is_empty());
        assert!(ds.sold_investments.is_empty());
    }

    #[test]
    fn search_matches_name_or_platform() {
        let mut ds = empty_dataset();
        add(&mut ds, acme_usd());
        add(
            &mut ds,
            InvestmentFields::new("Gold", 300.0, Currency::CHF, "Commodities", 30.0, 10.0),
        );
        let svc = InvestmentService::new();
        assert_eq!(svc.search_investments(&ds, "acm").len(), 1);
        assert_eq!(svc.search_investments(&ds, "COMMOD").len(), 1);
        assert_eq!(svc.search_investments(&ds, "").len(), 2);
    }

    #[test]
    fn totals_convert_each_position() {
        let mut ds = empty_dataset();
        add(&mut ds, acme_usd().with_monthly_contribution(100.0));
        add(
            &mut ds,
            InvestmentFields::new("Bond", 500.0, Currency::CHF, "Bonds", 100.0, 5.0)
                .with_monthly_contribution(50.0),
        );
        let svc = InvestmentService::new();
        let cs = CurrencyService::default();

        let chf = svc.total_value(&ds, &cs, Currency::CHF).unwrap();
        assert!(approx_eq(chf, 1000.0 * 0.91 + 500.0));

        let monthly = svc
            .total_monthly_contribution(&ds, &cs, Currency::CHF)
            .unwrap();
        assert!(approx_eq(monthly, 100.0 * 0.91 + 50.0));
    }

    #[test]
    fn totals_of_empty_ledger_are_zero() {
        let ds = empty_dataset();
        let svc = InvestmentService::new();
        let cs = CurrencyService::default();
        assert_eq!(svc.total_value(&ds, &cs, Currency::EUR).unwrap(), 0.0);
        assert_eq!(svc.distinct_platform_count(&ds), 0);
        assert!(svc.value_by_platform(&ds, &cs, Currency::EUR).unwrap().is_empty());
    }

    #[test]
    fn platform_breakdown_in_first_appearance_order() {
        let mut ds = empty_dataset();
        add(
            &mut ds,
            InvestmentFields::new("Z1", 100.0, Currency::CHF, "Bank", 1.0, 100.0),
        );
        add(&mut ds, acme_usd());
        add(
            &mut ds,
            InvestmentFields::new("Z2", 200.0, Currency::CHF, "Bank", 1.0, 200.0),
        );
        let svc = InvestmentService::new();
        let cs = CurrencyService::default();

        assert_eq!(svc.distinct_platform_count(&ds), 2);
        let values = svc.value_by_platform(&ds, &cs, Currency::CHF).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].platform, "Bank");
        assert!(approx_eq(values[0].value, 300.0));
        assert_eq!(values[1].platform, "Stock Broker");
        assert!(approx_eq(values[1].value, 910.0));
    }
}

// ═══════════════════════════════════════════════════════════════════
// SaleService
// ═══════════════════════════════════════════════════════════════════

mod sales {
    use super::*;

    fn sell(ds: &mut Dataset, id: Uuid, price: f64, currency: Currency) -> Result<f64, CoreError> {
        SaleService::new()
            .sell(
                ds,
                id,
                price,
                currency,
                make_date(2026, 3, 1),
                &CurrencyService::default(),
                Currency::CHF,
            )
            .map(|r| r.profit_loss)
    }

    #[test]
    fn same_currency_sale() {
        let mut ds = empty_dataset();
        let id = add(&mut ds, acme_usd());
        let record = SaleService::new()
            .sell(
                &mut ds,
                id,
                120.0,
                Currency::USD,
                make_date(2026, 3, 1),
                &CurrencyService::default(),
                Currency::CHF,
            )
            .unwrap();
        assert!(approx_eq(record.sale_amount, 1200.0));
        assert!(approx_eq(record.profit_loss, 200.0));
        assert!(approx_eq(record.profit_loss_reporting, 200.0 * 0.91));
        assert_eq!(record.purchase_amount, 1000.0);
        assert_eq!(record.purchase_currency, Currency::USD);
        assert_eq!(record.sell_currency, Currency::USD);
        assert_eq!(record.date_sold, make_date(2026, 3, 1));
    }

    #[test]
    fn cross_currency_sale_converts_purchase_amount() {
        let mut ds = empty_dataset();
        let id = add(&mut ds, acme_usd());
        let pl = sell(&mut ds, id, 120.0, Currency::EUR).unwrap();
        assert!(approx_eq(pl, 1200.0 - 1000.0 * 0.93));
        assert!(approx_eq(pl, 270.0));
        let record = &ds.sold_investments[0];
        assert!(approx_eq(record.profit_loss_reporting, 270.0 * 0.98));
    }

    #[test]
    fn recorded_amount_is_authoritative_over_unit_price() {
        let mut ds = empty_dataset();
        // 10 units at 100 would be 1000, but 800 was recorded
        let id = add(
            &mut ds,
            InvestmentFields::new("ACME", 800.0, Currency::USD, "Stock Broker", 100.0, 10.0),
        );
        let pl = sell(&mut ds, id, 100.0, Currency::USD).unwrap();
        assert!(approx_eq(pl, 200.0));
    }

    #[test]
    fn sale_moves_investment_between_ledgers() {
        let mut ds = empty_dataset();
        let keep = add(
            &mut ds,
            InvestmentFields::new("Bond", 500.0, Currency::CHF, "Bonds", 100.0, 5.0),
        );
        let id = add(&mut ds, acme_usd());
        sell(&mut ds, id, 120.0, Currency::USD).unwrap();
        assert_eq!(ds.investments.len(), 1);
        assert_eq!(ds.investments[0].id, keep);
        assert_eq!(ds.sold_investments.len(), 1);
        assert_eq!(ds.sold_investments[0].name, "ACME");
    }

    #[test]
    fn invalid_price_leaves_ledgers_untouched() {
        let mut ds = empty_dataset();
        let id = add(&mut ds, acme_usd());
        let before = ds.clone();
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                sell(&mut ds, id, price, Currency::USD),
                Err(CoreError::InvalidPrice(_))
            ));
        }
        assert_eq!(ds, before);
    }

    #[test]
    fn missing_rate_leaves_ledgers_untouched() {
        let mut ds = empty_dataset();
        let id = add(&mut ds, acme_usd());
        let before = ds.clone();
        let err = SaleService::new()
            .sell(
                &mut ds,
                id,
                120.0,
                Currency::EUR,
                make_date(2026, 3, 1),
                &CurrencyService::new(ExchangeRateTable::empty()),
                Currency::CHF,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownCurrency(_)));
        assert_eq!(ds, before);
    }

    #[test]
    fn unknown_investment() {
        let mut ds = empty_dataset();
        let err = sell(&mut ds, Uuid::new_v4(), 1.0, Currency::USD).unwrap_err();
        assert!(matches!(err, CoreError::InvestmentNotFound(_)));
    }

    #[test]
    fn preview_matches_sale() {
        let mut ds = empty_dataset();
        let id = add(&mut ds, acme_usd());
        let svc = SaleService::new();
        let cs = CurrencyService::default();
        let preview = svc
            .preview(&ds.investments[0], 120.0, Currency::EUR, &cs, Currency::CHF)
            .unwrap();
        assert!(approx_eq(preview.purchase_amount_converted, 930.0));
        assert_eq!(ds.investments.len(), 1);

        let record = svc
            .sell(&mut ds, id, 120.0, Currency::EUR, make_date(2026, 3, 1), &cs, Currency::CHF)
            .unwrap();
        assert_eq!(record.sale_amount, preview.sale_amount);
        assert_eq!(record.profit_loss, preview.profit_loss);
        assert_eq!(record.profit_loss_reporting, preview.profit_loss_reporting);
    }

    #[test]
    fn search_sold_newest_first_with_platform_filter() {
        let mut ds = empty_dataset();
        let svc = SaleService::new();
        let cs = CurrencyService::default();
        let specs = [
            ("Old", "Bank", make_date(2025, 1, 10)),
            ("New", "Bank", make_date(2026, 2, 1)),
            ("Mid", "Bonds", make_date(2025, 6, 1)),
        ];
        for (name, platform, date) in specs {
            let id = add(
                &mut ds,
                InvestmentFields::new(name, 100.0, Currency::CHF, platform, 10.0, 10.0),
            );
            svc.sell(&mut ds, id, 11.0, Currency::CHF, date, &cs, Currency::CHF)
                .unwrap();
        }

        let names: Vec<&str> = svc
            .search_sold(&ds, "", None)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["New", "Mid", "Old"]);

        let bank: Vec<&str> = svc
            .search_sold(&ds, "", Some("Bank"))
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(bank, vec!["New", "Old"]);

        assert_eq!(svc.search_sold(&ds, "mi", None).len(), 1);
        assert_eq!(svc.sold_platforms(&ds), vec!["Bank", "Bonds"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// SummaryService
// ═══════════════════════════════════════════════════════════════════

mod summaries {
    use super::*;

    /// `cents` as an exact two-decimal amount.
    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn bill(name: &str, cents: i64, paid: bool) -> Bill {
        let mut b = Bill::new(name, money(cents));
        b.paid = paid;
        b
    }

    #[test]
    fn percent_paid_rounds_and_handles_zero_total() {
        let pct = |paid: i64, total: i64| percent_paid(Decimal::from(paid), Decimal::from(total));
        assert_eq!(pct(0, 0), 0);
        assert_eq!(pct(1, 3), 33);
        assert_eq!(pct(2, 3), 67);
        assert_eq!(pct(1, 8), 13);
        assert_eq!(pct(50, 50), 100);
    }

    #[test]
    fn percent_paid_is_clamped() {
        // a credit can push paid above total or below zero
        let pct = |paid: i64, total: i64| percent_paid(Decimal::from(paid), Decimal::from(total));
        assert_eq!(pct(150, 100), 100);
        assert_eq!(pct(-20, 100), 0);
        assert!(pct(10, -5) <= 100);
        assert_eq!(percent_paid(Decimal::MAX, Decimal::new(1, 28)), 100);
        assert_eq!(percent_paid(Decimal::MIN, Decimal::new(1, 28)), 0);
    }

    #[test]
    fn month_summary_totals_add_up() {
        let bills = vec![
            bill("Rent", 100_000, true),
            bill("Internet", 5_050, false),
            bill("Refund", -1_000, true),
            bill("Power", 25, false),
        ];
        let s = SummaryService::new().month_summary("2026", 3, &bills, Currency::CHF);
        assert_eq!(s.total, s.paid + s.unpaid);
        assert_eq!(s.paid, Decimal::from(990));
        assert_eq!(s.unpaid, money(5_075));
        assert_eq!(s.percent_paid, 95);
        assert_eq!(s.currency, Currency::CHF);
    }

    #[test]
    fn month_totals_are_exact_for_two_decimal_amounts() {
        let svc = BillService::new();
        let summaries = SummaryService::new();

        let mut ds = empty_dataset();
        let amounts = [1804.01, 1594.12, -314.39, 1422.44, -445.8];
        let mut ids = Vec::new();
        for (i, amount) in amounts.into_iter().enumerate() {
            ids.push(svc.add_bill(&mut ds, "2026", 1, &format!("Bill {i}"), amount).unwrap());
        }
        svc.toggle_paid(&mut ds, "2026", 1, ids[2]).unwrap();
        let s = summaries.month_summary("2026", 1, svc.month(&ds, "2026", 1).unwrap(), Currency::CHF);
        assert_eq!(s.total, money(406_038));
        assert_eq!(s.paid, money(-31_439));
        assert_eq!(s.unpaid, money(437_477));
        assert_eq!(s.total, s.paid + s.unpaid);

        // many months of varied cent amounts, entered as floats
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for month in 1..=12 {
            let mut ds = empty_dataset();
            for i in 0..40 {
                seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
                let cents = (seed >> 33) as i64 % 500_000 - 100_000;
                let id = svc
                    .add_bill(&mut ds, "2026", month, &format!("Bill {i}"), cents as f64 / 100.0)
                    .unwrap();
                if seed & 1 == 1 {
                    svc.toggle_paid(&mut ds, "2026", month, id).unwrap();
                }
            }
            let bills = svc.month(&ds, "2026", month).unwrap();
            let s = summaries.month_summary("2026", month, bills, Currency::CHF);
            assert_eq!(s.total, s.paid + s.unpaid, "month {month}");
            let split = summaries.bills_split(bills);
            assert_eq!(split.paid, s.paid);
            assert_eq!(split.unpaid, s.unpaid);
        }
    }

    #[test]
    fn empty_month_summary() {
        let s = SummaryService::new().month_summary("2026", 1, &[], Currency::CHF);
        assert_eq!(s.total, Decimal::ZERO);
        assert_eq!(s.percent_paid, 0);
    }

    #[test]
    fn bills_split() {
        let bills = vec![bill("A", 1_000, true), bill("B", 500, false), bill("C", 100, false)];
        let split = SummaryService::new().bills_split(&bills);
        assert_eq!(split.paid, Decimal::from(10));
        assert_eq!(split.unpaid, Decimal::from(6));
    }

    #[test]
    fn overall_counts_and_converts_paid_bills() {
        let mut ds = empty_dataset();
        let svc = BillService::new();
        let a = svc.add_bill(&mut ds, "2025", 12, "Rent", 1000.0).unwrap();
        svc.add_bill(&mut ds, "2026", 1, "Rent", 1000.0).unwrap();
        let c = svc.add_bill(&mut ds, "2026", 1, "Water", 100.0).unwrap();
        svc.toggle_paid(&mut ds, "2025", 12, a).unwrap();
        svc.toggle_paid(&mut ds, "2026", 1, c).unwrap();

        let summary = SummaryService::new()
            .overall_bill_summary(&ds, &CurrencyService::default(), Currency::CHF, Currency::USD)
            .unwrap();
        assert!(approx_eq(summary.total_paid, 1100.0 * 1.10));
        assert_eq!(summary.total_bills, 3);
        assert_eq!(summary.paid_bills, 2);
        assert_eq!(summary.unpaid_bills, 1);
        assert_eq!(summary.currency, Currency::USD);
    }

    #[test]
    fn export_month_summary_format() {
        let bills = vec![bill("Rent", 100_000, true), bill("Internet", 5_000, false)];
        let text = SummaryService::new().export_month_summary("2026", 3, &bills, Currency::CHF);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Summary for March 2026");
        assert_eq!(lines[1], "=".repeat(60));
        assert!(text.contains("Total Expenses: 1050.00 CHF"));
        assert!(text.contains("Total Paid: 1000.00 CHF"));
        assert!(text.contains("Total Unpaid: 50.00 CHF"));
        assert!(text.contains("Percentage Paid: 95%"));
        assert!(text.contains("Rent: 1000.00 CHF [PAID]"));
        assert!(text.contains("Internet: 50.00 CHF [UNPAID]"));
    }

    #[test]
    fn investment_summary_in_target_currency() {
        let mut ds = empty_dataset();
        add(&mut ds, acme_usd().with_monthly_contribution(10.0));
        let s = SummaryService::new()
            .investment_summary(&ds, &CurrencyService::default(), Currency::USD)
            .unwrap();
        assert_eq!(s.total_value, 1000.0);
        assert_eq!(s.total_monthly_contribution, 10.0);
        assert_eq!(s.investment_count, 1);
        assert_eq!(s.platform_count, 1);
        assert_eq!(s.by_platform.len(), 1);
    }

    #[test]
    fn realized_gain_summary_averages_percentages() {
        let mut ds = empty_dataset();
        let sales = SaleService::new();
        let cs = CurrencyService::default();
        // +20% on 1000 and -50% on 100: plain mean is -15%
        let a = add(
            &mut ds,
            InvestmentFields::new("A", 1000.0, Currency::CHF, "Bank", 100.0, 10.0),
        );
        let b = add(
            &mut ds,
            InvestmentFields::new("B", 100.0, Currency::CHF, "Bank", 10.0, 10.0),
        );
        sales
            .sell(&mut ds, a, 120.0, Currency::CHF, make_date(2026, 1, 1), &cs, Currency::CHF)
            .unwrap();
        sales
            .sell(&mut ds, b, 5.0, Currency::CHF, make_date(2026, 1, 2), &cs, Currency::CHF)
            .unwrap();

        let s = SummaryService::new().realized_gain_summary(&ds, Currency::CHF);
        assert_eq!(s.count, 2);
        assert!(approx_eq(s.total_realized_gain, 200.0 - 50.0));
        assert!(approx_eq(s.average_return_pct, -15.0));
    }

    #[test]
    fn realized_gain_summary_empty() {
        let s = SummaryService::new().realized_gain_summary(&empty_dataset(), Currency::CHF);
        assert_eq!(s.count, 0);
        assert_eq!(s.total_realized_gain, 0.0);
        assert_eq!(s.average_return_pct, 0.0);
    }

    #[test]
    fn cumulative_series_sorted_by_date_and_stable_on_ties() {
        let mut ds = empty_dataset();
        let sales = SaleService::new();
        let cs = CurrencyService::default();
        let specs = [
            ("Late", make_date(2026, 5, 1), 12.0),
            ("TieFirst", make_date(2026, 2, 1), 11.0),
            ("TieSecond", make_date(2026, 2, 1), 9.0),
        ];
        for (name, date, price) in specs {
            let id = add(
                &mut ds,
                InvestmentFields::new(name, 100.0, Currency::CHF, "Bank", 10.0, 10.0),
            );
            sales
                .sell(&mut ds, id, price, Currency::CHF, date, &cs, Currency::CHF)
                .unwrap();
        }

        let series = SummaryService::new().cumulative_profit_loss(&ds);
        let names: Vec<&str> = series.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["TieFirst", "TieSecond", "Late"]);
        assert!(approx_eq(series[0].cumulative, 10.0));
        assert!(approx_eq(series[1].cumulative, 0.0));
        assert!(approx_eq(series[2].cumulative, 20.0));
    }
}
