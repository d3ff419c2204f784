//! End-to-end allocation runs against an in-memory quote provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use momentum_alloc::fetcher::{FetchFuture, QuoteFetcher};
use momentum_alloc::{
    pipeline, AllocError, Config, DropReason, FetchError, Horizon, QuoteRecord, Strategy, Symbol,
    ValidationError,
};

fn sym(s: &str) -> Symbol {
    Symbol::parse(s).expect("valid symbol")
}

fn symbols(names: &[&str]) -> Vec<Symbol> {
    names.iter().map(|s| sym(s)).collect()
}

fn config(strategy: Strategy, budget: f64) -> Config {
    Config {
        budget,
        strategy,
        ..Config::default()
    }
}

/// Serves records from a table; symbols not in the table are left out of
/// the response. Records every batch it was asked for.
#[derive(Default)]
struct StubProvider {
    table: HashMap<Symbol, QuoteRecord>,
    batches: Mutex<Vec<Vec<Symbol>>>,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
}

impl StubProvider {
    fn with(records: Vec<QuoteRecord>) -> Self {
        StubProvider {
            table: records.into_iter().map(|r| (r.symbol.clone(), r)).collect(),
            ..StubProvider::default()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QuoteFetcher for StubProvider {
    fn fetch<'a>(&'a self, batch: &'a [Symbol]) -> FetchFuture<'a> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches
            .lock()
            .expect("batch log lock")
            .push(batch.to_vec());
        Box::pin(async move {
            if self.fail_on_call == Some(call) {
                return Err(FetchError::Unavailable(String::from("HTTP 429")));
            }
            Ok(batch
                .iter()
                .filter_map(|s| self.table.get(s).map(|r| (s.clone(), r.clone())))
                .collect())
        })
    }
}

fn hqm(s: &str, price: f64, returns: [f64; 4]) -> QuoteRecord {
    let mut record = QuoteRecord::new(sym(s), price);
    for (horizon, value) in Horizon::ALL.iter().zip(returns) {
        record = record.with_return(*horizon, value);
    }
    record
}

#[tokio::test]
async fn equal_weight_splits_budget_across_two_stocks() {
    let provider = StubProvider::with(vec![
        QuoteRecord::new(sym("X"), 10.0).with_return(Horizon::OneYear, 0.5),
        QuoteRecord::new(sym("Y"), 20.0).with_return(Horizon::OneYear, -0.1),
    ]);

    let plan = pipeline::run(&config(Strategy::EqualWeight, 100.0), &symbols(&["X", "Y"]), &provider)
        .await
        .expect("run succeeds");

    assert_eq!(plan.position_size, 50.0);
    let shares: Vec<(&str, u64)> = plan
        .rows
        .iter()
        .map(|r| (r.row.record.symbol.as_str(), r.shares))
        .collect();
    assert_eq!(shares, vec![("X", 5), ("Y", 2)]);
    assert_eq!(plan.uninvested(), 10.0);
    assert!(plan.dropped.is_empty());
}

#[tokio::test]
async fn momentum_ranks_ties_at_the_top_percentile() {
    let provider = StubProvider::with(vec![
        QuoteRecord::new(sym("A"), 10.0).with_return(Horizon::OneYear, 0.1),
        QuoteRecord::new(sym("B"), 10.0).with_return(Horizon::OneYear, 0.2),
        QuoteRecord::new(sym("C"), 10.0).with_return(Horizon::OneYear, 0.3),
        QuoteRecord::new(sym("D"), 10.0).with_return(Horizon::OneYear, 0.3),
    ]);
    let cfg = Config {
        top_n: 4,
        ..config(Strategy::Momentum, 1_000.0)
    };

    let plan = pipeline::run(&cfg, &symbols(&["A", "B", "C", "D"]), &provider)
        .await
        .expect("run succeeds");

    let ranked: Vec<(&str, Option<f64>)> = plan
        .rows
        .iter()
        .map(|r| (r.row.record.symbol.as_str(), r.row.percentiles.one_year))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("C", Some(1.0)),
            ("D", Some(1.0)),
            ("B", Some(0.5)),
            ("A", Some(0.25)),
        ]
    );
}

#[tokio::test]
async fn symbol_missing_from_a_batch_is_dropped_and_reported() {
    let provider = StubProvider::with(vec![
        QuoteRecord::new(sym("AAA"), 10.0),
        QuoteRecord::new(sym("CCC"), 25.0),
    ]);

    let plan = pipeline::run(
        &config(Strategy::EqualWeight, 1_000.0),
        &symbols(&["AAA", "BBB", "CCC"]),
        &provider,
    )
    .await
    .expect("run succeeds with a smaller universe");

    assert_eq!(provider.call_count(), 1);
    assert_eq!(plan.rows.len(), 2);
    assert_eq!(plan.dropped.len(), 1);
    assert_eq!(plan.dropped[0].symbol, sym("BBB"));
    assert_eq!(plan.dropped[0].reason, DropReason::MissingFromBatch);
    assert_eq!(plan.position_size, 500.0);
}

#[tokio::test]
async fn non_positive_budget_fails_before_any_fetch() {
    let provider = StubProvider::with(vec![QuoteRecord::new(sym("X"), 10.0)]);

    for budget in [0.0, -250.0] {
        let result = pipeline::run(&config(Strategy::EqualWeight, budget), &symbols(&["X"]), &provider).await;
        assert!(matches!(
            result,
            Err(AllocError::Validation(ValidationError::NonPositiveBudget(_)))
        ));
    }
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn hqm_keeps_the_top_n_by_composite_score() {
    let provider = StubProvider::with(vec![
        hqm("STEADY", 50.0, [0.40, 0.20, 0.10, 0.05]),
        hqm("SPIKE", 80.0, [0.90, -0.10, -0.05, -0.02]),
        hqm("FLAT", 20.0, [0.01, 0.01, 0.00, 0.00]),
        hqm("LAGGARD", 5.0, [-0.30, -0.20, -0.10, -0.05]),
    ]);
    let cfg = Config {
        top_n: 2,
        ..config(Strategy::HighQualityMomentum, 1_000.0)
    };

    let plan = pipeline::run(&cfg, &symbols(&["STEADY", "SPIKE", "FLAT", "LAGGARD"]), &provider)
        .await
        .expect("run succeeds");

    let picked: Vec<&str> = plan.rows.iter().map(|r| r.row.record.symbol.as_str()).collect();
    assert_eq!(picked, vec!["STEADY", "FLAT"]);
    assert_eq!(plan.position_size, 500.0);
    assert_eq!(plan.rows[0].shares, 10);
    assert_eq!(plan.rows[1].shares, 25);
    for row in &plan.rows {
        for horizon in Horizon::ALL {
            let p = row.row.percentiles.get(horizon).expect("percentile present");
            assert!((0.0..=1.0).contains(&p));
        }
    }
}

#[tokio::test]
async fn incomplete_rows_are_dropped_before_ranking() {
    let provider = StubProvider::with(vec![
        hqm("GOOD", 10.0, [0.1, 0.1, 0.1, 0.1]),
        QuoteRecord::new(sym("PARTIAL"), 10.0)
            .with_return(Horizon::OneYear, 0.9)
            .with_return(Horizon::SixMonth, 0.9),
        hqm("FREE", 0.0, [0.5, 0.5, 0.5, 0.5]),
    ]);
    let cfg = config(Strategy::HighQualityMomentum, 100.0);

    let plan = pipeline::run(&cfg, &symbols(&["GOOD", "PARTIAL", "FREE"]), &provider)
        .await
        .expect("run succeeds");

    assert_eq!(plan.rows.len(), 1);
    assert_eq!(plan.rows[0].row.score, Some(1.0));
    let reasons: Vec<(&str, DropReason)> = plan
        .dropped
        .iter()
        .map(|d| (d.symbol.as_str(), d.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("PARTIAL", DropReason::MissingReturn { horizon: Horizon::ThreeMonth }),
            ("FREE", DropReason::InvalidPrice),
        ]
    );
}

#[tokio::test]
async fn failed_batch_aborts_the_run() {
    let names: Vec<String> = (0..5).map(|i| format!("S{i}")).collect();
    let records = names.iter().map(|n| QuoteRecord::new(sym(n), 1.0)).collect();
    let provider = StubProvider {
        fail_on_call: Some(1),
        ..StubProvider::with(records)
    };
    let cfg = Config {
        batch_size: 2,
        ..config(Strategy::EqualWeight, 100.0)
    };
    let universe: Vec<Symbol> = names.iter().map(|n| sym(n)).collect();

    let result = pipeline::run(&cfg, &universe, &provider).await;
    assert!(matches!(result, Err(AllocError::Fetch(FetchError::Unavailable(_)))));
}

#[tokio::test]
async fn every_symbol_is_requested_once_in_bounded_batches() {
    let names: Vec<String> = (0..250).map(|i| format!("T{i}")).collect();
    let universe: Vec<Symbol> = names.iter().map(|n| sym(n)).collect();
    let provider = StubProvider::with(universe.iter().map(|s| QuoteRecord::new(s.clone(), 3.0)).collect());
    let cfg = Config {
        max_concurrent_fetches: 4,
        ..config(Strategy::EqualWeight, 250_000.0)
    };

    let plan = pipeline::run(&cfg, &universe, &provider).await.expect("run succeeds");

    let batches = provider.batches.lock().expect("batch log lock");
    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(|b| b.len() <= 100));
    let mut requested = batches.concat();
    requested.sort();
    let mut expected = universe.clone();
    expected.sort();
    assert_eq!(requested, expected);

    let order: Vec<&Symbol> = plan.rows.iter().map(|r| &r.row.record.symbol).collect();
    assert_eq!(order, universe.iter().collect::<Vec<_>>());
    assert!(plan.rows.iter().all(|r| r.shares == 333));
}

#[tokio::test]
async fn all_symbols_dropped_is_a_validation_error() {
    let provider = StubProvider::default();
    let result = pipeline::run(&config(Strategy::EqualWeight, 100.0), &symbols(&["GONE"]), &provider).await;
    assert!(matches!(
        result,
        Err(AllocError::Validation(ValidationError::NoEligibleRows))
    ));
}
