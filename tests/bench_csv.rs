use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use coremax::bench::{BenchRow, run_dataset, run_one};
use coremax::search::config::SearchConfig;
use coremax::solver::Backend;
use coremax::solver::oracle::OraclePolicy;

#[test]
fn benchmark_csv_has_expected_shape() {
    let root = temp_dataset_dir("bench_csv_shape");
    fs::create_dir_all(&root).expect("mkdir");

    fs::write(root.join("pairs.wcnf"), "1 1 0\n1 -1 0\n1 2 0\n1 -2 0\n").expect("write wcnf");
    fs::write(root.join("easy.wcnf"), "p wcnf 2 3 5\n5 1 2 0\n1 1 0\n1 2 0\n")
        .expect("write wcnf");
    fs::write(root.join("notes.txt"), "not an instance\n").expect("write txt");

    let csv_path = root.join("results.csv");
    let cfg = SearchConfig {
        backend: Backend::Dpll,
        policy: OraclePolicy::Rebuild,
        ..SearchConfig::default()
    };
    let rows = run_dataset(&root, cfg, Duration::from_millis(10_000), &csv_path, false)
        .expect("run dataset");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cost, Some(0));
    assert_eq!(rows[1].cost, Some(2));

    let csv_text = fs::read_to_string(&csv_path).expect("read csv");
    let mut lines = csv_text.lines();
    let header = lines.next().unwrap_or("");
    assert_eq!(header, BenchRow::csv_header());
    let data = lines.collect::<Vec<_>>();
    assert_eq!(data.len(), 2);

    for line in &data {
        let cols = line.split(',').collect::<Vec<_>>();
        assert_eq!(cols.len(), 13);
        assert_eq!(cols[1], "ok");
        assert_eq!(cols[2], "dpll");
        assert_eq!(cols[3], "rebuild");
        cols[4].parse::<u128>().expect("wall_ms");
    }
}

#[test]
fn unparsable_file_is_reported_not_fatal() {
    let root = temp_dataset_dir("bench_csv_parse_error");
    fs::create_dir_all(&root).expect("mkdir");
    let path = root.join("broken.wcnf");
    fs::write(&path, "p wcnf 1 1 10\n7 1 0\n").expect("write wcnf");

    let row = run_one(&path, SearchConfig::default(), Duration::from_millis(10_000));
    assert_eq!(row.status, "parse_error");
    assert_eq!(row.cost, None);
    assert!(row.wall_ms.is_some());
}

fn temp_dataset_dir(tag: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    p.push(format!("coremax_{}_{}", tag, t));
    p
}
