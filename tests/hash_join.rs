//! # Hash Join Integration Tests
//!
//! Exercises the partitioned hash join through the public plan/scan API.
//!
//! ## Test Strategy
//!
//! 1. Create related tables (students and enrollments) in a catalog
//! 2. Insert rows with known matches, duplicates and orphans
//! 3. Join with the hash join and compare against the nested-loop join
//! 4. Repeat with a single bucket to force every row into one partition
//!
//! ## Usage
//!
//! ```sh
//! cargo test --test hash_join
//! ```

use relq::config::EngineConfig;
use relq::materialize::{HashJoinPlan, NestedJoinPlan};
use relq::query::{collect_rows, Plan, PlanRef, TablePlan};
use relq::storage::{Catalog, Transaction};
use relq::types::{Constant, Schema};
use relq::{query_error, QueryError};
use std::sync::Arc;

fn school(tx: &Transaction) -> Catalog {
    let catalog = Catalog::new();
    catalog
        .create_table(
            tx,
            "student",
            Schema::new().with_int("sid").with_string("sname", 10),
        )
        .unwrap();
    catalog
        .create_table(
            tx,
            "enroll",
            Schema::new().with_int("studentid").with_string("grade", 2),
        )
        .unwrap();

    for (sid, sname) in [(1, "a"), (2, "b"), (3, "c")] {
        catalog
            .insert_row("student", &[Constant::from(sid), Constant::from(sname)])
            .unwrap();
    }
    for (studentid, grade) in [(1, "A"), (1, "B"), (2, "C"), (4, "D")] {
        catalog
            .insert_row("enroll", &[Constant::from(studentid), Constant::from(grade)])
            .unwrap();
    }
    catalog
}

fn table(catalog: &Catalog, name: &str) -> PlanRef {
    Arc::new(TablePlan::new(catalog, name).unwrap())
}

fn pairs(plan: &dyn Plan, left: &str, right: &str) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = collect_rows(&mut plan.open().unwrap(), &[left, right])
        .unwrap()
        .into_iter()
        .map(|row| (row[0].to_string(), row[1].to_string()))
        .collect();
    rows.sort();
    rows
}

fn int_table(catalog: &Catalog, tx: &Transaction, name: &str, key: &str, keys: &[i64]) -> PlanRef {
    catalog
        .create_table(tx, name, Schema::new().with_int(key).with_int(format!("{}pos", key)))
        .unwrap();
    for (pos, k) in keys.iter().enumerate() {
        catalog
            .insert_row(name, &[Constant::from(*k), Constant::from(pos as i64)])
            .unwrap();
    }
    table(catalog, name)
}

fn joined_rows(plan: &dyn Plan) -> Vec<Vec<i64>> {
    let fields = ["lk", "lkpos", "rk", "rkpos"];
    let mut rows: Vec<Vec<i64>> = collect_rows(&mut plan.open().unwrap(), &fields)
        .unwrap()
        .into_iter()
        .map(|row| row.iter().map(|c| c.as_int().unwrap()).collect())
        .collect();
    rows.sort();
    rows
}

#[test]
fn student_enroll_join_matches_each_enrollment() {
    let tx = Transaction::default();
    let catalog = school(&tx);
    let plan = HashJoinPlan::new(
        &tx,
        table(&catalog, "student"),
        table(&catalog, "enroll"),
        "sid",
        "studentid",
    )
    .unwrap();

    let rows = collect_rows(&mut plan.open().unwrap(), &["sname"]).unwrap();
    let mut snames: Vec<String> = rows.iter().map(|r| r[0].as_str().unwrap().to_string()).collect();
    snames.sort();
    assert_eq!(snames, vec!["a", "a", "b"]);

    let graded = pairs(&plan, "sname", "grade");
    assert_eq!(
        graded,
        vec![
            ("a".to_string(), "A".to_string()),
            ("a".to_string(), "B".to_string()),
            ("b".to_string(), "C".to_string()),
        ]
    );
}

#[test]
fn hash_join_agrees_with_nested_loop_join() {
    let tx = Transaction::default();
    let catalog = Catalog::new();
    let left_keys: Vec<i64> = (0..250).map(|i| (i * 7) % 61 - 30).collect();
    let right_keys: Vec<i64> = (0..180).map(|i| (i * 13) % 47 - 10).collect();
    let left = int_table(&catalog, &tx, "l", "lk", &left_keys);
    let right = int_table(&catalog, &tx, "r", "rk", &right_keys);

    let hash = HashJoinPlan::new(&tx, Arc::clone(&left), Arc::clone(&right), "lk", "rk").unwrap();
    let nested = NestedJoinPlan::new(left, right, "lk", "rk").unwrap();

    let expected = joined_rows(&nested);
    let actual = joined_rows(&hash);
    assert!(expected.iter().any(|row| row[0] < 0));
    assert!(actual.iter().all(|row| row[0] == row[2]));
    assert_eq!(actual, expected);
}

#[test]
fn every_matching_pair_is_produced_once() {
    let tx = Transaction::new(EngineConfig::default().with_hash_buckets(1));
    let catalog = Catalog::new();
    let left = int_table(&catalog, &tx, "l", "lk", &[5, 5, 6, 7]);
    let right = int_table(&catalog, &tx, "r", "rk", &[5, 5, 5, 7, 8]);

    let plan = HashJoinPlan::new(&tx, left, right, "lk", "rk").unwrap();
    let mut positions: Vec<(i64, i64, i64)> =
        collect_rows(&mut plan.open().unwrap(), &["lkpos", "rkpos", "lk"])
            .unwrap()
            .into_iter()
            .map(|r| {
                (
                    r[0].as_int().unwrap(),
                    r[1].as_int().unwrap(),
                    r[2].as_int().unwrap(),
                )
            })
            .collect();
    positions.sort_unstable();

    // 2 left fives x 3 right fives, plus the single 7.
    assert_eq!(positions.len(), 7);
    positions.dedup();
    assert_eq!(positions.len(), 7);
    assert_eq!(positions.iter().filter(|(_, _, k)| *k == 5).count(), 6);
    assert_eq!(positions.iter().filter(|(_, _, k)| *k == 7).count(), 1);
}

#[test]
fn empty_side_yields_no_rows() {
    let tx = Transaction::default();
    let catalog = Catalog::new();
    let left = int_table(&catalog, &tx, "l", "lk", &[1, 2, 3]);
    let right = int_table(&catalog, &tx, "r", "rk", &[]);

    let plan = HashJoinPlan::new(&tx, left, right, "lk", "rk").unwrap();
    let mut scan = plan.open().unwrap();
    assert!(!scan.next().unwrap());
    scan.close().unwrap();
}

#[test]
fn string_keys_join_by_value() {
    let tx = Transaction::default();
    let catalog = school(&tx);
    catalog
        .create_table(
            &tx,
            "nickname",
            Schema::new().with_string("name", 10).with_string("nick", 10),
        )
        .unwrap();
    for (name, nick) in [("a", "ace"), ("c", "cat"), ("z", "zed")] {
        catalog
            .insert_row("nickname", &[Constant::from(name), Constant::from(nick)])
            .unwrap();
    }

    let plan = HashJoinPlan::new(
        &tx,
        table(&catalog, "student"),
        table(&catalog, "nickname"),
        "sname",
        "name",
    )
    .unwrap();
    assert_eq!(
        pairs(&plan, "sname", "nick"),
        vec![
            ("a".to_string(), "ace".to_string()),
            ("c".to_string(), "cat".to_string()),
        ]
    );
}

#[test]
fn mismatched_key_kinds_are_rejected() {
    let tx = Transaction::default();
    let catalog = school(&tx);
    let err = HashJoinPlan::new(
        &tx,
        table(&catalog, "student"),
        table(&catalog, "enroll"),
        "sid",
        "grade",
    )
    .err()
    .unwrap();
    assert!(matches!(
        query_error(&err),
        Some(QueryError::TypeMismatch { .. })
    ));
}
