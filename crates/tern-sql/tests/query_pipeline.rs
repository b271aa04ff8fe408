//! End-to-end pipeline tests: bind statements against a catalog, wire
//! operators, and pull rows under a transaction.

use std::sync::Arc;

use tern_common::{TernError, TernResult};
use tern_sql::ast::{DeleteAst, OrderByAst, SelectAst, SqlExpr, UpdateAst};
use tern_sql::expr::{CellSpec, ComparisonOp};
use tern_sql::operator::{IndexScanOperator, PhysicalOperator};
use tern_sql::stmt::{DeleteStmt, SelectStmt, UpdateStmt};
use tern_sql::storage::{Db, FieldMeta, IndexMeta, Record, Table, TableSchema};
use tern_sql::txn::{AccessMode, Transaction, VacuousTxn};
use tern_sql::value::{AttrType, Value};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// `students(id INT, name CHAR, score FLOAT)` with NULL scores and a
/// score tie.
fn students_db() -> (Db, Arc<Table>) {
    let db = Db::new("test");
    let table = db
        .create_table(
            "students",
            TableSchema::new(vec![
                FieldMeta::new("id", AttrType::Int),
                FieldMeta::new("name", AttrType::Char),
                FieldMeta::new("score", AttrType::Float),
            ]),
        )
        .unwrap();
    for (id, name, score) in [
        (1, "dana", Some(70.0f32)),
        (2, "abel", None),
        (3, "cole", Some(90.0)),
        (4, "bria", Some(70.0)),
        (5, "elle", None),
    ] {
        table
            .insert_row(vec![
                Value::int(id),
                Value::chars(name),
                score.map_or(Value::Null, Value::float),
            ])
            .unwrap();
    }
    (db, table)
}

fn pull_rows(operator: &mut dyn PhysicalOperator) -> Vec<Vec<Value>> {
    operator.open(Arc::new(VacuousTxn::new())).unwrap();
    let mut rows = Vec::new();
    while operator.next().unwrap() {
        let tuple = operator.current_tuple().unwrap();
        rows.push(
            (0..tuple.cell_count())
                .map(|i| tuple.cell_at(i).unwrap())
                .collect(),
        );
    }
    operator.close().unwrap();
    rows
}

#[test]
fn select_order_by_desc_with_nulls_and_ties() {
    init_logging();
    let (db, _table) = students_db();

    // SELECT name, score FROM students ORDER BY score DESC, name ASC
    let ast = SelectAst {
        expressions: vec![SqlExpr::field("name"), SqlExpr::field("score")],
        relations: vec![tern_sql::ast::JoinGroupAst {
            relations: vec!["students".to_string()],
            conditions: vec![],
        }],
        order_by: vec![
            OrderByAst {
                ascending: false,
                expr: SqlExpr::field("score"),
            },
            OrderByAst {
                ascending: true,
                expr: SqlExpr::field("name"),
            },
        ],
        ..Default::default()
    };
    let stmt = SelectStmt::bind(&db, &ast).unwrap();
    let mut operator = stmt.build_operator().unwrap();
    let rows = pull_rows(operator.as_mut());

    let names: Vec<String> = rows.iter().map(|row| row[0].to_string()).collect();
    // Non-null rows strictly descending by score, the 70.0 tie broken
    // ascending by name, NULL scores last under a descending key and
    // themselves ordered ascending by name.
    assert_eq!(names, vec!["cole", "bria", "dana", "abel", "elle"]);
    assert!(rows[3][1].is_null() && rows[4][1].is_null());
}

#[test]
fn select_ascending_null_placement() {
    init_logging();
    let (db, _table) = students_db();

    let ast = SelectAst {
        expressions: vec![SqlExpr::field("id")],
        relations: vec![tern_sql::ast::JoinGroupAst {
            relations: vec!["students".to_string()],
            conditions: vec![],
        }],
        order_by: vec![OrderByAst {
            ascending: true,
            expr: SqlExpr::field("score"),
        }],
        ..Default::default()
    };
    let stmt = SelectStmt::bind(&db, &ast).unwrap();
    let mut operator = stmt.build_operator().unwrap();
    let rows = pull_rows(operator.as_mut());

    let ids: Vec<i32> = rows.iter().map(|row| row[0].get_int()).collect();
    // NULL keys sort ahead of every non-null key when ascending,
    // preserving input order among themselves
    assert_eq!(ids, vec![2, 5, 1, 4, 3]);
}

#[test]
fn select_with_filter_projects_expressions() {
    init_logging();
    let (db, _table) = students_db();

    // SELECT name FROM students WHERE score >= 70
    let ast = SelectAst {
        expressions: vec![SqlExpr::field("name")],
        relations: vec![tern_sql::ast::JoinGroupAst {
            relations: vec!["students".to_string()],
            conditions: vec![],
        }],
        condition: Some(SqlExpr::comparison(
            ComparisonOp::GreaterEqual,
            SqlExpr::field("score"),
            SqlExpr::literal(Value::float(70.0)),
        )),
        ..Default::default()
    };
    let stmt = SelectStmt::bind(&db, &ast).unwrap();
    let mut operator = stmt.build_operator().unwrap();
    let rows = pull_rows(operator.as_mut());

    // NULL scores never satisfy the comparison
    let names: Vec<String> = rows.iter().map(|row| row[0].to_string()).collect();
    assert_eq!(names, vec!["dana", "cole", "bria"]);
}

#[test]
fn sort_output_resolvable_by_qualified_name() {
    init_logging();
    let (db, _table) = students_db();

    let ast = SelectAst {
        expressions: vec![SqlExpr::field("name"), SqlExpr::field("score")],
        relations: vec![tern_sql::ast::JoinGroupAst {
            relations: vec!["students".to_string()],
            conditions: vec![],
        }],
        order_by: vec![OrderByAst {
            ascending: true,
            expr: SqlExpr::field("id"),
        }],
        ..Default::default()
    };
    let stmt = SelectStmt::bind(&db, &ast).unwrap();
    let mut operator = stmt.build_operator().unwrap();
    operator.open(Arc::new(VacuousTxn::new())).unwrap();
    assert!(operator.next().unwrap());
    {
        let tuple = operator.current_tuple().unwrap();
        assert_eq!(
            tuple.find_cell(&CellSpec::new("students", "name")).unwrap(),
            Value::chars("dana")
        );
    }
    operator.close().unwrap();
}

#[test]
fn update_then_select_sees_coerced_values() {
    init_logging();
    let (db, table) = students_db();

    // UPDATE students SET score = 100 WHERE name = 'abel'
    let ast = UpdateAst {
        table: "students".to_string(),
        assignments: vec![("score".to_string(), Value::int(100))],
        condition: Some(SqlExpr::comparison(
            ComparisonOp::Equal,
            SqlExpr::field("name"),
            SqlExpr::literal(Value::chars("abel")),
        )),
    };
    let stmt = UpdateStmt::bind(&db, &ast).unwrap();
    let mut operator = stmt.build_operator();
    operator.open(Arc::new(VacuousTxn::new())).unwrap();
    assert!(!operator.next().unwrap());
    operator.close().unwrap();

    let handler = table.record_handler();
    let rows: Vec<Record> = handler
        .row_ids()
        .into_iter()
        .map(|rid| handler.get_record(rid).unwrap())
        .collect();
    assert_eq!(rows.len(), 5);
    let abel = rows
        .iter()
        .find(|r| r.value_at(1) == Some(&Value::chars("abel")))
        .unwrap();
    // INT literal coerced to the FLOAT column
    assert_eq!(abel.value_at(2), Some(&Value::Float(100.0)));
}

#[test]
fn delete_shrinks_table() {
    init_logging();
    let (db, table) = students_db();

    let ast = DeleteAst {
        table: "students".to_string(),
        condition: Some(SqlExpr::comparison(
            ComparisonOp::Less,
            SqlExpr::field("id"),
            SqlExpr::literal(Value::int(3)),
        )),
    };
    let stmt = DeleteStmt::bind(&db, &ast).unwrap();
    let mut operator = stmt.build_operator();
    operator.open(Arc::new(VacuousTxn::new())).unwrap();
    operator.close().unwrap();

    assert_eq!(table.record_handler().len(), 3);
}

/// Visibility stub: hides a fixed id set, records every visit.
struct HidingTxn {
    invisible: Vec<i32>,
    visited: parking_lot::Mutex<Vec<i32>>,
}

impl Transaction for HidingTxn {
    fn visit_record(&self, _table: &Table, record: &Record, _mode: AccessMode) -> TernResult<()> {
        let id = record.value_at(0).unwrap().get_int();
        self.visited.lock().push(id);
        if self.invisible.contains(&id) {
            return Err(TernError::RecordInvisible);
        }
        Ok(())
    }

    fn delete_record(&self, _table: &Table, _record: &Record) -> TernResult<()> {
        unimplemented!("read-only stub")
    }

    fn insert_record(&self, _table: &Table, _record: Record) -> TernResult<()> {
        unimplemented!("read-only stub")
    }
}

#[test]
fn index_scan_respects_predicates_and_visibility() {
    init_logging();
    let (_db, table) = students_db();
    let index = table
        .create_index(IndexMeta::new("idx_score", vec!["score".to_string()], false).unwrap())
        .unwrap();

    let txn = Arc::new(HidingTxn {
        invisible: vec![4],
        visited: parking_lot::Mutex::new(Vec::new()),
    });

    // score >= 70, residual predicate name <> 'dana', id 4 invisible
    let residual = tern_sql::expr::Expression::Comparison(tern_sql::expr::ComparisonExpr::new(
        ComparisonOp::NotEqual,
        tern_sql::expr::Expression::Field(tern_sql::expr::FieldExpr::new(
            "students",
            "name",
            AttrType::Char,
        )),
        tern_sql::expr::Expression::Value(tern_sql::expr::ValueExpr::new(Value::chars("dana"))),
    ));
    let mut scan = IndexScanOperator::new(Arc::clone(&table), index, AccessMode::ReadOnly)
        .with_bounds(Some(Value::float(70.0)), true, None, false)
        .with_predicates(vec![residual]);

    scan.open(txn.clone()).unwrap();
    let mut ids = Vec::new();
    while scan.next().unwrap() {
        ids.push(scan.current_record().unwrap().value_at(0).unwrap().get_int());
    }
    scan.close().unwrap();

    // dana (filtered) never reached visibility; bria (invisible) was
    // skipped without ending the scan; cole survives
    assert_eq!(ids, vec![3]);
    assert_eq!(*txn.visited.lock(), vec![4, 3]);
}
