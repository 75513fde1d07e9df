use std::cell::RefCell;
use std::rc::Rc;

use rollscope::{CellValue, Computation, GraphBuilder, GraphError, ScopeError};

fn int(v: &CellValue) -> i64 {
    v.as_int().unwrap_or(0)
}

/// Records the order in which computations run.
fn traced(name: &'static str, inputs: &[&'static str], output: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Computation {
    let log = Rc::clone(log);
    Computation::builder(name)
        .reads(inputs.iter().copied())
        .writes([output])
        .compute(move |values| {
            log.borrow_mut().push(name);
            Ok(vec![CellValue::Int(values.iter().map(|v| int(v)).sum::<i64>() + 1)])
        })
}

#[test]
fn diamond_runs_each_computation_once_per_wave() {
    let log = Rc::new(RefCell::new(Vec::new()));
    //      s
    //    /   \
    //   a     b
    //    \   /
    //      j --> k
    let mut engine = GraphBuilder::new()
        .source_cell("s", CellValue::Int(0))
        .register(traced("k", &["j_out"], "k_out", &log))
        .register(traced("j", &["a_out", "b_out"], "j_out", &log))
        .register(traced("b", &["s"], "b_out", &log))
        .register(traced("a", &["s"], "a_out", &log))
        .build()
        .unwrap();

    let report = engine.write([("s", CellValue::Int(10))]).unwrap();
    assert_eq!(*log.borrow(), vec!["b", "a", "j", "k"]);
    assert_eq!(report.executed.len(), 4);
    // a = b = 11, j = 23, k = 24
    assert_eq!(engine.value("k_out"), Some(&CellValue::Int(24)));

    log.borrow_mut().clear();
    engine.write([("s", CellValue::Int(0))]).unwrap();
    assert_eq!(log.borrow().len(), 4);
    assert_eq!(engine.execution_count("j"), Some(2));
}

#[test]
fn cycle_is_fatal_before_anything_runs() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let result = GraphBuilder::new()
        .source_cell("s", CellValue::Int(0))
        .register(traced("static", &[], "k", &log))
        .register(traced("x", &["s", "z_out"], "x_out", &log))
        .register(traced("y", &["x_out"], "y_out", &log))
        .register(traced("z", &["y_out"], "z_out", &log))
        .build();

    let err: ScopeError = result.unwrap_err().into();
    assert!(err.is_cycle());
    assert!(err.is_fatal());
    match err {
        ScopeError::Graph(GraphError::CycleDetected { computations }) => {
            assert_eq!(computations, vec!["x", "y", "z"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(log.borrow().is_empty());
}

#[test]
fn multi_output_commit_is_atomic_and_cascades() {
    let mut engine = GraphBuilder::new()
        .source_cell("n", CellValue::Int(1))
        .register(
            Computation::builder("split")
                .reads(["n"])
                .writes(["double", "triple"])
                .compute(|v| Ok(vec![CellValue::Int(int(v[0]) * 2), CellValue::Int(int(v[0]) * 3)])),
        )
        .register(
            Computation::builder("join")
                .reads(["double", "triple"])
                .writes(["sum"])
                .compute(|v| Ok(vec![CellValue::Int(int(v[0]) + int(v[1]))])),
        )
        .build()
        .unwrap();

    let report = engine.write([("n", CellValue::Int(4))]).unwrap();
    assert_eq!(report.executed, vec!["split", "join"]);
    assert_eq!(engine.value("sum"), Some(&CellValue::Int(20)));
    assert_eq!(engine.version("double"), engine.version("triple"));
    assert!(report.touched("sum"));
}

#[test]
fn write_to_unknown_cell_is_rejected() {
    let mut engine = GraphBuilder::new()
        .source_cell("s", CellValue::Empty)
        .build()
        .unwrap();
    assert!(matches!(
        engine.write([("missing", CellValue::Int(1))]),
        Err(GraphError::UnknownCell { .. })
    ));
    assert_eq!(engine.source_cells(), vec!["s"]);
}

#[test]
fn waves_are_identified_and_counted() {
    let mut engine = GraphBuilder::new()
        .source_cell("s", CellValue::Int(0))
        .build()
        .unwrap();
    let first = engine.write([("s", CellValue::Int(1))]).unwrap();
    let second = engine.write([("s", CellValue::Int(2))]).unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.seeds, vec!["s".to_string()]);
    // Build-time wave plus two writes.
    assert_eq!(engine.wave_count(), 3);
    assert!(engine.cell("s").unwrap().updated_at().is_some());
}
