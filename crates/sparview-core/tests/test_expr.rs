//! Expression Evaluator Tests
//!
//! Vocabulary dispatch, selection patterns, the tie-break callback,
//! the default-action record and the run-level error policy (first
//! failure aborts, earlier plot side effects stay).

use std::cell::RefCell;

use approx::assert_relative_eq;
use ndarray::{Array1, Array3};
use num_complex::Complex64;
use sparview_core::expr::{evaluate, DefaultAction, EvalContext, ExprError};
use sparview_core::frequency::{Frequency, FrequencyUnit, SweepType};
use sparview_core::plot::PlotData;
use sparview_core::Network;

fn two_port(name: &str, s21_mag: f64) -> Network {
    let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
    let mut s = Array3::<Complex64>::zeros((10, 2, 2));
    for f in 0..10 {
        let x = f as f64;
        s[[f, 0, 0]] = Complex64::from_polar(0.1, 0.1 * x);
        s[[f, 1, 1]] = Complex64::from_polar(0.12, -0.2 * x);
        let t = Complex64::from_polar(s21_mag, -0.4 * x);
        s[[f, 0, 1]] = t;
        s[[f, 1, 0]] = t;
    }
    let z0 = Array1::from_elem(2, Complex64::new(50.0, 0.0));
    Network::new(name, freq, s, z0).unwrap()
}

/// Run text against a stock context, returning the plotted traces.
fn run(text: &str) -> Result<(Vec<PlotData>, sparview_core::expr::EvalOutcome), ExprError> {
    let plotted = RefCell::new(Vec::new());
    let networks = vec![
        two_port("amp1", 0.9),
        two_port("amp2", 0.8),
        two_port("filter", 0.7),
    ];
    let mut ctx = EvalContext {
        available: networks.clone(),
        selected: networks[..2].to_vec(),
        plot: Box::new(|data| plotted.borrow_mut().push(data)),
        tiebreak: None,
    };
    let outcome = evaluate(text, &mut ctx)?;
    drop(ctx);
    Ok((plotted.into_inner(), outcome))
}

#[test]
fn select_transform_plot_chain() {
    let (plots, outcome) = run(r#"nws("amp*").s(2,1).db().plot()"#).unwrap();
    assert_eq!(plots.len(), 2);
    assert_eq!(plots[0].label, "amp1.S21 [dB]");
    assert_eq!(plots[1].label, "amp2.S21 [dB]");
    assert_relative_eq!(plots[0].y[0].re, 20.0 * 0.9_f64.log10(), epsilon = 1e-9);
    assert_eq!(outcome.plots_emitted, 2);
    // provenance tags flow through to the sink
    assert_eq!(plots[0].provenance.as_deref(), Some("amp1"));
}

#[test]
fn selection_patterns() {
    let (plots, _) = run(r#"nws().s(1,1).plot()"#).unwrap();
    assert_eq!(plots.len(), 3);

    let (plots, _) = run(r#"nws("filter").s(1,1).plot()"#).unwrap();
    assert_eq!(plots.len(), 1);

    let (plots, _) = run(r#"sel_nws().s(1,1).plot()"#).unwrap();
    assert_eq!(plots.len(), 2);

    let (plots, _) = run(r#"nws("a?p1").s(1,1).plot()"#).unwrap();
    assert_eq!(plots.len(), 1);
}

#[test]
fn ambiguous_single_selection_fails_without_tiebreak() {
    let err = run(r#"nw("amp*").s(2,1).plot()"#).unwrap_err();
    assert!(err.to_string().contains("ambiguous"), "got: {}", err);
}

#[test]
fn tiebreak_callback_resolves_ambiguity() {
    let plotted = RefCell::new(Vec::new());
    let networks = vec![two_port("amp1", 0.9), two_port("amp2", 0.8)];
    let mut ctx = EvalContext {
        available: networks.clone(),
        selected: networks.clone(),
        plot: Box::new(|data: PlotData| plotted.borrow_mut().push(data.label)),
        tiebreak: Some(Box::new(|_pattern, names| {
            names.iter().position(|n| n == "amp2")
        })),
    };
    evaluate(r#"nw("amp*").s(2,1).plot()"#, &mut ctx).unwrap();
    drop(ctx);
    assert_eq!(plotted.into_inner(), vec!["amp2.S21"]);
}

#[test]
fn arithmetic_broadcasting_in_expressions() {
    // normalize amp1's transmission by amp2's, then take dB
    let (plots, _) = run(
        r#"(nws("amp1").s(2,1) / nws("amp2").s(2,1)).db().plot()"#,
    )
    .unwrap();
    assert_eq!(plots.len(), 1);
    assert_relative_eq!(
        plots[0].y[0].re,
        20.0 * (0.9_f64 / 0.8).log10(),
        epsilon = 1e-9
    );
}

#[test]
fn scalar_broadcast_and_math_helpers() {
    let (plots, _) = run(r#"(2 * nws("amp1").s(2,1)).abs().plot()"#).unwrap();
    assert_relative_eq!(plots[0].y[0].re, 1.8, epsilon = 1e-12);

    let (plots, _) = run(r#"db(nws("amp1").s(2,1)).plot()"#).unwrap();
    assert_relative_eq!(plots[0].y[0].re, 20.0 * 0.9_f64.log10(), epsilon = 1e-9);
}

#[test]
fn component_factory_cascades_with_selection() {
    // a matched delay line leaves |S21| untouched
    let (plots, _) = run(r#"(sel_nws() ** tline(delay=1e-9)).s(2,1).abs().plot()"#).unwrap();
    assert_eq!(plots.len(), 2);
    assert_relative_eq!(plots[0].y[0].re, 0.9, epsilon = 1e-9);

    // a series resistor scales the thru path
    let (plots, _) = run(r#"nws("amp1").add_sr(50).s(2,1).abs().plot()"#).unwrap();
    assert_eq!(plots.len(), 1);
    assert!(plots[0].y[0].re < 0.9);
}

#[test]
fn network_inversion_operator() {
    let (plots, _) = run(r#"(nws("amp1") ** ~nws("amp1")).s(2,1).abs().plot()"#).unwrap();
    for v in &plots[0].y {
        assert_relative_eq!(v.re, 1.0, epsilon = 1e-7);
    }
}

#[test]
fn metric_vocabulary() {
    let (plots, _) = run(r#"sel_nws().k().plot(); sel_nws().mu(port=2).plot()"#).unwrap();
    assert_eq!(plots.len(), 4);
    assert!(plots[0].label.starts_with("K("));
    assert!(plots[2].label.starts_with("mu2("));

    let (plots, _) = run(r#"sel_nws().passivity().plot()"#).unwrap();
    assert_eq!(plots.len(), 2);
}

#[test]
fn quick_records_default_action() {
    let (plots, outcome) = run(r#"quick(21, "S11")"#).unwrap();
    // two parameters over two selected networks
    assert_eq!(plots.len(), 4);
    assert_eq!(
        outcome.default_action,
        Some(DefaultAction::Quick(vec![(1, 0), (0, 0)]))
    );

    // runs without quick() leave no default action
    let (_, outcome) = run(r#"sel_nws().s(1,1).plot()"#).unwrap();
    assert_eq!(outcome.default_action, None);
}

#[test]
fn first_failure_aborts_but_keeps_prior_side_effects() {
    // statement 1 plots, statement 2 fails, statement 3 never runs
    let text = r#"
sel_nws().s(2,1).plot()
nws("missing").s(2,1).mean().plot()
sel_nws().s(1,1).plot()
"#;
    let plotted = RefCell::new(0usize);
    let networks = vec![two_port("amp1", 0.9)];
    let mut ctx = EvalContext {
        available: networks.clone(),
        selected: networks,
        plot: Box::new(|_| *plotted.borrow_mut() += 1),
        tiebreak: None,
    };
    let err = evaluate(text, &mut ctx).unwrap_err();
    drop(ctx);

    match err {
        ExprError::Eval { statement, line, .. } => {
            assert_eq!(statement, 2);
            assert_eq!(line, 3);
        }
        other => panic!("expected an eval error, got {}", other),
    }
    // only the first statement's plot arrived
    assert_eq!(plotted.into_inner(), 1);
}

#[test]
fn unknown_names_are_unreachable() {
    assert!(run(r#"system("ls")"#).is_err());
    assert!(run(r#"no_such_ident"#).is_err());
    assert!(run(r#"nws().no_such_method()"#).is_err());
}

#[test]
fn syntax_errors_carry_position() {
    match run("nws(").unwrap_err() {
        ExprError::Syntax { line, .. } => assert_eq!(line, 1),
        other => panic!("expected a syntax error, got {}", other),
    }
}

#[test]
fn statistics_and_time_domain_vocabulary() {
    let (plots, _) = run(r#"sel_nws().s(2,1).mean().plot()"#).unwrap();
    assert_eq!(plots.len(), 1);
    assert!(plots[0].label.starts_with("mean"));

    let (plots, _) = run(r#"sel_nws().s(2,1).td(window="kaiser", param=6).plot()"#).unwrap();
    assert_eq!(plots.len(), 2);
    assert!(plots[0].label.contains("impulse"));
}

#[test]
fn bode_fano_returns_the_achievable_figure() {
    let (_, outcome) = run(r#"nws("amp1").s(1,1).bode_fano(1e9, 10e9, 2e9, 4e9)"#).unwrap();
    assert_eq!(outcome.statements_run, 1);
}

#[test]
fn circle_vocabulary_emits_closed_loops() {
    let (plots, _) = run(r#"sel_nws().stab_circle(5e9, "source").plot()"#).unwrap();
    assert_eq!(plots.len(), 2);
    let first = &plots[0].y;
    let n = first.len();
    assert_relative_eq!(first[0].re, first[n - 1].re, epsilon = 1e-12);
}

#[test]
fn mixed_mode_requires_four_ports_but_batch_tolerates() {
    // 2-ports cannot convert; the batch drops them and the plot emits
    // nothing, while the run itself succeeds
    let (plots, _) = run(r#"sel_nws().s2m().s(1,1).plot()"#).unwrap();
    assert_eq!(plots.len(), 0);
}
