//! Interpreter over the typed API surface
//!
//! Dispatches the parsed method-chain AST against the fixed
//! vocabulary: network selection, quick-plot shortcuts, the component
//! factories, math helpers and the curve/network methods. Anything
//! outside this table is unreachable from user text.

use anyhow::{anyhow, bail, Result};
use num_complex::Complex64;
use regex::Regex;
use tracing::info;

use super::parser::{parse, Arg, BinaryOp, Expr, UnaryOp};
use super::ExprError;
use crate::analysis::{
    bode_fano, circle_curve, Band, GainKind, ResponseKind, StabilitySide, TimeDomainOptions,
    Window, WindowKind,
};
use crate::components::{Component, ComponentSpec, LineSpec, PhaseLine, PhysicalLine, RlgcLine, Topology};
use crate::curve::{CurveOp, CurveSet, PhaseOptions};
use crate::frequency::SweepType;
use crate::network::{HalfMethod, LosslessKind, Network, NetworkSet};
use crate::plot::{PlotData, PlotStyle};

/// A value flowing through expression evaluation.
#[derive(Clone)]
pub enum Value {
    Num(f64),
    Str(String),
    Curves(CurveSet),
    Nets(NetworkSet),
    Component(Component),
    Null,
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Curves(_) => "curves",
            Value::Nets(_) => "networks",
            Value::Component(_) => "component",
            Value::Null => "null",
        }
    }
}

/// The most recent implicit plotting action of a run, recorded so
/// surrounding tooling can re-plot the current selection without
/// re-parsing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultAction {
    /// `quick(...)` with the recorded 0-based (to, from) pairs
    Quick(Vec<(usize, usize)>),
}

/// Caller-supplied context, rebound before each run.
pub struct EvalContext<'a> {
    /// All networks the surrounding tool has loaded
    pub available: Vec<Network>,
    /// The subset currently selected in the surrounding tool
    pub selected: Vec<Network>,
    /// Rendering callback for `plot()` side effects
    pub plot: Box<dyn FnMut(PlotData) + 'a>,
    /// Optional interactive tie-break for ambiguous `nw()` patterns:
    /// receives the pattern and candidate names, returns an index
    pub tiebreak: Option<Box<dyn Fn(&str, &[String]) -> Option<usize> + 'a>>,
}

/// What a finished run reports back.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    /// Statements executed (equals the statement count on success)
    pub statements_run: usize,
    /// Plot callback invocations emitted
    pub plots_emitted: usize,
    /// Most recent default plotting action, per-run scoped
    pub default_action: Option<DefaultAction>,
}

/// Evaluate expression text against a context.
///
/// Statements run top to bottom; the first failure aborts the run and
/// is reported with its statement number and line. Plot side effects
/// emitted before the failure are not rolled back.
pub fn evaluate(text: &str, ctx: &mut EvalContext<'_>) -> Result<EvalOutcome, ExprError> {
    let statements = parse(text)?;

    let mut ev = Evaluator {
        ctx,
        plots_emitted: 0,
        default_action: None,
    };

    for (idx, stmt) in statements.iter().enumerate() {
        ev.eval(&stmt.expr).map_err(|source| ExprError::Eval {
            statement: idx + 1,
            line: stmt.line,
            source,
        })?;
    }

    Ok(EvalOutcome {
        statements_run: statements.len(),
        plots_emitted: ev.plots_emitted,
        default_action: ev.default_action,
    })
}

struct Evaluator<'a, 'b> {
    ctx: &'b mut EvalContext<'a>,
    plots_emitted: usize,
    default_action: Option<DefaultAction>,
}

impl Evaluator<'_, '_> {
    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(v) => Ok(Value::Num(*v)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Ident(name) => match name.as_str() {
                "pi" => Ok(Value::Num(std::f64::consts::PI)),
                _ => bail!("unknown name '{}'", name),
            },
            Expr::Call { name, args } => {
                let args = self.eval_args(args)?;
                self.call_global(name, args)
            }
            Expr::Method { recv, name, args } => {
                let receiver = self.eval(recv)?;
                let args = self.eval_args(args)?;
                self.call_method(receiver, name, args)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                self.unary(*op, value)
            }
            Expr::Binary { op, lhs, rhs } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                self.binary(*op, l, r)
            }
        }
    }

    fn eval_args(&mut self, args: &[Arg]) -> Result<Args> {
        let mut out = Args::default();
        for arg in args {
            let value = self.eval(&arg.value)?;
            match &arg.name {
                Some(name) => out.named.push((name.clone(), value)),
                None => out.positional.push(value),
            }
        }
        Ok(out)
    }

    // ------------------------------------------------------------
    // Global vocabulary
    // ------------------------------------------------------------

    fn call_global(&mut self, name: &str, args: Args) -> Result<Value> {
        match name {
            "nws" => {
                let pattern = args.opt_str(0, "pattern")?;
                Ok(Value::Nets(select(
                    &self.ctx.available,
                    pattern.as_deref(),
                )?))
            }
            "sel_nws" => {
                let pattern = args.opt_str(0, "pattern")?;
                Ok(Value::Nets(select(&self.ctx.selected, pattern.as_deref())?))
            }
            "nw" => {
                let pattern = args.req_str(0, "pattern", name)?;
                self.select_single(&pattern)
            }
            "quick" => self.quick(args),
            "map" => self.map_sets(args),

            // component factories
            "res" => Ok(component(ComponentSpec::Resistor {
                ohms: args.req_num(0, "ohms", name)?,
            })),
            "ind" => Ok(component(ComponentSpec::Inductor {
                henries: args.req_num(0, "henries", name)?,
            })),
            "cap" => Ok(component(ComponentSpec::Capacitor {
                farads: args.req_num(0, "farads", name)?,
            })),
            "shifter" => Ok(component(ComponentSpec::PhaseShifter {
                degrees: args.req_num(0, "degrees", name)?,
            })),
            "thru" => Ok(component(ComponentSpec::Thru)),
            "isolator" => Ok(component(ComponentSpec::Isolator)),
            "term" => {
                let re = args.req_num(0, "re", name)?;
                let im = args.opt_num(1, "im")?.unwrap_or(0.0);
                Ok(component(ComponentSpec::Termination {
                    z: Complex64::new(re, im),
                }))
            }
            "tline" => Ok(component(ComponentSpec::Line(line_spec_from(&args)?))),

            _ => {
                if let Some(f) = unary_math(name) {
                    return apply_math(name, f, args);
                }
                bail!("unknown function '{}'", name)
            }
        }
    }

    fn select_single(&mut self, pattern: &str) -> Result<Value> {
        let matched = select(&self.ctx.available, Some(pattern))?;
        match matched.len() {
            0 => bail!("no network matches '{}'", pattern),
            1 => Ok(Value::Nets(matched)),
            _ => {
                let names: Vec<String> =
                    matched.iter().map(|n| n.name.clone()).collect();
                if let Some(tiebreak) = &self.ctx.tiebreak {
                    if let Some(idx) = tiebreak(pattern, &names) {
                        let picked = matched
                            .items()
                            .get(idx)
                            .ok_or_else(|| anyhow!("tie-break index {} out of range", idx))?;
                        return Ok(Value::Nets(NetworkSet::from_network(picked.clone())));
                    }
                }
                bail!(
                    "pattern '{}' is ambiguous: matches {}",
                    pattern,
                    names.join(", ")
                )
            }
        }
    }

    /// `quick(21, "S11", ...)`: plot the dB magnitude of the given
    /// parameters of the current selection, and record the call as the
    /// run's default action.
    fn quick(&mut self, args: Args) -> Result<Value> {
        if args.positional.is_empty() {
            bail!("quick() needs at least one parameter like 21 or \"S21\"");
        }
        let mut params = Vec::new();
        for value in &args.positional {
            params.push(parse_sparam(value)?);
        }

        let selection = NetworkSet::new(self.ctx.selected.clone());
        for &(to, from) in &params {
            let curves = selection.s_curves(to, from).db();
            self.emit(&curves, PlotStyle::default());
        }

        self.default_action = Some(DefaultAction::Quick(params));
        Ok(Value::Null)
    }

    /// `map(name, set)` / `map(name, a, b)`: the generic broadcasting
    /// map over one or two curve sets.
    fn map_sets(&mut self, args: Args) -> Result<Value> {
        let name = args.req_str(0, "function", "map")?;
        match (args.positional.get(1), args.positional.get(2)) {
            (Some(Value::Curves(a)), None) => {
                let f = unary_math(&name)
                    .ok_or_else(|| anyhow!("unknown map function '{}'", name))?;
                Ok(Value::Curves(a.map_values(|_, v| f(v))))
            }
            (Some(Value::Curves(a)), Some(Value::Curves(b))) => {
                let op = match name.as_str() {
                    "add" => CurveOp::Add,
                    "sub" => CurveOp::Sub,
                    "mul" => CurveOp::Mul,
                    "div" => CurveOp::Div,
                    "pow" => CurveOp::Pow,
                    _ => bail!("unknown binary map function '{}'", name),
                };
                Ok(Value::Curves(a.binary(b, op)?))
            }
            _ => bail!("map() expects a function name and one or two curve sets"),
        }
    }

    // ------------------------------------------------------------
    // Methods
    // ------------------------------------------------------------

    fn call_method(&mut self, receiver: Value, name: &str, args: Args) -> Result<Value> {
        match receiver {
            Value::Nets(nets) => self.net_method(nets, name, args),
            Value::Curves(curves) => self.curve_method(curves, name, args),
            other => {
                if let Some(f) = unary_math(name) {
                    return apply_math(name, f, Args::single(other));
                }
                bail!("no method '{}' on a {}", name, other.type_name())
            }
        }
    }

    fn net_method(&mut self, nets: NetworkSet, name: &str, args: Args) -> Result<Value> {
        match name {
            "s" => {
                let (to, from) = match (args.positional.first(), args.positional.get(1)) {
                    (Some(a), Some(b)) => {
                        let to = num_of(a, "s() port")? as usize;
                        let from = num_of(b, "s() port")? as usize;
                        if to == 0 || from == 0 {
                            bail!("s() ports are 1-based");
                        }
                        (to - 1, from - 1)
                    }
                    (Some(a), None) => parse_sparam(a)?,
                    _ => bail!("s() needs a parameter like s(2,1) or s(21)"),
                };
                Ok(Value::Curves(nets.s_curves(to, from)))
            }
            "k" => Ok(Value::Curves(nets.stability_k())),
            "mu" => {
                let port = args.opt_num(0, "port")?.unwrap_or(1.0) as usize;
                Ok(Value::Curves(nets.stability_mu(port)))
            }
            "passivity" => Ok(Value::Curves(nets.passivity())),
            "reciprocity" => Ok(Value::Curves(nets.reciprocity_error())),
            "losslessness" => {
                let kind = match args.opt_str(0, "kind")?.as_deref() {
                    None | Some("diag") => LosslessKind::Diagonal,
                    Some("offdiag") => LosslessKind::OffDiagonal,
                    Some(other) => bail!("losslessness kind must be 'diag' or 'offdiag', got '{}'", other),
                };
                Ok(Value::Curves(nets.losslessness_error(kind)))
            }
            "invert" => Ok(Value::Nets(nets.inverted())),
            "flip" => Ok(Value::Nets(nets.flipped())),
            "half" => {
                let method = match args.opt_str(0, "method")?.as_deref() {
                    None | Some("deembed") => HalfMethod::Deembed,
                    Some("midpoint") => HalfMethod::Midpoint,
                    Some(other) => bail!("half method must be 'deembed' or 'midpoint', got '{}'", other),
                };
                Ok(Value::Nets(nets.halved(method)))
            }
            "renorm" => {
                let re = args.req_num(0, "z0", name)?;
                let im = args.opt_num(1, "im")?.unwrap_or(0.0);
                Ok(Value::Nets(nets.renormalized(Complex64::new(re, im))))
            }
            "s2m" => Ok(Value::Nets(nets.to_mixed_mode())),
            "m2s" => Ok(Value::Nets(nets.from_mixed_mode())),

            // lumped insertion: add_<s|p><r|l|c|z>(value, port=1)
            "add_sr" | "add_sl" | "add_sc" | "add_pr" | "add_pl" | "add_pc" | "add_sz"
            | "add_pz" => {
                let topology = if name.as_bytes()[4] == b's' {
                    Topology::Series
                } else {
                    Topology::Shunt
                };
                let (spec, port_arg) = match &name[5..] {
                    "r" => (
                        ComponentSpec::Resistor {
                            ohms: args.req_num(0, "ohms", name)?,
                        },
                        1,
                    ),
                    "l" => (
                        ComponentSpec::Inductor {
                            henries: args.req_num(0, "henries", name)?,
                        },
                        1,
                    ),
                    "c" => (
                        ComponentSpec::Capacitor {
                            farads: args.req_num(0, "farads", name)?,
                        },
                        1,
                    ),
                    "z" => (
                        ComponentSpec::Termination {
                            z: Complex64::new(
                                args.req_num(0, "re", name)?,
                                args.opt_num(1, "im")?.unwrap_or(0.0),
                            ),
                        },
                        2,
                    ),
                    _ => unreachable!(),
                };
                let port = args
                    .opt_num(port_arg, "port")?
                    .unwrap_or(1.0) as usize;
                if port == 0 {
                    bail!("{} port is 1-based", name);
                }
                Ok(Value::Nets(nets.with_element(port - 1, topology, &spec)))
            }
            "add_tl" => {
                let spec = ComponentSpec::Line(line_spec_from(&args)?);
                let port = args.named_num("port")?.unwrap_or(1.0) as usize;
                if port == 0 {
                    bail!("add_tl port is 1-based");
                }
                Ok(Value::Nets(nets.with_element(port - 1, Topology::Series, &spec)))
            }
            "terminate" => {
                let re = args.req_num(0, "re", name)?;
                let im = args.opt_num(1, "im")?.unwrap_or(0.0);
                let port = args.opt_num(2, "port")?.unwrap_or(2.0) as usize;
                if port == 0 {
                    bail!("terminate port is 1-based");
                }
                Ok(Value::Nets(
                    nets.terminated(port - 1, Complex64::new(re, im)),
                ))
            }

            "stab_circle" => {
                let f_hz = args.req_num(0, "frequency", name)?;
                let side = match args.opt_str(1, "side")?.as_deref() {
                    None | Some("load") => StabilitySide::Load,
                    Some("source") => StabilitySide::Source,
                    Some(other) => bail!("stability side must be 'load' or 'source', got '{}'", other),
                };
                let n = args.named_num("n")?.unwrap_or(91.0) as usize;
                let curves = nets.map_tolerant_curves("stability circle", |ntwk| {
                    let circle = ntwk.stability_circle(f_hz, side)?;
                    circle_curve(
                        format!("stability({})", ntwk.name),
                        circle.center,
                        circle.radius,
                        n,
                    )
                });
                Ok(Value::Curves(curves))
            }
            "gain_circle" => {
                let gain_db = args.req_num(0, "gain_db", name)?;
                let f_hz = args.req_num(1, "frequency", name)?;
                let kind = match args.opt_str(2, "kind")?.as_deref() {
                    None | Some("operating") => GainKind::Operating,
                    Some("available") => GainKind::Available,
                    Some(other) => bail!("gain kind must be 'operating' or 'available', got '{}'", other),
                };
                let n = args.named_num("n")?.unwrap_or(91.0) as usize;
                let gain = 10.0_f64.powf(gain_db / 10.0);
                let curves = nets.map_tolerant_curves("gain circle", |ntwk| {
                    let circle = ntwk.gain_circle(f_hz, gain, kind)?;
                    circle_curve(
                        format!("gain {:.1} dB({})", gain_db, ntwk.name),
                        circle.center,
                        circle.radius,
                        n,
                    )
                });
                Ok(Value::Curves(curves))
            }
            "noise_circle" => {
                let nf_db = args.req_num(0, "nf_db", name)?;
                let f_hz = args.req_num(1, "frequency", name)?;
                let n = args.named_num("n")?.unwrap_or(91.0) as usize;
                let curves = nets.map_tolerant_curves("noise circle", |ntwk| {
                    let circle = ntwk.noise_circle(f_hz, nf_db)?;
                    circle_curve(
                        format!("NF {:.2} dB({})", nf_db, ntwk.name),
                        circle.center,
                        circle.radius,
                        n,
                    )
                });
                Ok(Value::Curves(curves))
            }

            "save" => {
                let path = args.req_str(0, "path", name)?;
                match nets.len() {
                    0 => bail!("save() on an empty selection"),
                    1 => {
                        nets.items()[0].save(&path)?;
                        Ok(Value::Null)
                    }
                    n => bail!("save() expects a single network, selection has {}", n),
                }
            }

            _ => bail!("no method '{}' on networks", name),
        }
    }

    fn curve_method(&mut self, curves: CurveSet, name: &str, args: Args) -> Result<Value> {
        match name {
            "db" => Ok(Value::Curves(curves.db())),
            "abs" | "mag" => Ok(Value::Curves(curves.mag())),
            "phase" => {
                let unwrap = args.flag("unwrap")? || args.flag("detrend")?;
                let detrend = args.flag("detrend")?;
                Ok(Value::Curves(curves.phase(PhaseOptions { unwrap, detrend })))
            }
            "vswr" => Ok(Value::Curves(curves.vswr())),
            "ml" => Ok(Value::Curves(curves.mismatch_loss())),
            "crop" => {
                let lo = args.req_num(0, "start", name)?;
                let hi = args.req_num(1, "stop", name)?;
                Ok(Value::Curves(curves.crop(lo, hi)))
            }
            "resample" => {
                let start = args.req_num(0, "start", name)?;
                let stop = args.req_num(1, "stop", name)?;
                let n = args.req_num(2, "npoints", name)? as usize;
                let sweep = if args.flag("log")? {
                    SweepType::Log
                } else {
                    SweepType::Linear
                };
                Ok(Value::Curves(curves.resampled(start, stop, n, sweep)))
            }
            "mean" => Ok(Value::Curves(CurveSet::from_curve(curves.mean()?))),
            "median" => Ok(Value::Curves(CurveSet::from_curve(curves.median()?))),
            "sdev" => Ok(Value::Curves(CurveSet::from_curve(curves.std_dev()?))),
            "rename" => Ok(Value::Curves(
                curves.renamed(&args.req_str(0, "name", name)?),
            )),
            "prefix" => Ok(Value::Curves(
                curves.with_prefix(&args.req_str(0, "prefix", name)?),
            )),
            "suffix" => Ok(Value::Curves(
                curves.with_suffix(&args.req_str(0, "suffix", name)?),
            )),
            "replace" => {
                let pattern = args.req_str(0, "pattern", name)?;
                let replacement = args.req_str(1, "replacement", name)?;
                Ok(Value::Curves(curves.pattern_renamed(&pattern, &replacement)))
            }
            "td" => {
                let kind = match args.opt_str(0, "kind")?.as_deref() {
                    None | Some("impulse") => ResponseKind::Impulse,
                    Some("step") => ResponseKind::Step,
                    Some(other) => bail!("td kind must be 'impulse' or 'step', got '{}'", other),
                };
                let window_kind = match args.named_str("window")? {
                    None => WindowKind::Kaiser,
                    Some(name) => WindowKind::parse(&name)
                        .ok_or_else(|| anyhow!("unknown window '{}'", name))?,
                };
                let param = args.named_num("param")?.unwrap_or(6.0);
                let shift_s = args.named_num("shift")?.unwrap_or(0.0);
                let opts = TimeDomainOptions {
                    kind,
                    window: Window {
                        kind: window_kind,
                        param,
                    },
                    shift_s,
                };
                Ok(Value::Curves(
                    curves.map_tolerant("time domain", |c| c.time_domain(&opts)),
                ))
            }
            "bode_fano" => {
                let int_band = Band::new(
                    args.req_num(0, "integration start", name)?,
                    args.req_num(1, "integration stop", name)?,
                )?;
                let tgt_band = Band::new(
                    args.req_num(2, "target start", name)?,
                    args.req_num(3, "target stop", name)?,
                )?;

                let mut achievable = f64::NAN;
                for c in curves.iter() {
                    let r = bode_fano(c, int_band, tgt_band)?;
                    info!(
                        curve = c.label(),
                        db_available = r.db_available,
                        db_current = r.db_current,
                        db_achievable = r.db_achievable,
                        "bode-fano bound"
                    );
                    achievable = r.db_achievable;
                }
                if achievable.is_nan() {
                    bail!("bode_fano() on an empty curve set");
                }
                Ok(Value::Num(achievable))
            }
            "plot" => {
                let style = PlotStyle {
                    pattern: args.opt_str(0, "pattern")?,
                    color: args.named_str("color")?,
                };
                self.emit(&curves, style);
                Ok(Value::Null)
            }
            _ => {
                if let Some(f) = unary_math(name) {
                    return Ok(Value::Curves(curves.map_values(|_, v| f(v))));
                }
                bail!("no method '{}' on curves", name)
            }
        }
    }

    // ------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------

    fn unary(&mut self, op: UnaryOp, value: Value) -> Result<Value> {
        match (op, value) {
            (UnaryOp::Neg, Value::Num(v)) => Ok(Value::Num(-v)),
            (UnaryOp::Neg, Value::Curves(c)) => Ok(Value::Curves(c.binary_scalar(
                Complex64::new(-1.0, 0.0),
                CurveOp::Mul,
                true,
            ))),
            (UnaryOp::Invert, Value::Nets(n)) => Ok(Value::Nets(n.inverted())),
            (op, value) => bail!(
                "operator {} does not apply to a {}",
                match op {
                    UnaryOp::Neg => "'-'",
                    UnaryOp::Invert => "'~'",
                },
                value.type_name()
            ),
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
        let curve_op = match op {
            BinaryOp::Add => CurveOp::Add,
            BinaryOp::Sub => CurveOp::Sub,
            BinaryOp::Mul => CurveOp::Mul,
            BinaryOp::Div => CurveOp::Div,
            BinaryOp::Pow => CurveOp::Pow,
        };

        match (lhs, rhs) {
            (Value::Num(a), Value::Num(b)) => Ok(Value::Num(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Pow => a.powf(b),
            })),
            (Value::Curves(a), Value::Curves(b)) => Ok(Value::Curves(a.binary(&b, curve_op)?)),
            (Value::Curves(a), Value::Num(b)) => Ok(Value::Curves(a.binary_scalar(
                Complex64::new(b, 0.0),
                curve_op,
                false,
            ))),
            (Value::Num(a), Value::Curves(b)) => Ok(Value::Curves(b.binary_scalar(
                Complex64::new(a, 0.0),
                curve_op,
                true,
            ))),
            (Value::Nets(a), Value::Nets(b)) if op == BinaryOp::Pow => {
                Ok(Value::Nets(a.cascade(&b)?))
            }
            (Value::Nets(a), Value::Component(c)) if op == BinaryOp::Pow => {
                Ok(Value::Nets(a.cascade_component(&c, false)))
            }
            (Value::Component(c), Value::Nets(a)) if op == BinaryOp::Pow => {
                Ok(Value::Nets(a.cascade_component(&c, true)))
            }
            (l, r) => bail!(
                "operator does not apply to {} and {}",
                l.type_name(),
                r.type_name()
            ),
        }
    }

    fn emit(&mut self, curves: &CurveSet, style: PlotStyle) {
        self.plots_emitted += curves.len();
        curves.plot(&mut self.ctx.plot, &style);
    }
}

// ----------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------

fn component(spec: ComponentSpec) -> Value {
    Value::Component(Component::new(spec))
}

/// Select networks by wildcard pattern (`*`, `?`), case-insensitive.
fn select(pool: &[Network], pattern: Option<&str>) -> Result<NetworkSet> {
    let Some(pattern) = pattern else {
        return Ok(NetworkSet::new(pool.to_vec()));
    };
    let re = wildcard_regex(pattern)?;
    Ok(NetworkSet::new(
        pool.iter()
            .filter(|n| re.is_match(&n.name))
            .cloned()
            .collect(),
    ))
}

fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut out = String::from("(?i)^");
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out).map_err(|e| anyhow!("bad pattern '{}': {}", pattern, e))
}

/// `21` or `"S21"` into 0-based (to, from).
fn parse_sparam(value: &Value) -> Result<(usize, usize)> {
    let digits = match value {
        Value::Num(v) => {
            let n = *v as i64;
            if !(11..=99).contains(&n) || *v != n as f64 {
                bail!("S-parameter shorthand must be two digits like 21, got {}", v);
            }
            format!("{}", n)
        }
        Value::Str(s) => {
            let lower = s.to_ascii_lowercase();
            lower
                .strip_prefix('s')
                .unwrap_or(&lower)
                .to_string()
        }
        other => bail!("cannot read an S-parameter from a {}", other.type_name()),
    };

    let bytes = digits.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(|b| b.is_ascii_digit()) {
        bail!("S-parameter shorthand must be two digits like 21 or \"S21\"");
    }
    let to = (bytes[0] - b'0') as usize;
    let from = (bytes[1] - b'0') as usize;
    if to == 0 || from == 0 {
        bail!("S-parameter ports are 1-based");
    }
    Ok((to - 1, from - 1))
}

fn num_of(value: &Value, what: &str) -> Result<f64> {
    match value {
        Value::Num(v) => Ok(*v),
        other => bail!("{} must be a number, got a {}", what, other.type_name()),
    }
}

/// The unary math helper table shared by functions, curve methods and
/// `map()`.
fn unary_math(name: &str) -> Option<fn(Complex64) -> Complex64> {
    Some(match name {
        "abs" | "mag" => |v: Complex64| Complex64::new(v.norm(), 0.0),
        "db" => |v: Complex64| Complex64::new(crate::math::db20(v), 0.0),
        "rad" => |v: Complex64| Complex64::new(v.arg(), 0.0),
        "deg" => |v: Complex64| Complex64::new(v.arg().to_degrees(), 0.0),
        "log10" => |v: Complex64| v.log(10.0),
        "log" => |v: Complex64| v.ln(),
        "exp" => |v: Complex64| v.exp(),
        "sqrt" => |v: Complex64| v.sqrt(),
        "re" => |v: Complex64| Complex64::new(v.re, 0.0),
        "im" => |v: Complex64| Complex64::new(v.im, 0.0),
        "conj" => |v: Complex64| v.conj(),
        _ => return None,
    })
}

fn apply_math(name: &str, f: fn(Complex64) -> Complex64, args: Args) -> Result<Value> {
    match args.positional.first() {
        Some(Value::Num(v)) => Ok(Value::Num(f(Complex64::new(*v, 0.0)).re)),
        Some(Value::Curves(c)) => Ok(Value::Curves(c.map_values(|_, v| f(v)))),
        _ => bail!("{}() expects a number or curves", name),
    }
}

/// Build a line spec from factory/insertion arguments. All four
/// parameter sets can be described; exclusivity is enforced at
/// realization, as for any other parameter error.
fn line_spec_from(args: &Args) -> Result<LineSpec> {
    let mut spec = LineSpec::default();

    if let Some(delay) = args.named_num("delay")? {
        spec.delay = Some(delay);
    }
    if let Some(deg) = args.named_num("phase_deg")? {
        spec.phase = Some(PhaseLine {
            degrees: deg,
            f_ref_hz: args
                .named_num("f_ref")?
                .ok_or_else(|| anyhow!("phase_deg needs f_ref"))?,
        });
    }
    if let Some(eps_r) = args.named_num("eps_r")? {
        spec.physical = Some(PhysicalLine {
            len_m: args
                .named_num("len_m")?
                .ok_or_else(|| anyhow!("eps_r needs len_m"))?,
            eps_r,
            db_per_m: args.named_num("db_per_m")?.unwrap_or(0.0),
            f_ref_hz: args.named_num("f_ref")?.unwrap_or(1e9),
        });
    }
    let rlgc_given = ["r", "l", "g", "c"]
        .iter()
        .any(|k| args.named.iter().any(|(n, _)| n == k));
    if rlgc_given {
        spec.rlgc = Some(RlgcLine {
            r: args.named_num("r")?.unwrap_or(0.0),
            l: args.named_num("l")?.unwrap_or(0.0),
            g: args.named_num("g")?.unwrap_or(0.0),
            c: args.named_num("c")?.unwrap_or(0.0),
            len_m: args
                .named_num("len_m")?
                .ok_or_else(|| anyhow!("rlgc constants need len_m"))?,
        });
    }

    Ok(spec)
}

/// Evaluated call arguments: positionals in order plus named values.
#[derive(Default)]
struct Args {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl Args {
    fn single(value: Value) -> Self {
        Args {
            positional: vec![value],
            named: Vec::new(),
        }
    }

    fn get(&self, idx: usize, name: &str) -> Option<&Value> {
        self.named
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .or_else(|| self.positional.get(idx))
    }

    fn req_num(&self, idx: usize, name: &str, func: &str) -> Result<f64> {
        match self.get(idx, name) {
            Some(Value::Num(v)) => Ok(*v),
            Some(other) => bail!("{}: '{}' must be a number, got a {}", func, name, other.type_name()),
            None => bail!("{}: missing argument '{}'", func, name),
        }
    }

    fn opt_num(&self, idx: usize, name: &str) -> Result<Option<f64>> {
        match self.get(idx, name) {
            Some(Value::Num(v)) => Ok(Some(*v)),
            Some(other) => bail!("'{}' must be a number, got a {}", name, other.type_name()),
            None => Ok(None),
        }
    }

    fn req_str(&self, idx: usize, name: &str, func: &str) -> Result<String> {
        match self.get(idx, name) {
            Some(Value::Str(s)) => Ok(s.clone()),
            Some(other) => bail!("{}: '{}' must be a string, got a {}", func, name, other.type_name()),
            None => bail!("{}: missing argument '{}'", func, name),
        }
    }

    fn opt_str(&self, idx: usize, name: &str) -> Result<Option<String>> {
        match self.get(idx, name) {
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(other) => bail!("'{}' must be a string, got a {}", name, other.type_name()),
            None => Ok(None),
        }
    }

    fn named_num(&self, name: &str) -> Result<Option<f64>> {
        match self.named.iter().find(|(n, _)| n == name) {
            Some((_, Value::Num(v))) => Ok(Some(*v)),
            Some((_, other)) => bail!("'{}' must be a number, got a {}", name, other.type_name()),
            None => Ok(None),
        }
    }

    fn named_str(&self, name: &str) -> Result<Option<String>> {
        match self.named.iter().find(|(n, _)| n == name) {
            Some((_, Value::Str(s))) => Ok(Some(s.clone())),
            Some((_, other)) => bail!("'{}' must be a string, got a {}", name, other.type_name()),
            None => Ok(None),
        }
    }

    /// A named boolean-ish flag: absent or 0 is false.
    fn flag(&self, name: &str) -> Result<bool> {
        Ok(self.named_num(name)?.map(|v| v != 0.0).unwrap_or(false))
    }
}
