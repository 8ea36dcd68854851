//! # Keelson CLI
//!
//! Runs a hydrostatics and stability study from a JSON case file and prints
//! a summary followed by the results as JSON.
//!
//! ```text
//! hydro_cli case.json
//! hydro_cli case.json --method wall-sided --json
//! hydro_cli --print-demo > case.json
//! ```
//!
//! Without a case file a built-in demo barge is analysed. Set `RUST_LOG`
//! (e.g. `RUST_LOG=hydro_core=debug`) for calculation traces.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use hydro_core::calculations::{
    AnalysisItem, AnalysisOutput, CriteriaAssessment, CurveSet, HydroResult, StabilityCurve, StabilityMethod,
    TrimSolution,
};
use hydro_core::errors::{CalcError, CalcResult};
use hydro_core::hull::HullGeometry;
use hydro_core::loadcase::Loadcase;
use hydro_core::settings::AnalysisSettings;
use hydro_core::units::{Kilograms, Tonnes};

/// Hydrostatics and intact stability of a hull from its offsets
#[derive(Parser, Debug)]
#[command(name = "hydro_cli")]
#[command(about = "Hydrostatics, GZ curves, IMO criteria and trim from a table of offsets")]
struct Args {
    /// JSON case file (hull, loadcase, settings, analyses); demo barge if omitted
    case: Option<PathBuf>,

    /// Override the stability method from the case settings
    #[arg(long, value_enum)]
    method: Option<MethodArg>,

    /// Print only the JSON results
    #[arg(long)]
    json: bool,

    /// Print the demo case file and exit
    #[arg(long)]
    print_demo: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MethodArg {
    WallSided,
    FullImmersion,
}

impl From<MethodArg> for StabilityMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::WallSided => StabilityMethod::WallSided,
            MethodArg::FullImmersion => StabilityMethod::FullImmersion,
        }
    }
}

/// Everything one run needs
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CaseFile {
    hull: HullGeometry,
    loadcase: Loadcase,
    #[serde(default)]
    settings: AnalysisSettings,
    /// Adds a trim analysis when `analyses` is empty
    #[serde(default)]
    target_displacement_kg: Option<f64>,
    /// Analyses to run; a default study when empty
    #[serde(default)]
    analyses: Vec<AnalysisItem>,
}

impl CaseFile {
    fn demo() -> Self {
        // 20 m x 10 m x 6 m barge floating at 3 m
        CaseFile {
            hull: HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13),
            loadcase: Loadcase::new("Demo barge, departure", 1025.0)
                .with_draft(3.0)
                .with_kg(3.0)
                .with_lcg(9.8)
                .with_flooding_angle(45.0),
            settings: AnalysisSettings::default(),
            target_displacement_kg: Some(615_000.0),
            analyses: Vec::new(),
        }
    }

    fn load(path: &Path) -> CalcResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Analyses to run: the listed ones, or hydrostatics from one step above
    /// the keel to the loadcase draft, IMO criteria and (with a target) trim.
    fn analyses(&self) -> CalcResult<Vec<AnalysisItem>> {
        if !self.analyses.is_empty() {
            return Ok(self.analyses.clone());
        }
        let mut items = Vec::new();
        if let Some(draft) = self.loadcase.draft_m {
            let keel = self.hull.validate()?.keel_z_m();
            items.push(AnalysisItem::HydrostaticTable {
                from_m: (keel + self.settings.draft_step_m).min(draft),
                to_m: draft,
            });
            if self.loadcase.kg_m.is_some() {
                items.push(AnalysisItem::Criteria { method: None });
            }
        }
        if let Some(target) = self.target_displacement_kg {
            items.push(AnalysisItem::Trim {
                target_displacement_kg: target,
                initial_draft_fwd_m: None,
                initial_draft_aft_m: None,
            });
        }
        Ok(items)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.print_demo {
        return match serde_json::to_string_pretty(&CaseFile::demo()) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => report_error(&e.into()),
        };
    }

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => report_error(&e),
    }
}

/// Run the study; `Ok(false)` when a stability check failed.
fn run(args: &Args) -> CalcResult<bool> {
    let mut case = match &args.case {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading case file");
            CaseFile::load(path)?
        }
        None => {
            tracing::info!("no case file given, running the demo barge");
            CaseFile::demo()
        }
    };
    if let Some(method) = args.method {
        case.settings.stability_method = method.into();
    }

    let mut outputs = Vec::new();
    let mut all_passed = true;
    for item in case.analyses()? {
        tracing::info!(analysis = item.calc_type(), "running");
        let output = item.run(&case.hull, &case.loadcase, &case.settings)?;
        if let AnalysisOutput::Criteria { assessment, .. } = &output {
            all_passed &= assessment.passed;
        }
        if !args.json {
            print_output(&case, &output);
        }
        outputs.push(output);
    }

    if !args.json {
        println!();
        println!("JSON Output (for API use):");
    }
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(all_passed)
}

fn report_error(e: &CalcError) -> ExitCode {
    let kind = if e.is_validation() { "Invalid input" } else { "Error" };
    eprintln!("{} [{}]: {}", kind, e.error_code(), e);
    if let Ok(json) = serde_json::to_string_pretty(e) {
        eprintln!();
        eprintln!("Error JSON:");
        eprintln!("{}", json);
    }
    ExitCode::FAILURE
}

fn banner(title: &str) {
    println!();
    println!("═══════════════════════════════════════");
    println!("  {}", title);
    println!("═══════════════════════════════════════");
}

fn status_icon(pass: bool) -> &'static str {
    if pass { "[OK]" } else { "[FAIL]" }
}

fn tonnes(kg: f64) -> f64 {
    Tonnes::from(Kilograms(kg)).value()
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

fn print_output(case: &CaseFile, output: &AnalysisOutput) {
    match output {
        AnalysisOutput::HydrostaticTable(rows) => print_table(case, rows),
        AnalysisOutput::GzCurve(curve) => print_curve(curve),
        AnalysisOutput::Criteria { curve, assessment } => {
            print_curve(curve);
            print_assessment(assessment);
        }
        AnalysisOutput::Trim(solution) => print_trim(solution),
        AnalysisOutput::Curves(set) => print_curve_set(set),
    }
}

fn print_table(case: &CaseFile, rows: &[HydroResult]) {
    banner("HYDROSTATICS");
    println!();
    println!("Hull:     {}", case.hull.label);
    println!("Loadcase: {} (ρ = {:.1} kg/m³)", case.loadcase.label, case.loadcase.density_kg_m3);
    println!();
    println!(
        "{:>8} {:>12} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10} {:>6}",
        "T (m)", "Δ (t)", "KB", "LCB", "BMt", "KMt", "GMt", "TPC (t)", "Cb"
    );
    for r in rows {
        println!(
            "{:>8.3} {:>12.2} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10.3} {:>6}",
            r.draft_m,
            tonnes(r.displacement_kg),
            opt(r.kb_m, 3),
            opt(r.lcb_m, 3),
            opt(r.bmt_m, 3),
            opt(r.kmt_m, 3),
            opt(r.gmt_m, 3),
            tonnes(r.tpc_kg_per_cm),
            opt(r.cb, 3),
        );
    }
}

fn print_curve(curve: &StabilityCurve) {
    banner(&format!("GZ CURVE ({})", curve.method.display_name().to_uppercase()));
    println!();
    println!("  {}", curve.method.description());
    println!();
    println!("  Draft:        {:.3} m", curve.draft_m);
    println!("  Displacement: {:.2} t", tonnes(curve.displacement_kg));
    println!("  KG:           {:.3} m", curve.kg_m);
    println!("  GMt:          {} m", opt(curve.gmt_m, 3));
    if let Some(max) = curve.max_gz() {
        println!("  GZ max:       {:.3} m at {:.1}°", max.gz_m, max.heel_deg);
    }
    println!(
        "  Vanishing:    {}",
        curve
            .angle_of_vanishing_stability()
            .map_or_else(|| "beyond range".to_string(), |a| format!("{:.1}°", a))
    );
    println!();
    let stride = (curve.points.len() / 12).max(1);
    for p in curve.points.iter().step_by(stride) {
        println!("  {:>7.1}°  {:>8.4} m", p.heel_deg, p.gz_m);
    }
}

fn print_assessment(assessment: &CriteriaAssessment) {
    banner("IMO A.749(18) INTACT STABILITY");
    println!();
    for r in &assessment.results {
        println!(
            "  {}. {:<52} {:>8.4} ≥ {:<6} {:<6} {}",
            r.criterion.id(),
            r.description,
            r.actual,
            r.required,
            r.unit,
            status_icon(r.passed)
        );
    }
    println!();
    println!("═══════════════════════════════════════");
    println!("  RESULT: {}", if assessment.passed { "PASS" } else { "FAIL" });
    println!("═══════════════════════════════════════");
}

fn print_trim(s: &TrimSolution) {
    banner("EQUILIBRIUM TRIM");
    println!();
    println!("  Draft fwd:    {:.4} m", s.draft_fwd_m);
    println!("  Draft aft:    {:.4} m", s.draft_aft_m);
    println!("  Mean draft:   {:.4} m", s.mean_draft_m);
    println!("  Trim:         {:+.4} m ({:+.3}°, + by the head)", s.trim_m, s.trim_angle_deg);
    println!("  Displacement: {:.2} t (error {:.3} kg)", tonnes(s.displacement_kg), s.displacement_error_kg);
    println!("  LCB - LCG:    {:.6} m", s.lever_error_m);
    println!("  MTC:          {} t·m/m", opt(s.mtc_kgm_per_m.map(tonnes), 3));
    println!(
        "  Solver:       {:?} after {} iteration(s) {}",
        s.termination,
        s.iterations,
        status_icon(s.converged)
    );
}

fn print_curve_set(set: &CurveSet) {
    banner(&set.title.to_uppercase());
    println!();
    for s in &set.series {
        println!("  {:<28} {:>4} points  ({} vs {})", s.name, s.points.len(), s.y_label, s.x_label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_study_starts_above_keel() {
        // Offsets begin 1 m above the baseline
        let xs = [0.0, 5.0, 10.0];
        let zs = [1.0, 2.0, 3.0, 4.0];
        let rows = vec![vec![2.0; zs.len()]; xs.len()];
        let case = CaseFile {
            hull: HullGeometry::from_grid("Raised keel", &xs, &zs, &rows),
            loadcase: Loadcase::new("Raised keel", 1025.0).with_draft(2.5),
            settings: AnalysisSettings::default(),
            target_displacement_kg: None,
            analyses: Vec::new(),
        };

        let items = case.analyses().unwrap();
        assert_eq!(items.len(), 1);
        match &items[0] {
            AnalysisItem::HydrostaticTable { from_m, to_m } => {
                assert!((from_m - 1.25).abs() < 1e-12);
                assert_eq!(*to_m, 2.5);
            }
            other => panic!("unexpected item: {:?}", other),
        }
        match items[0].run(&case.hull, &case.loadcase, &case.settings).unwrap() {
            AnalysisOutput::HydrostaticTable(rows) => assert_eq!(rows.len(), 6),
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_demo_study() {
        let case = CaseFile::demo();
        let items = case.analyses().unwrap();
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], AnalysisItem::HydrostaticTable { from_m, .. } if from_m == 0.25));
    }
}
