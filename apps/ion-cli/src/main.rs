use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ion_core::Series;
use ion_models::Parameters;
use ion_sim::{CellState, RunStatus, SimConfig, Simulation};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "ion-cli")]
#[command(about = "Lithium-ion single-cell simulation tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation over power/ambient-temperature input series
    Run {
        /// CSV with the demanded power profile (W), one value per line
        power_csv: PathBuf,
        /// CSV with the ambient temperature profile (K), one value per line
        ambient_csv: PathBuf,
        /// Optional YAML file overriding the cell parameters
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// Optional YAML file overriding the run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output CSV for the state trajectory (defaults to no export)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default cell parameters as YAML
    ShowParams,
    /// Check that the input series parse and their lengths match
    Validate {
        power_csv: PathBuf,
        ambient_csv: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            power_csv,
            ambient_csv,
            params,
            config,
            output,
        } => cmd_run(
            &power_csv,
            &ambient_csv,
            params.as_deref(),
            config.as_deref(),
            output.as_deref(),
        ),
        Commands::ShowParams => cmd_show_params(),
        Commands::Validate {
            power_csv,
            ambient_csv,
        } => cmd_validate(&power_csv, &ambient_csv),
    }
}

fn load_params(path: Option<&Path>) -> CliResult<Parameters> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&text)?)
        }
        None => Ok(Parameters::default()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<SimConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&text)?)
        }
        None => Ok(SimConfig::default()),
    }
}

const TRAJECTORY_HEADER: &str = "time_s,step,cycle,power_w,ambient_temp_k,soc_nominal,\
soc_usable,kappa,capacity_usable_c,current_a,voltage_v,open_circuit_voltage_v,\
internal_resistance_ohm,internal_temp_k,surface_temp_k,ehc_v_per_k,generated_heat_w,soh";

fn write_trajectory_row(out: &mut impl Write, s: &CellState) -> std::io::Result<()> {
    writeln!(
        out,
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        s.time_s,
        s.step,
        s.cycle,
        s.power_w,
        s.ambient_temp_k,
        s.soc_nominal,
        s.soc_usable,
        s.kappa,
        s.capacity_usable_c,
        s.current_a,
        s.voltage_v,
        s.open_circuit_voltage_v,
        s.internal_resistance_ohm,
        s.internal_temp_k,
        s.surface_temp_k,
        s.ehc_v_per_k,
        s.generated_heat_w,
        s.soh
    )
}

fn cmd_run(
    power_csv: &Path,
    ambient_csv: &Path,
    params_path: Option<&Path>,
    config_path: Option<&Path>,
    output: Option<&Path>,
) -> CliResult<()> {
    let power = Series::from_csv_path(power_csv)?;
    let ambient = Series::from_csv_path(ambient_csv)?;
    let params = load_params(params_path)?;
    let config = load_config(config_path)?;

    println!("Running simulation: {}", config.sim_name);
    println!(
        "  {} power samples, {} ambient samples, step = {} s",
        power.len(),
        ambient.len(),
        config.step_s
    );

    let writer = match output {
        Some(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            writeln!(file, "{TRAJECTORY_HEADER}")?;
            Some(RefCell::new(file))
        }
        None => None,
    };

    let mut last_percent = u64::MAX;
    let mut sim = Simulation::new(config, params);
    if let Some(writer) = writer.as_ref() {
        sim.set_update_hook(|state| {
            write_trajectory_row(&mut *writer.borrow_mut(), state)?;
            Ok(())
        });
    }
    sim.set_progress(|done, total| {
        let percent = done * 100 / total.max(1);
        if percent != last_percent {
            eprint!("\r{percent:>3}% ({done}/{total} steps)");
            last_percent = percent;
        }
    });

    let status = sim.run(&power, &ambient)?;
    eprintln!();

    let state = sim.state().clone();
    drop(sim);
    if let Some(writer) = writer {
        writer.into_inner().flush()?;
    }

    match status {
        RunStatus::Completed => println!("✓ Simulation completed"),
        RunStatus::EarlyExit => println!("✓ Simulation stopped early"),
    }
    println!("  Steps: {}", state.step);
    println!("  Cycles: {}", state.cycle);
    println!("  Final SoC: {:.4}", state.next_soc_nominal);
    println!("  Final SoH: {:.6}", state.soh);
    println!("  Final internal temperature: {:.3} K", state.next_internal_temp_k);
    if let Some(path) = output {
        println!("  Trajectory written to {}", path.display());
    }
    Ok(())
}

fn cmd_show_params() -> CliResult<()> {
    print!("{}", serde_yaml::to_string(&Parameters::default())?);
    Ok(())
}

fn cmd_validate(power_csv: &Path, ambient_csv: &Path) -> CliResult<()> {
    let power = Series::from_csv_path(power_csv)?;
    let ambient = Series::from_csv_path(ambient_csv)?;
    println!("✓ Power series: {} samples", power.len());
    println!("✓ Ambient series: {} samples", ambient.len());
    if power.is_empty() || ambient.is_empty() {
        return Err("input series must not be empty".into());
    }
    if power.len() != ambient.len() {
        println!(
            "! Lengths differ; a run would truncate to {} samples",
            power.len().min(ambient.len())
        );
    } else {
        println!("✓ Lengths match");
    }
    Ok(())
}
