//! Simulation orchestrator.

use ion_core::{Series, incremental_mean};
use ion_solver::minimize::BracketMinimizer;
use ion_solver::{State2, Stepper};
use ion_models::Parameters;
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::error::{RunStatus, SimError, SimResult};
use crate::resolve::resolve;
use crate::state::CellState;
use crate::system::CellOde;

/// Observer invoked with the state at lifecycle points. A hook error is
/// logged and swallowed; it never aborts the run.
pub type Hook<'h> = Box<dyn FnMut(&CellState) -> Result<(), Box<dyn std::error::Error>> + 'h>;

/// Cooperative stop predicate checked before every step of a run.
pub type ContinuePredicate<'h> = Box<dyn FnMut(&CellState) -> bool + 'h>;

/// Progress callback: (steps done, steps total).
pub type ProgressFn<'h> = Box<dyn FnMut(u64, u64) + 'h>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Running,
    Finished,
}

/// Single-cell simulation: owns the state, the parameters and the
/// numerical machinery, and advances them one fixed macro step at a time.
pub struct Simulation<'h> {
    config: SimConfig,
    params: Parameters,
    state: CellState,
    stepper: Option<Box<dyn Stepper>>,
    minimizer: Option<BracketMinimizer>,
    phase: Phase,
    init_hook: Option<Hook<'h>>,
    update_hook: Option<Hook<'h>>,
    finished_hook: Option<Hook<'h>>,
    should_continue: Option<ContinuePredicate<'h>>,
    progress: Option<ProgressFn<'h>>,
}

fn call_hook(hook: &mut Option<Hook<'_>>, state: &CellState, what: &'static str) {
    if let Some(hook) = hook.as_mut() {
        if let Err(err) = hook(state) {
            warn!(error = %err, "{what} hook failed");
        }
    }
}

impl<'h> Simulation<'h> {
    pub fn new(config: SimConfig, params: Parameters) -> Self {
        let stepper = config.stepper.build(config.tolerances());
        let minimizer = BracketMinimizer::new(config.minimizer);
        let state = CellState::initial(&params.init);
        Self {
            config,
            params,
            state,
            stepper: Some(stepper),
            minimizer: Some(minimizer),
            phase: Phase::Uninitialized,
            init_hook: None,
            update_hook: None,
            finished_hook: None,
            should_continue: None,
            progress: None,
        }
    }

    pub fn state(&self) -> &CellState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_init_hook(&mut self, hook: impl FnMut(&CellState) -> Result<(), Box<dyn std::error::Error>> + 'h) {
        self.init_hook = Some(Box::new(hook));
    }

    pub fn set_update_hook(&mut self, hook: impl FnMut(&CellState) -> Result<(), Box<dyn std::error::Error>> + 'h) {
        self.update_hook = Some(Box::new(hook));
    }

    pub fn set_finished_hook(&mut self, hook: impl FnMut(&CellState) -> Result<(), Box<dyn std::error::Error>> + 'h) {
        self.finished_hook = Some(Box::new(hook));
    }

    pub fn set_should_continue(&mut self, predicate: impl FnMut(&CellState) -> bool + 'h) {
        self.should_continue = Some(Box::new(predicate));
    }

    pub fn set_progress(&mut self, progress: impl FnMut(u64, u64) + 'h) {
        self.progress = Some(Box::new(progress));
    }

    fn log_startup_info(&self) {
        let c = &self.config;
        let p = &self.params;
        info!(sim_name = %c.sim_name, "startup information");
        info!(
            stepper = ?c.stepper,
            minimizer = ?c.minimizer,
            jacobian = ?c.jacobian,
            time_s = c.time_s,
            step_s = c.step_s,
            epsabs = c.epsabs,
            epsrel = c.epsrel,
            min_max_iter = c.min_max_iter,
            "configuration"
        );
        info!(
            init_hook = self.init_hook.is_some(),
            update_hook = self.update_hook.is_some(),
            finished_hook = self.finished_hook.is_some(),
            "hooks"
        );
        info!(
            soc = p.init.soc,
            soh = p.init.soh,
            internal_temp_k = p.init.internal_temp_k,
            capacity_c = p.init.capacity_c,
            capacity_ah = p.init.capacity_c / 3600.0,
            current_guess_a = p.init.current_guess_a,
            "initial conditions"
        );
        debug!(
            ehc = ?p.ehc,
            ocv = ?p.ocv,
            vft = ?p.vft,
            thermal = ?p.thermal,
            resistance = ?p.resistance,
            degradation = ?p.degradation,
            "model parameters"
        );
    }

    /// Reinitialize the state, reset the stepper history and invoke the
    /// init hook. Required before stepping; `run` calls it implicitly.
    pub fn init(&mut self) -> SimResult<()> {
        let stepper = self.stepper.as_mut().ok_or(SimError::NotRunning {
            what: "init after cleanup",
        })?;
        stepper.reset();
        self.state = CellState::initial(&self.params.init);
        self.phase = Phase::Running;
        self.log_startup_info();
        call_hook(&mut self.init_hook, &self.state, "init");
        Ok(())
    }

    /// Advance one macro step with the given inputs.
    ///
    /// After the call the state holds the inputs, derived outputs and
    /// states of timestep k; the integrated states of k+1 sit in the
    /// pending pair.
    pub fn step(&mut self, power_w: f64, ambient_temp_k: f64) -> SimResult<()> {
        match self.step_inner(power_w, ambient_temp_k) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.phase = Phase::Finished;
                Err(err)
            }
        }
    }

    fn step_inner(&mut self, power_w: f64, ambient_temp_k: f64) -> SimResult<()> {
        if self.phase != Phase::Running {
            return Err(SimError::NotRunning {
                what: "step outside of an initialized run",
            });
        }
        let minimizer = self.minimizer.as_mut().ok_or(SimError::NotRunning {
            what: "step after cleanup",
        })?;

        self.state.promote_pending();
        self.state.power_w = power_w;
        self.state.ambient_temp_k = ambient_temp_k;

        resolve(&mut self.state, &self.params, minimizer, &self.config)?;

        let stepper = self.stepper.as_mut().ok_or(SimError::NotRunning {
            what: "step after cleanup",
        })?;
        let mut ode = CellOde::new(&self.state, &self.params, self.config.jacobian);
        let y = State2::new(self.state.soc_nominal, self.state.internal_temp_k);
        let next = stepper.step(&mut ode, self.state.time_s, self.config.step_s, &y)?;
        if !next[0].is_finite() {
            return Err(SimError::NonFinite {
                what: "integrated state of charge",
                value: next[0],
            });
        }
        if !next[1].is_finite() {
            return Err(SimError::NonFinite {
                what: "integrated internal temperature",
                value: next[1],
            });
        }
        self.state.next_soc_nominal = next[0];
        self.state.next_internal_temp_k = next[1];
        self.state.time_s += self.config.step_s;

        // Per-cycle SoC statistics
        self.state.soc_mean = incremental_mean(
            self.state.soc_mean,
            self.state.soc_nominal,
            self.state.cycle_step,
        );
        if self.state.soc_nominal > self.state.soc_max {
            self.state.soc_max = self.state.soc_nominal;
        }
        if self.state.soc_nominal < self.state.soc_min {
            self.state.soc_min = self.state.soc_nominal;
        }

        // Degradation bookkeeping: one full nominal capacity of discharge
        // closes a cycle
        self.state.acc_discharge_c += (self.state.current_a * self.config.step_s).max(0.0);
        if self.state.acc_discharge_c >= self.state.capacity_nominal_c {
            self.state.acc_discharge_c %= self.state.capacity_nominal_c;
            self.state.soh = self.params.degradation.next_soh(
                self.state.soh,
                self.state.soc_mean,
                self.state.soc_max,
                self.state.soc_min,
                self.state.internal_temp_k,
            )?;
            self.state.reset_cycle_stats();
            self.state.cycle += 1;
            debug!(
                cycle = self.state.cycle,
                soh = self.state.soh,
                "cycle completed"
            );
        } else {
            self.state.cycle_step += 1;
        }

        call_hook(&mut self.update_hook, &self.state, "update");
        self.state.step += 1;
        Ok(())
    }

    /// Run over the input series. Sample 0 seeds the initial conditions;
    /// stepping consumes samples 1 onward, up to the shorter series or the
    /// iteration cap implied by the configured duration.
    ///
    /// The finished hook runs on normal completion and early exit, not on
    /// a fatal step error.
    pub fn run(&mut self, power: &Series, ambient_temp: &Series) -> SimResult<RunStatus> {
        self.init()?;

        let len = power.len().min(ambient_temp.len());
        if power.len() != ambient_temp.len() {
            warn!(
                power_len = power.len(),
                ambient_len = ambient_temp.len(),
                "input series lengths differ, truncating to the shorter"
            );
        }
        let limit = (len as u64).min(self.config.total_steps() + 1);
        debug!(limit, "considering max iterations");

        for i in 1..limit {
            if let Some(predicate) = self.should_continue.as_mut() {
                if !predicate(&self.state) {
                    info!(step = self.state.step, "stop requested, exiting early");
                    call_hook(&mut self.finished_hook, &self.state, "finished");
                    self.phase = Phase::Finished;
                    return Ok(RunStatus::EarlyExit);
                }
            }
            let p = power.get(i as usize)?;
            let t = ambient_temp.get(i as usize)?;
            self.step(p, t)?;
            if let Some(progress) = self.progress.as_mut() {
                progress(i, limit - 1);
            }
        }

        call_hook(&mut self.finished_hook, &self.state, "finished");
        self.phase = Phase::Finished;
        info!(
            steps = self.state.step,
            cycles = self.state.cycle,
            soh = self.state.soh,
            "simulation finished"
        );
        Ok(RunStatus::Completed)
    }

    /// Reinitialize the cell state only; configuration, parameters and
    /// hooks are kept.
    pub fn reset(&mut self) -> SimResult<()> {
        let stepper = self.stepper.as_mut().ok_or(SimError::NotRunning {
            what: "reset after cleanup",
        })?;
        stepper.reset();
        self.state = CellState::initial(&self.params.init);
        self.phase = Phase::Uninitialized;
        Ok(())
    }

    /// Release the stepper and minimizer. Further stepping is an error.
    pub fn cleanup(&mut self) {
        if self.stepper.take().is_some() {
            debug!("released stepper");
        }
        if self.minimizer.take().is_some() {
            debug!("released minimizer");
        }
        self.phase = Phase::Finished;
    }
}
