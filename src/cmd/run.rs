use crate::reports;
use clap::{ArgMatches, Args};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;
use trialctl::config::JobConfig;
use trialctl::events::ControllerEvent;
use trialctl::results::ResultKey;
use trialctl::runner::StartOutcome;
use trialctl::{ControllerError, ControllerResult};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub job: JobConfig,

    /// JSON job file; explicit command-line arguments override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Save the result store here when the batch ends
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Print indicator statistics when the batch ends
    #[arg(long, default_value_t = false)]
    pub report: bool,
}

pub fn run(args: RunArgs, matches: &ArgMatches) -> ControllerResult<()> {
    // 1. Resolve Job: JSON file vs CLI
    let job = match &args.config {
        Some(path) => {
            println!("📂 Loading job from: {:?}", path);
            let mut job = JobConfig::load_from_file(path)?;
            job.merge_from_cli(&args.job, matches);
            job
        }
        None => args.job.clone(),
    };

    let (controller, failures) = super::builtin_controller();
    controller.set_flags(job.flags.clone());
    controller.subscribe(Arc::new(|event: &ControllerEvent| {
        if *event == ControllerEvent::ModelChanged {
            debug!("📦 Result store changed");
        }
    }));

    println!(
        "\n🚀 Running {} on {} ({} seeds x {} evaluations)",
        job.algorithm, job.problem, job.seeds, job.evaluations
    );

    // 2. Launch
    if controller.start(&job)? == StartOutcome::AlreadyRunning {
        return Err(ControllerError::Execution("a job is already running".into()));
    }

    // 3. Poll progress until the worker exits
    while controller.is_running() {
        let p = controller.progress();
        print!("\r⏳ Seed {:>3}% | Overall {:>3}%", p.run, p.overall);
        let _ = std::io::stdout().flush();
        thread::sleep(Duration::from_millis(100));
    }
    controller.wait();
    println!();

    if let Some(message) = failures.last_message() {
        return Err(ControllerError::Execution(message));
    }

    // 4. Summary
    reports::print_store_summary(controller.store());

    if let Some(path) = &args.save {
        controller.save_to_file(path)?;
        println!("💾 Saved results to {:?}", path);
    }

    if args.report {
        let key = ResultKey::new(job.algorithm.clone(), job.problem.clone());
        println!("{}", controller.show_statistics([key])?);
    }

    Ok(())
}
