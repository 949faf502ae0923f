use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;
use trialctl::config::InclusionFlags;
use trialctl::results::ResultKey;
use trialctl::{ControllerError, ControllerResult};

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Result store file written by `run --save`
    pub file: PathBuf,

    /// Problem to analyze; may be omitted when the store holds only one
    #[arg(short, long)]
    pub problem: Option<String>,

    /// Restrict the report to these algorithms
    #[arg(short, long)]
    pub algorithm: Vec<String>,

    #[command(flatten)]
    pub flags: InclusionFlags,
}

pub fn run(args: ReportArgs) -> ControllerResult<()> {
    let (controller, _) = super::builtin_controller();
    controller.load_from_file(&args.file)?;
    controller.set_flags(args.flags.clone());

    let keys = controller.store().keys();
    let problem = match &args.problem {
        Some(p) => p.clone(),
        None => {
            let problems: BTreeSet<&str> = keys.iter().map(ResultKey::problem).collect();
            match problems.len() {
                0 => return Err(ControllerError::NotFound("the store is empty".into())),
                1 => problems.into_iter().next().unwrap_or_default().to_string(),
                _ => {
                    return Err(ControllerError::Config(format!(
                        "the store holds several problems ({}); pick one with --problem",
                        problems.into_iter().collect::<Vec<_>>().join(", ")
                    )))
                }
            }
        }
    };

    let selected: Vec<ResultKey> = keys
        .into_iter()
        .filter(|k| k.problem() == problem)
        .filter(|k| args.algorithm.is_empty() || args.algorithm.iter().any(|a| a == k.algorithm()))
        .collect();

    if selected.is_empty() {
        return Err(ControllerError::NotFound(format!(
            "no stored results match problem '{}'",
            problem
        )));
    }

    println!("{}", controller.show_statistics(selected)?);
    Ok(())
}
