use clap::Args;
use std::fs::{self, File};
use std::path::PathBuf;
use trialctl::results::ResultKey;
use trialctl::ControllerResult;

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Result store file written by `run --save`
    pub file: PathBuf,

    #[arg(short, long)]
    pub algorithm: String,

    #[arg(short, long)]
    pub problem: String,

    /// Directory receiving one CSV file per result-set
    #[arg(short, long, default_value = "export")]
    pub output: PathBuf,
}

pub fn run(args: ExportArgs) -> ControllerResult<()> {
    let (controller, _) = super::builtin_controller();
    controller.load_from_file(&args.file)?;

    let key = ResultKey::new(args.algorithm.clone(), args.problem.clone());
    let sets = controller.store().get(&key)?;

    fs::create_dir_all(&args.output)?;
    for (i, set) in sets.iter().enumerate() {
        let path = args
            .output
            .join(format!("{}_{}_{}.csv", key.algorithm(), key.problem(), i + 1));
        set.write_csv(File::create(&path)?)?;
        println!("📝 Wrote {:?}", path);
    }

    println!("✅ Exported {} result sets for {}", sets.len(), key);
    Ok(())
}
