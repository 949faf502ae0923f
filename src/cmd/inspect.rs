use crate::reports;
use clap::Args;
use std::path::PathBuf;
use trialctl::ControllerResult;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Result store file written by `run --save`
    pub file: PathBuf,
}

pub fn run(args: InspectArgs) -> ControllerResult<()> {
    let (controller, _) = super::builtin_controller();
    let loaded = controller.load_from_file(&args.file)?;
    println!("📂 {} result sets in {:?}", loaded, args.file);
    reports::print_store_summary(controller.store());
    Ok(())
}
