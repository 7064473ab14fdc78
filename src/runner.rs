use std::path::PathBuf;

use clap::{Args, Command, FromArgMatches as _};
use log::info;

use crate::error::SirvError;
use crate::log::parse_log_spec;
use crate::model::Model;
use crate::parameters::Parameters;

/// Default cli arguments for the sirv runner
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path for a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value = "100")]
    pub ticks: u64,

    /// Log filter, e.g. `info` or `debug,sirv::agent=trace`
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Default for BaseArgs {
    fn default() -> Self {
        BaseArgs {
            random_seed: 0,
            config: None,
            ticks: 100,
            log_level: None,
        }
    }
}

fn create_sirv_cli() -> Command {
    let cli = Command::new("sirv").about("SIRV epidemic simulation on a 2D grid");
    BaseArgs::augment_args(cli)
}

/// Runs a simulation configured from the process arguments.
///
/// # Errors
/// Returns an error if the arguments, the parameters file or the log filter are
/// invalid, or if the simulation fails.
pub fn run_with_args() -> Result<Model, SirvError> {
    let matches = create_sirv_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)
        .map_err(|e| SirvError::ConfigurationError(e.to_string()))?;
    run_with_args_internal(args)
}

/// Builds a model from `args`, runs it for `args.ticks` ticks and returns it.
///
/// # Errors
/// Returns an error if the parameters file or the log filter are invalid, or if the
/// simulation fails.
pub fn run_with_args_internal(args: BaseArgs) -> Result<Model, SirvError> {
    if let Some(spec) = &args.log_level {
        parse_log_spec(spec)?.apply();
    }

    let parameters = match &args.config {
        Some(path) => {
            info!("Loading parameters from: {}", path.display());
            Parameters::load(path)?
        }
        None => Parameters::default(),
    };

    let mut model = Model::new(parameters, args.random_seed)?;
    model.run(args.ticks)?;
    Ok(model)
}
