use clap::{Parser, Subcommand};
use rastermill::convert::{self, ConvertPlan};
use rastermill::imaging::{FitSpec, OutputFormat, Quality};
use rastermill::registry::{TransformOptions, TransformRegistry};
use rastermill::steps::StepSpec;
use rastermill::{config, logging, output};
use std::path::PathBuf;

/// Flags shared by commands that run pipelines.
#[derive(clap::Args, Clone)]
struct PlanArgs {
    /// Resize to fit a box: `800` (square) or `800x400` (width x height)
    #[arg(long, value_name = "FIT")]
    resize: Option<FitSpec>,

    /// Extra transform step, applied in order after --resize
    #[arg(long = "step", value_name = "NAME[:k=v,...]")]
    steps: Vec<StepSpec>,

    /// Output format (png, jpeg, webp, avif or a MIME type)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Encoder quality, 1-100 (JPEG and AVIF)
    #[arg(long)]
    quality: Option<u32>,
}

impl PlanArgs {
    fn into_plan(self, config: &config::MillConfig) -> ConvertPlan {
        let mut plan = ConvertPlan::from_config(config);
        if let Some(format) = self.format {
            plan.format = format;
        }
        if let Some(quality) = self.quality {
            plan.quality = Quality::new(quality);
        }
        if let Some(fit) = self.resize {
            plan = plan.resize(fit);
        }
        self.steps.into_iter().fold(plan, ConvertPlan::step)
    }
}

#[derive(Parser)]
#[command(name = "rastermill")]
#[command(about = "Deferred image transform pipelines")]
#[command(long_about = "\
Deferred image transform pipelines

Load an image, queue transforms, and encode the result. Nothing is decoded
until the output is requested, and every step runs in the order given.

Examples:

  rastermill convert photo.jpg --resize 800 --format webp
  rastermill convert photo.jpg --resize 800x400 --step grayscale --data-url
  rastermill convert photo.jpg --step sharpen:sigma=1.5,threshold=2 -o out.png
  rastermill batch photos/ --out thumbs/ --resize 400 --format jpeg

Built-in transforms: resize (fit, smoothing), grayscale, sharpen (sigma,
threshold). Run 'rastermill transforms' to list them.

Run 'rastermill gen-config' to generate a documented rastermill.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding rastermill.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a single image
    Convert {
        input: PathBuf,
        /// Output path (default: next to the input, with the format's extension)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Print a data: URL instead of writing a file
        #[arg(long, conflicts_with = "output")]
        data_url: bool,
        #[command(flatten)]
        plan: PlanArgs,
    },
    /// Convert every image under a directory
    Batch {
        input: PathBuf,
        /// Output directory; the input layout is kept
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        plan: PlanArgs,
    },
    /// List registered transforms
    Transforms,
    /// Print a stock rastermill.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mill_config = config::load_config(&cli.config_dir)?;
    logging::init(&mill_config.logging, cli.verbose);

    match cli.command {
        Command::Convert {
            input,
            output: output_path,
            data_url,
            plan,
        } => {
            let steps = plan_steps(&plan);
            let plan = plan.into_plan(&mill_config);
            if data_url {
                println!("{}", convert::convert_to_data_url(&input, &plan)?);
            } else {
                let outcome = convert::convert_file(&input, output_path.as_deref(), &plan)?;
                output::print_convert_output(&outcome, &steps);
            }
        }
        Command::Batch { input, out, plan } => {
            init_thread_pool(&mill_config.processing);
            let plan = plan.into_plan(&mill_config);
            let report = convert::convert_dir(&input, &out, &plan)?;
            output::print_batch_output(&report, &input, &out);
            if !report.is_success() {
                return Err(format!("{} file(s) failed", report.failed.len()).into());
            }
        }
        Command::Transforms => {
            let registry = TransformRegistry::builtin();
            output::print_transform_list(&registry.names());
        }
        // Printed before the config was loaded
        Command::GenConfig => {}
    }

    Ok(())
}

/// The steps a plan will run, for display.
fn plan_steps(plan: &PlanArgs) -> Vec<StepSpec> {
    let resize = plan
        .resize
        .clone()
        .map(|fit| StepSpec::new("resize", TransformOptions::new().with_fit(fit)));
    resize.into_iter().chain(plan.steps.iter().cloned()).collect()
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores: the config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
