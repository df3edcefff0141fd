use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    convert_texture, run_locale_extraction, show_scope, ConvertTextureArgs, RunExtractionArgs,
    ShowScopeArgs,
};
use miette::Result;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract assets that differ between the configured locales
    Run {
        /// Run even if the current build was already processed
        #[arg(short, long)]
        force: bool,

        /// The path to the configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// The directory to write extracted assets to
        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// Convert one mipmap of a BLP texture to a bitmap
    Convert {
        /// The path to the BLP file
        #[arg(short, long)]
        input: String,

        /// The bitmap to write (defaults to the input path with a .bmp extension)
        #[arg(short, long)]
        output: Option<String>,

        /// The mipmap level to decode
        #[arg(short, long, default_value_t = 0)]
        mipmap: usize,
    },
    /// List the listfile entries selected for comparison
    Scope {
        /// The path to the configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).expect("failed to parse arguments")
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "locale_diff=info,ld_extract=info,ld_image=warn".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();
    init_logging();

    match args.command {
        Commands::Run {
            force,
            config,
            output_dir,
        } => {
            run_locale_extraction(RunExtractionArgs {
                config_path: config,
                output_dir,
                force,
            })
            .await
        }
        Commands::Convert {
            input,
            output,
            mipmap,
        } => {
            convert_texture(ConvertTextureArgs {
                input,
                output,
                mipmap,
            })
            .await
        }
        Commands::Scope { config } => show_scope(ShowScopeArgs { config_path: config }).await,
    }
}
