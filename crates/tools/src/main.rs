//! xmljson - convert XML to JSON and back
//!
//! Converted output goes to stdout (or `-o`), logs go to stderr.

use clap::{Args, Parser, Subcommand};
use files::{ConverterConfig, FileConverter};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "xmljson", version, about = "Convert XML to JSON and back")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert an XML document to JSON
    Xml2json {
        #[command(flatten)]
        io: IoArgs,

        /// Collapse sibling groups with unique keys into objects
        #[arg(long)]
        compact: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Convert a JSON document (array or compact form) to XML
    Json2xml {
        #[command(flatten)]
        io: IoArgs,

        /// Spaces per nesting level
        #[arg(long, value_name = "N")]
        indent: Option<usize>,
    },
}

#[derive(Debug, Args)]
struct IoArgs {
    /// Input file
    input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON converter configuration; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn load_config(path: Option<&Path>) -> files::Result<ConverterConfig> {
    match path {
        Some(path) => ConverterConfig::load(path).await,
        None => Ok(ConverterConfig::default()),
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Xml2json {
            io,
            compact,
            pretty,
        } => {
            let mut config = load_config(io.config.as_deref()).await?;
            config.convert.compact |= compact;
            config.pretty_json |= pretty;
            let converter = FileConverter::new(config);

            match io.output {
                Some(output) => {
                    converter.xml_to_json(&io.input, &output).await?;
                }
                None => {
                    let value = converter.read_xml_file(&io.input).await?;
                    let text = if converter.config.pretty_json {
                        serde_json::to_string_pretty(&value)?
                    } else {
                        serde_json::to_string(&value)?
                    };
                    println!("{}", text);
                }
            }
        }
        Command::Json2xml { io, indent } => {
            let mut config = load_config(io.config.as_deref()).await?;
            if let Some(indent) = indent {
                config.serializer.indent_width = indent;
            }
            let converter = FileConverter::new(config);

            match io.output {
                Some(output) => converter.json_to_xml(&io.input, &output).await?,
                None => {
                    let value = converter.read_json_file(&io.input).await?;
                    print!("{}", converter.service().render(&value)?);
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
