//! CLI frontend for Spindle, a toolkit for growing Twee stories into passage
//! trees and generation prompts.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "spindle",
    about = "Spindle: Twee passage trees, narrative context, and generation prompts",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check passages, the start passage, and links
    Check {
        /// Twee file
        file: PathBuf,
    },

    /// List every passage with its outgoing links
    Links {
        /// Twee file
        file: PathBuf,
    },

    /// Build the passage tree from the start passage
    Tree {
        /// Twee file
        file: PathBuf,

        /// Context policy: naive, entities, events (or v1, v2, v3)
        #[arg(short, long, default_value = "entities")]
        policy: String,

        /// Recorded extractor output (JSON keyed by cleaned passage text)
        #[arg(short, long)]
        extractions: Option<PathBuf>,

        /// Output format: ascii, dot, json
        #[arg(short, long, default_value = "ascii")]
        format: String,
    },

    /// Print the generation prompt for a passage in the tree
    Prompt {
        /// Twee file
        file: PathBuf,

        /// Passage title
        #[arg(short, long)]
        title: String,

        /// Context policy: naive, entities, events (or v1, v2, v3)
        #[arg(short, long, default_value = "entities")]
        policy: String,

        /// Recorded extractor output (JSON keyed by cleaned passage text)
        #[arg(short, long)]
        extractions: Option<PathBuf>,

        /// Also print the passage encoded as a completion
        #[arg(short, long)]
        completion: bool,
    },

    /// Export one prompt/completion pair per tree node as JSON lines
    Dataset {
        /// Twee file
        file: PathBuf,

        /// Context policy: naive, entities, events (or v1, v2, v3)
        #[arg(short, long, default_value = "entities")]
        policy: String,

        /// Recorded extractor output (JSON keyed by cleaned passage text)
        #[arg(short, long)]
        extractions: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Turn a prompt and completion back into Twee
    Decode {
        /// Wire-format prompt
        #[arg(long)]
        prompt: String,

        /// Wire-format completion
        #[arg(long)]
        completion: String,
    },

    /// Fill every unwritten passage with placeholder text
    Finish {
        /// Partly written Twee file
        file: PathBuf,

        /// Body for unwritten passages
        #[arg(long)]
        placeholder: Option<String>,

        /// Story title (default: the file's StoryTitle)
        #[arg(long)]
        title: Option<String>,

        /// Story author (default: the file's StoryAuthor)
        #[arg(long)]
        author: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate unwritten passages from recorded completions
    Generate {
        /// Partly written Twee file
        file: PathBuf,

        /// Recorded completions: a JSON array of strings, or dataset JSON lines
        #[arg(short, long)]
        completions: PathBuf,

        /// Maximum passages to generate
        #[arg(short, long, default_value = "16")]
        max: usize,

        /// Context policy: naive, entities, events (or v1, v2, v3)
        #[arg(short, long, default_value = "entities")]
        policy: String,

        /// Recorded extractor output (JSON keyed by cleaned passage text)
        #[arg(short, long)]
        extractions: Option<PathBuf>,

        /// Story title (default: the file's StoryTitle)
        #[arg(long)]
        title: Option<String>,

        /// Story author (default: the file's StoryAuthor)
        #[arg(long)]
        author: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { file } => commands::check::run(&file),
        Commands::Links { file } => commands::links::run(&file),
        Commands::Tree {
            file,
            policy,
            extractions,
            format,
        } => commands::tree::run(&file, &policy, extractions.as_deref(), &format),
        Commands::Prompt {
            file,
            title,
            policy,
            extractions,
            completion,
        } => commands::prompt::run(&file, &title, &policy, extractions.as_deref(), completion),
        Commands::Dataset {
            file,
            policy,
            extractions,
            output,
        } => commands::dataset::run(&file, &policy, extractions.as_deref(), output.as_deref()),
        Commands::Decode { prompt, completion } => commands::decode::run(&prompt, &completion),
        Commands::Finish {
            file,
            placeholder,
            title,
            author,
            output,
        } => commands::finish::run(
            &file,
            placeholder.as_deref(),
            title.as_deref(),
            author.as_deref(),
            output.as_deref(),
        ),
        Commands::Generate {
            file,
            completions,
            max,
            policy,
            extractions,
            title,
            author,
            output,
        } => commands::generate::run(commands::generate::Options {
            file: &file,
            completions: &completions,
            max,
            policy: &policy,
            extractions: extractions.as_deref(),
            title: title.as_deref(),
            author: author.as_deref(),
            output: output.as_deref(),
        }),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
