//! CLI argument definitions for `lead-mapper`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use lead_ingest::{DEFAULT_MAX_ROWS, ReadOptions};
use lead_map::SuggestionOptions;
use lead_map::suggest::{API_KEY_ENV, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use lead_model::Category;

#[derive(Parser)]
#[command(
    name = "lead-mapper",
    version,
    about = "Map buyer and visitor CSV uploads onto standard lead fields",
    long_about = "Map the columns of buyer and visitor CSV uploads onto a fixed \
                  field taxonomy.\n\n\
                  A hosted model proposes the mapping when an API key is \
                  configured; a deterministic matcher (fuzzy name similarity, \
                  content sniffing, keywords) decides every column the model \
                  leaves out or gets wrong."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow uploaded cell values to appear in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Suggest a column mapping for an uploaded file.
    Suggest(SuggestArgs),

    /// List the standard fields of one or both categories.
    Fields(FieldsArgs),

    /// Describe an uploaded file: column kinds, numeric and categorical stats.
    Summary(SummaryArgs),

    /// Ask a question about uploaded buyers and visitors files.
    Ask(AskArgs),

    /// Manage saved mappings.
    #[command(subcommand)]
    Mapping(MappingCommand),
}

#[derive(Args)]
pub struct UploadArgs {
    /// CSV, TSV or semicolon-separated file to read.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Kind of records in the file.
    #[arg(short = 'c', long = "category", value_enum)]
    pub category: CategoryArg,

    /// Data rows read from the file.
    #[arg(long = "max-rows", value_name = "N", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,
}

impl UploadArgs {
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            max_rows: self.max_rows,
            ..ReadOptions::default()
        }
    }
}

#[derive(Args)]
pub struct AiArgs {
    /// Map with the matcher only, never calling the hosted model.
    #[arg(long = "no-ai")]
    pub no_ai: bool,

    /// API key for the hosted model.
    #[arg(long = "api-key", env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name used for suggestions.
    #[arg(long = "model", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Upper bound on one suggestion request.
    #[arg(long = "ai-timeout-secs", value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

impl AiArgs {
    /// `None` when suggestions are switched off.
    pub fn suggestion_options(&self) -> Option<SuggestionOptions> {
        if self.no_ai {
            return None;
        }
        Some(
            SuggestionOptions::default()
                .with_api_key(self.api_key.clone())
                .with_model(self.model.clone())
                .with_timeout(Duration::from_secs(self.timeout_secs)),
        )
    }
}

#[derive(Args)]
pub struct RepositoryArgs {
    /// Directory holding saved mappings.
    #[arg(
        long = "repository",
        value_name = "DIR",
        env = "LEAD_MAPPER_REPOSITORY",
        default_value = "mappings"
    )]
    pub repository: PathBuf,
}

#[derive(Args)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    #[command(flatten)]
    pub ai: AiArgs,

    /// Workspace the mapping belongs to.
    #[arg(long = "workspace", value_name = "ID")]
    pub workspace: Option<String>,

    /// Save the mapping to the repository under --workspace.
    #[arg(long = "save", requires = "workspace")]
    pub save: bool,

    #[command(flatten)]
    pub repository: RepositoryArgs,

    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Args)]
pub struct FieldsArgs {
    /// Only this category (default: both).
    #[arg(short = 'c', long = "category", value_enum)]
    pub category: Option<CategoryArg>,

    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    /// Workspace the summary is kept under and whose saved mapping is used.
    #[arg(long = "workspace", value_name = "ID", default_value = "default")]
    pub workspace: String,

    #[command(flatten)]
    pub repository: RepositoryArgs,

    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Args)]
pub struct AskArgs {
    /// Question about the uploaded data.
    #[arg(value_name = "QUESTION")]
    pub question: String,

    /// Buyers file to answer from.
    #[arg(long = "buyers", value_name = "FILE", required_unless_present = "visitors")]
    pub buyers: Option<PathBuf>,

    /// Visitors file to answer from.
    #[arg(long = "visitors", value_name = "FILE")]
    pub visitors: Option<PathBuf>,

    /// Data rows read from each file.
    #[arg(long = "max-rows", value_name = "N", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,

    /// Workspace the summaries are kept under.
    #[arg(long = "workspace", value_name = "ID", default_value = "default")]
    pub workspace: String,

    /// Print the data context sent with the question.
    #[arg(long = "show-context")]
    pub show_context: bool,

    #[command(flatten)]
    pub ai: AiArgs,

    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

impl AskArgs {
    /// Files to read, buyers first.
    pub fn uploads(&self) -> Vec<(PathBuf, Category)> {
        [
            (self.buyers.as_ref(), Category::Buyers),
            (self.visitors.as_ref(), Category::Visitors),
        ]
        .into_iter()
        .filter_map(|(path, category)| path.map(|path| (path.clone(), category)))
        .collect()
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            max_rows: self.max_rows,
            ..ReadOptions::default()
        }
    }
}

#[derive(Subcommand)]
pub enum MappingCommand {
    /// List saved mappings.
    List {
        #[command(flatten)]
        repository: RepositoryArgs,

        #[arg(long = "format", value_enum, default_value = "table")]
        format: OutputFormatArg,
    },

    /// Show one saved mapping.
    Show {
        #[command(flatten)]
        target: MappingTarget,

        #[command(flatten)]
        repository: RepositoryArgs,

        #[arg(long = "format", value_enum, default_value = "table")]
        format: OutputFormatArg,
    },

    /// Delete one saved mapping.
    Delete {
        #[command(flatten)]
        target: MappingTarget,

        #[command(flatten)]
        repository: RepositoryArgs,
    },
}

#[derive(Args)]
pub struct MappingTarget {
    #[arg(long = "workspace", value_name = "ID")]
    pub workspace: String,

    #[arg(short = 'c', long = "category", value_enum)]
    pub category: CategoryArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    Buyers,
    Visitors,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Buyers => Category::Buyers,
            CategoryArg::Visitors => Category::Visitors,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
