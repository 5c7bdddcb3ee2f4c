use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "smart-organizer")]
#[command(about = "Sort loose files into category folders with descriptive names", long_about = None)]
pub struct Cli {
    /// Only process these configured roots (e.g. Desktop Downloads)
    #[arg(long, global = true, num_args = 1..)]
    pub folders: Vec<String>,

    /// Disable AI content analysis and use rule-based naming only
    #[arg(long, global = true)]
    pub no_ai: bool,

    /// OpenAI API key (falls back to OPENAI_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Skip confirmation prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Move every file in the selected roots into its category folder
    Organize,
    /// Re-analyze already organized files and fix categories and names
    Reanalyze {
        /// Show what would change without touching any file
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the API key format and test the connection
    TestApiKey,
    /// Print the effective configuration as TOML
    PrintConfig,
}
