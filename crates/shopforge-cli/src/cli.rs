use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "shopforge")]
#[command(about = "Generate storefront components and preview them in isolation", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the component from a raw model completion.
    Extract {
        /// Completion file; `-` or omitted reads stdin.
        input: Option<PathBuf>,
    },

    /// Run the advisory plausibility check and print the verdict as JSON.
    Check {
        input: Option<PathBuf>,
    },

    /// Build the preview document for a completion.
    Render {
        input: Option<PathBuf>,

        /// Write the document here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Render a completion in the preview runner and print the resolution as JSON.
    Preview {
        input: Option<PathBuf>,

        /// Runner command line; overrides SHOPFORGE_RUNNER.
        #[arg(long)]
        runner: Option<String>,

        /// Settle delay in milliseconds; overrides SHOPFORGE_SETTLE_DELAY_MS.
        #[arg(long)]
        settle_ms: Option<u64>,

        /// Keep listening this long after Ready for late faults.
        #[arg(long)]
        watch_ms: Option<u64>,

        #[arg(long, value_enum, default_value_t = Viewport::Desktop)]
        viewport: Viewport,
    },

    /// Generate (or refine) a page with the completion provider.
    Generate {
        /// What the shop sells and how it should feel.
        #[arg(long, short)]
        description: String,

        #[arg(long, value_enum, default_value_t = PageKind::Landing)]
        page_type: PageKind,

        /// Site to take design inspiration from.
        #[arg(long)]
        reference_url: Option<String>,

        /// Existing component to refine instead of generating from scratch.
        #[arg(long)]
        previous_code: Option<PathBuf>,

        /// Overrides SHOPFORGE_MODEL.
        #[arg(long)]
        model: Option<String>,

        /// Write the component here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the `{code, error}` response body instead of the raw component.
        #[arg(long)]
        json: bool,
    },

    /// Extract a completion and save the component file.
    Export {
        input: Option<PathBuf>,

        #[arg(long, default_value = crate::commands::EXPORT_FILE_NAME)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Viewport {
    Desktop,
    Mobile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PageKind {
    Landing,
    Product,
}
