//! `formfill` binary
//!
//! Lists templates, inspects their fields, and fills them from the command line.

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use formfill_cli::{describe_fields, fill, parse_assignment, resolve_template, Output};
use formfill_core::{FormConfig, Session, Templates};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "formfill")]
#[command(version, about = "Fill PDF form templates and save, print, or open them")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Template directory (overrides the configured one)
    #[arg(short, long)]
    templates: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available templates
    Templates,
    /// Show each field of a template and the control it binds to
    Fields {
        /// Template name or path
        template: String,
    },
    /// Fill a template and output it
    Fill {
        /// Template name or path
        template: String,

        /// Field assignment, repeatable
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
struct OutputArgs {
    /// Save to FILE
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Send to the configured viewer for printing
    #[arg(long)]
    print: bool,

    /// Open in the configured viewer
    #[arg(long)]
    open: bool,
}

impl OutputArgs {
    fn target(&self) -> Output {
        match &self.out {
            Some(path) => Output::File(path.clone()),
            None if self.print => Output::Print,
            None => Output::Open,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries command output; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = FormConfig::load_or_default(args.config.as_deref())?;
    if let Some(dir) = args.templates {
        config.templates_dir = dir;
    }
    let templates = Templates::scan(config.resolve_templates_dir());

    match args.command {
        Command::Templates => {
            for template in templates.iter() {
                println!("{}\t{}", template.name, template.path.display());
            }
        }
        Command::Fields { template } => {
            let path = resolve_template(&templates, &template)?;
            let mut session = Session::new();
            for line in describe_fields(&mut session, &path, &config)? {
                println!("{}", line);
            }
        }
        Command::Fill {
            template,
            assignments,
            output,
        } => {
            let path = resolve_template(&templates, &template)?;
            let written = fill(&config, &path, &assignments, &output.target())
                .inspect_err(|e| tracing::error!("Fill failed: {:#}", e))?;
            if let Some(written) = written {
                println!("{}", written.display());
            }
        }
    }

    Ok(())
}
