use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};

use infra_mgmt::aggregate::AggregateConfig;
use infra_mgmt::backup::{create_backup_archive, purge_project, restore_archive};
use infra_mgmt::config_loader::load_config;
use infra_mgmt::layout::ProjectLayout;
use infra_mgmt::orchestrator::{
    generate_account_modules, generate_backend_tfvars, generate_iam_inputs, generate_iam_root_module,
    generate_org_accounts,
};
use infra_mgmt::registry::AccountDirectory;
use infra_mgmt::render::TeraRenderer;

/// Validates organization configuration and generates provisioning inputs
#[derive(Parser, Debug)]
#[command(name = "infra-mgmt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root; relative paths below are taken from here
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Directory holding header.yaml, iam.yaml, vpc-vpn-header.yaml and account-services/
    #[arg(long, default_value = "user_configs")]
    config_dir: PathBuf,

    /// Directory whose sub-directories are the available provisioning modules
    #[arg(long, default_value = "terraform/modules")]
    modules_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load and cross-validate the configuration
    Validate,

    /// Generate org.json and the organization stage variables
    Org,

    /// Generate the state backend stage variables
    Backend,

    /// Generate the IAM bootstrap document and root module
    Iam {
        /// Provisioning output of the organization stage
        #[arg(long)]
        org_output: Option<PathBuf>,

        /// Where to write the IAM bootstrap document
        #[arg(long)]
        iam_json: Option<PathBuf>,

        /// IAM root module directory
        #[arg(long)]
        iam_dir: Option<PathBuf>,

        /// IAM sub-module directory
        #[arg(long)]
        iam_module: Option<PathBuf>,
    },

    /// Generate one root module per provisioned account
    Accounts {
        /// Provisioning output of the organization stage
        #[arg(long)]
        org_output: Option<PathBuf>,

        /// Replace existing account module directories
        #[arg(long)]
        overwrite: bool,
    },

    /// Archive the current project configuration
    Backup {
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Remove the current project configuration
    Purge,

    /// Restore project configuration from a backup archive
    Restore {
        archive: PathBuf,
    },
}

fn load(layout: &ProjectLayout, cli: &Cli) -> Result<AggregateConfig> {
    let config_dir = layout.resolve(&cli.config_dir);
    let modules_dir = layout.resolve(&cli.modules_dir);
    load_config(&config_dir, &modules_dir)
        .wrap_err_with(|| format!("Invalid configuration in {:?}", config_dir))
}

fn load_directory(layout: &ProjectLayout, org_output: Option<&Path>) -> Result<AccountDirectory> {
    let path = org_output.map_or_else(|| layout.org_output_path(), |p| layout.resolve(p));
    let directory = AccountDirectory::from_json_file(&path)
        .wrap_err_with(|| format!("Failed to read provisioning output {:?}", path))?;
    info!("Loaded {} provisioned accounts from {:?}", directory.len(), path);
    Ok(directory)
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str())).init();

    let layout = ProjectLayout::new(&cli.project_dir);
    info!("Project directory: {:?}", layout.root());

    match &cli.command {
        Commands::Validate => {
            let config = load(&layout, &cli)?;
            println!("Configuration is valid");
            println!("  - Managed accounts: {}", config.header().managed_accounts.len());
            println!("  - Account documents: {}", config.accounts().len());
            println!("  - Network-enabled accounts: {}", config.network_accounts().count());
            println!("  - Groups: {}, users: {}", config.iam().groups.len(), config.iam().users.len());
        }
        Commands::Org => {
            let config = load(&layout, &cli)?;
            let renderer = TeraRenderer::new()?;
            generate_org_accounts(&config, &renderer, &layout.org_json_path(), &layout.org_dir())?;
        }
        Commands::Backend => {
            let config = load(&layout, &cli)?;
            let renderer = TeraRenderer::new()?;
            generate_backend_tfvars(&config, &renderer, &layout.backend_dir())?;
        }
        Commands::Iam {
            org_output,
            iam_json,
            iam_dir,
            iam_module,
        } => {
            let config = load(&layout, &cli)?;
            let directory = load_directory(&layout, org_output.as_deref())?;
            let renderer = TeraRenderer::new()?;

            let iam_json = iam_json.as_deref().map_or_else(|| layout.iam_json_path(), |p| layout.resolve(p));
            let iam_dir = iam_dir.as_deref().map_or_else(|| layout.iam_build_dir(), |p| layout.resolve(p));
            let iam_module = iam_module
                .as_deref()
                .map_or_else(|| layout.iam_module_dir(), |p| layout.resolve(p));

            generate_iam_inputs(&config, &directory, &iam_json)?;
            generate_iam_root_module(&config, &renderer, &iam_dir, &iam_module, &iam_json)?;
        }
        Commands::Accounts { org_output, overwrite } => {
            let config = load(&layout, &cli)?;
            let directory = load_directory(&layout, org_output.as_deref())?;
            let renderer = TeraRenderer::new()?;
            let modules = generate_account_modules(
                &config,
                &renderer,
                &directory,
                &layout.accounts_build_dir(),
                &layout.resolve(&cli.modules_dir),
                *overwrite,
            )?;
            println!("Generated {} account modules in {:?}", modules.len(), layout.accounts_build_dir());
        }
        Commands::Backup { output_dir } => {
            let output_dir = output_dir.as_deref().map_or_else(|| layout.backups_dir(), |p| layout.resolve(p));
            let archive = create_backup_archive(&layout, &output_dir)?;
            println!("Backup written to {:?}", archive);
        }
        Commands::Purge => {
            let removed = purge_project(&layout)?;
            println!("Removed {} paths", removed.len());
        }
        Commands::Restore { archive } => {
            let report = restore_archive(&layout, &layout.resolve(archive))
                .wrap_err_with(|| format!("Failed to restore {:?}", archive))?;
            println!(
                "Restored {} directories and {} account variable files",
                report.directories.len(),
                report.account_tfvars.len()
            );
        }
    }

    Ok(())
}
