use clap::{Parser, Subcommand};
use halo_spaces::{
    format_space_details, format_space_line, preferences_update, to_json, HALO_VERSION,
};
use hl_config::HaloConfig;
use hl_space::{CreateSpace, SkillStore, SpaceRepository, UpdateSpace};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "halo", version = HALO_VERSION, about = "Halo space registry")]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered spaces, newest first
    List,
    /// Show one space (use `halo-temp` for the temp space)
    Show { id: String },
    /// Create a space
    Create {
        name: String,
        #[arg(long, default_value = "folder")]
        icon: String,
        /// Adopt an existing folder instead of creating one under the spaces directory
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Rename a space or change its icon
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Show or update layout preferences
    Prefs {
        id: String,
        #[arg(long)]
        rail_expanded: Option<bool>,
        #[arg(long)]
        chat_width: Option<u32>,
    },
    /// Delete a space (adopted folders keep their files)
    Delete { id: String },
    /// Open a space in the file manager
    Open { id: String },
    /// Print every root the registry authorizes
    Paths,
    /// Inspect skill directories
    Skills {
        #[command(subcommand)]
        command: SkillCommands,
    },
    /// Print version
    Version,
}

#[derive(Subcommand)]
enum SkillCommands {
    /// List skills in the global directory or a space
    List {
        #[arg(long)]
        space: Option<String>,
    },
    /// Print the skills directory for the global scope or a space
    Dir {
        #[arg(long)]
        space: Option<String>,
    },
}

fn run(cli: Cli, config: &HaloConfig, repository: &Arc<SpaceRepository>) -> anyhow::Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::List => {
            let spaces = repository.list_spaces();
            if json {
                println!("{}", to_json(&spaces)?);
            } else if spaces.is_empty() {
                println!("No spaces yet. Create one with `halo create <name>`.");
            } else {
                for space in &spaces {
                    println!("{}", format_space_line(space));
                }
            }
        }

        Commands::Show { id } => {
            let space = repository.get_space(&id)?;
            if json {
                println!("{}", to_json(&space)?);
            } else {
                print!("{}", format_space_details(&space));
            }
        }

        Commands::Create { name, icon, path } => {
            let space = repository.create_space(CreateSpace {
                name,
                icon,
                custom_path: path,
            })?;
            if json {
                println!("{}", to_json(&space)?);
            } else {
                println!("Created space {} at {}", space.id, space.path.display());
            }
        }

        Commands::Update { id, name, icon } => {
            if name.is_none() && icon.is_none() {
                anyhow::bail!("Nothing to update: pass --name and/or --icon");
            }
            let space = repository.update_space(&id, UpdateSpace { name, icon })?;
            if json {
                println!("{}", to_json(&space)?);
            } else {
                println!("Updated space {}", space.id);
            }
        }

        Commands::Prefs {
            id,
            rail_expanded,
            chat_width,
        } => {
            let preferences = match preferences_update(rail_expanded, chat_width) {
                Some(update) => repository
                    .update_space_preferences(&id, update)?
                    .preferences
                    .unwrap_or_default(),
                None => repository.get_space_preferences(&id)?,
            };
            println!("{}", to_json(&preferences)?);
        }

        Commands::Delete { id } => {
            repository.delete_space(&id)?;
            if !json {
                println!("Deleted space {}", id);
            }
        }

        Commands::Open { id } => {
            repository.open_space_folder(&id)?;
        }

        Commands::Paths => {
            let paths = repository.get_all_space_paths();
            if json {
                println!("{}", to_json(&paths)?);
            } else {
                for path in paths {
                    println!("{}", path.display());
                }
            }
        }

        Commands::Skills { command } => {
            let global_dir = config.paths()?.global_skills_dir();
            let store = SkillStore::new(Arc::clone(repository), global_dir);
            match command {
                SkillCommands::List { space } => {
                    let names = store.list(space.as_deref())?;
                    if json {
                        println!("{}", to_json(&names)?);
                    } else {
                        for name in names {
                            println!("{}", name);
                        }
                    }
                }
                SkillCommands::Dir { space } => {
                    println!("{}", store.skills_dir(space.as_deref())?.display());
                }
            }
        }

        Commands::Version => {
            println!("halo {}", HALO_VERSION);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "halo=info,hl_space=info,hl_fs=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = HaloConfig::load()?;
    let repository = Arc::new(SpaceRepository::from_config(&config)?);
    tracing::debug!(
        spaces_dir = %repository.spaces_dir().display(),
        temp_dir = %repository.temp_dir().display(),
        "Space repository ready"
    );

    let result = run(cli, &config, &repository);
    repository.close();
    result
}
