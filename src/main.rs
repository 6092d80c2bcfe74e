use clap::{Parser, Subcommand};
use log::{debug, error};
use std::path::PathBuf;
use std::time::Duration;

use recipe_guard::{
    AppConfig, ProfileStore, RecipeDraft, RecipeGuard, StaticProfileStore, UserProfile,
};

/// Turn a link, a pasted recipe or a request into a recipe that fits your constraints
#[derive(Parser)]
#[command(name = "recipe-guard", version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one conversation turn and print the outcome as JSON
    Process {
        /// The user's message: a URL, a pasted recipe, a request or a question
        message: String,

        /// Conversation so far, oldest first
        #[arg(long, default_value = "")]
        history: String,

        /// JSON file with the recipe currently under discussion
        #[arg(long)]
        recipe: Option<PathBuf>,

        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Fetch a page and print the extracted recipe, no generation involved
    Extract {
        url: String,

        /// Page fetch timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Check a recipe JSON file against every rule without repairing it
    Validate {
        recipe: PathBuf,

        /// Ingredient the user asked for (repeatable)
        #[arg(long = "requested")]
        requested: Vec<String>,

        #[command(flatten)]
        profile: ProfileArgs,
    },
}

#[derive(clap::Args)]
struct ProfileArgs {
    /// Look the profile up in the `[profiles]` section of config.toml
    #[arg(long, conflicts_with_all = ["allergy", "appliance", "preferences"])]
    user: Option<String>,

    /// Allergy key such as peanuts or tree_nuts (repeatable)
    #[arg(long)]
    allergy: Vec<String>,

    /// Appliance key such as oven or air_fryer (repeatable)
    #[arg(long)]
    appliance: Vec<String>,

    /// Free-text preferences, e.g. "vegetarian, mild"
    #[arg(long, default_value = "")]
    preferences: String,
}

impl ProfileArgs {
    fn resolve(&self, config: Option<&AppConfig>) -> Result<UserProfile, Box<dyn std::error::Error>> {
        match (&self.user, config) {
            (Some(user), Some(config)) => Ok(StaticProfileStore::from_config(config)?.profile(user)?),
            (Some(_), None) => Err("--user needs a configuration with a [profiles] section".into()),
            (None, _) => Ok(UserProfile::from_keys(
                &self.allergy,
                &self.appliance,
                self.preferences.clone(),
            )?),
        }
    }
}

fn read_recipe(path: &PathBuf) -> Result<RecipeDraft, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Process {
            message,
            history,
            recipe,
            profile,
        } => {
            let config = AppConfig::load()?;
            let profile = profile.resolve(Some(&config))?;
            let current = recipe.as_ref().map(read_recipe).transpose()?;
            debug!("Profile: {:?}", profile);

            let guard = RecipeGuard::from_config(&config)?;
            let outcome = guard
                .process(&message, &history, current.as_ref(), &profile)
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Extract { url, timeout } => {
            let recipe =
                recipe_guard::extract_recipe_from_url(&url, timeout.map(Duration::from_secs))
                    .await?;
            println!("{}", serde_json::to_string_pretty(&recipe)?);
        }
        Commands::Validate {
            recipe,
            requested,
            profile,
        } => {
            let config = match profile.user {
                Some(_) => Some(AppConfig::load()?),
                None => None,
            };
            let profile = profile.resolve(config.as_ref())?;
            let draft = read_recipe(&recipe)?;
            let violations = recipe_guard::validate_recipe(&draft, &profile, &requested).await;
            println!("{}", serde_json::to_string_pretty(&violations)?);
            if !violations.is_empty() {
                std::process::exit(2);
            }
        }
    }
    Ok(())
}
