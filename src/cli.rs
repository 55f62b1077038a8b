// Wallmix CLI binary

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;

use wallmix_lib::category::Category;
use wallmix_lib::config::Config;
use wallmix_lib::models::{Collection, WallpaperRecord};
use wallmix_lib::state::StateContainer;

#[derive(Parser)]
#[command(name = "wallmix")]
#[command(about = "Wallmix - Wallpapers from several providers in one feed", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory (defaults to ~/.wallmix)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Relay prefix used for providers without CORS headers
    #[arg(long, global = true)]
    relay: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse one page from every provider
    Browse {
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Category filter (see `wallmix categories`)
        #[arg(short, long)]
        category: Option<String>,
        /// Wait for the slower providers too
        #[arg(long)]
        wait: bool,
    },

    /// Free-text search across providers
    Search {
        query: String,
    },

    /// One random wallpaper
    Random,

    /// List browse categories
    Categories,

    /// Manage collections
    Collections {
        #[command(subcommand)]
        action: CollectionCommands,
    },
}

#[derive(Subcommand)]
enum CollectionCommands {
    /// List all collections
    List,

    /// Show a collection's wallpapers
    Show {
        id: String,
    },

    /// Create an empty collection
    Create {
        name: String,
    },

    /// Rename a collection
    Rename {
        id: String,
        name: String,
    },

    /// Delete a collection
    Delete {
        id: String,
    },

    /// Add search results to a collection
    Add {
        /// Collection ID
        id: String,
        /// Search query whose results are added
        #[arg(long)]
        from_search: String,
        /// How many results to add
        #[arg(long, default_value = "1")]
        take: usize,
    },

    /// Remove a wallpaper from a collection
    Remove {
        /// Collection ID
        id: String,
        /// Wallpaper ID
        wallpaper_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::from_env()
        .with_relay_url(cli.relay)
        .with_data_dir(cli.data_dir);
    let json = cli.json;

    match cli.command {
        Commands::Browse { page, category, wait } => {
            cmd_browse(&config, page, category, wait, json).await
        }
        Commands::Search { query } => cmd_search(&config, &query, json).await,
        Commands::Random => cmd_random(&config, json).await,
        Commands::Categories => cmd_categories(json),
        Commands::Collections { action } => cmd_collections(&config, action, json).await,
    }
}

async fn cmd_browse(
    config: &Config,
    page: u32,
    category: Option<String>,
    wait: bool,
    json: bool,
) -> Result<()> {
    let category = match category {
        Some(raw) => Category::parse_optional(&raw)?,
        None => None,
    };

    let mut state = StateContainer::from_config(config)?;
    state.fetch_wallpapers(page, category).await;

    if wait {
        state.complete_background().await;
    } else {
        // Take whatever the other providers already delivered
        state.poll_background();
    }

    let wallpapers = &state.state().wallpapers;
    if json {
        return print_json(wallpapers);
    }

    println!(
        "Page {} ({}): {} wallpapers",
        page.max(1),
        category.map(|c| c.as_str()).unwrap_or("all"),
        wallpapers.len()
    );
    println!();
    print_wallpapers(wallpapers);

    if state.state().is_background_loading {
        println!();
        println!("Other providers are still loading. Use --wait to include them.");
    }

    Ok(())
}

async fn cmd_search(config: &Config, query: &str, json: bool) -> Result<()> {
    let mut state = StateContainer::from_config(config)?;
    let results = state.search_wallpapers(query).await;

    if json {
        return print_json(&results);
    }

    println!("Search '{}': {} wallpapers", query.trim(), results.len());
    println!();
    print_wallpapers(&results);
    Ok(())
}

async fn cmd_random(config: &Config, json: bool) -> Result<()> {
    let state = StateContainer::from_config(config)?;
    let wallpaper = state.fetch_random_wallpaper().await?;

    if json {
        return print_json(&wallpaper);
    }

    print_wallpaper_details(&wallpaper);
    Ok(())
}

fn cmd_categories(json: bool) -> Result<()> {
    if json {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        return print_json(&names);
    }

    println!("{:<14}  {:<30}  {:>10}  {:>6}", "Category", "Query", "Categories", "Purity");
    println!("{}", "-".repeat(66));
    for category in Category::ALL {
        let modifier = category.modifier();
        println!(
            "{:<14}  {:<30}  {:>10}  {:>6}",
            category.as_str(),
            modifier.query_terms.unwrap_or("-"),
            modifier.categories.unwrap_or("-"),
            modifier.purity.unwrap_or("-")
        );
    }
    Ok(())
}

async fn cmd_collections(config: &Config, action: CollectionCommands, json: bool) -> Result<()> {
    let mut state = StateContainer::from_config(config)?;

    match action {
        CollectionCommands::List => {
            let collections = state.fetch_collections()?;
            if json {
                return print_json(&collections);
            }
            if collections.is_empty() {
                println!("No collections yet. Use 'wallmix collections create <name>' to make one.");
                return Ok(());
            }

            println!("{:>15}  {:>10}  {:>12}  {}", "ID", "Wallpapers", "Created", "Name");
            println!("{}", "-".repeat(60));
            for collection in &collections {
                println!(
                    "{:>15}  {:>10}  {:>12}  {}",
                    collection.id,
                    collection.wallpapers.len(),
                    collection.created.format("%Y-%m-%d"),
                    collection.name
                );
            }
        }
        CollectionCommands::Show { id } => {
            let collection = state.get_collection(&id)?;
            if json {
                return print_json(&collection);
            }
            print_collection_header(&collection);
            println!();
            if collection.wallpapers.is_empty() {
                println!(
                    "No wallpapers. Use 'wallmix collections add {} --from-search <query>'.",
                    collection.id
                );
            } else {
                print_wallpapers(&collection.wallpapers);
            }
        }
        CollectionCommands::Create { name } => {
            let collection = state.create_collection(&name)?;
            if json {
                return print_json(&collection);
            }
            println!("Created collection '{}' ({})", collection.name, collection.id);
        }
        CollectionCommands::Rename { id, name } => {
            let collection = state.rename_collection(&id, &name)?;
            if json {
                return print_json(&collection);
            }
            println!("Renamed collection {} to '{}'", collection.id, collection.name);
        }
        CollectionCommands::Delete { id } => {
            state.delete_collection(&id)?;
            if json {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            println!("Deleted collection {}", id);
        }
        CollectionCommands::Add { id, from_search, take } => {
            // Fail before hitting the network if the collection is unknown
            state.get_collection(&id)?;

            let picked: Vec<WallpaperRecord> = state
                .search_wallpapers(&from_search)
                .await
                .into_iter()
                .take(take)
                .collect();
            if picked.is_empty() {
                anyhow::bail!("No wallpapers found for '{}'", from_search);
            }

            let count = picked.len();
            let collection = state.add_to_collection(&id, picked)?;
            if json {
                return print_json(&collection);
            }
            println!(
                "Added {} wallpapers to '{}' ({} total)",
                count,
                collection.name,
                collection.wallpapers.len()
            );
        }
        CollectionCommands::Remove { id, wallpaper_id } => {
            let collection = state.remove_from_collection(&id, &wallpaper_id)?;
            if json {
                return print_json(&collection);
            }
            println!("Removed {} from '{}'", wallpaper_id, collection.name);
        }
    }

    Ok(())
}

// --- Helper Functions ---

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_wallpapers(wallpapers: &[WallpaperRecord]) {
    if wallpapers.is_empty() {
        println!("No wallpapers found.");
        return;
    }

    println!("{:>11}  {:>24}  {:>10}  {}", "Provider", "ID", "Resolution", "Title");
    println!("{}", "-".repeat(80));

    for wallpaper in wallpapers {
        println!(
            "{:>11}  {:>24}  {:>10}  {}",
            wallpaper.provider,
            truncate(&wallpaper.id, 24),
            truncate(&wallpaper.resolution, 10),
            truncate(&wallpaper.title, 30)
        );
    }
}

fn print_wallpaper_details(wallpaper: &WallpaperRecord) {
    println!("{}", wallpaper.title);
    println!();
    println!("Provider:    {}", wallpaper.provider.display_name());
    println!("ID:          {}", wallpaper.id);
    println!("Resolution:  {}", wallpaper.resolution);
    if let Some(category) = &wallpaper.category {
        println!("Category:    {}", category);
    }
    if wallpaper.views > 0 || wallpaper.favorites > 0 {
        println!("Views:       {}", wallpaper.views);
        println!("Favorites:   {}", wallpaper.favorites);
    }
    if let Some(copyright) = &wallpaper.copyright {
        println!("Copyright:   {}", copyright);
    }
    println!("Full:        {}", wallpaper.full_url);
    println!("Thumbnail:   {}", wallpaper.thumbnail_url);
    for url in &wallpaper.fallback_urls {
        println!("Fallback:    {}", url);
    }
}

fn print_collection_header(collection: &Collection) {
    println!("Collection {}", collection.id);
    println!("Name:        {}", collection.name);
    println!("Created:     {}", collection.created.format("%Y-%m-%d %H:%M"));
    println!("Wallpapers:  {}", collection.wallpapers.len());
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
