use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use bookscout_catalog::Catalog;
use bookscout_catalog::catalog::{BOOK_ID_REQUIRED, CATEGORY_REQUIRED};
use bookscout_core::{AppConfig, Book, ExitCode, FavoritesStore, SearchFilters, SourceFilter};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "bookscout",
    about = "Search and browse books across Google Books and Open Library",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting BOOKSCOUT_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// User whose favorites are read and written (defaults to favorites.default_user).
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search both catalogs.
    Search {
        query: String,
        /// all, google or open-library.
        #[arg(long, default_value = "all")]
        source: SourceFilter,
        #[arg(long)]
        category: Option<String>,
        /// Minimum average rating, 0 to 5.
        #[arg(long, default_value = "0", value_parser = parse_min_rating)]
        min_rating: f64,
        #[arg(long)]
        has_preview: bool,
        /// Accepted for compatibility; not applied.
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show one book by id.
    Book { id: String },

    /// Books similar to the given one.
    Similar {
        id: String,
        #[arg(long, default_value = "4")]
        limit: usize,
    },

    /// Books in a category.
    Category {
        name: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Popular fiction.
    Popular {
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Favorites management.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    /// List saved books.
    List,
    /// Fetch a book and save it.
    Add { id: String },
    /// Remove a saved book.
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective config as TOML.
    Show,
    /// Print the config file path.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bookscout=info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .context("Failed to set global tracing subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing()?;

    let json_output = cli.json || std::env::var("BOOKSCOUT_JSON").as_deref() == Ok("1");
    let config = AppConfig::load()?;
    let user = cli
        .user
        .clone()
        .unwrap_or_else(|| config.favorites.default_user.clone());

    match cli.command {
        Commands::Search {
            query,
            source,
            category,
            min_rating,
            has_preview,
            language,
            page,
        } => {
            let filters = SearchFilters {
                source,
                category,
                min_rating,
                has_preview,
                language,
            };
            let catalog = Catalog::from_config(&config)?;
            let response = catalog.search(&query, &filters, page).await;
            let dur = start.elapsed().as_millis();

            if let Some(message) = &response.error {
                if json_output {
                    print_json(&json!({"status":"error","message":message,"meta":{"duration_ms":dur}}))?;
                } else {
                    eprintln!("{message}");
                }
                std::process::exit(ExitCode::GeneralError as i32);
            }

            if json_output {
                print_json(&json!({
                    "status": "ok",
                    "data": { "items": response.books, "total": response.books.len(), "query": query, "page": page },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if response.books.is_empty() {
                println!("No results for: {query}");
            } else {
                println!("Found {} results:", response.books.len());
                print_books(&response.books);
            }
        }

        Commands::Book { id } => {
            let catalog = Catalog::from_config(&config)?;
            let book = resolve_or_exit(&catalog, &id, json_output).await?;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&json!({"status":"ok","data":book,"meta":{"duration_ms":dur}}))?;
            } else {
                print_book_detail(&book);
            }
        }

        Commands::Similar { id, limit } => {
            let catalog = Catalog::from_config(&config)?;
            let book = resolve_or_exit(&catalog, &id, json_output).await?;
            let similar = catalog.get_similar(&book, limit).await;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&json!({
                    "status": "ok",
                    "data": { "book": book.id, "items": similar },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if similar.is_empty() {
                println!("No similar books found for: {}", book.title);
            } else {
                println!("Similar to {}:", book.title);
                print_books(&similar);
            }
        }

        Commands::Category { name, limit } => {
            if name.trim().is_empty() {
                fail(json_output, CATEGORY_REQUIRED, ExitCode::InvalidArgs);
            }
            let catalog = Catalog::from_config(&config)?;
            let books = catalog.get_by_category(&name, limit).await;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&json!({
                    "status": "ok",
                    "data": { "items": books, "total": books.len(), "category": name },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if books.is_empty() {
                println!("No books found in category: {name}");
            } else {
                print_books(&books);
            }
        }

        Commands::Popular { limit } => {
            let catalog = Catalog::from_config(&config)?;
            let books = catalog.get_popular(limit).await;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&json!({
                    "status": "ok",
                    "data": { "items": books, "total": books.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if books.is_empty() {
                println!("No popular books available right now.");
            } else {
                print_books(&books);
            }
        }

        Commands::Favorites { action } => {
            let store = FavoritesStore::new(config.favorites_dir());
            match action {
                FavoritesAction::List => {
                    let books = store.list(&user)?;
                    if json_output {
                        print_json(&json!({"status":"ok","data":{"user":user,"items":books}}))?;
                    } else if books.is_empty() {
                        println!("No favorites yet for {user}.");
                    } else {
                        print_books(&books);
                    }
                }
                FavoritesAction::Add { id } => {
                    let catalog = Catalog::from_config(&config)?;
                    let book = resolve_or_exit(&catalog, &id, json_output).await?;
                    let added = store.add(&user, &book)?;
                    if json_output {
                        print_json(&json!({"status":"ok","data":{"added":added,"book":book}}))?;
                    } else if added {
                        println!("Added to favorites: {}", book.title);
                    } else {
                        println!("Already in favorites: {}", book.title);
                    }
                }
                FavoritesAction::Remove { id } => {
                    let removed = store.remove(&user, &id)?;
                    if json_output {
                        print_json(&json!({"status":"ok","data":{"removed":removed,"id":id}}))?;
                    } else if removed {
                        println!("Removed from favorites: {id}");
                    } else {
                        eprintln!("Not in favorites: {id}");
                        std::process::exit(ExitCode::NotFound as i32);
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::to_value(&config)?)?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Path => println!("{}", AppConfig::config_path().display()),
        },
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Resolves `id` or exits with the not-found code.
async fn resolve_or_exit(catalog: &Catalog, id: &str, json_output: bool) -> Result<Book> {
    if id.trim().is_empty() {
        fail(json_output, BOOK_ID_REQUIRED, ExitCode::InvalidArgs);
    }
    match catalog.get_by_id(id).await {
        Some(book) => Ok(book),
        None => fail(json_output, &format!("Book not found: {id}"), ExitCode::NotFound),
    }
}

/// Reports `message` on the channel matching the output mode and exits.
fn parse_min_rating(raw: &str) -> std::result::Result<f64, String> {
    let value: f64 = raw.trim().parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=5.0).contains(&value) {
        return Err(format!("rating must be between 0 and 5, got {raw}"));
    }
    Ok(value)
}

fn fail(json_output: bool, message: &str, code: ExitCode) -> ! {
    if json_output {
        println!("{}", json!({"status":"error","message":message}));
    } else {
        eprintln!("{message}");
    }
    std::process::exit(code as i32);
}

fn format_book_line(book: &Book) -> String {
    let rating = if book.rating > 0.0 {
        format!("{:.1}★", book.rating)
    } else {
        "-".to_string()
    };
    format!(
        "{id:<24}  {title:<40}  {author:<25}  {rating:>5}  [{source}]",
        id = book.id,
        title = truncate(&book.title, 40),
        author = truncate(&book.author, 25),
        source = book.source,
    )
}

fn print_books(books: &[Book]) {
    for book in books {
        println!("  {}", format_book_line(book));
    }
}

fn print_book_detail(book: &Book) {
    println!("{}", book.title);
    println!("  by {}", book.author);
    println!("  id:         {}", book.id);
    println!("  source:     {}", book.source);
    println!("  published:  {} ({})", book.published_date, book.publisher);
    println!("  language:   {}", book.language);
    if book.rating > 0.0 {
        println!("  rating:     {:.1}", book.rating);
    }
    if !book.categories.is_empty() {
        println!("  categories: {}", book.categories.join(", "));
    }
    println!("  cover:      {}", book.cover_image);
    if let Some(link) = &book.preview_link {
        println!("  preview:    {link}");
    }
    println!();
    println!("{}", book.description);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
