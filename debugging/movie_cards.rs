//! Fetch a listing or a movie through the TMDB client and print what the
//! frontend would render.
//! Usage:
//!   cargo run --bin movie_cards -- <popular|trending|top-rated|now-playing|upcoming> [page] [day|week]
//!   cargo run --bin movie_cards -- search <query> [page]
//!   cargo run --bin movie_cards -- detail <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use movie_explorer::config::Config;
use movie_explorer::models::{MovieCard, MovieDetail, MovieDetailView, MoviePage};
use movie_explorer::tmdb::{Category, MovieProvider, TimeWindow, TmdbClient};
use serde_json::Value;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin movie_cards -- <category> [page] [day|week]");
        eprintln!("       cargo run --bin movie_cards -- search <query> [page]");
        eprintln!("       cargo run --bin movie_cards -- detail <tmdb_id>");
        std::process::exit(1);
    }

    let config = Config::from_env()?;
    let client = TmdbClient::from_config(&config);

    match args[1].as_str() {
        "search" => {
            let query = args
                .get(2)
                .ok_or_else(|| anyhow!("missing search query"))?;
            let page = page_arg(args.get(3))?;
            let data = client.search_movies(query, page).await?;
            print_page(data)?;
        }
        "detail" => {
            let id: u64 = args
                .get(2)
                .ok_or_else(|| anyhow!("missing tmdb id"))?
                .parse()
                .context("tmdb id must be an integer")?;
            let data = client.movie_details(id).await?;
            print_detail(data)?;
        }
        other => {
            let category: Category = other.parse()?;
            let page = page_arg(args.get(2))?;
            let window = match args.get(3) {
                Some(w) => w.parse()?,
                None => TimeWindow::default(),
            };
            let data = client.list_movies(category, window, page).await?;
            print_page(data)?;
        }
    }

    Ok(())
}

fn page_arg(arg: Option<&String>) -> Result<u32> {
    match arg {
        Some(p) => p.parse().context("page must be a positive integer"),
        None => Ok(1),
    }
}

fn print_page(data: Value) -> Result<()> {
    let page: MoviePage = serde_json::from_value(data).context("unexpected listing shape")?;
    println!(
        "page {} of {} ({} results)",
        page.page.unwrap_or(1),
        page.total_pages.unwrap_or(1),
        page.total_results.unwrap_or(page.results.len() as u64)
    );
    if page.results.is_empty() {
        println!("No movies found");
        return Ok(());
    }
    for card in page.results.iter().map(MovieCard::from) {
        println!(
            "[{}] {} ({}) * {}\n    {}",
            card.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
            card.title,
            card.year,
            card.rating,
            card.poster_url
        );
    }
    Ok(())
}

fn print_detail(data: Value) -> Result<()> {
    let detail: MovieDetail = serde_json::from_value(data).context("unexpected detail shape")?;
    let view = MovieDetailView::from(&detail);
    println!("{}", view.title);
    if let Some(tagline) = &view.tagline {
        println!("  \"{}\"", tagline);
    }
    println!("  Rating:  {}/10 ({} votes)", view.rating, view.vote_count);
    println!("  Release: {}", view.release);
    println!("  Runtime: {}", view.runtime);
    if !view.genres.is_empty() {
        println!("  Genres:  {}", view.genres.join(", "));
    }
    if let Some(budget) = &view.budget {
        println!("  Budget:  {}", budget);
    }
    if let Some(revenue) = &view.revenue {
        println!("  Revenue: {}", revenue);
    }
    if let Some(homepage) = &view.homepage {
        println!("  Website: {}", homepage);
    }
    println!("  Poster:  {}", view.poster_url);
    if let Some(backdrop) = &view.backdrop_url {
        println!("  Backdrop: {}", backdrop);
    }
    if let Some(overview) = &view.overview {
        println!("\n{}", overview);
    }
    Ok(())
}
