use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moviesieve::{
    genre_counts, group_by_age, select, AgeGroup, AppSettings, Collector, FileStore, MemoryStore,
    KeyValueStore, MovieDetail, MovieLoader, OmdbClient, Preset, ResultCache, Selection,
};

fn print_movie(movie: &MovieDetail) {
    println!("{} ({})", movie.title, movie.year);
    println!(
        "    IMDB: {} | MPAA: {} | Runtime: {}",
        movie.display_rating(),
        movie.rated,
        movie.runtime
    );
    println!("    Genre: {} | Language: {}", movie.genre, movie.language);
    if let Some(poster) = movie.poster_url() {
        println!("    Poster: {}", poster);
    }
    let links = movie.watch_links();
    println!("    YouTube: {}", links.youtube);
    println!("    Google: {}", links.google);
}

fn print_selection(selection: &Selection) {
    if let Some(message) = selection.empty_message() {
        println!("{}", message);
        return;
    }
    for movie in selection.movies() {
        print_movie(movie);
    }
}

fn print_age_groups(selection: &Selection) {
    if let Some(message) = selection.empty_message() {
        println!("{}", message);
        return;
    }
    let groups = group_by_age(selection.movies());
    let total: usize = groups.values().map(Vec::len).sum();
    println!("{} strictly safe movies found!", total);

    println!("Categories available:");
    let classified: Vec<MovieDetail> = groups.values().flatten().cloned().collect();
    for (genre, count) in genre_counts(&classified) {
        println!("  {} ({})", genre, count);
    }

    for group in AgeGroup::ALL {
        let Some(movies) = groups.get(&group) else {
            continue;
        };
        println!();
        println!("For {} ({} movies)", group, movies.len());
        for movie in movies {
            print_movie(movie);
        }
    }
}

async fn run<S: KeyValueStore>(settings: &AppSettings, store: S) {
    let client = OmdbClient::from_settings(settings);
    let collector = Collector::new(settings.search_terms.clone(), settings.max_pages_per_term);
    let cache = ResultCache::new(store, settings.cache_key.clone(), settings.min_viable_details);
    let loader = MovieLoader::new(Arc::new(client), collector, cache, settings.max_details);

    let loaded = loader.load().await;
    info!(
        "{} movie details available ({:?}, {} lookups failed)",
        loaded.details.len(),
        loaded.source,
        loaded.failed
    );

    let selection = select(&loaded.details, &settings.criteria());
    match settings.preset {
        Preset::FamilySafe => print_age_groups(&selection),
        Preset::WorstOf80sAnd90s | Preset::Browse => print_selection(&selection),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = match AppSettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !settings.is_valid() {
        if AppSettings::config_path().is_some_and(|p| !p.exists()) {
            if let Err(e) = settings.save() {
                error!("Failed to write default settings: {}", e);
            }
        }
        error!(
            "An OMDb API key is required: set {} or edit {}",
            moviesieve::settings::API_KEY_ENV,
            AppSettings::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| String::from("the settings file"))
        );
        return ExitCode::FAILURE;
    }

    match settings.cache_directory().map(FileStore::new) {
        Some(Ok(store)) => run(&settings, store).await,
        Some(Err(e)) => {
            error!("Cache directory unavailable ({}), using an in-memory cache", e);
            run(&settings, MemoryStore::new()).await
        }
        None => run(&settings, MemoryStore::new()).await,
    }

    ExitCode::SUCCESS
}
