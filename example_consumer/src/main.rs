//! Example consumer: a separate Rust project that uses movie-catalog-sdk as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer -- /top-rated matrix`
//! Show one movie: `cargo run -p example-consumer -- /top-rated/movie/603`
//! Reload a catalog: `cargo run -p example-consumer -- reload top_rated movies.csv`
//! (credentials from `MOVIE_ADMIN_USERNAME` / `MOVIE_ADMIN_PASSWORD`).

use movie_catalog::{
    ClientConfig, ClientState, CsvUpload, DetailState, ListState, Resolution, Route, TenantId, UserLogin,
};

const MAX_REDIRECTS: usize = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("movie_catalog=info")),
        )
        .init();

    let config = ClientConfig::from_env()?;
    let state = ClientState::new(config)?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("reload") {
        return reload(&state, &args[1..]).await;
    }

    let mut path = args.first().cloned().unwrap_or_else(|| "/".to_string());
    let search = args.get(1).cloned();
    let mut resolver = state.resolver();

    for _ in 0..MAX_REDIRECTS {
        match resolver.resolve_path(&path).await? {
            Resolution::Redirect { to, .. } => {
                tracing::info!(from = %path, to = %to, "redirect");
                path = to;
            }
            Resolution::Resolved(tenant) => return show(&state, tenant, &path, search).await,
            Resolution::NotTenantScoped => {
                println!("{} is an admin page; use `reload <tenant> [file.csv]`", path);
                return Ok(());
            }
            Resolution::Suspended(_) => return Err("tenant directory not loaded".into()),
        }
    }
    Err(format!("too many redirects resolving {}", path).into())
}

async fn show(
    state: &ClientState,
    tenant: TenantId,
    path: &str,
    search: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Route::MovieDetail { tmdb_id, .. } = Route::parse(path) {
        match DetailState::load(&state.movies(), &tenant, &tmdb_id).await {
            DetailState::Found(movie) => {
                println!("{} ({})", movie.movie_name, movie.year.map(|y| y.to_string()).unwrap_or_default());
                println!("{} | {} | rating {:.1}", movie.genre, movie.runtime.as_deref().unwrap_or("-"), movie.rating);
                println!("{}", movie.overview);
            }
            DetailState::NotFound => println!("Movie not found"),
            DetailState::Failed(message) => println!("Error: {}", message),
            DetailState::Loading => {}
        }
        return Ok(());
    }

    let mut browser = state.browser(tenant);
    match search {
        Some(term) => {
            browser.on_search_input(term);
            browser.settle().await;
        }
        None => {
            browser.refresh().await;
        }
    }
    match browser.list() {
        ListState::Loaded(movies) if movies.is_empty() => println!("No movies found"),
        ListState::Loaded(movies) => {
            for movie in movies.iter() {
                println!("{:>8}  {:<40} {:.1}", movie.tmdb_id, movie.movie_name, movie.rating);
            }
        }
        ListState::Failed(message) => println!("Error: {}", message),
        ListState::Idle | ListState::Loading => {}
    }
    Ok(())
}

async fn reload(state: &ClientState, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let tenant = match args.first() {
        Some(raw) => TenantId::parse(raw)?,
        None => state.api.default_tenant().clone(),
    };
    let upload = match args.get(1) {
        Some(path) => Some(CsvUpload::from_path(path).await?),
        None => None,
    };

    let auth = state.auth();
    if !auth.is_authenticated() {
        let credentials = UserLogin {
            username: std::env::var("MOVIE_ADMIN_USERNAME").unwrap_or_default(),
            password: std::env::var("MOVIE_ADMIN_PASSWORD").unwrap_or_default(),
        };
        let user = auth.sign_in(&credentials).await?;
        tracing::info!(user = %user.username, "signed in");
    }

    let summary = state.admin().reload_movies(&tenant, upload).await?;
    println!("Loaded {} movies into {}", summary.loaded, summary.tenant);
    Ok(())
}
