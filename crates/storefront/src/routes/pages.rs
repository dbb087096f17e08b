//! Server-rendered catalog pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use gamevault_core::ProductId;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::extract::{Path, Query};
use crate::filters;
use crate::models::{Product, ProductFilter, ProductQuery, ProductSort};
use crate::services::stats::StatsService;
use crate::state::AppState;

/// Games shown in each home page row.
const HOME_ROW_SIZE: usize = 8;

/// Build the page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/games", get(games_index))
        .route("/games/{id}", get(games_show))
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub popular: Vec<Product>,
    pub newest: Vec<Product>,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "games/index.html")]
pub struct GamesIndexTemplate {
    pub games: Vec<Product>,
    pub search: String,
    pub genre: String,
    pub platform: String,
    pub sort: &'static str,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Game detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "games/show.html")]
pub struct GameShowTemplate {
    pub game: Product,
}

/// Not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub path: String,
}

/// Popular games and newest arrivals.
#[instrument(skip(state))]
async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let popular = StatsService::new(state.pool())
        .popular_products(HOME_ROW_SIZE)
        .await?;

    let newest_filter = ProductFilter::from(ProductQuery {
        limit: Some(i64::try_from(HOME_ROW_SIZE).unwrap_or(ProductFilter::DEFAULT_LIMIT)),
        ..ProductQuery::default()
    });
    let (newest, _) = ProductRepository::new(state.pool())
        .list(&newest_filter)
        .await?;

    Ok(HomeTemplate { popular, newest })
}

/// Browse the catalog with the same filters as the JSON API.
#[instrument(skip(state))]
async fn games_index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<GamesIndexTemplate> {
    let filter = ProductFilter::from(query);
    let repo = ProductRepository::new(state.pool());

    let (games, total) = repo.list(&filter).await?;
    let genres = repo.genres().await?;
    let platforms = repo.platforms().await?;
    let total_pages = crate::db::total_pages(total, filter.limit);

    Ok(GamesIndexTemplate {
        prev_url: (filter.page > 1).then(|| page_url(&filter, filter.page - 1)),
        next_url: (filter.page < total_pages).then(|| page_url(&filter, filter.page + 1)),
        search: filter.search.clone().unwrap_or_default(),
        genre: filter.genre.clone().unwrap_or_default(),
        platform: filter.platform.clone().unwrap_or_default(),
        sort: sort_param(filter.sort),
        games,
        genres,
        platforms,
        page: filter.page,
        total,
        total_pages,
    })
}

/// A single game.
#[instrument(skip(state))]
async fn games_show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let game = ProductRepository::new(state.pool()).get_by_id(id).await?;
    Ok(match game {
        Some(game) => GameShowTemplate { game }.into_response(),
        None => not_found_page(format!("/games/{id}")),
    })
}

/// Render the not found page with a `404` status.
pub fn not_found_page(path: String) -> Response {
    (StatusCode::NOT_FOUND, NotFoundTemplate { path }).into_response()
}

/// Fallback for unknown page routes.
pub async fn fallback(uri: axum::http::Uri) -> Response {
    not_found_page(uri.path().to_owned())
}

/// Query-string value for a sort order.
const fn sort_param(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::Newest => "newest",
        ProductSort::PriceAsc => "price_asc",
        ProductSort::PriceDesc => "price_desc",
        ProductSort::Title => "title",
    }
}

/// Link to another page of the current catalog view.
fn page_url(filter: &ProductFilter, page: i64) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in [
        ("search", &filter.search),
        ("genre", &filter.genre),
        ("platform", &filter.platform),
    ] {
        if let Some(value) = value {
            query.append_pair(key, value);
        }
    }
    if filter.sort != ProductSort::default() {
        query.append_pair("sort", sort_param(filter.sort));
    }
    query.append_pair("page", &page.to_string());
    format!("/games?{}", query.finish())
}
