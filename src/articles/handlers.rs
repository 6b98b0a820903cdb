use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    articles::{
        dto::{AdminListQuery, Article, ArticleFilter, ArticlesPayload, CreateArticleRequest, NewArticle, PublicQuery, UpdateArticleRequest},
        repo,
    },
    auth::extractors::AdminUser,
    db::is_unique_violation,
    error::AppError,
    response::{flag, parse_limit, trimmed, ApiResponse, AppJson, AppQuery, IdParam},
    state::AppState,
};

const SLUG_TAKEN: &str = "Slug already exists";

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/articles", get(public_articles))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/articles",
        get(list).post(create).put(update).delete(remove),
    )
}

fn slug_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(SLUG_TAKEN.into())
    } else {
        AppError::Database(err)
    }
}

/// Public feed: one article by `id`/`slug`, otherwise published articles.
#[instrument(skip(state))]
pub async fn public_articles(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<PublicQuery>,
) -> Result<Json<ApiResponse<ArticlesPayload>>, AppError> {
    let single = match (trimmed(q.id), trimmed(q.slug)) {
        (Some(id), _) => Some(match Uuid::parse_str(&id) {
            Ok(id) => repo::find_by_id(&state.db, id).await?,
            Err(_) => None,
        }),
        (None, Some(slug)) => Some(repo::find_by_slug(&state.db, &slug).await?),
        (None, None) => None,
    };

    if let Some(found) = single {
        let article = found
            .filter(|a| a.published)
            .ok_or_else(|| AppError::not_found("Article not found"))?;
        return Ok(ApiResponse::data(ArticlesPayload::One(article)));
    }

    let filter = ArticleFilter {
        category: None,
        featured_only: flag(q.featured.as_deref()),
        published_only: true,
        limit: parse_limit(q.limit.as_deref(), 50),
    };
    let articles = repo::list(&state.db, &filter).await?;
    Ok(ApiResponse::data(ArticlesPayload::Many(articles)))
}

#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(q): AppQuery<AdminListQuery>,
) -> Result<Json<ApiResponse<Vec<Article>>>, AppError> {
    let filter = ArticleFilter {
        category: trimmed(q.category),
        featured_only: flag(q.featured.as_deref()),
        published_only: flag(q.published.as_deref()),
        limit: parse_limit(q.limit.as_deref(), 50),
    };
    Ok(ApiResponse::data(repo::list(&state.db, &filter).await?))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<CreateArticleRequest>,
) -> Result<Json<ApiResponse<Article>>, AppError> {
    let new = NewArticle::try_from(payload)?;

    if repo::slug_taken(&state.db, &new.slug, None).await? {
        warn!(slug = %new.slug, "duplicate slug on create");
        return Err(AppError::Conflict(SLUG_TAKEN.into()));
    }

    let article = repo::insert(&state.db, &new).await.map_err(slug_conflict)?;
    info!(id = %article.id, slug = %article.slug, "article created");
    Ok(ApiResponse::data(article))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<UpdateArticleRequest>,
) -> Result<Json<ApiResponse<Article>>, AppError> {
    let id = payload.id.ok_or_else(|| AppError::validation("ID is required"))?;
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Article not found"))?;

    let updated = payload.apply(existing);
    if repo::slug_taken(&state.db, &updated.slug, Some(id)).await? {
        warn!(slug = %updated.slug, %id, "duplicate slug on update");
        return Err(AppError::Conflict(SLUG_TAKEN.into()));
    }

    let article = repo::save(&state.db, &updated).await.map_err(slug_conflict)?;
    info!(%id, "article updated");
    Ok(ApiResponse::data(article))
}

#[instrument(skip(state, _admin))]
pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(param): AppQuery<IdParam>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = param.require()?;
    if !repo::delete(&state.db, id).await? {
        return Err(AppError::not_found("Article not found"));
    }
    info!(%id, "article deleted");
    Ok(ApiResponse::message("Article deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderValue, StatusCode};
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use crate::test_support::{admin_cookie, test_app, TestApp};

    fn article(slug: &str) -> Value {
        json!({
            "title": "Hak Tersangka",
            "slug": slug,
            "excerpt": "Ringkasan",
            "content": "Isi lengkap",
            "category": "pidana",
            "author": "Tim LBH"
        })
    }

    async fn create(app: &TestApp, cookie: &HeaderValue, body: Value) -> axum_test::TestResponse {
        app.server
            .post("/api/admin/articles")
            .add_header(header::COOKIE, cookie.clone())
            .json(&body)
            .await
    }

    #[sqlx::test]
    async fn create_applies_defaults(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        let res = create(&app, &cookie, article("hak-tersangka")).await;
        res.assert_status(StatusCode::OK);
        let data = &res.json::<Value>()["data"];
        assert_eq!(data["published"], true);
        assert_eq!(data["featured"], false);
        assert_eq!(data["readTime"], "5 menit");
        assert_eq!(data["imageUrl"], Value::Null);
    }

    #[sqlx::test]
    async fn duplicate_slug_on_create_conflicts(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        create(&app, &cookie, article("sama")).await.assert_status(StatusCode::OK);
        let res = create(&app, &cookie, article("sama")).await;

        res.assert_status(StatusCode::CONFLICT);
        assert_eq!(
            res.json::<Value>(),
            json!({ "success": false, "error": "Slug already exists" })
        );
    }

    #[sqlx::test]
    async fn duplicate_slug_on_update_conflicts(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        create(&app, &cookie, article("pertama")).await;
        let second = create(&app, &cookie, article("kedua")).await.json::<Value>();
        let id = second["data"]["id"].clone();

        let res = app
            .server
            .put("/api/admin/articles")
            .add_header(header::COOKIE, cookie.clone())
            .json(&json!({ "id": id, "slug": "pertama" }))
            .await;
        res.assert_status(StatusCode::CONFLICT);

        // keeping its own slug is fine
        let res = app
            .server
            .put("/api/admin/articles")
            .add_header(header::COOKIE, cookie)
            .json(&json!({ "id": id, "slug": "kedua", "featured": true }))
            .await;
        res.assert_status(StatusCode::OK);
        assert_eq!(res.json::<Value>()["data"]["featured"], true);
    }

    #[sqlx::test]
    async fn missing_fields_are_rejected(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        let res = create(&app, &cookie, json!({ "title": "x", "slug": "x" })).await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "Missing required fields");
    }

    #[sqlx::test]
    async fn public_feed_hides_drafts(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        create(&app, &cookie, article("terbit")).await;
        let mut draft = article("draf");
        draft["published"] = json!(false);
        create(&app, &cookie, draft).await;

        let list = app.server.get("/api/articles").await.json::<Value>();
        let slugs: Vec<&str> = list["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["terbit"]);

        app.server
            .get("/api/articles")
            .add_query_param("slug", "terbit")
            .await
            .assert_status(StatusCode::OK);
        app.server
            .get("/api/articles")
            .add_query_param("slug", "draf")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn delete_missing_article_is_not_found(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        app.server
            .delete("/api/admin/articles")
            .add_query_param("id", uuid::Uuid::new_v4().to_string())
            .add_header(header::COOKIE, cookie.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);

        app.server
            .delete("/api/admin/articles")
            .add_header(header::COOKIE, cookie)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn same_second_articles_list_newest_first(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;
        for slug in ["pertama", "kedua", "ketiga"] {
            create(&app, &cookie, article(slug)).await.assert_status(StatusCode::OK);
        }

        let slugs = |body: Value| -> Vec<String> {
            body["data"]
                .as_array()
                .unwrap()
                .iter()
                .map(|a| a["slug"].as_str().unwrap().to_string())
                .collect()
        };

        let public = app.server.get("/api/articles").await.json::<Value>();
        assert_eq!(slugs(public), vec!["ketiga", "kedua", "pertama"]);

        let latest = app
            .server
            .get("/api/admin/articles")
            .add_query_param("limit", "1")
            .add_header(header::COOKIE, cookie)
            .await
            .json::<Value>();
        assert_eq!(slugs(latest), vec!["ketiga"]);
    }

    #[sqlx::test]
    async fn body_text_is_stored_as_sent(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;
        let mut body = article("spasi");
        body["content"] = json!("  Paragraf pertama.\n\nParagraf kedua.\n");
        body["excerpt"] = json!(" Ringkasan ");

        let res = create(&app, &cookie, body).await;
        res.assert_status(StatusCode::OK);
        let data = &res.json::<Value>()["data"];
        assert_eq!(data["content"], "  Paragraf pertama.\n\nParagraf kedua.\n");
        assert_eq!(data["excerpt"], " Ringkasan ");
    }
}
