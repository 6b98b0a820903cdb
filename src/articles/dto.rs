use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::response::non_blank;

pub const DEFAULT_READ_TIME: &str = "5 menit";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub author: String,
    pub featured: bool,
    pub published: bool,
    pub image_url: Option<String>,
    pub read_time: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub featured: Option<bool>,
    pub published: Option<bool>,
    pub image_url: Option<String>,
    pub read_time: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub author: String,
    pub featured: bool,
    pub published: bool,
    pub image_url: Option<String>,
    pub read_time: String,
}

impl TryFrom<CreateArticleRequest> for NewArticle {
    type Error = AppError;

    fn try_from(req: CreateArticleRequest) -> Result<Self, Self::Error> {
        let (Some(title), Some(slug), Some(excerpt), Some(content), Some(category), Some(author)) = (
            non_blank(req.title),
            non_blank(req.slug),
            non_blank(req.excerpt),
            non_blank(req.content),
            non_blank(req.category),
            non_blank(req.author),
        ) else {
            return Err(AppError::validation("Missing required fields"));
        };
        Ok(Self {
            title,
            slug,
            excerpt,
            content,
            category,
            author,
            featured: req.featured.unwrap_or(false),
            published: req.published.unwrap_or(true),
            image_url: non_blank(req.image_url),
            read_time: non_blank(req.read_time).unwrap_or_else(|| DEFAULT_READ_TIME.to_string()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub featured: Option<bool>,
    pub published: Option<bool>,
    pub image_url: Option<String>,
    pub read_time: Option<String>,
}

impl UpdateArticleRequest {
    /// Blank strings leave a field untouched, except `imageUrl` where an empty
    /// string removes the cover image.
    pub fn apply(self, mut article: Article) -> Article {
        if let Some(v) = non_blank(self.title) {
            article.title = v;
        }
        if let Some(v) = non_blank(self.slug) {
            article.slug = v;
        }
        if let Some(v) = non_blank(self.excerpt) {
            article.excerpt = v;
        }
        if let Some(v) = non_blank(self.content) {
            article.content = v;
        }
        if let Some(v) = non_blank(self.category) {
            article.category = v;
        }
        if let Some(v) = non_blank(self.author) {
            article.author = v;
        }
        if let Some(v) = self.featured {
            article.featured = v;
        }
        if let Some(v) = self.published {
            article.published = v;
        }
        if let Some(v) = self.image_url {
            article.image_url = non_blank(Some(v));
        }
        if let Some(v) = non_blank(self.read_time) {
            article.read_time = v;
        }
        article
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminListQuery {
    pub limit: Option<String>,
    pub category: Option<String>,
    pub featured: Option<String>,
    pub published: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicQuery {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub limit: Option<String>,
    pub featured: Option<String>,
}

/// Filters for listing; `None`/`false` means "don't filter".
#[derive(Debug, Default, Clone)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub featured_only: bool,
    pub published_only: bool,
    pub limit: i64,
}

/// Public feed answers with a single article or a list.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ArticlesPayload {
    One(Article),
    Many(Vec<Article>),
}
