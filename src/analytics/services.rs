use serde::Serialize;
use sqlx::SqlitePool;
use time::{macros::format_description, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    analytics::repo::{self, PageCount, ReferrerCount},
    articles::{dto::Article, repo as articles_repo},
};

pub const DEFAULT_DAYS: i64 = 30;
const TOP_LIMIT: i64 = 10;
const SEO_ARTICLE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Period {
    #[serde(with = "time::serde::rfc3339")]
    pub from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to: OffsetDateTime,
    pub days: i64,
}

impl Period {
    /// Missing or unparsable input means the default window; anything else
    /// is clamped to `1..=365` days.
    pub fn from_days(raw: Option<&str>, to: OffsetDateTime) -> Self {
        let days = raw
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|d| *d != 0)
            .unwrap_or(DEFAULT_DAYS)
            .clamp(1, 365);
        Self {
            from: to - Duration::days(days),
            to,
            days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Traffic {
    pub total_page_views: i64,
    pub by_page: Vec<PageCount>,
    pub by_referrer: Vec<ReferrerCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSeo {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub published: bool,
    pub has_image: bool,
    pub title_length: usize,
    pub excerpt_length: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Article> for ArticleSeo {
    fn from(a: &Article) -> Self {
        Self {
            id: a.id,
            title: a.title.clone(),
            slug: a.slug.clone(),
            published: a.published,
            has_image: a.image_url.is_some(),
            title_length: a.title.chars().count(),
            excerpt_length: a.excerpt.chars().count(),
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoSummary {
    pub total_articles: usize,
    pub published_articles: usize,
    pub with_image: usize,
    pub without_image: usize,
    pub avg_title_length: usize,
    pub avg_excerpt_length: usize,
}

impl SeoSummary {
    pub fn of(articles: &[ArticleSeo]) -> Self {
        let total = articles.len();
        if total == 0 {
            return Self::default();
        }
        let with_image = articles.iter().filter(|a| a.has_image).count();
        let avg = |sum: usize| (sum as f64 / total as f64).round() as usize;
        Self {
            total_articles: total,
            published_articles: articles.iter().filter(|a| a.published).count(),
            with_image,
            without_image: total - with_image,
            avg_title_length: avg(articles.iter().map(|a| a.title_length).sum()),
            avg_excerpt_length: avg(articles.iter().map(|a| a.excerpt_length).sum()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    #[serde(flatten)]
    pub summary: SeoSummary,
    pub articles: Vec<ArticleSeo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub period: Period,
    pub traffic: Traffic,
    pub seo: Seo,
}

/// Dashboard report: top pages and referrers only, at most 50 article rows.
pub async fn dashboard_report(db: &SqlitePool, period: Period) -> Result<AnalyticsReport, sqlx::Error> {
    build_report(db, period, Some(TOP_LIMIT), Some(SEO_ARTICLE_LIMIT)).await
}

/// Everything in the period, used for the CSV export.
pub async fn full_report(db: &SqlitePool, period: Period) -> Result<AnalyticsReport, sqlx::Error> {
    build_report(db, period, None, None).await
}

async fn build_report(
    db: &SqlitePool,
    period: Period,
    top: Option<i64>,
    article_rows: Option<usize>,
) -> Result<AnalyticsReport, sqlx::Error> {
    let (total, by_page, by_referrer, articles) = tokio::try_join!(
        repo::count_between(db, period.from, period.to),
        repo::top_pages(db, period.from, period.to, top),
        repo::top_referrers(db, period.from, period.to, top),
        articles_repo::all(db),
    )?;

    let rows: Vec<ArticleSeo> = articles.iter().map(ArticleSeo::from).collect();
    let summary = SeoSummary::of(&rows);
    let rows = match article_rows {
        Some(n) => rows.into_iter().take(n).collect(),
        None => rows,
    };

    Ok(AnalyticsReport {
        period,
        traffic: Traffic {
            total_page_views: total,
            by_page,
            by_referrer,
        },
        seo: Seo {
            summary,
            articles: rows,
        },
    })
}

fn display_date(at: OffsetDateTime) -> String {
    at.format(format_description!("[day]/[month]/[year] [hour]:[minute]"))
        .unwrap_or_else(|_| at.to_string())
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "Ya"
    } else {
        "Tidak"
    }
}

/// `;`-separated report with CRLF line endings, as spreadsheet tools in the
/// `id-ID` locale expect.
pub fn render_csv(report: &AnalyticsReport, generated_at: OffsetDateTime) -> String {
    let Period { from, to, days } = report.period;
    let seo = &report.seo.summary;
    let mut lines: Vec<String> = vec![
        "Laporan Analitik & SEO Website".into(),
        format!("Periode;{};{} ({} hari)", display_date(from), display_date(to), days),
        format!("Dibuat pada;{}", display_date(generated_at)),
        String::new(),
        "Ringkasan Trafik".into(),
        "Metrik;Nilai".into(),
        format!("Total Page Views;{}", report.traffic.total_page_views),
        String::new(),
        "Ringkasan SEO Artikel".into(),
        "Metrik;Nilai".into(),
        format!("Total Artikel;{}", seo.total_articles),
        format!("Artikel Dipublikasikan;{}", seo.published_articles),
        format!("Artikel dengan Gambar;{}", seo.with_image),
        format!("Artikel tanpa Gambar;{}", seo.without_image),
        format!("Rata-rata Panjang Judul;{} karakter", seo.avg_title_length),
        format!("Rata-rata Panjang Ringkasan;{} karakter", seo.avg_excerpt_length),
        String::new(),
        "Statistik Halaman".into(),
        "No;Halaman;Page Views".into(),
    ];

    for (i, p) in report.traffic.by_page.iter().enumerate() {
        lines.push(format!("{};{};{}", i + 1, p.path, p.page_views));
    }
    lines.push(String::new());

    lines.push("Sumber Trafik (Referrer)".into());
    lines.push("No;Sumber;Page Views".into());
    for (i, r) in report.traffic.by_referrer.iter().enumerate() {
        lines.push(format!("{};{};{}", i + 1, r.referrer, r.page_views));
    }
    lines.push(String::new());

    lines.push("Detail Artikel untuk SEO".into());
    lines.push(
        "No;Judul;Slug;Dipublikasikan;Memiliki Gambar;Panjang Judul;Panjang Ringkasan;Tanggal Dibuat"
            .into(),
    );
    for (i, a) in report.seo.articles.iter().enumerate() {
        lines.push(format!(
            "{};{};{};{};{};{};{};{}",
            i + 1,
            quote(&a.title),
            a.slug,
            yes_no(a.published),
            yes_no(a.has_image),
            a.title_length,
            a.excerpt_length,
            display_date(a.created_at),
        ));
    }

    lines.join("\r\n")
}

pub fn export_file_name(at: OffsetDateTime) -> String {
    format!("laporan-analitik-seo-{}.csv", at.date())
}
