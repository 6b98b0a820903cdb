use sqlx::SqlitePool;
use uuid::Uuid;

use crate::consultations::dto::{ConsultationStatus, Konsultasi, NewKonsultasi};
use crate::db::now_utc;

const COLUMNS: &str = "id, nama_lengkap, nomor_whatsapp, email, jenis_permasalahan, pesan, status, notes, created_at, updated_at";

pub async fn insert(db: &SqlitePool, new: &NewKonsultasi) -> Result<Konsultasi, sqlx::Error> {
    let now = now_utc();
    sqlx::query_as::<_, Konsultasi>(&format!(
        r#"
        INSERT INTO consultations
            (id, nama_lengkap, nomor_whatsapp, email, jenis_permasalahan, pesan, status, notes, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&new.nama_lengkap)
    .bind(&new.nomor_whatsapp)
    .bind(&new.email)
    .bind(&new.jenis_permasalahan)
    .bind(&new.pesan)
    .bind(new.status)
    .bind(&new.notes)
    .bind(now)
    .fetch_one(db)
    .await
}

/// Newest first, optionally filtered by status.
pub async fn list(
    db: &SqlitePool,
    status: Option<ConsultationStatus>,
    limit: i64,
) -> Result<Vec<Konsultasi>, sqlx::Error> {
    sqlx::query_as::<_, Konsultasi>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM consultations
        WHERE ?1 IS NULL OR status = ?1
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?2
        "#
    ))
    .bind(status)
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn find(db: &SqlitePool, id: Uuid) -> Result<Option<Konsultasi>, sqlx::Error> {
    sqlx::query_as::<_, Konsultasi>(&format!("SELECT {COLUMNS} FROM consultations WHERE id = ?1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn save(db: &SqlitePool, row: &Konsultasi) -> Result<Konsultasi, sqlx::Error> {
    sqlx::query_as::<_, Konsultasi>(&format!(
        r#"
        UPDATE consultations
        SET nama_lengkap = ?2, nomor_whatsapp = ?3, email = ?4, jenis_permasalahan = ?5,
            pesan = ?6, status = ?7, notes = ?8, updated_at = ?9
        WHERE id = ?1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(row.id)
    .bind(&row.nama_lengkap)
    .bind(&row.nomor_whatsapp)
    .bind(&row.email)
    .bind(&row.jenis_permasalahan)
    .bind(&row.pesan)
    .bind(row.status)
    .bind(&row.notes)
    .bind(now_utc())
    .fetch_one(db)
    .await
}

pub async fn delete(db: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM consultations WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn count(db: &SqlitePool, status: Option<ConsultationStatus>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM consultations WHERE ?1 IS NULL OR status = ?1")
        .bind(status)
        .fetch_one(db)
        .await
}
