use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Pending,
    Contacted,
    Completed,
}

impl FromStr for ConsultationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "contacted" => Ok(Self::Contacted),
            "completed" => Ok(Self::Completed),
            _ => Err(()),
        }
    }
}

/// A visitor-submitted consultation request.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Konsultasi {
    pub id: Uuid,
    pub nama_lengkap: String,
    pub nomor_whatsapp: String,
    pub email: String,
    pub jenis_permasalahan: String,
    pub pesan: String,
    pub status: ConsultationStatus,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Contact form body; fields are optional so missing and empty values share
/// one error message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KonsultasiRequest {
    pub nama_lengkap: Option<String>,
    pub nomor_whatsapp: Option<String>,
    pub email: Option<String>,
    pub jenis_permasalahan: Option<String>,
    pub pesan: Option<String>,
    pub status: Option<ConsultationStatus>,
    pub notes: Option<String>,
}

/// Validated lead ready to persist.
#[derive(Debug, Clone)]
pub struct NewKonsultasi {
    pub nama_lengkap: String,
    pub nomor_whatsapp: String,
    pub email: String,
    pub jenis_permasalahan: String,
    pub pesan: String,
    pub status: ConsultationStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKonsultasiRequest {
    pub id: Option<Uuid>,
    pub status: Option<ConsultationStatus>,
    pub notes: Option<String>,
    pub nama_lengkap: Option<String>,
    pub nomor_whatsapp: Option<String>,
    pub email: Option<String>,
    pub jenis_permasalahan: Option<String>,
    pub pesan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedKonsultasi {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
