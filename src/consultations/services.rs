use lazy_static::lazy_static;
use regex::Regex;

use crate::consultations::dto::{ConsultationStatus, Konsultasi, KonsultasiRequest, NewKonsultasi, UpdateKonsultasiRequest};
use crate::error::AppError;
use crate::response::non_blank;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Semua field harus diisi";
pub const INVALID_EMAIL_MESSAGE: &str = "Format email tidak valid";

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Checks required fields and email format before anything is persisted.
pub fn validate_new(req: KonsultasiRequest) -> Result<NewKonsultasi, AppError> {
    let (Some(nama_lengkap), Some(nomor_whatsapp), Some(email), Some(jenis_permasalahan), Some(pesan)) = (
        non_blank(req.nama_lengkap),
        non_blank(req.nomor_whatsapp),
        non_blank(req.email),
        non_blank(req.jenis_permasalahan),
        non_blank(req.pesan),
    ) else {
        return Err(AppError::validation(REQUIRED_FIELDS_MESSAGE));
    };

    if !is_valid_email(&email) {
        return Err(AppError::validation(INVALID_EMAIL_MESSAGE));
    }

    Ok(NewKonsultasi {
        nama_lengkap,
        nomor_whatsapp,
        email,
        jenis_permasalahan,
        pesan,
        status: req.status.unwrap_or(ConsultationStatus::Pending),
        notes: non_blank(req.notes),
    })
}

/// Applies a partial admin edit. Blank `notes` clears them; blank values for
/// the other fields are ignored.
pub fn apply_update(mut row: Konsultasi, req: UpdateKonsultasiRequest) -> Result<Konsultasi, AppError> {
    if let Some(status) = req.status {
        row.status = status;
    }
    if let Some(notes) = req.notes {
        row.notes = non_blank(Some(notes));
    }
    if let Some(v) = non_blank(req.nama_lengkap) {
        row.nama_lengkap = v;
    }
    if let Some(v) = non_blank(req.nomor_whatsapp) {
        row.nomor_whatsapp = v;
    }
    if let Some(v) = non_blank(req.email) {
        if !is_valid_email(&v) {
            return Err(AppError::validation(INVALID_EMAIL_MESSAGE));
        }
        row.email = v;
    }
    if let Some(v) = non_blank(req.jenis_permasalahan) {
        row.jenis_permasalahan = v;
    }
    if let Some(v) = non_blank(req.pesan) {
        row.pesan = v;
    }
    Ok(row)
}
