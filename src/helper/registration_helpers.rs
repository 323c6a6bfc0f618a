use super::form_helpers::{filter_value, is_valid_email, non_empty};
use super::{with_conn, ServiceError, ServiceResult};
use crate::models::db_operations::registration_db_operations;
use crate::models::{
    NewStudentRegistration, Page, PageRequest, RegistrationFilter, RegistrationForm, RegistrationQuery,
    RegistrationStats, RegistrationStatus, StudentRegistration,
};
use crate::DbPool;
use chrono::{Datelike, NaiveDate, Utc};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MIN_GRADUATION_YEAR: i32 = 2000;
pub const GENDERS: [&str; 2] = ["Laki-laki", "Perempuan"];

/// Validates the public form. Returns every problem found, in form order.
pub fn validate_registration_form(form: &RegistrationForm) -> Result<NewStudentRegistration, Vec<String>> {
    let mut errors = Vec::new();

    let mut required = |value: &str, label: &str| -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            errors.push(format!("{} wajib diisi", label));
        }
        trimmed.to_string()
    };

    let nama_lengkap = required(&form.nama_lengkap, "Nama lengkap");
    let tempat_lahir = required(&form.tempat_lahir, "Tempat lahir");
    let tanggal_lahir_raw = required(&form.tanggal_lahir, "Tanggal lahir");
    let jenis_kelamin = required(&form.jenis_kelamin, "Jenis kelamin");
    let agama = required(&form.agama, "Agama");
    let alamat = required(&form.alamat, "Alamat");
    let asal_sekolah = required(&form.asal_sekolah, "Asal sekolah");
    let alamat_sekolah = required(&form.alamat_sekolah, "Alamat sekolah");
    let tahun_lulus_raw = required(&form.tahun_lulus, "Tahun lulus");
    let nama_ayah = required(&form.nama_ayah, "Nama ayah");
    let nama_ibu = required(&form.nama_ibu, "Nama ibu");
    let pekerjaan_ayah = required(&form.pekerjaan_ayah, "Pekerjaan ayah");
    let pekerjaan_ibu = required(&form.pekerjaan_ibu, "Pekerjaan ibu");
    let no_telepon_ortu = required(&form.no_telepon_ortu, "No. telepon orang tua");
    let program_pilihan = required(&form.program_pilihan, "Program pilihan");

    let tanggal_lahir = if tanggal_lahir_raw.is_empty() {
        None
    } else {
        let parsed = NaiveDate::parse_from_str(&tanggal_lahir_raw, "%Y-%m-%d").ok();
        if parsed.is_none() {
            errors.push("Tanggal lahir harus berformat YYYY-MM-DD".to_string());
        }
        parsed
    };

    if !jenis_kelamin.is_empty() && !GENDERS.contains(&jenis_kelamin.as_str()) {
        errors.push("Jenis kelamin harus Laki-laki atau Perempuan".to_string());
    }

    let max_year = Utc::now().year() + 1;
    let tahun_lulus = if tahun_lulus_raw.is_empty() {
        None
    } else {
        match tahun_lulus_raw.parse::<i32>() {
            Ok(year) if (MIN_GRADUATION_YEAR..=max_year).contains(&year) => Some(year),
            _ => {
                errors.push(format!("Tahun lulus harus antara {} dan {}", MIN_GRADUATION_YEAR, max_year));
                None
            }
        }
    };

    let email = non_empty(&form.email);
    if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
        errors.push("Email tidak valid".to_string());
    }
    let email_ortu = non_empty(&form.email_ortu);
    if email_ortu.as_deref().is_some_and(|e| !is_valid_email(e)) {
        errors.push("Email orang tua tidak valid".to_string());
    }

    match (tanggal_lahir, tahun_lulus) {
        (Some(tanggal_lahir), Some(tahun_lulus)) if errors.is_empty() => Ok(NewStudentRegistration {
            nama_lengkap,
            tempat_lahir,
            tanggal_lahir,
            jenis_kelamin,
            agama,
            alamat,
            no_telepon: non_empty(&form.no_telepon),
            email,
            asal_sekolah,
            alamat_sekolah,
            tahun_lulus,
            nama_ayah,
            nama_ibu,
            pekerjaan_ayah,
            pekerjaan_ibu,
            no_telepon_ortu,
            email_ortu,
            program_pilihan,
            motivasi: non_empty(&form.motivasi),
        }),
        _ => Err(errors),
    }
}

/// Turns raw filter options into a typed query. Unknown statuses are rejected.
pub fn parse_filter(filter: &RegistrationFilter) -> ServiceResult<RegistrationQuery> {
    let status = match filter_value(filter.status.as_deref()) {
        Some(raw) => Some(parse_status(&raw)?),
        None => None,
    };
    Ok(RegistrationQuery {
        status,
        program: filter_value(filter.program.as_deref()),
        search: filter_value(filter.search.as_deref()),
        limit: filter.limit,
        offset: filter.offset,
    })
}

pub fn parse_status(raw: &str) -> ServiceResult<RegistrationStatus> {
    RegistrationStatus::parse(raw).ok_or_else(|| {
        ServiceError::validation(format!(
            "Status tidak valid: '{}'. Gunakan pending, approved atau rejected",
            raw
        ))
    })
}

pub fn submit_registration(pool: &DbPool, form: &RegistrationForm) -> ServiceResult<StudentRegistration> {
    let data = validate_registration_form(form).map_err(|errors| ServiceError::Validation(errors.join("; ")))?;
    let id = with_conn(pool, |conn| Ok(registration_db_operations::insert_registration(conn, &data)?))?;
    find_registration(pool, id)
}

pub fn find_registration(pool: &DbPool, id: i64) -> ServiceResult<StudentRegistration> {
    with_conn(pool, |conn| Ok(registration_db_operations::read_registration(conn, id)?))?
        .ok_or_else(|| ServiceError::not_found("Pendaftaran tidak ditemukan"))
}

pub fn find_registrations_by_ids(pool: &DbPool, ids: &[i64]) -> ServiceResult<Vec<StudentRegistration>> {
    with_conn(pool, |conn| Ok(registration_db_operations::read_registrations_by_ids(conn, ids)?))
}

pub fn list_registrations(pool: &DbPool, query: &RegistrationQuery) -> ServiceResult<Vec<StudentRegistration>> {
    with_conn(pool, |conn| Ok(registration_db_operations::read_registrations(conn, query)?))
}

pub fn count_registrations(pool: &DbPool, query: &RegistrationQuery) -> ServiceResult<i64> {
    with_conn(pool, |conn| Ok(registration_db_operations::count_registrations(conn, query)?))
}

/// One page of registrations plus the matching total.
pub fn list_registrations_page(
    pool: &DbPool,
    filter: &RegistrationFilter,
    request: PageRequest,
) -> ServiceResult<Page<StudentRegistration>> {
    let mut query = parse_filter(filter)?;
    query.limit = Some(request.per_page);
    query.offset = Some(request.offset());
    let items = list_registrations(pool, &query)?;
    let total = count_registrations(pool, &query)?;
    Ok(Page::new(items, total, request))
}

pub fn recent_registrations(pool: &DbPool, limit: u32) -> ServiceResult<Vec<StudentRegistration>> {
    let query = RegistrationQuery { limit: Some(limit), ..Default::default() };
    list_registrations(pool, &query)
}

pub fn registration_stats(pool: &DbPool) -> ServiceResult<RegistrationStats> {
    with_conn(pool, |conn| Ok(registration_db_operations::read_registration_stats(conn)?))
}

/// Validates `raw_status` before touching storage.
pub fn update_registration_status(pool: &DbPool, id: i64, raw_status: &str) -> ServiceResult<StudentRegistration> {
    let status = parse_status(raw_status.trim())?;
    let changed = with_conn(pool, |conn| {
        Ok(registration_db_operations::update_registration_status(conn, id, status)?)
    })?;
    if changed == 0 {
        return Err(ServiceError::not_found("Pendaftaran tidak ditemukan"));
    }
    find_registration(pool, id)
}

pub fn delete_registration(pool: &DbPool, id: i64) -> ServiceResult<StudentRegistration> {
    let registration = find_registration(pool, id)?;
    with_conn(pool, |conn| Ok(registration_db_operations::delete_registration(conn, id)?))?;
    Ok(registration)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn sample_form(nama: &str, program: &str) -> RegistrationForm {
        RegistrationForm {
            nama_lengkap: nama.to_string(),
            tempat_lahir: "Bogor".to_string(),
            tanggal_lahir: "2011-04-12".to_string(),
            jenis_kelamin: "Laki-laki".to_string(),
            agama: "Islam".to_string(),
            alamat: "Jl. Melati No. 3".to_string(),
            asal_sekolah: "SDIT Al Hikmah".to_string(),
            alamat_sekolah: "Jl. Kenanga No. 1".to_string(),
            tahun_lulus: "2023".to_string(),
            nama_ayah: "Hasan".to_string(),
            nama_ibu: "Aisyah".to_string(),
            pekerjaan_ayah: "Guru".to_string(),
            pekerjaan_ibu: "Wiraswasta".to_string(),
            no_telepon_ortu: "081234567890".to_string(),
            program_pilihan: program.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::sample_form;
    use super::*;
    use crate::setup::db_setup::test_support::migrated_pool;

    #[test]
    fn round_trip_keeps_optional_fields_null() {
        let pool = migrated_pool();
        let created = submit_registration(&pool, &sample_form("Umar", "Tahfidz")).unwrap();
        let read = find_registration(&pool, created.id).unwrap();
        assert_eq!(read, created);
        assert_eq!(read.status, RegistrationStatus::Pending);
        assert_eq!(read.email, None);
        assert_eq!(read.motivasi, None);
        assert_eq!(read.tanggal_lahir, NaiveDate::from_ymd_opt(2011, 4, 12).unwrap());
    }

    #[test]
    fn validation_reports_every_problem() {
        let mut form = sample_form("", "Tahfidz");
        form.tanggal_lahir = "12/04/2011".to_string();
        form.jenis_kelamin = "L".to_string();
        form.tahun_lulus = "1999".to_string();
        form.email = "bukan-email".to_string();
        let errors = validate_registration_form(&form).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0], "Nama lengkap wajib diisi");
    }

    #[test]
    fn program_filter_and_search() {
        let pool = migrated_pool();
        submit_registration(&pool, &sample_form("Umar", "Tahfidz")).unwrap();
        submit_registration(&pool, &sample_form("Zahra Çelik", "Sains")).unwrap();

        let tahfidz = parse_filter(&RegistrationFilter { program: Some("Tahfidz".into()), ..Default::default() })
            .unwrap();
        assert_eq!(list_registrations(&pool, &tahfidz).unwrap().len(), 1);

        let search = parse_filter(&RegistrationFilter { search: Some("ÇELIK".into()), ..Default::default() }).unwrap();
        let found = list_registrations(&pool, &search).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].program_pilihan, "Sains");

        let all = parse_filter(&RegistrationFilter { status: Some("all".into()), ..Default::default() }).unwrap();
        assert_eq!(count_registrations(&pool, &all).unwrap(), 2);
    }

    #[test]
    fn invalid_status_leaves_record_unchanged() {
        let pool = migrated_pool();
        let created = submit_registration(&pool, &sample_form("Umar", "Tahfidz")).unwrap();
        let err = update_registration_status(&pool, created.id, "accepted").unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(find_registration(&pool, created.id).unwrap().status, RegistrationStatus::Pending);

        let approved = update_registration_status(&pool, created.id, "approved").unwrap();
        assert_eq!(approved.status, RegistrationStatus::Approved);
        assert!(matches!(
            update_registration_status(&pool, 9999, "approved"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn pages_slice_the_ordered_result() {
        let pool = migrated_pool();
        for i in 0..5 {
            submit_registration(&pool, &sample_form(&format!("Siswa {}", i), "Tahfidz")).unwrap();
        }
        let page = list_registrations_page(&pool, &RegistrationFilter::default(), PageRequest::new(Some(2), Some(2), 20))
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        let names: Vec<_> = page.items.iter().map(|r| r.nama_lengkap.as_str()).collect();
        assert_eq!(names, vec!["Siswa 2", "Siswa 1"]);
        assert!(page.has_next_page && page.has_prev_page);
    }

    #[test]
    fn stats_count_by_status() {
        let pool = migrated_pool();
        let a = submit_registration(&pool, &sample_form("A", "Tahfidz")).unwrap();
        submit_registration(&pool, &sample_form("B", "Sains")).unwrap();
        update_registration_status(&pool, a.id, "rejected").unwrap();
        let stats = registration_stats(&pool).unwrap();
        assert_eq!((stats.total, stats.pending, stats.rejected, stats.today), (2, 1, 1, 2));
    }
}
