use super::FilterClause;
use crate::models::{
    NewStudentRegistration, RegistrationQuery, RegistrationStats, RegistrationStatus, StudentRegistration,
};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as RusqliteResult, Row};

const REGISTRATION_COLUMNS: &str = "id, nama_lengkap, tempat_lahir, tanggal_lahir, jenis_kelamin, agama, alamat, \
     no_telepon, email, asal_sekolah, alamat_sekolah, tahun_lulus, nama_ayah, nama_ibu, pekerjaan_ayah, \
     pekerjaan_ibu, no_telepon_ortu, email_ortu, program_pilihan, motivasi, status, created_at, updated_at";

/// Columns matched by the free-text `search` option.
pub const SEARCH_COLUMNS: [&str; 5] = ["nama_lengkap", "asal_sekolah", "email", "nama_ayah", "nama_ibu"];

fn map_registration(row: &Row) -> RusqliteResult<StudentRegistration> {
    Ok(StudentRegistration {
        id: row.get(0)?,
        nama_lengkap: row.get(1)?,
        tempat_lahir: row.get(2)?,
        tanggal_lahir: row.get(3)?,
        jenis_kelamin: row.get(4)?,
        agama: row.get(5)?,
        alamat: row.get(6)?,
        no_telepon: row.get(7)?,
        email: row.get(8)?,
        asal_sekolah: row.get(9)?,
        alamat_sekolah: row.get(10)?,
        tahun_lulus: row.get(11)?,
        nama_ayah: row.get(12)?,
        nama_ibu: row.get(13)?,
        pekerjaan_ayah: row.get(14)?,
        pekerjaan_ibu: row.get(15)?,
        no_telepon_ortu: row.get(16)?,
        email_ortu: row.get(17)?,
        program_pilihan: row.get(18)?,
        motivasi: row.get(19)?,
        status: row.get(20)?,
        created_at: row.get(21)?,
        updated_at: row.get(22)?,
    })
}

fn filter_clause(query: &RegistrationQuery) -> FilterClause {
    let mut clause = FilterClause::new();
    if let Some(status) = query.status {
        clause.eq("status", status.as_str().to_string());
    }
    if let Some(program) = &query.program {
        clause.eq("program_pilihan", program.clone());
    }
    if let Some(term) = &query.search {
        clause.search(&SEARCH_COLUMNS, term);
    }
    clause
}

/// Stores a new registration with status `pending`. Returns the new id.
pub fn insert_registration(conn: &Connection, data: &NewStudentRegistration) -> RusqliteResult<i64> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO student_registrations (
            nama_lengkap, tempat_lahir, tanggal_lahir, jenis_kelamin, agama, alamat,
            no_telepon, email, asal_sekolah, alamat_sekolah, tahun_lulus,
            nama_ayah, nama_ibu, pekerjaan_ayah, pekerjaan_ibu, no_telepon_ortu, email_ortu,
            program_pilihan, motivasi, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?21)",
        params![
            data.nama_lengkap,
            data.tempat_lahir,
            data.tanggal_lahir,
            data.jenis_kelamin,
            data.agama,
            data.alamat,
            data.no_telepon,
            data.email,
            data.asal_sekolah,
            data.alamat_sekolah,
            data.tahun_lulus,
            data.nama_ayah,
            data.nama_ibu,
            data.pekerjaan_ayah,
            data.pekerjaan_ibu,
            data.no_telepon_ortu,
            data.email_ortu,
            data.program_pilihan,
            data.motivasi,
            RegistrationStatus::Pending,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_registration(conn: &Connection, id: i64) -> RusqliteResult<Option<StudentRegistration>> {
    conn.query_row(
        &format!("SELECT {} FROM student_registrations WHERE id = ?1", REGISTRATION_COLUMNS),
        [id],
        map_registration,
    )
    .optional()
}

/// Newest first. An empty id list returns no rows.
pub fn read_registrations_by_ids(conn: &Connection, ids: &[i64]) -> RusqliteResult<Vec<StudentRegistration>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM student_registrations WHERE id IN ({}) ORDER BY created_at DESC, id DESC",
        REGISTRATION_COLUMNS, placeholders
    ))?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), map_registration)?;
    rows.collect()
}

pub fn read_registrations(conn: &Connection, query: &RegistrationQuery) -> RusqliteResult<Vec<StudentRegistration>> {
    let clause = filter_clause(query);
    let mut sql = format!(
        "SELECT {} FROM student_registrations{} ORDER BY created_at DESC, id DESC",
        REGISTRATION_COLUMNS,
        clause.where_sql()
    );
    let mut params: Vec<Value> = clause.params().to_vec();
    clause.paginate(&mut sql, &mut params, query.limit, query.offset);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), map_registration)?;
    rows.collect()
}

/// Counts rows matching the same filter as [`read_registrations`], ignoring limit/offset.
pub fn count_registrations(conn: &Connection, query: &RegistrationQuery) -> RusqliteResult<i64> {
    let clause = filter_clause(query);
    conn.query_row(
        &format!("SELECT COUNT(*) FROM student_registrations{}", clause.where_sql()),
        params_from_iter(clause.params().iter()),
        |row| row.get(0),
    )
}

pub fn update_registration_status(conn: &Connection, id: i64, status: RegistrationStatus) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE student_registrations SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status, Utc::now(), id],
    )
}

pub fn delete_registration(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM student_registrations WHERE id = ?1", [id])
}

pub fn read_registration_stats(conn: &Connection) -> RusqliteResult<RegistrationStats> {
    conn.query_row(
        "SELECT
            COUNT(*),
            COUNT(CASE WHEN status = 'pending' THEN 1 END),
            COUNT(CASE WHEN status = 'approved' THEN 1 END),
            COUNT(CASE WHEN status = 'rejected' THEN 1 END),
            COUNT(CASE WHEN date(created_at) = date('now') THEN 1 END)
         FROM student_registrations",
        [],
        |row| {
            Ok(RegistrationStats {
                total: row.get(0)?,
                pending: row.get(1)?,
                approved: row.get(2)?,
                rejected: row.get(3)?,
                today: row.get(4)?,
            })
        },
    )
}
