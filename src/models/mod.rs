use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Declares a closed set of values stored as lowercase text columns.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Parses the stored/transported representation. Unknown values yield `None`.
            pub fn parse(value: &str) -> Option<Self> {
                match value.trim() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                $name::parse(text).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown {} value '{}'", stringify!($name), text).into())
                })
            }
        }
    };
}

text_enum!(AdminRole {
    Admin => "admin",
    SuperAdmin => "super_admin",
});

text_enum!(RegistrationStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

text_enum!(NewsStatus {
    Draft => "draft",
    Published => "published",
    Archived => "archived",
});

text_enum!(MessageKind {
    Contact => "contact",
    Consultation => "consultation",
});

impl RegistrationStatus {
    /// Indonesian label used on exports and admin pages.
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "Menunggu",
            RegistrationStatus::Approved => "Diterima",
            RegistrationStatus::Rejected => "Ditolak",
        }
    }
}

// --- Admin accounts ---

#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: Option<String>,
    /// Required on create, optional on update.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

// --- Student registrations ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRegistration {
    pub id: i64,
    pub nama_lengkap: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: NaiveDate,
    pub jenis_kelamin: String,
    pub agama: String,
    pub alamat: String,
    pub no_telepon: Option<String>,
    pub email: Option<String>,
    pub asal_sekolah: String,
    pub alamat_sekolah: String,
    pub tahun_lulus: i32,
    pub nama_ayah: String,
    pub nama_ibu: String,
    pub pekerjaan_ayah: String,
    pub pekerjaan_ibu: String,
    pub no_telepon_ortu: String,
    pub email_ortu: Option<String>,
    pub program_pilihan: String,
    pub motivasi: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated registration ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudentRegistration {
    pub nama_lengkap: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: NaiveDate,
    pub jenis_kelamin: String,
    pub agama: String,
    pub alamat: String,
    pub no_telepon: Option<String>,
    pub email: Option<String>,
    pub asal_sekolah: String,
    pub alamat_sekolah: String,
    pub tahun_lulus: i32,
    pub nama_ayah: String,
    pub nama_ibu: String,
    pub pekerjaan_ayah: String,
    pub pekerjaan_ibu: String,
    pub no_telepon_ortu: String,
    pub email_ortu: Option<String>,
    pub program_pilihan: String,
    pub motivasi: Option<String>,
}

/// Raw public form payload. Field names follow the HTML form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub nama_lengkap: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: String,
    pub jenis_kelamin: String,
    pub agama: String,
    pub alamat: String,
    pub no_telepon: String,
    pub email: String,
    pub asal_sekolah: String,
    pub alamat_sekolah: String,
    pub tahun_lulus: String,
    pub nama_ayah: String,
    pub nama_ibu: String,
    pub pekerjaan_ayah: String,
    pub pekerjaan_ibu: String,
    pub no_telepon_ortu: String,
    pub email_ortu: String,
    pub program_pilihan: String,
    pub motivasi: String,
}

/// Filter options as received from callers; `status = "all"` means no filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationFilter {
    pub status: Option<String>,
    pub program: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Filter after validation at the service boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationQuery {
    pub status: Option<RegistrationStatus>,
    pub program: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistrationStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub today: i64,
}

// --- Activity logs ---

#[derive(Debug, Clone, Serialize)]
pub struct ActivityLog {
    pub id: i64,
    pub admin_id: Option<i64>,
    pub action: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewActivityLog {
    pub admin_id: Option<i64>,
    pub action: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityLogFilter {
    pub action: Option<String>,
    /// Calendar day, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub admin_id: Option<i64>,
    pub limit: Option<u32>,
}

// --- News ---

#[derive(Debug, Clone, Serialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub author_full_name: Option<String>,
    pub status: NewsStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

/// Row values written by insert/update, already validated.
#[derive(Debug, Clone)]
pub struct NewsRecord {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub status: NewsStatus,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsFilter {
    pub status: Option<String>,
    pub author_id: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsQuery {
    pub status: Option<NewsStatus>,
    pub author_id: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewsStats {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
    pub archived: i64,
    pub today: i64,
}

// --- Homepage content ---

#[derive(Debug, Clone, Serialize)]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub content: String,
    pub image: Option<String>,
    pub rating: i64,
    pub is_active: bool,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestimonialInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
    pub rating: Option<i64>,
    pub is_active: Option<bool>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Slider {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image: String,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub is_active: bool,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SliderInput {
    #[serde(default)]
    pub title: String,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub image: String,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i64>,
}

// --- Contact and consultation messages ---

#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub id: i64,
    pub kind: MessageKind,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub consultation_type: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "consultationType")]
    pub consultation_type: String,
    pub message: String,
}

// --- JSON envelope ---

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

// --- Pagination ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Normalizes user supplied values: page starts at 1, size is clamped to `1..=MAX_PER_PAGE`.
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let total_pages = total_pages(total, request.per_page);
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            total_pages,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

/// `ceil(total / per_page)`, zero for an empty result.
pub fn total_pages(total: i64, per_page: u32) -> u32 {
    if total <= 0 || per_page == 0 {
        return 0;
    }
    let per_page = i64::from(per_page);
    ((total + per_page - 1) / per_page) as u32
}

pub mod db_operations;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_enums_reject_unknown_values() {
        assert_eq!(RegistrationStatus::parse("approved"), Some(RegistrationStatus::Approved));
        assert_eq!(RegistrationStatus::parse("accepted"), None);
        assert_eq!(NewsStatus::parse("archived"), Some(NewsStatus::Archived));
        assert_eq!(NewsStatus::parse("Published"), None);
        assert_eq!(AdminRole::parse("super_admin"), Some(AdminRole::SuperAdmin));
    }

    #[test]
    fn registration_status_labels_are_indonesian() {
        let labels: Vec<_> = RegistrationStatus::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["Menunggu", "Diterima", "Ditolak"]);
    }

    #[test]
    fn page_flags_follow_total_pages() {
        let page = Page::new(vec![1, 2], 25, PageRequest::new(Some(3), Some(10), 20));
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);

        let first = Page::new(vec![1], 25, PageRequest::new(None, Some(10), 20));
        assert!(first.has_next_page);
        assert!(!first.has_prev_page);

        let empty = Page::<i32>::new(vec![], 0, PageRequest::new(Some(1), Some(10), 20));
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn page_request_clamps_inputs() {
        let request = PageRequest::new(Some(0), Some(1000), 20);
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, PageRequest::MAX_PER_PAGE);
        assert_eq!(PageRequest::new(Some(4), Some(5), 20).offset(), 15);
    }
}
