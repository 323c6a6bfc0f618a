use super::form_helpers::is_valid_email;
use super::{with_conn, ServiceError, ServiceResult};
use crate::models::db_operations::{admin_db_operations, is_unique_violation};
use crate::models::{AdminInput, AdminRole, AdminUser, PasswordChange};
use crate::DbPool;
use bcrypt::{hash, verify};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Profile fields after validation.
struct ValidAdmin {
    username: String,
    email: String,
    full_name: String,
    role: AdminRole,
}

fn validate_admin_input(input: &AdminInput) -> ServiceResult<ValidAdmin> {
    let username = input.username.trim();
    if username.is_empty() {
        return Err(ServiceError::validation("Username wajib diisi"));
    }
    if username.len() > 50 || !username.chars().all(|c| c.is_ascii_alphanumeric() || "_.-".contains(c)) {
        return Err(ServiceError::validation(
            "Username maksimal 50 karakter dan hanya boleh berisi huruf, angka, titik, garis bawah atau tanda hubung",
        ));
    }
    let email = input.email.trim();
    if email.len() > 100 || !is_valid_email(email) {
        return Err(ServiceError::validation("Email tidak valid"));
    }
    let full_name = input.full_name.trim();
    if full_name.is_empty() {
        return Err(ServiceError::validation("Nama lengkap wajib diisi"));
    }
    let role = match input.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => AdminRole::parse(raw).ok_or_else(|| ServiceError::validation("Role tidak valid"))?,
        None => AdminRole::Admin,
    };
    Ok(ValidAdmin {
        username: username.to_string(),
        email: email.to_string(),
        full_name: full_name.to_string(),
        role,
    })
}

fn validate_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::validation(format!(
            "Password minimal {} karakter",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn ensure_unique(pool: &DbPool, admin: &ValidAdmin, exclude_id: Option<i64>) -> ServiceResult<()> {
    let (username_taken, email_taken) = with_conn(pool, |conn| {
        Ok(admin_db_operations::find_conflicts(conn, &admin.username, &admin.email, exclude_id)?)
    })?;
    if username_taken {
        return Err(ServiceError::validation("Username sudah digunakan"));
    }
    if email_taken {
        return Err(ServiceError::validation("Email sudah digunakan"));
    }
    Ok(())
}

/// Maps a UNIQUE failure that slipped past [`ensure_unique`] (concurrent insert) to a validation error.
fn map_write_error(e: rusqlite::Error) -> ServiceError {
    if is_unique_violation(&e) {
        let message = e.to_string();
        if message.contains("email") {
            ServiceError::validation("Email sudah digunakan")
        } else {
            ServiceError::validation("Username sudah digunakan")
        }
    } else {
        ServiceError::DatabaseOperationFailed(e)
    }
}

pub fn create_admin(pool: &DbPool, input: &AdminInput, bcrypt_cost: u32) -> ServiceResult<AdminUser> {
    let admin = validate_admin_input(input)?;
    let password = input.password.as_deref().unwrap_or_default();
    validate_password(password)?;
    ensure_unique(pool, &admin, None)?;

    let password_hash = hash(password, bcrypt_cost)?;
    let id = with_conn(pool, |conn| {
        admin_db_operations::insert_admin(
            conn,
            &admin.username,
            &admin.email,
            &password_hash,
            &admin.full_name,
            admin.role,
        )
        .map_err(map_write_error)
    })?;
    find_admin_by_id(pool, id)
}

pub fn list_admins(pool: &DbPool) -> ServiceResult<Vec<AdminUser>> {
    with_conn(pool, |conn| Ok(admin_db_operations::read_all_admins(conn)?))
}

pub fn find_admin_by_id(pool: &DbPool, id: i64) -> ServiceResult<AdminUser> {
    with_conn(pool, |conn| Ok(admin_db_operations::read_admin_by_id(conn, id)?))?
        .ok_or_else(|| ServiceError::not_found("Admin tidak ditemukan"))
}

pub fn find_admin_by_username(pool: &DbPool, username: &str) -> ServiceResult<Option<AdminUser>> {
    with_conn(pool, |conn| Ok(admin_db_operations::read_admin_by_username(conn, username.trim())?))
}

pub fn find_admin_by_email(pool: &DbPool, email: &str) -> ServiceResult<Option<AdminUser>> {
    with_conn(pool, |conn| Ok(admin_db_operations::read_admin_by_email(conn, email.trim())?))
}

/// Updates profile fields; the password changes only when a non-empty one is supplied.
pub fn update_admin(pool: &DbPool, id: i64, input: &AdminInput, bcrypt_cost: u32) -> ServiceResult<AdminUser> {
    let admin = validate_admin_input(input)?;
    find_admin_by_id(pool, id)?;
    ensure_unique(pool, &admin, Some(id))?;

    let new_password = input.password.as_deref().filter(|p| !p.is_empty());
    let password_hash = match new_password {
        Some(password) => {
            validate_password(password)?;
            Some(hash(password, bcrypt_cost)?)
        }
        None => None,
    };

    with_conn(pool, |conn| {
        admin_db_operations::update_admin(
            conn,
            id,
            &admin.username,
            &admin.email,
            &admin.full_name,
            admin.role,
            password_hash.as_deref(),
        )
        .map_err(map_write_error)
    })?;
    find_admin_by_id(pool, id)
}

/// Deletes another admin account. Deleting the signed-in account is refused.
pub fn delete_admin(pool: &DbPool, id: i64, current_admin_id: i64) -> ServiceResult<AdminUser> {
    if id == current_admin_id {
        return Err(ServiceError::validation("Tidak dapat menghapus akun sendiri"));
    }
    let admin = find_admin_by_id(pool, id)?;
    with_conn(pool, |conn| Ok(admin_db_operations::delete_admin(conn, id)?))?;
    Ok(admin)
}

/// Looks up by username and verifies the bcrypt hash. Unknown user and wrong
/// password produce the same error.
pub fn authenticate_admin(pool: &DbPool, username: &str, password: &str) -> ServiceResult<AdminUser> {
    let admin = find_admin_by_username(pool, username)?.ok_or(ServiceError::InvalidCredentials)?;
    if verify(password, &admin.password_hash)? {
        Ok(admin)
    } else {
        Err(ServiceError::InvalidCredentials)
    }
}

pub fn change_password(pool: &DbPool, id: i64, change: &PasswordChange, bcrypt_cost: u32) -> ServiceResult<()> {
    let admin = find_admin_by_id(pool, id)?;
    if !verify(&change.current_password, &admin.password_hash)? {
        return Err(ServiceError::validation("Password saat ini salah"));
    }
    validate_password(&change.new_password)?;
    let password_hash = hash(&change.new_password, bcrypt_cost)?;
    with_conn(pool, |conn| Ok(admin_db_operations::update_password(conn, id, &password_hash)?))?;
    Ok(())
}

/// Sets a new password without knowing the old one (command line recovery).
pub fn reset_password(pool: &DbPool, username: &str, new_password: &str, bcrypt_cost: u32) -> ServiceResult<()> {
    let admin = find_admin_by_username(pool, username)?
        .ok_or_else(|| ServiceError::not_found(format!("Admin '{}' tidak ditemukan", username)))?;
    validate_password(new_password)?;
    let password_hash = hash(new_password, bcrypt_cost)?;
    with_conn(pool, |conn| Ok(admin_db_operations::update_password(conn, admin.id, &password_hash)?))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup::test_support::{migrated_pool, TEST_BCRYPT_COST};

    fn input(username: &str, email: &str) -> AdminInput {
        AdminInput {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Staf TU".to_string(),
            role: Some("admin".to_string()),
            password: Some("rahasia1".to_string()),
        }
    }

    #[test]
    fn authentication_does_not_reveal_which_part_failed() {
        let pool = migrated_pool();
        assert!(matches!(
            authenticate_admin(&pool, "admin", "wrong"),
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate_admin(&pool, "nobody", "admin123"),
            Err(ServiceError::InvalidCredentials)
        ));
        let admin = authenticate_admin(&pool, "admin", "admin123").unwrap();
        assert_eq!(admin.role, AdminRole::SuperAdmin);
    }

    #[test]
    fn duplicate_username_and_email_are_validation_errors() {
        let pool = migrated_pool();
        create_admin(&pool, &input("staf", "staf@example.com"), TEST_BCRYPT_COST).unwrap();

        let err = create_admin(&pool, &input("staf", "lain@example.com"), TEST_BCRYPT_COST).unwrap_err();
        assert_eq!(err.to_string(), "Username sudah digunakan");
        let err = create_admin(&pool, &input("lain", "staf@example.com"), TEST_BCRYPT_COST).unwrap_err();
        assert_eq!(err.to_string(), "Email sudah digunakan");
    }

    #[test]
    fn invalid_role_is_rejected() {
        let pool = migrated_pool();
        let mut bad = input("staf", "staf@example.com");
        bad.role = Some("root".to_string());
        assert!(matches!(create_admin(&pool, &bad, TEST_BCRYPT_COST), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn update_keeps_password_when_omitted() {
        let pool = migrated_pool();
        let created = create_admin(&pool, &input("staf", "staf@example.com"), TEST_BCRYPT_COST).unwrap();
        let mut changed = input("staf2", "staf2@example.com");
        changed.password = None;
        let updated = update_admin(&pool, created.id, &changed, TEST_BCRYPT_COST).unwrap();
        assert_eq!(updated.username, "staf2");
        assert!(authenticate_admin(&pool, "staf2", "rahasia1").is_ok());
    }

    #[test]
    fn self_delete_is_refused() {
        let pool = migrated_pool();
        assert!(matches!(delete_admin(&pool, 1, 1), Err(ServiceError::Validation(_))));
        let other = create_admin(&pool, &input("staf", "staf@example.com"), TEST_BCRYPT_COST).unwrap();
        delete_admin(&pool, other.id, 1).unwrap();
        assert!(matches!(find_admin_by_id(&pool, other.id), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn change_password_requires_current_password() {
        let pool = migrated_pool();
        let wrong = PasswordChange { current_password: "salah".to_string(), new_password: "baru123".to_string() };
        assert!(matches!(change_password(&pool, 1, &wrong, TEST_BCRYPT_COST), Err(ServiceError::Validation(_))));

        let right = PasswordChange { current_password: "admin123".to_string(), new_password: "baru123".to_string() };
        change_password(&pool, 1, &right, TEST_BCRYPT_COST).unwrap();
        assert!(authenticate_admin(&pool, "admin", "baru123").is_ok());
    }
}
