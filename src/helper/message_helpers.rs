use super::form_helpers::{filter_value, is_valid_email, non_empty};
use super::{with_conn, ServiceError, ServiceResult};
use crate::models::db_operations::message_db_operations;
use crate::models::{ContactMessage, MessageForm, MessageKind};
use crate::DbPool;

pub const DEFAULT_MESSAGE_LIMIT: u32 = 100;

/// Checks a contact or consultation form. Consultations also need a phone and a topic.
pub fn validate_message(kind: MessageKind, form: &MessageForm) -> Vec<String> {
    let mut errors = Vec::new();
    if form.name.trim().is_empty() {
        errors.push("Nama wajib diisi".to_string());
    }
    if !is_valid_email(&form.email) {
        errors.push("Email tidak valid".to_string());
    }
    if kind == MessageKind::Consultation {
        if form.phone.trim().is_empty() {
            errors.push("No. telepon wajib diisi".to_string());
        }
        if form.consultation_type.trim().is_empty() {
            errors.push("Jenis konsultasi wajib dipilih".to_string());
        }
    }
    if form.message.trim().is_empty() {
        errors.push("Pesan wajib diisi".to_string());
    }
    errors
}

pub fn submit_message(pool: &DbPool, kind: MessageKind, form: &MessageForm) -> ServiceResult<i64> {
    let errors = validate_message(kind, form);
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors.join("; ")));
    }
    let phone = non_empty(&form.phone);
    let consultation_type = non_empty(&form.consultation_type);
    with_conn(pool, |conn| {
        Ok(message_db_operations::insert_message(
            conn,
            kind,
            form.name.trim(),
            form.email.trim(),
            phone.as_deref(),
            consultation_type.as_deref(),
            form.message.trim(),
        )?)
    })
}

/// `raw_kind` of `None`/`"all"` lists both kinds.
pub fn list_messages(pool: &DbPool, raw_kind: Option<&str>, limit: Option<u32>) -> ServiceResult<Vec<ContactMessage>> {
    let kind = match filter_value(raw_kind) {
        Some(raw) => Some(
            MessageKind::parse(&raw).ok_or_else(|| ServiceError::validation("Jenis pesan tidak valid"))?,
        ),
        None => None,
    };
    let limit = limit.unwrap_or(DEFAULT_MESSAGE_LIMIT).clamp(1, 1000);
    with_conn(pool, |conn| Ok(message_db_operations::read_messages(conn, kind, limit)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup::test_support::migrated_pool;

    fn form() -> MessageForm {
        MessageForm {
            name: "Ibu Rina".to_string(),
            email: "rina@example.com".to_string(),
            message: "Kapan pendaftaran dibuka?".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn consultation_needs_phone_and_type() {
        assert!(validate_message(MessageKind::Contact, &form()).is_empty());
        assert_eq!(validate_message(MessageKind::Consultation, &form()).len(), 2);
    }

    #[test]
    fn messages_are_persisted_and_filtered_by_kind() {
        let pool = migrated_pool();
        submit_message(&pool, MessageKind::Contact, &form()).unwrap();
        let mut consult = form();
        consult.phone = "0812".to_string();
        consult.consultation_type = "akademik".to_string();
        submit_message(&pool, MessageKind::Consultation, &consult).unwrap();

        assert_eq!(list_messages(&pool, None, None).unwrap().len(), 2);
        let only = list_messages(&pool, Some("consultation"), None).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].consultation_type.as_deref(), Some("akademik"));
        assert!(list_messages(&pool, Some("spam"), None).is_err());
    }
}
