use crate::models::{Slider, SliderInput, Testimonial, TestimonialInput};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as RusqliteResult, Row};

const TESTIMONIAL_COLUMNS: &str =
    "id, name, role, content, image, rating, is_active, display_order, created_at, updated_at";
const SLIDER_COLUMNS: &str =
    "id, title, subtitle, image, link_url, link_text, is_active, display_order, created_at, updated_at";
const DISPLAY_ORDER: &str = "ORDER BY display_order ASC, created_at DESC, id DESC";

pub const DEFAULT_RATING: i64 = 5;

fn map_testimonial(row: &Row) -> RusqliteResult<Testimonial> {
    Ok(Testimonial {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        image: row.get(4)?,
        rating: row.get(5)?,
        is_active: row.get(6)?,
        display_order: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn map_slider(row: &Row) -> RusqliteResult<Slider> {
    Ok(Slider {
        id: row.get(0)?,
        title: row.get(1)?,
        subtitle: row.get(2)?,
        image: row.get(3)?,
        link_url: row.get(4)?,
        link_text: row.get(5)?,
        is_active: row.get(6)?,
        display_order: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

// --- Testimonials ---

/// Missing options fall back to rating 5, active, order 0.
pub fn insert_testimonial(conn: &Connection, input: &TestimonialInput) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO testimonials (name, role, content, image, rating, is_active, display_order, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            input.name,
            input.role,
            input.content,
            input.image,
            input.rating.unwrap_or(DEFAULT_RATING),
            input.is_active.unwrap_or(true),
            input.display_order.unwrap_or(0),
            Utc::now()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_testimonial(conn: &Connection, id: i64, input: &TestimonialInput) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE testimonials SET name = ?1, role = ?2, content = ?3, image = ?4, rating = ?5,
            is_active = ?6, display_order = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            input.name,
            input.role,
            input.content,
            input.image,
            input.rating.unwrap_or(DEFAULT_RATING),
            input.is_active.unwrap_or(true),
            input.display_order.unwrap_or(0),
            Utc::now(),
            id
        ],
    )
}

pub fn delete_testimonial(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM testimonials WHERE id = ?1", [id])
}

pub fn read_testimonial(conn: &Connection, id: i64) -> RusqliteResult<Option<Testimonial>> {
    conn.query_row(
        &format!("SELECT {} FROM testimonials WHERE id = ?1", TESTIMONIAL_COLUMNS),
        [id],
        map_testimonial,
    )
    .optional()
}

pub fn read_testimonials(conn: &Connection, active_only: bool) -> RusqliteResult<Vec<Testimonial>> {
    let filter = if active_only { " WHERE is_active = 1" } else { "" };
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM testimonials{} {}",
        TESTIMONIAL_COLUMNS, filter, DISPLAY_ORDER
    ))?;
    let rows = stmt.query_map([], map_testimonial)?;
    rows.collect()
}

// --- Sliders ---

pub fn insert_slider(conn: &Connection, input: &SliderInput) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO sliders (title, subtitle, image, link_url, link_text, is_active, display_order, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            input.title,
            input.subtitle,
            input.image,
            input.link_url,
            input.link_text,
            input.is_active.unwrap_or(true),
            input.display_order.unwrap_or(0),
            Utc::now()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_slider(conn: &Connection, id: i64, input: &SliderInput) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE sliders SET title = ?1, subtitle = ?2, image = ?3, link_url = ?4, link_text = ?5,
            is_active = ?6, display_order = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            input.title,
            input.subtitle,
            input.image,
            input.link_url,
            input.link_text,
            input.is_active.unwrap_or(true),
            input.display_order.unwrap_or(0),
            Utc::now(),
            id
        ],
    )
}

pub fn delete_slider(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM sliders WHERE id = ?1", [id])
}

pub fn read_slider(conn: &Connection, id: i64) -> RusqliteResult<Option<Slider>> {
    conn.query_row(
        &format!("SELECT {} FROM sliders WHERE id = ?1", SLIDER_COLUMNS),
        [id],
        map_slider,
    )
    .optional()
}

pub fn read_sliders(conn: &Connection, active_only: bool) -> RusqliteResult<Vec<Slider>> {
    let filter = if active_only { " WHERE is_active = 1" } else { "" };
    let mut stmt = conn.prepare(&format!("SELECT {} FROM sliders{} {}", SLIDER_COLUMNS, filter, DISPLAY_ORDER))?;
    let rows = stmt.query_map([], map_slider)?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup::test_support::migrated_pool;

    #[test]
    fn active_testimonials_follow_display_order() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();
        conn.execute("DELETE FROM testimonials", []).unwrap();

        let input = |name: &str, order: i64, active: bool| TestimonialInput {
            name: name.to_string(),
            role: "Orang Tua".to_string(),
            content: "Bagus".to_string(),
            is_active: Some(active),
            display_order: Some(order),
            ..Default::default()
        };
        insert_testimonial(&conn, &input("second", 2, true)).unwrap();
        insert_testimonial(&conn, &input("hidden", 0, false)).unwrap();
        let first = insert_testimonial(&conn, &input("first", 1, true)).unwrap();

        let active = read_testimonials(&conn, true).unwrap();
        let names: Vec<_> = active.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(read_testimonials(&conn, false).unwrap().len(), 3);
        assert_eq!(read_testimonial(&conn, first).unwrap().map(|t| t.rating), Some(DEFAULT_RATING));
    }

    #[test]
    fn slider_update_and_delete_report_affected_rows() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();
        let id = insert_slider(
            &conn,
            &SliderInput { title: "PPDB".to_string(), image: "/public/img/ppdb.jpg".to_string(), ..Default::default() },
        )
        .unwrap();

        let changed = SliderInput {
            title: "PPDB 2025".to_string(),
            image: "/public/img/ppdb.jpg".to_string(),
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(update_slider(&conn, id, &changed).unwrap(), 1);
        let slider = read_slider(&conn, id).unwrap().unwrap();
        assert_eq!(slider.title, "PPDB 2025");
        assert!(!slider.is_active);

        assert_eq!(delete_slider(&conn, id).unwrap(), 1);
        assert_eq!(delete_slider(&conn, id).unwrap(), 0);
    }
}
