use super::form_helpers::optional_non_empty;
use super::sanitization_helpers::strip_all_html;
use super::{with_conn, ServiceError, ServiceResult};
use crate::models::db_operations::content_db_operations::{self, DEFAULT_RATING};
use crate::models::{Slider, SliderInput, Testimonial, TestimonialInput};
use crate::DbPool;

fn required(value: &str, label: &str) -> ServiceResult<String> {
    let cleaned = strip_all_html(value.trim());
    if cleaned.is_empty() {
        return Err(ServiceError::validation(format!("{} wajib diisi", label)));
    }
    Ok(cleaned)
}

fn clean_testimonial(input: &TestimonialInput) -> ServiceResult<TestimonialInput> {
    let rating = input.rating.unwrap_or(DEFAULT_RATING);
    if !(1..=5).contains(&rating) {
        return Err(ServiceError::validation("Rating harus antara 1 dan 5"));
    }
    Ok(TestimonialInput {
        name: required(&input.name, "Nama")?,
        role: required(&input.role, "Peran")?,
        content: required(&input.content, "Isi testimoni")?,
        image: optional_non_empty(input.image.as_deref()),
        rating: Some(rating),
        is_active: Some(input.is_active.unwrap_or(true)),
        display_order: Some(input.display_order.unwrap_or(0)),
    })
}

fn clean_slider(input: &SliderInput) -> ServiceResult<SliderInput> {
    Ok(SliderInput {
        title: required(&input.title, "Judul")?,
        subtitle: optional_non_empty(input.subtitle.as_deref()).map(|s| strip_all_html(&s)),
        image: required(&input.image, "Gambar")?,
        link_url: optional_non_empty(input.link_url.as_deref()),
        link_text: optional_non_empty(input.link_text.as_deref()).map(|s| strip_all_html(&s)),
        is_active: Some(input.is_active.unwrap_or(true)),
        display_order: Some(input.display_order.unwrap_or(0)),
    })
}

// --- Testimonials ---

pub fn list_testimonials(pool: &DbPool) -> ServiceResult<Vec<Testimonial>> {
    with_conn(pool, |conn| Ok(content_db_operations::read_testimonials(conn, false)?))
}

pub fn find_testimonial(pool: &DbPool, id: i64) -> ServiceResult<Testimonial> {
    with_conn(pool, |conn| Ok(content_db_operations::read_testimonial(conn, id)?))?
        .ok_or_else(|| ServiceError::not_found("Testimoni tidak ditemukan"))
}

pub fn create_testimonial(pool: &DbPool, input: &TestimonialInput) -> ServiceResult<Testimonial> {
    let clean = clean_testimonial(input)?;
    let id = with_conn(pool, |conn| Ok(content_db_operations::insert_testimonial(conn, &clean)?))?;
    find_testimonial(pool, id)
}

pub fn update_testimonial(pool: &DbPool, id: i64, input: &TestimonialInput) -> ServiceResult<Testimonial> {
    let clean = clean_testimonial(input)?;
    let changed = with_conn(pool, |conn| Ok(content_db_operations::update_testimonial(conn, id, &clean)?))?;
    if changed == 0 {
        return Err(ServiceError::not_found("Testimoni tidak ditemukan"));
    }
    find_testimonial(pool, id)
}

pub fn delete_testimonial(pool: &DbPool, id: i64) -> ServiceResult<Testimonial> {
    let testimonial = find_testimonial(pool, id)?;
    with_conn(pool, |conn| Ok(content_db_operations::delete_testimonial(conn, id)?))?;
    Ok(testimonial)
}

// --- Sliders ---

pub fn list_sliders(pool: &DbPool) -> ServiceResult<Vec<Slider>> {
    with_conn(pool, |conn| Ok(content_db_operations::read_sliders(conn, false)?))
}

pub fn find_slider(pool: &DbPool, id: i64) -> ServiceResult<Slider> {
    with_conn(pool, |conn| Ok(content_db_operations::read_slider(conn, id)?))?
        .ok_or_else(|| ServiceError::not_found("Slider tidak ditemukan"))
}

pub fn create_slider(pool: &DbPool, input: &SliderInput) -> ServiceResult<Slider> {
    let clean = clean_slider(input)?;
    let id = with_conn(pool, |conn| Ok(content_db_operations::insert_slider(conn, &clean)?))?;
    find_slider(pool, id)
}

pub fn update_slider(pool: &DbPool, id: i64, input: &SliderInput) -> ServiceResult<Slider> {
    let clean = clean_slider(input)?;
    let changed = with_conn(pool, |conn| Ok(content_db_operations::update_slider(conn, id, &clean)?))?;
    if changed == 0 {
        return Err(ServiceError::not_found("Slider tidak ditemukan"));
    }
    find_slider(pool, id)
}

pub fn delete_slider(pool: &DbPool, id: i64) -> ServiceResult<Slider> {
    let slider = find_slider(pool, id)?;
    with_conn(pool, |conn| Ok(content_db_operations::delete_slider(conn, id)?))?;
    Ok(slider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup::test_support::migrated_pool;

    fn testimonial(rating: Option<i64>) -> TestimonialInput {
        TestimonialInput {
            name: "Fatimah".to_string(),
            role: "Alumni".to_string(),
            content: "<b>Sangat</b> berkesan".to_string(),
            rating,
            ..Default::default()
        }
    }

    #[test]
    fn rating_defaults_to_five_and_rejects_out_of_range() {
        let pool = migrated_pool();
        let created = create_testimonial(&pool, &testimonial(None)).unwrap();
        assert_eq!(created.rating, 5);
        assert_eq!(created.content, "Sangat berkesan");

        for bad in [0, 6, -1] {
            let err = create_testimonial(&pool, &testimonial(Some(bad))).unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
        let err = update_testimonial(&pool, created.id, &testimonial(Some(9))).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(find_testimonial(&pool, created.id).unwrap().rating, 5);
    }

    #[test]
    fn slider_requires_title_and_image() {
        let pool = migrated_pool();
        let missing_image = SliderInput { title: "PPDB".to_string(), ..Default::default() };
        assert!(matches!(create_slider(&pool, &missing_image), Err(ServiceError::Validation(_))));
        assert!(matches!(
            update_slider(&pool, 9999, &SliderInput { title: "x".into(), image: "y.jpg".into(), ..Default::default() }),
            Err(ServiceError::NotFound(_))
        ));
    }
}
