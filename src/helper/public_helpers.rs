use super::{with_conn, ServiceResult};
use crate::models::db_operations::{content_db_operations, news_db_operations};
use crate::models::{News, Slider, Testimonial};
use crate::DbPool;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Supplies homepage content when the database cannot be read.
pub trait FallbackContent: Send + Sync {
    fn testimonials(&self) -> Vec<Testimonial>;
    fn sliders(&self) -> Vec<Slider>;
}

/// Built-in placeholder dataset. Also used to seed empty tables.
pub struct StaticFallbackContent;

struct StaticTestimonial {
    name: &'static str,
    role: &'static str,
    image: &'static str,
    rating: i64,
    content: &'static str,
}

const TESTIMONIALS: &[StaticTestimonial] = &[
    StaticTestimonial {
        name: "Ahmad Fauzi",
        role: "Orang Tua Siswa",
        image: "/public/img/testimonials/1.png",
        rating: 5,
        content: "SMPTI Baituljannah telah mengubah pengalaman belajar anak saya. Program-programnya terstruktur dengan baik dan para pengajar sangat berkualitas.",
    },
    StaticTestimonial {
        name: "Siti Rahmawati",
        role: "Alumni 2023",
        image: "/public/img/testimonials/2.png",
        rating: 5,
        content: "Pendekatan belajar yang interaktif dan proyek praktiknya sangat membantu saya memahami teknologi informasi lebih dalam.",
    },
    StaticTestimonial {
        name: "Budi Santoso",
        role: "Orang Tua Siswa",
        image: "/public/img/testimonials/3.png",
        rating: 4,
        content: "Lingkungan sekolah yang islami dan kurikulum yang selalu mengikuti perkembangan teknologi.",
    },
];

struct StaticSlider {
    title: &'static str,
    subtitle: &'static str,
    image: &'static str,
    link_url: &'static str,
    link_text: &'static str,
}

const SLIDERS: &[StaticSlider] = &[
    StaticSlider {
        title: "Selamat Datang di SMPTI Baituljannah",
        subtitle: "Sekolah Teknologi Informasi berbasis nilai-nilai Islami",
        image: "/public/img/sliders/1.jpg",
        link_url: "/courses",
        link_text: "Lihat Program",
    },
    StaticSlider {
        title: "Penerimaan Peserta Didik Baru",
        subtitle: "Pendaftaran siswa baru telah dibuka",
        image: "/public/img/sliders/2.jpg",
        link_url: "/daftar-siswa",
        link_text: "Daftar Sekarang",
    },
];

impl FallbackContent for StaticFallbackContent {
    fn testimonials(&self) -> Vec<Testimonial> {
        TESTIMONIALS
            .iter()
            .enumerate()
            .map(|(i, t)| Testimonial {
                id: i as i64 + 1,
                name: t.name.to_string(),
                role: t.role.to_string(),
                content: t.content.to_string(),
                image: Some(t.image.to_string()),
                rating: t.rating,
                is_active: true,
                display_order: i as i64 + 1,
                created_at: DateTime::<Utc>::default(),
                updated_at: DateTime::<Utc>::default(),
            })
            .collect()
    }

    fn sliders(&self) -> Vec<Slider> {
        SLIDERS
            .iter()
            .enumerate()
            .map(|(i, s)| Slider {
                id: i as i64 + 1,
                title: s.title.to_string(),
                subtitle: Some(s.subtitle.to_string()),
                image: s.image.to_string(),
                link_url: Some(s.link_url.to_string()),
                link_text: Some(s.link_text.to_string()),
                is_active: true,
                display_order: i as i64 + 1,
                created_at: DateTime::<Utc>::default(),
                updated_at: DateTime::<Utc>::default(),
            })
            .collect()
    }
}

// --- Homepage reads ---

/// Active testimonials, or the fallback dataset on any storage error.
pub fn homepage_testimonials(pool: &DbPool, fallback: &dyn FallbackContent) -> Vec<Testimonial> {
    match with_conn(pool, |conn| Ok(content_db_operations::read_testimonials(conn, true)?)) {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Using fallback testimonials: {}", e);
            fallback.testimonials()
        }
    }
}

/// Active sliders, or the fallback dataset on any storage error.
pub fn homepage_sliders(pool: &DbPool, fallback: &dyn FallbackContent) -> Vec<Slider> {
    match with_conn(pool, |conn| Ok(content_db_operations::read_sliders(conn, true)?)) {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Using fallback sliders: {}", e);
            fallback.sliders()
        }
    }
}

pub fn latest_news(pool: &DbPool, limit: u32) -> ServiceResult<Vec<News>> {
    with_conn(pool, |conn| Ok(news_db_operations::read_published_news(conn, Utc::now(), Some(limit), None)?))
}

// --- Program catalogue ---

#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub id: u32,
    pub title: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub image: &'static str,
    pub duration: &'static str,
    pub level: &'static str,
    /// Monthly tuition in rupiah.
    pub price: u32,
    pub rating: f32,
    pub students: u32,
    /// Date the program opened, `YYYY-MM-DD`.
    pub opened_on: &'static str,
}

pub const PROGRAMS: &[Program] = &[
    Program {
        id: 1,
        title: "Tahfidz Al-Qur'an",
        category: "Keagamaan",
        description: "Program hafalan Al-Qur'an dengan target minimal 5 juz selama masa studi.",
        image: "/public/img/courses/1.jpg",
        duration: "3 tahun",
        level: "Semua kelas",
        price: 450000,
        rating: 4.9,
        students: 180,
        opened_on: "2012-07-15",
    },
    Program {
        id: 2,
        title: "Sains dan Riset",
        category: "Akademik",
        description: "Pembelajaran sains berbasis eksperimen dan persiapan olimpiade.",
        image: "/public/img/courses/2.jpg",
        duration: "3 tahun",
        level: "Semua kelas",
        price: 400000,
        rating: 4.7,
        students: 120,
        opened_on: "2016-07-18",
    },
    Program {
        id: 3,
        title: "Pemrograman Dasar",
        category: "Teknologi",
        description: "Logika pemrograman, algoritma dan pembuatan aplikasi sederhana.",
        image: "/public/img/courses/3.jpg",
        duration: "2 semester",
        level: "Kelas 7",
        price: 350000,
        rating: 4.8,
        students: 95,
        opened_on: "2019-07-15",
    },
    Program {
        id: 4,
        title: "Desain Grafis dan Multimedia",
        category: "Teknologi",
        description: "Dasar desain visual, fotografi dan penyuntingan video.",
        image: "/public/img/courses/4.jpg",
        duration: "2 semester",
        level: "Kelas 8",
        price: 375000,
        rating: 4.5,
        students: 70,
        opened_on: "2020-07-13",
    },
    Program {
        id: 5,
        title: "Pengembangan Web",
        category: "Teknologi",
        description: "Membangun situs web dengan HTML, CSS dan JavaScript.",
        image: "/public/img/courses/5.jpg",
        duration: "2 semester",
        level: "Kelas 9",
        price: 375000,
        rating: 4.6,
        students: 85,
        opened_on: "2021-07-12",
    },
    Program {
        id: 6,
        title: "Bahasa Arab dan Inggris",
        category: "Bahasa",
        description: "Penguatan kemampuan komunikasi dua bahasa internasional.",
        image: "/public/img/courses/6.jpg",
        duration: "3 tahun",
        level: "Semua kelas",
        price: 300000,
        rating: 4.4,
        students: 150,
        opened_on: "2016-07-18",
    },
];

pub fn program_categories() -> Vec<&'static str> {
    let mut categories: Vec<&'static str> = PROGRAMS.iter().map(|p| p.category).collect();
    categories.sort_unstable();
    categories.dedup();
    categories
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramSort {
    /// Catalogue order, used when no sort is requested.
    Catalogue,
    Title,
    PriceLow,
    PriceHigh,
    Rating,
    Newest,
    Popular,
}

/// `(value, label)` pairs for the sort selector.
pub const PROGRAM_SORT_OPTIONS: &[(&str, &str)] = &[
    ("default", "Nama program"),
    ("price-low", "Biaya terendah"),
    ("price-high", "Biaya tertinggi"),
    ("rating", "Rating tertinggi"),
    ("newest", "Terbaru"),
    ("popular", "Terpopuler"),
];

impl ProgramSort {
    /// Unknown values sort by title.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => ProgramSort::Catalogue,
            Some("price-low") => ProgramSort::PriceLow,
            Some("price-high") => ProgramSort::PriceHigh,
            Some("rating") => ProgramSort::Rating,
            Some("newest") => ProgramSort::Newest,
            Some("popular") => ProgramSort::Popular,
            Some(_) => ProgramSort::Title,
        }
    }

    fn apply(self, programs: &mut [&'static Program]) {
        match self {
            ProgramSort::Catalogue => {}
            ProgramSort::Title => programs.sort_by_key(|p| p.title.to_lowercase()),
            ProgramSort::PriceLow => programs.sort_by_key(|p| p.price),
            ProgramSort::PriceHigh => programs.sort_by(|a, b| b.price.cmp(&a.price)),
            ProgramSort::Rating => programs.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
            ProgramSort::Newest => programs.sort_by(|a, b| b.opened_on.cmp(a.opened_on)),
            ProgramSort::Popular => programs.sort_by(|a, b| b.students.cmp(&a.students)),
        }
    }
}

/// Case-insensitive search over title and description, plus an exact category match.
/// `"all"` or a blank value disables either filter. Sorting is stable.
pub fn search_programs(search: Option<&str>, category: Option<&str>, sort: ProgramSort) -> Vec<&'static Program> {
    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    let category = category.map(str::trim).filter(|c| !c.is_empty() && *c != "all");

    let mut programs: Vec<&'static Program> = PROGRAMS
        .iter()
        .filter(|p| match &needle {
            Some(n) => p.title.to_lowercase().contains(n) || p.description.to_lowercase().contains(n),
            None => true,
        })
        .filter(|p| match category {
            Some(c) => p.category.eq_ignore_ascii_case(c),
            None => true,
        })
        .collect();
    sort.apply(&mut programs);
    programs
}

pub fn find_program(id: u32) -> Option<&'static Program> {
    PROGRAMS.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup::test_support::{migrated_pool, unmigrated_pool};

    #[test]
    fn fallback_dataset_is_not_empty() {
        assert!(!StaticFallbackContent.testimonials().is_empty());
        assert!(!StaticFallbackContent.sliders().is_empty());
        assert!(StaticFallbackContent.testimonials().iter().all(|t| (1..=5).contains(&t.rating)));
    }

    #[test]
    fn homepage_reads_fall_back_when_tables_are_missing() {
        let pool = unmigrated_pool();
        let testimonials = homepage_testimonials(&pool, &StaticFallbackContent);
        assert_eq!(testimonials.len(), TESTIMONIALS.len());
        let sliders = homepage_sliders(&pool, &StaticFallbackContent);
        assert_eq!(sliders.len(), SLIDERS.len());
    }

    #[test]
    fn homepage_reads_use_database_when_available() {
        let pool = migrated_pool();
        {
            let conn = pool.get().unwrap();
            conn.execute("UPDATE testimonials SET is_active = 0 WHERE id = 1", []).unwrap();
        }
        let testimonials = homepage_testimonials(&pool, &StaticFallbackContent);
        assert_eq!(testimonials.len(), TESTIMONIALS.len() - 1);
    }

    #[test]
    fn program_search_matches_title_or_description() {
        assert_eq!(search_programs(Some("TAHFIDZ"), None, ProgramSort::Catalogue).len(), 1);
        assert_eq!(search_programs(Some("javascript"), None, ProgramSort::Catalogue).len(), 1);
        assert_eq!(search_programs(None, Some("teknologi"), ProgramSort::Catalogue).len(), 3);
        assert_eq!(search_programs(Some(" "), Some("all"), ProgramSort::Catalogue).len(), PROGRAMS.len());
        assert!(find_program(99).is_none());
    }

    fn sorted_ids(sort: &str) -> Vec<u32> {
        search_programs(None, None, ProgramSort::from_query(Some(sort))).iter().map(|p| p.id).collect()
    }

    #[test]
    fn sort_keys_are_parsed() {
        assert_eq!(ProgramSort::from_query(None), ProgramSort::Catalogue);
        assert_eq!(ProgramSort::from_query(Some("")), ProgramSort::Catalogue);
        assert_eq!(ProgramSort::from_query(Some("default")), ProgramSort::Title);
        assert_eq!(ProgramSort::from_query(Some("acak")), ProgramSort::Title);
        assert_eq!(ProgramSort::from_query(Some("price-high")), ProgramSort::PriceHigh);
    }

    #[test]
    fn programs_sort_by_price() {
        assert_eq!(sorted_ids("price-low"), vec![6, 3, 4, 5, 2, 1]);
        assert_eq!(sorted_ids("price-high"), vec![1, 2, 4, 5, 3, 6]);
    }

    #[test]
    fn programs_sort_by_rating_newest_and_popularity() {
        assert_eq!(sorted_ids("rating"), vec![1, 3, 2, 5, 4, 6]);
        assert_eq!(sorted_ids("newest"), vec![5, 4, 3, 2, 6, 1]);
        assert_eq!(sorted_ids("popular"), vec![1, 6, 2, 3, 5, 4]);
    }

    #[test]
    fn programs_sort_by_title_by_default() {
        assert_eq!(sorted_ids("default"), vec![6, 4, 3, 5, 2, 1]);
        let filtered = search_programs(None, Some("teknologi"), ProgramSort::PriceLow);
        assert_eq!(filtered.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 4, 5]);
    }
}
