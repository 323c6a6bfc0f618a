use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PageSection {
    pub heading: &'static str,
    pub body: &'static str,
    pub items: &'static [&'static str],
}

/// A static information page about the school. Several paths may serve the same page.
#[derive(Debug, Serialize)]
pub struct SchoolPage {
    pub key: &'static str,
    #[serde(skip)]
    pub paths: &'static [&'static str],
    pub title: &'static str,
    pub intro: &'static str,
    pub sections: &'static [PageSection],
}

pub const SCHOOL_PAGES: &[SchoolPage] = &[
    SchoolPage {
        key: "about",
        paths: &["/about"],
        title: "Tentang Kami",
        intro: "SMPTI Baituljannah adalah sekolah menengah pertama berbasis teknologi informasi \
                yang memadukan pendidikan akhlak islami dengan keterampilan digital.",
        sections: &[
            PageSection {
                heading: "Profil Singkat",
                body: "Sekolah berasrama dan reguler dengan kelas kecil dan pendampingan wali kelas.",
                items: &[],
            },
            PageSection {
                heading: "Nilai Utama",
                body: "",
                items: &["Adab sebelum ilmu", "Kemandirian belajar", "Kolaborasi dan kepedulian"],
            },
        ],
    },
    SchoolPage {
        key: "sejarah",
        paths: &["/sejarah"],
        title: "Sejarah Sekolah",
        intro: "Berawal dari rumah tahfidz kecil, Baituljannah tumbuh menjadi sekolah menengah \
                yang menyiapkan generasi qurani yang melek teknologi.",
        sections: &[
            PageSection {
                heading: "Perjalanan",
                body: "",
                items: &[
                    "2012: Rumah Tahfidz Baituljannah berdiri",
                    "2016: Pembukaan SMP dengan dua rombongan belajar",
                    "2019: Peluncuran kurikulum teknologi informasi",
                    "2023: Akreditasi A dan pembangunan laboratorium komputer kedua",
                ],
            },
        ],
    },
    SchoolPage {
        key: "visi-misi",
        paths: &["/visi-misi"],
        title: "Visi dan Misi",
        intro: "Arah pendidikan yang menjadi pegangan seluruh warga sekolah.",
        sections: &[
            PageSection {
                heading: "Visi",
                body: "Terwujudnya generasi berakhlak mulia, hafal Al-Qur'an, dan unggul dalam teknologi.",
                items: &[],
            },
            PageSection {
                heading: "Misi",
                body: "",
                items: &[
                    "Menanamkan nilai islami dalam kehidupan sehari-hari",
                    "Membimbing hafalan Al-Qur'an secara bertahap",
                    "Mengembangkan kemampuan berpikir komputasional",
                    "Membangun kemitraan dengan orang tua dan masyarakat",
                ],
            },
        ],
    },
    SchoolPage {
        key: "program-unggulan",
        paths: &["/program-unggulan"],
        title: "Program Unggulan",
        intro: "Program khas yang membedakan SMPTI Baituljannah.",
        sections: &[
            PageSection {
                heading: "Tahfidz Al-Qur'an",
                body: "Setoran harian dengan target minimal 5 juz selama tiga tahun.",
                items: &[],
            },
            PageSection {
                heading: "Kelas Teknologi",
                body: "Pemrograman, desain grafis, dan pengembangan web sejak kelas 7.",
                items: &[],
            },
            PageSection {
                heading: "Bilingual",
                body: "Pembiasaan bahasa Arab dan Inggris dalam kegiatan asrama.",
                items: &[],
            },
        ],
    },
    SchoolPage {
        key: "kurikulum",
        paths: &["/kurikulum"],
        title: "Kurikulum",
        intro: "Kurikulum Merdeka yang diperkaya dengan muatan keislaman dan teknologi.",
        sections: &[
            PageSection {
                heading: "Kelompok Mata Pelajaran",
                body: "",
                items: &[
                    "Mata pelajaran nasional",
                    "Diniyah: aqidah, fiqih, sirah, bahasa Arab",
                    "Teknologi: informatika, pemrograman, multimedia",
                    "Proyek penguatan profil pelajar",
                ],
            },
        ],
    },
    SchoolPage {
        key: "fasilitas",
        paths: &["/fasilitas"],
        title: "Fasilitas",
        intro: "Sarana belajar yang mendukung kegiatan akademik dan asrama.",
        sections: &[
            PageSection {
                heading: "Sarana",
                body: "",
                items: &[
                    "Dua laboratorium komputer",
                    "Masjid dan ruang tahfidz",
                    "Perpustakaan digital",
                    "Asrama putra dan putri",
                    "Lapangan olahraga",
                ],
            },
        ],
    },
    SchoolPage {
        key: "prestasi",
        paths: &["/prestasi"],
        title: "Prestasi",
        intro: "Capaian siswa dalam lomba akademik, tahfidz, dan teknologi.",
        sections: &[
            PageSection {
                heading: "Prestasi Terbaru",
                body: "",
                items: &[
                    "Juara 1 Musabaqah Hifdzil Qur'an tingkat kabupaten",
                    "Finalis kompetisi aplikasi pelajar tingkat provinsi",
                    "Medali perunggu olimpiade sains kota",
                ],
            },
        ],
    },
    SchoolPage {
        key: "faq",
        paths: &["/faq", "/pertanyaan-umum"],
        title: "Pertanyaan Umum",
        intro: "Jawaban atas pertanyaan yang paling sering diajukan calon wali murid.",
        sections: &[
            PageSection {
                heading: "Kapan pendaftaran siswa baru dibuka?",
                body: "Pendaftaran dibuka setiap bulan Oktober sampai kuota terpenuhi.",
                items: &[],
            },
            PageSection {
                heading: "Apakah wajib tinggal di asrama?",
                body: "Tidak. Tersedia kelas reguler tanpa asrama.",
                items: &[],
            },
            PageSection {
                heading: "Bagaimana cara mendaftar?",
                body: "Isi formulir di halaman Pendaftaran, lalu tunggu konfirmasi dari panitia.",
                items: &[],
            },
        ],
    },
    SchoolPage {
        key: "portal-siswa",
        paths: &["/portal-siswa"],
        title: "Portal Siswa",
        intro: "Akses layanan akademik untuk siswa dan wali murid.",
        sections: &[
            PageSection {
                heading: "Layanan",
                body: "Akun portal dibagikan oleh wali kelas pada awal tahun ajaran.",
                items: &["Jadwal pelajaran", "Laporan hafalan", "Nilai dan rapor"],
            },
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn paths_and_keys_are_unique() {
        let mut paths = HashSet::new();
        let mut keys = HashSet::new();
        for page in SCHOOL_PAGES {
            assert!(keys.insert(page.key), "duplicate key {}", page.key);
            assert!(!page.paths.is_empty());
            for path in page.paths {
                assert!(path.starts_with('/'));
                assert!(paths.insert(*path), "duplicate path {}", path);
            }
        }
    }

    #[test]
    fn faq_is_served_under_both_names() {
        let faq = SCHOOL_PAGES.iter().find(|page| page.key == "faq").unwrap();
        assert_eq!(faq.paths, &["/faq", "/pertanyaan-umum"]);
        assert!(!faq.sections.is_empty());
    }
}
