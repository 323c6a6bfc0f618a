use super::form_helpers::{filter_value, parse_id_list};
use super::registration_helpers::{find_registrations_by_ids, list_registrations, parse_filter};
use super::{ServiceError, ServiceResult};
use crate::models::{RegistrationFilter, RegistrationQuery, StudentRegistration};
use crate::DbPool;
use chrono::Utc;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use serde::Deserialize;

pub const EXPORT_HEADERS: [&str; 22] = [
    "ID",
    "Nama Lengkap",
    "Tempat Lahir",
    "Tanggal Lahir",
    "Jenis Kelamin",
    "Agama",
    "Alamat",
    "No. Telepon",
    "Email",
    "Asal Sekolah",
    "Alamat Sekolah",
    "Tahun Lulus",
    "Nama Ayah",
    "Nama Ibu",
    "Pekerjaan Ayah",
    "Pekerjaan Ibu",
    "No. Telepon Orang Tua",
    "Email Orang Tua",
    "Program Pilihan",
    "Motivasi",
    "Status",
    "Tanggal Daftar",
];

pub const PDF_TITLE: &str = "Data Pendaftaran Siswa";
pub const PDF_HEADERS: [&str; 5] = ["No", "Nama", "Program", "Status", "Tanggal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> ServiceResult<Self> {
        match raw.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(ServiceError::validation(format!(
                "Format export tidak didukung: '{}'. Gunakan csv, excel atau pdf",
                other
            ))),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// Query string of the export endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
    pub scope: Option<String>,
    pub ids: Option<String>,
    pub status: Option<String>,
    pub program: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportScope {
    Selected(Vec<i64>),
    Filtered(RegistrationQuery),
    All,
}

impl ExportScope {
    /// Without an explicit scope, an `ids` list means "selected", otherwise "filtered".
    pub fn from_params(params: &ExportParams) -> ServiceResult<Self> {
        let scope = filter_value(params.scope.as_deref());
        let scope = scope.as_deref().unwrap_or(if params.ids.is_some() { "selected" } else { "filtered" });
        match scope {
            "selected" => Ok(ExportScope::Selected(parse_id_list(params.ids.as_deref().unwrap_or_default())?)),
            "filtered" => {
                let filter = RegistrationFilter {
                    status: params.status.clone(),
                    program: params.program.clone(),
                    search: params.search.clone(),
                    limit: None,
                    offset: None,
                };
                Ok(ExportScope::Filtered(parse_filter(&filter)?))
            }
            "all" => Ok(ExportScope::All),
            other => Err(ServiceError::validation(format!("Scope export tidak valid: '{}'", other))),
        }
    }
}

pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn select_registrations(pool: &DbPool, scope: &ExportScope) -> ServiceResult<Vec<StudentRegistration>> {
    match scope {
        ExportScope::Selected(ids) => find_registrations_by_ids(pool, ids),
        ExportScope::Filtered(query) => list_registrations(pool, query),
        ExportScope::All => list_registrations(pool, &RegistrationQuery::default()),
    }
}

/// Validates the format, resolves the selection and renders the file.
pub fn export_registrations(pool: &DbPool, params: &ExportParams) -> ServiceResult<ExportFile> {
    let format = ExportFormat::parse(params.format.as_deref().unwrap_or("csv"))?;
    let scope = ExportScope::from_params(params)?;
    let rows = select_registrations(pool, &scope)?;

    let bytes = match format {
        ExportFormat::Csv => render_csv(&rows)?,
        ExportFormat::Excel => render_xlsx(&rows)?,
        ExportFormat::Pdf => render_pdf(&rows)?,
    };
    log::info!("Exported {} registrations as {}", rows.len(), format.extension());

    Ok(ExportFile {
        filename: format!("pendaftaran-siswa-{}.{}", Utc::now().format("%Y%m%d_%H%M%S"), format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}

fn registration_row(r: &StudentRegistration) -> Vec<String> {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    vec![
        r.id.to_string(),
        r.nama_lengkap.clone(),
        r.tempat_lahir.clone(),
        r.tanggal_lahir.format("%Y-%m-%d").to_string(),
        r.jenis_kelamin.clone(),
        r.agama.clone(),
        r.alamat.clone(),
        optional(&r.no_telepon),
        optional(&r.email),
        r.asal_sekolah.clone(),
        r.alamat_sekolah.clone(),
        r.tahun_lulus.to_string(),
        r.nama_ayah.clone(),
        r.nama_ibu.clone(),
        r.pekerjaan_ayah.clone(),
        r.pekerjaan_ibu.clone(),
        r.no_telepon_ortu.clone(),
        optional(&r.email_ortu),
        r.program_pilihan.clone(),
        optional(&r.motivasi),
        r.status.label().to_string(),
        r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}

// --- CSV ---

pub fn render_csv(rows: &[StudentRegistration]) -> ServiceResult<Vec<u8>> {
    let export_err = |e: csv::Error| ServiceError::Export(e.to_string());
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS).map_err(export_err)?;
    for r in rows {
        writer.write_record(registration_row(r)).map_err(export_err)?;
    }
    writer.into_inner().map_err(|e| ServiceError::Export(e.to_string()))
}

// --- Spreadsheet ---

pub fn render_xlsx(rows: &[StudentRegistration]) -> ServiceResult<Vec<u8>> {
    let export_err = |e: rust_xlsxwriter::XlsxError| ServiceError::Export(e.to_string());
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Pendaftaran").map_err(export_err)?;

    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_background_color(Color::RGB(0xD9E1F2));

    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(export_err)?;
        worksheet.set_column_width(col as u16, 18.0).map_err(export_err)?;
    }

    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, value) in registration_row(r).iter().enumerate() {
            worksheet.write_string(row, col as u16, value).map_err(export_err)?;
        }
    }

    workbook.save_to_buffer().map_err(export_err)
}

// --- PDF ---

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const FIRST_TABLE_TOP_MM: f32 = 255.0;
pub const PAGE_TOP_MM: f32 = 280.0;
pub const ROW_HEIGHT_MM: f32 = 7.0;
/// Rows are never placed below this line; the table continues on a new page.
pub const BOTTOM_LIMIT_MM: f32 = 20.0;

/// Left edge and character budget of each table column.
const PDF_COLUMNS: [(f32, usize); 5] = [(10.0, 4), (22.0, 32), (92.0, 20), (137.0, 12), (165.0, 19)];

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    pub y: f32,
    pub cells: [String; 5],
    pub is_header: bool,
}

/// Shortens `text` to `max_chars` characters, ending in "..." when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str("...");
    cut
}

fn header_row(y: f32) -> PlacedRow {
    PlacedRow { y, cells: PDF_HEADERS.map(str::to_string), is_header: true }
}

/// Assigns each table row a page and vertical position. Every page starts with
/// the column header; a new page begins once the next row would fall below
/// `BOTTOM_LIMIT_MM`.
pub fn layout_pdf_rows(rows: Vec<[String; 5]>) -> Vec<Vec<PlacedRow>> {
    let mut pages = vec![vec![header_row(FIRST_TABLE_TOP_MM)]];
    let mut y = FIRST_TABLE_TOP_MM - ROW_HEIGHT_MM;

    for cells in rows {
        if y < BOTTOM_LIMIT_MM {
            pages.push(vec![header_row(PAGE_TOP_MM)]);
            y = PAGE_TOP_MM - ROW_HEIGHT_MM;
        }
        let truncated = std::array::from_fn(|i| truncate(&cells[i], PDF_COLUMNS[i].1));
        if let Some(page) = pages.last_mut() {
            page.push(PlacedRow { y, cells: truncated, is_header: false });
        }
        y -= ROW_HEIGHT_MM;
    }
    pages
}

fn pdf_table_rows(rows: &[StudentRegistration]) -> Vec<[String; 5]> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| {
            [
                (i + 1).to_string(),
                r.nama_lengkap.clone(),
                r.program_pilihan.clone(),
                r.status.label().to_string(),
                r.created_at.format("%Y-%m-%d").to_string(),
            ]
        })
        .collect()
}

pub fn render_pdf(rows: &[StudentRegistration]) -> ServiceResult<Vec<u8>> {
    let export_err = |e: printpdf::Error| ServiceError::Export(e.to_string());
    let (doc, first_page, first_layer) =
        PdfDocument::new(PDF_TITLE, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Halaman 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(export_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(export_err)?;

    let title_layer = doc.get_page(first_page).get_layer(first_layer);
    title_layer.use_text(PDF_TITLE, 16.0, Mm(10.0), Mm(280.0), &bold);
    title_layer.use_text(
        format!("Dicetak: {}  |  Jumlah data: {}", Utc::now().format("%Y-%m-%d %H:%M"), rows.len()),
        9.0,
        Mm(10.0),
        Mm(270.0),
        &font,
    );

    for (index, placed_rows) in layout_pdf_rows(pdf_table_rows(rows)).into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), format!("Halaman {}", index + 1));
            doc.get_page(page).get_layer(layer)
        };
        for row in placed_rows {
            let row_font = if row.is_header { &bold } else { &font };
            for (cell, (x, _)) in row.cells.iter().zip(PDF_COLUMNS) {
                layer.use_text(cell.as_str(), 9.0, Mm(x), Mm(row.y), row_font);
            }
        }
    }

    doc.save_to_bytes().map_err(export_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::registration_helpers::submit_registration;
    use crate::helper::registration_helpers::test_support::sample_form;
    use crate::setup::db_setup::test_support::migrated_pool;

    fn params(format: &str) -> ExportParams {
        ExportParams { format: Some(format.to_string()), ..Default::default() }
    }

    #[test]
    fn unknown_format_is_a_validation_error() {
        let pool = migrated_pool();
        let err = export_registrations(&pool, &params("xyz")).err().unwrap();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(ExportFormat::parse("XLSX").unwrap(), ExportFormat::Excel);
    }

    #[test]
    fn empty_selection_gives_header_only_csv() {
        let pool = migrated_pool();
        submit_registration(&pool, &sample_form("Umar", "Tahfidz")).unwrap();
        let request = ExportParams { scope: Some("selected".into()), ids: Some(String::new()), ..params("csv") };
        let file = export_registrations(&pool, &request).unwrap();
        let text = String::from_utf8(file.bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("ID,Nama Lengkap,Tempat Lahir"));
        assert!(file.filename.starts_with("pendaftaran-siswa-"));
        assert!(file.filename.ends_with(".csv"));
    }

    #[test]
    fn csv_rows_use_localized_status() {
        let pool = migrated_pool();
        submit_registration(&pool, &sample_form("Umar", "Tahfidz")).unwrap();
        submit_registration(&pool, &sample_form("Zahra", "Sains")).unwrap();
        let request = ExportParams { program: Some("Sains".into()), ..params("csv") };
        let file = export_registrations(&pool, &request).unwrap();
        let text = String::from_utf8(file.bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Zahra"));
        assert!(lines[1].contains("Menunggu"));
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let request = ExportParams { scope: Some("some".into()), ..params("csv") };
        assert!(ExportScope::from_params(&request).is_err());
        let all = ExportParams { scope: Some("all".into()), ..params("csv") };
        assert_eq!(ExportScope::from_params(&all).unwrap(), ExportScope::All);
    }

    #[test]
    fn xlsx_and_pdf_render_non_empty_documents() {
        let pool = migrated_pool();
        submit_registration(&pool, &sample_form("Umar", "Tahfidz")).unwrap();
        let xlsx = export_registrations(&pool, &params("excel")).unwrap();
        assert!(xlsx.bytes.starts_with(b"PK"));
        let pdf = export_registrations(&pool, &params("pdf")).unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF"));
        assert_eq!(pdf.content_type, "application/pdf");
    }

    #[test]
    fn truncation_marks_cut_values() {
        assert_eq!(truncate("Budi", 4), "Budi");
        assert_eq!(truncate("Muhammad Al Fatih Ramadhan", 10), "Muhamma...");
    }

    #[test]
    fn layout_breaks_pages_and_repeats_header() {
        let rows: Vec<[String; 5]> = (0..100)
            .map(|i| [i.to_string(), format!("Siswa {}", i), "Tahfidz".into(), "Menunggu".into(), "2024-01-01".into()])
            .collect();
        let pages = layout_pdf_rows(rows);
        assert!(pages.len() > 1);

        let mut seen = Vec::new();
        for page in &pages {
            assert!(page[0].is_header);
            for row in &page[1..] {
                assert!(!row.is_header);
                assert!(row.y >= BOTTOM_LIMIT_MM);
                seen.push(row.cells[0].clone());
            }
        }
        let expected: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn layout_of_empty_table_is_header_only() {
        let pages = layout_pdf_rows(Vec::new());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 1);
        assert_eq!(pages[0][0].cells[0], "No");
    }
}
