//! CSV rendition of the run report: one detail sheet plus a summary sheet.

use std::path::{Path, PathBuf};

use csv::Writer;
use mapscout_core::ListingRecord;
use mapscout_scraper::{ReportWriter, ScraperError};

const DETAIL_HEADER: [&str; 11] = [
    "Name",
    "Category",
    "Address",
    "Phone",
    "Messaging link",
    "Email",
    "Site",
    "Stars",
    "Reviews",
    "Keyword",
    "Source link",
];

pub struct CsvReportWriter;

impl ReportWriter for CsvReportWriter {
    fn write(&self, records: &[ListingRecord], destination: &Path) -> Result<(), ScraperError> {
        let summary = summary_path(destination);
        let generated_at = chrono::Local::now().format("%d/%m/%Y %H:%M").to_string();

        write_details(records, destination).map_err(|e| report_error(destination, &e))?;
        write_summary(&summary_rows(records, &generated_at), &summary)
            .map_err(|e| report_error(&summary, &e))?;

        tracing::info!(
            records = records.len(),
            detail = %destination.display(),
            summary = %summary.display(),
            "report written"
        );
        Ok(())
    }
}

fn report_error(path: &Path, e: &csv::Error) -> ScraperError {
    ScraperError::Report {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// `leads.csv` → `leads_summary.csv`, in the same directory.
pub(crate) fn summary_path(destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map_or_else(|| "report".into(), |s| s.to_string_lossy());
    destination.with_file_name(format!("{stem}_summary.csv"))
}

fn write_details(records: &[ListingRecord], path: &Path) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(DETAIL_HEADER)?;
    for r in records {
        let stars = format_stars(r.stars);
        let reviews = r.reviews.to_string();
        wtr.write_record([
            r.name.as_str(),
            r.category.as_str(),
            r.address.as_str(),
            r.phone.as_str(),
            r.messaging_link.as_str(),
            r.email.as_str(),
            r.site.as_str(),
            stars.as_str(),
            reviews.as_str(),
            r.keyword.as_str(),
            r.source_link.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_summary(rows: &[(&str, String)], path: &Path) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["Metric", "Value"])?;
    for (metric, value) in rows {
        wtr.write_record([*metric, value.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn format_stars(stars: f64) -> String {
    if stars > 0.0 {
        format!("{stars:.1}")
    } else {
        String::new()
    }
}

pub(crate) fn summary_rows(
    records: &[ListingRecord],
    generated_at: &str,
) -> Vec<(&'static str, String)> {
    let with_email = records.iter().filter(|r| r.has_email()).count();
    let with_link = records.iter().filter(|r| r.has_messaging_link()).count();
    let rated: Vec<f64> = records
        .iter()
        .filter(|r| r.is_rated())
        .map(|r| r.stars)
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let average = if rated.is_empty() {
        String::new()
    } else {
        format!("{:.2}", rated.iter().sum::<f64>() / rated.len() as f64)
    };

    vec![
        ("Total listings", records.len().to_string()),
        ("With email", with_email.to_string()),
        ("With messaging link", with_link.to_string()),
        ("Average stars", average),
        ("Generated at", generated_at.to_string()),
    ]
}
