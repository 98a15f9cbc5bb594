use std::path::Path;

use anyhow::Context;
use catalog_service::{Catalog, ImportReport};
use catalog_sheets::{SheetFormat, TemplateKind};

fn read_upload(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_download(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn print_report(report: &ImportReport) {
    println!(
        "added: {}  prices set: {}  errors: {}",
        report.added,
        report.prices_set,
        report.errors.len()
    );
    for error in &report.errors {
        println!(
            "  row {:<5}{:<24}{}",
            error.row,
            error.sku.as_deref().unwrap_or("-"),
            error.message
        );
    }
}

pub(crate) async fn run_import_products(catalog: &Catalog, path: &Path) -> anyhow::Result<()> {
    let bytes = read_upload(path)?;
    let report = catalog.import_products(&bytes).await?;
    print_report(&report);
    Ok(())
}

pub(crate) async fn run_import_prices(catalog: &Catalog, path: &Path) -> anyhow::Result<()> {
    let bytes = read_upload(path)?;
    let report = catalog.import_prices(&bytes).await?;
    print_report(&report);
    Ok(())
}

pub(crate) async fn run_export_products(
    catalog: &Catalog,
    format: SheetFormat,
    out: &Path,
) -> anyhow::Result<()> {
    let bytes = catalog.export_products(format).await?;
    write_download(out, &bytes)
}

pub(crate) async fn run_export_prices(
    catalog: &Catalog,
    format: SheetFormat,
    out: &Path,
) -> anyhow::Result<()> {
    let bytes = catalog.export_prices(format).await?;
    write_download(out, &bytes)
}

pub(crate) fn run_export_template(
    kind: TemplateKind,
    format: SheetFormat,
    out: &Path,
) -> anyhow::Result<()> {
    let bytes = catalog_sheets::template(kind, format)?;
    write_download(out, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_written_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("prices.csv");

        run_export_template(TemplateKind::Prices, SheetFormat::Csv, &out).expect("template");

        let text = std::fs::read_to_string(&out).expect("read template");
        assert!(text.lines().next().unwrap_or_default().starts_with("sku"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn missing_upload_reports_path() {
        let err = read_upload(Path::new("/nonexistent/products.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/products.xlsx"));
    }
}
