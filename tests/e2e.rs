//! End-to-end integration tests for pdf-thumbnailer.
//!
//! The scenario tests drive the whole pipeline (scan, dispatch, write) through
//! a stand-in renderer, so they run anywhere. The `pdfium_*` tests render real
//! documents and skip themselves when no pdfium library can be bound.
//!
//! Run with:
//!   LD_LIBRARY_PATH=. cargo test --test e2e -- --nocapture

use image::{DynamicImage, RgbaImage};
use pdf_thumbnailer::{
    generate, generate_with, FileError, PageRenderer, PdfiumRenderer, RenderError,
    RenderSettings, RenderedImage, RunReport, ThumbnailConfig, ThumbnailError,
    ThumbnailProgressCallback,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Renders a fixed 32x24 image for any non-empty file; empty files fail to
/// open, the way pdfium rejects them.
struct StubRenderer;

impl PageRenderer for StubRenderer {
    fn render_page(&self, path: &Path, index: u16) -> Result<RenderedImage, RenderError> {
        let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            return Err(RenderError::Open {
                path: path.to_path_buf(),
                detail: "file is empty".into(),
            });
        }
        Ok(RenderedImage {
            page_index: index,
            image: DynamicImage::ImageRgba8(RgbaImage::new(32, 24)),
        })
    }
}

struct Dirs {
    _tmp: TempDir,
    source: PathBuf,
    dest: PathBuf,
}

fn dirs() -> Dirs {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("in");
    let dest = tmp.path().join("out");
    fs::create_dir(&source).unwrap();
    fs::create_dir(&dest).unwrap();
    Dirs {
        _tmp: tmp,
        source,
        dest,
    }
}

fn touch(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn config(dirs: &Dirs) -> ThumbnailConfig {
    ThumbnailConfig::builder()
        .source_dir(&dirs.source)
        .destination(&dirs.dest)
        .concurrency(Some(4))
        .build()
        .unwrap()
}

fn listing(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

async fn run_stub(config: &ThumbnailConfig) -> RunReport {
    generate_with(config, Arc::new(StubRenderer)).await.unwrap()
}

/// Skip this test if no pdfium library can be bound.
macro_rules! pdfium_or_skip {
    () => {{
        match PdfiumRenderer::bind(std::env::var_os("PDFIUM_LIB_PATH").as_deref().map(Path::new)) {
            Ok(r) => r,
            Err(e) => {
                println!("SKIP — pdfium not available: {e}");
                return;
            }
        }
    }};
}

/// A single-page PDF whose MediaBox is `width` x `height` points.
fn one_page_pdf(width: u32, height: u32) -> Vec<u8> {
    build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width} {height}] >>"),
    ])
}

/// A well-formed PDF with an empty page tree.
fn zero_page_pdf() -> Vec<u8> {
    build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [] /Count 0 >>".to_string(),
    ])
}

/// Serialise numbered objects (1, 2, …) with a matching xref table.
fn build_pdf(objects: &[String]) -> Vec<u8> {
    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

// ── Scenario tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_pdfs_and_a_text_file() {
    let d = dirs();
    touch(&d.source.join("a.pdf"), b"%PDF");
    touch(&d.source.join("b.pdf"), b"%PDF");
    touch(&d.source.join("notes.txt"), b"hello");

    let report = run_stub(&config(&d)).await;

    assert_eq!(
        listing(&d.dest),
        BTreeSet::from(["a.png".to_string(), "b.png".to_string()])
    );
    assert_eq!(report.stats.discovered, 2);
    assert_eq!(report.stats.succeeded, 2);
    assert_eq!(report.stats.failed, 0);
    assert!(report.collisions.is_empty());

    let png = image::open(d.dest.join("a.png")).unwrap();
    assert_eq!((png.width(), png.height()), (32, 24));
}

#[tokio::test]
async fn test_corrupt_file_does_not_stop_the_others() {
    let d = dirs();
    touch(&d.source.join("a.pdf"), b"%PDF");
    touch(&d.source.join("corrupt.pdf"), b"");
    touch(&d.source.join("z.pdf"), b"%PDF");

    let report = run_stub(&config(&d)).await;

    assert_eq!(
        listing(&d.dest),
        BTreeSet::from(["a.png".to_string(), "z.png".to_string()])
    );
    assert_eq!(report.stats.discovered, 3);
    assert_eq!(report.stats.succeeded, 2);
    assert_eq!(report.stats.failed, 1);

    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].source.ends_with("corrupt.pdf"));
    assert!(matches!(failed[0].error, Some(FileError::Render(_))));

    match report.into_result() {
        Err(ThumbnailError::PartialFailure { failed, total }) => {
            assert_eq!((failed, total), (1, 3));
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_source_is_a_regular_file() {
    let d = dirs();
    let file = d.source.join("single.pdf");
    touch(&file, b"%PDF");

    let config = ThumbnailConfig::builder()
        .source_dir(&file)
        .destination(&d.dest)
        .build()
        .unwrap();
    let err = generate_with(&config, Arc::new(StubRenderer))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ThumbnailError::NotADirectory { .. }),
        "got {err:?}"
    );
    assert!(listing(&d.dest).is_empty());
}

#[tokio::test]
async fn test_missing_destination_is_rejected_before_scanning() {
    let d = dirs();
    touch(&d.source.join("a.pdf"), b"%PDF");

    let config = ThumbnailConfig::builder()
        .source_dir(&d.source)
        .destination(d.dest.join("nope"))
        .build()
        .unwrap();
    let err = generate_with(&config, Arc::new(StubRenderer))
        .await
        .unwrap_err();

    match err {
        ThumbnailError::NotFound { role, .. } => assert_eq!(role, "destination"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rerun_overwrites_in_place() {
    let d = dirs();
    touch(&d.source.join("a.pdf"), b"%PDF");
    touch(&d.source.join("b.pdf"), b"%PDF");
    let config = config(&d);

    let first = run_stub(&config).await;
    let after_first = listing(&d.dest);
    let second = run_stub(&config).await;

    assert_eq!(listing(&d.dest), after_first);
    assert_eq!(first.stats.succeeded, second.stats.succeeded);
    assert_eq!(second.stats.failed, 0);
}

#[tokio::test]
async fn test_nested_files_land_flat() {
    let d = dirs();
    touch(&d.source.join("2024/q1/report.pdf"), b"%PDF");
    touch(&d.source.join("2024/invoice.pdf"), b"%PDF");
    touch(&d.source.join("top.pdf"), b"%PDF");

    let report = run_stub(&config(&d)).await;

    assert_eq!(report.stats.succeeded, 3);
    assert_eq!(
        listing(&d.dest),
        BTreeSet::from([
            "invoice.png".to_string(),
            "report.png".to_string(),
            "top.png".to_string()
        ])
    );
    for result in &report.results {
        assert_eq!(result.output.parent(), Some(d.dest.as_path()));
    }
}

#[tokio::test]
async fn test_same_name_in_two_folders_is_reported() {
    let d = dirs();
    touch(&d.source.join("a/scan.pdf"), b"%PDF");
    touch(&d.source.join("b/scan.pdf"), b"%PDF");

    let report = run_stub(&config(&d)).await;

    assert_eq!(report.stats.succeeded, 2);
    assert_eq!(report.collisions.len(), 1);
    assert_eq!(report.collisions[0].output, d.dest.join("scan.png"));
    assert_eq!(report.collisions[0].sources.len(), 2);
    assert_eq!(
        listing(&d.dest),
        BTreeSet::from(["scan.png".to_string()])
    );
}

#[tokio::test]
async fn test_empty_tree() {
    let d = dirs();
    touch(&d.source.join("readme.md"), b"# nothing here");

    let report = run_stub(&config(&d)).await;

    assert_eq!(report.stats.discovered, 0);
    assert!(report.results.is_empty());
    assert!(listing(&d.dest).is_empty());
}

#[tokio::test]
async fn test_ignore_case_picks_up_upper_case_extension() {
    let d = dirs();
    touch(&d.source.join("LOUD.PDF"), b"%PDF");
    touch(&d.source.join("quiet.pdf"), b"%PDF");

    let exact = run_stub(&config(&d)).await;
    assert_eq!(exact.stats.discovered, 1);

    let config = ThumbnailConfig::builder()
        .source_dir(&d.source)
        .destination(&d.dest)
        .ignore_case(true)
        .build()
        .unwrap();
    let loose = run_stub(&config).await;
    assert_eq!(loose.stats.discovered, 2);
    assert!(d.dest.join("LOUD.png").exists());
}

#[tokio::test]
async fn test_unbounded_concurrency() {
    let d = dirs();
    for i in 0..25 {
        touch(&d.source.join(format!("doc{i:02}.pdf")), b"%PDF");
    }
    let config = ThumbnailConfig::builder()
        .source_dir(&d.source)
        .destination(&d.dest)
        .concurrency(None)
        .build()
        .unwrap();

    let report = run_stub(&config).await;

    assert_eq!(report.stats.succeeded, 25);
    assert_eq!(listing(&d.dest).len(), 25);
}

#[tokio::test]
async fn test_progress_callback_sees_every_file() {
    #[derive(Default)]
    struct Counts {
        started: AtomicUsize,
        complete: AtomicUsize,
        errors: AtomicUsize,
        run_total: AtomicUsize,
    }
    impl ThumbnailProgressCallback for Counts {
        fn on_run_start(&self, total_files: usize) {
            self.run_total.store(total_files, Ordering::SeqCst);
        }
        fn on_file_start(&self, _source: &Path) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_complete(&self, _source: &Path, _output: &Path) {
            self.complete.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_error(&self, _source: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    let d = dirs();
    touch(&d.source.join("a.pdf"), b"%PDF");
    touch(&d.source.join("b.pdf"), b"%PDF");
    touch(&d.source.join("empty.pdf"), b"");

    let counts = Arc::new(Counts::default());
    let config = ThumbnailConfig::builder()
        .source_dir(&d.source)
        .destination(&d.dest)
        .progress_callback(counts.clone())
        .build()
        .unwrap();
    run_stub(&config).await;

    assert_eq!(counts.run_total.load(Ordering::SeqCst), 3);
    assert_eq!(counts.started.load(Ordering::SeqCst), 3);
    assert_eq!(counts.complete.load(Ordering::SeqCst), 2);
    assert_eq!(counts.errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_report_json_serialisable() {
    let d = dirs();
    touch(&d.source.join("ok.pdf"), b"%PDF");
    touch(&d.source.join("empty.pdf"), b"");

    let report = run_stub(&config(&d)).await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["stats"]["discovered"], 2);
    assert_eq!(json["stats"]["failed"], 1);
    let kinds: Vec<_> = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["error"]["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["render"]);
}

// ── pdfium-backed tests ──────────────────────────────────────────────────────

#[test]
fn pdfium_renders_first_page_at_requested_dpi() {
    let renderer = pdfium_or_skip!().with_settings(RenderSettings {
        dpi: 72,
        max_size: 2000,
    });
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("wide.pdf");
    fs::write(&pdf, one_page_pdf(144, 72)).unwrap();

    let rendered = renderer.render_page(&pdf, 0).unwrap();

    assert_eq!(rendered.page_index, 0);
    assert!(rendered.width().abs_diff(144) <= 1, "{}", rendered.width());
    assert!(rendered.height().abs_diff(72) <= 1, "{}", rendered.height());
}

#[test]
fn pdfium_caps_longest_edge() {
    let renderer = pdfium_or_skip!().with_settings(RenderSettings {
        dpi: 600,
        max_size: 100,
    });
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("page.pdf");
    fs::write(&pdf, one_page_pdf(612, 792)).unwrap();

    let rendered = renderer.render_page(&pdf, 0).unwrap();

    assert!(rendered.width() <= 100 && rendered.height() <= 100);
}

#[test]
fn pdfium_rejects_empty_file() {
    let renderer = pdfium_or_skip!();
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("empty.pdf");
    fs::write(&pdf, b"").unwrap();

    let err = renderer.render_page(&pdf, 0).unwrap_err();

    assert!(matches!(err, RenderError::Open { .. }), "got {err:?}");
}

#[test]
fn pdfium_reports_missing_page() {
    let renderer = pdfium_or_skip!();
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("short.pdf");
    fs::write(&pdf, one_page_pdf(100, 100)).unwrap();

    let err = renderer.render_page(&pdf, 3).unwrap_err();

    match err {
        RenderError::NoPage { index, total, .. } => assert_eq!((index, total), (3, 1)),
        other => panic!("expected NoPage, got {other:?}"),
    }
}

#[test]
fn pdfium_reports_empty_document() {
    let renderer = pdfium_or_skip!();
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("blank.pdf");
    fs::write(&pdf, zero_page_pdf()).unwrap();

    match renderer.render_page(&pdf, 0) {
        Err(RenderError::NoPage { index, total, .. }) => assert_eq!((index, total), (0, 0)),
        other => panic!("expected NoPage, got {other:?}"),
    }
}

#[tokio::test]
async fn pdfium_full_run() {
    let lib = std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from);
    let d = dirs();
    touch(&d.source.join("one.pdf"), &one_page_pdf(200, 100));
    touch(&d.source.join("deep/two.pdf"), &one_page_pdf(100, 200));
    touch(&d.source.join("broken.pdf"), b"not a pdf at all");

    let mut builder = ThumbnailConfig::builder()
        .source_dir(&d.source)
        .destination(&d.dest)
        .dpi(72);
    if let Some(lib) = lib {
        builder = builder.pdfium_library(lib);
    }
    let report = match generate(&builder.build().unwrap()).await {
        Ok(report) => report,
        Err(ThumbnailError::PdfiumBindingFailed(e)) => {
            println!("SKIP — pdfium not available: {e}");
            return;
        }
        Err(e) => panic!("run failed: {e}"),
    };

    assert_eq!(report.stats.discovered, 3);
    assert_eq!(report.stats.succeeded, 2);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(
        listing(&d.dest),
        BTreeSet::from(["one.png".to_string(), "two.png".to_string()])
    );
    let two = image::open(d.dest.join("two.png")).unwrap();
    assert!(two.height() > two.width());
}
