use criterion::{criterion_group, criterion_main, Criterion};
use snapdoc::capture::render_capture;
use snapdoc::{assemble, CaptureOptions, Document, ExportConfig, Theme};

fn dashboard_html(sections: usize) -> String {
    let mut body = String::from(r#"<main id="report-content"><h1>Financial health report</h1>"#);
    for i in 0..sections {
        body.push_str(&format!(
            r#"<section style="background-color: #1e293b; padding: 12px"><h2>Metric {}</h2><p>Liquidity, leverage and margin trends for period {}.</p></section>"#,
            i, i
        ));
        body.push_str(r#"<div class="no-print">Download</div>"#);
    }
    body.push_str("</main>");
    format!("<html class=\"dark\"><body>{}</body></html>", body)
}

fn bench_capture(c: &mut Criterion) {
    let doc = Document::parse(&dashboard_html(12));
    let root = doc.element_by_id("report-content").expect("target");
    let opts = CaptureOptions::for_theme(&ExportConfig::default(), Theme::Dark);

    c.bench_function("render_capture", |b| {
        b.iter(|| render_capture(&doc, root, &opts).expect("capture"))
    });

    let capture = render_capture(&doc, root, &opts).expect("capture");
    c.bench_function("assemble_a4", |b| {
        b.iter(|| assemble::assemble(&capture, snapdoc::PageFormat::A4).expect("assemble"))
    });
}

criterion_group!(benches, bench_capture);
criterion_main!(benches);
