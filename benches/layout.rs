use criterion::{criterion_group, criterion_main, Criterion};
use exif_printer::overlay::fonts::FontBook;
use exif_printer::overlay::icon::IconSet;
use exif_printer::overlay::layout::OverlayRenderer;
use exif_printer::overlay::metrics::Metrics;
use exif_printer::overlay::raster::RasterSurface;
use exif_printer::overlay::surface::RecordingSurface;
use exif_printer::overlay::theme::Theme;
use exif_printer::tags::catalog::TagCatalog;
use exif_printer::tags::reader::TagValues;
use kurbo::Point;

fn fixtures() -> (TagCatalog, TagValues, Vec<String>) {
    let entries: Vec<String> = (0..12)
        .map(|i| {
            format!(
                r#""tag{i}": {{ "iconType": "material_symbol", "iconID": "icon{i}", "tagType": "exif", "tagID": "T{i}" }}"#
            )
        })
        .collect();
    let catalog = TagCatalog::from_json(&format!("{{{}}}", entries.join(","))).unwrap();
    let keys: Vec<String> = (0..12).map(|i| format!("tag{i}")).collect();
    let values: TagValues = keys.iter().map(|k| (k.clone(), format!("value of {k}"))).collect();
    (catalog, values, keys)
}

fn bench_layout(c: &mut Criterion) {
    let (catalog, values, keys) = fixtures();
    let theme = Theme::default();
    let metrics = Metrics::default();
    let icons = IconSet::default();
    let renderer = OverlayRenderer::new(&theme, &metrics, &catalog, &icons);

    c.bench_function("layout_12_tags_recording", |b| {
        b.iter(|| {
            let mut surface = RecordingSurface::new(1920, 1080);
            renderer.render_tags(&mut surface, &values, &keys, Point::new(20.0, 40.0))
        })
    });

    let fonts = FontBook::default();
    c.bench_function("layout_12_tags_raster_720p", |b| {
        b.iter(|| {
            let mut surface = RasterSurface::new(1280, 720, &fonts).unwrap();
            renderer.render_tags(&mut surface, &values, &keys, Point::new(20.0, 40.0))
        })
    });
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
