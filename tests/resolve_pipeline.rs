//! End-to-end resolution with the real image backend.
//!
//! Builds a site directory with `config.toml` and an upload tree, loads the
//! config the way the CLI does, and checks what ends up on disk.

use image::{ImageEncoder, RgbImage};
use post_thumb::cache::{self, CacheStats};
use post_thumb::config::load_config;
use post_thumb::content::{ContentItem, load_manifest};
use post_thumb::thumbnail::{Outcome, ThumbnailResolver};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SITE: &str = "https://blog.test";

fn write_jpeg(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let file = fs::File::create(path).unwrap();
    image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]))
        .save(path)
        .unwrap();
}

/// A site root with `config.toml` pointing at `<root>/uploads`.
fn setup_site(extra: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("uploads")).unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        format!(
            r#"site_url = "{SITE}"

[storage]
base_url = "{SITE}/uploads"
{extra}"#
        ),
    )
    .unwrap();
    tmp
}

fn resolver_for(site: &TempDir) -> ThumbnailResolver {
    let config = load_config(site.path()).unwrap();
    ThumbnailResolver::from_site_config(&config)
}

#[test]
fn body_image_is_cropped_to_box() {
    let site = setup_site("");
    write_jpeg(&site.path().join("uploads/2024/05/dawn.jpg"), 640, 480);
    let resolver = resolver_for(&site);

    let item = ContentItem::new(
        "dawn",
        format!(r#"<p>Morning.</p><img class="wide" src="{SITE}/uploads/2024/05/dawn.jpg?ver=2">"#),
    );
    let resolved = resolver.resolve_thumbnail(&item, 150, None, true, None);

    assert_eq!(resolved.outcome, Outcome::Generated);
    assert_eq!(resolved.url, format!("{SITE}/uploads/2024/05/dawn-150x150.jpg"));
    let thumb = image::open(site.path().join("uploads/2024/05/dawn-150x150.jpg")).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (150, 150));
}

#[test]
fn fit_mode_keeps_aspect_ratio() {
    let site = setup_site("");
    write_jpeg(&site.path().join("uploads/wide.jpg"), 800, 400);
    let resolver = resolver_for(&site);

    let resolved =
        resolver.generate_thumbnail(&format!("{SITE}/uploads/wide.jpg"), 200, Some(200), false);
    assert_eq!(resolved.outcome, Outcome::Generated);
    let thumb = image::open(site.path().join("uploads/wide-200x200.jpg")).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (200, 100));
}

#[test]
fn png_source_stays_png() {
    let site = setup_site("");
    write_png(&site.path().join("uploads/logo.png"), 120, 120);
    let resolver = resolver_for(&site);

    let resolved = resolver.generate_thumbnail(&format!("{SITE}/uploads/logo.png"), 32, None, true);
    assert!(resolved.url.ends_with("logo-32x32.png"));
    let bytes = fs::read(site.path().join("uploads/logo-32x32.png")).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
}

#[test]
fn second_resolution_hits_cache_without_rewriting() {
    let site = setup_site("");
    write_jpeg(&site.path().join("uploads/a.jpg"), 300, 300);
    let resolver = resolver_for(&site);
    let url = format!("{SITE}/uploads/a.jpg");

    let first = resolver.generate_thumbnail(&url, 50, None, true);
    let artifact = site.path().join("uploads/a-50x50.jpg");
    fs::write(&artifact, b"marker").unwrap();
    let second = resolver.generate_thumbnail(&url, 50, None, true);

    assert_eq!(first.outcome, Outcome::Generated);
    assert_eq!(second.outcome, Outcome::CacheHit);
    assert_eq!(fs::read(&artifact).unwrap(), b"marker");
}

#[test]
fn corrupt_upload_falls_back_to_original() {
    let site = setup_site("");
    let path = site.path().join("uploads/broken.jpg");
    fs::write(&path, b"not really a jpeg").unwrap();
    let resolver = resolver_for(&site);

    let url = format!("{SITE}/uploads/broken.jpg");
    let resolved = resolver.generate_thumbnail(&url, 50, None, true);
    assert_eq!(resolved.outcome, Outcome::DecodeFailed);
    assert_eq!(resolved.url, url);
    assert!(!site.path().join("uploads/broken-50x50.jpg").exists());
}

#[test]
fn foreign_and_theme_images_untouched() {
    let site = setup_site("");
    let resolver = resolver_for(&site);

    let cdn = "https://cdn.other.test/uploads/a.jpg";
    assert_eq!(
        resolver.generate_thumbnail(cdn, 50, None, true).outcome,
        Outcome::ExternallyHosted
    );
    let theme = format!("{SITE}/theme/icon.png");
    assert_eq!(
        resolver.generate_thumbnail(&theme, 50, None, true).outcome,
        Outcome::OutsideStorage
    );
}

#[test]
fn markdown_post_from_file() {
    let site = setup_site("");
    write_jpeg(&site.path().join("uploads/md.jpg"), 100, 100);
    let post = site.path().join("hello.md");
    fs::write(
        &post,
        format!("# Hello\n\nSome text.\n\n![alt]({SITE}/uploads/md.jpg)\n"),
    )
    .unwrap();
    let resolver = resolver_for(&site);

    let item = ContentItem::from_file(&post).unwrap();
    assert_eq!(item.id, "hello");
    let resolved = resolver.resolve_thumbnail(&item, 40, Some(30), true, None);
    assert_eq!(resolved.url, format!("{SITE}/uploads/md-40x30.jpg"));
}

#[test]
fn manifest_batch_and_stats() {
    let site = setup_site("");
    write_jpeg(&site.path().join("uploads/one.jpg"), 100, 100);
    let manifest = site.path().join("posts.json");
    fs::write(
        &manifest,
        format!(
            r#"[
  {{"id": "one", "body": "<img src=\"{SITE}/uploads/one.jpg\">"}},
  {{"id": "two", "body": "", "featured_image": "https://cms.test/two-64x64.jpg"}},
  {{"id": "three", "body": "<p>text only</p>"}}
]"#
        ),
    )
    .unwrap();
    let resolver = resolver_for(&site);

    let items = load_manifest(&manifest).unwrap();
    let stats: CacheStats = items
        .iter()
        .map(|item| resolver.resolve_thumbnail(item, 64, None, true, None).outcome)
        .collect();
    assert_eq!(stats.generated, 1);
    assert_eq!(stats.passthrough, 1);
    assert_eq!(stats.not_found, 1);
}

#[test]
fn generated_thumbnails_are_found_as_artifacts() {
    let site = setup_site("");
    write_jpeg(&site.path().join("uploads/2024/x.jpg"), 200, 100);
    let resolver = resolver_for(&site);
    let url = format!("{SITE}/uploads/2024/x.jpg");
    resolver.generate_thumbnail(&url, 20, None, true);
    resolver.generate_thumbnail(&url, 40, Some(10), false);

    let artifacts = cache::find_artifacts(&site.path().join("uploads")).unwrap();
    let sizes: Vec<_> = artifacts.iter().map(|a| (a.width, a.height)).collect();
    assert_eq!(sizes, vec![(20, 20), (40, 10)]);
    assert!(artifacts.iter().all(|a| !cache::is_stale(a).unwrap()));

    assert_eq!(cache::purge(&artifacts).unwrap(), 2);
    assert_eq!(
        resolver.generate_thumbnail(&url, 20, None, true).outcome,
        Outcome::Generated
    );
}

#[test]
fn quality_setting_changes_output() {
    let low = setup_site("\n[thumbnails]\nquality = 5\n");
    let high = setup_site("\n[thumbnails]\nquality = 100\n");
    for site in [&low, &high] {
        write_jpeg(&site.path().join("uploads/q.jpg"), 256, 256);
        resolver_for(site).generate_thumbnail(&format!("{SITE}/uploads/q.jpg"), 128, None, true);
    }
    let low_size = fs::metadata(low.path().join("uploads/q-128x128.jpg")).unwrap().len();
    let high_size = fs::metadata(high.path().join("uploads/q-128x128.jpg")).unwrap().len();
    assert!(low_size < high_size);
}

#[test]
fn parallel_duplicates_all_get_complete_thumbnail() {
    let site = setup_site("");
    write_jpeg(&site.path().join("uploads/shared.jpg"), 1600, 1200);
    let manifest = site.path().join("posts.json");
    let items: Vec<String> = (0..32)
        .map(|i| format!(r#"{{"id": "p{i}", "body": "<img src=\"{SITE}/uploads/shared.jpg\">"}}"#))
        .collect();
    fs::write(&manifest, format!("[{}]", items.join(","))).unwrap();
    let resolver = resolver_for(&site);

    let posts = load_manifest(&manifest).unwrap();
    let results: Vec<_> = posts
        .par_iter()
        .map(|item| resolver.resolve_thumbnail(item, 300, Some(200), true, None))
        .collect();

    let expected = format!("{SITE}/uploads/shared-300x200.jpg");
    for resolved in &results {
        assert!(resolved.outcome.is_thumbnail(), "{resolved:?}");
        assert_eq!(resolved.url, expected);
    }
    let thumb = image::open(site.path().join("uploads/shared-300x200.jpg")).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (300, 200));
    let artifacts = cache::find_artifacts(&site.path().join("uploads")).unwrap();
    assert_eq!(artifacts.len(), 1);
}

#[test]
fn parent_segments_stay_inside_storage() {
    let site = setup_site("");
    write_png(&site.path().join("private/secret.png"), 40, 40);
    let resolver = resolver_for(&site);

    let url = format!("{SITE}/uploads/../private/secret.png");
    let resolved = resolver.generate_thumbnail(&url, 10, None, true);
    assert_eq!(resolved.outcome, Outcome::OutsideStorage);
    assert_eq!(resolved.url, url);
    assert!(!site.path().join("private/secret-10x10.png").exists());
}

#[test]
fn trailing_slash_base_url_still_generates() {
    let site = TempDir::new().unwrap();
    fs::write(
        site.path().join("config.toml"),
        format!("site_url = \"{SITE}\"\n\n[storage]\nbase_url = \"{SITE}/uploads/\"\n"),
    )
    .unwrap();
    write_png(&site.path().join("uploads/a.png"), 50, 50);
    let resolver = resolver_for(&site);

    let resolved = resolver.generate_thumbnail(&format!("{SITE}/uploads/a.png"), 10, None, true);
    assert_eq!(resolved.outcome, Outcome::Generated);
    assert_eq!(resolved.url, format!("{SITE}/uploads/a-10x10.png"));
}
