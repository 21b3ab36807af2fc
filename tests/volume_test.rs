//! Tests for assembling several chapters into one combined volume archive.

use image::{GenericImageView, Rgb};
use spreadstitch::error::{Error, Result};
use spreadstitch::prelude::*;
use tokio::time::timeout;

mod common;
use common::{
    LONG_TEST_TIMEOUT, PAGE_HEIGHT, PAGE_WIDTH, PageSpec, create_chapter,
    create_standard_chapter, get_comic_info_xml, list_image_entries, pixel_at,
    read_entry_image, setup_test_dir, shade_color, test_config_builder,
};

/// A two-page chapter whose pages are shaded `base + 1` and `base + 2`.
fn create_two_page_chapter(dir: &Path, name: &str, base: u8) -> PathBuf {
    let archive = dir.join(name);
    create_chapter(
        &archive,
        &[
            PageSpec::standard("001.png", base + 1),
            PageSpec::standard("002.png", base + 2),
        ],
    );
    archive
}

#[tokio::test]
async fn test_volume_of_three_chapters() -> Result<()> {
    let dir = setup_test_dir("scenario_e").await;
    let chapters = vec![
        create_two_page_chapter(&dir, "ch01.cbz", 10),
        create_two_page_chapter(&dir, "ch02.cbz", 20),
        create_two_page_chapter(&dir, "ch03.cbz", 30),
    ];

    let config = test_config_builder().build()?;
    let outcome = timeout(LONG_TEST_TIMEOUT, config.assemble_volume(chapters.clone()))
        .await
        .expect("Test timed out")?;

    let output = dir.join("ch01-ch03.cbz");
    assert_eq!(outcome.output, output);
    assert_eq!(outcome.chapters, 3);
    assert_eq!(outcome.spreads, 3);
    assert!(outcome.warning_page);
    assert!(!outcome.originals_deleted);

    assert_eq!(
        list_image_entries(&output),
        vec!["000_000.png", "001_001.png", "002_001.png", "003_001.png"]
    );

    // The warning page is sized like a stitched spread, not doubled again.
    let warning = read_entry_image(&output, "000_000.png");
    assert_eq!(warning.dimensions(), (PAGE_WIDTH * 2, PAGE_HEIGHT));
    assert_eq!(pixel_at(&warning, 0, 0), Rgb([255, 255, 255]));

    // Ordinal 1 is the last chapter given, with its pages right to left.
    let newest = read_entry_image(&output, "001_001.png");
    assert_eq!(pixel_at(&newest, 5, 5), shade_color(32));
    assert_eq!(pixel_at(&newest, PAGE_WIDTH + 5, 5), shade_color(31));
    let oldest = read_entry_image(&output, "003_001.png");
    assert_eq!(pixel_at(&oldest, 5, 5), shade_color(12));

    assert!(get_comic_info_xml(&output).contains("<Title>ch01-ch03</Title>"));

    // Source chapters are untouched.
    for chapter in &chapters {
        assert_eq!(list_image_entries(chapter), vec!["001.png", "002.png"]);
    }
    Ok(())
}

#[tokio::test]
async fn test_volume_output_already_exists() -> Result<()> {
    let dir = setup_test_dir("scenario_f").await;
    let chapters = vec![
        create_two_page_chapter(&dir, "ch01.cbz", 10),
        create_two_page_chapter(&dir, "ch02.cbz", 20),
    ];
    let existing = dir.join("ch01-ch02.cbz");
    std::fs::write(&existing, b"already here").unwrap();

    let config = test_config_builder().delete_originals(true).build()?;
    let result = config.assemble_volume(chapters.clone()).await;

    match result {
        Err(Error::AlreadyAssembled(path)) => assert_eq!(path, existing),
        other => panic!("expected AlreadyAssembled, got {:?}", other),
    }
    assert_eq!(std::fs::read(&existing).unwrap(), b"already here");
    assert!(!dir.join(".ch01-ch02.cbz.partial").exists());
    assert!(chapters.iter().all(|chapter| chapter.exists()));
    Ok(())
}

#[tokio::test]
async fn test_volume_aborts_when_a_chapter_fails() -> Result<()> {
    let dir = setup_test_dir("volume_abort").await;
    let bad = dir.join("ch02.cbz");
    create_chapter(
        &bad,
        &[
            PageSpec::standard("001.png", 1),
            PageSpec::new("002.png", PAGE_WIDTH * 2, PAGE_HEIGHT, shade_color(2)),
            PageSpec::standard("003.png", 3),
        ],
    );
    let chapters = vec![
        create_two_page_chapter(&dir, "ch01.cbz", 10),
        bad.clone(),
        create_two_page_chapter(&dir, "ch03.cbz", 30),
    ];

    let config = test_config_builder().delete_originals(true).build()?;
    let result = timeout(LONG_TEST_TIMEOUT, config.assemble_volume(chapters.clone()))
        .await
        .expect("Test timed out");

    match result {
        Err(Error::VolumeAborted { volume, failed }) => {
            assert_eq!(volume, dir.join("ch01-ch03.cbz"));
            assert_eq!(failed, vec![bad]);
        }
        other => panic!("expected VolumeAborted, got {:?}", other),
    }
    assert!(!dir.join("ch01-ch03.cbz").exists());
    assert!(chapters.iter().all(|chapter| chapter.exists()));
    Ok(())
}

#[tokio::test]
async fn test_volume_without_warning_deletes_originals() -> Result<()> {
    let dir = setup_test_dir("volume_delete").await;
    let chapters = vec![
        create_standard_chapter(&dir, "ch01.cbz", 4),
        create_standard_chapter(&dir, "ch02.cbz", 3),
    ];

    let config = test_config_builder()
        .skip_warning_page(true)
        .delete_originals(true)
        .build()?;
    let outcome = config.assemble_volume(chapters.clone()).await?;

    assert!(!outcome.warning_page);
    assert!(outcome.originals_deleted);
    assert_eq!(outcome.spreads, 4);
    assert_eq!(
        list_image_entries(&outcome.output),
        vec!["001_001.png", "001_002.png", "002_001.png", "002_002.png"]
    );
    assert!(chapters.iter().all(|chapter| !chapter.exists()));
    Ok(())
}

#[tokio::test]
async fn test_volume_needs_two_chapters() -> Result<()> {
    let dir = setup_test_dir("volume_arity").await;
    let chapter = create_standard_chapter(&dir, "ch01.cbz", 2);

    let config = test_config_builder().build()?;
    let result = config.assemble_volume(vec![chapter.clone()]).await;

    assert!(matches!(result, Err(Error::Other(_))));
    assert_eq!(list_image_entries(&chapter), vec!["001.png", "002.png"]);
    Ok(())
}
