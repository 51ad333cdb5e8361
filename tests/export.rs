mod common;

use common::{png, photo_url, Memory};
use hullprint::compose::{card_slot, IMAGE_NOT_AVAILABLE};
use hullprint::{
    BatchProcessor, BrochureEntry, BrochureOptions, Composer, Error, ListingSnapshot, PageSize,
    SheetLayout, TaxStatus,
};

/// main photo is 0, other photos 1..=n
fn source(photos: usize, missing: &[usize]) -> Memory {
    (0..=photos)
        .filter(|i| !missing.contains(i))
        .fold(Memory::default(), |m, i| m.with(&photo_url(i), png(60, 40)))
}

fn composer(source: Memory) -> Composer<Memory> {
    Composer::new(BatchProcessor::new(source).with_chunk_size(3))
}

fn listing(other_photos: usize) -> ListingSnapshot {
    // stored with escaped newline markers
    let description: Vec<String> = (1..=20).map(|i| format!("Line {}", i)).collect();
    let photos: Vec<String> = (1..=other_photos).map(|i| format!("\"{}\"", photo_url(i))).collect();
    let json = format!(
        r#"{{
            "name": "Sea Ray  510 Fly",
            "price": 1250000,
            "year": "2019",
            "sizeMeters": 15.7,
            "beamMeters": "4.6",
            "location": "Split, Croatia",
            "propulsionType": "Shaft",
            "engines": "2x Cummins QSC",
            "engineHours": 410,
            "description": "{}",
            "equipment": {{
                "airConditioning": true,
                "generator": false,
                "hydraulicPasarelle": true,
                "bowThruster": true
            }},
            "mainPhoto": "{}",
            "otherPhotos": [{}],
            "taxStatus": "Paid"
        }}"#,
        description.join(r"\\n"),
        photo_url(0),
        photos.join(", ")
    );
    serde_json::from_str(&json).unwrap()
}

fn all_texts(doc: &hullprint::Document) -> Vec<(usize, String, f32)> {
    doc.pages()
        .iter()
        .enumerate()
        .flat_map(|(i, p)| p.texts().map(move |(t, y)| (i + 1, t.to_string(), y)))
        .collect()
}

#[tokio::test]
async fn spec_sheet_flows_over_pages() {
    let composer = composer(source(6, &[]));
    let doc = composer
        .spec_sheet(&listing(6), &SheetLayout::default())
        .await
        .unwrap();
    let texts = all_texts(&doc);

    // hero plus two secondary photos on page one
    assert_eq!(doc.pages()[0].image_count(), 3);
    for expected in ["Sea Ray  510 Fly", "Location: Split, Croatia", "€1,250,000", "VAT paid", "410", "15.7 m"] {
        assert!(
            texts.iter().any(|(p, t, _)| *p == 1 && t == expected),
            "{} missing from page one",
            expected
        );
    }

    // gallery starts page two: four remaining photos in two rows
    let gallery = texts.iter().find(|(_, t, _)| t == "Gallery").unwrap();
    assert_eq!((gallery.0, gallery.2), (2, 40.0));
    assert_eq!(doc.pages()[1].image_count(), 4);

    // description lines in order, none lost across the break
    let lines: Vec<&(usize, String, f32)> = texts.iter().filter(|(_, t, _)| t.starts_with("Line ")).collect();
    let expected: Vec<String> = (1..=20).map(|i| format!("Line {}", i)).collect();
    assert_eq!(lines.iter().map(|(_, t, _)| t.clone()).collect::<Vec<_>>(), expected);
    assert_eq!(lines[0].0, 2);
    assert_eq!(lines.last().unwrap().0, 3);
    let continued = lines.iter().find(|(p, _, _)| *p == 3).unwrap();
    assert_eq!(continued.2, 40.0);

    let equipment: Vec<&str> = texts
        .iter()
        .skip_while(|(_, t, _)| t != "Equipment")
        .skip(1)
        .map(|(_, t, _)| t.as_str())
        .filter(|t| !t.contains("novayachts") && !t.starts_with("Nova") && *t != "Email" && *t != "Phone" && !t.starts_with('+'))
        .collect();
    assert_eq!(equipment, vec!["Air Conditioning", "Hydraulic Pasarelle", "Bow Thruster"]);
}

#[tokio::test]
async fn gallery_rows_never_split() {
    let composer = composer(source(12, &[]));
    let doc = composer
        .spec_sheet(&listing(12), &SheetLayout::default())
        .await
        .unwrap();
    // ten gallery photos, three rows of 60 fit per page after the heading
    let counts: Vec<usize> = doc.pages().iter().map(|p| p.image_count()).collect();
    assert_eq!(&counts[..3], &[3, 6, 4]);
    for page in doc.pages().iter().skip(1) {
        assert_eq!(page.image_count() % 2, 0);
    }
}

#[tokio::test]
async fn broken_gallery_photo_gets_placeholder() {
    let composer = composer(source(4, &[3]));
    let doc = composer
        .spec_sheet(&listing(4), &SheetLayout::default())
        .await
        .unwrap();
    assert_eq!(doc.pages()[1].image_count(), 1);
    let placeholders = all_texts(&doc)
        .into_iter()
        .filter(|(_, t, _)| t == IMAGE_NOT_AVAILABLE)
        .count();
    assert_eq!(placeholders, 1);
}

#[tokio::test]
async fn no_gallery_without_extra_photos() {
    let composer = composer(source(2, &[]));
    let doc = composer
        .spec_sheet(&listing(2), &SheetLayout::default())
        .await
        .unwrap();
    let texts = all_texts(&doc);
    assert!(texts.iter().all(|(_, t, _)| t != "Gallery"));
    let heading = texts.iter().find(|(_, t, _)| t == "Description").unwrap();
    assert_eq!((heading.0, heading.2), (2, 40.0));
}

#[tokio::test]
async fn export_spec_sheet_writes_named_pdf() {
    let composer = composer(source(3, &[]));
    let export = composer
        .export_spec_sheet(&listing(3), &SheetLayout::default())
        .await
        .unwrap();
    assert_eq!(export.file_name, "sea-ray-510-fly.pdf");
    let pdf = lopdf::Document::load_mem(&export.bytes).unwrap();
    assert_eq!(pdf.get_pages().len(), 3);
}

#[tokio::test]
async fn invalid_layout_aborts_build() {
    let composer = composer(source(3, &[]));
    let layout = SheetLayout {
        hero_height: -65.0,
        ..SheetLayout::default()
    };
    let failure = composer.export_spec_sheet(&listing(3), &layout).await.unwrap_err();
    assert!(matches!(failure.cause(), Error::InvalidAspectRatio { .. }));
    assert!(failure.to_string().starts_with("export failed, please retry"));
}

#[tokio::test]
async fn negative_block_height_is_layout_overflow() {
    let composer = composer(source(3, &[]));
    let layout = SheetLayout {
        spec_row_height: -20.0,
        ..SheetLayout::default()
    };
    let failure = composer.export_spec_sheet(&listing(3), &layout).await.unwrap_err();
    assert!(
        matches!(failure.cause(), Error::LayoutOverflow { height } if *height < 0.0),
        "{}",
        failure
    );
}

fn entry(name: &str, photo: usize) -> BrochureEntry {
    BrochureEntry {
        name: name.to_string(),
        price: "480000".to_string(),
        year: "2015".to_string(),
        size_meters: "12".to_string(),
        location: "Pula".to_string(),
        main_photo: photo_url(photo),
        tax_status: TaxStatus::NotPaid,
        sold: false,
    }
}

#[tokio::test]
async fn brochure_survives_unreachable_photo() {
    let composer = composer(source(3, &[2]));
    let entries = vec![entry("Alpha", 1), entry("Bravo", 2), entry("Charlie", 3)];
    let options = BrochureOptions::default();
    let doc = composer.brochure(&entries, &options).await.unwrap();
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.pages()[0].image_count(), 2);

    let texts = all_texts(&doc);
    let placeholder = texts.iter().filter(|(_, t, _)| t == IMAGE_NOT_AVAILABLE).count();
    assert_eq!(placeholder, 1);

    for (i, name) in ["Alpha", "Bravo", "Charlie"].iter().enumerate() {
        let slot = card_slot(i, PageSize::A4, &options.layout);
        let (_, _, y) = texts.iter().find(|(_, t, _)| t == name).unwrap();
        assert!((y - slot.y - (slot.image_height + 6.0)).abs() < 1e-4, "{}", name);
    }
    let details: Vec<f32> = texts
        .iter()
        .filter(|(_, t, _)| t.starts_with("2015"))
        .map(|(_, _, y)| *y)
        .collect();
    assert_eq!(details.len(), 3);
    assert_eq!(details[0], details[1]);
    assert!(texts.iter().any(|(_, t, _)| t == "2015 \u{2022} €480,000 (VAT Not Paid)"));
}

#[tokio::test]
async fn brochure_pages_hold_six_cards() {
    let composer = composer(source(7, &[]));
    let entries: Vec<BrochureEntry> = (1..=7).map(|i| entry(&format!("Boat {}", i), i)).collect();
    let doc = composer.brochure(&entries, &BrochureOptions::default()).await.unwrap();
    let counts: Vec<usize> = doc.pages().iter().map(|p| p.image_count()).collect();
    assert_eq!(counts, vec![6, 1]);
    let texts = all_texts(&doc);
    let banner: Vec<usize> = texts
        .iter()
        .filter(|(_, t, _)| t == "Collection")
        .map(|(p, _, _)| *p)
        .collect();
    assert_eq!(banner, vec![1]);
    let seventh = texts.iter().find(|(_, t, _)| t == "Boat 7").unwrap();
    assert_eq!(seventh.0, 2);
}

#[tokio::test]
async fn brochure_keeps_caller_order() {
    let composer = composer(source(3, &[]));
    let entries = vec![entry("Charlie", 3), entry("Alpha", 1), entry("Bravo", 2)];
    let doc = composer.brochure(&entries, &BrochureOptions::default()).await.unwrap();
    let names: Vec<String> = all_texts(&doc)
        .into_iter()
        .map(|(_, t, _)| t)
        .filter(|t| ["Alpha", "Bravo", "Charlie"].contains(&t.as_str()))
        .collect();
    assert_eq!(names, vec!["Charlie", "Alpha", "Bravo"]);
}

#[tokio::test]
async fn empty_brochure_is_refused() {
    let composer = composer(source(0, &[]));
    let failure = composer
        .export_brochure(&[], &BrochureOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(failure.cause(), Error::EmptyBrochure));
}

#[tokio::test]
async fn export_brochure_is_dated() {
    let composer = composer(source(1, &[]));
    let export = composer
        .export_brochure(&[entry("Alpha", 1)], &BrochureOptions::default())
        .await
        .unwrap();
    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(export.file_name, format!("Nova-Yachts-Brochure-{}.pdf", today));
    let pdf = lopdf::Document::load_mem(&export.bytes).unwrap();
    assert_eq!(pdf.get_pages().len(), 1);
}
