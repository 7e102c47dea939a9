use contrastive_pairs::{
    compose, decode_class_mask, write_pair, Adapter, AreaFilter, BinaryMask, ClassKey, Dataset,
    LabelMask, OutputDirs, PairPaths, WriteOutcome,
};
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

const SEVENS: [(u32, u32); 5] = [(0, 0), (1, 0), (2, 1), (3, 2), (0, 3)];

fn label_with_sevens() -> LabelMask {
    let img: GrayImage = ImageBuffer::from_fn(4, 4, |x, y| {
        if SEVENS.contains(&(x, y)) { Luma([7]) } else { Luma([0]) }
    });
    LabelMask::Gray(img)
}

fn photo(w: u32, h: u32) -> RgbImage {
    ImageBuffer::from_fn(w, h, |x, y| Rgb([10 + x as u8 * 20, 100 + y as u8 * 10, (x * y) as u8 + 1]))
}

#[test]
fn boundary_at_exact_threshold_rejects() {
    let f = AreaFilter::new(0.25).unwrap();
    assert!(!f.accepts_count(4, 16));
    assert!(f.accepts_count(5, 16));
    assert!(!f.accepts_count(0, 16));
    // zero threshold still rejects empty masks
    let zero = AreaFilter::new(0.0).unwrap();
    assert!(!zero.accepts_count(0, 16));
    assert!(zero.accepts_count(1, 16));
}

#[test]
fn threshold_out_of_range_is_rejected() {
    assert!(AreaFilter::new(1.0).is_err());
    assert!(AreaFilter::new(-0.1).is_err());
    assert!(AreaFilter::new(f64::NAN).is_err());
}

#[test]
fn five_of_sixteen_passes_point_two() {
    let mask = decode_class_mask(&label_with_sevens(), ClassKey::Gray(7));
    assert_eq!(mask.count(), 5);
    assert!(AreaFilter::new(0.2).unwrap().accepts(&mask));

    let raw = photo(4, 4);
    let pair = compose(&raw, &mask).expect("same dimensions");
    for (x, y, px) in pair.anchor.enumerate_pixels() {
        if SEVENS.contains(&(x, y)) {
            assert_eq!(px, raw.get_pixel(x, y));
        } else {
            assert_eq!(px.0, [0, 0, 0]);
        }
    }
}

#[test]
fn five_of_sixteen_fails_point_five_and_writes_nothing() {
    let mask = decode_class_mask(&label_with_sevens(), ClassKey::Gray(7));
    assert!(!AreaFilter::new(0.5).unwrap().accepts(&mask));

    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("VOC2012");
    let label_path = root.join("SegmentationClassAug").join("img.png");
    std::fs::create_dir_all(label_path.parent().unwrap()).unwrap();
    std::fs::create_dir_all(root.join("JPEGImages")).unwrap();
    let LabelMask::Gray(label) = label_with_sevens() else { unreachable!() };
    label.save(&label_path).unwrap();
    photo(4, 4).save(root.join("JPEGImages").join("img.jpg")).unwrap();

    let out = tmp.path().join("out");
    let bin = tmp.path().join("bin");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::create_dir_all(&bin).unwrap();
    let adapter = Adapter::new(
        Dataset::Voc { augmented: true },
        &root,
        OutputDirs {
            pairs: out.clone(),
            binmasks: Some(bin.clone()),
        },
    )
    .with_filter(AreaFilter::new(0.5).unwrap());
    let report = adapter.process_file(&label_path).unwrap();
    assert_eq!(report.accepted, 0);
    assert_eq!(report.written, 0);
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    assert_eq!(std::fs::read_dir(&bin).unwrap().count(), 0);
}

#[test]
fn anchor_and_nanchor_reconstruct_the_photo() {
    let raw = photo(5, 3);
    let bits = (0..15).map(|i| i % 3 == 0).collect();
    let mask = BinaryMask::from_bits(5, 3, bits).unwrap();
    let pair = compose(&raw, &mask).unwrap();
    for (x, y, px) in raw.enumerate_pixels() {
        let a = pair.anchor.get_pixel(x, y);
        let n = pair.nanchor.get_pixel(x, y);
        for c in 0..3 {
            assert_eq!(a[c] | n[c], px[c]);
            // disjoint: one side is always zero
            assert!(a[c] == 0 || n[c] == 0);
        }
        if mask.get(x, y) {
            assert_eq!(n.0, [0, 0, 0]);
        } else {
            assert_eq!(a.0, [0, 0, 0]);
        }
    }
}

#[test]
fn compose_rejects_mismatched_dimensions() {
    assert!(compose(&photo(4, 4), &BinaryMask::new(3, 4)).is_none());
}

#[test]
fn pair_paths_follow_naming_contract() {
    let out = std::path::Path::new("/out");
    let bin = std::path::Path::new("/bin");
    let p = PairPaths::new(out, Some(bin), "2007_000032", 14, "jpg");
    assert_eq!(p.anchor, out.join("2007_000032_anchor14.jpg"));
    assert_eq!(p.nanchor, out.join("2007_000032_Nanchor14.jpg"));
    let (b, nb) = p.binmask.unwrap();
    assert_eq!(b, bin.join("2007_000032_binmask14.png"));
    assert_eq!(nb, bin.join("2007_000032_nbinmask14.png"));

    let city = PairPaths::new(out, None, "aachen_000000_000019_gtFine_color", 0, "png");
    assert_eq!(city.anchor, out.join("aachen_000000_000019_gtFine_color_anchor0.png"));
    assert!(city.binmask.is_none());
}

#[test]
fn write_pair_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let raw = photo(4, 4);
    let mask = decode_class_mask(&label_with_sevens(), ClassKey::Gray(7));
    let bin_dir = tmp.path().join("bin");
    std::fs::create_dir_all(&bin_dir).unwrap();
    let paths = PairPaths::new(tmp.path(), Some(&bin_dir), "img", 7, "png");

    assert_eq!(write_pair(&raw, &mask, &paths).unwrap(), WriteOutcome::Written);
    let anchor = image::open(&paths.anchor).unwrap().to_rgb8();
    assert_eq!(anchor.get_pixel(1, 0), raw.get_pixel(1, 0));
    assert_eq!(anchor.get_pixel(1, 1).0, [0, 0, 0]);
    let (b, nb) = paths.binmask.clone().unwrap();
    assert_eq!(image::open(&b).unwrap().to_luma8().get_pixel(0, 0).0, [255]);
    assert_eq!(image::open(&nb).unwrap().to_luma8().get_pixel(0, 0).0, [0]);

    let before = std::fs::metadata(&paths.anchor).unwrap().modified().unwrap();
    assert_eq!(write_pair(&raw, &mask, &paths).unwrap(), WriteOutcome::Skipped);
    let after = std::fs::metadata(&paths.anchor).unwrap().modified().unwrap();
    assert_eq!(before, after);
}

#[test]
fn write_pair_redoes_half_written_pair() {
    let tmp = tempfile::tempdir().unwrap();
    let raw = photo(4, 4);
    let mask = decode_class_mask(&label_with_sevens(), ClassKey::Gray(7));
    let paths = PairPaths::new(tmp.path(), None, "img", 0, "png");
    raw.save(&paths.anchor).unwrap();
    assert_eq!(write_pair(&raw, &mask, &paths).unwrap(), WriteOutcome::Written);
    assert!(paths.nanchor.exists());
}

#[test]
fn saved_binmasks_stay_binary_for_jpeg_pairs() {
    let tmp = tempfile::tempdir().unwrap();
    let bits = (0..32 * 32).map(|i| (i % 32) / 3 % 2 == 0).collect();
    let mask = BinaryMask::from_bits(32, 32, bits).unwrap();
    let raw = RgbImage::from_pixel(32, 32, Rgb([90, 120, 200]));
    let bin_dir = tmp.path().join("bin");
    std::fs::create_dir_all(&bin_dir).unwrap();
    let paths = PairPaths::new(tmp.path(), Some(&bin_dir), "x", 0, "jpg");
    assert_eq!(write_pair(&raw, &mask, &paths).unwrap(), WriteOutcome::Written);
    assert_eq!(paths.anchor.extension().unwrap(), "jpg");

    let (b, nb) = paths.binmask.clone().unwrap();
    for (path, expect_on) in [(b, true), (nb, false)] {
        assert_eq!(path.extension().unwrap(), "png");
        let saved = image::open(&path).unwrap().to_luma8();
        for (x, y, px) in saved.enumerate_pixels() {
            let on = mask.get(x, y) == expect_on;
            assert_eq!(px.0, [if on { 255 } else { 0 }], "{path:?} at ({x}, {y})");
        }
    }
}
