use contrastive_pairs::colormaps::{
    ade20k_instance_table, cityscapes_table, coco_stuff_table, voc_aug_table, voc_table,
};
use contrastive_pairs::{load_colormap_file, named_colormap, ClassKey, Dataset};

#[test]
fn built_in_tables_have_expected_shape() {
    assert_eq!(voc_table().len(), 20);
    assert_eq!(voc_table().keys()[0], ClassKey::Rgb([128, 0, 0]));
    assert_eq!(voc_table().keys()[19], ClassKey::Rgb([0, 64, 128]));

    let aug = voc_aug_table();
    assert_eq!(aug.len(), 20);
    assert_eq!(aug.keys()[0], ClassKey::Gray(1));
    assert_eq!(aug.keys()[19], ClassKey::Gray(20));

    let coco = coco_stuff_table();
    assert_eq!(coco.len(), 182);
    assert_eq!(coco.index_of(ClassKey::Gray(181)), Some(181));
    assert_eq!(coco.index_of(ClassKey::Gray(255)), None);

    assert_eq!(ade20k_instance_table().keys(), &[ClassKey::Gray(255)]);

    let city = cityscapes_table();
    assert_eq!(city.len(), 19);
    assert_eq!(city.keys()[0], ClassKey::Rgb([128, 64, 128]));
    assert_eq!(city.keys()[18], ClassKey::Rgb([119, 11, 32]));
}

#[test]
fn dataset_tables_are_stable_across_calls() {
    for d in [
        Dataset::Voc { augmented: false },
        Dataset::Voc { augmented: true },
        Dataset::CocoStuff,
        Dataset::Ade20k,
        Dataset::Cityscapes,
    ] {
        assert_eq!(d.default_table(), d.default_table());
    }
    assert_eq!(named_colormap("Cityscapes"), Some(cityscapes_table()));
    assert_eq!(named_colormap("sbd"), Some(voc_aug_table()));
    assert!(named_colormap("unknown").is_none());
}

#[test]
fn colormap_file_accepts_mixed_formats() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("classes.txt");
    std::fs::write(
        &path,
        "# custom palette\n\n128,0,0\n#00FF80\n 12 \n#comment line\n",
    )
    .unwrap();
    let table = load_colormap_file(&path).expect("colormap should parse");
    assert_eq!(
        table.keys(),
        &[
            ClassKey::Rgb([128, 0, 0]),
            ClassKey::Rgb([0, 255, 128]),
            ClassKey::Gray(12)
        ]
    );
}

#[test]
fn colormap_file_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let empty = tmp.path().join("empty.txt");
    std::fs::write(&empty, "# nothing here\n").unwrap();
    assert!(load_colormap_file(&empty).is_err());

    let bad = tmp.path().join("bad.txt");
    std::fs::write(&bad, "300,0,0\n").unwrap();
    assert!(load_colormap_file(&bad).is_err());

    assert!(load_colormap_file(&tmp.path().join("missing.txt")).is_err());
}
