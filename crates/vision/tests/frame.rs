//! Tests for attachment classification and frame utilities.

use image::{DynamicImage, RgbImage, RgbaImage};
use piggy_vision::{
    AttachmentKind, MAX_FRAMES, Source, TARGET_SIZE, decode, encode_png, frame_indices, is_valid,
    parse_probe, standardize, uniform_sample,
};

#[test]
fn classify_by_lowercase_extension() {
    assert_eq!(AttachmentKind::of("cat.PNG"), AttachmentKind::Image);
    assert_eq!(AttachmentKind::of("scan.webp"), AttachmentKind::Image);
    assert_eq!(AttachmentKind::of("paper.Pdf"), AttachmentKind::Pdf);
    assert_eq!(AttachmentKind::of("clip.m4v"), AttachmentKind::Video);
    assert_eq!(AttachmentKind::of("notes.txt"), AttachmentKind::Unsupported);
    assert_eq!(AttachmentKind::of("README"), AttachmentKind::Unsupported);
}

#[test]
fn any_image_standardizes_to_target() {
    for (w, h) in [(1, 1), (640, 480), (100, 900), (224, 224)] {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(w, h));
        let out = standardize(&image);
        assert_eq!(out.dimensions(), TARGET_SIZE);
        assert!(is_valid(&out));
    }
    assert!(!is_valid(&RgbImage::new(10, 10)));
}

#[test]
fn png_bytes_decode_back() {
    let png = encode_png(&RgbImage::new(224, 224)).unwrap();
    assert_eq!(&png[1..4], b"PNG");
    let decoded = decode(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), TARGET_SIZE);
    assert!(decode(b"not an image").is_err());
}

#[test]
fn short_video_keeps_one_frame_per_second() {
    assert_eq!(frame_indices(100, 30.0), [0, 30, 60, 90]);
    assert_eq!(frame_indices(5, 0.2), [0, 1, 2, 3, 4]);
    assert!(frame_indices(0, 25.0).is_empty());
}

#[test]
fn long_video_is_capped_and_evenly_spaced() {
    let indices = frame_indices(30 * 60, 30.0);
    assert_eq!(indices.len(), MAX_FRAMES);
    // 60 candidates thinned to 16: gap 3.75, first pick floor(1.875) = 1.
    assert_eq!(indices[0], 30);
    assert_eq!(indices[1], 5 * 30);
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn uniform_sample_picks_middles() {
    let items = (0..8).collect::<Vec<_>>();
    assert_eq!(uniform_sample(&items, 4), [1, 3, 5, 7]);
    assert_eq!(uniform_sample(&items, 0), Vec::<i32>::new());
}

#[test]
fn probe_output_parses() {
    let json = br#"{"streams":[{"avg_frame_rate":"30000/1001","nb_read_frames":"300"}]}"#;
    let (total, fps) = parse_probe(json).unwrap();
    assert_eq!(total, 300);
    assert_eq!(fps.round(), 30.0);
    assert!(parse_probe(br#"{"streams":[]}"#).is_err());

    let (total, fps) = parse_probe(br#"{"streams":[{"nb_read_packets":"300"}]}"#).unwrap();
    assert_eq!((total, fps), (0, 1.0));
}

#[test]
fn sources_render_for_the_answer() {
    let sources = [
        Source::Image {
            name: "a.png".into(),
        },
        Source::Pdf {
            name: "b.pdf".into(),
            pages: 3,
        },
        Source::Video {
            name: "c.mp4".into(),
            frames: 16,
        },
    ];
    let rendered = sources.iter().map(ToString::to_string).collect::<Vec<_>>();
    assert_eq!(
        rendered,
        ["Image: a.png", "PDF: b.pdf (3 pages)", "Video: c.mp4 (16 frames)"]
    );
}
