//! End-to-end conversion tests: PNG frames in, GIF file out.

use std::io::Cursor;
use std::path::Path;

use gifrec_core::{ConversionConfig, ConvertError, GifConverter, QuantizerAlgorithm, RawFrame};

fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn frame(width: u32, height: u32, rgba: [u8; 4], index: u64) -> RawFrame {
    RawFrame::new(png(width, height, rgba), index * 100)
}

struct DecodedGif {
    width: u16,
    height: u16,
    frames: Vec<(u16, Vec<u8>)>,
}

fn read_gif(path: &Path) -> DecodedGif {
    let bytes = std::fs::read(path).unwrap();
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(bytes.as_slice()).unwrap();
    let (width, height) = (decoder.width(), decoder.height());

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        frames.push((frame.delay, frame.buffer.to_vec()));
    }
    DecodedGif {
        width,
        height,
        frames,
    }
}

const COLORS: [[u8; 4]; 4] = [
    [255, 0, 0, 255],
    [0, 255, 0, 255],
    [0, 0, 255, 255],
    [255, 255, 0, 255],
];

#[tokio::test]
async fn test_all_frames_kept_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.gif");
    let config = ConversionConfig {
        deduplicate_frames: false,
        ..ConversionConfig::default()
    };

    let frames = COLORS
        .iter()
        .enumerate()
        .map(|(i, c)| frame(16, 8, *c, i as u64))
        .collect();
    let conversion = GifConverter::new(config).convert(frames, &output).await.unwrap();

    assert_eq!(conversion.path, output);
    assert_eq!(conversion.stats.frames_added, 4);
    assert_eq!(conversion.stats.frames_skipped(), 0);

    let gif = read_gif(&output);
    assert_eq!((gif.width, gif.height), (16, 8));
    assert_eq!(gif.frames.len(), 4);
    for ((delay, pixels), color) in gif.frames.iter().zip(COLORS) {
        // 10 fps -> 100 ms -> 10 cs
        assert_eq!(*delay, 10);
        assert_eq!(&pixels[..4], &color);
        assert_eq!(&pixels[pixels.len() - 4..], &color);
    }
}

#[tokio::test]
async fn test_identical_frames_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("still.gif");
    let frames = (0..6).map(|i| frame(10, 10, [40, 80, 120, 255], i)).collect();

    let conversion = GifConverter::new(ConversionConfig::default())
        .convert(frames, &output)
        .await
        .unwrap();

    assert_eq!(conversion.stats.frames_added, 1);
    assert_eq!(conversion.stats.frames_skipped_duplicate, 5);
    assert_eq!(read_gif(&output).frames.len(), 1);
}

#[tokio::test]
async fn test_duplicates_compare_against_last_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("abab.gif");
    let red = [255, 0, 0, 255];
    let blue = [0, 0, 255, 255];
    let frames = vec![
        frame(4, 4, red, 0),
        frame(4, 4, red, 1),
        frame(4, 4, blue, 2),
        frame(4, 4, red, 3),
    ];

    let conversion = GifConverter::new(ConversionConfig::default())
        .convert(frames, &output)
        .await
        .unwrap();

    assert_eq!(conversion.stats.frames_added, 3);
    assert_eq!(conversion.stats.frames_skipped_duplicate, 1);
}

#[tokio::test]
async fn test_mismatched_frame_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("mixed.gif");
    let config = ConversionConfig {
        deduplicate_frames: false,
        ..ConversionConfig::default()
    };
    let frames = (0..5)
        .map(|i| {
            if i == 2 {
                frame(20, 10, [0, 0, 0, 255], i)
            } else {
                frame(10, 10, [0, 0, 0, 255], i)
            }
        })
        .collect();

    let conversion = GifConverter::new(config).convert(frames, &output).await.unwrap();

    assert_eq!(conversion.stats.frames_skipped_dimension_mismatch, 1);
    assert_eq!(conversion.stats.frames_added, 4);
    let gif = read_gif(&output);
    assert_eq!((gif.width, gif.height), (10, 10));
    assert_eq!(gif.frames.len(), 4);
}

#[tokio::test]
async fn test_empty_input_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("sub").join("empty.gif");

    let err = GifConverter::new(ConversionConfig::default())
        .convert(Vec::new(), &output)
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::EmptyInput));
    assert!(!output.exists());
    assert!(!output.parent().unwrap().exists());
}

#[tokio::test]
async fn test_undecodable_frames_leave_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("broken.gif");
    let frames = vec![
        RawFrame::new(b"garbage".to_vec(), 0),
        RawFrame::new(Vec::<u8>::new(), 100),
    ];

    let err = GifConverter::new(ConversionConfig::default())
        .convert(frames, &output)
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::NoFramesProcessable { total: 2 }));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_wide_frames_are_downscaled() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("small.gif");
    let config = ConversionConfig {
        max_width: 40,
        ..ConversionConfig::default()
    };
    let frames = vec![
        frame(160, 90, [10, 10, 10, 255], 0),
        frame(160, 90, [200, 200, 200, 255], 1),
    ];

    let conversion = GifConverter::new(config).convert(frames, &output).await.unwrap();

    assert_eq!(conversion.stats.frames_added, 2);
    let gif = read_gif(&output);
    assert_eq!((gif.width, gif.height), (40, 22));
}

#[tokio::test]
async fn test_nested_output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("a").join("b").join("c").join("out.gif");

    GifConverter::new(ConversionConfig::default())
        .convert(vec![frame(3, 3, [1, 2, 3, 255], 0)], &output)
        .await
        .unwrap();

    assert!(output.is_file());
}

#[tokio::test]
async fn test_neuquant_gradient() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("gradient.gif");

    // 64x64 gradient has 4096 distinct colors, forcing real quantization
    let mut image = image::RgbaImage::new(64, 64);
    for (x, y, px) in image.enumerate_pixels_mut() {
        *px = image::Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255]);
    }
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();

    for algorithm in [QuantizerAlgorithm::NeuQuant, QuantizerAlgorithm::Octree] {
        let config = ConversionConfig {
            algorithm,
            ..ConversionConfig::default()
        };
        let conversion = GifConverter::new(config)
            .convert(vec![RawFrame::new(bytes.get_ref().clone(), 0)], &output)
            .await
            .unwrap();
        assert_eq!(conversion.stats.frames_added, 1);

        let gif = read_gif(&output);
        let pixels = &gif.frames[0].1;
        // Top-left is (0, 0, 128); allow quantization error
        assert!(pixels[0] < 40 && pixels[1] < 40);
        assert!((pixels[2] as i32 - 128).abs() < 40);
    }
}

/// Deterministic high-entropy frame that barely compresses
fn noise_frame(width: u32, height: u32, seed: u32, index: u64) -> RawFrame {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    let image = image::RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        image::Rgba([r, g, b, 255])
    });
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    RawFrame::new(out.into_inner(), index * 100)
}

#[tokio::test]
async fn test_output_parent_is_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"keep me").unwrap();
    let output = blocker.join("out.gif");

    let err = GifConverter::new(ConversionConfig::default())
        .convert(vec![frame(8, 8, COLORS[0], 0)], &output)
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::Io(_)), "got {err:?}");
    assert!(err.is_io_error());
    assert_eq!(std::fs::read(&blocker).unwrap(), b"keep me");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_full_device_fails_with_sink_error() {
    let frames = (0..6).map(|i| noise_frame(300, 300, i as u32 + 1, i)).collect();
    let config = ConversionConfig {
        deduplicate_frames: false,
        ..ConversionConfig::default()
    };

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(60),
        GifConverter::new(config).convert(frames, "/dev/full"),
    )
    .await
    .expect("conversion against a full device must terminate");

    let err = result.unwrap_err();
    assert!(matches!(err, ConvertError::Sink(_)), "got {err:?}");
    assert!(err.is_io_error());
    assert!(Path::new("/dev/full").exists());
}
