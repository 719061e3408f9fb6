use palquant::{Config, DitherMode, ErrorKind, QuantizeError, SourceImage};

fn gradient_rgba(width: usize, height: usize) -> Vec<rgb::RGBA<u8>> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y) * 128 / (width + height).max(1)) as u8;
            pixels.push(rgb::RGBA { r, g, b, a: 255 });
        }
    }
    pixels
}

fn image(pixels: Vec<rgb::RGBA<u8>>, width: u32, height: u32) -> SourceImage {
    SourceImage::new(pixels, width, height, 0.0).unwrap()
}

#[test]
fn smoke_test_rgba() {
    let width = 32;
    let height = 32;
    let img = image(gradient_rgba(width, height), width as u32, height as u32);

    let output = palquant::quantize_image(&img, &Config::default()).unwrap();

    assert!(output.palette_len() <= 256);
    assert!(output.palette_len() >= 2);
    assert_eq!(output.indices().len(), width * height);
    assert_eq!(output.transparent_count(), 0);

    for &idx in output.indices() {
        assert!((idx as usize) < output.palette_len());
    }
}

#[test]
fn smoke_test_with_transparency() {
    let width = 16usize;
    let height = 16usize;
    let mut pixels = gradient_rgba(width, height);
    // Top-left quadrant fully transparent
    for y in 0..8 {
        for x in 0..8 {
            pixels[y * width + x].a = 0;
        }
    }
    let img = image(pixels, 16, 16);

    let result = palquant::quantize(&img, &Config::default()).unwrap();
    let ti = result.palette().transparent_index().expect("transparent entry");
    let output = result.remapped(&img).unwrap();

    assert!(output.transparent_count() >= 1);
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(output.indices()[y * width + x], ti);
        }
    }
}

#[test]
fn palette_respects_max_colors() {
    let img = image(gradient_rgba(32, 32), 32, 32);
    for max in [2u32, 4, 16, 256] {
        let config = Config::new().max_colors(max);
        let output = palquant::quantize_image(&img, &config).unwrap();
        assert!(
            output.palette_len() <= max as usize,
            "max {max}: got {}",
            output.palette_len()
        );
    }
}

#[test]
fn max_colors_range_validation() {
    let img = image(gradient_rgba(4, 4), 4, 4);

    for bad in [0u32, 1, 257, 1000] {
        let err = palquant::quantize_image(&img, &Config::new().max_colors(bad)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument, "max_colors={bad}");
        assert!(matches!(err, QuantizeError::OptionOutOfRange { option: "max_colors", .. }));
    }
    for good in [2u32, 256] {
        assert!(palquant::quantize_image(&img, &Config::new().max_colors(good)).is_ok());
    }
}

#[test]
fn configure_boundary_validates() {
    assert!(Config::new().validated().is_ok());
    assert!(Config::new().speed(7).quality(10, 90).validated().is_ok());

    let err = Config::new().quality(80, 20).validated().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);

    let err = Config::new().speed(11).validated().unwrap_err();
    assert!(matches!(err, QuantizeError::OptionOutOfRange { option: "speed", .. }));

    let err = Config::new().min_posterization(5).validated().unwrap_err();
    assert!(matches!(
        err,
        QuantizeError::OptionOutOfRange { option: "min_posterization", .. }
    ));
}

#[test]
fn deterministic_palette_and_indices() {
    let img = image(gradient_rgba(48, 48), 48, 48);
    let config = Config::new().max_colors(32);

    let a = palquant::quantize_image(&img, &config).unwrap();
    let b = palquant::quantize_image(&img, &config).unwrap();

    assert_eq!(a.palette(), b.palette());
    assert_eq!(a.indices(), b.indices());
    assert_eq!(a.alphas(), b.alphas());
}

#[test]
fn opaque_entries_form_a_prefix() {
    let width = 16usize;
    let mut pixels = gradient_rgba(width, width);
    // Sprinkle semi-transparent and fully transparent pixels
    for (i, px) in pixels.iter_mut().enumerate() {
        match i % 5 {
            0 => px.a = 128,
            1 => px.a = 0,
            _ => {}
        }
    }
    let img = image(pixels, 16, 16);

    let output = palquant::quantize_image(&img, &Config::default()).unwrap();
    let alphas = output.alphas();

    let opaque_len = output.palette_len() - output.transparent_count();
    assert!(alphas[..opaque_len].iter().all(|&a| a == 255));
    assert!(alphas[opaque_len..].iter().all(|&a| a < 255));
    assert_eq!(output.alpha_table().len(), output.transparent_count());
}

#[test]
fn fully_transparent_image_still_gets_a_palette() {
    let pixels = vec![rgb::RGBA { r: 0, g: 0, b: 0, a: 0 }; 64];
    let img = image(pixels, 8, 8);

    let output = palquant::quantize_image(&img, &Config::default()).unwrap();
    assert!(output.palette_len() >= 1);
    assert_eq!(output.transparent_count(), output.palette_len());
    let ti = output.indices()[0];
    assert!(output.indices().iter().all(|&i| i == ti));
}

#[test]
fn all_dither_modes_produce_valid_output() {
    let img = image(gradient_rgba(16, 16), 16, 16);
    for mode in [DitherMode::None, DitherMode::FloydSteinberg, DitherMode::Adaptive] {
        let config = Config::new().max_colors(8).dither(mode);
        let output = palquant::quantize_image(&img, &config).unwrap();
        assert_eq!(output.indices().len(), 256, "mode {mode:?}");
        for &idx in output.indices() {
            assert!((idx as usize) < output.palette_len(), "mode {mode:?}");
        }
    }
}

#[test]
fn all_speed_settings_produce_valid_output() {
    let img = image(gradient_rgba(24, 24), 24, 24);
    for speed in 1..=10u8 {
        let config = Config::new().speed(speed).max_colors(16);
        let output = palquant::quantize_image(&img, &config).unwrap();
        assert!(output.palette_len() <= 16, "speed {speed}");
        assert_eq!(output.indices().len(), 24 * 24, "speed {speed}");
    }
}

#[test]
fn invalid_geometry_rejected_before_quantization() {
    let err = SourceImage::new(vec![], 0, 0, 0.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidImage);

    let err =
        SourceImage::new(vec![rgb::RGBA { r: 0, g: 0, b: 0, a: 255 }; 5], 2, 2, 0.0).unwrap_err();
    assert!(matches!(err, QuantizeError::DimensionMismatch { len: 5, .. }));
}
