use std::collections::BTreeMap;

use gnomon::{
    Anim, Asset, Canvas, Clip, ClipProps, Composition, CpuBackend, Fps, FrameIndex, FrameRange,
    PolygonAsset, PreparedAssetStore, RenderSettings, Rgba8, StrokeStyle, Track, Transform2D,
    render_frame,
};
use kurbo::Point;

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn centered_square_comp(fill: Rgba8) -> Composition {
    let mut assets = BTreeMap::new();
    assets.insert(
        "sq".to_string(),
        Asset::Polygon(PolygonAsset {
            points: Anim::constant(vec![
                Point::new(16.0, 16.0),
                Point::new(48.0, 16.0),
                Point::new(48.0, 48.0),
                Point::new(16.0, 48.0),
            ]),
            stroke: Some(StrokeStyle {
                width: 2.0,
                color: Rgba8::opaque(255, 255, 255),
            }),
        }),
    );

    Composition {
        fps: Fps::new(30, 1).unwrap(),
        canvas: Canvas {
            width: 64,
            height: 64,
        },
        duration: FrameIndex(2),
        assets,
        tracks: vec![Track {
            name: "main".to_string(),
            z_base: 0,
            clips: vec![Clip {
                id: "c0".to_string(),
                asset: "sq".to_string(),
                range: FrameRange::new(FrameIndex(0), FrameIndex(2)).unwrap(),
                props: ClipProps {
                    transform: Anim::constant(Transform2D::default()),
                    opacity: Anim::constant(1.0),
                    fill: Some(Anim::constant(fill)),
                    draw: Anim::constant(1.0),
                },
                z_offset: 0,
                fade_in: None,
                fade_out: None,
            }],
        }],
    }
}

#[test]
fn cpu_render_is_deterministic_and_nonempty() {
    let comp = centered_square_comp(Rgba8::opaque(200, 40, 40));
    let settings = RenderSettings {
        clear_rgba: Some([0, 0, 0, 255]),
    };
    let mut backend = CpuBackend::new(settings);
    let assets = PreparedAssetStore::prepare(&comp).unwrap();

    let a = render_frame(&comp, FrameIndex(0), &mut backend, &assets).unwrap();
    let b = render_frame(&comp, FrameIndex(0), &mut backend, &assets).unwrap();

    assert_eq!(a.width, 64);
    assert_eq!(a.height, 64);
    assert!(a.premultiplied);
    assert_eq!(a.data.len(), 64 * 64 * 4);
    assert_eq!(digest_u64(&a.data), digest_u64(&b.data));
    assert!(a.data.iter().any(|&x| x != 0));
}

#[test]
fn fill_covers_the_polygon_interior() {
    let comp = centered_square_comp(Rgba8::opaque(0, 255, 0));
    let settings = RenderSettings {
        clear_rgba: Some([0, 0, 0, 255]),
    };
    let mut backend = CpuBackend::new(settings);
    let assets = PreparedAssetStore::prepare(&comp).unwrap();

    let frame = render_frame(&comp, FrameIndex(0), &mut backend, &assets).unwrap();

    // Center pixel sits inside the fill; a corner pixel shows background.
    let px = |x: usize, y: usize| {
        let i = (y * 64 + x) * 4;
        (
            frame.data[i],
            frame.data[i + 1],
            frame.data[i + 2],
            frame.data[i + 3],
        )
    };
    let center = px(32, 32);
    assert!(center.1 > 200, "center should be green, got {center:?}");
    let corner = px(2, 2);
    assert_eq!(corner.1, 0, "corner should be background, got {corner:?}");
}

#[test]
fn opacity_layer_darkens_output() {
    let opaque = centered_square_comp(Rgba8::opaque(255, 255, 255));
    let mut translucent = opaque.clone();
    translucent.tracks[0].clips[0].props.opacity = Anim::constant(0.25);

    let settings = RenderSettings {
        clear_rgba: Some([0, 0, 0, 255]),
    };
    let mut backend = CpuBackend::new(settings);

    let assets_a = PreparedAssetStore::prepare(&opaque).unwrap();
    let full = render_frame(&opaque, FrameIndex(0), &mut backend, &assets_a).unwrap();
    let assets_b = PreparedAssetStore::prepare(&translucent).unwrap();
    let faint = render_frame(&translucent, FrameIndex(0), &mut backend, &assets_b).unwrap();

    let center = (32 * 64 + 32) * 4;
    assert!(faint.data[center] < full.data[center]);
}
