use alpha_adjust::alpha::{apply, scale_alpha, AlphaLut};
use alpha_adjust::{Opacity, PixelBuffer};
use proptest::prelude::*;

fn buffer_strategy() -> impl Strategy<Value = PixelBuffer> {
    (0u32..12, 0u32..12).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<[u8; 4]>(), (w * h) as usize)
            .prop_map(move |pixels| PixelBuffer::new(w, h, pixels).unwrap())
    })
}

fn opacity_strategy() -> impl Strategy<Value = Opacity> {
    (0.0f32..=1.0).prop_map(|f| Opacity::new(f).unwrap())
}

proptest! {
    #[test]
    fn apply_is_pure_and_repeatable(buf in buffer_strategy(), op in opacity_strategy()) {
        let before = buf.clone();
        let a = apply(&buf, op);
        let b = apply(&buf, op);
        prop_assert_eq!(a.as_bytes(), b.as_bytes());
        prop_assert_eq!(&buf, &before);
        prop_assert_eq!(a.dimensions(), buf.dimensions());
    }

    #[test]
    fn color_channels_never_change(buf in buffer_strategy(), op in opacity_strategy()) {
        let out = apply(&buf, op);
        for (o, i) in out.pixels().iter().zip(buf.pixels()) {
            prop_assert_eq!(&o[..3], &i[..3]);
        }
    }

    #[test]
    fn opaque_is_identity(buf in buffer_strategy()) {
        prop_assert_eq!(apply(&buf, Opacity::OPAQUE), buf);
    }

    #[test]
    fn transparent_zeroes_alpha_only(buf in buffer_strategy()) {
        let out = apply(&buf, Opacity::TRANSPARENT);
        for (o, i) in out.pixels().iter().zip(buf.pixels()) {
            prop_assert_eq!(o[3], 0);
            prop_assert_eq!(&o[..3], &i[..3]);
        }
    }

    #[test]
    fn alpha_is_monotonic_in_opacity(a in any::<u8>(), f1 in 0.0f32..=1.0, f2 in 0.0f32..=1.0) {
        let (lo, hi) = if f1 <= f2 { (f1, f2) } else { (f2, f1) };
        let lo = scale_alpha(a, Opacity::new(lo).unwrap());
        let hi = scale_alpha(a, Opacity::new(hi).unwrap());
        prop_assert!(lo <= hi);
    }

    #[test]
    fn scaled_alpha_is_rounded_product(a in any::<u8>(), op in opacity_strategy()) {
        let scaled = scale_alpha(a, op);
        let exact = f64::from(a) * f64::from(op.get());
        prop_assert!(f64::from(scaled) <= f64::from(a));
        prop_assert!((f64::from(scaled) - exact).abs() <= 0.5 + 1e-4);
    }

    #[test]
    fn lut_agrees_with_scalar(op in opacity_strategy()) {
        let lut = AlphaLut::new(op);
        for a in 0..=255u8 {
            prop_assert_eq!(lut.scale(a), scale_alpha(a, op));
        }
    }
}
