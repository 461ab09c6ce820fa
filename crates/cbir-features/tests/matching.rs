use approx::assert_relative_eq;
use rand::Rng;

use cbir_features::metric::{cosine_distance, histogram_intersection_distance};
use cbir_features::{
    Descriptor, DistanceMetric, FeatureError, FeatureLayout, FeatureType, ImageFeature, Matcher,
};

fn random_histogram(rng: &mut impl Rng, len: usize) -> Vec<f64> {
    let raw: Vec<f64> = (0..len).map(|_| rng.random_range(0.0..1.0)).collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|v| v / total).collect()
}

#[test]
fn intersection_properties() {
    let mut rng = rand::rng();
    for _ in 0..20 {
        let a = random_histogram(&mut rng, 128);
        let b = random_histogram(&mut rng, 128);
        assert_relative_eq!(histogram_intersection_distance(&a, &a), 0.0, epsilon = 1e-9);

        let ab = histogram_intersection_distance(&a, &b);
        assert_relative_eq!(ab, histogram_intersection_distance(&b, &a), epsilon = 1e-12);
        assert!((-1e-9..=1.0 + 1e-9).contains(&ab));
    }
}

#[test]
fn cosine_properties() {
    let mut rng = rand::rng();
    for _ in 0..20 {
        let a: Vec<f64> = (0..512).map(|_| rng.random_range(-1.0..1.0)).collect();
        let b: Vec<f64> = (0..512).map(|_| rng.random_range(-1.0..1.0)).collect();
        assert_relative_eq!(cosine_distance(&a, &a), 0.0, epsilon = 1e-9);
        assert_relative_eq!(cosine_distance(&a, &b), cosine_distance(&b, &a), epsilon = 1e-12);
    }
}

#[test]
fn ranking_is_ordered_clamped_and_excludes_self() -> Result<(), FeatureError> {
    let mut rng = rand::rng();
    let layout = FeatureLayout::new(FeatureType::Color2d, vec![64]);
    let database: Vec<_> = (0..30)
        .map(|i| {
            let h = random_histogram(&mut rng, 64);
            ImageFeature::new(format!("{i:03}.jpg"), &layout, Descriptor::Real(h))
        })
        .collect::<Result<_, _>>()?;
    let query = database[7].clone();
    let metric = DistanceMetric::for_layout(&layout, &Default::default())?;
    let matcher = Matcher::new(metric);

    let top = matcher.rank(&query, &database, 10)?;
    assert_eq!(top.len(), 10);
    assert!(top.windows(2).all(|w| w[0].distance <= w[1].distance));

    let all = matcher.rank(&query, &database, 1000)?;
    assert_eq!(all.len(), database.len() - 1);
    assert!(all.iter().all(|m| m.name != "007.jpg"));
    assert_eq!(&all[..10], &top[..]);
    Ok(())
}
