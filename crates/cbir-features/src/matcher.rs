use rayon::prelude::*;

use crate::error::FeatureError;
use crate::feature::ImageFeature;
use crate::metric::DistanceMetric;

/// A ranked database entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// The name of the database entry.
    pub name: String,
    /// The distance to the query.
    pub distance: f64,
}

/// Ranks a descriptor database against a query by linear scan.
#[derive(Debug, Clone)]
pub struct Matcher {
    metric: DistanceMetric,
}

impl Matcher {
    /// Create a matcher for the metric bound to the query's feature type.
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric }
    }

    /// The metric used for ranking.
    pub fn metric(&self) -> &DistanceMetric {
        &self.metric
    }

    /// Return the `top_n` entries of `database` closest to `query`.
    ///
    /// Entries named like the query are never returned. Equal distances keep
    /// their database order. Asking for more entries than available returns
    /// all of them.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::FeatureTypeMismatch`] if an entry has another
    /// feature type than the query, or the metric's error if descriptors
    /// cannot be compared.
    ///
    /// # Example
    ///
    /// ```
    /// use cbir_features::{Descriptor, DistanceMetric, FeatureLayout, FeatureType, ImageFeature, Matcher};
    ///
    /// let layout = FeatureLayout::new(FeatureType::BaselinePatch, vec![2]);
    /// let feature = |name: &str, v: Vec<i32>| ImageFeature::new(name, &layout, Descriptor::Integer(v));
    ///
    /// let query = feature("a.jpg", vec![0, 0]).unwrap();
    /// let database = vec![
    ///     feature("a.jpg", vec![0, 0]).unwrap(),
    ///     feature("b.jpg", vec![3, 4]).unwrap(),
    ///     feature("c.jpg", vec![1, 0]).unwrap(),
    /// ];
    ///
    /// let matches = Matcher::new(DistanceMetric::SumSquaredDifference)
    ///     .rank(&query, &database, 10)
    ///     .unwrap();
    ///
    /// let names: Vec<_> = matches.iter().map(|m| m.name.as_str()).collect();
    /// assert_eq!(names, vec!["c.jpg", "b.jpg"]);
    /// assert_eq!(matches[1].distance, 25.0);
    /// ```
    pub fn rank(
        &self,
        query: &ImageFeature,
        database: &[ImageFeature],
        top_n: usize,
    ) -> Result<Vec<Match>, FeatureError> {
        let mut matches = database
            .par_iter()
            .filter(|entry| entry.name() != query.name())
            .map(|entry| {
                if entry.feature_type() != query.feature_type() {
                    return Err(FeatureError::FeatureTypeMismatch {
                        expected: query.feature_type(),
                        found: entry.feature_type(),
                    });
                }
                let distance = self
                    .metric
                    .distance(query.descriptor(), entry.descriptor())?;
                Ok(Match {
                    name: entry.name().to_string(),
                    distance,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // stable, so ties keep database order
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(top_n);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Descriptor, FeatureLayout, FeatureType};

    fn patch(name: &str, values: Vec<i32>) -> Result<ImageFeature, FeatureError> {
        let layout = FeatureLayout::new(FeatureType::BaselinePatch, vec![values.len()]);
        ImageFeature::new(name, &layout, Descriptor::Integer(values))
    }

    fn ssd() -> Matcher {
        Matcher::new(DistanceMetric::SumSquaredDifference)
    }

    #[test]
    fn baseline_scenario() -> Result<(), FeatureError> {
        let query = patch("a.jpg", vec![0; 147])?;
        let mut differing = vec![0; 147];
        differing[100] = 255;
        let database = vec![patch("b.jpg", vec![0; 147])?, patch("c.jpg", differing)?];

        let matches = ssd().rank(&query, &database, 2)?;
        assert_eq!(
            matches,
            vec![
                Match {
                    name: "b.jpg".to_string(),
                    distance: 0.0
                },
                Match {
                    name: "c.jpg".to_string(),
                    distance: 65025.0
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn excludes_self_and_clamps() -> Result<(), FeatureError> {
        let query = patch("q.jpg", vec![5])?;
        let database = vec![
            patch("x.jpg", vec![9])?,
            patch("q.jpg", vec![5])?,
            patch("y.jpg", vec![4])?,
        ];

        let matches = ssd().rank(&query, &database, 100)?;
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.name != "q.jpg"));
        assert!(matches.windows(2).all(|w| w[0].distance <= w[1].distance));

        assert!(ssd().rank(&query, &database, 0)?.is_empty());
        assert!(ssd().rank(&query, &database[1..2], 5)?.is_empty());
        Ok(())
    }

    #[test]
    fn ties_keep_database_order() -> Result<(), FeatureError> {
        let query = patch("q.jpg", vec![0])?;
        let database: Vec<_> = ["d.jpg", "a.jpg", "c.jpg", "b.jpg"]
            .iter()
            .map(|name| patch(name, vec![1]))
            .collect::<Result<_, _>>()?;

        let matches = ssd().rank(&query, &database, 3)?;
        let names: Vec<_> = matches.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["d.jpg", "a.jpg", "c.jpg"]);
        Ok(())
    }

    #[test]
    fn rejects_other_feature_types() -> Result<(), FeatureError> {
        let query = patch("q.jpg", vec![0])?;
        let layout = FeatureLayout::new(FeatureType::Color2d, vec![1]);
        let other = ImageFeature::new("h.jpg", &layout, Descriptor::Real(vec![1.0]))?;

        let res = ssd().rank(&query, &[other], 1);
        assert!(matches!(res, Err(FeatureError::FeatureTypeMismatch { .. })));
        Ok(())
    }
}
