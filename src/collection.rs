use std::collections::BTreeMap;

use crate::composite::YearlyComposite;
use crate::error::PipelineError;

/// Composites keyed by the year they represent, iterated in ascending year order.
#[derive(Debug, Clone, Default)]
pub struct CompositeCollection {
    composites: BTreeMap<i32, YearlyComposite>,
}

impl CompositeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a composite under its own year; a second composite for the same year is rejected.
    pub fn insert(&mut self, composite: YearlyComposite) -> Result<(), PipelineError> {
        let year = composite.year();
        if self.composites.contains_key(&year) {
            return Err(PipelineError::DuplicateYear(year));
        }
        self.composites.insert(year, composite);
        Ok(())
    }

    pub fn get(&self, year: i32) -> Option<&YearlyComposite> {
        self.composites.get(&year)
    }

    pub fn years(&self) -> Vec<i32> {
        self.composites.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &YearlyComposite> {
        self.composites.values()
    }

    pub fn len(&self) -> usize {
        self.composites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.composites.is_empty()
    }
}

impl IntoIterator for CompositeCollection {
    type Item = YearlyComposite;
    type IntoIter = std::collections::btree_map::IntoValues<i32, YearlyComposite>;

    fn into_iter(self) -> Self::IntoIter {
        self.composites.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::Statistic;
    use crate::config::YearRange;
    use crate::crs::Crs;
    use crate::grid::Grid;

    fn composite(year: i32, value: f64) -> YearlyComposite {
        YearlyComposite::new(
            year,
            YearRange::new(year, year).unwrap(),
            "NDWI".to_string(),
            Statistic::Median,
            Crs::default(),
            Grid::new(1, 1, [0.0, 30.0, 0.0, 30.0, 0.0, -30.0]).unwrap(),
            vec![value],
            vec![],
        )
    }

    #[test]
    fn test_lookup_by_year_not_position() {
        let mut collection = CompositeCollection::new();
        collection.insert(composite(2021, 0.3)).unwrap();
        collection.insert(composite(2003, 0.1)).unwrap();
        collection.insert(composite(2010, 0.2)).unwrap();

        assert_eq!(collection.years(), vec![2003, 2010, 2021]);
        assert_eq!(collection.get(2010).unwrap().values(), &[0.2]);
        assert!(collection.get(2004).is_none());

        let years: Vec<i32> = collection.iter().map(|c| c.year()).collect();
        assert_eq!(years, vec![2003, 2010, 2021]);
    }

    #[test]
    fn test_duplicate_year_is_rejected() {
        let mut collection = CompositeCollection::new();
        collection.insert(composite(2015, 0.1)).unwrap();

        let err = collection.insert(composite(2015, 0.9)).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateYear(2015)));
        assert_eq!(collection.get(2015).unwrap().values(), &[0.1]);
        assert_eq!(collection.len(), 1);
    }
}
