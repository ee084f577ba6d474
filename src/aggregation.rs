use crate::schema::{MonthlyAverage, SeriesKey, UnitCostObservation};
use chrono::Month;
use log::debug;
use std::collections::BTreeMap;

// Running total for one (key, month) group. `count` only covers present unit costs.
#[derive(Debug, Default, Clone, Copy)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

/// Collapses observations that share a (product, entity, month) key into their mean.
///
/// Groups are held in a `BTreeMap` so averages come out ordered by product code,
/// entity code and month. An observation without a unit cost opens its group
/// but adds nothing to the mean.
#[derive(Debug, Default)]
pub struct MonthlyAggregator {
    groups: BTreeMap<(SeriesKey, Month), MeanAccumulator>,
    observations: usize,
}

impl MonthlyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observation: UnitCostObservation) {
        let acc = self
            .groups
            .entry((observation.key, observation.month))
            .or_default();
        if let Some(unit_cost) = observation.unit_cost {
            acc.sum += unit_cost;
            acc.count += 1;
        }
        self.observations += 1;
    }

    pub fn extend<I>(&mut self, observations: I)
    where
        I: IntoIterator<Item = UnitCostObservation>,
    {
        for observation in observations {
            self.add(observation);
        }
    }

    pub fn observation_count(&self) -> usize {
        self.observations
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn finish(self) -> Vec<MonthlyAverage> {
        debug!(
            "Collapsed {} observations into {} monthly averages",
            self.observations,
            self.groups.len()
        );

        self.groups
            .into_iter()
            .map(|((key, month), acc)| MonthlyAverage {
                key,
                month,
                unit_cost: (acc.count > 0).then(|| acc.sum / acc.count as f64),
                observations: acc.count,
            })
            .collect()
    }
}

pub fn aggregate_monthly<I>(observations: I) -> Vec<MonthlyAverage>
where
    I: IntoIterator<Item = UnitCostObservation>,
{
    let mut aggregator = MonthlyAggregator::new();
    aggregator.extend(observations);
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(month: Month, product: &str, entity: &str, unit_cost: f64) -> UnitCostObservation {
        UnitCostObservation {
            key: SeriesKey::new(product, entity),
            month,
            unit_cost: Some(unit_cost),
        }
    }

    fn obs_without_cost(month: Month, product: &str, entity: &str) -> UnitCostObservation {
        UnitCostObservation {
            key: SeriesKey::new(product, entity),
            month,
            unit_cost: None,
        }
    }

    #[test]
    fn test_duplicates_collapse_to_mean() {
        let averages = aggregate_monthly(vec![
            obs(Month::January, "P", "E", 10.0),
            obs(Month::January, "P", "E", 20.0),
        ]);

        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].unit_cost, Some(15.0));
        assert_eq!(averages[0].observations, 2);
        assert_eq!(averages[0].month, Month::January);
    }

    #[test]
    fn test_missing_costs_are_ignored_by_the_mean() {
        let averages = aggregate_monthly(vec![
            obs(Month::May, "P", "E", 4.0),
            obs_without_cost(Month::May, "P", "E"),
        ]);

        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].unit_cost, Some(4.0));
        assert_eq!(averages[0].observations, 1);
    }

    #[test]
    fn test_group_without_any_cost_is_null() {
        let averages = aggregate_monthly(vec![
            obs_without_cost(Month::January, "P", "E"),
            obs_without_cost(Month::January, "P", "E"),
        ]);

        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].unit_cost, None);
        assert_eq!(averages[0].observations, 0);
    }

    #[test]
    fn test_distinct_keys_stay_separate() {
        let averages = aggregate_monthly(vec![
            obs(Month::March, "P", "E", 1.0),
            obs(Month::April, "P", "E", 2.0),
            obs(Month::March, "P", "e", 3.0),
            obs(Month::March, "Q", "E", 4.0),
        ]);

        // Codes are compared exactly, so "E" and "e" are different entities.
        assert_eq!(averages.len(), 4);
    }

    #[test]
    fn test_output_is_ordered_by_key_then_month() {
        let averages = aggregate_monthly(vec![
            obs(Month::December, "B", "E", 1.0),
            obs(Month::February, "A", "Z", 1.0),
            obs(Month::January, "B", "E", 1.0),
            obs(Month::May, "A", "Y", 1.0),
        ]);

        let order: Vec<(&str, &str, Month)> = averages
            .iter()
            .map(|a| (a.key.product_code.as_str(), a.key.entity_code.as_str(), a.month))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A", "Y", Month::May),
                ("A", "Z", Month::February),
                ("B", "E", Month::January),
                ("B", "E", Month::December),
            ]
        );
    }

    #[test]
    fn test_counters() {
        let mut aggregator = MonthlyAggregator::new();
        aggregator.extend(vec![
            obs(Month::June, "P", "E", 1.0),
            obs(Month::June, "P", "E", 3.0),
            obs(Month::July, "P", "E", 5.0),
        ]);
        assert_eq!(aggregator.observation_count(), 3);
        assert_eq!(aggregator.group_count(), 2);
        assert!(aggregator.finish().iter().all(|a| a.observations >= 1));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(aggregate_monthly(Vec::new()).is_empty());
    }
}
