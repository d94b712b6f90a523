use serde::{Deserialize, Serialize};
use crate::{error::CrozzleError, generator::GeneratorSettings};

/// Represents all settings of a [search](crate::runner::Runner).
///
/// Missing fields take their default values when read from JSON.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings
{
    pub generator: GeneratorSettings,
    /// Capacity of the queue of every word count
    pub queue_capacity: usize,
    /// Nodes a worker takes from the frontier at once
    pub batch_size: usize,
    pub worker_count: usize,
    /// Solutions buffered before the workers wait for the consumer
    pub channel_capacity: usize,
    /// A batch stops expanding once its children exceed the frontier's total capacity divided by this
    pub burst_divisor: usize,
    /// Length from which a word count's queue is drained before shallower ones
    pub flush_length: usize,
    pub max_siblings_per_batch: usize,
    /// How deep invalid children are expanded looking for valid descendants
    pub max_harvest_depth: usize,
    /// Skip nodes whose potential score can't beat the best solution found so far
    pub prune_by_potential: bool,
}

impl Default for SearchSettings
{
    fn default() -> Self
    {
        SearchSettings
        {
            generator: GeneratorSettings::default(),
            queue_capacity: 2000,
            batch_size: 16,
            worker_count: 2,
            channel_capacity: 100,
            burst_divisor: 10,
            flush_length: 500,
            max_siblings_per_batch: 4,
            max_harvest_depth: 4,
            prune_by_potential: false,
        }
    }
}

impl SearchSettings
{
    /// Reads and [validates](SearchSettings::validate) settings
    ///
    /// # Errors
    ///
    /// [CrozzleError::SettingsFormat] - the text is not valid settings JSON
    /// [CrozzleError::InvalidSettings] - see [SearchSettings::validate]
    pub fn from_json(json: &str) -> Result<SearchSettings, CrozzleError>
    {
        let settings: SearchSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, CrozzleError>
    {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that no size or count is zero and the flush length fits in a queue.
    pub fn validate(&self) -> Result<(), CrozzleError>
    {
        let sizes = [
            ("queue_capacity", self.queue_capacity),
            ("batch_size", self.batch_size),
            ("worker_count", self.worker_count),
            ("channel_capacity", self.channel_capacity),
            ("burst_divisor", self.burst_divisor),
            ("flush_length", self.flush_length),
            ("max_siblings_per_batch", self.max_siblings_per_batch),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0)
        {
            return Err(CrozzleError::InvalidSettings(format!("{name} must be positive")));
        }
        if self.flush_length > self.queue_capacity
        {
            return Err(CrozzleError::InvalidSettings(format!("flush_length {} exceeds queue_capacity {}", self.flush_length, self.queue_capacity)));
        }

        match self.generator
        {
            GeneratorSettings::SlotFilling { min_adjacent_group_size: 0 } =>
                Err(CrozzleError::InvalidSettings("min_adjacent_group_size must be positive".to_owned())),
            GeneratorSettings::SpaceFilling { max_contiguous_spaces, open_region_factor, combination_limit }
                if max_contiguous_spaces == 0 || open_region_factor == 0 || combination_limit == 0 =>
                Err(CrozzleError::InvalidSettings("space filling limits must be positive".to_owned())),
            _ => Ok(()),
        }
    }

    /// Number of children after which a batch stops expanding, given the total capacity of the frontier.
    pub fn burst_limit(&self, total_capacity: usize) -> usize
    {
        (total_capacity / self.burst_divisor.max(1)).max(1)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_defaults_are_valid()
    {
        let settings = SearchSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.flush_length, settings.queue_capacity / 4);
        assert_eq!(settings.burst_limit(settings.queue_capacity * 3), 600);
    }

    #[test]
    fn test_partial_json_takes_defaults()
    {
        let settings = SearchSettings::from_json(r#"{ "batch_size": 4, "generator": { "SpaceFilling": { "max_contiguous_spaces": 6, "open_region_factor": 3, "combination_limit": 10 } } }"#).unwrap();

        assert_eq!(settings.batch_size, 4);
        assert_eq!(settings.worker_count, 2);
        assert_eq!(settings.generator, GeneratorSettings::SpaceFilling { max_contiguous_spaces: 6, open_region_factor: 3, combination_limit: 10 });
    }

    #[test]
    fn test_round_trip()
    {
        let settings = SearchSettings { prune_by_potential: true, generator: GeneratorSettings::space_filling(), ..Default::default() };
        assert_eq!(SearchSettings::from_json(&settings.to_json().unwrap()).unwrap(), settings);
    }

    #[test]
    fn test_invalid_settings()
    {
        assert!(matches!(SearchSettings::from_json(r#"{ "worker_count": 0 }"#), Err(CrozzleError::InvalidSettings(_))));
        assert!(matches!(SearchSettings::from_json(r#"{ "queue_capacity": 10 }"#), Err(CrozzleError::InvalidSettings(_))));
        assert!(matches!(SearchSettings::from_json(r#"{ "generator": { "SlotFilling": { "min_adjacent_group_size": 0 } } }"#), Err(CrozzleError::InvalidSettings(_))));
        assert!(matches!(SearchSettings::from_json("[1, 2]"), Err(CrozzleError::SettingsFormat(_))));
    }
}
