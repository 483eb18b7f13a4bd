use serde::Deserialize;

/// The expected costs of a join actor.
///
/// All coefficients are estimations and are only meaningful relative to the coefficients of
/// other join actors for the same action.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JoinCoefficients {
    /// The number of iterations (e.g., pairs of bindings that are compared).
    pub iterations: f64,
    /// The number of items that must be kept in memory.
    pub persisted_items: f64,
    /// The number of items that must be consumed before the first result is produced.
    pub blocking_items: f64,
    /// The expected time spent on requests (in milliseconds).
    pub request_time: f64,
}

/// Weights that turn [JoinCoefficients] into a single cost value.
///
/// ```
/// use rdf_weave_actor::{JoinCoefficientWeights, JoinCoefficients};
///
/// let weights: JoinCoefficientWeights = serde_json::from_str(r#"{ "io_weight": 50 }"#).unwrap();
/// let coefficients = JoinCoefficients {
///     iterations: 4.0,
///     request_time: 1.0,
///     ..JoinCoefficients::default()
/// };
/// assert_eq!(weights.cost(&coefficients), 54.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct JoinCoefficientWeights {
    /// The weight of [JoinCoefficients::iterations].
    pub cpu_weight: f64,
    /// The weight of [JoinCoefficients::persisted_items].
    pub memory_weight: f64,
    /// The weight of [JoinCoefficients::blocking_items].
    pub time_weight: f64,
    /// The weight of [JoinCoefficients::request_time].
    pub io_weight: f64,
}

impl Default for JoinCoefficientWeights {
    fn default() -> Self {
        Self {
            cpu_weight: 1.0,
            memory_weight: 1.0,
            time_weight: 10.0,
            io_weight: 100.0,
        }
    }
}

impl JoinCoefficientWeights {
    /// Sets the CPU weight.
    #[must_use]
    pub fn with_cpu_weight(mut self, cpu_weight: f64) -> Self {
        self.cpu_weight = cpu_weight;
        self
    }

    /// Sets the memory weight.
    #[must_use]
    pub fn with_memory_weight(mut self, memory_weight: f64) -> Self {
        self.memory_weight = memory_weight;
        self
    }

    /// Sets the time weight.
    #[must_use]
    pub fn with_time_weight(mut self, time_weight: f64) -> Self {
        self.time_weight = time_weight;
        self
    }

    /// Sets the I/O weight.
    #[must_use]
    pub fn with_io_weight(mut self, io_weight: f64) -> Self {
        self.io_weight = io_weight;
        self
    }

    /// Computes the weighted cost of `coefficients`.
    pub fn cost(&self, coefficients: &JoinCoefficients) -> f64 {
        coefficients.iterations * self.cpu_weight
            + coefficients.persisted_items * self.memory_weight
            + coefficients.blocking_items * self.time_weight
            + coefficients.request_time * self.io_weight
    }
}
