use oxrdf::Variable;
use std::sync::Arc;

/// Indicates whether a [Cardinality] is exact or only an estimation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardinalityKind {
    /// The number of elements is known.
    Exact,
    /// The number of elements is an estimation (e.g., from a hypermedia control).
    Estimate,
}

/// The (estimated) number of elements in a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cardinality {
    /// Whether [Self::value] is exact.
    pub kind: CardinalityKind,
    /// The number of elements.
    pub value: u64,
}

impl Cardinality {
    /// Creates an exact [Cardinality].
    pub const fn exact(value: u64) -> Self {
        Self {
            kind: CardinalityKind::Exact,
            value,
        }
    }

    /// Creates an estimated [Cardinality].
    pub const fn estimate(value: u64) -> Self {
        Self {
            kind: CardinalityKind::Estimate,
            value,
        }
    }

    /// Returns whether the cardinality is exact.
    pub fn is_exact(&self) -> bool {
        self.kind == CardinalityKind::Exact
    }

    /// Multiplies two cardinalities. The result is only exact if both inputs are exact.
    #[must_use]
    pub fn multiply(self, other: Cardinality) -> Self {
        let value = self.value.saturating_mul(other.value);
        if self.is_exact() && other.is_exact() {
            Self::exact(value)
        } else {
            Self::estimate(value)
        }
    }
}

/// Metadata that accompanies a bindings stream.
///
/// Join actors use this information for estimating their costs during the test phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingsMetadata {
    /// The (estimated) number of bindings.
    pub cardinality: Cardinality,
    /// The variables that may be bound in the stream.
    pub variables: Arc<[Variable]>,
}

impl BindingsMetadata {
    /// Creates a new [BindingsMetadata].
    pub fn new(cardinality: Cardinality, variables: impl Into<Arc<[Variable]>>) -> Self {
        Self {
            cardinality,
            variables: variables.into(),
        }
    }

    /// Returns the variables that are contained in `self` and `other`, in the order of `self`.
    pub fn shared_variables(&self, other: &BindingsMetadata) -> Vec<Variable> {
        self.variables
            .iter()
            .filter(|v| other.variables.contains(v))
            .cloned()
            .collect()
    }

    /// Returns the ordered union of the variables of `self` and `other`.
    pub fn union_variables(&self, other: &BindingsMetadata) -> Arc<[Variable]> {
        let mut variables = self.variables.to_vec();
        for variable in other.variables.iter() {
            if !variables.contains(variable) {
                variables.push(variable.clone());
            }
        }
        variables.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_keeps_exactness_only_if_both_exact() {
        assert_eq!(
            Cardinality::exact(2).multiply(Cardinality::exact(3)),
            Cardinality::exact(6)
        );
        assert_eq!(
            Cardinality::exact(2).multiply(Cardinality::estimate(3)),
            Cardinality::estimate(6)
        );
    }

    #[test]
    fn shared_and_union_variables() {
        let a = Variable::new_unchecked("a");
        let b = Variable::new_unchecked("b");
        let c = Variable::new_unchecked("c");
        let left = BindingsMetadata::new(Cardinality::exact(1), vec![a.clone(), b.clone()]);
        let right = BindingsMetadata::new(Cardinality::exact(1), vec![b.clone(), c.clone()]);

        assert_eq!(left.shared_variables(&right), vec![b.clone()]);
        assert_eq!(left.union_variables(&right).as_ref(), &[a, b, c]);
    }
}
