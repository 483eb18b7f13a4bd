use oxrdf::{Term, Variable};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// An immutable mapping from SPARQL [Variable]s to RDF [Term]s.
///
/// A [Bindings] instance is the unit of a bindings stream (i.e., one solution of a query). All
/// modifying operations return new instances and leave `self` untouched. Cloning is cheap, as
/// the entries are reference-counted.
///
/// ```
/// use rdf_weave_model::{Bindings, NamedNode, Term, Variable};
///
/// let x = Variable::new_unchecked("x");
/// let ex = Term::from(NamedNode::new_unchecked("http://example.com"));
///
/// let empty = Bindings::new();
/// let bound = empty.set(x.clone(), ex.clone());
///
/// assert_eq!(bound.get(&x), Some(&ex));
/// assert!(!empty.has(&x));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bindings {
    /// The entries, ordered by the variable name.
    entries: Arc<BTreeMap<Variable, Term>>,
}

impl Bindings {
    /// Creates an empty [Bindings] instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the term bound to `variable`.
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.entries.get(variable)
    }

    /// Returns whether `variable` is bound.
    pub fn has(&self, variable: &Variable) -> bool {
        self.entries.contains_key(variable)
    }

    /// Returns a new instance where `variable` is bound to `term`.
    ///
    /// An existing binding for `variable` is replaced.
    #[must_use]
    pub fn set(&self, variable: Variable, term: Term) -> Self {
        let mut entries = self.entries.as_ref().clone();
        entries.insert(variable, term);
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns a new instance without a binding for `variable`.
    #[must_use]
    pub fn delete(&self, variable: &Variable) -> Self {
        if !self.has(variable) {
            return self.clone();
        }

        let mut entries = self.entries.as_ref().clone();
        entries.remove(variable);
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns the number of bound variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the bound variables, ordered by name.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.entries.keys()
    }

    /// Returns an iterator over all `(variable, term)` pairs, ordered by variable name.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.entries.iter()
    }

    /// Returns whether `self` and `other` agree on all variables they share.
    pub fn is_compatible(&self, other: &Bindings) -> bool {
        let (smaller, larger) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        smaller
            .iter()
            .all(|(variable, term)| larger.get(variable).map_or(true, |other| other == term))
    }

    /// Merges `self` and `other` as defined by the SPARQL join.
    ///
    /// Returns [None] if both instances bind a shared variable to different terms.
    pub fn merge(&self, other: &Bindings) -> Option<Bindings> {
        if !self.is_compatible(other) {
            return None;
        }

        if other.is_empty() {
            return Some(self.clone());
        }
        if self.is_empty() {
            return Some(other.clone());
        }

        let mut entries = self.entries.as_ref().clone();
        for (variable, term) in other.iter() {
            entries
                .entry(variable.clone())
                .or_insert_with(|| term.clone());
        }
        Some(Self {
            entries: Arc::new(entries),
        })
    }

    /// Returns a new instance that only contains the given `variables`.
    #[must_use]
    pub fn project(&self, variables: &[Variable]) -> Self {
        variables
            .iter()
            .filter_map(|v| self.get(v).map(|t| (v.clone(), t.clone())))
            .collect()
    }
}

impl FromIterator<(Variable, Term)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (Variable, Term)>>(iter: T) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = (&'a Variable, &'a Term);
    type IntoIter = std::collections::btree_map::Iter<'a, Variable, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Display for Bindings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (variable, term)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable} -> {term}")?;
        }
        f.write_str("}")
    }
}
