//! Resolution errors.

use thiserror::Error;

/// Error raised when the container cannot produce an instance.
///
/// Most variants mean "unresolvable": the name or one of its constructor
/// parameters cannot be satisfied. [`ResolveError::is_unresolvable`] tells
/// those apart from defects (cycles, type mismatches, failing factories),
/// which are never papered over by parameter defaults.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// An interface-only declaration was requested without a binding.
    #[error("cannot construct interface `{name}` without a binding; bind it in the container")]
    Interface {
        /// The interface name.
        name: String,
    },

    /// Nothing is declared or bound under this name.
    #[error("no type named `{name}` is declared")]
    UnknownType {
        /// The requested name.
        name: String,
    },

    /// A parameter has no nominal type and no default.
    #[error("cannot construct `{owner}` because `{param}` is not initializable")]
    Parameter {
        /// The type being constructed.
        owner: String,
        /// The parameter that could not be supplied.
        param: String,
    },

    /// A parameter's type could not be resolved and it has no default.
    #[error("cannot construct `{owner}`: parameter `{param}` could not be resolved")]
    Dependency {
        /// The type being constructed.
        owner: String,
        /// The parameter that could not be supplied.
        param: String,
        /// Why the parameter's type could not be resolved.
        #[source]
        source: Box<ResolveError>,
    },

    /// Resolution re-entered a name it was already resolving.
    #[error("circular dependency: {chain}")]
    Cycle {
        /// The resolution path, `A -> B -> A`.
        chain: String,
    },

    /// An instance was requested as the wrong Rust type.
    #[error("`{name}` resolved to `{found}`, not `{expected}`")]
    TypeMismatch {
        /// The binding name or parameter.
        name: String,
        /// The requested Rust type.
        expected: &'static str,
        /// The Rust type actually stored.
        found: &'static str,
    },

    /// A build closure asked for more arguments than were declared.
    #[error("`{owner}` has no argument at position {index}")]
    MissingArgument {
        /// The type being constructed.
        owner: String,
        /// The requested position.
        index: usize,
    },

    /// A factory or build closure failed.
    #[error("factory for `{name}` failed")]
    Factory {
        /// The name being produced.
        name: String,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },
}

impl ResolveError {
    /// Creates an [`ResolveError::UnknownType`] error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Wraps an arbitrary failure raised while producing `name`.
    pub fn factory(name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Factory {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Returns `true` when the failure means "cannot be satisfied", the only
    /// kind a constructor parameter default may recover from.
    #[must_use]
    pub fn is_unresolvable(&self) -> bool {
        match self {
            Self::Interface { .. } | Self::UnknownType { .. } | Self::Parameter { .. } => true,
            Self::Dependency { source, .. } => source.is_unresolvable(),
            Self::Cycle { .. }
            | Self::TypeMismatch { .. }
            | Self::MissingArgument { .. }
            | Self::Factory { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_classification() {
        assert!(ResolveError::unknown("Mailer").is_unresolvable());
        assert!(ResolveError::Interface { name: "Cache".into() }.is_unresolvable());
        assert!(!ResolveError::Cycle { chain: "A -> A".into() }.is_unresolvable());
        assert!(!ResolveError::factory("Db", anyhow::anyhow!("refused")).is_unresolvable());
    }

    #[test]
    fn test_dependency_inherits_classification() {
        let wrapped = ResolveError::Dependency {
            owner: "Mailer".into(),
            param: "transport".into(),
            source: Box::new(ResolveError::unknown("Transport")),
        };
        assert!(wrapped.is_unresolvable());

        let msg = wrapped.to_string();
        assert!(msg.contains("Mailer"));
        assert!(msg.contains("transport"));
    }

    #[test]
    fn test_parameter_message_names_owner_and_param() {
        let err = ResolveError::Parameter {
            owner: "Paginator".into(),
            param: "per_page".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot construct `Paginator` because `per_page` is not initializable"
        );
    }
}
