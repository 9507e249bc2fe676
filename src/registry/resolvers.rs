//! Cross-reference resolution: string references become live bindings.
//!
//! Resolution is a second, optional phase after registration. Six resolvers
//! run in fixed order (domains, categories, actions, views, forms, display
//! modes), each a contract over the registry: rewrite string references into
//! interned ids, mutate nothing but reference fields, return the first
//! failure. The pipeline is fail-fast (later steps are skipped after an
//! error) and a failed resolution leaves the registry well-defined but
//! partially resolved: already-interned ids stay valid and remaining names
//! still resolve by lookup at validation time.

use thiserror::Error;

use crate::category::{CategoryRef, DomainRef, FieldKind, LinkMode};
use crate::errors::SchemaError;
use crate::observe::{Logger, Severity};

use super::{CategoryId, DomainId, Phase, Registry};

/// A resolution failure: the phase it occurred in plus the defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{phase} resolution failed: {error}")]
pub struct ResolveError {
    /// Phase that failed
    pub phase: Phase,
    /// The defect
    pub error: SchemaError,
}

/// Contract for one per-kind resolution step.
pub trait ReferenceResolver {
    /// Consumes the registered registry, rewrites string references of one
    /// kind into live bindings, returns `None` on success.
    fn resolve(&self, registry: &mut Registry) -> Option<ResolveError>;
}

impl<F: Fn(&mut Registry) -> Option<ResolveError>> ReferenceResolver for F {
    fn resolve(&self, registry: &mut Registry) -> Option<ResolveError> {
        self(registry)
    }
}

/// The six resolution steps, one per kind, in their fixed order.
pub struct Resolvers {
    /// Interns domain references in category shapes
    pub domains: Box<dyn ReferenceResolver>,
    /// Interns category links and populates the references index
    pub categories: Box<dyn ReferenceResolver>,
    /// Interns references inside action argument shapes
    pub actions: Box<dyn ReferenceResolver>,
    /// Views step (standard: definitions are opaque, nothing to intern)
    pub views: Box<dyn ReferenceResolver>,
    /// Forms step
    pub forms: Box<dyn ReferenceResolver>,
    /// Display modes step
    pub display_modes: Box<dyn ReferenceResolver>,
}

impl Default for Resolvers {
    fn default() -> Self {
        Self {
            domains: Box::new(resolve_domains),
            categories: Box::new(resolve_categories),
            actions: Box::new(resolve_actions),
            views: Box::new(resolve_nothing),
            forms: Box::new(resolve_nothing),
            display_modes: Box::new(resolve_nothing),
        }
    }
}

impl Registry {
    /// Runs cross-reference resolution, fail-fast, in fixed phase order.
    pub fn resolve(&mut self, resolvers: &Resolvers) -> Option<ResolveError> {
        let steps: [(&dyn ReferenceResolver, Phase); 6] = [
            (resolvers.domains.as_ref(), Phase::Domains),
            (resolvers.categories.as_ref(), Phase::Categories),
            (resolvers.actions.as_ref(), Phase::Actions),
            (resolvers.views.as_ref(), Phase::Views),
            (resolvers.forms.as_ref(), Phase::Forms),
            (resolvers.display_modes.as_ref(), Phase::DisplayModes),
        ];
        for (resolver, phase) in steps {
            if let Some(error) = resolver.resolve(self) {
                Logger::log_stderr(
                    Severity::Error,
                    "SCHEMA_RESOLUTION_FAILED",
                    &[("phase", phase.as_str())],
                );
                return Some(error);
            }
        }
        Logger::log(Severity::Info, "SCHEMA_RESOLVED", &[]);
        None
    }
}

/// Interns a domain reference in place.
fn intern_domain(
    reference: &mut DomainRef,
    owner: &str,
    prop: &str,
    lookup: impl Fn(&str) -> Option<DomainId>,
) -> Option<ResolveError> {
    if let DomainRef::Named(name) = reference {
        match lookup(name) {
            Some(id) => *reference = DomainRef::Id(id),
            None => {
                return Some(ResolveError {
                    phase: Phase::Domains,
                    error: SchemaError::UnresolvedDomain {
                        name: format!("{}.{}", owner, prop),
                        domain: name.clone(),
                    },
                })
            }
        }
    }
    None
}

/// Interns a category reference in place.
fn intern_category(
    reference: &mut CategoryRef,
    owner: &str,
    prop: &str,
    phase: Phase,
    lookup: impl Fn(&str) -> Option<CategoryId>,
) -> Option<ResolveError> {
    if let CategoryRef::Named(name) = reference {
        match lookup(name) {
            Some(id) => *reference = CategoryRef::Id(id),
            None => {
                return Some(ResolveError {
                    phase,
                    error: SchemaError::UnresolvedCategory {
                        entity: "link",
                        name: format!("{}.{}", owner, prop),
                        category: name.clone(),
                    },
                })
            }
        }
    }
    None
}

/// Standard domains step: every scalar field in every category shape binds
/// to an interned domain id.
fn resolve_domains(registry: &mut Registry) -> Option<ResolveError> {
    let Registry {
        ref mut categories,
        ref domain_ids,
        ..
    } = *registry;

    for category in categories.iter_mut() {
        let owner = category.name.clone();
        for (prop, def) in category.shape.iter_mut() {
            if let FieldKind::Scalar { domain } = &mut def.kind {
                if let Some(error) =
                    intern_domain(domain, &owner, prop, |name| domain_ids.get(name).copied())
                {
                    return Some(error);
                }
            }
        }
    }
    None
}

/// Standard categories step: link fields bind to interned category ids and
/// the reverse references index is populated on the link targets.
fn resolve_categories(registry: &mut Registry) -> Option<ResolveError> {
    let mut reference_entries: Vec<(CategoryId, String, String)> = Vec::new();
    {
        let Registry {
            ref mut categories,
            ref category_ids,
            ..
        } = *registry;

        for category in categories.iter_mut() {
            let owner = category.name.clone();
            for (prop, def) in category.shape.iter_mut() {
                if let FieldKind::Link {
                    category: target,
                    mode,
                    relation,
                } = &mut def.kind
                {
                    if let Some(error) =
                        intern_category(target, &owner, prop, Phase::Categories, |name| {
                            category_ids.get(name).copied()
                        })
                    {
                        return Some(error);
                    }
                    let id = match target {
                        CategoryRef::Id(id) => *id,
                        CategoryRef::Named(_) => continue,
                    };
                    let kind = match relation {
                        Some(relation) => relation.role_name().to_string(),
                        None => match mode {
                            LinkMode::Include => "Include".to_string(),
                            LinkMode::Many => "Many".to_string(),
                            LinkMode::Single => "Link".to_string(),
                        },
                    };
                    reference_entries.push((id, kind, owner.clone()));
                }
            }
        }
    }

    for (target, kind, source) in reference_entries {
        let entries = registry.categories[target.0]
            .references
            .entry(kind)
            .or_default();
        if !entries.contains(&source) {
            entries.push(source);
        }
    }
    None
}

/// Standard actions step: action argument shapes intern their domain and
/// category references.
fn resolve_actions(registry: &mut Registry) -> Option<ResolveError> {
    let Registry {
        ref mut categories,
        ref domain_ids,
        ref category_ids,
        ..
    } = *registry;

    for category in categories.iter_mut() {
        for action in category.actions.values_mut() {
            let owner = format!("{}.{}", action.category, action.name);
            for (prop, def) in action.def.args.iter_mut() {
                let error = match &mut def.kind {
                    FieldKind::Scalar { domain } => {
                        intern_domain(domain, &owner, prop, |name| domain_ids.get(name).copied())
                    }
                    FieldKind::Link {
                        category: target, ..
                    } => intern_category(target, &owner, prop, Phase::Actions, |name| {
                        category_ids.get(name).copied()
                    }),
                    _ => None,
                };
                if let Some(error) = error {
                    return Some(error);
                }
            }
        }
    }
    None
}

/// Standard step for kinds whose definitions are opaque: owning-category
/// bindings were already checked at registration, nothing to intern.
fn resolve_nothing(_registry: &mut Registry) -> Option<ResolveError> {
    None
}
